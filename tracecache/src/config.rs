use std::fmt;
use serde::{Deserialize, Serialize};
use crate::error::ConfigError;
use crate::geometry::Geometry;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// A configuration for a single cache
///
/// All sizes are in bytes. The configuration itself is not validated on construction, resolving
/// the geometry is what rejects invalid shapes, and the simulator always does that first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub cache_size: u64,
    pub block_size: u64,
    pub associativity: u64,
    #[serde(default = "ReplacementPolicyConfig::default")]
    pub replacement_policy: ReplacementPolicyConfig,
    /// Only reported, addresses are never translated
    #[serde(default)]
    pub physical_memory: u64,
}

impl CacheConfig {
    /// Builds a configuration from the units used on the command line, with the cache size in KB
    pub fn from_kilobytes(
        cache_size_kb: u64,
        block_size: u64,
        associativity: u64,
        replacement_policy: ReplacementPolicyConfig,
        physical_memory: u64,
    ) -> Result<Self, ConfigError> {
        let cache_size = cache_size_kb
            .checked_mul(KB)
            .ok_or(ConfigError::CacheSizeOverflow(cache_size_kb))?;
        Ok(Self {
            cache_size,
            block_size,
            associativity,
            replacement_policy,
            physical_memory,
        })
    }

    /// Validates the configuration and derives the address geometry from it
    pub fn geometry(&self) -> Result<Geometry, ConfigError> {
        Geometry::resolve(self.cache_size, self.block_size, self.associativity)
    }
}

/// The replacement policy used on a conflict miss - round robin or random. Defaults to round robin.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum ReplacementPolicyConfig {
    #[serde(alias = "rr", alias = "RR")]
    #[value(name = "RR")]
    RoundRobin,
    #[serde(alias = "rnd", alias = "RND")]
    #[value(name = "RND")]
    Random,
}

impl Default for ReplacementPolicyConfig {
    fn default() -> Self {
        ReplacementPolicyConfig::RoundRobin
    }
}

impl fmt::Display for ReplacementPolicyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplacementPolicyConfig::RoundRobin => write!(f, "Round Robin"),
            ReplacementPolicyConfig::Random => write!(f, "Random"),
        }
    }
}

/// Parses a memory size with a KB, MB or GB suffix into bytes, using powers of 1024
///
/// # Examples
///
/// ```
/// use tracecache::config::parse_memory_size;
/// assert_eq!(parse_memory_size("512MB"), Ok(512 * 1024 * 1024));
/// assert!(parse_memory_size("512").is_err());
/// ```
pub fn parse_memory_size(input: &str) -> Result<u64, ConfigError> {
    let invalid = || ConfigError::InvalidMemorySize(input.to_string());
    let trimmed = input.trim();
    if trimmed.len() < 3 || !trimmed.is_char_boundary(trimmed.len() - 2) {
        return Err(invalid());
    }
    let (number, unit) = trimmed.split_at(trimmed.len() - 2);
    let multiplier = match unit.to_ascii_uppercase().as_str() {
        "KB" => KB,
        "MB" => MB,
        "GB" => GB,
        _ => return Err(invalid()),
    };
    let value: u64 = number.trim().parse().map_err(|_| invalid())?;
    value.checked_mul(multiplier).ok_or_else(invalid)
}

/// Formats a byte count with the largest of GB, MB or KB which divides it exactly
pub fn format_memory_size(bytes: u64) -> String {
    match bytes {
        0 => "0 bytes".to_string(),
        b if b % GB == 0 => format!("{}GB", b / GB),
        b if b % MB == 0 => format!("{}MB", b / MB),
        b if b % KB == 0 => format!("{}KB", b / KB),
        b => format!("{b} bytes"),
    }
}
