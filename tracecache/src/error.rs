use thiserror::Error;

/// Raised while validating a cache configuration. Always fatal, nothing is simulated with an
/// invalid configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{parameter} must be a power of two, got {value}")]
    NotPowerOfTwo { parameter: &'static str, value: u64 },

    #[error("associativity must be at least 1")]
    ZeroAssociativity,

    #[error("a {cache_size} byte cache can't be split into {associativity}-way sets of {block_size} byte blocks")]
    UnevenSets {
        cache_size: u64,
        block_size: u64,
        associativity: u64,
    },

    #[error("{offset_bits} offset bits and {index_bits} index bits don't fit in a 32-bit address")]
    AddressTooNarrow { offset_bits: u32, index_bits: u32 },

    #[error("invalid memory size '{0}', expected a number followed by KB, MB or GB")]
    InvalidMemorySize(String),

    #[error("cache size of {0}KB is too large")]
    CacheSizeOverflow(u64),
}

/// Raised while reading a trace
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("couldn't read the trace: {0}")]
    Io(#[from] std::io::Error),

    /// The line matches neither the fetch nor the memory operand shape. The simulator skips these
    #[error("malformed trace line {line_number}: '{line}'")]
    MalformedLine { line_number: u64, line: String },
}

/// Raised when a derived rate has no meaningful value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("{0} is undefined as there were no {1}")]
    DivisionUndefined(&'static str, &'static str),
}
