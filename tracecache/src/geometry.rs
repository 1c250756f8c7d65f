use serde::Serialize;
use tracing::debug;
use crate::error::ConfigError;

/// Width of every address in a trace
pub const ADDRESS_BITS: u32 = u32::BITS;

/// Cost of implementing one KB of cache, in dollars
pub const COST_PER_KB: f64 = 0.15;

/// The shape of a cache, and how an address is split between tag, index and offset
///
/// Each width is derived from its own parameter, so `offset_bits` only depends on the block size
/// and `index_bits` only on the number of sets
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub cache_size: u64,
    pub block_size: u64,
    pub associativity: u64,
    pub num_sets: u64,
    pub offset_bits: u32,
    pub index_bits: u32,
    pub tag_bits: u32,
}

/// An address split into its three fields
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecodedAddress {
    pub tag: u32,
    pub index: usize,
    pub offset: u32,
}

impl Geometry {
    /// Derives the geometry of a cache, rejecting any shape which can't be built
    ///
    /// # Arguments
    ///
    /// * `cache_size`: Total data capacity in bytes, a power of two
    /// * `block_size`: Bytes per line, a power of two
    /// * `associativity`: Ways per set. Must divide the number of lines evenly, leaving a power of
    /// two number of sets
    ///
    /// returns: Result<Geometry, ConfigError>
    ///
    /// # Examples
    ///
    /// ```
    /// use tracecache::geometry::Geometry;
    /// let geometry = Geometry::resolve(1024, 16, 1).unwrap();
    /// assert_eq!((geometry.tag_bits, geometry.index_bits, geometry.offset_bits), (22, 6, 4));
    /// ```
    pub fn resolve(cache_size: u64, block_size: u64, associativity: u64) -> Result<Self, ConfigError> {
        if !cache_size.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo { parameter: "cache size", value: cache_size });
        }
        if !block_size.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo { parameter: "block size", value: block_size });
        }
        if associativity == 0 {
            return Err(ConfigError::ZeroAssociativity);
        }
        let uneven = ConfigError::UnevenSets { cache_size, block_size, associativity };
        let set_size = block_size.checked_mul(associativity).ok_or_else(|| uneven.clone())?;
        if set_size > cache_size || cache_size % set_size != 0 {
            return Err(uneven);
        }
        // Both sizes are powers of two, so an even split leaves a power of two number of sets
        let num_sets = cache_size / set_size;
        let offset_bits = block_size.trailing_zeros();
        let index_bits = num_sets.trailing_zeros();
        if offset_bits + index_bits > ADDRESS_BITS {
            return Err(ConfigError::AddressTooNarrow { offset_bits, index_bits });
        }
        let geometry = Self {
            cache_size,
            block_size,
            associativity,
            num_sets,
            offset_bits,
            index_bits,
            tag_bits: ADDRESS_BITS - offset_bits - index_bits,
        };
        debug!(?geometry, "resolved cache geometry");
        Ok(geometry)
    }

    /// Splits an address into tag, index and offset. Total over every 32-bit address
    ///
    /// # Examples
    ///
    /// ```
    /// use tracecache::geometry::Geometry;
    /// let geometry = Geometry::resolve(1024, 16, 1).unwrap();
    /// let decoded = geometry.decode(0x0000_0415);
    /// assert_eq!((decoded.tag, decoded.index, decoded.offset), (1, 1, 5));
    /// ```
    pub fn decode(&self, address: u32) -> DecodedAddress {
        // Widened so that shifting by the full address width is defined
        let address = address as u64;
        let offset = address & low_bits(self.offset_bits);
        let index = (address >> self.offset_bits) & (self.num_sets - 1);
        let tag = (address >> (self.offset_bits + self.index_bits)) & low_bits(self.tag_bits);
        DecodedAddress {
            tag: tag as u32,
            index: index as usize,
            offset: offset as u32,
        }
    }

    /// Total number of cache lines
    pub fn total_blocks(&self) -> u64 {
        self.cache_size / self.block_size
    }

    /// Bookkeeping bytes per line: one valid bit plus the tag
    pub fn per_line_overhead_bytes(&self) -> f64 {
        (1 + self.tag_bits) as f64 / 8.0
    }

    /// Bookkeeping bytes for the whole cache
    pub fn overhead_bytes(&self) -> f64 {
        self.total_blocks() as f64 * self.per_line_overhead_bytes()
    }

    /// Data plus bookkeeping, in bytes
    pub fn implementation_size_bytes(&self) -> f64 {
        self.cache_size as f64 + self.overhead_bytes()
    }

    pub fn implementation_size_kb(&self) -> f64 {
        self.implementation_size_bytes() / 1024.0
    }

    /// Dollar cost of the implementation memory
    pub fn implementation_cost(&self) -> f64 {
        self.implementation_size_kb() * COST_PER_KB
    }
}

fn low_bits(bits: u32) -> u64 {
    (1u64 << bits) - 1
}
