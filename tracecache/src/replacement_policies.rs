use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use crate::cache::CacheSet;

/// A generic trait for implementing new replacement policies. Can be used to parameterise a Cache.
pub trait ReplacementPolicy {
    /// Used by the cache to pick the way to overwrite when a miss lands in a full set.
    ///
    /// Never called while the set still has an invalid way, those are filled directly
    ///
    /// # Arguments
    ///
    /// * `set`: The full set. Policies keeping per-set state can update it here
    ///
    /// returns: usize, the way to evict
    fn select_victim(&mut self, set: &mut CacheSet) -> usize;
}

#[derive(Debug, Default)]
/// NoPolicy is used for direct mapped caches. There is only one way per set, so it is always the
/// victim
///
/// As the generic cache implementation is monomorphised, the compiler can completely optimise this
/// away, removing the need for a separate implementation
pub struct NoPolicy;

impl ReplacementPolicy for NoPolicy {
    fn select_victim(&mut self, _set: &mut CacheSet) -> usize {
        0
    }
}

/// Standard round robin replacement policy
///
/// Each set keeps its own cursor, so eviction order is the order lines were placed in that set,
/// regardless of how recently they were read
#[derive(Debug, Default)]
pub struct RoundRobin;

impl ReplacementPolicy for RoundRobin {
    fn select_victim(&mut self, set: &mut CacheSet) -> usize {
        set.advance_cursor()
    }
}

/// Uniformly random replacement
///
/// Uses ChaCha8 rather than the thread local generator, its output for a given seed is stable
/// across platforms and library versions
#[derive(Debug)]
pub struct Random {
    rng: ChaCha8Rng,
}

impl Random {
    /// Creates a policy whose choices are fully determined by `seed`
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Creates a policy seeded from system entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Uses the injected seed if there is one, otherwise system entropy
    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }
}

impl ReplacementPolicy for Random {
    fn select_victim(&mut self, set: &mut CacheSet) -> usize {
        self.rng.gen_range(0..set.ways())
    }
}
