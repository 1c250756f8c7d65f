use crate::geometry::Geometry;
use crate::replacement_policies::{NoPolicy, Random, ReplacementPolicy, RoundRobin};

/// One way of a set
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CacheLine {
    pub valid: bool,
    pub tag: u32,
}

/// The ways of one set, plus the cursor used by round robin replacement
#[derive(Debug, Clone)]
pub struct CacheSet {
    lines: Vec<CacheLine>,
    cursor: usize,
}

impl CacheSet {
    fn new(ways: usize) -> Self {
        Self {
            lines: vec![CacheLine::default(); ways],
            cursor: 0,
        }
    }

    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }

    pub fn ways(&self) -> usize {
        self.lines.len()
    }

    /// The way round robin replacement will evict next
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the cursor, then moves it on to the next way, wrapping at the associativity
    pub fn advance_cursor(&mut self) -> usize {
        let way = self.cursor;
        self.cursor = (self.cursor + 1) % self.lines.len();
        way
    }

    fn lookup(&self, tag: u32) -> Lookup {
        let mut free = None;
        for (way, line) in self.lines.iter().enumerate() {
            if line.valid {
                if line.tag == tag {
                    return Lookup::Hit(way);
                }
            } else if free.is_none() {
                free = Some(way);
            }
        }
        match free {
            Some(way) => Lookup::MissWithFreeSlot(way),
            None => Lookup::MissFull,
        }
    }
}

/// The result of searching a set for a tag
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// A valid way holds the tag
    Hit(usize),
    /// No way holds the tag, and the given way has never been filled. A compulsory miss
    MissWithFreeSlot(usize),
    /// No way holds the tag and every way is in use. A conflict miss, something must be evicted
    MissFull,
}

/// A generic trait for caches
///
/// Technically not required as we're using static dispatch instead of dyn Cache, but it keeps the
/// simulator independent of the replacement policy
pub trait CacheTrait {
    /// The geometry this cache was built with
    fn geometry(&self) -> &Geometry;

    /// Searches the set at `index` for `tag`. Does not modify the cache
    fn lookup(&self, index: usize, tag: u32) -> Lookup;

    /// Marks a way as valid and holding `tag`. Used both for filling a free way and for
    /// overwriting a victim
    fn insert(&mut self, index: usize, way: usize, tag: u32);

    /// Asks the replacement policy for the way to evict from the set at `index`
    fn select_victim(&mut self, index: usize) -> usize;

    /// Gets the number of uninitialised cache lines. Useful for analysing cache performance or
    /// debugging
    fn get_uninitialised_line_count(&self) -> usize;
}

/// A generic cache implementation, parameterised by a replacement policy
///
/// The store is a fixed grid, `num_sets` sets of `associativity` lines each, allocated once when
/// the cache is built. We rely on monomorphisation and inlining of the policy to keep the hot path
/// free of dynamic dispatch
#[derive(Debug)]
pub struct Cache<R: ReplacementPolicy> {
    geometry: Geometry,
    sets: Vec<CacheSet>,
    replacement_policy: R,
}

impl<R: ReplacementPolicy> Cache<R> {
    pub fn new(geometry: Geometry, policy: R) -> Self {
        Self {
            sets: vec![CacheSet::new(geometry.associativity as usize); geometry.num_sets as usize],
            geometry,
            replacement_policy: policy,
        }
    }

    pub fn sets(&self) -> &[CacheSet] {
        &self.sets
    }
}

impl<R: ReplacementPolicy> CacheTrait for Cache<R> {
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn lookup(&self, index: usize, tag: u32) -> Lookup {
        self.sets[index].lookup(tag)
    }

    fn insert(&mut self, index: usize, way: usize, tag: u32) {
        self.sets[index].lines[way] = CacheLine { valid: true, tag };
    }

    fn select_victim(&mut self, index: usize) -> usize {
        self.replacement_policy.select_victim(&mut self.sets[index])
    }

    fn get_uninitialised_line_count(&self) -> usize {
        self.sets
            .iter()
            .flat_map(|set| set.lines.iter())
            .filter(|line| !line.valid)
            .count()
    }
}

/// Enum for the types of cache provided by the library
///
/// Using trait objects in Rust reduces boilerplate, but the simulator would be de-referencing for
/// each access in the trace, which is completely opaque to the compiler
///
/// It's much faster to explicitly branch on all implementations, as the compiler can reason about
/// the concrete types, perform function inlining etc
#[derive(Debug)]
pub enum GenericCache {
    RoundRobin(Cache<RoundRobin>),
    Random(Cache<Random>),
    NoPolicy(Cache<NoPolicy>),
}

impl From<Cache<RoundRobin>> for GenericCache {
    fn from(value: Cache<RoundRobin>) -> Self {
        Self::RoundRobin(value)
    }
}

impl From<Cache<Random>> for GenericCache {
    fn from(value: Cache<Random>) -> Self {
        Self::Random(value)
    }
}

impl From<Cache<NoPolicy>> for GenericCache {
    fn from(value: Cache<NoPolicy>) -> Self {
        Self::NoPolicy(value)
    }
}

impl CacheTrait for GenericCache {
    fn geometry(&self) -> &Geometry {
        match self {
            GenericCache::RoundRobin(c) => c.geometry(),
            GenericCache::Random(c) => c.geometry(),
            GenericCache::NoPolicy(c) => c.geometry(),
        }
    }

    fn lookup(&self, index: usize, tag: u32) -> Lookup {
        match self {
            GenericCache::RoundRobin(c) => c.lookup(index, tag),
            GenericCache::Random(c) => c.lookup(index, tag),
            GenericCache::NoPolicy(c) => c.lookup(index, tag),
        }
    }

    fn insert(&mut self, index: usize, way: usize, tag: u32) {
        match self {
            GenericCache::RoundRobin(c) => c.insert(index, way, tag),
            GenericCache::Random(c) => c.insert(index, way, tag),
            GenericCache::NoPolicy(c) => c.insert(index, way, tag),
        }
    }

    fn select_victim(&mut self, index: usize) -> usize {
        match self {
            GenericCache::RoundRobin(c) => c.select_victim(index),
            GenericCache::Random(c) => c.select_victim(index),
            GenericCache::NoPolicy(c) => c.select_victim(index),
        }
    }

    fn get_uninitialised_line_count(&self) -> usize {
        match self {
            GenericCache::RoundRobin(c) => c.get_uninitialised_line_count(),
            GenericCache::Random(c) => c.get_uninitialised_line_count(),
            GenericCache::NoPolicy(c) => c.get_uninitialised_line_count(),
        }
    }
}
