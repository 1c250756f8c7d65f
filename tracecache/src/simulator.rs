use std::io::BufRead;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use crate::cache::{Cache, CacheTrait, GenericCache, Lookup};
use crate::config::{CacheConfig, ReplacementPolicyConfig};
use crate::error::{ConfigError, TraceError};
use crate::geometry::Geometry;
use crate::replacement_policies::{NoPolicy, Random, RoundRobin};
use crate::stats::SimulationStats;
use crate::trace::{AccessEvent, AccessKind, TraceReader, NO_OPERAND};

/// Fixed overhead of an instruction fetch, charged before the cache access
pub const FETCH_CYCLES: u64 = 2;
/// Fixed overhead of a load or store, charged before the cache access
pub const MEMORY_OPERAND_CYCLES: u64 = 1;
pub const HIT_CYCLES: u64 = 1;
/// The bus moves this many bytes per transfer
pub const BYTES_PER_TRANSFER: u64 = 4;
pub const CYCLES_PER_TRANSFER: u64 = 4;

/// What happened to a single access event
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    Hit { way: usize },
    /// The line was placed in a way which had never been used
    CompulsoryMiss { way: usize },
    /// The set was full, the line replaced whatever was in `way`
    ConflictMiss { way: usize },
    /// A load or store without an operand, nothing was accessed
    Skipped,
}

/// The simulator classifies each access, keeps the cache up to date and collects results.
///
/// It supports calling simulate multiple times, and will update the time taken to simulate and the
/// results accordingly. A new trace should get a new simulator
pub struct Simulator {
    cache: GenericCache,
    stats: SimulationStats,
    miss_cycles: u64,
    skipped_lines: u64,
    simulation_time: Duration,
}

impl Simulator {
    /// Creates a new simulator for a given configuration
    ///
    /// # Arguments
    ///
    /// * `config`: A cache configuration, from the command line or parsed from JSON
    /// * `seed`: Seed for random replacement. `None` seeds from system entropy. Ignored by the
    /// other policies
    ///
    /// returns: Result<Simulator, ConfigError>, failing when the configuration has no valid
    /// geometry
    pub fn new(config: &CacheConfig, seed: Option<u64>) -> Result<Self, ConfigError> {
        let geometry = config.geometry()?;
        Ok(Self {
            cache: Self::config_to_cache(geometry, config.replacement_policy, seed),
            stats: SimulationStats::default(),
            miss_cycles: geometry.block_size.div_ceil(BYTES_PER_TRANSFER) * CYCLES_PER_TRANSFER,
            skipped_lines: 0,
            simulation_time: Duration::new(0, 0),
        })
    }

    /// Processes one access event
    ///
    /// Fetches count as an instruction. Loads and stores whose address is the no-operand
    /// sentinel are skipped entirely and charge nothing
    pub fn process(&mut self, event: AccessEvent) -> AccessOutcome {
        match event.kind {
            AccessKind::Fetch => {
                self.stats.instructions += 1;
                self.stats.cycles += FETCH_CYCLES;
            }
            AccessKind::Load | AccessKind::Store => {
                if event.address == NO_OPERAND {
                    return AccessOutcome::Skipped;
                }
                self.stats.cycles += MEMORY_OPERAND_CYCLES;
            }
        }
        let outcome = self.access(event.address);
        trace!(?event, ?outcome, "processed access");
        outcome
    }

    /// Looks the address up, updating the cache and the counters for the result
    fn access(&mut self, address: u32) -> AccessOutcome {
        let decoded = self.cache.geometry().decode(address);
        self.stats.accesses += 1;
        match self.cache.lookup(decoded.index, decoded.tag) {
            Lookup::Hit(way) => {
                self.stats.hits += 1;
                self.stats.cycles += HIT_CYCLES;
                AccessOutcome::Hit { way }
            }
            Lookup::MissWithFreeSlot(way) => {
                self.cache.insert(decoded.index, way, decoded.tag);
                self.stats.compulsory_misses += 1;
                self.stats.cycles += self.miss_cycles;
                AccessOutcome::CompulsoryMiss { way }
            }
            Lookup::MissFull => {
                let way = self.cache.select_victim(decoded.index);
                self.cache.insert(decoded.index, way, decoded.tag);
                self.stats.conflict_misses += 1;
                self.stats.cycles += self.miss_cycles;
                AccessOutcome::ConflictMiss { way }
            }
        }
    }

    /// Processes already decoded events, in order
    pub fn replay<I: IntoIterator<Item = AccessEvent>>(&mut self, events: I) -> &SimulationStats {
        let start = Instant::now();
        for event in events {
            self.process(event);
        }
        self.simulation_time += start.elapsed();
        &self.stats
    }

    /// Simulates the cache over a trace read from `reader`.
    ///
    /// Malformed lines are skipped and counted, they never reach the cache. Reads are strictly
    /// sequential, so a memory mapped file can be advised as such
    ///
    /// # Arguments
    ///
    /// * `reader`: The trace text
    ///
    /// returns: Result<&SimulationStats, TraceError>, failing only when the trace can't be read
    pub fn simulate<R: BufRead>(&mut self, reader: R) -> Result<&SimulationStats, TraceError> {
        let start = Instant::now();
        for line in TraceReader::new(reader) {
            match line {
                Ok(line) => {
                    for event in line.events() {
                        self.process(event);
                    }
                }
                Err(TraceError::MalformedLine { line_number, line }) => {
                    debug!(line_number, %line, "skipping malformed trace line");
                    self.skipped_lines += 1;
                }
                Err(e) => return Err(e),
            }
        }
        self.simulation_time += start.elapsed();
        debug!(stats = ?self.stats, skipped_lines = self.skipped_lines, "finished trace");
        Ok(&self.stats)
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn geometry(&self) -> &Geometry {
        self.cache.geometry()
    }

    /// Cycles charged for every miss, a full block transfer
    pub fn miss_cycles(&self) -> u64 {
        self.miss_cycles
    }

    /// Number of trace lines which matched neither shape
    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }

    /// Gets the wall-clock execution time for processing
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    /// Gets the number of lines never filled during the run
    pub fn get_uninitialised_line_count(&self) -> u64 {
        self.cache.get_uninitialised_line_count() as u64
    }

    /// Creates a new cache from a resolved geometry and the configured policy
    ///
    /// Direct mapped caches have a single candidate way, so they get no policy at all
    fn config_to_cache(geometry: Geometry, policy: ReplacementPolicyConfig, seed: Option<u64>) -> GenericCache {
        if geometry.associativity == 1 {
            GenericCache::from(Cache::new(geometry, NoPolicy))
        } else {
            match policy {
                ReplacementPolicyConfig::RoundRobin => {
                    GenericCache::from(Cache::new(geometry, RoundRobin))
                }
                ReplacementPolicyConfig::Random => {
                    GenericCache::from(Cache::new(geometry, Random::new(seed)))
                }
            }
        }
    }
}
