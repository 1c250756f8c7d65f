use serde::{Deserialize, Serialize};
use crate::error::StatsError;
use crate::geometry::{Geometry, COST_PER_KB};

/// Counters accumulated over one run. Can be serialised, this is the expected output format of
/// the fixture cases
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct SimulationStats {
    pub accesses: u64,
    pub hits: u64,
    pub compulsory_misses: u64,
    pub conflict_misses: u64,
    pub cycles: u64,
    pub instructions: u64,
}

/// Figures derived from a finished run. Rates which would divide by zero are `None`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub hit_rate: Option<f64>,
    pub miss_rate: Option<f64>,
    pub cpi: Option<f64>,
    pub total_misses: u64,
    pub unused_blocks: u64,
    pub unused_kb: f64,
    pub unused_percent: f64,
    pub waste: f64,
}

impl SimulationStats {
    pub fn total_misses(&self) -> u64 {
        self.compulsory_misses + self.conflict_misses
    }

    /// Percentage of accesses which hit
    pub fn hit_rate(&self) -> Result<f64, StatsError> {
        if self.accesses == 0 {
            return Err(StatsError::DivisionUndefined("hit rate", "accesses"));
        }
        Ok(self.hits as f64 * 100.0 / self.accesses as f64)
    }

    pub fn miss_rate(&self) -> Result<f64, StatsError> {
        Ok(100.0 - self.hit_rate()?)
    }

    /// Cycles per instruction, where every fetch is one instruction
    pub fn cpi(&self) -> Result<f64, StatsError> {
        if self.instructions == 0 {
            return Err(StatsError::DivisionUndefined("CPI", "instructions"));
        }
        Ok(self.cycles as f64 / self.instructions as f64)
    }

    /// Lines never filled during the run. Each compulsory miss fills exactly one fresh line
    pub fn unused_blocks(&self, geometry: &Geometry) -> u64 {
        geometry.total_blocks().saturating_sub(self.compulsory_misses)
    }

    /// Derives the reported figures. Undefined rates are kept as `None` rather than failing the
    /// whole report
    pub fn metrics(&self, geometry: &Geometry) -> Metrics {
        let unused_blocks = self.unused_blocks(geometry);
        let unused_kb = unused_blocks as f64
            * (geometry.block_size as f64 + geometry.per_line_overhead_bytes())
            / 1024.0;
        Metrics {
            hit_rate: self.hit_rate().ok(),
            miss_rate: self.miss_rate().ok(),
            cpi: self.cpi().ok(),
            total_misses: self.total_misses(),
            unused_blocks,
            unused_kb,
            unused_percent: unused_kb * 100.0 / geometry.implementation_size_kb(),
            waste: unused_kb * COST_PER_KB,
        }
    }
}
