use std::fmt;
use std::path::Path;
use serde::Serialize;
use tracecache::config::{format_memory_size, CacheConfig};
use tracecache::geometry::Geometry;
use tracecache::simulator::Simulator;
use tracecache::stats::{Metrics, SimulationStats};

/// Everything reported for one trace. Serialises to the `--json` output
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    trace_file: &'a Path,
    config: &'a CacheConfig,
    geometry: Geometry,
    overhead_bytes: f64,
    implementation_size_bytes: f64,
    implementation_cost: f64,
    stats: &'a SimulationStats,
    metrics: Metrics,
}

impl<'a> Report<'a> {
    pub fn new(trace_file: &'a Path, config: &'a CacheConfig, simulator: &'a Simulator) -> Self {
        let geometry = *simulator.geometry();
        let stats = simulator.stats();
        Self {
            trace_file,
            config,
            geometry,
            overhead_bytes: geometry.overhead_bytes(),
            implementation_size_bytes: geometry.implementation_size_bytes(),
            implementation_cost: geometry.implementation_cost(),
            stats,
            metrics: stats.metrics(&geometry),
        }
    }
}

/// Two decimal places, or `undefined` for a rate with no denominator
struct Rate(Option<f64>);

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{value:.2}"),
            None => write!(f, "undefined"),
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = &self.geometry;
        let s = self.stats;
        let m = &self.metrics;
        let physical_memory = format_memory_size(self.config.physical_memory);

        writeln!(f, "Trace File: {}\n", self.trace_file.display())?;

        writeln!(f, "***** Cache Input Parameters *****")?;
        writeln!(f, "Cache Size: {} KB", self.config.cache_size / 1024)?;
        writeln!(f, "Block Size: {} bytes", self.config.block_size)?;
        writeln!(f, "Associativity: {}", self.config.associativity)?;
        writeln!(f, "Replacement Policy: {}", self.config.replacement_policy)?;
        writeln!(f, "Physical Memory: {physical_memory}\n")?;

        writeln!(f, "***** Cache Calculated Values *****\n")?;
        writeln!(f, "Total # Blocks: {}", g.total_blocks())?;
        writeln!(f, "Tag Size: {} bits", g.tag_bits)?;
        writeln!(f, "Index Size: {} bits", g.index_bits)?;
        writeln!(f, "Total # Rows: {}", g.num_sets)?;
        writeln!(f, "Overhead Size: {} bytes", self.overhead_bytes)?;
        writeln!(
            f,
            "Implementation Memory Size: {:.2} KB ({} bytes)",
            self.implementation_size_bytes / 1024.0,
            self.implementation_size_bytes
        )?;
        writeln!(f, "Cost: ${:.2}\n", self.implementation_cost)?;

        writeln!(f, "***** CACHE SIMULATION RESULTS *****\n")?;
        writeln!(f, "Total Cache Accesses: {}", s.accesses)?;
        writeln!(f, "Cache Hits: {}", s.hits)?;
        writeln!(f, "Cache Misses: {}", m.total_misses)?;
        writeln!(f, "--- Compulsory Misses: {}", s.compulsory_misses)?;
        writeln!(f, "--- Conflict Misses: {}\n", s.conflict_misses)?;

        writeln!(f, "***** ***** CACHE HIT & MISS RATE ***** *****\n")?;
        writeln!(f, "Hit Rate: {} %", Rate(m.hit_rate))?;
        writeln!(f, "Miss Rate: {} %", Rate(m.miss_rate))?;
        writeln!(f, "CPI: {} Cycles/Instruction", Rate(m.cpi))?;
        writeln!(
            f,
            "Unused Cache Space: {:.2} KB / {:.2} KB = {:.2}%   Waste: ${:.2}",
            m.unused_kb,
            self.implementation_size_bytes / 1024.0,
            m.unused_percent,
            m.waste
        )?;
        writeln!(f, "Unused Cache Blocks: {} / {}\n", m.unused_blocks, g.total_blocks())?;

        writeln!(f, "***** VIRTUAL MEMORY RESULTS *****\n")?;
        writeln!(f, "Physical Memory: {physical_memory}")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::Path;
    use tracecache::config::{CacheConfig, ReplacementPolicyConfig};
    use tracecache::simulator::Simulator;
    use super::Report;

    fn config() -> CacheConfig {
        CacheConfig {
            cache_size: 1024,
            block_size: 16,
            associativity: 1,
            replacement_policy: ReplacementPolicyConfig::RoundRobin,
            physical_memory: 512 * 1024 * 1024,
        }
    }

    #[test]
    fn text_report_has_every_section() {
        let config = config();
        let mut simulator = Simulator::new(&config, None).unwrap();
        simulator.simulate(Cursor::new("EIP (02): 00000000 90\nEIP (02): 00000000 90\nEIP (02): 00000000 90\n")).unwrap();
        let text = Report::new(Path::new("three.trc"), &config, &simulator).to_string();
        assert!(text.contains("Trace File: three.trc"));
        assert!(text.contains("Replacement Policy: Round Robin"));
        assert!(text.contains("Physical Memory: 512MB"));
        assert!(text.contains("Tag Size: 22 bits"));
        assert!(text.contains("Index Size: 6 bits"));
        assert!(text.contains("Total # Rows: 64"));
        assert!(text.contains("Overhead Size: 184 bytes"));
        assert!(text.contains("Implementation Memory Size: 1.18 KB (1208 bytes)"));
        assert!(text.contains("Cost: $0.18"));
        assert!(text.contains("--- Compulsory Misses: 1"));
        assert!(text.contains("Hit Rate: 66.67 %"));
        assert!(text.contains("Miss Rate: 33.33 %"));
        assert!(text.contains("CPI: 8.00 Cycles/Instruction"));
        assert!(text.contains("Unused Cache Blocks: 63 / 64"));
    }

    #[test]
    fn empty_trace_reports_undefined_rates() {
        let config = config();
        let mut simulator = Simulator::new(&config, None).unwrap();
        simulator.simulate(Cursor::new("")).unwrap();
        let text = Report::new(Path::new("empty.trc"), &config, &simulator).to_string();
        assert!(text.contains("Hit Rate: undefined %"));
        assert!(text.contains("CPI: undefined Cycles/Instruction"));
    }

    #[test]
    fn json_report_leaves_undefined_rates_null() {
        let config = config();
        let mut simulator = Simulator::new(&config, None).unwrap();
        simulator.simulate(Cursor::new("dstM: 00000040 -------- srcM: 00000000 --------\n")).unwrap();
        let json = serde_json::to_value(Report::new(Path::new("store.trc"), &config, &simulator)).unwrap();
        assert_eq!(json["stats"]["accesses"], 1);
        assert_eq!(json["metrics"]["hit_rate"], 0.0);
        assert!(json["metrics"]["cpi"].is_null());
        assert_eq!(json["geometry"]["tag_bits"], 22);
        assert_eq!(json["config"]["replacement_policy"], "RoundRobin");
    }
}
