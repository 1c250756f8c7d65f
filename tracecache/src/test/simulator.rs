use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use pretty_assertions::assert_eq;
use rstest::rstest;
use crate::config::{CacheConfig, ReplacementPolicyConfig};
use crate::error::ConfigError;
use crate::simulator::{AccessOutcome, Simulator};
use crate::stats::SimulationStats;
use crate::trace::AccessEvent;

fn config(cache_size: u64, block_size: u64, associativity: u64, replacement_policy: ReplacementPolicyConfig) -> CacheConfig {
    CacheConfig {
        cache_size,
        block_size,
        associativity,
        replacement_policy,
        physical_memory: 0,
    }
}

/// Addresses which all map to set 0 of a 1KB cache with 16 byte blocks and `ways` ways
fn same_set_addresses(ways: u64, count: u32) -> Vec<u32> {
    let stride = 1024 / ways as u32;
    (0..count).map(|i| (i + 1) * stride).collect()
}

#[test]
fn rejects_invalid_configuration() {
    let result = Simulator::new(&config(1000, 16, 1, ReplacementPolicyConfig::RoundRobin), None);
    assert!(matches!(result, Err(ConfigError::NotPowerOfTwo { .. })));
}

#[test]
fn direct_mapped_repeat_is_miss_then_hit() {
    let mut simulator = Simulator::new(&config(1024, 16, 1, ReplacementPolicyConfig::RoundRobin), None).unwrap();
    assert_eq!(simulator.process(AccessEvent::load(0x1234)), AccessOutcome::CompulsoryMiss { way: 0 });
    assert_eq!(simulator.process(AccessEvent::load(0x1234)), AccessOutcome::Hit { way: 0 });
}

#[test]
fn same_block_different_offset_hits() {
    let mut simulator = Simulator::new(&config(1024, 16, 1, ReplacementPolicyConfig::RoundRobin), None).unwrap();
    simulator.process(AccessEvent::fetch(0x0040_1000));
    assert_eq!(simulator.process(AccessEvent::fetch(0x0040_100f)), AccessOutcome::Hit { way: 0 });
    assert_eq!(simulator.process(AccessEvent::fetch(0x0040_1010)), AccessOutcome::CompulsoryMiss { way: 0 });
}

#[rstest]
#[case(2)]
#[case(4)]
#[case(8)]
fn round_robin_evicts_in_insertion_order(#[case] ways: u64) {
    let mut simulator = Simulator::new(&config(1024, 16, ways, ReplacementPolicyConfig::RoundRobin), None).unwrap();
    let addresses = same_set_addresses(ways, ways as u32 * 3);
    let outcomes: Vec<_> = addresses.iter().map(|a| simulator.process(AccessEvent::store(*a))).collect();
    let ways = ways as usize;
    for (i, outcome) in outcomes.iter().enumerate() {
        let expected = if i < ways {
            AccessOutcome::CompulsoryMiss { way: i }
        } else {
            AccessOutcome::ConflictMiss { way: i % ways }
        };
        assert_eq!(*outcome, expected, "access {i}");
    }
}

#[test]
fn round_robin_ignores_recency() {
    let mut simulator = Simulator::new(&config(1024, 16, 2, ReplacementPolicyConfig::RoundRobin), None).unwrap();
    let [a, b, c] = [0x1000, 0x2000, 0x3000];
    simulator.process(AccessEvent::load(a));
    simulator.process(AccessEvent::load(b));
    // Reading a again doesn't protect it, it was placed first so it goes first
    assert_eq!(simulator.process(AccessEvent::load(a)), AccessOutcome::Hit { way: 0 });
    assert_eq!(simulator.process(AccessEvent::load(c)), AccessOutcome::ConflictMiss { way: 0 });
    assert_eq!(simulator.process(AccessEvent::load(b)), AccessOutcome::Hit { way: 1 });
    assert_eq!(simulator.process(AccessEvent::load(a)), AccessOutcome::ConflictMiss { way: 1 });
}

#[test]
fn random_is_deterministic_given_a_seed() {
    let config = config(1024, 16, 4, ReplacementPolicyConfig::Random);
    let events: Vec<_> = same_set_addresses(4, 12)
        .into_iter()
        .cycle()
        .take(200)
        .enumerate()
        .map(|(i, a)| AccessEvent::load(a.wrapping_mul(i as u32 % 5 + 1)))
        .collect();
    let run = |seed| {
        let mut simulator = Simulator::new(&config, Some(seed)).unwrap();
        events.iter().map(|e| simulator.process(*e)).collect::<Vec<_>>()
    };
    let first = run(99);
    assert_eq!(first, run(99));
    assert!(first.iter().any(|o| matches!(o, AccessOutcome::ConflictMiss { .. })));
}

#[test]
fn fetch_charges_overhead_and_counts_instructions() {
    let mut simulator = Simulator::new(&config(1024, 32, 1, ReplacementPolicyConfig::RoundRobin), None).unwrap();
    simulator.process(AccessEvent::fetch(0x40));
    assert_eq!(simulator.stats().cycles, 2 + 32);
    simulator.process(AccessEvent::fetch(0x44));
    assert_eq!(simulator.stats().cycles, 2 + 32 + 2 + 1);
    assert_eq!(simulator.stats().instructions, 2);
}

#[test]
fn memory_operands_charge_one_cycle_overhead() {
    let mut simulator = Simulator::new(&config(1024, 16, 1, ReplacementPolicyConfig::RoundRobin), None).unwrap();
    simulator.process(AccessEvent::store(0x40));
    simulator.process(AccessEvent::load(0x40));
    assert_eq!(
        *simulator.stats(),
        SimulationStats {
            accesses: 2,
            hits: 1,
            compulsory_misses: 1,
            conflict_misses: 0,
            cycles: (1 + 16) + (1 + 1),
            instructions: 0,
        }
    );
}

#[test]
fn zero_operand_is_skipped_entirely() {
    let mut simulator = Simulator::new(&config(1024, 16, 1, ReplacementPolicyConfig::RoundRobin), None).unwrap();
    assert_eq!(simulator.process(AccessEvent::load(0)), AccessOutcome::Skipped);
    assert_eq!(simulator.process(AccessEvent::store(0)), AccessOutcome::Skipped);
    assert_eq!(*simulator.stats(), SimulationStats::default());
    // Fetching address zero is a real access
    assert_eq!(simulator.process(AccessEvent::fetch(0)), AccessOutcome::CompulsoryMiss { way: 0 });
}

// The bus moves 4 bytes per 4-cycle transfer, so a block smaller than that still takes one whole
// transfer
#[rstest]
#[case(1, 4)]
#[case(2, 4)]
#[case(4, 4)]
#[case(16, 16)]
#[case(64, 64)]
fn miss_cost_is_a_full_block_transfer(#[case] block_size: u64, #[case] expected: u64) {
    let simulator = Simulator::new(&config(1024, block_size, 1, ReplacementPolicyConfig::RoundRobin), None).unwrap();
    assert_eq!(simulator.miss_cycles(), expected);
}

#[test]
fn direct_mapped_ignores_the_configured_policy() {
    let mut round_robin = Simulator::new(&config(1024, 16, 1, ReplacementPolicyConfig::RoundRobin), None).unwrap();
    let mut random = Simulator::new(&config(1024, 16, 1, ReplacementPolicyConfig::Random), None).unwrap();
    let addresses = same_set_addresses(1, 10);
    for address in addresses {
        assert_eq!(
            round_robin.process(AccessEvent::load(address)),
            random.process(AccessEvent::load(address))
        );
    }
}

#[rstest]
#[case(1, ReplacementPolicyConfig::RoundRobin)]
#[case(2, ReplacementPolicyConfig::RoundRobin)]
#[case(4, ReplacementPolicyConfig::Random)]
#[case(64, ReplacementPolicyConfig::Random)]
fn outcome_counts_are_consistent(#[case] ways: u64, #[case] policy: ReplacementPolicyConfig) {
    let mut simulator = Simulator::new(&config(1024, 16, ways, policy), Some(5)).unwrap();
    // A cheap linear congruential walk over a 16KB region, ten times the cache
    let mut address: u32 = 1;
    let mut compulsory_by_set: HashMap<usize, HashSet<u32>> = HashMap::new();
    for i in 0..5000u32 {
        address = address.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let event = match i % 3 {
            0 => AccessEvent::fetch(address & 0x3fff),
            1 => AccessEvent::load(address & 0x3fff),
            _ => AccessEvent::store(address & 0x3fff),
        };
        if let AccessOutcome::CompulsoryMiss { .. } = simulator.process(event) {
            let decoded = simulator.geometry().decode(event.address);
            compulsory_by_set.entry(decoded.index).or_default().insert(decoded.tag);
        }
    }
    let stats = simulator.stats();
    assert_eq!(stats.hits + stats.compulsory_misses + stats.conflict_misses, stats.accesses);
    let rates = stats.hit_rate().unwrap() + stats.miss_rate().unwrap();
    assert!((rates - 100.0).abs() < 1e-9);
    for tags in compulsory_by_set.values() {
        assert!(tags.len() as u64 <= ways);
    }
    assert_eq!(
        simulator.get_uninitialised_line_count(),
        simulator.geometry().total_blocks() - stats.compulsory_misses
    );
}

#[test]
fn simulate_reads_a_trace() {
    let trace = "EIP (02): 00401000 eb 05  jmp 0x401007\n\
                 dstM: 0012ff00 00000000 srcM: 0012ff00 00000000\n\
                 \n\
                 not a trace line\n\
                 EIP (02): 00401004 eb 05  jmp 0x401007\n";
    let mut simulator = Simulator::new(&config(1024, 16, 1, ReplacementPolicyConfig::RoundRobin), None).unwrap();
    let stats = simulator.simulate(Cursor::new(trace)).unwrap().clone();
    assert_eq!(
        stats,
        SimulationStats {
            accesses: 4,
            hits: 2,
            compulsory_misses: 2,
            conflict_misses: 0,
            cycles: (2 + 16) + (1 + 16) + (1 + 1) + (2 + 1),
            instructions: 2,
        }
    );
    assert_eq!(simulator.skipped_lines(), 1);
}

#[test]
fn simulate_skips_lines_which_are_not_utf8() {
    let trace: &[u8] = b"EIP (02): 00401000 eb 05\nEIP (02): 00401004 \xff\xfe mov\nEIP (02): 00401000 eb 05\n";
    let mut simulator = Simulator::new(&config(1024, 16, 1, ReplacementPolicyConfig::RoundRobin), None).unwrap();
    let stats = simulator.simulate(Cursor::new(trace)).unwrap().clone();
    assert_eq!(stats.accesses, 2);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.instructions, 2);
    assert_eq!(simulator.skipped_lines(), 1);
}

#[test]
fn empty_trace_leaves_stats_zeroed() {
    let mut simulator = Simulator::new(&config(1024, 16, 1, ReplacementPolicyConfig::RoundRobin), None).unwrap();
    let stats = simulator.simulate(Cursor::new("")).unwrap();
    assert_eq!(*stats, SimulationStats::default());
    assert!(stats.hit_rate().is_err());
}
