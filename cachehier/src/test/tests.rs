use std::error::Error as StdError;
use std::io::Write;

use tempfile::NamedTempFile;

use super::init_logging;
use crate::config::{CacheKindConfig, LayeredCacheConfig, ReplacementPolicyConfig};
use crate::error::Error;
use crate::io::read_trace;
use crate::simulator::{CacheResult, LayeredCacheResult, MalformedRecordPolicy, Simulator};

const CONFIG: &str = r#"{
    "caches": [
        {"name": "L1", "size": 64, "line_size": 16, "kind": "direct"},
        {"name": "L2", "size": 128, "line_size": 16, "kind": "full", "replacement_policy": "lru"}
    ]
}"#;

const TRACE: &str = "\
0000000000400000 0000000000000000 R 004
0000000000400004 0000000000000040 R 004
400008 0 W 4
000000000040000c 000000000000000e R 004
garbage
0000000000400010 0000000000000010 W 001
";

fn write_temp(contents: &str) -> Result<NamedTempFile, Box<dyn StdError>> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn expected() -> LayeredCacheResult {
    LayeredCacheResult {
        main_memory_accesses: 3,
        caches: vec![
            CacheResult {
                name: "L1".to_string(),
                hits: 2,
                misses: 4,
            },
            CacheResult {
                name: "L2".to_string(),
                hits: 1,
                misses: 3,
            },
        ],
    }
}

#[test]
fn run_config_and_trace_files() -> Result<(), Box<dyn StdError>> {
    init_logging();
    let config_file = write_temp(CONFIG)?;
    let trace_file = write_temp(TRACE)?;

    let config = LayeredCacheConfig::from_path(config_file.path())?;
    assert_eq!(config.caches[0].kind, CacheKindConfig::Direct);
    assert_eq!(config.caches[0].replacement_policy, ReplacementPolicyConfig::RoundRobin);
    assert_eq!(config.caches[1].replacement_policy, ReplacementPolicyConfig::LeastRecentlyUsed);

    let mut simulator = Simulator::new(&config)?;
    let trace = read_trace(trace_file.path())?;
    let result = simulator.simulate(&trace)?;
    assert_eq!(*result, expected());
    assert_eq!(simulator.skipped_records(), 1);
    assert_eq!(simulator.timer(), 5);
    assert_eq!(simulator.get_uninitialised_line_counts(), vec![2, 5]);
    Ok(())
}

#[test]
fn simulate_accumulates_across_calls() -> Result<(), Box<dyn StdError>> {
    let config = LayeredCacheConfig::from_reader(CONFIG.as_bytes())?;
    let mut simulator = Simulator::new(&config)?;
    let (first, second) = TRACE.split_at(TRACE.find("000000000040000c").unwrap());
    simulator.simulate(first.as_bytes())?;
    let result = simulator.simulate(second.as_bytes())?;
    assert_eq!(*result, expected());
    Ok(())
}

#[test]
fn abort_on_malformed_record() -> Result<(), Box<dyn StdError>> {
    let config = LayeredCacheConfig::from_reader(CONFIG.as_bytes())?;
    let mut simulator = Simulator::new(&config)?.with_malformed_records(MalformedRecordPolicy::Abort);
    match simulator.simulate(TRACE.as_bytes()) {
        Err(Error::MalformedTraceEvent { line, .. }) => assert_eq!(line, 5),
        other => panic!("expected a malformed record error, got {other:?}"),
    }
    // Everything before the bad record was simulated
    assert_eq!(simulator.timer(), 4);
    assert_eq!(simulator.main_memory_accesses(), 3);
    Ok(())
}

#[test]
fn empty_trace_file() -> Result<(), Box<dyn StdError>> {
    let config = LayeredCacheConfig::from_reader(CONFIG.as_bytes())?;
    let trace_file = write_temp("")?;
    let trace = read_trace(trace_file.path())?;
    let mut simulator = Simulator::new(&config)?;
    let result = simulator.simulate(&trace)?;
    assert_eq!(result.main_memory_accesses, 0);
    assert!(result.caches.iter().all(|c| c.hits == 0 && c.misses == 0));
    Ok(())
}

#[test]
fn config_accepts_canonical_variant_names() -> Result<(), Box<dyn StdError>> {
    let config = LayeredCacheConfig::from_reader(
        r#"{"caches": [{"name": "L1", "size": 1024, "line_size": 64, "kind": "EightWay", "replacement_policy": "LeastFrequentlyUsed"},
                       {"name": "L2", "size": 4096, "line_size": 64, "kind": "4way", "replacement_policy": "rr"},
                       {"name": "L3", "size": 8192, "line_size": 64, "kind": "2way", "replacement_policy": "lfu"}]}"#
            .as_bytes(),
    )?;
    let kinds: Vec<_> = config.caches.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![CacheKindConfig::EightWay, CacheKindConfig::FourWay, CacheKindConfig::TwoWay]
    );
    assert_eq!(config.caches[0].replacement_policy, ReplacementPolicyConfig::LeastFrequentlyUsed);
    assert_eq!(config.caches[1].replacement_policy, ReplacementPolicyConfig::RoundRobin);
    Simulator::new(&config)?;
    Ok(())
}

#[test]
fn config_rejects_unknown_kinds() {
    let err = LayeredCacheConfig::from_reader(
        r#"{"caches": [{"name": "L1", "size": 1024, "line_size": 64, "kind": "16way"}]}"#.as_bytes(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn missing_files_are_io_errors() {
    let err = LayeredCacheConfig::from_path("/nonexistent/config.json").unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(matches!(read_trace("/nonexistent/trace.out"), Err(Error::Io(_))));
}
