use std::error::Error;
use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use regex::Regex;
use crate::config::CacheConfig;
use crate::stats::SimulationStats;

pub const CONFIGS_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/configs");
pub const OUTPUTS_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/outputs");
pub const TRACES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/traces");

pub struct TestCasePaths {
    pub config: String,
    pub trace: String,
    pub output: String
}

/// Finds every fixture case, one per expected output file named `output-<trace>-<config>.json`
pub fn get_configs() -> Result<Vec<TestCasePaths>, Box<dyn Error>> {
    let mut out = Vec::new();
    let output_file_directory = fs::read_dir(OUTPUTS_PATH)?;
    let output_pattern = Regex::new(r"output-(?P<trace>[0-9a-zA-Z_]+)-(?P<config>[0-9a-zA-Z_]+)\.json")?;
    let mut files = Vec::new();
    for entry in output_file_directory {
        let entry = entry?;
        let file_name = entry.file_name().into_string().map_err(|e| format!("Can't convert OS string ({e:?}) to standard string"))?;
        if output_pattern.is_match(&file_name) {
            files.push(file_name);
        }
    }
    files.sort();
    for file_name in files {
        // Get components of name
        let tokens = output_pattern.captures(&file_name).ok_or("Couldn't parse the file name".to_string())?;
        let trace_file_path = tokens.name("trace").ok_or("Couldn't get the trace file from the output file name".to_string())?.as_str();
        let config_file_path = tokens.name("config").ok_or("Couldn't get the config file from the output file name".to_string())?.as_str();
        out.push(TestCasePaths {
            config: format!("{CONFIGS_PATH}/{config_file_path}.json"),
            trace: format!("{TRACES_PATH}/{trace_file_path}.trc"),
            output: format!("{OUTPUTS_PATH}/{file_name}"),
        })
    }
    Ok(out)
}

/// Reads a JSON cache configuration
pub fn load_config(path: impl AsRef<Path>) -> Result<CacheConfig, Box<dyn Error>> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Reads the expected statistics of a fixture case
pub fn load_expected(path: impl AsRef<Path>) -> Result<SimulationStats, Box<dyn Error>> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
