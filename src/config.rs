use crate::error::{HistError, Result};
use crate::histogram::TableSource;
use crate::smoothing::DEFAULT_SIGMA;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Presentation flags shared by the overlay and grid layouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    /// Apply log then min-max normalization before plotting
    pub normalize: bool,
    /// Gaussian-smooth each curve before plotting
    pub smoothing: bool,
    /// Standard deviation of the smoothing kernel
    pub sigma: f64,
    /// Export destination; layout never reads it
    pub output: Option<PathBuf>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        PlotOptions {
            normalize: false,
            smoothing: false,
            sigma: DEFAULT_SIGMA,
            output: None,
        }
    }
}

impl PlotOptions {
    /// Load options from a JSON file; absent keys take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let options = serde_json::from_reader(BufReader::new(file))?;
        Ok(options)
    }
}

/// Parse a `LABEL=PATH` command line entry
pub fn parse_entry(arg: &str) -> Result<(String, TableSource)> {
    match arg.split_once('=') {
        Some((label, path)) if !label.is_empty() && !path.is_empty() => {
            Ok((label.to_string(), TableSource::Path(PathBuf::from(path))))
        }
        _ => Err(HistError::InvalidParameter {
            reason: format!("expected LABEL=PATH, got '{}'", arg),
        }),
    }
}
