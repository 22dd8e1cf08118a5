//! Normalization of the `distinct_kmers` column.
//!
//! Every transform works in place: it fills (or replaces) the table's
//! `distinct_kmers_normalized` column and returns nothing but the outcome.
//! A range or spread of zero is an error rather than a column of NaN.
use crate::error::{HistError, Result};
use crate::histogram::HistogramTable;
use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// Min-max normalization: `(x - min) / (max - min)`, mapping into [0, 1]
pub fn normalize_histogram(table: &mut HistogramTable) -> Result<()> {
    let (min_val, max_val) = match table.distinct_kmers.iter().copied().minmax() {
        MinMaxResult::MinMax(min, max) => (min, max),
        MinMaxResult::OneElement(_) => {
            return Err(HistError::DegenerateRange {
                what: "min-max normalization of a single row".to_string(),
            })
        }
        MinMaxResult::NoElements => {
            return Err(HistError::DegenerateRange {
                what: "min-max normalization of an empty table".to_string(),
            })
        }
    };

    debug!(min_val, max_val, "min-max bounds");

    let range = max_val - min_val;
    if range == 0.0 {
        return Err(HistError::DegenerateRange {
            what: format!("all counts equal {}", min_val),
        });
    }

    table.distinct_kmers_normalized = Some(table.distinct_kmers.mapv(|x| (x - min_val) / range));

    Ok(())
}

/// Log normalization: `ln(x + 1)`
pub fn log_normalize_histogram(table: &mut HistogramTable) -> Result<()> {
    if let Some((row, &value)) = table.distinct_kmers.iter().find_position(|&&x| x < 0.0) {
        return Err(HistError::Domain { row, value });
    }

    table.distinct_kmers_normalized = Some(table.distinct_kmers.mapv(f64::ln_1p));

    Ok(())
}

/// Z-score normalization using the sample standard deviation (ddof = 1)
pub fn zscore_normalize_histogram(table: &mut HistogramTable) -> Result<()> {
    if table.len() < 2 {
        return Err(HistError::DegenerateRange {
            what: format!("z-score needs at least 2 rows, got {}", table.len()),
        });
    }

    let mean = table.distinct_kmers.mean().unwrap_or(0.0);
    let std = table.distinct_kmers.std(1.0);
    debug!(mean, std, "z-score moments");

    if std == 0.0 {
        return Err(HistError::DegenerateRange {
            what: "z-score of a table with zero variance".to_string(),
        });
    }

    table.distinct_kmers_normalized = Some(table.distinct_kmers.mapv(|x| (x - mean) / std));

    Ok(())
}

/// The pipeline the plots use for `normalize`: log-normalize, replace the raw
/// counts with the log values, then min-max rescale those into [0, 1]
pub fn log_min_max_normalize(table: &mut HistogramTable) -> Result<()> {
    log_normalize_histogram(table)?;

    if let Some(logged) = table.distinct_kmers_normalized.take() {
        table.distinct_kmers = logged;
    }

    normalize_histogram(table)
}

/// Named choice of transform, as selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Normalization {
    MinMax,
    Log,
    ZScore,
    LogMinMax,
}

impl Normalization {
    pub fn apply(self, table: &mut HistogramTable) -> Result<()> {
        match self {
            Normalization::MinMax => normalize_histogram(table),
            Normalization::Log => log_normalize_histogram(table),
            Normalization::ZScore => zscore_normalize_histogram(table),
            Normalization::LogMinMax => log_min_max_normalize(table),
        }
    }
}

impl FromStr for Normalization {
    type Err = HistError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "min-max" => Ok(Normalization::MinMax),
            "log" => Ok(Normalization::Log),
            "z-score" => Ok(Normalization::ZScore),
            "log-min-max" => Ok(Normalization::LogMinMax),
            other => Err(HistError::InvalidParameter {
                reason: format!("unknown normalization '{}'", other),
            }),
        }
    }
}
