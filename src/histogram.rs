use crate::error::{HistError, Result};
use ndarray::Array1;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Tokens treated as a missing value; rows containing one are dropped
const MISSING_TOKENS: &[&str] = &["nan", "na", "n/a"];

/// Where a histogram table is read from
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    /// A `.hist` file on disk
    Path(PathBuf),
    /// Table text already held in memory
    Text(String),
}

impl TableSource {
    /// Human readable origin, used in log lines
    pub fn describe(&self) -> String {
        match self {
            TableSource::Path(path) => path.display().to_string(),
            TableSource::Text(_) => "<in-memory table>".to_string(),
        }
    }
}

/// One row of a k-mer histogram
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramRecord {
    pub frequency: u64,
    pub distinct_kmers: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinct_kmers_normalized: Option<f64>,
}

/// A k-mer frequency histogram: `frequency` buckets against the number of
/// distinct k-mers seen that many times.
///
/// The derived `distinct_kmers_normalized` column is absent until one of the
/// functions in [`crate::normalize`] fills it in place.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramTable {
    pub(crate) frequency: Array1<u64>,
    pub(crate) distinct_kmers: Array1<f64>,
    pub(crate) distinct_kmers_normalized: Option<Array1<f64>>,
}

impl HistogramTable {
    /// Build a table from `(frequency, distinct_kmers)` pairs
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (u64, f64)>,
    {
        let (frequency, distinct_kmers): (Vec<u64>, Vec<f64>) = records.into_iter().unzip();

        HistogramTable {
            frequency: Array1::from(frequency),
            distinct_kmers: Array1::from(distinct_kmers),
            distinct_kmers_normalized: None,
        }
    }

    /// Parse a whitespace-delimited, header-less two-column table.
    ///
    /// Lines starting with `#` are comments and blank lines are skipped.
    /// Rows with a missing value are dropped; anything else that does not
    /// fit the two-column layout is a parse error.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut records = Vec::new();
        let mut dropped = 0usize;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;

            // Trailing comments are allowed on data lines too
            let content = match line.find('#') {
                Some(pos) => &line[..pos],
                None => line.as_str(),
            };

            let fields: Vec<&str> = content.split_whitespace().collect();
            match fields.as_slice() {
                [] => continue,
                [_] => dropped += 1,
                [freq, count] => {
                    if is_missing(freq) || is_missing(count) {
                        dropped += 1;
                        continue;
                    }
                    records.push((parse_frequency(freq, line_no)?, parse_count(count, line_no)?));
                }
                _ => {
                    return Err(HistError::Parse {
                        line: line_no,
                        reason: format!("expected 2 columns, found {}", fields.len()),
                    })
                }
            }
        }

        debug!(rows = records.len(), dropped, "parsed histogram table");

        Ok(Self::from_records(records))
    }

    /// Read a table from a file; the handle is closed once parsing ends
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_source(source: &TableSource) -> Result<Self> {
        match source {
            TableSource::Path(path) => Self::from_path(path),
            TableSource::Text(text) => Self::from_reader(Cursor::new(text.as_bytes())),
        }
    }

    pub fn len(&self) -> usize {
        self.frequency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequency.is_empty()
    }

    pub fn frequency(&self) -> &Array1<u64> {
        &self.frequency
    }

    pub fn distinct_kmers(&self) -> &Array1<f64> {
        &self.distinct_kmers
    }

    pub fn distinct_kmers_normalized(&self) -> Option<&Array1<f64>> {
        self.distinct_kmers_normalized.as_ref()
    }

    /// Row view of the table, including the derived column when present
    pub fn records(&self) -> Vec<HistogramRecord> {
        (0..self.len())
            .map(|i| HistogramRecord {
                frequency: self.frequency[i],
                distinct_kmers: self.distinct_kmers[i],
                distinct_kmers_normalized: self.distinct_kmers_normalized.as_ref().map(|n| n[i]),
            })
            .collect()
    }

    /// The series a chart plots: the normalized column if one was derived,
    /// the raw counts otherwise
    pub fn y_values(&self) -> Vec<f64> {
        match &self.distinct_kmers_normalized {
            Some(normalized) => normalized.to_vec(),
            None => self.distinct_kmers.to_vec(),
        }
    }

    /// `frequency` as chart x coordinates
    pub fn x_values(&self) -> Vec<f64> {
        self.frequency.iter().map(|&f| f as f64).collect()
    }
}

fn is_missing(token: &str) -> bool {
    MISSING_TOKENS.iter().any(|m| token.eq_ignore_ascii_case(m))
}

fn parse_frequency(token: &str, line: usize) -> Result<u64> {
    token.parse::<u64>().map_err(|_| HistError::Parse {
        line,
        reason: format!("frequency '{}' is not a non-negative integer", token),
    })
}

fn parse_count(token: &str, line: usize) -> Result<f64> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(HistError::Parse {
            line,
            reason: format!("distinct k-mer count '{}' is not a number", token),
        }),
    }
}
