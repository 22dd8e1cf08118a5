use crate::config::PlotOptions;
use crate::error::{HistError, Result};
use crate::figure::{plot_kmer_histogram_grid, plot_kmer_histograms};
use crate::histogram::{HistogramTable, TableSource};
use crate::normalize::Normalization;
use crate::plotting::save_figure;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Which chart layout to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Overlay,
    Grid,
}

/// Lay out the entries and write the chart to `options.output`.
///
/// Returns the path that was written.
pub fn render(layout: Layout, entries: &[(String, TableSource)], options: &PlotOptions) -> Result<PathBuf> {
    let output = options.output.clone().ok_or_else(|| HistError::InvalidParameter {
        reason: "an output path is required to export a chart".to_string(),
    })?;

    info!(?layout, entries = entries.len(), output = %output.display(), "rendering");

    let figure = match layout {
        Layout::Overlay => plot_kmer_histograms(entries, options)?,
        Layout::Grid => plot_kmer_histogram_grid(entries, options)?,
    };

    save_figure(&figure, &output)?;

    Ok(output)
}

/// Normalize one table and write it to `out`, as tab-separated rows or as a
/// pretty-printed JSON array of records
pub fn normalize_table<W: Write>(
    source: &TableSource,
    method: Normalization,
    json: bool,
    out: &mut W,
) -> Result<()> {
    let mut table = HistogramTable::from_source(source)?;
    method.apply(&mut table)?;

    info!(source = %source.describe(), ?method, rows = table.len(), "normalized table");

    if json {
        serde_json::to_writer_pretty(&mut *out, &table.records())?;
        writeln!(out)?;
    } else {
        writeln!(out, "frequency\tdistinct_kmers\tdistinct_kmers_normalized")?;
        for record in table.records() {
            writeln!(
                out,
                "{}\t{}\t{}",
                record.frequency,
                record.distinct_kmers,
                record.distinct_kmers_normalized.unwrap_or(f64::NAN)
            )?;
        }
    }

    Ok(())
}
