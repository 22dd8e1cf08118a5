//! Chart layout for one or many k-mer histograms.
//!
//! Layout is kept apart from drawing: the functions here load, transform and
//! arrange the data into a [`Figure`], which [`crate::plotting`] then draws on
//! any `plotters` backend. Each call owns its figure, so there is no shared
//! plotting state to reset between renders.
use crate::config::PlotOptions;
use crate::error::{HistError, Result};
use crate::histogram::{HistogramTable, TableSource};
use crate::normalize::log_min_max_normalize;
use crate::smoothing::gaussian_filter1d;
use std::ops::Range;
use tracing::{debug, info};

pub const OVERLAY_SIZE: (u32, u32) = (1000, 600);
pub const GRID_SIZE: (u32, u32) = (1500, 1000);
pub const GRID_SHAPE: (usize, usize) = (2, 2);

const OVERLAY_X_RANGE: Range<f64> = 0.0..9999.0;
const GRID_X_RANGE: Range<f64> = -100.0..9999.0;
const RAW_Y_RANGE: Range<f64> = 0.0..80.0;
const NORMALIZED_Y_RANGE: Range<f64> = 0.0..0.6;
const OVERLAY_ALPHA: f64 = 0.5;

pub const OVERLAY_X_LABEL: &str = "27-mer Frequency";
pub const GRID_X_LABEL: &str = "Frequency";
pub const Y_LABEL: &str = "Number of Distinct 27-mers";
pub const NORMALIZED_Y_LABEL: &str = "Normalized Number of Distinct 27-mers";

/// How a series is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeriesStyle {
    /// A plain line at the given opacity
    Line { alpha: f64 },
    /// A line with the area down to zero filled in
    FilledArea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPosition {
    UpperLeft,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub style: SeriesStyle,
}

/// One set of axes and everything drawn on it
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub x_range: Range<f64>,
    /// `None` lets the renderer fit the range to the data
    pub y_range: Option<Range<f64>>,
    pub grid: bool,
    pub legend: Option<LegendPosition>,
    pub series: Vec<Series>,
}

impl Panel {
    /// The y range to draw: the fixed one, or one fitted to the data that
    /// always includes zero and leaves 5% headroom
    pub fn resolved_y_range(&self) -> Range<f64> {
        if let Some(range) = &self.y_range {
            return range.clone();
        }

        let (lo, hi) = self
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|&(_, y)| y))
            .filter(|y| y.is_finite())
            .fold((0.0f64, 0.0f64), |(lo, hi), y| (lo.min(y), hi.max(y)));

        let span = hi - lo;
        if span <= 0.0 {
            return 0.0..1.0;
        }
        let pad = 0.05 * span;
        let lo = if lo < 0.0 { lo - pad } else { 0.0 };
        lo..(hi + pad)
    }
}

/// A complete chart: `rows x cols` panels in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub size: (u32, u32),
    pub rows: usize,
    pub cols: usize,
    pub panels: Vec<Panel>,
}

impl Figure {
    pub fn panel(&self, row: usize, col: usize) -> Option<&Panel> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.panels.get(row * self.cols + col)
    }
}

/// Load one entry and produce the points to plot.
///
/// Normalization, when requested, is the log then min-max pipeline; smoothing
/// is applied to the plotted y values only.
fn prepare_points(label: &str, source: &TableSource, options: &PlotOptions) -> Result<Vec<(f64, f64)>> {
    let mut table = HistogramTable::from_source(source)?;
    debug!(label, source = %source.describe(), rows = table.len(), "loaded histogram");

    if options.normalize {
        log_min_max_normalize(&mut table)?;
    }

    let mut y = table.y_values();
    if options.smoothing {
        y = gaussian_filter1d(&y, options.sigma)?;
    }

    Ok(table.x_values().into_iter().zip(y).collect())
}

/// Overlay every histogram as a semi-transparent line on one set of axes,
/// with a shared legend in the upper-left corner.
pub fn plot_kmer_histograms(entries: &[(String, TableSource)], options: &PlotOptions) -> Result<Figure> {
    info!(entries = entries.len(), normalize = options.normalize, smoothing = options.smoothing, "building overlay");

    let mut series = Vec::with_capacity(entries.len());
    for (label, source) in entries {
        series.push(Series {
            label: label.clone(),
            points: prepare_points(label, source, options)?,
            style: SeriesStyle::Line { alpha: OVERLAY_ALPHA },
        });
    }

    let (y_label, y_range) = if options.normalize {
        (NORMALIZED_Y_LABEL, NORMALIZED_Y_RANGE)
    } else {
        (Y_LABEL, RAW_Y_RANGE)
    };

    Ok(Figure {
        size: OVERLAY_SIZE,
        rows: 1,
        cols: 1,
        panels: vec![Panel {
            title: None,
            x_label: OVERLAY_X_LABEL.to_string(),
            y_label: y_label.to_string(),
            x_range: OVERLAY_X_RANGE,
            y_range: Some(y_range),
            grid: true,
            legend: Some(LegendPosition::UpperLeft),
            series,
        }],
    })
}

/// Lay out exactly four histograms as a 2x2 grid of filled-area charts.
///
/// Entry `i` goes to row `i / 2`, column `i % 2`. Any other number of entries
/// is rejected before a single table is read.
pub fn plot_kmer_histogram_grid(entries: &[(String, TableSource)], options: &PlotOptions) -> Result<Figure> {
    let (rows, cols) = GRID_SHAPE;
    if entries.len() != rows * cols {
        return Err(HistError::ShapeMismatch {
            expected: rows * cols,
            actual: entries.len(),
        });
    }

    info!(normalize = options.normalize, smoothing = options.smoothing, "building 2x2 grid");

    let mut panels = Vec::with_capacity(rows * cols);
    for (i, (label, source)) in entries.iter().enumerate() {
        debug!(label = label.as_str(), row = i / cols, col = i % cols, "grid cell");

        panels.push(Panel {
            title: Some(label.clone()),
            x_label: GRID_X_LABEL.to_string(),
            y_label: Y_LABEL.to_string(),
            x_range: GRID_X_RANGE,
            y_range: if options.normalize { None } else { Some(RAW_Y_RANGE) },
            grid: true,
            legend: None,
            series: vec![Series {
                label: label.clone(),
                points: prepare_points(label, source, options)?,
                style: SeriesStyle::FilledArea,
            }],
        });
    }

    Ok(Figure {
        size: GRID_SIZE,
        rows,
        cols,
        panels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> TableSource {
        TableSource::Text(s.to_string())
    }

    fn entries(labels: &[&str]) -> Vec<(String, TableSource)> {
        labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.to_string(), text(&format!("1 {}\n2 {}\n3 5\n", 10 + i, 40 + i))))
            .collect()
    }

    #[test]
    fn test_overlay_raw_axes() {
        let figure = plot_kmer_histograms(&entries(&["A", "B"]), &PlotOptions::default()).unwrap();
        let panel = figure.panel(0, 0).unwrap();

        assert_eq!(figure.size, OVERLAY_SIZE);
        assert_eq!(panel.x_range, 0.0..9999.0);
        assert_eq!(panel.y_range, Some(0.0..80.0));
        assert_eq!(panel.y_label, "Number of Distinct 27-mers");
        assert_eq!(panel.x_label, "27-mer Frequency");
        assert_eq!(panel.legend, Some(LegendPosition::UpperLeft));
        assert_eq!(panel.series.len(), 2);
        assert_eq!(panel.series[1].label, "B");
        assert_eq!(panel.series[1].points, vec![(1.0, 11.0), (2.0, 41.0), (3.0, 5.0)]);
        assert_eq!(panel.series[0].style, SeriesStyle::Line { alpha: 0.5 });
    }

    #[test]
    fn test_overlay_normalized_axes() {
        let options = PlotOptions { normalize: true, ..PlotOptions::default() };
        let figure = plot_kmer_histograms(&entries(&["A"]), &options).unwrap();
        let panel = figure.panel(0, 0).unwrap();

        assert_eq!(panel.y_range, Some(0.0..0.6));
        assert_eq!(panel.y_label, "Normalized Number of Distinct 27-mers");
        assert!(panel.series[0].points.iter().all(|&(_, y)| (0.0..=1.0).contains(&y)));
    }

    #[test]
    fn test_overlay_smoothing_keeps_x() {
        let options = PlotOptions { smoothing: true, sigma: 1.0, ..PlotOptions::default() };
        let figure = plot_kmer_histograms(&entries(&["A"]), &options).unwrap();
        let points = &figure.panels[0].series[0].points;

        assert_eq!(points.len(), 3);
        assert_eq!(points.iter().map(|p| p.0).collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
        assert_ne!(points[1].1, 40.0);
    }

    #[test]
    fn test_overlay_propagates_errors() {
        let bad = vec![("A".to_string(), text("1 2 3\n"))];
        assert!(matches!(
            plot_kmer_histograms(&bad, &PlotOptions::default()),
            Err(HistError::Parse { .. })
        ));

        let constant = vec![("A".to_string(), text("1 4\n2 4\n"))];
        let options = PlotOptions { normalize: true, ..PlotOptions::default() };
        assert!(matches!(
            plot_kmer_histograms(&constant, &options),
            Err(HistError::DegenerateRange { .. })
        ));
    }

    #[test]
    fn test_grid_cell_order() {
        let figure = plot_kmer_histogram_grid(&entries(&["A", "B", "C", "D"]), &PlotOptions::default()).unwrap();

        let titles: Vec<_> = [(0, 0), (0, 1), (1, 0), (1, 1)]
            .iter()
            .map(|&(r, c)| figure.panel(r, c).unwrap().title.clone().unwrap())
            .collect();
        assert_eq!(titles, vec!["A", "B", "C", "D"]);
        assert!(figure.panel(2, 0).is_none());

        let cell = figure.panel(1, 0).unwrap();
        assert_eq!(cell.x_range, -100.0..9999.0);
        assert_eq!(cell.y_range, Some(0.0..80.0));
        assert_eq!(cell.x_label, "Frequency");
        assert_eq!(cell.series[0].style, SeriesStyle::FilledArea);
        assert_eq!(cell.series[0].points[0], (1.0, 12.0));
    }

    #[test]
    fn test_grid_normalized_is_unconstrained() {
        let options = PlotOptions { normalize: true, ..PlotOptions::default() };
        let figure = plot_kmer_histogram_grid(&entries(&["A", "B", "C", "D"]), &options).unwrap();

        for panel in &figure.panels {
            assert!(panel.y_range.is_none());
            let range = panel.resolved_y_range();
            assert_eq!(range.start, 0.0);
            assert!((range.end - 1.05).abs() < 1e-12);
        }
    }

    #[test]
    fn test_grid_shape_mismatch() {
        let err = plot_kmer_histogram_grid(&entries(&["A", "B", "C"]), &PlotOptions::default()).unwrap_err();
        assert!(matches!(err, HistError::ShapeMismatch { expected: 4, actual: 3 }));

        // the count is checked before any source is opened
        let mut five = entries(&["A", "B", "C", "D"]);
        five.push(("E".to_string(), TableSource::Path("/no/such/file.hist".into())));
        let err = plot_kmer_histogram_grid(&five, &PlotOptions::default()).unwrap_err();
        assert!(matches!(err, HistError::ShapeMismatch { expected: 4, actual: 5 }));
    }

    #[test]
    fn test_resolved_range_for_flat_data() {
        let panel = Panel {
            title: None,
            x_label: String::new(),
            y_label: String::new(),
            x_range: 0.0..1.0,
            y_range: None,
            grid: false,
            legend: None,
            series: vec![],
        };
        assert_eq!(panel.resolved_y_range(), 0.0..1.0);
    }
}
