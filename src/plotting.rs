use crate::error::{HistError, Result};
use crate::figure::{Figure, LegendPosition, Panel, SeriesStyle};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;
use tracing::info;

const FONT: &str = "sans-serif";
const FILL_ALPHA: f64 = 0.3;

fn render_error<E: std::fmt::Display>(err: E) -> HistError {
    HistError::Render {
        message: err.to_string(),
    }
}

fn label_position(position: LegendPosition) -> SeriesLabelPosition {
    match position {
        LegendPosition::UpperLeft => SeriesLabelPosition::UpperLeft,
    }
}

/// Clip the segment `a -> b` to the rectangle `x` by `y` (Liang-Barsky).
///
/// Endpoints already inside are returned unchanged.
fn clip_segment(
    a: (f64, f64),
    b: (f64, f64),
    x: &Range<f64>,
    y: &Range<f64>,
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);

    for (p, q) in [
        (-dx, a.0 - x.start),
        (dx, x.end - a.0),
        (-dy, a.1 - y.start),
        (dy, y.end - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| if t == 0.0 { a } else if t == 1.0 { b } else { (a.0 + t * dx, a.1 + t * dy) };
    Some((at(t0), at(t1)))
}

/// Cut a polyline into the runs that lie inside the plotting area, so a
/// curve leaving the axes is interrupted instead of pinned to the edge
fn clip_polyline(points: &[(f64, f64)], x: &Range<f64>, y: &Range<f64>) -> Vec<Vec<(f64, f64)>> {
    let inside = |p: &(f64, f64)| p.0 >= x.start && p.0 <= x.end && p.1 >= y.start && p.1 <= y.end;

    if let [only] = points {
        return if inside(only) { vec![vec![*only]] } else { Vec::new() };
    }

    let mut runs: Vec<Vec<(f64, f64)>> = Vec::new();
    for pair in points.windows(2) {
        let Some((start, end)) = clip_segment(pair[0], pair[1], x, y) else {
            continue;
        };
        match runs.last_mut() {
            Some(run) if run.last() == Some(&start) => run.push(end),
            _ => runs.push(vec![start, end]),
        }
    }

    runs
}

/// Whether `path` should be written as SVG rather than a bitmap
fn wants_svg(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("svg"))
}

/// Draw a figure on an existing drawing area.
///
/// The area is split row-major into `figure.rows x figure.cols` cells and
/// each panel is drawn into its own cell.
pub fn draw_figure<DB: DrawingBackend>(figure: &Figure, root: &DrawingArea<DB, Shift>) -> Result<()> {
    root.fill(&WHITE).map_err(render_error)?;

    let cells = root.split_evenly((figure.rows, figure.cols));
    for (cell, panel) in cells.iter().zip(&figure.panels) {
        draw_panel(cell, panel)?;
    }

    root.present().map_err(render_error)?;

    Ok(())
}

fn draw_panel<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, panel: &Panel) -> Result<()> {
    let y_range = panel.resolved_y_range();

    let mut builder = ChartBuilder::on(area);
    builder.margin(20).x_label_area_size(60).y_label_area_size(80);
    if let Some(title) = &panel.title {
        builder.caption(title, (FONT, 24).into_font());
    }
    let mut chart = builder
        .build_cartesian_2d(panel.x_range.clone(), y_range.clone())
        .map_err(render_error)?;

    {
        let mut mesh = chart.configure_mesh();
        mesh.x_desc(panel.x_label.as_str())
            .y_desc(panel.y_label.as_str())
            .label_style((FONT, 14))
            .axis_desc_style((FONT, 16));
        if !panel.grid {
            mesh.disable_mesh();
        }
        mesh.draw().map_err(render_error)?;
    }

    for (idx, series) in panel.series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let runs = clip_polyline(&series.points, &panel.x_range, &y_range);

        match series.style {
            SeriesStyle::Line { alpha } => {
                let line = color.mix(alpha);
                // an empty run still carries the legend entry of a curve
                // lying wholly outside the axes
                let runs = if runs.is_empty() { vec![Vec::new()] } else { runs };
                for (run_idx, run) in runs.iter().enumerate() {
                    let drawn = chart
                        .draw_series(LineSeries::new(run.iter().copied(), line.stroke_width(2)))
                        .map_err(render_error)?;
                    // one legend entry per series, however many runs it was cut into
                    if run_idx == 0 && panel.legend.is_some() {
                        drawn
                            .label(series.label.as_str())
                            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line.stroke_width(2)));
                    }
                }
            }
            SeriesStyle::FilledArea => {
                // capping the fill at the top edge matches clipping it, the
                // baseline is zero
                let capped = series
                    .points
                    .iter()
                    .map(|&(x, y)| (x, y.clamp(y_range.start, y_range.end)));
                chart
                    .draw_series(AreaSeries::new(capped, 0.0, color.mix(FILL_ALPHA)))
                    .map_err(render_error)?;
                for run in &runs {
                    chart
                        .draw_series(LineSeries::new(run.iter().copied(), color.stroke_width(2)))
                        .map_err(render_error)?;
                }
            }
        }
    }

    if let Some(position) = panel.legend {
        chart
            .configure_series_labels()
            .position(label_position(position))
            .label_font((FONT, 14))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(render_error)?;
    }

    Ok(())
}

/// Write a figure to `path`: SVG for a `.svg` extension, a bitmap (PNG)
/// otherwise
pub fn save_figure<P: AsRef<Path>>(figure: &Figure, path: P) -> Result<()> {
    let path = path.as_ref();

    if wants_svg(path) {
        let root = SVGBackend::new(path, figure.size).into_drawing_area();
        draw_figure(figure, &root)?;
    } else {
        let root = BitMapBackend::new(path, figure.size).into_drawing_area();
        draw_figure(figure, &root)?;
    }

    info!(path = %path.display(), "figure written");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlotOptions;
    use crate::figure::{plot_kmer_histogram_grid, plot_kmer_histograms};
    use crate::histogram::TableSource;

    fn entries(n: usize) -> Vec<(String, TableSource)> {
        (0..n)
            .map(|i| {
                let rows: String = (1..200).map(|f| format!("{} {}\n", f * 40, (f * (i + 3)) % 70)).collect();
                (format!("sample{}", i), TableSource::Text(rows))
            })
            .collect()
    }

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn test_clip_cuts_excursion_above_range() {
        let points = [(0.0, 0.2), (1.0, 1.0), (2.0, 0.2), (3.0, 0.3)];
        let runs = clip_polyline(&points, &(0.0..10.0), &(0.0..0.6));

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[0][0], (0.0, 0.2));
        assert!(close(runs[0][1], (0.5, 0.6)));
        assert_eq!(runs[1].len(), 3);
        assert!(close(runs[1][0], (1.5, 0.6)));
        assert_eq!(runs[1][2], (3.0, 0.3));
    }

    #[test]
    fn test_clip_keeps_inside_and_drops_outside() {
        let inside = [(0.0, 1.0), (5.0, 2.0), (9.0, 3.0)];
        assert_eq!(clip_polyline(&inside, &(0.0..10.0), &(0.0..80.0)), vec![inside.to_vec()]);

        let above = [(0.0, 100.0), (5.0, 120.0)];
        assert!(clip_polyline(&above, &(0.0..10.0), &(0.0..80.0)).is_empty());

        assert_eq!(clip_polyline(&[(1.0, 1.0)], &(0.0..10.0), &(0.0..80.0)), vec![vec![(1.0, 1.0)]]);
        assert!(clip_polyline(&[(11.0, 1.0)], &(0.0..10.0), &(0.0..80.0)).is_empty());

        // leaving past the right edge stops at x = 10
        let runs = clip_polyline(&[(8.0, 1.0), (12.0, 1.0)], &(0.0..10.0), &(0.0..80.0));
        assert!(close(runs[0][1], (10.0, 1.0)));
    }

    fn render_svg(figure: &Figure) -> String {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, figure.size).into_drawing_area();
            draw_figure(figure, &root).unwrap();
        }
        svg
    }

    #[test]
    fn test_draw_overlay_in_memory() {
        let options = PlotOptions {
            normalize: true,
            ..PlotOptions::default()
        };
        let figure = plot_kmer_histograms(&entries(3), &options).unwrap();
        let svg = render_svg(&figure);

        for label in ["sample0", "sample1", "sample2"] {
            assert!(svg.contains(label), "legend is missing {}", label);
        }
        // each series draws at least one line, plus its legend swatch
        assert!(svg.matches("<polyline").count() >= 6);
    }

    #[test]
    fn test_draw_grid_in_memory() {
        let figure = plot_kmer_histogram_grid(&entries(4), &PlotOptions::default()).unwrap();
        let svg = render_svg(&figure);

        for label in ["sample0", "sample1", "sample2", "sample3"] {
            assert!(svg.contains(label), "missing cell title {}", label);
        }
        assert!(svg.matches("<polygon").count() >= 4);
        assert!(svg.matches("<polyline").count() >= 4);
    }

    #[test]
    fn test_backend_choice() {
        assert!(wants_svg(Path::new("out/overlay.svg")));
        assert!(wants_svg(Path::new("OVERLAY.SVG")));
        assert!(!wants_svg(Path::new("overlay.png")));
        assert!(!wants_svg(Path::new("overlay")));
    }

    #[test]
    fn test_legend_position() {
        assert!(matches!(
            label_position(LegendPosition::UpperLeft),
            SeriesLabelPosition::UpperLeft
        ));
    }

    #[test]
    fn test_save_overlay_and_grid() {
        let dir = tempfile::tempdir().unwrap();
        let options = PlotOptions {
            normalize: true,
            smoothing: true,
            ..PlotOptions::default()
        };

        let overlay = plot_kmer_histograms(&entries(3), &options).unwrap();
        let overlay_path = dir.path().join("overlay.png");
        save_figure(&overlay, &overlay_path).unwrap();
        assert!(std::fs::metadata(&overlay_path).unwrap().len() > 0);

        let grid = plot_kmer_histogram_grid(&entries(4), &PlotOptions::default()).unwrap();
        let grid_path = dir.path().join("grid.svg");
        save_figure(&grid, &grid_path).unwrap();
        let svg = std::fs::read_to_string(&grid_path).unwrap();
        assert!(svg.contains("sample3"));
    }
}
