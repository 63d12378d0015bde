/// Result persistence
///
/// - `<id>.npz`: compressed archive of the four summary scalars, readable
///   with `numpy.load`
/// - `<id>.png`: two panels, TBLER histogram with the target marked as a
///   dashed red line, and a bar chart of TBLER / throughput (kbit) / NACK rate
///
/// Text is rendered with the system `sans-serif` font; a missing font
/// surfaces as [`Error::Plot`].

use ndarray::arr0;
use ndarray_npy::NpzWriter;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::stats::ExperimentSummary;

pub const CHART_SIZE: (u32, u32) = (1800, 600);
pub const HISTOGRAM_BINS: usize = 20;

const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const LIGHT_CORAL: RGBColor = RGBColor(240, 128, 128);
const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);
const LIGHT_SALMON: RGBColor = RGBColor(255, 160, 122);
const GRID_GRAY: RGBColor = RGBColor(220, 220, 220);

const METRIC_NAMES: [&str; 3] = ["TBLER", "Throughput (kbit)", "HARQ NACK rate"];

fn plot_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Plot(e.to_string())
}

/// Write `<dir>/<experiment_id>.npz`, creating `dir` if needed
pub fn save_summary(dir: &Path, experiment_id: &str, summary: &ExperimentSummary) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{experiment_id}.npz"));

    let mut npz = NpzWriter::new_compressed(File::create(&path)?);
    for (name, value) in summary.fields() {
        npz.add_array(name, &arr0(value))?;
    }
    npz.finish()?;

    tracing::info!(path = %path.display(), "summary archive written");
    Ok(path)
}

/// Equal-width histogram over `[min, max]` of `values`, last bin closed
///
/// Returns `(lower edge, bin width, counts)`. A degenerate range is widened
/// by 0.5 on each side.
pub fn histogram(values: &[f32], bins: usize) -> (f64, f64, Vec<u32>) {
    let bins = bins.max(1);
    let mut counts = vec![0u32; bins];
    if values.is_empty() {
        return (0.0, 1.0 / bins as f64, counts);
    }

    let lo = values.iter().fold(f64::INFINITY, |m, &v| m.min(f64::from(v)));
    let hi = values.iter().fold(f64::NEG_INFINITY, |m, &v| m.max(f64::from(v)));
    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
    let width = (hi - lo) / bins as f64;

    for &v in values {
        let bin = ((f64::from(v) - lo) / width) as usize;
        counts[bin.min(bins - 1)] += 1;
    }
    (lo, width, counts)
}

/// Write `<dir>/<experiment_id>.png`, creating `dir` if needed
pub fn save_chart(
    dir: &Path,
    experiment_id: &str,
    bler_target: f32,
    tbler: &[f32],
    summary: &ExperimentSummary,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{experiment_id}.png"));

    {
        let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(plot_err)?;
        let (left, right) = root.split_horizontally((CHART_SIZE.0 / 2) as i32);

        draw_tbler_histogram(&left, bler_target, tbler)?;
        draw_summary_bars(&right, experiment_id, summary)?;

        root.present().map_err(plot_err)?;
    }

    tracing::info!(path = %path.display(), "chart written");
    Ok(path)
}

fn draw_tbler_histogram<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    bler_target: f32,
    tbler: &[f32],
) -> Result<()> {
    let (lo, width, counts) = histogram(tbler, HISTOGRAM_BINS);
    let hi = lo + width * counts.len() as f64;
    let target = f64::from(bler_target);

    let x_min = lo.min(target) - width;
    let x_max = hi.max(target) + width;
    let y_max = f64::from(counts.iter().copied().max().unwrap_or(0)) + 1.0;

    let mut chart = ChartBuilder::on(area)
        .caption("TBLER Distribution", ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("TBLER")
        .y_desc("Frequency")
        .light_line_style(GRID_GRAY)
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(counts.iter().enumerate().map(|(i, &count)| {
            let x0 = lo + i as f64 * width;
            Rectangle::new([(x0, 0.0), (x0 + width, f64::from(count))], SKY_BLUE.filled())
        }))
        .map_err(plot_err)?;
    chart
        .draw_series(counts.iter().enumerate().map(|(i, &count)| {
            let x0 = lo + i as f64 * width;
            Rectangle::new([(x0, 0.0), (x0 + width, f64::from(count))], BLACK.stroke_width(1))
        }))
        .map_err(plot_err)?;

    // Dashed target marker
    let dash = y_max / 30.0;
    chart
        .draw_series((0..30).step_by(2).map(|k| {
            let y0 = k as f64 * dash;
            PathElement::new(vec![(target, y0), (target, y0 + dash)], RED.stroke_width(3))
        }))
        .map_err(plot_err)?
        .label(format!("Target BLER: {bler_target}"))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(3)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    Ok(())
}

fn metric_label(value: &SegmentValue<u32>) -> String {
    match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
            METRIC_NAMES.get(*i as usize).copied().unwrap_or_default().to_string()
        }
        SegmentValue::Last => String::new(),
    }
}

fn draw_summary_bars<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    experiment_id: &str,
    summary: &ExperimentSummary,
) -> Result<()> {
    let values = [
        (summary.tbler_mean, LIGHT_CORAL),
        (summary.throughput_mean / 1024.0, LIGHT_GREEN),
        (summary.harq_nack_rate, LIGHT_SALMON),
    ];
    let top = values.iter().fold(0.0f64, |m, (v, _)| m.max(*v));
    let y_max = if top > 0.0 { top * 1.15 } else { 1.0 };
    let last = values.len() as u32 - 1;

    let mut chart = ChartBuilder::on(area)
        .caption(format!("{experiment_id} Summary"), ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d((0u32..last).into_segmented(), 0f64..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .light_line_style(GRID_GRAY)
        .x_labels(values.len())
        .x_label_formatter(&metric_label)
        .y_desc("Value")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(values.iter().enumerate().map(|(i, &(value, color))| {
            let i = i as u32;
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), value.max(0.0))],
                color.filled(),
            );
            bar.set_margin(0, 0, 30, 30);
            bar
        }))
        .map_err(plot_err)?;

    let value_style = TextStyle::from(("sans-serif", 20).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom));
    chart
        .draw_series(values.iter().enumerate().map(|(i, &(value, _))| {
            Text::new(
                format!("{value:.3}"),
                (SegmentValue::CenterOf(i as u32), value.max(0.0)),
                value_style.clone(),
            )
        }))
        .map_err(plot_err)?;

    Ok(())
}
