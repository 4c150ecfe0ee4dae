//! Training-history charts, compiled in behind the `plots` feature.
//!
//! Without the feature the public functions still exist but fail with a
//! `Plot` error, so callers can treat chart output as best-effort.

use std::path::Path;

use crate::error::{Error, Result};
use crate::train::epoch_stats::EpochStats;

/// Renders the three per-task loss curves to a PNG.
pub fn save_loss_plot<P: AsRef<Path>>(path: P, history: &[EpochStats]) -> Result<()> {
    if history.is_empty() {
        return Err(Error::Plot("no epochs to plot".to_string()));
    }
    render_loss(path.as_ref(), history).map_err(|e| Error::Plot(e.to_string()))
}

/// Renders dice and accuracy curves to a PNG.
pub fn save_accuracy_plot<P: AsRef<Path>>(path: P, history: &[EpochStats]) -> Result<()> {
    if history.is_empty() {
        return Err(Error::Plot("no epochs to plot".to_string()));
    }
    render_accuracy(path.as_ref(), history).map_err(|e| Error::Plot(e.to_string()))
}

#[cfg(feature = "plots")]
fn render_loss(
    path: &Path,
    history: &[EpochStats],
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    use plotters::prelude::*;

    let root = BitMapBackend::new(path, (640, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_epoch = history.len().max(2) as f64;
    let max_loss = history
        .iter()
        .map(|s| s.mask_loss.max(s.label_loss).max(s.intensity_loss))
        .fold(0.0f64, f64::max);
    let y_max = (max_loss * 1.05).max(1e-3);

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption("Training Loss", ("sans-serif", 22))
        .x_label_area_size(45)
        .y_label_area_size(45)
        .build_cartesian_2d(1.0..max_epoch, 0.0..y_max)?;
    chart.configure_mesh().x_desc("Epoch").y_desc("Loss").draw()?;

    let points = |value: fn(&EpochStats) -> f64| -> Vec<(f64, f64)> {
        history.iter().map(|s| (s.epoch as f64, value(s))).collect()
    };
    chart
        .draw_series(LineSeries::new(points(|s| s.mask_loss), &BLUE))?
        .label("mask")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.filled()));
    chart
        .draw_series(LineSeries::new(points(|s| s.label_loss), &RED))?
        .label("label")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.filled()));
    chart
        .draw_series(LineSeries::new(points(|s| s.intensity_loss), &GREEN))?
        .label("intensity")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GREEN.filled()));
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

#[cfg(feature = "plots")]
fn render_accuracy(
    path: &Path,
    history: &[EpochStats],
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    use plotters::prelude::*;

    let root = BitMapBackend::new(path, (640, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_epoch = history.len().max(2) as f64;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption("Training Accuracy", ("sans-serif", 22))
        .x_label_area_size(45)
        .y_label_area_size(45)
        .build_cartesian_2d(1.0..max_epoch, 0.0..1.05f64)?;
    chart
        .configure_mesh()
        .x_desc("Epoch")
        .y_desc("Score")
        .draw()?;

    let points = |value: fn(&EpochStats) -> f64| -> Vec<(f64, f64)> {
        history.iter().map(|s| (s.epoch as f64, value(s))).collect()
    };
    chart
        .draw_series(LineSeries::new(points(|s| s.mask_dice), &BLUE))?
        .label("mask dice")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.filled()));
    chart
        .draw_series(LineSeries::new(points(|s| s.label_accuracy), &RED))?
        .label("label accuracy")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.filled()));
    chart
        .draw_series(LineSeries::new(points(|s| s.intensity_accuracy), &GREEN))?
        .label("intensity accuracy")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GREEN.filled()));
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

#[cfg(not(feature = "plots"))]
fn render_loss(
    _path: &Path,
    _history: &[EpochStats],
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    Err("plots feature is not enabled".into())
}

#[cfg(not(feature = "plots"))]
fn render_accuracy(
    _path: &Path,
    _history: &[EpochStats],
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    Err("plots feature is not enabled".into())
}
