use std::ops::Range;
use std::path::Path;

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("unable to draw chart: {0}")]
    Drawing(String),

    #[error("chart buffer does not match a {width} x {height} RGB image")]
    Buffer { width: u32, height: u32 },

    #[error("unable to write chart image: {0}")]
    Image(#[from] image::ImageError),

    #[error("nothing to plot: {0}")]
    EmptyData(&'static str),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(error: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Drawing(error.to_string())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PlotParams {
    /// Charts are skipped entirely when false, which keeps headless runs free of font lookups.
    pub enabled: bool,
    pub width: u32,  // [pixels]
    pub height: u32, // [pixels]
}

impl Default for PlotParams {
    fn default() -> Self {
        PlotParams {
            enabled: true,
            width: 1200,
            height: 900,
        }
    }
}

pub type ChartArea<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Draws into an in-memory RGB buffer, then encodes it as an image file at `path`.
/// The image format is taken from the file extension.
pub fn render_to_file<F>(path: &Path, params: &PlotParams, draw: F) -> Result<(), ChartError>
where
    F: FnOnce(&ChartArea<'_>) -> Result<(), ChartError>,
{
    let (width, height) = (params.width, params.height);
    let mut buffer = vec![0u8; (width as usize) * (height as usize) * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }

    let imgbuf = image::RgbImage::from_raw(width, height, buffer)
        .ok_or(ChartError::Buffer { width, height })?;
    imgbuf.save(path)?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

/// Range that covers every finite value, padded by 5% on each side.
pub fn padded_range<I: IntoIterator<Item = f64>>(values: I) -> Option<Range<f64>> {
    let (low, high) = values
        .into_iter()
        .filter(|value| value.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), value| {
            (low.min(value), high.max(value))
        });
    if low > high {
        return None;
    }
    let pad = 0.05 * (high - low).abs().max(1e-6);
    Some((low - pad)..(high + pad))
}

/// Stroke color for the `index`-th series of a chart.
pub fn series_color(index: usize) -> RGBAColor {
    Palette99::pick(index).to_rgba()
}
