//! Classical control diagnostics: root locus, Nyquist trace and step response.

use std::path::Path;

use num::complex::Complex;
use plotters::prelude::*;

use super::chart::{padded_range, render_to_file, series_color, ChartError, PlotParams};
use crate::control::frequency_response::NyquistTrace;
use crate::control::root_locus::RootLocus;
use crate::control::time_response::TimeResponse;

const CAPTION_FONT: (&str, u32) = ("sans-serif", 32);

fn is_finite(z: &Complex<f64>) -> bool {
    z.re.is_finite() && z.im.is_finite()
}

pub fn plot_root_locus(
    path: &Path,
    params: &PlotParams,
    title: &str,
    locus: &RootLocus,
) -> Result<(), ChartError> {
    let x_range = padded_range(locus.all_points().map(|p| p.re))
        .ok_or(ChartError::EmptyData("root locus"))?;
    let y_range = padded_range(locus.all_points().map(|p| p.im).chain([0.0]))
        .ok_or(ChartError::EmptyData("root locus"))?;

    render_to_file(path, params, |root| {
        let mut chart = ChartBuilder::on(root)
            .margin(20)
            .caption(title, CAPTION_FONT)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range, y_range)?;
        chart
            .configure_mesh()
            .x_desc("Real")
            .y_desc("Imaginary")
            .draw()?;

        for (i_branch, branch) in locus.branches.iter().enumerate() {
            chart.draw_series(LineSeries::new(
                branch
                    .iter()
                    .filter(|p| is_finite(p))
                    .map(|p| (p.re, p.im)),
                series_color(i_branch).stroke_width(2),
            ))?;
        }
        chart.draw_series(
            locus
                .open_loop_poles
                .iter()
                .map(|p| Cross::new((p.re, p.im), 8, BLACK.stroke_width(2))),
        )?;
        chart.draw_series(
            locus
                .open_loop_zeros
                .iter()
                .map(|z| Circle::new((z.re, z.im), 8, BLACK.stroke_width(2))),
        )?;
        Ok(())
    })
}

pub fn plot_nyquist(path: &Path, params: &PlotParams, trace: &NyquistTrace) -> Result<(), ChartError> {
    let points = || {
        trace
            .positive
            .iter()
            .chain(trace.negative.iter())
            .filter(|p| is_finite(p))
    };
    let x_range = padded_range(points().map(|p| p.re).chain([-1.0, 0.0]))
        .ok_or(ChartError::EmptyData("Nyquist trace"))?;
    let y_range = padded_range(points().map(|p| p.im).chain([0.0]))
        .ok_or(ChartError::EmptyData("Nyquist trace"))?;

    render_to_file(path, params, |root| {
        let mut chart = ChartBuilder::on(root)
            .margin(20)
            .caption("Nyquist Diagram of C(s) P(s)", CAPTION_FONT)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range, y_range)?;
        chart
            .configure_mesh()
            .x_desc("Real")
            .y_desc("Imaginary")
            .draw()?;

        let positive_color = series_color(0);
        chart
            .draw_series(LineSeries::new(
                trace.positive.iter().filter(|p| is_finite(p)).map(|p| (p.re, p.im)),
                positive_color.stroke_width(2),
            ))?
            .label("omega > 0")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], positive_color));

        let negative_color = series_color(1);
        chart
            .draw_series(LineSeries::new(
                trace.negative.iter().filter(|p| is_finite(p)).map(|p| (p.re, p.im)),
                negative_color.stroke_width(2),
            ))?
            .label("omega < 0")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], negative_color));

        chart.draw_series(std::iter::once(Cross::new((-1.0, 0.0), 8, RED.stroke_width(2))))?;

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        Ok(())
    })
}

pub fn plot_step_response(
    path: &Path,
    params: &PlotParams,
    response: &TimeResponse,
) -> Result<(), ChartError> {
    let x_range = padded_range(response.time.iter().cloned())
        .ok_or(ChartError::EmptyData("step response"))?;
    let y_range = padded_range(response.output.iter().cloned().chain([0.0]))
        .ok_or(ChartError::EmptyData("step response"))?;

    render_to_file(path, params, |root| {
        let mut chart = ChartBuilder::on(root)
            .margin(20)
            .caption("Closed-Loop Step Response", CAPTION_FONT)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range, y_range)?;
        chart
            .configure_mesh()
            .x_desc("Time [s]")
            .y_desc("Output")
            .draw()?;
        chart.draw_series(LineSeries::new(
            response
                .time
                .iter()
                .cloned()
                .zip(response.output.iter().cloned()),
            series_color(0).stroke_width(2),
        ))?;
        Ok(())
    })
}
