use std::path::Path;

use plotters::prelude::*;

use super::chart::{padded_range, render_to_file, series_color, ChartArea, ChartError, PlotParams};
use crate::simulation::results::{PENDULUM_THETA, PID_COMMAND, SETPOINT};
use crate::simulation::sweep::SweepRun;

/// Two stacked charts sharing the time axis: the pendulum angle for every mass (plus the
/// setpoint of the first run) on top, the controller torque for every mass below.
pub fn plot_sweep(path: &Path, params: &PlotParams, runs: &[SweepRun]) -> Result<(), ChartError> {
    let first = runs.first().ok_or(ChartError::EmptyData("mass sweep"))?;
    let setpoint = first
        .results
        .column(SETPOINT)
        .ok_or(ChartError::EmptyData(SETPOINT))?;

    render_to_file(path, params, |root| {
        let areas = root.split_evenly((2, 1));

        let mut angle_series = vec![Series {
            label: "Setpoint".to_owned(),
            time: first.results.time(),
            values: setpoint,
            color: BLACK.to_rgba(),
            dashed: true,
        }];
        let mut torque_series = Vec::with_capacity(runs.len());
        for (i_run, run) in runs.iter().enumerate() {
            let color = series_color(i_run);
            if let Some(theta) = run.results.column(PENDULUM_THETA) {
                angle_series.push(Series::solid(
                    format!("Response - Mass = {} kg", run.mass),
                    run.results.time(),
                    theta,
                    color,
                ));
            }
            if let Some(command) = run.results.column(PID_COMMAND) {
                torque_series.push(Series::solid(
                    format!("Tau - Mass = {} kg", run.mass),
                    run.results.time(),
                    command,
                    color,
                ));
            }
        }

        draw_time_series(&areas[0], "Theta [deg]", &angle_series)?;
        draw_time_series(&areas[1], "Tau [Nm]", &torque_series)?;
        Ok(())
    })
}

struct Series<'a> {
    label: String,
    time: &'a [f64],
    values: &'a [f64],
    color: RGBAColor,
    dashed: bool,
}

impl<'a> Series<'a> {
    fn solid(label: String, time: &'a [f64], values: &'a [f64], color: RGBAColor) -> Self {
        Series {
            label,
            time,
            values,
            color,
            dashed: false,
        }
    }
}

const DASH_SIZE: i32 = 10;
const DASH_SPACING: i32 = 6;

fn draw_time_series(
    area: &ChartArea<'_>,
    y_desc: &str,
    series: &[Series<'_>],
) -> Result<(), ChartError> {
    let x_range = padded_range(series.iter().flat_map(|s| s.time.iter().cloned()))
        .ok_or(ChartError::EmptyData("time"))?;
    let y_range = padded_range(series.iter().flat_map(|s| s.values.iter().cloned()))
        .ok_or(ChartError::EmptyData("values"))?;

    let mut chart = ChartBuilder::on(area)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;
    chart
        .configure_mesh()
        .x_desc("Time [s]")
        .y_desc(y_desc)
        .draw()?;

    for line in series {
        let color = line.color;
        let points = line.time.iter().cloned().zip(line.values.iter().cloned());
        let annotation = if line.dashed {
            chart.draw_series(DashedLineSeries::new(
                points,
                DASH_SIZE,
                DASH_SPACING,
                color.stroke_width(2),
            ))?
        } else {
            chart.draw_series(LineSeries::new(points, color.stroke_width(2)))?
        };
        annotation
            .label(line.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}
