use std::io::Write;

use crate::analysis::{
    compute_diagnostics, AnalysisParams, AnalysisSummary, ControlDesign, DiagnosticsSummary,
    SweepRunSummary,
};
use crate::core::file_io::{serialize_to_json, FilePrefix};
use crate::core::stopwatch::Stopwatch;
use crate::plots::diagnostics::{plot_nyquist, plot_root_locus, plot_step_response};
use crate::plots::sweep::plot_sweep;
use crate::simulation::local_service::LocalSimulationService;
use crate::simulation::pendulum_model::PendulumPidModel;
use crate::simulation::sweep::{read_token, run_mass_sweep, SweepRun};

/// Prints the linear design to stdout. Writes no files.
pub fn print_gains(params: &AnalysisParams) {
    let design = ControlDesign::new(&params.physical, &params.compensator);
    println!("P(s) = {}", design.plant);
    println!("C(s) = {}", design.compensator);
    println!("T(s) = {}", design.closed_loop);
    println!(
        "Kp = {}, Ki = {}, Kd = {}",
        design.gains.kp, design.gains.ki, design.gains.kd
    );
}

pub fn run_analysis(
    params: &AnalysisParams,
    file_prefix: FilePrefix,
) -> Result<(), Box<dyn std::error::Error>> {
    run_pipeline(params, &file_prefix, "Analysis", true, true)
}

pub fn run_diagnostics(
    params: &AnalysisParams,
    file_prefix: FilePrefix,
) -> Result<(), Box<dyn std::error::Error>> {
    run_pipeline(params, &file_prefix, "Diagnostics", true, false)
}

pub fn run_sweep(
    params: &AnalysisParams,
    file_prefix: FilePrefix,
) -> Result<(), Box<dyn std::error::Error>> {
    run_pipeline(params, &file_prefix, "Sweep", false, true)
}

fn run_pipeline(
    params: &AnalysisParams,
    file_prefix: &FilePrefix,
    name: &str,
    with_diagnostics: bool,
    with_sweep: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut stopwatch = Stopwatch::new(format!("{} Stopwatch", name));

    serialize_to_json(file_prefix.with_suffix(".json"), params)?;
    let design = ControlDesign::new(&params.physical, &params.compensator);
    tracing::info!(
        "PID gains: Kp = {}, Ki = {}, Kd = {}",
        design.gains.kp,
        design.gains.ki,
        design.gains.kd
    );
    stopwatch.record_split("build linear models".to_owned());

    let diagnostics = if with_diagnostics {
        Some(diagnostics_stage(params, &design, file_prefix, &mut stopwatch)?)
    } else {
        None
    };

    let sweep = if with_sweep {
        sweep_stage(params, &design, file_prefix, &mut stopwatch)?
    } else {
        Vec::new()
    };

    let summary = AnalysisSummary {
        design: design.summary(),
        diagnostics,
        sweep,
    };
    serialize_to_json(file_prefix.with_suffix("_summary.json"), &summary)?;
    stopwatch.record_split("write summary".to_owned());

    let mut diagnostics_file = file_prefix.create_file_with_suffix("_diagnostics.txt")?;
    stopwatch.display(&mut diagnostics_file)?;
    diagnostics_file.flush()?;
    Ok(())
}

fn diagnostics_stage(
    params: &AnalysisParams,
    design: &ControlDesign,
    file_prefix: &FilePrefix,
    stopwatch: &mut Stopwatch,
) -> Result<DiagnosticsSummary, Box<dyn std::error::Error>> {
    let diagnostics = compute_diagnostics(design, params);
    stopwatch.record_split("compute diagnostics".to_owned());

    let summary = diagnostics.summary();
    match &summary.nyquist {
        Some(nyquist) => tracing::info!(
            "Nyquist: P = {}, N = {}, Z = {} ({})",
            nyquist.open_loop_rhp_poles,
            nyquist.clockwise_encirclements,
            nyquist.closed_loop_rhp_poles,
            if nyquist.is_closed_loop_stable() {
                "stable"
            } else {
                "unstable"
            }
        ),
        None => tracing::warn!("Nyquist criterion gave no verdict for {}", design.open_loop),
    }
    tracing::debug!("Stability margins: {:?}", summary.margins);
    if diagnostics.step.is_none() {
        tracing::warn!("Closed loop is improper; skipping the step response");
    }

    if params.plot.enabled {
        plot_root_locus(
            &file_prefix.with_suffix("_root_locus_plant.png"),
            &params.plot,
            "Root Locus of P(s)",
            &diagnostics.plant_locus,
        )?;
        plot_root_locus(
            &file_prefix.with_suffix("_root_locus_loop.png"),
            &params.plot,
            "Root Locus of C(s) P(s)",
            &diagnostics.loop_locus,
        )?;
        plot_nyquist(
            &file_prefix.with_suffix("_nyquist.png"),
            &params.plot,
            &diagnostics.nyquist,
        )?;
        if let Some(step) = &diagnostics.step {
            plot_step_response(&file_prefix.with_suffix("_step.png"), &params.plot, step)?;
        }
        stopwatch.record_split("plot diagnostics".to_owned());
    }

    Ok(summary)
}

fn sweep_stage(
    params: &AnalysisParams,
    design: &ControlDesign,
    file_prefix: &FilePrefix,
    stopwatch: &mut Stopwatch,
) -> Result<Vec<SweepRunSummary>, Box<dyn std::error::Error>> {
    let token = read_token(&params.sweep.token_path)?;
    let service = LocalSimulationService::new(&params.sweep.project_id)
        .with_model(Box::new(PendulumPidModel::new(params.model.clone())));

    let runs = run_mass_sweep(
        &service,
        &token,
        &params.sweep,
        &design.gains,
        params.compensator.tau,
    )?;
    stopwatch.record_split("simulate mass sweep".to_owned());

    write_sweep_tables(&runs, file_prefix)?;
    stopwatch.record_split("write result tables".to_owned());

    if params.plot.enabled {
        plot_sweep(&file_prefix.with_suffix("_sweep.png"), &params.plot, &runs)?;
        stopwatch.record_split("plot sweep".to_owned());
    }

    Ok(runs.iter().map(SweepRunSummary::new).collect())
}

/// One CSV file per run, numbered in sweep order.
pub fn write_sweep_tables(
    runs: &[SweepRun],
    file_prefix: &FilePrefix,
) -> Result<(), Box<dyn std::error::Error>> {
    for (i_run, run) in runs.iter().enumerate() {
        let suffix = format!("_mass_{}.csv", i_run);
        run.results
            .write_csv(file_prefix.create_file_with_suffix(&suffix)?)?;
        tracing::info!("Wrote {}", file_prefix.with_suffix(&suffix).display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::results::{SimulationResults, SETPOINT};

    #[test]
    fn test_write_sweep_tables() {
        let dir = tempfile::tempdir().unwrap();
        let file_prefix = FilePrefix {
            directory_path: dir.path().to_path_buf(),
            file_base: "reference".to_owned(),
        };
        let runs: Vec<SweepRun> = [0.4, 0.5]
            .iter()
            .map(|&mass| {
                let mut results = SimulationResults::new(&[SETPOINT]);
                results.push_row(0.0, &[(SETPOINT, 180.0)]);
                SweepRun { mass, results }
            })
            .collect();

        write_sweep_tables(&runs, &file_prefix).unwrap();

        for i_run in 0..2 {
            let text =
                std::fs::read_to_string(dir.path().join(format!("reference_mass_{}.csv", i_run)))
                    .unwrap();
            assert_eq!(text.lines().next(), Some("time,Setpoint.out_0"));
        }
    }
}
