//! Parameter file layout and the pure computations behind each pipeline stage.

use num::complex::Complex;
use serde::{Deserialize, Serialize};

use crate::control::compensator::{CompensatorParams, PidGains};
use crate::control::frequency_response::{
    nyquist_stability, nyquist_trace, stability_margins, FrequencyGridParams, NyquistStability,
    NyquistTrace, StabilityMargins,
};
use crate::control::plant::PhysicalParams;
use crate::control::root_locus::{compute_root_locus, RootLocus, RootLocusParams};
use crate::control::time_response::{step_response, StepResponseParams, TimeResponse};
use crate::control::transfer_function::TransferFunction;
use crate::plots::chart::PlotParams;
use crate::simulation::pendulum_model::PendulumModelSettings;
use crate::simulation::results::{PENDULUM_THETA, PID_COMMAND};
use crate::simulation::sweep::{SweepParams, SweepRun};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnalysisParams {
    pub physical: PhysicalParams,
    pub compensator: CompensatorParams,
    #[serde(default)]
    pub step_response: StepResponseParams,
    #[serde(default)]
    pub root_locus: RootLocusParams,
    #[serde(default)]
    pub frequency_grid: FrequencyGridParams,
    pub sweep: SweepParams,
    /// Settings of the in-process pendulum model that serves the sweep.
    #[serde(default)]
    pub model: PendulumModelSettings,
    #[serde(default)]
    pub plot: PlotParams,
}

/// Linear models derived from the physical and compensator constants.
#[derive(Debug, Clone)]
pub struct ControlDesign {
    pub plant: TransferFunction,
    pub compensator: TransferFunction,
    /// C(s) P(s)
    pub open_loop: TransferFunction,
    /// C P / (1 + C P)
    pub closed_loop: TransferFunction,
    pub gains: PidGains,
}

impl ControlDesign {
    pub fn new(physical: &PhysicalParams, compensator: &CompensatorParams) -> ControlDesign {
        let plant = physical.plant_transfer_function();
        let compensator_tf = compensator.transfer_function();
        let open_loop = compensator_tf.series(&plant);
        let closed_loop = open_loop.unity_feedback();
        ControlDesign {
            plant,
            compensator: compensator_tf,
            open_loop,
            closed_loop,
            gains: compensator.pid_gains(),
        }
    }

    pub fn summary(&self) -> DesignSummary {
        DesignSummary {
            plant: self.plant.to_string(),
            compensator: self.compensator.to_string(),
            open_loop: self.open_loop.to_string(),
            closed_loop: self.closed_loop.to_string(),
            pid_gains: self.gains,
            plant_poles: complex_pairs(&self.plant.poles()),
            closed_loop_poles: complex_pairs(&self.closed_loop.poles()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub plant_locus: RootLocus,
    pub loop_locus: RootLocus,
    pub nyquist: NyquistTrace,
    /// `None` when the open loop has a pole on the imaginary axis.
    pub stability: Option<NyquistStability>,
    pub margins: StabilityMargins,
    /// `None` only when the closed loop is improper.
    pub step: Option<TimeResponse>,
}

pub fn compute_diagnostics(design: &ControlDesign, params: &AnalysisParams) -> Diagnostics {
    Diagnostics {
        plant_locus: compute_root_locus(&design.plant, &params.root_locus),
        loop_locus: compute_root_locus(&design.open_loop, &params.root_locus),
        nyquist: nyquist_trace(&design.open_loop, &params.frequency_grid),
        stability: nyquist_stability(&design.open_loop, &params.frequency_grid),
        margins: stability_margins(&design.open_loop, &params.frequency_grid),
        step: step_response(&design.closed_loop, &params.step_response),
    }
}

impl Diagnostics {
    pub fn summary(&self) -> DiagnosticsSummary {
        DiagnosticsSummary {
            nyquist: self.stability.clone(),
            margins: self.margins.clone(),
            plant_minimum_stabilizing_gain: self.plant_locus.minimum_stabilizing_gain(),
            loop_minimum_stabilizing_gain: self.loop_locus.minimum_stabilizing_gain(),
            step_final_value: self
                .step
                .as_ref()
                .and_then(|response| response.output.last().cloned()),
        }
    }
}

/// Complex numbers as `[re, im]` pairs, for the JSON summary.
pub fn complex_pairs(values: &[Complex<f64>]) -> Vec<[f64; 2]> {
    values.iter().map(|z| [z.re, z.im]).collect()
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DesignSummary {
    pub plant: String,
    pub compensator: String,
    pub open_loop: String,
    pub closed_loop: String,
    pub pid_gains: PidGains,
    pub plant_poles: Vec<[f64; 2]>,
    pub closed_loop_poles: Vec<[f64; 2]>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DiagnosticsSummary {
    pub nyquist: Option<NyquistStability>,
    pub margins: StabilityMargins,
    pub plant_minimum_stabilizing_gain: Option<f64>,
    pub loop_minimum_stabilizing_gain: Option<f64>,
    pub step_final_value: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SweepRunSummary {
    pub mass: f64,
    pub final_angle: Option<f64>, // [deg]
    pub peak_command: Option<f64>, // [N m], largest magnitude
}

impl SweepRunSummary {
    pub fn new(run: &SweepRun) -> SweepRunSummary {
        SweepRunSummary {
            mass: run.mass,
            final_angle: run
                .results
                .column(PENDULUM_THETA)
                .and_then(|theta| theta.last().cloned()),
            peak_command: run.results.column(PID_COMMAND).and_then(|command| {
                command.iter().cloned().reduce(|a, b| if b.abs() > a.abs() { b } else { a })
            }),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnalysisSummary {
    pub design: DesignSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<DiagnosticsSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sweep: Vec<SweepRunSummary>,
}
