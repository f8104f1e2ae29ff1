use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use super::transfer_function::TransferFunction;
use crate::core::ode_solvers::rk4_method_step;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StepResponseParams {
    pub final_time: f64,
    pub n_steps: u32,
}

impl Default for StepResponseParams {
    fn default() -> Self {
        StepResponseParams {
            final_time: 5.0,
            n_steps: 1000,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TimeResponse {
    pub time: Vec<f64>,
    pub output: Vec<f64>,
}

/// Response of `system` to a unit step applied at t = 0, starting from rest.
///
/// Returns `None` when the system is improper.
pub fn step_response(system: &TransferFunction, params: &StepResponseParams) -> Option<TimeResponse> {
    more_asserts::assert_gt!(params.n_steps, 0);
    let ss = system.to_state_space()?;
    let n = ss.a.nrows();
    let dt = params.final_time / (params.n_steps as f64);
    let input = 1.0;

    let dynamics = |_: f64, x: &DVector<f64>| &ss.a * x + &ss.b * input;

    let mut x = DVector::zeros(n);
    let mut time = Vec::with_capacity(params.n_steps as usize + 1);
    let mut output = Vec::with_capacity(params.n_steps as usize + 1);
    for i_step in 0..=params.n_steps {
        let t = (i_step as f64) * dt;
        time.push(t);
        output.push(ss.c.dot(&x) + ss.d * input);
        x = rk4_method_step(dt, t, &x, &dynamics);
    }
    Some(TimeResponse { time, output })
}
