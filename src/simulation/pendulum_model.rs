//! Nonlinear pendulum balanced by a discrete PID controller.
//!
//! The pendulum angle `theta` is measured from the hanging-down position, so the
//! upright equilibrium is at 180 deg. The plant is
//!
//! J theta'' = u - k theta' - m g l sin(theta),    J = m l^2
//!
//! which, linearized about the upright equilibrium, is exactly the transfer function
//! built by `PhysicalParams::plant_transfer_function`.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::local_service::SimulationModel;
use super::results::{
    SimulationResults, PENDULUM_OMEGA, PENDULUM_THETA, PID_COMMAND, SETPOINT,
};
use super::service::{SimulationError, SimulationParameters};
use crate::control::compensator::PidGains;
use crate::core::ode_solvers::rk4_simulate;

pub const MODEL_NAME: &str = "Pendulum - Linearized PID Control";

/// Solver settings that are baked into the model rather than passed per run.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PendulumModelSettings {
    pub final_time: f64,  // [s]
    pub sample_time: f64, // controller period [s]
    pub substeps: u32,    // plant integration steps per controller period
    pub command_limit: Option<f64>, // [N m]
}

impl Default for PendulumModelSettings {
    fn default() -> Self {
        PendulumModelSettings {
            final_time: 10.0,
            sample_time: 0.01,
            substeps: 10,
            command_limit: None,
        }
    }
}

/// Per-run values, read from the named parameters.
#[derive(Debug, Clone)]
struct PendulumRunParams {
    mass: f64,
    length: f64,
    damping: f64,
    gravity: f64,
    gains: PidGains,
    filter_time_constant: f64,
    initial_angle: f64,  // [deg]
    reference_angle: f64, // [deg]
}

impl PendulumRunParams {
    fn from_parameters(parameters: &SimulationParameters) -> PendulumRunParams {
        let defaults = default_parameters();
        let value = |name: &str| {
            parameters
                .get(name)
                .or_else(|| defaults.get(name))
                .unwrap_or(0.0)
        };
        PendulumRunParams {
            mass: value("m"),
            length: value("l"),
            damping: value("k"),
            gravity: value("g"),
            gains: PidGains {
                kp: value("Kp"),
                ki: value("Ki"),
                kd: value("Kd"),
            },
            filter_time_constant: value("T_c"),
            initial_angle: value("Theta_0"),
            reference_angle: value("Theta_ref"),
        }
    }

    fn moment_of_inertia(&self) -> f64 {
        self.mass * self.length * self.length
    }
}

fn default_parameters() -> SimulationParameters {
    SimulationParameters::new()
        .with("m", 0.5)
        .with("l", 1.0)
        .with("k", 0.5)
        .with("g", 9.81)
        .with("Kp", 0.0)
        .with("Ki", 0.0)
        .with("Kd", 0.0)
        .with("T_c", 0.2)
        .with("Theta_0", 175.0)
        .with("Theta_ref", 180.0)
}

/// PID on the tracking error, with a first-order filter on the derivative term:
///
/// u = Kp e + Ki integral(e) + Kd s / (T_c s + 1) e
///
/// The filter is discretized with backward Euler, the integral with forward Euler.
#[derive(Debug, Clone)]
pub struct DiscretePid {
    gains: PidGains,
    filter_time_constant: f64,
    sample_time: f64,
    integral: f64,
    filtered_derivative: f64,
    previous_error: Option<f64>,
}

impl DiscretePid {
    pub fn new(gains: PidGains, filter_time_constant: f64, sample_time: f64) -> DiscretePid {
        more_asserts::assert_gt!(sample_time, 0.0);
        DiscretePid {
            gains,
            filter_time_constant,
            sample_time,
            integral: 0.0,
            filtered_derivative: 0.0,
            previous_error: None,
        }
    }

    /// Called once per sample period with the current error. The first sample produces no
    /// derivative kick.
    pub fn update(&mut self, error: f64) -> f64 {
        let error_delta = self.previous_error.map_or(0.0, |previous| error - previous);
        self.filtered_derivative = (self.filter_time_constant * self.filtered_derivative
            + error_delta)
            / (self.filter_time_constant + self.sample_time);
        self.previous_error = Some(error);

        let command = self.gains.kp * error
            + self.gains.ki * self.integral
            + self.gains.kd * self.filtered_derivative;
        self.integral += error * self.sample_time;
        command
    }
}

pub struct PendulumPidModel {
    settings: PendulumModelSettings,
}

impl PendulumPidModel {
    pub fn new(settings: PendulumModelSettings) -> PendulumPidModel {
        more_asserts::assert_gt!(settings.sample_time, 0.0);
        more_asserts::assert_gt!(settings.substeps, 0);
        PendulumPidModel { settings }
    }

    pub fn settings(&self) -> &PendulumModelSettings {
        &self.settings
    }
}

/// State: [angle (rad), rate (rad/s)], with a constant torque `command` over the step.
fn pendulum_dynamics(
    params: &PendulumRunParams,
    command: f64,
) -> impl Fn(f64, &Vector2<f64>) -> Vector2<f64> {
    let inertia = params.moment_of_inertia();
    let gravity_torque = params.mass * params.gravity * params.length;
    let damping = params.damping;
    move |_: f64, x: &Vector2<f64>| {
        let q = x[0]; // angle
        let v = x[1]; // rate
        let v_dot = (command - damping * v - gravity_torque * q.sin()) / inertia;
        Vector2::new(v, v_dot)
    }
}

impl SimulationModel for PendulumPidModel {
    fn name(&self) -> &str {
        MODEL_NAME
    }

    fn default_parameters(&self) -> SimulationParameters {
        default_parameters()
    }

    fn simulate(
        &self,
        parameters: &SimulationParameters,
    ) -> Result<SimulationResults, SimulationError> {
        let params = PendulumRunParams::from_parameters(parameters);
        let dt = self.settings.sample_time;
        let n_samples = (self.settings.final_time / dt).round() as u64;
        let reference = params.reference_angle.to_radians();

        let mut controller = DiscretePid::new(params.gains, params.filter_time_constant, dt);
        let mut state = Vector2::new(params.initial_angle.to_radians(), 0.0);
        let mut results =
            SimulationResults::new(&[PENDULUM_THETA, PENDULUM_OMEGA, SETPOINT, PID_COMMAND]);

        for i_sample in 0..=n_samples {
            let t = (i_sample as f64) * dt;
            if !(state[0].is_finite() && state[1].is_finite()) {
                return Err(SimulationError::NonFiniteState {
                    model: MODEL_NAME.to_owned(),
                    time: t,
                });
            }

            let mut command = controller.update(reference - state[0]);
            if let Some(limit) = self.settings.command_limit {
                command = command.clamp(-limit, limit);
            }

            results.push_row(
                t,
                &[
                    (PENDULUM_THETA, state[0].to_degrees()),
                    (PENDULUM_OMEGA, state[1].to_degrees()),
                    (SETPOINT, params.reference_angle),
                    (PID_COMMAND, command),
                ],
            );

            // Zero-order hold on the command until the next controller sample.
            state = rk4_simulate(
                t,
                t + dt,
                self.settings.substeps,
                state,
                &pendulum_dynamics(&params, command),
            );
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::compensator::CompensatorParams;
    use approx::assert_relative_eq;

    fn reference_parameters(mass: f64) -> SimulationParameters {
        let compensator = CompensatorParams::default();
        let gains = compensator.pid_gains();
        SimulationParameters::new()
            .with("m", mass)
            .with("Kp", gains.kp)
            .with("Ki", gains.ki)
            .with("Kd", gains.kd)
            .with("T_c", compensator.tau)
            .with("Theta_0", 175.0)
    }

    #[test]
    fn test_pid_proportional_only() {
        let gains = PidGains {
            kp: 2.0,
            ki: 0.0,
            kd: 0.0,
        };
        let mut pid = DiscretePid::new(gains, 0.1, 0.01);
        assert_eq!(pid.update(1.5), 3.0);
        assert_eq!(pid.update(-1.0), -2.0);
    }

    #[test]
    fn test_pid_integral_and_derivative() {
        let gains = PidGains {
            kp: 0.0,
            ki: 1.0,
            kd: 1.0,
        };
        // No filter: plain backward difference.
        let mut pid = DiscretePid::new(gains, 0.0, 0.5);
        assert_eq!(pid.update(1.0), 0.0); // no kick, empty integral
        // integral = 0.5, derivative = (3 - 1) / 0.5 = 4
        assert_relative_eq!(pid.update(3.0), 4.5);
        // integral = 2.0, derivative = 0
        assert_relative_eq!(pid.update(3.0), 2.0);
    }

    #[test]
    fn test_pid_filtered_derivative_step() {
        let gains = PidGains {
            kp: 0.0,
            ki: 0.0,
            kd: 1.0,
        };
        let (tc, dt) = (0.2, 0.01);
        let mut pid = DiscretePid::new(gains, tc, dt);
        pid.update(0.0);
        // Unit step in the error: the filtered derivative jumps to 1 / (tc + dt) and decays.
        let first = pid.update(1.0);
        assert_relative_eq!(first, 1.0 / (tc + dt));
        let second = pid.update(1.0);
        assert_relative_eq!(second, first * tc / (tc + dt));
    }

    #[test]
    fn test_hanging_pendulum_stays_at_rest() {
        let model = PendulumPidModel::new(PendulumModelSettings::default());
        let parameters = SimulationParameters::new()
            .with("Theta_0", 0.0)
            .with("Theta_ref", 0.0);
        let results = model.simulate(&parameters).unwrap();
        for theta in results.column(PENDULUM_THETA).unwrap() {
            assert_eq!(*theta, 0.0);
        }
    }

    #[test]
    fn test_reference_design_balances_pendulum() {
        let model = PendulumPidModel::new(PendulumModelSettings::default());
        let results = model.simulate(&reference_parameters(0.5)).unwrap();

        assert_eq!(results.len(), 1001);
        let theta = results.column(PENDULUM_THETA).unwrap();
        assert_relative_eq!(theta[0], 175.0, epsilon = 1e-12);
        assert_relative_eq!(*theta.last().unwrap(), 180.0, epsilon = 1e-2);

        // First command is the proportional action on a 5 deg error.
        let command = results.column(PID_COMMAND).unwrap();
        assert_relative_eq!(command[0], 6.0 * 5.0_f64.to_radians(), epsilon = 1e-12);

        for setpoint in results.column(SETPOINT).unwrap() {
            assert_eq!(*setpoint, 180.0);
        }
    }

    #[test]
    fn test_command_limit_is_respected() {
        let settings = PendulumModelSettings {
            command_limit: Some(0.25),
            ..PendulumModelSettings::default()
        };
        let model = PendulumPidModel::new(settings);
        let results = model.simulate(&reference_parameters(0.5)).unwrap();
        for command in results.column(PID_COMMAND).unwrap() {
            assert!(command.abs() <= 0.25);
        }
    }
}
