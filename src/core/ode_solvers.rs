//! Explicit ODE solvers

use std::ops::{Add, Mul};

/// Single step of the classic fourth-order Runge-Kutta method.
///
/// Works for any state type that can be added and scaled, which covers both the
/// fixed-size `nalgebra` vectors used by the pendulum model and the `DVector`
/// used for state-space step responses.
pub fn rk4_method_step<S, F>(dt: f64, t: f64, x: &S, dynamics: &F) -> S
where
    S: Clone + Add<S, Output = S>,
    f64: Mul<S, Output = S> + Mul<f64, Output = f64>,
    F: Fn(f64, &S) -> S,
{
    let t_mid = t + 0.5 * dt;
    let t_next = t + dt;
    let k1 = dt * dynamics(t, x);
    let k2 = dt * dynamics(t_mid, &(x.clone() + 0.5 * k1.clone()));
    let k3 = dt * dynamics(t_mid, &(x.clone() + 0.5 * k2.clone()));
    let k4 = dt * dynamics(t_next, &(x.clone() + k3.clone()));
    const ONE_BY_SIX: f64 = 1.0 / 6.0;
    let x_delta = ONE_BY_SIX * (k1 + 2.0 * k2 + 2.0 * k3 + k4);
    x.clone() + x_delta
}

pub fn rk4_simulate<S, F>(t_begin: f64, t_final: f64, n_steps: u32, x0: S, dynamics: &F) -> S
where
    S: Clone + Add<S, Output = S>,
    f64: Mul<S, Output = S> + Mul<f64, Output = f64>,
    F: Fn(f64, &S) -> S,
{
    let dt = (t_final - t_begin) / (n_steps as f64);
    let mut x = x0;
    for i_step in 0..n_steps {
        let alpha = (i_step as f64) / (n_steps as f64);
        let t = t_begin + alpha * (t_final - t_begin);
        x = rk4_method_step(dt, t, &x, dynamics);
    }
    x
}
