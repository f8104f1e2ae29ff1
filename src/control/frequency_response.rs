//! Nyquist trace, Nyquist stability criterion, and classical stability margins.

use num::complex::Complex;
use serde::{Deserialize, Serialize};

use super::transfer_function::TransferFunction;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FrequencyGridParams {
    pub omega_min: f64, // [rad / s]
    pub omega_max: f64, // [rad / s]
    pub count: usize,
}

impl Default for FrequencyGridParams {
    fn default() -> Self {
        FrequencyGridParams {
            omega_min: 1e-3,
            omega_max: 1e3,
            count: 4000,
        }
    }
}

impl FrequencyGridParams {
    pub fn frequencies(&self) -> Vec<f64> {
        more_asserts::assert_gt!(self.omega_min, 0.0);
        more_asserts::assert_gt!(self.omega_max, self.omega_min);
        more_asserts::assert_ge!(self.count, 2);
        iter_num_tools::log_space(self.omega_min..=self.omega_max, self.count).collect()
    }
}

#[derive(Debug, Clone)]
pub struct NyquistTrace {
    pub frequencies: Vec<f64>,
    /// L(j omega) for each positive frequency.
    pub positive: Vec<Complex<f64>>,
    /// L(-j omega) for each positive frequency, i.e. the complex conjugate mirror image.
    pub negative: Vec<Complex<f64>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NyquistStability {
    pub open_loop_rhp_poles: usize,
    /// Net clockwise encirclements of the critical point -1.
    pub clockwise_encirclements: i64,
    /// Z = N + P
    pub closed_loop_rhp_poles: i64,
}

impl NyquistStability {
    pub fn is_closed_loop_stable(&self) -> bool {
        self.closed_loop_rhp_poles == 0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StabilityMargins {
    /// Factor by which the loop gain may grow before instability, at the phase crossover.
    pub gain_margin: Option<f64>,
    pub phase_crossover: Option<f64>, // [rad / s]
    /// Distance of the phase from -180 deg at the gain crossover.
    pub phase_margin: Option<f64>, // [deg]
    pub gain_crossover: Option<f64>, // [rad / s]
}

pub fn nyquist_trace(open_loop: &TransferFunction, grid: &FrequencyGridParams) -> NyquistTrace {
    let frequencies = grid.frequencies();
    let positive: Vec<Complex<f64>> = frequencies
        .iter()
        .map(|&omega| open_loop.frequency_response(omega))
        .collect();
    let negative = positive.iter().map(|value| value.conj()).collect();
    NyquistTrace {
        frequencies,
        positive,
        negative,
    }
}

impl NyquistTrace {
    /// Closed contour from -j omega_max to +j omega_max, passing through omega = 0.
    pub fn contour(&self, open_loop: &TransferFunction) -> Vec<Complex<f64>> {
        let mut contour: Vec<Complex<f64>> = self.negative.iter().rev().cloned().collect();
        contour.push(open_loop.frequency_response(0.0));
        contour.extend(self.positive.iter().cloned());
        contour
    }
}

/// Counter-clockwise winding number of `points` (treated as a closed curve) around `center`.
pub fn winding_number(points: &[Complex<f64>], center: Complex<f64>) -> i64 {
    if points.len() < 2 {
        return 0;
    }
    let mut total_angle = 0.0;
    for i in 0..points.len() {
        let a = points[i] - center;
        let b = points[(i + 1) % points.len()] - center;
        total_angle += (b / a).arg();
    }
    (total_angle / (2.0 * std::f64::consts::PI)).round() as i64
}

/// Applies the Nyquist criterion to the open loop `L(s)` under unity negative feedback.
///
/// The contour does not indent around poles on the imaginary axis, so open loops with
/// integrators or undamped modes have no verdict and return `None`.
pub fn nyquist_stability(
    open_loop: &TransferFunction,
    grid: &FrequencyGridParams,
) -> Option<NyquistStability> {
    let poles = open_loop.poles();
    if poles.iter().any(|p| p.re.abs() <= 1e-9 * (1.0 + p.norm())) {
        tracing::warn!("Open loop has a pole on the imaginary axis; no Nyquist verdict");
        return None;
    }
    let trace = nyquist_trace(open_loop, grid);
    let contour = trace.contour(open_loop);
    if contour.iter().any(|z| !(z.re.is_finite() && z.im.is_finite())) {
        tracing::warn!("Nyquist contour is not finite; no Nyquist verdict");
        return None;
    }
    let open_loop_rhp_poles = poles.iter().filter(|p| p.re > 0.0).count();
    let clockwise_encirclements = -winding_number(&contour, Complex::new(-1.0, 0.0));
    Some(NyquistStability {
        open_loop_rhp_poles,
        clockwise_encirclements,
        closed_loop_rhp_poles: clockwise_encirclements + open_loop_rhp_poles as i64,
    })
}

/// Gain and phase margins, located by linear interpolation between grid frequencies.
pub fn stability_margins(open_loop: &TransferFunction, grid: &FrequencyGridParams) -> StabilityMargins {
    let frequencies = grid.frequencies();
    let response: Vec<Complex<f64>> = frequencies
        .iter()
        .map(|&omega| open_loop.frequency_response(omega))
        .collect();

    let mut margins = StabilityMargins::default();

    for i in 1..frequencies.len() {
        let (a, b) = (response[i - 1], response[i]);

        // Gain crossover: |L| passes through one.
        if margins.gain_crossover.is_none() {
            let (ma, mb) = (a.norm().ln(), b.norm().ln());
            if ma.signum() != mb.signum() || mb == 0.0 {
                let alpha = interpolation_fraction(ma, mb);
                let omega = lerp(frequencies[i - 1], frequencies[i], alpha);
                let mut phase = open_loop.frequency_response(omega).arg().to_degrees();
                if phase > 0.0 {
                    phase -= 360.0; // measure phase lag in (-360, 0]
                }
                margins.gain_crossover = Some(omega);
                margins.phase_margin = Some(180.0 + phase);
            }
        }

        // Phase crossover: L crosses the negative real axis.
        if margins.phase_crossover.is_none()
            && a.im.signum() != b.im.signum()
            && (a.re < 0.0 || b.re < 0.0)
        {
            let alpha = interpolation_fraction(a.im, b.im);
            let omega = lerp(frequencies[i - 1], frequencies[i], alpha);
            let value = open_loop.frequency_response(omega);
            if value.re < 0.0 {
                margins.phase_crossover = Some(omega);
                margins.gain_margin = Some(1.0 / value.norm());
            }
        }
    }
    margins
}

fn interpolation_fraction(a: f64, b: f64) -> f64 {
    if a == b {
        0.0
    } else {
        a / (a - b)
    }
}

fn lerp(x0: f64, x1: f64, alpha: f64) -> f64 {
    x0 + alpha * (x1 - x0)
}
