use serde::{Deserialize, Serialize};

use super::{polynomial::Polynomial, transfer_function::TransferFunction};

/// Lead compensator C(s) = K (s - z) / (tau s + 1)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompensatorParams {
    pub tau: f64,  // pole time constant [s]
    pub zero: f64, // zero location [rad / s]
    pub gain: f64,
}

impl Default for CompensatorParams {
    fn default() -> Self {
        CompensatorParams {
            tau: 0.2,
            zero: -3.0,
            gain: 2.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl CompensatorParams {
    pub fn transfer_function(&self) -> TransferFunction {
        TransferFunction::new(
            Polynomial::from_descending(&[self.gain, -self.zero * self.gain]),
            Polynomial::from_descending(&[self.tau, 1.0]),
        )
    }

    /// Equivalent PID gains, for a PID whose derivative term is low-pass filtered with time
    /// constant `tau`:
    ///
    /// Kp + Kd s / (tau s + 1) = ((Kp tau + Kd) s + Kp) / (tau s + 1) = K (s - z) / (tau s + 1)
    ///
    /// Matching coefficients gives Kp = -z K and Kd = K + z K tau. The compensator has no
    /// integrator, so Ki is always zero.
    pub fn pid_gains(&self) -> PidGains {
        PidGains {
            kp: -self.zero * self.gain,
            ki: 0.0,
            kd: self.gain + self.zero * self.gain * self.tau,
        }
    }
}

impl PidGains {
    /// Kp + Ki / s + Kd s / (filter_time_constant s + 1)
    pub fn filtered_transfer_function(&self, filter_time_constant: f64) -> TransferFunction {
        let filter = Polynomial::from_descending(&[filter_time_constant, 1.0]);
        // Common denominator: s (T s + 1)
        let denominator = &Polynomial::s() * &filter;
        let proportional = denominator.scale(self.kp);
        let integral = filter.scale(self.ki);
        let derivative = Polynomial::from_descending(&[self.kd, 0.0, 0.0]);
        let numerator = &(&proportional + &integral) + &derivative;
        let pid = TransferFunction::new(numerator, denominator);
        if self.ki == 0.0 {
            cancel_origin_pole_zero(pid)
        } else {
            pid
        }
    }
}

/// Removes a common factor of `s` from the numerator and denominator.
fn cancel_origin_pole_zero(tf: TransferFunction) -> TransferFunction {
    let num = tf.numerator.coefficients();
    let den = tf.denominator.coefficients();
    if num.len() > 1 && den.len() > 1 && num[0] == 0.0 && den[0] == 0.0 {
        TransferFunction::new(
            Polynomial::new(num[1..].to_vec()),
            Polynomial::new(den[1..].to_vec()),
        )
    } else {
        tf
    }
}
