//! Single-input single-output transfer functions as a ratio of two polynomials.

use nalgebra::{DMatrix, DVector};
use num::complex::Complex;
use serde::{Deserialize, Serialize};

use super::polynomial::Polynomial;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransferFunction {
    pub numerator: Polynomial,
    pub denominator: Polynomial,
}

/// Controllable canonical form of a proper transfer function:
///
/// x' = A x + B u
/// y  = C x + D u
#[derive(Debug, Clone)]
pub struct StateSpace {
    pub a: DMatrix<f64>,
    pub b: DVector<f64>,
    pub c: DVector<f64>,
    pub d: f64,
}

impl TransferFunction {
    pub fn new(numerator: Polynomial, denominator: Polynomial) -> TransferFunction {
        TransferFunction {
            numerator,
            denominator,
        }
    }

    /// The transfer function `s`, which makes it easy to write expressions like `K (s - z)`.
    pub fn s() -> TransferFunction {
        TransferFunction::new(Polynomial::s(), Polynomial::constant(1.0))
    }

    pub fn gain(value: f64) -> TransferFunction {
        TransferFunction::new(Polynomial::constant(value), Polynomial::constant(1.0))
    }

    /// Series connection: `self * other`.
    pub fn series(&self, other: &TransferFunction) -> TransferFunction {
        TransferFunction::new(
            &self.numerator * &other.numerator,
            &self.denominator * &other.denominator,
        )
    }

    pub fn scale(&self, factor: f64) -> TransferFunction {
        TransferFunction::new(self.numerator.scale(factor), self.denominator.clone())
    }

    /// Closed loop with unity negative feedback: `G / (1 + G)`.
    pub fn unity_feedback(&self) -> TransferFunction {
        self.feedback(&TransferFunction::gain(1.0))
    }

    /// Closed loop with `sensor` in the negative feedback path: `G / (1 + G H)`.
    pub fn feedback(&self, sensor: &TransferFunction) -> TransferFunction {
        let numerator = &self.numerator * &sensor.denominator;
        let denominator = &(&self.denominator * &sensor.denominator)
            + &(&self.numerator * &sensor.numerator);
        TransferFunction::new(numerator, denominator)
    }

    pub fn evaluate(&self, s: Complex<f64>) -> Complex<f64> {
        self.numerator.evaluate_complex(s) / self.denominator.evaluate_complex(s)
    }

    /// Frequency response `G(j omega)`.
    pub fn frequency_response(&self, omega: f64) -> Complex<f64> {
        self.evaluate(Complex::new(0.0, omega))
    }

    pub fn dc_gain(&self) -> f64 {
        self.numerator.evaluate(0.0) / self.denominator.evaluate(0.0)
    }

    pub fn poles(&self) -> Vec<Complex<f64>> {
        self.denominator.roots()
    }

    pub fn zeros(&self) -> Vec<Complex<f64>> {
        self.numerator.roots()
    }

    pub fn is_proper(&self) -> bool {
        self.numerator.degree() <= self.denominator.degree()
    }

    pub fn is_strictly_proper(&self) -> bool {
        self.numerator.degree() < self.denominator.degree()
    }

    /// Number of poles with a strictly positive real part.
    pub fn unstable_pole_count(&self) -> usize {
        self.poles().iter().filter(|p| p.re > 0.0).count()
    }

    /// Returns `None` for an improper transfer function, which has no state-space realization.
    pub fn to_state_space(&self) -> Option<StateSpace> {
        if !self.is_proper() {
            return None;
        }
        let n = self.denominator.degree();
        let lead = self.denominator.leading_coefficient();
        let den: Vec<f64> = self
            .denominator
            .coefficients()
            .iter()
            .map(|c| c / lead)
            .collect();
        let mut num: Vec<f64> = self
            .numerator
            .coefficients()
            .iter()
            .map(|c| c / lead)
            .collect();
        num.resize(n + 1, 0.0);

        // Direct feed-through comes from the s^n term of a biproper system.
        let d = num[n];
        let mut a = DMatrix::zeros(n, n);
        for i in 0..n.saturating_sub(1) {
            a[(i, i + 1)] = 1.0;
        }
        for j in 0..n {
            a[(n - 1, j)] = -den[j];
        }
        let mut b = DVector::zeros(n);
        if n > 0 {
            b[n - 1] = 1.0;
        }
        let c = DVector::from_iterator(n, (0..n).map(|j| num[j] - d * den[j]));

        Some(StateSpace { a, b, c, d })
    }
}

impl std::fmt::Display for TransferFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}) / ({})", self.numerator, self.denominator)
    }
}
