//! Real polynomials in the Laplace variable `s`.

use nalgebra::linalg::Schur;
use nalgebra::DMatrix;
use num::complex::Complex;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// Coefficients are stored in ascending powers of `s`:
///
/// `coefficients[i] * s^i`
///
/// Trailing (highest order) zero coefficients are removed on construction, so
/// the last coefficient is the leading one. The zero polynomial is stored as `[0.0]`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    pub fn new(mut coefficients: Vec<f64>) -> Polynomial {
        while coefficients.len() > 1 && coefficients.last() == Some(&0.0) {
            coefficients.pop();
        }
        if coefficients.is_empty() {
            coefficients.push(0.0);
        }
        Polynomial { coefficients }
    }

    /// Build from coefficients listed highest power first, which is how they are usually written down.
    pub fn from_descending(coefficients: &[f64]) -> Polynomial {
        Polynomial::new(coefficients.iter().rev().cloned().collect())
    }

    pub fn constant(value: f64) -> Polynomial {
        Polynomial::new(vec![value])
    }

    /// The polynomial `s`.
    pub fn s() -> Polynomial {
        Polynomial::new(vec![0.0, 1.0])
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn descending_coefficients(&self) -> Vec<f64> {
        self.coefficients.iter().rev().cloned().collect()
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    pub fn leading_coefficient(&self) -> f64 {
        self.coefficients[self.degree()]
    }

    pub fn is_zero(&self) -> bool {
        self.coefficients.iter().all(|&c| c == 0.0)
    }

    pub fn scale(&self, factor: f64) -> Polynomial {
        Polynomial::new(self.coefficients.iter().map(|c| factor * c).collect())
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * x + c)
    }

    /// Horner evaluation at a complex point.
    pub fn evaluate_complex(&self, s: Complex<f64>) -> Complex<f64> {
        self.coefficients
            .iter()
            .rev()
            .fold(Complex::new(0.0, 0.0), |acc, &c| acc * s + c)
    }

    /// All complex roots, repeated according to multiplicity, or `None` if the eigenvalue
    /// iteration on the companion matrix does not converge.
    ///
    /// Sorted by real part, then imaginary part.
    pub fn try_roots(&self) -> Option<Vec<Complex<f64>>> {
        if self.is_zero() {
            return Some(Vec::new());
        }
        let lead = self.leading_coefficient();
        let monic: Vec<f64> = self.coefficients.iter().map(|c| c / lead).collect();
        let n = self.degree();
        match n {
            0 => return Some(Vec::new()),
            1 => return Some(vec![Complex::new(-monic[0], 0.0)]),
            _ => {}
        }

        // Eigenvalues of the companion matrix are the roots of the monic polynomial.
        let mut companion = DMatrix::<f64>::zeros(n, n);
        for i in 0..n - 1 {
            companion[(i, i + 1)] = 1.0;
        }
        for j in 0..n {
            companion[(n - 1, j)] = -monic[j];
        }
        let schur = Schur::try_new(companion, f64::EPSILON, MAX_SCHUR_ITERATIONS)?;

        let mut roots: Vec<Complex<f64>> = schur.complex_eigenvalues().iter().cloned().collect();
        if roots.iter().any(|root| !(root.re.is_finite() && root.im.is_finite())) {
            return None;
        }
        for root in roots.iter_mut() {
            // Snap roots that are real up to round-off back onto the real axis.
            if root.im.abs() <= 1e-10 * (1.0 + root.re.abs()) {
                root.im = 0.0;
            }
        }
        roots.sort_by(|a, b| a.re.total_cmp(&b.re).then(a.im.total_cmp(&b.im)));
        Some(roots)
    }

    /// Same as `try_roots`, but logs a warning and returns no roots when the solver fails.
    pub fn roots(&self) -> Vec<Complex<f64>> {
        self.try_roots().unwrap_or_else(|| {
            tracing::warn!("Unable to find the roots of {}", self);
            Vec::new()
        })
    }
}

const MAX_SCHUR_ITERATIONS: usize = 10_000;

impl Add for &Polynomial {
    type Output = Polynomial;

    fn add(self, other: &Polynomial) -> Polynomial {
        let n = self.coefficients.len().max(other.coefficients.len());
        let coefficients = (0..n)
            .map(|i| {
                self.coefficients.get(i).cloned().unwrap_or(0.0)
                    + other.coefficients.get(i).cloned().unwrap_or(0.0)
            })
            .collect();
        Polynomial::new(coefficients)
    }
}

impl Sub for &Polynomial {
    type Output = Polynomial;

    fn sub(self, other: &Polynomial) -> Polynomial {
        self + &(-other)
    }
}

impl Neg for &Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        self.scale(-1.0)
    }
}

impl Mul for &Polynomial {
    type Output = Polynomial;

    fn mul(self, other: &Polynomial) -> Polynomial {
        let mut coefficients = vec![0.0; self.coefficients.len() + other.coefficients.len() - 1];
        for (i, a) in self.coefficients.iter().enumerate() {
            for (j, b) in other.coefficients.iter().enumerate() {
                coefficients[i + j] += a * b;
            }
        }
        Polynomial::new(coefficients)
    }
}

impl std::fmt::Display for Polynomial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (power, &c) in self.coefficients.iter().enumerate().rev() {
            if c == 0.0 && self.degree() > 0 {
                continue;
            }
            if first {
                write!(f, "{}", c)?;
                first = false;
            } else if c < 0.0 {
                write!(f, " - {}", -c)?;
            } else {
                write!(f, " + {}", c)?;
            }
            match power {
                0 => {}
                1 => write!(f, " s")?,
                _ => write!(f, " s^{}", power)?,
            }
        }
        Ok(())
    }
}
