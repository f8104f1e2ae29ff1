//! Closed-loop pole locations of `1 + kappa L(s) = 0` as the loop gain `kappa` varies.

use num::complex::Complex;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use super::{polynomial::Polynomial, transfer_function::TransferFunction};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RootLocusParams {
    pub gain_min: f64,
    pub gain_max: f64,
    pub gain_count: usize,
}

impl Default for RootLocusParams {
    fn default() -> Self {
        RootLocusParams {
            gain_min: 1e-3,
            gain_max: 1e3,
            gain_count: 400,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RootLocus {
    /// Loop gains, starting with zero (the open-loop poles) and then increasing.
    pub gains: Vec<f64>,
    /// `branches[i][j]` is the location of branch `i` at `gains[j]`.
    pub branches: Vec<Vec<Complex<f64>>>,
    pub open_loop_poles: Vec<Complex<f64>>,
    pub open_loop_zeros: Vec<Complex<f64>>,
}

/// Roots of the closed-loop characteristic polynomial `den(s) + gain * num(s)`.
pub fn closed_loop_roots(open_loop: &TransferFunction, gain: f64) -> Vec<Complex<f64>> {
    characteristic_polynomial(open_loop, gain).roots()
}

fn characteristic_polynomial(open_loop: &TransferFunction, gain: f64) -> Polynomial {
    &open_loop.denominator + &open_loop.numerator.scale(gain)
}

pub fn compute_root_locus(open_loop: &TransferFunction, params: &RootLocusParams) -> RootLocus {
    more_asserts::assert_gt!(params.gain_min, 0.0);
    more_asserts::assert_gt!(params.gain_max, params.gain_min);
    more_asserts::assert_ge!(params.gain_count, 2);

    let mut gains = vec![0.0];
    gains.extend(iter_num_tools::log_space(
        params.gain_min..=params.gain_max,
        params.gain_count,
    ));

    // Each gain is an independent root solve. The collected vector keeps the gain order.
    let roots_per_gain: Vec<Vec<Complex<f64>>> = gains
        .clone()
        .into_par_iter()
        .map(|gain| closed_loop_roots(open_loop, gain))
        .collect();

    RootLocus {
        gains,
        branches: track_branches(&roots_per_gain),
        open_loop_poles: open_loop.poles(),
        open_loop_zeros: open_loop.zeros(),
    }
}

/// Reorders the roots at each gain so that each branch follows the nearest root from the
/// previous gain. The greedy matching is adequate for the dense gain grids used here.
fn track_branches(roots_per_gain: &[Vec<Complex<f64>>]) -> Vec<Vec<Complex<f64>>> {
    let branch_count = roots_per_gain.first().map_or(0, |roots| roots.len());
    let mut branches: Vec<Vec<Complex<f64>>> = (0..branch_count)
        .map(|_| Vec::with_capacity(roots_per_gain.len()))
        .collect();

    for roots in roots_per_gain {
        // A branch count change means the degree dropped (e.g. leading-term cancellation)
        // or the root solve failed. Every branch gets a NaN so it stays aligned with `gains`.
        if roots.len() != branch_count {
            for branch in branches.iter_mut() {
                branch.push(Complex::new(f64::NAN, f64::NAN));
            }
            continue;
        }
        let mut unassigned: Vec<Complex<f64>> = roots.clone();
        for branch in branches.iter_mut() {
            let previous = branch.iter().rev().find(|root| root.re.is_finite());
            let index = match previous {
                Some(previous) => nearest_index(&unassigned, previous),
                None => 0,
            };
            branch.push(unassigned.swap_remove(index));
        }
    }
    branches
}

fn nearest_index(candidates: &[Complex<f64>], target: &Complex<f64>) -> usize {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (i, (c - target).norm_sqr()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(0, |(i, _)| i)
}

impl RootLocus {
    /// Largest real part over all branches at each gain. Negative means a stable closed loop,
    /// NaN means the roots at that gain are unknown.
    pub fn max_real_part(&self) -> Vec<f64> {
        (0..self.gains.len())
            .map(|j| {
                self.branches
                    .iter()
                    .filter_map(|branch| branch.get(j))
                    .fold(f64::NEG_INFINITY, |acc, root| {
                        // A missing root leaves the stability at this gain unknown.
                        if acc.is_nan() || root.re.is_nan() {
                            f64::NAN
                        } else {
                            acc.max(root.re)
                        }
                    })
            })
            .collect()
    }

    /// Smallest gain on the grid at which every closed-loop root is in the open left half-plane.
    pub fn minimum_stabilizing_gain(&self) -> Option<f64> {
        self.gains
            .iter()
            .zip(self.max_real_part())
            .find(|(_, max_re)| *max_re < 0.0)
            .map(|(gain, _)| *gain)
    }

    pub fn all_points(&self) -> impl Iterator<Item = &Complex<f64>> {
        self.branches.iter().flat_map(|branch| branch.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{compensator::CompensatorParams, plant::PhysicalParams};
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_gain_gives_open_loop_poles() {
        let plant = PhysicalParams::default().plant_transfer_function();
        let locus = compute_root_locus(&plant, &RootLocusParams::default());
        assert_eq!(locus.gains[0], 0.0);
        assert_eq!(locus.gains.len(), 401);
        assert_eq!(locus.branches.len(), 2);

        let mut start: Vec<f64> = locus.branches.iter().map(|b| b[0].re).collect();
        start.sort_by(|a, b| a.total_cmp(b));
        let poles = plant.poles();
        assert_relative_eq!(start[0], poles[0].re);
        assert_relative_eq!(start[1], poles[1].re);
        assert!(locus.open_loop_zeros.is_empty());
    }

    #[test]
    fn test_proportional_gain_stabilizes_plant() {
        // 0.5 s^2 + 0.5 s - 4.905 + kappa: stable for kappa > m g l
        let plant = PhysicalParams::default().plant_transfer_function();
        let locus = compute_root_locus(
            &plant,
            &RootLocusParams {
                gain_min: 0.1,
                gain_max: 100.0,
                gain_count: 1000,
            },
        );
        let gain = locus.minimum_stabilizing_gain().unwrap();
        assert!(gain > 4.905);
        assert!(gain < 4.905 * 1.02);
    }

    #[test]
    fn test_branches_are_continuous() {
        let plant = PhysicalParams::default().plant_transfer_function();
        let open_loop = CompensatorParams::default()
            .transfer_function()
            .series(&plant);
        let locus = compute_root_locus(&open_loop, &RootLocusParams::default());
        assert_eq!(locus.branches.len(), 3);
        for branch in &locus.branches {
            assert_eq!(branch.len(), locus.gains.len());
        }
        assert_eq!(locus.open_loop_zeros.len(), 1);
        assert_relative_eq!(locus.open_loop_zeros[0].re, -3.0);

        // Unit loop gain reproduces the closed-loop poles of C P / (1 + C P).
        let closed_loop_poles = open_loop.unity_feedback().poles();
        for pole in closed_loop_poles {
            let distance = closed_loop_roots(&open_loop, 1.0)
                .iter()
                .map(|r| (r - pole).norm())
                .fold(f64::INFINITY, f64::min);
            assert!(distance < 1e-9);
        }
    }

    #[test]
    fn test_missing_roots_keep_branches_aligned() {
        let c = |re: f64, im: f64| Complex::new(re, im);
        let roots_per_gain = vec![
            vec![c(1.0, 0.0), c(-2.0, 0.0)],
            vec![c(-0.5, 0.0)], // degree dropped at this gain
            vec![c(-1.5, 0.0), c(-0.5, 0.0)],
        ];
        let branches = track_branches(&roots_per_gain);
        assert_eq!(branches.len(), 2);
        for branch in &branches {
            assert_eq!(branch.len(), 3);
            assert!(branch[1].re.is_nan());
        }
        // Matching resumes from the last known root of each branch.
        assert_eq!(branches[0][2], c(-0.5, 0.0));
        assert_eq!(branches[1][2], c(-1.5, 0.0));

        let locus = RootLocus {
            gains: vec![0.0, 1.0, 2.0],
            branches,
            open_loop_poles: vec![c(1.0, 0.0), c(-2.0, 0.0)],
            open_loop_zeros: Vec::new(),
        };
        let max_re = locus.max_real_part();
        assert_eq!(max_re[0], 1.0);
        assert!(max_re[1].is_nan());
        assert_eq!(max_re[2], -0.5);
        assert_eq!(locus.minimum_stabilizing_gain(), Some(2.0));
    }
}
