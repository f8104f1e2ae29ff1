use serde::{Deserialize, Serialize};

use super::{polynomial::Polynomial, transfer_function::TransferFunction};

/// Physical constants of a rigid pendulum pivoting about one end.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PhysicalParams {
    pub mass: f64,    // [kg]
    pub length: f64,  // [m]
    pub damping: f64, // [N m s / rad]
    pub gravity: f64, // [m / s^2]
}

impl Default for PhysicalParams {
    fn default() -> Self {
        PhysicalParams {
            mass: 0.5,
            length: 1.0,
            damping: 0.5,
            gravity: 9.81,
        }
    }
}

impl PhysicalParams {
    /// Point mass at the end of the rod: J = m l^2
    pub fn moment_of_inertia(&self) -> f64 {
        self.mass * self.length * self.length
    }

    /// Pendulum linearized about the upright equilibrium, from torque to angle:
    ///
    /// P(s) = 1 / (J s^2 + k s - m g l)
    ///
    /// The constants are not validated. A non-positive inertia gives a degenerate plant.
    pub fn plant_transfer_function(&self) -> TransferFunction {
        TransferFunction::new(
            Polynomial::constant(1.0),
            Polynomial::from_descending(&[
                self.moment_of_inertia(),
                self.damping,
                -self.mass * self.gravity * self.length,
            ]),
        )
    }
}
