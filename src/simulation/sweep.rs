//! Robustness sweep: one simulation per candidate plant mass, run strictly in order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::results::SimulationResults;
use super::service::{AuthToken, SimulationError, SimulationParameters, SimulationService};
use crate::control::compensator::PidGains;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SweepParams {
    pub masses: Vec<f64>, // [kg]
    pub initial_angle: f64, // [deg], measured from hanging down
    pub token_path: String,
    pub project_id: String,
    pub model_name: String,
}

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("unable to read token file `{path}`: {source}")]
    TokenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("authentication failed: {0}")]
    Authentication(#[source] SimulationError),

    #[error("unable to load model: {0}")]
    LoadModel(#[source] SimulationError),

    #[error("simulation failed for mass = {mass} kg: {source}")]
    Simulation {
        mass: f64,
        #[source]
        source: SimulationError,
    },
}

#[derive(Debug, Clone)]
pub struct SweepRun {
    pub mass: f64,
    pub results: SimulationResults,
}

pub fn read_token(path: &str) -> Result<AuthToken, SweepError> {
    AuthToken::read_from_file(path).map_err(|source| SweepError::TokenFile {
        path: path.to_owned(),
        source,
    })
}

/// Parameter set sent with each run, named the way the hosted model expects.
pub fn sweep_parameters(
    mass: f64,
    gains: &PidGains,
    filter_time_constant: f64,
    initial_angle: f64,
) -> SimulationParameters {
    SimulationParameters::new()
        .with("m", mass)
        .with("Kp", gains.kp)
        .with("Ki", gains.ki)
        .with("Kd", gains.kd)
        .with("T_c", filter_time_constant)
        .with("Theta_0", initial_angle)
}

/// Runs the sweep one mass at a time. `result[i]` belongs to `params.masses[i]`.
///
/// The first failure aborts the sweep: the error names the failing mass and the
/// results collected so far are dropped.
pub fn run_mass_sweep<S: SimulationService + ?Sized>(
    service: &S,
    token: &AuthToken,
    params: &SweepParams,
    gains: &PidGains,
    filter_time_constant: f64,
) -> Result<Vec<SweepRun>, SweepError> {
    let session = service
        .authenticate(token, &params.project_id)
        .map_err(SweepError::Authentication)?;
    let model = service
        .load_model(&session, &params.model_name)
        .map_err(SweepError::LoadModel)?;
    tracing::info!(
        "Loaded model `{}` from project {}",
        model.name,
        model.project_id
    );

    let mut runs = Vec::with_capacity(params.masses.len());
    for &mass in &params.masses {
        let parameters = sweep_parameters(mass, gains, filter_time_constant, params.initial_angle);
        tracing::info!("Simulating mass = {} kg", mass);
        let results = service
            .run_simulation(&session, &model, &parameters)
            .map_err(|source| SweepError::Simulation { mass, source })?;
        tracing::debug!("Mass = {} kg: {} samples", mass, results.len());
        runs.push(SweepRun { mass, results });
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::service::{ModelHandle, Session};
    use std::cell::RefCell;

    /// Records the mass of every request, and fails on one chosen mass.
    struct RecordingService {
        requests: RefCell<Vec<f64>>,
        failing_mass: Option<f64>,
    }

    impl SimulationService for RecordingService {
        fn authenticate(&self, _: &AuthToken, project_id: &str) -> Result<Session, SimulationError> {
            Ok(Session {
                project_id: project_id.to_owned(),
            })
        }

        fn load_model(&self, session: &Session, name: &str) -> Result<ModelHandle, SimulationError> {
            Ok(ModelHandle {
                project_id: session.project_id.clone(),
                name: name.to_owned(),
            })
        }

        fn run_simulation(
            &self,
            _: &Session,
            model: &ModelHandle,
            parameters: &SimulationParameters,
        ) -> Result<SimulationResults, SimulationError> {
            let mass = parameters.get("m").unwrap();
            self.requests.borrow_mut().push(mass);
            if Some(mass) == self.failing_mass {
                return Err(SimulationError::NonFiniteState {
                    model: model.name.clone(),
                    time: 1.0,
                });
            }
            let mut results = SimulationResults::new(&["m"]);
            results.push_row(0.0, &[("m", mass)]);
            Ok(results)
        }
    }

    fn params() -> SweepParams {
        SweepParams {
            masses: vec![0.6, 0.4, 0.5],
            initial_angle: 175.0,
            token_path: "token.txt".to_owned(),
            project_id: "project".to_owned(),
            model_name: "model".to_owned(),
        }
    }

    fn gains() -> PidGains {
        PidGains {
            kp: 6.0,
            ki: 0.0,
            kd: 0.8,
        }
    }

    #[test]
    fn test_sweep_preserves_order() {
        let service = RecordingService {
            requests: RefCell::new(Vec::new()),
            failing_mass: None,
        };
        let runs = run_mass_sweep(&service, &AuthToken::new("t"), &params(), &gains(), 0.2).unwrap();
        let masses: Vec<f64> = runs.iter().map(|run| run.mass).collect();
        assert_eq!(masses, vec![0.6, 0.4, 0.5]);
        for run in &runs {
            assert_eq!(run.results.column("m").unwrap(), &[run.mass]);
        }
        assert_eq!(*service.requests.borrow(), vec![0.6, 0.4, 0.5]);
    }

    #[test]
    fn test_sweep_aborts_on_first_failure() {
        let service = RecordingService {
            requests: RefCell::new(Vec::new()),
            failing_mass: Some(0.4),
        };
        let error = run_mass_sweep(&service, &AuthToken::new("t"), &params(), &gains(), 0.2)
            .unwrap_err();
        assert!(matches!(error, SweepError::Simulation { mass, .. } if mass == 0.4));
        // The remaining mass is never requested.
        assert_eq!(*service.requests.borrow(), vec![0.6, 0.4]);
    }

    #[test]
    fn test_sweep_parameters() {
        let parameters = sweep_parameters(0.5, &gains(), 0.2, 175.0);
        let names: Vec<&str> = parameters.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Kd", "Ki", "Kp", "T_c", "Theta_0", "m"]);
        assert_eq!(parameters.get("Ki"), Some(0.0));
        assert_eq!(parameters.get("T_c"), Some(0.2));
    }

    #[test]
    fn test_missing_token_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.txt");
        let error = read_token(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(error, SweepError::TokenFile { .. }));
    }
}
