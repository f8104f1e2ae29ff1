//! Boundary to a simulation service that hosts pre-built models inside a project.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::results::SimulationResults;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("authentication token is empty")]
    EmptyToken,

    #[error("unknown project: {0}")]
    UnknownProject(String),

    #[error("session for project {session} cannot access project {requested}")]
    WrongProject { session: String, requested: String },

    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("model {model} has no parameter named {name}")]
    UnknownParameter { model: String, name: String },

    #[error("simulation of {model} produced a non-finite state at t = {time}")]
    NonFiniteState { model: String, time: f64 },
}

/// Authentication token, read once from a local file.
///
/// The `Debug` output never contains the secret.
#[derive(Clone, PartialEq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: &str) -> AuthToken {
        AuthToken(token.trim().to_owned())
    }

    /// The whole file is read in one call, so the handle is closed before this returns on
    /// both the success and the error path.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> std::io::Result<AuthToken> {
        Ok(AuthToken::new(&std::fs::read_to_string(path)?))
    }

    pub fn secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthToken(<{} bytes>)", self.0.len())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub project_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelHandle {
    pub project_id: String,
    pub name: String,
}

/// Named scalar parameters for one simulation run.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SimulationParameters(BTreeMap<String, f64>);

impl SimulationParameters {
    pub fn new() -> SimulationParameters {
        SimulationParameters::default()
    }

    pub fn with(mut self, name: &str, value: f64) -> SimulationParameters {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.0.insert(name.to_owned(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Returns a copy of `self` with every entry of `overrides` applied on top.
    pub fn merged(&self, overrides: &SimulationParameters) -> SimulationParameters {
        let mut merged = self.clone();
        for (name, value) in overrides.iter() {
            merged.set(name, value);
        }
        merged
    }
}

/// Every call blocks until the service has produced a result.
pub trait SimulationService {
    fn authenticate(&self, token: &AuthToken, project_id: &str) -> Result<Session, SimulationError>;

    fn load_model(&self, session: &Session, name: &str) -> Result<ModelHandle, SimulationError>;

    fn run_simulation(
        &self,
        session: &Session,
        model: &ModelHandle,
        parameters: &SimulationParameters,
    ) -> Result<SimulationResults, SimulationError>;
}
