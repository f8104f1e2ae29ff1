//! In-process implementation of the simulation service.

use super::results::SimulationResults;
use super::service::{
    AuthToken, ModelHandle, Session, SimulationError, SimulationParameters, SimulationService,
};

/// A pre-built model that the service can run.
pub trait SimulationModel: Send + Sync {
    fn name(&self) -> &str;

    /// Every parameter the model accepts, with its default value.
    fn default_parameters(&self) -> SimulationParameters;

    fn simulate(&self, parameters: &SimulationParameters)
        -> Result<SimulationResults, SimulationError>;
}

/// Hosts a single project and the models registered in it.
pub struct LocalSimulationService {
    project_id: String,
    models: Vec<Box<dyn SimulationModel>>,
}

impl LocalSimulationService {
    pub fn new(project_id: &str) -> LocalSimulationService {
        LocalSimulationService {
            project_id: project_id.to_owned(),
            models: Vec::new(),
        }
    }

    pub fn with_model(mut self, model: Box<dyn SimulationModel>) -> LocalSimulationService {
        self.models.push(model);
        self
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|model| model.name())
    }

    fn find_model(&self, name: &str) -> Result<&dyn SimulationModel, SimulationError> {
        self.models
            .iter()
            .find(|model| model.name() == name)
            .map(|model| &**model)
            .ok_or_else(|| SimulationError::UnknownModel(name.to_owned()))
    }

    fn check_session(&self, session: &Session, project_id: &str) -> Result<(), SimulationError> {
        if session.project_id != project_id || project_id != self.project_id {
            return Err(SimulationError::WrongProject {
                session: session.project_id.clone(),
                requested: project_id.to_owned(),
            });
        }
        Ok(())
    }
}

impl SimulationService for LocalSimulationService {
    fn authenticate(&self, token: &AuthToken, project_id: &str) -> Result<Session, SimulationError> {
        if token.is_empty() {
            return Err(SimulationError::EmptyToken);
        }
        if project_id != self.project_id {
            return Err(SimulationError::UnknownProject(project_id.to_owned()));
        }
        tracing::debug!("authenticated {:?} for project {}", token, project_id);
        Ok(Session {
            project_id: project_id.to_owned(),
        })
    }

    fn load_model(&self, session: &Session, name: &str) -> Result<ModelHandle, SimulationError> {
        self.check_session(session, &session.project_id)?;
        let model = self.find_model(name)?;
        Ok(ModelHandle {
            project_id: session.project_id.clone(),
            name: model.name().to_owned(),
        })
    }

    fn run_simulation(
        &self,
        session: &Session,
        model: &ModelHandle,
        parameters: &SimulationParameters,
    ) -> Result<SimulationResults, SimulationError> {
        self.check_session(session, &model.project_id)?;
        let model = self.find_model(&model.name)?;
        let defaults = model.default_parameters();
        if let Some((name, _)) = parameters.iter().find(|(name, _)| defaults.get(name).is_none()) {
            return Err(SimulationError::UnknownParameter {
                model: model.name().to_owned(),
                name: name.to_owned(),
            });
        }
        model.simulate(&defaults.merged(parameters))
    }
}
