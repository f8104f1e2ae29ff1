pub mod local_service;
pub mod pendulum_model;
pub mod results;
pub mod service;
pub mod sweep;
