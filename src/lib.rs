pub mod analysis;
pub mod cli;
pub mod control;
pub mod core;
pub mod plots;
pub mod simulation;
