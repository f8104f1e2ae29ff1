pub mod file_io;
pub mod ode_solvers;
pub mod stopwatch;
