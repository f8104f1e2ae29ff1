pub mod chart;
pub mod diagnostics;
pub mod sweep;
