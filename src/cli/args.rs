use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[clap(author, version, about)]
pub struct PendulumControlArgs {
    #[command(subcommand)]
    pub command: Option<CommandsEnum>,

    /// Log debug messages as well as progress.
    #[clap(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum CommandsEnum {
    /// Full pipeline: gains, linear diagnostics and the nonlinear mass sweep.
    Analyze(ParameterFilePath),
    /// Print the PID gains and transfer functions.
    Gains(ParameterFilePath),
    /// Root locus, Nyquist and step response of the linear design.
    Diagnostics(ParameterFilePath),
    /// Nonlinear simulation for every mass in the sweep.
    Sweep(ParameterFilePath),
}

impl CommandsEnum {
    pub fn name(&self) -> &'static str {
        match self {
            CommandsEnum::Analyze(_) => "analyze",
            CommandsEnum::Gains(_) => "gains",
            CommandsEnum::Diagnostics(_) => "diagnostics",
            CommandsEnum::Sweep(_) => "sweep",
        }
    }

    pub fn params(&self) -> &ParameterFilePath {
        match self {
            CommandsEnum::Analyze(params)
            | CommandsEnum::Gains(params)
            | CommandsEnum::Diagnostics(params)
            | CommandsEnum::Sweep(params) => params,
        }
    }
}

#[derive(Debug, Args)]
pub struct ParameterFilePath {
    pub params_path: String,

    #[clap(long, short)]
    pub date_time_out: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommand() {
        let args = PendulumControlArgs::parse_from([
            "pendulum-control",
            "sweep",
            "params/pendulum/reference.json",
            "-d",
            "-v",
        ]);
        assert!(args.verbose);
        let command = args.command.unwrap();
        assert_eq!(command.name(), "sweep");
        assert_eq!(command.params().params_path, "params/pendulum/reference.json");
        assert!(command.params().date_time_out);
    }
}
