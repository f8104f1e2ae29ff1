use clap::Parser;
use pendulum_control::analysis::AnalysisParams;
use pendulum_control::cli::analyze::{print_gains, run_analysis, run_diagnostics, run_sweep};
use pendulum_control::cli::args::{CommandsEnum, PendulumControlArgs};
use pendulum_control::core::file_io::{
    build_output_path_with_date_time, extract_base_name, maybe_date_time_string, FilePrefix,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: PendulumControlArgs = PendulumControlArgs::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let command = match &args.command {
        Some(command) => command,
        None => {
            println!("Default command (nothing specified!)");
            return Ok(());
        }
    };

    let params_path = &command.params().params_path;
    let params: AnalysisParams = serde_json::from_str(&std::fs::read_to_string(params_path)?)?;

    let build_file_prefix = || -> std::io::Result<FilePrefix> {
        Ok(FilePrefix {
            directory_path: build_output_path_with_date_time(
                params_path,
                command.name(),
                &maybe_date_time_string(command.params().date_time_out),
            )?,
            file_base: extract_base_name(params_path).to_owned(),
        })
    };

    match command {
        CommandsEnum::Analyze(_) => run_analysis(&params, build_file_prefix()?),
        CommandsEnum::Gains(_) => {
            print_gains(&params);
            Ok(())
        }
        CommandsEnum::Diagnostics(_) => run_diagnostics(&params, build_file_prefix()?),
        CommandsEnum::Sweep(_) => run_sweep(&params, build_file_prefix()?),
    }
}
