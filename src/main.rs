use clap::Parser;
use downtidy::cli::{Cli, run_cli};
use downtidy::logging::init_logger;
use downtidy::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    init_logger();
    let cli = Cli::parse();

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {:#}", e));
            ExitCode::FAILURE
        }
    }
}
