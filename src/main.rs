use clap::Parser;
use std::process::ExitCode;
use webtidy::cli::{Cli, run_cli};
use webtidy::logging::init_tracing;
use webtidy::output::OutputFormatter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run_cli(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !e.already_reported() {
                OutputFormatter::error(&e.to_string());
            }
            ExitCode::FAILURE
        }
    }
}
