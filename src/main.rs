mod cli;
mod commands;
mod logging;
mod report;

use std::process::ExitCode;

use clap::Parser;

use crate::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.global.verbose);

    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            report::report_error(&err);
            ExitCode::FAILURE
        }
    }
}
