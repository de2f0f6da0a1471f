mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use std::process::ExitCode;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(&cli).await {
        Ok(code) => code,
        Err(error) => {
            tracing::error!("{error}");
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let report = commands::run(cli).await?;
    output::render(&report, cli.pretty)?;

    if report.has_failures() {
        return Ok(ExitCode::from(3));
    }

    Ok(ExitCode::SUCCESS)
}
