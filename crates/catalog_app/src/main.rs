mod cli;
mod commands;
mod logging;

use std::process::ExitCode;

use clap::Parser;

use catalog_logging::{catalog_error, level_for_verbosity};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    logging::initialize(level_for_verbosity(cli.verbose), cli.log_file.as_deref());

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            catalog_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
