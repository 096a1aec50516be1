//! Provides the main entry point to the program.
use human_panic::{metadata, setup_panic};
use std::process::ExitCode;
use wineopt::cli::run_cli;
use wineopt::log::is_logger_initialised;

fn main() -> ExitCode {
    setup_panic!(metadata!().support("Open an issue on GitHub with the report file attached."));

    if let Err(err) = run_cli() {
        if is_logger_initialised() {
            ::log::error!("{err:?}");
        } else {
            eprintln!("Error: {err:?}");
        }
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
