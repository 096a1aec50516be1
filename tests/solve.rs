//! Integration tests for the `solve` command.
use std::path::PathBuf;
use wineopt::cli::handle_solve_command;
use wineopt::log::is_logger_initialised;
use wineopt::settings::Settings;

/// Get the path to the parameters of an example plan.
fn get_params_file() -> PathBuf {
    PathBuf::from("demos/single_wine/params.toml")
}

/// An integration test for the `solve` command.
///
/// We also check that the logger is initialised after it is run.
#[test]
fn test_handle_solve_command() {
    unsafe { std::env::set_var("WINEOPT_LOG_LEVEL", "off") };

    assert!(!is_logger_initialised());

    handle_solve_command(Some(&get_params_file()), Some(Settings::default())).unwrap();

    assert!(is_logger_initialised());
}
