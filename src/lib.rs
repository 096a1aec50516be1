//! Common functionality for wineopt, a planner for wine production.
//!
//! Given the revenue, market saturation and costs of a set of standard and premium wines, and the
//! resources each one consumes, wineopt finds the production quantities which maximise profit.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod cli;
pub mod input;
pub mod log;
pub mod model;
pub mod parameters;
pub mod report;
pub mod settings;
pub mod solver;

#[cfg(test)]
mod fixture;

/// Get the directory where the program's configuration files are stored.
///
/// Falls back to the current directory if the platform has no standard config directory.
pub fn get_wineopt_config_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_default();
    path.push("wineopt");
    path
}
