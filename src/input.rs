//! Reading the parameters of a production plan.
//!
//! Parameters are either typed in at a sequence of prompts (see [`prompt`]) or read from a TOML
//! file.
use crate::parameters::Parameters;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub mod prompt;

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path)
        .with_context(|| format!("Could not read file {}", file_path.display()))?;
    let toml_data = toml::from_str(&toml_str)
        .with_context(|| format!("Could not parse TOML file {}", file_path.display()))?;
    Ok(toml_data)
}

/// Load the parameters of a production plan from a TOML file.
///
/// Only the file format is checked here. Shape checks happen when the model is built.
pub fn load_parameters(file_path: &Path) -> Result<Parameters> {
    read_toml(file_path).context("Failed to load parameters.")
}
