//! Code for loading program settings.
use crate::get_wineopt_config_dir;
use crate::input::read_toml;
use crate::log::DEFAULT_LOG_LEVEL;
use crate::solver::SolverOptions;
use anyhow::Result;
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

const DEFAULT_SETTINGS_FILE_HEADER: &str = "# This file contains the program settings for wineopt
# All settings are optional. Uncomment a line to change its value.
";

/// Default log level for program
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Default node budget for the branch-and-bound solver
fn default_node_limit() -> u64 {
    SolverOptions::default().node_limit
}

/// Get the path to where the settings file will be read from
pub fn get_settings_file_path() -> PathBuf {
    let mut path = get_wineopt_config_dir();
    path.push(SETTINGS_FILE_NAME);

    path
}

/// Program settings from config file
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// The default program log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Whether to show the output of the solvers
    #[serde(default)]
    pub show_solver_output: bool,
    /// Maximum number of nodes explored by the built-in branch-and-bound solver
    #[serde(default = "default_node_limit")]
    pub node_limit: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            show_solver_output: false,
            node_limit: default_node_limit(),
        }
    }
}

impl Settings {
    /// Read the contents of the settings file.
    ///
    /// If the file is not present, default values for settings will be used
    ///
    /// # Returns
    ///
    /// The program settings as a `Settings` struct or an error if the file is invalid
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    /// Read from the specified path, falling back to defaults if there is no file
    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        read_toml(file_path)
    }

    /// Options for the solver backends
    pub fn solver_options(&self) -> SolverOptions {
        SolverOptions {
            show_output: self.show_solver_output,
            node_limit: self.node_limit,
        }
    }

    /// The contents of the default settings file
    pub fn default_file_contents() -> String {
        // Convert settings with default values to TOML
        let settings_raw = toml::to_string(&Settings::default()).unwrap_or_default();

        // Iterate through the generated TOML, commenting out lines and adding docs
        let mut out = DEFAULT_SETTINGS_FILE_HEADER.to_string();
        for line in settings_raw.lines() {
            if let Some(last) = line.find('=') {
                let field = line[..last].trim();

                // Add documentation from doc comments
                if let Ok(docs) = Settings::get_field_docs(field) {
                    for line in docs.lines() {
                        let _ = write!(&mut out, "\n# # {}\n", line.trim());
                    }
                }

                let _ = writeln!(&mut out, "# {}", line.trim());
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_settings_load_from_path_no_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME); // NB: doesn't exist
        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings::default()
        );
    }

    #[test]
    fn test_settings_load_from_path() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "log_level = \"warn\"\nnode_limit = 50").unwrap();
        }

        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings {
                log_level: "warn".to_string(),
                show_solver_output: false,
                node_limit: 50,
            }
        );
    }

    #[test]
    fn test_settings_load_from_path_unknown_field() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&file_path, "colour = true").unwrap();

        assert!(Settings::load_from_path(&file_path).is_err());
    }

    #[test]
    fn test_settings_from_empty_file() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_solver_options() {
        let settings = Settings {
            show_solver_output: true,
            node_limit: 10,
            ..Settings::default()
        };
        let options = settings.solver_options();
        assert!(options.show_output);
        assert_eq!(options.node_limit, 10);
    }

    #[test]
    fn test_default_file_contents() {
        let contents = Settings::default_file_contents();
        assert!(contents.starts_with(DEFAULT_SETTINGS_FILE_HEADER));
        assert!(contents.contains("# # The default program log level\n"));
        assert!(contents.contains("# log_level = \"info\"\n"));
        assert!(contents.contains("# node_limit = 100000\n"));
    }
}
