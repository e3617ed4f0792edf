//! Harness settings, read from the `engine` section of the config file.
//!
//! The justice core ignores this section; only the binary reads it.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::EngineError;

/// Knobs for the seeded scenario.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineSettings {
    /// Seed for every random decision in the run.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of ticks to simulate.
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Civilian residents to spawn.
    #[serde(default = "default_residents")]
    pub residents: u32,

    /// Enforcement officers to spawn.
    #[serde(default = "default_officers")]
    pub officers: u32,

    /// Cells in the town prison.
    #[serde(default = "default_cells")]
    pub cells: u32,

    /// Ticks between crime opportunities.
    #[serde(default = "default_crime_interval")]
    pub crime_interval: u64,

    /// Money every resident starts with.
    #[serde(default = "default_starting_balance")]
    pub starting_balance: u64,

    /// Directory for JSON snapshots written at the end of the run.
    #[serde(default)]
    pub save_dir: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            ticks: default_ticks(),
            residents: default_residents(),
            officers: default_officers(),
            cells: default_cells(),
            crime_interval: default_crime_interval(),
            starting_balance: default_starting_balance(),
            save_dir: None,
        }
    }
}

const fn default_seed() -> u64 {
    42
}

const fn default_ticks() -> u64 {
    72_000
}

const fn default_residents() -> u32 {
    16
}

const fn default_officers() -> u32 {
    3
}

const fn default_cells() -> u32 {
    4
}

const fn default_crime_interval() -> u64 {
    300
}

const fn default_starting_balance() -> u64 {
    5_000
}

impl EngineSettings {
    /// Read the `engine` section of the YAML file at `path`.
    ///
    /// A missing file or a file without an `engine` key yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Settings`] if the file cannot be read or the
    /// section does not parse.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Settings {
            message: format!("failed to read config file: {e}"),
        })?;
        Self::parse(&contents)
    }

    /// Parse the `engine` section out of a full YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Settings`] if the document or the section
    /// does not parse.
    pub fn parse(yaml: &str) -> Result<Self, EngineError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: serde_yml::Value = serde_yml::from_str(yaml).map_err(|e| EngineError::Settings {
            message: format!("failed to parse config YAML: {e}"),
        })?;
        match raw.get("engine") {
            Some(section) => serde_yml::from_value(section.clone()).map_err(|e| {
                EngineError::Settings {
                    message: format!("failed to parse engine section: {e}"),
                }
            }),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_section_uses_defaults() {
        let settings = EngineSettings::parse("witness:\n  witness_range: 12.0\n").unwrap();
        assert_eq!(settings, EngineSettings::default());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let yaml = "engine:\n  seed: 7\n  ticks: 500\n  save_dir: out\n";
        let settings = EngineSettings::parse(yaml).unwrap();
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.ticks, 500);
        assert_eq!(settings.save_dir, Some(PathBuf::from("out")));
        assert_eq!(settings.residents, 16);
    }

    #[test]
    fn malformed_section_is_an_error() {
        let result = EngineSettings::parse("engine:\n  seed: [1, 2]\n");
        assert!(matches!(result, Err(EngineError::Settings { .. })));
    }

    #[test]
    fn absent_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = EngineSettings::load(&dir.path().join("none.yaml")).unwrap();
        assert_eq!(settings, EngineSettings::default());
    }
}
