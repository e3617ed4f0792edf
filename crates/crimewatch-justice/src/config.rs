//! Typed configuration for the justice core.
//!
//! The canonical configuration is a YAML document whose top-level keys
//! mirror [`JusticeConfig`]'s fields. Every field has a default that
//! reproduces the reference tuning, so an empty document is a valid
//! configuration. Services take the relevant section by value at
//! construction.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level justice configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JusticeConfig {
    /// Tick rate and day length.
    #[serde(default)]
    pub time: TimeConfig,

    /// Witness detection and escalation tuning.
    #[serde(default)]
    pub witness: WitnessConfig,

    /// Bribery formula constants.
    #[serde(default)]
    pub bribery: BriberyConfig,

    /// Sentences, bail and cell layout.
    #[serde(default)]
    pub prison: PrisonConfig,
}

impl JusticeConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Simulation time settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimeConfig {
    /// Simulation ticks per second of game time (default: 20).
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: u64,

    /// Ticks per game day (default: 24000).
    #[serde(default = "default_ticks_per_day")]
    pub ticks_per_day: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: default_ticks_per_second(),
            ticks_per_day: default_ticks_per_day(),
        }
    }
}

const fn default_ticks_per_second() -> u64 {
    20
}

const fn default_ticks_per_day() -> u64 {
    24_000
}

// ---------------------------------------------------------------------------
// Witness
// ---------------------------------------------------------------------------

/// Full extents of an axis-aligned search box.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct VolumeExtent {
    /// Extent along x.
    pub width: f64,
    /// Extent along y.
    pub height: f64,
    /// Extent along z.
    pub depth: f64,
}

impl Default for VolumeExtent {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 50.0,
            depth: 100.0,
        }
    }
}

/// Witness detection and escalation tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WitnessConfig {
    /// Radius around a crime in which candidates can witness it (default: 20).
    #[serde(default = "default_witness_range")]
    pub witness_range: f64,

    /// Per-criminal report cap before the oldest is evicted (default: 50).
    #[serde(default = "default_max_reports")]
    pub max_reports_per_criminal: usize,

    /// Ticks between maintenance passes (default: 200).
    #[serde(default = "default_report_check_interval")]
    pub report_check_interval: u64,

    /// Severity at or above which a witnessed crime escalates immediately
    /// (default: 7).
    #[serde(default = "default_severe_crime_threshold")]
    pub severe_crime_threshold: u8,

    /// Box searched for enforcement agents around a report (default:
    /// 100 x 50 x 100).
    #[serde(default)]
    pub enforcement_volume: VolumeExtent,

    /// Escalation chance per pass when enforcement is nearby (default: 0.9).
    #[serde(default = "default_chance_with_enforcement")]
    pub report_chance_with_enforcement: f64,

    /// Escalation chance per pass otherwise (default: 0.1).
    #[serde(default = "default_chance_without_enforcement")]
    pub report_chance_without_enforcement: f64,

    /// Credibility of a witness with zero honesty (default: 70).
    #[serde(default = "default_base_credibility")]
    pub base_credibility: f64,

    /// Credibility gained per point of honesty (default: 0.3).
    #[serde(default = "default_honesty_weight")]
    pub honesty_credibility_weight: f64,

    /// Report count at which a criminal counts as a repeat offender
    /// (default: 3).
    #[serde(default = "default_repeat_offender_threshold")]
    pub repeat_offender_threshold: usize,
}

impl Default for WitnessConfig {
    fn default() -> Self {
        Self {
            witness_range: default_witness_range(),
            max_reports_per_criminal: default_max_reports(),
            report_check_interval: default_report_check_interval(),
            severe_crime_threshold: default_severe_crime_threshold(),
            enforcement_volume: VolumeExtent::default(),
            report_chance_with_enforcement: default_chance_with_enforcement(),
            report_chance_without_enforcement: default_chance_without_enforcement(),
            base_credibility: default_base_credibility(),
            honesty_credibility_weight: default_honesty_weight(),
            repeat_offender_threshold: default_repeat_offender_threshold(),
        }
    }
}

const fn default_witness_range() -> f64 {
    20.0
}

const fn default_max_reports() -> usize {
    50
}

const fn default_report_check_interval() -> u64 {
    200
}

const fn default_severe_crime_threshold() -> u8 {
    7
}

const fn default_chance_with_enforcement() -> f64 {
    0.9
}

const fn default_chance_without_enforcement() -> f64 {
    0.1
}

const fn default_base_credibility() -> f64 {
    70.0
}

const fn default_honesty_weight() -> f64 {
    0.3
}

const fn default_repeat_offender_threshold() -> usize {
    3
}

// ---------------------------------------------------------------------------
// Bribery
// ---------------------------------------------------------------------------

/// Bribery formula constants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BriberyConfig {
    /// Floor for every minimum bribe (default: 50).
    #[serde(default = "default_min_bribe")]
    pub min_bribe: u64,

    /// Price multiplier for enforcement witnesses (default: 3.0).
    #[serde(default = "default_enforcement_multiplier")]
    pub enforcement_multiplier: f64,
}

impl Default for BriberyConfig {
    fn default() -> Self {
        Self {
            min_bribe: default_min_bribe(),
            enforcement_multiplier: default_enforcement_multiplier(),
        }
    }
}

const fn default_min_bribe() -> u64 {
    50
}

const fn default_enforcement_multiplier() -> f64 {
    3.0
}

// ---------------------------------------------------------------------------
// Prison
// ---------------------------------------------------------------------------

/// Sentence, bail and facility layout settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PrisonConfig {
    /// Seconds of sentence per wanted level (default: 60).
    #[serde(default = "default_jail_seconds")]
    pub jail_seconds_per_wanted_level: u64,

    /// Bail per wanted level in currency units (default: 1000).
    #[serde(default = "default_bail_per_level")]
    pub bail_per_wanted_level: u64,

    /// Percentage of the sentence that must be served before bail
    /// (default: 33).
    #[serde(default = "default_bail_threshold")]
    pub bail_threshold_percent: u64,

    /// Wanted levels removed when bail is paid (default: 2).
    #[serde(default = "default_bail_wanted_reduction")]
    pub bail_wanted_reduction: u32,

    /// Blocks between neighbouring cells along x (default: 4).
    #[serde(default = "default_cell_spacing")]
    pub cell_spacing: i32,
}

impl Default for PrisonConfig {
    fn default() -> Self {
        Self {
            jail_seconds_per_wanted_level: default_jail_seconds(),
            bail_per_wanted_level: default_bail_per_level(),
            bail_threshold_percent: default_bail_threshold(),
            bail_wanted_reduction: default_bail_wanted_reduction(),
            cell_spacing: default_cell_spacing(),
        }
    }
}

const fn default_jail_seconds() -> u64 {
    60
}

const fn default_bail_per_level() -> u64 {
    1000
}

const fn default_bail_threshold() -> u64 {
    33
}

const fn default_bail_wanted_reduction() -> u32 {
    2
}

const fn default_cell_spacing() -> i32 {
    4
}
