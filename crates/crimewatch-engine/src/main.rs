//! Headless engine for the Crimewatch justice core.
//!
//! Wires a seeded in-memory town to the witness, bribery and prison
//! services and runs the crime cycle for a fixed number of ticks.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load justice configuration from `crimewatch-config.yaml`
//!    (or the file named by `CRIMEWATCH_CONFIG`)
//! 3. Read the `engine` section of the same file
//! 4. Spawn residents and configure the prison
//! 5. Run the scenario
//! 6. Log the summary and optionally write JSON snapshots

mod error;
mod scenario;
mod settings;
mod spawner;
mod world;

use std::path::{Path, PathBuf};

use crimewatch_justice::JusticeConfig;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::scenario::Scenario;
use crate::settings::EngineSettings;

/// Environment variable naming an alternative config file.
const CONFIG_ENV: &str = "CRIMEWATCH_CONFIG";

/// Config file looked up in the working directory by default.
const DEFAULT_CONFIG: &str = "crimewatch-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the scenario fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("crimewatch-engine starting");

    // 2. Load configuration.
    let config_path = config_path();
    let config = load_config(&config_path)?;
    info!(
        path = %config_path.display(),
        ticks_per_second = config.time.ticks_per_second,
        witness_range = config.witness.witness_range,
        report_check_interval = config.witness.report_check_interval,
        "Configuration loaded"
    );

    // 3. Engine settings.
    let settings = EngineSettings::load(&config_path)?;
    info!(
        seed = settings.seed,
        ticks = settings.ticks,
        residents = settings.residents,
        officers = settings.officers,
        cells = settings.cells,
        "Engine settings loaded"
    );

    // 4. Build the town.
    let mut rng = SmallRng::seed_from_u64(settings.seed);
    let save_dir = settings.save_dir.clone();
    let mut scenario = Scenario::new(config, settings, &mut rng)?;

    // 5. Run.
    let summary = scenario.run(&mut rng)?;

    // 6. Report.
    info!(
        crimes = summary.crimes,
        reports = summary.reports,
        rumors = summary.rumors,
        shaken = summary.shaken,
        bribes_offered = summary.bribes_offered,
        bribes_accepted = summary.bribes_accepted,
        refusals_reported = summary.refusals_reported,
        escalations = summary.escalations,
        expired = summary.expired,
        arrests = summary.arrests,
        bail_paid = summary.bail_paid,
        served = summary.served,
        still_wanted = summary.still_wanted,
        still_imprisoned = summary.still_imprisoned,
        "Scenario complete"
    );

    if let Some(dir) = save_dir {
        scenario.save(&dir)?;
    }

    info!("crimewatch-engine shutdown complete");
    Ok(())
}

/// The config file path: `CRIMEWATCH_CONFIG` if set, else the default
/// file in the working directory.
fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from)
}

/// Load the justice configuration, falling back to defaults when the file
/// does not exist.
fn load_config(path: &Path) -> Result<JusticeConfig, EngineError> {
    if path.exists() {
        Ok(JusticeConfig::from_file(path)?)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(JusticeConfig::default())
    }
}
