//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and scenario execution.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Justice configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: crimewatch_justice::ConfigError,
    },

    /// The `engine` section of the config file is unusable.
    #[error("engine settings error: {message}")]
    Settings {
        /// Description of the settings failure.
        message: String,
    },

    /// Simulation clock initialization or advance failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: crimewatch_justice::ClockError,
    },

    /// A prison transition was rejected.
    #[error("prison error: {source}")]
    Prison {
        /// The underlying incarceration error.
        #[from]
        source: crimewatch_justice::IncarcerationError,
    },

    /// A bribe was attempted against a closed report.
    #[error("bribery error: {source}")]
    Bribery {
        /// The underlying bribery error.
        #[from]
        source: crimewatch_justice::BriberyError,
    },

    /// The town ledger refused a payment.
    #[error("ledger error: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: crimewatch_justice::LedgerError,
    },

    /// Writing a snapshot failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: crimewatch_justice::StoreError,
    },

    /// Resident spawning failed.
    #[error("spawner error: {message}")]
    Spawner {
        /// Description of the spawner failure.
        message: String,
    },
}
