//! Crime, witness and incarceration logic for the Crimewatch simulation.
//!
//! This crate turns an observed offense into witness reports, escalates
//! reports into a wanted status, lets offenders buy witnesses off, and runs
//! the prison state machine. It performs no I/O of its own apart from the
//! optional JSON file store; everything the host world provides comes in
//! through the traits in [`collab`].
//!
//! # Modules
//!
//! - [`catalog`] -- Crime types and their derived formulas ([`CrimeCatalog`])
//! - [`report`] -- One witness's account of one crime ([`WitnessReport`])
//! - [`wanted`] -- Wanted subjects and bounties ([`WantedRegistry`])
//! - [`witness`] -- Witness detection, escalation and expiry ([`WitnessDetectionService`])
//! - [`bribery`] -- Bribe eligibility, pricing and outcomes ([`BriberyResolver`])
//! - [`incarceration`] -- Cells, sentences, bail and release ([`IncarcerationManager`])
//! - [`collab`] -- Host world contracts (spatial, rumor, ledger, placement, ...)
//! - [`config`] -- YAML configuration ([`JusticeConfig`])
//! - [`clock`] -- Tick counter and game day ([`SimClock`])
//! - [`store`] -- Structured persistence ([`StructuredStore`])
//! - [`error`] -- Error types

pub mod bribery;
pub mod catalog;
pub mod clock;
pub mod collab;
pub mod config;
pub mod error;
pub mod incarceration;
pub mod report;
pub mod store;
pub mod wanted;
pub mod witness;

// Re-export primary types at crate root for convenience.
pub use bribery::{BribeHint, BriberyOutcome, BriberyResolver};
pub use catalog::{CrimeCatalog, CrimeKind, CrimeTypeDefinition, RumorKind};
pub use clock::{Advance, ClockError, SimClock};
pub use collab::{
    CrimeLevels, CrimeSummary, Emotion, FactionReputation, MemoryKind, NullMind, Placement,
    PrisonWorld, ReactionHook, RumorNetwork, SpatialIndex, SubjectTag, Treasury, WitnessMind,
    WitnessWorld,
};
pub use config::{
    BriberyConfig, ConfigError, JusticeConfig, PrisonConfig, TimeConfig, VolumeExtent,
    WitnessConfig,
};
pub use error::{BriberyError, IncarcerationError, LedgerError, ReactionError, StoreError};
pub use incarceration::{
    Cell, Facility, IncarcerationManager, PrisonSnapshot, PrisonerRecord, ReleaseReason,
    SentenceClock,
};
pub use report::{ReportStatus, WitnessReport, clamp_credibility, credibility_for};
pub use store::{JsonFileStore, MemoryStore, StructuredStore};
pub use wanted::WantedRegistry;
pub use witness::{
    CrimeEvent, MaintenanceSummary, WitnessDetectionService, WitnessSnapshot, react_to_crime,
};
