//! Shared type definitions for the Crimewatch justice simulation.
//!
//! This crate holds the plain data that crosses the boundary between the
//! justice core (`crimewatch-justice`) and the host world that embeds it.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for subjects, reports, and facilities
//! - [`enums`] -- Role classification for witnesses and spatial queries
//! - [`structs`] -- Coordinates, search volumes, and witness profiles

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::AgentRole;
pub use ids::{FacilityId, ReportId, SubjectId};
pub use structs::{BlockPos, CandidateWitness, SearchVolume, TRAIT_MAX, TRAIT_MIN, WitnessTraits};
