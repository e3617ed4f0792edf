//! Enumeration types shared across the justice workspace.

use serde::{Deserialize, Serialize};

/// The social role a simulated person plays, as far as the justice core
/// is concerned.
///
/// Enforcement witnesses escalate faster and are much harder to bribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Ordinary resident.
    #[default]
    Civilian,
    /// Police or any other law-enforcement agent.
    Enforcement,
}
