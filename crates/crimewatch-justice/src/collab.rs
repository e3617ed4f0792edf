//! Collaborator contracts between the justice core and its host world.
//!
//! The core never touches a concrete world, entity or economy model. It
//! talks to the host through the traits in this module; the host passes a
//! single `&mut` world value into each service call. [`WitnessWorld`] and
//! [`PrisonWorld`] bundle the traits each service needs and are
//! implemented automatically for any type providing the parts.

use crimewatch_types::{AgentRole, BlockPos, CandidateWitness, SearchVolume, SubjectId};
use serde::{Deserialize, Serialize};

use crate::catalog::{CrimeKind, RumorKind};
use crate::error::{LedgerError, ReactionError};

// ---------------------------------------------------------------------------
// Witness-side collaborators
// ---------------------------------------------------------------------------

/// "Who is near this point" queries.
pub trait SpatialIndex {
    /// Every person within `radius` of `center`, asleep or not. The witness
    /// service filters for awareness itself.
    fn nearby_candidates(&self, center: BlockPos, radius: f64) -> Vec<CandidateWitness>;

    /// Whether at least one agent with `role` is inside `volume`.
    fn agent_present(&self, volume: &SearchVolume, role: AgentRole) -> bool;
}

/// Per-witness reaction, called once for every witness of a crime.
pub trait ReactionHook {
    /// React to `witness` having seen `criminal` commit `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ReactionError`] when the reaction could not be applied.
    /// The witness service logs the failure and carries on.
    fn on_witnessed(
        &mut self,
        witness: SubjectId,
        criminal: SubjectId,
        kind: CrimeKind,
    ) -> Result<(), ReactionError>;
}

/// What a rumor says happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrimeSummary {
    /// The crime committed.
    pub kind: CrimeKind,
    /// Where it was committed.
    pub location: BlockPos,
}

/// Gossip propagation.
pub trait RumorNetwork {
    /// Spread a rumor about `subject`. `source` is the first witness, or
    /// `None` when nobody saw the crime.
    fn emit_rumor(
        &mut self,
        subject: SubjectId,
        kind: RumorKind,
        summary: CrimeSummary,
        day: u64,
        source: Option<SubjectId>,
    );
}

/// Faction and town standing.
pub trait FactionReputation {
    /// Record that `subject` committed a crime named `kind_name`.
    fn on_crime_committed(&mut self, subject: SubjectId, kind_name: &str, severity: u8);
}

/// The host's per-subject wanted level (the "stars").
pub trait CrimeLevels {
    /// Drop the subject's wanted level to zero.
    fn clear_wanted_level(&mut self, subject: SubjectId);

    /// Set the subject's wanted level.
    fn set_wanted_level(&mut self, subject: SubjectId, level: u32);

    /// Raise the subject's wanted level by `delta`.
    fn add_wanted_level(&mut self, subject: SubjectId, delta: u32);
}

/// Everything the witness service needs from the host.
pub trait WitnessWorld:
    SpatialIndex + ReactionHook + RumorNetwork + FactionReputation + CrimeLevels
{
}

impl<T> WitnessWorld for T where
    T: SpatialIndex + ReactionHook + RumorNetwork + FactionReputation + CrimeLevels
{
}

// ---------------------------------------------------------------------------
// Witness mind
// ---------------------------------------------------------------------------

/// Kinds of memory a crime or a bribery attempt leaves behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// The witness saw the subject commit a crime.
    CrimeWitnessed,
    /// Money changed hands, or almost did.
    Transaction,
    /// The witness felt pressured or threatened.
    ThreatReceived,
}

/// Labels a witness attaches to another subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectTag {
    /// Seen committing a crime.
    Criminal,
    /// Seen committing a violent crime.
    Dangerous,
    /// Paid the witness off.
    Briber,
    /// Tried to corrupt the witness and failed.
    Corrupt,
}

/// Emotional states a crime or a bribery attempt can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    /// Scared after seeing violence.
    Fearful,
    /// Wary after seeing a non-violent crime.
    Suspicious,
    /// Guilt at having been bought.
    Sad,
    /// Pleased with the payout.
    Happy,
    /// Offended by the offer.
    Angry,
}

/// The witness's inner life: memory, opinions and mood.
pub trait WitnessMind {
    /// Store a memory about `subject` with importance `1..=10`.
    fn remember(&mut self, witness: SubjectId, subject: SubjectId, kind: MemoryKind, importance: u8);

    /// Attach a tag to `subject` in the witness's opinion of them.
    fn tag_subject(&mut self, witness: SubjectId, subject: SubjectId, tag: SubjectTag);

    /// Trigger an emotion. `duration_ticks` of `None` uses the host default.
    fn trigger_emotion(
        &mut self,
        witness: SubjectId,
        emotion: Emotion,
        intensity: u8,
        duration_ticks: Option<u64>,
    );

    /// Reputation bookkeeping once an offer is settled either way.
    fn bribe_settled(&mut self, offerer: SubjectId, witness: SubjectId, accepted: bool);

    /// Lower the witness's sense of safety by `amount`.
    fn lower_safety(&mut self, witness: SubjectId, amount: f64);
}

/// A mind that forgets everything. Useful when the host has no NPC
/// psychology.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMind;

impl WitnessMind for NullMind {
    fn remember(&mut self, _: SubjectId, _: SubjectId, _: MemoryKind, _: u8) {}

    fn tag_subject(&mut self, _: SubjectId, _: SubjectId, _: SubjectTag) {}

    fn trigger_emotion(&mut self, _: SubjectId, _: Emotion, _: u8, _: Option<u64>) {}

    fn bribe_settled(&mut self, _: SubjectId, _: SubjectId, _: bool) {}

    fn lower_safety(&mut self, _: SubjectId, _: f64) {}
}

// ---------------------------------------------------------------------------
// Prison collaborators
// ---------------------------------------------------------------------------

/// Money held by subjects.
pub trait Treasury {
    /// Current balance.
    fn balance_of(&self, subject: SubjectId) -> u64;

    /// Take `amount` from the subject.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the withdrawal was refused.
    fn withdraw(&mut self, subject: SubjectId, amount: u64) -> Result<(), LedgerError>;
}

/// Moving subjects around the world.
pub trait Placement {
    /// Teleport `subject` to `position`.
    fn place(&mut self, subject: SubjectId, position: BlockPos);
}

/// Everything the incarceration manager needs from the host.
pub trait PrisonWorld: CrimeLevels + Treasury + Placement {}

impl<T> PrisonWorld for T where T: CrimeLevels + Treasury + Placement {}
