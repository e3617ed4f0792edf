//! The in-memory town the justice core runs against.
//!
//! [`SimWorld`] owns every resident and implements each collaborator trait
//! the core expects: spatial queries, reactions, rumors, reputation,
//! wanted levels, money, placement and the witnesses' inner lives.

use std::collections::{BTreeMap, BTreeSet};

use crimewatch_justice::{
    CrimeKind, CrimeLevels, CrimeSummary, Emotion, FactionReputation, LedgerError, MemoryKind,
    Placement, ReactionError, ReactionHook, RumorKind, RumorNetwork, SpatialIndex, SubjectTag,
    Treasury, WitnessMind, react_to_crime,
};
use crimewatch_types::{
    AgentRole, BlockPos, CandidateWitness, SearchVolume, SubjectId, WitnessTraits,
};
use rand::Rng;
use tracing::debug;

use crate::spawner;

/// Highest wanted level the town tracks.
pub const MAX_WANTED_LEVEL: u32 = 5;

/// Reputation lost by an offerer whose bribe was refused.
const REFUSED_BRIBE_PENALTY: i64 = 5;

/// Sense of safety of a resident who has seen nothing.
pub const FULL_SAFETY: f64 = 100.0;

/// One person in town.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resident {
    /// Identity.
    pub id: SubjectId,
    /// Display name.
    pub name: String,
    /// Where they stand.
    pub position: BlockPos,
    /// Honesty and greed.
    pub traits: WitnessTraits,
    /// Civilian or enforcement.
    pub role: AgentRole,
    /// Asleep residents witness nothing.
    pub awake: bool,
    /// Logged-out residents are not simulated.
    pub online: bool,
}

impl Resident {
    /// The resident as the witness service sees them.
    pub const fn as_candidate(&self) -> CandidateWitness {
        CandidateWitness {
            id: self.id,
            traits: self.traits,
            is_awake: self.awake,
            reactive_system_active: self.online,
            role: self.role,
        }
    }
}

/// The town.
#[derive(Debug, Default)]
pub struct SimWorld {
    residents: BTreeMap<SubjectId, Resident>,
    balances: BTreeMap<SubjectId, u64>,
    wanted_levels: BTreeMap<SubjectId, u32>,
    reputation: BTreeMap<SubjectId, i64>,
    rumors: BTreeMap<RumorKind, usize>,
    opinions: BTreeMap<(SubjectId, SubjectId), BTreeSet<SubjectTag>>,
    memories: BTreeMap<SubjectId, usize>,
    moods: BTreeMap<SubjectId, Emotion>,
    safety: BTreeMap<SubjectId, f64>,
}

impl SimWorld {
    /// A town of `residents`, each holding `starting_balance`.
    pub fn new(residents: BTreeMap<SubjectId, Resident>, starting_balance: u64) -> Self {
        let balances = residents.keys().map(|id| (*id, starting_balance)).collect();
        Self {
            residents,
            balances,
            ..Self::default()
        }
    }

    // -----------------------------------------------------------------------
    // Residents
    // -----------------------------------------------------------------------

    /// Look up a resident.
    pub fn resident(&self, id: SubjectId) -> Option<&Resident> {
        self.residents.get(&id)
    }

    /// Every resident, in id order.
    pub fn residents(&self) -> impl Iterator<Item = &Resident> + '_ {
        self.residents.values()
    }

    /// Mark a resident as logged in or out.
    pub fn set_online(&mut self, id: SubjectId, online: bool) {
        if let Some(resident) = self.residents.get_mut(&id) {
            resident.online = online;
        }
    }

    /// At night every civilian sleeps; officers stay on watch.
    pub fn set_night(&mut self, night: bool) {
        for resident in self.residents.values_mut() {
            resident.awake = !night || resident.role == AgentRole::Enforcement;
        }
    }

    /// Move every resident not in `held` to a new spot in town.
    pub fn wander(&mut self, rng: &mut impl Rng, held: &BTreeSet<SubjectId>) {
        for resident in self.residents.values_mut() {
            if !held.contains(&resident.id) {
                resident.position = spawner::random_spot(rng);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Bookkeeping
    // -----------------------------------------------------------------------

    /// Add money to a resident.
    pub fn deposit(&mut self, id: SubjectId, amount: u64) {
        let balance = self.balances.entry(id).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Current host wanted level.
    pub fn wanted_level(&self, id: SubjectId) -> u32 {
        self.wanted_levels.get(&id).copied().unwrap_or(0)
    }

    /// Everyone with a non-zero wanted level.
    pub fn wanted(&self) -> impl Iterator<Item = (SubjectId, u32)> + '_ {
        self.wanted_levels.iter().map(|(id, level)| (*id, *level))
    }

    /// Rumors spread so far, across every kind.
    pub fn rumor_count(&self) -> usize {
        self.rumors.values().sum()
    }

    /// Rumors spread so far, by kind.
    pub fn rumors_by_kind(&self) -> impl Iterator<Item = (RumorKind, usize)> + '_ {
        self.rumors.iter().map(|(kind, count)| (*kind, *count))
    }

    /// A resident's sense of safety, `0.0..=100.0`.
    pub fn safety(&self, id: SubjectId) -> f64 {
        self.safety.get(&id).copied().unwrap_or(FULL_SAFETY)
    }

    /// Residents whose sense of safety is below full.
    pub fn shaken_count(&self) -> usize {
        self.safety.len()
    }

    fn penalize(&mut self, id: SubjectId, amount: i64) {
        let standing = self.reputation.entry(id).or_insert(0);
        *standing = standing.saturating_sub(amount);
    }
}

// ---------------------------------------------------------------------------
// Witness collaborators
// ---------------------------------------------------------------------------

impl SpatialIndex for SimWorld {
    fn nearby_candidates(&self, center: BlockPos, radius: f64) -> Vec<CandidateWitness> {
        self.residents
            .values()
            .filter(|r| center.within(r.position, radius))
            .map(Resident::as_candidate)
            .collect()
    }

    fn agent_present(&self, volume: &SearchVolume, role: AgentRole) -> bool {
        self.residents
            .values()
            .any(|r| r.role == role && r.online && volume.contains(r.position))
    }
}

impl ReactionHook for SimWorld {
    fn on_witnessed(
        &mut self,
        witness: SubjectId,
        criminal: SubjectId,
        kind: CrimeKind,
    ) -> Result<(), ReactionError> {
        if !self.residents.contains_key(&witness) {
            return Err(ReactionError {
                reason: format!("witness {witness} is not a resident"),
            });
        }
        react_to_crime(self, witness, criminal, kind);
        debug!(
            witness = %witness,
            criminal = %criminal,
            crime = kind.id(),
            safety = self.safety(witness),
            "Witness reacted"
        );
        Ok(())
    }
}

impl RumorNetwork for SimWorld {
    fn emit_rumor(
        &mut self,
        subject: SubjectId,
        kind: RumorKind,
        summary: CrimeSummary,
        day: u64,
        source: Option<SubjectId>,
    ) {
        let count = self.rumors.entry(kind).or_insert(0);
        *count = count.saturating_add(1);
        debug!(
            subject = %subject,
            rumor = ?kind,
            crime = summary.kind.id(),
            day,
            eyewitness = source.is_some(),
            "Rumor spreading"
        );
    }
}

impl FactionReputation for SimWorld {
    fn on_crime_committed(&mut self, subject: SubjectId, kind_name: &str, severity: u8) {
        self.penalize(subject, i64::from(severity));
        debug!(subject = %subject, crime = kind_name, severity, "Reputation hit");
    }
}

impl CrimeLevels for SimWorld {
    fn clear_wanted_level(&mut self, subject: SubjectId) {
        self.wanted_levels.remove(&subject);
    }

    fn set_wanted_level(&mut self, subject: SubjectId, level: u32) {
        if level == 0 {
            self.wanted_levels.remove(&subject);
        } else {
            self.wanted_levels
                .insert(subject, level.min(MAX_WANTED_LEVEL));
        }
    }

    fn add_wanted_level(&mut self, subject: SubjectId, delta: u32) {
        let level = self.wanted_level(subject).saturating_add(delta);
        self.set_wanted_level(subject, level);
    }
}

// ---------------------------------------------------------------------------
// Bribery collaborator
// ---------------------------------------------------------------------------

impl WitnessMind for SimWorld {
    fn remember(&mut self, witness: SubjectId, _subject: SubjectId, _kind: MemoryKind, _importance: u8) {
        let count = self.memories.entry(witness).or_insert(0);
        *count = count.saturating_add(1);
    }

    fn tag_subject(&mut self, witness: SubjectId, subject: SubjectId, tag: SubjectTag) {
        self.opinions.entry((witness, subject)).or_default().insert(tag);
    }

    fn trigger_emotion(
        &mut self,
        witness: SubjectId,
        emotion: Emotion,
        _intensity: u8,
        _duration_ticks: Option<u64>,
    ) {
        self.moods.insert(witness, emotion);
    }

    fn bribe_settled(&mut self, offerer: SubjectId, _witness: SubjectId, accepted: bool) {
        if !accepted {
            self.penalize(offerer, REFUSED_BRIBE_PENALTY);
        }
    }

    fn lower_safety(&mut self, witness: SubjectId, amount: f64) {
        let lowered = (self.safety(witness) - amount).clamp(0.0, FULL_SAFETY);
        if lowered < FULL_SAFETY {
            self.safety.insert(witness, lowered);
        }
    }
}

// ---------------------------------------------------------------------------
// Prison collaborators
// ---------------------------------------------------------------------------

impl Treasury for SimWorld {
    fn balance_of(&self, subject: SubjectId) -> u64 {
        self.balances.get(&subject).copied().unwrap_or(0)
    }

    fn withdraw(&mut self, subject: SubjectId, amount: u64) -> Result<(), LedgerError> {
        let balance = self.balance_of(subject);
        let remaining = balance.checked_sub(amount).ok_or_else(|| LedgerError {
            reason: format!("{subject} holds {balance}, needs {amount}"),
        })?;
        self.balances.insert(subject, remaining);
        Ok(())
    }
}

impl Placement for SimWorld {
    fn place(&mut self, subject: SubjectId, position: BlockPos) {
        if let Some(resident) = self.residents.get_mut(&subject) {
            resident.position = position;
        }
    }
}
