//! Shared in-memory host world for integration tests.
//!
//! [`TestWorld`] implements every collaborator trait and records each call
//! so tests can assert on side effects.

#![allow(dead_code, clippy::missing_const_for_fn, clippy::must_use_candidate)]

use std::collections::{BTreeMap, BTreeSet};

use crimewatch_justice::{
    CrimeKind, CrimeLevels, CrimeSummary, Emotion, FactionReputation, LedgerError, MemoryKind,
    Placement, ReactionError, ReactionHook, RumorKind, RumorNetwork, SpatialIndex, SubjectTag,
    Treasury, WitnessMind,
};
use crimewatch_types::{
    AgentRole, BlockPos, CandidateWitness, SearchVolume, SubjectId, WitnessTraits,
};

/// Highest wanted level the host tracks.
pub const MAX_WANTED_LEVEL: u32 = 5;

/// One emitted rumor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rumor {
    pub subject: SubjectId,
    pub kind: RumorKind,
    pub summary: CrimeSummary,
    pub day: u64,
    pub source: Option<SubjectId>,
}

#[derive(Debug, Default)]
pub struct TestWorld {
    pub people: Vec<(BlockPos, CandidateWitness)>,
    pub failing_hooks: BTreeSet<SubjectId>,
    pub reactions: Vec<(SubjectId, SubjectId, CrimeKind)>,
    pub rumors: Vec<Rumor>,
    pub reputation: Vec<(SubjectId, String, u8)>,
    pub wanted_levels: BTreeMap<SubjectId, u32>,
    pub balances: BTreeMap<SubjectId, u64>,
    pub placements: Vec<(SubjectId, BlockPos)>,
    pub memories: Vec<(SubjectId, SubjectId, MemoryKind, u8)>,
    pub tags: Vec<(SubjectId, SubjectId, SubjectTag)>,
    pub emotions: Vec<(SubjectId, Emotion)>,
    pub settled: Vec<(SubjectId, SubjectId, bool)>,
    pub safety_lost: Vec<(SubjectId, f64)>,
}

impl TestWorld {
    /// Put a person at `pos` and return their witness profile.
    pub fn add_person(
        &mut self,
        pos: BlockPos,
        honesty: i32,
        greed: i32,
        role: AgentRole,
    ) -> CandidateWitness {
        let person = CandidateWitness {
            id: SubjectId::new(),
            traits: WitnessTraits::new(honesty, greed),
            is_awake: true,
            reactive_system_active: true,
            role,
        };
        self.people.push((pos, person));
        person
    }

    pub fn wanted_level(&self, subject: SubjectId) -> u32 {
        self.wanted_levels.get(&subject).copied().unwrap_or(0)
    }

    pub fn balance(&self, subject: SubjectId) -> u64 {
        self.balances.get(&subject).copied().unwrap_or(0)
    }

    pub fn last_placement(&self, subject: SubjectId) -> Option<BlockPos> {
        self.placements
            .iter()
            .rev()
            .find(|(who, _)| *who == subject)
            .map(|(_, pos)| *pos)
    }
}

impl SpatialIndex for TestWorld {
    fn nearby_candidates(&self, center: BlockPos, radius: f64) -> Vec<CandidateWitness> {
        self.people
            .iter()
            .filter(|(pos, _)| center.within(*pos, radius))
            .map(|(_, person)| *person)
            .collect()
    }

    fn agent_present(&self, volume: &SearchVolume, role: AgentRole) -> bool {
        self.people
            .iter()
            .any(|(pos, person)| person.role == role && volume.contains(*pos))
    }
}

impl ReactionHook for TestWorld {
    fn on_witnessed(
        &mut self,
        witness: SubjectId,
        criminal: SubjectId,
        kind: CrimeKind,
    ) -> Result<(), ReactionError> {
        if self.failing_hooks.contains(&witness) {
            return Err(ReactionError {
                reason: format!("{witness} has no reaction state"),
            });
        }
        self.reactions.push((witness, criminal, kind));
        Ok(())
    }
}

impl RumorNetwork for TestWorld {
    fn emit_rumor(
        &mut self,
        subject: SubjectId,
        kind: RumorKind,
        summary: CrimeSummary,
        day: u64,
        source: Option<SubjectId>,
    ) {
        self.rumors.push(Rumor {
            subject,
            kind,
            summary,
            day,
            source,
        });
    }
}

impl FactionReputation for TestWorld {
    fn on_crime_committed(&mut self, subject: SubjectId, kind_name: &str, severity: u8) {
        self.reputation.push((subject, kind_name.to_owned(), severity));
    }
}

impl CrimeLevels for TestWorld {
    fn clear_wanted_level(&mut self, subject: SubjectId) {
        self.wanted_levels.remove(&subject);
    }

    fn set_wanted_level(&mut self, subject: SubjectId, level: u32) {
        if level == 0 {
            self.wanted_levels.remove(&subject);
        } else {
            self.wanted_levels.insert(subject, level.min(MAX_WANTED_LEVEL));
        }
    }

    fn add_wanted_level(&mut self, subject: SubjectId, delta: u32) {
        let level = self.wanted_level(subject).saturating_add(delta);
        self.set_wanted_level(subject, level);
    }
}

impl Treasury for TestWorld {
    fn balance_of(&self, subject: SubjectId) -> u64 {
        self.balance(subject)
    }

    fn withdraw(&mut self, subject: SubjectId, amount: u64) -> Result<(), LedgerError> {
        let balance = self.balance_of(subject);
        let remaining = balance.checked_sub(amount).ok_or_else(|| LedgerError {
            reason: format!("balance {balance} below {amount}"),
        })?;
        self.balances.insert(subject, remaining);
        Ok(())
    }
}

impl Placement for TestWorld {
    fn place(&mut self, subject: SubjectId, position: BlockPos) {
        self.placements.push((subject, position));
    }
}

impl WitnessMind for TestWorld {
    fn remember(&mut self, witness: SubjectId, subject: SubjectId, kind: MemoryKind, importance: u8) {
        self.memories.push((witness, subject, kind, importance));
    }

    fn tag_subject(&mut self, witness: SubjectId, subject: SubjectId, tag: SubjectTag) {
        self.tags.push((witness, subject, tag));
    }

    fn trigger_emotion(
        &mut self,
        witness: SubjectId,
        emotion: Emotion,
        _intensity: u8,
        _duration_ticks: Option<u64>,
    ) {
        self.emotions.push((witness, emotion));
    }

    fn bribe_settled(&mut self, offerer: SubjectId, witness: SubjectId, accepted: bool) {
        self.settled.push((offerer, witness, accepted));
    }

    fn lower_safety(&mut self, witness: SubjectId, amount: f64) {
        self.safety_lost.push((witness, amount));
    }
}
