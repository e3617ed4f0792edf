//! Witness detection: who saw a crime, what they report, and when their
//! account escalates into the wanted registry.
//!
//! # Lifecycle
//!
//! 1. [`WitnessDetectionService::register_crime`] turns a crime into one
//!    open report per awake witness, spreads a rumor, notifies reputation,
//!    and escalates severe crimes immediately.
//! 2. [`WitnessDetectionService::run_maintenance`] (every
//!    `report_check_interval` ticks via [`WitnessDetectionService::tick`])
//!    ages out stale reports and gives every open report a chance to be
//!    reported, much higher with enforcement nearby.
//! 3. Between those passes a briber can silence an open report through
//!    [`crate::bribery::BriberyResolver`].
//!
//! Reports are bucketed per criminal. A bucket holds at most
//! `max_reports_per_criminal` reports; adding one more evicts the oldest by
//! creation tick.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crimewatch_types::{AgentRole, BlockPos, SearchVolume, SubjectId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::catalog::CrimeKind;
use crate::collab::{CrimeSummary, Emotion, MemoryKind, SubjectTag, WitnessMind, WitnessWorld};
use crate::config::WitnessConfig;
use crate::error::StoreError;
use crate::report::{MAX_CREDIBILITY, WitnessReport, clamp_credibility, credibility_for};
use crate::store::{StructuredStore, load_document};
use crate::wanted::WantedRegistry;

/// Longest per-criminal bucket accepted from a saved document.
pub const MAX_PERSISTED_REPORTS: usize = 1000;

/// A crime as reported by the host's detection layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrimeEvent {
    /// Who committed it.
    pub criminal: SubjectId,
    /// What was committed.
    pub kind: CrimeKind,
    /// Where.
    pub location: BlockPos,
    /// The victim, if any.
    pub victim: Option<SubjectId>,
    /// Simulation tick of the crime.
    pub tick: u64,
    /// Game day of the crime.
    pub day: u64,
}

/// Counters from one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceSummary {
    /// Reports dropped because their validity window elapsed.
    pub expired: usize,
    /// Open reports that escalated this pass.
    pub escalated: usize,
}

/// Owns every witness report and the wanted registry.
#[derive(Debug, Clone)]
pub struct WitnessDetectionService {
    config: WitnessConfig,
    reports: BTreeMap<SubjectId, Vec<WitnessReport>>,
    wanted: WantedRegistry,
    ticks_since_check: u64,
}

impl WitnessDetectionService {
    /// An empty service.
    pub const fn new(config: WitnessConfig) -> Self {
        Self {
            config,
            reports: BTreeMap::new(),
            wanted: WantedRegistry::new(),
            ticks_since_check: 0,
        }
    }

    /// Active configuration.
    pub const fn config(&self) -> &WitnessConfig {
        &self.config
    }

    /// The wanted registry.
    pub const fn wanted(&self) -> &WantedRegistry {
        &self.wanted
    }

    /// Mutable access to the wanted registry (bounty payments, pardons).
    pub const fn wanted_mut(&mut self) -> &mut WantedRegistry {
        &mut self.wanted
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Record a crime and everyone who saw it.
    ///
    /// Exactly one rumor and one reputation call are emitted whether or not
    /// anyone witnessed the crime. A failing reaction hook is logged and
    /// skipped. Returns the reports created, possibly none.
    pub fn register_crime<W>(&mut self, world: &mut W, event: &CrimeEvent) -> Vec<WitnessReport>
    where
        W: WitnessWorld + ?Sized,
    {
        let def = event.kind.definition();
        let witnesses: Vec<_> = world
            .nearby_candidates(event.location, self.config.witness_range)
            .into_iter()
            .filter(|candidate| candidate.can_witness() && candidate.id != event.criminal)
            .collect();

        let mut created = Vec::with_capacity(witnesses.len());
        for witness in &witnesses {
            let report = WitnessReport::new(
                event.criminal,
                witness.id,
                event.kind,
                event.location,
                event.tick,
                event.day,
                credibility_for(witness.traits, &self.config),
            )
            .with_victim(event.victim);

            debug!(
                criminal = %event.criminal,
                witness = %witness.id,
                crime = def.id,
                credibility = report.credibility,
                "Witness report created"
            );
            self.add_report(report.clone());

            if let Err(err) = world.on_witnessed(witness.id, event.criminal, event.kind) {
                warn!(
                    witness = %witness.id,
                    criminal = %event.criminal,
                    error = %err,
                    "Witness reaction failed, continuing"
                );
            }
            created.push(report);
        }

        world.emit_rumor(
            event.criminal,
            def.rumor,
            CrimeSummary {
                kind: event.kind,
                location: event.location,
            },
            event.day,
            witnesses.first().map(|w| w.id),
        );
        world.on_crime_committed(event.criminal, def.id, def.severity);

        if def.severity >= self.config.severe_crime_threshold && !created.is_empty() {
            self.wanted.escalate(event.criminal, event.kind);
        }

        created
    }

    /// Store a report, evicting the criminal's oldest report (by creation
    /// tick, first on ties) while the bucket is full.
    pub fn add_report(&mut self, report: WitnessReport) {
        let cap = self.config.max_reports_per_criminal;
        let bucket = self.reports.entry(report.criminal).or_default();
        while !bucket.is_empty() && bucket.len() >= cap {
            let oldest = bucket
                .iter()
                .enumerate()
                .min_by_key(|(_, r)| r.tick)
                .map(|(idx, _)| idx);
            let Some(idx) = oldest else { break };
            let evicted = bucket.remove(idx);
            debug!(criminal = %evicted.criminal, report = %evicted.id, "Evicted oldest report");
        }
        bucket.push(report);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Every stored report about `criminal`, in insertion order.
    pub fn get_reports_about(&self, criminal: SubjectId) -> &[WitnessReport] {
        self.reports
            .get(&criminal)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Reports about `criminal` that are neither reported nor bribed.
    pub fn get_unreported_reports(
        &self,
        criminal: SubjectId,
    ) -> impl Iterator<Item = &WitnessReport> + '_ {
        self.get_reports_about(criminal)
            .iter()
            .filter(|report| report.is_open())
    }

    /// The first open report `witness` holds about `criminal`.
    pub fn get_report_by_witness(
        &self,
        criminal: SubjectId,
        witness: SubjectId,
    ) -> Option<&WitnessReport> {
        self.get_unreported_reports(criminal)
            .find(|report| report.witness == witness)
    }

    /// Mutable form of [`Self::get_report_by_witness`], for bribery.
    pub fn get_report_by_witness_mut(
        &mut self,
        criminal: SubjectId,
        witness: SubjectId,
    ) -> Option<&mut WitnessReport> {
        self.reports
            .get_mut(&criminal)?
            .iter_mut()
            .find(|report| report.is_open() && report.witness == witness)
    }

    /// How many reports exist about `criminal`, in any state.
    pub fn total_crime_count(&self, criminal: SubjectId) -> usize {
        self.get_reports_about(criminal).len()
    }

    /// Whether `criminal` has at least `repeat_offender_threshold` reports.
    pub fn is_repeat_offender(&self, criminal: SubjectId) -> bool {
        self.total_crime_count(criminal) >= self.config.repeat_offender_threshold
    }

    /// The most severe open report about `criminal` (earliest on ties).
    pub fn most_severe_unreported(&self, criminal: SubjectId) -> Option<&WitnessReport> {
        self.get_unreported_reports(criminal)
            .min_by_key(|report| Reverse(report.kind.severity()))
    }

    /// Total number of stored reports.
    pub fn report_count(&self) -> usize {
        self.reports.values().map(Vec::len).sum()
    }

    // -----------------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------------

    /// Count one tick and run maintenance every `report_check_interval`
    /// ticks. Returns the pass summary when a pass ran.
    pub fn tick<W>(
        &mut self,
        world: &mut W,
        rng: &mut impl Rng,
        current_tick: u64,
        current_day: u64,
    ) -> Option<MaintenanceSummary>
    where
        W: WitnessWorld + ?Sized,
    {
        self.ticks_since_check = self.ticks_since_check.saturating_add(1);
        if self.ticks_since_check < self.config.report_check_interval {
            return None;
        }
        self.ticks_since_check = 0;
        Some(self.run_maintenance(world, rng, current_tick, current_day))
    }

    /// Expire stale reports, then roll every open report for escalation.
    ///
    /// An open report escalates with `report_chance_with_enforcement` when
    /// an enforcement agent is inside the search volume around its
    /// location, else with `report_chance_without_enforcement`. Escalation
    /// adds the crime's base bounty to the registry; with enforcement
    /// present it also raises the host wanted level by one.
    pub fn run_maintenance<W>(
        &mut self,
        world: &mut W,
        rng: &mut impl Rng,
        current_tick: u64,
        current_day: u64,
    ) -> MaintenanceSummary
    where
        W: WitnessWorld + ?Sized,
    {
        let expired = self.expire(current_day);
        let extent = self.config.enforcement_volume;
        let mut escalated = 0_usize;

        for report in self.reports.values_mut().flatten().filter(|r| r.is_open()) {
            let volume =
                SearchVolume::centered_on(report.location, extent.width, extent.height, extent.depth);
            let enforcement_present = world.agent_present(&volume, AgentRole::Enforcement);
            let chance = if enforcement_present {
                self.config.report_chance_with_enforcement
            } else {
                self.config.report_chance_without_enforcement
            };

            if rng.random::<f64>() >= chance {
                continue;
            }
            if !report.mark_as_reported() {
                continue;
            }
            escalated = escalated.saturating_add(1);
            self.wanted.escalate(report.criminal, report.kind);
            if enforcement_present {
                world.add_wanted_level(report.criminal, 1);
            }
            debug!(
                report = %report.id,
                criminal = %report.criminal,
                enforcement_present,
                "Witness reported crime"
            );
        }

        debug!(current_tick, current_day, expired, escalated, "Report maintenance pass");
        MaintenanceSummary { expired, escalated }
    }

    /// Run the expiry sweep on a day change. Returns how many reports were
    /// dropped.
    pub fn on_day_change(&mut self, current_day: u64) -> usize {
        self.expire(current_day)
    }

    fn expire(&mut self, current_day: u64) -> usize {
        let mut removed = 0_usize;
        for bucket in self.reports.values_mut() {
            let before = bucket.len();
            bucket.retain(|report| report.is_valid(current_day));
            removed = removed.saturating_add(before.saturating_sub(bucket.len()));
        }
        self.reports.retain(|_, bucket| !bucket.is_empty());
        removed
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Serialisable copy of every report and bounty.
    pub fn snapshot(&self) -> WitnessSnapshot {
        WitnessSnapshot {
            reports: self.reports.clone(),
            wanted: self
                .wanted
                .iter()
                .map(|(subject, bounty)| WantedRecord {
                    subject,
                    wanted: true,
                    bounty: Some(i64::try_from(bounty).unwrap_or(i64::MAX)),
                })
                .collect(),
        }
    }

    /// Replace all state with `snapshot`, repairing what it can. Returns
    /// the number of corrections made.
    pub fn restore(&mut self, snapshot: WitnessSnapshot) -> usize {
        let mut corrections = 0_usize;
        let mut reports = BTreeMap::new();
        for (criminal, mut bucket) in snapshot.reports {
            if bucket.len() > MAX_PERSISTED_REPORTS {
                warn!(criminal = %criminal, len = bucket.len(), "Truncating oversized report bucket");
                bucket.truncate(MAX_PERSISTED_REPORTS);
                corrections = corrections.saturating_add(1);
            }
            for report in &mut bucket {
                if !(0.0..=MAX_CREDIBILITY).contains(&report.credibility) {
                    report.credibility = clamp_credibility(report.credibility);
                    corrections = corrections.saturating_add(1);
                }
            }
            if !bucket.is_empty() {
                reports.insert(criminal, bucket);
            }
        }

        let mut wanted = WantedRegistry::new();
        for record in snapshot.wanted {
            match record.bounty.and_then(|b| u64::try_from(b).ok()).filter(|b| *b > 0) {
                Some(bounty) => {
                    if !record.wanted {
                        corrections = corrections.saturating_add(1);
                    }
                    wanted.add_bounty(record.subject, bounty);
                }
                None => {
                    warn!(subject = %record.subject, bounty = ?record.bounty, "Dropping wanted entry without bounty");
                    corrections = corrections.saturating_add(1);
                }
            }
        }

        self.reports = reports;
        self.wanted = wanted;
        self.ticks_since_check = 0;
        if corrections > 0 {
            warn!(corrections, "Corrected saved witness state");
        }
        corrections
    }

    /// Save the current state. On failure memory is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if encoding or the store write fails.
    pub fn save_to<S>(&self, store: &mut S) -> Result<(), StoreError>
    where
        S: StructuredStore + ?Sized,
    {
        let document = serde_json::to_value(self.snapshot())?;
        store.save(&document).inspect_err(|err| {
            error!(error = %err, "Failed to save witness state");
        })
    }

    /// Load state from `store`. Anything unreadable yields empty state.
    /// Returns the number of corrections made while restoring.
    pub fn load_from<S>(&mut self, store: &S) -> usize
    where
        S: StructuredStore + ?Sized,
    {
        let snapshot = load_document(store, "witness").unwrap_or_default();
        let corrections = self.restore(snapshot);
        info!(
            reports = self.report_count(),
            wanted = self.wanted.len(),
            "Witness state loaded"
        );
        corrections
    }
}

/// One persisted wanted-registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WantedRecord {
    /// The wanted subject.
    pub subject: SubjectId,
    /// Wanted flag as saved.
    #[serde(default)]
    pub wanted: bool,
    /// Bounty as saved; absent or non-positive entries are dropped on load.
    #[serde(default)]
    pub bounty: Option<i64>,
}

/// Persisted form of the witness service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WitnessSnapshot {
    /// Reports grouped by criminal.
    #[serde(default)]
    pub reports: BTreeMap<SubjectId, Vec<WitnessReport>>,
    /// Wanted registry entries.
    #[serde(default)]
    pub wanted: Vec<WantedRecord>,
}

/// A witness's reaction to seeing `criminal` commit `kind`.
///
/// Stores a `CrimeWitnessed` memory of importance `severity + 2` and tags
/// the criminal `Criminal`, adding `Dangerous` for violent crimes. Violence
/// triggers `Fearful` at `severity * 10`; anything else `Suspicious` at
/// `severity * 7`. The witness's safety drops by the crime's safety impact.
/// Hosts call this from their [`crate::collab::ReactionHook`].
pub fn react_to_crime<M>(mind: &mut M, witness: SubjectId, criminal: SubjectId, kind: CrimeKind)
where
    M: WitnessMind + ?Sized,
{
    let def = kind.definition();
    mind.remember(witness, criminal, MemoryKind::CrimeWitnessed, def.severity.saturating_add(2));
    mind.tag_subject(witness, criminal, SubjectTag::Criminal);
    if def.is_violent() {
        mind.tag_subject(witness, criminal, SubjectTag::Dangerous);
        mind.trigger_emotion(witness, Emotion::Fearful, def.severity.saturating_mul(10), None);
    } else {
        mind.trigger_emotion(witness, Emotion::Suspicious, def.severity.saturating_mul(7), None);
    }
    mind.lower_safety(witness, def.safety_impact());
}
