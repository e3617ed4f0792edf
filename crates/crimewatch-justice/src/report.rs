//! Witness reports: one witness's time-bounded account of one crime.
//!
//! A report starts [`ReportStatus::Open`] and ends in exactly one terminal
//! state, `Reported` or `Bribed`. Terminal reports are never mutated again
//! and drop out of every "unreported" query.

use crimewatch_types::{BlockPos, ReportId, SubjectId, WitnessTraits};
use serde::{Deserialize, Serialize};

use crate::catalog::{CrimeKind, CrimeTypeDefinition};
use crate::config::WitnessConfig;

/// Credibility at or above which an open report is usable as evidence.
pub const EVIDENCE_CREDIBILITY_THRESHOLD: f64 = 50.0;

/// Upper bound of the credibility scale.
pub const MAX_CREDIBILITY: f64 = 100.0;

/// Lifecycle state of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReportStatus {
    /// Not yet escalated or silenced.
    #[default]
    Open,
    /// The witness told the authorities.
    Reported,
    /// The witness accepted a bribe.
    Bribed {
        /// Amount paid.
        amount: u64,
    },
}

/// A recorded observation of a crime by a single witness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WitnessReport {
    /// Report identity.
    pub id: ReportId,
    /// Who committed the crime.
    pub criminal: SubjectId,
    /// Who saw it.
    pub witness: SubjectId,
    /// What was committed.
    pub kind: CrimeKind,
    /// Where it happened.
    pub location: BlockPos,
    /// Simulation tick at creation.
    pub tick: u64,
    /// Game day at creation.
    pub day: u64,
    /// The victim, if there was one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub victim: Option<SubjectId>,
    /// Trust in the witness's account, `0.0..=100.0`.
    pub credibility: f64,
    /// Free-form annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    status: ReportStatus,
}

impl WitnessReport {
    /// Create an open report. Credibility is clamped to `0..=100`.
    pub fn new(
        criminal: SubjectId,
        witness: SubjectId,
        kind: CrimeKind,
        location: BlockPos,
        tick: u64,
        day: u64,
        credibility: f64,
    ) -> Self {
        Self {
            id: ReportId::new(),
            criminal,
            witness,
            kind,
            location,
            tick,
            day,
            victim: None,
            credibility: clamp_credibility(credibility),
            details: None,
            status: ReportStatus::Open,
        }
    }

    /// Attach a victim.
    #[must_use]
    pub const fn with_victim(mut self, victim: Option<SubjectId>) -> Self {
        self.victim = victim;
        self
    }

    /// Attach a free-form annotation.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// The catalog entry for this report's crime.
    pub const fn definition(&self) -> CrimeTypeDefinition {
        self.kind.definition()
    }

    /// Current lifecycle state.
    pub const fn status(&self) -> ReportStatus {
        self.status
    }

    /// Whether the report still awaits escalation or bribery.
    pub const fn is_open(&self) -> bool {
        matches!(self.status, ReportStatus::Open)
    }

    /// Whether the report reached a terminal state.
    pub const fn is_terminal(&self) -> bool {
        !self.is_open()
    }

    /// Whether the witness told the authorities.
    pub const fn is_reported(&self) -> bool {
        matches!(self.status, ReportStatus::Reported)
    }

    /// Whether the witness was bribed.
    pub const fn is_bribed(&self) -> bool {
        matches!(self.status, ReportStatus::Bribed { .. })
    }

    /// Amount paid, if bribed.
    pub const fn bribe_amount(&self) -> Option<u64> {
        match self.status {
            ReportStatus::Bribed { amount } => Some(amount),
            ReportStatus::Open | ReportStatus::Reported => None,
        }
    }

    /// Close the report as reported. Returns `false` (and changes nothing)
    /// if the report was already terminal.
    pub const fn mark_as_reported(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = ReportStatus::Reported;
        true
    }

    /// Close the report as bribed. Returns `false` (and changes nothing)
    /// if the report was already terminal.
    pub const fn mark_as_bribed(&mut self, amount: u64) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = ReportStatus::Bribed { amount };
        true
    }

    /// A report stays valid while `current_day - day <= severity * 2`.
    pub fn is_valid(&self, current_day: u64) -> bool {
        current_day.saturating_sub(self.day) <= self.definition().wanted_duration_days()
    }

    /// Open and credible enough to stand as evidence.
    pub const fn is_usable_as_evidence(&self) -> bool {
        self.is_open() && self.credibility >= EVIDENCE_CREDIBILITY_THRESHOLD
    }

    /// `severity * 10 * credibility / 100`, or 0 once bribed.
    pub fn evidence_value(&self) -> f64 {
        if self.is_bribed() {
            return 0.0;
        }
        f64::from(self.definition().severity) * 10.0 * self.credibility / 100.0
    }

    /// The bounty this report is worth, or 0 once bribed.
    pub fn calculate_bounty(&self, repeat_offender: bool) -> u64 {
        if self.is_bribed() {
            return 0;
        }
        self.definition().calculate_bounty(repeat_offender, false)
    }

    /// Rough price of this witness's silence:
    /// `floor(base_bounty * credibility / 100 * (1 + severity / 10))`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn minimum_bribe_hint(&self) -> u64 {
        let def = self.definition();
        let hint = def.base_bounty as f64 * (self.credibility / 100.0)
            * (1.0 + f64::from(def.severity) / 10.0);
        hint.floor() as u64
    }
}

/// Credibility of a witness: `clamp(base + honesty * weight, 0, 100)`.
pub fn credibility_for(traits: WitnessTraits, config: &WitnessConfig) -> f64 {
    clamp_credibility(
        config.base_credibility + f64::from(traits.honesty) * config.honesty_credibility_weight,
    )
}

/// Clamp to `0.0..=100.0`. Non-finite input counts as no credibility.
pub const fn clamp_credibility(raw: f64) -> f64 {
    if raw.is_finite() {
        raw.clamp(0.0, MAX_CREDIBILITY)
    } else {
        0.0
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn report(kind: CrimeKind, day: u64, credibility: f64) -> WitnessReport {
        WitnessReport::new(
            SubjectId::new(),
            SubjectId::new(),
            kind,
            BlockPos::new(0, 64, 0),
            0,
            day,
            credibility,
        )
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    #[test]
    fn terminal_states_are_exclusive() {
        let mut r = report(CrimeKind::Burglary, 0, 80.0);
        assert!(r.mark_as_bribed(300));
        assert!(!r.mark_as_reported());
        assert!(!r.mark_as_bribed(900));
        assert_eq!(r.bribe_amount(), Some(300));
        assert!(!r.is_reported());

        let mut r = report(CrimeKind::Burglary, 0, 80.0);
        assert!(r.mark_as_reported());
        assert!(!r.mark_as_bribed(10));
        assert_eq!(r.bribe_amount(), None);
    }

    #[test]
    fn validity_window_is_inclusive() {
        // Severity 2: valid for days 10..=14.
        let r = report(CrimeKind::PettyTheft, 10, 70.0);
        assert!(r.is_valid(10));
        assert!(r.is_valid(14));
        assert!(!r.is_valid(15));
        // Clock going backwards never invalidates.
        assert!(r.is_valid(3));
    }

    #[test]
    fn credibility_is_clamped_on_construction() {
        assert_eq!(report(CrimeKind::Fraud, 0, 250.0).credibility, 100.0);
    }

    // -----------------------------------------------------------------------
    // Derived values
    // -----------------------------------------------------------------------

    #[test]
    fn evidence_rules() {
        let mut r = report(CrimeKind::Robbery, 0, 80.0);
        assert!(r.is_usable_as_evidence());
        assert_eq!(r.evidence_value(), 56.0);
        assert!(!report(CrimeKind::Robbery, 0, 49.0).is_usable_as_evidence());

        assert!(r.mark_as_bribed(500));
        assert!(!r.is_usable_as_evidence());
        assert_eq!(r.evidence_value(), 0.0);
        assert_eq!(r.calculate_bounty(true), 0);
    }

    #[test]
    fn report_bounty_applies_repeat_multiplier() {
        let r = report(CrimeKind::PettyTheft, 0, 70.0);
        assert_eq!(r.calculate_bounty(true), 75);
        assert_eq!(r.calculate_bounty(false), 50);
    }

    #[test]
    fn minimum_bribe_hint_scales_with_credibility() {
        // 400 * 0.5 * 1.5 = 300
        assert_eq!(report(CrimeKind::Burglary, 0, 50.0).minimum_bribe_hint(), 300);
        // 50 * 0.7 * 1.2 = 42
        assert_eq!(report(CrimeKind::PettyTheft, 0, 70.0).minimum_bribe_hint(), 42);
    }

    #[test]
    fn credibility_from_honesty() {
        let config = WitnessConfig::default();
        assert_eq!(credibility_for(WitnessTraits::new(0, 0), &config), 70.0);
        assert_eq!(credibility_for(WitnessTraits::new(100, 0), &config), 100.0);
        assert_eq!(credibility_for(WitnessTraits::new(-100, 0), &config), 40.0);
        assert_eq!(credibility_for(WitnessTraits::new(50, 0), &config), 85.0);
    }

    #[test]
    fn fractional_credibility_is_kept() {
        let config = WitnessConfig::default();
        let credibility = credibility_for(WitnessTraits::new(33, 0), &config);
        assert!((credibility - 79.9).abs() < 1e-9);

        let r = report(CrimeKind::Burglary, 0, credibility);
        // floor(400 * 0.799 * 1.5) = floor(479.4)
        assert_eq!(r.minimum_bribe_hint(), 479);
        // 5 * 10 * 79.9 / 100
        assert!((r.evidence_value() - 39.95).abs() < 1e-9);
    }

    #[test]
    fn non_finite_credibility_counts_as_none() {
        assert_eq!(clamp_credibility(f64::NAN), 0.0);
        assert_eq!(clamp_credibility(f64::INFINITY), 0.0);
        assert_eq!(clamp_credibility(-3.5), 0.0);
    }

    #[test]
    fn status_serializes_with_stable_keys() {
        let mut r = report(CrimeKind::Vandalism, 0, 70.0);
        assert!(r.mark_as_bribed(120));
        let json = serde_json::to_value(&r).unwrap_or_default();
        assert_eq!(json["kind"], "VANDALISM");
        assert_eq!(json["status"]["state"], "bribed");
        assert_eq!(json["status"]["amount"], 120);
    }
}
