//! Bribery: buying a witness's silence before their report escalates.
//!
//! Eligibility, price and success chance are pure functions of the
//! witness's traits, the crime and the offer. [`BriberyResolver::attempt_bribe`]
//! rolls the outcome with a caller-supplied random source, closes the
//! report on success, and records the witness's reaction through
//! [`WitnessMind`].
//!
//! # Formulas
//!
//! - `minimum = max(min_bribe, round(base * greed_f * honesty_f * severity_f * role_f))`
//!   where `greed_f = 1 + greed/100 * 0.5`, `honesty_f = 1 + honesty/100 * 2`
//!   for positive honesty and `1 + honesty/100 * 0.3` otherwise,
//!   `severity_f = 1 + (severity - 5) * 0.2`, `role_f = 3` for enforcement.
//! - `chance = clamp(base_chance * amount_f - (severity - 5) * 0.05, 0.05, 0.95)`
//!   where `amount_f` rises steeply up to the minimum, then flattens.

use crimewatch_types::{CandidateWitness, SubjectId, WitnessTraits};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::CrimeKind;
use crate::collab::{Emotion, MemoryKind, SubjectTag, WitnessMind};
use crate::config::BriberyConfig;
use crate::error::BriberyError;
use crate::report::WitnessReport;

/// Honesty above which nobody can be bribed.
pub const INCORRUPTIBLE_HONESTY: i32 = 80;

/// Highest honesty at which an enforcement witness can still be bribed.
pub const ENFORCEMENT_MAX_HONESTY: i32 = 30;

/// Severity from which only dishonest witnesses can be bribed.
pub const GRAVE_SEVERITY: u8 = 8;

/// Honesty above which a witness looks upright to a would-be briber.
pub const UPRIGHT_HONESTY: i32 = 60;

const MIN_CHANCE: f64 = 0.05;
const MAX_CHANCE: f64 = 0.95;

/// Result of one bribery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BriberyOutcome {
    /// The witness took the money; the report is closed.
    Accepted,
    /// The offer was too low; a larger one may work.
    WantsMore,
    /// The witness refused and is offended.
    Refused,
    /// An enforcement witness refused; the refusal itself is reportable.
    RefusedAndReported,
    /// This witness cannot be bribed for this crime at any price.
    Unbribeable,
}

impl BriberyOutcome {
    /// Whether the report was silenced.
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Whether a larger offer could still succeed.
    pub const fn should_retry(self) -> bool {
        matches!(self, Self::WantsMore)
    }
}

/// How expensive a witness looks, without revealing the exact price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BribeHint {
    /// Honest enough that an offer is likely an insult.
    Upright,
    /// Under 200.
    Modest,
    /// Under 500.
    Costly,
    /// Under 1000.
    Expensive,
    /// 1000 or more.
    Fortune,
}

/// Stateless bribery calculator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BriberyResolver {
    config: BriberyConfig,
}

impl BriberyResolver {
    /// A resolver with the given constants.
    pub const fn new(config: BriberyConfig) -> Self {
        Self { config }
    }

    /// Whether the witness can be bribed for this crime at all.
    pub const fn is_bribeable(traits: WitnessTraits, kind: CrimeKind, is_enforcement: bool) -> bool {
        if traits.honesty > INCORRUPTIBLE_HONESTY {
            return false;
        }
        if is_enforcement && traits.honesty > ENFORCEMENT_MAX_HONESTY {
            return false;
        }
        if kind.severity() >= GRAVE_SEVERITY && traits.honesty >= 0 {
            return false;
        }
        true
    }

    /// The lowest offer the witness considers.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn minimum_bribe(&self, traits: WitnessTraits, kind: CrimeKind, is_enforcement: bool) -> u64 {
        let def = kind.definition();
        let honesty = f64::from(traits.honesty) / 100.0;
        let greed_factor = 1.0 + (f64::from(traits.greed) / 100.0) * 0.5;
        let honesty_factor = if traits.honesty > 0 {
            1.0 + honesty * 2.0
        } else {
            1.0 + honesty * 0.3
        };
        let severity_factor = 1.0 + (f64::from(def.severity) - 5.0) * 0.2;
        let role_factor = if is_enforcement {
            self.config.enforcement_multiplier
        } else {
            1.0
        };

        let raw = (def.base_bounty as f64
            * greed_factor
            * honesty_factor
            * severity_factor
            * role_factor)
            .round()
            .max(0.0) as u64;
        raw.max(self.config.min_bribe)
    }

    /// Trait-driven willingness before the offer is considered:
    /// `0.1 + (100 - honesty)/200 * 0.3 + (greed + 100)/200 * 0.3`.
    pub fn base_chance(traits: WitnessTraits) -> f64 {
        let dishonesty = (100.0 - f64::from(traits.honesty)) / 200.0;
        let greed = (f64::from(traits.greed) + 100.0) / 200.0;
        0.1 + dishonesty * 0.3 + greed * 0.3
    }

    /// Probability that an offer of `offered` against `minimum` succeeds.
    pub fn success_chance(base_chance: f64, kind: CrimeKind, offered: u64, minimum: u64) -> f64 {
        let ratio = offered as f64 / minimum.max(1) as f64;
        let amount_factor = if ratio < 1.0 {
            ratio * 0.3
        } else if ratio < 2.0 {
            0.3 + (ratio - 1.0) * 0.4
        } else {
            0.7 + ((ratio - 2.0) * 0.05).min(0.25)
        };
        let severity_penalty = (f64::from(kind.severity()) - 5.0) * 0.05;
        (base_chance * amount_factor - severity_penalty).clamp(MIN_CHANCE, MAX_CHANCE)
    }

    /// A coarse price indication for the witness.
    pub fn bribe_hint(&self, traits: WitnessTraits, kind: CrimeKind, is_enforcement: bool) -> BribeHint {
        if traits.honesty > UPRIGHT_HONESTY {
            return BribeHint::Upright;
        }
        match self.minimum_bribe(traits, kind, is_enforcement) {
            0..200 => BribeHint::Modest,
            200..500 => BribeHint::Costly,
            500..1000 => BribeHint::Expensive,
            _ => BribeHint::Fortune,
        }
    }

    /// Offer `offered` to `witness` for silence on `report`.
    ///
    /// Unbribeable witnesses leave everything untouched. Otherwise the
    /// outcome is rolled and the witness's reaction recorded in `mind`;
    /// only [`BriberyOutcome::Accepted`] closes the report. A refused
    /// offer at or above the minimum tags the *offerer* as corrupt.
    ///
    /// # Errors
    ///
    /// Returns [`BriberyError::ReportClosed`] if the report is already
    /// reported or bribed, and [`BriberyError::WrongWitness`] if `witness`
    /// did not make the report.
    pub fn attempt_bribe<M>(
        &self,
        mind: &mut M,
        rng: &mut impl Rng,
        offerer: SubjectId,
        witness: &CandidateWitness,
        report: &mut WitnessReport,
        offered: u64,
    ) -> Result<BriberyOutcome, BriberyError>
    where
        M: WitnessMind + ?Sized,
    {
        if report.is_terminal() {
            return Err(BriberyError::ReportClosed(report.id));
        }
        if report.witness != witness.id {
            return Err(BriberyError::WrongWitness { report: report.id, witness: witness.id });
        }
        let is_enforcement = witness.is_enforcement();
        if !Self::is_bribeable(witness.traits, report.kind, is_enforcement) {
            debug!(witness = %witness.id, report = %report.id, "Witness is unbribeable");
            return Ok(BriberyOutcome::Unbribeable);
        }

        let minimum = self.minimum_bribe(witness.traits, report.kind, is_enforcement);
        let chance = Self::success_chance(
            Self::base_chance(witness.traits),
            report.kind,
            offered,
            minimum,
        );
        let roll = rng.random::<f64>();

        let outcome = if roll < chance {
            report.mark_as_bribed(offered);
            mind.remember(witness.id, offerer, MemoryKind::Transaction, 6);
            mind.tag_subject(witness.id, offerer, SubjectTag::Briber);
            if witness.traits.honesty > 0 {
                mind.trigger_emotion(witness.id, Emotion::Sad, 30, Some(1200));
            } else {
                mind.trigger_emotion(witness.id, Emotion::Happy, 20, Some(600));
            }
            mind.bribe_settled(offerer, witness.id, true);
            BriberyOutcome::Accepted
        } else if offered < minimum {
            mind.remember(witness.id, offerer, MemoryKind::Transaction, 4);
            BriberyOutcome::WantsMore
        } else {
            mind.remember(witness.id, offerer, MemoryKind::ThreatReceived, 7);
            mind.tag_subject(witness.id, offerer, SubjectTag::Corrupt);
            mind.trigger_emotion(witness.id, Emotion::Angry, 50, None);
            mind.bribe_settled(offerer, witness.id, false);
            if is_enforcement {
                BriberyOutcome::RefusedAndReported
            } else {
                BriberyOutcome::Refused
            }
        };

        info!(
            offerer = %offerer,
            witness = %witness.id,
            report = %report.id,
            offered,
            minimum,
            chance,
            outcome = ?outcome,
            "Bribe attempted"
        );
        Ok(outcome)
    }
}
