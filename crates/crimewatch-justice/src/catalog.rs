//! The crime catalog: an immutable table of crime-type definitions.
//!
//! Every crime the justice core knows about is a [`CrimeKind`]. Its static
//! attributes (severity, bounty, wanted stars, fine, prison days, rumor
//! kind) live in a [`CrimeTypeDefinition`]; everything else -- report
//! chance, wanted duration, safety impact, bounty multipliers -- is derived
//! from those attributes on demand and never stored.
//!
//! Lookups never fail. Unknown identifiers and out-of-range ordinals
//! resolve to [`CrimeCatalog::DEFAULT`].
//!
//! | Kind | Sev | Bounty | Stars | Fine | Days |
//! |------|-----|--------|-------|------|------|
//! | `PETTY_THEFT` | 2 | 50 | 1 | 500 | 1 |
//! | `SHOPLIFTING` | 2 | 80 | 1 | 400 | 1 |
//! | `TRESPASSING` | 1 | 30 | 1 | 300 | 1 |
//! | `VANDALISM` | 3 | 120 | 1 | 800 | 1 |
//! | `DRUG_USE` | 2 | 60 | 1 | 500 | 1 |
//! | `THREAT` | 3 | 150 | 1 | 1000 | 1 |
//! | `FRAUD` | 4 | 300 | 2 | 1500 | 2 |
//! | `BRIBERY` | 4 | 250 | 2 | 2000 | 2 |
//! | `BURGLARY` | 5 | 400 | 2 | 2500 | 3 |
//! | `DRUG_DEALING_SMALL` | 5 | 350 | 2 | 3000 | 3 |
//! | `ASSAULT` | 6 | 500 | 2 | 2000 | 3 |
//! | `EVADING_POLICE` | 6 | 450 | 3 | 3000 | 3 |
//! | `ROBBERY` | 7 | 800 | 3 | 5000 | 5 |
//! | `AGGRAVATED_ASSAULT` | 8 | 1200 | 4 | 8000 | 7 |
//! | `DRUG_DEALING_LARGE` | 8 | 1500 | 3 | 10000 | 7 |
//! | `ARMED_VIOLENCE` | 9 | 2000 | 5 | 15000 | 10 |

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RumorKind
// ---------------------------------------------------------------------------

/// The category of gossip a crime generates in the rumor network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RumorKind {
    /// Something was stolen.
    Theft,
    /// Someone was threatened or hurt.
    Violence,
    /// Drugs were used or sold.
    Drugs,
    /// Someone was cheated.
    Fraud,
    /// Someone tried to buy an official.
    Corruption,
    /// Public order was disturbed.
    Disorder,
}

// ---------------------------------------------------------------------------
// CrimeKind
// ---------------------------------------------------------------------------

/// Every crime type known to the catalog, in ordinal order.
///
/// Serialized by its stable upper-case identifier, never by ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrimeKind {
    /// Stealing something small.
    PettyTheft,
    /// Stealing from a shop.
    Shoplifting,
    /// Entering private property.
    Trespassing,
    /// Damaging property.
    Vandalism,
    /// Consuming illegal substances.
    DrugUse,
    /// Threatening someone.
    Threat,
    /// Deceiving someone for gain.
    Fraud,
    /// Offering money to an official.
    Bribery,
    /// Breaking in to steal.
    Burglary,
    /// Selling small quantities of drugs.
    DrugDealingSmall,
    /// Attacking someone.
    Assault,
    /// Running from the police.
    EvadingPolice,
    /// Stealing with force or threat of force.
    Robbery,
    /// Attacking someone with intent to cause serious harm.
    AggravatedAssault,
    /// Selling large quantities of drugs.
    DrugDealingLarge,
    /// Violence with a weapon.
    ArmedViolence,
}

impl CrimeKind {
    /// All crime kinds in ordinal order.
    pub const ALL: [Self; 16] = [
        Self::PettyTheft,
        Self::Shoplifting,
        Self::Trespassing,
        Self::Vandalism,
        Self::DrugUse,
        Self::Threat,
        Self::Fraud,
        Self::Bribery,
        Self::Burglary,
        Self::DrugDealingSmall,
        Self::Assault,
        Self::EvadingPolice,
        Self::Robbery,
        Self::AggravatedAssault,
        Self::DrugDealingLarge,
        Self::ArmedViolence,
    ];

    /// The catalog entry for this kind.
    pub const fn definition(self) -> CrimeTypeDefinition {
        use RumorKind as R;

        let (id, display_name, severity, base_bounty, wanted_stars, fine, prison_days, rumor) =
            match self {
                Self::PettyTheft => ("PETTY_THEFT", "Petty theft", 2, 50, 1, 500, 1, R::Theft),
                Self::Shoplifting => ("SHOPLIFTING", "Shoplifting", 2, 80, 1, 400, 1, R::Theft),
                Self::Trespassing => ("TRESPASSING", "Trespassing", 1, 30, 1, 300, 1, R::Disorder),
                Self::Vandalism => ("VANDALISM", "Vandalism", 3, 120, 1, 800, 1, R::Disorder),
                Self::DrugUse => ("DRUG_USE", "Drug use", 2, 60, 1, 500, 1, R::Drugs),
                Self::Threat => ("THREAT", "Threat", 3, 150, 1, 1000, 1, R::Violence),
                Self::Fraud => ("FRAUD", "Fraud", 4, 300, 2, 1500, 2, R::Fraud),
                Self::Bribery => ("BRIBERY", "Bribery", 4, 250, 2, 2000, 2, R::Corruption),
                Self::Burglary => ("BURGLARY", "Burglary", 5, 400, 2, 2500, 3, R::Theft),
                Self::DrugDealingSmall => (
                    "DRUG_DEALING_SMALL",
                    "Small-scale drug dealing",
                    5,
                    350,
                    2,
                    3000,
                    3,
                    R::Drugs,
                ),
                Self::Assault => ("ASSAULT", "Assault", 6, 500, 2, 2000, 3, R::Violence),
                Self::EvadingPolice => {
                    ("EVADING_POLICE", "Evading police", 6, 450, 3, 3000, 3, R::Disorder)
                }
                Self::Robbery => ("ROBBERY", "Robbery", 7, 800, 3, 5000, 5, R::Theft),
                Self::AggravatedAssault => (
                    "AGGRAVATED_ASSAULT",
                    "Aggravated assault",
                    8,
                    1200,
                    4,
                    8000,
                    7,
                    R::Violence,
                ),
                Self::DrugDealingLarge => (
                    "DRUG_DEALING_LARGE",
                    "Large-scale drug dealing",
                    8,
                    1500,
                    3,
                    10000,
                    7,
                    R::Drugs,
                ),
                Self::ArmedViolence => {
                    ("ARMED_VIOLENCE", "Armed violence", 9, 2000, 5, 15000, 10, R::Violence)
                }
            };

        CrimeTypeDefinition {
            kind: self,
            id,
            display_name,
            severity,
            base_bounty,
            wanted_stars,
            fine,
            prison_days,
            rumor,
        }
    }

    /// Stable identifier, e.g. `"PETTY_THEFT"`.
    pub const fn id(self) -> &'static str {
        self.definition().id
    }

    /// Severity on the 1--10 scale.
    pub const fn severity(self) -> u8 {
        self.definition().severity
    }

    /// Base bounty placed on an offender when a report escalates.
    pub const fn base_bounty(self) -> u64 {
        self.definition().base_bounty
    }

    /// Crimes of physical violence or the threat of it.
    pub const fn is_violent(self) -> bool {
        matches!(
            self,
            Self::Threat
                | Self::Assault
                | Self::Robbery
                | Self::AggravatedAssault
                | Self::ArmedViolence
        )
    }

    /// Crimes against somebody's property.
    pub const fn is_property_crime(self) -> bool {
        matches!(
            self,
            Self::PettyTheft
                | Self::Shoplifting
                | Self::Vandalism
                | Self::Burglary
                | Self::Robbery
        )
    }

    /// Drug related crimes.
    pub const fn is_drug_crime(self) -> bool {
        matches!(
            self,
            Self::DrugUse | Self::DrugDealingSmall | Self::DrugDealingLarge
        )
    }

    /// Traffic and pursuit offences.
    pub const fn is_traffic_offense(self) -> bool {
        matches!(self, Self::EvadingPolice)
    }

    // -- Classification of raw events --

    /// A theft by the value taken: under 100 is petty, under 500
    /// shoplifting, anything more burglary.
    pub const fn for_theft(value: u64) -> Self {
        if value < 100 {
            Self::PettyTheft
        } else if value < 500 {
            Self::Shoplifting
        } else {
            Self::Burglary
        }
    }

    /// A drug sale by quantity: more than 5 units is large-scale dealing.
    pub const fn for_drug_deal(amount: u32) -> Self {
        if amount > 5 {
            Self::DrugDealingLarge
        } else {
            Self::DrugDealingSmall
        }
    }

    /// An attack by damage dealt. Any armed attack is armed violence.
    pub const fn for_attack(damage: f64, armed: bool) -> Self {
        if armed {
            Self::ArmedViolence
        } else if damage > 5.0 {
            Self::AggravatedAssault
        } else if damage > 2.0 {
            Self::Assault
        } else {
            Self::Threat
        }
    }

    /// Killing someone.
    pub const fn for_killing() -> Self {
        Self::ArmedViolence
    }
}

// ---------------------------------------------------------------------------
// CrimeTypeDefinition
// ---------------------------------------------------------------------------

/// One immutable catalog entry.
///
/// Invariants: `severity` is in `1..=10`, `wanted_stars` is in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CrimeTypeDefinition {
    /// The kind this entry describes.
    pub kind: CrimeKind,
    /// Stable identifier used for persistence and lookups.
    pub id: &'static str,
    /// Human-readable name.
    pub display_name: &'static str,
    /// 1 (minor) to 10 (extreme).
    pub severity: u8,
    /// Bounty in currency units.
    pub base_bounty: u64,
    /// 1 to 5 wanted stars.
    pub wanted_stars: u8,
    /// Fine in currency units.
    pub fine: u64,
    /// Nominal prison days.
    pub prison_days: u32,
    /// Rumor category emitted when the crime is witnessed.
    pub rumor: RumorKind,
}

impl CrimeTypeDefinition {
    /// Base probability that a witness reports this crime:
    /// `min(0.95, 0.2 + severity * 0.08)`.
    pub fn report_chance(&self) -> f64 {
        (0.2 + f64::from(self.severity) * 0.08).min(0.95)
    }

    /// How many game days a witness report stays valid: `severity * 2`.
    pub fn wanted_duration_days(&self) -> u64 {
        u64::from(self.severity).saturating_mul(2)
    }

    /// How much witnessing this crime shakes a bystander's sense of safety.
    pub fn safety_impact(&self) -> f64 {
        f64::from(self.severity) * 5.0
    }

    /// Bounty after repeat-offender and flight multipliers:
    /// `floor(base * (1.5 if repeat) * (1.2 if flight))`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn calculate_bounty(&self, repeat_offender: bool, attempted_flight: bool) -> u64 {
        let mut bounty = self.base_bounty as f64;
        if repeat_offender {
            bounty *= 1.5;
        }
        if attempted_flight {
            bounty *= 1.2;
        }
        bounty.floor() as u64
    }

    /// See [`CrimeKind::is_violent`].
    pub const fn is_violent(&self) -> bool {
        self.kind.is_violent()
    }

    /// See [`CrimeKind::is_property_crime`].
    pub const fn is_property_crime(&self) -> bool {
        self.kind.is_property_crime()
    }

    /// See [`CrimeKind::is_drug_crime`].
    pub const fn is_drug_crime(&self) -> bool {
        self.kind.is_drug_crime()
    }

    /// See [`CrimeKind::is_traffic_offense`].
    pub const fn is_traffic_offense(&self) -> bool {
        self.kind.is_traffic_offense()
    }
}

// ---------------------------------------------------------------------------
// CrimeCatalog
// ---------------------------------------------------------------------------

/// Lookup facade over the static crime table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrimeCatalog;

impl CrimeCatalog {
    /// Fallback for unknown identifiers and ordinals.
    pub const DEFAULT: CrimeKind = CrimeKind::PettyTheft;

    /// Resolve a crime identifier (case-insensitive). Unknown identifiers
    /// resolve to [`Self::DEFAULT`].
    pub fn resolve(id: &str) -> CrimeTypeDefinition {
        Self::resolve_kind(id).definition()
    }

    /// Like [`Self::resolve`] but returns only the kind.
    pub fn resolve_kind(id: &str) -> CrimeKind {
        let id = id.trim();
        CrimeKind::ALL
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(id))
            .unwrap_or(Self::DEFAULT)
    }

    /// Resolve by ordinal position; out-of-range ordinals resolve to
    /// [`Self::DEFAULT`].
    pub fn resolve_by_ordinal_fallback(ordinal: usize) -> CrimeTypeDefinition {
        CrimeKind::ALL
            .get(ordinal)
            .copied()
            .unwrap_or(Self::DEFAULT)
            .definition()
    }

    /// Every definition in ordinal order.
    pub fn all() -> impl Iterator<Item = CrimeTypeDefinition> {
        CrimeKind::ALL.into_iter().map(CrimeKind::definition)
    }
}
