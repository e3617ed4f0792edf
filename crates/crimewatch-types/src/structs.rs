//! Core value structs shared between the justice core and its hosts.
//!
//! Coordinates, search volumes, and the witness profile a spatial query
//! hands back to the witness service. None of these types reference a
//! concrete world or entity model.

use serde::{Deserialize, Serialize};

use crate::enums::AgentRole;
use crate::ids::SubjectId;

// ---------------------------------------------------------------------------
// BlockPos
// ---------------------------------------------------------------------------

/// An integer world coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    /// East-west axis.
    pub x: i32,
    /// Vertical axis.
    pub y: i32,
    /// North-south axis.
    pub z: i32,
}

impl BlockPos {
    /// Build a coordinate from its three components.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Return this position shifted by the given deltas (saturating at the
    /// `i32` bounds).
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// Squared euclidean distance to `other`, saturating at `i64::MAX`.
    pub const fn distance_squared(self, other: Self) -> i64 {
        let dx = (self.x as i64).saturating_sub(other.x as i64);
        let dy = (self.y as i64).saturating_sub(other.y as i64);
        let dz = (self.z as i64).saturating_sub(other.z as i64);
        dx.saturating_mul(dx)
            .saturating_add(dy.saturating_mul(dy))
            .saturating_add(dz.saturating_mul(dz))
    }

    /// Whether `other` lies within `radius` blocks of this position.
    pub fn within(self, other: Self, radius: f64) -> bool {
        (self.distance_squared(other) as f64) <= radius * radius
    }

    /// Centre of the block as floating point coordinates.
    pub fn center(self) -> (f64, f64, f64) {
        (
            f64::from(self.x) + 0.5,
            f64::from(self.y) + 0.5,
            f64::from(self.z) + 0.5,
        )
    }
}

// ---------------------------------------------------------------------------
// SearchVolume
// ---------------------------------------------------------------------------

/// An axis-aligned box used for "is anyone of this role nearby" queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchVolume {
    /// Minimum corner (inclusive).
    pub min: (f64, f64, f64),
    /// Maximum corner (inclusive).
    pub max: (f64, f64, f64),
}

impl SearchVolume {
    /// A box of the given full extents centred on the middle of `pos`.
    pub fn centered_on(pos: BlockPos, width: f64, height: f64, depth: f64) -> Self {
        let (cx, cy, cz) = pos.center();
        let (hw, hh, hd) = (width / 2.0, height / 2.0, depth / 2.0);
        Self {
            min: (cx - hw, cy - hh, cz - hd),
            max: (cx + hw, cy + hh, cz + hd),
        }
    }

    /// Whether the centre of `pos` falls inside this volume.
    pub fn contains(&self, pos: BlockPos) -> bool {
        let (x, y, z) = pos.center();
        x >= self.min.0
            && x <= self.max.0
            && y >= self.min.1
            && y <= self.max.1
            && z >= self.min.2
            && z <= self.max.2
    }
}

// ---------------------------------------------------------------------------
// WitnessTraits
// ---------------------------------------------------------------------------

/// Lower bound of every personality trait.
pub const TRAIT_MIN: i32 = -100;

/// Upper bound of every personality trait.
pub const TRAIT_MAX: i32 = 100;

/// The slice of a witness's personality the justice core cares about.
///
/// Both traits live on a `-100..=100` scale; constructors clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WitnessTraits {
    /// Truthfulness. Highly honest witnesses cannot be bribed at all.
    pub honesty: i32,
    /// Appetite for money. Greedy witnesses ask for larger bribes.
    pub greed: i32,
}

impl WitnessTraits {
    /// Build a trait profile, clamping both values into `-100..=100`.
    pub const fn new(honesty: i32, greed: i32) -> Self {
        Self {
            honesty: clamp_trait(honesty),
            greed: clamp_trait(greed),
        }
    }
}

const fn clamp_trait(value: i32) -> i32 {
    if value < TRAIT_MIN {
        TRAIT_MIN
    } else if value > TRAIT_MAX {
        TRAIT_MAX
    } else {
        value
    }
}

// ---------------------------------------------------------------------------
// CandidateWitness
// ---------------------------------------------------------------------------

/// A person returned by a spatial query as a potential crime witness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateWitness {
    /// Who this is.
    pub id: SubjectId,
    /// Personality traits driving credibility and bribery.
    pub traits: WitnessTraits,
    /// Sleeping candidates see nothing.
    pub is_awake: bool,
    /// Whether the candidate's reactive subsystem is running.
    pub reactive_system_active: bool,
    /// Civilian or enforcement.
    pub role: AgentRole,
}

impl CandidateWitness {
    /// Whether this candidate is able to observe a crime right now.
    pub const fn can_witness(&self) -> bool {
        self.is_awake && self.reactive_system_active
    }

    /// Whether this candidate belongs to law enforcement.
    pub const fn is_enforcement(&self) -> bool {
        matches!(self.role, AgentRole::Enforcement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traits_are_clamped() {
        let traits = WitnessTraits::new(250, -300);
        assert_eq!(traits.honesty, 100);
        assert_eq!(traits.greed, -100);
    }

    #[test]
    fn within_radius_uses_euclidean_distance() {
        let origin = BlockPos::new(0, 64, 0);
        assert!(origin.within(BlockPos::new(12, 64, 16), 20.0));
        assert!(!origin.within(BlockPos::new(15, 64, 15), 20.0));
    }

    #[test]
    fn distance_does_not_overflow_at_extremes() {
        let a = BlockPos::new(i32::MIN, i32::MIN, i32::MIN);
        let b = BlockPos::new(i32::MAX, i32::MAX, i32::MAX);
        assert_eq!(a.distance_squared(b), i64::MAX);
    }

    #[test]
    fn search_volume_is_centered() {
        let volume = SearchVolume::centered_on(BlockPos::new(0, 0, 0), 100.0, 50.0, 100.0);
        assert!(volume.contains(BlockPos::new(49, 24, -50)));
        assert!(!volume.contains(BlockPos::new(0, 30, 0)));
        assert!(!volume.contains(BlockPos::new(51, 0, 0)));
    }

    #[test]
    fn sleeping_candidate_cannot_witness() {
        let candidate = CandidateWitness {
            id: SubjectId::new(),
            traits: WitnessTraits::default(),
            is_awake: false,
            reactive_system_active: true,
            role: AgentRole::Civilian,
        };
        assert!(!candidate.can_witness());
        assert!(!candidate.is_enforcement());
    }
}
