//! The wanted registry: who is wanted and for how much.
//!
//! A subject is wanted exactly when it carries a positive bounty. The two
//! facts share one map entry, so reducing a bounty to zero clears the
//! wanted flag in the same step.

use std::collections::BTreeMap;

use crimewatch_types::SubjectId;
use tracing::{debug, info};

use crate::catalog::CrimeKind;

/// Accumulated bounties keyed by subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WantedRegistry {
    bounties: BTreeMap<SubjectId, u64>,
}

impl WantedRegistry {
    /// An empty registry.
    pub const fn new() -> Self {
        Self {
            bounties: BTreeMap::new(),
        }
    }

    /// Mark `subject` wanted for `kind`, adding the crime's base bounty.
    /// Returns the new total.
    pub fn escalate(&mut self, subject: SubjectId, kind: CrimeKind) -> u64 {
        let total = self.add_bounty(subject, kind.base_bounty());
        info!(
            subject = %subject,
            crime = kind.id(),
            bounty = total,
            "Subject escalated into wanted registry"
        );
        total
    }

    /// Add `amount` to the subject's bounty (saturating). A zero amount on
    /// an unknown subject changes nothing. Returns the new total.
    pub fn add_bounty(&mut self, subject: SubjectId, amount: u64) -> u64 {
        if amount == 0 {
            return self.bounty(subject);
        }
        let entry = self.bounties.entry(subject).or_insert(0);
        *entry = entry.saturating_add(amount);
        *entry
    }

    /// Reduce the subject's bounty, e.g. after a payment. Reaching zero
    /// removes the subject from the registry. Returns what is left.
    pub fn reduce_bounty(&mut self, subject: SubjectId, amount: u64) -> u64 {
        let Some(bounty) = self.bounties.get_mut(&subject) else {
            return 0;
        };
        *bounty = bounty.saturating_sub(amount);
        let remaining = *bounty;
        if remaining == 0 {
            self.bounties.remove(&subject);
            debug!(subject = %subject, "Bounty paid off, subject no longer wanted");
        }
        remaining
    }

    /// Remove the subject from the registry, returning the dropped bounty.
    pub fn clear(&mut self, subject: SubjectId) -> Option<u64> {
        self.bounties.remove(&subject)
    }

    /// Whether the subject is wanted.
    pub fn is_wanted(&self, subject: SubjectId) -> bool {
        self.bounties.contains_key(&subject)
    }

    /// Current bounty, 0 if not wanted.
    pub fn bounty(&self, subject: SubjectId) -> u64 {
        self.bounties.get(&subject).copied().unwrap_or(0)
    }

    /// Every wanted subject in id order.
    pub fn wanted_subjects(&self) -> impl Iterator<Item = SubjectId> + '_ {
        self.bounties.keys().copied()
    }

    /// `(subject, bounty)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (SubjectId, u64)> + '_ {
        self.bounties.iter().map(|(subject, bounty)| (*subject, *bounty))
    }

    /// Number of wanted subjects.
    pub fn len(&self) -> usize {
        self.bounties.len()
    }

    /// Whether nobody is wanted.
    pub fn is_empty(&self) -> bool {
        self.bounties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalation_accumulates_base_bounty() {
        let mut registry = WantedRegistry::new();
        let subject = SubjectId::new();
        assert_eq!(registry.escalate(subject, CrimeKind::Robbery), 800);
        assert_eq!(registry.escalate(subject, CrimeKind::PettyTheft), 850);
        assert!(registry.is_wanted(subject));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn reducing_to_zero_clears_wanted_flag() {
        let mut registry = WantedRegistry::new();
        let subject = SubjectId::new();
        registry.escalate(subject, CrimeKind::Burglary);
        assert_eq!(registry.reduce_bounty(subject, 150), 250);
        assert!(registry.is_wanted(subject));
        assert_eq!(registry.reduce_bounty(subject, 10_000), 0);
        assert!(!registry.is_wanted(subject));
        assert_eq!(registry.bounty(subject), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn zero_bounty_never_creates_entry() {
        let mut registry = WantedRegistry::new();
        let subject = SubjectId::new();
        assert_eq!(registry.add_bounty(subject, 0), 0);
        assert!(!registry.is_wanted(subject));
    }

    #[test]
    fn reduce_unknown_subject_is_noop() {
        let mut registry = WantedRegistry::new();
        assert_eq!(registry.reduce_bounty(SubjectId::new(), 10), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn clear_returns_dropped_bounty() {
        let mut registry = WantedRegistry::new();
        let subject = SubjectId::new();
        registry.escalate(subject, CrimeKind::Fraud);
        assert_eq!(registry.clear(subject), Some(300));
        assert_eq!(registry.clear(subject), None);
        assert_eq!(registry.wanted_subjects().count(), 0);
    }
}
