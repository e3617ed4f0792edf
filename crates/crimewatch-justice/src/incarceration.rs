//! Imprisonment: cells, sentences, bail and release.
//!
//! Each subject is either free or holds exactly one [`PrisonerRecord`].
//! Leaving prison always goes through [`IncarcerationManager::release_player`]
//! with one of three [`ReleaseReason`]s.
//!
//! # Sentence clock
//!
//! While the prisoner is online the record holds an absolute release tick.
//! On logout that is converted into the remaining duration, and back again
//! on login, so offline time never counts toward the sentence.
//!
//! # Bail
//!
//! Bail opens once strictly more than `bail_threshold_percent` of the
//! sentence has been served:
//!
//! ```text
//! eligible  <=>  served * 100 > sentence * threshold
//! ```
//!
//! With the default tuning a level-3 sentence is 3600 ticks; bail is closed
//! after 1188 served ticks and open after 1200.

use std::collections::{BTreeMap, BTreeSet};

use crimewatch_types::{BlockPos, FacilityId, SubjectId};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::collab::PrisonWorld;
use crate::config::{PrisonConfig, TimeConfig};
use crate::error::{IncarcerationError, StoreError};
use crate::store::{StructuredStore, load_document};

/// Seconds per minute, for debt sentences given in minutes.
const SECONDS_PER_MINUTE: u64 = 60;

/// Number of the designated overflow cell.
pub const OVERFLOW_CELL: u32 = 1;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Why a prisoner left prison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseReason {
    /// The sentence elapsed.
    TimeServed,
    /// Bail was paid.
    BailPaid,
    /// An administrator let them out.
    AdminRelease,
}

/// Remaining sentence, in the representation matching the prisoner's
/// presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SentenceClock {
    /// Present: released at an absolute tick.
    Online {
        /// Tick at which the sentence ends.
        release_tick: u64,
    },
    /// Absent: the clock is frozen.
    Offline {
        /// Ticks still to serve.
        remaining_ticks: u64,
    },
}

/// One imprisoned subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrisonerRecord {
    /// Who is imprisoned.
    pub subject: SubjectId,
    /// Name shown to operators.
    pub display_name: String,
    /// Assigned cell number.
    pub cell: u32,
    /// Where the cell is.
    pub cell_position: BlockPos,
    /// Wanted level at intake.
    pub intake_wanted_level: u32,
    /// Full sentence length in ticks.
    pub sentence_ticks: u64,
    /// Remaining time.
    pub clock: SentenceClock,
    /// Bail amount; `None` when no bail is offered.
    pub bail: Option<u64>,
    /// Set once bail has been paid.
    #[serde(default)]
    pub bail_paid: bool,
}

impl PrisonerRecord {
    /// Whether the prisoner's sentence clock is running.
    pub const fn is_online(&self) -> bool {
        matches!(self.clock, SentenceClock::Online { .. })
    }

    /// Ticks left to serve at `current_tick`.
    pub const fn remaining_ticks(&self, current_tick: u64) -> u64 {
        match self.clock {
            SentenceClock::Online { release_tick } => release_tick.saturating_sub(current_tick),
            SentenceClock::Offline { remaining_ticks } => remaining_ticks,
        }
    }

    /// Ticks served at `current_tick`.
    pub const fn served_ticks(&self, current_tick: u64) -> u64 {
        self.sentence_ticks
            .saturating_sub(self.remaining_ticks(current_tick))
    }

    /// Whether the sentence has fully elapsed for an online prisoner.
    pub const fn is_due(&self, current_tick: u64) -> bool {
        match self.clock {
            SentenceClock::Online { release_tick } => current_tick >= release_tick,
            SentenceClock::Offline { .. } => false,
        }
    }

    /// Freeze the clock at `current_tick`.
    const fn go_offline(&mut self, current_tick: u64) {
        self.clock = SentenceClock::Offline {
            remaining_ticks: self.remaining_ticks(current_tick),
        };
    }

    /// Resume the clock at `current_tick`.
    const fn go_online(&mut self, current_tick: u64) {
        self.clock = SentenceClock::Online {
            release_tick: current_tick.saturating_add(self.remaining_ticks(current_tick)),
        };
    }
}

// ---------------------------------------------------------------------------
// Facility
// ---------------------------------------------------------------------------

/// A placement slot in the facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// 1-based cell number.
    pub number: u32,
    /// Where occupants are placed.
    pub position: BlockPos,
    /// Facility this cell belongs to.
    pub facility: FacilityId,
    occupants: BTreeSet<SubjectId>,
}

impl Cell {
    /// Whether nobody occupies the cell.
    pub fn is_free(&self) -> bool {
        self.occupants.is_empty()
    }

    /// Current occupants.
    pub fn occupants(&self) -> impl Iterator<Item = SubjectId> + '_ {
        self.occupants.iter().copied()
    }
}

/// The active prison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facility {
    /// Facility identity.
    pub id: FacilityId,
    /// Entrance, also where released prisoners are placed.
    pub location: BlockPos,
    cells: Vec<Cell>,
}

impl Facility {
    fn new(id: FacilityId, location: BlockPos, cell_count: u32, spacing: i32) -> Self {
        let cells = (1..=cell_count.max(1))
            .map(|number| Cell {
                number,
                position: location.offset(
                    i32::try_from(number).unwrap_or(i32::MAX).saturating_mul(spacing),
                    0,
                    0,
                ),
                facility: id,
                occupants: BTreeSet::new(),
            })
            .collect();
        Self {
            id,
            location,
            cells,
        }
    }

    /// Cells ordered by number.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of regular cells (the soft capacity).
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    fn cell_mut(&mut self, number: u32) -> Option<&mut Cell> {
        self.cells.iter_mut().find(|cell| cell.number == number)
    }

    /// First free cell by number, else the overflow cell.
    fn available_cell(&self) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|cell| cell.is_free())
            .or_else(|| self.cells.iter().find(|cell| cell.number == OVERFLOW_CELL))
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Owns the facility and every prisoner record.
#[derive(Debug, Clone)]
pub struct IncarcerationManager {
    config: PrisonConfig,
    ticks_per_second: u64,
    facility: Option<Facility>,
    prisoners: BTreeMap<SubjectId, PrisonerRecord>,
}

impl IncarcerationManager {
    /// A manager without a facility.
    pub const fn new(config: PrisonConfig, time: &TimeConfig) -> Self {
        Self {
            config,
            ticks_per_second: time.ticks_per_second,
            facility: None,
            prisoners: BTreeMap::new(),
        }
    }

    /// Active configuration.
    pub const fn config(&self) -> &PrisonConfig {
        &self.config
    }

    /// Sentence length for a wanted level.
    pub fn sentence_ticks(&self, wanted_level: u32) -> u64 {
        u64::from(wanted_level)
            .saturating_mul(self.config.jail_seconds_per_wanted_level)
            .saturating_mul(self.ticks_per_second)
    }

    /// Bail amount for a wanted level.
    pub fn bail_amount(&self, wanted_level: u32) -> u64 {
        u64::from(wanted_level).saturating_mul(self.config.bail_per_wanted_level)
    }

    // -----------------------------------------------------------------------
    // Facility
    // -----------------------------------------------------------------------

    /// (Re)define the active facility with `cell_count` cells (at least
    /// one). Cells sit `cell_spacing` blocks apart along x from `location`.
    /// Existing prisoners keep their cell number when it still exists and
    /// move to the overflow cell otherwise.
    pub fn configure_prison(&mut self, location: BlockPos, cell_count: u32) -> FacilityId {
        let id = FacilityId::new();
        self.install_facility(Facility::new(id, location, cell_count, self.config.cell_spacing));
        info!(
            facility = %id,
            x = location.x,
            y = location.y,
            z = location.z,
            cells = cell_count.max(1),
            "Prison configured"
        );
        id
    }

    fn install_facility(&mut self, mut facility: Facility) {
        for record in self.prisoners.values_mut() {
            if facility.cell_mut(record.cell).is_none() {
                record.cell = OVERFLOW_CELL;
            }
            if let Some(cell) = facility.cell_mut(record.cell) {
                cell.occupants.insert(record.subject);
                record.cell_position = cell.position;
            }
        }
        self.facility = Some(facility);
    }

    /// The active facility, if configured.
    pub const fn facility(&self) -> Option<&Facility> {
        self.facility.as_ref()
    }

    /// Cells of the active facility; empty when none is configured.
    pub fn cells(&self) -> &[Cell] {
        self.facility.as_ref().map(Facility::cells).unwrap_or_default()
    }

    /// First free cell, else the overflow cell. `None` only when no
    /// facility is configured.
    pub fn find_available_cell(&self) -> Option<&Cell> {
        self.facility.as_ref()?.available_cell()
    }

    // -----------------------------------------------------------------------
    // Intake
    // -----------------------------------------------------------------------

    /// Imprison `subject` for `wanted_level` with bail.
    ///
    /// # Errors
    ///
    /// [`IncarcerationError::AlreadyImprisoned`] or
    /// [`IncarcerationError::NoFacility`]; nothing changes in either case.
    pub fn imprison_player<W>(
        &mut self,
        world: &mut W,
        subject: SubjectId,
        display_name: impl Into<String>,
        wanted_level: u32,
        current_tick: u64,
    ) -> Result<&PrisonerRecord, IncarcerationError>
    where
        W: PrisonWorld + ?Sized,
    {
        let sentence = self.sentence_ticks(wanted_level);
        let bail = Some(self.bail_amount(wanted_level));
        self.intake(world, subject, display_name.into(), wanted_level, sentence, bail, current_tick)
    }

    /// Imprison `subject` for unpaid debt: `minutes` of game time, no bail,
    /// intake wanted level 0.
    ///
    /// # Errors
    ///
    /// Same as [`Self::imprison_player`].
    pub fn imprison_for_debt<W>(
        &mut self,
        world: &mut W,
        subject: SubjectId,
        display_name: impl Into<String>,
        minutes: u64,
        current_tick: u64,
    ) -> Result<&PrisonerRecord, IncarcerationError>
    where
        W: PrisonWorld + ?Sized,
    {
        let sentence = minutes
            .saturating_mul(SECONDS_PER_MINUTE)
            .saturating_mul(self.ticks_per_second);
        self.intake(world, subject, display_name.into(), 0, sentence, None, current_tick)
    }

    #[allow(clippy::too_many_arguments)]
    fn intake<W>(
        &mut self,
        world: &mut W,
        subject: SubjectId,
        display_name: String,
        wanted_level: u32,
        sentence_ticks: u64,
        bail: Option<u64>,
        current_tick: u64,
    ) -> Result<&PrisonerRecord, IncarcerationError>
    where
        W: PrisonWorld + ?Sized,
    {
        if self.prisoners.contains_key(&subject) {
            return Err(IncarcerationError::AlreadyImprisoned(subject));
        }
        let Some(facility) = self.facility.as_mut() else {
            warn!(subject = %subject, "Cannot imprison without a configured prison");
            return Err(IncarcerationError::NoFacility);
        };
        let Some(number) = facility.available_cell().map(|cell| cell.number) else {
            return Err(IncarcerationError::NoFacility);
        };
        let Some(cell) = facility.cell_mut(number) else {
            return Err(IncarcerationError::NoFacility);
        };
        if !cell.is_free() {
            warn!(subject = %subject, cell = number, "All cells occupied, using overflow cell");
        }
        cell.occupants.insert(subject);
        let position = cell.position;

        world.place(subject, position);
        info!(
            subject = %subject,
            name = %display_name,
            wanted_level,
            sentence_ticks,
            bail = ?bail,
            cell = number,
            "Subject imprisoned"
        );

        let record = PrisonerRecord {
            subject,
            display_name,
            cell: number,
            cell_position: position,
            intake_wanted_level: wanted_level,
            sentence_ticks,
            clock: SentenceClock::Online {
                release_tick: current_tick.saturating_add(sentence_ticks),
            },
            bail,
            bail_paid: false,
        };
        Ok(self.prisoners.entry(subject).or_insert(record))
    }

    // -----------------------------------------------------------------------
    // Bail
    // -----------------------------------------------------------------------

    /// Served ticks that must be exceeded before bail opens.
    pub const fn bail_threshold_ticks(&self, sentence_ticks: u64) -> u64 {
        sentence_ticks.saturating_mul(self.config.bail_threshold_percent) / 100
    }

    /// Whether `subject` could post bail at `current_tick`. Only turns from
    /// `false` to `true` as a sentence is served.
    pub fn is_bail_available(&self, subject: SubjectId, current_tick: u64) -> bool {
        self.prisoners.get(&subject).is_some_and(|record| {
            record.bail.is_some()
                && record.served_ticks(current_tick) > self.bail_threshold_ticks(record.sentence_ticks)
        })
    }

    /// First tick at which bail opens, for an online prisoner with bail.
    pub fn bail_available_at(&self, subject: SubjectId) -> Option<u64> {
        let record = self.prisoners.get(&subject)?;
        record.bail?;
        let SentenceClock::Online { release_tick } = record.clock else {
            return None;
        };
        let intake = release_tick.saturating_sub(record.sentence_ticks);
        Some(
            intake
                .saturating_add(self.bail_threshold_ticks(record.sentence_ticks))
                .saturating_add(1),
        )
    }

    /// Pay bail and walk out.
    ///
    /// # Errors
    ///
    /// [`IncarcerationError::NotImprisoned`], [`IncarcerationError::BailNotOffered`],
    /// [`IncarcerationError::BailNotAvailable`],
    /// [`IncarcerationError::InsufficientFunds`] or
    /// [`IncarcerationError::Ledger`]. Nothing changes on error.
    pub fn pay_bail<W>(
        &mut self,
        world: &mut W,
        subject: SubjectId,
        current_tick: u64,
    ) -> Result<PrisonerRecord, IncarcerationError>
    where
        W: PrisonWorld + ?Sized,
    {
        let record = self
            .prisoners
            .get(&subject)
            .ok_or(IncarcerationError::NotImprisoned(subject))?;
        let bail = record.bail.ok_or(IncarcerationError::BailNotOffered(subject))?;
        let served = record.served_ticks(current_tick);
        let required = self.bail_threshold_ticks(record.sentence_ticks);
        if served <= required {
            return Err(IncarcerationError::BailNotAvailable {
                subject,
                served,
                required,
            });
        }
        let available = world.balance_of(subject);
        if available < bail {
            return Err(IncarcerationError::InsufficientFunds {
                required: bail,
                available,
            });
        }
        world.withdraw(subject, bail)?;

        if let Some(record) = self.prisoners.get_mut(&subject) {
            record.bail_paid = true;
        }
        self.release_player(world, subject, ReleaseReason::BailPaid)
    }

    // -----------------------------------------------------------------------
    // Release
    // -----------------------------------------------------------------------

    /// Release `subject` and return their final record.
    ///
    /// Time served and administrative release clear the host wanted level;
    /// bail lowers it by `bail_wanted_reduction` from the intake level,
    /// never below zero. The subject is placed at the facility entrance.
    ///
    /// # Errors
    ///
    /// [`IncarcerationError::NotImprisoned`] if `subject` is free.
    pub fn release_player<W>(
        &mut self,
        world: &mut W,
        subject: SubjectId,
        reason: ReleaseReason,
    ) -> Result<PrisonerRecord, IncarcerationError>
    where
        W: PrisonWorld + ?Sized,
    {
        let record = self
            .prisoners
            .remove(&subject)
            .ok_or(IncarcerationError::NotImprisoned(subject))?;

        match reason {
            ReleaseReason::TimeServed | ReleaseReason::AdminRelease => {
                world.clear_wanted_level(subject);
            }
            ReleaseReason::BailPaid => {
                let level = record
                    .intake_wanted_level
                    .saturating_sub(self.config.bail_wanted_reduction);
                world.set_wanted_level(subject, level);
            }
        }

        match self.facility.as_mut() {
            Some(facility) => {
                if let Some(cell) = facility.cell_mut(record.cell) {
                    cell.occupants.remove(&subject);
                }
                world.place(subject, facility.location);
            }
            None => warn!(subject = %subject, "Released without a facility exit"),
        }

        info!(subject = %subject, reason = ?reason, cell = record.cell, "Subject released");
        Ok(record)
    }

    /// Release every online prisoner whose sentence has elapsed. Offline
    /// prisoners are skipped. Returns who was released.
    pub fn on_server_tick<W>(&mut self, world: &mut W, current_tick: u64) -> Vec<SubjectId>
    where
        W: PrisonWorld + ?Sized,
    {
        let due: Vec<SubjectId> = self
            .prisoners
            .values()
            .filter(|record| record.is_due(current_tick))
            .map(|record| record.subject)
            .collect();
        due.into_iter()
            .filter(|subject| {
                self.release_player(world, *subject, ReleaseReason::TimeServed)
                    .is_ok()
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Freeze `subject`'s sentence. Returns `false` if they are free.
    pub fn on_player_logout(&mut self, subject: SubjectId, tick_at_logout: u64) -> bool {
        let Some(record) = self.prisoners.get_mut(&subject) else {
            return false;
        };
        record.go_offline(tick_at_logout);
        debug!(
            subject = %subject,
            remaining = record.remaining_ticks(tick_at_logout),
            "Prisoner logged out, sentence frozen"
        );
        true
    }

    /// Resume `subject`'s sentence and put them back in their cell.
    /// Returns `false` if they are free.
    pub fn on_player_login<W>(&mut self, world: &mut W, subject: SubjectId, current_tick: u64) -> bool
    where
        W: PrisonWorld + ?Sized,
    {
        let Some(record) = self.prisoners.get_mut(&subject) else {
            return false;
        };
        record.go_online(current_tick);
        world.place(subject, record.cell_position);
        debug!(
            subject = %subject,
            remaining = record.remaining_ticks(current_tick),
            "Prisoner logged in, sentence resumed"
        );
        true
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Whether `subject` is imprisoned.
    pub fn is_prisoner(&self, subject: SubjectId) -> bool {
        self.prisoners.contains_key(&subject)
    }

    /// The subject's record, if imprisoned.
    pub fn get_prisoner_data(&self, subject: SubjectId) -> Option<&PrisonerRecord> {
        self.prisoners.get(&subject)
    }

    /// Every current prisoner, in id order.
    pub fn get_all_prisoners(&self) -> impl Iterator<Item = &PrisonerRecord> + '_ {
        self.prisoners.values()
    }

    /// Number of prisoners.
    pub fn get_prisoner_count(&self) -> usize {
        self.prisoners.len()
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Serialisable copy of the facility and all prisoners. Running clocks
    /// are frozen at `current_tick`.
    pub fn snapshot(&self, current_tick: u64) -> PrisonSnapshot {
        PrisonSnapshot {
            facility: self.facility.as_ref().map(|facility| FacilitySnapshot {
                id: facility.id,
                location: facility.location,
                cell_count: u32::try_from(facility.capacity()).unwrap_or(u32::MAX),
            }),
            prisoners: self
                .prisoners
                .values()
                .map(|record| {
                    let mut frozen = record.clone();
                    frozen.go_offline(current_tick);
                    frozen
                })
                .collect(),
        }
    }

    /// Replace all state with `snapshot`. Every restored prisoner starts
    /// offline. Returns the number of corrections made.
    pub fn restore(&mut self, snapshot: PrisonSnapshot) -> usize {
        let mut corrections = 0_usize;
        let mut prisoners = BTreeMap::new();
        for mut record in snapshot.prisoners {
            if prisoners.contains_key(&record.subject) {
                warn!(subject = %record.subject, "Dropping duplicate prisoner record");
                corrections = corrections.saturating_add(1);
                continue;
            }
            let remaining = match record.clock {
                SentenceClock::Offline { remaining_ticks } => remaining_ticks,
                SentenceClock::Online { .. } => {
                    corrections = corrections.saturating_add(1);
                    record.sentence_ticks
                }
            };
            if remaining > record.sentence_ticks {
                corrections = corrections.saturating_add(1);
            }
            record.clock = SentenceClock::Offline {
                remaining_ticks: remaining.min(record.sentence_ticks),
            };
            prisoners.insert(record.subject, record);
        }

        self.prisoners = prisoners;
        self.facility = None;
        if let Some(saved) = snapshot.facility {
            self.install_facility(Facility::new(
                saved.id,
                saved.location,
                saved.cell_count,
                self.config.cell_spacing,
            ));
        }
        if corrections > 0 {
            warn!(corrections, "Corrected saved prison state");
        }
        corrections
    }

    /// Save the current state, freezing clocks at `current_tick`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if encoding or the store write fails; memory
    /// is left untouched.
    pub fn save_to<S>(&self, store: &mut S, current_tick: u64) -> Result<(), StoreError>
    where
        S: StructuredStore + ?Sized,
    {
        let document = serde_json::to_value(self.snapshot(current_tick))?;
        store.save(&document).inspect_err(|err| {
            error!(error = %err, "Failed to save prison state");
        })
    }

    /// Load state from `store`. Anything unreadable yields empty state.
    /// Returns the number of corrections made while restoring.
    pub fn load_from<S>(&mut self, store: &S) -> usize
    where
        S: StructuredStore + ?Sized,
    {
        let snapshot = load_document(store, "prison").unwrap_or_default();
        let corrections = self.restore(snapshot);
        info!(prisoners = self.prisoners.len(), "Prison state loaded");
        corrections
    }
}

/// Persisted facility layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilitySnapshot {
    /// Facility identity.
    pub id: FacilityId,
    /// Entrance and cell origin.
    pub location: BlockPos,
    /// Number of cells.
    pub cell_count: u32,
}

/// Persisted form of the incarceration manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrisonSnapshot {
    /// The facility, if one was configured.
    #[serde(default)]
    pub facility: Option<FacilitySnapshot>,
    /// Prisoners with frozen clocks.
    #[serde(default)]
    pub prisoners: Vec<PrisonerRecord>,
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use crate::collab::{CrimeLevels, Placement, Treasury};
    use crate::error::LedgerError;

    #[derive(Default)]
    struct Town {
        balances: BTreeMap<SubjectId, u64>,
        levels: BTreeMap<SubjectId, u32>,
        placements: Vec<(SubjectId, BlockPos)>,
    }

    impl CrimeLevels for Town {
        fn clear_wanted_level(&mut self, subject: SubjectId) {
            self.levels.insert(subject, 0);
        }

        fn set_wanted_level(&mut self, subject: SubjectId, level: u32) {
            self.levels.insert(subject, level);
        }

        fn add_wanted_level(&mut self, subject: SubjectId, delta: u32) {
            let level = self.levels.entry(subject).or_insert(0);
            *level = level.saturating_add(delta);
        }
    }

    impl Treasury for Town {
        fn balance_of(&self, subject: SubjectId) -> u64 {
            self.balances.get(&subject).copied().unwrap_or(0)
        }

        fn withdraw(&mut self, subject: SubjectId, amount: u64) -> Result<(), LedgerError> {
            let balance = self.balances.entry(subject).or_insert(0);
            *balance = balance.checked_sub(amount).ok_or_else(|| LedgerError {
                reason: "overdrawn".to_owned(),
            })?;
            Ok(())
        }
    }

    impl Placement for Town {
        fn place(&mut self, subject: SubjectId, position: BlockPos) {
            self.placements.push((subject, position));
        }
    }

    fn manager() -> IncarcerationManager {
        let mut manager = IncarcerationManager::new(PrisonConfig::default(), &TimeConfig::default());
        manager.configure_prison(BlockPos::new(100, 64, 100), 4);
        manager
    }

    // -----------------------------------------------------------------------
    // Intake
    // -----------------------------------------------------------------------

    #[test]
    fn sentence_and_bail_scale_with_level() {
        let manager = manager();
        for level in 1..=5_u32 {
            assert_eq!(manager.sentence_ticks(level), u64::from(level) * 60 * 20);
            assert_eq!(manager.bail_amount(level), u64::from(level) * 1000);
        }
    }

    #[test]
    fn intake_requires_facility() {
        let mut manager = IncarcerationManager::new(PrisonConfig::default(), &TimeConfig::default());
        let mut town = Town::default();
        let result = manager.imprison_player(&mut town, SubjectId::new(), "Vic", 2, 0);
        assert!(matches!(result, Err(IncarcerationError::NoFacility)));
        assert_eq!(manager.get_prisoner_count(), 0);
        assert!(town.placements.is_empty());
    }

    #[test]
    fn double_intake_is_rejected() {
        let mut manager = manager();
        let mut town = Town::default();
        let subject = SubjectId::new();
        assert!(manager.imprison_player(&mut town, subject, "Vic", 2, 0).is_ok());
        let again = manager.imprison_player(&mut town, subject, "Vic", 5, 10);
        assert!(matches!(again, Err(IncarcerationError::AlreadyImprisoned(s)) if s == subject));
        assert_eq!(
            manager.get_prisoner_data(subject).map(|r| r.intake_wanted_level),
            Some(2)
        );
    }

    #[test]
    fn intake_fills_cells_in_order_then_overflows() {
        let mut manager = manager();
        let mut town = Town::default();
        let cells: Vec<u32> = (0..6)
            .filter_map(|_| {
                manager
                    .imprison_player(&mut town, SubjectId::new(), "Inmate", 1, 0)
                    .ok()
                    .map(|record| record.cell)
            })
            .collect();
        assert_eq!(cells, vec![1, 2, 3, 4, 1, 1]);
        assert_eq!(
            manager.cells().first().map(|cell| cell.occupants().count()),
            Some(3)
        );
    }

    #[test]
    fn cell_positions_follow_spacing() {
        let manager = manager();
        let xs: Vec<i32> = manager.cells().iter().map(|cell| cell.position.x).collect();
        assert_eq!(xs, vec![104, 108, 112, 116]);
    }

    // -----------------------------------------------------------------------
    // Bail
    // -----------------------------------------------------------------------

    #[test]
    fn bail_boundary_for_level_three() {
        let mut manager = manager();
        let mut town = Town::default();
        let subject = SubjectId::new();
        town.balances.insert(subject, 5000);
        assert!(manager.imprison_player(&mut town, subject, "Vic", 3, 0).is_ok());

        assert!(!manager.is_bail_available(subject, 1188));
        assert!(manager.is_bail_available(subject, 1200));
        assert_eq!(manager.bail_available_at(subject), Some(1189));

        let early = manager.pay_bail(&mut town, subject, 1188);
        assert!(matches!(early, Err(IncarcerationError::BailNotAvailable { served: 1188, .. })));
        assert_eq!(town.balance_of(subject), 5000);

        let paid = manager.pay_bail(&mut town, subject, 1200);
        assert!(paid.is_ok_and(|record| record.bail_paid));
        assert_eq!(town.balance_of(subject), 2000);
        assert_eq!(town.levels.get(&subject), Some(&1));
        assert!(!manager.is_prisoner(subject));
        assert_eq!(town.placements.last(), Some(&(subject, BlockPos::new(100, 64, 100))));
    }

    #[test]
    fn bail_needs_funds() {
        let mut manager = manager();
        let mut town = Town::default();
        let subject = SubjectId::new();
        town.balances.insert(subject, 999);
        assert!(manager.imprison_player(&mut town, subject, "Vic", 1, 0).is_ok());

        let result = manager.pay_bail(&mut town, subject, 1000);
        assert!(matches!(
            result,
            Err(IncarcerationError::InsufficientFunds { required: 1000, available: 999 })
        ));
        assert!(manager.is_prisoner(subject));
    }

    #[test]
    fn bail_at_level_one_floors_at_zero() {
        let mut manager = manager();
        let mut town = Town::default();
        let subject = SubjectId::new();
        town.balances.insert(subject, 1000);
        assert!(manager.imprison_player(&mut town, subject, "Vic", 1, 0).is_ok());
        assert!(manager.pay_bail(&mut town, subject, 1000).is_ok());
        assert_eq!(town.levels.get(&subject), Some(&0));
    }

    #[test]
    fn debt_sentence_offers_no_bail() {
        let mut manager = manager();
        let mut town = Town::default();
        let subject = SubjectId::new();
        town.balances.insert(subject, 1_000_000);
        let sentence = manager
            .imprison_for_debt(&mut town, subject, "Debtor", 5, 0)
            .map(|record| record.sentence_ticks)
            .ok();
        assert_eq!(sentence, Some(6000));
        assert!(!manager.is_bail_available(subject, 5999));
        assert_eq!(manager.bail_available_at(subject), None);
        assert!(matches!(
            manager.pay_bail(&mut town, subject, 5999),
            Err(IncarcerationError::BailNotOffered(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Release and sessions
    // -----------------------------------------------------------------------

    #[test]
    fn time_served_release_clears_level_and_frees_cell() {
        let mut manager = manager();
        let mut town = Town::default();
        let subject = SubjectId::new();
        town.levels.insert(subject, 2);
        assert!(manager.imprison_player(&mut town, subject, "Vic", 2, 0).is_ok());

        assert!(manager.on_server_tick(&mut town, 2399).is_empty());
        assert_eq!(manager.on_server_tick(&mut town, 2400), vec![subject]);
        assert_eq!(town.levels.get(&subject), Some(&0));
        assert!(manager.cells().iter().all(Cell::is_free));
    }

    #[test]
    fn release_of_free_subject_is_error() {
        let mut manager = manager();
        let mut town = Town::default();
        let result = manager.release_player(&mut town, SubjectId::new(), ReleaseReason::AdminRelease);
        assert!(matches!(result, Err(IncarcerationError::NotImprisoned(_))));
    }

    #[test]
    fn offline_time_does_not_count() {
        let mut manager = manager();
        let mut town = Town::default();
        let subject = SubjectId::new();
        assert!(manager.imprison_player(&mut town, subject, "Vic", 1, 0).is_ok());

        assert!(manager.on_player_logout(subject, 400));
        // Offline prisoners are never auto-released.
        assert!(manager.on_server_tick(&mut town, 50_000).is_empty());
        assert!(manager.on_player_login(&mut town, subject, 50_000));

        let record = manager.get_prisoner_data(subject);
        assert!(record.is_some_and(|r| r.remaining_ticks(50_000) == 800 && r.served_ticks(50_000) == 400));
        assert!(manager.on_server_tick(&mut town, 50_799).is_empty());
        assert_eq!(manager.on_server_tick(&mut town, 50_800), vec![subject]);
    }

    #[test]
    fn login_places_prisoner_back_in_cell() {
        let mut manager = manager();
        let mut town = Town::default();
        let subject = SubjectId::new();
        assert!(manager.imprison_player(&mut town, subject, "Vic", 1, 0).is_ok());
        assert!(manager.on_player_logout(subject, 10));
        town.placements.clear();
        assert!(manager.on_player_login(&mut town, subject, 20));
        assert_eq!(town.placements, vec![(subject, BlockPos::new(104, 64, 100))]);
        assert!(!manager.on_player_logout(SubjectId::new(), 20));
    }

    #[test]
    fn reconfigure_moves_prisoners_from_removed_cells_to_overflow() {
        let mut manager = manager();
        let mut town = Town::default();
        let ids: Vec<SubjectId> = (0..3).map(|_| SubjectId::new()).collect();
        for id in &ids {
            assert!(manager.imprison_player(&mut town, *id, "Inmate", 1, 0).is_ok());
        }

        manager.configure_prison(BlockPos::new(0, 70, 0), 2);

        let cells: Vec<u32> = ids
            .iter()
            .filter_map(|id| manager.get_prisoner_data(*id).map(|r| r.cell))
            .collect();
        assert_eq!(cells, vec![1, 2, 1]);
        assert_eq!(
            ids.get(1)
                .and_then(|id| manager.get_prisoner_data(*id))
                .map(|r| r.cell_position),
            Some(BlockPos::new(8, 70, 0))
        );
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    #[test]
    fn snapshot_freezes_running_clocks() {
        let mut manager = manager();
        let mut town = Town::default();
        let subject = SubjectId::new();
        assert!(manager.imprison_player(&mut town, subject, "Vic", 2, 0).is_ok());

        let snapshot = manager.snapshot(1000);
        let mut restored = IncarcerationManager::new(PrisonConfig::default(), &TimeConfig::default());
        assert_eq!(restored.restore(snapshot), 0);

        let record = restored.get_prisoner_data(subject);
        assert!(record.is_some_and(|r| !r.is_online() && r.remaining_ticks(0) == 1400));
        assert_eq!(restored.cells().len(), 4);
        assert!(restored.cells().first().is_some_and(|cell| !cell.is_free()));
    }
}
