//! Resident spawner for seeding the town with people.
//!
//! At startup the spawner creates civilians and enforcement officers with
//! random honesty and greed, unique names, and positions scattered around
//! the town square.

use std::collections::BTreeMap;

use crimewatch_types::{AgentRole, BlockPos, SubjectId, WitnessTraits};
use rand::Rng;
use tracing::info;

use crate::error::EngineError;
use crate::settings::EngineSettings;
use crate::world::Resident;

/// Centre of town. Crimes happen around here.
pub const TOWN_SQUARE: BlockPos = BlockPos::new(0, 64, 0);

/// How far from the square residents may stand.
pub const TOWN_RADIUS: i32 = 24;

/// Officers are recruited from the honest end of the population.
const OFFICER_HONESTY: (i32, i32) = (-10, 90);

// -----------------------------------------------------------------------
// Name pool
// -----------------------------------------------------------------------

/// Built-in pool of resident names. The spawner picks randomly without
/// replacement from this list to ensure uniqueness.
const NAME_POOL: &[&str] = &[
    "Abel", "Bianca", "Cyrus", "Delia", "Edgar", "Fiona", "Gideon", "Hattie",
    "Ignatius", "Jolene", "Kasper", "Lorna", "Milo", "Nadia", "Otto", "Petra",
    "Quentin", "Rosa", "Silas", "Tamsin", "Ulric", "Vera", "Wade", "Xenia",
    "Yusuf", "Zelda", "Amos", "Beryl", "Clement", "Dora", "Ezra", "Flora",
    "Gus", "Hazel", "Ivo", "June", "Knox", "Lila", "Morris", "Nell",
];

// -----------------------------------------------------------------------
// Spawning
// -----------------------------------------------------------------------

/// Spawn every resident named in `settings`.
///
/// Civilians come first, then officers.
///
/// # Errors
///
/// Returns [`EngineError::Spawner`] if more residents are requested than
/// the name pool holds.
pub fn spawn_residents(
    settings: &EngineSettings,
    rng: &mut impl Rng,
) -> Result<BTreeMap<SubjectId, Resident>, EngineError> {
    let total = settings.residents.saturating_add(settings.officers);
    let names = pick_unique_names(rng, total)?;

    let mut residents = BTreeMap::new();
    for (i, name) in names.into_iter().enumerate() {
        let is_officer = u32::try_from(i).unwrap_or(u32::MAX) >= settings.residents;
        let (role, honesty) = if is_officer {
            (
                AgentRole::Enforcement,
                rng.random_range(OFFICER_HONESTY.0..=OFFICER_HONESTY.1),
            )
        } else {
            (AgentRole::Civilian, rng.random_range(-100..=100))
        };
        let resident = Resident {
            id: SubjectId::new(),
            name,
            position: random_spot(rng),
            traits: WitnessTraits::new(honesty, rng.random_range(-100..=100)),
            role,
            awake: true,
            online: true,
        };

        info!(
            subject = %resident.id,
            name = %resident.name,
            role = ?resident.role,
            honesty = resident.traits.honesty,
            greed = resident.traits.greed,
            "Spawned resident"
        );
        residents.insert(resident.id, resident);
    }

    Ok(residents)
}

/// A random position within [`TOWN_RADIUS`] of the square.
pub fn random_spot(rng: &mut impl Rng) -> BlockPos {
    TOWN_SQUARE.offset(
        rng.random_range(-TOWN_RADIUS..=TOWN_RADIUS),
        0,
        rng.random_range(-TOWN_RADIUS..=TOWN_RADIUS),
    )
}

/// Pick `count` unique names from the name pool using random sampling.
fn pick_unique_names(rng: &mut impl Rng, count: u32) -> Result<Vec<String>, EngineError> {
    let pool_len = NAME_POOL.len();
    let count_usize = usize::try_from(count).map_err(|_conversion_err| EngineError::Spawner {
        message: format!("resident count {count} exceeds usize range"),
    })?;

    if count_usize > pool_len {
        return Err(EngineError::Spawner {
            message: format!("requested {count} names but pool only has {pool_len}"),
        });
    }

    // Partial Fisher-Yates over the index array.
    let mut indices: Vec<usize> = (0..pool_len).collect();
    for i in 0..count_usize {
        let j = rng.random_range(i..pool_len);
        indices.swap(i, j);
    }

    indices
        .iter()
        .take(count_usize)
        .map(|&idx| {
            NAME_POOL
                .get(idx)
                .map(|s| String::from(*s))
                .ok_or_else(|| EngineError::Spawner {
                    message: format!("name pool index {idx} out of bounds"),
                })
        })
        .collect()
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::collections::BTreeSet;

    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn settings(residents: u32, officers: u32) -> EngineSettings {
        EngineSettings {
            residents,
            officers,
            ..EngineSettings::default()
        }
    }

    #[test]
    fn spawns_requested_roles() {
        let mut rng = SmallRng::seed_from_u64(1);
        let residents = spawn_residents(&settings(10, 3), &mut rng).unwrap();

        assert_eq!(residents.len(), 13);
        let officers = residents
            .values()
            .filter(|r| r.role == AgentRole::Enforcement)
            .count();
        assert_eq!(officers, 3);
    }

    #[test]
    fn all_unique_names() {
        let mut rng = SmallRng::seed_from_u64(2);
        let residents = spawn_residents(&settings(30, 5), &mut rng).unwrap();

        let names: BTreeSet<&str> = residents.values().map(|r| r.name.as_str()).collect();
        assert_eq!(names.len(), 35, "all names must be unique");
    }

    #[test]
    fn residents_stay_inside_town() {
        let mut rng = SmallRng::seed_from_u64(3);
        let residents = spawn_residents(&settings(20, 4), &mut rng).unwrap();

        for resident in residents.values() {
            assert!((resident.position.x - TOWN_SQUARE.x).abs() <= TOWN_RADIUS);
            assert!((resident.position.z - TOWN_SQUARE.z).abs() <= TOWN_RADIUS);
            assert_eq!(resident.position.y, TOWN_SQUARE.y);
        }
    }

    #[test]
    fn officers_are_never_fully_corrupt() {
        let mut rng = SmallRng::seed_from_u64(4);
        let residents = spawn_residents(&settings(0, 30), &mut rng).unwrap();

        assert!(residents.values().all(|r| r.traits.honesty >= OFFICER_HONESTY.0));
    }

    #[test]
    fn too_many_residents_returns_error() {
        let mut rng = SmallRng::seed_from_u64(5);
        let result = spawn_residents(&settings(40, 1), &mut rng);
        assert!(matches!(result, Err(EngineError::Spawner { .. })));
    }

    #[test]
    fn zero_residents_returns_empty() {
        let mut rng = SmallRng::seed_from_u64(6);
        assert!(spawn_residents(&settings(0, 0), &mut rng).unwrap().is_empty());
    }
}
