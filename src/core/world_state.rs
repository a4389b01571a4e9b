// src/core/world_state.rs - Symbolic facts the planner reasons over
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Builds a `WorldState` from `key => value` pairs.
#[macro_export]
macro_rules! world_state {
    ( $( $key:expr => $value:expr ),* $(,)? ) => {{
        let mut state = $crate::core::world_state::WorldState::new();
        $( state.set($key, $value); )*
        state
    }};
}

// === FACT NAMES ===
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldKey {
    // Perception
    PlayerVisible, UnderFire, CoverAvailable,
    // Position
    InCover, AtFlankPosition, AtSafeDistance,
    // Squad
    EnemiesInCombat, InSquad,
    // Outcomes
    PlayerEngaged, PlayerSuppressed,
    // Self
    HasWeapon, WeaponLoaded, IsInjured,
}

impl WorldKey {
    pub const ALL: [WorldKey; 13] = [
        WorldKey::PlayerVisible, WorldKey::UnderFire, WorldKey::CoverAvailable,
        WorldKey::InCover, WorldKey::AtFlankPosition, WorldKey::AtSafeDistance,
        WorldKey::EnemiesInCombat, WorldKey::InSquad,
        WorldKey::PlayerEngaged, WorldKey::PlayerSuppressed,
        WorldKey::HasWeapon, WorldKey::WeaponLoaded, WorldKey::IsInjured,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WorldKey::PlayerVisible => "player_visible",
            WorldKey::UnderFire => "under_fire",
            WorldKey::CoverAvailable => "cover_available",
            WorldKey::InCover => "in_cover",
            WorldKey::AtFlankPosition => "at_flank_position",
            WorldKey::AtSafeDistance => "at_safe_distance",
            WorldKey::EnemiesInCombat => "enemies_in_combat",
            WorldKey::InSquad => "in_squad",
            WorldKey::PlayerEngaged => "player_engaged",
            WorldKey::PlayerSuppressed => "player_suppressed",
            WorldKey::HasWeapon => "has_weapon",
            WorldKey::WeaponLoaded => "weapon_loaded",
            WorldKey::IsInjured => "is_injured",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| key.name() == name)
    }
}

impl fmt::Display for WorldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fact value. A `Bool` never equals an `Int`, even `Int(0)` vs `Bool(false)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Bool(bool),
    Int(i32),
}

impl FactValue {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            FactValue::Bool(v) => Some(v),
            FactValue::Int(_) => None,
        }
    }

    pub fn as_int(self) -> Option<i32> {
        match self {
            FactValue::Int(v) => Some(v),
            FactValue::Bool(_) => None,
        }
    }
}

impl From<bool> for FactValue {
    fn from(value: bool) -> Self { FactValue::Bool(value) }
}

impl From<i32> for FactValue {
    fn from(value: i32) -> Self { FactValue::Int(value) }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Bool(v) => write!(f, "{}", v),
            FactValue::Int(v) => write!(f, "{}", v),
        }
    }
}

/// Mapping of fact name to value. Ordered so that two equal states hash
/// identically, which the planner's closed set depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldState {
    facts: BTreeMap<WorldKey, FactValue>,
}

impl WorldState {
    pub fn new() -> Self {
        Self { facts: BTreeMap::new() }
    }

    pub fn set(&mut self, key: WorldKey, value: impl Into<FactValue>) {
        self.facts.insert(key, value.into());
    }

    pub fn get(&self, key: WorldKey) -> Option<FactValue> {
        self.facts.get(&key).copied()
    }

    pub fn get_bool(&self, key: WorldKey) -> Option<bool> {
        self.get(key).and_then(FactValue::as_bool)
    }

    pub fn get_int(&self, key: WorldKey) -> Option<i32> {
        self.get(key).and_then(FactValue::as_int)
    }

    /// True when every fact in `required` exists here with an equal value.
    /// Missing facts are never satisfied.
    pub fn satisfies(&self, required: &WorldState) -> bool {
        required.facts.iter().all(|(key, value)| self.facts.get(key) == Some(value))
    }

    pub fn unsatisfied_count(&self, required: &WorldState) -> usize {
        required.facts.iter()
            .filter(|(key, value)| self.facts.get(*key) != Some(*value))
            .count()
    }

    /// Returns a copy with every fact in `effects` written over this state.
    pub fn apply(&self, effects: &WorldState) -> WorldState {
        let mut next = self.clone();
        next.apply_in_place(effects);
        next
    }

    pub fn apply_in_place(&mut self, effects: &WorldState) {
        for (&key, &value) in &effects.facts {
            self.facts.insert(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (WorldKey, FactValue)> + '_ {
        self.facts.iter().map(|(&key, &value)| (key, value))
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

impl FromIterator<(WorldKey, FactValue)> for WorldState {
    fn from_iter<I: IntoIterator<Item = (WorldKey, FactValue)>>(iter: I) -> Self {
        Self { facts: iter.into_iter().collect() }
    }
}

impl fmt::Display for WorldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 { f.write_str(", ")?; }
            write!(f, "{}: {}", key, value)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satisfies_requires_every_goal_fact() {
        let state = world_state![WorldKey::PlayerVisible => false, WorldKey::InCover => true];
        assert!(state.satisfies(&world_state![WorldKey::InCover => true]));
        assert!(!state.satisfies(&world_state![WorldKey::InCover => false]));
        assert!(state.satisfies(&WorldState::new()));
    }

    #[test]
    fn missing_fact_is_not_satisfied() {
        let state = world_state![WorldKey::InCover => true];
        assert!(!state.satisfies(&world_state![WorldKey::PlayerEngaged => false]));
    }

    #[test]
    fn bool_and_int_never_compare_equal() {
        let state = world_state![WorldKey::EnemiesInCombat => 0];
        assert!(!state.satisfies(&world_state![WorldKey::EnemiesInCombat => false]));
        assert_eq!(state.get_int(WorldKey::EnemiesInCombat), Some(0));
        assert_eq!(state.get_bool(WorldKey::EnemiesInCombat), None);
    }

    #[test]
    fn apply_overwrites_and_leaves_input_untouched() {
        let state = world_state![WorldKey::PlayerEngaged => false, WorldKey::InCover => true];
        let next = state.apply(&world_state![WorldKey::PlayerEngaged => true, WorldKey::AtFlankPosition => true]);

        assert_eq!(state.get_bool(WorldKey::PlayerEngaged), Some(false));
        assert_eq!(next.get_bool(WorldKey::PlayerEngaged), Some(true));
        assert_eq!(next.get_bool(WorldKey::AtFlankPosition), Some(true));
        assert_eq!(next.get_bool(WorldKey::InCover), Some(true));
    }

    #[test]
    fn unsatisfied_count_counts_missing_and_wrong() {
        let state = world_state![WorldKey::InCover => true, WorldKey::UnderFire => true];
        let goal = world_state![
            WorldKey::InCover => true,
            WorldKey::UnderFire => false,
            WorldKey::PlayerEngaged => true,
        ];
        assert_eq!(state.unsatisfied_count(&goal), 2);
    }

    #[test]
    fn key_names_round_trip() {
        for key in WorldKey::ALL {
            assert_eq!(WorldKey::from_name(key.name()), Some(key));
        }
        assert_eq!(WorldKey::from_name("no_such_fact"), None);
    }

    #[test]
    fn ron_uses_snake_case_names() {
        let state: WorldState = ron::from_str("{ player_visible: false, enemies_in_combat: 3 }").unwrap();
        assert_eq!(state.get_bool(WorldKey::PlayerVisible), Some(false));
        assert_eq!(state.get_int(WorldKey::EnemiesInCombat), Some(3));
    }
}
