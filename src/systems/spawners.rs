// src/systems/spawners.rs
use bevy::prelude::*;

use crate::core::*;

/// Spawns an enemy with everything the planner and squad systems query for.
pub fn spawn_enemy(commands: &mut Commands, pos: Vec2, body: CombatBody) -> Entity {
    commands.spawn((
        Transform::from_translation(pos.extend(1.0)),
        Enemy,
        body,
        GoapAgent::default(),
        FlankAssignment::default(),
        FlankAttempts::default(),
    )).id()
}
