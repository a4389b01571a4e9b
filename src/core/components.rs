// src/core/components.rs - ECS mirrors of the enemy body
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::squad::{FlankDirection, SquadId, TacticalRole};

#[derive(Component)]
pub struct Enemy;

#[derive(Component)]
pub struct Dead;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CombatState {
    #[default]
    Idle,
    Patrolling,
    Combat,
    InCover,
    Flanking,
    Retreating,
}

impl CombatState {
    pub fn is_engaged(self) -> bool {
        matches!(self, CombatState::Combat | CombatState::InCover | CombatState::Flanking)
    }
}

/// Facts the perception and movement layers write each frame.
#[derive(Component, Debug, Clone, Default)]
pub struct CombatBody {
    pub state: CombatState,
    pub can_see_player: bool,
    pub in_cover: bool,
    pub cover_available: bool,
    pub under_fire: bool,
    pub is_injured: bool,
    pub weapon_loaded: bool,
    pub engaging_player: bool,
    pub at_sync_position: bool,
    pub at_cover_back: bool,
    pub lower_flank_blocked: bool,
    pub upper_flank_blocked: bool,
    /// Cover the player is holding, if known.
    pub player_cover: Option<Vec2>,
    pub player_last_seen: Option<Vec2>,
}

impl CombatBody {
    pub fn engaged() -> Self {
        Self { state: CombatState::Combat, weapon_loaded: true, ..default() }
    }

    pub fn flank_target(&self) -> Option<Vec2> {
        self.player_cover.or(self.player_last_seen)
    }
}

/// What the squad manager last told this agent.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct FlankAssignment {
    pub squad: Option<SquadId>,
    pub role: TacticalRole,
    pub subgroup: FlankDirection,
    pub target_cover: Option<Vec2>,
    pub flank_target: Option<Vec2>,
    pub synchronized_flank: bool,
    pub assaulting: bool,
    /// Side picked for a plain flank outside any squad.
    pub solo_side: Option<FlankDirection>,
}

impl FlankAssignment {
    pub fn is_active(&self) -> bool {
        self.target_cover.is_some()
    }

    pub fn join_flank_squad(&mut self, cover: Vec2, role: TacticalRole, subgroup: FlankDirection) {
        self.target_cover = Some(cover);
        self.role = role;
        self.subgroup = subgroup;
        self.synchronized_flank = false;
        self.assaulting = false;
        self.solo_side = None;
    }

    pub fn leave_flank_squad(&mut self) {
        *self = Self::default();
    }

    pub fn update_flank_target(&mut self, pos: Vec2) {
        self.flank_target = Some(pos);
    }

    pub fn update_squad_role(&mut self, role: TacticalRole, subgroup: FlankDirection) {
        self.role = role;
        self.subgroup = subgroup;
    }
}

/// Caller-side retry cap for coordinated flanks.
#[derive(Component, Debug, Clone, Default)]
pub struct FlankAttempts {
    pub failures: u32,
    pub cooldown: f32,
}

impl FlankAttempts {
    pub fn is_blocked(&self) -> bool {
        self.cooldown > 0.0
    }

    /// Counts a failure; once `max_attempts` is reached the coordinated
    /// action is blocked for `cooldown_secs`.
    pub fn record_failure(&mut self, max_attempts: u32, cooldown_secs: f32) {
        self.failures += 1;
        if self.failures >= max_attempts {
            self.cooldown = cooldown_secs;
            self.failures = 0;
        }
    }

    pub fn tick(&mut self, dt: f32) {
        if self.cooldown > 0.0 {
            self.cooldown = (self.cooldown - dt).max(0.0);
        }
    }
}
