// src/core/squad.rs - Squad aggregate, role table and rally geometry
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const MAX_SQUAD_SIZE: usize = 4;
pub const SYNC_DISTANCE: f32 = 100.0;
pub const SUPPORTING_OFFSET: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TacticalRole {
    #[default]
    None = 0,
    LeadAttacker = 1,
    Supporting = 2,
    UpperLeadAttacker = 3,
    UpperSupporting = 4,
}

impl TacticalRole {
    pub fn is_supporting(self) -> bool {
        matches!(self, TacticalRole::Supporting | TacticalRole::UpperSupporting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum FlankDirection {
    #[default]
    Lower = 0,
    Upper = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SquadPhase {
    Forming,
    Positioning,
    Flanking,
    Assaulting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SquadId(pub u32);

impl fmt::Display for SquadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "squad#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleAssignment {
    pub agent: Entity,
    pub role: TacticalRole,
    pub subgroup: FlankDirection,
}

/// Role table for up to four members. Members are ranked by Y descending
/// (further down-screen first); equal Y keeps the given order.
pub fn assign_roles(members: &[(Entity, Vec2)]) -> Vec<RoleAssignment> {
    use FlankDirection::*;
    use TacticalRole::*;

    let mut sorted = members.to_vec();
    sorted.sort_by(|a, b| b.1.y.total_cmp(&a.1.y));

    let table: &[(TacticalRole, FlankDirection)] = match sorted.len() {
        0 => &[],
        1 => &[(LeadAttacker, Lower)],
        2 => &[(LeadAttacker, Lower), (Supporting, Lower)],
        3 => &[(LeadAttacker, Lower), (Supporting, Lower), (UpperLeadAttacker, Upper)],
        _ => &[(LeadAttacker, Lower), (Supporting, Lower), (UpperSupporting, Upper), (UpperLeadAttacker, Upper)],
    };

    sorted.iter()
        .zip(table.iter())
        .map(|(&(agent, _), &(role, subgroup))| RoleAssignment { agent, role, subgroup })
        .collect()
}

/// Rally point of a subgroup: LOWER below the cover, UPPER above it.
pub fn sync_position(target_cover: Vec2, subgroup: FlankDirection, sync_distance: f32) -> Vec2 {
    match subgroup {
        FlankDirection::Lower => target_cover + Vec2::new(0.0, sync_distance),
        FlankDirection::Upper => target_cover - Vec2::new(0.0, sync_distance),
    }
}

/// Where an agent with `role` should stand. Supporting roles trail their
/// lead along the lead-to-target axis, always further from the target.
pub fn rally_point(target_cover: Vec2, role: TacticalRole, subgroup: FlankDirection, sync_distance: f32, supporting_offset: f32) -> Vec2 {
    let lead = sync_position(target_cover, subgroup, sync_distance);
    if role.is_supporting() {
        let away = (lead - target_cover).normalize_or_zero();
        let away = if away == Vec2::ZERO {
            match subgroup {
                FlankDirection::Lower => Vec2::Y,
                FlankDirection::Upper => Vec2::NEG_Y,
            }
        } else { away };
        lead + away * supporting_offset
    } else {
        lead
    }
}

/// Side a lone flanker should take. `None` when both are blocked.
pub fn pick_flank_side(agent_pos: Vec2, target: Vec2, lower_blocked: bool, upper_blocked: bool) -> Option<FlankDirection> {
    match (lower_blocked, upper_blocked) {
        (true, true) => None,
        (true, false) => Some(FlankDirection::Upper),
        (false, true) => Some(FlankDirection::Lower),
        (false, false) if agent_pos.y >= target.y => Some(FlankDirection::Lower),
        (false, false) => Some(FlankDirection::Upper),
    }
}

#[derive(Debug, Clone)]
pub struct Squad {
    pub id: SquadId,
    pub members: Vec<Entity>,
    pub roles: HashMap<Entity, TacticalRole>,
    pub subgroups: HashMap<Entity, FlankDirection>,
    pub phase: SquadPhase,
    pub target_cover: Vec2,
    pub lower_ready: bool,
    pub upper_ready: bool,
    /// Seconds spent in the current phase.
    pub phase_time: f32,
}

impl Squad {
    pub fn new(id: SquadId, initiator: Entity, target_cover: Vec2) -> Self {
        let mut squad = Self {
            id,
            members: Vec::with_capacity(MAX_SQUAD_SIZE),
            roles: HashMap::new(),
            subgroups: HashMap::new(),
            phase: SquadPhase::Forming,
            target_cover,
            lower_ready: false,
            upper_ready: false,
            phase_time: 0.0,
        };
        squad.members.push(initiator);
        squad
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, agent: Entity) -> bool {
        self.members.contains(&agent)
    }

    pub fn role_of(&self, agent: Entity) -> TacticalRole {
        self.roles.get(&agent).copied().unwrap_or_default()
    }

    pub fn subgroup_of(&self, agent: Entity) -> FlankDirection {
        self.subgroups.get(&agent).copied().unwrap_or_default()
    }

    pub fn subgroup_members(&self, subgroup: FlankDirection) -> impl Iterator<Item = Entity> + '_ {
        self.members.iter().copied().filter(move |&m| self.subgroup_of(m) == subgroup)
    }

    pub fn is_joinable(&self, max_size: usize) -> bool {
        matches!(self.phase, SquadPhase::Forming | SquadPhase::Positioning)
            && self.len() < max_size.min(MAX_SQUAD_SIZE)
    }

    /// Three or more members split into subgroups that must both be ready.
    pub fn needs_subgroup_sync(&self) -> bool {
        self.len() >= 3
    }

    pub fn subgroup_ready(&self, subgroup: FlankDirection) -> bool {
        match subgroup {
            FlankDirection::Lower => self.lower_ready,
            FlankDirection::Upper => self.upper_ready,
        }
    }

    pub fn set_subgroup_ready(&mut self, subgroup: FlankDirection, ready: bool) {
        match subgroup {
            FlankDirection::Lower => self.lower_ready = ready,
            FlankDirection::Upper => self.upper_ready = ready,
        }
    }

    /// Sync barrier: AND across subgroups, never OR.
    pub fn both_subgroups_ready(&self) -> bool {
        self.lower_ready && self.upper_ready
    }

    pub fn rally_point(&self, agent: Entity, sync_distance: f32, supporting_offset: f32) -> Option<Vec2> {
        self.contains(agent).then(|| {
            rally_point(self.target_cover, self.role_of(agent), self.subgroup_of(agent), sync_distance, supporting_offset)
        })
    }

    /// Recomputes every role from current positions. Returns the assignments
    /// that differ from what the member held before.
    pub fn reassign_roles(&mut self, positions: &[(Entity, Vec2)]) -> Vec<RoleAssignment> {
        let assignments = assign_roles(positions);
        let changed = assignments.iter()
            .filter(|a| self.roles.get(&a.agent) != Some(&a.role) || self.subgroups.get(&a.agent) != Some(&a.subgroup))
            .copied()
            .collect();

        self.roles.clear();
        self.subgroups.clear();
        for a in &assignments {
            self.roles.insert(a.agent, a.role);
            self.subgroups.insert(a.agent, a.subgroup);
        }
        self.lower_ready = false;
        self.upper_ready = false;
        changed
    }

    pub fn remove_member(&mut self, agent: Entity) -> bool {
        let before = self.members.len();
        self.members.retain(|&m| m != agent);
        self.roles.remove(&agent);
        self.subgroups.remove(&agent);
        before != self.members.len()
    }

    pub fn set_phase(&mut self, phase: SquadPhase) {
        self.phase = phase;
        self.phase_time = 0.0;
    }

    /// Phase the squad may move to from current membership and readiness.
    /// `forming_window` lets a lone initiator proceed as a solo flank.
    pub fn next_phase(&self, forming_window: f32, any_sees_player: bool) -> Option<SquadPhase> {
        if self.is_empty() {
            return None;
        }
        match self.phase {
            SquadPhase::Forming if self.len() >= 2 || self.phase_time >= forming_window => Some(SquadPhase::Positioning),
            SquadPhase::Positioning if !self.needs_subgroup_sync() || self.both_subgroups_ready() => Some(SquadPhase::Flanking),
            SquadPhase::Flanking if any_sees_player => Some(SquadPhase::Assaulting),
            _ => None,
        }
    }
}
