// src/core/events.rs
use bevy::prelude::*;

use crate::core::goap::ActionType;
use crate::core::squad::{SquadId, SquadPhase};

/// An enemy started executing a planned action.
#[derive(Event, Debug, Clone)]
pub struct TacticalActionEvent {
    pub entity: Entity,
    pub action: ActionType,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DissolveReason {
    Attrition,
    SyncTimeout,
    AssaultComplete,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub enum SquadEvent {
    Formed { squad: SquadId, initiator: Entity },
    Joined { squad: SquadId, agent: Entity },
    Left { squad: SquadId, agent: Entity },
    PhaseChanged { squad: SquadId, from: SquadPhase, to: SquadPhase },
    Dissolved { squad: SquadId, reason: DissolveReason, members: Vec<Entity> },
}
