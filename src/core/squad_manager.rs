// src/core/squad_manager.rs - Owns every flank squad and drives its phases
use bevy::prelude::*;
use std::collections::{BTreeMap, HashMap};

use crate::core::components::CombatState;
use crate::core::events::{DissolveReason, SquadEvent};
use crate::core::goap_config::{SquadConfig, SyncTimeoutPolicy};
use crate::core::squad::{FlankDirection, Squad, SquadId, SquadPhase, TacticalRole};

/// The narrow slice of an enemy body the squad manager talks to. Readers are
/// snapshots; the command methods are fire-and-forget.
pub trait FlankAgent {
    fn get_current_state(&self) -> CombatState;
    fn is_alive(&self) -> bool;
    fn can_see_player(&self) -> bool;
    fn is_at_sync_position(&self) -> bool;
    fn is_at_cover_back(&self) -> bool;
    fn global_position(&self) -> Vec2;

    fn join_flank_squad(&mut self, cover: Vec2, role: TacticalRole, subgroup: FlankDirection);
    fn leave_flank_squad(&mut self);
    fn update_flank_target(&mut self, pos: Vec2);
    fn update_squad_role(&mut self, role: TacticalRole, subgroup: FlankDirection);
    fn begin_synchronized_flank(&mut self);
    fn begin_coordinated_assault(&mut self);
}

/// Lookup of live agents by entity.
pub trait AgentRoster {
    type Agent: FlankAgent;

    fn agent(&self, id: Entity) -> Option<&Self::Agent>;
    fn agent_mut(&mut self, id: Entity) -> Option<&mut Self::Agent>;
    /// Every agent, in a stable order.
    fn agent_ids(&self) -> Vec<Entity>;
}

impl<A: FlankAgent> AgentRoster for HashMap<Entity, A> {
    type Agent = A;

    fn agent(&self, id: Entity) -> Option<&A> {
        self.get(&id)
    }

    fn agent_mut(&mut self, id: Entity) -> Option<&mut A> {
        self.get_mut(&id)
    }

    fn agent_ids(&self) -> Vec<Entity> {
        let mut ids: Vec<Entity> = self.keys().copied().collect();
        ids.sort();
        ids
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlankRefusal {
    SquadFull,
    NoAlliesAvailable,
    NotEligible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlankRequest {
    Formed(SquadId),
    Joined(SquadId),
    AlreadyMember(SquadId),
    Refused(FlankRefusal),
}

impl FlankRequest {
    pub fn squad(self) -> Option<SquadId> {
        match self {
            FlankRequest::Formed(id) | FlankRequest::Joined(id) | FlankRequest::AlreadyMember(id) => Some(id),
            FlankRequest::Refused(_) => None,
        }
    }
}

/// All squad mutation goes through here. As a Bevy resource it is only ever
/// written through `ResMut`, which the scheduler serializes.
#[derive(Resource, Debug, Default)]
pub struct SquadManager {
    squads: BTreeMap<SquadId, Squad>,
    membership: HashMap<Entity, SquadId>,
    next_id: u32,
    config: SquadConfig,
    pending: Vec<SquadEvent>,
}

fn is_eligible<A: FlankAgent>(agent: &A) -> bool {
    agent.is_alive() && agent.get_current_state().is_engaged()
}

impl SquadManager {
    pub fn new(config: SquadConfig) -> Self {
        Self { config, ..default() }
    }

    // === QUERIES ===
    pub fn squad(&self, id: SquadId) -> Option<&Squad> {
        self.squads.get(&id)
    }

    pub fn squad_of(&self, agent: Entity) -> Option<SquadId> {
        self.membership.get(&agent).copied()
    }

    pub fn role_of(&self, agent: Entity) -> TacticalRole {
        self.squad_of(agent)
            .and_then(|id| self.squads.get(&id))
            .map(|s| s.role_of(agent))
            .unwrap_or_default()
    }

    pub fn rally_point_for(&self, agent: Entity) -> Option<Vec2> {
        let squad = self.squads.get(&self.squad_of(agent)?)?;
        squad.rally_point(agent, self.config.sync_distance, self.config.supporting_offset)
    }

    pub fn subgroup_ready(&self, id: SquadId, subgroup: FlankDirection) -> bool {
        self.squads.get(&id).is_some_and(|s| s.subgroup_ready(subgroup))
    }

    pub fn active_squads(&self) -> impl Iterator<Item = &Squad> {
        self.squads.values()
    }

    pub fn drain_events(&mut self) -> Vec<SquadEvent> {
        std::mem::take(&mut self.pending)
    }

    // === MEMBERSHIP ===

    /// Entry point of the coordinated flank action. Joins the nearest squad
    /// still gathering, or forms a new one when an idle ally is close enough.
    pub fn request_flank<R: AgentRoster>(&mut self, agent: Entity, target_cover: Vec2, roster: &mut R) -> FlankRequest {
        if let Some(id) = self.squad_of(agent) {
            return FlankRequest::AlreadyMember(id);
        }
        let Some(position) = roster.agent(agent).filter(|a| is_eligible(*a)).map(|a| a.global_position()) else {
            return FlankRequest::Refused(FlankRefusal::NotEligible);
        };

        let cap = self.config.size_cap();
        let mut nearest_open: Option<(f32, SquadId)> = None;
        let mut saw_full = false;
        for squad in self.squads.values() {
            if !matches!(squad.phase, SquadPhase::Forming | SquadPhase::Positioning) {
                continue;
            }
            let distance = squad.members.iter()
                .filter_map(|&m| roster.agent(m))
                .map(|m| m.global_position().distance(position))
                .fold(f32::INFINITY, f32::min);
            if distance > self.config.join_radius {
                continue;
            }
            if squad.is_joinable(cap) {
                if nearest_open.map_or(true, |(d, _)| distance < d) {
                    nearest_open = Some((distance, squad.id));
                }
            } else {
                saw_full = true;
            }
        }

        if let Some((_, id)) = nearest_open {
            if self.join_squad(id, agent, roster) {
                return FlankRequest::Joined(id);
            }
        }
        if saw_full {
            debug!("Enemy {} refused: nearby squad is full", agent.index());
            return FlankRequest::Refused(FlankRefusal::SquadFull);
        }

        let has_ally = roster.agent_ids().into_iter()
            .filter(|&other| other != agent && !self.membership.contains_key(&other))
            .filter_map(|other| roster.agent(other))
            .any(|other| is_eligible(other) && other.global_position().distance(position) <= self.config.recruit_radius);
        if !has_ally {
            return FlankRequest::Refused(FlankRefusal::NoAlliesAvailable);
        }

        FlankRequest::Formed(self.form_squad(agent, target_cover, roster))
    }

    fn form_squad<R: AgentRoster>(&mut self, initiator: Entity, target_cover: Vec2, roster: &mut R) -> SquadId {
        self.next_id += 1;
        let id = SquadId(self.next_id);
        self.squads.insert(id, Squad::new(id, initiator, target_cover));
        self.membership.insert(initiator, id);
        self.pending.push(SquadEvent::Formed { squad: id, initiator });
        info!("Enemy {} formed {} at cover ({:.0}, {:.0})", initiator.index(), id, target_cover.x, target_cover.y);

        self.reassign(id, Some(initiator), roster);
        id
    }

    /// Adds `agent` to a gathering squad. False when the squad is full, past
    /// positioning, unknown, or the agent already belongs to another squad.
    pub fn join_squad<R: AgentRoster>(&mut self, id: SquadId, agent: Entity, roster: &mut R) -> bool {
        if let Some(current) = self.squad_of(agent) {
            return current == id;
        }
        if roster.agent(agent).is_none() {
            return false;
        }
        let cap = self.config.size_cap();
        let Some(squad) = self.squads.get_mut(&id) else { return false };
        if !squad.is_joinable(cap) {
            return false;
        }

        squad.members.push(agent);
        self.membership.insert(agent, id);
        self.pending.push(SquadEvent::Joined { squad: id, agent });
        info!("Enemy {} joined {} ({} members)", agent.index(), id, squad.len());

        self.reassign(id, Some(agent), roster);
        true
    }

    /// Removes `agent` from its squad. No-op for non-members.
    pub fn leave_squad<R: AgentRoster>(&mut self, agent: Entity, roster: &mut R) -> bool {
        let Some(id) = self.membership.remove(&agent) else { return false };
        if let Some(squad) = self.squads.get_mut(&id) {
            squad.remove_member(agent);
        }
        if let Some(body) = roster.agent_mut(agent) {
            body.leave_flank_squad();
        }
        self.pending.push(SquadEvent::Left { squad: id, agent });
        debug!("Enemy {} left {}", agent.index(), id);

        if self.squads.get(&id).is_some_and(Squad::is_empty) {
            self.dissolve(id, DissolveReason::Attrition, roster);
        } else {
            self.reassign(id, None, roster);
        }
        true
    }

    pub fn update_target_cover<R: AgentRoster>(&mut self, id: SquadId, target_cover: Vec2, roster: &mut R) {
        let Some(squad) = self.squads.get_mut(&id) else { return };
        squad.target_cover = target_cover;
        self.push_rally_points(id, roster);
    }

    /// Recomputes roles from live positions and tells every member. Members
    /// missing from the roster are dropped first; a squad left with nobody is
    /// dissolved.
    fn reassign<R: AgentRoster>(&mut self, id: SquadId, newcomer: Option<Entity>, roster: &mut R) {
        let Some(squad) = self.squads.get_mut(&id) else { return };

        let stale: Vec<Entity> = squad.members.iter().copied().filter(|&m| roster.agent(m).is_none()).collect();
        for agent in stale {
            squad.remove_member(agent);
            self.membership.remove(&agent);
            self.pending.push(SquadEvent::Left { squad: id, agent });
        }
        if squad.is_empty() {
            self.dissolve(id, DissolveReason::Attrition, roster);
            return;
        }

        let positions: Vec<(Entity, Vec2)> = squad.members.iter()
            .filter_map(|&m| roster.agent(m).map(|a| (m, a.global_position())))
            .collect();
        let changed = squad.reassign_roles(&positions);
        let target_cover = squad.target_cover;

        for assignment in changed {
            let Some(body) = roster.agent_mut(assignment.agent) else { continue };
            if Some(assignment.agent) == newcomer {
                body.join_flank_squad(target_cover, assignment.role, assignment.subgroup);
            } else {
                body.update_squad_role(assignment.role, assignment.subgroup);
            }
        }
        self.push_rally_points(id, roster);
    }

    fn push_rally_points<R: AgentRoster>(&self, id: SquadId, roster: &mut R) {
        let Some(squad) = self.squads.get(&id) else { return };
        for &member in &squad.members {
            let Some(point) = squad.rally_point(member, self.config.sync_distance, self.config.supporting_offset) else { continue };
            if let Some(body) = roster.agent_mut(member) {
                body.update_flank_target(point);
            }
        }
    }

    fn dissolve<R: AgentRoster>(&mut self, id: SquadId, reason: DissolveReason, roster: &mut R) {
        let Some(squad) = self.squads.remove(&id) else { return };
        for &member in &squad.members {
            self.membership.remove(&member);
            if let Some(body) = roster.agent_mut(member) {
                body.leave_flank_squad();
            }
        }
        info!("{} dissolved ({:?}) in {:?}", id, reason, squad.phase);
        self.pending.push(SquadEvent::Dissolved { squad: id, reason, members: squad.members });
    }

    // === TICK ===

    /// One simulation frame for every squad. Returns everything that
    /// happened since the last call, including joins and leaves.
    pub fn update<R: AgentRoster>(&mut self, dt: f32, roster: &mut R) -> Vec<SquadEvent> {
        let ids: Vec<SquadId> = self.squads.keys().copied().collect();
        for id in ids {
            self.update_squad(id, dt, roster);
        }
        self.drain_events()
    }

    fn update_squad<R: AgentRoster>(&mut self, id: SquadId, dt: f32, roster: &mut R) {
        // Casualties and disengaged members leave before anything else
        let departed: Vec<Entity> = match self.squads.get(&id) {
            Some(squad) => squad.members.iter().copied()
                .filter(|&m| !roster.agent(m).is_some_and(is_eligible))
                .collect(),
            None => return,
        };
        for agent in departed {
            self.leave_squad(agent, roster);
        }

        let config = self.config.clone();
        let Some(squad) = self.squads.get_mut(&id) else { return };
        squad.phase_time += dt;

        for subgroup in [FlankDirection::Lower, FlankDirection::Upper] {
            let ready = {
                let mut members = squad.subgroup_members(subgroup).peekable();
                members.peek().is_some()
                    && members.all(|m| roster.agent(m).is_some_and(|a| a.is_at_sync_position()))
            };
            squad.set_subgroup_ready(subgroup, ready);
        }

        let any_sees_player = squad.members.iter().any(|&m| roster.agent(m).is_some_and(|a| a.can_see_player()));
        if let Some(next) = squad.next_phase(config.forming_window_secs, any_sees_player) {
            let from = squad.phase;
            squad.set_phase(next);
            let members = squad.members.clone();
            info!("{} {:?} -> {:?} ({} members)", id, from, next, members.len());
            self.pending.push(SquadEvent::PhaseChanged { squad: id, from, to: next });

            match next {
                SquadPhase::Flanking => {
                    for m in members {
                        if let Some(body) = roster.agent_mut(m) { body.begin_synchronized_flank(); }
                    }
                }
                SquadPhase::Assaulting => {
                    for m in members {
                        if let Some(body) = roster.agent_mut(m) { body.begin_coordinated_assault(); }
                    }
                }
                SquadPhase::Forming | SquadPhase::Positioning => {}
            }
            return;
        }

        let phase = squad.phase;
        match phase {
            SquadPhase::Positioning => {
                if let SyncTimeoutPolicy::Dissolve { after_secs } = config.sync_timeout {
                    if squad.phase_time >= after_secs {
                        warn!("{} stalled waiting for subgroup sync ({:.1}s)", id, squad.phase_time);
                        self.dissolve(id, DissolveReason::SyncTimeout, roster);
                    }
                }
            }
            SquadPhase::Assaulting => {
                let all_at_back = squad.members.iter().all(|&m| roster.agent(m).is_some_and(|a| a.is_at_cover_back()));
                if all_at_back || squad.phase_time >= config.assault_duration_secs {
                    self.dissolve(id, DissolveReason::AssaultComplete, roster);
                }
            }
            SquadPhase::Forming | SquadPhase::Flanking => {}
        }
    }
}
