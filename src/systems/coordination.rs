// src/systems/coordination.rs - Squad manager glue: roster snapshots, phase tick, casualties
use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::core::*;

/// Frame-local copy of one enemy as the squad manager sees it. Commands land
/// in `assignment` and are written back to the component afterwards.
#[derive(Debug, Clone)]
pub struct AgentView {
    pub position: Vec2,
    pub alive: bool,
    pub body: CombatBody,
    pub assignment: FlankAssignment,
}

pub type EcsRoster = HashMap<Entity, AgentView>;

impl AgentView {
    pub fn new(transform: &Transform, body: &CombatBody, assignment: &FlankAssignment, dead: bool) -> Self {
        Self {
            position: transform.translation.truncate(),
            alive: !dead,
            body: body.clone(),
            assignment: assignment.clone(),
        }
    }

    /// What the component should hold after this frame.
    pub fn resolved(&self, squad: Option<SquadId>) -> FlankAssignment {
        FlankAssignment { squad, ..self.assignment.clone() }
    }
}

impl FlankAgent for AgentView {
    fn get_current_state(&self) -> CombatState { self.body.state }
    fn is_alive(&self) -> bool { self.alive }
    fn can_see_player(&self) -> bool { self.body.can_see_player }
    fn is_at_sync_position(&self) -> bool { self.body.at_sync_position }
    fn is_at_cover_back(&self) -> bool { self.body.at_cover_back }
    fn global_position(&self) -> Vec2 { self.position }

    fn join_flank_squad(&mut self, cover: Vec2, role: TacticalRole, subgroup: FlankDirection) {
        self.assignment.join_flank_squad(cover, role, subgroup);
    }

    fn leave_flank_squad(&mut self) {
        self.assignment.leave_flank_squad();
    }

    fn update_flank_target(&mut self, pos: Vec2) {
        self.assignment.update_flank_target(pos);
    }

    fn update_squad_role(&mut self, role: TacticalRole, subgroup: FlankDirection) {
        self.assignment.update_squad_role(role, subgroup);
    }

    fn begin_synchronized_flank(&mut self) {
        self.assignment.synchronized_flank = true;
    }

    fn begin_coordinated_assault(&mut self) {
        self.assignment.assaulting = true;
    }
}

pub fn squad_coordination_system(
    mut manager: ResMut<SquadManager>,
    config: Res<GoapConfig>,
    mut enemies: Query<(Entity, &Transform, &CombatBody, &mut FlankAssignment, &mut FlankAttempts, Has<Dead>), With<Enemy>>,
    mut squad_events: EventWriter<SquadEvent>,
    time: Res<Time>,
) {
    let mut roster: EcsRoster = enemies.iter()
        .map(|(entity, transform, body, assignment, _, dead)| (entity, AgentView::new(transform, body, assignment, dead)))
        .collect();

    let events = manager.update(time.delta_secs(), &mut roster);

    let timed_out: HashSet<Entity> = events.iter()
        .filter_map(|event| match event {
            SquadEvent::Dissolved { reason: DissolveReason::SyncTimeout, members, .. } => Some(members.iter().copied()),
            _ => None,
        })
        .flatten()
        .collect();

    for (entity, _, _, mut assignment, mut attempts, _) in enemies.iter_mut() {
        if let Some(view) = roster.get(&entity) {
            assignment.set_if_neq(view.resolved(manager.squad_of(entity)));
        }
        if timed_out.contains(&entity) {
            attempts.record_failure(config.max_flank_attempts, config.flank_retry_cooldown_secs);
        }
    }

    squad_events.write_batch(events);
}

/// Pulls dead or despawned enemies out of their squads the frame it happens,
/// so roles are recomputed before anyone plans.
pub fn squad_casualty_system(
    mut manager: ResMut<SquadManager>,
    newly_dead: Query<Entity, (With<Enemy>, Added<Dead>)>,
    mut removed: RemovedComponents<Enemy>,
    mut enemies: Query<(Entity, &Transform, &CombatBody, &mut FlankAssignment, Has<Dead>), With<Enemy>>,
) {
    let mut lost: Vec<Entity> = newly_dead.iter().chain(removed.read()).collect();
    lost.retain(|&entity| manager.squad_of(entity).is_some());
    if lost.is_empty() {
        return;
    }
    lost.sort();
    lost.dedup();

    let mut roster: EcsRoster = enemies.iter()
        .map(|(entity, transform, body, assignment, dead)| (entity, AgentView::new(transform, body, assignment, dead)))
        .collect();

    for entity in lost {
        info!("Enemy {} lost from {:?}", entity.index(), manager.squad_of(entity));
        manager.leave_squad(entity, &mut roster);
    }

    for (entity, _, _, mut assignment, _) in enemies.iter_mut() {
        if let Some(view) = roster.get(&entity) {
            assignment.set_if_neq(view.resolved(manager.squad_of(entity)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_commands_land_in_assignment() {
        let mut view = AgentView::new(
            &Transform::from_xyz(10.0, 20.0, 0.0),
            &CombatBody::engaged(),
            &FlankAssignment::default(),
            false,
        );
        assert_eq!(view.global_position(), Vec2::new(10.0, 20.0));
        assert!(view.get_current_state().is_engaged());

        view.join_flank_squad(Vec2::ZERO, TacticalRole::Supporting, FlankDirection::Lower);
        view.begin_synchronized_flank();
        let resolved = view.resolved(Some(SquadId(7)));
        assert_eq!(resolved.squad, Some(SquadId(7)));
        assert_eq!(resolved.role, TacticalRole::Supporting);
        assert!(resolved.synchronized_flank);

        view.leave_flank_squad();
        assert_eq!(view.resolved(None), FlankAssignment::default());
    }

    #[test]
    fn dead_view_is_not_alive() {
        let view = AgentView::new(&Transform::default(), &CombatBody::engaged(), &FlankAssignment::default(), true);
        assert!(!view.is_alive());
    }
}
