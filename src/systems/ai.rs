// src/systems/ai.rs - GOAP planning tick and action dispatch
use bevy::prelude::*;

use crate::core::*;
use crate::systems::coordination::{AgentView, EcsRoster};

pub fn goap_planning_system(
    mut manager: ResMut<SquadManager>,
    config: Res<GoapConfig>,
    mut enemies: Query<(Entity, &Transform, &CombatBody, &mut FlankAssignment, &mut GoapAgent, &mut FlankAttempts, Has<Dead>), With<Enemy>>,
    mut action_events: EventWriter<TacticalActionEvent>,
    time: Res<Time>,
) {
    let dt = time.delta_secs();

    let mut roster: EcsRoster = enemies.iter()
        .map(|(entity, transform, body, assignment, _, _, dead)| (entity, AgentView::new(transform, body, assignment, dead)))
        .collect();
    let enemies_in_combat = roster.values()
        .filter(|view| view.is_alive() && view.get_current_state().is_engaged())
        .count() as i32;

    for (entity, transform, body, _, mut goap_agent, mut attempts, dead) in enemies.iter_mut() {
        if dead { continue; }
        attempts.tick(dt);
        goap_agent.planning_cooldown -= dt;

        let in_squad = manager.squad_of(entity).is_some();
        refresh_world_state(&mut goap_agent, body, enemies_in_combat, in_squad);

        if goap_agent.current_plan.is_empty() || goap_agent.planning_cooldown <= 0.0 {
            let context = PlanContext {
                squad_member: in_squad,
                coordinated_flank_blocked: attempts.is_blocked(),
            };
            goap_agent.planner.set_bounds(config.max_plan_depth, config.max_expanded_nodes);
            goap_agent.plan(&context);
            goap_agent.planning_cooldown = if body.state.is_engaged() {
                config.engaged_planning_interval
            } else {
                config.planning_interval
            };
        }

        let Some(action) = goap_agent.get_next_action() else { continue };
        action_events.write(TacticalActionEvent { entity, action: action.action_type, name: action.name });

        if action.action_type == ActionType::Flank {
            let side = solo_flank_side(body, transform.translation.truncate());
            if let Some(view) = roster.get_mut(&entity) {
                view.assignment.solo_side = side;
            }
            if side.is_none() {
                debug!("Enemy {} has both flank sides blocked, replanning", entity.index());
                goap_agent.abort_plan();
            }
        } else if action.action_type == ActionType::CoordinatedFlank {
            let outcome = match body.flank_target() {
                Some(target) => manager.request_flank(entity, target, &mut roster),
                None => FlankRequest::Refused(FlankRefusal::NotEligible),
            };
            if let FlankRequest::Refused(reason) = outcome {
                debug!("Enemy {} coordinated flank refused ({:?}), replanning", entity.index(), reason);
                attempts.record_failure(config.max_flank_attempts, config.flank_retry_cooldown_secs);
                goap_agent.abort_plan();
                goap_agent.planning_cooldown = 0.0;
            }
        }
    }

    for (entity, _, _, mut assignment, ..) in enemies.iter_mut() {
        if let Some(view) = roster.get(&entity) {
            assignment.set_if_neq(view.resolved(manager.squad_of(entity)));
        }
    }
}

/// Side a lone flanker takes around the player's cover. `None` without a
/// target or when perception reports both sides blocked.
fn solo_flank_side(body: &CombatBody, position: Vec2) -> Option<FlankDirection> {
    let target = body.flank_target()?;
    pick_flank_side(position, target, body.lower_flank_blocked, body.upper_flank_blocked)
}

fn refresh_world_state(goap_agent: &mut GoapAgent, body: &CombatBody, enemies_in_combat: i32, in_squad: bool) {
    goap_agent.update_multiple([
        (WorldKey::PlayerVisible, body.can_see_player),
        (WorldKey::UnderFire, body.under_fire),
        (WorldKey::CoverAvailable, body.cover_available),
        (WorldKey::InCover, body.in_cover),
        (WorldKey::AtFlankPosition, body.at_cover_back),
        (WorldKey::PlayerEngaged, body.engaging_player),
        (WorldKey::WeaponLoaded, body.weapon_loaded),
        (WorldKey::IsInjured, body.is_injured),
        (WorldKey::InSquad, in_squad),
    ]);
    goap_agent.update_world_state(WorldKey::EnemiesInCombat, enemies_in_combat);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_state_mirrors_body() {
        let mut agent = GoapAgent::default();
        let body = CombatBody { in_cover: true, under_fire: true, ..CombatBody::engaged() };
        refresh_world_state(&mut agent, &body, 3, true);

        assert_eq!(agent.world_state.get_bool(WorldKey::InCover), Some(true));
        assert_eq!(agent.world_state.get_bool(WorldKey::UnderFire), Some(true));
        assert_eq!(agent.world_state.get_bool(WorldKey::PlayerVisible), Some(false));
        assert_eq!(agent.world_state.get_bool(WorldKey::InSquad), Some(true));
        assert_eq!(agent.world_state.get_int(WorldKey::EnemiesInCombat), Some(3));
    }

    #[test]
    fn solo_flank_side_follows_blocked_sides() {
        let target = Vec2::new(0.0, 100.0);
        let body = CombatBody { player_cover: Some(target), ..CombatBody::engaged() };
        assert_eq!(solo_flank_side(&body, Vec2::new(0.0, 200.0)), Some(FlankDirection::Lower));
        assert_eq!(solo_flank_side(&body, Vec2::new(0.0, 0.0)), Some(FlankDirection::Upper));

        let lower_blocked = CombatBody { lower_flank_blocked: true, ..body.clone() };
        assert_eq!(solo_flank_side(&lower_blocked, Vec2::new(0.0, 200.0)), Some(FlankDirection::Upper));

        let boxed_in = CombatBody { upper_flank_blocked: true, ..lower_blocked };
        assert_eq!(solo_flank_side(&boxed_in, Vec2::new(0.0, 200.0)), None);
        assert_eq!(solo_flank_side(&CombatBody::engaged(), Vec2::ZERO), None);
    }

    #[test]
    fn hidden_player_in_cover_plans_coordinated_flank() {
        let mut agent = GoapAgent::default();
        let body = CombatBody { in_cover: true, ..CombatBody::engaged() };
        refresh_world_state(&mut agent, &body, 3, false);

        assert!(agent.plan(&PlanContext::default()));
        assert_eq!(agent.current_goal.as_ref().map(|g| g.name), Some("engage_player"));
        assert_eq!(agent.get_next_action().map(|a| a.action_type), Some(ActionType::CoordinatedFlank));
    }
}
