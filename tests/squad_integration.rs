use bevy::prelude::*;
use tactical_goap::{
    AgentView, CombatBody, CombatState, DissolveReason, EcsRoster, FlankAgent, FlankAssignment,
    FlankDirection, FlankRefusal, FlankRequest, SquadConfig, SquadEvent, SquadManager, SquadPhase,
    SyncTimeoutPolicy, TacticalRole,
};

const COVER: Vec2 = Vec2::new(400.0, 275.0);

fn view(y: f32) -> AgentView {
    AgentView::new(
        &Transform::from_xyz(0.0, y, 0.0),
        &CombatBody { state: CombatState::InCover, in_cover: true, ..CombatBody::engaged() },
        &FlankAssignment::default(),
        false,
    )
}

fn roster(ys: &[f32]) -> (EcsRoster, Vec<Entity>) {
    let ids: Vec<Entity> = (1..=ys.len() as u32).map(Entity::from_raw).collect();
    (ids.iter().zip(ys).map(|(&id, &y)| (id, view(y))).collect(), ids)
}

fn form(manager: &mut SquadManager, roster: &mut EcsRoster, ids: &[Entity]) -> tactical_goap::SquadId {
    let id = manager.request_flank(ids[0], COVER, roster).squad().expect("squad formed");
    for &agent in &ids[1..] {
        assert_eq!(manager.request_flank(agent, COVER, roster), FlankRequest::Joined(id));
    }
    id
}

fn roles(roster: &EcsRoster, ids: &[Entity]) -> Vec<(TacticalRole, FlankDirection)> {
    ids.iter().map(|id| (roster[id].assignment.role, roster[id].assignment.subgroup)).collect()
}

#[test]
fn four_agents_get_roles_by_descending_y() {
    let mut manager = SquadManager::default();
    let (mut agents, ids) = roster(&[500.0, 300.0, 150.0, 50.0]);
    form(&mut manager, &mut agents, &ids);

    assert_eq!(roles(&agents, &ids), vec![
        (TacticalRole::LeadAttacker, FlankDirection::Lower),
        (TacticalRole::Supporting, FlankDirection::Lower),
        (TacticalRole::UpperSupporting, FlankDirection::Upper),
        (TacticalRole::UpperLeadAttacker, FlankDirection::Upper),
    ]);
    assert!(ids.iter().all(|id| agents[id].assignment.target_cover == Some(COVER)));
}

#[test]
fn lead_loss_promotes_remaining_members() {
    let mut manager = SquadManager::default();
    let (mut agents, ids) = roster(&[500.0, 300.0, 150.0, 50.0]);
    let squad = form(&mut manager, &mut agents, &ids);

    agents.get_mut(&ids[0]).unwrap().alive = false;
    manager.update(0.05, &mut agents);

    assert_eq!(manager.squad(squad).map(|s| s.len()), Some(3));
    assert_eq!(roles(&agents, &ids[1..]), vec![
        (TacticalRole::LeadAttacker, FlankDirection::Lower),
        (TacticalRole::Supporting, FlankDirection::Lower),
        (TacticalRole::UpperLeadAttacker, FlankDirection::Upper),
    ]);
    assert_eq!(agents[&ids[0]].assignment, FlankAssignment::default());
}

#[test]
fn despawned_member_is_dropped_on_reassignment() {
    let mut manager = SquadManager::default();
    let (mut agents, ids) = roster(&[500.0, 300.0, 150.0]);
    let squad = form(&mut manager, &mut agents, &ids);

    agents.remove(&ids[2]);
    let events = manager.update(0.05, &mut agents);

    assert!(events.contains(&SquadEvent::Left { squad, agent: ids[2] }));
    assert_eq!(manager.squad_of(ids[2]), None);
    assert_eq!(manager.squad(squad).map(|s| s.len()), Some(2));
}

#[test]
fn fifth_request_is_refused_and_squad_unchanged() {
    let mut manager = SquadManager::default();
    let (mut agents, ids) = roster(&[500.0, 300.0, 150.0, 50.0, 250.0]);
    let squad = form(&mut manager, &mut agents, &ids[..4]);

    assert_eq!(manager.request_flank(ids[4], COVER, &mut agents), FlankRequest::Refused(FlankRefusal::SquadFull));
    assert!(!manager.join_squad(squad, ids[4], &mut agents));
    assert_eq!(manager.squad(squad).map(|s| s.len()), Some(4));
    assert_eq!(manager.role_of(ids[4]), TacticalRole::None);
}

#[test]
fn flanking_waits_for_both_subgroups() {
    let config = SquadConfig { sync_timeout: SyncTimeoutPolicy::WaitForever, ..Default::default() };
    let mut manager = SquadManager::new(config);
    let (mut agents, ids) = roster(&[500.0, 300.0, 150.0, 50.0]);
    let squad = form(&mut manager, &mut agents, &ids);

    manager.update(0.05, &mut agents);
    assert_eq!(manager.squad(squad).unwrap().phase, SquadPhase::Positioning);

    for id in &ids[2..] {
        agents.get_mut(id).unwrap().body.at_sync_position = true;
    }
    for _ in 0..100 {
        manager.update(0.05, &mut agents);
    }
    assert_eq!(manager.squad(squad).unwrap().phase, SquadPhase::Positioning);
    assert!(manager.subgroup_ready(squad, FlankDirection::Upper));
    assert!(!manager.subgroup_ready(squad, FlankDirection::Lower));

    for id in &ids[..2] {
        agents.get_mut(id).unwrap().body.at_sync_position = true;
    }
    let events = manager.update(0.05, &mut agents);
    assert!(events.contains(&SquadEvent::PhaseChanged { squad, from: SquadPhase::Positioning, to: SquadPhase::Flanking }));
    assert!(ids.iter().all(|id| agents[id].assignment.synchronized_flank));
}

#[test]
fn stalled_barrier_dissolves_after_timeout() {
    let config = SquadConfig { sync_timeout: SyncTimeoutPolicy::Dissolve { after_secs: 1.0 }, ..Default::default() };
    let mut manager = SquadManager::new(config);
    let (mut agents, ids) = roster(&[500.0, 300.0, 150.0]);
    let squad = form(&mut manager, &mut agents, &ids);

    let events: Vec<SquadEvent> = (0..30).flat_map(|_| manager.update(0.05, &mut agents)).collect();
    let dissolved = events.iter().find_map(|event| match event {
        SquadEvent::Dissolved { squad: id, reason, members } if *id == squad => Some((*reason, members.len())),
        _ => None,
    });
    assert_eq!(dissolved, Some((DissolveReason::SyncTimeout, 3)));
    assert!(manager.active_squads().next().is_none());
    assert!(ids.iter().all(|id| !agents[id].assignment.is_active()));
}

#[test]
fn leaving_twice_is_harmless() {
    let mut manager = SquadManager::default();
    let (mut agents, ids) = roster(&[300.0, 200.0, 100.0]);
    let squad = form(&mut manager, &mut agents, &ids);

    assert!(manager.leave_squad(ids[1], &mut agents));
    assert!(!manager.leave_squad(ids[1], &mut agents));
    assert_eq!(manager.squad(squad).map(|s| s.len()), Some(2));
    assert_eq!(manager.rally_point_for(ids[1]), None);
}

#[test]
fn emptied_squad_is_dissolved_not_advanced() {
    let mut manager = SquadManager::default();
    let (mut agents, ids) = roster(&[300.0, 200.0]);
    let squad = form(&mut manager, &mut agents, &ids);

    for agent in agents.values_mut() {
        agent.alive = false;
    }
    let events = manager.update(5.0, &mut agents);

    assert!(manager.squad(squad).is_none());
    assert!(!events.iter().any(|e| matches!(e, SquadEvent::PhaseChanged { .. })));
    assert!(events.iter().any(|e| matches!(e, SquadEvent::Dissolved { reason: DissolveReason::Attrition, .. })));
}

#[test]
fn assault_ends_when_everyone_reaches_cover_back() {
    let mut manager = SquadManager::default();
    let (mut agents, ids) = roster(&[300.0, 200.0]);
    let squad = form(&mut manager, &mut agents, &ids);
    manager.update(0.05, &mut agents);
    manager.update(0.05, &mut agents);
    assert_eq!(manager.squad(squad).unwrap().phase, SquadPhase::Flanking);

    agents.get_mut(&ids[0]).unwrap().body.can_see_player = true;
    manager.update(0.05, &mut agents);
    assert!(ids.iter().all(|id| agents[id].assignment.assaulting));

    for agent in agents.values_mut() {
        agent.body.at_cover_back = true;
    }
    manager.update(0.05, &mut agents);
    assert!(manager.squad(squad).is_none());
    assert!(agents.values().all(|a| a.get_current_state().is_engaged()));
}

#[test]
fn squad_losing_several_bodies_at_once_is_dissolved() {
    let mut manager = SquadManager::default();
    let (mut agents, ids) = roster(&[500.0, 300.0, 150.0, 50.0]);
    let squad = form(&mut manager, &mut agents, &ids);
    manager.update(0.05, &mut agents);
    manager.drain_events();

    agents.remove(&ids[1]);
    agents.remove(&ids[2]);
    agents.remove(&ids[3]);
    agents.get_mut(&ids[0]).unwrap().alive = false;
    let events = manager.update(0.05, &mut agents);

    assert!(manager.squad(squad).is_none());
    assert!(ids.iter().all(|&id| manager.squad_of(id).is_none()));
    assert!(events.iter().any(|e| matches!(e, SquadEvent::Dissolved { squad: id, reason: DissolveReason::Attrition, .. } if *id == squad)));
    assert_eq!(agents[&ids[0]].assignment, FlankAssignment::default());
}
