// Headless skirmish: four enemies hold cover, lose sight of the player and
// run a coordinated flank. One of them is killed mid-maneuver.
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

use tactical_goap::{
    spawn_enemy, squad_casualty_system, CombatBody, CombatState, Dead, Enemy, FlankAssignment,
    SquadEvent, SquadManager, TacticsPlugin,
};

const FRAME_TIME: Duration = Duration::from_millis(50);
const MAX_FRAMES: u32 = 600;
const ENEMY_SPEED: f32 = 120.0;
const COVER_DEPTH: f32 = 60.0;
const PLAYER_COVER: Vec2 = Vec2::new(400.0, 275.0);

#[derive(Resource)]
struct ScriptedCasualty {
    victim: Option<Entity>,
    at_frame: u32,
}

#[derive(Resource, Default)]
struct FrameCount(u32);

fn main() {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()))
        .add_plugins(TacticsPlugin::default())
        .insert_resource(TimeUpdateStrategy::ManualDuration(FRAME_TIME))
        .insert_resource(ScriptedCasualty { victim: None, at_frame: 40 })
        .init_resource::<FrameCount>()
        .add_systems(Startup, setup_skirmish)
        .add_systems(Update, (
            scripted_casualty_system,
            skirmish_movement_system,
            squad_event_log_system,
        ).before(squad_casualty_system));

    for _ in 0..MAX_FRAMES {
        app.update();
    }

    let manager = app.world().resource::<SquadManager>();
    info!("Skirmish over, {} squads still active", manager.active_squads().count());
}

fn setup_skirmish(mut commands: Commands, mut casualty: ResMut<ScriptedCasualty>) {
    let mut spawned = Vec::new();
    for y in [500.0, 300.0, 150.0, 50.0] {
        let body = CombatBody {
            state: CombatState::InCover,
            in_cover: true,
            cover_available: true,
            player_cover: Some(PLAYER_COVER),
            ..CombatBody::engaged()
        };
        spawned.push(spawn_enemy(&mut commands, Vec2::new(0.0, y), body));
    }
    casualty.victim = spawned.first().copied();
    info!("Spawned {} enemies around player cover ({:.0}, {:.0})", spawned.len(), PLAYER_COVER.x, PLAYER_COVER.y);
}

fn scripted_casualty_system(
    mut commands: Commands,
    mut frame: ResMut<FrameCount>,
    casualty: Res<ScriptedCasualty>,
) {
    frame.0 += 1;
    if frame.0 != casualty.at_frame { return; }
    if let Some(victim) = casualty.victim {
        info!("Enemy {} goes down", victim.index());
        commands.entity(victim).insert(Dead);
    }
}

fn skirmish_movement_system(
    mut enemies: Query<(&mut Transform, &mut CombatBody, &FlankAssignment), (With<Enemy>, Without<Dead>)>,
    time: Res<Time>,
) {
    let step = ENEMY_SPEED * time.delta_secs();

    for (mut transform, mut body, assignment) in enemies.iter_mut() {
        let Some(cover) = assignment.target_cover else { continue };
        body.state = CombatState::Flanking;
        body.in_cover = false;

        let goal = if assignment.synchronized_flank {
            cover + Vec2::new(COVER_DEPTH, 0.0)
        } else {
            assignment.flank_target.unwrap_or(cover)
        };
        let next = transform.translation.truncate().move_towards(goal, step);
        transform.translation = next.extend(transform.translation.z);

        let arrived = next.distance(goal) < 1.0;
        body.at_sync_position = !assignment.synchronized_flank && arrived;
        body.at_cover_back = assignment.synchronized_flank && arrived;
        body.can_see_player = assignment.synchronized_flank && next.distance(cover) < 150.0;
        body.engaging_player |= assignment.assaulting;
    }
}

fn squad_event_log_system(mut events: EventReader<SquadEvent>) {
    for event in events.read() {
        match event {
            SquadEvent::Dissolved { squad, reason, members } => {
                info!("{} dissolved ({:?}) with {} members", squad, reason, members.len());
            }
            other => debug!("{:?}", other),
        }
    }
}
