pub mod core;
pub mod systems;

pub use crate::core::*;
pub use systems::*;

use bevy::prelude::*;

/// Registers the planner and squad resources, events and systems.
#[derive(Default)]
pub struct TacticsPlugin {
    /// Uses `data/config/goap.ron` (or defaults) when unset.
    pub config: Option<GoapConfig>,
}

impl TacticsPlugin {
    pub fn with_config(config: GoapConfig) -> Self {
        Self { config: Some(config) }
    }
}

impl Plugin for TacticsPlugin {
    fn build(&self, app: &mut App) {
        let config = self.config.clone().unwrap_or_else(GoapConfig::load);

        app.insert_resource(SquadManager::new(config.squad.clone()))
            .insert_resource(config)
            .add_event::<TacticalActionEvent>()
            .add_event::<SquadEvent>()
            .add_systems(Update, (
                squad_casualty_system,
                goap_planning_system,
                squad_coordination_system,
            ).chain());
    }
}
