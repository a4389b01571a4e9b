// src/core/mod.rs - Decision core: world state, planner, squads
pub mod world_state;
pub mod error;
pub mod goap;
pub mod planner;
pub mod squad;
pub mod squad_manager;
pub mod components;
pub mod events;
pub mod goap_config;

pub use world_state::*;
pub use error::TacticsError;
pub use goap::*;
pub use planner::*;
pub use squad::*;
pub use squad_manager::*;
pub use components::*;
pub use events::*;
pub use goap_config::*;
