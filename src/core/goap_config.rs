// src/core/goap_config.rs - Planning and squad tuning
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::Result;
use crate::core::planner::{DEFAULT_MAX_EXPANDED_NODES, DEFAULT_MAX_PLAN_DEPTH};
use crate::core::squad::{MAX_SQUAD_SIZE, SUPPORTING_OFFSET, SYNC_DISTANCE};

pub const CONFIG_PATH: &str = "data/config/goap.ron";

#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoapConfig {
    pub planning_interval: f32,
    pub engaged_planning_interval: f32,
    pub max_plan_depth: usize,
    pub max_expanded_nodes: usize,
    pub max_flank_attempts: u32,
    pub flank_retry_cooldown_secs: f32,
    pub squad: SquadConfig,
}

/// What to do with a squad whose subgroups never both reach their rally points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SyncTimeoutPolicy {
    WaitForever,
    Dissolve { after_secs: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadConfig {
    pub max_squad_size: usize,
    pub sync_distance: f32,
    pub supporting_offset: f32,
    pub join_radius: f32,
    pub recruit_radius: f32,
    pub forming_window_secs: f32,
    pub sync_timeout: SyncTimeoutPolicy,
    pub assault_duration_secs: f32,
}

impl Default for GoapConfig {
    fn default() -> Self {
        Self {
            planning_interval: 2.0,
            engaged_planning_interval: 0.5,
            max_plan_depth: DEFAULT_MAX_PLAN_DEPTH,
            max_expanded_nodes: DEFAULT_MAX_EXPANDED_NODES,
            max_flank_attempts: 3,
            flank_retry_cooldown_secs: 10.0,
            squad: SquadConfig::default(),
        }
    }
}

impl Default for SquadConfig {
    fn default() -> Self {
        Self {
            max_squad_size: MAX_SQUAD_SIZE,
            sync_distance: SYNC_DISTANCE,
            supporting_offset: SUPPORTING_OFFSET,
            join_radius: 400.0,
            recruit_radius: 300.0,
            forming_window_secs: 1.5,
            sync_timeout: SyncTimeoutPolicy::Dissolve { after_secs: 8.0 },
            assault_duration_secs: 6.0,
        }
    }
}

impl SquadConfig {
    /// Configured size, never above the hard cap.
    pub fn size_cap(&self) -> usize {
        self.max_squad_size.clamp(1, MAX_SQUAD_SIZE)
    }
}

impl GoapConfig {
    /// Loads `data/config/goap.ron`, falling back to defaults.
    pub fn load() -> Self {
        if !Path::new(CONFIG_PATH).exists() {
            return Self::default();
        }
        Self::load_from(CONFIG_PATH)
            .map_err(|e| error!("Failed to load GOAP config: {}", e))
            .unwrap_or_default()
    }

    /// Parses RON, or JSON when the path ends in `.json`.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else {
            ron::from_str(&content)?
        };
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_ron_keeps_defaults() {
        let config: GoapConfig = ron::from_str("(max_flank_attempts: 5, squad: (join_radius: 250.0))").unwrap();
        assert_eq!(config.max_flank_attempts, 5);
        assert_eq!(config.squad.join_radius, 250.0);
        assert_eq!(config.squad.sync_distance, SYNC_DISTANCE);
        assert_eq!(config.max_plan_depth, DEFAULT_MAX_PLAN_DEPTH);
    }

    #[test]
    fn sync_policy_parses() {
        let config: SquadConfig = ron::from_str("(sync_timeout: WaitForever)").unwrap();
        assert_eq!(config.sync_timeout, SyncTimeoutPolicy::WaitForever);
        let config: SquadConfig = ron::from_str("(sync_timeout: Dissolve(after_secs: 3.0))").unwrap();
        assert_eq!(config.sync_timeout, SyncTimeoutPolicy::Dissolve { after_secs: 3.0 });
    }

    #[test]
    fn size_cap_never_exceeds_four() {
        let config = SquadConfig { max_squad_size: 9, ..default() };
        assert_eq!(config.size_cap(), MAX_SQUAD_SIZE);
    }

    #[test]
    fn json_config_by_extension() {
        let dir = std::env::temp_dir().join("tactical_goap_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("goap.json");
        std::fs::write(&path, r#"{ "planning_interval": 1.0 }"#).unwrap();

        let config = GoapConfig::load_from(&path).unwrap();
        assert_eq!(config.planning_interval, 1.0);
        assert!(GoapConfig::load_from(dir.join("missing.ron")).is_err());
    }
}
