// src/core/goap.rs - Actions, goals and the per-enemy GOAP agent
use bevy::prelude::*;
use std::collections::VecDeque;

use crate::core::planner::Planner;
use crate::core::world_state::{WorldKey, WorldState};
use crate::world_state;

// === CORE TYPES ===
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    CoordinatedFlank,
    Flank,
    TakeCover,
    PeekAndEngage,
    AdvanceOnPlayer,
    Suppress,
    Reload,
    Retreat,
    SearchForPlayer,
}

/// How an action prices itself against the state it is applied to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CostModel {
    Static,
    /// Cheap when enough allies are fighting to form a squad, expensive solo.
    SquadScaled { squad_cost: f32, solo_cost: f32, min_allies: i32 },
}

/// Dynamic signals that are not part of the symbolic world state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanContext {
    pub squad_member: bool,
    /// Set once an agent has exhausted its coordinated flank attempts.
    pub coordinated_flank_blocked: bool,
}

#[derive(Debug, Clone)]
pub struct GoapAction {
    pub name: &'static str,
    pub cost: f32,
    pub preconditions: WorldState,
    pub effects: WorldState,
    pub action_type: ActionType,
    pub cost_model: CostModel,
}

impl GoapAction {
    pub fn new(name: &'static str, cost: f32, preconditions: WorldState, effects: WorldState, action_type: ActionType) -> Self {
        Self { name, cost, preconditions, effects, action_type, cost_model: CostModel::Static }
    }

    pub fn with_cost_model(mut self, cost_model: CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    /// Needs the squad halves to be useful: the agent must be hidden from the
    /// player and holding cover before the squad moves around it.
    pub fn coordinated_flank() -> Self {
        GoapAction::new(
            "coordinated_flank",
            2.0,
            world_state![WorldKey::PlayerVisible => false, WorldKey::InCover => true],
            world_state![WorldKey::PlayerEngaged => true, WorldKey::AtFlankPosition => true],
            ActionType::CoordinatedFlank,
        )
        .with_cost_model(CostModel::SquadScaled { squad_cost: 1.5, solo_cost: 4.0, min_allies: 2 })
    }

    pub fn is_applicable(&self, state: &WorldState) -> bool {
        state.satisfies(&self.preconditions)
    }

    pub fn apply(&self, state: &WorldState) -> WorldState {
        state.apply(&self.effects)
    }

    /// Raw cost for this state, before any guarding.
    pub fn get_cost(&self, context: &PlanContext, state: &WorldState) -> f32 {
        match self.cost_model {
            CostModel::Static => self.cost,
            CostModel::SquadScaled { squad_cost, solo_cost, min_allies } => {
                let in_combat = state.get_int(WorldKey::EnemiesInCombat).unwrap_or(0);
                if context.squad_member || in_combat >= min_allies { squad_cost } else { solo_cost }
            }
        }
    }

    /// Cost the planner orders by. `None` means the action cannot be taken
    /// right now; non-finite and negative costs never reach the frontier.
    pub fn effective_cost(&self, context: &PlanContext, state: &WorldState) -> Option<f32> {
        if context.coordinated_flank_blocked && self.action_type == ActionType::CoordinatedFlank {
            return None;
        }
        let cost = self.get_cost(context, state);
        (cost.is_finite() && cost >= 0.0).then_some(cost)
    }
}

#[derive(Debug, Clone)]
pub struct Goal {
    pub name: &'static str,
    pub priority: f32,
    pub desired_state: WorldState,
}

// === AGENT ===
#[derive(Component)]
pub struct GoapAgent {
    pub planner: Planner,
    pub goals: Vec<Goal>,
    pub world_state: WorldState,
    pub current_plan: VecDeque<GoapAction>,
    pub current_goal: Option<Goal>,
    pub planning_cooldown: f32,
}

impl Default for GoapAgent {
    fn default() -> Self {
        Self::new(Planner::with_catalog(create_action_library()), create_goal_library())
    }
}

impl GoapAgent {
    pub fn new(planner: Planner, goals: Vec<Goal>) -> Self {
        let mut agent = Self {
            planner,
            goals,
            world_state: WorldState::new(),
            current_plan: VecDeque::new(),
            current_goal: None,
            planning_cooldown: 0.0,
        };
        agent.setup_initial_world_state();
        agent
    }

    fn setup_initial_world_state(&mut self) {
        self.world_state = world_state![
            WorldKey::PlayerVisible => false, WorldKey::UnderFire => false, WorldKey::CoverAvailable => false,
            WorldKey::InCover => false, WorldKey::AtFlankPosition => false, WorldKey::AtSafeDistance => false,
            WorldKey::EnemiesInCombat => 0, WorldKey::InSquad => false,
            WorldKey::PlayerEngaged => false, WorldKey::PlayerSuppressed => false,
            WorldKey::HasWeapon => true, WorldKey::WeaponLoaded => true, WorldKey::IsInjured => false,
        ];
    }

    pub fn update_world_state(&mut self, key: WorldKey, value: impl Into<crate::core::world_state::FactValue>) {
        self.world_state.set(key, value);
    }

    pub fn update_multiple(&mut self, updates: impl IntoIterator<Item = (WorldKey, bool)>) {
        for (key, value) in updates {
            self.update_world_state(key, value);
        }
    }

    pub fn is_goal_satisfied(&self, desired_state: &WorldState) -> bool {
        self.world_state.satisfies(desired_state)
    }

    /// Plans for the highest-priority unsatisfied goal that has a plan.
    /// Returns false when nothing needs doing or nothing is reachable.
    pub fn plan(&mut self, context: &PlanContext) -> bool {
        let mut candidates: Vec<&Goal> = self.goals.iter()
            .filter(|g| !self.is_goal_satisfied(&g.desired_state))
            .collect();
        candidates.sort_by(|a, b| b.priority.total_cmp(&a.priority));

        for goal in candidates {
            let plan = self.planner.plan_with_context(&self.world_state, &goal.desired_state, context);
            if !plan.is_empty() {
                self.current_goal = Some(goal.clone());
                self.current_plan = plan.into();
                return true;
            }
        }

        self.current_goal = None;
        self.current_plan.clear();
        false
    }

    pub fn get_next_action(&mut self) -> Option<GoapAction> {
        self.current_plan.pop_front()
    }

    pub fn abort_plan(&mut self) {
        self.current_plan.clear();
        self.current_goal = None;
    }
}

// === EXTERNAL DATA ===
pub fn create_action_library() -> Vec<GoapAction> {
    include!("../data/goap_actions.rs")
}

pub fn create_goal_library() -> Vec<Goal> {
    include!("../data/goap_goals.rs")
}
