// src/core/planner.rs - Uniform-cost search over world states
use bevy::prelude::*;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use crate::core::error::{Result, TacticsError};
use crate::core::goap::{GoapAction, PlanContext};
use crate::core::world_state::WorldState;

pub const DEFAULT_MAX_PLAN_DEPTH: usize = 6;
pub const DEFAULT_MAX_EXPANDED_NODES: usize = 256;

/// What `Planner::outcome` found. `plan` collapses the first and last
/// variants into an empty list.
#[derive(Debug, Clone)]
pub enum PlanOutcome {
    AlreadySatisfied,
    Found(Vec<GoapAction>),
    Unreachable,
}

impl PlanOutcome {
    pub fn into_plan(self) -> Vec<GoapAction> {
        match self {
            PlanOutcome::Found(plan) => plan,
            PlanOutcome::AlreadySatisfied | PlanOutcome::Unreachable => Vec::new(),
        }
    }
}

struct SearchNode {
    cost: f32,
    seq: u64,
    state: WorldState,
    steps: Vec<usize>,
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchNode {}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior; older nodes win ties
        other.cost.total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// The action catalog of one agent plus the bounds its searches run under.
/// Planning borrows `&self` only, so one planner can serve many threads.
#[derive(Debug, Clone)]
pub struct Planner {
    actions: Vec<GoapAction>,
    max_depth: usize,
    max_expanded: usize,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

impl Planner {
    pub fn new() -> Self {
        Self::with_bounds(DEFAULT_MAX_PLAN_DEPTH, DEFAULT_MAX_EXPANDED_NODES)
    }

    pub fn with_bounds(max_depth: usize, max_expanded: usize) -> Self {
        Self { actions: Vec::new(), max_depth, max_expanded }
    }

    /// Registers every valid action, logging and skipping the rest.
    pub fn with_catalog(actions: impl IntoIterator<Item = GoapAction>) -> Self {
        let mut planner = Self::new();
        planner.extend(actions);
        planner
    }

    pub fn extend(&mut self, actions: impl IntoIterator<Item = GoapAction>) {
        for action in actions {
            if let Err(e) = self.add_action(action) {
                warn!("Skipping GOAP action: {}", e);
            }
        }
    }

    pub fn set_bounds(&mut self, max_depth: usize, max_expanded: usize) {
        self.max_depth = max_depth;
        self.max_expanded = max_expanded;
    }

    pub fn add_action(&mut self, action: GoapAction) -> Result<()> {
        if action.effects.is_empty() {
            return Err(TacticsError::EmptyEffects(action.name));
        }
        if self.actions.iter().any(|a| a.name == action.name) {
            return Err(TacticsError::DuplicateAction(action.name));
        }
        self.actions.push(action);
        Ok(())
    }

    pub fn actions(&self) -> &[GoapAction] {
        &self.actions
    }

    pub fn plan(&self, state: &WorldState, goal: &WorldState) -> Vec<GoapAction> {
        self.plan_with_context(state, goal, &PlanContext::default())
    }

    /// Minimal-cost action sequence from `state` to `goal`. Empty both when
    /// the goal already holds and when it cannot be reached in bounds.
    pub fn plan_with_context(&self, state: &WorldState, goal: &WorldState, context: &PlanContext) -> Vec<GoapAction> {
        self.outcome(state, goal, context).into_plan()
    }

    pub fn outcome(&self, state: &WorldState, goal: &WorldState, context: &PlanContext) -> PlanOutcome {
        if state.satisfies(goal) {
            return PlanOutcome::AlreadySatisfied;
        }

        let mut frontier = BinaryHeap::new();
        let mut closed: HashSet<WorldState> = HashSet::new();
        let mut seq = 0u64;
        let mut expanded = 0usize;

        frontier.push(SearchNode { cost: 0.0, seq, state: state.clone(), steps: Vec::new() });

        while let Some(node) = frontier.pop() {
            if node.state.satisfies(goal) {
                let plan: Vec<GoapAction> = node.steps.iter().map(|&i| self.actions[i].clone()).collect();
                debug!(
                    "GOAP plan for {} ({} unmet): [{}] cost {:.2}, {} nodes expanded",
                    goal, state.unsatisfied_count(goal),
                    plan.iter().map(|a| a.name).collect::<Vec<_>>().join(", "),
                    node.cost, expanded,
                );
                return PlanOutcome::Found(plan);
            }

            if !closed.insert(node.state.clone()) {
                continue;
            }
            if expanded >= self.max_expanded {
                warn!("GOAP search for {} hit the {} node bound", goal, self.max_expanded);
                return PlanOutcome::Unreachable;
            }
            expanded += 1;

            if node.steps.len() >= self.max_depth {
                continue;
            }

            for (index, action) in self.actions.iter().enumerate() {
                if !action.is_applicable(&node.state) {
                    continue;
                }
                let Some(step_cost) = action.effective_cost(context, &node.state) else {
                    continue;
                };
                let next = action.apply(&node.state);
                if closed.contains(&next) {
                    continue;
                }

                seq += 1;
                let mut steps = node.steps.clone();
                steps.push(index);
                frontier.push(SearchNode { cost: node.cost + step_cost, seq, state: next, steps });
            }
        }

        debug!("GOAP goal {} unreachable after {} nodes", goal, expanded);
        PlanOutcome::Unreachable
    }
}
