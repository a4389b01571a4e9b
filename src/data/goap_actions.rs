// src/data/goap_actions.rs
// Registration order breaks cost ties: earlier entries win.
vec![
    // Squad
    GoapAction::coordinated_flank(),

    // Flanking
    GoapAction {
        name: "flank",
        cost: 2.0,
        preconditions: world_state![WorldKey::PlayerVisible => false],
        effects: world_state![WorldKey::AtFlankPosition => true, WorldKey::PlayerEngaged => true],
        action_type: ActionType::Flank,
        cost_model: CostModel::Static,
    },

    // Cover
    GoapAction {
        name: "take_cover",
        cost: 1.5,
        preconditions: world_state![WorldKey::InCover => false, WorldKey::CoverAvailable => true],
        effects: world_state![WorldKey::InCover => true],
        action_type: ActionType::TakeCover,
        cost_model: CostModel::Static,
    },
    GoapAction {
        name: "peek_and_engage",
        cost: 1.0,
        preconditions: world_state![WorldKey::InCover => true, WorldKey::PlayerVisible => true, WorldKey::WeaponLoaded => true],
        effects: world_state![WorldKey::PlayerEngaged => true],
        action_type: ActionType::PeekAndEngage,
        cost_model: CostModel::Static,
    },

    // Assault
    GoapAction {
        name: "advance_on_player",
        cost: 3.0,
        preconditions: world_state![WorldKey::PlayerVisible => true],
        effects: world_state![WorldKey::PlayerEngaged => true, WorldKey::InCover => false],
        action_type: ActionType::AdvanceOnPlayer,
        cost_model: CostModel::Static,
    },
    GoapAction {
        name: "suppress",
        cost: 1.5,
        preconditions: world_state![WorldKey::PlayerVisible => true, WorldKey::WeaponLoaded => true],
        effects: world_state![WorldKey::PlayerSuppressed => true, WorldKey::WeaponLoaded => false],
        action_type: ActionType::Suppress,
        cost_model: CostModel::Static,
    },
    GoapAction {
        name: "reload",
        cost: 1.0,
        preconditions: world_state![WorldKey::HasWeapon => true, WorldKey::WeaponLoaded => false],
        effects: world_state![WorldKey::WeaponLoaded => true],
        action_type: ActionType::Reload,
        cost_model: CostModel::Static,
    },

    // Defensive
    GoapAction {
        name: "retreat",
        cost: 1.5,
        preconditions: world_state![WorldKey::IsInjured => true, WorldKey::UnderFire => true],
        effects: world_state![WorldKey::AtSafeDistance => true, WorldKey::UnderFire => false, WorldKey::InCover => false],
        action_type: ActionType::Retreat,
        cost_model: CostModel::Static,
    },

    // Search
    GoapAction {
        name: "search_for_player",
        cost: 2.5,
        preconditions: world_state![WorldKey::PlayerVisible => false],
        effects: world_state![WorldKey::PlayerVisible => true],
        action_type: ActionType::SearchForPlayer,
        cost_model: CostModel::Static,
    },
]
