// src/data/goap_goals.rs
vec![
    Goal {
        name: "survive",
        priority: 12.0,
        desired_state: world_state![WorldKey::AtSafeDistance => true],
    },
    Goal {
        name: "engage_player",
        priority: 10.0,
        desired_state: world_state![WorldKey::PlayerEngaged => true],
    },
    Goal {
        name: "suppress_player",
        priority: 6.0,
        desired_state: world_state![WorldKey::PlayerSuppressed => true],
    },
    Goal {
        name: "hold_cover",
        priority: 2.0,
        desired_state: world_state![WorldKey::InCover => true],
    },
]
