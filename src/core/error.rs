use thiserror::Error;

/// Construction and loading failures. Runtime decisions never produce these:
/// an unreachable goal is an empty plan and a refused join is `false`.
#[derive(Error, Debug)]
pub enum TacticsError {
    #[error("Action '{0}' has no effects")]
    EmptyEffects(&'static str),

    #[error("Action '{0}' is already registered")]
    DuplicateAction(&'static str),

    #[error("Config IO error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Config RON error: {0}")]
    ConfigRon(#[from] ron::error::SpannedError),

    #[error("Config JSON error: {0}")]
    ConfigJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TacticsError>;
