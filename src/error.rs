use thiserror::Error;

/// Errors raised at the edges of the simulation (scenario lookup, configuration).
///
/// The per-tick steering and perception code is infallible.
#[derive(Debug, Error)]
pub enum PastureError {
    #[error("unknown scenario id '{0}'")]
    UnknownScenario(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PastureError>;
