use thiserror::Error;

/// Configuration faults. Everything that can go wrong during a properly
/// configured run is reported as a [`RunOutcome`](crate::RunOutcome) instead.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("No plan confirmation hook installed")]
    MissingPlanConfirmer,

    #[error("No inference service configured for goal-based runs")]
    MissingGenerator,

    #[error("Unknown guardrail profile: {0}")]
    UnknownProfile(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
