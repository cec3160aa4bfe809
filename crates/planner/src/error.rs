use serde::Serialize;
use thiserror::Error;

/// Terminal planning failures, returned as structured diagnostics.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanError {
    #[error("Model output is not a JSON object: {message}")]
    InvalidJson { message: String, raw_snippet: String },

    #[error("Plan failed schema validation after {attempts} attempts: {}", errors.join("; "))]
    SchemaValidationFailed {
        attempts: usize,
        errors: Vec<String>,
        raw_snippet: String,
    },

    #[error("Inference error: {message}")]
    Inference { message: String },

    #[error("Invalid goal: {reason}")]
    InvalidGoal { reason: String },

    #[error("Normalization dropped every step of plan {plan_id}")]
    EmptyAfterNormalization { plan_id: String, skipped: usize },

    #[error("Schema error: {message}")]
    Schema { message: String },
}

impl PlanError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidJson { .. } => "invalid_json",
            Self::SchemaValidationFailed { .. } => "schema_validation_failed",
            Self::Inference { .. } => "inference_error",
            Self::InvalidGoal { .. } => "invalid_goal",
            Self::EmptyAfterNormalization { .. } => "empty_after_normalization",
            Self::Schema { .. } => "schema_error",
        }
    }
}
