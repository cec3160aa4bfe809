use serde::Serialize;
use thiserror::Error;

/// A plan violated the active guardrail profile. Carries the first offending
/// step so the outcome can be explained without consulting logs.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyError {
    #[error("Plan has {actual} steps, profile allows at most {max}")]
    MaxStepsExceeded { max: usize, actual: usize },

    #[error("Step {index}: tool '{tool}' is not in the active catalog")]
    UnknownTool { index: usize, tool: String },

    #[error("Step {index}: tool '{tool}' is blocked by profile '{profile}'")]
    ToolBlocked {
        index: usize,
        tool: String,
        profile: String,
    },

    #[error("Step {index}: '{tool}' targets password-like field '{target}'")]
    PasswordFieldBlocked {
        index: usize,
        tool: String,
        target: String,
    },
}

impl PolicyError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MaxStepsExceeded { .. } => "max_steps_exceeded",
            Self::UnknownTool { .. } => "unknown_tool",
            Self::ToolBlocked { .. } => "tool_blocked",
            Self::PasswordFieldBlocked { .. } => "password_field_blocked",
        }
    }

    pub fn step_index(&self) -> Option<usize> {
        match self {
            Self::MaxStepsExceeded { .. } => None,
            Self::UnknownTool { index, .. }
            | Self::ToolBlocked { index, .. }
            | Self::PasswordFieldBlocked { index, .. } => Some(*index),
        }
    }

    pub fn tool(&self) -> Option<&str> {
        match self {
            Self::MaxStepsExceeded { .. } => None,
            Self::UnknownTool { tool, .. }
            | Self::ToolBlocked { tool, .. }
            | Self::PasswordFieldBlocked { tool, .. } => Some(tool),
        }
    }
}

/// Problems with the guardrail document itself or profile lookup.
#[derive(Debug, Error)]
pub enum GuardrailError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid profile '{profile}': {reason}")]
    InvalidProfile { profile: String, reason: String },

    #[error("Unknown guardrail profile: {0}")]
    UnknownProfile(String),
}
