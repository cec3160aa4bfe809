use serde::Serialize;
use thiserror::Error;

/// Failure reported by a browser driver primitive.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("Element not found: {0}")]
    NotFound(String),
    #[error("Driver failure: {0}")]
    Failed(String),
}

/// Failure reported by a host I/O primitive.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Command timed out after {0}ms")]
    Timeout(u64),
    #[error("Command exited with {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },
}

/// Step failure. Any of these aborts the run.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionError {
    #[error("Tool '{tool}' is missing required argument '{argument}'")]
    MissingArgument { tool: String, argument: String },

    #[error("Tool '{tool}' has an invalid '{argument}' argument: {reason}")]
    InvalidArgument {
        tool: String,
        argument: String,
        reason: String,
    },

    #[error("Unsupported tool: {tool}")]
    UnsupportedTool { tool: String },

    #[error("No element matches '{target}'")]
    SelectorNotFound { target: String },

    #[error("Navigation from {from} to {to} was not approved")]
    OriginChangeDenied { from: String, to: String },

    #[error("Driver error: {message}")]
    Driver { message: String },

    #[error("Host error: {message}")]
    Host { message: String },
}

impl ExecutionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingArgument { .. } => "missing_argument",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::UnsupportedTool { .. } => "unsupported_tool",
            Self::SelectorNotFound { .. } => "selector_not_found",
            Self::OriginChangeDenied { .. } => "origin_change_denied",
            Self::Driver { .. } => "driver_error",
            Self::Host { .. } => "host_error",
        }
    }

    pub(crate) fn missing(tool: &str, argument: &str) -> Self {
        Self::MissingArgument {
            tool: tool.to_string(),
            argument: argument.to_string(),
        }
    }

    pub(crate) fn invalid(tool: &str, argument: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            tool: tool.to_string(),
            argument: argument.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<DriverError> for ExecutionError {
    fn from(e: DriverError) -> Self {
        Self::Driver {
            message: e.to_string(),
        }
    }
}

impl From<HostError> for ExecutionError {
    fn from(e: HostError) -> Self {
        Self::Host {
            message: e.to_string(),
        }
    }
}

/// Why a step stopped early: cancellation is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupt {
    Cancelled,
    Failed(ExecutionError),
}

impl From<ExecutionError> for Interrupt {
    fn from(e: ExecutionError) -> Self {
        Self::Failed(e)
    }
}

impl From<DriverError> for Interrupt {
    fn from(e: DriverError) -> Self {
        Self::Failed(e.into())
    }
}

impl From<HostError> for Interrupt {
    fn from(e: HostError) -> Self {
        Self::Failed(e.into())
    }
}
