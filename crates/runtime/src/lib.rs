//! Webpilot run orchestration: plan, normalize, check, confirm, execute.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod outcome;
pub mod runner;

pub use config::{load_runtime_config, InferenceConfig, RuntimeConfig};
pub use error::RuntimeError;
pub use logging::init_logging;
pub use outcome::RunOutcome;
pub use runner::{PlanSource, RunRequest, Runner};
pub use webpilot_executor::CancellationToken;
