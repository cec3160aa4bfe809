//! Execution dispatcher: runs validated plans against a browser driver with
//! pacing, locator fallback, origin gating and cooperative cancellation.

pub mod dispatcher;
pub mod driver;
pub mod error;
pub mod fuzzy;
pub mod host;
pub mod locator;
pub mod pacing;
mod tools;

pub use dispatcher::{DispatchSettings, Dispatcher, ExecutionOutcome, StepRecord};
pub use driver::{BrowserDriver, Locator, LocatorStrategy};
pub use error::{DriverError, ExecutionError, HostError, Interrupt};
pub use host::{FetchResponse, HostIo, ShellOutput, SystemHost};
pub use tokio_util::sync::CancellationToken;
