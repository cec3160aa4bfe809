//! Human-in-the-loop hooks consulted before and during a run.

pub mod summary;
pub mod terminal;
pub mod traits;

pub use summary::describe_plan;
pub use terminal::TerminalApprover;
pub use traits::{AutoApprove, OriginConfirmer, PlanConfirmer};
