//! Shared data model for the webpilot planning and execution pipeline.

pub mod catalog;
pub mod context;
pub mod origin;
pub mod plan;

pub use catalog::{ToolCatalog, ToolCatalogEntry, ToolName, UnknownTool};
pub use context::{BoundingBox, ContextSnapshot, Interactable, Point, Viewport};
pub use origin::origin_of;
pub use plan::{AutonomyLevel, Plan, RiskLevel, Step, DEFAULT_CONFIDENCE};
