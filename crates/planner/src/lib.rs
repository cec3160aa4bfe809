//! Plan generation and normalization.
//!
//! The generator turns a goal plus page context into a schema-conformant
//! [`Plan`](webpilot_core::Plan) using an unreliable inference service and a
//! single bounded repair retry. The normalizer resolves spatial arguments
//! against the live viewport.

pub mod coerce;
pub mod error;
pub mod generator;
pub mod normalize;
pub mod prompt;
pub mod schema;

pub use coerce::{coerce_confidence, coerce_plan, coerce_positional_args, CoercionError};
pub use error::PlanError;
pub use generator::{
    accept_plan, extract_json_object, parse_plan, PlanGenerator, PlanRequest, PolicyHint,
    Transcript, MAX_ATTEMPTS,
};
pub use normalize::{normalize, Normalized, SkipNotice};
pub use schema::PlanSchema;
