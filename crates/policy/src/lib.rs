//! Guardrail profiles and the plan validator.
//!
//! Validation is independent of how a plan was produced: precomputed plans
//! and generated plans go through the same checks.

pub mod error;
pub mod password;
pub mod profile;
pub mod validator;

pub use error::{GuardrailError, PolicyError};
pub use password::looks_like_password_field;
pub use profile::{GuardrailProfile, GuardrailSet};
pub use validator::{password_target, validate};
