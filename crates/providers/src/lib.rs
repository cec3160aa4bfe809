//! Inference service seam: an opaque text-in/text-out model endpoint.

pub mod circuit_breaker;
pub mod openai_compatible;
pub mod traits;

pub use circuit_breaker::CircuitBreaker;
pub use openai_compatible::OpenAICompatibleProvider;
pub use traits::{ChatMessage, InferenceRequest, InferenceService, ProviderError, ResponseFormat};
