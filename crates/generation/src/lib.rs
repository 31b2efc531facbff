//! Generation orchestration — the single `generate(request)` entry point
//! composing rendering, anti-repetition selection, A/B testing, and
//! engagement analysis with graceful fallback between modes.

pub mod context;
pub mod orchestrator;

pub use context::{bias_with_recommendation, build_context};
pub use orchestrator::{
    GenerationEngine, GenerationMetadata, GenerationMode, GenerationRequest, GenerationResponse,
    MessagePriority,
};
