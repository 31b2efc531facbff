//! Rendering engine — `{{path}}` placeholder interpolation against a typed
//! context tree, type-aware formatting, static validation, and previews.

pub mod engine;
pub mod preview;
pub mod validate;

pub use engine::{scan, Scan, TemplateRenderer};
pub use preview::{preview, sample_context};
pub use validate::{validate, ValidationReport};
