//! A/B testing — deterministic bucket assignment, funnel tracking, and
//! experiment analysis for message-template experiments.

pub mod engine;

pub use engine::{assign_variant, AbTestAnalysis, AbTestEngine, TestRecommendation};
