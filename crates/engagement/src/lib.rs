//! Engagement analysis — turns a user's delivery/open/click history into
//! time/day/type/personalization recommendations for message generation.

pub mod analyzer;

pub use analyzer::{
    confidence_for, EngagementAnalyzer, OptimizationRecommendation, PersonalizationLevel,
};
