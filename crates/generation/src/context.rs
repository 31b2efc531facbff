//! Context assembly — builds the template context for a generation request
//! from the user profile, the request's custom values, and system values.

use crate::orchestrator::GenerationRequest;
use chrono::Utc;
use notify_core::types::{TemplateContext, UserProfile};
use notify_engagement::OptimizationRecommendation;

pub fn build_context(
    profile: Option<&UserProfile>,
    request: &GenerationRequest,
    app_name: &str,
) -> TemplateContext {
    let mut ctx = TemplateContext::default();

    if let Some(profile) = profile {
        ctx.user
            .insert("name".to_string(), serde_json::json!(profile.name));
        ctx.user
            .insert("role".to_string(), serde_json::json!(profile.role));
        ctx.user.insert(
            "session_count".to_string(),
            serde_json::json!(profile.session_count),
        );
        if let Some(last_active) = profile.last_active_at {
            ctx.user.insert(
                "last_active_at".to_string(),
                serde_json::json!(last_active.to_rfc3339()),
            );
        }
    }

    if let Some(session_id) = &request.session_id {
        ctx.session
            .insert("id".to_string(), serde_json::json!(session_id));
    }

    ctx.system
        .insert("app_name".to_string(), serde_json::json!(app_name));
    ctx.system.insert(
        "date".to_string(),
        serde_json::json!(Utc::now().to_rfc3339()),
    );

    if let Some(custom) = &request.custom_context {
        for (key, value) in custom {
            ctx.custom.insert(key.clone(), value.clone());
        }
    }

    ctx
}

/// Fold an engagement recommendation into the context so templates can
/// reference the user's preferred slot, e.g. `{{system.preferred_time}}`.
pub fn bias_with_recommendation(ctx: &mut TemplateContext, rec: &OptimizationRecommendation) {
    ctx.system.insert(
        "preferred_time".to_string(),
        serde_json::json!(rec.best_time_of_day.label()),
    );
    if let Some(day) = rec.best_days.first() {
        ctx.system
            .insert("best_day".to_string(), serde_json::json!(day.to_string()));
    }
    ctx.system.insert(
        "engagement_score".to_string(),
        serde_json::json!(rec.pattern.engagement_score.round()),
    );
}
