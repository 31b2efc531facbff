//! Authoring-time preview — renders a template against a fixed synthetic
//! context in non-strict mode. Never touches persisted history.

use crate::engine::TemplateRenderer;
use notify_core::error::NotifyResult;
use notify_core::types::{Language, MessageTemplate, RenderedTemplate, TemplateContext};

/// Build the illustrative sample context used for previews.
pub fn sample_context(language: Language) -> TemplateContext {
    let mut ctx = TemplateContext::default();

    let (name, role) = match language {
        Language::Fa => ("علی رضایی", "student"),
        Language::En => ("Ali Rezaei", "student"),
    };
    ctx.user
        .insert("name".to_string(), serde_json::json!(name));
    ctx.user
        .insert("role".to_string(), serde_json::json!(role));
    ctx.user
        .insert("session_count".to_string(), serde_json::json!(12));

    ctx.session
        .insert("title".to_string(), serde_json::json!("Algebra Review"));
    ctx.session.insert(
        "start_time".to_string(),
        serde_json::json!("2026-01-15T17:30:00Z"),
    );
    ctx.session
        .insert("duration_minutes".to_string(), serde_json::json!(45));

    ctx.system
        .insert("app_name".to_string(), serde_json::json!("NotifyExpress"));
    ctx.system.insert(
        "date".to_string(),
        serde_json::json!("2026-01-15T12:00:00Z"),
    );

    ctx.custom
        .insert("count".to_string(), serde_json::json!(3));

    ctx
}

/// Render a template against the sample context for authoring feedback.
pub fn preview(template: &MessageTemplate) -> NotifyResult<RenderedTemplate> {
    let renderer = TemplateRenderer::new();
    renderer.render(template, &sample_context(template.language), false)
}
