//! Generation orchestrator — composes rendering, variation, experimentation,
//! and engagement analysis into four generation modes with graceful
//! fallback between them.

use crate::context::{bias_with_recommendation, build_context};
use anyhow::anyhow;
use chrono::Utc;
use notify_core::config::NotifyConfig;
use notify_core::error::{NotifyError, NotifyResult};
use notify_core::event_bus::{make_event, noop_sink, EventSink};
use notify_core::stores::{
    AbTestStore, EngagementSource, HistoryStore, ProfileSource, RuleStore, TemplateStore,
};
use notify_core::types::{
    content_hash, FunnelEvent, Language, MessageCategory, MessageHistoryEntry, MessageTemplate,
    NotifyEventType, RenderedTemplate, TemplateContext,
};
use notify_engagement::EngagementAnalyzer;
use notify_experimentation::AbTestEngine;
use notify_rendering::TemplateRenderer;
use notify_variation::{apply_random_phrases, VariationSelector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

// ─── Request / response ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessagePriority {
    Low,
    Normal,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub user_id: String,
    pub session_id: Option<String>,
    pub message_type: MessageCategory,
    pub priority: Option<MessagePriority>,
    /// Explicit language; defaults to the profile's preferred language.
    pub language: Option<Language>,
    pub custom_context: Option<HashMap<String, serde_json::Value>>,
    #[serde(default = "default_true")]
    pub use_optimization: bool,
    #[serde(default = "default_true")]
    pub use_variation: bool,
    #[serde(default)]
    pub generate_multiple: bool,
    pub variation_count: Option<u32>,
}

fn default_true() -> bool {
    true
}

impl GenerationRequest {
    pub fn new(user_id: &str, message_type: MessageCategory) -> Self {
        Self {
            user_id: user_id.to_string(),
            session_id: None,
            message_type,
            priority: None,
            language: None,
            custom_context: None,
            use_optimization: true,
            use_variation: true,
            generate_multiple: false,
            variation_count: None,
        }
    }
}

/// Which generation mode produced the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    Multiple,
    Optimized,
    Varied,
    Standard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub mode: GenerationMode,
    pub elapsed_ms: u64,
    /// Which optimizations applied, e.g. `ab_test:<name>`.
    pub optimizations: Vec<String>,
    /// Why each higher-priority mode fell through, in order.
    pub fallback_reasons: Vec<String>,
    pub template_id: Option<Uuid>,
    pub variant_id: Option<String>,
    pub avoidance_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub success: bool,
    pub messages: Vec<RenderedTemplate>,
    pub metadata: GenerationMetadata,
}

impl GenerationResponse {
    pub fn message(&self) -> Option<&RenderedTemplate> {
        self.messages.first()
    }
}

// ─── Engine ─────────────────────────────────────────────────────────────

struct ModeOutcome {
    messages: Vec<RenderedTemplate>,
    template_id: Uuid,
    variant_id: Option<String>,
    optimizations: Vec<String>,
    avoidance_reason: Option<String>,
}

pub struct GenerationEngine {
    template_store: Arc<dyn TemplateStore>,
    history_store: Arc<dyn HistoryStore>,
    profile_source: Arc<dyn ProfileSource>,
    selector: VariationSelector,
    ab_engine: AbTestEngine,
    analyzer: EngagementAnalyzer,
    renderer: TemplateRenderer,
    event_sink: Arc<dyn EventSink>,
    config: NotifyConfig,
}

impl GenerationEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        template_store: Arc<dyn TemplateStore>,
        history_store: Arc<dyn HistoryStore>,
        rule_store: Arc<dyn RuleStore>,
        ab_test_store: Arc<dyn AbTestStore>,
        engagement_source: Arc<dyn EngagementSource>,
        profile_source: Arc<dyn ProfileSource>,
        config: NotifyConfig,
    ) -> Self {
        let selector = VariationSelector::new(
            Arc::clone(&template_store),
            Arc::clone(&history_store),
            rule_store,
            config.clone(),
        );
        Self {
            template_store,
            history_store,
            profile_source,
            selector,
            ab_engine: AbTestEngine::new(ab_test_store),
            analyzer: EngagementAnalyzer::new(engagement_source),
            renderer: TemplateRenderer::new(),
            event_sink: noop_sink(),
            config,
        }
    }

    /// Attach an event sink for emitting generation outcome events.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Generate a notification for the request, attempting modes in
    /// priority order. Every internal failure falls through to the next
    /// mode; only standard-mode failure propagates to the caller.
    pub fn generate(&self, request: &GenerationRequest) -> NotifyResult<GenerationResponse> {
        let start = std::time::Instant::now();

        let profile = match self.profile_source.get_profile(&request.user_id) {
            Ok(p) => p,
            Err(err) => {
                warn!(user_id = %request.user_id, error = %err, "Profile fetch failed");
                None
            }
        };
        let language = request
            .language
            .or(profile.as_ref().map(|p| p.preferred_language))
            .unwrap_or(Language::En);
        let context = build_context(profile.as_ref(), request, &self.config.app_name);

        let mut fallback_reasons = Vec::new();

        if request.generate_multiple {
            match self.generate_multiple_mode(request, language, &context) {
                Ok(outcome) => {
                    return Ok(self.finish(request, GenerationMode::Multiple, outcome, fallback_reasons, start))
                }
                Err(err) => self.record_fallback(request, GenerationMode::Multiple, &err, &mut fallback_reasons),
            }
        }

        if request.use_optimization {
            match self.generate_optimized_mode(request, language, &context) {
                Ok(outcome) => {
                    return Ok(self.finish(request, GenerationMode::Optimized, outcome, fallback_reasons, start))
                }
                Err(err) => self.record_fallback(request, GenerationMode::Optimized, &err, &mut fallback_reasons),
            }
        }

        if request.use_variation {
            match self.generate_varied_mode(request, language, &context) {
                Ok(outcome) => {
                    return Ok(self.finish(request, GenerationMode::Varied, outcome, fallback_reasons, start))
                }
                Err(err) => self.record_fallback(request, GenerationMode::Varied, &err, &mut fallback_reasons),
            }
        }

        // Standard generation is the only mode whose failure is user-visible.
        let outcome = self.generate_standard_mode(request, language, &context)?;
        Ok(self.finish(request, GenerationMode::Standard, outcome, fallback_reasons, start))
    }

    // ─── Modes ──────────────────────────────────────────────────────────

    /// N independent renders of the leading template, each with freshly
    /// randomized sub-phrases.
    fn generate_multiple_mode(
        &self,
        request: &GenerationRequest,
        language: Language,
        context: &TemplateContext,
    ) -> NotifyResult<ModeOutcome> {
        let template = self.first_active(request.message_type, language)?;
        let count = request
            .variation_count
            .unwrap_or(self.config.default_variation_count)
            .max(1);

        let mut rng = rand::thread_rng();
        let mut messages = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let mut ctx = context.clone();
            apply_random_phrases(&mut ctx, language, &mut rng);
            messages.push(self.renderer.render(&template, &ctx, false)?);
        }

        self.append_history(request, &template, &messages[0], Some("multiple".to_string()));
        Ok(ModeOutcome {
            messages,
            template_id: template.id,
            variant_id: None,
            optimizations: vec![format!("multi_variant:{}", count)],
            avoidance_reason: None,
        })
    }

    /// Render the assigned A/B variant when a test is active; otherwise
    /// bias the context with the engagement recommendation.
    fn generate_optimized_mode(
        &self,
        request: &GenerationRequest,
        language: Language,
        context: &TemplateContext,
    ) -> NotifyResult<ModeOutcome> {
        if let Some(test) = self.ab_engine.active_test(request.message_type)? {
            let variant = self
                .ab_engine
                .assign_variant(&request.user_id, &test)
                .ok_or_else(|| {
                    NotifyError::Experiment(format!("test {} has no assignable variant", test.id))
                })?;
            let template = self
                .template_store
                .get(&variant.template_id)?
                .filter(|t| t.is_active)
                .ok_or_else(|| {
                    NotifyError::Experiment(format!(
                        "variant {} references missing template",
                        variant.id
                    ))
                })?;

            let rendered = self.renderer.render(&template, context, false)?;
            let variant_id = variant.id.clone();
            self.ab_engine
                .record_event(&test.id, &variant_id, FunnelEvent::Sent)?;
            self.event_sink.emit(make_event(
                NotifyEventType::VariantAssigned,
                Some(request.user_id.clone()),
                Some(request.message_type),
                Some(template.id),
                Some(variant_id.clone()),
            ));

            self.append_history(request, &template, &rendered, Some(format!("ab:{}", variant_id)));
            return Ok(ModeOutcome {
                messages: vec![rendered],
                template_id: template.id,
                variant_id: Some(variant_id),
                optimizations: vec![format!("ab_test:{}", test.name)],
                avoidance_reason: None,
            });
        }

        let rec = self
            .analyzer
            .analyze(&request.user_id, self.config.engagement_window_days)?
            .ok_or_else(|| anyhow!("no active test and no engagement history"))?;

        let mut ctx = context.clone();
        bias_with_recommendation(&mut ctx, &rec);
        let template = self.first_active(request.message_type, language)?;
        let rendered = self.renderer.render(&template, &ctx, false)?;

        self.append_history(request, &template, &rendered, Some("engagement".to_string()));
        Ok(ModeOutcome {
            messages: vec![rendered],
            template_id: template.id,
            variant_id: None,
            optimizations: vec![format!(
                "engagement_recommendation:confidence_{}",
                rec.confidence
            )],
            avoidance_reason: None,
        })
    }

    /// Anti-repetition selection; the selector appends its own history.
    fn generate_varied_mode(
        &self,
        request: &GenerationRequest,
        language: Language,
        context: &TemplateContext,
    ) -> NotifyResult<ModeOutcome> {
        let outcome =
            self.selector
                .select(&request.user_id, request.message_type, language, context)?;

        if outcome.avoidance_reason.is_some() {
            self.event_sink.emit(make_event(
                NotifyEventType::SelectionDegraded,
                Some(request.user_id.clone()),
                Some(request.message_type),
                Some(outcome.template.id),
                outcome.avoidance_reason.clone(),
            ));
        }

        Ok(ModeOutcome {
            messages: vec![outcome.rendered],
            template_id: outcome.template.id,
            variant_id: None,
            optimizations: outcome
                .variation_type
                .map(|s| vec![format!("variation:{:?}", s).to_lowercase()])
                .unwrap_or_default(),
            avoidance_reason: outcome.avoidance_reason,
        })
    }

    /// First active template for the language, with a same-category
    /// other-language retry before giving up.
    fn generate_standard_mode(
        &self,
        request: &GenerationRequest,
        language: Language,
        context: &TemplateContext,
    ) -> NotifyResult<ModeOutcome> {
        let template = match self.first_active(request.message_type, language) {
            Ok(t) => t,
            Err(NotifyError::NoTemplateAvailable { .. }) => {
                let other = match language {
                    Language::Fa => Language::En,
                    Language::En => Language::Fa,
                };
                self.first_active(request.message_type, other)?
            }
            Err(err) => return Err(err),
        };

        let rendered = self.renderer.render(&template, context, false)?;
        self.append_history(request, &template, &rendered, None);
        Ok(ModeOutcome {
            messages: vec![rendered],
            template_id: template.id,
            variant_id: None,
            optimizations: Vec::new(),
            avoidance_reason: None,
        })
    }

    // ─── Helpers ────────────────────────────────────────────────────────

    fn first_active(
        &self,
        category: MessageCategory,
        language: Language,
    ) -> NotifyResult<MessageTemplate> {
        self.template_store
            .list_active(category, language)?
            .into_iter()
            .next()
            .ok_or(NotifyError::NoTemplateAvailable { category, language })
    }

    fn record_fallback(
        &self,
        request: &GenerationRequest,
        mode: GenerationMode,
        err: &NotifyError,
        reasons: &mut Vec<String>,
    ) {
        let reason = format!("{:?} mode failed: {}", mode, err);
        warn!(user_id = %request.user_id, %reason, "Generation mode fell through");
        self.event_sink.emit(make_event(
            NotifyEventType::FallbackTriggered,
            Some(request.user_id.clone()),
            Some(request.message_type),
            None,
            Some(reason.clone()),
        ));
        reasons.push(reason);
    }

    fn finish(
        &self,
        request: &GenerationRequest,
        mode: GenerationMode,
        outcome: ModeOutcome,
        fallback_reasons: Vec<String>,
        start: std::time::Instant,
    ) -> GenerationResponse {
        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            user_id = %request.user_id,
            ?mode,
            elapsed_ms,
            messages = outcome.messages.len(),
            "Generated notification"
        );
        self.event_sink.emit(make_event(
            NotifyEventType::MessageGenerated,
            Some(request.user_id.clone()),
            Some(request.message_type),
            Some(outcome.template_id),
            Some(format!("{:?}", mode).to_lowercase()),
        ));

        GenerationResponse {
            success: true,
            messages: outcome.messages,
            metadata: GenerationMetadata {
                mode,
                elapsed_ms,
                optimizations: outcome.optimizations,
                fallback_reasons,
                template_id: Some(outcome.template_id),
                variant_id: outcome.variant_id,
                avoidance_reason: outcome.avoidance_reason,
            },
        }
    }

    /// Best effort; history is not transactional with rendering.
    fn append_history(
        &self,
        request: &GenerationRequest,
        template: &MessageTemplate,
        rendered: &RenderedTemplate,
        variation_tag: Option<String>,
    ) {
        let entry = MessageHistoryEntry {
            id: Uuid::new_v4(),
            user_id: request.user_id.clone(),
            template_id: template.id,
            message_type: request.message_type,
            sent_at: Utc::now(),
            variation_tag,
            content_hash: content_hash(&rendered.title, &rendered.body),
        };
        if let Err(err) = self.history_store.append(entry) {
            warn!(user_id = %request.user_id, error = %err, "Failed to append message history");
        }
    }
}
