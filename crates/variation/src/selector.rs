//! Variation selector — applies anti-repetition rules to a template pool
//! and picks the next template for a user, optionally mutating dynamic
//! sub-phrases to further reduce repetition.

use crate::phrases::apply_random_phrases;
use crate::pool::PoolBuilder;
use chrono::{DateTime, Duration, Timelike, Utc};
use notify_core::config::NotifyConfig;
use notify_core::error::{NotifyError, NotifyResult};
use notify_core::stores::{HistoryStore, RuleStore, TemplateStore};
use notify_core::types::{
    content_hash, Language, MessageCategory, MessageHistoryEntry, MessageTemplate,
    RenderedTemplate, TemplateContext, TemplatePool, TimeOfDay, VariationRule, VariationStrategy,
};
use notify_rendering::TemplateRenderer;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of one selection call. Selection never throws to its caller
/// except when no template exists at all.
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub template: MessageTemplate,
    pub rendered: RenderedTemplate,
    pub variation_applied: bool,
    pub variation_type: Option<VariationStrategy>,
    pub variation_tag: Option<String>,
    pub reasoning: String,
    /// Soft degradation signal; set when anti-repetition constraints could
    /// not be satisfied or an internal error forced a fallback.
    pub avoidance_reason: Option<String>,
}

pub struct VariationSelector {
    template_store: Arc<dyn TemplateStore>,
    history_store: Arc<dyn HistoryStore>,
    rule_store: Arc<dyn RuleStore>,
    pool_builder: PoolBuilder,
    renderer: TemplateRenderer,
    config: NotifyConfig,
}

impl VariationSelector {
    pub fn new(
        template_store: Arc<dyn TemplateStore>,
        history_store: Arc<dyn HistoryStore>,
        rule_store: Arc<dyn RuleStore>,
        config: NotifyConfig,
    ) -> Self {
        let pool_builder = PoolBuilder::new(
            Arc::clone(&template_store),
            Arc::clone(&history_store),
            config.history_window_days,
        );
        Self {
            template_store,
            history_store,
            rule_store,
            pool_builder,
            renderer: TemplateRenderer::new(),
            config,
        }
    }

    /// Select the next template for a user. Any pool/history/store error
    /// degrades to the first active template with the error captured in
    /// `avoidance_reason`; only a completely empty template set errors.
    pub fn select(
        &self,
        user_id: &str,
        message_type: MessageCategory,
        language: Language,
        context: &TemplateContext,
    ) -> NotifyResult<SelectionOutcome> {
        match self.try_select(user_id, message_type, language, context) {
            Ok(outcome) => Ok(outcome),
            Err(err @ NotifyError::NoTemplateAvailable { .. }) => Err(err),
            Err(err) => self.degraded(user_id, message_type, language, context, err),
        }
    }

    fn try_select(
        &self,
        user_id: &str,
        message_type: MessageCategory,
        language: Language,
        context: &TemplateContext,
    ) -> NotifyResult<SelectionOutcome> {
        let rule = self
            .rule_store
            .rule_for(message_type)?
            .unwrap_or_else(|| VariationRule::default_for(message_type));

        let pool = self
            .pool_builder
            .build(message_type, language, Some(user_id))?;
        if pool.templates.is_empty() {
            return Err(NotifyError::NoTemplateAvailable {
                category: message_type,
                language,
            });
        }

        let now = Utc::now();
        let filtered = filter_candidates(&pool, &rule, now);

        let outcome = if filtered.is_empty() {
            let template = least_recent(&pool)
                .cloned()
                .unwrap_or_else(|| pool.templates[0].clone());
            let rendered = self.renderer.render(&template, context, false)?;
            SelectionOutcome {
                reasoning: format!(
                    "pool exhausted; fell back to least recently used template '{}'",
                    template.name
                ),
                template,
                rendered,
                variation_applied: false,
                variation_type: None,
                variation_tag: None,
                avoidance_reason: Some("all templates exceeded usage limits".to_string()),
            }
        } else {
            self.apply_strategy(user_id, &rule, &pool, &filtered, context, now)?
        };

        self.append_history(user_id, message_type, &outcome);
        info!(
            user_id = %user_id,
            ?message_type,
            template = %outcome.template.name,
            variation_applied = outcome.variation_applied,
            "Selected template"
        );
        Ok(outcome)
    }

    fn apply_strategy(
        &self,
        user_id: &str,
        rule: &VariationRule,
        pool: &TemplatePool,
        filtered: &[&MessageTemplate],
        context: &TemplateContext,
        now: DateTime<Utc>,
    ) -> NotifyResult<SelectionOutcome> {
        let bucket = TimeOfDay::from_hour(now.hour());

        match rule.strategy {
            VariationStrategy::TemplateRotation => {
                // Lowest usage wins; ties go to the first in pool order.
                let mut best: Option<(&MessageTemplate, u32)> = None;
                for t in filtered {
                    let usage = pool.usage_history.get(&t.id).copied().unwrap_or(0);
                    if best.map(|(_, u)| usage < u).unwrap_or(true) {
                        best = Some((t, usage));
                    }
                }
                let (template, usage) = best.unwrap_or((filtered[0], 0));
                let rendered = self.renderer.render(template, context, false)?;
                Ok(SelectionOutcome {
                    template: template.clone(),
                    rendered,
                    variation_applied: true,
                    variation_type: Some(VariationStrategy::TemplateRotation),
                    variation_tag: None,
                    reasoning: format!(
                        "template_rotation: '{}' has the lowest usage count ({})",
                        template.name, usage
                    ),
                    avoidance_reason: None,
                })
            }

            VariationStrategy::ContentVariation => {
                self.content_variation(user_id, filtered[0], context)
            }

            VariationStrategy::TimingVariation => {
                let template = filtered
                    .iter()
                    .find(|t| matches_bucket(t, bucket))
                    .copied()
                    .or_else(|| filtered.choose(&mut rand::thread_rng()).copied())
                    .unwrap_or(filtered[0]);
                let matched = matches_bucket(template, bucket);
                let rendered = self.renderer.render(template, context, false)?;
                Ok(SelectionOutcome {
                    template: template.clone(),
                    rendered,
                    variation_applied: true,
                    variation_type: Some(VariationStrategy::TimingVariation),
                    variation_tag: Some(bucket.label().to_string()),
                    reasoning: if matched {
                        format!(
                            "timing_variation: '{}' matches the {} bucket",
                            template.name,
                            bucket.label()
                        )
                    } else {
                        format!(
                            "timing_variation: no {} match, picked '{}' at random",
                            bucket.label(),
                            template.name
                        )
                    },
                    avoidance_reason: None,
                })
            }

            VariationStrategy::Hybrid => {
                let mut best: Option<(&MessageTemplate, f64)> = None;
                for t in filtered {
                    let usage = pool.usage_history.get(&t.id).copied().unwrap_or(0);
                    let hours = pool
                        .last_used
                        .get(&t.id)
                        .map(|ts| (now - *ts).num_minutes() as f64 / 60.0);
                    let score = hybrid_score(usage, hours, matches_bucket(t, bucket));
                    if best.map(|(_, s)| score > s).unwrap_or(true) {
                        best = Some((t, score));
                    }
                }
                let (template, score) = best.unwrap_or((filtered[0], 0.0));
                let rendered = self.renderer.render(template, context, false)?;
                Ok(SelectionOutcome {
                    template: template.clone(),
                    rendered,
                    variation_applied: true,
                    variation_type: Some(VariationStrategy::Hybrid),
                    variation_tag: None,
                    reasoning: format!(
                        "hybrid: '{}' scored {:.1} (usage, recency, time-of-day)",
                        template.name, score
                    ),
                    avoidance_reason: None,
                })
            }
        }
    }

    /// Re-render with randomized sub-phrases until the content hash is new
    /// within the duplicate window, bounded by `max_variation_attempts`.
    /// On exhaustion the last variant is accepted; never an error.
    fn content_variation(
        &self,
        user_id: &str,
        template: &MessageTemplate,
        context: &TemplateContext,
    ) -> NotifyResult<SelectionOutcome> {
        let since = Utc::now() - Duration::days(self.config.duplicate_window_days);
        let recent_hashes: HashSet<String> = self
            .history_store
            .list_since(user_id, since)?
            .into_iter()
            .map(|e| e.content_hash)
            .collect();

        let mut rng = rand::thread_rng();
        let mut last: Option<(RenderedTemplate, String)> = None;

        for attempt in 0..self.config.max_variation_attempts {
            let mut ctx = context.clone();
            let tag = apply_random_phrases(&mut ctx, template.language, &mut rng);
            let rendered = self.renderer.render(template, &ctx, false)?;
            let hash = content_hash(&rendered.title, &rendered.body);

            if !recent_hashes.contains(&hash) {
                return Ok(SelectionOutcome {
                    template: template.clone(),
                    rendered,
                    variation_applied: true,
                    variation_type: Some(VariationStrategy::ContentVariation),
                    variation_tag: Some(tag),
                    reasoning: format!(
                        "content_variation: fresh phrasing found on attempt {}",
                        attempt + 1
                    ),
                    avoidance_reason: None,
                });
            }
            last = Some((rendered, tag));
        }

        // All attempts collided with recent history; keep the last variant.
        let (rendered, tag) = match last {
            Some(pair) => pair,
            None => (self.renderer.render(template, context, false)?, String::new()),
        };
        Ok(SelectionOutcome {
            template: template.clone(),
            rendered,
            variation_applied: true,
            variation_type: Some(VariationStrategy::ContentVariation),
            variation_tag: Some(tag),
            reasoning: format!(
                "content_variation: all {} attempts collided with recent content, keeping last variant",
                self.config.max_variation_attempts
            ),
            avoidance_reason: None,
        })
    }

    fn degraded(
        &self,
        user_id: &str,
        message_type: MessageCategory,
        language: Language,
        context: &TemplateContext,
        err: NotifyError,
    ) -> NotifyResult<SelectionOutcome> {
        warn!(user_id = %user_id, ?message_type, error = %err, "Selection degraded to first active template");
        let templates = self.template_store.list_active(message_type, language)?;
        let template = templates
            .into_iter()
            .next()
            .ok_or(NotifyError::NoTemplateAvailable {
                category: message_type,
                language,
            })?;
        let rendered = self.renderer.render(&template, context, false)?;
        let outcome = SelectionOutcome {
            template,
            rendered,
            variation_applied: false,
            variation_type: None,
            variation_tag: None,
            reasoning: "selection degraded; using first active template".to_string(),
            avoidance_reason: Some(err.to_string()),
        };
        self.append_history(user_id, message_type, &outcome);
        Ok(outcome)
    }

    /// Append-only; a failed write is logged, not propagated — history is
    /// not required to be transactional with rendering.
    fn append_history(&self, user_id: &str, message_type: MessageCategory, outcome: &SelectionOutcome) {
        let entry = MessageHistoryEntry {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            template_id: outcome.template.id,
            message_type,
            sent_at: Utc::now(),
            variation_tag: outcome.variation_tag.clone(),
            content_hash: content_hash(&outcome.rendered.title, &outcome.rendered.body),
        };
        if let Err(err) = self.history_store.append(entry) {
            warn!(user_id = %user_id, error = %err, "Failed to append message history");
        }
    }
}

// ─── Constraint filtering & scoring ─────────────────────────────────────

/// Drop templates at or over the repetition cap, and templates used within
/// the minimum interval. Preserves pool order.
pub fn filter_candidates<'a>(
    pool: &'a TemplatePool,
    rule: &VariationRule,
    now: DateTime<Utc>,
) -> Vec<&'a MessageTemplate> {
    pool.templates
        .iter()
        .filter(|t| {
            let usage = pool.usage_history.get(&t.id).copied().unwrap_or(0);
            if usage >= rule.max_repetitions {
                return false;
            }
            match pool.last_used.get(&t.id) {
                Some(ts) => now - *ts >= Duration::hours(rule.min_interval_hours),
                None => true,
            }
        })
        .collect()
}

/// The template with the globally least-recent use; never-used templates
/// sort first, ties broken by pool order.
pub fn least_recent(pool: &TemplatePool) -> Option<&MessageTemplate> {
    let mut best: Option<(&MessageTemplate, DateTime<Utc>)> = None;
    for t in &pool.templates {
        let ts = pool
            .last_used
            .get(&t.id)
            .copied()
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        if best.map(|(_, b)| ts < b).unwrap_or(true) {
            best = Some((t, ts));
        }
    }
    best.map(|(t, _)| t)
}

/// Hybrid strategy score: `100 − 20×usage − recency_penalty + time_bonus`.
/// The recency penalty fades to zero at 48 hours and is zero for templates
/// never used.
pub fn hybrid_score(usage: u32, hours_since_last_use: Option<f64>, time_match: bool) -> f64 {
    let recency_penalty = match hours_since_last_use {
        Some(hours) => (48.0 - hours).max(0.0) * 2.0,
        None => 0.0,
    };
    let time_bonus = if time_match { 10.0 } else { 0.0 };
    100.0 - 20.0 * usage as f64 - recency_penalty + time_bonus
}

fn matches_bucket(template: &MessageTemplate, bucket: TimeOfDay) -> bool {
    let label = bucket.label();
    template.tags.iter().any(|t| t.eq_ignore_ascii_case(label))
        || template.name.to_lowercase().contains(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{history_entry, make_template};
    use notify_core::stores::{InMemoryHistoryStore, InMemoryRuleStore, InMemoryTemplateStore};
    use std::collections::HashMap;

    fn selector(
        templates: Arc<InMemoryTemplateStore>,
        history: Arc<InMemoryHistoryStore>,
        rules: Arc<InMemoryRuleStore>,
    ) -> VariationSelector {
        VariationSelector::new(templates, history, rules, NotifyConfig::default())
    }

    fn pool_of(templates: Vec<MessageTemplate>) -> TemplatePool {
        TemplatePool {
            message_type: MessageCategory::Session,
            templates,
            usage_history: HashMap::new(),
            last_used: HashMap::new(),
        }
    }

    #[test]
    fn test_filter_drops_over_used_and_recent() {
        let t1 = make_template("a", Language::En, &[]);
        let t2 = make_template("b", Language::En, &[]);
        let t3 = make_template("c", Language::En, &[]);
        let mut pool = pool_of(vec![t1.clone(), t2.clone(), t3.clone()]);
        let now = Utc::now();

        pool.usage_history.insert(t1.id, 2); // at the cap
        pool.usage_history.insert(t2.id, 1);
        pool.last_used.insert(t2.id, now - Duration::hours(2)); // inside interval
        pool.usage_history.insert(t3.id, 1);
        pool.last_used.insert(t3.id, now - Duration::hours(30)); // clear

        let rule = VariationRule::default_for(MessageCategory::Session);
        let filtered = filter_candidates(&pool, &rule, now);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, t3.id);
    }

    #[test]
    fn test_least_recent_prefers_never_used() {
        let t1 = make_template("used", Language::En, &[]);
        let t2 = make_template("fresh", Language::En, &[]);
        let mut pool = pool_of(vec![t1.clone(), t2.clone()]);
        pool.last_used.insert(t1.id, Utc::now());
        assert_eq!(least_recent(&pool).unwrap().id, t2.id);
    }

    #[test]
    fn test_hybrid_score_components() {
        // Never used, no time match: full base score
        assert_eq!(hybrid_score(0, None, false), 100.0);
        // Usage costs 20 per send
        assert_eq!(hybrid_score(2, None, false), 60.0);
        // Used 24h ago: penalty (48-24)*2 = 48
        assert_eq!(hybrid_score(0, Some(24.0), false), 52.0);
        // Penalty is zero at/after 48h
        assert_eq!(hybrid_score(0, Some(48.0), false), 100.0);
        assert_eq!(hybrid_score(0, Some(72.0), false), 100.0);
        // Time match adds 10
        assert_eq!(hybrid_score(0, None, true), 110.0);
    }

    #[test]
    fn test_rotation_picks_lowest_usage() {
        let templates = Arc::new(InMemoryTemplateStore::new());
        let history = Arc::new(InMemoryHistoryStore::new());
        let t1 = make_template("a", Language::En, &[]);
        let t2 = make_template("b", Language::En, &[]);
        templates.insert(t1.clone());
        templates.insert(t2.clone());
        // t1 used once, 30h ago (outside interval, under cap)
        history
            .append(history_entry("u1", t1.id, Utc::now() - Duration::hours(30)))
            .unwrap();

        let sel = selector(templates, history, Arc::new(InMemoryRuleStore::new()));
        let outcome = sel
            .select(
                "u1",
                MessageCategory::Session,
                Language::En,
                &TemplateContext::default(),
            )
            .unwrap();
        assert_eq!(outcome.template.id, t2.id);
        assert!(outcome.variation_applied);
        assert_eq!(
            outcome.variation_type,
            Some(VariationStrategy::TemplateRotation)
        );
        assert!(outcome.avoidance_reason.is_none());
    }

    #[test]
    fn test_matches_bucket_by_tag_and_name() {
        let tagged = make_template("plain name", Language::En, &["Morning"]);
        assert!(matches_bucket(&tagged, TimeOfDay::Morning));
        assert!(!matches_bucket(&tagged, TimeOfDay::Evening));

        let named = make_template("evening digest", Language::En, &[]);
        assert!(matches_bucket(&named, TimeOfDay::Evening));

        let neither = make_template("reminder", Language::En, &[]);
        assert!(!matches_bucket(&neither, TimeOfDay::Night));
    }

    #[test]
    fn test_timing_variation_prefers_current_bucket() {
        let templates = Arc::new(InMemoryTemplateStore::new());
        let history = Arc::new(InMemoryHistoryStore::new());
        let rules = Arc::new(InMemoryRuleStore::new());
        rules.insert(VariationRule {
            message_type: MessageCategory::Session,
            min_interval_hours: 24,
            max_repetitions: 2,
            strategy: VariationStrategy::TimingVariation,
            is_active: true,
        });

        let bucket = TimeOfDay::from_hour(Utc::now().hour());
        // Untagged template first, so a bucket match must beat pool order
        templates.insert(make_template("untagged", Language::En, &[]));
        let tagged = make_template("tagged", Language::En, &[bucket.label()]);
        templates.insert(tagged.clone());

        let sel = selector(templates, history, rules);
        let outcome = sel
            .select(
                "u1",
                MessageCategory::Session,
                Language::En,
                &TemplateContext::default(),
            )
            .unwrap();
        assert_eq!(outcome.template.id, tagged.id);
        assert_eq!(
            outcome.variation_type,
            Some(VariationStrategy::TimingVariation)
        );
        assert_eq!(outcome.variation_tag.as_deref(), Some(bucket.label()));
        assert!(outcome.reasoning.contains("matches"));
    }

    /// History backend that fails every read but accepts writes.
    struct OfflineReadHistoryStore {
        inner: InMemoryHistoryStore,
    }

    impl HistoryStore for OfflineReadHistoryStore {
        fn list_since(
            &self,
            _user_id: &str,
            _since: DateTime<Utc>,
        ) -> NotifyResult<Vec<MessageHistoryEntry>> {
            Err(NotifyError::Store("history backend offline".to_string()))
        }

        fn append(&self, entry: MessageHistoryEntry) -> NotifyResult<MessageHistoryEntry> {
            self.inner.append(entry)
        }
    }

    #[test]
    fn test_store_error_degrades_to_first_active() {
        let templates = Arc::new(InMemoryTemplateStore::new());
        let first = make_template("first", Language::En, &[]);
        templates.insert(first.clone());
        templates.insert(make_template("second", Language::En, &[]));
        let history = Arc::new(OfflineReadHistoryStore {
            inner: InMemoryHistoryStore::new(),
        });

        let sel = VariationSelector::new(
            templates,
            Arc::clone(&history) as Arc<dyn HistoryStore>,
            Arc::new(InMemoryRuleStore::new()),
            NotifyConfig::default(),
        );
        let outcome = sel
            .select(
                "u1",
                MessageCategory::Session,
                Language::En,
                &TemplateContext::default(),
            )
            .unwrap();
        assert_eq!(outcome.template.id, first.id);
        assert!(!outcome.variation_applied);
        assert!(outcome
            .avoidance_reason
            .as_deref()
            .unwrap()
            .contains("history backend offline"));

        // The degraded outcome still leaves a history record behind
        let appended = history
            .inner
            .list_since("u1", Utc::now() - Duration::hours(1))
            .unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].template_id, first.id);
    }

    #[test]
    fn test_anti_repetition_bound_with_exhausted_pool() {
        let templates = Arc::new(InMemoryTemplateStore::new());
        let history = Arc::new(InMemoryHistoryStore::new());
        let rules = Arc::new(InMemoryRuleStore::new());
        rules.insert(VariationRule {
            message_type: MessageCategory::Session,
            min_interval_hours: 24,
            max_repetitions: 1,
            strategy: VariationStrategy::TemplateRotation,
            is_active: true,
        });
        templates.insert(make_template("a", Language::En, &[]));
        templates.insert(make_template("b", Language::En, &[]));

        let sel = selector(templates, history, rules);
        let ctx = TemplateContext::default();

        let first = sel
            .select("u1", MessageCategory::Session, Language::En, &ctx)
            .unwrap();
        assert!(first.avoidance_reason.is_none());
        let second = sel
            .select("u1", MessageCategory::Session, Language::En, &ctx)
            .unwrap();
        assert!(second.avoidance_reason.is_none());
        assert_ne!(first.template.id, second.template.id);

        // Third call: both templates at the cap; must degrade, not error
        let third = sel
            .select("u1", MessageCategory::Session, Language::En, &ctx)
            .unwrap();
        assert_eq!(
            third.avoidance_reason.as_deref(),
            Some("all templates exceeded usage limits")
        );
        assert!(!third.variation_applied);
    }

    #[test]
    fn test_content_variation_avoids_recent_hash() {
        let templates = Arc::new(InMemoryTemplateStore::new());
        let history = Arc::new(InMemoryHistoryStore::new());
        let rules = Arc::new(InMemoryRuleStore::new());
        rules.insert(VariationRule {
            message_type: MessageCategory::Session,
            min_interval_hours: 0,
            max_repetitions: 100,
            strategy: VariationStrategy::ContentVariation,
            is_active: true,
        });
        templates.insert(make_template_with_body(
            "greeting card",
            "{{custom.greeting}} {{custom.motivation}}",
        ));

        let sel = selector(templates, history.clone(), rules);
        let ctx = TemplateContext::default();
        let outcome = sel
            .select("u1", MessageCategory::Session, Language::En, &ctx)
            .unwrap();
        assert!(outcome.variation_applied);
        assert_eq!(
            outcome.variation_type,
            Some(VariationStrategy::ContentVariation)
        );
        assert!(outcome.variation_tag.is_some());
        assert!(!outcome.rendered.body.is_empty());
        // Selection appended exactly one history record
        let entries = history
            .list_since("u1", Utc::now() - Duration::hours(1))
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].content_hash,
            content_hash(&outcome.rendered.title, &outcome.rendered.body)
        );
    }

    #[test]
    fn test_content_variation_accepts_duplicate_on_exhaustion() {
        let templates = Arc::new(InMemoryTemplateStore::new());
        let history = Arc::new(InMemoryHistoryStore::new());
        let rules = Arc::new(InMemoryRuleStore::new());
        rules.insert(VariationRule {
            message_type: MessageCategory::Session,
            min_interval_hours: 0,
            max_repetitions: 100,
            strategy: VariationStrategy::ContentVariation,
            is_active: true,
        });
        // No phrase placeholders: every attempt hashes identically
        let template = make_template_with_body("static card", "always the same body");
        templates.insert(template.clone());

        let sel = selector(templates, history.clone(), rules);
        let ctx = TemplateContext::default();
        let first = sel
            .select("u1", MessageCategory::Session, Language::En, &ctx)
            .unwrap();
        // Second call collides on every attempt but still succeeds
        let second = sel
            .select("u1", MessageCategory::Session, Language::En, &ctx)
            .unwrap();
        assert_eq!(first.rendered, second.rendered);
        assert!(second.reasoning.contains("collided"));
    }

    #[test]
    fn test_no_templates_is_an_error() {
        let sel = selector(
            Arc::new(InMemoryTemplateStore::new()),
            Arc::new(InMemoryHistoryStore::new()),
            Arc::new(InMemoryRuleStore::new()),
        );
        let err = sel
            .select(
                "u1",
                MessageCategory::Session,
                Language::En,
                &TemplateContext::default(),
            )
            .unwrap_err();
        assert!(matches!(err, NotifyError::NoTemplateAvailable { .. }));
    }

    fn make_template_with_body(name: &str, body: &str) -> MessageTemplate {
        let mut t = make_template(name, Language::En, &[]);
        t.body_template = body.to_string();
        t
    }
}
