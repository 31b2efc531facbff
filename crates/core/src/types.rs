//! Shared domain types for the notification generation pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ─── Templates ──────────────────────────────────────────────────────────

/// Category of message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    Session,
    Admin,
    System,
}

/// Supported display languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Fa,
    En,
}

/// Declared type of a template variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    String,
    Number,
    Date,
    Boolean,
}

/// Which context namespace a variable is expected to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableSource {
    User,
    Session,
    System,
    Custom,
}

/// Formatting style hint for dates and numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatStyle {
    Short,
    Medium,
    Long,
    Full,
    Currency,
    Percent,
}

/// Optional formatting spec attached to a variable declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariableFormat {
    pub style: Option<FormatStyle>,
    /// Free-form options blob, e.g. `{"decimals": 2}`.
    pub options: Option<serde_json::Value>,
}

/// A declared variable within a template, addressed by dot-path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateVariable {
    /// Dot-path into the context tree, e.g. `user.name`.
    pub name: String,
    pub var_type: VariableType,
    pub source: VariableSource,
    pub required: bool,
    pub default_value: Option<serde_json::Value>,
    pub format: Option<VariableFormat>,
}

/// A message template. Immutable once rendered; mutated only through
/// template-management operations outside this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub id: Uuid,
    pub name: String,
    pub category: MessageCategory,
    pub language: Language,
    pub title_template: String,
    pub body_template: String,
    pub action_text_template: Option<String>,
    pub action_url_template: Option<String>,
    pub variables: Vec<TemplateVariable>,
    /// Free-form tags; `morning` / `evening` etc. drive timing variation.
    pub tags: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values available for substitution, split into four open namespaces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateContext {
    pub user: HashMap<String, serde_json::Value>,
    pub session: HashMap<String, serde_json::Value>,
    pub system: HashMap<String, serde_json::Value>,
    pub custom: HashMap<String, serde_json::Value>,
}

impl TemplateContext {
    /// Resolve a dot-path against the context tree. The first segment picks
    /// the namespace; remaining segments descend through nested objects.
    /// Returns `None` on any missing key or non-object intermediate.
    pub fn resolve(&self, path: &str) -> Option<&serde_json::Value> {
        let mut segments = path.split('.');
        let namespace = match segments.next()? {
            "user" => &self.user,
            "session" => &self.session,
            "system" => &self.system,
            "custom" => &self.custom,
            _ => return None,
        };
        let mut current = namespace.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

/// Fully resolved output of a render. No placeholder syntax remains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedTemplate {
    pub title: String,
    pub body: String,
    pub action_text: Option<String>,
    pub action_url: Option<String>,
}

// ─── Message history ────────────────────────────────────────────────────

/// One append-only record per successful generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageHistoryEntry {
    pub id: Uuid,
    pub user_id: String,
    pub template_id: Uuid,
    pub message_type: MessageCategory,
    pub sent_at: DateTime<Utc>,
    pub variation_tag: Option<String>,
    /// Hash of rendered title+body, used for duplicate detection.
    pub content_hash: String,
}

// ─── Variation rules & pool ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationStrategy {
    TemplateRotation,
    ContentVariation,
    TimingVariation,
    Hybrid,
}

/// Anti-repetition rule for a message type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariationRule {
    pub message_type: MessageCategory,
    pub min_interval_hours: i64,
    pub max_repetitions: u32,
    pub strategy: VariationStrategy,
    pub is_active: bool,
}

impl VariationRule {
    /// Hard-coded fallback when no rule is configured for a message type.
    pub fn default_for(message_type: MessageCategory) -> Self {
        Self {
            message_type,
            min_interval_hours: 24,
            max_repetitions: 2,
            strategy: VariationStrategy::TemplateRotation,
            is_active: true,
        }
    }
}

/// Candidate templates for a message type annotated with per-user usage.
/// Derived fresh per selection call; never persisted.
#[derive(Debug, Clone)]
pub struct TemplatePool {
    pub message_type: MessageCategory,
    pub templates: Vec<MessageTemplate>,
    pub usage_history: HashMap<Uuid, u32>,
    pub last_used: HashMap<Uuid, DateTime<Utc>>,
}

// ─── A/B testing ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbTestStatus {
    Draft,
    Active,
    Paused,
    Completed,
}

/// Per-variant funnel counters and derived rates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantMetrics {
    pub sent: u64,
    pub delivered: u64,
    pub opened: u64,
    pub clicked: u64,
    pub delivery_rate: f64,
    pub open_rate: f64,
    pub click_rate: f64,
}

/// One arm of an experiment, mapped to a specific template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbTestVariant {
    pub id: String,
    pub template_id: Uuid,
    pub weight: u32,
    pub metrics: VariantMetrics,
}

/// Experiment configuration. At most one active test per message type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbTestConfig {
    pub id: Uuid,
    pub name: String,
    pub message_type: MessageCategory,
    pub status: AbTestStatus,
    pub variants: Vec<AbTestVariant>,
    /// Weights aligned with `variants` by index.
    pub traffic_split: Vec<u32>,
    pub target_sample_size: u64,
    pub current_sample_size: u64,
    pub confidence_level: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Funnel event recorded against a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelEvent {
    Sent,
    Delivered,
    Opened,
    Clicked,
}

// ─── Engagement ─────────────────────────────────────────────────────────

/// One delivery/open/click observation from the analytics source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementEvent {
    pub user_id: String,
    pub occurred_at: DateTime<Utc>,
    pub message_type: MessageCategory,
    /// 0–100 personalization score of the message that was sent.
    pub personalization_level: u32,
    pub delivered: bool,
    pub opened: bool,
    pub clicked: bool,
    /// Duration of the session the message related to, when known.
    pub session_minutes: Option<f64>,
}

/// Derived engagement summary for a user. Recomputed per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementPattern {
    pub average_session_duration: f64,
    /// Sessions per week over the analysis window.
    pub session_frequency: f64,
    pub preferred_time_of_day: TimeOfDay,
    pub response_rate: f64,
    pub click_through_rate: f64,
    /// 0–100 composite of delivery/open/click history.
    pub engagement_score: f64,
}

// ─── Profiles ───────────────────────────────────────────────────────────

/// Read-only user profile from the external profile source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub role: String,
    pub preferred_language: Language,
    pub session_count: u32,
    pub last_active_at: Option<DateTime<Utc>>,
}

// ─── Time-of-day buckets ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    /// Lowercase label used for template tag matching.
    pub fn label(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

// ─── Pipeline events ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyEventType {
    MessageGenerated,
    FallbackTriggered,
    VariantAssigned,
    ExperimentEvent,
    SelectionDegraded,
    TemplateRendered,
}

/// Event emitted into the monitoring pipeline via `EventSink`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyEvent {
    pub event_id: Uuid,
    pub event_type: NotifyEventType,
    pub user_id: Option<String>,
    pub message_type: Option<MessageCategory>,
    pub template_id: Option<Uuid>,
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// ─── Content hashing ────────────────────────────────────────────────────

/// Stable hash of rendered title+body for duplicate detection.
pub fn content_hash(title: &str, body: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_nested_path() {
        let mut ctx = TemplateContext::default();
        ctx.user.insert(
            "profile".to_string(),
            serde_json::json!({"address": {"city": "Tehran"}}),
        );
        assert_eq!(
            ctx.resolve("user.profile.address.city"),
            Some(&serde_json::json!("Tehran"))
        );
        assert_eq!(ctx.resolve("user.profile.missing"), None);
        // Descent through a scalar intermediate aborts to None
        assert_eq!(ctx.resolve("user.profile.address.city.extra"), None);
        assert_eq!(ctx.resolve("unknown.key"), None);
    }

    #[test]
    fn test_time_of_day_buckets() {
        assert_eq!(TimeOfDay::from_hour(8), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(14), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(19), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(2), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(23), TimeOfDay::Night);
    }

    #[test]
    fn test_content_hash_stable() {
        let a = content_hash("Hi", "Body");
        let b = content_hash("Hi", "Body");
        assert_eq!(a, b);
        assert_ne!(a, content_hash("Hi", "Other"));
        // Separator prevents title/body boundary ambiguity
        assert_ne!(content_hash("ab", "c"), content_hash("a", "bc"));
    }

    #[test]
    fn test_default_rule() {
        let rule = VariationRule::default_for(MessageCategory::Session);
        assert_eq!(rule.min_interval_hours, 24);
        assert_eq!(rule.max_repetitions, 2);
        assert_eq!(rule.strategy, VariationStrategy::TemplateRotation);
    }
}
