//! Collaborator store interfaces.
//!
//! The engines in this workspace hold `Arc<dyn ...>` handles to these traits
//! and never talk to a concrete backend directly. The in-memory
//! implementations here back the test suites and single-process deployments;
//! the host application substitutes its own persistence adapters.

use crate::error::{NotifyError, NotifyResult};
use crate::types::{
    AbTestConfig, AbTestStatus, EngagementEvent, Language, MessageCategory, MessageHistoryEntry,
    MessageTemplate, UserProfile, VariationRule,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

// ─── Traits ─────────────────────────────────────────────────────────────

pub trait TemplateStore: Send + Sync {
    /// Active templates matching category and language, in insertion order.
    fn list_active(
        &self,
        category: MessageCategory,
        language: Language,
    ) -> NotifyResult<Vec<MessageTemplate>>;

    fn get(&self, id: &Uuid) -> NotifyResult<Option<MessageTemplate>>;
}

pub trait HistoryStore: Send + Sync {
    /// A user's history entries with `sent_at >= since`, oldest first.
    fn list_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> NotifyResult<Vec<MessageHistoryEntry>>;

    /// Append-only; entries are never mutated after creation.
    fn append(&self, entry: MessageHistoryEntry) -> NotifyResult<MessageHistoryEntry>;
}

pub trait AbTestStore: Send + Sync {
    /// The single active test for a message type, if any.
    fn active_for(&self, message_type: MessageCategory) -> NotifyResult<Option<AbTestConfig>>;

    fn get(&self, id: &Uuid) -> NotifyResult<Option<AbTestConfig>>;

    /// Read-modify-write without optimistic locking; metric counters are
    /// directional, not exact-count-critical.
    fn update(&self, config: AbTestConfig) -> NotifyResult<()>;
}

pub trait RuleStore: Send + Sync {
    fn rule_for(&self, message_type: MessageCategory) -> NotifyResult<Option<VariationRule>>;
}

pub trait EngagementSource: Send + Sync {
    fn recent_events(&self, user_id: &str, window_days: i64)
        -> NotifyResult<Vec<EngagementEvent>>;
}

pub trait ProfileSource: Send + Sync {
    fn get_profile(&self, user_id: &str) -> NotifyResult<Option<UserProfile>>;
}

// ─── In-memory implementations ──────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryTemplateStore {
    templates: DashMap<Uuid, MessageTemplate>,
    /// Insertion order, so listing is deterministic.
    order: std::sync::Mutex<Vec<Uuid>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, template: MessageTemplate) {
        self.order
            .lock()
            .expect("template order mutex poisoned")
            .push(template.id);
        self.templates.insert(template.id, template);
    }
}

impl TemplateStore for InMemoryTemplateStore {
    fn list_active(
        &self,
        category: MessageCategory,
        language: Language,
    ) -> NotifyResult<Vec<MessageTemplate>> {
        let order = self
            .order
            .lock()
            .map_err(|_| NotifyError::Store("template order mutex poisoned".to_string()))?;
        Ok(order
            .iter()
            .filter_map(|id| self.templates.get(id).map(|t| t.clone()))
            .filter(|t| t.is_active && t.category == category && t.language == language)
            .collect())
    }

    fn get(&self, id: &Uuid) -> NotifyResult<Option<MessageTemplate>> {
        Ok(self.templates.get(id).map(|t| t.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryHistoryStore {
    entries: DashMap<String, Vec<MessageHistoryEntry>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn list_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> NotifyResult<Vec<MessageHistoryEntry>> {
        Ok(self
            .entries
            .get(user_id)
            .map(|v| {
                v.iter()
                    .filter(|e| e.sent_at >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn append(&self, entry: MessageHistoryEntry) -> NotifyResult<MessageHistoryEntry> {
        self.entries
            .entry(entry.user_id.clone())
            .or_default()
            .push(entry.clone());
        Ok(entry)
    }
}

#[derive(Default)]
pub struct InMemoryAbTestStore {
    tests: DashMap<Uuid, AbTestConfig>,
}

impl InMemoryAbTestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, config: AbTestConfig) {
        self.tests.insert(config.id, config);
    }
}

impl AbTestStore for InMemoryAbTestStore {
    fn active_for(&self, message_type: MessageCategory) -> NotifyResult<Option<AbTestConfig>> {
        Ok(self
            .tests
            .iter()
            .find(|t| t.message_type == message_type && t.status == AbTestStatus::Active)
            .map(|t| t.clone()))
    }

    fn get(&self, id: &Uuid) -> NotifyResult<Option<AbTestConfig>> {
        Ok(self.tests.get(id).map(|t| t.clone()))
    }

    fn update(&self, config: AbTestConfig) -> NotifyResult<()> {
        self.tests.insert(config.id, config);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRuleStore {
    rules: DashMap<MessageCategory, VariationRule>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, rule: VariationRule) {
        self.rules.insert(rule.message_type, rule);
    }
}

impl RuleStore for InMemoryRuleStore {
    fn rule_for(&self, message_type: MessageCategory) -> NotifyResult<Option<VariationRule>> {
        Ok(self
            .rules
            .get(&message_type)
            .filter(|r| r.is_active)
            .map(|r| r.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryEngagementSource {
    events: DashMap<String, Vec<EngagementEvent>>,
}

impl InMemoryEngagementSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: EngagementEvent) {
        self.events
            .entry(event.user_id.clone())
            .or_default()
            .push(event);
    }
}

impl EngagementSource for InMemoryEngagementSource {
    fn recent_events(
        &self,
        user_id: &str,
        window_days: i64,
    ) -> NotifyResult<Vec<EngagementEvent>> {
        let cutoff = Utc::now() - chrono::Duration::days(window_days);
        Ok(self
            .events
            .get(user_id)
            .map(|v| {
                v.iter()
                    .filter(|e| e.occurred_at >= cutoff)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InMemoryProfileSource {
    profiles: DashMap<String, UserProfile>,
}

impl InMemoryProfileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: UserProfile) {
        self.profiles.insert(profile.id.clone(), profile);
    }
}

impl ProfileSource for InMemoryProfileSource {
    fn get_profile(&self, user_id: &str) -> NotifyResult<Option<UserProfile>> {
        Ok(self.profiles.get(user_id).map(|p| p.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::content_hash;
    use chrono::Duration;

    fn make_template(name: &str, language: Language) -> MessageTemplate {
        let now = Utc::now();
        MessageTemplate {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: MessageCategory::Session,
            language,
            title_template: "T".to_string(),
            body_template: "B".to_string(),
            action_text_template: None,
            action_url_template: None,
            variables: Vec::new(),
            tags: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_template_store_filters_and_preserves_order() {
        let store = InMemoryTemplateStore::new();
        store.insert(make_template("first", Language::En));
        store.insert(make_template("second", Language::En));
        let mut inactive = make_template("third", Language::En);
        inactive.is_active = false;
        store.insert(inactive);
        store.insert(make_template("farsi", Language::Fa));

        let listed = store
            .list_active(MessageCategory::Session, Language::En)
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "first");
        assert_eq!(listed[1].name, "second");
    }

    #[test]
    fn test_history_store_window() {
        let store = InMemoryHistoryStore::new();
        let old = MessageHistoryEntry {
            id: Uuid::new_v4(),
            user_id: "u1".to_string(),
            template_id: Uuid::new_v4(),
            message_type: MessageCategory::Session,
            sent_at: Utc::now() - Duration::days(40),
            variation_tag: None,
            content_hash: content_hash("a", "b"),
        };
        let recent = MessageHistoryEntry {
            sent_at: Utc::now() - Duration::hours(1),
            ..old.clone()
        };
        store.append(old).unwrap();
        store.append(recent).unwrap();

        let window = store
            .list_since("u1", Utc::now() - Duration::days(30))
            .unwrap();
        assert_eq!(window.len(), 1);
        assert!(store
            .list_since("unknown", Utc::now() - Duration::days(30))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_ab_store_active_lookup() {
        let store = InMemoryAbTestStore::new();
        let now = Utc::now();
        let mut config = AbTestConfig {
            id: Uuid::new_v4(),
            name: "subject line test".to_string(),
            message_type: MessageCategory::Session,
            status: AbTestStatus::Draft,
            variants: Vec::new(),
            traffic_split: Vec::new(),
            target_sample_size: 100,
            current_sample_size: 0,
            confidence_level: 0.95,
            created_at: now,
            updated_at: now,
        };
        store.insert(config.clone());
        assert!(store
            .active_for(MessageCategory::Session)
            .unwrap()
            .is_none());

        config.status = AbTestStatus::Active;
        store.update(config.clone()).unwrap();
        let active = store.active_for(MessageCategory::Session).unwrap().unwrap();
        assert_eq!(active.id, config.id);
    }

    #[test]
    fn test_rule_store_ignores_inactive() {
        let store = InMemoryRuleStore::new();
        let mut rule = VariationRule::default_for(MessageCategory::Admin);
        rule.is_active = false;
        store.insert(rule);
        assert!(store.rule_for(MessageCategory::Admin).unwrap().is_none());
    }
}
