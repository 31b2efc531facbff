//! History & pool builder — combines candidate templates with a user's
//! recent send history into a per-call template pool.

use chrono::{Duration, Utc};
use notify_core::error::NotifyResult;
use notify_core::stores::{HistoryStore, TemplateStore};
use notify_core::types::{Language, MessageCategory, TemplatePool};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Builds a fresh `TemplatePool` per selection call. Concurrent builds for
/// the same user read a history snapshot and may be slightly stale.
pub struct PoolBuilder {
    template_store: Arc<dyn TemplateStore>,
    history_store: Arc<dyn HistoryStore>,
    history_window_days: i64,
}

impl PoolBuilder {
    pub fn new(
        template_store: Arc<dyn TemplateStore>,
        history_store: Arc<dyn HistoryStore>,
        history_window_days: i64,
    ) -> Self {
        Self {
            template_store,
            history_store,
            history_window_days,
        }
    }

    /// Fetch active templates for (category, language) and, when a user is
    /// given, annotate the pool with usage counts and last-used timestamps
    /// over the trailing history window. No language fallback here; that
    /// happens one level up.
    pub fn build(
        &self,
        message_type: MessageCategory,
        language: Language,
        user_id: Option<&str>,
    ) -> NotifyResult<TemplatePool> {
        let templates = self.template_store.list_active(message_type, language)?;

        let mut usage_history: HashMap<uuid::Uuid, u32> = HashMap::new();
        let mut last_used = HashMap::new();

        if let Some(user_id) = user_id {
            let since = Utc::now() - Duration::days(self.history_window_days);
            for entry in self.history_store.list_since(user_id, since)? {
                if entry.message_type != message_type {
                    continue;
                }
                *usage_history.entry(entry.template_id).or_insert(0) += 1;
                last_used
                    .entry(entry.template_id)
                    .and_modify(|t| {
                        if entry.sent_at > *t {
                            *t = entry.sent_at;
                        }
                    })
                    .or_insert(entry.sent_at);
            }
        }

        debug!(
            ?message_type,
            ?language,
            templates = templates.len(),
            used = usage_history.len(),
            "Built template pool"
        );

        Ok(TemplatePool {
            message_type,
            templates,
            usage_history,
            last_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{history_entry, make_template};
    use notify_core::stores::{InMemoryHistoryStore, InMemoryTemplateStore};

    #[test]
    fn test_pool_aggregates_usage_and_last_used() {
        let templates = Arc::new(InMemoryTemplateStore::new());
        let history = Arc::new(InMemoryHistoryStore::new());

        let t1 = make_template("reminder a", Language::En, &[]);
        let t2 = make_template("reminder b", Language::En, &[]);
        templates.insert(t1.clone());
        templates.insert(t2.clone());

        let older = Utc::now() - Duration::hours(30);
        let newer = Utc::now() - Duration::hours(2);
        history.append(history_entry("u1", t1.id, older)).unwrap();
        history.append(history_entry("u1", t1.id, newer)).unwrap();
        // Outside the 30 day window; must not count
        history
            .append(history_entry("u1", t2.id, Utc::now() - Duration::days(45)))
            .unwrap();

        let builder = PoolBuilder::new(templates, history, 30);
        let pool = builder
            .build(MessageCategory::Session, Language::En, Some("u1"))
            .unwrap();

        assert_eq!(pool.templates.len(), 2);
        assert_eq!(pool.usage_history.get(&t1.id), Some(&2));
        assert_eq!(pool.usage_history.get(&t2.id), None);
        assert_eq!(pool.last_used.get(&t1.id), Some(&newer));
    }

    #[test]
    fn test_pool_without_user_has_no_usage() {
        let templates = Arc::new(InMemoryTemplateStore::new());
        templates.insert(make_template("reminder", Language::En, &[]));
        let builder = PoolBuilder::new(templates, Arc::new(InMemoryHistoryStore::new()), 30);

        let pool = builder
            .build(MessageCategory::Session, Language::En, None)
            .unwrap();
        assert_eq!(pool.templates.len(), 1);
        assert!(pool.usage_history.is_empty());
        assert!(pool.last_used.is_empty());
    }

    #[test]
    fn test_pool_no_language_fallback() {
        let templates = Arc::new(InMemoryTemplateStore::new());
        templates.insert(make_template("farsi only", Language::Fa, &[]));
        let builder = PoolBuilder::new(templates, Arc::new(InMemoryHistoryStore::new()), 30);

        let pool = builder
            .build(MessageCategory::Session, Language::En, None)
            .unwrap();
        assert!(pool.templates.is_empty());
    }
}
