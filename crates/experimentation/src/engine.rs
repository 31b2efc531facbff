//! A/B testing engine — deterministic traffic-split assignment, per-variant
//! funnel counters, and winner/significance analysis.

use chrono::Utc;
use notify_core::error::{NotifyError, NotifyResult};
use notify_core::stores::AbTestStore;
use notify_core::types::{AbTestConfig, AbTestVariant, FunnelEvent, MessageCategory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Recommendation from analyzing an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestRecommendation {
    Stop,
    Extend,
    Continue,
}

/// Analysis of an experiment's current state. The first configured variant
/// acts as the control for improvement computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbTestAnalysis {
    pub test_id: Uuid,
    pub winner_variant_id: String,
    /// Winner click-rate improvement over control, in percent.
    pub improvement_pct: f64,
    pub is_significant: bool,
    pub recommendation: TestRecommendation,
    pub current_sample_size: u64,
    pub target_sample_size: u64,
    /// (variant id, click rate) pairs in configured order.
    pub variant_rates: Vec<(String, f64)>,
}

pub struct AbTestEngine {
    store: Arc<dyn AbTestStore>,
}

impl AbTestEngine {
    pub fn new(store: Arc<dyn AbTestStore>) -> Self {
        Self { store }
    }

    /// The single active test for a message type, if any.
    pub fn active_test(&self, message_type: MessageCategory) -> NotifyResult<Option<AbTestConfig>> {
        self.store.active_for(message_type)
    }

    /// Deterministically assign a user to a variant of `test`.
    ///
    /// The same (user, test configuration) pair always yields the same
    /// variant; changing the traffic split may reassign users.
    pub fn assign_variant<'a>(
        &self,
        user_id: &str,
        test: &'a AbTestConfig,
    ) -> Option<&'a AbTestVariant> {
        assign_variant(user_id, test)
    }

    /// Record a funnel event against a variant, recomputing derived rates
    /// and persisting the updated config. Read-modify-write without
    /// optimistic locking; counters are directional under contention.
    pub fn record_event(
        &self,
        test_id: &Uuid,
        variant_id: &str,
        event: FunnelEvent,
    ) -> NotifyResult<()> {
        let mut config = self
            .store
            .get(test_id)?
            .ok_or_else(|| NotifyError::Experiment(format!("test {} not found", test_id)))?;

        let variant = config
            .variants
            .iter_mut()
            .find(|v| v.id == variant_id)
            .ok_or_else(|| {
                NotifyError::Experiment(format!("variant {} not in test {}", variant_id, test_id))
            })?;

        match event {
            FunnelEvent::Sent => variant.metrics.sent += 1,
            FunnelEvent::Delivered => variant.metrics.delivered += 1,
            FunnelEvent::Opened => variant.metrics.opened += 1,
            FunnelEvent::Clicked => variant.metrics.clicked += 1,
        }

        let sent = variant.metrics.sent;
        variant.metrics.delivery_rate = safe_rate(variant.metrics.delivered, sent);
        variant.metrics.open_rate = safe_rate(variant.metrics.opened, sent);
        variant.metrics.click_rate = safe_rate(variant.metrics.clicked, sent);

        if event == FunnelEvent::Sent {
            config.current_sample_size += 1;
        }
        config.updated_at = Utc::now();

        debug!(test_id = %test_id, variant_id = %variant_id, ?event, "Recorded experiment event");
        self.store.update(config)
    }

    /// Analyze the experiment: pick the winner by click rate, compute the
    /// improvement over control, and derive a recommendation.
    pub fn analyze(&self, test_id: &Uuid) -> NotifyResult<AbTestAnalysis> {
        let config = self
            .store
            .get(test_id)?
            .ok_or_else(|| NotifyError::Experiment(format!("test {} not found", test_id)))?;

        if config.variants.is_empty() {
            return Err(NotifyError::Experiment(format!(
                "test {} has no variants",
                test_id
            )));
        }

        let control = &config.variants[0];
        let mut winner = control;
        for variant in &config.variants[1..] {
            if variant.metrics.click_rate > winner.metrics.click_rate {
                winner = variant;
            }
        }

        let improvement_pct = if winner.id == control.id || control.metrics.click_rate == 0.0 {
            0.0
        } else {
            (winner.metrics.click_rate - control.metrics.click_rate)
                / control.metrics.click_rate
                * 100.0
        };

        let target_reached = config.current_sample_size >= config.target_sample_size;
        let is_significant = target_reached && improvement_pct > 10.0;

        let recommendation = if (is_significant && improvement_pct > 20.0)
            || config.current_sample_size >= 2 * config.target_sample_size
            || (target_reached && improvement_pct < 5.0)
        {
            TestRecommendation::Stop
        } else if target_reached && improvement_pct > 5.0 && improvement_pct <= 10.0 {
            // Promising but below the significance threshold: gather more data.
            TestRecommendation::Extend
        } else {
            TestRecommendation::Continue
        };

        info!(
            test_id = %test_id,
            winner = %winner.id,
            improvement_pct,
            is_significant,
            ?recommendation,
            "Analyzed experiment"
        );

        Ok(AbTestAnalysis {
            test_id: config.id,
            winner_variant_id: winner.id.clone(),
            improvement_pct,
            is_significant,
            recommendation,
            current_sample_size: config.current_sample_size,
            target_sample_size: config.target_sample_size,
            variant_rates: config
                .variants
                .iter()
                .map(|v| (v.id.clone(), v.metrics.click_rate))
                .collect(),
        })
    }
}

/// Stable byte-fold hash of the user id reduced over the cumulative traffic
/// split. Collisions across users are tolerated.
pub fn assign_variant<'a>(user_id: &str, test: &'a AbTestConfig) -> Option<&'a AbTestVariant> {
    if test.variants.is_empty() || test.traffic_split.len() != test.variants.len() {
        return None;
    }
    let total: u64 = test.traffic_split.iter().map(|w| *w as u64).sum();
    if total == 0 {
        return None;
    }

    let hash = user_id
        .bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
    let bucket = hash % total;

    let mut cumulative = 0u64;
    for (variant, weight) in test.variants.iter().zip(&test.traffic_split) {
        cumulative += *weight as u64;
        if bucket < cumulative {
            return Some(variant);
        }
    }
    test.variants.last()
}

fn safe_rate(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
