//! Engagement analyzer — aggregates a user's delivery/open/click history
//! into per-dimension engagement rates and a scored recommendation.

use chrono::{Datelike, Timelike, Weekday};
use notify_core::error::NotifyResult;
use notify_core::stores::EngagementSource;
use notify_core::types::{EngagementEvent, EngagementPattern, MessageCategory, TimeOfDay};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Personalization-level tercile of a sent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalizationLevel {
    Low,
    Medium,
    High,
}

impl PersonalizationLevel {
    pub fn from_score(score: u32) -> Self {
        if score < 40 {
            PersonalizationLevel::Low
        } else if score > 70 {
            PersonalizationLevel::High
        } else {
            PersonalizationLevel::Medium
        }
    }
}

/// Sent/opened/clicked tally for one bucket of a dimension.
#[derive(Debug, Clone, Copy, Default)]
struct BucketStats {
    sent: u64,
    opened: u64,
    clicked: u64,
}

impl BucketStats {
    fn record(&mut self, event: &EngagementEvent) {
        self.sent += 1;
        if event.opened {
            self.opened += 1;
        }
        if event.clicked {
            self.clicked += 1;
        }
    }

    /// Weighted engagement rate: clicks count double.
    fn rate(&self) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            (self.opened as f64 + 2.0 * self.clicked as f64) / self.sent as f64
        }
    }
}

/// Recommendation derived from a user's engagement history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRecommendation {
    pub user_id: String,
    pub best_time_of_day: TimeOfDay,
    /// Up to three best days, highest engagement first.
    pub best_days: Vec<Weekday>,
    pub best_message_type: MessageCategory,
    pub best_personalization: PersonalizationLevel,
    /// Step function of the total sample size.
    pub confidence: u32,
    pub reasoning: Vec<String>,
    pub pattern: EngagementPattern,
    pub sample_size: u64,
}

pub struct EngagementAnalyzer {
    source: Arc<dyn EngagementSource>,
}

impl EngagementAnalyzer {
    pub fn new(source: Arc<dyn EngagementSource>) -> Self {
        Self { source }
    }

    /// Analyze a user's trailing engagement window. Returns `None` when the
    /// window holds no events.
    pub fn analyze(
        &self,
        user_id: &str,
        window_days: i64,
    ) -> NotifyResult<Option<OptimizationRecommendation>> {
        let events = self.source.recent_events(user_id, window_days)?;
        if events.is_empty() {
            return Ok(None);
        }

        let mut by_time: HashMap<TimeOfDay, BucketStats> = HashMap::new();
        let mut by_day: HashMap<Weekday, BucketStats> = HashMap::new();
        let mut by_type: HashMap<MessageCategory, BucketStats> = HashMap::new();
        let mut by_level: HashMap<PersonalizationLevel, BucketStats> = HashMap::new();

        for event in &events {
            by_time
                .entry(TimeOfDay::from_hour(event.occurred_at.hour()))
                .or_default()
                .record(event);
            by_day
                .entry(event.occurred_at.weekday())
                .or_default()
                .record(event);
            by_type.entry(event.message_type).or_default().record(event);
            by_level
                .entry(PersonalizationLevel::from_score(event.personalization_level))
                .or_default()
                .record(event);
        }

        let best_time = argmax(&by_time).unwrap_or(TimeOfDay::Morning);
        let best_days = top_n(&by_day, 3);
        let best_type = argmax(&by_type).unwrap_or(MessageCategory::Session);
        let best_level = argmax(&by_level).unwrap_or(PersonalizationLevel::Medium);

        let mut reasoning = Vec::new();
        if let Some(rate) = by_time.get(&best_time).map(BucketStats::rate) {
            if rate > 0.0 {
                reasoning.push(format!(
                    "highest engagement in the {} (rate {:.2})",
                    best_time.label(),
                    rate
                ));
            }
        }
        if let Some(first) = best_days.first() {
            let rate = by_day.get(first).map(BucketStats::rate).unwrap_or(0.0);
            if rate > 0.0 {
                reasoning.push(format!(
                    "best days: {} (top rate {:.2})",
                    best_days
                        .iter()
                        .map(|d| d.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    rate
                ));
            }
        }
        if let Some(rate) = by_type.get(&best_type).map(BucketStats::rate) {
            if rate > 0.0 {
                reasoning.push(format!(
                    "{:?} messages engage best (rate {:.2})",
                    best_type, rate
                ));
            }
        }
        if let Some(rate) = by_level.get(&best_level).map(BucketStats::rate) {
            if rate > 0.0 {
                reasoning.push(format!(
                    "{:?} personalization engages best (rate {:.2})",
                    best_level, rate
                ));
            }
        }

        let sample_size = events.len() as u64;
        let pattern = derive_pattern(&events, best_time, window_days);

        debug!(
            user_id = %user_id,
            sample_size,
            confidence = confidence_for(sample_size),
            "Analyzed engagement history"
        );

        Ok(Some(OptimizationRecommendation {
            user_id: user_id.to_string(),
            best_time_of_day: best_time,
            best_days,
            best_message_type: best_type,
            best_personalization: best_level,
            confidence: confidence_for(sample_size),
            reasoning,
            pattern,
            sample_size,
        }))
    }
}

/// Confidence step function over the total sample size.
pub fn confidence_for(sample_size: u64) -> u32 {
    match sample_size {
        n if n >= 100 => 95,
        n if n >= 50 => 80,
        n if n >= 20 => 60,
        n if n >= 10 => 40,
        _ => 20,
    }
}

/// Canonical bucket order, used to break rate ties. HashMap iteration
/// order alone would make recommendations flap between runs.
trait BucketRank {
    fn bucket_rank(&self) -> usize;
}

impl BucketRank for TimeOfDay {
    fn bucket_rank(&self) -> usize {
        match self {
            TimeOfDay::Morning => 0,
            TimeOfDay::Afternoon => 1,
            TimeOfDay::Evening => 2,
            TimeOfDay::Night => 3,
        }
    }
}

impl BucketRank for Weekday {
    fn bucket_rank(&self) -> usize {
        self.num_days_from_monday() as usize
    }
}

impl BucketRank for MessageCategory {
    fn bucket_rank(&self) -> usize {
        match self {
            MessageCategory::Session => 0,
            MessageCategory::Admin => 1,
            MessageCategory::System => 2,
        }
    }
}

impl BucketRank for PersonalizationLevel {
    fn bucket_rank(&self) -> usize {
        match self {
            PersonalizationLevel::Low => 0,
            PersonalizationLevel::Medium => 1,
            PersonalizationLevel::High => 2,
        }
    }
}

fn argmax<K: Copy + Eq + std::hash::Hash + BucketRank>(
    buckets: &HashMap<K, BucketStats>,
) -> Option<K> {
    let mut best: Option<(K, f64)> = None;
    for (key, stats) in buckets {
        let rate = stats.rate();
        let better = match best {
            None => true,
            Some((b, r)) => rate > r || (rate == r && key.bucket_rank() < b.bucket_rank()),
        };
        if better {
            best = Some((*key, rate));
        }
    }
    best.map(|(k, _)| k)
}

fn top_n<K: Copy + Eq + std::hash::Hash + BucketRank>(
    buckets: &HashMap<K, BucketStats>,
    n: usize,
) -> Vec<K> {
    let mut ranked: Vec<(K, f64)> = buckets.iter().map(|(k, s)| (*k, s.rate())).collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.bucket_rank().cmp(&b.0.bucket_rank()))
    });
    ranked.into_iter().take(n).map(|(k, _)| k).collect()
}

fn derive_pattern(
    events: &[EngagementEvent],
    preferred_time: TimeOfDay,
    window_days: i64,
) -> EngagementPattern {
    let sent = events.len() as f64;
    let delivered = events.iter().filter(|e| e.delivered).count() as f64;
    let opened = events.iter().filter(|e| e.opened).count() as f64;
    let clicked = events.iter().filter(|e| e.clicked).count() as f64;

    let durations: Vec<f64> = events.iter().filter_map(|e| e.session_minutes).collect();
    let average_session_duration = if durations.is_empty() {
        0.0
    } else {
        durations.iter().sum::<f64>() / durations.len() as f64
    };

    let weeks = (window_days as f64 / 7.0).max(1.0);
    let response_rate = opened / sent;
    let click_through_rate = clicked / sent;
    // Delivery 20%, opens 40%, clicks 40%; each rate is in [0, 1].
    let engagement_score =
        (delivered / sent) * 20.0 + response_rate * 40.0 + click_through_rate * 40.0;

    EngagementPattern {
        average_session_duration,
        session_frequency: sent / weeks,
        preferred_time_of_day: preferred_time,
        response_rate,
        click_through_rate,
        engagement_score: engagement_score.clamp(0.0, 100.0),
    }
}
