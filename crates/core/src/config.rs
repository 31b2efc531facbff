use serde::Deserialize;

/// Generation engine configuration. Deserialized from the host
/// application's config tree; every field has a sensible default.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Trailing window of message history used to build template pools.
    #[serde(default = "default_history_window_days")]
    pub history_window_days: i64,
    /// Window for content-hash duplicate detection during content variation.
    #[serde(default = "default_duplicate_window_days")]
    pub duplicate_window_days: i64,
    /// Maximum phrase-substitution attempts before accepting a duplicate.
    #[serde(default = "default_variation_attempts")]
    pub max_variation_attempts: u32,
    /// Trailing window of engagement events analyzed per user.
    #[serde(default = "default_engagement_window_days")]
    pub engagement_window_days: i64,
    /// Number of renders produced in multi-variant mode when the request
    /// does not specify a count.
    #[serde(default = "default_variation_count")]
    pub default_variation_count: u32,
    /// Application name exposed under `system.app_name` in every context.
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            history_window_days: default_history_window_days(),
            duplicate_window_days: default_duplicate_window_days(),
            max_variation_attempts: default_variation_attempts(),
            engagement_window_days: default_engagement_window_days(),
            default_variation_count: default_variation_count(),
            app_name: default_app_name(),
        }
    }
}

fn default_history_window_days() -> i64 {
    30
}

fn default_duplicate_window_days() -> i64 {
    7
}

fn default_variation_attempts() -> u32 {
    5
}

fn default_engagement_window_days() -> i64 {
    30
}

fn default_variation_count() -> u32 {
    3
}

fn default_app_name() -> String {
    "NotifyExpress".to_string()
}
