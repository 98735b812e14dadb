use std::env;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_i32(profile: &str, key: &str, default: i32) -> i32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub notify: NotifyConfig,
    pub monitor: MonitorConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SLOTWATCH_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SLOTWATCH_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            notify: NotifyConfig::from_env_profiled(p),
            monitor: MonitorConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  notify:   report={}, alert={}",
            configured(&self.notify.report_webhook),
            configured(&self.notify.alert_webhook)
        );
        tracing::info!(
            "  monitor:  targets={}, timeout={}s, utc_offset={}h",
            self.monitor.targets_path.display(),
            self.monitor.page_timeout_secs,
            self.monitor.utc_offset_hours
        );
    }
}

fn configured(value: &Option<String>) -> &'static str {
    if value.is_some() { "configured" } else { "not configured" }
}

// ── Notification channels ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Digest and error reports. Absent means deliveries are skipped.
    pub report_webhook: Option<String>,
    /// Urgent alerts. Absent means deliveries are skipped.
    pub alert_webhook: Option<String>,
    pub report_username: String,
    pub alert_username: String,
    /// Broadcast mention placed in alert payloads.
    pub alert_mention: String,
}

impl NotifyConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            report_webhook: profiled_env_opt(p, "WEBHOOK_URL"),
            alert_webhook: profiled_env_opt(p, "ALERT_WEBHOOK_URL"),
            report_username: profiled_env_or(p, "REPORT_USERNAME", "Slot Monitor"),
            alert_username: profiled_env_or(p, "ALERT_USERNAME", "🚨 Slot Alert 🚨"),
            alert_mention: profiled_env_or(p, "ALERT_MENTION", "@everyone"),
        }
    }
}

// ── Monitor ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Deployment YAML listing targets and state selectors.
    pub targets_path: PathBuf,
    /// Bounded wait for each page load.
    pub page_timeout_secs: u64,
    /// Offset applied to human-facing timestamps.
    pub utc_offset_hours: i32,
}

impl MonitorConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            targets_path: PathBuf::from(profiled_env_or(
                p,
                "SLOTWATCH_TARGETS",
                "config/targets.yml",
            )),
            page_timeout_secs: profiled_env_u64(p, "PAGE_TIMEOUT_SECS", 30),
            utc_offset_hours: profiled_env_i32(p, "REPORT_UTC_OFFSET_HOURS", 9),
        }
    }

    /// Fixed offset for report timestamps; out-of-range values fall back to UTC.
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Current time in the report offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_prefixed_key_wins() {
        std::env::set_var("SWTEST_WEBHOOK_URL", "https://hooks.test/prod");
        std::env::set_var("SWTEST_PAGE_TIMEOUT_SECS", "5");
        let config = Config::for_profile("swtest");
        assert_eq!(config.profile, "SWTEST");
        assert_eq!(
            config.notify.report_webhook.as_deref(),
            Some("https://hooks.test/prod")
        );
        assert_eq!(config.monitor.page_timeout_secs, 5);
        std::env::remove_var("SWTEST_WEBHOOK_URL");
        std::env::remove_var("SWTEST_PAGE_TIMEOUT_SECS");
    }

    #[test]
    fn empty_value_is_absent() {
        std::env::set_var("SWEMPTY_ALERT_WEBHOOK_URL", "");
        assert_eq!(profiled_env_opt("SWEMPTY", "ALERT_WEBHOOK_URL_UNSET_XYZ"), None);
        assert_eq!(env_opt("SWEMPTY_ALERT_WEBHOOK_URL"), None);
        std::env::remove_var("SWEMPTY_ALERT_WEBHOOK_URL");
    }

    #[test]
    fn offset_out_of_range_falls_back_to_utc() {
        let monitor = MonitorConfig {
            targets_path: PathBuf::from("x.yml"),
            page_timeout_secs: 30,
            utc_offset_hours: 99,
        };
        assert_eq!(monitor.offset().local_minus_utc(), 0);
    }

    #[test]
    fn default_offset_is_nine_hours() {
        let monitor = MonitorConfig {
            targets_path: PathBuf::from("x.yml"),
            page_timeout_secs: 30,
            utc_offset_hours: 9,
        };
        assert_eq!(monitor.offset().local_minus_utc(), 9 * 3600);
    }
}
