//! Configuration management

use crate::error::Result;
use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub feeds: FeedConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    /// Offset of the reporting day from UTC, in hours
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram: None,
            feeds: FeedConfig::default(),
            schedule: ScheduleConfig::default(),
            storage: StorageConfig::default(),
            performance: PerformanceConfig::default(),
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    #[serde(default = "default_true")]
    pub disable_preview: bool,
}

/// Upstream data sources
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_live_url")]
    pub live_url: String,
    #[serde(default = "default_links_url")]
    pub links_url: String,
    #[serde(default = "default_ended_url")]
    pub ended_url: String,
    /// Template with `{player1}` and `{player2}` placeholders
    #[serde(default = "default_h2h_url")]
    pub h2h_url: String,
    pub auth_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_ended_page_limit")]
    pub ended_page_limit: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            live_url: default_live_url(),
            links_url: default_links_url(),
            ended_url: default_ended_url(),
            h2h_url: default_h2h_url(),
            auth_token: None,
            timeout_secs: default_timeout_secs(),
            ended_page_limit: default_ended_page_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_settle_interval_secs")]
    pub settle_interval_secs: u64,
    #[serde(default = "default_max_concurrent_matches")]
    pub max_concurrent_matches: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            settle_interval_secs: default_settle_interval_secs(),
            max_concurrent_matches: default_max_concurrent_matches(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_dedup_file")]
    pub dedup_file: String,
    #[serde(default = "default_ledger_file")]
    pub ledger_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dedup_file: default_dedup_file(),
            ledger_file: default_ledger_file(),
        }
    }
}

impl StorageConfig {
    pub fn dedup_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.dedup_file).into_owned())
    }

    pub fn ledger_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.ledger_file).into_owned())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceConfig {
    #[serde(default = "default_summary_title")]
    pub title: String,
    /// Delete the previous summary message after posting a new one
    #[serde(default)]
    pub replace_previous_summary: bool,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            title: default_summary_title(),
            replace_previous_summary: false,
        }
    }
}

fn default_true() -> bool { true }
fn default_utc_offset_hours() -> i32 { -4 }
fn default_live_url() -> String { "https://caveira-proxy.onrender.com/api/matches/live".to_string() }
fn default_links_url() -> String { "https://esoccer.dev3.caveira.tips/v1/esoccer/inplay".to_string() }
fn default_ended_url() -> String { "https://api-v2.green365.com.br/api/v2/sport-events".to_string() }
fn default_h2h_url() -> String {
    "https://caveira-proxy.onrender.com/api/v1/historico/confronto/{player1}/{player2}?page=1&limit=10".to_string()
}
fn default_timeout_secs() -> u64 { 10 }
fn default_ended_page_limit() -> u32 { 150 }
fn default_poll_interval_secs() -> u64 { 15 }
fn default_settle_interval_secs() -> u64 { 300 }
fn default_max_concurrent_matches() -> usize { 8 }
fn default_dedup_file() -> String { "data/sent_keys.json".to_string() }
fn default_ledger_file() -> String { "data/ledger.json".to_string() }
fn default_summary_title() -> String { "Esoccer Tips".to_string() }

impl Config {
    /// Load configuration from file and environment
    ///
    /// Environment variables use the `ESOCCER_` prefix with `__` between
    /// nested keys, e.g. `ESOCCER_TELEGRAM__BOT_TOKEN`.
    pub fn load(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = ::config::Config::builder()
            .add_source(::config::File::with_name(path).required(false))
            .add_source(
                ::config::Environment::with_prefix("ESOCCER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Reporting-day offset, clamped to a valid range
    pub fn utc_offset(&self) -> FixedOffset {
        let hours = self.utc_offset_hours.clamp(-23, 23);
        FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix())
    }
}
