//! Application configuration.
//!
//! Secrets come from the environment (`.env` is loaded in `main`); every
//! numeric setting is a compile-time constant.

use ratewatch_core::{AssetPair, CoreError, RetryPolicy, ThresholdConfig};
use std::time::Duration;

pub const UPPER_THRESHOLD: f64 = 5135.2;
pub const LOWER_THRESHOLD: f64 = 2992.61;
/// Alert 10% before a threshold is reached.
pub const PRICE_MARGIN: f64 = 0.10;
pub const ALERT_COOLDOWN: Duration = Duration::from_secs(3600);

pub const PRICE_CHECK_INTERVAL: Duration = Duration::from_secs(300);
pub const MESSAGE_CHECK_INTERVAL: Duration = Duration::from_secs(1);
pub const RETRY_DELAY: Duration = Duration::from_secs(30);
pub const MAX_ATTEMPTS: u32 = 3;
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
pub const LONG_POLL: Duration = Duration::from_secs(30);

const PLACEHOLDER_BOT_TOKEN: &str = "123456789:ABCDEF1234567890abcdef1234567890";
const PLACEHOLDER_CHAT_ID: &str = "222222222";

/// Loop cadence shared by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTimings {
    pub price_check_interval: Duration,
    pub message_check_interval: Duration,
    pub retry_delay: Duration,
}

impl Default for LoopTimings {
    fn default() -> Self {
        Self {
            price_check_interval: PRICE_CHECK_INTERVAL,
            message_check_interval: MESSAGE_CHECK_INTERVAL,
            retry_delay: RETRY_DELAY,
        }
    }
}

/// Application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Telegram bot token (`TELEGRAM_BOT_TOKEN`).
    pub bot_token: String,
    /// Only chat that receives alerts and may send commands (`TELEGRAM_CHAT_ID`).
    pub chat_id: String,
    pub pair: AssetPair,
    pub thresholds: ThresholdConfig,
    pub timings: LoopTimings,
    pub retry: RetryPolicy,
    pub http_timeout: Duration,
    pub long_poll: Duration,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("chat_id", &self.chat_id)
            .field("pair", &self.pair)
            .field("thresholds", &self.thresholds)
            .field("timings", &self.timings)
            .field("retry", &self.retry)
            .field("http_timeout", &self.http_timeout)
            .field("long_poll", &self.long_poll)
            .finish()
    }
}

impl AppConfig {
    /// Build the configuration with the given secrets.
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self, CoreError> {
        Ok(Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            pair: AssetPair::erg_eth(),
            thresholds: ThresholdConfig::new(
                UPPER_THRESHOLD,
                LOWER_THRESHOLD,
                PRICE_MARGIN,
                ALERT_COOLDOWN,
            )?,
            timings: LoopTimings::default(),
            retry: RetryPolicy::new(MAX_ATTEMPTS, RETRY_DELAY),
            http_timeout: HTTP_TIMEOUT,
            long_poll: LONG_POLL,
        })
    }

    /// Read secrets from `TELEGRAM_BOT_TOKEN` / `TELEGRAM_CHAT_ID`,
    /// falling back to placeholders when unset or empty.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let read = |key: &str, fallback: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };
        Self::new(
            read("TELEGRAM_BOT_TOKEN", PLACEHOLDER_BOT_TOKEN),
            read("TELEGRAM_CHAT_ID", PLACEHOLDER_CHAT_ID),
        )
    }

    /// True when either secret is still the built-in placeholder.
    pub fn uses_placeholders(&self) -> bool {
        self.bot_token == PLACEHOLDER_BOT_TOKEN || self.chat_id == PLACEHOLDER_CHAT_ID
    }
}
