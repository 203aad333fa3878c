//! ratewatch - ETH/ERG price alert bot
//!
//! Polls CoinGecko for the ETH/ERG cross-rate, alerts a Telegram chat when it
//! nears the configured range edges and answers `p` with the current rate.

mod config;
mod scheduler;

use config::AppConfig;
use ratewatch_alerts::{
    AlertEngine, CommandListener, EventSink, Notifier, PriceMonitor, TelegramClient, TracingSink,
};
use ratewatch_feeds::{CoinGeckoClient, PriceSource};
use scheduler::{spawn_loops, wait_for_stop_signal, Shutdown};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_logging();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return;
        }
    };

    info!("🚀 ratewatch starting...");
    info!("  Pair: {}", config.pair.cross_label());
    info!(
        "  Range: {} - {} (margin {}%)",
        config.thresholds.lower(),
        config.thresholds.upper(),
        config.thresholds.margin_fraction() * 100.0
    );
    info!(
        "  Price check every {}s, cooldown {}s",
        config.timings.price_check_interval.as_secs(),
        config.thresholds.cooldown().as_secs()
    );
    if config.uses_placeholders() {
        warn!("TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID not set, using placeholder credentials");
    }

    let quotes = match CoinGeckoClient::new(config.http_timeout) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!(error = %e, "Failed to build price client");
            return;
        }
    };
    let telegram = Arc::new(TelegramClient::new(
        &config.bot_token,
        config.http_timeout,
        config.long_poll,
    ));

    let source = Arc::new(PriceSource::new(quotes, config.pair.clone(), config.retry));
    let notifier = Arc::new(Notifier::new(
        telegram.clone(),
        config.chat_id.clone(),
        config.retry,
    ));
    let events: Arc<dyn EventSink> = Arc::new(TracingSink);

    notifier.verify_connectivity().await;

    let monitor = Arc::new(PriceMonitor::new(
        source.clone(),
        Arc::new(AlertEngine::new(config.thresholds)),
        notifier.clone(),
        events.clone(),
    ));
    let listener = CommandListener::new(
        telegram,
        source,
        notifier,
        config.thresholds,
        events.clone(),
    );

    let shutdown = Shutdown::new();
    let handles = spawn_loops(monitor, listener, config.timings, shutdown.clone(), events);

    info!("Press Ctrl+C to stop...");

    wait_for_stop_signal(tokio::signal::ctrl_c()).await;

    warn!("Shutdown signal received");
    shutdown.trigger();

    // Wait for the loops, then abort whatever is stuck in a request
    let price_abort = handles.price.abort_handle();
    let messages_abort = handles.messages.abort_handle();
    if tokio::time::timeout(Duration::from_secs(2), handles.price).await.is_err() {
        price_abort.abort();
    }
    if tokio::time::timeout(Duration::from_secs(2), handles.messages).await.is_err() {
        messages_abort.abort();
    }

    info!("👋 ratewatch stopped");
}
