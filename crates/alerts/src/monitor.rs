//! Periodic price check: fetch, evaluate, notify.

use crate::engine::{AlertDirection, AlertEngine, Evaluation};
use crate::event::{EventSink, MonitorEvent};
use crate::message::format_alert_message;
use crate::notifier::Notifier;
use chrono::{DateTime, Utc};
use ratewatch_feeds::{FeedError, PriceSource};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Prices unavailable: {0}")]
    PricesUnavailable(String),
    #[error("Quote fetch failed: {0}")]
    Feed(FeedError),
}

impl From<FeedError> for MonitorError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::Unavailable(reason) => MonitorError::PricesUnavailable(reason),
            other => MonitorError::Feed(other),
        }
    }
}

/// Result of one `check_price` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Alerted {
        direction: AlertDirection,
        delivered: bool,
    },
    Suppressed,
    WithinRange,
}

/// Drives the alert engine from the shared price source.
pub struct PriceMonitor {
    source: Arc<PriceSource>,
    engine: Arc<AlertEngine>,
    notifier: Arc<Notifier>,
    events: Arc<dyn EventSink>,
}

impl PriceMonitor {
    pub fn new(
        source: Arc<PriceSource>,
        engine: Arc<AlertEngine>,
        notifier: Arc<Notifier>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            source,
            engine,
            notifier,
            events,
        }
    }

    pub fn engine(&self) -> &AlertEngine {
        &self.engine
    }

    /// Check prices now and send an alert if a trigger line is crossed.
    pub async fn check_price(&self) -> Result<CheckOutcome, MonitorError> {
        self.check_price_at(Utc::now()).await
    }

    /// `check_price` with an explicit evaluation time.
    pub async fn check_price_at(&self, now: DateTime<Utc>) -> Result<CheckOutcome, MonitorError> {
        let reading = match self.source.fetch().await {
            Ok(reading) => reading,
            Err(e) => {
                self.events.emit(MonitorEvent::PricesUnavailable);
                return Err(e.into());
            }
        };
        if reading.is_stale() {
            self.events.emit(MonitorEvent::StalePrices);
        }

        let cross_rate = reading.snapshot.cross_rate();
        match self.engine.evaluate(cross_rate, now) {
            Evaluation::Fired(alert) => {
                let text = format_alert_message(
                    self.source.pair(),
                    self.engine.thresholds(),
                    &alert,
                    reading.is_stale(),
                );
                let delivered = self.notifier.send(&text).await;
                self.events.emit(MonitorEvent::AlertFired {
                    direction: alert.direction,
                    cross_rate,
                    delivered,
                });
                Ok(CheckOutcome::Alerted {
                    direction: alert.direction,
                    delivered,
                })
            }
            Evaluation::Suppressed { remaining } => {
                self.events.emit(MonitorEvent::AlertSuppressed {
                    cross_rate,
                    remaining,
                });
                Ok(CheckOutcome::Suppressed)
            }
            Evaluation::WithinRange => {
                self.events.emit(MonitorEvent::WithinRange { cross_rate });
                Ok(CheckOutcome::WithinRange)
            }
        }
    }
}
