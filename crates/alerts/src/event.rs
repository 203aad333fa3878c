//! Monitor events.
//!
//! Everything the price and message loops decide is reported as a
//! `MonitorEvent` through an `EventSink`. Production uses `TracingSink`;
//! tests use `MemorySink` and assert on the collected events.

use crate::engine::AlertDirection;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Why an inbound message produced no reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Unauthorized,
    UnknownCommand,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// A threshold alert fired; `delivered` is the Notifier result.
    AlertFired {
        direction: AlertDirection,
        cross_rate: f64,
        delivered: bool,
    },
    /// A trigger line was crossed but the cooldown is still running.
    AlertSuppressed {
        cross_rate: f64,
        remaining: Duration,
    },
    /// The cross-rate sits between both trigger lines.
    WithinRange { cross_rate: f64 },
    /// The quote provider failed and the last known snapshot was used.
    StalePrices,
    /// No fresh or cached prices exist.
    PricesUnavailable,
    /// A `p` command was answered.
    CommandHandled {
        update_id: i64,
        delivered: bool,
        prices_available: bool,
    },
    MessageIgnored {
        update_id: i64,
        reason: IgnoreReason,
    },
    /// A loop iteration failed and the loop backed off.
    LoopError { task: &'static str, error: String },
}

/// Receiver of monitor events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: MonitorEvent);
}

/// Writes events to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: MonitorEvent) {
        match event {
            MonitorEvent::AlertFired {
                direction,
                cross_rate,
                delivered,
            } => {
                if delivered {
                    info!(?direction, cross_rate, "Threshold alert sent");
                } else {
                    error!(?direction, cross_rate, "Threshold alert fired but could not be delivered");
                }
            }
            MonitorEvent::AlertSuppressed {
                cross_rate,
                remaining,
            } => {
                debug!(cross_rate, remaining_secs = remaining.as_secs(), "Alert suppressed by cooldown");
            }
            MonitorEvent::WithinRange { cross_rate } => {
                debug!(cross_rate, "Cross-rate within range");
            }
            MonitorEvent::StalePrices => {
                warn!("Using last known prices");
            }
            MonitorEvent::PricesUnavailable => {
                warn!("Prices unavailable");
            }
            MonitorEvent::CommandHandled {
                update_id,
                delivered,
                prices_available,
            } => {
                info!(update_id, delivered, prices_available, "Price command handled");
            }
            MonitorEvent::MessageIgnored { update_id, reason } => {
                debug!(update_id, ?reason, "Message ignored");
            }
            MonitorEvent::LoopError { task, error } => {
                error!(task, error = %error, "Loop iteration failed");
            }
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<MonitorEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<MonitorEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: MonitorEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
