//! Telegram alerting for the ETH/ERG cross-rate.
//!
//! This crate provides:
//! - Telegram Bot API client behind the `MessagingProvider` trait
//! - Threshold alert engine with a shared cooldown
//! - Inbound `p` command handling
//! - `PriceMonitor`, the per-tick price check driven by the server

pub mod command;
pub mod engine;
pub mod event;
pub mod message;
pub mod monitor;
pub mod notifier;
pub mod telegram;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use command::{CommandListener, CommandOutcome};
pub use engine::{Alert, AlertDirection, AlertEngine, AlertKey, Evaluation};
pub use event::{EventSink, IgnoreReason, MemorySink, MonitorEvent, TracingSink};
pub use monitor::{CheckOutcome, MonitorError, PriceMonitor};
pub use notifier::Notifier;
pub use telegram::{BotIdentity, InboundMessage, MessagingProvider, TelegramClient, TelegramError};
