//! Inbound chat commands.
//!
//! Only one command exists: `p` (any case) from the configured chat replies
//! with the current cross-rate. Everything else is dropped without a reply.

use crate::event::{EventSink, IgnoreReason, MonitorEvent};
use crate::message::{format_price_message, PRICES_UNAVAILABLE};
use crate::notifier::Notifier;
use crate::telegram::{InboundMessage, MessagingProvider, TelegramError};
use chrono::Utc;
use ratewatch_core::ThresholdConfig;
use ratewatch_feeds::PriceSource;
use std::sync::Arc;
use tracing::debug;

/// Literal text of the price command, compared after lowercasing.
pub const PRICE_COMMAND: &str = "p";

/// What happened to one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Price report sent (or attempted; see `delivered`).
    PriceReported { delivered: bool },
    /// Prices could not be fetched; the unavailable notice was sent instead.
    PricesUnavailable { delivered: bool },
    Unauthorized,
    UnknownCommand,
}

/// Polls the bot for updates and answers price commands.
///
/// Owns the update cursor: after each batch the next poll starts at the
/// highest `update_id` seen plus one, so no update is handled twice.
pub struct CommandListener {
    provider: Arc<dyn MessagingProvider>,
    source: Arc<PriceSource>,
    notifier: Arc<Notifier>,
    thresholds: ThresholdConfig,
    authorized_chat_id: String,
    events: Arc<dyn EventSink>,
    cursor: Option<i64>,
}

impl CommandListener {
    pub fn new(
        provider: Arc<dyn MessagingProvider>,
        source: Arc<PriceSource>,
        notifier: Arc<Notifier>,
        thresholds: ThresholdConfig,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let authorized_chat_id = notifier.chat_id().to_string();
        Self {
            provider,
            source,
            notifier,
            thresholds,
            authorized_chat_id,
            events,
            cursor: None,
        }
    }

    /// Exclusive lower bound for the next poll; `None` before the first batch.
    pub fn cursor(&self) -> Option<i64> {
        self.cursor
    }

    /// Fetch updates at or after `since_id`.
    pub async fn poll(&self, since_id: Option<i64>) -> Result<Vec<InboundMessage>, TelegramError> {
        let updates = self.provider.get_updates(since_id).await?;
        if !updates.is_empty() {
            debug!(count = updates.len(), "Received new updates");
        }
        Ok(updates)
    }

    /// Poll from the current cursor and handle the batch.
    /// Returns the number of updates received.
    pub async fn poll_once(&mut self) -> Result<usize, TelegramError> {
        let batch = self.poll(self.cursor).await?;
        let count = batch.len();
        self.process(batch).await;
        Ok(count)
    }

    /// Advance the cursor past `batch`, then handle each message in order.
    pub async fn process(&mut self, batch: Vec<InboundMessage>) -> Vec<CommandOutcome> {
        if let Some(max_id) = batch.iter().map(|m| m.id).max() {
            let next = max_id + 1;
            self.cursor = Some(self.cursor.map_or(next, |current| current.max(next)));
        }

        let mut outcomes = Vec::with_capacity(batch.len());
        for message in &batch {
            outcomes.push(self.handle(message).await);
        }
        outcomes
    }

    /// Handle a single message.
    pub async fn handle(&self, message: &InboundMessage) -> CommandOutcome {
        debug!(
            update_id = message.id,
            chat_id = %message.chat_id,
            text = %message.text,
            "Received message"
        );

        if message.chat_id != self.authorized_chat_id {
            self.ignore(message, IgnoreReason::Unauthorized);
            return CommandOutcome::Unauthorized;
        }
        if message.text.to_lowercase() != PRICE_COMMAND {
            self.ignore(message, IgnoreReason::UnknownCommand);
            return CommandOutcome::UnknownCommand;
        }

        let outcome = self.report_price().await;
        let (delivered, prices_available) = match outcome {
            CommandOutcome::PriceReported { delivered } => (delivered, true),
            CommandOutcome::PricesUnavailable { delivered } => (delivered, false),
            _ => (false, false),
        };
        self.events.emit(MonitorEvent::CommandHandled {
            update_id: message.id,
            delivered,
            prices_available,
        });
        outcome
    }

    /// Fetch prices and send the report, or the unavailable notice.
    async fn report_price(&self) -> CommandOutcome {
        match self.source.fetch().await {
            Ok(reading) => {
                let text = format_price_message(
                    self.source.pair(),
                    &self.thresholds,
                    reading.snapshot.cross_rate(),
                    reading.is_stale(),
                    Utc::now(),
                );
                CommandOutcome::PriceReported {
                    delivered: self.notifier.send(&text).await,
                }
            }
            Err(_) => CommandOutcome::PricesUnavailable {
                delivered: self.notifier.send(PRICES_UNAVAILABLE).await,
            },
        }
    }

    fn ignore(&self, message: &InboundMessage, reason: IgnoreReason) {
        self.events.emit(MonitorEvent::MessageIgnored {
            update_id: message.id,
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MemorySink;
    use crate::testing::{FakeMessenger, FakeQuotes};
    use pretty_assertions::assert_eq;
    use ratewatch_core::{AssetPair, RetryPolicy};
    use std::time::Duration;

    const CHAT: &str = "222222222";

    struct Harness {
        listener: CommandListener,
        quotes: Arc<FakeQuotes>,
        messenger: Arc<FakeMessenger>,
        events: Arc<MemorySink>,
    }

    fn harness(quotes: Arc<FakeQuotes>) -> Harness {
        let retry = RetryPolicy::new(3, Duration::from_secs(30));
        let messenger = FakeMessenger::new();
        let events = Arc::new(MemorySink::new());
        let thresholds =
            ThresholdConfig::new(5135.2, 2992.61, 0.10, Duration::from_secs(3600)).unwrap();
        let source = Arc::new(PriceSource::new(quotes.clone(), AssetPair::erg_eth(), retry));
        let notifier = Arc::new(Notifier::new(messenger.clone(), CHAT, retry));
        let listener = CommandListener::new(
            messenger.clone(),
            source,
            notifier,
            thresholds,
            events.clone(),
        );
        Harness {
            listener,
            quotes,
            messenger,
            events,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_price_command_replies_with_rate() {
        let mut h = harness(FakeQuotes::with_rate(4000.0));

        let outcomes = h
            .listener
            .process(vec![InboundMessage::new(5, CHAT, "P")])
            .await;

        assert_eq!(outcomes, vec![CommandOutcome::PriceReported { delivered: true }]);
        let sent = h.messenger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, CHAT);
        assert!(sent[0].1.contains("ETH/ERG: 4,000.00"));
        assert!(sent[0].1.contains("Target Range: 2,992.61 - 5,135.20"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_prices_send_notice() {
        let mut h = harness(FakeQuotes::new());

        let outcomes = h
            .listener
            .process(vec![InboundMessage::new(1, CHAT, "p")])
            .await;

        assert_eq!(outcomes, vec![CommandOutcome::PricesUnavailable { delivered: true }]);
        assert_eq!(h.messenger.sent_texts(), vec![PRICES_UNAVAILABLE.to_string()]);
        assert_eq!(h.quotes.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_chat_gets_no_reply() {
        let mut h = harness(FakeQuotes::with_rate(4000.0));

        let outcomes = h
            .listener
            .process(vec![
                InboundMessage::new(1, "999", "p"),
                InboundMessage::new(2, "2222222220", "p"),
                InboundMessage::new(3, "", ""),
            ])
            .await;

        assert_eq!(outcomes, vec![CommandOutcome::Unauthorized; 3]);
        assert_eq!(h.messenger.send_attempts(), 0);
        assert_eq!(h.quotes.calls(), 0);
        assert_eq!(
            h.events.events()[0],
            MonitorEvent::MessageIgnored {
                update_id: 1,
                reason: IgnoreReason::Unauthorized
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_commands_ignored() {
        let mut h = harness(FakeQuotes::with_rate(4000.0));

        let outcomes = h
            .listener
            .process(vec![
                InboundMessage::new(1, CHAT, "price"),
                InboundMessage::new(2, CHAT, " p"),
                InboundMessage::new(3, CHAT, "/p"),
            ])
            .await;

        assert_eq!(outcomes, vec![CommandOutcome::UnknownCommand; 3]);
        assert_eq!(h.messenger.send_attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cursor_advances_past_max_id() {
        let mut h = harness(FakeQuotes::with_rate(4000.0));
        h.messenger.push_updates(vec![
            InboundMessage::new(7, CHAT, "hello"),
            InboundMessage::new(9, CHAT, "p"),
            InboundMessage::new(8, "", ""),
        ]);

        assert_eq!(h.listener.cursor(), None);
        assert_eq!(h.listener.poll_once().await.unwrap(), 3);
        assert_eq!(h.listener.cursor(), Some(10));

        // Empty batch leaves the cursor alone.
        assert_eq!(h.listener.poll_once().await.unwrap(), 0);
        assert_eq!(h.listener.cursor(), Some(10));

        assert_eq!(h.messenger.offsets(), vec![None, Some(10)]);
        assert_eq!(h.messenger.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cursor_never_moves_backwards() {
        let mut h = harness(FakeQuotes::with_rate(4000.0));
        h.listener.process(vec![InboundMessage::new(20, CHAT, "x")]).await;
        h.listener.process(vec![InboundMessage::new(4, CHAT, "x")]).await;
        assert_eq!(h.listener.cursor(), Some(21));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_error_keeps_cursor() {
        let mut h = harness(FakeQuotes::with_rate(4000.0));
        h.messenger.push_updates(vec![InboundMessage::new(3, CHAT, "x")]);
        h.messenger.push_update_error(TelegramError::Status(502));

        h.listener.poll_once().await.unwrap();
        assert!(h.listener.poll_once().await.is_err());
        assert_eq!(h.listener.cursor(), Some(4));
    }
}
