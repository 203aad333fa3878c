//! Outbound notifications to the configured chat.

use crate::telegram::{BotIdentity, MessagingProvider};
use ratewatch_core::RetryPolicy;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Sends messages to the single recipient chat.
pub struct Notifier {
    provider: Arc<dyn MessagingProvider>,
    chat_id: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("chat_id", &self.chat_id)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Notifier {
    pub fn new(provider: Arc<dyn MessagingProvider>, chat_id: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            provider,
            chat_id: chat_id.into(),
            retry,
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Send `text`, retrying per policy. Returns false once attempts are
    /// exhausted; never fails the caller.
    pub async fn send(&self, text: &str) -> bool {
        let provider = &self.provider;
        let chat_id = self.chat_id.as_str();
        let result = self
            .retry
            .run("send_message", move || provider.send_message(chat_id, text))
            .await;

        match result {
            Ok(()) => {
                let preview: String = text.chars().take(50).collect();
                debug!(preview = %preview, "Message sent");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to send message");
                false
            }
        }
    }

    /// Probe the bot token with `getMe` and log the outcome.
    ///
    /// Diagnostic only: a failure is logged and startup continues.
    pub async fn verify_connectivity(&self) -> Option<BotIdentity> {
        match self.provider.get_me().await {
            Ok(identity) => {
                info!(
                    bot_id = identity.id,
                    username = identity.username.as_deref().unwrap_or("-"),
                    "Connected to Telegram bot"
                );
                Some(identity)
            }
            Err(e) => {
                error!(error = %e, "Could not connect to Telegram bot");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeMessenger;
    use crate::TelegramError;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn notifier(messenger: Arc<FakeMessenger>) -> Notifier {
        Notifier::new(messenger, "222222222", RetryPolicy::new(3, Duration::from_secs(30)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_success() {
        let messenger = FakeMessenger::new();
        assert!(notifier(messenger.clone()).send("hello").await);
        assert_eq!(messenger.sent(), vec![("222222222".to_string(), "hello".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_retries_then_succeeds() {
        let messenger = FakeMessenger::new();
        messenger.fail_next_sends(2);
        assert!(notifier(messenger.clone()).send("hello").await);
        assert_eq!(messenger.send_attempts(), 3);
        assert_eq!(messenger.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_returns_false_after_exhaustion() {
        let messenger = FakeMessenger::new();
        messenger.fail_next_sends(5);
        assert!(!notifier(messenger.clone()).send("hello").await);
        assert_eq!(messenger.send_attempts(), 3);
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn test_verify_connectivity() {
        let messenger = FakeMessenger::new();
        let identity = notifier(messenger.clone()).verify_connectivity().await.unwrap();
        assert_eq!(identity.username.as_deref(), Some("fake_bot"));

        messenger.set_get_me_error(TelegramError::Status(401));
        assert!(notifier(messenger).verify_connectivity().await.is_none());
    }
}
