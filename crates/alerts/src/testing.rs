//! In-memory providers for unit tests.

use crate::telegram::{BotIdentity, InboundMessage, MessagingProvider, TelegramError};
use async_trait::async_trait;
use ratewatch_core::{AssetPair, PriceSnapshot};
use ratewatch_feeds::{FeedError, QuoteProvider};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct FakeMessenger {
    sent: Mutex<Vec<(String, String)>>,
    send_attempts: Mutex<u32>,
    failing_sends: Mutex<u32>,
    update_batches: Mutex<VecDeque<Result<Vec<InboundMessage>, TelegramError>>>,
    offsets: Mutex<Vec<Option<i64>>>,
    get_me_error: Mutex<Option<TelegramError>>,
}

impl FakeMessenger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    pub fn send_attempts(&self) -> u32 {
        *self.send_attempts.lock().unwrap()
    }

    pub fn fail_next_sends(&self, count: u32) {
        *self.failing_sends.lock().unwrap() = count;
    }

    pub fn push_updates(&self, batch: Vec<InboundMessage>) {
        self.update_batches.lock().unwrap().push_back(Ok(batch));
    }

    pub fn push_update_error(&self, error: TelegramError) {
        self.update_batches.lock().unwrap().push_back(Err(error));
    }

    /// Offsets passed to `get_updates`, in call order.
    pub fn offsets(&self) -> Vec<Option<i64>> {
        self.offsets.lock().unwrap().clone()
    }

    pub fn set_get_me_error(&self, error: TelegramError) {
        *self.get_me_error.lock().unwrap() = Some(error);
    }
}

#[async_trait]
impl MessagingProvider for FakeMessenger {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), TelegramError> {
        *self.send_attempts.lock().unwrap() += 1;
        {
            let mut failing = self.failing_sends.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(TelegramError::Status(502));
            }
        }
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<InboundMessage>, TelegramError> {
        self.offsets.lock().unwrap().push(offset);
        self.update_batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn get_me(&self) -> Result<BotIdentity, TelegramError> {
        if let Some(error) = self.get_me_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(BotIdentity {
            id: 1,
            username: Some("fake_bot".to_string()),
            first_name: "Fake".to_string(),
        })
    }
}

/// Quote provider returning a settable snapshot, or failing when unset.
#[derive(Default)]
pub struct FakeQuotes {
    current: Mutex<Option<PriceSnapshot>>,
    calls: Mutex<u32>,
}

impl FakeQuotes {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Quotes whose cross-rate equals `rate`.
    pub fn with_rate(rate: f64) -> Arc<Self> {
        let quotes = Self::new();
        quotes.set_rate(rate);
        quotes
    }

    pub fn set_rate(&self, rate: f64) {
        *self.current.lock().unwrap() = Some(PriceSnapshot::new(1.0, rate, 1.0 / rate));
    }

    pub fn set_failing(&self) {
        *self.current.lock().unwrap() = None;
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl QuoteProvider for FakeQuotes {
    async fn fetch_quotes(&self, _pair: &AssetPair) -> Result<PriceSnapshot, FeedError> {
        *self.calls.lock().unwrap() += 1;
        self.current
            .lock()
            .unwrap()
            .ok_or_else(|| FeedError::ConnectionFailed("quote provider down".to_string()))
    }
}
