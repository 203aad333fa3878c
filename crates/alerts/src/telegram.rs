//! Telegram Bot API client.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Telegram API returned HTTP {0}")]
    Status(u16),
    #[error("Telegram API error: {0}")]
    Api(String),
    #[error("Unexpected Telegram response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A text message received by the bot.
///
/// Updates that carry no text message (edits, joins, stickers) are still
/// delivered with empty `chat_id`/`text` so the cursor can move past them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Telegram `update_id`.
    pub id: i64,
    pub chat_id: String,
    pub text: String,
}

impl InboundMessage {
    pub fn new(id: i64, chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            chat_id: chat_id.into(),
            text: text.into(),
        }
    }
}

/// Result of the `getMe` connectivity probe.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotIdentity {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    pub first_name: String,
}

/// Chat bot transport. Each call is a single attempt.
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    /// Send `text` (HTML formatted) to `chat_id`.
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), TelegramError>;

    /// Fetch updates with `update_id >= offset`.
    async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<InboundMessage>, TelegramError>;

    /// Identity of the bot the token belongs to.
    async fn get_me(&self) -> Result<BotIdentity, TelegramError>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, TelegramError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(TelegramError::Api(
                self.description
                    .unwrap_or_else(|| "response without result".to_string()),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

impl From<Update> for InboundMessage {
    fn from(update: Update) -> Self {
        let (chat_id, text) = match update.message {
            Some(message) => (message.chat.id.to_string(), message.text.unwrap_or_default()),
            None => (String::new(), String::new()),
        };
        InboundMessage {
            id: update.update_id,
            chat_id,
            text,
        }
    }
}

/// Parse a `getUpdates` response body.
fn parse_updates(json: serde_json::Value) -> Result<Vec<InboundMessage>, TelegramError> {
    let response: ApiResponse<Vec<Update>> = serde_json::from_value(json)?;
    Ok(response
        .into_result()?
        .into_iter()
        .map(InboundMessage::from)
        .collect())
}

/// Telegram Bot API client using plain HTTPS requests.
pub struct TelegramClient {
    http_client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
    long_poll: Duration,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // base_url embeds the bot token
        f.debug_struct("TelegramClient")
            .field("request_timeout", &self.request_timeout)
            .field("long_poll", &self.long_poll)
            .finish()
    }
}

impl TelegramClient {
    pub const API_URL: &'static str = "https://api.telegram.org";

    /// Create a client for the bot identified by `token`.
    pub fn new(token: &str, request_timeout: Duration, long_poll: Duration) -> Self {
        Self::with_api_url(Self::API_URL, token, request_timeout, long_poll)
    }

    pub fn with_api_url(
        api_url: &str,
        token: &str,
        request_timeout: Duration,
        long_poll: Duration,
    ) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            request_timeout,
            long_poll,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, TelegramError> {
        let status = response.status();
        if !status.is_success() {
            return Err(TelegramError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl MessagingProvider for TelegramClient {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), TelegramError> {
        let params = [
            ("chat_id", chat_id),
            ("text", text),
            ("parse_mode", "HTML"),
            ("disable_web_page_preview", "true"),
        ];

        let response = self
            .http_client
            .post(self.method_url("sendMessage"))
            .timeout(self.request_timeout)
            .form(&params)
            .send()
            .await?;

        let json = Self::read_json(response).await?;
        let response: ApiResponse<serde_json::Value> = serde_json::from_value(json)?;
        response.into_result().map(|_| ())
    }

    async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<InboundMessage>, TelegramError> {
        let mut params = vec![("timeout", self.long_poll.as_secs().to_string())];
        if let Some(offset) = offset {
            params.push(("offset", offset.to_string()));
        }

        // Long poll: the server may hold the request for `long_poll`.
        let response = self
            .http_client
            .get(self.method_url("getUpdates"))
            .timeout(self.long_poll + Duration::from_secs(5))
            .query(&params)
            .send()
            .await?;

        parse_updates(Self::read_json(response).await?)
    }

    async fn get_me(&self) -> Result<BotIdentity, TelegramError> {
        let response = self
            .http_client
            .get(self.method_url("getMe"))
            .timeout(self.request_timeout)
            .send()
            .await?;

        let json = Self::read_json(response).await?;
        let response: ApiResponse<BotIdentity> = serde_json::from_value(json)?;
        response.into_result()
    }
}
