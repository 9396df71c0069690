//! Telegram Bot API transport (long polling).

use std::{fmt, sync::Arc, time::Duration};

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, error, info, warn};
use weatherbot_core::{Bot, Reply, ReplySink, WeatherProvider};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Seconds Telegram may hold a `getUpdates` call open.
const POLL_TIMEOUT_SECS: u64 = 30;
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    // Contains the bot token; never log it.
    base: String,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient").finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TgResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TgUser {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TgChat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TgMessage {
    pub chat: TgChat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TgUpdate {
    pub update_id: i64,
    pub message: Option<TgMessage>,
}

#[derive(Debug, Serialize)]
struct GetUpdates<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    disable_web_page_preview: bool,
}

impl TelegramClient {
    pub fn new(token: &str) -> Result<Self> {
        Self::with_api_url(DEFAULT_API_URL, token)
    }

    pub fn with_api_url(api_url: &str, token: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .build()
            .context("Failed to build Telegram HTTP client")?;

        Ok(Self { http, base: format!("{}/bot{token}", api_url.trim_end_matches('/')) })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &impl Serialize) -> Result<T> {
        let res = self
            .http
            .post(format!("{}/{method}", self.base))
            .json(body)
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("Telegram {method} request failed"))?;

        let envelope: TgResponse<T> = res
            .json()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("Failed to parse Telegram {method} response"))?;

        if !envelope.ok {
            bail!(
                "Telegram {method} failed: {}",
                envelope.description.as_deref().unwrap_or("no description")
            );
        }

        envelope.result.ok_or_else(|| anyhow!("Telegram {method} returned no result"))
    }

    pub async fn get_me(&self) -> Result<TgUser> {
        self.call("getMe", &serde_json::json!({})).await
    }

    pub async fn get_updates(&self, offset: i64) -> Result<Vec<TgUpdate>> {
        let body =
            GetUpdates { offset, timeout: POLL_TIMEOUT_SECS, allowed_updates: &["message"] };
        self.call("getUpdates", &body).await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let body = SendMessage { chat_id, text, disable_web_page_preview: true };
        self.call::<serde_json::Value>("sendMessage", &body).await?;
        Ok(())
    }
}

/// Replies for one Telegram chat, rendered as plain text.
#[derive(Debug, Clone)]
pub struct ChatSink {
    client: TelegramClient,
    chat_id: i64,
}

impl ChatSink {
    pub fn new(client: TelegramClient, chat_id: i64) -> Self {
        Self { client, chat_id }
    }
}

#[async_trait]
impl ReplySink for ChatSink {
    async fn send(&self, reply: Reply) -> Result<()> {
        self.client.send_message(self.chat_id, &reply.to_string()).await
    }
}

/// Verify the token, then poll for messages forever.
///
/// Each message is handled in its own task.
pub async fn run<P>(client: TelegramClient, bot: Arc<Bot<P>>) -> Result<()>
where
    P: WeatherProvider + 'static,
{
    let me = client.get_me().await.context("Telegram did not accept the bot token")?;
    info!(id = me.id, username = ?me.username, "connected to Telegram");

    let mut offset = 0;
    loop {
        let updates = match client.get_updates(offset).await {
            Ok(updates) => updates,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "polling Telegram failed");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(TgMessage { chat, text: Some(text) }) = update.message else {
                continue;
            };
            debug!(chat_id = chat.id, "received message");

            let sink = ChatSink::new(client.clone(), chat.id);
            let bot = Arc::clone(&bot);
            tokio::spawn(async move {
                if let Err(err) = bot.handle(&text, &sink).await {
                    error!(chat_id = sink.chat_id, error = %format!("{err:#}"), "failed to reply");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weatherbot_core::provider::weatherapi::WeatherApiProvider;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "123456:SECRET";

    async fn client(server: &MockServer) -> TelegramClient {
        TelegramClient::with_api_url(&server.uri(), TOKEN).expect("client builds")
    }

    #[tokio::test]
    async fn get_me_returns_bot_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/getMe")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {"id": 99, "is_bot": true, "first_name": "Weather", "username": "wx_bot"}
            })))
            .mount(&server)
            .await;

        let me = client(&server).await.get_me().await.expect("getMe succeeds");
        assert_eq!(me.id, 99);
        assert_eq!(me.username.as_deref(), Some("wx_bot"));
    }

    #[tokio::test]
    async fn rejected_token_is_an_error_without_the_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/getMe")))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "ok": false, "error_code": 401, "description": "Unauthorized"
            })))
            .mount(&server)
            .await;

        let err = client(&server).await.get_me().await.unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("Unauthorized"));
        assert!(!msg.contains(TOKEN));
    }

    #[tokio::test]
    async fn get_updates_sends_offset_and_parses_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/getUpdates")))
            .and(body_partial_json(serde_json::json!({"offset": 7, "timeout": 30})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": [
                    {"update_id": 7, "message": {"message_id": 1, "chat": {"id": 42, "type": "private"}, "text": "/weather Oslo"}},
                    {"update_id": 8, "edited_message": {"message_id": 1, "chat": {"id": 42}}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let updates = client(&server).await.get_updates(7).await.expect("getUpdates succeeds");

        assert_eq!(updates.len(), 2);
        let message = updates[0].message.as_ref().expect("message");
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.text.as_deref(), Some("/weather Oslo"));
        assert!(updates[1].message.is_none());
    }

    #[tokio::test]
    async fn chat_sink_delivers_bot_replies_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendMessage")))
            .and(body_partial_json(serde_json::json!({
                "chat_id": 42,
                "text": "Please provide a city name."
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true, "result": {"message_id": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sink = ChatSink::new(client(&server).await, 42);
        let bot = Bot::new(WeatherApiProvider::new("unused".into()));

        bot.handle("/forecast2", &sink).await.expect("reply delivered");
    }
}
