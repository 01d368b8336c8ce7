// src/bot/telegram.rs
//! Minimal Telegram Bot API client: long polling and plain/Markdown replies.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{ChatApi, Reply};

/// Extra time the HTTP client waits beyond the long-poll timeout.
const HTTP_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// Envelope around every Bot API result.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<T> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(anyhow!(
                "Telegram API error {}: {}",
                self.error_code.unwrap_or_default(),
                self.description.as_deref().unwrap_or("no description")
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

/// Legacy Telegram formatting mode used for search replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    Markdown,
}

#[derive(Debug, Serialize)]
struct GetUpdates<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
}

pub struct TelegramClient {
    client: Client,
    base: Url,
    poll_timeout_secs: u64,
}

impl TelegramClient {
    pub fn new(api_url: &Url, token: &str, poll_timeout_secs: u64) -> Result<Self> {
        let mut api_url = api_url.clone();
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }
        let base = api_url
            // "./" keeps the token's colon from parsing as a URL scheme
            .join(&format!("./bot{}/", token))
            .context("building Bot API base URL")?;
        let client = Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs) + HTTP_TIMEOUT_MARGIN)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            base,
            poll_timeout_secs,
        })
    }

    /// The bot's own account, used to tell our commands from other bots' in groups.
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &serde_json::json!({})).await
    }

    fn method_url(&self, method: &str) -> Result<Url> {
        self.base
            .join(method)
            .with_context(|| format!("building URL for {}", method))
    }

    /// POST `params` as JSON to `method` and unwrap the envelope.
    /// Transport errors are stripped of their URL, which carries the token.
    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let resp = self
            .client
            .post(self.method_url(method)?)
            .json(params)
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("{} request failed", method))?;
        let status = resp.status();
        let body: ApiResponse<R> = resp
            .json()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("{} returned an unreadable body ({})", method, status))?;
        body.into_result()
    }
}

impl ChatApi for TelegramClient {
    async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                &GetUpdates {
                    offset,
                    timeout: self.poll_timeout_secs,
                    allowed_updates: &["message"],
                },
            )
            .await?;
        debug!(?offset, count = updates.len(), "polled updates");
        Ok(updates)
    }

    async fn send_message(&self, chat_id: i64, reply: &Reply) -> Result<()> {
        let _sent: Message = self
            .call(
                "sendMessage",
                &SendMessage {
                    chat_id,
                    text: &reply.text,
                    parse_mode: reply.parse_mode,
                },
            )
            .await?;
        Ok(())
    }
}
