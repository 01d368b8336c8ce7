// src/bot/mod.rs
pub mod messages;
pub mod telegram;

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{future::Future, str::FromStr, sync::Arc, time::Duration};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::catalog::RecordSet;
pub use telegram::{ParseMode, TelegramClient, Update};

/// `/name` or `/name@botname`, followed by whitespace or the end of the text.
static COMMAND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/([A-Za-z0-9_]+)(?:@([A-Za-z0-9_]+))?(?:\s|$)").unwrap());

/// Everything a handler needs, built once at startup.
pub struct BotContext {
    pub records: Arc<RecordSet>,
    /// This bot's username, without `@`. When unknown, every
    /// `/command@name` is taken as addressed to us.
    pub username: Option<String>,
}

impl BotContext {
    pub fn new(records: RecordSet) -> Self {
        Self {
            records: Arc::new(records),
            username: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into().trim_start_matches('@').to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub parse_mode: Option<ParseMode>,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: None,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: Some(ParseMode::Markdown),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Status,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "start" => Ok(Command::Start),
            "help" => Ok(Command::Help),
            "status" => Ok(Command::Status),
            _ => Err(anyhow!("unknown command /{}", s)),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Incoming<'a> {
    Command(Command),
    UnknownCommand(&'a str),
    /// `/command@name` where `name` is some other bot.
    OtherBot(&'a str),
    Query(&'a str),
}

/// Sort a message into a command for this bot, a command for someone else,
/// or a cipher query. `own_username` is compared case-insensitively.
pub fn classify<'a>(text: &'a str, own_username: Option<&str>) -> Incoming<'a> {
    let Some(caps) = COMMAND_RE.captures(text) else {
        return Incoming::Query(text);
    };
    let Some(name) = caps.get(1) else {
        return Incoming::Query(text);
    };
    if let (Some(target), Some(own)) = (caps.get(2), own_username) {
        if !target.as_str().eq_ignore_ascii_case(own) {
            return Incoming::OtherBot(target.as_str());
        }
    }
    match name.as_str().parse() {
        Ok(cmd) => Incoming::Command(cmd),
        Err(_) => Incoming::UnknownCommand(name.as_str()),
    }
}

/// Route one text message. `None` means the message gets no reply.
pub fn respond(ctx: &BotContext, text: &str) -> Option<Reply> {
    match classify(text, ctx.username.as_deref()) {
        Incoming::Command(Command::Start) => Some(Reply::plain(messages::WELCOME)),
        Incoming::Command(Command::Help) => Some(Reply::plain(messages::HELP)),
        Incoming::Command(Command::Status) => Some(Reply::plain(messages::status(&ctx.records))),
        Incoming::UnknownCommand(name) => {
            debug!(command = name, "ignoring unknown command");
            None
        }
        Incoming::OtherBot(target) => {
            debug!(target, "ignoring command for another bot");
            None
        }
        Incoming::Query(query) => {
            let query = query.trim();
            let matches = ctx.records.search_detailed(query);
            info!(
                query,
                phase = matches.phase.as_str(),
                results = matches.lines.len(),
                "cipher search"
            );
            if matches.lines.is_empty() {
                Some(Reply::markdown(messages::not_found(query)))
            } else {
                Some(Reply::markdown(messages::found(query, &matches.lines)))
            }
        }
    }
}

/// Transport the polling loop runs against.
#[allow(async_fn_in_trait)]
pub trait ChatApi {
    async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>>;
    async fn send_message(&self, chat_id: i64, reply: &Reply) -> Result<()>;
}

/// Reply to a single update. Delivery failures are logged, followed by one
/// attempt to tell the user something went wrong.
pub async fn handle_update<A: ChatApi>(api: &A, ctx: &BotContext, update: &Update) {
    let Some(message) = &update.message else {
        return;
    };
    let Some(text) = message.text.as_deref() else {
        debug!(update_id = update.update_id, "ignoring non-text message");
        return;
    };
    let Some(reply) = respond(ctx, text) else {
        return;
    };

    let chat_id = message.chat.id;
    if let Err(e) = api.send_message(chat_id, &reply).await {
        warn!(
            update_id = update.update_id,
            chat_id,
            error = %format!("{:#}", e),
            "reply failed"
        );
        if let Err(e) = api.send_message(chat_id, &Reply::plain(messages::ERROR)).await {
            error!(chat_id, error = %format!("{:#}", e), "error notice failed");
        }
    }
}

/// Delay between failed polls: doubles from `initial` up to `max`.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
        }
    }
}

/// Long-poll `api` until `shutdown` resolves, answering updates in order.
pub async fn run_polling<A, S>(
    api: &A,
    ctx: Arc<BotContext>,
    backoff: Backoff,
    shutdown: S,
) -> Result<()>
where
    A: ChatApi,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut offset: Option<i64> = None;
    let mut delay = backoff.initial;

    info!(records = ctx.records.count(), "polling for messages");
    loop {
        let polled = tokio::select! {
            _ = &mut shutdown => break,
            polled = api.get_updates(offset) => polled,
        };

        match polled {
            Ok(updates) => {
                delay = backoff.initial;
                for update in &updates {
                    offset = Some(update.update_id + 1);
                    handle_update(api, &ctx, update).await;
                }
            }
            Err(e) => {
                warn!(
                    error = %format!("{:#}", e),
                    delay_ms = delay.as_millis() as u64,
                    "polling failed, retrying"
                );
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = sleep(delay) => {}
                }
                delay = (delay * 2).min(backoff.max);
            }
        }
    }

    info!("polling stopped");
    Ok(())
}
