use anyhow::Result;
use cipherbot::{
    bot::{self, Backoff, BotContext, TelegramClient},
    config::Config,
    load,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) config + logging ─────────────────────────────────────────
    let config = Config::load()?;
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    let token = config.require_token()?;

    // ─── 2) load the lookup table once ───────────────────────────────
    let records = load::load(&config.programs_path);
    if records.is_empty() {
        warn!(
            path = %config.programs_path.display(),
            "no program records loaded; every search will answer not found"
        );
    }

    // ─── 3) identify the bot so group commands for others are skipped ─
    let api = TelegramClient::new(&config.api_url, token, config.poll_timeout_secs)?;
    let mut ctx = BotContext::new(records);
    match api.get_me().await {
        Ok(me) => match me.username {
            Some(username) => {
                info!(username = %username, "bot identified");
                ctx = ctx.with_username(username);
            }
            None => warn!("bot account has no username"),
        },
        Err(e) => warn!(error = %format!("{:#}", e), "getMe failed, accepting all addressed commands"),
    }
    let ctx = Arc::new(ctx);

    // ─── 4) poll until Ctrl-C ────────────────────────────────────────
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("shutdown requested");
    };
    bot::run_polling(&api, ctx, Backoff::default(), shutdown).await?;

    info!("all done");
    Ok(())
}
