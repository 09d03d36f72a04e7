mod bot;
mod commands;
mod config;
mod gateway;
mod moderation;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::AppState;
use crate::config::Config;
use crate::gateway::TelegramGateway;
use crate::moderation::cache::MembershipCache;
use crate::moderation::engine::ModerationEngine;
use crate::moderation::ChatGateway;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,groupguard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Warning TTL: {}s", config.moderation.warning_ttl_secs);
    info!(
        "  Verification timeout: {}s",
        config.moderation.verify_timeout_secs
    );

    let bot = Bot::new(&config.telegram.bot_token);
    let gateway = Arc::new(TelegramGateway::new(bot.clone()));
    let cache = Arc::new(MembershipCache::new());
    let engine = Arc::new(ModerationEngine::new(
        Arc::clone(&gateway) as Arc<dyn ChatGateway>,
        cache,
        config.moderation.verify_timeout(),
        config.moderation.warning_ttl(),
    ));

    let state = Arc::new(AppState {
        config,
        engine,
        gateway,
    });

    info!("Bot is starting...");
    bot::run(bot, state).await?;

    Ok(())
}
