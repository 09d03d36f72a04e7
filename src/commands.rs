use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::command::BotCommands;
use tracing::{error, info};
use url::Url;

use crate::bot::AppState;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "welcome message and group setup instructions")]
    Start,
    #[command(description = "what the bot moderates")]
    Help,
    #[command(description = "moderation counters (super admin only)")]
    Stats,
}

const WELCOME_TEXT: &str = "\
🤖 Welcome! I keep group chats free of spam.

What I do:
• delete messages containing links and advertising
• delete mentions of users who are not group members
• remove join/leave service messages

How to set me up:
1. Add me to your group
2. Grant me the \"delete messages\" and \"restrict members\" admin rights
3. That's it, moderation starts automatically";

const HELP_TEXT: &str = "\
📖 Moderation rules

Removed automatically:
• http/https links and t.me invites
• bare domains (example.com and friends)
• mentions of users who are not members of the group

Join and leave announcements are removed as well.

I need the \"delete messages\" and \"restrict members\" admin rights to work.";

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => send_welcome(&bot, &msg).await,
        Command::Help => {
            bot.send_message(msg.chat.id, HELP_TEXT).await?;
            Ok(())
        }
        Command::Stats => send_stats(&bot, &msg, &state).await,
    }
}

async fn send_welcome(bot: &Bot, msg: &Message) -> ResponseResult<()> {
    let me = bot.get_me().await?;
    let invite = format!(
        "https://t.me/{}?startgroup=true&admin=delete_messages+restrict_members",
        me.username()
    );

    let mut rows = Vec::new();
    match Url::parse(&invite) {
        Ok(url) => rows.push(vec![InlineKeyboardButton::url("➕ Add me to your group", url)]),
        Err(e) => error!("failed to build invite link: {}", e),
    }
    rows.push(vec![InlineKeyboardButton::callback("📋 Help", "help")]);

    bot.send_message(msg.chat.id, WELCOME_TEXT)
        .reply_markup(InlineKeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

async fn send_stats(bot: &Bot, msg: &Message, state: &AppState) -> ResponseResult<()> {
    let caller = msg.from.as_ref().map(|u| u.id.0);
    if caller.is_none() || caller != state.config.telegram.super_admin_id {
        bot.send_message(msg.chat.id, "❌ This command is for the super admin only.")
            .await?;
        return Ok(());
    }

    let stats = state.engine.stats();
    info!("stats requested: {:?}", stats);
    bot.send_message(
        msg.chat.id,
        format!(
            "📊 Moderation since start\n\n\
             Messages screened: {}\n\
             Links removed: {}\n\
             Foreign mentions removed: {}",
            stats.screened, stats.links_removed, stats.foreign_mentions_removed
        ),
    )
    .await?;
    Ok(())
}

/// Inline "Help" button on the welcome message.
pub async fn handle_callback(bot: Bot, query: CallbackQuery) -> ResponseResult<()> {
    if query.data.as_deref() == Some("help") {
        if let Some(message) = query.message.as_ref() {
            bot.send_message(message.chat().id, HELP_TEXT).await?;
        }
    }
    bot.answer_callback_query(query.id).await?;
    Ok(())
}
