use std::sync::Arc;

use anyhow::Result;
use teloxide::dispatching::MessageFilterExt;
use teloxide::prelude::*;
use tracing::{debug, info, warn};

use crate::commands::{self, Command};
use crate::config::Config;
use crate::gateway::TelegramGateway;
use crate::moderation::engine::ModerationEngine;
use crate::moderation::{ChatKind, InboundMessage, Sender};

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub engine: Arc<ModerationEngine>,
    pub gateway: Arc<TelegramGateway>,
}

/// Start the Telegram bot
pub async fn run(bot: Bot, state: Arc<AppState>) -> Result<()> {
    info!("Starting Telegram bot...");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(commands::handle_command),
                )
                .branch(Message::filter_new_chat_members().endpoint(remove_join_message))
                .branch(Message::filter_left_chat_member().endpoint(remove_leave_message))
                .branch(
                    dptree::filter(|msg: Message| {
                        msg.chat.is_group() || msg.chat.is_supergroup()
                    })
                    .endpoint(handle_group_message),
                ),
        )
        .branch(Update::filter_callback_query().endpoint(commands::handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("groupguard"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_group_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    // Teach the gateway which user id owns the sender's handle so later
    // direct lookups for that handle can succeed.
    if let Some(user) = msg.from.as_ref() {
        if let Some(handle) = user.username.as_deref() {
            state.gateway.remember_peer(user.id.0, handle);
        }
    }

    let inbound = to_inbound(&msg);
    state.engine.observe(&inbound);
    let outcome = state.engine.moderate(&inbound).await;
    debug!(
        "message {} in chat {}: {:?}",
        inbound.message_id, inbound.chat_id, outcome
    );

    Ok(())
}

/// "X joined the group" announcements are noise; drop them.
async fn remove_join_message(bot: Bot, msg: Message) -> ResponseResult<()> {
    if let Err(e) = bot.delete_message(msg.chat.id, msg.id).await {
        warn!("failed to delete join message in chat {}: {}", msg.chat.id, e);
    } else {
        info!("deleted join message in chat {}", msg.chat.id);
    }
    Ok(())
}

async fn remove_leave_message(bot: Bot, msg: Message) -> ResponseResult<()> {
    if let Err(e) = bot.delete_message(msg.chat.id, msg.id).await {
        warn!(
            "failed to delete leave message in chat {}: {}",
            msg.chat.id, e
        );
    } else {
        info!("deleted leave message in chat {}", msg.chat.id);
    }
    Ok(())
}

fn to_inbound(msg: &Message) -> InboundMessage {
    let chat_kind = if msg.chat.is_group() {
        ChatKind::Group
    } else if msg.chat.is_supergroup() {
        ChatKind::Supergroup
    } else if msg.chat.is_channel() {
        ChatKind::Channel
    } else {
        ChatKind::Private
    };

    InboundMessage {
        chat_id: msg.chat.id.0,
        chat_kind,
        message_id: msg.id.0,
        sender: msg.from.as_ref().map(|user| Sender {
            user_id: user.id.0,
            username: user.username.clone(),
            full_name: user.full_name(),
        }),
        text: msg.text().map(str::to_string),
    }
}
