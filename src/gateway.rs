use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ChatMemberStatus, MessageId, UserId};
use teloxide::{ApiError, RequestError};
use tracing::debug;

use crate::moderation::{ChatGateway, MemberStatus};

/// `ChatGateway` backed by the Telegram Bot API.
///
/// The Bot API offers no handle-to-user lookup, so the gateway keeps its own
/// peer map of handles it has seen sending messages. Direct member lookups
/// only succeed for handles in that map; everything else is a miss and the
/// verifier falls back to the admin list and the activity cache.
pub struct TelegramGateway {
    bot: Bot,
    peers: RwLock<HashMap<String, u64>>,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            peers: RwLock::new(HashMap::new()),
        }
    }

    /// Remember which user id owns a handle, learned from observed traffic.
    pub fn remember_peer(&self, user_id: u64, handle: &str) {
        let mut peers = self.peers.write().unwrap_or_else(|e| e.into_inner());
        peers.insert(handle.to_lowercase(), user_id);
    }

    fn resolve_peer(&self, handle: &str) -> Option<u64> {
        let peers = self.peers.read().unwrap_or_else(|e| e.into_inner());
        peers.get(&handle.to_lowercase()).copied()
    }
}

fn map_status(status: ChatMemberStatus) -> MemberStatus {
    match status {
        ChatMemberStatus::Owner => MemberStatus::Owner,
        ChatMemberStatus::Administrator => MemberStatus::Administrator,
        ChatMemberStatus::Member => MemberStatus::Member,
        ChatMemberStatus::Restricted => MemberStatus::Restricted,
        ChatMemberStatus::Left => MemberStatus::Left,
        ChatMemberStatus::Banned => MemberStatus::Banned,
    }
}

#[async_trait]
impl ChatGateway for TelegramGateway {
    async fn member_status(&self, chat_id: i64, handle: &str) -> Result<Option<MemberStatus>> {
        let user_id = match self.resolve_peer(handle) {
            Some(id) => id,
            None => {
                debug!("no peer record for @{}, direct lookup skipped", handle);
                return Ok(None);
            }
        };

        match self
            .bot
            .get_chat_member(ChatId(chat_id), UserId(user_id))
            .await
        {
            Ok(member) => Ok(Some(map_status(member.status()))),
            Err(RequestError::Api(ApiError::UserNotFound)) => Ok(None),
            Err(e) => Err(e).context("get_chat_member failed"),
        }
    }

    async fn administrator_handles(&self, chat_id: i64) -> Result<Vec<String>> {
        let admins = self
            .bot
            .get_chat_administrators(ChatId(chat_id))
            .await
            .context("get_chat_administrators failed")?;
        Ok(admins
            .into_iter()
            .filter_map(|member| member.user.username)
            .collect())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<()> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await
            .context("delete_message failed")?;
        Ok(())
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i32> {
        let sent = self
            .bot
            .send_message(ChatId(chat_id), text)
            .await
            .context("send_message failed")?;
        Ok(sent.id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_map_is_case_insensitive() {
        let gateway = TelegramGateway::new(Bot::new("123:test"));
        gateway.remember_peer(42, "Alice_99");

        assert_eq!(gateway.resolve_peer("alice_99"), Some(42));
        assert_eq!(gateway.resolve_peer("ALICE_99"), Some(42));
        assert_eq!(gateway.resolve_peer("bob"), None);
    }

    #[test]
    fn test_peer_map_keeps_latest_id() {
        let gateway = TelegramGateway::new(Bot::new("123:test"));
        gateway.remember_peer(1, "alice");
        gateway.remember_peer(2, "alice");

        assert_eq!(gateway.resolve_peer("alice"), Some(2));
    }
}
