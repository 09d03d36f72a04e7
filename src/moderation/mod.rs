pub mod cache;
pub mod classifier;
pub mod engine;
pub mod verifier;

use anyhow::Result;
use async_trait::async_trait;

/// Kind of chat a message arrived in. Only groups and supergroups are
/// moderated; everything else is ignored by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn is_moderated(self) -> bool {
        matches!(self, ChatKind::Group | ChatKind::Supergroup)
    }
}

/// Sender identity as Telegram reports it.
#[derive(Debug, Clone)]
pub struct Sender {
    pub user_id: u64,
    pub username: Option<String>,
    pub full_name: String,
}

impl Sender {
    /// How the sender is addressed in warning replies: `@handle` when one
    /// exists, otherwise the display name.
    pub fn display(&self) -> String {
        match &self.username {
            Some(handle) => format!("@{handle}"),
            None => self.full_name.clone(),
        }
    }
}

/// A group message as seen by the moderation core, decoupled from the
/// Telegram types so the engine can be driven in tests.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub chat_kind: ChatKind,
    pub message_id: i32,
    pub sender: Option<Sender>,
    pub text: Option<String>,
}

/// Role a chat member holds, as reported by the membership authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

impl MemberStatus {
    /// Statuses that count as "belongs to this chat" for mention checks.
    pub fn is_present(self) -> bool {
        matches!(
            self,
            MemberStatus::Owner | MemberStatus::Administrator | MemberStatus::Member
        )
    }
}

/// The external chat-membership authority (the Telegram Bot API in
/// production). Calls may fail or stall; callers treat lookup errors as
/// misses and bound latency themselves.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Member record for `handle` in `chat_id`, or `None` when the authority
    /// cannot resolve the handle in that chat.
    async fn member_status(&self, chat_id: i64, handle: &str) -> Result<Option<MemberStatus>>;

    /// Handles of the chat's current administrators (admins without a public
    /// handle are omitted).
    async fn administrator_handles(&self, chat_id: i64) -> Result<Vec<String>>;

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<()>;

    /// Send a plain text message to the chat, returning the new message id.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i32>;
}
