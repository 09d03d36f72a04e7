use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::moderation::cache::MembershipCache;
use crate::moderation::classifier;
use crate::moderation::verifier::MembershipVerifier;
use crate::moderation::{ChatGateway, InboundMessage};

const LINK_WARNING: &str = "❌ Advertising is not allowed! Posting links is prohibited.";
const MENTION_WARNING: &str =
    "⚠️ Advertising is not allowed! Mentioning users who are not members of this group is prohibited.";

/// Terminal result of moderating one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not a moderated message (wrong chat kind, no sender, or no text).
    Ignored,
    Clean,
    LinkRemoved,
    ForeignMentionRemoved,
}

/// Counters since process start. Never persisted.
#[derive(Debug, Default)]
struct Counters {
    screened: AtomicU64,
    links_removed: AtomicU64,
    foreign_mentions_removed: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct StatsSnapshot {
    pub screened: u64,
    pub links_removed: u64,
    pub foreign_mentions_removed: u64,
}

/// Per-message moderation orchestrator.
///
/// `moderate` makes exactly one keep/delete decision per message and absorbs
/// every failure along the way: a broken deletion or send is logged and the
/// pipeline moves on. Nothing here returns an error to the dispatcher.
pub struct ModerationEngine {
    gateway: Arc<dyn ChatGateway>,
    cache: Arc<MembershipCache>,
    verifier: MembershipVerifier,
    warning_ttl: Duration,
    counters: Counters,
}

impl ModerationEngine {
    pub fn new(
        gateway: Arc<dyn ChatGateway>,
        cache: Arc<MembershipCache>,
        verify_timeout: Duration,
        warning_ttl: Duration,
    ) -> Self {
        let verifier =
            MembershipVerifier::new(Arc::clone(&gateway), Arc::clone(&cache), verify_timeout);
        Self {
            gateway,
            cache,
            verifier,
            warning_ttl,
            counters: Counters::default(),
        }
    }

    /// Record the sender's activity for later mention verification. Runs for
    /// every group message regardless of what `moderate` decides about it.
    pub fn observe(&self, msg: &InboundMessage) {
        if !msg.chat_kind.is_moderated() {
            return;
        }
        if let Some(handle) = msg.sender.as_ref().and_then(|s| s.username.as_deref()) {
            self.cache.record(msg.chat_id, handle);
        }
    }

    /// Decide whether `msg` stays or goes, and carry out the side effects.
    pub async fn moderate(&self, msg: &InboundMessage) -> Outcome {
        if !msg.chat_kind.is_moderated() {
            return Outcome::Ignored;
        }
        let sender = match msg.sender.as_ref() {
            Some(s) => s,
            None => return Outcome::Ignored,
        };
        let text = match msg.text.as_deref() {
            Some(t) => t,
            None => return Outcome::Ignored,
        };

        self.counters.screened.fetch_add(1, Ordering::Relaxed);
        let classification = classifier::classify(text);

        if classification.has_link {
            warn!(
                "link detected in chat {} from user {}, removing message {}",
                msg.chat_id, sender.user_id, msg.message_id
            );
            self.delete_message(msg.chat_id, msg.message_id).await;
            // The warning goes out even when the deletion failed.
            let warning = format!("{}, {}", sender.display(), LINK_WARNING);
            self.post_warning(msg.chat_id, &warning).await;
            self.counters.links_removed.fetch_add(1, Ordering::Relaxed);
            return Outcome::LinkRemoved;
        }

        for mention in &classification.mentions {
            let verdict = self.verifier.verify(msg.chat_id, mention).await;
            if verdict.is_member() {
                continue;
            }

            warn!(
                "foreign mention @{} in chat {} from user {}, removing message {}",
                mention, msg.chat_id, sender.user_id, msg.message_id
            );
            self.delete_message(msg.chat_id, msg.message_id).await;
            let warning = format!("{}, {}", sender.display(), MENTION_WARNING);
            if let Some(warning_id) = self.post_warning(msg.chat_id, &warning).await {
                self.schedule_warning_cleanup(msg.chat_id, warning_id);
            }
            self.counters
                .foreign_mentions_removed
                .fetch_add(1, Ordering::Relaxed);
            return Outcome::ForeignMentionRemoved;
        }

        Outcome::Clean
    }

    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            screened: self.counters.screened.load(Ordering::Relaxed),
            links_removed: self.counters.links_removed.load(Ordering::Relaxed),
            foreign_mentions_removed: self
                .counters
                .foreign_mentions_removed
                .load(Ordering::Relaxed),
        }
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) {
        if let Err(e) = self.gateway.delete_message(chat_id, message_id).await {
            error!(
                "failed to delete message {} in chat {}: {:#}",
                message_id, chat_id, e
            );
        }
    }

    async fn post_warning(&self, chat_id: i64, text: &str) -> Option<i32> {
        match self.gateway.send_message(chat_id, text).await {
            Ok(message_id) => Some(message_id),
            Err(e) => {
                error!("failed to post warning in chat {}: {:#}", chat_id, e);
                None
            }
        }
    }

    /// The mention warning is transient: take it down again after the TTL.
    /// Runs detached so the dispatcher's per-chat queue is not held up.
    fn schedule_warning_cleanup(&self, chat_id: i64, warning_id: i32) {
        let gateway = Arc::clone(&self.gateway);
        let ttl = self.warning_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            // The warning may already be gone; either way nobody cares.
            if gateway.delete_message(chat_id, warning_id).await.is_err() {
                info!("warning {} in chat {} was already gone", warning_id, chat_id);
            }
        });
    }
}
