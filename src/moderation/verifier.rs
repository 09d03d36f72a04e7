use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::moderation::cache::MembershipCache;
use crate::moderation::ChatGateway;

/// Which verification tier confirmed a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    DirectLookup,
    AdminList,
    ActivityCache,
}

/// Result of verifying a mentioned handle against a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Confirmed(Tier),
    Foreign,
}

impl Verdict {
    pub fn is_member(self) -> bool {
        matches!(self, Verdict::Confirmed(_))
    }
}

/// Resolves whether a mentioned handle belongs to a chat.
///
/// Three tiers are tried in order, stopping at the first hit: a direct
/// member lookup, the administrator list, and finally the local activity
/// cache. A lookup error or timeout counts as a miss for that tier and
/// never aborts the chain, so the worst case is a conservative `Foreign`.
pub struct MembershipVerifier {
    gateway: Arc<dyn ChatGateway>,
    cache: Arc<MembershipCache>,
    lookup_timeout: Duration,
}

impl MembershipVerifier {
    pub fn new(
        gateway: Arc<dyn ChatGateway>,
        cache: Arc<MembershipCache>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            cache,
            lookup_timeout,
        }
    }

    pub async fn verify(&self, chat_id: i64, handle: &str) -> Verdict {
        if self.confirmed_by_direct_lookup(chat_id, handle).await {
            info!("@{} confirmed in chat {} by direct lookup", handle, chat_id);
            return Verdict::Confirmed(Tier::DirectLookup);
        }

        if self.confirmed_by_admin_list(chat_id, handle).await {
            info!("@{} confirmed in chat {} via admin list", handle, chat_id);
            return Verdict::Confirmed(Tier::AdminList);
        }

        if self.cache.contains(chat_id, handle) {
            info!("@{} confirmed in chat {} via activity cache", handle, chat_id);
            return Verdict::Confirmed(Tier::ActivityCache);
        }

        info!("@{} not found in chat {}, treating as foreign", handle, chat_id);
        Verdict::Foreign
    }

    async fn confirmed_by_direct_lookup(&self, chat_id: i64, handle: &str) -> bool {
        let lookup = self.gateway.member_status(chat_id, handle);
        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Ok(Some(status))) => status.is_present(),
            Ok(Ok(None)) => false,
            Ok(Err(e)) => {
                debug!("member lookup failed for @{}: {:#}", handle, e);
                false
            }
            Err(_) => {
                debug!("member lookup timed out for @{}", handle);
                false
            }
        }
    }

    async fn confirmed_by_admin_list(&self, chat_id: i64, handle: &str) -> bool {
        let lookup = self.gateway.administrator_handles(chat_id);
        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Ok(admins)) => admins.iter().any(|a| a.eq_ignore_ascii_case(handle)),
            Ok(Err(e)) => {
                debug!("admin list fetch failed for chat {}: {:#}", chat_id, e);
                false
            }
            Err(_) => {
                debug!("admin list fetch timed out for chat {}", chat_id);
                false
            }
        }
    }
}
