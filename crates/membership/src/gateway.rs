//! Membership gateway port.
//!
//! The gateway is the platform-side lever: it removes members from the
//! managed groups and mints the invite links that let them in. It never
//! touches the record store.

use async_trait::async_trait;

use crate::error::MembershipResult;

/// Platform identifier of a managed group (negative for Telegram supergroups
/// and channels).
pub type GroupId = i64;

/// The two groups access is managed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedGroups {
    pub chat: GroupId,
    pub channel: GroupId,
}

impl ManagedGroups {
    pub fn new(chat: GroupId, channel: GroupId) -> Self {
        Self { chat, channel }
    }

    /// Both groups with their log labels, chat first. Access is granted and
    /// revoked in this order.
    pub fn labeled(&self) -> [(&'static str, GroupId); 2] {
        [("chat", self.chat), ("channel", self.channel)]
    }
}

/// Port over group membership actions.
///
/// Implementations must ensure:
/// - Calls are idempotent from the caller's perspective where the platform
///   allows it (revoking an already-removed member is the platform's concern,
///   not a precondition here)
/// - Failure on one group says nothing about the other; callers attempt each
///   group independently
#[async_trait]
pub trait MembershipGateway: Send + Sync {
    /// Removes the member from the group.
    ///
    /// # Errors
    ///
    /// - `Gateway` when the platform rejects or the call fails
    async fn revoke(&self, group: GroupId, member_id: i64) -> MembershipResult<()>;

    /// Lifts the removal so the member may rejoin through a fresh invite.
    /// Without this, a revoke is a permanent block in the platform's
    /// membership semantics.
    ///
    /// # Errors
    ///
    /// - `Gateway` when the platform rejects or the call fails
    async fn restore(&self, group: GroupId, member_id: i64) -> MembershipResult<()>;

    /// Creates an invite link usable by exactly one joiner (member limit 1).
    ///
    /// # Errors
    ///
    /// - `Gateway` when the platform rejects or the call fails
    async fn create_single_use_invite(&self, group: GroupId) -> MembershipResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn test_membership_gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn MembershipGateway) {}
    }

    #[test]
    fn test_labeled_groups_keep_chat_first() {
        let groups = ManagedGroups::new(-100, -200);
        assert_eq!(groups.labeled(), [("chat", -100), ("channel", -200)]);
    }
}
