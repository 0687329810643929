//! The membership core: registration, on-demand checks, access grants and
//! revocations, and the expiry sweep.
//!
//! One explicitly constructed service owns the store and gateway ports; the
//! command handlers and the sweeper task both borrow it and never share any
//! other state. Nothing here retries: a failed gateway action is logged,
//! counted, and naturally retried by the next check or sweep cycle.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::engine::{classify, SubscriptionState};
use crate::error::MembershipResult;
use crate::gateway::{GroupId, ManagedGroups, MembershipGateway};
use crate::record::{MemberRecord, NewMemberRecord};
use crate::store::RecordStore;

/// Pause between the revoke and restore calls on one group, so the platform
/// registers them as two actions instead of a no-op.
const REVOKE_RESTORE_PAUSE: Duration = Duration::from_secs(1);

/// Invite links minted for one grant, one per managed group.
///
/// A `None` side means link creation failed; the failure was logged and the
/// other link, if present, is still usable (best effort, no retry).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessGrant {
    pub chat_link: Option<String>,
    pub channel_link: Option<String>,
}

impl AccessGrant {
    pub fn is_complete(&self) -> bool {
        self.chat_link.is_some() && self.channel_link.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.chat_link.is_none() && self.channel_link.is_none()
    }
}

/// Result of one revoke-then-restore pass across the managed groups.
/// Failures are collected here and logged, never raised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevokeOutcome {
    /// Groups where both the revoke and the restore call went through.
    pub revoked: usize,
    /// Groups where either call failed.
    pub failures: usize,
}

impl RevokeOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }
}

/// What happened to a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// A new unpaid record was appended.
    Created,
    /// A record already existed; nothing was written.
    AlreadyRegistered,
}

/// What an on-demand status check decided and did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// No record; the member should be pointed at registration.
    Unregistered,
    /// Payment not confirmed (or confirmed without a usable expiry).
    AwaitingPayment,
    /// Subscription lapsed on the contained date; the revoke sequence ran.
    Expired(NaiveDate),
    /// Subscription is active; invite links were requested.
    Granted {
        valid_until: NaiveDate,
        grant: AccessGrant,
    },
}

/// Counters for one expiry sweep cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Records inspected this cycle.
    pub scanned: usize,
    /// Records classified as expired.
    pub expired: usize,
    /// Expired members removed from both groups without a hitch.
    pub revoked: usize,
    /// Expired members with at least one failed group action.
    pub failures: usize,
}

/// The subscription lifecycle manager.
///
/// Holds the two collaborator ports and the managed group pair; constructed
/// once at startup and shared by the command handlers and the sweeper.
pub struct MembershipService {
    store: Arc<dyn RecordStore>,
    gateway: Arc<dyn MembershipGateway>,
    groups: ManagedGroups,
    revoke_pause: Duration,
}

impl MembershipService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        gateway: Arc<dyn MembershipGateway>,
        groups: ManagedGroups,
    ) -> Self {
        Self {
            store,
            gateway,
            groups,
            revoke_pause: REVOKE_RESTORE_PAUSE,
        }
    }

    /// Overrides the pause between revoke and restore. Tests use a zero
    /// pause; production keeps the default.
    pub fn with_revoke_pause(mut self, pause: Duration) -> Self {
        self.revoke_pause = pause;
        self
    }

    /// Finds and reads the record for `member_id` (first match wins).
    pub async fn lookup(&self, member_id: i64) -> MembershipResult<Option<MemberRecord>> {
        match self.store.find_row(member_id).await? {
            Some(row) => Ok(Some(self.store.read_row(row).await?)),
            None => Ok(None),
        }
    }

    /// Classifies `member_id` as of `today` without acting on the result.
    pub async fn status(
        &self,
        member_id: i64,
        today: NaiveDate,
    ) -> MembershipResult<SubscriptionState> {
        let record = self.lookup(member_id).await?;
        Ok(classify(record.as_ref(), today))
    }

    /// Creates the member's record unless one already exists.
    ///
    /// The existence re-check narrows the find-then-append race to the gap
    /// between these two calls; the store offers no atomic insert-if-absent,
    /// and lookups resolve any duplicate that still slips in as first match
    /// wins.
    pub async fn register(
        &self,
        record: NewMemberRecord,
    ) -> MembershipResult<RegistrationOutcome> {
        if self.store.find_row(record.member_id).await?.is_some() {
            return Ok(RegistrationOutcome::AlreadyRegistered);
        }
        self.store.append_row(&record).await?;
        info!(
            member_id = record.member_id,
            full_name = %record.full_name,
            "registered new member"
        );
        Ok(RegistrationOutcome::Created)
    }

    /// Re-reads and classifies the record, then enforces the result: expired
    /// members go through the same revoke sequence as the sweep, active
    /// members get invite links.
    pub async fn check_access(
        &self,
        member_id: i64,
        today: NaiveDate,
    ) -> MembershipResult<CheckOutcome> {
        let record = self.lookup(member_id).await?;
        match classify(record.as_ref(), today) {
            SubscriptionState::Unregistered => Ok(CheckOutcome::Unregistered),
            SubscriptionState::AwaitingPayment => Ok(CheckOutcome::AwaitingPayment),
            SubscriptionState::Expired(expiry) => {
                let outcome = self.revoke_access(member_id).await;
                info!(
                    member_id,
                    expiry = %expiry,
                    revoked = outcome.revoked,
                    failures = outcome.failures,
                    "revoked expired membership on check"
                );
                Ok(CheckOutcome::Expired(expiry))
            }
            SubscriptionState::Active(expiry) => {
                let grant = self.grant_access(member_id).await;
                Ok(CheckOutcome::Granted {
                    valid_until: expiry,
                    grant,
                })
            }
        }
    }

    /// Mints one single-use invite link per managed group. Never writes to
    /// the store and never fails as a whole: each missing link was logged.
    pub async fn grant_access(&self, member_id: i64) -> AccessGrant {
        AccessGrant {
            chat_link: self.request_invite(self.groups.chat, member_id).await,
            channel_link: self.request_invite(self.groups.channel, member_id).await,
        }
    }

    async fn request_invite(&self, group: GroupId, member_id: i64) -> Option<String> {
        match self.gateway.create_single_use_invite(group).await {
            Ok(link) => Some(link),
            Err(e) => {
                warn!(member_id, group, error = %e, "invite link creation failed");
                None
            }
        }
    }

    /// Removes the member from both groups, each as revoke-then-restore so
    /// the member can come back through a fresh invite. Groups are attempted
    /// independently; failures are counted and logged, not raised, which
    /// keeps repeated calls (sweep racing a check) harmless.
    pub async fn revoke_access(&self, member_id: i64) -> RevokeOutcome {
        let mut outcome = RevokeOutcome::default();
        for (label, group) in self.groups.labeled() {
            match self.revoke_then_restore(group, member_id).await {
                Ok(()) => outcome.revoked += 1,
                Err(e) => {
                    outcome.failures += 1;
                    warn!(
                        member_id,
                        group,
                        group_kind = label,
                        error = %e,
                        "revoke sequence failed"
                    );
                }
            }
        }
        outcome
    }

    async fn revoke_then_restore(&self, group: GroupId, member_id: i64) -> MembershipResult<()> {
        self.gateway.revoke(group, member_id).await?;
        tokio::time::sleep(self.revoke_pause).await;
        self.gateway.restore(group, member_id).await
    }

    /// One sweep cycle: classify every record and revoke the expired ones.
    ///
    /// Per-member failures are contained and counted; only a failure to list
    /// the table aborts the cycle. The sweep never writes to the store;
    /// clearing the stale paid flag is the administrator's call.
    pub async fn sweep_expired(&self, today: NaiveDate) -> MembershipResult<SweepSummary> {
        let records = self.store.list_rows().await?;
        let mut summary = SweepSummary {
            scanned: records.len(),
            ..SweepSummary::default()
        };
        for record in &records {
            if let SubscriptionState::Expired(expiry) = classify(Some(record), today) {
                summary.expired += 1;
                let outcome = self.revoke_access(record.member_id).await;
                if outcome.is_clean() {
                    summary.revoked += 1;
                    info!(
                        member_id = record.member_id,
                        expiry = %expiry,
                        "revoked expired membership"
                    );
                } else {
                    summary.failures += 1;
                }
            }
        }
        Ok(summary)
    }
}
