//! Application state

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use gatekeeper_membership::MembershipService;

use crate::telegram::TelegramClient;

/// Shared bot state
///
/// The dispatcher hands this to every handler. `pending_names` holds members
/// who were asked for their name; their next plain-text message completes
/// registration. Entries survive store failures so the member can simply
/// send the name again.
pub struct BotState {
    pub telegram: Arc<TelegramClient>,
    pub core: Arc<MembershipService>,
    pub admin_contact: String,
    pub pending_names: Mutex<HashSet<i64>>,
}

impl BotState {
    pub fn new(
        telegram: Arc<TelegramClient>,
        core: Arc<MembershipService>,
        admin_contact: String,
    ) -> Self {
        Self {
            telegram,
            core,
            admin_contact,
            pending_names: Mutex::new(HashSet::new()),
        }
    }
}
