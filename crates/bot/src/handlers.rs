//! Command handlers
//!
//! Routes private messages to `/start`, `/check`, or the name capture step
//! of registration. Handlers translate membership outcomes into replies;
//! handler failures are logged and never crash the dispatch loop.

use chrono::{Local, NaiveDate};
use tracing::{error, warn};

use gatekeeper_membership::{
    AccessGrant, CheckOutcome, MembershipResult, NewMemberRecord, RegistrationOutcome,
    SubscriptionState,
};

use crate::state::BotState;
use crate::telegram::{Message, User};

const NAME_PROMPT: &str = "Hello! Please reply with your first and last name:";
const NOT_REGISTERED: &str = "You are not registered. Send /start to begin.";
const SUBSCRIPTION_EXPIRED: &str =
    "Your subscription has expired. Contact the administrator to renew.";

/// A recognized bot command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Check,
}

/// Parses a leading bot command, tolerating the `@botname` suffix Telegram
/// appends when a command is tapped from a mention.
pub fn parse_command(text: &str) -> Option<Command> {
    let first = text.trim().split_whitespace().next()?;
    let command = first.strip_prefix('/')?;
    let bare = command.split('@').next()?;
    match bare {
        "start" => Some(Command::Start),
        "check" => Some(Command::Check),
        _ => None,
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Entry point for every update the dispatcher pulls.
///
/// Only private chats are handled; group chatter, joins, and service
/// messages fall through. Unknown commands are ignored rather than captured
/// as a name.
pub async fn handle_message(state: &BotState, message: &Message) {
    if message.chat.kind != "private" {
        return;
    }
    let (from, text) = match (&message.from, message.text.as_deref()) {
        (Some(from), Some(text)) => (from, text),
        _ => return,
    };

    let result = match parse_command(text) {
        Some(Command::Start) => handle_start(state, from).await,
        Some(Command::Check) => handle_check(state, from).await,
        None if text.trim_start().starts_with('/') => Ok(()),
        None => handle_full_name(state, from, text).await,
    };

    if let Err(e) = result {
        error!(member_id = from.id, error = %e, "Failed to handle message");
    }
}

/// `/start`: greet by current status. New members are asked for their name;
/// active members get fresh links. Unlike `/check`, an expired status is
/// only reported here, never enforced.
async fn handle_start(state: &BotState, from: &User) -> MembershipResult<()> {
    match state.core.status(from.id, local_today()).await? {
        SubscriptionState::Unregistered => {
            state.pending_names.lock().await.insert(from.id);
            state.telegram.send_message(from.id, NAME_PROMPT).await
        }
        SubscriptionState::AwaitingPayment => {
            let text = format!(
                "You are registered, but your payment is not confirmed. Contact the administrator: {}",
                state.admin_contact
            );
            state.telegram.send_message(from.id, &text).await
        }
        SubscriptionState::Expired(_) => {
            state
                .telegram
                .send_message(from.id, SUBSCRIPTION_EXPIRED)
                .await
        }
        SubscriptionState::Active(expiry) => {
            let grant = state.core.grant_access(from.id).await;
            deliver_links(state, from.id, &grant).await;
            let text = format!(
                "You have already paid. The chat and channel links have been sent to you. Your subscription runs until {}.",
                expiry
            );
            state.telegram.send_message(from.id, &text).await
        }
    }
}

/// `/check`: classify and enforce. Expired members lose group access right
/// here; active members get fresh links.
async fn handle_check(state: &BotState, from: &User) -> MembershipResult<()> {
    match state.core.check_access(from.id, local_today()).await? {
        CheckOutcome::Unregistered => state.telegram.send_message(from.id, NOT_REGISTERED).await,
        CheckOutcome::AwaitingPayment => {
            let text = format!(
                "Your payment is not confirmed. Contact the administrator: {}",
                state.admin_contact
            );
            state.telegram.send_message(from.id, &text).await
        }
        CheckOutcome::Expired(_) => {
            state
                .telegram
                .send_message(from.id, SUBSCRIPTION_EXPIRED)
                .await
        }
        CheckOutcome::Granted { valid_until, grant } => {
            deliver_links(state, from.id, &grant).await;
            let text = format!(
                "Your subscription is active until {}. The chat and channel links have been sent to you.",
                valid_until
            );
            state.telegram.send_message(from.id, &text).await
        }
    }
}

/// Plain text from a member we asked to introduce themselves: record them
/// as unpaid. The pending mark is cleared only after the record lands, so a
/// store failure lets the member simply send their name again.
async fn handle_full_name(state: &BotState, from: &User, text: &str) -> MembershipResult<()> {
    if !state.pending_names.lock().await.contains(&from.id) {
        return Ok(());
    }
    let full_name = text.trim();
    if full_name.is_empty() {
        return Ok(());
    }

    let outcome = state
        .core
        .register(NewMemberRecord {
            member_id: from.id,
            username: from.username.clone().unwrap_or_default(),
            full_name: full_name.to_string(),
        })
        .await?;
    state.pending_names.lock().await.remove(&from.id);

    let text = match outcome {
        RegistrationOutcome::Created => format!(
            "Thank you, {}!\nTo get access, arrange payment with the administrator.\nAdministrator contact: {}\nAfter paying, send /check.",
            full_name, state.admin_contact
        ),
        RegistrationOutcome::AlreadyRegistered => {
            "You are already registered. Send /check to verify your access.".to_string()
        }
    };
    state.telegram.send_message(from.id, &text).await
}

/// DMs whichever invite links were minted, one message per group. Delivery
/// failures are logged; the confirmation reply still goes out.
async fn deliver_links(state: &BotState, member_id: i64, grant: &AccessGrant) {
    let links = [
        ("Chat", grant.chat_link.as_deref()),
        ("Channel", grant.channel_link.as_deref()),
    ];
    for (label, link) in links {
        let link = match link {
            Some(link) => link,
            None => continue,
        };
        let text = format!("{} invite link: {}", label, link);
        if let Err(e) = state.telegram.send_message(member_id, &text).await {
            warn!(member_id, group_kind = label, error = %e, "Failed to deliver invite link");
        }
    }
}
