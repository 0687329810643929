//! Long-poll dispatcher
//!
//! Pulls updates from the Bot API in a single loop and hands each message
//! to the handlers. One failed batch never stops the loop.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use crate::handlers;
use crate::state::BotState;

/// Wait before polling again after a failed `getUpdates` call.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Runs the update loop forever.
///
/// The offset only advances past updates that were handed to a handler, so
/// a crash-restart replays at most the batch in flight.
pub async fn run(state: Arc<BotState>) {
    let mut offset = 0i64;
    loop {
        let updates = match state.telegram.get_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                error!(error = %e, "Failed to fetch updates");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            if let Some(message) = &update.message {
                debug!(update_id = update.update_id, "Dispatching message");
                handlers::handle_message(&state, message).await;
            }
        }
    }
}
