//! Gatekeeper Bot
//!
//! Keeps a paid chat and channel in sync with a member spreadsheet:
//! - Registers newcomers as unpaid rows via `/start`
//! - Confirms access and delivers single-use invite links via `/check`
//! - Sweeps the table on a schedule and revokes lapsed members

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatekeeper_bot::config::Config;
use gatekeeper_bot::state::BotState;
use gatekeeper_bot::telegram::TelegramClient;
use gatekeeper_bot::{dispatcher, sweeper};
use gatekeeper_membership::{ManagedGroups, MembershipService, SheetsStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,gatekeeper_bot=debug,gatekeeper_membership=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Gatekeeper Bot v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let http = reqwest::Client::new();

    // Record store over the member spreadsheet
    let store = SheetsStore::from_key_file(
        http.clone(),
        &config.service_account_file,
        config.spreadsheet_id.clone(),
        config.sheet_name.clone(),
    )?;
    tracing::info!(sheet = %config.sheet_name, "Record store ready");

    // One Bot API client serves both the dispatcher and the gateway
    let telegram = Arc::new(TelegramClient::new(http, &config.bot_token));

    let groups = ManagedGroups::new(config.chat_id, config.channel_id);
    let core = Arc::new(MembershipService::new(
        Arc::new(store),
        telegram.clone(),
        groups,
    ));

    // Start the background expiry sweeper
    tokio::spawn(sweeper::run(core.clone(), config.sweep_interval()));
    tracing::info!(
        interval_min = config.check_interval_min,
        "Expiry sweeper task started"
    );

    let state = Arc::new(BotState::new(telegram, core, config.admin_contact.clone()));
    tracing::info!("Listening for updates");

    dispatcher::run(state).await;

    Ok(())
}
