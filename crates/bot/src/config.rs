//! Environment configuration
//!
//! Everything comes from the process environment; a `.env` file is loaded
//! before this runs. Missing required variables fail startup with the
//! variable named in the error.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram Bot API token.
    pub bot_token: String,
    /// Discussion group the bot manages.
    pub chat_id: i64,
    /// Announcement channel the bot manages.
    pub channel_id: i64,
    /// Spreadsheet holding the member table.
    pub spreadsheet_id: String,
    /// Tab name within the spreadsheet.
    pub sheet_name: String,
    /// Path to the service account key file.
    pub service_account_file: String,
    /// Admin handle included in payment instructions.
    pub admin_contact: String,
    /// Minutes between expiry sweeps.
    pub check_interval_min: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let check_interval_min: u64 = match env::var("CHECK_INTERVAL_MIN") {
            Ok(raw) => raw
                .parse()
                .context("CHECK_INTERVAL_MIN must be a number of minutes")?,
            Err(_) => 5,
        };
        // The sweeper's interval requires a non-zero period.
        if check_interval_min == 0 {
            anyhow::bail!("CHECK_INTERVAL_MIN must be at least 1");
        }

        Ok(Self {
            bot_token: required("BOT_TOKEN")?,
            chat_id: required("CHAT_ID")?
                .parse()
                .context("CHAT_ID must be a numeric group id")?,
            channel_id: required("CHANNEL_ID")?
                .parse()
                .context("CHANNEL_ID must be a numeric group id")?,
            spreadsheet_id: required("SPREADSHEET_ID")?,
            sheet_name: env::var("SHEET_NAME").unwrap_or_else(|_| "Sheet1".to_string()),
            service_account_file: env::var("SERVICE_ACCOUNT_FILE")
                .unwrap_or_else(|_| "credentials.json".to_string()),
            admin_contact: required("ADMIN_CONTACT")?,
            check_interval_min,
        })
    }

    /// Sweep cadence as a duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_min * 60)
    }
}

fn required(name: &'static str) -> Result<String> {
    env::var(name).with_context(|| format!("{} must be set", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL_VARS: [&str; 8] = [
        "BOT_TOKEN",
        "CHAT_ID",
        "CHANNEL_ID",
        "SPREADSHEET_ID",
        "SHEET_NAME",
        "SERVICE_ACCOUNT_FILE",
        "ADMIN_CONTACT",
        "CHECK_INTERVAL_MIN",
    ];

    fn clear_env() {
        for name in ALL_VARS {
            env::remove_var(name);
        }
    }

    fn set_required_env() {
        env::set_var("BOT_TOKEN", "123:abc");
        env::set_var("CHAT_ID", "-100200");
        env::set_var("CHANNEL_ID", "-100300");
        env::set_var("SPREADSHEET_ID", "sheet-id");
        env::set_var("ADMIN_CONTACT", "@admin");
    }

    #[test]
    #[serial]
    fn test_defaults_fill_optional_settings() {
        clear_env();
        set_required_env();

        let config = Config::from_env().unwrap();

        assert_eq!(config.chat_id, -100200);
        assert_eq!(config.channel_id, -100300);
        assert_eq!(config.sheet_name, "Sheet1");
        assert_eq!(config.service_account_file, "credentials.json");
        assert_eq!(config.check_interval_min, 5);
        assert_eq!(config.sweep_interval(), Duration::from_secs(300));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_overrides_replace_defaults() {
        clear_env();
        set_required_env();
        env::set_var("SHEET_NAME", "Members");
        env::set_var("CHECK_INTERVAL_MIN", "1");

        let config = Config::from_env().unwrap();

        assert_eq!(config.sheet_name, "Members");
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_required_variable_is_named() {
        clear_env();
        set_required_env();
        env::remove_var("SPREADSHEET_ID");

        let err = Config::from_env().unwrap_err();

        assert!(err.to_string().contains("SPREADSHEET_ID"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_group_ids_must_be_numeric() {
        clear_env();
        set_required_env();
        env::set_var("CHAT_ID", "not-a-number");

        let err = Config::from_env().unwrap_err();

        assert!(err.to_string().contains("CHAT_ID"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_zero_sweep_interval_is_rejected() {
        clear_env();
        set_required_env();
        env::set_var("CHECK_INTERVAL_MIN", "0");

        let err = Config::from_env().unwrap_err();

        assert!(err.to_string().contains("CHECK_INTERVAL_MIN"));
        assert!(err.to_string().contains("at least 1"));
        clear_env();
    }
}
