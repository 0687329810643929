use thiserror::Error;

/// Errors surfaced by the membership core and its adapters.
#[derive(Debug, Error)]
pub enum MembershipError {
    /// Record store request failed or answered something unusable.
    #[error("record store error: {0}")]
    Store(String),

    /// Membership gateway call failed or was rejected by the platform.
    #[error("membership gateway error: {0}")]
    Gateway(String),

    /// Service-account credential or token exchange failure.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Invalid or missing adapter configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type MembershipResult<T> = Result<T, MembershipError>;
