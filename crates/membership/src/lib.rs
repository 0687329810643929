// Membership crate clippy configuration
// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Gatekeeper Membership Module
//!
//! Decides who may stay in the paid chat and channel, and acts on it.
//!
//! ## Features
//!
//! - **Classification**: pure subscription state machine over store records
//! - **Registration**: first-contact record creation with a duplicate guard
//! - **Access Grants**: single-use invite links, one per managed group
//! - **Revocation**: idempotent revoke-then-restore removal from both groups
//! - **Expiry Sweep**: periodic revocation of lapsed memberships
//! - **Sheets Adapter**: Google Sheets-backed record store

pub mod engine;
pub mod error;
pub mod gateway;
pub mod record;
pub mod service;
pub mod sheets;
pub mod store;


// Engine
pub use engine::{classify, SubscriptionState};

// Error
pub use error::{MembershipError, MembershipResult};

// Gateway
pub use gateway::{GroupId, ManagedGroups, MembershipGateway};

// Record
pub use record::{parse_expiry, MemberRecord, NewMemberRecord, PaymentStatus, EXPIRY_FORMAT};

// Service
pub use service::{
    AccessGrant, CheckOutcome, MembershipService, RegistrationOutcome, RevokeOutcome,
    SweepSummary,
};

// Sheets
pub use sheets::SheetsStore;

// Store
pub use store::{RecordStore, RowRef};
