//! The subscription state machine.
//!
//! State is never stored; it is re-derived from the member's record and the
//! current date on every evaluation. The store stays the single source of
//! truth and manual edits take effect on the next evaluation.

use std::fmt;

use chrono::NaiveDate;

use crate::record::{MemberRecord, PaymentStatus};

/// Where a member stands in the subscription lifecycle.
///
/// `Unregistered → AwaitingPayment → Active ⇄ Expired`. `Active → Expired`
/// happens purely by the wall clock passing the stored expiry;
/// `Expired → Active` only by an administrator moving the expiry forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// No record exists for the identifier.
    Unregistered,
    /// Record exists but payment is not confirmed, or the paid flag is set
    /// without a usable expiry date.
    AwaitingPayment,
    /// Paid through the contained date (inclusive).
    Active(NaiveDate),
    /// Paid flag still set, but the contained expiry has passed.
    Expired(NaiveDate),
}

impl SubscriptionState {
    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionState::Active(_))
    }
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SubscriptionState::Unregistered => "unregistered",
            SubscriptionState::AwaitingPayment => "awaiting-payment",
            SubscriptionState::Active(_) => "active",
            SubscriptionState::Expired(_) => "expired",
        };
        f.write_str(label)
    }
}

/// Classifies a member as of `today`.
///
/// Pure function shared verbatim by the on-demand check and the expiry
/// sweep so the two paths cannot diverge for the same record and date.
pub fn classify(record: Option<&MemberRecord>, today: NaiveDate) -> SubscriptionState {
    let record = match record {
        Some(record) => record,
        None => return SubscriptionState::Unregistered,
    };
    if record.status != PaymentStatus::Paid {
        return SubscriptionState::AwaitingPayment;
    }
    match record.expiry {
        None => SubscriptionState::AwaitingPayment,
        Some(expiry) if expiry >= today => SubscriptionState::Active(expiry),
        Some(expiry) => SubscriptionState::Expired(expiry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(status: PaymentStatus, expiry: Option<NaiveDate>) -> MemberRecord {
        MemberRecord {
            member_id: 1,
            username: "u".to_string(),
            full_name: "Test Member".to_string(),
            status,
            expiry,
        }
    }

    #[test]
    fn test_missing_record_is_unregistered() {
        assert_eq!(
            classify(None, date(2024, 1, 1)),
            SubscriptionState::Unregistered
        );
    }

    #[test]
    fn test_unpaid_awaits_payment_regardless_of_expiry() {
        let today = date(2024, 1, 1);
        for expiry in [None, Some(date(2099, 1, 1)), Some(date(2000, 1, 1))] {
            let record = record(PaymentStatus::Unpaid, expiry);
            assert_eq!(
                classify(Some(&record), today),
                SubscriptionState::AwaitingPayment,
                "expiry {expiry:?} must not matter while unpaid"
            );
        }
    }

    #[test]
    fn test_paid_without_usable_expiry_awaits_payment() {
        let record = record(PaymentStatus::Paid, None);
        assert_eq!(
            classify(Some(&record), date(2024, 1, 1)),
            SubscriptionState::AwaitingPayment
        );
    }

    #[test]
    fn test_paid_with_future_expiry_is_active() {
        let record = record(PaymentStatus::Paid, Some(date(2099, 1, 1)));
        assert_eq!(
            classify(Some(&record), date(2024, 1, 1)),
            SubscriptionState::Active(date(2099, 1, 1))
        );
    }

    #[test]
    fn test_expiry_day_itself_is_still_active() {
        let today = date(2024, 6, 15);
        let record = record(PaymentStatus::Paid, Some(today));
        assert_eq!(
            classify(Some(&record), today),
            SubscriptionState::Active(today)
        );
    }

    #[test]
    fn test_paid_with_past_expiry_is_expired() {
        let record = record(PaymentStatus::Paid, Some(date(2020, 1, 1)));
        assert_eq!(
            classify(Some(&record), date(2024, 1, 1)),
            SubscriptionState::Expired(date(2020, 1, 1))
        );
    }

    #[test]
    fn test_day_after_expiry_flips_to_expired() {
        let expiry = date(2024, 6, 15);
        let record = record(PaymentStatus::Paid, Some(expiry));
        assert_eq!(
            classify(Some(&record), date(2024, 6, 16)),
            SubscriptionState::Expired(expiry)
        );
        assert!(!classify(Some(&record), date(2024, 6, 16)).is_active());
    }
}
