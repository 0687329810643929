//! Member records and their wire representation.
//!
//! The backing store keeps one row per member with five text columns:
//! identifier, username, full name, payment flag, expiry date. Everything
//! here translates that loose text into typed values exactly once, at the
//! adapter boundary; the rest of the crate only sees typed records.

use chrono::NaiveDate;

/// Wire format of expiry dates in the store.
pub const EXPIRY_FORMAT: &str = "%Y-%m-%d";

/// Whether an administrator has confirmed payment for a member.
///
/// Wire encoding in the store: the literal `yes` (case-insensitive) means
/// paid; any other cell content, including an empty cell, means unpaid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    /// Decodes the payment column of a row.
    pub fn from_cell(cell: &str) -> Self {
        if cell.trim().eq_ignore_ascii_case("yes") {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Unpaid
        }
    }

    /// Encodes the status for writing back to the store.
    pub fn as_cell(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "yes",
            PaymentStatus::Unpaid => "no",
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }
}

/// A member's row, fully typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    /// External account identifier. Unique key, immutable once created.
    pub member_id: i64,
    /// Transport handle captured at registration. Informational only.
    pub username: String,
    /// Display name supplied during registration.
    pub full_name: String,
    pub status: PaymentStatus,
    /// Valid-through date, set manually by an administrator alongside the
    /// paid flag. `None` when the cell is empty or does not parse.
    pub expiry: Option<NaiveDate>,
}

impl MemberRecord {
    /// Translates a raw store row into a typed record.
    ///
    /// Short rows behave as if padded with empty cells. Returns `None` when
    /// the identifier cell is empty or not numeric; callers skip such rows
    /// rather than treating them as errors.
    pub fn from_cells(cells: &[String]) -> Option<Self> {
        let cell = |idx: usize| cells.get(idx).map_or("", |s| s.trim());
        let member_id: i64 = cell(0).parse().ok()?;
        Some(Self {
            member_id,
            username: cell(1).to_string(),
            full_name: cell(2).to_string(),
            status: PaymentStatus::from_cell(cell(3)),
            expiry: parse_expiry(cell(4)),
        })
    }
}

/// A record about to be created by the registration flow.
///
/// Payment status and expiry are not part of the input: new rows are always
/// written unpaid with an empty expiry cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMemberRecord {
    pub member_id: i64,
    pub username: String,
    pub full_name: String,
}

impl NewMemberRecord {
    /// Row cells in store column order.
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.member_id.to_string(),
            self.username.clone(),
            self.full_name.clone(),
            PaymentStatus::Unpaid.as_cell().to_string(),
            String::new(),
        ]
    }
}

/// Parses an expiry cell. Anything that is not a `YYYY-MM-DD` calendar date
/// counts as absent, never as an error.
pub fn parse_expiry(cell: &str) -> Option<NaiveDate> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, EXPIRY_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_expiry_accepts_iso_dates() {
        assert_eq!(parse_expiry("2024-01-31"), Some(date(2024, 1, 31)));
    }

    #[test]
    fn test_parse_expiry_tolerates_surrounding_whitespace() {
        assert_eq!(parse_expiry("  2024-01-31 "), Some(date(2024, 1, 31)));
    }

    #[test]
    fn test_parse_expiry_treats_empty_as_absent() {
        assert_eq!(parse_expiry(""), None);
        assert_eq!(parse_expiry("   "), None);
    }

    #[test]
    fn test_parse_expiry_treats_garbage_as_absent() {
        assert_eq!(parse_expiry("soon"), None);
        assert_eq!(parse_expiry("31-01-2024"), None, "wrong field order");
        assert_eq!(parse_expiry("2024-13-40"), None, "impossible calendar date");
    }

    #[test]
    fn test_payment_status_decodes_yes_case_insensitively() {
        assert_eq!(PaymentStatus::from_cell("yes"), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::from_cell("YES"), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::from_cell(" Yes "), PaymentStatus::Paid);
    }

    #[test]
    fn test_payment_status_defaults_to_unpaid() {
        assert_eq!(PaymentStatus::from_cell("no"), PaymentStatus::Unpaid);
        assert_eq!(PaymentStatus::from_cell(""), PaymentStatus::Unpaid);
        assert_eq!(PaymentStatus::from_cell("paid"), PaymentStatus::Unpaid);
        assert!(!PaymentStatus::Unpaid.is_paid());
    }

    #[test]
    fn test_record_from_full_row() {
        let cells: Vec<String> = ["222", "u2", "Ion Pop", "yes", "2099-01-01"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let record = MemberRecord::from_cells(&cells).unwrap();
        assert_eq!(record.member_id, 222);
        assert_eq!(record.username, "u2");
        assert_eq!(record.full_name, "Ion Pop");
        assert_eq!(record.status, PaymentStatus::Paid);
        assert_eq!(record.expiry, Some(date(2099, 1, 1)));
    }

    #[test]
    fn test_record_from_short_row_pads_missing_cells() {
        let cells: Vec<String> = vec!["111".to_string(), "".to_string(), "Ana Pop".to_string()];
        let record = MemberRecord::from_cells(&cells).unwrap();
        assert_eq!(record.status, PaymentStatus::Unpaid);
        assert_eq!(record.expiry, None);
        assert_eq!(record.username, "");
    }

    #[test]
    fn test_record_without_numeric_id_is_skipped() {
        let header: Vec<String> = ["telegram_id", "username", "full_name", "paid", "expiry_date"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(MemberRecord::from_cells(&header), None);
        assert_eq!(MemberRecord::from_cells(&[String::new()]), None);
        assert_eq!(MemberRecord::from_cells(&[]), None);
    }

    #[test]
    fn test_record_id_cell_tolerates_whitespace() {
        let cells: Vec<String> = vec![" 333 ".to_string()];
        assert_eq!(MemberRecord::from_cells(&cells).unwrap().member_id, 333);
    }

    #[test]
    fn test_new_record_writes_unpaid_with_empty_expiry() {
        let record = NewMemberRecord {
            member_id: 111,
            username: String::new(),
            full_name: "Ana Pop".to_string(),
        };
        assert_eq!(record.to_cells(), vec!["111", "", "Ana Pop", "no", ""]);
    }
}
