//! Record store port.
//!
//! Defines the contract for the external member table: one row per member
//! identifier, all columns loosely-typed text on the wire. Implementations
//! translate rows into typed [`MemberRecord`]s at this boundary (see
//! [`crate::record`]) so the core never touches raw cells.

use async_trait::async_trait;

use crate::error::MembershipResult;
use crate::record::{MemberRecord, NewMemberRecord};

/// Opaque handle to one row in the backing table.
///
/// For the Sheets adapter this is the 1-based sheet row number. A handle is
/// only meaningful for the store that produced it and only until the next
/// write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRef(pub u32);

/// Port over the member record table.
///
/// Implementations must ensure:
/// - Lookups resolve duplicate identifiers as first match wins
/// - Rows without a usable (numeric) identifier are skipped, never errors
/// - No row-level locking is assumed by callers; see the idempotence
///   requirements on the gateway side
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Locates the row holding `member_id`.
    ///
    /// Returns `None` when no row carries that identifier.
    ///
    /// # Errors
    ///
    /// - `Store` when the table cannot be read
    async fn find_row(&self, member_id: i64) -> MembershipResult<Option<RowRef>>;

    /// Reads the record at a previously located row.
    ///
    /// # Errors
    ///
    /// - `Store` when the row cannot be read or has no usable identifier
    async fn read_row(&self, row: RowRef) -> MembershipResult<MemberRecord>;

    /// Appends a new row. Payment status is written as unpaid and the expiry
    /// cell is left empty; both are only ever set by an administrator editing
    /// the table directly.
    ///
    /// # Errors
    ///
    /// - `Store` on write failure
    async fn append_row(&self, record: &NewMemberRecord) -> MembershipResult<()>;

    /// Reads every member record in the table. Used by the expiry sweep.
    ///
    /// # Errors
    ///
    /// - `Store` when the table cannot be read
    async fn list_rows(&self) -> MembershipResult<Vec<MemberRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn test_record_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn RecordStore) {}
    }
}
