//! Ledger entry model
//!
//! This module defines the immutable ledger entry, the entry type taxonomy,
//! and the balance type tag derived from a student's signed net balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use core_kernel::{LedgerEntryId, Money, StudentId};

/// Error returned when parsing a stored tag back into its enum
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {kind}: {value}")]
pub struct ParseTagError {
    kind: &'static str,
    value: String,
}

impl ParseTagError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// The kind of financial event a ledger entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Monthly or ad-hoc invoice raised against the student
    Invoice,
    /// Payment received from the student
    Payment,
    /// Discount applied to the student's account
    Discount,
    /// Manual debit or credit adjustment
    Adjustment,
    /// Refund issued to the student
    Refund,
    /// Penalty charged to the student
    Penalty,
    /// Credit note reducing the amount owed
    CreditNote,
    /// Debit note increasing the amount owed
    DebitNote,
}

impl EntryType {
    /// Returns the canonical string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Invoice => "Invoice",
            EntryType::Payment => "Payment",
            EntryType::Discount => "Discount",
            EntryType::Adjustment => "Adjustment",
            EntryType::Refund => "Refund",
            EntryType::Penalty => "Penalty",
            EntryType::CreditNote => "CreditNote",
            EntryType::DebitNote => "DebitNote",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Invoice" => Ok(EntryType::Invoice),
            "Payment" => Ok(EntryType::Payment),
            "Discount" => Ok(EntryType::Discount),
            "Adjustment" => Ok(EntryType::Adjustment),
            "Refund" => Ok(EntryType::Refund),
            "Penalty" => Ok(EntryType::Penalty),
            "CreditNote" => Ok(EntryType::CreditNote),
            "DebitNote" => Ok(EntryType::DebitNote),
            other => Err(ParseTagError::new("entry type", other)),
        }
    }
}

/// Tag indicating the sign of a net balance
///
/// A student's net balance is the signed sum debit − credit over their
/// non-reversed entries. The tag is a pure function of that sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalanceType {
    /// Net balance is positive; the student owes the hostel
    Dr,
    /// Net balance is negative; the hostel owes the student
    Cr,
    /// Net balance is exactly zero
    Nil,
}

impl BalanceType {
    /// Derives the tag from a signed net balance
    pub fn from_net(net: Money) -> Self {
        if net.is_positive() {
            BalanceType::Dr
        } else if net.is_negative() {
            BalanceType::Cr
        } else {
            BalanceType::Nil
        }
    }

    /// Returns the canonical string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceType::Dr => "Dr",
            BalanceType::Cr => "Cr",
            BalanceType::Nil => "Nil",
        }
    }
}

impl fmt::Display for BalanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BalanceType {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Dr" => Ok(BalanceType::Dr),
            "Cr" => Ok(BalanceType::Cr),
            "Nil" => Ok(BalanceType::Nil),
            other => Err(ParseTagError::new("balance type", other)),
        }
    }
}

/// Direction of a manual adjustment entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentDirection {
    /// Increases the amount the student owes
    Debit,
    /// Decreases the amount the student owes
    Credit,
}

impl AdjustmentDirection {
    /// Returns the lowercase form used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentDirection::Debit => "debit",
            AdjustmentDirection::Credit => "credit",
        }
    }

    /// Returns the uppercase form used in adjustment descriptions
    pub fn upper(&self) -> &'static str {
        match self {
            AdjustmentDirection::Debit => "DEBIT",
            AdjustmentDirection::Credit => "CREDIT",
        }
    }
}

/// One immutable record of a financial event affecting a student's balance
///
/// Entries are append-only: the only permitted mutation after creation is the
/// `Active → Reversed` transition, which sets the three reversal fields
/// exactly once and never unsets them. Reversal mirror entries are created
/// already carrying the reversal stamp, so a reversed pair drops out of
/// balance and statistics sums exactly once while remaining a permanent,
/// queryable audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier
    pub id: LedgerEntryId,
    /// Owning student (foreign reference, not owned by the ledger)
    pub student_id: StudentId,
    /// Ledger-wide strictly increasing sequence value
    pub entry_number: u64,
    /// Effective date of the transaction
    pub date: DateTime<Utc>,
    /// The kind of financial event recorded
    pub entry_type: EntryType,
    /// Human-readable description including student name and context
    pub description: String,
    /// Pointer to the source invoice/payment/discount (absent for adjustments)
    pub reference_id: Option<Uuid>,
    /// Debit amount (non-negative)
    pub debit: Money,
    /// Credit amount (non-negative)
    pub credit: Money,
    /// Absolute running balance for the student as of this entry's creation
    pub balance: Money,
    /// Sign tag for the running balance
    pub balance_type: BalanceType,
    /// Whether this entry has been excluded from balance sums
    pub is_reversed: bool,
    /// Actor who reversed the entry
    pub reversed_by: Option<String>,
    /// When the entry was reversed
    pub reversal_date: Option<DateTime<Utc>>,
    /// Free-form audit notes
    pub notes: Option<String>,
    /// Actor who created the entry
    pub created_by: String,
    /// When the entry was created
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Creates a new active entry with the given legs
    ///
    /// The effective date defaults to now and the running balance to zero;
    /// use the builder methods to set them before persisting.
    pub fn new(
        student_id: StudentId,
        entry_number: u64,
        entry_type: EntryType,
        description: impl Into<String>,
        debit: Money,
        credit: Money,
        created_by: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: LedgerEntryId::new_v7(),
            student_id,
            entry_number,
            date: now,
            entry_type,
            description: description.into(),
            reference_id: None,
            debit,
            credit,
            balance: Money::zero(),
            balance_type: BalanceType::Nil,
            is_reversed: false,
            reversed_by: None,
            reversal_date: None,
            notes: None,
            created_by: created_by.into(),
            created_at: now,
        }
    }

    /// Sets the effective transaction date
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    /// Links the entry to its source record
    pub fn with_reference(mut self, reference_id: Uuid) -> Self {
        self.reference_id = Some(reference_id);
        self
    }

    /// Sets the running balance recorded on the entry
    pub fn with_balance(mut self, balance: Money, balance_type: BalanceType) -> Self {
        self.balance = balance;
        self.balance_type = balance_type;
        self
    }

    /// Attaches audit notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Stamps the entry as reversed at creation time
    ///
    /// Used for reversal mirror entries, which are born excluded from
    /// balance sums and can never themselves be reversed.
    pub fn with_reversal_stamp(mut self, reversed_by: impl Into<String>, at: DateTime<Utc>) -> Self {
        self.is_reversed = true;
        self.reversed_by = Some(reversed_by.into());
        self.reversal_date = Some(at);
        self
    }

    /// Applies the `Active → Reversed` transition
    pub fn mark_reversed(&mut self, reversed_by: impl Into<String>, at: DateTime<Utc>) {
        self.is_reversed = true;
        self.reversed_by = Some(reversed_by.into());
        self.reversal_date = Some(at);
    }

    /// Returns true if the entry still participates in balance sums
    pub fn is_active(&self) -> bool {
        !self.is_reversed
    }

    /// Returns the signed effect of this entry on the student's net balance
    pub fn signed_delta(&self) -> Money {
        self.debit - self.credit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balance_type_from_net() {
        assert_eq!(BalanceType::from_net(Money::from_major(8500)), BalanceType::Dr);
        assert_eq!(BalanceType::from_net(-Money::from_major(600)), BalanceType::Cr);
        assert_eq!(BalanceType::from_net(Money::zero()), BalanceType::Nil);
    }

    #[test]
    fn test_entry_type_round_trips_through_str() {
        let types = vec![
            EntryType::Invoice,
            EntryType::Payment,
            EntryType::Discount,
            EntryType::Adjustment,
            EntryType::Refund,
            EntryType::Penalty,
            EntryType::CreditNote,
            EntryType::DebitNote,
        ];

        for entry_type in types {
            let parsed: EntryType = entry_type.as_str().parse().unwrap();
            assert_eq!(parsed, entry_type);
        }
    }

    #[test]
    fn test_entry_type_rejects_unknown_tag() {
        let result = "Fee".parse::<EntryType>();
        assert!(result.is_err());
    }

    #[test]
    fn test_balance_type_round_trips_through_str() {
        for balance_type in [BalanceType::Dr, BalanceType::Cr, BalanceType::Nil] {
            let parsed: BalanceType = balance_type.as_str().parse().unwrap();
            assert_eq!(parsed, balance_type);
        }
    }

    #[test]
    fn test_adjustment_direction_forms() {
        assert_eq!(AdjustmentDirection::Debit.as_str(), "debit");
        assert_eq!(AdjustmentDirection::Credit.as_str(), "credit");
        assert_eq!(AdjustmentDirection::Debit.upper(), "DEBIT");
        assert_eq!(AdjustmentDirection::Credit.upper(), "CREDIT");
    }

    #[test]
    fn test_adjustment_direction_serializes_lowercase() {
        let json = serde_json::to_string(&AdjustmentDirection::Debit).unwrap();
        assert_eq!(json, "\"debit\"");
    }

    #[test]
    fn test_entry_new_defaults() {
        let entry = LedgerEntry::new(
            StudentId::new_v7(),
            1,
            EntryType::Invoice,
            "Invoice for January 2024 – Asha Verma",
            Money::from_major(8500),
            Money::zero(),
            "system",
        );

        assert_eq!(entry.entry_number, 1);
        assert!(entry.is_active());
        assert!(entry.reference_id.is_none());
        assert!(entry.reversed_by.is_none());
        assert!(entry.reversal_date.is_none());
        assert!(entry.notes.is_none());
        assert_eq!(entry.balance, Money::zero());
        assert_eq!(entry.balance_type, BalanceType::Nil);
    }

    #[test]
    fn test_entry_builders() {
        let reference = Uuid::new_v4();
        let date = Utc::now();
        let entry = LedgerEntry::new(
            StudentId::new_v7(),
            7,
            EntryType::Payment,
            "Payment received – UPI – Asha Verma",
            Money::zero(),
            Money::from_major(3000),
            "warden.rao",
        )
        .with_date(date)
        .with_reference(reference)
        .with_balance(Money::from_major(3200), BalanceType::Dr)
        .with_notes("partial payment");

        assert_eq!(entry.date, date);
        assert_eq!(entry.reference_id, Some(reference));
        assert_eq!(entry.balance, Money::from_major(3200));
        assert_eq!(entry.balance_type, BalanceType::Dr);
        assert_eq!(entry.notes, Some("partial payment".to_string()));
    }

    #[test]
    fn test_signed_delta() {
        let debit_entry = LedgerEntry::new(
            StudentId::new_v7(),
            1,
            EntryType::Invoice,
            "test",
            Money::new(dec!(6200)),
            Money::zero(),
            "system",
        );
        let credit_entry = LedgerEntry::new(
            StudentId::new_v7(),
            2,
            EntryType::Payment,
            "test",
            Money::zero(),
            Money::new(dec!(3000)),
            "system",
        );

        assert_eq!(debit_entry.signed_delta(), Money::new(dec!(6200)));
        assert_eq!(credit_entry.signed_delta(), -Money::new(dec!(3000)));
    }

    #[test]
    fn test_mark_reversed_sets_all_three_fields() {
        let mut entry = LedgerEntry::new(
            StudentId::new_v7(),
            1,
            EntryType::Payment,
            "test",
            Money::zero(),
            Money::from_major(8500),
            "system",
        );
        let at = Utc::now();

        entry.mark_reversed("warden.rao", at);

        assert!(entry.is_reversed);
        assert!(!entry.is_active());
        assert_eq!(entry.reversed_by, Some("warden.rao".to_string()));
        assert_eq!(entry.reversal_date, Some(at));
    }

    #[test]
    fn test_reversal_stamp_at_creation() {
        let at = Utc::now();
        let entry = LedgerEntry::new(
            StudentId::new_v7(),
            9,
            EntryType::Payment,
            "REVERSAL: Payment received – UPI – Asha Verma",
            Money::from_major(8500),
            Money::zero(),
            "warden.rao",
        )
        .with_reversal_stamp("warden.rao", at);

        assert!(entry.is_reversed);
        assert_eq!(entry.reversed_by, Some("warden.rao".to_string()));
        assert_eq!(entry.reversal_date, Some(at));
    }
}
