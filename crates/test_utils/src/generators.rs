//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random ledger data that
//! maintains domain invariants, plus `fake`-backed helpers for realistic
//! display strings.

use chrono::{DateTime, Duration, TimeZone, Utc};
use core_kernel::{LedgerEntryId, Money, StudentId};
use domain_ledger::{AdjustmentDirection, EntryType};
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use fake::Fake;
use proptest::prelude::*;

/// Strategy for generating any entry type
pub fn entry_type_strategy() -> impl Strategy<Value = EntryType> {
    prop_oneof![
        Just(EntryType::Invoice),
        Just(EntryType::Payment),
        Just(EntryType::Discount),
        Just(EntryType::Adjustment),
        Just(EntryType::Refund),
        Just(EntryType::Penalty),
        Just(EntryType::CreditNote),
        Just(EntryType::DebitNote),
    ]
}

/// Strategy for generating an adjustment direction
pub fn adjustment_direction_strategy() -> impl Strategy<Value = AdjustmentDirection> {
    prop_oneof![
        Just(AdjustmentDirection::Debit),
        Just(AdjustmentDirection::Credit),
    ]
}

/// Strategy for generating positive amounts in paise
///
/// Bounded at ten lakh rupees so long generated sequences stay far from
/// decimal overflow.
pub fn positive_paise_strategy() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

/// Strategy for generating positive Money values
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    positive_paise_strategy().prop_map(Money::from_minor)
}

/// Strategy for generating a valid debit/credit pair
///
/// Exactly one leg carries the amount, matching how every factory-built
/// entry is shaped.
pub fn entry_legs_strategy() -> impl Strategy<Value = (Money, Money)> {
    (positive_money_strategy(), any::<bool>()).prop_map(|(amount, is_debit)| {
        if is_debit {
            (amount, Money::zero())
        } else {
            (Money::zero(), amount)
        }
    })
}

/// Strategy for generating StudentId values
pub fn student_id_strategy() -> impl Strategy<Value = StudentId> {
    any::<[u8; 16]>().prop_map(|bytes| StudentId::from_uuid(uuid::Uuid::from_bytes(bytes)))
}

/// Strategy for generating LedgerEntryId values
pub fn entry_id_strategy() -> impl Strategy<Value = LedgerEntryId> {
    any::<[u8; 16]>().prop_map(|bytes| LedgerEntryId::from_uuid(uuid::Uuid::from_bytes(bytes)))
}

/// Strategy for generating timestamps across the 2026 academic year
pub fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..365i64, 0i64..86_400i64).prop_map(|(days, seconds)| {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
            + Duration::days(days)
            + Duration::seconds(seconds)
    })
}

/// Strategy for generating billing month labels
pub fn month_label_strategy() -> impl Strategy<Value = String> {
    let month = prop_oneof![
        Just("January"),
        Just("February"),
        Just("March"),
        Just("April"),
        Just("May"),
        Just("June"),
        Just("July"),
        Just("August"),
        Just("September"),
        Just("October"),
        Just("November"),
        Just("December"),
    ];
    (month, 2025u32..2028u32).prop_map(|(m, y)| format!("{} {}", m, y))
}

/// Strategy for generating payment method labels
pub fn payment_method_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Cash".to_string()),
        Just("UPI".to_string()),
        Just("Card".to_string()),
        Just("Bank Transfer".to_string()),
        Just("Cheque".to_string()),
    ]
}

/// Strategy for generating discount reasons
pub fn discount_reason_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Early payment".to_string()),
        Just("Sibling concession".to_string()),
        Just("Merit scholarship".to_string()),
        Just("Festival waiver".to_string()),
    ]
}

/// Generates a realistic student display name
pub fn fake_student_name() -> String {
    Name().fake()
}

/// Generates a short free-text note
pub fn fake_note() -> String {
    Sentence(3..8).fake()
}
