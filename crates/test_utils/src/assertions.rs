//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for ledger types that give
//! more meaningful error messages than standard assertions.

use core_kernel::Money;
use domain_ledger::LedgerEntry;
use serde_json::Value;

/// Asserts that a Money value is strictly positive
pub fn assert_money_positive(money: &Money) {
    assert!(
        money.is_positive(),
        "Expected positive money, got {}",
        money
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(money.is_zero(), "Expected zero money, got {}", money);
}

/// Asserts that a Money value is negative
pub fn assert_money_negative(money: &Money) {
    assert!(
        money.is_negative(),
        "Expected negative money, got {}",
        money
    );
}

/// Asserts that money values sum to a total
///
/// # Panics
///
/// Panics if the sum doesn't equal the total or the sum overflows
pub fn assert_money_sum_equals(parts: &[Money], total: &Money) {
    let sum = parts.iter().fold(Money::zero(), |acc, m| {
        acc.checked_add(m).expect("Overflow while summing parts")
    });

    assert_eq!(
        sum, *total,
        "Sum of parts ({}) doesn't equal total ({})",
        sum, total
    );
}

/// Asserts that a reversal mirror is the exact mirror of its original
///
/// Checks swapped legs, matching type, shared source reference, and that
/// both rows carry the reversal stamp.
pub fn assert_reversal_pair(original: &LedgerEntry, mirror: &LedgerEntry) {
    assert_eq!(
        mirror.debit, original.credit,
        "Mirror debit {} should equal original credit {}",
        mirror.debit, original.credit
    );
    assert_eq!(
        mirror.credit, original.debit,
        "Mirror credit {} should equal original debit {}",
        mirror.credit, original.debit
    );
    assert_eq!(
        mirror.entry_type, original.entry_type,
        "Mirror should keep the original's entry type"
    );
    assert_eq!(
        mirror.reference_id, original.reference_id,
        "Mirror should share the original's source reference"
    );
    assert_eq!(
        mirror.student_id, original.student_id,
        "Mirror should belong to the original's student"
    );
    assert!(original.is_reversed, "Original should be flagged reversed");
    assert!(mirror.is_reversed, "Mirror should be born reversed");
}

/// Asserts that entries are ordered date descending, then entry number
/// descending
pub fn assert_newest_first(entries: &[LedgerEntry]) {
    for window in entries.windows(2) {
        let (a, b) = (&window[0], &window[1]);
        let ordered = a.date > b.date || (a.date == b.date && a.entry_number > b.entry_number);
        assert!(
            ordered,
            "Entries out of order: #{} ({}) before #{} ({})",
            a.entry_number, a.date, b.entry_number, b.date
        );
    }
}

/// Asserts that entry numbers are strictly increasing
pub fn assert_strictly_increasing(numbers: &[u64]) {
    for window in numbers.windows(2) {
        assert!(
            window[0] < window[1],
            "Entry numbers not strictly increasing: {} then {}",
            window[0],
            window[1]
        );
    }
}

/// Asserts that a sorted entry-number set runs gap-free from `start`
pub fn assert_gap_free(numbers: &[u64], start: u64) {
    for (offset, number) in numbers.iter().enumerate() {
        let expected = start + offset as u64;
        assert_eq!(
            *number, expected,
            "Gap in entry numbers: expected {}, found {}",
            expected, number
        );
    }
}

/// Asserts that a serialized view exposes exactly the given keys
pub fn assert_wire_keys(value: &Value, keys: &[&str]) {
    let object = value.as_object().expect("Expected a JSON object");
    for key in keys {
        assert!(object.contains_key(*key), "Missing wire key: {}", key);
    }
    for present in object.keys() {
        assert!(
            keys.contains(&present.as_str()),
            "Unexpected wire key: {}",
            present
        );
    }
}

/// Asserts that a result is Ok and returns the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Asserts that a result is Err and returns the error
#[macro_export]
macro_rules! assert_err {
    ($result:expr) => {
        match $result {
            Ok(value) => panic!("Expected Err, got Ok: {:?}", value),
            Err(e) => e,
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(value) => panic!("{}: got Ok({:?})", $msg, value),
            Err(e) => e,
        }
    };
}

/// Asserts that an error matches a specific variant
#[macro_export]
macro_rules! assert_err_variant {
    ($result:expr, $pattern:pat) => {
        match $result {
            Ok(value) => panic!(
                "Expected Err matching {}, got Ok({:?})",
                stringify!($pattern),
                value
            ),
            Err(ref e) => {
                assert!(
                    matches!(e, $pattern),
                    "Error {:?} does not match pattern {}",
                    e,
                    stringify!($pattern)
                );
            }
        }
    };
}
