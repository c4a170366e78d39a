//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for the ledger test suite. These
//! fixtures are designed to be consistent and predictable for unit tests;
//! the amounts match the worked billing scenarios the suite asserts on.

use chrono::{DateTime, TimeZone, Utc};
use core_kernel::{DiscountId, InvoiceId, LedgerEntryId, Money, PaymentId, StudentId};
use domain_ledger::StudentRecord;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Monthly rent for a single room
    pub fn monthly_rent() -> Money {
        Money::new(dec!(8500.00))
    }

    /// Monthly rent for a shared room
    pub fn shared_room_rent() -> Money {
        Money::new(dec!(6200.00))
    }

    /// A partial payment against a rent invoice
    pub fn partial_payment() -> Money {
        Money::new(dec!(3000.00))
    }

    /// An early-payment discount
    pub fn early_payment_discount() -> Money {
        Money::new(dec!(600.00))
    }

    /// A damage charge suitable for debit adjustments
    pub fn damage_charge() -> Money {
        Money::new(dec!(250.00))
    }

    /// A zero amount
    pub fn zero() -> Money {
        Money::zero()
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Start of the academic term (Jul 1, 2026)
    pub fn term_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap()
    }

    /// When the August invoice was issued
    pub fn invoice_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap()
    }

    /// When the discount was granted
    pub fn discount_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 3, 12, 0, 0).unwrap()
    }

    /// When the payment was taken at the office
    pub fn payment_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 5, 10, 30, 0).unwrap()
    }

    /// A timestamp before the term, for date-window filters
    pub fn before_term() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// Creates a deterministic student ID for testing
    pub fn student_id() -> StudentId {
        StudentId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap())
    }

    /// A second deterministic student ID for multi-student tests
    pub fn second_student_id() -> StudentId {
        StudentId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440002").unwrap())
    }

    /// Creates a deterministic ledger entry ID for testing
    pub fn entry_id() -> LedgerEntryId {
        LedgerEntryId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440003").unwrap())
    }

    /// Creates a deterministic invoice ID for testing
    pub fn invoice_id() -> InvoiceId {
        InvoiceId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440004").unwrap())
    }

    /// Creates a deterministic payment ID for testing
    pub fn payment_id() -> PaymentId {
        PaymentId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440005").unwrap())
    }

    /// Creates a deterministic discount ID for testing
    pub fn discount_id() -> DiscountId {
        DiscountId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440006").unwrap())
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    /// Standard student display name
    pub fn student_name() -> &'static str {
        "Asha Verma"
    }

    /// Second student display name
    pub fn second_student_name() -> &'static str {
        "Ravi Kumar"
    }

    /// Standard billing month label
    pub fn month_label() -> &'static str {
        "August 2026"
    }

    /// Standard payment method
    pub fn payment_method() -> &'static str {
        "UPI"
    }

    /// Standard discount reason
    pub fn discount_reason() -> &'static str {
        "Early payment"
    }

    /// Standard adjustment description
    pub fn adjustment_description() -> &'static str {
        "Broken window pane"
    }

    /// Staff member who runs the front office
    pub fn warden() -> &'static str {
        "warden.rao"
    }

    /// Standard reversal reason
    pub fn reversal_reason() -> &'static str {
        "Cheque bounced"
    }
}

/// Fixture for student directory records
pub struct StudentFixtures;

impl StudentFixtures {
    /// The primary test student
    pub fn asha() -> StudentRecord {
        StudentRecord::new(IdFixtures::student_id(), StringFixtures::student_name())
    }

    /// A second student for multi-student tests
    pub fn ravi() -> StudentRecord {
        StudentRecord::new(
            IdFixtures::second_student_id(),
            StringFixtures::second_student_name(),
        )
    }

    /// Both test students
    pub fn all() -> Vec<StudentRecord> {
        vec![Self::asha(), Self::ravi()]
    }
}
