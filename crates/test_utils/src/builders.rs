//! Test Data Builders
//!
//! Provides builder patterns for constructing ledger test data with
//! sensible defaults. These builders allow tests to specify only the
//! relevant fields while using fixture defaults for everything else.

use chrono::{DateTime, Utc};
use core_kernel::{Money, StudentId};
use domain_ledger::{
    AdjustmentDirection, AdjustmentEntryRequest, BalanceType, DiscountEntryRequest, EntryType,
    InvoiceEntryRequest, LedgerEntry, PaymentEntryRequest,
};
use uuid::Uuid;

use crate::fixtures::{IdFixtures, MoneyFixtures, StringFixtures, TemporalFixtures};

/// Builder for constructing ledger entries directly, bypassing the factory
///
/// Useful for seeding stores with historical state. Entries written through
/// the production write path should use the request builders instead.
pub struct LedgerEntryBuilder {
    student_id: StudentId,
    entry_number: u64,
    entry_type: EntryType,
    description: String,
    date: Option<DateTime<Utc>>,
    reference_id: Option<Uuid>,
    debit: Money,
    credit: Money,
    balance: Option<(Money, BalanceType)>,
    notes: Option<String>,
    created_by: String,
    reversal: Option<(String, DateTime<Utc>)>,
}

impl Default for LedgerEntryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerEntryBuilder {
    /// Creates a builder with invoice-shaped defaults
    pub fn new() -> Self {
        Self {
            student_id: IdFixtures::student_id(),
            entry_number: 1,
            entry_type: EntryType::Invoice,
            description: format!(
                "Invoice for {} – {}",
                StringFixtures::month_label(),
                StringFixtures::student_name()
            ),
            date: None,
            reference_id: None,
            debit: MoneyFixtures::monthly_rent(),
            credit: Money::zero(),
            balance: None,
            notes: None,
            created_by: "system".to_string(),
            reversal: None,
        }
    }

    /// Preset shaped like a recorded payment
    pub fn payment(amount: Money) -> Self {
        Self::new()
            .with_entry_type(EntryType::Payment)
            .with_description(format!(
                "Payment received – {} – {}",
                StringFixtures::payment_method(),
                StringFixtures::student_name()
            ))
            .credit_leg(amount)
            .with_date(TemporalFixtures::payment_date())
            .with_created_by(StringFixtures::warden())
    }

    /// Preset shaped like an applied discount
    pub fn discount(amount: Money) -> Self {
        Self::new()
            .with_entry_type(EntryType::Discount)
            .with_description(format!(
                "Discount applied – {} – {}",
                StringFixtures::discount_reason(),
                StringFixtures::student_name()
            ))
            .credit_leg(amount)
            .with_date(TemporalFixtures::discount_date())
            .with_created_by(StringFixtures::warden())
    }

    /// Sets the owning student
    pub fn with_student(mut self, student_id: StudentId) -> Self {
        self.student_id = student_id;
        self
    }

    /// Sets the entry number
    pub fn with_entry_number(mut self, entry_number: u64) -> Self {
        self.entry_number = entry_number;
        self
    }

    /// Sets the entry type
    pub fn with_entry_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = entry_type;
        self
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the effective date
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Sets the source reference
    pub fn with_reference(mut self, reference_id: Uuid) -> Self {
        self.reference_id = Some(reference_id);
        self
    }

    /// Puts the amount on the debit leg and zeroes the credit leg
    pub fn debit_leg(mut self, amount: Money) -> Self {
        self.debit = amount;
        self.credit = Money::zero();
        self
    }

    /// Puts the amount on the credit leg and zeroes the debit leg
    pub fn credit_leg(mut self, amount: Money) -> Self {
        self.credit = amount;
        self.debit = Money::zero();
        self
    }

    /// Sets the stored as-of-creation balance snapshot
    pub fn with_balance(mut self, balance: Money, balance_type: BalanceType) -> Self {
        self.balance = Some((balance, balance_type));
        self
    }

    /// Sets the notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Sets the creating actor
    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = created_by.into();
        self
    }

    /// Marks the entry as already reversed
    pub fn reversed(mut self, reversed_by: impl Into<String>, at: DateTime<Utc>) -> Self {
        self.reversal = Some((reversed_by.into(), at));
        self
    }

    /// Builds the ledger entry
    pub fn build(self) -> LedgerEntry {
        let mut entry = LedgerEntry::new(
            self.student_id,
            self.entry_number,
            self.entry_type,
            self.description,
            self.debit,
            self.credit,
            self.created_by,
        );

        if let Some(date) = self.date {
            entry = entry.with_date(date);
        }
        if let Some(reference_id) = self.reference_id {
            entry = entry.with_reference(reference_id);
        }
        if let Some((balance, balance_type)) = self.balance {
            entry = entry.with_balance(balance, balance_type);
        }
        if let Some(notes) = self.notes {
            entry = entry.with_notes(notes);
        }
        if let Some((reversed_by, at)) = self.reversal {
            entry = entry.with_reversal_stamp(reversed_by, at);
        }

        entry
    }
}

/// Builder for invoice entry requests
pub struct InvoiceRequestBuilder {
    request: InvoiceEntryRequest,
}

impl Default for InvoiceRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceRequestBuilder {
    /// Creates a builder with fixture defaults
    pub fn new() -> Self {
        Self {
            request: InvoiceEntryRequest {
                id: IdFixtures::invoice_id(),
                student_id: IdFixtures::student_id(),
                total: MoneyFixtures::monthly_rent(),
                month: StringFixtures::month_label().to_string(),
                student_name: StringFixtures::student_name().to_string(),
            },
        }
    }

    /// Sets the invoice id
    pub fn with_id(mut self, id: core_kernel::InvoiceId) -> Self {
        self.request.id = id;
        self
    }

    /// Sets the billed student
    pub fn with_student(mut self, student_id: StudentId) -> Self {
        self.request.student_id = student_id;
        self
    }

    /// Sets the invoice total
    pub fn with_total(mut self, total: Money) -> Self {
        self.request.total = total;
        self
    }

    /// Sets the billing month label
    pub fn with_month(mut self, month: impl Into<String>) -> Self {
        self.request.month = month.into();
        self
    }

    /// Sets the student display name
    pub fn with_student_name(mut self, name: impl Into<String>) -> Self {
        self.request.student_name = name.into();
        self
    }

    /// Builds the request
    pub fn build(self) -> InvoiceEntryRequest {
        self.request
    }
}

/// Builder for payment entry requests
pub struct PaymentRequestBuilder {
    request: PaymentEntryRequest,
}

impl Default for PaymentRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentRequestBuilder {
    /// Creates a builder with fixture defaults
    pub fn new() -> Self {
        Self {
            request: PaymentEntryRequest {
                id: IdFixtures::payment_id(),
                student_id: IdFixtures::student_id(),
                amount: MoneyFixtures::partial_payment(),
                payment_date: TemporalFixtures::payment_date(),
                payment_method: StringFixtures::payment_method().to_string(),
                student_name: StringFixtures::student_name().to_string(),
                processed_by: StringFixtures::warden().to_string(),
            },
        }
    }

    /// Sets the payment id
    pub fn with_id(mut self, id: core_kernel::PaymentId) -> Self {
        self.request.id = id;
        self
    }

    /// Sets the paying student
    pub fn with_student(mut self, student_id: StudentId) -> Self {
        self.request.student_id = student_id;
        self
    }

    /// Sets the amount received
    pub fn with_amount(mut self, amount: Money) -> Self {
        self.request.amount = amount;
        self
    }

    /// Sets when the payment was taken
    pub fn with_payment_date(mut self, date: DateTime<Utc>) -> Self {
        self.request.payment_date = date;
        self
    }

    /// Sets the payment method label
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.request.payment_method = method.into();
        self
    }

    /// Sets the student display name
    pub fn with_student_name(mut self, name: impl Into<String>) -> Self {
        self.request.student_name = name.into();
        self
    }

    /// Sets the processing staff member
    pub fn with_processed_by(mut self, actor: impl Into<String>) -> Self {
        self.request.processed_by = actor.into();
        self
    }

    /// Builds the request
    pub fn build(self) -> PaymentEntryRequest {
        self.request
    }
}

/// Builder for discount entry requests
pub struct DiscountRequestBuilder {
    request: DiscountEntryRequest,
}

impl Default for DiscountRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscountRequestBuilder {
    /// Creates a builder with fixture defaults
    pub fn new() -> Self {
        Self {
            request: DiscountEntryRequest {
                id: IdFixtures::discount_id(),
                student_id: IdFixtures::student_id(),
                amount: MoneyFixtures::early_payment_discount(),
                date: TemporalFixtures::discount_date(),
                reason: StringFixtures::discount_reason().to_string(),
                student_name: StringFixtures::student_name().to_string(),
                applied_by: StringFixtures::warden().to_string(),
            },
        }
    }

    /// Sets the discount id
    pub fn with_id(mut self, id: core_kernel::DiscountId) -> Self {
        self.request.id = id;
        self
    }

    /// Sets the benefiting student
    pub fn with_student(mut self, student_id: StudentId) -> Self {
        self.request.student_id = student_id;
        self
    }

    /// Sets the discount amount
    pub fn with_amount(mut self, amount: Money) -> Self {
        self.request.amount = amount;
        self
    }

    /// Sets when the discount was granted
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.request.date = date;
        self
    }

    /// Sets the discount reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.request.reason = reason.into();
        self
    }

    /// Builds the request
    pub fn build(self) -> DiscountEntryRequest {
        self.request
    }
}

/// Builder for adjustment entry requests
pub struct AdjustmentRequestBuilder {
    request: AdjustmentEntryRequest,
}

impl Default for AdjustmentRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AdjustmentRequestBuilder {
    /// Creates a builder with debit-adjustment defaults
    pub fn new() -> Self {
        Self {
            request: AdjustmentEntryRequest {
                student_id: IdFixtures::student_id(),
                amount: MoneyFixtures::damage_charge(),
                description: StringFixtures::adjustment_description().to_string(),
                direction: AdjustmentDirection::Debit,
                created_by: StringFixtures::warden().to_string(),
            },
        }
    }

    /// Preset for a credit adjustment
    pub fn credit() -> Self {
        Self::new().with_direction(AdjustmentDirection::Credit)
    }

    /// Sets the adjusted student
    pub fn with_student(mut self, student_id: StudentId) -> Self {
        self.request.student_id = student_id;
        self
    }

    /// Sets the amount
    pub fn with_amount(mut self, amount: Money) -> Self {
        self.request.amount = amount;
        self
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.request.description = description.into();
        self
    }

    /// Sets the direction
    pub fn with_direction(mut self, direction: AdjustmentDirection) -> Self {
        self.request.direction = direction;
        self
    }

    /// Sets the acting staff member
    pub fn with_created_by(mut self, actor: impl Into<String>) -> Self {
        self.request.created_by = actor.into();
        self
    }

    /// Builds the request
    pub fn build(self) -> AdjustmentEntryRequest {
        self.request
    }
}
