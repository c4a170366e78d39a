//! Typed entry creation
//!
//! `EntryFactory` is the single write path onto the ledger. Each of the four
//! creation flows validates its request, confirms the student against the
//! directory, rejects duplicate source references, and then runs the
//! balance-read → sequence-allocation → insert critical section under the
//! student's lock so the stored as-of-creation balance is computed against a
//! stable prior state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use core_kernel::{
    DiscountId, InvoiceId, Money, OperationMetadata, PaymentId, StudentId,
};

use crate::balance::BalanceCalculator;
use crate::entry::{AdjustmentDirection, EntryType, LedgerEntry};
use crate::error::LedgerError;
use crate::locks::StudentLocks;
use crate::ports::{LedgerStorePort, StudentDirectoryExt, StudentDirectoryPort};
use crate::sequence::SequenceGenerator;

/// Actor recorded on entries created without a caller-supplied actor
pub const SYSTEM_ACTOR: &str = "system";

/// Request to record an issued invoice on the ledger
#[derive(Debug, Clone)]
pub struct InvoiceEntryRequest {
    /// The invoice being recorded
    pub id: InvoiceId,
    /// The billed student
    pub student_id: StudentId,
    /// Invoice total, becomes the debit leg
    pub total: Money,
    /// Billing month label, e.g. "August 2026"
    pub month: String,
    /// Student display name for the description
    pub student_name: String,
}

/// Request to record a received payment on the ledger
#[derive(Debug, Clone)]
pub struct PaymentEntryRequest {
    /// The payment being recorded
    pub id: PaymentId,
    /// The paying student
    pub student_id: StudentId,
    /// Amount received, becomes the credit leg
    pub amount: Money,
    /// When the payment was taken; becomes the entry date
    pub payment_date: DateTime<Utc>,
    /// Payment method label, e.g. "UPI", "Cash"
    pub payment_method: String,
    /// Student display name for the description
    pub student_name: String,
    /// Staff member who processed the payment
    pub processed_by: String,
}

/// Request to record an applied discount on the ledger
#[derive(Debug, Clone)]
pub struct DiscountEntryRequest {
    /// The discount being recorded
    pub id: DiscountId,
    /// The benefiting student
    pub student_id: StudentId,
    /// Discount amount, becomes the credit leg
    pub amount: Money,
    /// When the discount was granted; becomes the entry date
    pub date: DateTime<Utc>,
    /// Why the discount was granted
    pub reason: String,
    /// Student display name for the description
    pub student_name: String,
    /// Staff member who applied the discount
    pub applied_by: String,
}

/// Request to record a manual adjustment on the ledger
///
/// Adjustments carry no source document, so they have no reference id and
/// the student name is resolved from the directory rather than supplied.
#[derive(Debug, Clone)]
pub struct AdjustmentEntryRequest {
    /// The adjusted student
    pub student_id: StudentId,
    /// Adjustment amount; the direction picks the leg it lands on
    pub amount: Money,
    /// What is being corrected
    pub description: String,
    /// Whether the amount debits or credits the student
    pub direction: AdjustmentDirection,
    /// Staff member making the adjustment
    pub created_by: String,
}

/// Internal description of an entry about to be appended
///
/// Built by the four creation flows and by the reversal processor for
/// mirror entries, then handed to [`EntryFactory::append`].
#[derive(Debug, Clone)]
pub(crate) struct EntryDraft {
    pub student_id: StudentId,
    pub entry_type: EntryType,
    pub description: String,
    /// `None` means entry-creation time
    pub date: Option<DateTime<Utc>>,
    pub reference_id: Option<Uuid>,
    pub debit: Money,
    pub credit: Money,
    pub notes: Option<String>,
    pub created_by: String,
    /// Present on reversal mirrors, which are born already reversed
    pub reversal_stamp: Option<(String, DateTime<Utc>)>,
}

/// Builds and persists ledger entries
pub struct EntryFactory {
    store: Arc<dyn LedgerStorePort>,
    directory: Arc<dyn StudentDirectoryPort>,
    calculator: BalanceCalculator,
    sequence: Arc<SequenceGenerator>,
    locks: Arc<StudentLocks>,
}

impl EntryFactory {
    /// Creates a factory over the given store and directory
    pub fn new(
        store: Arc<dyn LedgerStorePort>,
        directory: Arc<dyn StudentDirectoryPort>,
        sequence: Arc<SequenceGenerator>,
        locks: Arc<StudentLocks>,
    ) -> Self {
        let calculator = BalanceCalculator::new(store.clone());
        Self {
            store,
            directory,
            calculator,
            sequence,
            locks,
        }
    }

    /// Records an issued invoice as a debit entry
    #[instrument(skip(self, request, metadata), fields(student_id = %request.student_id))]
    pub async fn create_invoice_entry(
        &self,
        request: InvoiceEntryRequest,
        metadata: Option<OperationMetadata>,
    ) -> Result<LedgerEntry, LedgerError> {
        require_positive("invoice total", request.total)?;
        require_text("month", &request.month)?;
        require_text("student name", &request.student_name)?;
        self.require_student(request.student_id).await?;

        let _guard = self.locks.acquire(request.student_id).await;
        self.require_fresh_reference(request.id.into(), EntryType::Invoice, &metadata)
            .await?;

        self.append(
            EntryDraft {
                student_id: request.student_id,
                entry_type: EntryType::Invoice,
                description: format!(
                    "Invoice for {} – {}",
                    request.month, request.student_name
                ),
                date: None,
                reference_id: Some(request.id.into()),
                debit: request.total,
                credit: Money::zero(),
                notes: None,
                created_by: SYSTEM_ACTOR.to_string(),
                reversal_stamp: None,
            },
            metadata,
        )
        .await
    }

    /// Records a received payment as a credit entry
    #[instrument(skip(self, request, metadata), fields(student_id = %request.student_id))]
    pub async fn create_payment_entry(
        &self,
        request: PaymentEntryRequest,
        metadata: Option<OperationMetadata>,
    ) -> Result<LedgerEntry, LedgerError> {
        require_positive("payment amount", request.amount)?;
        require_text("payment method", &request.payment_method)?;
        require_text("student name", &request.student_name)?;
        require_text("processed by", &request.processed_by)?;
        self.require_student(request.student_id).await?;

        let _guard = self.locks.acquire(request.student_id).await;
        self.require_fresh_reference(request.id.into(), EntryType::Payment, &metadata)
            .await?;

        self.append(
            EntryDraft {
                student_id: request.student_id,
                entry_type: EntryType::Payment,
                description: format!(
                    "Payment received – {} – {}",
                    request.payment_method, request.student_name
                ),
                date: Some(request.payment_date),
                reference_id: Some(request.id.into()),
                debit: Money::zero(),
                credit: request.amount,
                notes: None,
                created_by: request.processed_by,
                reversal_stamp: None,
            },
            metadata,
        )
        .await
    }

    /// Records an applied discount as a credit entry
    #[instrument(skip(self, request, metadata), fields(student_id = %request.student_id))]
    pub async fn create_discount_entry(
        &self,
        request: DiscountEntryRequest,
        metadata: Option<OperationMetadata>,
    ) -> Result<LedgerEntry, LedgerError> {
        require_positive("discount amount", request.amount)?;
        require_text("reason", &request.reason)?;
        require_text("student name", &request.student_name)?;
        require_text("applied by", &request.applied_by)?;
        self.require_student(request.student_id).await?;

        let _guard = self.locks.acquire(request.student_id).await;
        self.require_fresh_reference(request.id.into(), EntryType::Discount, &metadata)
            .await?;

        self.append(
            EntryDraft {
                student_id: request.student_id,
                entry_type: EntryType::Discount,
                description: format!(
                    "Discount applied – {} – {}",
                    request.reason, request.student_name
                ),
                date: Some(request.date),
                reference_id: Some(request.id.into()),
                debit: Money::zero(),
                credit: request.amount,
                notes: None,
                created_by: request.applied_by,
                reversal_stamp: None,
            },
            metadata,
        )
        .await
    }

    /// Records a manual adjustment on the leg its direction selects
    #[instrument(skip(self, request, metadata), fields(student_id = %request.student_id))]
    pub async fn create_adjustment_entry(
        &self,
        request: AdjustmentEntryRequest,
        metadata: Option<OperationMetadata>,
    ) -> Result<LedgerEntry, LedgerError> {
        require_positive("adjustment amount", request.amount)?;
        require_text("description", &request.description)?;
        require_text("created by", &request.created_by)?;

        let student = self
            .directory
            .student(request.student_id)
            .await?
            .ok_or_else(|| LedgerError::student_not_found(request.student_id))?;

        let (debit, credit) = match request.direction {
            AdjustmentDirection::Debit => (request.amount, Money::zero()),
            AdjustmentDirection::Credit => (Money::zero(), request.amount),
        };

        let _guard = self.locks.acquire(request.student_id).await;

        self.append(
            EntryDraft {
                student_id: request.student_id,
                entry_type: EntryType::Adjustment,
                description: format!(
                    "{} Adjustment – {} – {}",
                    request.direction.upper(),
                    request.description,
                    student.name
                ),
                date: None,
                reference_id: None,
                debit,
                credit,
                notes: None,
                created_by: request.created_by,
                reversal_stamp: None,
            },
            metadata,
        )
        .await
    }

    /// Builds the final entry from a draft and persists it
    ///
    /// The caller must hold the student's lock. Reads the prior balance,
    /// allocates the entry number, stamps the as-of-creation balance, and
    /// inserts. Drafts carrying a reversal stamp are born excluded from the
    /// sums, so the prior balance is stored unchanged.
    pub(crate) async fn append(
        &self,
        draft: EntryDraft,
        metadata: Option<OperationMetadata>,
    ) -> Result<LedgerEntry, LedgerError> {
        let prior = self
            .calculator
            .student_balance(draft.student_id, metadata.clone())
            .await?;

        let (balance, balance_type) = if draft.reversal_stamp.is_some() {
            (prior.absolute(), prior.balance_type)
        } else {
            let after = prior.after(draft.debit, draft.credit)?;
            (after.absolute(), after.balance_type)
        };

        let entry_number = self.sequence.next();

        let mut entry = LedgerEntry::new(
            draft.student_id,
            entry_number,
            draft.entry_type,
            draft.description,
            draft.debit,
            draft.credit,
            draft.created_by,
        )
        .with_balance(balance, balance_type);

        if let Some(date) = draft.date {
            entry = entry.with_date(date);
        }
        if let Some(reference_id) = draft.reference_id {
            entry = entry.with_reference(reference_id);
        }
        if let Some(notes) = draft.notes {
            entry = entry.with_notes(notes);
        }
        if let Some((reversed_by, reversal_date)) = draft.reversal_stamp {
            entry = entry.with_reversal_stamp(reversed_by, reversal_date);
        }

        let stored = self.store.insert(entry, metadata).await?;
        info!(
            entry_number = stored.entry_number,
            entry_type = %stored.entry_type,
            "ledger entry recorded"
        );
        Ok(stored)
    }

    async fn require_student(&self, student_id: StudentId) -> Result<(), LedgerError> {
        if self.directory.student_exists(student_id).await? {
            Ok(())
        } else {
            Err(LedgerError::student_not_found(student_id))
        }
    }

    async fn require_fresh_reference(
        &self,
        reference_id: Uuid,
        entry_type: EntryType,
        metadata: &Option<OperationMetadata>,
    ) -> Result<(), LedgerError> {
        if self
            .store
            .reference_exists(reference_id, entry_type, metadata.clone())
            .await?
        {
            return Err(LedgerError::DuplicateReference {
                reference_id,
                entry_type,
            });
        }
        Ok(())
    }
}

pub(crate) fn require_positive(field: &str, amount: Money) -> Result<(), LedgerError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(LedgerError::validation(format!(
            "{field} must be a positive amount"
        )))
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), LedgerError> {
    if value.trim().is_empty() {
        Err(LedgerError::validation(format!("{field} must not be blank")))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::BalanceType;
    use crate::ports::mock::{MockLedgerStore, MockStudentDirectory};
    use crate::ports::StudentRecord;
    use rust_decimal_macros::dec;

    struct Harness {
        store: Arc<MockLedgerStore>,
        factory: EntryFactory,
        student: StudentId,
    }

    async fn harness() -> Harness {
        let store = Arc::new(MockLedgerStore::new());
        let student = StudentId::new_v7();
        let directory = Arc::new(
            MockStudentDirectory::with_students(vec![StudentRecord::new(student, "Asha Verma")])
                .await,
        );
        let factory = EntryFactory::new(
            store.clone(),
            directory,
            Arc::new(SequenceGenerator::new()),
            Arc::new(StudentLocks::new()),
        );
        Harness {
            store,
            factory,
            student,
        }
    }

    fn invoice_request(student: StudentId, total: Money) -> InvoiceEntryRequest {
        InvoiceEntryRequest {
            id: InvoiceId::new_v7(),
            student_id: student,
            total,
            month: "August 2026".to_string(),
            student_name: "Asha Verma".to_string(),
        }
    }

    fn payment_request(student: StudentId, amount: Money) -> PaymentEntryRequest {
        PaymentEntryRequest {
            id: PaymentId::new_v7(),
            student_id: student,
            amount,
            payment_date: Utc::now(),
            payment_method: "UPI".to_string(),
            student_name: "Asha Verma".to_string(),
            processed_by: "warden.rao".to_string(),
        }
    }

    fn discount_request(student: StudentId, amount: Money) -> DiscountEntryRequest {
        DiscountEntryRequest {
            id: DiscountId::new_v7(),
            student_id: student,
            amount,
            date: Utc::now(),
            reason: "Early payment".to_string(),
            student_name: "Asha Verma".to_string(),
            applied_by: "warden.rao".to_string(),
        }
    }

    #[tokio::test]
    async fn test_invoice_entry_debits_and_stamps_balance() {
        let h = harness().await;

        let entry = h
            .factory
            .create_invoice_entry(invoice_request(h.student, Money::from_major(8500)), None)
            .await
            .unwrap();

        assert_eq!(entry.entry_type, EntryType::Invoice);
        assert_eq!(entry.description, "Invoice for August 2026 – Asha Verma");
        assert_eq!(entry.debit, Money::from_major(8500));
        assert_eq!(entry.credit, Money::zero());
        assert_eq!(entry.balance, Money::from_major(8500));
        assert_eq!(entry.balance_type, BalanceType::Dr);
        assert_eq!(entry.entry_number, 1);
        assert_eq!(entry.created_by, SYSTEM_ACTOR);
        assert!(entry.reference_id.is_some());
        assert!(!entry.is_reversed);
    }

    #[tokio::test]
    async fn test_payment_entry_credits_with_source_date() {
        let h = harness().await;
        let request = payment_request(h.student, Money::from_major(3000));
        let payment_date = request.payment_date;

        let entry = h
            .factory
            .create_payment_entry(request, None)
            .await
            .unwrap();

        assert_eq!(entry.entry_type, EntryType::Payment);
        assert_eq!(entry.description, "Payment received – UPI – Asha Verma");
        assert_eq!(entry.debit, Money::zero());
        assert_eq!(entry.credit, Money::from_major(3000));
        assert_eq!(entry.date, payment_date);
        assert_eq!(entry.created_by, "warden.rao");
    }

    #[tokio::test]
    async fn test_discount_entry_credits_with_source_date() {
        let h = harness().await;
        let request = discount_request(h.student, Money::from_major(600));
        let granted = request.date;

        let entry = h
            .factory
            .create_discount_entry(request, None)
            .await
            .unwrap();

        assert_eq!(entry.entry_type, EntryType::Discount);
        assert_eq!(
            entry.description,
            "Discount applied – Early payment – Asha Verma"
        );
        assert_eq!(entry.credit, Money::from_major(600));
        assert_eq!(entry.date, granted);
        assert_eq!(entry.created_by, "warden.rao");
    }

    #[tokio::test]
    async fn test_adjustment_entry_resolves_name_and_picks_leg() {
        let h = harness().await;

        let debit_entry = h
            .factory
            .create_adjustment_entry(
                AdjustmentEntryRequest {
                    student_id: h.student,
                    amount: Money::from_major(250),
                    description: "Broken window pane".to_string(),
                    direction: AdjustmentDirection::Debit,
                    created_by: "warden.rao".to_string(),
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(
            debit_entry.description,
            "DEBIT Adjustment – Broken window pane – Asha Verma"
        );
        assert_eq!(debit_entry.debit, Money::from_major(250));
        assert_eq!(debit_entry.credit, Money::zero());
        assert_eq!(debit_entry.reference_id, None);

        let credit_entry = h
            .factory
            .create_adjustment_entry(
                AdjustmentEntryRequest {
                    student_id: h.student,
                    amount: Money::from_major(100),
                    description: "Mess rebate".to_string(),
                    direction: AdjustmentDirection::Credit,
                    created_by: "warden.rao".to_string(),
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(
            credit_entry.description,
            "CREDIT Adjustment – Mess rebate – Asha Verma"
        );
        assert_eq!(credit_entry.credit, Money::from_major(100));
        assert_eq!(credit_entry.debit, Money::zero());
    }

    #[tokio::test]
    async fn test_running_balance_across_partial_settlement() {
        let h = harness().await;

        let invoice = h
            .factory
            .create_invoice_entry(invoice_request(h.student, Money::from_major(6200)), None)
            .await
            .unwrap();
        assert_eq!(invoice.balance, Money::from_major(6200));
        assert_eq!(invoice.balance_type, BalanceType::Dr);

        let payment = h
            .factory
            .create_payment_entry(payment_request(h.student, Money::from_major(3000)), None)
            .await
            .unwrap();
        assert_eq!(payment.balance, Money::from_major(3200));
        assert_eq!(payment.balance_type, BalanceType::Dr);

        let discount = h
            .factory
            .create_discount_entry(discount_request(h.student, Money::from_major(600)), None)
            .await
            .unwrap();
        assert_eq!(discount.balance, Money::from_major(2600));
        assert_eq!(discount.balance_type, BalanceType::Dr);

        assert_eq!(
            [invoice.entry_number, payment.entry_number, discount.entry_number],
            [1, 2, 3]
        );
    }

    #[tokio::test]
    async fn test_full_settlement_reaches_nil() {
        let h = harness().await;

        h.factory
            .create_invoice_entry(invoice_request(h.student, Money::from_major(8500)), None)
            .await
            .unwrap();
        let payment = h
            .factory
            .create_payment_entry(payment_request(h.student, Money::from_major(8500)), None)
            .await
            .unwrap();

        assert_eq!(payment.balance, Money::zero());
        assert_eq!(payment.balance_type, BalanceType::Nil);
    }

    #[tokio::test]
    async fn test_overpayment_flips_to_credit_balance() {
        let h = harness().await;

        h.factory
            .create_invoice_entry(invoice_request(h.student, Money::from_major(5000)), None)
            .await
            .unwrap();
        let payment = h
            .factory
            .create_payment_entry(payment_request(h.student, Money::new(dec!(5500.50))), None)
            .await
            .unwrap();

        assert_eq!(payment.balance, Money::new(dec!(500.50)));
        assert_eq!(payment.balance_type, BalanceType::Cr);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amounts() {
        let h = harness().await;

        let zero = h
            .factory
            .create_invoice_entry(invoice_request(h.student, Money::zero()), None)
            .await;
        assert!(matches!(zero.unwrap_err(), LedgerError::Validation(_)));

        let negative = h
            .factory
            .create_payment_entry(payment_request(h.student, Money::from_major(-10)), None)
            .await;
        assert!(matches!(negative.unwrap_err(), LedgerError::Validation(_)));

        assert!(h.store.dump().await.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_blank_required_fields() {
        let h = harness().await;

        let mut request = invoice_request(h.student, Money::from_major(100));
        request.month = "   ".to_string();
        let result = h.factory.create_invoice_entry(request, None).await;
        assert!(matches!(result.unwrap_err(), LedgerError::Validation(_)));

        let mut request = payment_request(h.student, Money::from_major(100));
        request.processed_by = String::new();
        let result = h.factory.create_payment_entry(request, None).await;
        assert!(matches!(result.unwrap_err(), LedgerError::Validation(_)));

        let result = h
            .factory
            .create_adjustment_entry(
                AdjustmentEntryRequest {
                    student_id: h.student,
                    amount: Money::from_major(50),
                    description: "".to_string(),
                    direction: AdjustmentDirection::Debit,
                    created_by: "warden.rao".to_string(),
                },
                None,
            )
            .await;
        assert!(matches!(result.unwrap_err(), LedgerError::Validation(_)));

        assert!(h.store.dump().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_student_is_rejected() {
        let h = harness().await;
        let stranger = StudentId::new_v7();

        let result = h
            .factory
            .create_invoice_entry(invoice_request(stranger, Money::from_major(100)), None)
            .await;
        assert!(matches!(result.unwrap_err(), LedgerError::StudentNotFound(_)));

        let result = h
            .factory
            .create_adjustment_entry(
                AdjustmentEntryRequest {
                    student_id: stranger,
                    amount: Money::from_major(50),
                    description: "Key deposit".to_string(),
                    direction: AdjustmentDirection::Debit,
                    created_by: "warden.rao".to_string(),
                },
                None,
            )
            .await;
        assert!(matches!(result.unwrap_err(), LedgerError::StudentNotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_reference_cannot_double_post() {
        let h = harness().await;
        let request = payment_request(h.student, Money::from_major(3000));

        h.factory
            .create_payment_entry(request.clone(), None)
            .await
            .unwrap();
        let retry = h.factory.create_payment_entry(request, None).await;

        assert!(matches!(
            retry.unwrap_err(),
            LedgerError::DuplicateReference { .. }
        ));
        assert_eq!(h.store.dump().await.len(), 1);
    }

    #[tokio::test]
    async fn test_same_reference_under_different_type_is_allowed() {
        let h = harness().await;
        let shared = Uuid::new_v4();

        let mut invoice = invoice_request(h.student, Money::from_major(100));
        invoice.id = InvoiceId::from_uuid(shared);
        h.factory.create_invoice_entry(invoice, None).await.unwrap();

        let mut payment = payment_request(h.student, Money::from_major(100));
        payment.id = PaymentId::from_uuid(shared);
        h.factory.create_payment_entry(payment, None).await.unwrap();

        assert_eq!(h.store.dump().await.len(), 2);
    }
}
