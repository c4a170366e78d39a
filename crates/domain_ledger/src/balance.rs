//! Student balance derivation
//!
//! A balance is never stored as standalone state. It is derived on demand
//! from the non-reversed entries of the append-only log: `net = Σ debit −
//! Σ credit`, tagged Dr (owes), Cr (in credit), or Nil (settled). The
//! `balance` column on each entry is a historical as-of-creation snapshot
//! and never participates in a read.

use std::sync::Arc;

use core_kernel::{Money, MoneyError, OperationMetadata, StudentId};

use crate::entry::BalanceType;
use crate::error::LedgerError;
use crate::ports::{LedgerStorePort, StudentTotals};

/// A student's derived financial position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentBalance {
    /// The student this balance belongs to
    pub student_id: StudentId,
    /// Signed net: positive when the student owes, negative when in credit
    pub net: Money,
    /// Σ debit over non-reversed entries
    pub debit_total: Money,
    /// Σ credit over non-reversed entries
    pub credit_total: Money,
    /// Dr / Cr / Nil classification of `net`
    pub balance_type: BalanceType,
    /// Non-reversed entries behind the sums
    pub entry_count: u64,
}

impl StudentBalance {
    /// The balance of a student with no entries on the ledger
    pub fn empty(student_id: StudentId) -> Self {
        Self {
            student_id,
            net: Money::zero(),
            debit_total: Money::zero(),
            credit_total: Money::zero(),
            balance_type: BalanceType::Nil,
            entry_count: 0,
        }
    }

    /// Assembles a balance from the store's raw totals
    pub fn from_totals(
        student_id: StudentId,
        totals: &StudentTotals,
    ) -> Result<Self, MoneyError> {
        let net = totals.debit_total.checked_sub(&totals.credit_total)?;
        Ok(Self {
            student_id,
            net,
            debit_total: totals.debit_total,
            credit_total: totals.credit_total,
            balance_type: BalanceType::from_net(net),
            entry_count: totals.entry_count,
        })
    }

    /// Returns the balance after one more entry with the given legs
    ///
    /// Pure arithmetic on the snapshot; used to stamp the as-of-creation
    /// balance onto an entry without a second store round-trip.
    pub fn after(&self, debit: Money, credit: Money) -> Result<Self, MoneyError> {
        let debit_total = self.debit_total.checked_add(&debit)?;
        let credit_total = self.credit_total.checked_add(&credit)?;
        let net = debit_total.checked_sub(&credit_total)?;
        Ok(Self {
            student_id: self.student_id,
            net,
            debit_total,
            credit_total,
            balance_type: BalanceType::from_net(net),
            entry_count: self.entry_count + 1,
        })
    }

    /// Magnitude of the net, for display alongside the Dr/Cr tag
    pub fn absolute(&self) -> Money {
        self.net.abs()
    }

    /// True when the student owes nothing and holds no credit
    pub fn is_settled(&self) -> bool {
        self.net.is_zero()
    }
}

/// Derives student balances from the ledger store
///
/// Every read recomputes from the log, so a balance always reflects
/// exactly the non-reversed entries at the time of the call.
pub struct BalanceCalculator {
    store: Arc<dyn LedgerStorePort>,
}

impl BalanceCalculator {
    /// Creates a calculator over the given store
    pub fn new(store: Arc<dyn LedgerStorePort>) -> Self {
        Self { store }
    }

    /// Derives the current balance for one student
    ///
    /// A student with no entries yields the empty balance; existence
    /// checks against the directory are the caller's concern.
    pub async fn student_balance(
        &self,
        student_id: StudentId,
        metadata: Option<OperationMetadata>,
    ) -> Result<StudentBalance, LedgerError> {
        let totals = self.store.student_totals(student_id, metadata).await?;
        Ok(StudentBalance::from_totals(student_id, &totals)?)
    }
}
