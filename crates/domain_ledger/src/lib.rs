//! Ledger Domain - Append-Only Student Transaction Log
//!
//! This crate implements the financial core of the hostel admin backend:
//! an append-only ledger of invoices, payments, discounts, and manual
//! adjustments per student, with derived running balances and entry
//! reversal.
//!
//! # Ledger Model
//!
//! Every financial event lands as one immutable entry with a debit leg and
//! a credit leg (exactly one normally nonzero):
//! - **Debits** increase what the student owes (invoices, debit
//!   adjustments)
//! - **Credits** decrease it (payments, discounts, credit adjustments)
//! - A student's balance is always derived as Σ debit − Σ credit over
//!   their non-reversed entries and tagged **Dr** (owes), **Cr** (in
//!   credit), or **Nil** (settled)
//!
//! Entries are never updated or deleted. The single permitted mutation is
//! the reversal flag, which excludes an entry from the sums while a
//! compensating mirror entry preserves the audit trail.
//!
//! Every entry carries a ledger-wide strictly increasing entry number
//! allocated by an atomic sequence, which gives the whole ledger a single
//! total order even under concurrent writers.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_ledger::{InvoiceEntryRequest, LedgerService};
//! use std::sync::Arc;
//!
//! let service = LedgerService::new(store, directory).await?;
//!
//! let entry = service
//!     .create_invoice_entry(
//!         InvoiceEntryRequest {
//!             id: invoice_id,
//!             student_id,
//!             total: Money::from_major(8500),
//!             month: "August 2026".to_string(),
//!             student_name: "Asha Verma".to_string(),
//!         },
//!         None,
//!     )
//!     .await?;
//!
//! let balance = service.student_balance(student_id, None).await?;
//! ```

pub mod balance;
pub mod entry;
pub mod error;
pub mod factory;
pub mod locks;
pub mod ports;
pub mod reversal;
pub mod sequence;
pub mod service;
pub mod stats;
pub mod views;

pub use balance::{BalanceCalculator, StudentBalance};
pub use entry::{AdjustmentDirection, BalanceType, EntryType, LedgerEntry, ParseTagError};
pub use error::LedgerError;
pub use factory::{
    AdjustmentEntryRequest, DiscountEntryRequest, EntryFactory, InvoiceEntryRequest,
    PaymentEntryRequest, SYSTEM_ACTOR,
};
pub use locks::StudentLocks;
pub use ports::{
    EntryPage, LedgerQuery, LedgerStorePort, StatsSnapshot, StudentDirectoryExt,
    StudentDirectoryPort, StudentRecord, StudentTotals, TypeAggregate, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{MockLedgerStore, MockStudentDirectory};
pub use reversal::{ReversalOutcome, ReversalProcessor};
pub use sequence::SequenceGenerator;
pub use service::LedgerService;
pub use stats::{LedgerStats, StatsAggregator};
pub use views::{
    BalanceView, EntryListView, LedgerEntryView, PaginationView, ReversalView, StatsView,
    TypeBreakdownView, UNKNOWN_STUDENT,
};
