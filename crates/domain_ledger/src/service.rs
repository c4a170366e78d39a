//! Ledger service facade
//!
//! `LedgerService` is the single entry point feature modules and the
//! reporting layer call. It wires the sequence generator (seeded from the
//! store at construction), the per-student lock map, the entry factory, the
//! reversal processor, and the read-side calculators over one store and one
//! student directory, and translates domain results into wire views.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, instrument};

use core_kernel::{HealthCheckResult, LedgerEntryId, OperationMetadata, StudentId};

use crate::balance::BalanceCalculator;
use crate::entry::LedgerEntry;
use crate::error::LedgerError;
use crate::factory::{
    AdjustmentEntryRequest, DiscountEntryRequest, EntryFactory, InvoiceEntryRequest,
    PaymentEntryRequest,
};
use crate::locks::StudentLocks;
use crate::ports::{LedgerQuery, LedgerStorePort, StudentDirectoryExt, StudentDirectoryPort};
use crate::reversal::ReversalProcessor;
use crate::sequence::SequenceGenerator;
use crate::stats::StatsAggregator;
use crate::views::{BalanceView, EntryListView, LedgerEntryView, ReversalView, StatsView};

/// The ledger engine's service facade
pub struct LedgerService {
    store: Arc<dyn LedgerStorePort>,
    directory: Arc<dyn StudentDirectoryPort>,
    factory: Arc<EntryFactory>,
    reversals: ReversalProcessor,
    calculator: BalanceCalculator,
    aggregator: StatsAggregator,
}

impl LedgerService {
    /// Wires a service over the given store and directory
    ///
    /// Reads the highest persisted entry number once to seed the sequence
    /// generator, so numbering continues across restarts.
    pub async fn new(
        store: Arc<dyn LedgerStorePort>,
        directory: Arc<dyn StudentDirectoryPort>,
    ) -> Result<Self, LedgerError> {
        let last_issued = store.latest_entry_number(None).await?.unwrap_or(0);
        let sequence = Arc::new(SequenceGenerator::starting_after(last_issued));
        let locks = Arc::new(StudentLocks::new());

        let factory = Arc::new(EntryFactory::new(
            store.clone(),
            directory.clone(),
            sequence,
            locks.clone(),
        ));
        let reversals = ReversalProcessor::new(store.clone(), factory.clone(), locks);
        let calculator = BalanceCalculator::new(store.clone());
        let aggregator = StatsAggregator::new(store.clone());

        info!(last_issued, "ledger service ready");

        Ok(Self {
            store,
            directory,
            factory,
            reversals,
            calculator,
            aggregator,
        })
    }

    // ========================================================================
    // Entry Creation
    // ========================================================================

    /// Records an issued invoice on the ledger
    #[instrument(skip(self, request, metadata), fields(student_id = %request.student_id))]
    pub async fn create_invoice_entry(
        &self,
        request: InvoiceEntryRequest,
        metadata: Option<OperationMetadata>,
    ) -> Result<LedgerEntryView, LedgerError> {
        let entry = self.factory.create_invoice_entry(request, metadata).await?;
        self.render_entry(&entry).await
    }

    /// Records a received payment on the ledger
    #[instrument(skip(self, request, metadata), fields(student_id = %request.student_id))]
    pub async fn create_payment_entry(
        &self,
        request: PaymentEntryRequest,
        metadata: Option<OperationMetadata>,
    ) -> Result<LedgerEntryView, LedgerError> {
        let entry = self.factory.create_payment_entry(request, metadata).await?;
        self.render_entry(&entry).await
    }

    /// Records an applied discount on the ledger
    #[instrument(skip(self, request, metadata), fields(student_id = %request.student_id))]
    pub async fn create_discount_entry(
        &self,
        request: DiscountEntryRequest,
        metadata: Option<OperationMetadata>,
    ) -> Result<LedgerEntryView, LedgerError> {
        let entry = self.factory.create_discount_entry(request, metadata).await?;
        self.render_entry(&entry).await
    }

    /// Records a manual adjustment on the ledger
    #[instrument(skip(self, request, metadata), fields(student_id = %request.student_id))]
    pub async fn create_adjustment_entry(
        &self,
        request: AdjustmentEntryRequest,
        metadata: Option<OperationMetadata>,
    ) -> Result<LedgerEntryView, LedgerError> {
        let entry = self
            .factory
            .create_adjustment_entry(request, metadata)
            .await?;
        self.render_entry(&entry).await
    }

    // ========================================================================
    // Reversal
    // ========================================================================

    /// Reverses an entry and returns both rows of the pair
    #[instrument(skip(self, metadata), fields(entry_id = %entry_id))]
    pub async fn reverse_entry(
        &self,
        entry_id: LedgerEntryId,
        reversed_by: &str,
        reason: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<ReversalView, LedgerError> {
        let outcome = self
            .reversals
            .reverse_entry(entry_id, reversed_by, reason, metadata)
            .await?;

        let name = self
            .directory
            .student(outcome.original.student_id)
            .await?
            .map(|s| s.name);
        Ok(ReversalView::from_outcome(&outcome, name.as_deref()))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Derives a student's current balance
    ///
    /// Fails with `StudentNotFound` for a student the directory does not
    /// know; a known student with no entries yields the zero balance.
    #[instrument(skip(self, metadata), fields(student_id = %student_id))]
    pub async fn student_balance(
        &self,
        student_id: StudentId,
        metadata: Option<OperationMetadata>,
    ) -> Result<BalanceView, LedgerError> {
        self.require_student(student_id).await?;
        let balance = self.calculator.student_balance(student_id, metadata).await?;
        Ok(BalanceView::from(&balance))
    }

    /// Lists a student's full history, newest first, reversals included
    #[instrument(skip(self, metadata), fields(student_id = %student_id))]
    pub async fn entries_for_student(
        &self,
        student_id: StudentId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<LedgerEntryView>, LedgerError> {
        let student = self
            .directory
            .student(student_id)
            .await?
            .ok_or_else(|| LedgerError::student_not_found(student_id))?;

        let entries = self.store.entries_for_student(student_id, metadata).await?;
        Ok(entries
            .iter()
            .map(|entry| LedgerEntryView::from_entry(entry, Some(&student.name)))
            .collect())
    }

    /// Searches the whole ledger with filters and pagination
    #[instrument(skip(self, query, metadata))]
    pub async fn find_entries(
        &self,
        query: LedgerQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<EntryListView, LedgerError> {
        let page = self.store.search(query.clamped(), metadata).await?;

        let ids: Vec<StudentId> = page
            .items
            .iter()
            .map(|entry| entry.student_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let names = self.directory.student_names(&ids).await?;

        Ok(EntryListView::from_page(&page, &names))
    }

    /// Computes ledger-wide statistics
    #[instrument(skip(self, metadata))]
    pub async fn stats(
        &self,
        metadata: Option<OperationMetadata>,
    ) -> Result<StatsView, LedgerError> {
        let stats = self.aggregator.collect(metadata).await?;
        Ok(StatsView::from(&stats))
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// Health of the adapters behind the service
    pub async fn health(&self) -> Vec<HealthCheckResult> {
        vec![
            self.store.health_check().await,
            self.directory.health_check().await,
        ]
    }

    async fn require_student(&self, student_id: StudentId) -> Result<(), LedgerError> {
        if self.directory.student_exists(student_id).await? {
            Ok(())
        } else {
            Err(LedgerError::student_not_found(student_id))
        }
    }

    async fn render_entry(&self, entry: &LedgerEntry) -> Result<LedgerEntryView, LedgerError> {
        let name = self
            .directory
            .student(entry.student_id)
            .await?
            .map(|s| s.name);
        Ok(LedgerEntryView::from_entry(entry, name.as_deref()))
    }
}
