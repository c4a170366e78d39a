//! Ledger-wide statistics
//!
//! The store computes per-type aggregate rows (GROUP BY in PostgreSQL, a
//! fold in the in-memory store); `StatsAggregator` assembles them into the
//! overall picture. Reversed entries and their mirrors never participate.

use std::sync::Arc;

use core_kernel::{Money, OperationMetadata};

use crate::error::LedgerError;
use crate::ports::{LedgerStorePort, TypeAggregate};

/// Assembled ledger-wide statistics
#[derive(Debug, Clone, Default)]
pub struct LedgerStats {
    /// Count of non-reversed entries across the whole ledger
    pub total_entries: u64,
    /// Σ debit over those entries
    pub total_debits: Money,
    /// Σ credit over those entries
    pub total_credits: Money,
    /// Signed `total_debits − total_credits`
    pub net_balance: Money,
    /// Distinct students with at least one non-reversed entry
    pub active_students: u64,
    /// Per-type aggregate rows, ordered by type name
    pub per_type: Vec<TypeAggregate>,
}

/// Computes ledger-wide statistics from the store
pub struct StatsAggregator {
    store: Arc<dyn LedgerStorePort>,
}

impl StatsAggregator {
    /// Creates an aggregator over the given store
    pub fn new(store: Arc<dyn LedgerStorePort>) -> Self {
        Self { store }
    }

    /// Collects the current snapshot and folds it into `LedgerStats`
    pub async fn collect(
        &self,
        metadata: Option<OperationMetadata>,
    ) -> Result<LedgerStats, LedgerError> {
        let snapshot = self.store.collect_stats(metadata).await?;

        let mut stats = LedgerStats {
            active_students: snapshot.active_students,
            ..Default::default()
        };

        for row in &snapshot.per_type {
            stats.total_entries += row.entry_count;
            stats.total_debits = stats.total_debits.checked_add(&row.debit_total)?;
            stats.total_credits = stats.total_credits.checked_add(&row.credit_total)?;
        }
        stats.net_balance = stats.total_debits.checked_sub(&stats.total_credits)?;
        stats.per_type = snapshot.per_type;

        Ok(stats)
    }
}
