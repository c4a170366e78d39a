//! Entry reversal
//!
//! Reversal is the only mutation the ledger permits, and even that leaves
//! the original row in place: the entry's `Active → Reversed` transition is
//! flipped once via an atomic compare-and-set, and a compensating mirror
//! entry with swapped legs is appended through the factory's persistence
//! path. The mirror is born carrying the reversal stamp, so the pair drops
//! out of balance and statistics sums exactly once while both rows stay on
//! the audit trail.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use core_kernel::{LedgerEntryId, OperationMetadata};

use crate::entry::LedgerEntry;
use crate::error::LedgerError;
use crate::factory::{require_text, EntryDraft, EntryFactory};
use crate::locks::StudentLocks;
use crate::ports::LedgerStorePort;

/// The two rows a successful reversal leaves on the ledger
#[derive(Debug, Clone)]
pub struct ReversalOutcome {
    /// The original entry, now flagged reversed
    pub original: LedgerEntry,
    /// The compensating mirror entry
    pub reversal: LedgerEntry,
}

/// Applies reversals to ledger entries
pub struct ReversalProcessor {
    store: Arc<dyn LedgerStorePort>,
    factory: Arc<EntryFactory>,
    locks: Arc<StudentLocks>,
}

impl ReversalProcessor {
    /// Creates a processor sharing the factory's store and lock map
    pub fn new(
        store: Arc<dyn LedgerStorePort>,
        factory: Arc<EntryFactory>,
        locks: Arc<StudentLocks>,
    ) -> Self {
        Self {
            store,
            factory,
            locks,
        }
    }

    /// Reverses one entry and appends its mirror
    ///
    /// Fails with `EntryNotFound` for an unknown id and `AlreadyReversed`
    /// if the entry has already been through this transition, which also
    /// covers mirror entries since they are born reversed.
    #[instrument(skip(self, metadata), fields(entry_id = %entry_id))]
    pub async fn reverse_entry(
        &self,
        entry_id: LedgerEntryId,
        reversed_by: &str,
        reason: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<ReversalOutcome, LedgerError> {
        require_text("reversed by", reversed_by)?;
        require_text("reason", reason)?;

        let entry = self
            .store
            .entry(entry_id, metadata.clone())
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    LedgerError::entry_not_found(entry_id)
                } else {
                    LedgerError::from(e)
                }
            })?;

        // Cheap pre-check; the compare-and-set below is authoritative
        if entry.is_reversed {
            return Err(LedgerError::AlreadyReversed(entry_id.to_string()));
        }

        let _guard = self.locks.acquire(entry.student_id).await;

        let reversal_date = Utc::now();
        let original = self
            .store
            .mark_reversed(entry_id, reversed_by, reversal_date, metadata.clone())
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    LedgerError::AlreadyReversed(entry_id.to_string())
                } else if e.is_not_found() {
                    LedgerError::entry_not_found(entry_id)
                } else {
                    LedgerError::from(e)
                }
            })?;

        let reversal = self
            .factory
            .append(
                Self::mirror_draft(&original, reversed_by, reason, reversal_date),
                metadata,
            )
            .await?;

        info!(
            original = %original.id,
            mirror = %reversal.id,
            "ledger entry reversed"
        );

        Ok(ReversalOutcome { original, reversal })
    }

    /// Builds the compensating draft: legs swapped, type and source
    /// reference kept, reversal stamp pre-set
    fn mirror_draft(
        original: &LedgerEntry,
        reversed_by: &str,
        reason: &str,
        reversal_date: DateTime<Utc>,
    ) -> EntryDraft {
        EntryDraft {
            student_id: original.student_id,
            entry_type: original.entry_type,
            description: format!("REVERSAL: {}", original.description),
            date: None,
            reference_id: original.reference_id,
            debit: original.credit,
            credit: original.debit,
            notes: Some(reason.to_string()),
            created_by: reversed_by.to_string(),
            reversal_stamp: Some((reversed_by.to_string(), reversal_date)),
        }
    }
}
