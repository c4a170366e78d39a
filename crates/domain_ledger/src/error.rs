//! Ledger domain errors

use thiserror::Error;
use uuid::Uuid;

use core_kernel::{MoneyError, PortError};

use crate::entry::EntryType;

/// Errors that can occur in the ledger domain
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The student is not present in the student directory
    #[error("Student not found: {0}")]
    StudentNotFound(String),

    /// The ledger entry does not exist
    #[error("Ledger entry not found: {0}")]
    EntryNotFound(String),

    /// The entry has already been reversed; the transition is terminal
    #[error("Ledger entry {0} is already reversed")]
    AlreadyReversed(String),

    /// An entry for the same source record is already on the ledger
    #[error("A {entry_type} entry already references {reference_id}")]
    DuplicateReference {
        reference_id: Uuid,
        entry_type: EntryType,
    },

    /// Request data failed validation; nothing was written
    #[error("Validation error: {0}")]
    Validation(String),

    /// Decimal arithmetic failed
    #[error("Arithmetic error: {0}")]
    Arithmetic(#[from] MoneyError),

    /// The backing store reported a failure
    #[error(transparent)]
    Store(#[from] PortError),
}

impl LedgerError {
    /// Creates a StudentNotFound error
    pub fn student_not_found(id: impl std::fmt::Display) -> Self {
        LedgerError::StudentNotFound(id.to_string())
    }

    /// Creates an EntryNotFound error
    pub fn entry_not_found(id: impl std::fmt::Display) -> Self {
        LedgerError::EntryNotFound(id.to_string())
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    /// Returns true if the error indicates a missing student or entry
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::StudentNotFound(_) | LedgerError::EntryNotFound(_)
        )
    }

    /// Returns true if the error indicates a conflict with recorded state
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            LedgerError::AlreadyReversed(_) | LedgerError::DuplicateReference { .. }
        )
    }
}
