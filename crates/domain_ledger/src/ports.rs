//! Ledger Domain Ports
//!
//! This module defines the port interfaces the ledger engine needs from the
//! outside world, enabling swappable implementations (PostgreSQL, mock).
//!
//! # Architecture
//!
//! Two ports cover the engine's external needs:
//!
//! - **`LedgerStorePort`**: the persisted append-only entry collection.
//!   Implemented by `PostgresLedgerStore` (infra_db) and `MockLedgerStore`
//!   (in-crate, for tests).
//! - **`StudentDirectoryPort`**: read-only access to the student registry
//!   for existence checks and display-name resolution. The production
//!   directory lives with the student CRUD module; this crate ships
//!   `MockStudentDirectory`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_ledger::{LedgerService, LedgerStorePort};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn LedgerStorePort> = Arc::new(PostgresLedgerStore::new(pool));
//! let directory: Arc<dyn StudentDirectoryPort> = Arc::new(students);
//! let service = LedgerService::new(store, directory).await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use core_kernel::{
    DomainPort, HealthCheckable, LedgerEntryId, Money, OperationMetadata, PortError, StudentId,
};

use crate::entry::{EntryType, LedgerEntry};

/// Default page size for entry searches
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on the page size a caller may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query parameters for searching ledger entries
#[derive(Debug, Clone)]
pub struct LedgerQuery {
    /// Filter by owning student
    pub student_id: Option<StudentId>,
    /// Filter by entry type
    pub entry_type: Option<EntryType>,
    /// Only entries on or after this date
    pub date_from: Option<DateTime<Utc>>,
    /// Only entries on or before this date
    pub date_to: Option<DateTime<Utc>>,
    /// Case-insensitive match against description and notes
    pub search: Option<String>,
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
}

impl Default for LedgerQuery {
    fn default() -> Self {
        Self {
            student_id: None,
            entry_type: None,
            date_from: None,
            date_to: None,
            search: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl LedgerQuery {
    /// Creates a query scoped to one student
    pub fn for_student(student_id: StudentId) -> Self {
        Self {
            student_id: Some(student_id),
            ..Default::default()
        }
    }

    /// Filters by entry type
    pub fn with_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = Some(entry_type);
        self
    }

    /// Restricts to an inclusive date window
    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    /// Adds a free-text search term
    pub fn matching(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Selects a result page
    pub fn paginate(mut self, page: u32, limit: u32) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }

    /// Clamps pagination to the supported range
    ///
    /// `page` is raised to at least 1; `limit` is clamped to
    /// [1, `MAX_PAGE_SIZE`]. Applied by the service before the query reaches
    /// a store adapter, so adapters may assume sane values.
    pub fn clamped(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Returns the row offset for the selected page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of search results with the total row count
#[derive(Debug, Clone)]
pub struct EntryPage {
    /// Entries on this page, ordered date desc then entry number desc
    pub items: Vec<LedgerEntry>,
    /// 1-based page number that was served
    pub page: u32,
    /// Page size that was served
    pub limit: u32,
    /// Total matching rows across all pages
    pub total_items: u64,
}

impl EntryPage {
    /// Returns the number of pages the full result set spans
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total_items.div_ceil(u64::from(self.limit))
    }
}

/// Raw non-reversed sums for one student, as computed by the store
///
/// The store returns unsigned totals; `BalanceCalculator` signs and
/// assembles them into a `StudentBalance`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StudentTotals {
    /// Σ debit over the student's non-reversed entries
    pub debit_total: Money,
    /// Σ credit over the student's non-reversed entries
    pub credit_total: Money,
    /// Count of non-reversed entries participating in the sums
    pub entry_count: u64,
}

/// Per-type aggregate over non-reversed entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeAggregate {
    /// The entry type this row aggregates
    pub entry_type: EntryType,
    /// Count of non-reversed entries of this type
    pub entry_count: u64,
    /// Σ debit over those entries
    pub debit_total: Money,
    /// Σ credit over those entries
    pub credit_total: Money,
}

/// Ledger-wide aggregation snapshot, as computed by the store
#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    /// Distinct students with at least one non-reversed entry
    pub active_students: u64,
    /// One aggregate row per entry type present on the ledger
    pub per_type: Vec<TypeAggregate>,
}

/// A student as known to the student directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    /// The student's identifier
    pub id: StudentId,
    /// Display name
    pub name: String,
}

impl StudentRecord {
    /// Creates a directory record
    pub fn new(id: StudentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// The port trait for the append-only ledger store
///
/// Implementations persist entries and answer the aggregate queries the
/// engine derives balances and statistics from. All methods are async and
/// return `Result<T, PortError>` for consistent error handling across
/// adapter implementations.
#[async_trait]
pub trait LedgerStorePort: DomainPort + HealthCheckable {
    // ========================================================================
    // Write Operations
    // ========================================================================

    /// Persists a new ledger entry
    ///
    /// # Arguments
    ///
    /// * `entry` - The fully built entry, including its entry number
    /// * `metadata` - Optional operation metadata for tracing/auditing
    ///
    /// # Returns
    ///
    /// The entry as stored, or `PortError::Conflict` if the entry number
    /// is already taken
    async fn insert(
        &self,
        entry: LedgerEntry,
        metadata: Option<OperationMetadata>,
    ) -> Result<LedgerEntry, PortError>;

    /// Applies the `Active → Reversed` transition to an entry
    ///
    /// The transition is an atomic compare-and-set: it succeeds only if the
    /// entry exists and is not already reversed.
    ///
    /// # Arguments
    ///
    /// * `id` - The entry to flag
    /// * `reversed_by` - Actor performing the reversal
    /// * `reversal_date` - When the reversal took effect
    /// * `metadata` - Optional operation metadata
    ///
    /// # Returns
    ///
    /// The updated entry, `PortError::NotFound` if it does not exist, or
    /// `PortError::Conflict` if it was already reversed
    async fn mark_reversed(
        &self,
        id: LedgerEntryId,
        reversed_by: &str,
        reversal_date: DateTime<Utc>,
        metadata: Option<OperationMetadata>,
    ) -> Result<LedgerEntry, PortError>;

    // ========================================================================
    // Read Operations
    // ========================================================================

    /// Retrieves an entry by ID
    ///
    /// # Returns
    ///
    /// The entry if found, or `PortError::NotFound`
    async fn entry(
        &self,
        id: LedgerEntryId,
        metadata: Option<OperationMetadata>,
    ) -> Result<LedgerEntry, PortError>;

    /// Lists all entries for one student, reversed entries included
    ///
    /// # Returns
    ///
    /// Entries ordered by date descending, then entry number descending
    async fn entries_for_student(
        &self,
        student_id: StudentId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<LedgerEntry>, PortError>;

    /// Searches entries matching the query, one page at a time
    ///
    /// # Arguments
    ///
    /// * `query` - Filters plus pagination, already clamped by the caller
    /// * `metadata` - Optional operation metadata
    ///
    /// # Returns
    ///
    /// The requested page plus the total matching row count
    async fn search(
        &self,
        query: LedgerQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<EntryPage, PortError>;

    // ========================================================================
    // Aggregate Operations
    // ========================================================================

    /// Computes the raw debit/credit sums for one student
    ///
    /// Only non-reversed entries participate. The SQL adapter computes this
    /// as an aggregate query; the in-memory store folds.
    async fn student_totals(
        &self,
        student_id: StudentId,
        metadata: Option<OperationMetadata>,
    ) -> Result<StudentTotals, PortError>;

    /// Computes the ledger-wide aggregation snapshot
    ///
    /// Only non-reversed entries participate; the snapshot carries one
    /// aggregate row per entry type present plus the distinct active
    /// student count.
    async fn collect_stats(
        &self,
        metadata: Option<OperationMetadata>,
    ) -> Result<StatsSnapshot, PortError>;

    /// Returns the highest entry number ever persisted
    ///
    /// Reversed entries count; entry numbers are never reused. Returns
    /// `None` on an empty ledger. Used once at service construction to seed
    /// the sequence generator.
    async fn latest_entry_number(
        &self,
        metadata: Option<OperationMetadata>,
    ) -> Result<Option<u64>, PortError>;

    /// Checks whether any entry already records the given source reference
    ///
    /// # Arguments
    ///
    /// * `reference_id` - The source invoice/payment/discount id
    /// * `entry_type` - The entry type the reference would be recorded under
    async fn reference_exists(
        &self,
        reference_id: Uuid,
        entry_type: EntryType,
        metadata: Option<OperationMetadata>,
    ) -> Result<bool, PortError>;
}

/// The port trait for read-only student directory access
///
/// The ledger never writes student data; it consults the directory to
/// validate that a student exists before accepting an entry and to resolve
/// display names for views.
#[async_trait]
pub trait StudentDirectoryPort: DomainPort + HealthCheckable {
    /// Looks up a single student
    ///
    /// # Returns
    ///
    /// The directory record, or `None` if the student is unknown
    async fn student(&self, id: StudentId) -> Result<Option<StudentRecord>, PortError>;

    /// Resolves display names for a batch of students
    ///
    /// Unknown ids are simply absent from the result map; callers render a
    /// placeholder for them.
    async fn student_names(
        &self,
        ids: &[StudentId],
    ) -> Result<HashMap<StudentId, String>, PortError>;
}

/// Extension trait for StudentDirectoryPort with convenience methods
#[async_trait]
pub trait StudentDirectoryExt: StudentDirectoryPort {
    /// Checks whether a student exists in the directory
    async fn student_exists(&self, id: StudentId) -> Result<bool, PortError> {
        Ok(self.student(id).await?.is_some())
    }
}

// Blanket implementation for all StudentDirectoryPort implementors
impl<T: StudentDirectoryPort + ?Sized> StudentDirectoryExt for T {}

/// Mock implementations of the ledger ports for testing
///
/// These adapters keep everything in memory and are useful for unit testing
/// without a database.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use core_kernel::{AdapterHealth, HealthCheckResult};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory mock implementation of LedgerStorePort
    ///
    /// The entry collection is a plain append-only vector guarded by an
    /// async RwLock, so reads see either all or none of a write.
    #[derive(Debug, Default)]
    pub struct MockLedgerStore {
        entries: Arc<RwLock<Vec<LedgerEntry>>>,
    }

    impl MockLedgerStore {
        /// Creates an empty mock store
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates the store with entries for testing
        pub async fn with_entries(entries: Vec<LedgerEntry>) -> Self {
            let store = Self::new();
            store.entries.write().await.extend(entries);
            store
        }

        /// Returns a snapshot of every stored entry in insertion order
        pub async fn dump(&self) -> Vec<LedgerEntry> {
            self.entries.read().await.clone()
        }
    }

    impl DomainPort for MockLedgerStore {}

    #[async_trait]
    impl HealthCheckable for MockLedgerStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-ledger-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    fn checked_total(acc: Money, amount: Money) -> Result<Money, PortError> {
        acc.checked_add(&amount)
            .map_err(|e| PortError::internal(e.to_string()))
    }

    #[async_trait]
    impl LedgerStorePort for MockLedgerStore {
        async fn insert(
            &self,
            entry: LedgerEntry,
            _metadata: Option<OperationMetadata>,
        ) -> Result<LedgerEntry, PortError> {
            let mut entries = self.entries.write().await;

            // Same backstop the database enforces with UNIQUE (entry_number)
            if entries.iter().any(|e| e.entry_number == entry.entry_number) {
                return Err(PortError::conflict(format!(
                    "entry number {} is already taken",
                    entry.entry_number
                )));
            }

            entries.push(entry.clone());
            Ok(entry)
        }

        async fn mark_reversed(
            &self,
            id: LedgerEntryId,
            reversed_by: &str,
            reversal_date: DateTime<Utc>,
            _metadata: Option<OperationMetadata>,
        ) -> Result<LedgerEntry, PortError> {
            let mut entries = self.entries.write().await;
            let entry = entries
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| PortError::not_found("LedgerEntry", id))?;

            if entry.is_reversed {
                return Err(PortError::conflict(format!(
                    "entry {} is already reversed",
                    id
                )));
            }

            entry.mark_reversed(reversed_by, reversal_date);
            Ok(entry.clone())
        }

        async fn entry(
            &self,
            id: LedgerEntryId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<LedgerEntry, PortError> {
            self.entries
                .read()
                .await
                .iter()
                .find(|e| e.id == id)
                .cloned()
                .ok_or_else(|| PortError::not_found("LedgerEntry", id))
        }

        async fn entries_for_student(
            &self,
            student_id: StudentId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<LedgerEntry>, PortError> {
            let entries = self.entries.read().await;
            let mut results: Vec<LedgerEntry> = entries
                .iter()
                .filter(|e| e.student_id == student_id)
                .cloned()
                .collect();

            results.sort_by(|a, b| {
                b.date
                    .cmp(&a.date)
                    .then(b.entry_number.cmp(&a.entry_number))
            });

            Ok(results)
        }

        async fn search(
            &self,
            query: LedgerQuery,
            _metadata: Option<OperationMetadata>,
        ) -> Result<EntryPage, PortError> {
            let entries = self.entries.read().await;
            let term = query.search.as_ref().map(|s| s.to_lowercase());

            let mut matches: Vec<LedgerEntry> = entries
                .iter()
                .filter(|e| {
                    if let Some(student_id) = query.student_id {
                        if e.student_id != student_id {
                            return false;
                        }
                    }
                    if let Some(entry_type) = query.entry_type {
                        if e.entry_type != entry_type {
                            return false;
                        }
                    }
                    if let Some(from) = query.date_from {
                        if e.date < from {
                            return false;
                        }
                    }
                    if let Some(to) = query.date_to {
                        if e.date > to {
                            return false;
                        }
                    }
                    if let Some(ref term) = term {
                        let in_description = e.description.to_lowercase().contains(term);
                        let in_notes = e
                            .notes
                            .as_ref()
                            .is_some_and(|n| n.to_lowercase().contains(term));
                        if !in_description && !in_notes {
                            return false;
                        }
                    }
                    true
                })
                .cloned()
                .collect();

            matches.sort_by(|a, b| {
                b.date
                    .cmp(&a.date)
                    .then(b.entry_number.cmp(&a.entry_number))
            });

            let total_items = matches.len() as u64;
            let items = matches
                .into_iter()
                .skip(query.offset() as usize)
                .take(query.limit as usize)
                .collect();

            Ok(EntryPage {
                items,
                page: query.page,
                limit: query.limit,
                total_items,
            })
        }

        async fn student_totals(
            &self,
            student_id: StudentId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<StudentTotals, PortError> {
            let entries = self.entries.read().await;
            let mut totals = StudentTotals::default();

            for entry in entries
                .iter()
                .filter(|e| e.student_id == student_id && e.is_active())
            {
                totals.debit_total = checked_total(totals.debit_total, entry.debit)?;
                totals.credit_total = checked_total(totals.credit_total, entry.credit)?;
                totals.entry_count += 1;
            }

            Ok(totals)
        }

        async fn collect_stats(
            &self,
            _metadata: Option<OperationMetadata>,
        ) -> Result<StatsSnapshot, PortError> {
            let entries = self.entries.read().await;
            let mut by_type: HashMap<EntryType, TypeAggregate> = HashMap::new();
            let mut students = std::collections::HashSet::new();

            for entry in entries.iter().filter(|e| e.is_active()) {
                students.insert(entry.student_id);

                let aggregate = by_type.entry(entry.entry_type).or_insert(TypeAggregate {
                    entry_type: entry.entry_type,
                    entry_count: 0,
                    debit_total: Money::zero(),
                    credit_total: Money::zero(),
                });
                aggregate.entry_count += 1;
                aggregate.debit_total = checked_total(aggregate.debit_total, entry.debit)?;
                aggregate.credit_total = checked_total(aggregate.credit_total, entry.credit)?;
            }

            let mut per_type: Vec<TypeAggregate> = by_type.into_values().collect();
            per_type.sort_by_key(|a| a.entry_type.as_str());

            Ok(StatsSnapshot {
                active_students: students.len() as u64,
                per_type,
            })
        }

        async fn latest_entry_number(
            &self,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Option<u64>, PortError> {
            let entries = self.entries.read().await;
            Ok(entries.iter().map(|e| e.entry_number).max())
        }

        async fn reference_exists(
            &self,
            reference_id: Uuid,
            entry_type: EntryType,
            _metadata: Option<OperationMetadata>,
        ) -> Result<bool, PortError> {
            let entries = self.entries.read().await;
            Ok(entries
                .iter()
                .any(|e| e.reference_id == Some(reference_id) && e.entry_type == entry_type))
        }
    }

    /// In-memory mock implementation of StudentDirectoryPort
    #[derive(Debug, Default)]
    pub struct MockStudentDirectory {
        students: Arc<RwLock<HashMap<StudentId, StudentRecord>>>,
    }

    impl MockStudentDirectory {
        /// Creates an empty directory
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates the directory with students
        pub async fn with_students(students: Vec<StudentRecord>) -> Self {
            let directory = Self::new();
            {
                let mut map = directory.students.write().await;
                for student in students {
                    map.insert(student.id, student);
                }
            }
            directory
        }

        /// Registers a student
        pub async fn add(&self, student: StudentRecord) {
            self.students.write().await.insert(student.id, student);
        }

        /// Removes a student, simulating deletion from the registry
        pub async fn remove(&self, id: StudentId) {
            self.students.write().await.remove(&id);
        }
    }

    impl DomainPort for MockStudentDirectory {}

    #[async_trait]
    impl HealthCheckable for MockStudentDirectory {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-student-directory".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl StudentDirectoryPort for MockStudentDirectory {
        async fn student(&self, id: StudentId) -> Result<Option<StudentRecord>, PortError> {
            Ok(self.students.read().await.get(&id).cloned())
        }

        async fn student_names(
            &self,
            ids: &[StudentId],
        ) -> Result<HashMap<StudentId, String>, PortError> {
            let students = self.students.read().await;
            Ok(ids
                .iter()
                .filter_map(|id| students.get(id).map(|s| (*id, s.name.clone())))
                .collect())
        }
    }
}
