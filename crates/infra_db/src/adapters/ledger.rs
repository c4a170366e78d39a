//! PostgreSQL adapter for the ledger store port
//!
//! Implements `LedgerStorePort` on top of `LedgerRepository`. All
//! translation between the domain and the database happens at this
//! boundary: typed identifiers and enum tags go down as raw UUIDs and
//! canonical strings, rows come back up through the domain's `FromStr`
//! parsers, and `DatabaseError` is mapped onto `PortError` categories.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    DomainPort, HealthCheckResult, HealthCheckable, LedgerEntryId, Money, OperationMetadata,
    PortError, StudentId,
};
use domain_ledger::{
    BalanceType, EntryPage, EntryType, LedgerEntry, LedgerQuery, LedgerStorePort, StatsSnapshot,
    StudentTotals, TypeAggregate,
};

use crate::error::DatabaseError;
use crate::repositories::ledger::{
    EntryFilter, LedgerEntryRow, LedgerRepository, ReversalCas, StudentTotalsRow, TypeAggregateRow,
};

/// Identifier this adapter reports in health checks
const ADAPTER_ID: &str = "postgres-ledger-store";

/// PostgreSQL-backed implementation of `LedgerStorePort`
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    repository: LedgerRepository,
    pool: PgPool,
}

impl PostgresLedgerStore {
    /// Creates a new adapter backed by the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: LedgerRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns the underlying repository
    pub fn repository(&self) -> &LedgerRepository {
        &self.repository
    }
}

impl DomainPort for PostgresLedgerStore {}

#[async_trait]
impl HealthCheckable for PostgresLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        let started = Instant::now();

        match sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
        {
            Ok(_) => HealthCheckResult::healthy(ADAPTER_ID, started.elapsed().as_millis() as u64),
            Err(e) => HealthCheckResult::unhealthy(
                ADAPTER_ID,
                started.elapsed().as_millis() as u64,
                format!("Database error: {}", e),
            ),
        }
    }
}

#[async_trait]
impl LedgerStorePort for PostgresLedgerStore {
    #[instrument(
        skip(self, entry, _metadata),
        fields(entry_number = entry.entry_number, student_id = %entry.student_id)
    )]
    async fn insert(
        &self,
        entry: LedgerEntry,
        _metadata: Option<OperationMetadata>,
    ) -> Result<LedgerEntry, PortError> {
        debug!("Inserting ledger entry");

        let row = entry_to_row(&entry)?;
        let stored = self
            .repository
            .insert(&row)
            .await
            .map_err(db_to_port_error)?;

        row_to_entry(stored)
    }

    #[instrument(skip(self, reversal_date, _metadata), fields(entry_id = %id))]
    async fn mark_reversed(
        &self,
        id: LedgerEntryId,
        reversed_by: &str,
        reversal_date: DateTime<Utc>,
        _metadata: Option<OperationMetadata>,
    ) -> Result<LedgerEntry, PortError> {
        debug!("Applying reversal stamp");

        let outcome = self
            .repository
            .mark_reversed(*id.as_uuid(), reversed_by, reversal_date)
            .await
            .map_err(db_to_port_error)?;

        match outcome {
            ReversalCas::Applied(row) => row_to_entry(row),
            ReversalCas::AlreadyReversed => Err(PortError::conflict(format!(
                "entry {} is already reversed",
                id
            ))),
            ReversalCas::Missing => Err(PortError::not_found("LedgerEntry", id)),
        }
    }

    #[instrument(skip(self, _metadata), fields(entry_id = %id))]
    async fn entry(
        &self,
        id: LedgerEntryId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<LedgerEntry, PortError> {
        debug!("Fetching ledger entry");

        match self.repository.get_by_id(*id.as_uuid()).await {
            Ok(row) => row_to_entry(row),
            Err(e) if e.is_not_found() => Err(PortError::not_found("LedgerEntry", id)),
            Err(e) => Err(db_to_port_error(e)),
        }
    }

    #[instrument(skip(self, _metadata), fields(student_id = %student_id))]
    async fn entries_for_student(
        &self,
        student_id: StudentId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<LedgerEntry>, PortError> {
        debug!("Listing entries for student");

        let rows = self
            .repository
            .find_by_student(*student_id.as_uuid())
            .await
            .map_err(db_to_port_error)?;

        rows.into_iter().map(row_to_entry).collect()
    }

    #[instrument(skip(self, query, _metadata), fields(page = query.page, limit = query.limit))]
    async fn search(
        &self,
        query: LedgerQuery,
        _metadata: Option<OperationMetadata>,
    ) -> Result<EntryPage, PortError> {
        debug!("Searching ledger entries");

        let filter = query_to_filter(&query);
        let (rows, total_items) = self
            .repository
            .search(&filter)
            .await
            .map_err(db_to_port_error)?;

        let items = rows
            .into_iter()
            .map(row_to_entry)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EntryPage {
            items,
            page: query.page,
            limit: query.limit,
            total_items,
        })
    }

    #[instrument(skip(self, _metadata), fields(student_id = %student_id))]
    async fn student_totals(
        &self,
        student_id: StudentId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<StudentTotals, PortError> {
        debug!("Computing student totals");

        let row = self
            .repository
            .student_totals(*student_id.as_uuid())
            .await
            .map_err(db_to_port_error)?;

        Ok(totals_to_domain(row))
    }

    #[instrument(skip(self, _metadata))]
    async fn collect_stats(
        &self,
        _metadata: Option<OperationMetadata>,
    ) -> Result<StatsSnapshot, PortError> {
        debug!("Collecting ledger statistics");

        let active_students = self
            .repository
            .active_student_count()
            .await
            .map_err(db_to_port_error)?;

        let per_type = self
            .repository
            .stats_by_type()
            .await
            .map_err(db_to_port_error)?
            .into_iter()
            .map(aggregate_to_domain)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StatsSnapshot {
            active_students: active_students as u64,
            per_type,
        })
    }

    #[instrument(skip(self, _metadata))]
    async fn latest_entry_number(
        &self,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Option<u64>, PortError> {
        debug!("Fetching highest entry number");

        match self
            .repository
            .max_entry_number()
            .await
            .map_err(db_to_port_error)?
        {
            Some(number) => {
                let number = u64::try_from(number).map_err(|_| {
                    PortError::transformation(format!("entry number {} is negative", number))
                })?;
                Ok(Some(number))
            }
            None => Ok(None),
        }
    }

    #[instrument(
        skip(self, _metadata),
        fields(reference_id = %reference_id, entry_type = %entry_type)
    )]
    async fn reference_exists(
        &self,
        reference_id: Uuid,
        entry_type: EntryType,
        _metadata: Option<OperationMetadata>,
    ) -> Result<bool, PortError> {
        debug!("Checking for existing source reference");

        self.repository
            .reference_exists(reference_id, entry_type.as_str())
            .await
            .map_err(db_to_port_error)
    }
}

// =============================================================================
// Conversion Functions
// =============================================================================

/// Maps a database error onto the port error vocabulary
///
/// `NotFound` is intentionally absent: lookups that can miss handle it at
/// the call site, where the entity and id are known.
fn db_to_port_error(error: DatabaseError) -> PortError {
    match error {
        DatabaseError::DuplicateEntry(message) | DatabaseError::ConstraintViolation(message) => {
            PortError::conflict(message)
        }
        DatabaseError::ConnectionFailed(message) => PortError::connection(message),
        DatabaseError::PoolExhausted => PortError::ServiceUnavailable {
            service: "postgres".to_string(),
        },
        other => PortError::internal(other.to_string()),
    }
}

/// Lowers a domain query into the repository's raw filter
fn query_to_filter(query: &LedgerQuery) -> EntryFilter {
    EntryFilter {
        student_id: query.student_id.map(|id| *id.as_uuid()),
        entry_type: query.entry_type.map(|t| t.as_str().to_string()),
        date_from: query.date_from,
        date_to: query.date_to,
        search: query.search.clone(),
        limit: i64::from(query.limit),
        offset: query.offset() as i64,
    }
}

/// Lowers a domain entry into its database row
fn entry_to_row(entry: &LedgerEntry) -> Result<LedgerEntryRow, PortError> {
    let entry_number = i64::try_from(entry.entry_number).map_err(|_| {
        PortError::transformation(format!(
            "entry number {} exceeds the storable range",
            entry.entry_number
        ))
    })?;

    Ok(LedgerEntryRow {
        id: *entry.id.as_uuid(),
        student_id: *entry.student_id.as_uuid(),
        entry_number,
        entry_type: entry.entry_type.as_str().to_string(),
        description: entry.description.clone(),
        entry_date: entry.date,
        reference_id: entry.reference_id,
        debit: entry.debit.amount(),
        credit: entry.credit.amount(),
        balance: entry.balance.amount(),
        balance_type: entry.balance_type.as_str().to_string(),
        is_reversed: entry.is_reversed,
        reversed_by: entry.reversed_by.clone(),
        reversal_date: entry.reversal_date,
        notes: entry.notes.clone(),
        created_by: entry.created_by.clone(),
        created_at: entry.created_at,
    })
}

/// Raises a database row back into a domain entry
fn row_to_entry(row: LedgerEntryRow) -> Result<LedgerEntry, PortError> {
    let entry_type = row
        .entry_type
        .parse::<EntryType>()
        .map_err(|e| PortError::transformation(e.to_string()))?;
    let balance_type = row
        .balance_type
        .parse::<BalanceType>()
        .map_err(|e| PortError::transformation(e.to_string()))?;
    let entry_number = u64::try_from(row.entry_number).map_err(|_| {
        PortError::transformation(format!("entry number {} is negative", row.entry_number))
    })?;

    Ok(LedgerEntry {
        id: LedgerEntryId::from_uuid(row.id),
        student_id: StudentId::from_uuid(row.student_id),
        entry_number,
        date: row.entry_date,
        entry_type,
        description: row.description,
        reference_id: row.reference_id,
        debit: Money::new(row.debit),
        credit: Money::new(row.credit),
        balance: Money::new(row.balance),
        balance_type,
        is_reversed: row.is_reversed,
        reversed_by: row.reversed_by,
        reversal_date: row.reversal_date,
        notes: row.notes,
        created_by: row.created_by,
        created_at: row.created_at,
    })
}

/// Raises a totals row into the domain aggregate
fn totals_to_domain(row: StudentTotalsRow) -> StudentTotals {
    StudentTotals {
        debit_total: Money::new(row.debit_total),
        credit_total: Money::new(row.credit_total),
        entry_count: row.entry_count as u64,
    }
}

/// Raises a per-type aggregate row into the domain aggregate
fn aggregate_to_domain(row: TypeAggregateRow) -> Result<TypeAggregate, PortError> {
    let entry_type = row
        .entry_type
        .parse::<EntryType>()
        .map_err(|e| PortError::transformation(e.to_string()))?;

    Ok(TypeAggregate {
        entry_type,
        entry_count: row.entry_count as u64,
        debit_total: Money::new(row.debit_total),
        credit_total: Money::new(row.credit_total),
    })
}
