//! Ledger entry repository implementation
//!
//! This module provides database access for the append-only ledger table.
//! Entries are inserted once and never updated, with a single exception:
//! the reversal stamp, applied through an atomic compare-and-set.
//!
//! Queries are runtime-checked (`sqlx::query_as` over `FromRow` mappings)
//! so the crate builds without a live database; dynamic filters are
//! assembled with `QueryBuilder`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::DatabaseError;

/// Column list shared by every query that materializes full entry rows
const ENTRY_COLUMNS: &str = "id, student_id, entry_number, entry_type, description, entry_date, \
                             reference_id, debit, credit, balance, balance_type, is_reversed, \
                             reversed_by, reversal_date, notes, created_by, created_at";

/// Repository for the append-only ledger entry table
///
/// The LedgerRepository handles all database operations for ledger entries,
/// keeping SQL and row mapping out of the adapter layer.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository with the given connection pool
    ///
    /// # Arguments
    ///
    /// * `pool` - The PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new ledger entry
    ///
    /// # Arguments
    ///
    /// * `row` - The fully populated entry row, including its entry number
    ///
    /// # Returns
    ///
    /// The entry as stored
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::DuplicateEntry` if the entry number is
    /// already taken
    pub async fn insert(&self, row: &LedgerEntryRow) -> Result<LedgerEntryRow, DatabaseError> {
        let sql = format!(
            "INSERT INTO ledger_entries ({ENTRY_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             RETURNING {ENTRY_COLUMNS}"
        );

        sqlx::query_as::<_, LedgerEntryRow>(&sql)
            .bind(row.id)
            .bind(row.student_id)
            .bind(row.entry_number)
            .bind(&row.entry_type)
            .bind(&row.description)
            .bind(row.entry_date)
            .bind(row.reference_id)
            .bind(row.debit)
            .bind(row.credit)
            .bind(row.balance)
            .bind(&row.balance_type)
            .bind(row.is_reversed)
            .bind(&row.reversed_by)
            .bind(row.reversal_date)
            .bind(&row.notes)
            .bind(&row.created_by)
            .bind(row.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DatabaseError::from(&e) {
                DatabaseError::DuplicateEntry(_) => {
                    DatabaseError::duplicate("LedgerEntry", "entry_number", row.entry_number)
                }
                other => other,
            })
    }

    /// Retrieves an entry by its identifier
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no entry has the given id
    pub async fn get_by_id(&self, id: Uuid) -> Result<LedgerEntryRow, DatabaseError> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE id = $1");

        sqlx::query_as::<_, LedgerEntryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from(&e))?
            .ok_or_else(|| DatabaseError::not_found("LedgerEntry", id))
    }

    /// Applies the reversal stamp to an entry if it is still active
    ///
    /// The UPDATE is guarded on `is_reversed = FALSE`, so exactly one of any
    /// number of concurrent reversal attempts can succeed. When the guard
    /// rejects the write, a follow-up existence check inside the same
    /// transaction distinguishes a missing entry from an already-reversed
    /// one against a single consistent snapshot.
    ///
    /// # Arguments
    ///
    /// * `id` - The entry to stamp
    /// * `reversed_by` - Actor performing the reversal
    /// * `reversal_date` - When the reversal took effect
    pub async fn mark_reversed(
        &self,
        id: Uuid,
        reversed_by: &str,
        reversal_date: DateTime<Utc>,
    ) -> Result<ReversalCas, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE ledger_entries \
             SET is_reversed = TRUE, reversed_by = $2, reversal_date = $3 \
             WHERE id = $1 AND is_reversed = FALSE \
             RETURNING {ENTRY_COLUMNS}"
        );

        let updated = sqlx::query_as::<_, LedgerEntryRow>(&sql)
            .bind(id)
            .bind(reversed_by)
            .bind(reversal_date)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| DatabaseError::from(&e))?;

        let outcome = match updated {
            Some(row) => ReversalCas::Applied(row),
            None => {
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS (SELECT 1 FROM ledger_entries WHERE id = $1)",
                )
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| DatabaseError::from(&e))?;

                if exists {
                    ReversalCas::AlreadyReversed
                } else {
                    ReversalCas::Missing
                }
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }

    /// Retrieves every entry for one student, reversed entries included
    ///
    /// # Returns
    ///
    /// Entries ordered by effective date descending, then entry number
    /// descending
    pub async fn find_by_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<LedgerEntryRow>, DatabaseError> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries \
             WHERE student_id = $1 \
             ORDER BY entry_date DESC, entry_number DESC"
        );

        sqlx::query_as::<_, LedgerEntryRow>(&sql)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from(&e))
    }

    /// Searches entries matching the filter, returning one page plus the
    /// total matching row count
    ///
    /// # Arguments
    ///
    /// * `filter` - Filters plus limit/offset, already clamped by the caller
    pub async fn search(
        &self,
        filter: &EntryFilter,
    ) -> Result<(Vec<LedgerEntryRow>, u64), DatabaseError> {
        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM ledger_entries");
        push_filters(&mut count_builder, filter);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from(&e))?;

        let mut builder =
            QueryBuilder::new(format!("SELECT {ENTRY_COLUMNS} FROM ledger_entries"));
        push_filters(&mut builder, filter);
        builder.push(" ORDER BY entry_date DESC, entry_number DESC LIMIT ");
        builder.push_bind(filter.limit);
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset);

        let rows = builder
            .build_query_as::<LedgerEntryRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from(&e))?;

        Ok((rows, total as u64))
    }

    /// Computes the raw debit/credit sums over one student's non-reversed
    /// entries
    pub async fn student_totals(
        &self,
        student_id: Uuid,
    ) -> Result<StudentTotalsRow, DatabaseError> {
        sqlx::query_as::<_, StudentTotalsRow>(
            r#"
            SELECT
                COALESCE(SUM(debit), 0) AS debit_total,
                COALESCE(SUM(credit), 0) AS credit_total,
                COUNT(*) AS entry_count
            FROM ledger_entries
            WHERE student_id = $1 AND is_reversed = FALSE
            "#,
        )
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))
    }

    /// Aggregates non-reversed entries by entry type
    ///
    /// # Returns
    ///
    /// One row per entry type present on the ledger, ordered by type tag
    pub async fn stats_by_type(&self) -> Result<Vec<TypeAggregateRow>, DatabaseError> {
        sqlx::query_as::<_, TypeAggregateRow>(
            r#"
            SELECT
                entry_type,
                COUNT(*) AS entry_count,
                COALESCE(SUM(debit), 0) AS debit_total,
                COALESCE(SUM(credit), 0) AS credit_total
            FROM ledger_entries
            WHERE is_reversed = FALSE
            GROUP BY entry_type
            ORDER BY entry_type
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))
    }

    /// Counts distinct students with at least one non-reversed entry
    pub async fn active_student_count(&self) -> Result<i64, DatabaseError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT student_id) FROM ledger_entries WHERE is_reversed = FALSE",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))
    }

    /// Returns the highest entry number ever persisted, or `None` on an
    /// empty ledger
    ///
    /// Reversed entries count; entry numbers are never reused.
    pub async fn max_entry_number(&self) -> Result<Option<i64>, DatabaseError> {
        sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(entry_number) FROM ledger_entries")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from(&e))
    }

    /// Checks whether any entry records the given source reference under the
    /// given type tag
    pub async fn reference_exists(
        &self,
        reference_id: Uuid,
        entry_type: &str,
    ) -> Result<bool, DatabaseError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (\
                SELECT 1 FROM ledger_entries \
                WHERE reference_id = $1 AND entry_type = $2\
             )",
        )
        .bind(reference_id)
        .bind(entry_type)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))
    }
}

/// Appends the filter's WHERE clauses to a query under construction
///
/// Shared between the page query and its COUNT companion so both always
/// see the same predicate.
fn push_filters<'args>(builder: &mut QueryBuilder<'args, Postgres>, filter: &'args EntryFilter) {
    let mut clause = " WHERE ";

    if let Some(student_id) = filter.student_id {
        builder.push(clause).push("student_id = ").push_bind(student_id);
        clause = " AND ";
    }
    if let Some(ref entry_type) = filter.entry_type {
        builder
            .push(clause)
            .push("entry_type = ")
            .push_bind(entry_type.as_str());
        clause = " AND ";
    }
    if let Some(date_from) = filter.date_from {
        builder.push(clause).push("entry_date >= ").push_bind(date_from);
        clause = " AND ";
    }
    if let Some(date_to) = filter.date_to {
        builder.push(clause).push("entry_date <= ").push_bind(date_to);
        clause = " AND ";
    }
    if let Some(ref term) = filter.search {
        let pattern = format!("%{}%", escape_like(term));
        builder
            .push(clause)
            .push("(description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR notes ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Escapes LIKE metacharacters so search terms match literally
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// =============================================================================
// Type definitions
// =============================================================================

/// Outcome of the reversal compare-and-set
#[derive(Debug, Clone)]
pub enum ReversalCas {
    /// The stamp was applied; carries the updated row
    Applied(LedgerEntryRow),
    /// The entry exists but was reversed earlier
    AlreadyReversed,
    /// No entry with the given id exists
    Missing,
}

/// Filter parameters for searching ledger entries
///
/// Raw form of the domain query; the adapter translates typed identifiers
/// and tags before handing the filter down.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Restrict to one student
    pub student_id: Option<Uuid>,
    /// Restrict to one entry type tag
    pub entry_type: Option<String>,
    /// Only entries on or after this date
    pub date_from: Option<DateTime<Utc>>,
    /// Only entries on or before this date
    pub date_to: Option<DateTime<Utc>>,
    /// Case-insensitive match against description and notes
    pub search: Option<String>,
    /// Page size
    pub limit: i64,
    /// Row offset of the page
    pub offset: i64,
}

// =============================================================================
// Row types
// =============================================================================

/// Database row for a ledger entry
///
/// Enum tags are persisted as their canonical string forms and parsed back
/// through the domain's `FromStr` implementations at the adapter boundary,
/// so the tag vocabulary has a single definition.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LedgerEntryRow {
    pub id: Uuid,
    pub student_id: Uuid,
    pub entry_number: i64,
    pub entry_type: String,
    pub description: String,
    pub entry_date: DateTime<Utc>,
    pub reference_id: Option<Uuid>,
    pub debit: Decimal,
    pub credit: Decimal,
    pub balance: Decimal,
    pub balance_type: String,
    pub is_reversed: bool,
    pub reversed_by: Option<String>,
    pub reversal_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate row for one student's non-reversed sums
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StudentTotalsRow {
    pub debit_total: Decimal,
    pub credit_total: Decimal,
    pub entry_count: i64,
}

/// Aggregate row for one entry type's non-reversed sums
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TypeAggregateRow {
    pub entry_type: String,
    pub entry_count: i64,
    pub debit_total: Decimal,
    pub credit_total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_handles_metacharacters() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like(r"c:\temp"), r"c:\\temp");
        assert_eq!(escape_like("plain"), "plain");
    }
}
