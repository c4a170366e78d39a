//! Infrastructure Database Layer
//!
//! This crate provides the database infrastructure for the hostel ledger,
//! implementing the ledger store port on PostgreSQL using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern, providing data access abstractions
//! that hide the database implementation details from the domain layer. The
//! `PostgresLedgerStore` adapter implements `LedgerStorePort` on top of the
//! repository and owns all domain-to-row translation.
//!
//! # Append-Only Ledger
//!
//! The ledger table is append-only: rows are inserted once and never updated,
//! with one exception. Reversal stamps an existing row through a guarded
//! compare-and-set, so an entry can move `Active → Reversed` exactly once and
//! the audit trail survives intact.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool_from_url, PostgresLedgerStore};
//!
//! let pool = create_pool_from_url("postgres://localhost/hostel").await?;
//! let store = PostgresLedgerStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, create_pool_from_url, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::PostgresLedgerStore;
