//! Domain Adapters
//!
//! This module provides adapter implementations for domain ports,
//! connecting domain interfaces to the PostgreSQL database layer.
//!
//! # Architecture
//!
//! Each domain has a corresponding adapter that:
//! - Implements the domain's port trait
//! - Translates between domain models and database row types
//! - Uses the repository layer for database operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresLedgerStore;
//! use domain_ledger::LedgerStorePort;
//!
//! let store = PostgresLedgerStore::new(pool);
//! let entry = store.entry(entry_id, None).await?;
//! ```

pub mod ledger;

pub use ledger::PostgresLedgerStore;
