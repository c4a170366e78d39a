//! Repository implementations for domain entities
//!
//! This module provides concrete repository implementations that handle
//! database access for each domain aggregate. Repositories encapsulate
//! SQL queries and map between database rows and raw column types; the
//! adapter layer above converts those rows into domain types.
//!
//! # Architecture
//!
//! Each repository follows these principles:
//! - Append-only writes; reversal is the single guarded update
//! - Runtime-checked queries over `FromRow` mappings
//! - Dynamic filters assembled with `QueryBuilder`
//! - Transaction support for multi-statement operations

pub mod ledger;

pub use ledger::LedgerRepository;
