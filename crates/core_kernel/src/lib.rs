//! Core Kernel - Foundational types and utilities for the hostel ledger
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money type with precise decimal arithmetic
//! - Strongly-typed identifiers
//! - Ports-and-adapters infrastructure shared by every domain port

pub mod error;
pub mod identifiers;
pub mod money;
pub mod ports;

pub use error::CoreError;
pub use identifiers::{DiscountId, InvoiceId, LedgerEntryId, PaymentId, StudentId};
pub use money::{Money, MoneyError};
pub use ports::{
    AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata, PortError,
};
