//! Core Kernel - Foundational types shared by the service billing crates
//!
//! This crate provides the building blocks used across the workspace:
//! - Rupee amounts with exact decimal arithmetic
//! - The composite record key (dealer code + GST invoice number)
//! - Port error taxonomy and health checks for adapters

pub mod money;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{Money, MoneyError};
pub use identifiers::{
    DealerCode, GstInvoiceNo, RecordKey, AuditEntryId, ImportBatchId,
};
pub use error::CoreError;
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
