//! Billing Domain - Service billing collections
//!
//! This crate holds the rules for recording collections against vehicle
//! service invoices:
//!
//! - **Records**: one billing row per (dealer code, GST invoice number), with
//!   a fixed set of editable collection fields
//! - **Validation**: receipts, insurance receipt, advance and discount may
//!   not add up to more than the invoice amount
//! - **Diff and audit**: every edit appends one audit entry per changed field
//! - **Editor**: applies an edit and its audit entries in one transaction
//! - **Services**: search, outstanding and daily reports, bulk import
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{BillingRecordEditor, EditableFields};
//!
//! let editor = BillingRecordEditor::new(store);
//! let mut fields = editor.fetch(&key).await?.fields;
//! fields.receipt_amount_1 = Some(dec!(10000));
//! let outcome = editor.update(&key, fields, "cashier01").await?;
//! assert_eq!(outcome.changes.len(), 1);
//! ```

pub mod record;
pub mod validation;
pub mod diff;
pub mod audit;
pub mod import;
pub mod reports;
pub mod ports;
pub mod editor;
pub mod services;
pub mod error;

pub use record::{BillingRecord, EditableFields, EditableField, FieldValue, TypeOfDue};
pub use validation::{validate_proposal, CollectionCheck};
pub use diff::{diff, FieldChange};
pub use audit::{AuditLogEntry, NewAuditEntry};
pub use import::{ImportRow, NewBillingRow, ImportSummary};
pub use reports::{
    RecordSearch, DateRange, OutstandingFilter, OutstandingEntry, DailySummary, SEARCH_LIMIT,
};
pub use ports::{BillingStore, BillingUnitOfWork, LockedRecord, CredentialStore, UserCredentials};
pub use editor::{BillingRecordEditor, UpdateOutcome};
pub use services::BillingQueryService;
pub use error::{EditorError, BillingError};
