//! Billing domain errors

use thiserror::Error;

use core_kernel::{Money, PortError, RecordKey};

use crate::record::EditableField;

/// Errors returned by the billing record editor
///
/// A failed update never leaves partial changes behind: validation
/// failures happen before anything is written, and persistence failures
/// are raised only after the transaction has been rolled back.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The five monetary fields add up to more than the invoice amount
    #[error("Collected total {collected} exceeds invoice amount {invoice_amount}")]
    CollectionExceedsInvoice {
        collected: Money,
        invoice_amount: Money,
    },

    /// A single proposed field is not acceptable
    #[error("Invalid value for {field}: {reason}")]
    InvalidField {
        field: EditableField,
        reason: String,
    },

    /// The request itself is malformed (e.g. blank actor)
    #[error("Validation error: {0}")]
    Validation(String),

    /// No billing row matches the key
    #[error("Billing record not found: {0}")]
    NotFound(RecordKey),

    /// The store failed; the transaction was rolled back
    #[error("Persistence error: {0}")]
    Persistence(#[source] PortError),
}

impl EditorError {
    pub fn invalid_field(field: EditableField, reason: impl Into<String>) -> Self {
        EditorError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// True for every rejection caused by the proposed values
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EditorError::CollectionExceedsInvoice { .. }
                | EditorError::InvalidField { .. }
                | EditorError::Validation(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EditorError::NotFound(_))
    }
}

impl From<PortError> for EditorError {
    fn from(error: PortError) -> Self {
        EditorError::Persistence(error)
    }
}

/// Errors from searches, reports and bulk loads
#[derive(Debug, Error)]
pub enum BillingError {
    /// A row of an import batch failed validation
    #[error("Import row {row}: {message}")]
    InvalidImportRow {
        row: usize,
        message: String,
    },

    /// Import batch contained no rows
    #[error("Import batch is empty")]
    EmptyImport,

    /// A search or report filter is inconsistent
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PortError),
}

impl BillingError {
    pub fn is_validation(&self) -> bool {
        !matches!(self, BillingError::Persistence(_))
    }
}
