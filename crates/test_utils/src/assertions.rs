//! Custom Test Assertions
//!
//! Assertion helpers for billing results that print the offending values
//! instead of a bare `assertion failed`.

use core_kernel::Money;
use domain_billing::{AuditLogEntry, EditableField, EditorError};
use rust_decimal::Decimal;

/// Asserts the audit entries name exactly `expected`, in order
pub fn assert_changed_fields(entries: &[AuditLogEntry], expected: &[EditableField]) {
    let actual: Vec<&str> = entries.iter().map(|e| e.changed_field.as_str()).collect();
    let expected: Vec<&str> = expected.iter().map(|f| f.column_name()).collect();
    assert_eq!(
        actual, expected,
        "Changed fields differ: actual={:?}, expected={:?}",
        actual, expected
    );
}

/// Asserts one audit entry records `old` -> `new` for `field`
pub fn assert_audit_entry(entry: &AuditLogEntry, field: EditableField, old: &str, new: &str) {
    assert_eq!(
        entry.changed_field,
        field.column_name(),
        "Expected an entry for {}, got {}",
        field.column_name(),
        entry.changed_field
    );
    assert_eq!(
        (entry.old_value.as_str(), entry.new_value.as_str()),
        (old, new),
        "Unexpected values for {}",
        entry.changed_field
    );
}

/// Asserts every entry was written by `actor`
pub fn assert_all_by_actor(entries: &[AuditLogEntry], actor: &str) {
    for entry in entries {
        assert_eq!(
            entry.actor, actor,
            "Entry for {} written by {}, expected {}",
            entry.changed_field, entry.actor, actor
        );
    }
}

/// Asserts an update was rejected by the collection ceiling with the given amounts
pub fn assert_exceeds_ceiling<T: std::fmt::Debug>(
    result: &Result<T, EditorError>,
    collected: Decimal,
    invoice_amount: Decimal,
) {
    match result {
        Err(EditorError::CollectionExceedsInvoice {
            collected: actual_collected,
            invoice_amount: actual_invoice,
        }) => {
            assert_eq!(*actual_collected, Money::new(collected), "Collected total mismatch");
            assert_eq!(*actual_invoice, Money::new(invoice_amount), "Invoice amount mismatch");
        }
        other => panic!("Expected CollectionExceedsInvoice, got {:?}", other),
    }
}

/// Asserts two amounts are equal after normalization, so `100` equals `100.00`
pub fn assert_amount_eq(actual: Option<Decimal>, expected: Option<Decimal>) {
    assert_eq!(
        actual.map(|d| d.normalize()),
        expected.map(|d| d.normalize()),
        "Amounts differ: actual={:?}, expected={:?}",
        actual,
        expected
    );
}
