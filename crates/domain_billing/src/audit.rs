//! Append-only audit trail of collection edits

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AuditEntryId, RecordKey};

use crate::diff::FieldChange;
use crate::record::EditableField;

/// An audit row waiting to be written
///
/// The timestamp is not part of it; the store assigns it at write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub id: AuditEntryId,
    pub actor: String,
    pub key: RecordKey,
    pub field: EditableField,
    pub old_value: String,
    pub new_value: String,
}

impl NewAuditEntry {
    pub fn from_change(actor: &str, key: &RecordKey, change: FieldChange) -> Self {
        Self {
            id: AuditEntryId::new(),
            actor: actor.to_string(),
            key: key.clone(),
            field: change.field,
            old_value: change.old_value,
            new_value: change.new_value,
        }
    }
}

/// A persisted audit row
///
/// `changed_field` is plain text because rows written before the editable
/// column set was fixed may name columns that no longer exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: AuditEntryId,
    pub actor: String,
    pub key: RecordKey,
    pub changed_field: String,
    pub old_value: String,
    pub new_value: String,
    pub changed_at: DateTime<Utc>,
}

impl AuditLogEntry {
    /// Stamps a pending entry with its write time
    pub fn recorded(entry: NewAuditEntry, changed_at: DateTime<Utc>) -> Self {
        Self {
            id: entry.id,
            actor: entry.actor,
            key: entry.key,
            changed_field: entry.field.column_name().to_string(),
            old_value: entry.old_value,
            new_value: entry.new_value,
            changed_at,
        }
    }

    /// The editable column this entry refers to, if it is still one
    pub fn field(&self) -> Option<EditableField> {
        EditableField::from_column_name(&self.changed_field)
    }
}
