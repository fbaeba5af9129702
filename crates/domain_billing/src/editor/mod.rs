//! Billing record editor
//!
//! Applies a full set of proposed collection values to one billing record
//! and records an audit entry for every column whose rendered value
//! changed. The row write and its audit entries commit together or not at
//! all.
//!
//! # Update sequence
//!
//! 1. Read the record; unknown keys fail with `NotFound`.
//! 2. Validate the proposal against the invoice amount, before any
//!    transaction is opened.
//! 3. Open a unit of work and lock the row. The ceiling is checked again
//!    against the locked row so a concurrent change to the invoice amount
//!    cannot slip through.
//! 4. Diff the locked values against the proposal.
//! 5. Write all columns, stamp `collection_timestamp`, append the audit
//!    entries, commit.
//!
//! Any failure after step 2 rolls the unit of work back before the error
//! is returned.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use core_kernel::{Money, RecordKey};

use crate::audit::{AuditLogEntry, NewAuditEntry};
use crate::diff::diff;
use crate::error::EditorError;
use crate::ports::{BillingStore, BillingUnitOfWork};
use crate::record::{BillingRecord, EditableFields};
use crate::validation::{validate_proposal, CollectionCheck};


/// Result of a successful update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    pub key: RecordKey,
    /// One entry per changed column; empty for a no-op update
    pub changes: Vec<AuditLogEntry>,
    pub collection_timestamp: DateTime<Utc>,
    pub total_collection: Money,
    pub due_amount: Money,
}

/// Reads and edits billing records through a [`BillingStore`]
#[derive(Clone)]
pub struct BillingRecordEditor {
    store: Arc<dyn BillingStore>,
}

impl BillingRecordEditor {
    pub fn new(store: Arc<dyn BillingStore>) -> Self {
        Self { store }
    }

    /// Looks up a record by key
    #[instrument(skip_all, fields(dealer_code = %key.dealer_code, gst_invoice_no = %key.gst_invoice_no))]
    pub async fn fetch(&self, key: &RecordKey) -> Result<BillingRecord, EditorError> {
        self.store
            .fetch(key)
            .await?
            .ok_or_else(|| EditorError::NotFound(key.clone()))
    }

    /// Audit history of a record, newest first
    #[instrument(skip_all, fields(dealer_code = %key.dealer_code, gst_invoice_no = %key.gst_invoice_no))]
    pub async fn history(&self, key: &RecordKey) -> Result<Vec<AuditLogEntry>, EditorError> {
        Ok(self.store.history(key).await?)
    }

    /// Replaces the editable fields of a record
    ///
    /// `proposed` is the complete new state: unset fields are cleared.
    #[instrument(
        skip_all,
        fields(
            dealer_code = %key.dealer_code,
            gst_invoice_no = %key.gst_invoice_no,
            actor = %actor,
        )
    )]
    pub async fn update(
        &self,
        key: &RecordKey,
        proposed: EditableFields,
        actor: &str,
    ) -> Result<UpdateOutcome, EditorError> {
        let actor = actor.trim();
        if actor.is_empty() {
            return Err(EditorError::Validation("actor must not be blank".to_string()));
        }

        let current = self.fetch(key).await?;
        validate_proposal(&proposed, current.invoice_amount).map_err(|e| {
            warn!(error = %e, "Rejected collection update");
            e
        })?;

        let mut uow = self.store.begin().await.map_err(|e| {
            error!(error = ?e, "Could not open transaction");
            EditorError::Persistence(e)
        })?;

        match apply(&mut uow, key, &proposed, actor).await {
            Ok((check, changes, collected_at)) => {
                if let Err(e) = uow.commit().await {
                    error!(error = ?e, "Commit failed");
                    return Err(EditorError::Persistence(e));
                }
                info!(changed_fields = changes.len(), "Collection update committed");
                Ok(UpdateOutcome {
                    key: key.clone(),
                    changes,
                    collection_timestamp: collected_at,
                    total_collection: check.collected,
                    due_amount: check.due_amount(),
                })
            }
            Err(e) => {
                if let Err(rollback_error) = uow.rollback().await {
                    error!(error = ?rollback_error, "Rollback failed");
                }
                if e.is_validation() {
                    warn!(error = %e, "Rejected collection update");
                } else if !e.is_not_found() {
                    error!(error = ?e, "Collection update rolled back");
                }
                Err(e)
            }
        }
    }
}

/// Steps that run inside the unit of work
async fn apply(
    uow: &mut Box<dyn BillingUnitOfWork>,
    key: &RecordKey,
    proposed: &EditableFields,
    actor: &str,
) -> Result<(CollectionCheck, Vec<AuditLogEntry>, DateTime<Utc>), EditorError> {
    let locked = uow
        .lock_for_update(key)
        .await?
        .ok_or_else(|| EditorError::NotFound(key.clone()))?;

    let check = validate_proposal(proposed, locked.invoice_amount)?;

    let entries: Vec<NewAuditEntry> = diff(&locked.fields, proposed)
        .into_iter()
        .map(|change| NewAuditEntry::from_change(actor, key, change))
        .collect();

    let collected_at = Utc::now();
    uow.write_fields(locked.row_id, proposed, collected_at).await?;

    let recorded = if entries.is_empty() {
        Vec::new()
    } else {
        uow.append_audit(&entries).await?
    };

    Ok((check, recorded, collected_at))
}
