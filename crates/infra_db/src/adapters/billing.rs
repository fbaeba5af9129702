//! PostgreSQL Billing Adapter
//!
//! Implements [`BillingStore`] on top of [`BillingRepository`]. Edits run in
//! a [`PgBillingUnitOfWork`], which owns a database transaction: the row is
//! locked with `SELECT ... FOR UPDATE`, so concurrent edits of the same
//! record queue behind each other until the first commits or rolls back.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use domain_billing::{BillingRecordEditor, BillingStore};
//! use infra_db::adapters::PostgresBillingStore;
//!
//! let store: Arc<dyn BillingStore> = Arc::new(PostgresBillingStore::new(pool));
//! let editor = BillingRecordEditor::new(store);
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument, warn};

use core_kernel::{
    AdapterHealth, AuditEntryId, DomainPort, HealthCheckResult, HealthCheckable, Money, PortError,
    RecordKey,
};
use domain_billing::{
    AuditLogEntry, BillingRecord, BillingStore, BillingUnitOfWork, DailySummary, EditableFields,
    LockedRecord, NewAuditEntry, NewBillingRow, OutstandingFilter, RecordSearch, TypeOfDue,
};

use crate::error::DatabaseError;
use crate::repositories::billing::{
    self as sql, AuditRow, BillingRepository, BillingRow, EditableColumns, NewAuditRow,
    NewBillingRowData,
};

/// PostgreSQL-backed billing store
#[derive(Debug, Clone)]
pub struct PostgresBillingStore {
    repository: BillingRepository,
    pool: PgPool,
}

impl PostgresBillingStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: BillingRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresBillingStore {}

#[async_trait]
impl HealthCheckable for PostgresBillingStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: "postgres-billing-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: "postgres-billing-store".to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl BillingStore for PostgresBillingStore {
    #[instrument(skip_all, fields(key = %key))]
    async fn fetch(&self, key: &RecordKey) -> Result<Option<BillingRecord>, PortError> {
        let Some(found) = self
            .repository
            .fetch_first(key.dealer_code.as_str(), key.gst_invoice_no.as_str())
            .await?
        else {
            return Ok(None);
        };

        if found.key_rows > 1 {
            warn!(
                rows = found.key_rows,
                billing_id = found.row.billing_id,
                "Key is not unique; using the earliest row"
            );
        }
        row_to_record(found.row).map(Some)
    }

    async fn begin(&self) -> Result<Box<dyn BillingUnitOfWork>, PortError> {
        let tx = self.pool.begin().await.map_err(sqlx_to_port_error)?;
        debug!("Opened billing transaction");
        Ok(Box::new(PgBillingUnitOfWork { tx }))
    }

    #[instrument(skip_all, fields(key = %key))]
    async fn history(&self, key: &RecordKey) -> Result<Vec<AuditLogEntry>, PortError> {
        let rows = self
            .repository
            .history(key.dealer_code.as_str(), key.gst_invoice_no.as_str())
            .await?;
        rows.into_iter().map(row_to_audit_entry).collect()
    }

    #[instrument(skip(self))]
    async fn search(
        &self,
        search: &RecordSearch,
        limit: usize,
    ) -> Result<Vec<BillingRecord>, PortError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = self
            .repository
            .search(
                search.invoice_no.as_deref(),
                search.vehicle_reg_no.as_deref(),
                search.invoice_date,
                limit,
            )
            .await?;
        rows.into_iter().map(row_to_record).collect()
    }

    #[instrument(skip(self))]
    async fn outstanding(&self, filter: &OutstandingFilter) -> Result<Vec<BillingRecord>, PortError> {
        let rows = self
            .repository
            .outstanding(
                filter.dealer_code.as_deref(),
                filter.period.map(|p| (p.from, p.to)),
            )
            .await?;
        rows.into_iter().map(row_to_record).collect()
    }

    #[instrument(skip(self))]
    async fn daily_summary(&self, date: NaiveDate) -> Result<DailySummary, PortError> {
        let row = self.repository.daily_summary(date).await?;
        Ok(DailySummary {
            date,
            vehicles_serviced: u64::try_from(row.vehicles_serviced).unwrap_or_default(),
            labour_revenue: Money::new(row.labour_revenue),
        })
    }

    #[instrument(skip_all, fields(row_count = rows.len(), uploaded_by = %uploaded_by))]
    async fn insert_rows(&self, rows: &[NewBillingRow], uploaded_by: &str) -> Result<u64, PortError> {
        let data: Vec<NewBillingRowData> = rows.iter().map(new_row_data).collect();
        Ok(self.repository.insert_rows(&data, uploaded_by).await?)
    }
}

/// An open edit transaction
///
/// Dropping it without `commit` rolls the transaction back.
pub struct PgBillingUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BillingUnitOfWork for PgBillingUnitOfWork {
    async fn lock_for_update(&mut self, key: &RecordKey) -> Result<Option<LockedRecord>, PortError> {
        let row = sql::lock_for_update(
            &mut *self.tx,
            key.dealer_code.as_str(),
            key.gst_invoice_no.as_str(),
        )
        .await?;
        Ok(row.map(|row| LockedRecord {
            row_id: row.billing_id,
            invoice_amount: row.invoice_amt,
            fields: columns_to_fields(row.editable),
        }))
    }

    async fn write_fields(
        &mut self,
        row_id: i64,
        fields: &EditableFields,
        collected_at: DateTime<Utc>,
    ) -> Result<(), PortError> {
        let columns = fields_to_columns(fields);
        sql::update_editable(&mut *self.tx, row_id, &columns, collected_at).await?;
        Ok(())
    }

    async fn append_audit(&mut self, entries: &[NewAuditEntry]) -> Result<Vec<AuditLogEntry>, PortError> {
        let rows: Vec<NewAuditRow> = entries.iter().map(new_audit_row).collect();
        let inserted = sql::insert_audit(&mut *self.tx, &rows).await?;
        inserted.into_iter().map(row_to_audit_entry).collect()
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        self.tx.commit().await.map_err(sqlx_to_port_error)
    }

    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        self.tx.rollback().await.map_err(sqlx_to_port_error)
    }
}

fn sqlx_to_port_error(error: sqlx::Error) -> PortError {
    DatabaseError::from(error).into()
}

fn parse_key(dealer_code: &str, gst_invoice_no: &str) -> Result<RecordKey, PortError> {
    RecordKey::parse(dealer_code, gst_invoice_no).map_err(|e| PortError::Transformation {
        message: format!("stored billing key is unusable: {e}"),
    })
}

fn row_to_record(row: BillingRow) -> Result<BillingRecord, PortError> {
    Ok(BillingRecord {
        key: parse_key(&row.dealer_code, &row.gst_invoice_no)?,
        gst_invoice_date: row.gst_invoice_date,
        ro_date: row.ro_date,
        customer_name: row.customer_name,
        vehicle_reg_no: row.vehicle_reg_no,
        vin: row.vin,
        invoice_amount: row.invoice_amt,
        cust_labor: row.cust_labor,
        ins_labor: row.ins_labor,
        fields: columns_to_fields(row.editable),
        collection_timestamp: row.collection_timestamp,
        uploaded_by: row.user_id,
    })
}

fn columns_to_fields(c: EditableColumns) -> EditableFields {
    EditableFields {
        receipt_number_1: c.receipt_number_1,
        receipt_date_1: c.receipt_date_1,
        source_of_receipt_1: c.source_of_receipt_1,
        receipt_amount_1: c.receipt_amount_1,
        receipt_number_2: c.receipt_number_2,
        receipt_date_2: c.receipt_date_2,
        source_of_receipt_2: c.source_of_receipt_2,
        receipt_amount_2: c.receipt_amount_2,
        insurance_receipt_number: c.insurance_receipt_number,
        insurance_receipt_date: c.insurance_receipt_date,
        insurance_receipt_amount: c.insurance_receipt_amount,
        advance_collected: c.advance_collected,
        discount_given: c.discount_given,
        type_of_due: TypeOfDue::from_stored(c.type_of_due.as_deref()),
        claim_number: c.claim_number,
        policy_number: c.policy_number,
        claim_remarks: c.claim_remarks,
        any_other_remarks: c.any_other_remarks,
    }
}

fn fields_to_columns(f: &EditableFields) -> EditableColumns {
    EditableColumns {
        receipt_number_1: f.receipt_number_1.clone(),
        receipt_date_1: f.receipt_date_1,
        source_of_receipt_1: f.source_of_receipt_1.clone(),
        receipt_amount_1: f.receipt_amount_1,
        receipt_number_2: f.receipt_number_2.clone(),
        receipt_date_2: f.receipt_date_2,
        source_of_receipt_2: f.source_of_receipt_2.clone(),
        receipt_amount_2: f.receipt_amount_2,
        insurance_receipt_number: f.insurance_receipt_number.clone(),
        insurance_receipt_date: f.insurance_receipt_date,
        insurance_receipt_amount: f.insurance_receipt_amount,
        advance_collected: f.advance_collected,
        discount_given: f.discount_given,
        type_of_due: f.type_of_due.as_ref().map(|d| d.as_str().to_string()),
        claim_number: f.claim_number.clone(),
        policy_number: f.policy_number.clone(),
        claim_remarks: f.claim_remarks.clone(),
        any_other_remarks: f.any_other_remarks.clone(),
    }
}

fn new_audit_row(entry: &NewAuditEntry) -> NewAuditRow {
    NewAuditRow {
        audit_id: entry.id.into(),
        username: entry.actor.clone(),
        dealer_code: entry.key.dealer_code.to_string(),
        gst_invoice_no: entry.key.gst_invoice_no.to_string(),
        changed_field: entry.field.column_name().to_string(),
        old_value: entry.old_value.clone(),
        new_value: entry.new_value.clone(),
    }
}

fn row_to_audit_entry(row: AuditRow) -> Result<AuditLogEntry, PortError> {
    Ok(AuditLogEntry {
        id: AuditEntryId::from_uuid(row.audit_id),
        actor: row.username,
        key: parse_key(&row.dealer_code, &row.gst_invoice_no)?,
        changed_field: row.changed_field,
        old_value: row.old_value,
        new_value: row.new_value,
        changed_at: row.changed_at,
    })
}

fn new_row_data(row: &NewBillingRow) -> NewBillingRowData {
    NewBillingRowData {
        dealer_code: row.key.dealer_code.to_string(),
        gst_invoice_no: row.key.gst_invoice_no.to_string(),
        gst_invoice_date: row.gst_invoice_date,
        ro_date: row.ro_date,
        customer_name: row.customer_name.clone(),
        vehicle_reg_no: row.vehicle_reg_no.clone(),
        vin: row.vin.clone(),
        invoice_amt: row.invoice_amount,
        cust_labor: row.cust_labor,
        ins_labor: row.ins_labor,
    }
}
