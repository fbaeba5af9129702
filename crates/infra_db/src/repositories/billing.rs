//! Service billing repository
//!
//! Database access for `fact_service_billing` and its append-only audit
//! log. Read queries run against the pool; the edit path uses the
//! connection-scoped functions at the bottom of this module inside a
//! caller-owned transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::DatabaseError;

/// Columns selected for a full billing row
const BILLING_COLUMNS: &str = r#"
    billing_id, dealer_code, gst_invoice_no, gst_invoice_date, ro_date,
    customer_name, vehicle_reg_no, vin, invoice_amt, cust_labor, ins_labor,
    receipt_number_1, receipt_date_1, source_of_receipt_1, receipt_amount_1,
    receipt_number_2, receipt_date_2, source_of_receipt_2, receipt_amount_2,
    insurance_receipt_number, insurance_receipt_date, insurance_receipt_amount,
    advance_collected, discount_given, type_of_due, claim_number, policy_number,
    claim_remarks, any_other_remarks, collection_timestamp, user_id
"#;

/// Rows whose stored key trims to blank cannot be addressed and are skipped
const HAS_KEY: &str = "btrim(dealer_code) <> '' AND btrim(gst_invoice_no) <> ''";

/// Newest invoice first; ties and undated rows fall back to load order
const ORDER_NEWEST_FIRST: &str = " ORDER BY gst_invoice_date DESC NULLS LAST, billing_id";

/// Rows per INSERT statement during an import
const IMPORT_CHUNK_SIZE: usize = 500;

/// Escapes LIKE metacharacters and wraps the term for a substring match
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// The eighteen user-editable columns
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct EditableColumns {
    pub receipt_number_1: Option<String>,
    pub receipt_date_1: Option<NaiveDate>,
    pub source_of_receipt_1: Option<String>,
    pub receipt_amount_1: Option<Decimal>,
    pub receipt_number_2: Option<String>,
    pub receipt_date_2: Option<NaiveDate>,
    pub source_of_receipt_2: Option<String>,
    pub receipt_amount_2: Option<Decimal>,
    pub insurance_receipt_number: Option<String>,
    pub insurance_receipt_date: Option<NaiveDate>,
    pub insurance_receipt_amount: Option<Decimal>,
    pub advance_collected: Option<Decimal>,
    pub discount_given: Option<Decimal>,
    pub type_of_due: Option<String>,
    pub claim_number: Option<String>,
    pub policy_number: Option<String>,
    pub claim_remarks: Option<String>,
    pub any_other_remarks: Option<String>,
}

/// A full row of `fact_service_billing`
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct BillingRow {
    pub billing_id: i64,
    pub dealer_code: String,
    pub gst_invoice_no: String,
    pub gst_invoice_date: Option<NaiveDate>,
    pub ro_date: Option<NaiveDate>,
    pub customer_name: Option<String>,
    pub vehicle_reg_no: Option<String>,
    pub vin: Option<String>,
    pub invoice_amt: Option<Decimal>,
    pub cust_labor: Option<Decimal>,
    pub ins_labor: Option<Decimal>,
    #[sqlx(flatten)]
    pub editable: EditableColumns,
    pub collection_timestamp: Option<DateTime<Utc>>,
    pub user_id: Option<String>,
}

/// A billing row together with how many rows share its key
#[derive(Debug, Clone, FromRow)]
pub struct KeyedBillingRow {
    #[sqlx(flatten)]
    pub row: BillingRow,
    pub key_rows: i64,
}

/// The lockable part of a row, read inside an edit transaction
#[derive(Debug, Clone, FromRow)]
pub struct LockedRow {
    pub billing_id: i64,
    pub invoice_amt: Option<Decimal>,
    #[sqlx(flatten)]
    pub editable: EditableColumns,
}

/// Row of `service_billing_audit_log`
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AuditRow {
    pub audit_id: Uuid,
    pub username: String,
    pub dealer_code: String,
    pub gst_invoice_no: String,
    pub changed_field: String,
    pub old_value: String,
    pub new_value: String,
    pub changed_at: DateTime<Utc>,
}

/// Audit row to insert; `changed_at` is assigned by the database
#[derive(Debug, Clone)]
pub struct NewAuditRow {
    pub audit_id: Uuid,
    pub username: String,
    pub dealer_code: String,
    pub gst_invoice_no: String,
    pub changed_field: String,
    pub old_value: String,
    pub new_value: String,
}

/// Imported row; editable columns start empty
#[derive(Debug, Clone)]
pub struct NewBillingRowData {
    pub dealer_code: String,
    pub gst_invoice_no: String,
    pub gst_invoice_date: Option<NaiveDate>,
    pub ro_date: Option<NaiveDate>,
    pub customer_name: Option<String>,
    pub vehicle_reg_no: Option<String>,
    pub vin: Option<String>,
    pub invoice_amt: Option<Decimal>,
    pub cust_labor: Option<Decimal>,
    pub ins_labor: Option<Decimal>,
}

/// Aggregates for one invoice date
#[derive(Debug, Clone, FromRow)]
pub struct DailySummaryRow {
    pub vehicles_serviced: i64,
    pub labour_revenue: Decimal,
}

/// Repository for service billing rows and their audit trail
#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    /// Creates a new BillingRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the earliest-loaded row for a key and the number of rows sharing it
    pub async fn fetch_first(
        &self,
        dealer_code: &str,
        gst_invoice_no: &str,
    ) -> Result<Option<KeyedBillingRow>, DatabaseError> {
        let sql = format!(
            "SELECT {BILLING_COLUMNS}, COUNT(*) OVER () AS key_rows \
             FROM fact_service_billing \
             WHERE btrim(dealer_code) = $1 AND btrim(gst_invoice_no) = $2 \
             ORDER BY billing_id LIMIT 1"
        );
        let row = sqlx::query_as::<_, KeyedBillingRow>(&sql)
            .bind(dealer_code)
            .bind(gst_invoice_no)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Substring search on invoice number and registration, exact invoice date
    pub async fn search(
        &self,
        invoice_no: Option<&str>,
        vehicle_reg_no: Option<&str>,
        invoice_date: Option<NaiveDate>,
        limit: i64,
    ) -> Result<Vec<BillingRow>, DatabaseError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {BILLING_COLUMNS} FROM fact_service_billing WHERE {HAS_KEY}"
        ));
        if let Some(term) = invoice_no {
            query
                .push(" AND gst_invoice_no ILIKE ")
                .push_bind(like_pattern(term))
                .push(" ESCAPE '\\'");
        }
        if let Some(term) = vehicle_reg_no {
            query
                .push(" AND vehicle_reg_no ILIKE ")
                .push_bind(like_pattern(term))
                .push(" ESCAPE '\\'");
        }
        if let Some(date) = invoice_date {
            query.push(" AND gst_invoice_date = ").push_bind(date);
        }
        query.push(ORDER_NEWEST_FIRST);
        query.push(" LIMIT ").push_bind(limit);

        let rows = query
            .build_query_as::<BillingRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Rows with a positive amount due
    pub async fn outstanding(
        &self,
        dealer_code: Option<&str>,
        period: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<BillingRow>, DatabaseError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {BILLING_COLUMNS} FROM fact_service_billing \
             WHERE {HAS_KEY} AND due_amount > 0"
        ));
        if let Some(term) = dealer_code {
            query
                .push(" AND dealer_code ILIKE ")
                .push_bind(like_pattern(term))
                .push(" ESCAPE '\\'");
        }
        if let Some((from, to)) = period {
            query
                .push(" AND gst_invoice_date BETWEEN ")
                .push_bind(from)
                .push(" AND ")
                .push_bind(to);
        }
        query.push(ORDER_NEWEST_FIRST);

        let rows = query
            .build_query_as::<BillingRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Distinct VINs and total labour for an invoice date
    pub async fn daily_summary(&self, date: NaiveDate) -> Result<DailySummaryRow, DatabaseError> {
        let row = sqlx::query_as::<_, DailySummaryRow>(
            r#"
            SELECT
                COUNT(DISTINCT vin) AS vehicles_serviced,
                COALESCE(SUM(COALESCE(cust_labor, 0) + COALESCE(ins_labor, 0)), 0)
                    AS labour_revenue
            FROM fact_service_billing
            WHERE gst_invoice_date = $1
            "#,
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Inserts an import batch in a single transaction
    ///
    /// Every row is stamped with `uploaded_by`. Either all rows land or none.
    pub async fn insert_rows(
        &self,
        rows: &[NewBillingRowData],
        uploaded_by: &str,
    ) -> Result<u64, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for chunk in rows.chunks(IMPORT_CHUNK_SIZE) {
            let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO fact_service_billing (\
                 dealer_code, gst_invoice_no, gst_invoice_date, ro_date, customer_name, \
                 vehicle_reg_no, vin, invoice_amt, cust_labor, ins_labor, user_id) ",
            );
            query.push_values(chunk, |mut b, row| {
                b.push_bind(&row.dealer_code)
                    .push_bind(&row.gst_invoice_no)
                    .push_bind(row.gst_invoice_date)
                    .push_bind(row.ro_date)
                    .push_bind(&row.customer_name)
                    .push_bind(&row.vehicle_reg_no)
                    .push_bind(&row.vin)
                    .push_bind(row.invoice_amt)
                    .push_bind(row.cust_labor)
                    .push_bind(row.ins_labor)
                    .push_bind(uploaded_by);
            });
            inserted += query.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Audit entries for a key, newest first
    pub async fn history(
        &self,
        dealer_code: &str,
        gst_invoice_no: &str,
    ) -> Result<Vec<AuditRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT audit_id, username, dealer_code, gst_invoice_no,
                   changed_field, old_value, new_value, changed_at
            FROM service_billing_audit_log
            WHERE btrim(dealer_code) = $1 AND btrim(gst_invoice_no) = $2
            ORDER BY changed_at DESC, audit_id DESC
            "#,
        )
        .bind(dealer_code)
        .bind(gst_invoice_no)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// Reads and row-locks the earliest row for a key
pub async fn lock_for_update(
    conn: &mut PgConnection,
    dealer_code: &str,
    gst_invoice_no: &str,
) -> Result<Option<LockedRow>, DatabaseError> {
    let row = sqlx::query_as::<_, LockedRow>(
        r#"
        SELECT billing_id, invoice_amt,
               receipt_number_1, receipt_date_1, source_of_receipt_1, receipt_amount_1,
               receipt_number_2, receipt_date_2, source_of_receipt_2, receipt_amount_2,
               insurance_receipt_number, insurance_receipt_date, insurance_receipt_amount,
               advance_collected, discount_given, type_of_due, claim_number, policy_number,
               claim_remarks, any_other_remarks
        FROM fact_service_billing
        WHERE btrim(dealer_code) = $1 AND btrim(gst_invoice_no) = $2
        ORDER BY billing_id
        LIMIT 1
        FOR UPDATE
        "#,
    )
    .bind(dealer_code)
    .bind(gst_invoice_no)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

/// Overwrites all editable columns of one row and stamps the collection time
pub async fn update_editable(
    conn: &mut PgConnection,
    billing_id: i64,
    columns: &EditableColumns,
    collected_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE fact_service_billing SET
            receipt_number_1 = $2,
            receipt_date_1 = $3,
            source_of_receipt_1 = $4,
            receipt_amount_1 = $5,
            receipt_number_2 = $6,
            receipt_date_2 = $7,
            source_of_receipt_2 = $8,
            receipt_amount_2 = $9,
            insurance_receipt_number = $10,
            insurance_receipt_date = $11,
            insurance_receipt_amount = $12,
            advance_collected = $13,
            discount_given = $14,
            type_of_due = $15,
            claim_number = $16,
            policy_number = $17,
            claim_remarks = $18,
            any_other_remarks = $19,
            collection_timestamp = $20
        WHERE billing_id = $1
        "#,
    )
    .bind(billing_id)
    .bind(&columns.receipt_number_1)
    .bind(columns.receipt_date_1)
    .bind(&columns.source_of_receipt_1)
    .bind(columns.receipt_amount_1)
    .bind(&columns.receipt_number_2)
    .bind(columns.receipt_date_2)
    .bind(&columns.source_of_receipt_2)
    .bind(columns.receipt_amount_2)
    .bind(&columns.insurance_receipt_number)
    .bind(columns.insurance_receipt_date)
    .bind(columns.insurance_receipt_amount)
    .bind(columns.advance_collected)
    .bind(columns.discount_given)
    .bind(&columns.type_of_due)
    .bind(&columns.claim_number)
    .bind(&columns.policy_number)
    .bind(&columns.claim_remarks)
    .bind(&columns.any_other_remarks)
    .bind(collected_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("BillingRecord", billing_id));
    }
    Ok(())
}

/// Inserts audit rows and returns them in input order with their timestamps
pub async fn insert_audit(
    conn: &mut PgConnection,
    entries: &[NewAuditRow],
) -> Result<Vec<AuditRow>, DatabaseError> {
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO service_billing_audit_log (\
         audit_id, username, dealer_code, gst_invoice_no, changed_field, old_value, new_value) ",
    );
    query.push_values(entries, |mut b, entry| {
        b.push_bind(entry.audit_id)
            .push_bind(&entry.username)
            .push_bind(&entry.dealer_code)
            .push_bind(&entry.gst_invoice_no)
            .push_bind(&entry.changed_field)
            .push_bind(&entry.old_value)
            .push_bind(&entry.new_value);
    });
    query.push(
        " RETURNING audit_id, username, dealer_code, gst_invoice_no, \
         changed_field, old_value, new_value, changed_at",
    );

    let mut rows = query
        .build_query_as::<AuditRow>()
        .fetch_all(&mut *conn)
        .await?;

    // RETURNING order is not guaranteed
    let position = |id: &Uuid| entries.iter().position(|e| &e.audit_id == id);
    rows.sort_by_key(|row| position(&row.audit_id));
    Ok(rows)
}
