//! Bulk loading of billing rows from dealer exports
//!
//! Dealer management systems export invoice dates as `YYYYMMDD`; newer
//! exports use `YYYY-MM-DD`. A date that matches neither is loaded as
//! empty rather than rejecting the row.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ImportBatchId, RecordKey};

use crate::error::BillingError;
use crate::record::{parse_date_input, BillingRecord, EditableFields};

/// One row as submitted for import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRow {
    pub dealer_code: String,
    pub gst_invoice_no: String,
    #[serde(default)]
    pub gst_invoice_date: Option<String>,
    #[serde(default)]
    pub ro_date: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub vehicle_reg_no: Option<String>,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub invoice_amt: Option<Decimal>,
    #[serde(default)]
    pub cust_labor: Option<Decimal>,
    #[serde(default)]
    pub ins_labor: Option<Decimal>,
}

/// A validated row ready to insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBillingRow {
    pub key: RecordKey,
    pub gst_invoice_date: Option<NaiveDate>,
    pub ro_date: Option<NaiveDate>,
    pub customer_name: Option<String>,
    pub vehicle_reg_no: Option<String>,
    pub vin: Option<String>,
    pub invoice_amount: Option<Decimal>,
    pub cust_labor: Option<Decimal>,
    pub ins_labor: Option<Decimal>,
}

impl NewBillingRow {
    /// The record this row becomes once stored
    pub fn into_record(self, uploaded_by: &str) -> BillingRecord {
        BillingRecord {
            key: self.key,
            gst_invoice_date: self.gst_invoice_date,
            ro_date: self.ro_date,
            customer_name: self.customer_name,
            vehicle_reg_no: self.vehicle_reg_no,
            vin: self.vin,
            invoice_amount: self.invoice_amount,
            cust_labor: self.cust_labor,
            ins_labor: self.ins_labor,
            fields: EditableFields::default(),
            collection_timestamp: None,
            uploaded_by: Some(uploaded_by.to_string()),
        }
    }
}

/// Outcome of a committed import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub batch_id: ImportBatchId,
    pub rows_inserted: u64,
    pub uploaded_by: String,
}

/// Parses an export date: `YYYYMMDD`, then `YYYY-MM-DD` (time ignored)
pub fn parse_legacy_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.len() == 8 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(trimmed, "%Y%m%d").ok();
    }
    parse_date_input(trimmed).ok().flatten()
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validates a batch, reporting the first bad row (1-based)
pub fn prepare_batch(rows: Vec<ImportRow>) -> Result<Vec<NewBillingRow>, BillingError> {
    if rows.is_empty() {
        return Err(BillingError::EmptyImport);
    }

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            let key = RecordKey::parse(&row.dealer_code, &row.gst_invoice_no).map_err(|e| {
                BillingError::InvalidImportRow {
                    row: index + 1,
                    message: e.to_string(),
                }
            })?;
            Ok(NewBillingRow {
                key,
                gst_invoice_date: row.gst_invoice_date.as_deref().and_then(parse_legacy_date),
                ro_date: row.ro_date.as_deref().and_then(parse_legacy_date),
                customer_name: clean(row.customer_name),
                vehicle_reg_no: clean(row.vehicle_reg_no),
                vin: clean(row.vin),
                invoice_amount: row.invoice_amt,
                cust_labor: row.cust_labor,
                ins_labor: row.ins_labor,
            })
        })
        .collect()
}
