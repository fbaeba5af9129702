//! Billing domain services
//!
//! Read-side operations (search, reports) and bulk loading. Edits go
//! through [`crate::editor::BillingRecordEditor`] instead.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument};

use core_kernel::ImportBatchId;

use crate::error::BillingError;
use crate::import::{prepare_batch, ImportRow, ImportSummary};
use crate::ports::BillingStore;
use crate::record::BillingRecord;
use crate::reports::{DailySummary, OutstandingEntry, OutstandingFilter, RecordSearch, SEARCH_LIMIT};

/// Service for finding records, producing reports and loading new rows
#[derive(Clone)]
pub struct BillingQueryService {
    store: Arc<dyn BillingStore>,
}

impl BillingQueryService {
    pub fn new(store: Arc<dyn BillingStore>) -> Self {
        Self { store }
    }

    /// Finds records for the collections screen
    ///
    /// Returns at most [`SEARCH_LIMIT`] records, newest invoice first.
    #[instrument(skip(self))]
    pub async fn search(&self, search: &RecordSearch) -> Result<Vec<BillingRecord>, BillingError> {
        Ok(self.store.search(search, SEARCH_LIMIT).await?)
    }

    /// Customer outstanding report
    #[instrument(skip(self))]
    pub async fn outstanding(
        &self,
        filter: &OutstandingFilter,
    ) -> Result<Vec<OutstandingEntry>, BillingError> {
        let records = self.store.outstanding(filter).await?;
        Ok(records.iter().map(OutstandingEntry::from).collect())
    }

    /// Vehicles serviced and labour billed on one day
    #[instrument(skip(self))]
    pub async fn daily_summary(&self, date: NaiveDate) -> Result<DailySummary, BillingError> {
        Ok(self.store.daily_summary(date).await?)
    }

    /// Validates and inserts an import batch in one transaction
    ///
    /// # Errors
    ///
    /// Returns `InvalidImportRow` for the first row without a usable key;
    /// nothing is inserted in that case.
    #[instrument(skip(self, rows), fields(rows = rows.len(), uploaded_by = %uploaded_by))]
    pub async fn import(
        &self,
        rows: Vec<ImportRow>,
        uploaded_by: &str,
    ) -> Result<ImportSummary, BillingError> {
        let prepared = prepare_batch(rows)?;
        let batch_id = ImportBatchId::new();
        let rows_inserted = self.store.insert_rows(&prepared, uploaded_by).await?;
        info!(%batch_id, rows_inserted, "Billing rows imported");
        Ok(ImportSummary {
            batch_id,
            rows_inserted,
            uploaded_by: uploaded_by.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::InMemoryBillingStore;
    use core_kernel::RecordKey;
    use rust_decimal_macros::dec;

    fn row(invoice: &str, date: &str) -> ImportRow {
        ImportRow {
            dealer_code: "D001".to_string(),
            gst_invoice_no: invoice.to_string(),
            gst_invoice_date: Some(date.to_string()),
            vehicle_reg_no: Some("KA05MN4321".to_string()),
            vin: Some(format!("VIN-{invoice}")),
            invoice_amt: Some(dec!(2000)),
            cust_labor: Some(dec!(400)),
            ins_labor: Some(dec!(100)),
            ..Default::default()
        }
    }

    async fn service() -> (BillingQueryService, InMemoryBillingStore) {
        let store = InMemoryBillingStore::new();
        (BillingQueryService::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_import_then_search() {
        let (service, store) = service().await;
        let summary = service
            .import(vec![row("INV-1", "20240601"), row("INV-2", "2024-06-02")], "loader")
            .await
            .unwrap();
        assert_eq!(summary.rows_inserted, 2);

        let key = RecordKey::parse("D001", "INV-1").unwrap();
        let stored = store.rows_for(&key).await;
        assert_eq!(stored[0].uploaded_by.as_deref(), Some("loader"));

        let found = service
            .search(&RecordSearch::new(None, Some("ka05".to_string()), None))
            .await
            .unwrap();
        let order: Vec<&str> = found.iter().map(|r| r.key.gst_invoice_no.as_str()).collect();
        assert_eq!(order, vec!["INV-2", "INV-1"]);
    }

    #[tokio::test]
    async fn test_search_is_capped() {
        let (service, _) = service().await;
        let rows: Vec<ImportRow> = (0..60).map(|i| row(&format!("INV-{i}"), "20240601")).collect();
        service.import(rows, "loader").await.unwrap();

        let found = service.search(&RecordSearch::default()).await.unwrap();
        assert_eq!(found.len(), SEARCH_LIMIT);
    }

    #[tokio::test]
    async fn test_invalid_batch_inserts_nothing() {
        let (service, _) = service().await;
        let mut bad = row("INV-2", "20240601");
        bad.dealer_code = String::new();

        let err = service.import(vec![row("INV-1", "20240601"), bad], "loader").await.unwrap_err();
        assert!(err.is_validation());
        assert!(service.search(&RecordSearch::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_outstanding_and_daily_summary() {
        let (service, _) = service().await;
        service
            .import(vec![row("INV-1", "20240601"), row("INV-2", "20240601")], "loader")
            .await
            .unwrap();

        let report = service.outstanding(&OutstandingFilter::default()).await.unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].due_amount, core_kernel::Money::new(dec!(2000)));

        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let summary = service.daily_summary(date).await.unwrap();
        assert_eq!(summary.vehicles_serviced, 2);
        assert_eq!(summary.labour_revenue, core_kernel::Money::new(dec!(1000)));
    }
}
