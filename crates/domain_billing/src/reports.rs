//! Search and report filters over billing records
//!
//! Filters carry their own in-memory `matches` so every store applies the
//! same rules: substring filters are case-insensitive and literal, and
//! results are ordered by invoice date, newest first, undated rows last.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{Money, RecordKey};

use crate::error::BillingError;
use crate::record::{BillingRecord, TypeOfDue};

/// Maximum rows returned by a record search
pub const SEARCH_LIMIT: usize = 50;

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

/// Sorts newest invoice first, rows without a date last
pub fn sort_by_invoice_date_desc(records: &mut [BillingRecord]) {
    records.sort_by(|a, b| match (a.gst_invoice_date, b.gst_invoice_date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Criteria for the "view and update collections" search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSearch {
    /// Substring of the GST invoice number
    pub invoice_no: Option<String>,
    /// Substring of the vehicle registration number
    pub vehicle_reg_no: Option<String>,
    /// Exact GST invoice date
    pub invoice_date: Option<NaiveDate>,
}

impl RecordSearch {
    pub fn new(
        invoice_no: Option<String>,
        vehicle_reg_no: Option<String>,
        invoice_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            invoice_no: clean(invoice_no),
            vehicle_reg_no: clean(vehicle_reg_no),
            invoice_date,
        }
    }

    pub fn matches(&self, record: &BillingRecord) -> bool {
        if let Some(ref term) = self.invoice_no {
            if !contains_ignore_case(Some(record.key.gst_invoice_no.as_str()), term) {
                return false;
            }
        }
        if let Some(ref term) = self.vehicle_reg_no {
            if !contains_ignore_case(record.vehicle_reg_no.as_deref(), term) {
                return false;
            }
        }
        if let Some(date) = self.invoice_date {
            if record.gst_invoice_date != Some(date) {
                return false;
            }
        }
        true
    }
}

/// Inclusive invoice-date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, BillingError> {
        if from > to {
            return Err(BillingError::InvalidFilter(format!(
                "date range starts after it ends ({from} > {to})"
            )));
        }
        Ok(Self { from, to })
    }

    /// Both bounds or neither
    pub fn from_bounds(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Option<Self>, BillingError> {
        match (from, to) {
            (Some(from), Some(to)) => Self::new(from, to).map(Some),
            (None, None) => Ok(None),
            _ => Err(BillingError::InvalidFilter(
                "both from and to dates are required for a date range".to_string(),
            )),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Filter for the customer outstanding report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutstandingFilter {
    /// Substring of the dealer code
    pub dealer_code: Option<String>,
    pub period: Option<DateRange>,
}

impl OutstandingFilter {
    pub fn new(dealer_code: Option<String>, period: Option<DateRange>) -> Self {
        Self {
            dealer_code: clean(dealer_code),
            period,
        }
    }

    pub fn matches(&self, record: &BillingRecord) -> bool {
        if !record.due_amount().is_positive() {
            return false;
        }
        if let Some(ref term) = self.dealer_code {
            if !contains_ignore_case(Some(record.key.dealer_code.as_str()), term) {
                return false;
            }
        }
        if let Some(period) = self.period {
            match record.gst_invoice_date {
                Some(date) if period.contains(date) => {}
                _ => return false,
            }
        }
        true
    }
}

/// One line of the customer outstanding report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutstandingEntry {
    pub key: RecordKey,
    pub customer_name: Option<String>,
    pub gst_invoice_date: Option<NaiveDate>,
    pub invoice_amount: Money,
    pub total_collection: Money,
    pub due_amount: Money,
    pub type_of_due: Option<TypeOfDue>,
    pub vehicle_reg_no: Option<String>,
}

impl From<&BillingRecord> for OutstandingEntry {
    fn from(record: &BillingRecord) -> Self {
        Self {
            key: record.key.clone(),
            customer_name: record.customer_name.clone(),
            gst_invoice_date: record.gst_invoice_date,
            invoice_amount: record.invoice_ceiling(),
            total_collection: record.total_collection(),
            due_amount: record.due_amount(),
            type_of_due: record.fields.type_of_due.clone(),
            vehicle_reg_no: record.vehicle_reg_no.clone(),
        }
    }
}

/// Vehicles serviced and labour billed on one invoice date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Distinct VINs invoiced that day
    pub vehicles_serviced: u64,
    /// Customer plus insurance labour
    pub labour_revenue: Money,
}

impl DailySummary {
    /// Computes the summary over an in-memory set of records
    pub fn from_records<'a, I>(date: NaiveDate, records: I) -> Self
    where
        I: IntoIterator<Item = &'a BillingRecord>,
    {
        let mut vins = std::collections::HashSet::new();
        let mut labour_revenue = Money::zero();
        for record in records
            .into_iter()
            .filter(|r| r.gst_invoice_date == Some(date))
        {
            if let Some(ref vin) = record.vin {
                vins.insert(vin.clone());
            }
            labour_revenue = labour_revenue + record.labour_revenue();
        }
        Self {
            date,
            vehicles_serviced: vins.len() as u64,
            labour_revenue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EditableFields;
    use rust_decimal_macros::dec;

    fn record(dealer: &str, invoice: &str, date: Option<NaiveDate>) -> BillingRecord {
        BillingRecord {
            key: RecordKey::parse(dealer, invoice).unwrap(),
            gst_invoice_date: date,
            ro_date: None,
            customer_name: Some("Asha Rao".to_string()),
            vehicle_reg_no: Some("KA01AB1234".to_string()),
            vin: Some(format!("VIN-{invoice}")),
            invoice_amount: Some(dec!(1000)),
            cust_labor: Some(dec!(300)),
            ins_labor: None,
            fields: EditableFields::default(),
            collection_timestamp: None,
            uploaded_by: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let search = RecordSearch::new(Some("inv-1".to_string()), Some("ka01".to_string()), None);
        assert!(search.matches(&record("D001", "INV-100", None)));
        assert!(!search.matches(&record("D001", "INV-200", None)));
    }

    #[test]
    fn test_blank_search_terms_are_ignored() {
        let search = RecordSearch::new(Some("  ".to_string()), None, None);
        assert_eq!(search, RecordSearch::default());
    }

    #[test]
    fn test_sort_newest_first_undated_last() {
        let mut records = vec![
            record("D001", "A", None),
            record("D001", "B", Some(day(1))),
            record("D001", "C", Some(day(3))),
        ];
        sort_by_invoice_date_desc(&mut records);
        let order: Vec<&str> = records.iter().map(|r| r.key.gst_invoice_no.as_str()).collect();
        assert_eq!(order, vec!["C", "B", "A"]);
    }

    #[test]
    fn test_date_range_requires_both_bounds() {
        assert!(DateRange::from_bounds(Some(day(1)), None).is_err());
        assert!(DateRange::from_bounds(Some(day(5)), Some(day(1))).is_err());
        assert_eq!(DateRange::from_bounds(None, None).unwrap(), None);
    }

    #[test]
    fn test_outstanding_excludes_settled_records() {
        let filter = OutstandingFilter::new(Some("d00".to_string()), None);
        let mut settled = record("D001", "INV-1", Some(day(1)));
        settled.fields.receipt_amount_1 = Some(dec!(1000));
        assert!(!filter.matches(&settled));
        assert!(filter.matches(&record("D001", "INV-2", Some(day(1)))));
    }

    #[test]
    fn test_outstanding_period_excludes_undated() {
        let period = DateRange::new(day(1), day(30)).unwrap();
        let filter = OutstandingFilter::new(None, Some(period));
        assert!(!filter.matches(&record("D001", "INV-1", None)));
        assert!(filter.matches(&record("D001", "INV-1", Some(day(30)))));
    }

    #[test]
    fn test_daily_summary_counts_distinct_vins() {
        let mut repeat = record("D002", "INV-100", Some(day(2)));
        repeat.ins_labor = Some(dec!(50));
        let records = vec![
            record("D001", "INV-100", Some(day(2))),
            repeat,
            record("D001", "INV-101", Some(day(2))),
            record("D001", "INV-102", Some(day(3))),
        ];
        let summary = DailySummary::from_records(day(2), &records);
        assert_eq!(summary.vehicles_serviced, 2);
        assert_eq!(summary.labour_revenue, Money::new(dec!(950)));
    }
}
