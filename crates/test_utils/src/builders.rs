//! Test Data Builders
//!
//! Builders for billing records and editable fields. Tests set only the
//! fields they care about; everything else comes from the fixtures.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::RecordKey;
use domain_billing::{BillingRecord, EditableFields, ImportRow, TypeOfDue};
use fake::faker::name::en::Name;
use fake::Fake;
use rust_decimal::Decimal;

use crate::fixtures::{AmountFixtures, DateFixtures, KeyFixtures, StringFixtures};

/// Builder for [`BillingRecord`]
pub struct BillingRecordBuilder {
    record: BillingRecord,
}

impl Default for BillingRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BillingRecordBuilder {
    /// Starts from the canonical `D001/INV-100` record with nothing collected
    pub fn new() -> Self {
        Self {
            record: BillingRecord {
                key: KeyFixtures::standard(),
                gst_invoice_date: Some(DateFixtures::invoice_date()),
                ro_date: Some(DateFixtures::ro_date()),
                customer_name: Some(StringFixtures::customer_name().to_string()),
                vehicle_reg_no: Some(StringFixtures::vehicle_reg_no().to_string()),
                vin: Some(StringFixtures::vin().to_string()),
                invoice_amount: Some(AmountFixtures::invoice()),
                cust_labor: None,
                ins_labor: None,
                fields: EditableFields::default(),
                collection_timestamp: None,
                uploaded_by: Some(StringFixtures::uploader().to_string()),
            },
        }
    }

    /// Uses a generated customer name
    pub fn with_random_customer(mut self) -> Self {
        self.record.customer_name = Some(Name().fake());
        self
    }

    pub fn with_key(mut self, key: RecordKey) -> Self {
        self.record.key = key;
        self
    }

    /// Parses and sets the key
    pub fn with_codes(self, dealer_code: &str, gst_invoice_no: &str) -> Self {
        self.with_key(RecordKey::parse(dealer_code, gst_invoice_no).unwrap())
    }

    pub fn with_invoice_amount(mut self, amount: Option<Decimal>) -> Self {
        self.record.invoice_amount = amount;
        self
    }

    pub fn with_invoice_date(mut self, date: Option<NaiveDate>) -> Self {
        self.record.gst_invoice_date = date;
        self
    }

    pub fn with_vehicle(mut self, reg_no: &str, vin: &str) -> Self {
        self.record.vehicle_reg_no = Some(reg_no.to_string());
        self.record.vin = Some(vin.to_string());
        self
    }

    pub fn with_labour(mut self, cust_labor: Decimal, ins_labor: Decimal) -> Self {
        self.record.cust_labor = Some(cust_labor);
        self.record.ins_labor = Some(ins_labor);
        self
    }

    pub fn with_customer_name(mut self, name: &str) -> Self {
        self.record.customer_name = Some(name.to_string());
        self
    }

    pub fn with_fields(mut self, fields: EditableFields) -> Self {
        self.record.fields = fields;
        self
    }

    pub fn with_collection_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.record.collection_timestamp = Some(at);
        self
    }

    pub fn build(self) -> BillingRecord {
        self.record
    }

    /// The same record as an import row, for loading through the store
    pub fn build_import_row(self) -> ImportRow {
        let record = self.record;
        ImportRow {
            dealer_code: record.key.dealer_code.to_string(),
            gst_invoice_no: record.key.gst_invoice_no.to_string(),
            gst_invoice_date: record.gst_invoice_date.map(|d| d.format("%Y-%m-%d").to_string()),
            ro_date: record.ro_date.map(|d| d.format("%Y-%m-%d").to_string()),
            customer_name: record.customer_name,
            vehicle_reg_no: record.vehicle_reg_no,
            vin: record.vin,
            invoice_amt: record.invoice_amount,
            cust_labor: record.cust_labor,
            ins_labor: record.ins_labor,
        }
    }
}

/// Builder for [`EditableFields`]
#[derive(Default)]
pub struct EditableFieldsBuilder {
    fields: EditableFields,
}

impl EditableFieldsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing set of values
    pub fn starting_from(fields: EditableFields) -> Self {
        Self { fields }
    }

    /// Primary receipt with the fixture receipt number and date
    pub fn receipt_1(mut self, amount: Decimal) -> Self {
        self.fields.receipt_number_1 = Some(StringFixtures::receipt_number().to_string());
        self.fields.receipt_date_1 = Some(DateFixtures::receipt_date());
        self.fields.receipt_amount_1 = Some(amount);
        self
    }

    pub fn receipt_2(mut self, amount: Decimal) -> Self {
        self.fields.receipt_amount_2 = Some(amount);
        self
    }

    pub fn insurance_receipt(mut self, amount: Decimal) -> Self {
        self.fields.insurance_receipt_amount = Some(amount);
        self
    }

    pub fn advance(mut self, amount: Decimal) -> Self {
        self.fields.advance_collected = Some(amount);
        self
    }

    pub fn discount(mut self, amount: Decimal) -> Self {
        self.fields.discount_given = Some(amount);
        self
    }

    pub fn type_of_due(mut self, due: TypeOfDue) -> Self {
        self.fields.type_of_due = Some(due);
        self
    }

    pub fn claim_remarks(mut self, remarks: &str) -> Self {
        self.fields.claim_remarks = Some(remarks.to_string());
        self
    }

    pub fn build(self) -> EditableFields {
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Money;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_record_has_nothing_collected() {
        let record = BillingRecordBuilder::new().build();
        assert_eq!(record.total_collection(), Money::zero());
        assert_eq!(record.due_amount(), AmountFixtures::invoice_money());
    }

    #[test]
    fn test_random_customer_is_not_blank() {
        let record = BillingRecordBuilder::new().with_random_customer().build();
        assert!(!record.customer_name.unwrap().trim().is_empty());
    }

    #[test]
    fn test_fields_builder_sums_amounts() {
        let fields = EditableFieldsBuilder::new()
            .receipt_1(dec!(9000))
            .insurance_receipt(dec!(500))
            .discount(dec!(100))
            .build();
        assert_eq!(fields.total_collection(), Money::new(dec!(9600)));
        assert_eq!(fields.receipt_number_1.as_deref(), Some("R-1"));
    }

    #[test]
    fn test_import_row_keeps_key_and_dates() {
        let row = BillingRecordBuilder::new().build_import_row();
        assert_eq!(row.dealer_code, "D001");
        assert_eq!(row.gst_invoice_date.as_deref(), Some("2024-05-01"));
    }
}
