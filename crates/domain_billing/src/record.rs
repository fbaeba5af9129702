//! Billing records and their editable collection fields
//!
//! A billing record is one row of the service billing fact table. Most of
//! its columns are loaded in bulk and never change; the collection columns
//! grouped in [`EditableFields`] are the only ones users edit afterwards.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{Money, RecordKey};

/// Classification of the outstanding amount on a record
///
/// New values are limited to the three recognized variants. Rows loaded
/// before the list was fixed can carry other text; those are kept verbatim
/// as [`TypeOfDue::Legacy`] so reads and audit trails stay lossless.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeOfDue {
    Pending,
    Cleared,
    PartiallyPaid,
    /// Unrecognized stored value
    Legacy(String),
}

impl TypeOfDue {
    /// Values accepted for new edits, in display order
    pub const RECOGNIZED: [TypeOfDue; 3] = [
        TypeOfDue::Pending,
        TypeOfDue::Cleared,
        TypeOfDue::PartiallyPaid,
    ];

    /// Interprets a stored or submitted value; blank means unset
    pub fn from_stored(value: Option<&str>) -> Option<Self> {
        let trimmed = value?.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self::from(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            TypeOfDue::Pending => "Pending",
            TypeOfDue::Cleared => "Cleared",
            TypeOfDue::PartiallyPaid => "Partially Paid",
            TypeOfDue::Legacy(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, TypeOfDue::Legacy(_))
    }
}

impl From<String> for TypeOfDue {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Pending" => TypeOfDue::Pending,
            "Cleared" => TypeOfDue::Cleared,
            "Partially Paid" => TypeOfDue::PartiallyPaid,
            _ => TypeOfDue::Legacy(value),
        }
    }
}

impl From<TypeOfDue> for String {
    fn from(value: TypeOfDue) -> String {
        match value {
            TypeOfDue::Legacy(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for TypeOfDue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user-editable collection columns of a billing record
///
/// Every field is optional. `None` is a real value: submitting `None` for a
/// field clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditableFields {
    // Primary receipt
    pub receipt_number_1: Option<String>,
    pub receipt_date_1: Option<NaiveDate>,
    pub source_of_receipt_1: Option<String>,
    pub receipt_amount_1: Option<Decimal>,

    // Secondary receipt
    pub receipt_number_2: Option<String>,
    pub receipt_date_2: Option<NaiveDate>,
    pub source_of_receipt_2: Option<String>,
    pub receipt_amount_2: Option<Decimal>,

    // Insurance receipt
    pub insurance_receipt_number: Option<String>,
    pub insurance_receipt_date: Option<NaiveDate>,
    pub insurance_receipt_amount: Option<Decimal>,
    pub advance_collected: Option<Decimal>,
    pub discount_given: Option<Decimal>,

    // Due metadata
    pub type_of_due: Option<TypeOfDue>,
    pub claim_number: Option<String>,
    pub policy_number: Option<String>,
    pub claim_remarks: Option<String>,
    pub any_other_remarks: Option<String>,
}

/// Names of the editable columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditableField {
    ReceiptAmount1,
    ReceiptAmount2,
    InsuranceReceiptAmount,
    AdvanceCollected,
    DiscountGiven,
    ReceiptNumber1,
    ReceiptDate1,
    SourceOfReceipt1,
    ReceiptNumber2,
    ReceiptDate2,
    SourceOfReceipt2,
    InsuranceReceiptNumber,
    InsuranceReceiptDate,
    TypeOfDue,
    ClaimNumber,
    PolicyNumber,
    ClaimRemarks,
    AnyOtherRemarks,
}

impl EditableField {
    /// All editable columns, in audit order
    pub const ALL: [EditableField; 18] = [
        EditableField::ReceiptAmount1,
        EditableField::ReceiptAmount2,
        EditableField::InsuranceReceiptAmount,
        EditableField::AdvanceCollected,
        EditableField::DiscountGiven,
        EditableField::ReceiptNumber1,
        EditableField::ReceiptDate1,
        EditableField::SourceOfReceipt1,
        EditableField::ReceiptNumber2,
        EditableField::ReceiptDate2,
        EditableField::SourceOfReceipt2,
        EditableField::InsuranceReceiptNumber,
        EditableField::InsuranceReceiptDate,
        EditableField::TypeOfDue,
        EditableField::ClaimNumber,
        EditableField::PolicyNumber,
        EditableField::ClaimRemarks,
        EditableField::AnyOtherRemarks,
    ];

    /// The monetary columns that count towards the collected total
    pub const AMOUNTS: [EditableField; 5] = [
        EditableField::ReceiptAmount1,
        EditableField::ReceiptAmount2,
        EditableField::InsuranceReceiptAmount,
        EditableField::AdvanceCollected,
        EditableField::DiscountGiven,
    ];

    /// Column name in the billing table, also used as the audit field name
    pub fn column_name(&self) -> &'static str {
        match self {
            EditableField::ReceiptAmount1 => "receipt_amount_1",
            EditableField::ReceiptAmount2 => "receipt_amount_2",
            EditableField::InsuranceReceiptAmount => "insurance_receipt_amount",
            EditableField::AdvanceCollected => "advance_collected",
            EditableField::DiscountGiven => "discount_given",
            EditableField::ReceiptNumber1 => "receipt_number_1",
            EditableField::ReceiptDate1 => "receipt_date_1",
            EditableField::SourceOfReceipt1 => "source_of_receipt_1",
            EditableField::ReceiptNumber2 => "receipt_number_2",
            EditableField::ReceiptDate2 => "receipt_date_2",
            EditableField::SourceOfReceipt2 => "source_of_receipt_2",
            EditableField::InsuranceReceiptNumber => "insurance_receipt_number",
            EditableField::InsuranceReceiptDate => "insurance_receipt_date",
            EditableField::TypeOfDue => "type_of_due",
            EditableField::ClaimNumber => "claim_number",
            EditableField::PolicyNumber => "policy_number",
            EditableField::ClaimRemarks => "claim_remarks",
            EditableField::AnyOtherRemarks => "any_other_remarks",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column_name() == name)
    }
}

impl fmt::Display for EditableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// A borrowed, typed view of one editable column's value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(Option<&'a str>),
    Date(Option<NaiveDate>),
    Amount(Option<Decimal>),
    Due(Option<&'a TypeOfDue>),
}

impl FieldValue<'_> {
    /// Canonical text form used for comparison and in the audit log
    ///
    /// Unset values render as the empty string. Amounts drop trailing zeros
    /// (`10000.00` renders as `10000`) and dates render as `YYYY-MM-DD`.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Text(v) => v.unwrap_or_default().to_string(),
            FieldValue::Date(v) => v
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            FieldValue::Amount(v) => v.map(|d| d.normalize().to_string()).unwrap_or_default(),
            FieldValue::Due(v) => v.map(|t| t.as_str().to_string()).unwrap_or_default(),
        }
    }
}

impl EditableFields {
    /// Returns the typed value of a column
    pub fn value(&self, field: EditableField) -> FieldValue<'_> {
        use EditableField as F;
        match field {
            F::ReceiptAmount1 => FieldValue::Amount(self.receipt_amount_1),
            F::ReceiptAmount2 => FieldValue::Amount(self.receipt_amount_2),
            F::InsuranceReceiptAmount => FieldValue::Amount(self.insurance_receipt_amount),
            F::AdvanceCollected => FieldValue::Amount(self.advance_collected),
            F::DiscountGiven => FieldValue::Amount(self.discount_given),
            F::ReceiptNumber1 => FieldValue::Text(self.receipt_number_1.as_deref()),
            F::ReceiptDate1 => FieldValue::Date(self.receipt_date_1),
            F::SourceOfReceipt1 => FieldValue::Text(self.source_of_receipt_1.as_deref()),
            F::ReceiptNumber2 => FieldValue::Text(self.receipt_number_2.as_deref()),
            F::ReceiptDate2 => FieldValue::Date(self.receipt_date_2),
            F::SourceOfReceipt2 => FieldValue::Text(self.source_of_receipt_2.as_deref()),
            F::InsuranceReceiptNumber => FieldValue::Text(self.insurance_receipt_number.as_deref()),
            F::InsuranceReceiptDate => FieldValue::Date(self.insurance_receipt_date),
            F::TypeOfDue => FieldValue::Due(self.type_of_due.as_ref()),
            F::ClaimNumber => FieldValue::Text(self.claim_number.as_deref()),
            F::PolicyNumber => FieldValue::Text(self.policy_number.as_deref()),
            F::ClaimRemarks => FieldValue::Text(self.claim_remarks.as_deref()),
            F::AnyOtherRemarks => FieldValue::Text(self.any_other_remarks.as_deref()),
        }
    }

    /// Canonical text of a column; see [`FieldValue::render`]
    pub fn render(&self, field: EditableField) -> String {
        self.value(field).render()
    }

    /// The five monetary columns, missing values counted as zero
    pub fn amounts(&self) -> [(EditableField, Money); 5] {
        [
            (EditableField::ReceiptAmount1, Money::from_optional(self.receipt_amount_1)),
            (EditableField::ReceiptAmount2, Money::from_optional(self.receipt_amount_2)),
            (
                EditableField::InsuranceReceiptAmount,
                Money::from_optional(self.insurance_receipt_amount),
            ),
            (EditableField::AdvanceCollected, Money::from_optional(self.advance_collected)),
            (EditableField::DiscountGiven, Money::from_optional(self.discount_given)),
        ]
    }

    /// Sum of the five monetary columns
    ///
    /// Uses unchecked addition; see `validation::collected_total` for the
    /// overflow-checked variant used on user input.
    pub fn total_collection(&self) -> Money {
        self.amounts().into_iter().map(|(_, m)| m).sum()
    }
}

/// One row of the service billing fact table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingRecord {
    pub key: RecordKey,
    pub gst_invoice_date: Option<NaiveDate>,
    pub ro_date: Option<NaiveDate>,
    pub customer_name: Option<String>,
    pub vehicle_reg_no: Option<String>,
    pub vin: Option<String>,
    /// Ceiling for the collected total
    pub invoice_amount: Option<Decimal>,
    pub cust_labor: Option<Decimal>,
    pub ins_labor: Option<Decimal>,
    pub fields: EditableFields,
    /// Refreshed on every successful edit
    pub collection_timestamp: Option<DateTime<Utc>>,
    /// Username that loaded the row
    pub uploaded_by: Option<String>,
}

impl BillingRecord {
    /// Invoice amount as the collection ceiling; a missing amount is zero
    pub fn invoice_ceiling(&self) -> Money {
        Money::from_optional(self.invoice_amount)
    }

    pub fn total_collection(&self) -> Money {
        self.fields.total_collection()
    }

    pub fn due_amount(&self) -> Money {
        self.invoice_ceiling() - self.total_collection()
    }

    /// Customer plus insurance labour, missing values counted as zero
    pub fn labour_revenue(&self) -> Money {
        Money::from_optional(self.cust_labor) + Money::from_optional(self.ins_labor)
    }
}

/// Parses a user-entered date, accepting a trailing time component
///
/// `2024-05-01`, `2024-05-01 00:00:00` and `2024-05-01T10:30:00` all yield
/// the same date. Blank input yields `Ok(None)`.
pub fn parse_date_input(input: &str) -> Result<Option<NaiveDate>, chrono::ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(Some(dt.date()));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Some(dt.date_naive()));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S").map(|dt| Some(dt.date()))
}
