//! Billing DTOs

use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use core_kernel::Money;
use domain_billing::record::parse_date_input;
use domain_billing::{BillingRecord, EditableField, EditableFields, EditorError, ImportRow, RecordSearch, TypeOfDue};

/// Query string of the record search
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub invoice_no: Option<String>,
    pub vehicle_reg_no: Option<String>,
    /// `YYYY-MM-DD`, optionally with a time part
    pub invoice_date: Option<String>,
}

impl SearchParams {
    pub fn into_search(self) -> Result<RecordSearch, String> {
        let invoice_date = match self.invoice_date.as_deref() {
            Some(raw) => parse_date_input(raw).map_err(|_| format!("invalid invoice_date '{raw}'"))?,
            None => None,
        };
        Ok(RecordSearch::new(self.invoice_no, self.vehicle_reg_no, invoice_date))
    }
}

/// A billing record with its derived totals
#[derive(Debug, Serialize)]
pub struct BillingRecordResponse {
    #[serde(flatten)]
    pub record: BillingRecord,
    pub total_collection: Money,
    pub due_amount: Money,
}

impl From<BillingRecord> for BillingRecordResponse {
    fn from(record: BillingRecord) -> Self {
        Self {
            total_collection: record.total_collection(),
            due_amount: record.due_amount(),
            record,
        }
    }
}

/// Accepts a JSON number, a numeric string, or a blank string meaning unset
fn optional_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Amount(Decimal),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Amount(amount)) => Ok(Some(amount)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => Err(D::Error::custom(format!("invalid amount '{text}'"))),
    }
}

/// Full replacement state of the editable collection fields
///
/// Omitted fields are cleared. Dates accept `YYYY-MM-DD` with an optional
/// time part.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCollectionRequest {
    pub receipt_number_1: Option<String>,
    pub receipt_date_1: Option<String>,
    pub source_of_receipt_1: Option<String>,
    #[serde(default, deserialize_with = "optional_amount")]
    pub receipt_amount_1: Option<Decimal>,
    pub receipt_number_2: Option<String>,
    pub receipt_date_2: Option<String>,
    pub source_of_receipt_2: Option<String>,
    #[serde(default, deserialize_with = "optional_amount")]
    pub receipt_amount_2: Option<Decimal>,
    pub insurance_receipt_number: Option<String>,
    pub insurance_receipt_date: Option<String>,
    #[serde(default, deserialize_with = "optional_amount")]
    pub insurance_receipt_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "optional_amount")]
    pub advance_collected: Option<Decimal>,
    #[serde(default, deserialize_with = "optional_amount")]
    pub discount_given: Option<Decimal>,
    pub type_of_due: Option<String>,
    pub claim_number: Option<String>,
    pub policy_number: Option<String>,
    pub claim_remarks: Option<String>,
    pub any_other_remarks: Option<String>,
}

fn date_field(
    field: EditableField,
    raw: Option<String>,
) -> Result<Option<chrono::NaiveDate>, EditorError> {
    match raw {
        Some(raw) => parse_date_input(&raw)
            .map_err(|_| EditorError::invalid_field(field, format!("'{raw}' is not a date"))),
        None => Ok(None),
    }
}

impl UpdateCollectionRequest {
    /// Parses dates and the due type into [`EditableFields`]
    pub fn into_fields(self) -> Result<EditableFields, EditorError> {
        Ok(EditableFields {
            receipt_number_1: self.receipt_number_1,
            receipt_date_1: date_field(EditableField::ReceiptDate1, self.receipt_date_1)?,
            source_of_receipt_1: self.source_of_receipt_1,
            receipt_amount_1: self.receipt_amount_1,
            receipt_number_2: self.receipt_number_2,
            receipt_date_2: date_field(EditableField::ReceiptDate2, self.receipt_date_2)?,
            source_of_receipt_2: self.source_of_receipt_2,
            receipt_amount_2: self.receipt_amount_2,
            insurance_receipt_number: self.insurance_receipt_number,
            insurance_receipt_date: date_field(
                EditableField::InsuranceReceiptDate,
                self.insurance_receipt_date,
            )?,
            insurance_receipt_amount: self.insurance_receipt_amount,
            advance_collected: self.advance_collected,
            discount_given: self.discount_given,
            type_of_due: TypeOfDue::from_stored(self.type_of_due.as_deref()),
            claim_number: self.claim_number,
            policy_number: self.policy_number,
            claim_remarks: self.claim_remarks,
            any_other_remarks: self.any_other_remarks,
        })
    }
}

/// Bulk load request
#[derive(Debug, Deserialize, Validate)]
pub struct ImportRequest {
    #[validate(length(min = 1, max = 10000, message = "between 1 and 10000 rows per import"))]
    pub rows: Vec<ImportRow>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amounts_accept_numbers_strings_and_blanks() {
        let request: UpdateCollectionRequest = serde_json::from_str(
            r#"{"receipt_amount_1": 10000, "receipt_amount_2": "250.50", "discount_given": ""}"#,
        )
        .unwrap();
        assert_eq!(request.receipt_amount_1, Some(dec!(10000)));
        assert_eq!(request.receipt_amount_2, Some(dec!(250.50)));
        assert_eq!(request.discount_given, None);
        assert_eq!(request.advance_collected, None);
    }

    #[test]
    fn test_non_numeric_amount_is_rejected() {
        let result: Result<UpdateCollectionRequest, _> =
            serde_json::from_str(r#"{"receipt_amount_1": "ten"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result: Result<UpdateCollectionRequest, _> =
            serde_json::from_str(r#"{"invoice_amt": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_dates_accept_time_suffix() {
        let request = UpdateCollectionRequest {
            receipt_date_1: Some("2024-05-03 00:00:00".to_string()),
            ..Default::default()
        };
        let fields = request.into_fields().unwrap();
        assert_eq!(fields.receipt_date_1, NaiveDate::from_ymd_opt(2024, 5, 3));
    }

    #[test]
    fn test_bad_date_names_the_field() {
        let request = UpdateCollectionRequest {
            insurance_receipt_date: Some("03/05/2024".to_string()),
            ..Default::default()
        };
        let err = request.into_fields().unwrap_err();
        assert!(matches!(
            err,
            EditorError::InvalidField { field: EditableField::InsuranceReceiptDate, .. }
        ));
    }

    #[test]
    fn test_type_of_due_text() {
        let request = UpdateCollectionRequest {
            type_of_due: Some("Partially Paid".to_string()),
            ..Default::default()
        };
        assert_eq!(
            request.into_fields().unwrap().type_of_due,
            Some(TypeOfDue::PartiallyPaid)
        );
    }

    #[test]
    fn test_search_params_parse_date() {
        let params = SearchParams {
            invoice_date: Some("2024-05-01".to_string()),
            ..Default::default()
        };
        assert_eq!(
            params.into_search().unwrap().invoice_date,
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        let bad = SearchParams {
            invoice_date: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert!(bad.into_search().is_err());
    }
}
