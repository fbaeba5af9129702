//! Field-level diff between stored and proposed collection values

use serde::{Deserialize, Serialize};

use crate::record::{EditableField, EditableFields};

/// One column whose rendered value changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: EditableField,
    pub old_value: String,
    pub new_value: String,
}

/// Compares every editable column by its rendered text
///
/// Both sides go through [`EditableFields::render`], so representation
/// differences such as `10000.00` versus `10000`, or `None` versus an empty
/// string, produce no change. Output follows [`EditableField::ALL`] order.
pub fn diff(old: &EditableFields, new: &EditableFields) -> Vec<FieldChange> {
    EditableField::ALL
        .into_iter()
        .filter_map(|field| {
            let old_value = old.render(field);
            let new_value = new.render(field);
            (old_value != new_value).then_some(FieldChange {
                field,
                old_value,
                new_value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TypeOfDue;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_identical_fields_produce_no_changes() {
        let fields = EditableFields {
            receipt_amount_1: Some(dec!(500)),
            type_of_due: Some(TypeOfDue::Pending),
            ..Default::default()
        };
        assert!(diff(&fields, &fields.clone()).is_empty());
    }

    #[test]
    fn test_scale_difference_is_not_a_change() {
        let old = EditableFields {
            receipt_amount_1: Some(dec!(10000.00)),
            ..Default::default()
        };
        let new = EditableFields {
            receipt_amount_1: Some(dec!(10000)),
            ..Default::default()
        };
        assert!(diff(&old, &new).is_empty());
    }

    #[test]
    fn test_empty_text_equals_unset() {
        let old = EditableFields {
            claim_remarks: Some(String::new()),
            ..Default::default()
        };
        assert!(diff(&old, &EditableFields::default()).is_empty());
    }

    #[test]
    fn test_clearing_a_field_is_a_change() {
        let old = EditableFields {
            any_other_remarks: Some("customer disputes labour".to_string()),
            receipt_date_1: NaiveDate::from_ymd_opt(2024, 3, 9),
            ..Default::default()
        };
        let changes = diff(&old, &EditableFields::default());
        assert_eq!(
            changes,
            vec![
                FieldChange {
                    field: EditableField::ReceiptDate1,
                    old_value: "2024-03-09".to_string(),
                    new_value: String::new(),
                },
                FieldChange {
                    field: EditableField::AnyOtherRemarks,
                    old_value: "customer disputes labour".to_string(),
                    new_value: String::new(),
                },
            ]
        );
    }

    #[test]
    fn test_zero_to_amount() {
        let old = EditableFields {
            receipt_amount_1: Some(dec!(0.00)),
            ..Default::default()
        };
        let new = EditableFields {
            receipt_amount_1: Some(dec!(10000)),
            ..Default::default()
        };
        let changes = diff(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_value, "0");
        assert_eq!(changes[0].new_value, "10000");
    }

    #[test]
    fn test_zero_and_unset_differ() {
        let new = EditableFields {
            discount_given: Some(dec!(0)),
            ..Default::default()
        };
        let changes = diff(&EditableFields::default(), &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, EditableField::DiscountGiven);
    }
}
