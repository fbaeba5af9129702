//! Validation of proposed collection values
//!
//! The central rule: receipt 1 + receipt 2 + insurance receipt + advance
//! collected + discount given must not exceed the invoice amount. The
//! comparison is exact; a sum equal to the invoice amount is accepted.

use rust_decimal::Decimal;

use core_kernel::Money;

use crate::error::EditorError;
use crate::record::{EditableField, EditableFields};

/// Stored amounts are `NUMERIC(14,2)`
pub const MAX_AMOUNT_SCALE: u32 = 2;

/// Upper bound accepted for a single amount column (12 integer digits)
pub const MAX_AMOUNT_INTEGER_DIGITS: u32 = 12;

/// Result of a successful collection check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionCheck {
    pub collected: Money,
    pub invoice_amount: Money,
}

impl CollectionCheck {
    /// Amount still due after the proposed collections
    pub fn due_amount(&self) -> Money {
        self.invoice_amount - self.collected
    }
}

/// Sums the five monetary columns with overflow checking
pub fn collected_total(fields: &EditableFields) -> Result<Money, EditorError> {
    let amounts = fields.amounts().map(|(_, m)| m);
    Money::checked_sum(&amounts)
        .map_err(|e| EditorError::Validation(format!("collected total: {e}")))
}

/// Checks each monetary column on its own
///
/// Amounts must be non-negative and representable in the store without
/// rounding.
pub fn check_amounts(fields: &EditableFields) -> Result<(), EditorError> {
    let limit = Decimal::from(10_i64.pow(MAX_AMOUNT_INTEGER_DIGITS));
    for (field, amount) in fields.amounts() {
        let value = amount.amount();
        if value.is_sign_negative() && !value.is_zero() {
            return Err(EditorError::invalid_field(field, "amount must not be negative"));
        }
        if value.normalize().scale() > MAX_AMOUNT_SCALE {
            return Err(EditorError::invalid_field(
                field,
                format!("amount has more than {MAX_AMOUNT_SCALE} decimal places"),
            ));
        }
        if value >= limit {
            return Err(EditorError::invalid_field(field, "amount is too large"));
        }
    }
    Ok(())
}

/// Rejects type_of_due values outside the recognized set
pub fn check_type_of_due(fields: &EditableFields) -> Result<(), EditorError> {
    match &fields.type_of_due {
        Some(due) if !due.is_recognized() => Err(EditorError::invalid_field(
            EditableField::TypeOfDue,
            format!(
                "'{}' is not one of Pending, Cleared, Partially Paid",
                due.as_str()
            ),
        )),
        _ => Ok(()),
    }
}

/// Validates a full proposal against the invoice ceiling
///
/// A missing invoice amount is treated as zero, so any positive collection
/// against such a record is rejected.
pub fn validate_proposal(
    fields: &EditableFields,
    invoice_amount: Option<Decimal>,
) -> Result<CollectionCheck, EditorError> {
    check_type_of_due(fields)?;
    check_amounts(fields)?;

    let collected = collected_total(fields)?;
    let invoice_amount = Money::from_optional(invoice_amount);
    if collected > invoice_amount {
        return Err(EditorError::CollectionExceedsInvoice {
            collected,
            invoice_amount,
        });
    }

    Ok(CollectionCheck {
        collected,
        invoice_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TypeOfDue;
    use rust_decimal_macros::dec;

    fn amounts(r1: Decimal, r2: Decimal, ins: Decimal, adv: Decimal, disc: Decimal) -> EditableFields {
        EditableFields {
            receipt_amount_1: Some(r1),
            receipt_amount_2: Some(r2),
            insurance_receipt_amount: Some(ins),
            advance_collected: Some(adv),
            discount_given: Some(disc),
            ..Default::default()
        }
    }

    #[test]
    fn test_sum_equal_to_invoice_is_accepted() {
        let fields = amounts(dec!(4000), dec!(3000), dec!(2000), dec!(500), dec!(500));
        let check = validate_proposal(&fields, Some(dec!(10000.00))).unwrap();
        assert_eq!(check.collected, Money::new(dec!(10000)));
        assert!(check.due_amount().is_zero());
    }

    #[test]
    fn test_one_paisa_over_is_rejected() {
        let fields = amounts(dec!(10000.01), dec!(0), dec!(0), dec!(0), dec!(0));
        let err = validate_proposal(&fields, Some(dec!(10000))).unwrap_err();
        match err {
            EditorError::CollectionExceedsInvoice { collected, invoice_amount } => {
                assert_eq!(collected, Money::new(dec!(10000.01)));
                assert_eq!(invoice_amount, Money::new(dec!(10000)));
            }
            other => panic!("Expected CollectionExceedsInvoice, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_amounts_count_as_zero() {
        let fields = EditableFields {
            advance_collected: Some(dec!(100)),
            ..Default::default()
        };
        let check = validate_proposal(&fields, Some(dec!(100))).unwrap();
        assert_eq!(check.collected, Money::new(dec!(100)));
    }

    #[test]
    fn test_missing_invoice_amount_is_zero_ceiling() {
        assert!(validate_proposal(&EditableFields::default(), None).is_ok());
        let fields = EditableFields {
            receipt_amount_1: Some(dec!(1)),
            ..Default::default()
        };
        assert!(matches!(
            validate_proposal(&fields, None),
            Err(EditorError::CollectionExceedsInvoice { .. })
        ));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let fields = amounts(dec!(11000), dec!(0), dec!(0), dec!(0), dec!(-1000));
        let err = validate_proposal(&fields, Some(dec!(10000))).unwrap_err();
        assert!(matches!(
            err,
            EditorError::InvalidField { field: EditableField::DiscountGiven, .. }
        ));
    }

    #[test]
    fn test_sub_paisa_amount_rejected() {
        let fields = amounts(dec!(99.999), dec!(0), dec!(0), dec!(0), dec!(0));
        let err = validate_proposal(&fields, Some(dec!(10000))).unwrap_err();
        assert!(matches!(
            err,
            EditorError::InvalidField { field: EditableField::ReceiptAmount1, .. }
        ));
    }

    #[test]
    fn test_trailing_zeros_beyond_paise_are_fine() {
        let fields = amounts(dec!(100.0000), dec!(0), dec!(0), dec!(0), dec!(0));
        assert!(validate_proposal(&fields, Some(dec!(100))).is_ok());
    }

    #[test]
    fn test_unrecognized_type_of_due_rejected() {
        let fields = EditableFields {
            type_of_due: Some(TypeOfDue::Legacy("Overdue".to_string())),
            ..Default::default()
        };
        let err = validate_proposal(&fields, Some(dec!(100))).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("Overdue"));
    }
}
