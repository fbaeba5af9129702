//! Unit tests for the Money module
//!
//! Tests cover rupee amount creation, arithmetic, comparison at the
//! paise boundary, and formatting.

use core_kernel::{Money, MoneyError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_keeps_scale() {
        let m = Money::new(dec!(100.5));
        assert_eq!(m.amount(), dec!(100.5));
    }

    #[test]
    fn test_from_minor_converts_paise() {
        let m = Money::from_minor(1_000_001);
        assert_eq!(m.amount(), dec!(10000.01));
    }

    #[test]
    fn test_zero_and_default_agree() {
        assert_eq!(Money::zero(), Money::default());
        assert!(Money::zero().is_zero());
    }

    #[test]
    fn test_from_optional() {
        assert_eq!(Money::from_optional(Some(dec!(5))).amount(), dec!(5));
        assert!(Money::from_optional(None).is_zero());
    }
}

mod predicates {
    use super::*;

    #[test]
    fn test_is_positive() {
        assert!(Money::new(dec!(0.01)).is_positive());
        assert!(!Money::zero().is_positive());
        assert!(!Money::new(dec!(-1)).is_positive());
    }

    #[test]
    fn test_is_negative() {
        assert!(Money::new(dec!(-0.01)).is_negative());
        assert!(!Money::zero().is_negative());
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_add() {
        let a = Money::new(dec!(9000));
        let b = Money::new(dec!(1500));
        assert_eq!(a.checked_add(&b).unwrap().amount(), dec!(10500));
    }

    #[test]
    fn test_checked_sub_can_go_negative() {
        let a = Money::new(dec!(30.00));
        let b = Money::new(dec!(100.00));
        assert_eq!(a.checked_sub(&b).unwrap().amount(), dec!(-70.00));
    }

    #[test]
    fn test_checked_sum_of_empty_is_zero() {
        let amounts: Vec<Money> = Vec::new();
        assert!(Money::checked_sum(&amounts).unwrap().is_zero());
    }

    #[test]
    fn test_checked_sum_overflow() {
        let amounts = vec![Money::new(Decimal::MAX), Money::new(Decimal::MAX)];
        assert_eq!(Money::checked_sum(&amounts), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_operators() {
        let a = Money::new(dec!(100.00));
        let b = Money::new(dec!(30.00));
        assert_eq!((a + b).amount(), dec!(130.00));
        assert_eq!((a - b).amount(), dec!(70.00));
        assert_eq!((-a).amount(), dec!(-100.00));
    }
}

mod comparison {
    use super::*;

    #[test]
    fn test_boundary_is_exact() {
        let ceiling = Money::new(dec!(10000.00));
        assert!(Money::new(dec!(10000)) <= ceiling);
        assert!(Money::new(dec!(10000.01)) > ceiling);
        assert!(Money::new(dec!(10000.001)) > ceiling);
    }

    #[test]
    fn test_round_to_paise_uses_bankers_rounding() {
        assert_eq!(Money::new(dec!(1.005)).round_to_paise().amount(), dec!(1.00));
        assert_eq!(Money::new(dec!(1.015)).round_to_paise().amount(), dec!(1.02));
    }
}

mod formatting {
    use super::*;

    #[test]
    fn test_display_two_places() {
        assert_eq!(Money::new(dec!(12.5)).to_string(), "₹12.50");
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("9000").unwrap(), Money::new(dec!(9000)));
        assert!(Money::parse("").is_err());
    }

    #[test]
    fn test_serializes_as_bare_decimal() {
        let json = serde_json::to_string(&Money::new(dec!(10.25))).unwrap();
        assert_eq!(json, "\"10.25\"");
    }
}
