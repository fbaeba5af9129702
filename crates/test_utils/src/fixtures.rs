//! Pre-built Test Fixtures
//!
//! Consistent, predictable test data for billing tests. The canonical record
//! is dealer `D001`, invoice `INV-100`, invoice amount ₹10,000 with nothing
//! collected yet.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_kernel::{Money, RecordKey};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fixture for record keys
pub struct KeyFixtures;

impl KeyFixtures {
    /// The canonical record key, `D001/INV-100`
    pub fn standard() -> RecordKey {
        RecordKey::parse("D001", "INV-100").unwrap()
    }

    /// A key on the same dealer with a different invoice
    pub fn other_invoice() -> RecordKey {
        RecordKey::parse("D001", "INV-200").unwrap()
    }

    /// A key that is never loaded
    pub fn missing() -> RecordKey {
        RecordKey::parse("D999", "INV-404").unwrap()
    }
}

/// Fixture for rupee amounts
pub struct AmountFixtures;

impl AmountFixtures {
    /// Invoice amount of the canonical record
    pub fn invoice() -> Decimal {
        dec!(10000)
    }

    /// Primary receipt that fills the invoice exactly
    pub fn full_receipt() -> Decimal {
        dec!(10000)
    }

    /// Partial primary receipt
    pub fn partial_receipt() -> Decimal {
        dec!(9000)
    }

    /// Insurance receipt that takes a partial receipt over the invoice
    pub fn overflowing_insurance() -> Decimal {
        dec!(1500)
    }

    pub fn invoice_money() -> Money {
        Money::new(Self::invoice())
    }
}

/// Fixture for dates and timestamps
pub struct DateFixtures;

impl DateFixtures {
    /// GST invoice date of the canonical record
    pub fn invoice_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    /// Repair order date, a day before invoicing
    pub fn ro_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()
    }

    /// Date a receipt was collected
    pub fn receipt_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()
    }

    /// A fixed collection timestamp
    pub fn collected_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 3, 10, 30, 0).unwrap()
    }
}

/// Fixture for string data
pub struct StringFixtures;

impl StringFixtures {
    pub fn actor() -> &'static str {
        "cashier01"
    }

    pub fn uploader() -> &'static str {
        "loader"
    }

    pub fn customer_name() -> &'static str {
        "Asha Rao"
    }

    pub fn vehicle_reg_no() -> &'static str {
        "KA01AB1234"
    }

    pub fn vin() -> &'static str {
        "MA3EWDE1S00123456"
    }

    pub fn receipt_number() -> &'static str {
        "R-1"
    }

    /// Password used for seeded test users
    pub fn password() -> &'static str {
        "correct horse battery staple"
    }
}
