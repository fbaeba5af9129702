//! Report DTOs

use chrono::NaiveDate;
use serde::Deserialize;

use domain_billing::{BillingError, DateRange, OutstandingFilter};

/// Query string of the outstanding report
#[derive(Debug, Default, Deserialize)]
pub struct OutstandingParams {
    pub dealer_code: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl OutstandingParams {
    /// Both dates or neither; `from` must not be after `to`
    pub fn into_filter(self) -> Result<OutstandingFilter, BillingError> {
        let period = DateRange::from_bounds(self.from, self.to)?;
        Ok(OutstandingFilter::new(self.dealer_code, period))
    }
}

/// Query string of the daily summary
#[derive(Debug, Deserialize)]
pub struct DailySummaryParams {
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_open_range_is_rejected() {
        let params = OutstandingParams {
            from: NaiveDate::from_ymd_opt(2024, 5, 1),
            ..Default::default()
        };
        assert!(params.into_filter().is_err());
    }

    #[test]
    fn test_blank_dealer_filter_is_dropped() {
        let params = OutstandingParams {
            dealer_code: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.into_filter().unwrap().dealer_code, None);
    }
}
