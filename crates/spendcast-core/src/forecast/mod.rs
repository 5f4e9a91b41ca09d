//! Expense forecasting
//!
//! Turns a user's raw transaction history into monthly feature rows and fits
//! a linear model to project next month's spending:
//! - `features` - monthly aggregation and category column encoding
//! - `regression` - standardization and least-squares fitting
//! - `forecaster` - training, total prediction and per-category predictions
//!
//! Everything here is request-scoped. Each call builds its own forecaster and
//! nothing is cached between calls.

mod features;
mod forecaster;
mod regression;

pub use features::{
    advance_month, build_monthly_features, category_column, category_label, FeatureSet,
    MonthPeriod, MonthlyFeatureRow, BASE_FEATURES, CATEGORY_PREFIX,
};
pub use forecaster::{
    ExpenseForecaster, CONFIDENCE_WINDOW, INSUFFICIENT_DATA_MESSAGE, MIN_TRAINING_MONTHS,
    NO_RECENT_DATA_MESSAGE, NUMERICAL_FAILURE_MESSAGE,
};
pub use regression::{r_squared, LeastSquares, LinearModel, StandardScaler};

use tracing::info;

use crate::models::{ForecastResult, TransactionRecord};

/// Default number of months to look ahead
pub const DEFAULT_HORIZON_MONTHS: u32 = 1;

/// Forecast total and per-category expense `horizon_months` ahead
///
/// A horizon of 0 is treated as 1. Failures are reported through
/// [`ForecastResult::error`], never returned or raised.
pub fn forecast(transactions: &[TransactionRecord], horizon_months: u32) -> ForecastResult {
    let horizon = horizon_months.max(1);
    let mut forecaster = ExpenseForecaster::new();

    let mut result = forecaster.predict_ahead(transactions, horizon);
    result.category_predictions = forecaster.category_predictions_ahead(transactions, horizon);

    info!(
        transactions = transactions.len(),
        horizon,
        prediction = ?result.total_prediction,
        confidence = result.confidence_percent,
        categories = result.category_predictions.len(),
        "Computed expense forecast"
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_forecast_empty_history() {
        let result = forecast(&[], DEFAULT_HORIZON_MONTHS);
        assert_eq!(result.total_prediction, None);
        assert_eq!(result.confidence_percent, 0.0);
        assert!(result.error.is_some());
        assert!(result.category_predictions.is_empty());
    }

    #[test]
    fn test_forecast_combines_total_and_categories() {
        let txs = vec![
            TransactionRecord::expense(100.0, "Food", date(2024, 1, 5)),
            TransactionRecord::expense(50.0, "Transport", date(2024, 1, 9)),
            TransactionRecord::expense(120.0, "Food", date(2024, 2, 5)),
            TransactionRecord::expense(60.0, "Transport", date(2024, 2, 9)),
            TransactionRecord::income(2000.0, "Salary", date(2024, 2, 1)),
        ];

        let result = forecast(&txs, DEFAULT_HORIZON_MONTHS);
        assert!(result.is_ok());
        assert_eq!(result.category_predictions.len(), 2);
        assert!(result.category_predictions["Food"] > 0.0);
        assert!(result.category_predictions["Transport"] > 0.0);
    }

    #[test]
    fn test_zero_horizon_matches_one_month() {
        let txs = vec![
            TransactionRecord::expense(80.0, "Food", date(2024, 3, 5)),
            TransactionRecord::expense(95.0, "Food", date(2024, 4, 5)),
            TransactionRecord::expense(70.0, "Food", date(2024, 5, 5)),
        ];
        assert_eq!(forecast(&txs, 0), forecast(&txs, 1));
    }

    #[test]
    fn test_huge_horizon_wraps_like_its_remainder() {
        let txs = vec![
            TransactionRecord::expense(10.0, "Food", date(2023, 11, 20)),
            TransactionRecord::expense(12.0, "Food", date(2023, 12, 20)),
        ];
        let result = forecast(&txs, u32::MAX);
        assert!(result.total_prediction.is_some());
        assert_eq!(result, forecast(&txs, 3));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(forecast(&[], 1)).unwrap();
        assert!(json["total_prediction"].is_null());
        assert_eq!(json["confidence_percent"], 0.0);
        assert!(json["category_predictions"].as_object().unwrap().is_empty());
        assert_eq!(json["error"], INSUFFICIENT_DATA_MESSAGE);
    }
}
