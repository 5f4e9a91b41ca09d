//! Spendcast Core Library
//!
//! Shared functionality for the Spendcast expense forecaster:
//! - Expense forecasting from monthly transaction features
//! - Database access for raw transaction history
//! - CSV import of transaction history

pub mod db;
pub mod error;
pub mod forecast;
pub mod import;
pub mod models;

pub use db::{period_cutoff, Database};
pub use error::{Error, Result};
pub use forecast::{build_monthly_features, forecast, ExpenseForecaster, FeatureSet};
pub use models::{ForecastResult, NewTransaction, Transaction, TransactionKind, TransactionRecord};
