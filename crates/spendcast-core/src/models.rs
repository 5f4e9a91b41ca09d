//! Domain models for Spendcast

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Whether money came in or went out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The slice of a transaction the forecaster reads
///
/// Amounts are always positive; `kind` carries the direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub amount: f64,
    pub kind: TransactionKind,
    pub category: String,
    pub occurred_on: NaiveDate,
}

impl TransactionRecord {
    pub fn new(
        amount: f64,
        kind: TransactionKind,
        category: impl Into<String>,
        occurred_on: NaiveDate,
    ) -> Self {
        Self {
            amount,
            kind,
            category: category.into(),
            occurred_on,
        }
    }

    pub fn expense(amount: f64, category: impl Into<String>, occurred_on: NaiveDate) -> Self {
        Self::new(amount, TransactionKind::Expense, category, occurred_on)
    }

    pub fn income(amount: f64, category: impl Into<String>, occurred_on: NaiveDate) -> Self {
        Self::new(amount, TransactionKind::Income, category, occurred_on)
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }
}

/// A stored transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category: String,
    pub note: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<&Transaction> for TransactionRecord {
    fn from(tx: &Transaction) -> Self {
        Self::new(tx.amount, tx.kind, tx.category.clone(), tx.date)
    }
}

/// A new transaction to be stored (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount: f64,
    pub kind: TransactionKind,
    pub category: String,
    pub note: Option<String>,
    pub date: NaiveDate,
}

/// Next-month forecast for one user
///
/// `error` is set (and `total_prediction` is `None`) whenever no estimate
/// could be produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub total_prediction: Option<f64>,
    pub confidence_percent: f64,
    pub category_predictions: BTreeMap<String, f64>,
    pub error: Option<String>,
}

impl ForecastResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            total_prediction: None,
            confidence_percent: 0.0,
            category_predictions: BTreeMap::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.total_prediction.is_some()
    }
}
