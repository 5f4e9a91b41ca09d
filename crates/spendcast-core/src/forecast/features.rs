//! Monthly feature extraction
//!
//! Collapses a raw transaction history into one row per calendar month of
//! expense activity. Each row carries seasonality (`month_number`), simple
//! amount statistics and a per-category spending column; the month's total
//! spend is kept separately as the regression target.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use tracing::warn;

use crate::models::TransactionRecord;

/// Prefix for encoded category column names
pub const CATEGORY_PREFIX: &str = "cat_";

/// Names of the fixed (non-category) feature columns, in matrix order
pub const BASE_FEATURES: [&str; 5] = [
    "month_number",
    "transaction_count",
    "avg_amount",
    "max_amount",
    "min_amount",
];

/// Encode a category label as a feature column name
///
/// "Food & Drink" becomes "cat_food_drink". Labels that only differ by case
/// share a column.
pub fn category_column(label: &str) -> String {
    format!(
        "{}{}",
        CATEGORY_PREFIX,
        label.to_lowercase().replace(" & ", "_")
    )
}

/// Recover a display label from an encoded column name
///
/// Inverse of [`category_column`] up to casing: "cat_food_drink" becomes
/// "Food & Drink".
pub fn category_label(column: &str) -> String {
    let raw = column.strip_prefix(CATEGORY_PREFIX).unwrap_or(column);
    title_case(&raw.replace('_', " & "))
}

/// Uppercase the first letter of every word, lowercase the rest
///
/// A "word" starts at any letter that follows a non-letter, so "o'neil"
/// becomes "O'Neil".
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

/// Advance a 1-based month number, wrapping December into January
pub fn advance_month(month_number: u32, months: u32) -> u32 {
    (month_number.saturating_sub(1) % 12 + months % 12) % 12 + 1
}

/// A calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthPeriod {
    pub year: i32,
    pub month: u32,
}

impl MonthPeriod {
    pub fn of(record: &TransactionRecord) -> Self {
        Self {
            year: record.occurred_on.year(),
            month: record.occurred_on.month(),
        }
    }
}

impl std::fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Aggregated expense activity for one calendar month
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyFeatureRow {
    pub period: MonthPeriod,
    /// 1-12, the year is intentionally dropped
    pub month_number: u32,
    pub transaction_count: usize,
    pub avg_amount: f64,
    pub max_amount: f64,
    pub min_amount: f64,
    /// Encoded category column -> amount spent this month (0 when absent)
    pub category_totals: BTreeMap<String, f64>,
    /// Regression target, never part of the feature vector
    pub total_expense: f64,
}

impl MonthlyFeatureRow {
    /// Feature vector in [`FeatureSet::feature_names`] order
    pub fn to_vector(&self) -> Vec<f64> {
        let mut values = vec![
            self.month_number as f64,
            self.transaction_count as f64,
            self.avg_amount,
            self.max_amount,
            self.min_amount,
        ];
        values.extend(self.category_totals.values().copied());
        values
    }
}

/// Monthly feature rows for one history, sorted ascending by period
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    pub rows: Vec<MonthlyFeatureRow>,
    /// Encoded category columns, sorted; identical for every row
    pub category_columns: Vec<String>,
}

impl FeatureSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Column names of the feature matrix
    pub fn feature_names(&self) -> Vec<String> {
        BASE_FEATURES
            .iter()
            .map(|s| s.to_string())
            .chain(self.category_columns.iter().cloned())
            .collect()
    }

    /// Feature matrix, one row per month
    pub fn matrix(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(MonthlyFeatureRow::to_vector).collect()
    }

    /// Monthly total expense, aligned with [`FeatureSet::matrix`]
    pub fn targets(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.total_expense).collect()
    }

    /// Monthly totals of a single category column
    pub fn category_targets(&self, column: &str) -> Vec<f64> {
        self.rows
            .iter()
            .map(|r| r.category_totals.get(column).copied().unwrap_or(0.0))
            .collect()
    }

    /// The most recent month with its month number pushed `months` ahead
    ///
    /// Every other feature is carried over unchanged.
    pub fn next_month_template(&self, months: u32) -> Option<Vec<f64>> {
        let last = self.rows.last()?;
        let mut values = last.to_vector();
        values[0] = advance_month(last.month_number, months) as f64;
        Some(values)
    }
}

/// Whether a record can take part in a forecast
fn is_usable(record: &TransactionRecord) -> bool {
    if !record.amount.is_finite() || record.amount <= 0.0 {
        warn!(
            amount = record.amount,
            category = %record.category,
            date = %record.occurred_on,
            "Skipping transaction with invalid amount"
        );
        return false;
    }
    true
}

/// Build monthly feature rows from a transaction history
///
/// Only expense records contribute to rows. The category column set is taken
/// from every usable record in the input so that it does not depend on which
/// months end up in the matrix. Returns an empty set when there are no
/// expenses.
pub fn build_monthly_features(transactions: &[TransactionRecord]) -> FeatureSet {
    let usable: Vec<&TransactionRecord> = transactions.iter().filter(|t| is_usable(t)).collect();

    let category_columns: BTreeSet<String> = usable
        .iter()
        .map(|t| category_column(&t.category))
        .collect();

    let mut by_month: BTreeMap<MonthPeriod, Vec<&TransactionRecord>> = BTreeMap::new();
    for tx in usable.iter().filter(|t| t.is_expense()) {
        by_month.entry(MonthPeriod::of(tx)).or_default().push(tx);
    }

    if by_month.is_empty() {
        return FeatureSet::default();
    }

    let rows = by_month
        .into_iter()
        .map(|(period, records)| {
            let mut category_totals: BTreeMap<String, f64> = category_columns
                .iter()
                .map(|c| (c.clone(), 0.0))
                .collect();

            let mut total = 0.0;
            let mut max_amount = f64::MIN;
            let mut min_amount = f64::MAX;
            for tx in &records {
                total += tx.amount;
                max_amount = max_amount.max(tx.amount);
                min_amount = min_amount.min(tx.amount);
                if let Some(slot) = category_totals.get_mut(&category_column(&tx.category)) {
                    *slot += tx.amount;
                }
            }

            MonthlyFeatureRow {
                period,
                month_number: period.month,
                transaction_count: records.len(),
                avg_amount: total / records.len() as f64,
                max_amount,
                min_amount,
                category_totals,
                total_expense: total,
            }
        })
        .collect();

    FeatureSet {
        rows,
        category_columns: category_columns.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_category_column_encoding() {
        assert_eq!(category_column("Food"), "cat_food");
        assert_eq!(category_column("Food & Drink"), "cat_food_drink");
        assert_eq!(category_label("cat_food_drink"), "Food & Drink");
        assert_eq!(category_label("cat_transport"), "Transport");
    }

    #[test]
    fn test_title_case_matches_word_boundaries() {
        assert_eq!(title_case("eating out"), "Eating Out");
        assert_eq!(title_case("o'neil"), "O'Neil");
        assert_eq!(title_case("HEALTH"), "Health");
    }

    #[test]
    fn test_advance_month_wraps() {
        assert_eq!(advance_month(1, 1), 2);
        assert_eq!(advance_month(11, 1), 12);
        assert_eq!(advance_month(12, 1), 1);
        assert_eq!(advance_month(12, 3), 3);
        assert_eq!(advance_month(6, 12), 6);
    }

    #[test]
    fn test_advance_month_large_horizon() {
        // u32::MAX = 12 * 357913941 + 3
        assert_eq!(advance_month(12, u32::MAX), 3);
        assert_eq!(advance_month(1, u32::MAX), 4);
        assert_eq!(advance_month(12, 24), 12);
    }

    #[test]
    fn test_empty_history_gives_empty_set() {
        let features = build_monthly_features(&[]);
        assert!(features.is_empty());
        assert!(features.targets().is_empty());
    }

    #[test]
    fn test_income_only_history_gives_empty_set() {
        let txs = vec![TransactionRecord::income(3000.0, "Salary", date(2024, 1, 1))];
        assert!(build_monthly_features(&txs).is_empty());
    }

    #[test]
    fn test_rows_are_grouped_and_sorted_by_period() {
        // Deliberately out of order, spanning a year boundary
        let txs = vec![
            TransactionRecord::expense(30.0, "Food", date(2024, 2, 10)),
            TransactionRecord::expense(10.0, "Food", date(2023, 12, 5)),
            TransactionRecord::expense(20.0, "Transport", date(2023, 12, 20)),
            TransactionRecord::expense(40.0, "Food", date(2024, 2, 1)),
        ];

        let features = build_monthly_features(&txs);
        assert_eq!(features.len(), 2);

        let dec = &features.rows[0];
        assert_eq!(dec.period, MonthPeriod { year: 2023, month: 12 });
        assert_eq!(dec.month_number, 12);
        assert_eq!(dec.transaction_count, 2);
        assert_eq!(dec.total_expense, 30.0);
        assert_eq!(dec.avg_amount, 15.0);
        assert_eq!(dec.max_amount, 20.0);
        assert_eq!(dec.min_amount, 10.0);

        let feb = &features.rows[1];
        assert_eq!(feb.period, MonthPeriod { year: 2024, month: 2 });
        assert_eq!(feb.total_expense, 70.0);
        assert_eq!(feb.category_totals["cat_transport"], 0.0);
        assert_eq!(features.targets(), vec![30.0, 70.0]);
    }

    #[test]
    fn test_category_columns_cover_whole_input() {
        let txs = vec![
            TransactionRecord::expense(10.0, "Food", date(2024, 1, 3)),
            TransactionRecord::expense(5.0, "Rent", date(2024, 2, 3)),
            TransactionRecord::income(100.0, "Salary", date(2024, 2, 1)),
        ];

        let features = build_monthly_features(&txs);
        let expected = vec!["cat_food", "cat_rent", "cat_salary"];
        assert_eq!(features.category_columns, expected);
        for row in &features.rows {
            let keys: Vec<&str> = row.category_totals.keys().map(|k| k.as_str()).collect();
            assert_eq!(keys, expected);
        }
        // Income never lands in a row
        assert!(features.rows.iter().all(|r| r.category_totals["cat_salary"] == 0.0));
    }

    #[test]
    fn test_invalid_amounts_are_skipped() {
        let txs = vec![
            TransactionRecord::expense(f64::NAN, "Food", date(2024, 1, 3)),
            TransactionRecord::expense(-5.0, "Food", date(2024, 1, 4)),
            TransactionRecord::expense(0.0, "Gifts", date(2024, 1, 5)),
            TransactionRecord::expense(12.5, "Food", date(2024, 1, 6)),
        ];

        let features = build_monthly_features(&txs);
        assert_eq!(features.len(), 1);
        assert_eq!(features.rows[0].transaction_count, 1);
        assert_eq!(features.rows[0].total_expense, 12.5);
        assert_eq!(features.category_columns, vec!["cat_food"]);
    }

    #[test]
    fn test_matrix_layout_and_template() {
        let txs = vec![
            TransactionRecord::expense(100.0, "Food", date(2024, 11, 3)),
            TransactionRecord::expense(50.0, "Transport", date(2024, 12, 3)),
        ];

        let features = build_monthly_features(&txs);
        assert_eq!(
            features.feature_names(),
            vec![
                "month_number",
                "transaction_count",
                "avg_amount",
                "max_amount",
                "min_amount",
                "cat_food",
                "cat_transport"
            ]
        );
        assert_eq!(
            features.matrix()[1],
            vec![12.0, 1.0, 50.0, 50.0, 50.0, 0.0, 50.0]
        );

        let template = features.next_month_template(1).unwrap();
        assert_eq!(template, vec![1.0, 1.0, 50.0, 50.0, 50.0, 0.0, 50.0]);
        assert_eq!(features.category_targets("cat_food"), vec![100.0, 0.0]);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let txs = vec![
            TransactionRecord::expense(20.0, "Food", date(2024, 3, 3)),
            TransactionRecord::expense(10.0, "Food", date(2024, 1, 3)),
        ];
        let before = txs.clone();
        let _ = build_monthly_features(&txs);
        assert_eq!(txs, before);
    }
}
