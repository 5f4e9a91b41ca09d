//! Next-month expense forecaster
//!
//! Fits a linear model from standardized monthly features to monthly total
//! expense, then projects the most recent month forward. The reported
//! confidence is the in-sample R² over the last few training months. It is a
//! rough fit indicator, not a validation score.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::features::{build_monthly_features, category_label, FeatureSet};
use super::regression::{LeastSquares, LinearModel, StandardScaler};
use crate::error::{Error, Result};
use crate::models::{ForecastResult, TransactionRecord};

/// Distinct expense months required before a model is fit
pub const MIN_TRAINING_MONTHS: usize = 2;

/// Number of trailing months the confidence score is computed over
pub const CONFIDENCE_WINDOW: usize = 3;

pub const INSUFFICIENT_DATA_MESSAGE: &str = "Insufficient data for prediction";
pub const NO_RECENT_DATA_MESSAGE: &str = "No recent data available";
pub const NUMERICAL_FAILURE_MESSAGE: &str = "Unable to compute forecast";

/// Round half away from zero to a fixed number of decimals
fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Model state produced by a successful training run
#[derive(Debug, Clone)]
struct TrainedModel {
    feature_names: Vec<String>,
    scaler: StandardScaler,
    total: LinearModel,
}

/// Expense forecaster
///
/// Untrained until [`ExpenseForecaster::train`] succeeds. Prediction methods
/// train on demand, and once trained keep using that model until the next
/// explicit `train` call.
#[derive(Debug, Clone, Default)]
pub struct ExpenseForecaster {
    model: Option<TrainedModel>,
}

impl ExpenseForecaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Train on a transaction history, returning whether a model was fit
    ///
    /// A failed run leaves any previously trained model in place.
    pub fn train(&mut self, transactions: &[TransactionRecord]) -> bool {
        match self.try_train(transactions) {
            Ok(()) => true,
            Err(Error::InsufficientData { required, actual }) => {
                debug!(required, actual, "Not enough expense history to train");
                false
            }
            Err(e) => {
                warn!(error = %e, "Forecast training failed");
                false
            }
        }
    }

    /// Train, reporting why training failed
    pub fn try_train(&mut self, transactions: &[TransactionRecord]) -> Result<()> {
        let features = build_monthly_features(transactions);
        if features.len() < MIN_TRAINING_MONTHS {
            return Err(Error::InsufficientData {
                required: MIN_TRAINING_MONTHS,
                actual: features.len(),
            });
        }

        let matrix = features.matrix();
        let scaler = StandardScaler::fit(&matrix)?;
        let scaled = scaler.transform(&matrix)?;
        let total = LeastSquares::new(&scaled)?.fit(&features.targets())?;

        debug!(
            months = features.len(),
            features = scaler.width(),
            "Trained expense forecaster"
        );

        self.model = Some(TrainedModel {
            feature_names: features.feature_names(),
            scaler,
            total,
        });
        Ok(())
    }

    /// Train if needed and return the model along with the current features
    fn prepare(
        &mut self,
        transactions: &[TransactionRecord],
    ) -> Result<(&TrainedModel, FeatureSet)> {
        if self.model.is_none() {
            self.try_train(transactions)?;
        }
        let features = build_monthly_features(transactions);
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| Error::Numerical("model missing after training".into()))?;

        if !features.is_empty() && features.feature_names() != model.feature_names {
            return Err(Error::Numerical(
                "feature layout differs from the trained model".into(),
            ));
        }
        Ok((model, features))
    }

    /// Predict next month's total expense
    pub fn predict_next_month(&mut self, transactions: &[TransactionRecord]) -> ForecastResult {
        self.predict_ahead(transactions, 1)
    }

    /// Predict total expense `months` ahead of the latest month
    ///
    /// Only the month number moves; every other feature of the latest month
    /// is reused as-is.
    pub fn predict_ahead(&mut self, transactions: &[TransactionRecord], months: u32) -> ForecastResult {
        match self.try_predict(transactions, months) {
            Ok(result) => result,
            Err(Error::InsufficientData { .. }) => ForecastResult::failed(INSUFFICIENT_DATA_MESSAGE),
            Err(e) => {
                warn!(error = %e, "Forecast prediction failed");
                ForecastResult::failed(NUMERICAL_FAILURE_MESSAGE)
            }
        }
    }

    fn try_predict(&mut self, transactions: &[TransactionRecord], months: u32) -> Result<ForecastResult> {
        let (model, features) = self.prepare(transactions)?;
        let Some(template) = features.next_month_template(months.max(1)) else {
            return Ok(ForecastResult::failed(NO_RECENT_DATA_MESSAGE));
        };

        let prediction = model.total.predict(&model.scaler.transform_row(&template)?);
        if !prediction.is_finite() {
            return Err(Error::Numerical("prediction is not finite".into()));
        }

        let start = features.len().saturating_sub(CONFIDENCE_WINDOW);
        let recent = model.scaler.transform(&features.matrix()[start..])?;
        let score = model.total.score(&recent, &features.targets()[start..]);
        let confidence = if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Ok(ForecastResult {
            total_prediction: Some(round_to(prediction, 2)),
            confidence_percent: round_to(confidence * 100.0, 1),
            category_predictions: BTreeMap::new(),
            error: None,
        })
    }

    /// Predict next month's spend per category
    ///
    /// Categories with no historical spend, or a non-positive prediction, are
    /// left out. Returns an empty map when no model can be trained.
    pub fn category_predictions(&mut self, transactions: &[TransactionRecord]) -> BTreeMap<String, f64> {
        self.category_predictions_ahead(transactions, 1)
    }

    pub fn category_predictions_ahead(
        &mut self,
        transactions: &[TransactionRecord],
        months: u32,
    ) -> BTreeMap<String, f64> {
        match self.try_category_predictions(transactions, months) {
            Ok(predictions) => predictions,
            Err(Error::InsufficientData { .. }) => BTreeMap::new(),
            Err(e) => {
                warn!(error = %e, "Category forecast failed");
                BTreeMap::new()
            }
        }
    }

    fn try_category_predictions(
        &mut self,
        transactions: &[TransactionRecord],
        months: u32,
    ) -> Result<BTreeMap<String, f64>> {
        let (model, features) = self.prepare(transactions)?;
        let Some(template) = features.next_month_template(months.max(1)) else {
            return Ok(BTreeMap::new());
        };

        let scaled = model.scaler.transform(&features.matrix())?;
        let next = model.scaler.transform_row(&template)?;
        // One pseudo-inverse serves every category target
        let solver = LeastSquares::new(&scaled)?;

        let mut predictions = BTreeMap::new();
        for column in &features.category_columns {
            let history = features.category_targets(column);
            if history.iter().sum::<f64>() <= 0.0 {
                continue;
            }

            let predicted = solver.fit(&history)?.predict(&next);
            if predicted.is_finite() && predicted > 0.0 {
                predictions.insert(category_label(column), round_to(predicted, 2));
            }
        }
        Ok(predictions)
    }
}
