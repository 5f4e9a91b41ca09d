//! Forecast handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::{AppError, AppState, MAX_HORIZON_MONTHS};
use spendcast_core::forecast::{forecast, DEFAULT_HORIZON_MONTHS};
use spendcast_core::{period_cutoff, ForecastResult};

/// Query parameters for a forecast
#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub user_id: i64,
    /// Look-back period in months; 0 or negative = all history.
    /// Kept as text so a non-numeric value falls back to the default.
    pub period: Option<String>,
    /// Months ahead to forecast
    pub horizon: Option<u32>,
}

/// Parse the `period` parameter, falling back to `default` when absent or not an integer
fn resolve_period(raw: Option<&str>, default: i64) -> i64 {
    match raw.map(str::trim) {
        None | Some("") => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!(period = value, default, "Ignoring non-numeric period");
            default
        }),
    }
}

/// GET /api/forecast - Next-month expense forecast for a user
///
/// Insufficient history is not an HTTP error: the body carries a null
/// prediction and an `error` message instead.
pub async fn get_forecast(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ForecastQuery>,
) -> Result<Json<ForecastResult>, AppError> {
    let horizon = params.horizon.unwrap_or(DEFAULT_HORIZON_MONTHS);
    if horizon == 0 || horizon > MAX_HORIZON_MONTHS {
        return Err(AppError::bad_request(&format!(
            "horizon must be between 1 and {}",
            MAX_HORIZON_MONTHS
        )));
    }

    let period = resolve_period(params.period.as_deref(), state.config.default_period_months);
    let since = period_cutoff(period, Utc::now().date_naive());

    // SQLite reads and model fitting are synchronous
    let db = state.db.clone();
    let user_id = params.user_id;
    let result = tokio::task::spawn_blocking(move || {
        let records = db.list_transaction_records(user_id, since)?;
        Ok::<_, spendcast_core::Error>(forecast(&records, horizon))
    })
    .await??;

    info!(
        user_id,
        period,
        horizon,
        ok = result.is_ok(),
        "Served expense forecast"
    );

    Ok(Json(result))
}
