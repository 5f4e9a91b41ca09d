//! Forecast command implementation

use anyhow::{bail, Result};
use chrono::{Local, NaiveDate};
use spendcast_core::{db::Database, forecast, period_cutoff, ForecastResult};
use spendcast_server::MAX_HORIZON_MONTHS;

/// Forecast for a user using history within `period_months` of `today`
pub fn forecast_for_user(
    db: &Database,
    user_id: i64,
    period_months: i64,
    horizon_months: u32,
    today: NaiveDate,
) -> Result<ForecastResult> {
    if horizon_months == 0 || horizon_months > MAX_HORIZON_MONTHS {
        bail!("--horizon must be between 1 and {}", MAX_HORIZON_MONTHS);
    }

    let since = period_cutoff(period_months, today);
    let records = db.list_transaction_records(user_id, since)?;
    Ok(forecast(&records, horizon_months))
}

pub fn cmd_forecast(
    db: &Database,
    user_id: i64,
    period_months: i64,
    horizon_months: u32,
    json: bool,
) -> Result<()> {
    let result = forecast_for_user(
        db,
        user_id,
        period_months,
        horizon_months,
        Local::now().date_naive(),
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print_forecast(&result, horizon_months);
    Ok(())
}

fn print_forecast(result: &ForecastResult, horizon_months: u32) {
    let Some(total) = result.total_prediction else {
        println!("⚠️  No forecast: {}", result.error.as_deref().unwrap_or("unknown error"));
        println!("   Import at least two months of expenses with:");
        println!("   spendcast import --file history.csv --user <id>");
        return;
    };

    let label = if horizon_months == 1 {
        "next month".to_string()
    } else {
        format!("{} months ahead", horizon_months)
    };

    println!();
    println!("🔮 Expense Forecast ({})", label);
    println!("   ─────────────────────────────────────────");
    println!("   Total:       ${:>10.2}", total);
    println!("   Confidence:  {:>10.1}%", result.confidence_percent);

    if !result.category_predictions.is_empty() {
        println!();
        println!("   By category:");
        let mut categories: Vec<_> = result.category_predictions.iter().collect();
        categories.sort_by(|a, b| b.1.total_cmp(a.1));
        for (name, amount) in categories {
            println!("   {:<24} ${:>10.2}", name, amount);
        }
    }
}
