//! Spendcast CLI - Personal expense forecaster
//!
//! Usage:
//!   spendcast init                            Initialize database
//!   spendcast import --file CSV --user 1      Import transactions
//!   spendcast forecast --user 1               Forecast next month's spending
//!   spendcast serve --port 3000               Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Add {
            user,
            amount,
            kind,
            category,
            date,
            note,
        } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_add(
                &db,
                user,
                amount,
                &kind,
                &category,
                date.as_deref(),
                note,
            )
        }
        Commands::Import { file, user } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_import(&db, &file, user)
        }
        Commands::Forecast {
            user,
            period,
            horizon,
            json,
        } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_forecast(&db, user, period, horizon, json)
        }
        Commands::Serve { port, host } => commands::cmd_serve(&cli.db, &host, port).await,
    }
}
