//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Spendcast - Forecast next month's spending
#[derive(Parser)]
#[command(name = "spendcast")]
#[command(about = "Personal expense forecaster", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "spendcast.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Record a single transaction
    Add {
        /// User the transaction belongs to
        #[arg(short, long)]
        user: i64,

        /// Positive amount
        #[arg(short, long)]
        amount: f64,

        /// Transaction type: expense or income
        #[arg(short = 't', long = "type", default_value = "expense")]
        kind: String,

        /// Spending category (e.g. "Food & Drink")
        #[arg(short, long)]
        category: String,

        /// Date (YYYY-MM-DD or MM/DD/YYYY, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Free-form note
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Import transactions from CSV (date,type,category,amount[,note])
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// User the transactions belong to
        #[arg(short, long)]
        user: i64,
    },

    /// Forecast next month's expenses
    Forecast {
        /// User to forecast for
        #[arg(short, long)]
        user: i64,

        /// Look-back period in months (0 = all history)
        #[arg(short, long, default_value = "12")]
        period: i64,

        /// Months ahead to forecast
        #[arg(long, default_value = "1")]
        horizon: u32,

        /// Print the raw JSON result
        #[arg(long)]
        json: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}
