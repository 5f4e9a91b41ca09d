//! Transaction command implementations

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use spendcast_core::{
    db::Database,
    import::{parse_csv, parse_date},
    models::{NewTransaction, TransactionKind},
};

pub fn cmd_add(
    db: &Database,
    user_id: i64,
    amount: f64,
    kind: &str,
    category: &str,
    date: Option<&str>,
    note: Option<String>,
) -> Result<()> {
    let kind: TransactionKind = kind.parse().map_err(anyhow::Error::msg)?;
    let date = match date {
        Some(d) => parse_date(d)?,
        None => Local::now().date_naive(),
    };
    let tx = NewTransaction {
        amount,
        kind,
        category: category.trim().to_string(),
        note: note.filter(|n| !n.trim().is_empty()),
        date,
    };
    let id = db
        .insert_transaction(user_id, &tx)
        .context("Failed to record transaction")?;

    println!(
        "✅ Recorded {} #{}: ${:.2} {} on {}",
        tx.kind, id, tx.amount, tx.category, tx.date
    );

    Ok(())
}

pub fn cmd_import(db: &Database, file: &Path, user_id: i64) -> Result<()> {
    println!("📥 Importing transactions from {}...", file.display());

    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let transactions = parse_csv(csv_file)?;

    println!("   Found {} transactions", transactions.len());

    let stored = db
        .insert_transactions(user_id, &transactions)
        .context("Import failed; no transactions were stored")?;
    let expenses = transactions
        .iter()
        .filter(|tx| tx.kind == TransactionKind::Expense)
        .count();

    println!(
        "✅ Imported {} transactions ({} expenses) for user {}",
        stored, expenses, user_id
    );
    println!(
        "   User {} now has {} transactions",
        user_id,
        db.count_transactions(user_id)?
    );

    Ok(())
}
