//! Transaction operations

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use tracing::warn;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{NewTransaction, Transaction, TransactionKind, TransactionRecord};

/// Raw column values, before date/kind parsing
struct TransactionRow {
    id: i64,
    user_id: i64,
    amount: f64,
    kind: String,
    category: String,
    note: Option<String>,
    date: String,
    created_at: String,
}

impl TransactionRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            amount: row.get(2)?,
            kind: row.get(3)?,
            category: row.get(4)?,
            note: row.get(5)?,
            date: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    /// Parse into a transaction, or `None` (with a warning) if malformed
    fn parse(self) -> Option<Transaction> {
        let date = match NaiveDate::parse_from_str(&self.date, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                warn!(id = self.id, date = %self.date, "Skipping transaction with invalid date");
                return None;
            }
        };
        let kind: TransactionKind = match self.kind.parse() {
            Ok(k) => k,
            Err(_) => {
                warn!(id = self.id, kind = %self.kind, "Skipping transaction with invalid kind");
                return None;
            }
        };

        Some(Transaction {
            id: self.id,
            user_id: self.user_id,
            amount: self.amount,
            kind,
            category: self.category,
            note: self.note,
            date,
            created_at: parse_datetime(&self.created_at),
        })
    }
}

/// Reject amounts and categories the forecaster cannot use
fn validate(tx: &NewTransaction) -> Result<()> {
    if !tx.amount.is_finite() || tx.amount <= 0.0 {
        return Err(Error::InvalidData(format!(
            "Transaction amount must be positive, got {}",
            tx.amount
        )));
    }
    if tx.category.trim().is_empty() {
        return Err(Error::InvalidData("Transaction category is required".into()));
    }
    Ok(())
}

fn insert_row(conn: &Connection, user_id: i64, tx: &NewTransaction) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO transactions (user_id, amount, kind, category, note, date)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
        params![
            user_id,
            tx.amount,
            tx.kind.as_str(),
            tx.category.trim(),
            tx.note,
            tx.date.to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

impl Database {
    /// Insert a transaction for a user, returning its ID
    pub fn insert_transaction(&self, user_id: i64, tx: &NewTransaction) -> Result<i64> {
        validate(tx)?;
        let conn = self.conn()?;
        insert_row(&conn, user_id, tx)
    }

    /// Insert a batch of transactions atomically, returning how many were stored
    ///
    /// Either every transaction is stored or none are.
    pub fn insert_transactions(&self, user_id: i64, txs: &[NewTransaction]) -> Result<usize> {
        for tx in txs {
            validate(tx)?;
        }

        let mut conn = self.conn()?;
        let db_tx = conn.transaction()?;
        for tx in txs {
            insert_row(&db_tx, user_id, tx)?;
        }
        db_tx.commit()?;

        Ok(txs.len())
    }

    /// List a user's transactions, oldest first, optionally from `since` on
    ///
    /// Rows whose stored date or kind cannot be parsed are skipped.
    pub fn list_transactions(&self, user_id: i64, since: Option<NaiveDate>) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let since = since.map(|d| d.to_string());

        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, amount, kind, category, note, date, created_at
            FROM transactions
            WHERE user_id = ?1 AND (?2 IS NULL OR date >= ?2)
            ORDER BY date ASC, id ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id, since], TransactionRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows.into_iter().filter_map(TransactionRow::parse).collect())
    }

    /// The forecaster's view of a user's history
    pub fn list_transaction_records(
        &self,
        user_id: i64,
        since: Option<NaiveDate>,
    ) -> Result<Vec<TransactionRecord>> {
        Ok(self
            .list_transactions(user_id, since)?
            .iter()
            .map(TransactionRecord::from)
            .collect())
    }

    /// Count a user's stored transactions
    pub fn count_transactions(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
