//! CSV import of transaction history
//!
//! Expected header (case-insensitive, any column order):
//! `date,type,category,amount[,note]`

use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{NewTransaction, TransactionKind};

/// Column positions resolved from the header row
struct Columns {
    date: usize,
    kind: usize,
    category: usize,
    amount: usize,
    note: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
        };
        let require = |names: &[&str]| {
            find(names).ok_or_else(|| Error::Import(format!("Missing required column: {}", names[0])))
        };

        Ok(Self {
            date: require(&["date"])?,
            kind: require(&["type", "kind"])?,
            category: require(&["category"])?,
            amount: require(&["amount"])?,
            note: find(&["note", "notes", "memo"]),
        })
    }
}

/// Parse a transaction date (YYYY-MM-DD or MM/DD/YYYY)
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .map_err(|_| Error::Import(format!("Invalid date: {}", s)))
}

/// Parse a positive amount, tolerating currency symbols and thousands separators
pub fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    let amount: f64 = cleaned
        .parse()
        .map_err(|_| Error::Import(format!("Invalid amount: {}", s)))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::Import(format!("Amount must be positive: {}", s)));
    }
    Ok(amount)
}

fn parse_record(columns: &Columns, record: &StringRecord) -> Result<NewTransaction> {
    let field = |idx: usize, name: &str| {
        record
            .get(idx)
            .map(str::trim)
            .ok_or_else(|| Error::Import(format!("Missing {}", name)))
    };

    let date = parse_date(field(columns.date, "date")?)?;
    let kind: TransactionKind = field(columns.kind, "type")?
        .parse()
        .map_err(Error::Import)?;
    let category = field(columns.category, "category")?.to_string();
    if category.is_empty() {
        return Err(Error::Import("Missing category".into()));
    }
    let amount = parse_amount(field(columns.amount, "amount")?)?;
    let note = columns
        .note
        .and_then(|idx| record.get(idx))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok(NewTransaction {
        amount,
        kind,
        category,
        note,
        date,
    })
}

/// Parse transaction history from CSV
///
/// Malformed rows are skipped with a warning; a header without the required
/// columns fails the whole import.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<NewTransaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::from_headers(rdr.headers()?)?;
    let mut transactions = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        match parse_record(&columns, &record) {
            Ok(tx) => transactions.push(tx),
            // Header is line 1
            Err(e) => warn!(line = line + 2, error = %e, "Skipping malformed CSV row"),
        }
    }

    debug!(count = transactions.len(), "Parsed transactions from CSV");
    Ok(transactions)
}
