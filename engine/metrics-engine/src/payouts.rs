//! # Payout Ledger
//!
//! Money table from the league's payout sheet export (`payouts.csv`).

use crate::error::Result;
use season_store::StoreError;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// One line of the payout sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutRow {
    pub year: Option<i32>,
    pub week: Option<String>,
    pub category: String,
    pub winner: String,
    pub amount: f64,
    pub entry_fee: f64,
    pub paid: Option<String>,
}

/// Amount cell: `$1,250.00` and `1250` both parse; anything else is 0
fn parse_money(raw: &str) -> f64 {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, '$' | ',' | ' ')).collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn parse_year(raw: &str) -> Option<i32> {
    raw.parse::<i32>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i32))
}

/// Load `payouts.csv`. Absent columns default to empty or zero.
pub fn load_payouts(path: &Path) -> Result<Vec<PayoutRow>> {
    if !path.exists() {
        return Err(StoreError::MissingFile { path: path.to_path_buf() }.into());
    }
    info!("Loading payouts from: {:?}", path);

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let columns: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_lowercase(), i))
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cell = |name: &str| -> String {
            columns
                .get(name)
                .and_then(|idx| record.get(*idx))
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };
        let optional = |name: &str| Some(cell(name)).filter(|v| !v.is_empty());

        rows.push(PayoutRow {
            year: parse_year(&cell("year")),
            week: optional("week"),
            category: cell("category"),
            winner: cell("winner"),
            amount: parse_money(&cell("amount")),
            entry_fee: parse_money(&cell("entry fee")),
            paid: optional("paid"),
        });
    }
    debug!("Parsed {} payout rows", rows.len());
    Ok(rows)
}

/// Winnings, fees and net of one owner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerNet {
    pub winner: String,
    pub winnings: f64,
    pub fees: f64,
    pub net: f64,
}

/// Total paid out per category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub payouts: f64,
}

/// Pot, payouts and balances for one year or all time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutLedger {
    /// `None` for the all-time ledger
    pub year: Option<i32>,
    pub pot: f64,
    pub payouts: f64,
    pub balance: f64,
    /// Sorted by net, highest first
    pub owners: Vec<OwnerNet>,
    /// Sorted by category name
    pub categories: Vec<CategoryTotal>,
}

/// Build the ledger, optionally restricted to one year
pub fn build_ledger(rows: &[PayoutRow], year: Option<i32>) -> PayoutLedger {
    let scoped: Vec<&PayoutRow> =
        rows.iter().filter(|r| year.map_or(true, |y| r.year == Some(y))).collect();

    let pot: f64 = scoped.iter().map(|r| r.entry_fee).sum();
    let payouts: f64 = scoped.iter().map(|r| r.amount).sum();

    let mut owners: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    let mut categories: BTreeMap<&str, f64> = BTreeMap::new();
    for row in &scoped {
        if !row.winner.is_empty() {
            let entry = owners.entry(row.winner.as_str()).or_insert((0.0, 0.0));
            entry.0 += row.amount;
            entry.1 += row.entry_fee;
        }
        if !row.category.is_empty() {
            *categories.entry(row.category.as_str()).or_insert(0.0) += row.amount;
        }
    }

    let mut owners: Vec<OwnerNet> = owners
        .into_iter()
        .map(|(winner, (winnings, fees))| OwnerNet {
            winner: winner.to_string(),
            winnings,
            fees,
            net: winnings - fees,
        })
        .collect();
    owners.sort_by(|a, b| b.net.total_cmp(&a.net));

    PayoutLedger {
        year,
        pot,
        payouts,
        balance: pot - payouts,
        owners,
        categories: categories
            .into_iter()
            .map(|(category, payouts)| CategoryTotal { category: category.to_string(), payouts })
            .collect(),
    }
}

/// Years present in the ledger, ascending
pub fn ledger_years(rows: &[PayoutRow]) -> Vec<i32> {
    let mut years: Vec<i32> = rows.iter().filter_map(|r| r.year).collect();
    years.sort_unstable();
    years.dedup();
    years
}
