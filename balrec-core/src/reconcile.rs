//! Date-aligned comparison of bank and ERP closing balances.
//!
//! The join is an inner equi-join on exact date. A date that appears several
//! times on either side yields every bank x ERP combination for that date,
//! in bank order first and ERP order second.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::model::CleanedSeries;

/// A bank/ERP pair sharing one date
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ReconciliationRow {
    pub date: NaiveDate,
    pub bank_closing: Decimal,
    pub erp_closing: Decimal,
    /// ERP minus bank
    pub difference: Decimal,
}

impl ReconciliationRow {
    pub fn new(date: NaiveDate, bank_closing: Decimal, erp_closing: Decimal) -> Self {
        Self {
            date,
            bank_closing,
            erp_closing,
            difference: erp_closing - bank_closing,
        }
    }

    pub fn is_match(&self, tolerance: Decimal) -> bool {
        self.difference.abs() <= tolerance
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconStatus {
    /// No compared pair exceeded the tolerance
    Reconciled,
    /// Pairs outside tolerance, ascending by date
    Discrepant { mismatches: Vec<ReconciliationRow> },
}

/// Outcome of one reconciliation run
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Reconciliation {
    #[serde(flatten)]
    pub status: ReconStatus,
    pub tolerance: Decimal,
    /// Number of joined bank/ERP pairs
    pub compared: usize,
    /// Dates present on the bank side only
    pub bank_only: Vec<NaiveDate>,
    /// Dates present on the ERP side only
    pub erp_only: Vec<NaiveDate>,
}

impl Reconciliation {
    pub fn is_reconciled(&self) -> bool {
        matches!(self.status, ReconStatus::Reconciled)
    }

    pub fn mismatches(&self) -> &[ReconciliationRow] {
        match &self.status {
            ReconStatus::Reconciled => &[],
            ReconStatus::Discrepant { mismatches } => mismatches,
        }
    }

    /// True when the run succeeded only because nothing was compared.
    pub fn is_vacuous(&self) -> bool {
        self.compared == 0
    }
}

/// Inner join of the two series on exact date.
pub fn join(bank: &CleanedSeries, erp: &CleanedSeries) -> Vec<ReconciliationRow> {
    let mut erp_by_date: BTreeMap<NaiveDate, Vec<Decimal>> = BTreeMap::new();
    for rec in erp {
        erp_by_date.entry(rec.date).or_default().push(rec.balance);
    }

    let mut rows = Vec::new();
    for rec in bank {
        if let Some(erp_balances) = erp_by_date.get(&rec.date) {
            for erp_balance in erp_balances {
                rows.push(ReconciliationRow::new(rec.date, rec.balance, *erp_balance));
            }
        }
    }
    rows
}

/// Compare closing balances; pairs with |ERP - bank| > `tolerance` are mismatches.
///
/// An empty join (including either side being empty) is reported as
/// `Reconciled` with `compared == 0`.
pub fn reconcile(bank: &CleanedSeries, erp: &CleanedSeries, tolerance: Decimal) -> Reconciliation {
    let joined = join(bank, erp);
    let compared = joined.len();

    let mut mismatches: Vec<ReconciliationRow> =
        joined.into_iter().filter(|row| !row.is_match(tolerance)).collect();
    mismatches.sort_by_key(|row| row.date);

    let bank_dates: BTreeSet<NaiveDate> = bank.iter().map(|r| r.date).collect();
    let erp_dates: BTreeSet<NaiveDate> = erp.iter().map(|r| r.date).collect();
    let bank_only: Vec<NaiveDate> = bank_dates.difference(&erp_dates).copied().collect();
    let erp_only: Vec<NaiveDate> = erp_dates.difference(&bank_dates).copied().collect();

    debug!(
        bank = bank.len(),
        erp = erp.len(),
        compared,
        mismatches = mismatches.len(),
        "reconciled closing balances"
    );
    if compared == 0 {
        warn!(
            bank = bank.len(),
            erp = erp.len(),
            "no dates in common between bank and ERP series"
        );
    }

    let status = if mismatches.is_empty() {
        ReconStatus::Reconciled
    } else {
        ReconStatus::Discrepant { mismatches }
    };

    Reconciliation {
        status,
        tolerance,
        compared,
        bank_only,
        erp_only,
    }
}
