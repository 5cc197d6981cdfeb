//! Canonical balance series produced by extraction and consumed by reconciliation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One closing balance on one date
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceRecord {
    pub date: NaiveDate,
    pub balance: Decimal,
}

impl BalanceRecord {
    pub fn new(date: NaiveDate, balance: Decimal) -> Self {
        Self { date, balance }
    }
}

/// Balance records ordered ascending by date.
///
/// Same-date records are allowed and keep the order they were supplied in;
/// nothing is deduplicated.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CleanedSeries(Vec<BalanceRecord>);

impl CleanedSeries {
    /// Build a series, stable-sorting the records by date.
    pub fn from_records(mut records: Vec<BalanceRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        Self(records)
    }

    pub fn records(&self) -> &[BalanceRecord] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BalanceRecord> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Earliest and latest date covered, if any
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.0.first()?.date, self.0.last()?.date))
    }

    pub fn into_records(self) -> Vec<BalanceRecord> {
        self.0
    }
}

impl FromIterator<BalanceRecord> for CleanedSeries {
    fn from_iter<I: IntoIterator<Item = BalanceRecord>>(iter: I) -> Self {
        Self::from_records(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CleanedSeries {
    type Item = &'a BalanceRecord;
    type IntoIter = std::slice::Iter<'a, BalanceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
