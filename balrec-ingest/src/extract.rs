//! Source file -> cleaned (date, closing balance) series.

use balrec_core::{BalanceRecord, CleanedSeries, ReconConfig};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::cells::{parse_balance, parse_date};
use crate::error::{ExtractionError, Result};
use crate::parsers::delimited::read_delimited;
use crate::parsers::pdf_tables::read_pdf_tables;
use crate::table::Table;
use crate::types::{RawSource, SourceKind};

/// One table row after cell parsing. `None` marks a cell that did not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedRow {
    pub date: Option<NaiveDate>,
    pub balance: Option<Decimal>,
}

impl ParsedRow {
    pub fn into_record(self) -> Option<BalanceRecord> {
        Some(BalanceRecord::new(self.date?, self.balance?))
    }
}

/// Extract the closing balance series from one statement file.
pub fn extract(raw: &RawSource, config: &ReconConfig) -> Result<CleanedSeries> {
    let table = match raw.kind() {
        SourceKind::Delimited => {
            let table = read_delimited(raw.bytes())?;
            require_columns(&table, config)?
        }
        SourceKind::TabularPdf => select_tables(read_pdf_tables(raw.bytes())?, config)?,
    };

    let series = clean(&table, config);
    let (first, last) = series.date_range().unzip();
    info!(
        file = raw.file_name(),
        rows = table.row_count(),
        kept = series.len(),
        first = ?first,
        last = ?last,
        "extracted closing balances"
    );
    Ok(series)
}

/// Project a single parsed table onto the date and closing columns.
pub fn require_columns(table: &Table, config: &ReconConfig) -> Result<Table> {
    let required = config.required_columns();
    table
        .project(&required)
        .ok_or_else(|| ExtractionError::MissingColumns {
            missing: table.missing_columns(&required),
        })
}

/// Keep the candidate tables carrying both required columns and stack their
/// projections in document order.
pub fn select_tables(candidates: Vec<Table>, config: &ReconConfig) -> Result<Table> {
    let required = config.required_columns();
    let total = candidates.len();
    let mut merged: Option<Table> = None;

    for (idx, candidate) in candidates.into_iter().enumerate() {
        let Some(projected) = candidate.project(&required) else {
            debug!(
                table = idx,
                columns = ?candidate.columns(),
                "skipping table without required columns"
            );
            continue;
        };

        match merged.as_mut() {
            Some(table) => table.append(projected),
            None => merged = Some(projected),
        }
    }

    match merged {
        Some(table) => {
            debug!(candidates = total, rows = table.row_count(), "selected PDF tables");
            Ok(table)
        }
        None => {
            warn!(
                candidates = total,
                date_col = %config.date_col,
                closing_col = %config.closing_col,
                "no PDF table has the required columns"
            );
            Err(ExtractionError::NoMatchingTable {
                date_col: config.date_col.clone(),
                closing_col: config.closing_col.clone(),
            })
        }
    }
}

/// Parse the date and closing cells of every row. Nothing is dropped here.
pub fn parse_rows(table: &Table, config: &ReconConfig) -> Vec<ParsedRow> {
    let (Some(dates), Some(closings)) = (
        table.column(&config.date_col),
        table.column(&config.closing_col),
    ) else {
        return Vec::new();
    };

    dates
        .zip(closings)
        .map(|(date, closing)| ParsedRow {
            date: parse_date(date, config.dayfirst),
            balance: parse_balance(closing),
        })
        .collect()
}

/// Discard rows with an unparsed date or balance.
pub fn drop_invalid(rows: Vec<ParsedRow>) -> Vec<BalanceRecord> {
    rows.into_iter().filter_map(ParsedRow::into_record).collect()
}

/// Parse, filter and sort a table that has the configured columns.
pub fn clean(table: &Table, config: &ReconConfig) -> CleanedSeries {
    let parsed = parse_rows(table, config);
    let total = parsed.len();
    let records = drop_invalid(parsed);

    let dropped = total - records.len();
    if dropped > 0 {
        debug!(dropped, kept = records.len(), "dropped rows with unparseable date or balance");
    }

    CleanedSeries::from_records(records)
}
