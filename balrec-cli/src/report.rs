use balrec_core::{CleanedSeries, Reconciliation, ReconciliationRow};

pub const MATCH_MESSAGE: &str = "All closing balances match!";
pub const MISMATCH_MESSAGE: &str = "Mismatch found on the following dates:";

const HEADERS: [&str; 4] = ["Date", "Closing_Bank", "Closing_ERP", "Difference"];

fn row_cells(row: &ReconciliationRow) -> [String; 4] {
    [
        row.date.format("%Y-%m-%d").to_string(),
        row.bank_closing.to_string(),
        row.erp_closing.to_string(),
        row.difference.to_string(),
    ]
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line = cells
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:>w$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Right-aligned fixed-width table, header first.
fn render_table<const N: usize>(headers: [&str; N], rows: &[[String; N]]) -> String {
    let mut widths = headers.map(str::len);
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();
    push_line(&mut out, headers.into_iter(), &widths);
    for row in rows {
        push_line(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

/// Human-readable reconciliation report.
pub fn render_reconciliation(result: &Reconciliation) -> String {
    let mut out = String::new();

    if result.is_reconciled() {
        out.push_str(MATCH_MESSAGE);
        out.push('\n');
    } else {
        out.push_str(MISMATCH_MESSAGE);
        out.push_str("\n\n");
        let rows: Vec<_> = result.mismatches().iter().map(row_cells).collect();
        out.push_str(&render_table(HEADERS, &rows));
    }

    out.push_str(&format!(
        "\nCompared {} date pair(s) at tolerance {}",
        result.compared, result.tolerance
    ));
    if !result.bank_only.is_empty() || !result.erp_only.is_empty() {
        out.push_str(&format!(
            "; {} bank-only date(s), {} ERP-only date(s)",
            result.bank_only.len(),
            result.erp_only.len()
        ));
    }
    out.push('\n');
    out
}

/// Human-readable listing of one extracted series.
pub fn render_series(series: &CleanedSeries) -> String {
    let rows: Vec<_> = series
        .iter()
        .map(|r| [r.date.format("%Y-%m-%d").to_string(), r.balance.to_string()])
        .collect();
    let mut out = render_table(["Date", "Closing"], &rows);
    out.push_str(&format!("\n{} record(s)", series.len()));
    if let Some((first, last)) = series.date_range() {
        out.push_str(&format!(" from {first} to {last}"));
    }
    out.push('\n');
    out
}
