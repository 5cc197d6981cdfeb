//! Delimited text (CSV) statements: one table, header in the first row.

use crate::error::Result;
use crate::table::Table;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parse the whole buffer as a single table.
///
/// Rows may be shorter or longer than the header; see [`Table::push_row`].
/// Cells that are not valid UTF-8 are decoded lossily.
pub fn read_delimited(bytes: &[u8]) -> Result<Table> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(bytes);

    let headers = rdr.byte_headers()?.clone();
    let mut table = Table::new(headers.iter().map(|h| String::from_utf8_lossy(h).into_owned()));

    for result in rdr.byte_records() {
        let record = result?;
        table.push_row(
            record
                .iter()
                .map(|cell| String::from_utf8_lossy(cell).trim().to_string())
                .collect(),
        );
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_basic_csv() {
        let csv = "Date,Narration,Closing\n01/01/2024,Opening,100.00\n02/01/2024,\"NEFT, salary\",1200.50\n";
        let table = read_delimited(csv.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["Date", "Narration", "Closing"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[1][1], "NEFT, salary");
    }

    #[test]
    fn test_bom_and_padded_headers() {
        let csv = "\u{feff} Date , Closing \n01/01/2024, 5 \n";
        let table = read_delimited(csv.as_bytes()).unwrap();
        assert!(table.has_columns(&["Date", "Closing"]));
        assert_eq!(table.rows()[0], vec!["01/01/2024".to_string(), "5".to_string()]);
    }

    #[test]
    fn test_ragged_rows() {
        let csv = "Date,Closing,Note\n01/01/2024\n02/01/2024,5,a,b\n";
        let table = read_delimited(csv.as_bytes()).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0], vec!["01/01/2024".to_string(), String::new(), String::new()]);
        assert_eq!(table.rows()[1][2], "a");
    }

    #[test]
    fn test_empty_input_has_no_columns() {
        let table = read_delimited(b"").unwrap();
        assert!(table.columns().is_empty());
        assert_eq!(table.row_count(), 0);
    }
}
