//! Tabular PDF statements.
//!
//! Glyphs are collected with their page positions through a `pdf-extract`
//! output device, merged into text runs, grouped into lines by baseline and
//! then scanned for tables:
//!
//!   Account Summary                         <- one cell, not a table
//!   Date          Narration       Closing   <- header, one column per cell
//!   01/04/2024    NEFT SALARY     1,200.00
//!   02/04/2024                    1,100.00  <- cell placed by x position
//!                                           <- vertical gap ends the table
//!
//! A horizontal gap wider than [`CELL_GAP_EM`] splits two runs. Row cells are
//! assigned to the header column they overlap most.

use pdf_extract::{Document, MediaBox, OutputDev, OutputError, Transform};
use tracing::debug;

use crate::error::{ExtractionError, Result};
use crate::table::Table;

/// Horizontal gap, in font sizes, that separates two cells on one line.
pub const CELL_GAP_EM: f64 = 1.0;

/// Baselines closer than this many font sizes belong to the same line.
const LINE_TOLERANCE_EM: f64 = 0.5;

/// A vertical step larger than this many font sizes ends a table.
const BLOCK_GAP_EM: f64 = 2.5;

/// One run of glyphs on a single baseline. `y` grows down the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub text: String,
    pub x: f64,
    pub x_end: f64,
    pub y: f64,
    pub size: f64,
}

/// Text runs of one page, in drawing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub page: u32,
    pub boxes: Vec<TextBox>,
}

/// Output device that records positioned text runs instead of plain text.
#[derive(Debug, Default)]
struct LayoutCollector {
    pages: Vec<PageLayout>,
    current: Option<PageLayout>,
    page_top: f64,
    open: Option<TextBox>,
}

impl LayoutCollector {
    fn close_run(&mut self) {
        let Some(mut run) = self.open.take() else {
            return;
        };
        let trimmed = run.text.trim_end().len();
        run.text.truncate(trimmed);
        if let Some(page) = self.current.as_mut() {
            page.boxes.push(run);
        }
    }

    fn into_pages(mut self) -> Vec<PageLayout> {
        self.close_run();
        self.pages.extend(self.current.take());
        self.pages
    }
}

impl OutputDev for LayoutCollector {
    fn begin_page(
        &mut self,
        page_num: u32,
        media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> std::result::Result<(), OutputError> {
        self.close_run();
        self.pages.extend(self.current.take());
        self.page_top = media_box.ury;
        self.current = Some(PageLayout {
            page: page_num,
            boxes: Vec::new(),
        });
        Ok(())
    }

    fn end_page(&mut self) -> std::result::Result<(), OutputError> {
        self.close_run();
        self.pages.extend(self.current.take());
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> std::result::Result<(), OutputError> {
        let scale = (trm.m11 * trm.m22 - trm.m12 * trm.m21).abs().sqrt() * font_size;
        let size = if scale > 0.0 { scale } else { 1.0 };
        let x = trm.m31;
        let y = self.page_top - trm.m32;
        let x_end = x + width * size;

        let continues = self.open.as_ref().is_some_and(|run| {
            (y - run.y).abs() <= run.size * LINE_TOLERANCE_EM
                && x >= run.x - run.size
                && x - run.x_end <= run.size * CELL_GAP_EM
        });

        if char.trim().is_empty() {
            match self.open.as_mut() {
                Some(run) if continues => {
                    if !run.text.ends_with(' ') {
                        run.text.push(' ');
                    }
                    run.x_end = run.x_end.max(x_end);
                }
                _ => self.close_run(),
            }
            return Ok(());
        }

        match self.open.as_mut() {
            Some(run) if continues => {
                if x - run.x_end > run.size * 0.1 && !run.text.ends_with(' ') {
                    run.text.push(' ');
                }
                run.text.push_str(char);
                run.x_end = run.x_end.max(x_end);
            }
            _ => {
                self.close_run();
                self.open = Some(TextBox {
                    text: char.to_string(),
                    x,
                    x_end,
                    y,
                    size,
                });
            }
        }
        Ok(())
    }

    fn begin_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }
}

/// Group positions whose sorted neighbours lie within `tolerance` and return
/// the mean of each group, ascending.
pub fn cluster_values(values: &[f64], tolerance: f64) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut clusters: Vec<Vec<f64>> = Vec::new();
    for v in sorted {
        match clusters.last_mut() {
            Some(group) if group.last().is_some_and(|&last| v - last <= tolerance) => group.push(v),
            _ => clusters.push(vec![v]),
        }
    }
    clusters
        .iter()
        .map(|group| group.iter().sum::<f64>() / group.len() as f64)
        .collect()
}

#[derive(Debug)]
struct Line<'a> {
    y: f64,
    size: f64,
    cells: Vec<&'a TextBox>,
}

/// Lines of a page top to bottom, each with its runs left to right.
fn page_lines(page: &PageLayout) -> Vec<Line<'_>> {
    if page.boxes.is_empty() {
        return Vec::new();
    }
    let mean_size = page.boxes.iter().map(|b| b.size).sum::<f64>() / page.boxes.len() as f64;
    let ys: Vec<f64> = page.boxes.iter().map(|b| b.y).collect();

    let mut lines: Vec<Line<'_>> = cluster_values(&ys, mean_size * LINE_TOLERANCE_EM)
        .into_iter()
        .map(|y| Line {
            y,
            size: 0.0,
            cells: Vec::new(),
        })
        .collect();

    for b in &page.boxes {
        let nearest = lines
            .iter()
            .enumerate()
            .min_by(|(_, l), (_, r)| (l.y - b.y).abs().total_cmp(&(r.y - b.y).abs()))
            .map(|(i, _)| i);
        if let Some(line) = nearest.and_then(|i| lines.get_mut(i)) {
            line.size = line.size.max(b.size);
            line.cells.push(b);
        }
    }
    for line in &mut lines {
        line.cells.sort_by(|l, r| l.x.total_cmp(&r.x));
    }
    lines
}

/// Header spans plus the rows collected under them.
#[derive(Debug)]
struct ColumnGrid {
    header: Vec<String>,
    spans: Vec<(f64, f64)>,
    rows: Vec<Vec<String>>,
}

impl ColumnGrid {
    fn new(cells: &[&TextBox]) -> Self {
        ColumnGrid {
            header: cells.iter().map(|c| c.text.clone()).collect(),
            spans: cells.iter().map(|c| (c.x, c.x_end)).collect(),
            rows: Vec::new(),
        }
    }

    /// Column with the largest horizontal overlap (or smallest gap), and
    /// that overlap.
    fn column_for(&self, cell: &TextBox) -> (usize, f64) {
        self.spans
            .iter()
            .enumerate()
            .map(|(i, &(start, end))| (i, cell.x_end.min(end) - cell.x.max(start)))
            .fold((0, f64::NEG_INFINITY), |best, cand| {
                if cand.1 > best.1 { cand } else { best }
            })
    }

    fn push_line(&mut self, cells: &[&TextBox]) {
        let mut row = vec![String::new(); self.spans.len()];
        for cell in cells {
            let (col, _) = self.column_for(cell);
            let slot = &mut row[col];
            if !slot.is_empty() {
                slot.push(' ');
            }
            slot.push_str(&cell.text);
        }
        self.rows.push(row);
    }

    /// A lone run under a later column continues the previous row's cell
    /// (wrapped narration).
    fn continue_cell(&mut self, cell: &TextBox) -> bool {
        let (col, overlap) = self.column_for(cell);
        if col == 0 || overlap < 0.0 {
            return false;
        }
        let Some(slot) = self.rows.last_mut().and_then(|row| row.get_mut(col)) else {
            return false;
        };
        if !slot.is_empty() {
            slot.push(' ');
        }
        slot.push_str(&cell.text);
        true
    }

    fn into_table(self) -> Table {
        let mut table = Table::new(self.header);
        for row in self.rows {
            table.push_row(row);
        }
        table
    }
}

/// Find the candidate tables on one page, top to bottom.
///
/// A table is a run of lines with at least two cells each and no large
/// vertical gap between them; its first line is the header.
pub fn detect_tables(page: &PageLayout) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut current: Option<ColumnGrid> = None;
    let mut prev_y: Option<f64> = None;

    for line in page_lines(page) {
        let adjacent = prev_y.is_some_and(|py| line.y - py <= line.size * BLOCK_GAP_EM);
        prev_y = Some(line.y);
        if !adjacent {
            tables.extend(current.take().map(ColumnGrid::into_table));
        }

        let continued = match (current.as_mut(), line.cells.as_slice()) {
            (Some(grid), [only]) => grid.continue_cell(only),
            _ => false,
        };
        if continued {
            continue;
        }

        if line.cells.len() < 2 {
            tables.extend(current.take().map(ColumnGrid::into_table));
        } else if let Some(grid) = current.as_mut() {
            grid.push_line(&line.cells);
        } else {
            current = Some(ColumnGrid::new(&line.cells));
        }
    }
    tables.extend(current.take().map(ColumnGrid::into_table));

    tables
}

/// Candidate tables across every page, in document order.
pub fn tables_from_layout(pages: &[PageLayout]) -> Vec<Table> {
    let mut out = Vec::new();
    for page in pages {
        let tables = detect_tables(page);
        debug!(page = page.page, runs = page.boxes.len(), tables = tables.len(), "scanned PDF page");
        out.extend(tables);
    }
    out
}

/// Positioned text runs of every page.
pub fn read_layout(bytes: &[u8]) -> std::result::Result<Vec<PageLayout>, OutputError> {
    let mut doc = Document::load_mem(bytes)?;
    if doc.is_encrypted() {
        doc.decrypt("")?;
    }
    let mut collector = LayoutCollector::default();
    pdf_extract::output_doc(&doc, &mut collector)?;
    Ok(collector.into_pages())
}

/// Read a PDF and detect its candidate tables.
pub fn read_pdf_tables(bytes: &[u8]) -> Result<Vec<Table>> {
    // pdf-extract panics on some malformed documents
    let pages = std::panic::catch_unwind(|| read_layout(bytes))
        .map_err(|_| ExtractionError::Pdf("could not read PDF document".to_string()))?
        .map_err(|e| ExtractionError::Pdf(e.to_string()))?;

    Ok(tables_from_layout(&pages))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run at (x, y) with 5pt per character and a 10pt font.
    fn tb(text: &str, x: f64, y: f64) -> TextBox {
        TextBox {
            text: text.to_string(),
            x,
            x_end: x + 5.0 * text.len() as f64,
            y,
            size: 10.0,
        }
    }

    fn page(boxes: Vec<TextBox>) -> PageLayout {
        PageLayout { page: 1, boxes }
    }

    #[test]
    fn test_cluster_values() {
        assert_eq!(cluster_values(&[20.0, 10.0, 11.0, 21.0, 40.0], 2.0), vec![10.5, 20.5, 40.0]);
        assert!(cluster_values(&[], 1.0).is_empty());
    }

    #[test]
    fn test_detects_single_table() {
        let layout = page(vec![
            tb("Statement of Account", 72.0, 80.0),
            tb("Date", 72.0, 100.0),
            tb("Narration", 250.0, 100.0),
            tb("Closing", 450.0, 100.0),
            tb("01/04/2024", 72.0, 114.0),
            tb("NEFT SALARY", 250.0, 114.0),
            tb("1,200.00", 445.0, 114.0),
            tb("02/04/2024", 72.0, 128.0),
            tb("ATM WDL", 250.0, 128.0),
            tb("1,100.00", 445.0, 128.0),
            tb("Page 1 of 2", 72.0, 400.0),
        ]);
        let tables = detect_tables(&layout);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].columns(), &["Date", "Narration", "Closing"]);
        assert_eq!(tables[0].row_count(), 2);
        assert_eq!(tables[0].rows()[1][2], "1,100.00");
    }

    #[test]
    fn test_runs_on_one_baseline_ignore_drawing_order() {
        let layout = page(vec![
            tb("Closing", 450.0, 100.0),
            tb("Date", 72.0, 100.4),
            tb("10.00", 450.0, 114.0),
            tb("01/04/2024", 72.0, 113.8),
        ]);
        let tables = detect_tables(&layout);
        assert_eq!(tables[0].columns(), &["Date", "Closing"]);
        assert_eq!(tables[0].rows()[0], vec!["01/04/2024", "10.00"]);
    }

    #[test]
    fn test_missing_cell_keeps_column_position() {
        let layout = page(vec![
            tb("Date", 72.0, 100.0),
            tb("Narration", 250.0, 100.0),
            tb("Closing", 450.0, 100.0),
            tb("01/04/2024", 72.0, 114.0),
            tb("900.00", 455.0, 114.0),
        ]);
        let tables = detect_tables(&layout);
        assert_eq!(tables[0].rows()[0], vec!["01/04/2024", "", "900.00"]);
    }

    #[test]
    fn test_vertical_gap_splits_tables() {
        let layout = page(vec![
            tb("Opening", 72.0, 100.0),
            tb("Credits", 250.0, 100.0),
            tb("500.00", 72.0, 114.0),
            tb("900.00", 250.0, 114.0),
            tb("Date", 72.0, 160.0),
            tb("Closing", 250.0, 160.0),
            tb("01/04/2024", 72.0, 174.0),
            tb("1,200.00", 250.0, 174.0),
        ]);
        let tables = detect_tables(&layout);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].columns(), &["Opening", "Credits"]);
        assert_eq!(tables[1].columns(), &["Date", "Closing"]);
        assert_eq!(tables[1].row_count(), 1);
    }

    #[test]
    fn test_wrapped_narration_continues_row() {
        let layout = page(vec![
            tb("Date", 72.0, 100.0),
            tb("Narration", 250.0, 100.0),
            tb("Closing", 450.0, 100.0),
            tb("01/04/2024", 72.0, 114.0),
            tb("UPI/998", 250.0, 114.0),
            tb("10.00", 450.0, 114.0),
            tb("grocery", 250.0, 128.0),
            tb("02/04/2024", 72.0, 142.0),
            tb("ATM", 250.0, 142.0),
            tb("5.00", 450.0, 142.0),
        ]);
        let tables = detect_tables(&layout);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows()[0][1], "UPI/998 grocery");
        assert_eq!(tables[0].row_count(), 2);
    }

    #[test]
    fn test_pages_are_scanned_in_order() {
        let pages = vec![
            PageLayout {
                page: 1,
                boxes: vec![tb("Date", 72.0, 100.0), tb("Closing", 250.0, 100.0), tb("01/04/2024", 72.0, 114.0), tb("10", 250.0, 114.0)],
            },
            PageLayout {
                page: 2,
                boxes: vec![tb("Date", 72.0, 100.0), tb("Closing", 250.0, 100.0), tb("02/04/2024", 72.0, 114.0), tb("20", 250.0, 114.0)],
            },
        ];
        let tables = tables_from_layout(&pages);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows()[0][1], "10");
        assert_eq!(tables[1].rows()[0][1], "20");
    }

    #[test]
    fn test_collector_splits_runs_on_wide_gaps() {
        let media_box = MediaBox {
            llx: 0.0,
            lly: 0.0,
            urx: 612.0,
            ury: 792.0,
        };
        let mut dev = LayoutCollector::default();
        dev.begin_page(1, &media_box, None).unwrap();
        // 10pt glyphs, each 0.5 em wide
        for (i, ch) in ["A", "T", "M", " ", "W", "D", "L"].iter().enumerate() {
            let trm = Transform::row_major(1.0, 0.0, 0.0, 1.0, 72.0 + 5.0 * i as f64, 700.0);
            dev.output_character(&trm, 0.5, 0.0, 10.0, ch).unwrap();
        }
        let trm = Transform::row_major(1.0, 0.0, 0.0, 1.0, 450.0, 700.0);
        dev.output_character(&trm, 0.5, 0.0, 10.0, "9").unwrap();
        dev.end_page().unwrap();

        let pages = dev.into_pages();
        assert_eq!(pages.len(), 1);
        let texts: Vec<_> = pages[0].boxes.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["ATM WDL", "9"]);
        assert_eq!(pages[0].boxes[0].y, 92.0);
        assert_eq!(pages[0].boxes[0].x_end, 107.0);
    }

    #[test]
    fn test_garbage_bytes_are_a_pdf_error() {
        let err = read_pdf_tables(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::Pdf(_)));
    }
}
