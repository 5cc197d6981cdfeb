//! balrec-ingest: statement ingestion (CSV / tabular PDF) into cleaned balance series.

pub mod cells;
pub mod error;
pub mod extract;
pub mod parsers;
pub mod table;
pub mod types;

pub use error::ExtractionError;
pub use extract::{clean, extract, select_tables};
pub use table::Table;
pub use types::{RawSource, SourceKind};
