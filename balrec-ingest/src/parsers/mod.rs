pub mod delimited;
pub mod pdf_tables;
