use std::fs;
use std::path::Path;

use crate::error::{ExtractionError, Result};

/// How a source file is laid out, picked from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// `.csv`: one table, header in the first row
    Delimited,
    /// `.pdf`: any number of tables spread over pages
    TabularPdf,
}

impl SourceKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(SourceKind::Delimited),
            "pdf" => Some(SourceKind::TabularPdf),
            _ => None,
        }
    }

    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name).extension()?.to_str()?;
        Self::from_extension(ext)
    }
}

/// An uploaded statement: its name, declared kind and raw bytes
#[derive(Debug, Clone)]
pub struct RawSource {
    file_name: String,
    kind: SourceKind,
    bytes: Vec<u8>,
}

impl RawSource {
    /// Wrap in-memory content, deriving the kind from `file_name`.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let file_name = file_name.into();
        let kind = SourceKind::from_file_name(&file_name)
            .ok_or_else(|| ExtractionError::UnsupportedFileType { file_name: file_name.clone() })?;
        Ok(Self { file_name, kind, bytes })
    }

    pub fn with_kind(file_name: impl Into<String>, kind: SourceKind, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            kind,
            bytes,
        }
    }

    /// Read a statement from disk. The extension is checked before the file is opened.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let kind = SourceKind::from_file_name(&file_name)
            .ok_or_else(|| ExtractionError::UnsupportedFileType { file_name: file_name.clone() })?;
        let bytes = fs::read(path)?;
        Ok(Self { file_name, kind, bytes })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_file_name() {
        assert_eq!(SourceKind::from_file_name("bank.csv"), Some(SourceKind::Delimited));
        assert_eq!(SourceKind::from_file_name("Bank.Statement.PDF"), Some(SourceKind::TabularPdf));
        assert_eq!(SourceKind::from_file_name("ledger.xlsx"), None);
        assert_eq!(SourceKind::from_file_name("csv"), None);
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let err = RawSource::new("export.txt", b"Date,Closing\n".to_vec()).unwrap_err();
        match err {
            ExtractionError::UnsupportedFileType { file_name } => assert_eq!(file_name, "export.txt"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_path_reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("erp.CSV");
        fs::write(&path, "Date,Closing\n01/01/2024,5\n").unwrap();

        let raw = RawSource::from_path(&path).unwrap();
        assert_eq!(raw.file_name(), "erp.CSV");
        assert_eq!(raw.kind(), SourceKind::Delimited);
        assert!(raw.bytes().starts_with(b"Date,Closing"));
    }

    #[test]
    fn test_from_path_checks_extension_before_reading() {
        let err = RawSource::from_path("/does/not/exist/statement.ods").unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFileType { .. }));

        let err = RawSource::from_path("/does/not/exist/statement.csv").unwrap_err();
        assert!(matches!(err, ExtractionError::Io(_)));
    }
}
