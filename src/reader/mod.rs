//! Tabular source readers
//!
//! Readers turn an external data source into a Polars DataFrame of
//! attribute (and possibly WKT geometry) columns. They know nothing about
//! CRS or spatial semantics; [`crate::SpatialTable::from_existing_source`]
//! layers those on top. IO failures surface as `Io`, undecodable content as
//! `Format`.

use crate::error::{GeoFrameError, Result};
use polars::prelude::*;
use std::path::PathBuf;
use tracing::debug;

/// Trait for tabular source readers.
pub trait Reader {
    /// Read the source into a DataFrame.
    fn read(&self) -> Result<DataFrame>;
}

/// Delimited-text reader backed by Polars' CSV support.
#[derive(Debug, Clone)]
pub struct CsvReader {
    path: PathBuf,
    separator: u8,
    has_header: bool,
}

impl CsvReader {
    /// Reader for a comma-separated file with a header row.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            separator: b',',
            has_header: true,
        }
    }

    /// Use a different field separator (e.g. `b'\t'`).
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Whether the first row is a header (default `true`).
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }
}

impl Reader for CsvReader {
    fn read(&self) -> Result<DataFrame> {
        // Distinguish an unreadable file from undecodable content.
        std::fs::metadata(&self.path)?;

        let df = CsvReadOptions::default()
            .with_has_header(self.has_header)
            .with_parse_options(CsvParseOptions::default().with_separator(self.separator))
            .try_into_reader_with_file_path(Some(self.path.clone()))
            .and_then(|reader| reader.finish())
            .map_err(|e| GeoFrameError::Format(format!("CSV decode error: {}", e)))?;
        debug!(path = %self.path.display(), rows = df.height(), "read delimited source");
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,name").unwrap();
        writeln!(file, "1,oak").unwrap();
        writeln!(file, "2,pine").unwrap();
        let df = CsvReader::new(file.path()).read().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_read_with_separator() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id\tname").unwrap();
        writeln!(file, "1\toak").unwrap();
        let df = CsvReader::new(file.path())
            .with_separator(b'\t')
            .read()
            .unwrap();
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = CsvReader::new("/definitely/not/here.csv").read().unwrap_err();
        assert!(matches!(err, GeoFrameError::Io(_)));
    }
}
