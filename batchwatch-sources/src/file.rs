//! File-based source.
//!
//! Reads the row from a local file. Useful for demos, for air-gapped
//! deployments that export the master sheet on a schedule, and for tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{FetchError, RawRow, SourceClient, SourceRef};

/// A source that reads one row from a file on every fetch.
///
/// Two formats are understood, chosen by extension:
///
/// - `.json`: either a bare array of cells (`["147", "132", ...]`) or a
///   Sheets-style body (`{"values": [["147", ...]]}`)
/// - anything else: tab-separated text; the first non-blank line is the row,
///   matching what a copy of the sheet range pastes as
///
/// The spreadsheet id and tab of the [`SourceRef`] are ignored; only the
/// range width is used to pad the row.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    description: String,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self { path, description }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_json(&self) -> bool {
        self.path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonRow {
    Cells(Vec<Value>),
    ValueRange {
        #[serde(default)]
        values: Vec<Vec<Value>>,
    },
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_json(content: &str) -> Result<Option<Vec<String>>, FetchError> {
    let parsed: JsonRow = serde_json::from_str(content)
        .map_err(|e| FetchError::Malformed(format!("Parse error: {}", e)))?;

    let cells = match parsed {
        JsonRow::Cells(cells) if cells.is_empty() => None,
        JsonRow::Cells(cells) => Some(cells),
        JsonRow::ValueRange { values } => values.into_iter().next(),
    };

    Ok(cells.map(|c| c.into_iter().map(cell_text).collect()))
}

fn parse_tsv(content: &str) -> Option<Vec<String>> {
    content
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.split('\t').map(|c| c.trim().to_string()).collect())
}

#[async_trait]
impl SourceClient for FileSource {
    async fn fetch(&self, source: &SourceRef) -> Result<RawRow, FetchError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FetchError::Network(format!("Read error: {}", e)))?;

        let cells = if self.is_json() {
            parse_json(&content)?
        } else {
            parse_tsv(&content)
        };

        let cells = cells.ok_or_else(|| FetchError::EmptyRange(self.path.display().to_string()))?;
        debug!(path = %self.path.display(), cells = cells.len(), "row read from file");

        RawRow::conform(cells, source.width())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn source(range: &str) -> SourceRef {
        SourceRef::new("local", None, range.parse().unwrap())
    }

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_reads_tsv_row() {
        let file = write_temp(".tsv", "\n147\t132\t15\t96.3\n999\t1\n");
        let row = FileSource::new(file.path()).fetch(&source("A1:E1")).await.unwrap();
        assert_eq!(row.cells(), &["147", "132", "15", "96.3", ""]);
    }

    #[tokio::test]
    async fn test_reads_json_array() {
        let file = write_temp(".json", r#"["147", 132, null, "1,247"]"#);
        let row = FileSource::new(file.path()).fetch(&source("A1:D1")).await.unwrap();
        assert_eq!(row.cells(), &["147", "132", "", "1,247"]);
    }

    #[tokio::test]
    async fn test_reads_sheets_body() {
        let file = write_temp(".json", r#"{"range": "H2:J2", "values": [["1", "2", "3"]]}"#);
        let row = FileSource::new(file.path()).fetch(&source("H2:J2")).await.unwrap();
        assert_eq!(row.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_file_is_empty_range() {
        let file = write_temp(".tsv", "\n   \n");
        let err = FileSource::new(file.path()).fetch(&source("A1:B1")).await.unwrap_err();
        assert!(matches!(err, FetchError::EmptyRange(_)));

        let file = write_temp(".json", r#"{"range": "A1:B1"}"#);
        let err = FileSource::new(file.path()).fetch(&source("A1:B1")).await.unwrap_err();
        assert!(matches!(err, FetchError::EmptyRange(_)));
    }

    #[tokio::test]
    async fn test_invalid_json_is_malformed() {
        let file = write_temp(".json", "not valid json");
        let err = FileSource::new(file.path()).fetch(&source("A1:B1")).await.unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_network_error() {
        let err = FileSource::new("/nonexistent/row.tsv")
            .fetch(&source("A1:B1"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[test]
    fn test_description() {
        let source = FileSource::new("/tmp/row.tsv");
        assert_eq!(source.description(), "file: /tmp/row.tsv");
        assert_eq!(source.path(), Path::new("/tmp/row.tsv"));
    }
}
