//! Raw, unparsed rows.

use std::ops::Index;

use crate::FetchError;

/// One fetched row of string cells, positionally aligned with the schema.
///
/// Rows are produced fresh by every fetch and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRow {
    cells: Vec<String>,
}

impl RawRow {
    /// Wrap cells exactly as given.
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Bring cells to exactly `width`.
    ///
    /// Sheets-style APIs drop trailing blank cells, so a short row is padded
    /// with empty cells. A row wider than the requested range means the
    /// source and the range disagree and is rejected.
    pub fn conform(mut cells: Vec<String>, width: usize) -> Result<Self, FetchError> {
        if cells.len() > width {
            return Err(FetchError::Malformed(format!(
                "row has {} cells but the range is {} wide",
                cells.len(),
                width
            )));
        }
        cells.resize(width, String::new());
        Ok(Self { cells })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

impl Index<usize> for RawRow {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.cells[index]
    }
}

impl<S: Into<String>> FromIterator<S> for RawRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conform_pads_trailing_blanks() {
        let row = RawRow::conform(vec!["1".into(), "2".into()], 4).unwrap();
        assert_eq!(row.len(), 4);
        assert_eq!(row.get(1), Some("2"));
        assert_eq!(row.get(3), Some(""));
        assert_eq!(row.get(4), None);
    }

    #[test]
    fn test_conform_rejects_wide_rows() {
        let err = RawRow::conform(vec!["1".into(); 5], 4).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn test_collect() {
        let row: RawRow = ["147", "132"].into_iter().collect();
        assert_eq!(&row[0], "147");
        assert_eq!(row.cells().len(), 2);
    }
}
