//! Source references and single-row A1 ranges.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors parsing an A1 range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("invalid cell reference: {0}")]
    InvalidCell(String),

    #[error("range {0} spans more than one row")]
    MultiRow(String),

    #[error("range {0} ends before it starts")]
    Reversed(String),
}

/// A one-row rectangle of cells in A1 notation, e.g. `H2:AD2`.
///
/// Columns are zero-based internally (`A` is 0); the row is one-based as it
/// appears in the notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct A1Range {
    start_column: usize,
    end_column: usize,
    row: u32,
}

impl A1Range {
    /// Number of cells in the range.
    pub fn width(&self) -> usize {
        self.end_column - self.start_column + 1
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn start_column(&self) -> usize {
        self.start_column
    }
}

impl FromStr for A1Range {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (start, end) = s.split_once(':').unwrap_or((s, s));
        let (start_column, start_row) = parse_cell(start)?;
        let (end_column, end_row) = parse_cell(end)?;

        if start_row != end_row {
            return Err(RangeError::MultiRow(s.to_string()));
        }
        if end_column < start_column {
            return Err(RangeError::Reversed(s.to_string()));
        }

        Ok(Self {
            start_column,
            end_column,
            row: start_row,
        })
    }
}

impl TryFrom<String> for A1Range {
    type Error = RangeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<A1Range> for String {
    fn from(r: A1Range) -> Self {
        r.to_string()
    }
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            column_letters(self.start_column),
            self.row,
            column_letters(self.end_column),
            self.row
        )
    }
}

/// Split `AD2` into (29, 2).
fn parse_cell(cell: &str) -> Result<(usize, u32), RangeError> {
    let invalid = || RangeError::InvalidCell(cell.to_string());

    let split = cell.find(|c: char| c.is_ascii_digit()).ok_or_else(invalid)?;
    let (letters, digits) = cell.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }

    let mut column: usize = 0;
    for c in letters.chars() {
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        column = column
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(invalid)?;
    }

    let row: u32 = digits.parse().map_err(|_| invalid())?;
    if row == 0 {
        return Err(invalid());
    }

    Ok((column - 1, row))
}

fn column_letters(mut column: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (column % 26) as u8);
        if column < 26 {
            break;
        }
        column = column / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Identifies the upstream sheet and the single row to read from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Spreadsheet identifier (the long key in the sheet URL).
    pub spreadsheet_id: String,

    /// Tab name. Without one the first tab is read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,

    pub range: A1Range,
}

impl SourceRef {
    pub fn new(spreadsheet_id: impl Into<String>, sheet: Option<&str>, range: A1Range) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet: sheet.map(str::to_string),
            range,
        }
    }

    /// Number of cells a fetched row is padded to.
    pub fn width(&self) -> usize {
        self.range.width()
    }

    /// Range including the quoted tab name, e.g. `'MASTER SHEET'!H2:AD2`.
    pub fn a1_notation(&self) -> String {
        match &self.sheet {
            Some(sheet) => format!("'{}'!{}", sheet.replace('\'', "''"), self.range),
            None => self.range.to_string(),
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.spreadsheet_id, self.a1_notation())
    }
}
