//! Tabular result model and its canonical record serialization

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Value written into every cell of a masked column.
pub const REDACTION_MARKER: &str = "***";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        actual: usize,
        expected: usize,
    },
    #[error("column '{0}' appears more than once")]
    DuplicateColumn(String),
}

/// Ordered named columns and ordered rows of JSON cell values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct RawTable {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

impl TryFrom<RawTable> for Table {
    type Error = TableError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        Table::new(raw.columns, raw.rows)
    }
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, TableError> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].contains(column) {
                return Err(TableError::DuplicateColumn(column.clone()));
            }
        }
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != columns.len() {
                return Err(TableError::RaggedRow {
                    row,
                    actual: cells.len(),
                    expected: columns.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Redact every column named in `mask_columns` that the table has.
    ///
    /// Returns the columns actually redacted, in table column order. Names
    /// the table does not have are ignored.
    pub fn mask(&mut self, mask_columns: &[String]) -> Vec<String> {
        let targets: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| mask_columns.contains(name))
            .map(|(i, _)| i)
            .collect();

        for row in &mut self.rows {
            for &i in &targets {
                row[i] = Value::String(REDACTION_MARKER.to_string());
            }
        }

        targets.iter().map(|&i| self.columns[i].clone()).collect()
    }

    /// Serialize as a JSON array of row objects whose keys follow column order.
    ///
    /// Identical tables always produce identical bytes.
    pub fn to_records_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&Records(self))
    }
}

struct Records<'a>(&'a Table);

struct Record<'a> {
    columns: &'a [String],
    cells: &'a [Value],
}

impl Serialize for Records<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.rows.len()))?;
        for cells in &self.0.rows {
            seq.serialize_element(&Record {
                columns: &self.0.columns,
                cells,
            })?;
        }
        seq.end()
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}
