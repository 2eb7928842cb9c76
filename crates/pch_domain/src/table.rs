use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A cell is either a value or null (missing in the source).
pub type Cell = Option<String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("row {row} has {got} cells, expected {expected}")]
    RowWidth { row: usize, got: usize, expected: usize },

    #[error("Column '{column}' not found. Available: {available:?}")]
    MissingColumn { column: String, available: Vec<String> },
}

/// Column-named rows. Every row has exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Single-column table, handy for prompt lists.
    pub fn from_column<S: Into<String>>(column: &str, values: impl IntoIterator<Item = S>) -> Self {
        let mut table = Self::new([column]);
        table.rows = values.into_iter().map(|v| vec![Some(v.into())]).collect();
        table
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                row: self.rows.len(),
                got: row.len(),
                expected: self.columns.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, TableError> {
        self.column_index(name).ok_or_else(|| TableError::MissingColumn {
            column: name.to_string(),
            available: self.columns.clone(),
        })
    }

    /// Index of `name`, appending an all-null column if it does not exist yet.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(None);
        }
        self.columns.len() - 1
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column)?.as_deref()
    }

    pub fn set(&mut self, row: usize, column: usize, value: impl Into<String>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = Some(value.into());
        }
    }

    /// Cell text when present and not blank after trimming.
    pub fn non_blank(&self, row: usize, column: usize) -> Option<&str> {
        self.get(row, column).filter(|s| !s.trim().is_empty())
    }

    /// Keep only the first `n` rows.
    pub fn truncate(&mut self, n: usize) {
        self.rows.truncate(n);
    }
}
