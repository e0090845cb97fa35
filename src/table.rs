use itertools::Itertools;
use serde_json::Value;

use crate::error::{PipelineError, Result};

const PREVIEW_CELL_WIDTH: usize = 24;

/// Column-named rows of JSON cells. Every row holds one cell per column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding with nulls or dropping extra cells so the row
    /// always matches the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<Value>] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub(crate) fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn {
                column: name.to_string(),
            })
    }

    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Value> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Cell lookup by row position and column name.
    #[cfg(test)]
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    pub fn null_count(&self, name: &str) -> usize {
        self.column(name)
            .map(|cells| cells.filter(|v| v.is_null()).count())
            .unwrap_or(0)
    }

    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Fixed-width text table of the first `n` rows.
    pub fn render_preview(&self, n: usize) -> String {
        let head = self.head(n);
        let cells: Vec<Vec<String>> = head
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| truncate(&display_cell(v), PREVIEW_CELL_WIDTH))
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = head
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(
                        truncate(name, PREVIEW_CELL_WIDTH).chars().count(),
                    ))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header = head
            .columns
            .iter()
            .zip(&widths)
            .map(|(name, w)| pad(&truncate(name, PREVIEW_CELL_WIDTH), *w))
            .join(" | ");
        let rule = "-".repeat(header.chars().count());

        let mut out = format!("{}\n{}\n", header, rule);
        for row in &cells {
            let line = row.iter().zip(&widths).map(|(c, w)| pad(c, *w)).join(" | ");
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out.push_str(&format!(
            "\n[{} rows x {} columns]",
            self.len(),
            self.columns.len()
        ));
        out
    }
}

fn display_cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    format!("{}{}", s, " ".repeat(width.saturating_sub(len)))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
