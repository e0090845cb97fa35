//! Column-level cleaning passes. Each pass checks its column before touching
//! any cell, so a failed pass leaves the table as it was.

use serde_json::Value;

use crate::error::{PipelineError, Result};
use crate::table::Table;

/// Replaces nulls in `column` with `default`.
pub fn fill_missing<'t>(table: &'t mut Table, column: &str, default: &str) -> Result<&'t mut Table> {
    let idx = table.require_column(column)?;
    for row in table.rows_mut() {
        if row[idx].is_null() {
            row[idx] = Value::String(default.to_string());
        }
    }
    Ok(table)
}

/// Trims and lowercases every value in `column`. Nulls are left alone.
pub fn normalize_text<'t>(table: &'t mut Table, column: &str) -> Result<&'t mut Table> {
    map_text(table, column, |s| s.trim().to_lowercase())
}

/// Uppercases and trims every value in `column`. Nulls are left alone.
pub fn normalize_status<'t>(table: &'t mut Table, column: &str) -> Result<&'t mut Table> {
    map_text(table, column, |s| s.to_uppercase().trim().to_string())
}

fn map_text<'t, F>(table: &'t mut Table, column: &str, f: F) -> Result<&'t mut Table>
where
    F: Fn(&str) -> String,
{
    let idx = table.require_column(column)?;
    if let Some(row) = table
        .rows()
        .iter()
        .position(|r| !matches!(r[idx], Value::Null | Value::String(_)))
    {
        return Err(PipelineError::NotText {
            column: column.to_string(),
            row,
        });
    }

    for row in table.rows_mut() {
        if let Value::String(s) = &mut row[idx] {
            *s = f(s);
        }
    }
    Ok(table)
}
