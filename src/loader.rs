//! Reads the user CSV and the post JSON into [`Table`]s.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde_json::{Number, Value};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::table::Table;

/// Field values read as missing, on top of the empty field.
const NA_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn load(users_path: &Path, posts_path: &Path) -> Result<(Table, Table)> {
    let users = load_users_csv(users_path)?;
    let posts = load_posts_json(posts_path)?;
    Ok((users, posts))
}

/// Parses a comma-separated file with a header row. Values are not trimmed.
/// Repeated header names become `name.1`, `name.2`, ...
pub fn load_users_csv(path: &Path) -> Result<Table> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let csv_err = |source| PipelineError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::None)
        .flexible(false)
        .from_reader(file);

    let headers = dedupe_headers(reader.headers().map_err(csv_err)?.iter());
    if headers.is_empty() {
        return Err(PipelineError::Shape {
            path: path.to_path_buf(),
            reason: "missing header row".to_string(),
        });
    }

    let mut raw: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        raw.push(record.iter().map(str::to_string).collect());
    }

    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|i| ColumnKind::infer(raw.iter().map(|r| r[i].as_str())))
        .collect();

    let mut table = Table::new(headers);
    for row in raw {
        let cells = row
            .into_iter()
            .zip(&kinds)
            .map(|(field, kind)| kind.cell(field))
            .collect();
        table.push_row(cells);
    }
    debug!(path = %path.display(), rows = table.len(), "loaded csv");
    Ok(table)
}

/// Parses a JSON array of objects. Columns are the union of keys in
/// first-seen order; absent keys become nulls.
pub fn load_posts_json(path: &Path) -> Result<Table> {
    let text = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    let doc: Value = serde_json::from_str(&text).map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let Value::Array(items) = doc else {
        return Err(PipelineError::Shape {
            path: path.to_path_buf(),
            reason: "top-level value is not an array".to_string(),
        });
    };

    let mut records = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => records.push(map),
            _ => {
                return Err(PipelineError::Shape {
                    path: path.to_path_buf(),
                    reason: format!("element {} is not an object", i),
                })
            }
        }
    }

    let mut columns: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for record in &records {
        for key in record.keys() {
            if !index.contains_key(key) {
                index.insert(key.clone(), columns.len());
                columns.push(key.clone());
            }
        }
    }

    let width = columns.len();
    let mut table = Table::new(columns);
    for record in records {
        let mut row = vec![Value::Null; width];
        for (key, value) in record {
            row[index[&key]] = value;
        }
        table.push_row(row);
    }
    debug!(path = %path.display(), rows = table.len(), "loaded json");
    Ok(table)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnKind {
    Int,
    Float,
    Text,
}

impl ColumnKind {
    fn infer<'a>(fields: impl Iterator<Item = &'a str>) -> Self {
        let mut kind = ColumnKind::Int;
        for field in fields.filter(|f| !is_missing(f)) {
            let f = field.trim();
            if kind == ColumnKind::Int && f.parse::<i64>().is_err() {
                kind = ColumnKind::Float;
            }
            if kind == ColumnKind::Float && parse_finite(f).is_none() {
                return ColumnKind::Text;
            }
        }
        kind
    }

    fn cell(self, field: String) -> Value {
        if is_missing(&field) {
            return Value::Null;
        }
        match self {
            ColumnKind::Int => field
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or(Value::String(field)),
            ColumnKind::Float => parse_finite(field.trim())
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::String(field)),
            ColumnKind::Text => Value::String(field),
        }
    }
}

fn dedupe_headers<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut suffixes: HashMap<String, usize> = HashMap::new();
    names
        .map(|name| {
            if seen.insert(name.to_string()) {
                return name.to_string();
            }
            let n = suffixes.entry(name.to_string()).or_insert(0);
            loop {
                *n += 1;
                let candidate = format!("{}.{}", name, n);
                if seen.insert(candidate.clone()) {
                    return candidate;
                }
            }
        })
        .collect()
}

fn is_missing(field: &str) -> bool {
    field.is_empty() || NA_MARKERS.contains(&field)
}

fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}
