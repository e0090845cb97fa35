//! Inner join of two tables on a shared key column.

use std::collections::HashSet;

use itertools::Itertools;
use serde_json::{Number, Value};

use crate::error::{PipelineError, Result};
use crate::table::Table;

const LEFT_SUFFIX: &str = "_x";
const RIGHT_SUFFIX: &str = "_y";

/// One output row per (left, right) pair with equal `key`, left order first.
/// Integer and float keys compare by value and null keys match each other.
/// Text keys on one side and numeric keys on the other are an error.
/// Non-key names present on both sides get `_x`/`_y`.
pub fn combine(left: &Table, right: &Table, key: &str) -> Result<Table> {
    let left_key = left.require_column(key)?;
    let right_key = right.require_column(key)?;

    let left_kind = KeyKind::of(left, left_key);
    let right_kind = KeyKind::of(right, right_key);
    if left_kind.conflicts_with(right_kind) {
        return Err(PipelineError::KeyTypeMismatch {
            column: key.to_string(),
            left: left_kind.as_str(),
            right: right_kind.as_str(),
        });
    }

    let right_cols: Vec<usize> = (0..right.columns().len())
        .filter(|&i| i != right_key)
        .collect();

    let left_names: HashSet<&str> = left.columns().iter().map(String::as_str).collect();
    let right_names: HashSet<&str> = right_cols
        .iter()
        .map(|&i| right.columns()[i].as_str())
        .collect();
    let clashes = |name: &str| name != key && left_names.contains(name) && right_names.contains(name);

    let mut columns: Vec<String> = left
        .columns()
        .iter()
        .map(|c| suffixed(c, clashes(c.as_str()), LEFT_SUFFIX))
        .collect();
    columns.extend(right_cols.iter().map(|&i| {
        let c = &right.columns()[i];
        suffixed(c, clashes(c.as_str()), RIGHT_SUFFIX)
    }));

    // Right rows grouped by key, preserving their input order.
    let groups = right
        .rows()
        .iter()
        .map(|row| (JoinKey::from_cell(&row[right_key]), row))
        .into_group_map();

    let mut out = Table::new(columns);
    for row in left.rows() {
        let Some(matches) = groups.get(&JoinKey::from_cell(&row[left_key])) else {
            continue;
        };
        for other in matches {
            let mut joined = row.clone();
            joined.extend(right_cols.iter().map(|&i| other[i].clone()));
            out.push_row(joined);
        }
    }
    Ok(out)
}

/// Hashable form of a key cell. Integral floats fold into `Int`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum JoinKey {
    Null,
    Int(i64),
    Float(u64),
    Text(String),
    Other(String),
}

impl JoinKey {
    fn from_cell(value: &Value) -> Self {
        match value {
            Value::Null => JoinKey::Null,
            Value::Number(n) => Self::from_number(n),
            Value::String(s) => JoinKey::Text(s.clone()),
            other => JoinKey::Other(other.to_string()),
        }
    }

    fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            return JoinKey::Int(i);
        }
        match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                JoinKey::Int(f as i64)
            }
            Some(f) => JoinKey::Float(f.to_bits()),
            None => JoinKey::Other(n.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum KeyKind {
    Numeric,
    Text,
    Untyped,
}

impl KeyKind {
    /// Any string makes the column textual; otherwise any number makes it numeric.
    fn of(table: &Table, idx: usize) -> Self {
        let mut kind = KeyKind::Untyped;
        for row in table.rows() {
            match row[idx] {
                Value::String(_) => return KeyKind::Text,
                Value::Number(_) => kind = KeyKind::Numeric,
                _ => {}
            }
        }
        kind
    }

    fn conflicts_with(self, other: KeyKind) -> bool {
        matches!(
            (self, other),
            (KeyKind::Numeric, KeyKind::Text) | (KeyKind::Text, KeyKind::Numeric)
        )
    }

    fn as_str(self) -> &'static str {
        match self {
            KeyKind::Numeric => "numeric",
            KeyKind::Text => "text",
            KeyKind::Untyped => "untyped",
        }
    }
}

fn suffixed(name: &str, clash: bool, suffix: &str) -> String {
    if clash {
        format!("{}{}", name, suffix)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users(ids: &[i64]) -> Table {
        let mut t = Table::new(vec!["id_usuario".into(), "nombre".into()]);
        for id in ids {
            t.push_row(vec![json!(id), json!(format!("user{}", id))]);
        }
        t
    }

    fn posts(ids: &[i64]) -> Table {
        let mut t = Table::new(vec!["id_usuario".into(), "estado".into()]);
        for (n, id) in ids.iter().enumerate() {
            t.push_row(vec![json!(id), json!(format!("P{}", n))]);
        }
        t
    }

    #[test]
    fn row_count_matches_pairs() {
        let out = combine(&users(&[1, 2]), &posts(&[1, 1, 3]), "id_usuario").unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.column("id_usuario").unwrap().all(|v| v == &json!(1)));
        assert_eq!(out.columns(), ["id_usuario", "nombre", "estado"]);
        assert_eq!(out.get(0, "estado"), Some(&json!("P0")));
        assert_eq!(out.get(1, "estado"), Some(&json!("P1")));
    }

    #[test]
    fn many_to_many_pairs() {
        let out = combine(&users(&[1, 1, 2]), &posts(&[2, 1, 1]), "id_usuario").unwrap();
        // 2 users with id 1 x 2 posts with id 1, plus one pair for id 2
        assert_eq!(out.len(), 5);
        let ids: Vec<Value> = out.column("id_usuario").unwrap().cloned().collect();
        assert_eq!(ids, vec![json!(1), json!(1), json!(1), json!(1), json!(2)]);
    }

    #[test]
    fn unmatched_rows_are_dropped() {
        let out = combine(&users(&[1, 99]), &posts(&[1, 7]), "id_usuario").unwrap();
        assert_eq!(out.len(), 1);
        assert!(out.column("id_usuario").unwrap().all(|v| v != &json!(99)));
        assert!(out.column("id_usuario").unwrap().all(|v| v != &json!(7)));
    }

    #[test]
    fn null_keys_match_each_other() {
        let mut l = users(&[1]);
        l.push_row(vec![Value::Null, json!("anon")]);
        let mut r = posts(&[2]);
        r.push_row(vec![Value::Null, json!("P")]);
        let out = combine(&l, &r, "id_usuario").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.get(0, "id_usuario"), Some(&Value::Null));
        assert_eq!(out.get(0, "nombre"), Some(&json!("anon")));
        assert_eq!(out.get(0, "estado"), Some(&json!("P")));
    }

    #[test]
    fn float_keys_match_equal_ints() {
        let mut l = Table::new(vec!["id_usuario".into(), "nombre".into()]);
        l.push_row(vec![json!(1.0), json!("b")]);
        l.push_row(vec![json!(2.5), json!("c")]);
        let out = combine(&l, &posts(&[1, 2]), "id_usuario").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.get(0, "nombre"), Some(&json!("b")));
        assert_eq!(out.get(0, "estado"), Some(&json!("P0")));
    }

    #[test]
    fn text_keys_against_numeric_keys_fail() {
        let mut l = Table::new(vec!["id_usuario".into(), "nombre".into()]);
        l.push_row(vec![json!("u1"), json!("b")]);
        match combine(&l, &posts(&[1]), "id_usuario") {
            Err(PipelineError::KeyTypeMismatch { column, left, right }) => {
                assert_eq!(column, "id_usuario");
                assert_eq!(left, "text");
                assert_eq!(right, "numeric");
            }
            other => panic!("expected KeyTypeMismatch, got {:?}", other),
        }

        let mut r = Table::new(vec!["id_usuario".into(), "estado".into()]);
        r.push_row(vec![json!("1"), json!("P")]);
        assert!(matches!(
            combine(&users(&[1]), &r, "id_usuario"),
            Err(PipelineError::KeyTypeMismatch { .. })
        ));
    }

    #[test]
    fn all_null_side_does_not_conflict() {
        let mut l = Table::new(vec!["id_usuario".into(), "nombre".into()]);
        l.push_row(vec![json!("u1"), json!("b")]);
        let mut r = posts(&[]);
        r.push_row(vec![Value::Null, json!("P")]);
        assert!(combine(&l, &r, "id_usuario").unwrap().is_empty());
    }

    #[test]
    fn clashing_columns_get_suffixes() {
        let mut r = Table::new(vec!["nombre".into(), "id_usuario".into()]);
        r.push_row(vec![json!("post title"), json!(1)]);
        let out = combine(&users(&[1]), &r, "id_usuario").unwrap();
        assert_eq!(out.columns(), ["id_usuario", "nombre_x", "nombre_y"]);
        assert_eq!(out.get(0, "nombre_x"), Some(&json!("user1")));
        assert_eq!(out.get(0, "nombre_y"), Some(&json!("post title")));
    }

    #[test]
    fn missing_key_column() {
        let r = Table::new(vec!["estado".into()]);
        assert!(matches!(
            combine(&users(&[1]), &r, "id_usuario"),
            Err(PipelineError::MissingColumn { column }) if column == "id_usuario"
        ));
    }
}
