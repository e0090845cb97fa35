use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::table::Table;

pub struct StageTracker {
    run_id: String,
    stages: Vec<StageMetric>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageMetric {
    pub stage: String,
    pub rows: usize,
    pub nulls_before: usize,
    pub nulls_after: usize,
}

impl StageTracker {
    pub fn new(run_id: String) -> Self {
        StageTracker {
            run_id,
            stages: Vec::new(),
        }
    }

    /// Records a stage that touched `column`; `nulls_before` is the column's
    /// null count taken before the stage ran.
    pub fn record(&mut self, stage: &str, table: &Table, column: &str, nulls_before: usize) {
        let metric = StageMetric {
            stage: stage.to_string(),
            rows: table.len(),
            nulls_before,
            nulls_after: table.null_count(column),
        };
        println!(
            "  {:<28} rows: {:>6}  nulls: {} -> {}",
            metric.stage, metric.rows, metric.nulls_before, metric.nulls_after
        );
        debug!(
            run_id = %self.run_id,
            stage_no = self.stages.len() + 1,
            stage = %metric.stage,
            rows = metric.rows,
            nulls_before = metric.nulls_before,
            nulls_after = metric.nulls_after,
            "stage done"
        );
        self.stages.push(metric);
    }

    #[cfg(test)]
    pub fn stages(&self) -> &[StageMetric] {
        &self.stages
    }
}

pub fn new_run_id() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("run-{}", now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn records_null_delta() {
        let mut t = Table::new(vec!["biografia".into()]);
        t.push_row(vec![Value::Null]);
        t.push_row(vec![json!("x")]);

        let mut tracker = StageTracker::new("run-test".into());
        let before = t.null_count("biografia");
        t.rows_mut()[0][0] = json!("Desconocido");
        tracker.record("fill_missing:biografia", &t, "biografia", before);

        assert_eq!(tracker.run_id, "run-test");
        assert_eq!(
            tracker.stages(),
            [StageMetric {
                stage: "fill_missing:biografia".into(),
                rows: 2,
                nulls_before: 1,
                nulls_after: 0,
            }]
        );
    }

    #[test]
    fn run_ids_are_prefixed() {
        assert!(new_run_id().starts_with("run-"));
    }
}
