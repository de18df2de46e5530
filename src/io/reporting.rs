// src/io/reporting.rs

use crate::error::PolicyResult;
use crate::model::instance::ProblemInstance;
use crate::simulation::engine::PeriodRecord;
use crate::strategy::traits::Thresholds;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// One row of the exported policy table.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyRow {
    pub period: usize,
    pub mean_demand: f64,
    pub reorder_point: i64,
    pub order_up_to: i64,
}

pub fn policy_rows(instance: &ProblemInstance, thresholds: &Thresholds) -> Vec<PolicyRow> {
    instance
        .demand
        .iter()
        .zip(thresholds.reorder_points.iter().zip(&thresholds.order_up_to))
        .enumerate()
        .map(|(period, (&mean_demand, (&reorder_point, &order_up_to)))| PolicyRow {
            period,
            mean_demand,
            reorder_point,
            order_up_to,
        })
        .collect()
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> PolicyResult<()> {
    // Create a CSV writer builder
    let mut wtr = csv::Writer::from_path(path)?;

    for row in rows {
        wtr.serialize(row)?;
    }

    // Flush the buffer to ensure all data is written
    wtr.flush()?;

    info!(rows = rows.len(), path = %path.display(), "exported CSV");
    Ok(())
}

/// Writes the per-period `(s, S)` table to a CSV file.
pub fn write_policy_table(
    path: &Path,
    instance: &ProblemInstance,
    thresholds: &Thresholds,
) -> PolicyResult<()> {
    write_rows(path, &policy_rows(instance, thresholds))
}

/// Writes a simulated trace to a CSV file.
pub fn write_trace(path: &Path, history: &[PeriodRecord]) -> PolicyResult<()> {
    write_rows(path, history)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_table_has_header_and_one_row_per_period() {
        let inst = ProblemInstance::new(10.0, 1.0, 9.0, vec![3.0, 3.0]).unwrap();
        let th = Thresholds {
            reorder_points: vec![2, 1],
            order_up_to: vec![8, 5],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.csv");
        write_policy_table(&path, &inst, &th).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "period,mean_demand,reorder_point,order_up_to");
        assert_eq!(lines[1], "0,3.0,2,8");
        assert_eq!(lines[2], "1,3.0,1,5");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn trace_export_round_trips_columns() {
        let history = vec![PeriodRecord {
            period: 0,
            inventory_start: 0,
            order_placed: 8,
            demand: 3,
            inventory_end: 5,
            cost: 15.0,
        }];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.csv");
        write_trace(&path, &history).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("period,inventory_start,order_placed,demand,inventory_end,cost"));
        assert!(text.contains("0,0,8,3,5,15.0"));
    }
}
