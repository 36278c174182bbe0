//! Per-column descriptive statistics.

use crate::analysis::Column;
use crate::domain::MergedRecord;
use crate::math::{mean, quantile_sorted, sorted, std_dev};

/// Summary of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub label: String,
    pub n: usize,
    pub mean: f64,
    /// `NaN` with fewer than two values.
    pub sd: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Summarize `values`; `None` when empty.
pub fn describe(label: &str, values: &[f64]) -> Option<ColumnSummary> {
    let s = sorted(values);
    Some(ColumnSummary {
        label: label.to_string(),
        n: values.len(),
        mean: mean(values)?,
        sd: std_dev(values).unwrap_or(f64::NAN),
        min: *s.first()?,
        q1: quantile_sorted(&s, 0.25)?,
        median: quantile_sorted(&s, 0.5)?,
        q3: quantile_sorted(&s, 0.75)?,
        max: *s.last()?,
    })
}

/// Summaries for every numeric column of the merged table, in report order.
pub fn describe_dataset(records: &[MergedRecord]) -> Vec<ColumnSummary> {
    Column::report_order()
        .into_iter()
        .filter_map(|col| describe(&col.label(), &col.values(records)))
        .collect()
}
