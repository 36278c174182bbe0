//! Inner join of the three source tables.
//!
//! The join key is the exact name string. Names missing from any source are
//! dropped, and duplicate names in a source multiply out (Cartesian product
//! for that key). Both are reported in `MergeSummary` rather than repaired.

use std::collections::{BTreeSet, HashMap};

use tracing::{info, warn};

use crate::domain::{MergedRecord, StatKind, StatRecord, TypeRecord, UsageRecord};

/// Merge output: joined rows plus bookkeeping about what was lost or multiplied.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedDataset {
    pub records: Vec<MergedRecord>,
    pub summary: MergeSummary,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergeSummary {
    pub stat_rows: usize,
    pub usage_rows: usize,
    pub type_rows: usize,
    pub merged_rows: usize,
    /// Usage names with no stats or type row (e.g. spelling differences).
    pub unmatched_usage: Vec<String>,
    /// Names that appear more than once in at least one source.
    pub duplicate_names: Vec<String>,
}

/// Inner-join stats, usage and types on name and derive the ratio fields.
///
/// Output is sorted by name; rows sharing a name keep source order
/// (stats row, then usage row, then type row).
pub fn merge(stats: &[StatRecord], usage: &[UsageRecord], types: &[TypeRecord]) -> MergedDataset {
    let usage_by_name = index_by_name(usage, |u| u.name.as_str());
    let types_by_name = index_by_name(types, |t| t.name.as_str());
    let stats_by_name = index_by_name(stats, |s| s.name.as_str());

    let mut records = Vec::new();
    for stat in stats {
        let (Some(usage_rows), Some(type_rows)) = (
            usage_by_name.get(stat.name.as_str()),
            types_by_name.get(stat.name.as_str()),
        ) else {
            continue;
        };
        for usage in usage_rows {
            for typing in type_rows {
                records.push(join_row(stat, usage, typing));
            }
        }
    }
    // Stable: equal names keep their nested-loop order.
    records.sort_by(|a, b| a.name.cmp(&b.name));

    let duplicate_names: Vec<String> = [
        duplicates(&stats_by_name),
        duplicates(&usage_by_name),
        duplicates(&types_by_name),
    ]
    .into_iter()
    .flatten()
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect();

    let unmatched_usage: Vec<String> = usage
        .iter()
        .filter(|u| {
            !stats_by_name.contains_key(u.name.as_str())
                || !types_by_name.contains_key(u.name.as_str())
        })
        .map(|u| u.name.clone())
        .collect();

    for name in &duplicate_names {
        warn!(name = name.as_str(), "duplicate join key, rows multiply out");
    }
    if !unmatched_usage.is_empty() {
        warn!(
            count = unmatched_usage.len(),
            "usage names without a stats/type match were dropped"
        );
    }

    let summary = MergeSummary {
        stat_rows: stats.len(),
        usage_rows: usage.len(),
        type_rows: types.len(),
        merged_rows: records.len(),
        unmatched_usage,
        duplicate_names,
    };
    info!(
        stats = summary.stat_rows,
        usage = summary.usage_rows,
        types = summary.type_rows,
        merged = summary.merged_rows,
        "merged sources"
    );

    MergedDataset { records, summary }
}

fn join_row(stat: &StatRecord, usage: &UsageRecord, typing: &TypeRecord) -> MergedRecord {
    let total = f64::from(stat.total);
    let mut standardized = [0.0; 6];
    for kind in StatKind::ALL {
        standardized[kind.index()] = f64::from(stat.get(kind)) / total;
    }

    MergedRecord {
        name: stat.name.clone(),
        stats: stat.clone(),
        usage: usage.clone(),
        type1: typing.type1,
        type2: typing.type2,
        standardized,
        has_type2: typing.type2.is_some(),
    }
}

fn index_by_name<'a, T>(
    rows: &'a [T],
    key: impl Fn(&'a T) -> &'a str,
) -> HashMap<&'a str, Vec<&'a T>> {
    let mut map: HashMap<&str, Vec<&T>> = HashMap::new();
    for row in rows {
        map.entry(key(row)).or_default().push(row);
    }
    map
}

fn duplicates<'a, T>(index: &HashMap<&'a str, Vec<&T>>) -> Vec<String> {
    index
        .iter()
        .filter(|(_, rows)| rows.len() > 1)
        .map(|(name, _)| name.to_string())
        .collect()
}
