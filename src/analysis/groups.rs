//! Boxplot statistics of usage rank per group.

use std::collections::BTreeMap;

use crate::domain::{MergedRecord, PokeType};
use crate::math::{quantile_sorted, sorted};

/// Whisker reach as a multiple of the interquartile range.
const WHISKER_IQR: f64 = 1.5;

/// Tukey boxplot statistics for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub label: String,
    pub n: usize,
    /// Smallest value within `q1 - 1.5 * IQR`.
    pub lower: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Largest value within `q3 + 1.5 * IQR`.
    pub upper: f64,
    pub outliers: Vec<f64>,
}

pub fn box_stats(label: &str, values: &[f64]) -> Option<BoxStats> {
    let s = sorted(values);
    let q1 = quantile_sorted(&s, 0.25)?;
    let median = quantile_sorted(&s, 0.5)?;
    let q3 = quantile_sorted(&s, 0.75)?;
    let iqr = q3 - q1;
    let lo_fence = q1 - WHISKER_IQR * iqr;
    let hi_fence = q3 + WHISKER_IQR * iqr;

    let inside: Vec<f64> = s
        .iter()
        .copied()
        .filter(|v| *v >= lo_fence && *v <= hi_fence)
        .collect();
    let outliers = s
        .iter()
        .copied()
        .filter(|v| *v < lo_fence || *v > hi_fence)
        .collect();

    Some(BoxStats {
        label: label.to_string(),
        n: s.len(),
        lower: inside.first().copied().unwrap_or(q1),
        q1,
        median,
        q3,
        upper: inside.last().copied().unwrap_or(q3),
        outliers,
    })
}

/// Usage rank grouped by primary type, ordered by median rank.
pub fn rank_by_type1(records: &[MergedRecord]) -> Vec<BoxStats> {
    let mut groups: BTreeMap<PokeType, Vec<f64>> = BTreeMap::new();
    for r in records {
        groups.entry(r.type1).or_default().push(f64::from(r.usage.rank));
    }
    order_by_median(
        groups
            .into_iter()
            .filter_map(|(t, ranks)| box_stats(t.name(), &ranks))
            .collect(),
    )
}

/// Usage rank grouped by presence of a secondary type.
pub fn rank_by_has_type2(records: &[MergedRecord]) -> Vec<BoxStats> {
    let mut single = Vec::new();
    let mut dual = Vec::new();
    for r in records {
        let rank = f64::from(r.usage.rank);
        if r.has_type2 { dual.push(rank) } else { single.push(rank) }
    }
    order_by_median(
        [box_stats("single type", &single), box_stats("dual type", &dual)]
            .into_iter()
            .flatten()
            .collect(),
    )
}

fn order_by_median(mut groups: Vec<BoxStats>) -> Vec<BoxStats> {
    groups.sort_by(|a, b| {
        a.median
            .partial_cmp(&b.median)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whiskers_stop_at_fences_and_outliers_are_listed() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 100.0];
        let b = box_stats("g", &values).unwrap();
        assert_eq!(b.n, 9);
        assert_eq!(b.q1, 3.0);
        assert_eq!(b.median, 5.0);
        assert_eq!(b.q3, 7.0);
        assert_eq!(b.lower, 1.0);
        assert_eq!(b.upper, 8.0);
        assert_eq!(b.outliers, vec![100.0]);
    }

    #[test]
    fn empty_group_has_no_box() {
        assert!(box_stats("g", &[]).is_none());
    }
}
