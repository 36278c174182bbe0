//! Statistical analysis of the merged table.
//!
//! Everything here is a pure function of `&[MergedRecord]`, so the same code
//! serves a live report and a re-plot from a saved dataset.

pub mod describe;
pub mod groups;
pub mod regression;

use tracing::debug;

use crate::domain::{MergedRecord, StatKind};
use crate::error::AppError;
use crate::math::pearson;

pub use describe::{ColumnSummary, describe, describe_dataset};
pub use groups::{BoxStats, box_stats, rank_by_has_type2, rank_by_type1};
pub use regression::{Coefficient, PolyFit, Regression, fit_linear, fit_polynomial};

/// A numeric column of the merged table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Rank,
    Total,
    Stat(StatKind),
    Standardized(StatKind),
}

impl Column {
    /// Six stats, total, rank, then the six ratios.
    pub fn report_order() -> Vec<Column> {
        let mut cols: Vec<Column> = StatKind::ALL.iter().map(|&k| Column::Stat(k)).collect();
        cols.push(Column::Total);
        cols.push(Column::Rank);
        cols.extend(StatKind::ALL.iter().map(|&k| Column::Standardized(k)));
        cols
    }

    pub fn label(self) -> String {
        match self {
            Column::Rank => "Rank".to_string(),
            Column::Total => "Total".to_string(),
            Column::Stat(k) => k.column().to_string(),
            Column::Standardized(k) => k.standardized_column().to_string(),
        }
    }

    pub fn value(self, record: &MergedRecord) -> f64 {
        match self {
            Column::Rank => f64::from(record.usage.rank),
            Column::Total => f64::from(record.stats.total),
            Column::Stat(k) => f64::from(record.stats.get(k)),
            Column::Standardized(k) => record.standardized(k),
        }
    }

    pub fn values(self, records: &[MergedRecord]) -> Vec<f64> {
        records.iter().map(|r| self.value(r)).collect()
    }
}

/// Pearson correlation of usage rank with one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlation {
    pub column: String,
    /// `None` when either side is constant.
    pub r: Option<f64>,
}

/// Full analysis output consumed by the report and the plots.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub summaries: Vec<ColumnSummary>,
    pub correlations: Vec<Correlation>,
    pub total_fit: PolyFit,
    pub stats_fit: Regression,
    pub standardized_fit: Regression,
    pub by_type1: Vec<BoxStats>,
    pub by_has_type2: Vec<BoxStats>,
}

/// Run every analysis over the merged rows.
pub fn analyze(records: &[MergedRecord], degree: usize) -> Result<Analysis, AppError> {
    if records.is_empty() {
        return Err(AppError::analysis("merged dataset is empty"));
    }

    let rank = Column::Rank.values(records);

    let correlations = correlation_columns()
        .into_iter()
        .map(|col| Correlation {
            column: col.label(),
            r: pearson(&col.values(records), &rank),
        })
        .collect();

    let total_fit = fit_polynomial(
        &format!("Rank ~ poly(Total, {degree})"),
        &Column::Total.values(records),
        &rank,
        degree,
    )?;

    let stats_fit = fit_on(records, &rank, Column::Stat, true)?;
    let standardized_fit = fit_on(records, &rank, Column::Standardized, false)?;

    debug!(
        n = records.len(),
        total_r2 = total_fit.model.r_squared,
        stats_r2 = stats_fit.r_squared,
        standardized_r2 = standardized_fit.r_squared,
        "regressions fitted"
    );

    Ok(Analysis {
        summaries: describe_dataset(records),
        correlations,
        total_fit,
        stats_fit,
        standardized_fit,
        by_type1: rank_by_type1(records),
        by_has_type2: rank_by_has_type2(records),
    })
}

fn correlation_columns() -> Vec<Column> {
    let mut cols: Vec<Column> = StatKind::ALL.iter().map(|&k| Column::Stat(k)).collect();
    cols.extend(StatKind::ALL.iter().map(|&k| Column::Standardized(k)));
    cols.push(Column::Total);
    cols
}

fn fit_on(
    records: &[MergedRecord],
    rank: &[f64],
    column: fn(StatKind) -> Column,
    intercept: bool,
) -> Result<Regression, AppError> {
    let cols: Vec<Column> = StatKind::ALL.iter().map(|&k| column(k)).collect();
    let terms: Vec<String> = cols.iter().map(|c| c.label()).collect();
    let values: Vec<Vec<f64>> = cols.iter().map(|c| c.values(records)).collect();
    let label = format!("Rank ~ {}", terms.join(" + "));
    fit_linear(&label, &terms, &values, rank, intercept)
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::domain::{MergedRecord, PokeType, StatKind, StatRecord, UsageRecord};

    /// A merged row with the given rank and stats.
    pub fn record(
        name: &str,
        rank: u32,
        stats: [u32; 6],
        type1: PokeType,
        type2: Option<PokeType>,
    ) -> MergedRecord {
        let total: u32 = stats.iter().sum();
        let mut standardized = [0.0; 6];
        for k in StatKind::ALL {
            standardized[k.index()] = f64::from(stats[k.index()]) / f64::from(total);
        }
        MergedRecord {
            name: name.to_string(),
            stats: StatRecord {
                name: name.to_string(),
                hp: stats[0],
                atk: stats[1],
                def: stats[2],
                spa: stats[3],
                spd: stats[4],
                speed: stats[5],
                total,
                average: f64::from(total) / 6.0,
            },
            usage: UsageRecord {
                rank,
                name: name.to_string(),
                usage_percent: 0.5 / f64::from(rank),
                raw: 1000 / u64::from(rank),
                raw_percent: 0.4 / f64::from(rank),
                real: 800 / u64::from(rank),
                real_percent: 0.3 / f64::from(rank),
            },
            type1,
            type2,
            standardized,
            has_type2: type2.is_some(),
        }
    }

    /// Twelve rows with varied stats, enough for the seven-parameter fit.
    pub fn roster() -> Vec<MergedRecord> {
        use PokeType::*;
        vec![
            record("Alpha", 1, [100, 130, 95, 60, 80, 115], Dragon, Some(Ground)),
            record("Bravo", 2, [80, 120, 84, 60, 96, 110], Water, None),
            record("Charlie", 3, [95, 60, 105, 125, 95, 80], Steel, Some(Fairy)),
            record("Delta", 4, [70, 110, 70, 115, 70, 90], Fire, Some(Flying)),
            record("Echo", 5, [135, 85, 75, 75, 120, 45], Normal, None),
            record("Foxtrot", 6, [65, 90, 120, 85, 70, 60], Water, Some(Ground)),
            record("Golf", 7, [60, 55, 70, 130, 95, 125], Psychic, None),
            record("Hotel", 8, [110, 125, 100, 50, 70, 55], Fighting, None),
            record("India", 9, [75, 80, 60, 105, 60, 100], Electric, Some(Flying)),
            record("Juliet", 10, [90, 70, 85, 95, 115, 75], Fairy, None),
            record("Kilo", 11, [55, 100, 65, 55, 65, 120], Dark, Some(Ghost)),
            record("Lima", 12, [85, 95, 130, 40, 65, 30], Rock, None),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::roster;
    use super::*;

    #[test]
    fn analysis_covers_every_section() {
        let records = roster();
        let a = analyze(&records, 2).unwrap();

        assert_eq!(a.summaries.len(), 14);
        assert_eq!(a.summaries[6].label, "Total");
        assert_eq!(a.summaries[7].label, "Rank");
        assert_eq!(a.correlations.len(), 13);
        assert_eq!(a.total_fit.model.coefficients.len(), 3);
        assert_eq!(a.stats_fit.coefficients.len(), 7);
        assert_eq!(a.standardized_fit.coefficients.len(), 6);
        assert!(!a.standardized_fit.intercept);
        assert_eq!(a.by_has_type2.len(), 2);
        assert!(a.by_type1.windows(2).all(|w| w[0].median <= w[1].median));
    }

    #[test]
    fn too_few_rows_for_the_stats_fit_is_an_analysis_error() {
        let records: Vec<_> = roster().into_iter().take(5).collect();
        let err = analyze(&records, 1).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Analysis);
    }

    #[test]
    fn empty_dataset_is_rejected() {
        assert!(analyze(&[], 2).is_err());
    }

    #[test]
    fn column_values_follow_record_fields() {
        let r = &roster()[0];
        assert_eq!(Column::Rank.value(r), 1.0);
        assert_eq!(Column::Total.value(r), 580.0);
        assert_eq!(Column::Stat(StatKind::Speed).value(r), 115.0);
        assert!((Column::Standardized(StatKind::Hp).value(r) - 100.0 / 580.0).abs() < 1e-12);
        assert_eq!(Column::Standardized(StatKind::SpA).label(), "s_SpA");
    }
}
