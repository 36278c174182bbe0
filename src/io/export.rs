//! Export the merged table to CSV.
//!
//! One flat row per merged record, easy to load in spreadsheets or R/pandas.

use std::path::Path;

use serde::Serialize;

use crate::domain::{MergedRecord, StatKind};
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    name: &'a str,
    rank: u32,
    usage_percent: f64,
    raw: u64,
    raw_percent: f64,
    real: u64,
    real_percent: f64,
    type1: &'static str,
    type2: &'static str,
    has_type2: bool,
    hp: u32,
    atk: u32,
    def: u32,
    spa: u32,
    spd: u32,
    speed: u32,
    total: u32,
    average: f64,
    s_hp: f64,
    s_atk: f64,
    s_def: f64,
    s_spa: f64,
    s_spd: f64,
    s_speed: f64,
}

impl<'a> From<&'a MergedRecord> for ExportRow<'a> {
    fn from(r: &'a MergedRecord) -> Self {
        let u = &r.usage;
        let s = &r.stats;
        Self {
            name: &r.name,
            rank: u.rank,
            usage_percent: u.usage_percent,
            raw: u.raw,
            raw_percent: u.raw_percent,
            real: u.real,
            real_percent: u.real_percent,
            type1: r.type1.name(),
            type2: r.type2.map(|t| t.name()).unwrap_or(""),
            has_type2: r.has_type2,
            hp: s.hp,
            atk: s.atk,
            def: s.def,
            spa: s.spa,
            spd: s.spd,
            speed: s.speed,
            total: s.total,
            average: s.average,
            s_hp: r.standardized(StatKind::Hp),
            s_atk: r.standardized(StatKind::Atk),
            s_def: r.standardized(StatKind::Def),
            s_spa: r.standardized(StatKind::SpA),
            s_spd: r.standardized(StatKind::SpD),
            s_speed: r.standardized(StatKind::Speed),
        }
    }
}

/// Write the merged rows to a CSV file (header included).
pub fn write_merged_csv(path: &Path, records: &[MergedRecord]) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| {
            AppError::io(format!(
                "Failed to create export CSV '{}': {e}",
                path.display()
            ))
        })?;

    for r in records {
        wtr.serialize(ExportRow::from(r))
            .map_err(|e| {
                AppError::io(format!(
                    "Failed to write export CSV row for {}: {e}",
                    r.name
                ))
            })?;
    }
    wtr.flush()
        .map_err(|e| {
            AppError::io(format!(
                "Failed to flush export CSV '{}': {e}",
                path.display()
            ))
        })?;
    Ok(())
}
