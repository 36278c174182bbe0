//! Competitive usage source: a pipe-delimited plaintext report.
//!
//! Report layout (Smogon monthly usage stats, `gen8ou-0.txt`):
//!
//! ```text
//!  Total battles: 1234567
//!  Avg. weight/team: 1.0
//!  + ---- + ------------------ + --------- + ------ + ------- + ------ + ------- +
//!  | Rank | Pokemon            | Usage %   | Raw    | %       | Real   | %       |
//!  + ---- + ------------------ + --------- + ------ + ------- + ------ + ------- +
//!  | 1    | Landorus-Therian   | 48.12345% | 123456 | 45.123% | 98765  | 44.321% |
//!  + ---- + ------------------ + --------- + ------ + ------- + ------ + ------- +
//! ```
//!
//! Every line is split on `|` with the `csv` reader; the leading and trailing
//! pipes produce empty outer fields, so data cells sit at offsets 1..=7.

use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::domain::UsageRecord;
use crate::error::AppError;

pub const DEFAULT_URL: &str = "https://www.smogon.com/stats/2020-09/gen8ou-0.txt";

/// Known-good reference row used as a post-parse smoke test.
pub const REFERENCE_RANK: u32 = 30;
pub const REFERENCE_REAL: u64 = 162_853;

/// Banner + separator + header + separator, as of the 2020 report format.
const FALLBACK_SKIP_ROWS: usize = 5;

const COL_RANK: usize = 1;
const COL_NAME: usize = 2;
const COL_USAGE: usize = 3;
const COL_RAW: usize = 4;
const COL_RAW_PCT: usize = 5;
const COL_REAL: usize = 6;
const COL_REAL_PCT: usize = 7;
const MIN_FIELDS: usize = COL_REAL_PCT + 1;

/// Parsed usage report: rows plus banner metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageReport {
    /// `Total battles:` from the banner, if present.
    pub battles: Option<u64>,
    pub records: Vec<UsageRecord>,
}

/// Parse the usage report (no reference check).
pub fn parse_usage(text: &str) -> Result<UsageReport, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut lines = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            AppError::integrity(format!("usage report line {}: {e}", idx + 1))
        })?;
        lines.push(record);
    }

    let battles = lines.iter().find_map(parse_battles);
    let window = select_window(&lines)?;

    let mut records = Vec::with_capacity(window.len());
    for line in window {
        records.push(parse_row(line)?);
    }

    if records.is_empty() {
        return Err(AppError::integrity("usage report has no data rows"));
    }

    info!(rows = records.len(), battles, "parsed usage report");
    Ok(UsageReport { battles, records })
}

/// Rank contiguity plus the known reference row.
pub fn validate_usage(records: &[UsageRecord]) -> Result<(), AppError> {
    for (idx, record) in records.iter().enumerate() {
        let expected = idx as u32 + 1;
        if record.rank != expected {
            return Err(AppError::integrity(format!(
                "usage ranks are not contiguous: row {} ({}) has rank {}, expected {expected}",
                idx + 1,
                record.name,
                record.rank
            )));
        }
    }

    let reference = records
        .iter()
        .find(|r| r.rank == REFERENCE_RANK)
        .ok_or_else(|| {
            AppError::integrity(format!(
                "usage report has no row with reference rank {REFERENCE_RANK}"
            ))
        })?;

    if reference.real != REFERENCE_REAL {
        return Err(AppError::integrity(format!(
            "usage rank {REFERENCE_RANK} ({}) has real count {}, expected {REFERENCE_REAL}",
            reference.name, reference.real
        )));
    }
    Ok(())
}

/// Data rows: everything between the header row and the closing separator.
fn select_window(lines: &[StringRecord]) -> Result<&[StringRecord], AppError> {
    let header = lines
        .iter()
        .position(|l| l.get(COL_RANK).is_some_and(|c| c.eq_ignore_ascii_case("rank")));

    let start = match header {
        Some(idx) => {
            debug!(line = idx + 1, "usage header row found");
            // Skip the separator under the header.
            let mut start = idx + 1;
            while lines.get(start).is_some_and(is_separator) {
                start += 1;
            }
            start
        }
        None => {
            warn!(
                skip = FALLBACK_SKIP_ROWS,
                "usage header row not found, skipping fixed banner rows"
            );
            FALLBACK_SKIP_ROWS
        }
    };

    let rest = lines.get(start..).unwrap_or(&[]);
    let end = rest
        .iter()
        .position(|l| is_separator(l) || l.len() < MIN_FIELDS)
        .unwrap_or(rest.len());
    Ok(&rest[..end])
}

fn is_separator(line: &StringRecord) -> bool {
    line.len() == 1 && line.get(0).is_some_and(|c| c.starts_with('+'))
}

fn parse_battles(line: &StringRecord) -> Option<u64> {
    if line.len() != 1 {
        return None;
    }
    let text = line.get(0)?;
    let value = text.strip_prefix("Total battles:")?;
    value.trim().parse::<u64>().ok()
}

fn parse_row(line: &StringRecord) -> Result<UsageRecord, AppError> {
    let cell = |idx: usize| line.get(idx).unwrap_or("");
    let name = cell(COL_NAME).to_string();
    if name.is_empty() {
        return Err(AppError::integrity(format!(
            "usage row with rank '{}' has an empty name",
            cell(COL_RANK)
        )));
    }

    let rank = cell(COL_RANK).parse::<u32>().map_err(|_| {
        AppError::coercion(format!("{name}: rank '{}' is not an integer", cell(COL_RANK)))
    })?;
    if rank == 0 {
        return Err(AppError::coercion(format!("{name}: rank must be >= 1")));
    }

    Ok(UsageRecord {
        rank,
        usage_percent: parse_percent(cell(COL_USAGE), &name, "Usage %")?,
        raw: parse_count(cell(COL_RAW), &name, "Raw")?,
        raw_percent: parse_percent(cell(COL_RAW_PCT), &name, "Raw %")?,
        real: parse_count(cell(COL_REAL), &name, "Real")?,
        real_percent: parse_percent(cell(COL_REAL_PCT), &name, "Real %")?,
        name,
    })
}

/// `"12.34%"` -> `0.1234`.
pub fn parse_percent(raw: &str, name: &str, column: &str) -> Result<f64, AppError> {
    let digits = raw.trim().strip_suffix('%').ok_or_else(|| {
        AppError::coercion(format!("{name}: {column} value '{raw}' is not a percentage"))
    })?;
    let v = digits.trim().parse::<f64>().map_err(|_| {
        AppError::coercion(format!("{name}: {column} value '{raw}' is not a percentage"))
    })?;
    let fraction = v / 100.0;
    if !(0.0..=1.0).contains(&fraction) {
        return Err(AppError::coercion(format!(
            "{name}: {column} value '{raw}' is outside 0%..100%"
        )));
    }
    Ok(fraction)
}

fn parse_count(raw: &str, name: &str, column: &str) -> Result<u64, AppError> {
    raw.trim().parse::<u64>().map_err(|_| {
        AppError::coercion(format!("{name}: {column} value '{raw}' is not a count"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const REPORT: &str = " Total battles: 2048
 Avg. weight/team: 1.0
 + ---- + ------------------ + --------- + ------ + ------- + ------ + ------- +
 | Rank | Pokemon            | Usage %   | Raw    | %       | Real   | %       |
 + ---- + ------------------ + --------- + ------ + ------- + ------ + ------- +
 | 1    | Landorus-Therian   | 48.12345% | 300000 | 45.123% | 250000 | 44.000% |
 | 2    | Dragapult          | 30.50000% | 200000 | 30.000% | 162853 | 29.500% |
 + ---- + ------------------ + --------- + ------ + ------- + ------ + ------- +
";

    #[test]
    fn parses_window_and_coerces_cells() {
        let report = parse_usage(REPORT).unwrap();
        assert_eq!(report.battles, Some(2048));
        assert_eq!(report.records.len(), 2);

        let first = &report.records[0];
        assert_eq!(first.rank, 1);
        assert_eq!(first.name, "Landorus-Therian");
        assert!((first.usage_percent - 0.4812345).abs() < 1e-12);
        assert_eq!(first.raw, 300_000);
        assert!((first.raw_percent - 0.45123).abs() < 1e-12);
        assert_eq!(first.real, 250_000);
        assert!((first.real_percent - 0.44).abs() < 1e-12);
    }

    #[test]
    fn percent_strings_become_fractions() {
        assert!((parse_percent("12.34%", "x", "c").unwrap() - 0.1234).abs() < 1e-12);
        assert!((parse_percent(" 100% ", "x", "c").unwrap() - 1.0).abs() < 1e-12);
        let err = parse_percent("12.34", "x", "c").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeCoercion);
        assert!(parse_percent("140%", "x", "c").is_err());
        assert!(parse_percent("abc%", "x", "c").is_err());
    }

    #[test]
    fn non_numeric_count_is_a_coercion_failure() {
        let bad = REPORT.replace("| 300000 |", "| 3e5x   |");
        let err = parse_usage(&bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeCoercion);
    }

    #[test]
    fn ranks_must_be_contiguous_from_one() {
        let mut records = parse_usage(REPORT).unwrap().records;
        records[1].rank = 3;
        let err = validate_usage(&records).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaIntegrity);
        assert!(err.message().contains("not contiguous"));

        let mut records = parse_usage(REPORT).unwrap().records;
        records[1].rank = 1;
        let err = validate_usage(&records).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaIntegrity);
    }

    #[test]
    fn reference_rank_must_carry_known_real_count() {
        let mut records = parse_usage(REPORT).unwrap().records;
        // Pad to rank 30 with filler rows.
        for rank in 3..=30u32 {
            records.push(UsageRecord {
                rank,
                name: format!("Filler{rank}"),
                usage_percent: 0.01,
                raw: 10,
                raw_percent: 0.01,
                real: if rank == 30 { REFERENCE_REAL } else { 5 },
                real_percent: 0.01,
            });
        }
        validate_usage(&records).unwrap();

        records[29].real = 1;
        let err = validate_usage(&records).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaIntegrity);
    }

    #[test]
    fn falls_back_to_fixed_banner_offset() {
        let headerless = REPORT.replace("| Rank |", "| #    |");
        let report = parse_usage(&headerless).unwrap();
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[1].name, "Dragapult");
    }
}
