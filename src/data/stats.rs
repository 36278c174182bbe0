//! Base-stats source: one HTML table, one row per Pokemon.
//!
//! Page layout assumed (Bulbapedia, "List of Pokémon by base stats
//! (Generation VIII-present)"):
//!
//! ```text
//! # | Pokémon (image, name) | HP | Attack | Defense | Sp. Atk | Sp. Def | Speed | Total | Average
//! ```
//!
//! The table is found by its header labels. The fixed offsets below are only
//! used when the header lookup fails and describe the layout as of that page
//! revision (the stats table is the second `<table>` on the page, after the
//! navigation box).

use tracing::{info, warn};

use crate::data::html::{ColumnSpec, HtmlTable, extract_tables};
use crate::domain::StatRecord;
use crate::error::AppError;

pub const DEFAULT_URL: &str =
    "https://bulbapedia.bulbagarden.net/wiki/List_of_Pok%C3%A9mon_by_base_stats_(Generation_VIII-present)";

/// Known-good reference row used as a post-parse smoke test.
pub const REFERENCE_NAME: &str = "Arceus";
pub const REFERENCE_TOTAL: u32 = 720;

const FALLBACK_TABLE_INDEX: usize = 1;

const REQUIRED_LABELS: [&str; 7] = [
    "HP", "Attack", "Defense", "Sp. Atk", "Sp. Def", "Speed", "Total",
];

// "Pokémon" may span the image and the name cell; the name is the last.
const COL_NAME: ColumnSpec = ColumnSpec::last("Pokémon", 2);
const COL_HP: ColumnSpec = ColumnSpec::new("HP", 0, 3);
const COL_ATK: ColumnSpec = ColumnSpec::new("Attack", 0, 4);
const COL_DEF: ColumnSpec = ColumnSpec::new("Defense", 0, 5);
const COL_SPA: ColumnSpec = ColumnSpec::new("Sp. Atk", 0, 6);
const COL_SPD: ColumnSpec = ColumnSpec::new("Sp. Def", 0, 7);
const COL_SPEED: ColumnSpec = ColumnSpec::new("Speed", 0, 8);
const COL_TOTAL: ColumnSpec = ColumnSpec::new("Total", 0, 9);
const COL_AVERAGE: ColumnSpec = ColumnSpec::new("Average", 0, 10);

/// Parse the stats page into records (no reference check).
pub fn parse_stats(html: &str) -> Result<Vec<StatRecord>, AppError> {
    let tables = extract_tables(html)?;
    let table = locate_table(&tables)?;

    let name_col = table.resolve(&COL_NAME);
    let stat_cols = [
        table.resolve(&COL_HP),
        table.resolve(&COL_ATK),
        table.resolve(&COL_DEF),
        table.resolve(&COL_SPA),
        table.resolve(&COL_SPD),
        table.resolve(&COL_SPEED),
    ];
    let total_col = table.resolve(&COL_TOTAL);
    let average_col = table.resolve(&COL_AVERAGE);

    let mut out = Vec::with_capacity(table.rows.len());
    for row in 0..table.rows.len() {
        let name = table.cell(row, name_col).to_string();
        if name.is_empty() {
            return Err(AppError::integrity(format!(
                "stats table row {} has an empty name cell",
                row + 1
            )));
        }

        let mut stats = [0u32; 6];
        for (slot, &col) in stats.iter_mut().zip(stat_cols.iter()) {
            *slot = parse_stat(table.cell(row, col), &name, &table.header, col)?;
        }
        let total = parse_stat(table.cell(row, total_col), &name, &table.header, total_col)?;
        let average = parse_average(table.cell(row, average_col), &name)?;

        let record = StatRecord {
            name,
            hp: stats[0],
            atk: stats[1],
            def: stats[2],
            spa: stats[3],
            spd: stats[4],
            speed: stats[5],
            total,
            average,
        };
        check_row(&record)?;
        out.push(record);
    }

    if out.is_empty() {
        return Err(AppError::integrity("stats table has no data rows"));
    }

    info!(rows = out.len(), "parsed base stats");
    Ok(out)
}

/// Post-parse smoke test: the reference species must carry its known total.
pub fn validate_stats(records: &[StatRecord]) -> Result<(), AppError> {
    let reference = records
        .iter()
        .find(|r| r.name == REFERENCE_NAME)
        .ok_or_else(|| {
            AppError::integrity(format!(
                "stats table has no row for reference species {REFERENCE_NAME}"
            ))
        })?;

    if reference.total != REFERENCE_TOTAL {
        return Err(AppError::integrity(format!(
            "{REFERENCE_NAME} base stat total is {}, expected {REFERENCE_TOTAL}",
            reference.total
        )));
    }
    Ok(())
}

fn locate_table(tables: &[HtmlTable]) -> Result<&HtmlTable, AppError> {
    if let Some(table) = tables.iter().find(|t| t.has_labels(&REQUIRED_LABELS)) {
        return Ok(table);
    }

    warn!(
        tables = tables.len(),
        index = FALLBACK_TABLE_INDEX,
        "no table with base-stat headers, using fixed table index"
    );
    tables.get(FALLBACK_TABLE_INDEX).ok_or_else(|| {
        AppError::integrity(format!(
            "stats page has {} tables; expected the stats table at index {FALLBACK_TABLE_INDEX}",
            tables.len()
        ))
    })
}

fn check_row(record: &StatRecord) -> Result<(), AppError> {
    let sum = record.component_sum();
    if record.total != sum {
        return Err(AppError::integrity(format!(
            "{}: total {} does not equal the sum of its stats ({sum})",
            record.name, record.total
        )));
    }
    if record.total == 0 {
        return Err(AppError::integrity(format!(
            "{}: base stat total is zero",
            record.name
        )));
    }
    Ok(())
}

fn parse_stat(raw: &str, name: &str, header: &[String], col: usize) -> Result<u32, AppError> {
    raw.trim().parse::<u32>().map_err(|_| {
        let label = header.get(col).map(String::as_str).unwrap_or("?");
        AppError::coercion(format!(
            "{name}: column `{label}` value '{raw}' is not a non-negative integer"
        ))
    })
}

fn parse_average(raw: &str, name: &str) -> Result<f64, AppError> {
    let v = raw.trim().parse::<f64>().map_err(|_| {
        AppError::coercion(format!("{name}: average '{raw}' is not a number"))
    })?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(AppError::coercion(format!("{name}: average '{raw}' is not finite")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn page(rows: &str) -> String {
        format!(
            r#"<table class="navbox"><tr><td>nav</td></tr></table>
            <table class="sortable">
              <tr><th>#</th><th colspan="2">Pokémon</th><th>HP</th><th>Attack</th><th>Defense</th>
                  <th>Sp. Atk</th><th>Sp. Def</th><th>Speed</th><th>Total</th><th>Average</th></tr>
              {rows}
            </table>"#
        )
    }

    const ARCEUS: &str = r#"<tr><td>0493</td><td><img src="a.png"></td><td><a>Arceus</a></td>
        <td>120</td><td>120</td><td>120</td><td>120</td><td>120</td><td>120</td><td>720</td><td>120</td></tr>"#;
    const DITTO: &str = r#"<tr><td>0132</td><td></td><td>Ditto</td>
        <td>48</td><td>48</td><td>48</td><td>48</td><td>48</td><td>48</td><td>288</td><td>48</td></tr>"#;

    #[test]
    fn parses_and_renames_columns() {
        let html = page(&format!("{ARCEUS}{DITTO}"));
        let records = parse_stats(&html).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Arceus");
        assert_eq!(records[0].total, 720);
        assert_eq!(records[1].name, "Ditto");
        assert_eq!(records[1].speed, 48);
        assert!((records[1].average - 48.0).abs() < 1e-12);
        validate_stats(&records).unwrap();
    }

    #[test]
    fn total_must_equal_component_sum() {
        let bad = ARCEUS.replace("<td>720</td>", "<td>700</td>");
        let err = parse_stats(&page(&bad)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaIntegrity);
    }

    #[test]
    fn non_numeric_stat_is_a_coercion_failure() {
        let bad = DITTO.replace(
            "<td>48</td><td>48</td><td>48</td><td>48</td><td>48</td><td>48</td>",
            "<td>48</td><td>n/a</td><td>48</td><td>48</td><td>48</td><td>48</td>",
        );
        let err = parse_stats(&page(&bad)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeCoercion);
    }

    #[test]
    fn reference_total_mismatch_is_fatal() {
        let changed = ARCEUS.replace("<td>120</td><td>720</td>", "<td>100</td><td>700</td>");
        let records = parse_stats(&page(&changed)).unwrap();
        let err = validate_stats(&records).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaIntegrity);

        let err = validate_stats(&parse_stats(&page(DITTO)).unwrap()).unwrap_err();
        assert!(err.message().contains("no row for reference species"));
    }

    #[test]
    fn falls_back_to_fixed_table_index() {
        // Renamed headers: structural lookup fails, offsets still line up.
        let html = page(ARCEUS).replace("<th>Sp. Atk</th>", "<th>SpA</th>");
        let records = parse_stats(&html).unwrap();
        assert_eq!(records[0].spa, 120);
    }

    #[test]
    fn name_column_without_image_cell() {
        let html = r#"<table>
              <tr><th>#</th><th>Pokémon</th><th>HP</th><th>Attack</th><th>Defense</th>
                  <th>Sp. Atk</th><th>Sp. Def</th><th>Speed</th><th>Total</th><th>Average</th></tr>
              <tr><td>0493</td><td>Arceus</td>
                  <td>120</td><td>120</td><td>120</td><td>120</td><td>120</td><td>120</td><td>720</td><td>120</td></tr>
            </table>"#;
        let records = parse_stats(html).unwrap();
        assert_eq!(records[0].name, "Arceus");
        assert_eq!(records[0].hp, 120);
        validate_stats(&records).unwrap();
    }
}
