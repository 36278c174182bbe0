//! Type-assignment source: several HTML tables, one per generation.
//!
//! Page layout assumed (Bulbapedia, "List of Pokémon by National Pokédex number"):
//!
//! ```text
//! Ndex | MS | Pokémon | Type (colspan=2)
//! ```
//!
//! Single-type species render their type as one `colspan=2` cell, so after
//! span expansion both type columns carry the same label. That duplicate is
//! the "no secondary type" sentinel and is normalized to `None` here.

use tracing::{debug, info, warn};

use crate::data::html::{ColumnSpec, HtmlTable, extract_tables};
use crate::domain::{PokeType, TypeRecord};
use crate::error::AppError;

pub const DEFAULT_URL: &str =
    "https://bulbapedia.bulbagarden.net/wiki/List_of_Pok%C3%A9mon_by_National_Pok%C3%A9dex_number";

/// Known-good rows used as a post-parse smoke test.
pub const REFERENCE_TYPE1: (&str, PokeType) = ("Poliwrath", PokeType::Water);
pub const REFERENCE_SINGLE_TYPE: &str = "Ditto";

/// Generation tables as of the Generation IX page revision: the first table is
/// the page banner, then one table per generation.
const FALLBACK_TABLES: std::ops::Range<usize> = 1..10;

const REQUIRED_LABELS: [&str; 2] = ["Pokémon", "Type"];

const COL_NAME: ColumnSpec = ColumnSpec::new("Pokémon", 0, 2);
const COL_TYPE1: ColumnSpec = ColumnSpec::new("Type", 0, 3);
const COL_TYPE2: ColumnSpec = ColumnSpec::new("Type", 1, 4);

/// Parse and concatenate every generation table (no reference check).
pub fn parse_types(html: &str) -> Result<Vec<TypeRecord>, AppError> {
    let tables = extract_tables(html)?;
    let sections = locate_tables(&tables)?;

    let mut out = Vec::new();
    for (section, table) in sections.iter().enumerate() {
        let before = out.len();
        parse_section(table, &mut out)?;
        debug!(section, rows = out.len() - before, "parsed type table");
    }

    if out.is_empty() {
        return Err(AppError::integrity("type tables have no data rows"));
    }

    info!(rows = out.len(), sections = sections.len(), "parsed type assignments");
    Ok(out)
}

/// Smoke test on two known rows.
pub fn validate_types(records: &[TypeRecord]) -> Result<(), AppError> {
    let (name, expected) = REFERENCE_TYPE1;
    let record = find(records, name)?;
    if record.type1 != expected {
        return Err(AppError::integrity(format!(
            "{name} has primary type {}, expected {expected}",
            record.type1
        )));
    }

    let record = find(records, REFERENCE_SINGLE_TYPE)?;
    if let Some(t) = record.type2 {
        return Err(AppError::integrity(format!(
            "{REFERENCE_SINGLE_TYPE} has secondary type {t}, expected none"
        )));
    }
    Ok(())
}

/// Build a record from raw type cells, collapsing the duplicate-type sentinel.
pub fn normalize_row(name: &str, type1: &str, type2: &str) -> Result<TypeRecord, AppError> {
    let primary = parse_type(type1, name)?;
    let secondary = if type2.trim().is_empty() || type2.trim().eq_ignore_ascii_case(type1.trim()) {
        None
    } else {
        Some(parse_type(type2, name)?)
    };
    Ok(TypeRecord::new(name, primary, secondary))
}

fn locate_tables(tables: &[HtmlTable]) -> Result<Vec<&HtmlTable>, AppError> {
    let found: Vec<&HtmlTable> = tables
        .iter()
        .filter(|t| t.has_labels(&REQUIRED_LABELS))
        .collect();
    if !found.is_empty() {
        return Ok(found);
    }

    warn!(
        tables = tables.len(),
        first = FALLBACK_TABLES.start,
        last = FALLBACK_TABLES.end - 1,
        "no table with type headers, using fixed table range"
    );
    let fallback: Vec<&HtmlTable> = tables
        .get(FALLBACK_TABLES.start..FALLBACK_TABLES.end.min(tables.len()))
        .unwrap_or(&[])
        .iter()
        .collect();
    if fallback.is_empty() {
        return Err(AppError::integrity(format!(
            "type page has {} tables; expected generation tables at {}..{}",
            tables.len(),
            FALLBACK_TABLES.start,
            FALLBACK_TABLES.end
        )));
    }
    Ok(fallback)
}

fn parse_section(table: &HtmlTable, out: &mut Vec<TypeRecord>) -> Result<(), AppError> {
    let name_col = table.resolve(&COL_NAME);
    let type1_col = table.resolve(&COL_TYPE1);
    let type2_col = table.resolve(&COL_TYPE2);

    for row in 0..table.rows.len() {
        let name = table.cell(row, name_col);
        if name.is_empty() {
            return Err(AppError::integrity(format!(
                "type table row {} has an empty name cell",
                row + 1
            )));
        }
        out.push(normalize_row(
            name,
            table.cell(row, type1_col),
            table.cell(row, type2_col),
        )?);
    }
    Ok(())
}

fn parse_type(raw: &str, name: &str) -> Result<PokeType, AppError> {
    PokeType::parse(raw)
        .ok_or_else(|| AppError::coercion(format!("{name}: unknown type '{raw}'")))
}

fn find<'a>(records: &'a [TypeRecord], name: &str) -> Result<&'a TypeRecord, AppError> {
    records
        .iter()
        .find(|r| r.name == name)
        .ok_or_else(|| AppError::integrity(format!("type tables have no row for {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn section(title: &str, rows: &str) -> String {
        format!(
            r#"<h2>{title}</h2>
            <table class="roundy">
              <tr><th>Ndex</th><th>MS</th><th>Pokémon</th><th colspan="2">Type</th></tr>
              {rows}
            </table>"#
        )
    }

    fn page() -> String {
        let gen1 = section(
            "Generation I",
            r#"<tr><td>#0004</td><td><img></td><td><a>Charmander</a></td><td colspan="2"><a>Fire</a></td></tr>
               <tr><td>#0062</td><td><img></td><td>Poliwrath</td><td>Water</td><td>Fighting</td></tr>
               <tr><td>#0132</td><td><img></td><td>Ditto</td><td colspan="2">Normal</td></tr>"#,
        );
        let gen2 = section(
            "Generation II",
            r#"<tr><td>#0152</td><td><img></td><td>Chikorita</td><td colspan="2">Grass</td></tr>"#,
        );
        format!(r#"<table class="banner"><tr><td>x</td></tr></table>{gen1}{gen2}"#)
    }

    #[test]
    fn concatenates_sections_in_order() {
        let records = parse_types(&page()).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Charmander", "Poliwrath", "Ditto", "Chikorita"]);
        assert_eq!(records[1].type1, PokeType::Water);
        assert_eq!(records[1].type2, Some(PokeType::Fighting));
        validate_types(&records).unwrap();
    }

    #[test]
    fn duplicate_type_becomes_absent() {
        let rec = normalize_row("Charmander", "Fire", "Fire").unwrap();
        assert_eq!(rec.type1, PokeType::Fire);
        assert_eq!(rec.type2, None);

        let rec = normalize_row("Charmander", "Fire", "").unwrap();
        assert_eq!(rec.type2, None);

        let records = parse_types(&page()).unwrap();
        assert!(records.iter().all(|r| r.type2 != Some(r.type1)));
    }

    #[test]
    fn unknown_type_is_a_coercion_failure() {
        let err = normalize_row("Missingno", "Bird", "Normal").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeCoercion);
    }

    #[test]
    fn smoke_test_detects_changed_rows() {
        let mut records = parse_types(&page()).unwrap();
        records[1].type1 = PokeType::Fighting;
        let err = validate_types(&records).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaIntegrity);

        let mut records = parse_types(&page()).unwrap();
        records[2].type2 = Some(PokeType::Ghost);
        assert!(validate_types(&records).is_err());

        let records = parse_types(&page()).unwrap();
        let without_ditto: Vec<TypeRecord> =
            records.into_iter().filter(|r| r.name != "Ditto").collect();
        assert!(validate_types(&without_ditto).is_err());
    }

    #[test]
    fn falls_back_to_fixed_table_range() {
        // Renamed headers: no table is found by label, offsets still line up.
        let html = r#"<table class="banner"><tr><td>x</td></tr></table>
            <table class="roundy">
              <tr><th>Ndex</th><th>MS</th><th>Name</th><th colspan="2">Types</th></tr>
              <tr><td>#0062</td><td><img></td><td>Poliwrath</td><td>Water</td><td>Fighting</td></tr>
              <tr><td>#0132</td><td><img></td><td>Ditto</td><td colspan="2">Normal</td></tr>
            </table>"#;
        let records = parse_types(html).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Poliwrath");
        assert_eq!(records[0].type1, PokeType::Water);
        assert_eq!(records[0].type2, Some(PokeType::Fighting));
        assert_eq!(records[1].type2, None);
        validate_types(&records).unwrap();
    }
}
