//! Read/write merged dataset JSON files.
//!
//! Dataset JSON is the portable form of one run:
//! - the three source URLs and a generation timestamp
//! - every merged record, including derived ratios
//!
//! `pku plot --dataset` reloads it and re-runs analysis and plots offline.
//! The schema is defined by `domain::DatasetFile`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::Utc;

use crate::domain::{DatasetFile, MergedRecord, SourceUrls};
use crate::error::AppError;

pub const TOOL_NAME: &str = "pku";

/// Snapshot the merged rows with their provenance.
pub fn build_dataset(sources: &SourceUrls, records: &[MergedRecord]) -> DatasetFile {
    DatasetFile {
        tool: TOOL_NAME.to_string(),
        generated_at: Utc::now(),
        stats_url: sources.stats.clone(),
        usage_url: sources.usage.clone(),
        types_url: sources.types.clone(),
        records: records.to_vec(),
    }
}

pub fn write_dataset_json(path: &Path, dataset: &DatasetFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| {
            AppError::io(format!(
                "Failed to create dataset JSON '{}': {e}",
                path.display()
            ))
        })?;
    serde_json::to_writer_pretty(file, dataset)
        .map_err(|e| AppError::io(format!("Failed to write dataset JSON: {e}")))?;
    Ok(())
}

pub fn read_dataset_json(path: &Path) -> Result<DatasetFile, AppError> {
    let file = File::open(path)
        .map_err(|e| {
            AppError::io(format!(
                "Failed to open dataset JSON '{}': {e}",
                path.display()
            ))
        })?;
    let dataset: DatasetFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::config(format!("Invalid dataset JSON '{}': {e}", path.display())))?;
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testutil::roster;
    use crate::error::ErrorKind;

    #[test]
    fn dataset_json_reads_back_what_was_written() {
        let sources = SourceUrls {
            stats: "https://example.test/stats".to_string(),
            usage: "https://example.test/usage".to_string(),
            types: "https://example.test/types".to_string(),
        };
        let dataset = build_dataset(&sources, &roster());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.json");

        write_dataset_json(&path, &dataset).unwrap();
        let back = read_dataset_json(&path).unwrap();

        assert_eq!(back.tool, "pku");
        assert_eq!(back.usage_url, sources.usage);
        assert_eq!(back.records.len(), 12);
        assert_eq!(back.records[0].name, "Alpha");
        assert_eq!(back.records[0].type2, dataset.records[0].type2);
    }

    #[test]
    fn malformed_dataset_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ \"tool\": \"pku\" ").unwrap();
        assert_eq!(read_dataset_json(&path).unwrap_err().kind(), ErrorKind::Config);

        let missing = dir.path().join("missing.json");
        assert_eq!(read_dataset_json(&missing).unwrap_err().kind(), ErrorKind::Io);
    }
}
