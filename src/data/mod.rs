//! Source ingestion: fetch, parse, validate, merge.
//!
//! Each source module exposes a `parse_*` function (document -> records) and a
//! `validate_*` function (post-parse reference checks). The pipeline calls them
//! back to back so a changed upstream layout stops the run at the stage that
//! noticed it.

pub mod fetch;
pub mod html;
pub mod merge;
pub mod stats;
pub mod typing;
pub mod usage;

pub use fetch::{Fetcher, HttpFetcher};
pub use merge::{MergeSummary, MergedDataset, merge};
pub use usage::UsageReport;
