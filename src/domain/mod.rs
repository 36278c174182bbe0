//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - source records (`StatRecord`, `UsageRecord`, `TypeRecord`)
//! - the joined row (`MergedRecord`) and its enumerations (`PokeType`, `StatKind`)
//! - run configuration (`ReportConfig`) and the saved dataset file (`DatasetFile`)

pub mod types;

pub use types::*;
