//! `poke-usage` library crate.
//!
//! The binary (`pku`) is a thin wrapper around this library so that:
//!
//! - the scrape/merge/analysis pipeline is testable without spawning processes
//!   or touching the network
//! - modules are reusable (e.g. a notebook reading the exported dataset)

pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
