//! Input/output helpers.
//!
//! - merged table export to CSV (`export`)
//! - dataset JSON read/write (`dataset`)

pub mod dataset;
pub mod export;

pub use dataset::*;
pub use export::*;
