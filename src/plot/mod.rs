//! Terminal (ASCII) and file (SVG) plots of the merged table.

pub mod ascii;
pub mod svg;
