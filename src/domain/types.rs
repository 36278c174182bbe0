//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - produced by the source parsers and consumed by the merger
//! - exported to CSV/JSON
//! - reloaded later for re-plotting without touching the network

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The fixed enumeration of elemental types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PokeType {
    Normal,
    Fire,
    Water,
    Grass,
    Electric,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

impl PokeType {
    pub const ALL: [PokeType; 18] = [
        PokeType::Normal,
        PokeType::Fire,
        PokeType::Water,
        PokeType::Grass,
        PokeType::Electric,
        PokeType::Ice,
        PokeType::Fighting,
        PokeType::Poison,
        PokeType::Ground,
        PokeType::Flying,
        PokeType::Psychic,
        PokeType::Bug,
        PokeType::Rock,
        PokeType::Ghost,
        PokeType::Dragon,
        PokeType::Dark,
        PokeType::Steel,
        PokeType::Fairy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PokeType::Normal => "Normal",
            PokeType::Fire => "Fire",
            PokeType::Water => "Water",
            PokeType::Grass => "Grass",
            PokeType::Electric => "Electric",
            PokeType::Ice => "Ice",
            PokeType::Fighting => "Fighting",
            PokeType::Poison => "Poison",
            PokeType::Ground => "Ground",
            PokeType::Flying => "Flying",
            PokeType::Psychic => "Psychic",
            PokeType::Bug => "Bug",
            PokeType::Rock => "Rock",
            PokeType::Ghost => "Ghost",
            PokeType::Dragon => "Dragon",
            PokeType::Dark => "Dark",
            PokeType::Steel => "Steel",
            PokeType::Fairy => "Fairy",
        }
    }

    /// Parse a type label as printed in the source tables (case-insensitive).
    pub fn parse(label: &str) -> Option<PokeType> {
        let label = label.trim();
        PokeType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(label))
    }
}

impl std::fmt::Display for PokeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The six base stats, in canonical column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    Hp,
    Atk,
    Def,
    SpA,
    SpD,
    Speed,
}

impl StatKind {
    pub const ALL: [StatKind; 6] = [
        StatKind::Hp,
        StatKind::Atk,
        StatKind::Def,
        StatKind::SpA,
        StatKind::SpD,
        StatKind::Speed,
    ];

    /// Canonical column name (after renaming the source headers).
    pub fn column(self) -> &'static str {
        match self {
            StatKind::Hp => "HP",
            StatKind::Atk => "Atk",
            StatKind::Def => "Def",
            StatKind::SpA => "SpA",
            StatKind::SpD => "SpD",
            StatKind::Speed => "Speed",
        }
    }

    /// Column name of the standardized ratio.
    pub fn standardized_column(self) -> &'static str {
        match self {
            StatKind::Hp => "s_HP",
            StatKind::Atk => "s_Atk",
            StatKind::Def => "s_Def",
            StatKind::SpA => "s_SpA",
            StatKind::SpD => "s_SpD",
            StatKind::Speed => "s_Speed",
        }
    }

    pub fn index(self) -> usize {
        match self {
            StatKind::Hp => 0,
            StatKind::Atk => 1,
            StatKind::Def => 2,
            StatKind::SpA => 3,
            StatKind::SpD => 4,
            StatKind::Speed => 5,
        }
    }
}

/// One row of the base-stats table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    pub name: String,
    pub hp: u32,
    pub atk: u32,
    pub def: u32,
    pub spa: u32,
    pub spd: u32,
    pub speed: u32,
    /// Base stat total; always equals the sum of the six components.
    pub total: u32,
    pub average: f64,
}

impl StatRecord {
    pub fn get(&self, kind: StatKind) -> u32 {
        match kind {
            StatKind::Hp => self.hp,
            StatKind::Atk => self.atk,
            StatKind::Def => self.def,
            StatKind::SpA => self.spa,
            StatKind::SpD => self.spd,
            StatKind::Speed => self.speed,
        }
    }

    pub fn component_sum(&self) -> u32 {
        StatKind::ALL.iter().map(|&k| self.get(k)).sum()
    }
}

/// One row of the competitive usage report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// 1 = most used. Ranks are dense and contiguous from 1.
    pub rank: u32,
    pub name: String,
    /// Weighted usage share, in `[0, 1]`.
    pub usage_percent: f64,
    pub raw: u64,
    pub raw_percent: f64,
    pub real: u64,
    pub real_percent: f64,
}

/// Type assignment of a species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRecord {
    pub name: String,
    pub type1: PokeType,
    /// Never equal to `type1`.
    pub type2: Option<PokeType>,
}

impl TypeRecord {
    /// Build a record, collapsing an identical secondary type to "absent".
    pub fn new(name: impl Into<String>, type1: PokeType, type2: Option<PokeType>) -> Self {
        let type2 = type2.filter(|t| *t != type1);
        Self {
            name: name.into(),
            type1,
            type2,
        }
    }
}

/// A joined row: present in all three sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub name: String,
    pub stats: StatRecord,
    pub usage: UsageRecord,
    pub type1: PokeType,
    pub type2: Option<PokeType>,
    /// `component / total` per stat, in `StatKind::ALL` order. Sums to 1.
    pub standardized: [f64; 6],
    pub has_type2: bool,
}

impl MergedRecord {
    pub fn standardized(&self, kind: StatKind) -> f64 {
        self.standardized[kind.index()]
    }
}

/// Source locations for the three scraped tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrls {
    pub stats: String,
    pub usage: String,
    pub types: String,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub sources: SourceUrls,

    /// Number of merged rows shown in the terminal table.
    pub top_n: usize,
    /// Polynomial degree of the rank ~ total fit.
    pub degree: usize,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
    /// Directory for SVG plots.
    pub plot_dir: Option<PathBuf>,
}

/// A saved merged dataset (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetFile {
    pub tool: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub stats_url: String,
    pub usage_url: String,
    pub types_url: String,
    pub records: Vec<MergedRecord>,
}
