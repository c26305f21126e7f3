//! Release names and their structured metadata.
//!
//! This module provides:
//! - `parse`: best-effort scene-name parser producing a `Release`
//! - `compare`: the announced-vs-candidate comparator
//! - `format_pack_title`: folder name for a synthesized season pack

mod compare;
mod format;
mod parser;

pub use compare::{
    compare, is_season_pack, CompareOutcome, FieldMismatch, FuzzyMatching, MismatchKind,
};
pub use format::format_pack_title;
pub use parser::parse;

use serde::Serialize;

/// Kind of content a release name describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseKind {
    Unknown,
    Movie,
    /// A whole season (season marker without an episode).
    Series,
    Episode,
}

/// Structured metadata parsed from a release name.
///
/// Numeric fields are `0` when the name does not carry them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Release {
    /// The raw name this release was parsed from.
    pub name: String,
    pub title: String,
    pub year: u32,
    /// Season number.
    pub series: u32,
    pub episode: u32,
    pub resolution: String,
    pub source: String,
    pub group: String,
    pub cut: Vec<String>,
    pub edition: Vec<String>,
    /// Release flags such as REPACK or PROPER.
    pub other: Vec<String>,
    pub hdr: Vec<String>,
    /// Streaming service tag (AMZN, NF, ...).
    pub collection: String,
    pub kind: ReleaseKind,
    /// File extension without the dot, empty for directory-style names.
    pub ext: String,
}

impl Release {
    /// Key used to bucket client torrents that may belong to the same season.
    ///
    /// Built from the normalized title, the year and the season number, so
    /// `Rabbit.Hole.S01...` yields `rabbit hole01`.
    pub fn title_key(&self) -> String {
        format!("{}{}{}", normalize(&self.title), self.year, self.series)
    }
}

impl std::fmt::Display for Release {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Case and punctuation insensitive form of a release field.
///
/// Lowercases, turns every run of non-alphanumeric characters into a single
/// space and trims the result.
pub fn normalize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_space = false;

    for c in value.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else {
            pending_space = true;
        }
    }

    out
}
