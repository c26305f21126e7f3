//! Comparison of an announced season pack against a release in the client.

use serde::{Deserialize, Serialize};

use super::{normalize, Release, ReleaseKind};

/// Relaxations applied when comparing releases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FuzzyMatching {
    /// Ignore REPACK/PROPER style flags.
    #[serde(default)]
    pub skip_repack_compare: bool,
    /// Treat every HDR format as plain HDR (Dolby Vision is kept apart).
    #[serde(default)]
    pub simplify_hdr_compare: bool,
}

/// Field on which two releases (or two episode files) disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    Resolution,
    Source,
    Group,
    Cut,
    Edition,
    RepackStatus,
    Hdr,
    StreamingService,
    Episode,
    Season,
    Size,
}

impl MismatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MismatchKind::Resolution => "resolution",
            MismatchKind::Source => "source",
            MismatchKind::Group => "group",
            MismatchKind::Cut => "cut",
            MismatchKind::Edition => "edition",
            MismatchKind::RepackStatus => "repack_status",
            MismatchKind::Hdr => "hdr",
            MismatchKind::StreamingService => "streaming_service",
            MismatchKind::Episode => "episode",
            MismatchKind::Season => "season",
            MismatchKind::Size => "size",
        }
    }
}

/// A rejected field together with both compared values, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMismatch {
    pub kind: MismatchKind,
    /// Value on the announced (or client) side.
    pub announced: String,
    /// Value on the candidate (or pack) side.
    pub candidate: String,
}

impl FieldMismatch {
    pub fn new(kind: MismatchKind, announced: impl ToString, candidate: impl ToString) -> Self {
        Self {
            kind,
            announced: announced.to_string(),
            candidate: candidate.to_string(),
        }
    }
}

impl std::fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} mismatch: {:?} vs {:?}",
            self.kind.as_str(),
            self.announced,
            self.candidate
        )
    }
}

/// Result of comparing an announced release against a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompareOutcome {
    NotASeasonPack,
    Mismatch(FieldMismatch),
    /// The candidate is the same episode, nothing to do.
    AlreadyInClient,
    /// Same show and quality, different episode: belongs inside the pack.
    SuccessfulMatch,
}

/// Whether a release describes a whole season rather than a single file.
pub fn is_season_pack(release: &Release) -> bool {
    release.kind == ReleaseKind::Series && release.ext.is_empty()
}

/// Compare an announced release against a release held by the client.
///
/// Fields are checked in a fixed priority order and the first mismatch wins.
pub fn compare(announced: &Release, candidate: &Release, policy: &FuzzyMatching) -> CompareOutcome {
    if !is_season_pack(announced) {
        return CompareOutcome::NotASeasonPack;
    }

    match first_mismatch(announced, candidate, policy) {
        Some(mismatch) => CompareOutcome::Mismatch(mismatch),
        None if announced.episode == candidate.episode => CompareOutcome::AlreadyInClient,
        None => CompareOutcome::SuccessfulMatch,
    }
}

fn first_mismatch(a: &Release, b: &Release, policy: &FuzzyMatching) -> Option<FieldMismatch> {
    let scalars = [
        (MismatchKind::Resolution, &a.resolution, &b.resolution),
        (MismatchKind::Source, &a.source, &b.source),
        (MismatchKind::Group, &a.group, &b.group),
    ];
    for (kind, left, right) in scalars {
        if normalize(left) != normalize(right) {
            return Some(FieldMismatch::new(kind, left, right));
        }
    }

    if !same_elements(&a.cut, &b.cut) {
        return Some(set_mismatch(MismatchKind::Cut, &a.cut, &b.cut));
    }

    if !same_elements(&a.edition, &b.edition) {
        return Some(set_mismatch(MismatchKind::Edition, &a.edition, &b.edition));
    }

    if !policy.skip_repack_compare && !same_elements(&a.other, &b.other) {
        return Some(set_mismatch(MismatchKind::RepackStatus, &a.other, &b.other));
    }

    let (hdr_a, hdr_b) = if policy.simplify_hdr_compare {
        (simplify_hdr(&a.hdr), simplify_hdr(&b.hdr))
    } else {
        (a.hdr.clone(), b.hdr.clone())
    };
    if !same_elements(&hdr_a, &hdr_b) {
        return Some(set_mismatch(MismatchKind::Hdr, &hdr_a, &hdr_b));
    }

    if normalize(&a.collection) != normalize(&b.collection) {
        return Some(FieldMismatch::new(
            MismatchKind::StreamingService,
            &a.collection,
            &b.collection,
        ));
    }

    None
}

/// Multiset equality.
fn same_elements(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}

fn set_mismatch(kind: MismatchKind, a: &[String], b: &[String]) -> FieldMismatch {
    FieldMismatch::new(kind, a.join(","), b.join(","))
}

/// Collapse HDR10, HDR10+ and HLG into HDR, keeping Dolby Vision.
fn simplify_hdr(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let simplified = if tag == "DV" { "DV" } else { "HDR" };
        if !out.iter().any(|t| t == simplified) {
            out.push(simplified.to_string());
        }
    }
    out
}
