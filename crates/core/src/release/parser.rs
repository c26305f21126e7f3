//! Best-effort parser for scene-style release names.
//!
//! Handles names like:
//! - "Rabbit.Hole.S01.1080p.AMZN.WEB-DL.DDP5.1.H.264-NTb"
//! - "Series Title 2022 S02E01 1080p ATVP WEB-DL DDP 5.1 Atmos H.264-RlsGrp.mkv"
//! - "Demon Slayer Kimetsu no Yaiba S04 2023 1080p WEB-DL AVC AAC 2.0 Dual Audio -ZR-"
//!
//! The parser never fails: fields it cannot find are left empty (or `0`).

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::{Release, ReleaseKind};

static EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(mkv|mp4|avi|m4v|wmv|mov|mpg|webm)$").unwrap());

static GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-\s*([A-Za-z0-9][A-Za-z0-9_]*)\s*-?\s*$").unwrap());

static SEASON_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^S(\d{1,3})(?:E(\d{1,4}))?(?:-?E\d{1,4})*$").unwrap());

static CROSS_EPISODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(\d{1,2})x(\d{2,3})$").unwrap());

static RESOLUTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(\d{3,4})([pi])$").unwrap());

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(19|20)\d{2}$").unwrap());

static REPACK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(REPACK|PROPER|RERIP)\d?$").unwrap());

const STREAMING_SERVICES: &[&str] = &[
    "AMZN", "ATVP", "BCORE", "CBS", "CC", "CRAV", "CR", "DCU", "DSCP", "DSNP", "DNSP", "FOX",
    "HBO", "HMAX", "HULU", "MAX", "NBC", "NF", "PCOK", "PMTP", "RED", "ROKU", "SHO", "STAN",
    "STZ", "TVNZ", "VRV",
];

const CUTS: &[&str] = &["EXTENDED", "UNCUT", "UNRATED", "THEATRICAL", "DC"];

const EDITIONS: &[&str] = &[
    "REMASTERED",
    "RESTORED",
    "IMAX",
    "CRITERION",
    "COLLECTORS",
    "ANNIVERSARY",
    "LIMITED",
];

const OTHER_FLAGS: &[&str] = &["INTERNAL", "HYBRID", "REMUX", "REAL", "DUBBED", "SUBBED"];

/// Parse a release name into structured metadata.
pub fn parse(name: &str) -> Release {
    let mut release = Release {
        name: name.to_string(),
        title: String::new(),
        year: 0,
        series: 0,
        episode: 0,
        resolution: String::new(),
        source: String::new(),
        group: String::new(),
        cut: Vec::new(),
        edition: Vec::new(),
        other: Vec::new(),
        hdr: Vec::new(),
        collection: String::new(),
        kind: ReleaseKind::Unknown,
        ext: String::new(),
    };

    let mut rest = name.trim();

    if let Some(caps) = EXTENSION.captures(rest) {
        release.ext = caps[1].to_lowercase();
        rest = &rest[..caps.get(0).map(|m| m.start()).unwrap_or(rest.len())];
    }

    if let Some(caps) = GROUP.captures(rest) {
        let whole = caps.get(0).map(|m| m.start()).unwrap_or(rest.len());
        let candidate = &caps[1];
        let before = &rest[..whole];
        let last_token = before.rsplit([' ', '.', '_']).next().unwrap_or("");
        let hyphenated = format!("{}-{}", last_token, candidate);

        // "WEB-DL" and friends end in a dash-separated word that is not a group
        if classify_source(&hyphenated).is_none() {
            release.group = candidate.to_string();
            rest = before;
        }
    }

    let tokens: Vec<&str> = rest
        .split([' ', '.', '_'])
        .filter(|t| !t.is_empty())
        .collect();

    let boundary = tokens
        .iter()
        .enumerate()
        .position(|(idx, token)| is_title_boundary(idx, token))
        .unwrap_or(tokens.len());

    release.title = tokens[..boundary].join(" ");

    let mut season: Option<u32> = None;
    let mut episode: Option<u32> = None;

    for token in &tokens[boundary..] {
        if season.is_none() {
            if let Some((s, e)) = season_episode(token) {
                season = Some(s);
                episode = e;
                continue;
            }
        }

        if release.year == 0 && YEAR.is_match(token) {
            release.year = token.parse().unwrap_or(0);
            continue;
        }

        if release.resolution.is_empty() {
            if let Some(resolution) = classify_resolution(token) {
                release.resolution = resolution;
                continue;
            }
        }

        if release.source.is_empty() {
            if let Some(source) = classify_source(token) {
                release.source = source.to_string();
                continue;
            }
        }

        if let Some(hdr) = classify_hdr(token) {
            release.hdr.push(hdr.to_string());
            continue;
        }

        let upper = token.to_uppercase();

        if REPACK.is_match(token) || OTHER_FLAGS.contains(&upper.as_str()) {
            release.other.push(upper);
            continue;
        }

        if CUTS.contains(&upper.as_str()) {
            release.cut.push(upper);
            continue;
        }

        if EDITIONS.contains(&upper.as_str()) {
            release.edition.push(upper);
            continue;
        }

        if release.collection.is_empty() {
            if let Some(service) = classify_service(token) {
                release.collection = service;
            }
        }
    }

    release.series = season.unwrap_or(0);
    release.episode = episode.unwrap_or(0);
    release.kind = match (season, episode) {
        (Some(_), Some(_)) => ReleaseKind::Episode,
        (Some(_), None) => ReleaseKind::Series,
        _ if release.year != 0 || !release.resolution.is_empty() || !release.source.is_empty() => {
            ReleaseKind::Movie
        }
        _ => ReleaseKind::Unknown,
    };

    release
}

/// First token that can no longer be part of the title.
fn is_title_boundary(idx: usize, token: &str) -> bool {
    season_episode(token).is_some()
        || (idx > 0 && YEAR.is_match(token))
        || classify_resolution(token).is_some()
        || classify_source(token).is_some()
        || REPACK.is_match(token)
}

fn season_episode(token: &str) -> Option<(u32, Option<u32>)> {
    if let Some(caps) = SEASON_EPISODE.captures(token) {
        let season = caps[1].parse().ok()?;
        let episode = caps.get(2).and_then(|m| m.as_str().parse().ok());
        return Some((season, episode));
    }

    let caps = CROSS_EPISODE.captures(token)?;
    let season = caps[1].parse().ok()?;
    let episode = caps[2].parse().ok()?;
    Some((season, Some(episode)))
}

fn classify_resolution(token: &str) -> Option<String> {
    if let Some(caps) = RESOLUTION.captures(token) {
        return Some(format!("{}{}", &caps[1], caps[2].to_lowercase()));
    }
    if token.eq_ignore_ascii_case("4k") {
        return Some("2160p".to_string());
    }
    None
}

fn classify_source(token: &str) -> Option<&'static str> {
    let source = match token.to_lowercase().as_str() {
        "web-dl" | "webdl" => "WEB-DL",
        "webrip" | "web-rip" => "WEBRip",
        "web" => "WEB",
        "bluray" | "blu-ray" => "BluRay",
        "bdrip" => "BDRip",
        "brrip" => "BRRip",
        "hdtv" => "HDTV",
        "dvdrip" => "DVDRip",
        "hdrip" => "HDRip",
        _ => return None,
    };
    Some(source)
}

fn classify_hdr(token: &str) -> Option<&'static str> {
    let hdr = match token.to_lowercase().as_str() {
        "dv" | "dovi" => "DV",
        "hdr" => "HDR",
        "hdr10" => "HDR10",
        "hdr10+" | "hdr10plus" => "HDR10+",
        "hlg" => "HLG",
        _ => return None,
    };
    Some(hdr)
}

fn classify_service(token: &str) -> Option<String> {
    // Mixed-case tags that would otherwise collide with ordinary words
    if token == "iT" || token == "iP" {
        return Some(token.to_string());
    }
    let upper = token.to_uppercase();
    if token == upper && STREAMING_SERVICES.contains(&upper.as_str()) {
        return Some(upper);
    }
    None
}
