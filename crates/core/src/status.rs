//! Domain status codes returned by the pack and parse phases.
//!
//! The numeric values are part of the public contract: announce tooling
//! branches on them, and the HTTP layer uses them verbatim as response
//! status codes.

use serde::Serialize;

use crate::release::MismatchKind;

/// Severity used by notification consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    /// A match or hardlink succeeded.
    Match,
    /// A normal, non-error rejection.
    Info,
    /// Something went wrong.
    Error,
}

/// Outcome of a pack or parse request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    NoMatches,
    ResolutionMismatch,
    SourceMismatch,
    GroupMismatch,
    CutMismatch,
    EditionMismatch,
    RepackStatusMismatch,
    HdrMismatch,
    StreamingServiceMismatch,
    AlreadyInClient,
    NotASeasonPack,
    SizeMismatch,
    SeasonMismatch,
    EpisodeMismatch,
    BelowThreshold,
    SuccessfulMatch,
    SuccessfulHardlink,
    FailedHardlink,
    FailedMatchToTorrentEps,
    EpisodeCountError,
    GetEpisodesError,
    ParseTorrentInfoError,
    DecodeTorrentBytesError,
    TorrentBytesError,
    GetTorrentsError,
    AnnounceNameError,
    DecodingError,
    GetClientError,
    ClientNotFound,
}

impl Status {
    /// Numeric code, doubling as the HTTP status of the response.
    pub fn code(&self) -> u16 {
        match self {
            Status::NoMatches => 200,
            Status::ResolutionMismatch => 201,
            Status::SourceMismatch => 202,
            Status::GroupMismatch => 203,
            Status::CutMismatch => 204,
            Status::EditionMismatch => 205,
            Status::RepackStatusMismatch => 206,
            Status::HdrMismatch => 207,
            Status::StreamingServiceMismatch => 208,
            Status::AlreadyInClient => 210,
            Status::NotASeasonPack => 211,
            Status::SizeMismatch => 212,
            Status::SeasonMismatch => 213,
            Status::EpisodeMismatch => 214,
            Status::BelowThreshold => 230,
            Status::SuccessfulMatch | Status::SuccessfulHardlink => 250,
            Status::FailedHardlink => 440,
            Status::FailedMatchToTorrentEps => 445,
            Status::EpisodeCountError => 450,
            Status::GetEpisodesError => 464,
            Status::ParseTorrentInfoError => 465,
            Status::DecodeTorrentBytesError => 466,
            Status::TorrentBytesError => 467,
            Status::GetTorrentsError => 468,
            Status::AnnounceNameError => 469,
            Status::DecodingError => 470,
            Status::GetClientError => 471,
            Status::ClientNotFound => 472,
        }
    }

    /// Human-readable message.
    pub fn message(&self) -> &'static str {
        match self {
            Status::NoMatches => "no matching releases in client",
            Status::ResolutionMismatch => "resolution did not match",
            Status::SourceMismatch => "source did not match",
            Status::GroupMismatch => "release group did not match",
            Status::CutMismatch => "cut did not match",
            Status::EditionMismatch => "edition did not match",
            Status::RepackStatusMismatch => "repack status did not match",
            Status::HdrMismatch => "HDR metadata did not match",
            Status::StreamingServiceMismatch => "streaming service did not match",
            Status::AlreadyInClient => "release already in client",
            Status::NotASeasonPack => "release is not a season pack",
            Status::SizeMismatch => "file size did not match",
            Status::SeasonMismatch => "season did not match",
            Status::EpisodeMismatch => "episode did not match",
            Status::BelowThreshold => "number of matches below threshold",
            Status::SuccessfulMatch => "successfully matched season pack to episodes in client",
            Status::SuccessfulHardlink => "successfully created hardlinks",
            Status::FailedHardlink => "could not create hardlinks",
            Status::FailedMatchToTorrentEps => "could not match episodes to files in pack",
            Status::EpisodeCountError => "could not get episode count",
            Status::GetEpisodesError => "could not get episodes from torrent",
            Status::ParseTorrentInfoError => "could not parse torrent info",
            Status::DecodeTorrentBytesError => "could not decode torrent bytes",
            Status::TorrentBytesError => "torrent bytes missing from request",
            Status::GetTorrentsError => "could not get torrents from client",
            Status::AnnounceNameError => "announce name missing from request",
            Status::DecodingError => "could not decode request body",
            Status::GetClientError => "could not get client",
            Status::ClientNotFound => "client not found in config",
        }
    }

    /// Severity classification.
    pub fn level(&self) -> StatusLevel {
        match self.code() {
            250 => StatusLevel::Match,
            200..=299 => StatusLevel::Info,
            _ => StatusLevel::Error,
        }
    }

    /// Label used for metrics.
    pub fn as_label(&self) -> String {
        self.code().to_string()
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<MismatchKind> for Status {
    fn from(kind: MismatchKind) -> Self {
        match kind {
            MismatchKind::Resolution => Status::ResolutionMismatch,
            MismatchKind::Source => Status::SourceMismatch,
            MismatchKind::Group => Status::GroupMismatch,
            MismatchKind::Cut => Status::CutMismatch,
            MismatchKind::Edition => Status::EditionMismatch,
            MismatchKind::RepackStatus => Status::RepackStatusMismatch,
            MismatchKind::Hdr => Status::HdrMismatch,
            MismatchKind::StreamingService => Status::StreamingServiceMismatch,
            MismatchKind::Episode => Status::EpisodeMismatch,
            MismatchKind::Season => Status::SeasonMismatch,
            MismatchKind::Size => Status::SizeMismatch,
        }
    }
}
