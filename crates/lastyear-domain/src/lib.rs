// SPDX-License-Identifier: GPL-3.0-or-later
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid MusicBrainz identifier: {0:?}")]
    InvalidMbid(String),
}

// ============================================================================
// Value Objects & IDs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScrobbleId(pub Uuid);

impl ScrobbleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ScrobbleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScrobbleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical MusicBrainz identifier (a UUID in hyphenated or simple form).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mbid(Uuid);

impl Mbid {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| DomainError::InvalidMbid(value.to_string()))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::str::FromStr for Mbid {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Mbid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Which catalog entity an identifier points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    /// A release (album) identifier.
    Album,
    /// A recording (track) identifier.
    Track,
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Album => write!(f, "album"),
            Self::Track => write!(f, "track"),
        }
    }
}

/// Result of a completed release year resolution.
///
/// A scrobble that was never checked carries no `ReleaseYear` at all
/// (`Option::None`), which keeps "checked, no match" distinct from
/// "never checked".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "year", rename_all = "snake_case")]
pub enum ReleaseYear {
    Found(i32),
    NotFound,
}

impl ReleaseYear {
    pub fn from_lookup(year: Option<i32>) -> Self {
        match year {
            Some(year) => Self::Found(year),
            None => Self::NotFound,
        }
    }
}

impl std::fmt::Display for ReleaseYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Found(year) => write!(f, "{}", year),
            Self::NotFound => write!(f, "not found"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Persisting the result failed; the scrobble stays eligible for a later run.
    WriteFailed,
    /// The batch was cancelled before this scrobble was looked up.
    Cancelled,
}

/// How a single scrobble left the resolution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path", content = "detail", rename_all = "snake_case")]
pub enum ResolutionPath {
    Identifier(i32),
    Fuzzy(i32),
    Unresolved,
    Skipped(SkipReason),
}

// ============================================================================
// Entities
// ============================================================================

/// One recorded play of a track, as ingested from the listening history provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scrobble {
    pub id: ScrobbleId,
    pub username: String,
    pub artist_name: String,
    pub track_name: String,
    pub album_name: Option<String>,
    pub artist_mbid: Option<String>,
    pub track_mbid: Option<String>,
    pub album_mbid: Option<String>,
    pub scrobbled_at: DateTime<Utc>,
    /// Listening year, derived from `scrobbled_at`.
    pub year: i32,
    /// `None` until the resolution engine has checked this scrobble.
    pub release_year: Option<ReleaseYear>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Scrobble {
    pub fn new(
        username: impl Into<String>,
        artist_name: impl Into<String>,
        track_name: impl Into<String>,
        scrobbled_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ScrobbleId::new(),
            username: username.into(),
            artist_name: artist_name.into(),
            track_name: track_name.into(),
            album_name: None,
            artist_mbid: None,
            track_mbid: None,
            album_mbid: None,
            scrobbled_at,
            year: scrobbled_at.year(),
            release_year: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_album(mut self, name: impl Into<String>, mbid: Option<String>) -> Self {
        self.album_name = Some(name.into());
        self.album_mbid = mbid;
        self
    }

    pub fn with_track_mbid(mut self, mbid: impl Into<String>) -> Self {
        self.track_mbid = Some(mbid.into());
        self
    }

    pub fn with_artist_mbid(mut self, mbid: impl Into<String>) -> Self {
        self.artist_mbid = Some(mbid.into());
        self
    }

    /// Album identifier, ignoring the empty strings the provider sends for unknown ids.
    pub fn album_identifier(&self) -> Option<&str> {
        non_blank(self.album_mbid.as_deref())
    }

    /// Track identifier, ignoring the empty strings the provider sends for unknown ids.
    pub fn track_identifier(&self) -> Option<&str> {
        non_blank(self.track_mbid.as_deref())
    }

    pub fn needs_release_year(&self) -> bool {
        self.release_year.is_none()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ============================================================================
// Resolution results
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrobbleResolution {
    pub scrobble_id: ScrobbleId,
    pub path: ResolutionPath,
}

/// Per-batch counters.
///
/// `processed` counts scrobbles whose result was persisted and always equals
/// `resolved_via_identifier + resolved_via_fuzzy + unresolved`. Scrobbles that
/// were skipped (write failure, cancellation) are only counted in `skipped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    pub processed: usize,
    pub resolved_via_identifier: usize,
    pub resolved_via_fuzzy: usize,
    pub unresolved: usize,
    pub skipped: usize,
}

impl ResolutionOutcome {
    pub fn record(&mut self, path: &ResolutionPath) {
        match path {
            ResolutionPath::Identifier(_) => {
                self.processed += 1;
                self.resolved_via_identifier += 1;
            }
            ResolutionPath::Fuzzy(_) => {
                self.processed += 1;
                self.resolved_via_fuzzy += 1;
            }
            ResolutionPath::Unresolved => {
                self.processed += 1;
                self.unresolved += 1;
            }
            ResolutionPath::Skipped(_) => self.skipped += 1,
        }
    }

    /// Scrobbles that received an actual year.
    pub fn found(&self) -> usize {
        self.resolved_via_identifier + self.resolved_via_fuzzy
    }

    pub fn is_consistent(&self) -> bool {
        self.processed == self.resolved_via_identifier + self.resolved_via_fuzzy + self.unresolved
    }
}

impl std::fmt::Display for ResolutionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Processed {} scrobbles: {} via identifier, {} via fuzzy match, {} not found",
            self.processed, self.resolved_via_identifier, self.resolved_via_fuzzy, self.unresolved
        )?;
        if self.skipped > 0 {
            write!(f, " ({} skipped)", self.skipped)?;
        }
        Ok(())
    }
}

/// Outcome counters plus the path taken by every input scrobble, in input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub outcome: ResolutionOutcome,
    pub resolutions: Vec<ScrobbleResolution>,
}

impl ResolutionReport {
    pub fn from_resolutions(resolutions: Vec<ScrobbleResolution>) -> Self {
        let mut outcome = ResolutionOutcome::default();
        for resolution in &resolutions {
            outcome.record(&resolution.path);
        }
        Self {
            outcome,
            resolutions,
        }
    }

    pub fn path_of(&self, id: ScrobbleId) -> Option<ResolutionPath> {
        self.resolutions
            .iter()
            .find(|r| r.scrobble_id == id)
            .map(|r| r.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn played_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, 20, 15, 0).unwrap()
    }

    #[test]
    fn mbid_parses_hyphenated_and_rejects_garbage() {
        let mbid = Mbid::parse("4acdaa51-aa44-4a9b-954f-3c6eaab65590").unwrap();
        assert_eq!(mbid.to_string(), "4acdaa51-aa44-4a9b-954f-3c6eaab65590");

        let padded = Mbid::parse("  4acdaa51-aa44-4a9b-954f-3c6eaab65590 ").unwrap();
        assert_eq!(padded, mbid);

        assert_eq!(
            Mbid::parse("not-an-id"),
            Err(DomainError::InvalidMbid("not-an-id".to_string()))
        );
        assert!("".parse::<Mbid>().is_err());
    }

    #[test]
    fn new_scrobble_has_not_been_checked() {
        let scrobble = Scrobble::new("listener", "Slowdive", "chained to a cloud", played_at());
        assert_eq!(scrobble.year, 2024);
        assert!(scrobble.needs_release_year());
        assert!(scrobble.album_identifier().is_none());
        assert!(scrobble.track_identifier().is_none());
    }

    #[test]
    fn blank_identifiers_are_ignored() {
        let scrobble = Scrobble::new("listener", "Slowdive", "chained to a cloud", played_at())
            .with_album("everything is alive", Some("".to_string()))
            .with_track_mbid("  ");
        assert!(scrobble.album_identifier().is_none());
        assert!(scrobble.track_identifier().is_none());

        let scrobble = scrobble.with_album(
            "everything is alive",
            Some("4acdaa51-aa44-4a9b-954f-3c6eaab65590".to_string()),
        );
        assert_eq!(
            scrobble.album_identifier(),
            Some("4acdaa51-aa44-4a9b-954f-3c6eaab65590")
        );
    }

    #[test]
    fn release_year_distinguishes_not_found() {
        assert_eq!(ReleaseYear::from_lookup(Some(1969)), ReleaseYear::Found(1969));
        assert_eq!(ReleaseYear::from_lookup(None), ReleaseYear::NotFound);
        assert_eq!(ReleaseYear::NotFound.to_string(), "not found");
        assert_eq!(ReleaseYear::Found(1969).to_string(), "1969");
    }

    #[test]
    fn outcome_counts_every_path_once() {
        let ids: Vec<ScrobbleId> = (0..5).map(|_| ScrobbleId::new()).collect();
        let paths = [
            ResolutionPath::Identifier(1997),
            ResolutionPath::Fuzzy(2014),
            ResolutionPath::Unresolved,
            ResolutionPath::Skipped(SkipReason::WriteFailed),
            ResolutionPath::Fuzzy(2001),
        ];
        let report = ResolutionReport::from_resolutions(
            ids.iter()
                .zip(paths)
                .map(|(id, path)| ScrobbleResolution {
                    scrobble_id: *id,
                    path,
                })
                .collect(),
        );

        assert_eq!(report.outcome.processed, 4);
        assert_eq!(report.outcome.resolved_via_identifier, 1);
        assert_eq!(report.outcome.resolved_via_fuzzy, 2);
        assert_eq!(report.outcome.unresolved, 1);
        assert_eq!(report.outcome.skipped, 1);
        assert_eq!(report.outcome.found(), 3);
        assert!(report.outcome.is_consistent());
        assert_eq!(report.path_of(ids[1]), Some(ResolutionPath::Fuzzy(2014)));
    }

    #[test]
    fn outcome_summary_mentions_skips_only_when_present() {
        let mut outcome = ResolutionOutcome::default();
        outcome.record(&ResolutionPath::Identifier(1990));
        outcome.record(&ResolutionPath::Unresolved);
        assert_eq!(
            outcome.to_string(),
            "Processed 2 scrobbles: 1 via identifier, 0 via fuzzy match, 1 not found"
        );

        outcome.record(&ResolutionPath::Skipped(SkipReason::Cancelled));
        assert!(outcome.to_string().ends_with("(1 skipped)"));
    }

    #[test]
    fn resolution_path_serializes_with_tag() {
        let json = serde_json::to_value(ResolutionPath::Fuzzy(2014)).unwrap();
        assert_eq!(json, serde_json::json!({ "path": "fuzzy", "detail": 2014 }));
    }
}
