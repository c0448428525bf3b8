// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory stand-ins for the catalog and the scrobble store.

use anyhow::{anyhow, Result};
use chrono::{TimeZone, Utc};
use lastyear_domain::{Mbid, ReleaseYear, Scrobble, ScrobbleId};
use lastyear_infrastructure::ScrobbleRepository;
use lastyear_musicbrainz::{CatalogArtist, CatalogError, CatalogStore};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub const SALTY_DOG_RELEASE: &str = "4acdaa51-aa44-4a9b-954f-3c6eaab65590";
pub const SALTY_DOG_RECORDING: &str = "729400f2-60e8-4eda-b1e7-538cdaee7743";
pub const UNKNOWN_MBID: &str = "00000000-0000-4000-8000-000000000000";

pub fn mbid(value: &str) -> Mbid {
    Mbid::parse(value).expect("valid test mbid")
}

pub fn scrobble(artist: &str, track: &str) -> Scrobble {
    let played = Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap();
    Scrobble::new("listener", artist, track, played)
}

/// Which catalog call was made, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCall {
    Ping,
    Album(Mbid),
    Track(Mbid),
    Artist(String),
    Recording(i32, String),
}

struct FakeArtist {
    artist: CatalogArtist,
    aliases: Vec<String>,
}

struct FakeRecording {
    artist_id: i32,
    title: String,
    year: Option<i32>,
}

#[derive(Default)]
pub struct FakeCatalog {
    albums: HashMap<Mbid, Option<i32>>,
    tracks: HashMap<Mbid, Option<i32>>,
    artists: Vec<FakeArtist>,
    recordings: Vec<FakeRecording>,
    unreachable: bool,
    failing_albums: bool,
    failing_artist_search: bool,
    calls: Mutex<Vec<CatalogCall>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_album(mut self, id: &str, year: Option<i32>) -> Self {
        self.albums.insert(mbid(id), year);
        self
    }

    pub fn with_track(mut self, id: &str, year: Option<i32>) -> Self {
        self.tracks.insert(mbid(id), year);
        self
    }

    pub fn with_artist(mut self, id: i32, name: &str, aliases: &[&str]) -> Self {
        self.artists.push(FakeArtist {
            artist: CatalogArtist {
                id,
                name: name.to_string(),
            },
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        });
        self
    }

    pub fn with_recording(mut self, artist_id: i32, title: &str, year: Option<i32>) -> Self {
        self.recordings.push(FakeRecording {
            artist_id,
            title: title.to_string(),
            year,
        });
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn failing_albums(mut self) -> Self {
        self.failing_albums = true;
        self
    }

    pub fn failing_artist_search(mut self) -> Self {
        self.failing_artist_search = true;
        self
    }

    pub fn calls(&self) -> Vec<CatalogCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: CatalogCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait::async_trait]
impl CatalogStore for FakeCatalog {
    async fn ping(&self) -> lastyear_musicbrainz::Result<()> {
        self.record(CatalogCall::Ping);
        if self.unreachable {
            return Err(CatalogError::Connection(sqlx_pool_closed()));
        }
        Ok(())
    }

    async fn release_year_by_album(&self, mbid: Mbid) -> lastyear_musicbrainz::Result<Option<i32>> {
        self.record(CatalogCall::Album(mbid));
        if self.failing_albums {
            return Err(CatalogError::Query(sqlx_pool_closed()));
        }
        Ok(self.albums.get(&mbid).copied().flatten())
    }

    async fn release_year_by_track(&self, mbid: Mbid) -> lastyear_musicbrainz::Result<Option<i32>> {
        self.record(CatalogCall::Track(mbid));
        Ok(self.tracks.get(&mbid).copied().flatten())
    }

    async fn find_artist(&self, name_fragment: &str) -> lastyear_musicbrainz::Result<Option<CatalogArtist>> {
        self.record(CatalogCall::Artist(name_fragment.to_string()));
        if self.failing_artist_search {
            return Err(CatalogError::Query(sqlx_pool_closed()));
        }
        Ok(self
            .artists
            .iter()
            .find(|a| {
                contains_ignore_case(&a.artist.name, name_fragment)
                    || a.aliases.iter().any(|alias| contains_ignore_case(alias, name_fragment))
            })
            .map(|a| a.artist.clone()))
    }

    async fn find_recording_year(
        &self,
        artist: &CatalogArtist,
        title_fragment: &str,
    ) -> lastyear_musicbrainz::Result<Option<i32>> {
        self.record(CatalogCall::Recording(artist.id, title_fragment.to_string()));
        Ok(self
            .recordings
            .iter()
            .find(|r| r.artist_id == artist.id && contains_ignore_case(&r.title, title_fragment))
            .and_then(|r| r.year))
    }
}

// The fake never talks to a database; any sqlx error works as a payload.
fn sqlx_pool_closed() -> sqlx::Error {
    sqlx::Error::PoolClosed
}

#[derive(Default)]
pub struct FakeScrobbleStore {
    scrobbles: Mutex<Vec<Scrobble>>,
    writes: Mutex<Vec<(ScrobbleId, ReleaseYear)>>,
    failing_writes: HashSet<ScrobbleId>,
    failing_listing: bool,
    cancel_after_write: Option<CancellationToken>,
}

impl FakeScrobbleStore {
    pub fn with_scrobbles(scrobbles: Vec<Scrobble>) -> Self {
        Self {
            scrobbles: Mutex::new(scrobbles),
            ..Self::default()
        }
    }

    pub fn failing_write_for(mut self, id: ScrobbleId) -> Self {
        self.failing_writes.insert(id);
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.failing_listing = true;
        self
    }

    /// Cancel `token` as soon as any release year has been saved.
    pub fn cancelling_after_first_write(mut self, token: CancellationToken) -> Self {
        self.cancel_after_write = Some(token);
        self
    }

    pub fn writes(&self) -> Vec<(ScrobbleId, ReleaseYear)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn writes_for(&self, id: ScrobbleId) -> Vec<ReleaseYear> {
        self.writes()
            .into_iter()
            .filter(|(written, _)| *written == id)
            .map(|(_, year)| year)
            .collect()
    }
}

#[async_trait::async_trait]
impl ScrobbleRepository for FakeScrobbleStore {
    async fn insert(&self, scrobble: Scrobble) -> Result<Scrobble> {
        self.scrobbles.lock().unwrap().push(scrobble.clone());
        Ok(scrobble)
    }

    async fn get_by_id(&self, id: ScrobbleId) -> Result<Option<Scrobble>> {
        Ok(self.scrobbles.lock().unwrap().iter().find(|s| s.id == id).cloned())
    }

    async fn list_needing_release_year(&self, username: &str, year: i32) -> Result<Vec<Scrobble>> {
        if self.failing_listing {
            return Err(anyhow!("scrobble store offline"));
        }
        Ok(self
            .scrobbles
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.username == username && s.year == year && s.needs_release_year())
            .cloned()
            .collect())
    }

    async fn set_release_year(&self, id: ScrobbleId, release_year: ReleaseYear) -> Result<()> {
        if self.failing_writes.contains(&id) {
            return Err(anyhow!("disk full"));
        }
        let mut scrobbles = self.scrobbles.lock().unwrap();
        let scrobble = scrobbles
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| anyhow!("scrobble {} does not exist", id))?;
        scrobble.release_year = Some(release_year);
        self.writes.lock().unwrap().push((id, release_year));
        if let Some(token) = &self.cancel_after_write {
            token.cancel();
        }
        Ok(())
    }
}
