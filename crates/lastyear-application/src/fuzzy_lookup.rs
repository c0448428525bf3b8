// SPDX-License-Identifier: GPL-3.0-or-later

//! Release year resolution from free-text artist and track names.

use crate::normalize::{first_credited_artist, has_credit_separator, normalize_artist, normalize_track};
use lastyear_musicbrainz::{CatalogError, CatalogStore, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct FuzzyLookup {
    catalog: Arc<dyn CatalogStore>,
}

impl FuzzyLookup {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    /// Release year for a free-text artist/track pair.
    ///
    /// Both names are normalized first. When the full credit is not found and
    /// it names several artists, the lead artist is tried on its own.
    ///
    /// A failed attempt followed by a successful miss still yields `Ok(None)`;
    /// an error is returned only when the last attempt made failed.
    pub async fn find_release_year(&self, artist: &str, track: &str) -> Result<Option<i32>> {
        let started = Instant::now();
        let artist_norm = normalize_artist(artist);
        let track_norm = normalize_track(track);

        if artist_norm != artist || track_norm != track {
            debug!(
                target: "normalize",
                artist, track, %artist_norm, %track_norm,
                "normalized names for fuzzy lookup"
            );
        }

        if artist_norm.is_empty() || track_norm.is_empty() {
            debug!(target: "lookup", artist, track, "nothing to search for after normalization");
            return Ok(None);
        }

        let mut candidates = vec![artist_norm.as_str()];
        if has_credit_separator(&artist_norm) {
            let lead = first_credited_artist(&artist_norm);
            if !lead.is_empty() && lead != artist_norm {
                candidates.push(lead);
            }
        }

        let mut last_error: Option<CatalogError> = None;
        for candidate in candidates {
            match self.try_find(candidate, &track_norm).await {
                Ok(Some(year)) => {
                    debug!(
                        target: "lookup",
                        artist = candidate, track = %track_norm, year,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "fuzzy match found"
                    );
                    return Ok(Some(year));
                }
                Ok(None) => {
                    last_error = None;
                }
                Err(err) => {
                    warn!(
                        target: "lookup",
                        artist = candidate, track = %track_norm, error = %err,
                        "fuzzy lookup attempt failed"
                    );
                    last_error = Some(err);
                }
            }
        }

        debug!(
            target: "lookup",
            artist = %artist_norm, track = %track_norm,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "no fuzzy match"
        );

        match last_error {
            Some(err) => Err(err),
            None => Ok(None),
        }
    }

    async fn try_find(&self, artist: &str, track: &str) -> Result<Option<i32>> {
        let Some(catalog_artist) = self.catalog.find_artist(artist).await? else {
            return Ok(None);
        };
        debug!(
            target: "lookup",
            query = artist, artist_id = catalog_artist.id, artist_name = %catalog_artist.name,
            "matched catalog artist"
        );
        self.catalog.find_recording_year(&catalog_artist, track).await
    }
}
