// SPDX-License-Identifier: GPL-3.0-or-later
use anyhow::Result;
use lastyear_domain::{ReleaseYear, Scrobble, ScrobbleId};

// ============================================================================
// Repository Traits
// ============================================================================

/// Scrobble store shared by the ingestion side and the resolution engine.
#[async_trait::async_trait]
pub trait ScrobbleRepository: Send + Sync {
    async fn insert(&self, scrobble: Scrobble) -> Result<Scrobble>;
    async fn get_by_id(&self, id: ScrobbleId) -> Result<Option<Scrobble>>;

    /// Scrobbles of `username` played in `year` that were never checked, oldest play first.
    async fn list_needing_release_year(&self, username: &str, year: i32) -> Result<Vec<Scrobble>>;

    /// Record the resolution result. Fails when the scrobble does not exist.
    async fn set_release_year(&self, id: ScrobbleId, release_year: ReleaseYear) -> Result<()>;
}
