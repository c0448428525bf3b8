// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::Result;
use lastyear_domain::Mbid;

/// Catalog artist matched by a name or alias search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogArtist {
    pub id: i32,
    pub name: String,
}

/// Query interface onto the release catalog.
///
/// Every year returned is the *release group's* first release year, so a
/// remaster or reissue always resolves to the original release. `Ok(None)`
/// means "no match" and is never an error.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Cheap round trip used to fail a batch early when the catalog is unreachable.
    async fn ping(&self) -> Result<()>;

    /// release -> release group -> release group meta.
    async fn release_year_by_album(&self, mbid: Mbid) -> Result<Option<i32>>;

    /// recording -> track -> medium -> release -> release group -> release group meta.
    async fn release_year_by_track(&self, mbid: Mbid) -> Result<Option<i32>>;

    /// First artist whose name or any alias contains `name_fragment`, ignoring case.
    async fn find_artist(&self, name_fragment: &str) -> Result<Option<CatalogArtist>>;

    /// Year of the first recording credited to `artist` whose title contains
    /// `title_fragment`, ignoring case.
    async fn find_recording_year(
        &self,
        artist: &CatalogArtist,
        title_fragment: &str,
    ) -> Result<Option<i32>>;
}
