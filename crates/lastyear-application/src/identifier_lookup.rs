// SPDX-License-Identifier: GPL-3.0-or-later

//! Release year resolution through exact catalog identifiers.

use lastyear_domain::{IdentifierKind, Mbid};
use lastyear_musicbrainz::{CatalogError, CatalogStore, Result};
use std::sync::Arc;
use tracing::debug;

/// Looks up the owning release group's first release year for an album or track identifier.
#[derive(Clone)]
pub struct IdentifierLookup {
    catalog: Arc<dyn CatalogStore>,
}

impl IdentifierLookup {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    /// Earliest release year of the release group behind `identifier`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(year))` - the identifier is known and its release group has a year
    /// * `Ok(None)` - the identifier is well formed but unknown, or the group has no year
    /// * `Err(CatalogError::InvalidIdentifier)` - `identifier` is not an MBID
    /// * `Err(_)` - the catalog query failed
    pub async fn find_release_year(
        &self,
        kind: IdentifierKind,
        identifier: &str,
    ) -> Result<Option<i32>> {
        let mbid = Mbid::parse(identifier).map_err(|_| CatalogError::InvalidIdentifier {
            kind,
            value: identifier.to_string(),
        })?;

        debug!(target: "lookup", %kind, %mbid, "looking up release year by identifier");

        let year = match kind {
            IdentifierKind::Album => self.catalog.release_year_by_album(mbid).await?,
            IdentifierKind::Track => self.catalog.release_year_by_track(mbid).await?,
        };

        match year {
            Some(year) => debug!(target: "lookup", %kind, %mbid, year, "found release year"),
            None => debug!(target: "lookup", %kind, %mbid, "no release year for identifier"),
        }

        Ok(year)
    }
}
