// SPDX-License-Identifier: GPL-3.0-or-later

//! Read-only access to a MusicBrainz database mirror.
//!
//! The resolution engine only ever needs four questions answered by the
//! catalog (see [`CatalogStore`]); [`PgCatalogStore`] answers them with SQL
//! against the `musicbrainz` schema of a PostgreSQL replica.

pub mod catalog;
pub mod error;
pub mod postgres;

pub use catalog::{CatalogArtist, CatalogStore};
pub use error::{CatalogError, Result};
pub use postgres::PgCatalogStore;
