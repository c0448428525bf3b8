// SPDX-License-Identifier: GPL-3.0-or-later

use crate::catalog::{CatalogArtist, CatalogStore};
use crate::error::{CatalogError, Result};
use lastyear_config::CatalogConfig;
use lastyear_domain::Mbid;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{debug, info, trace};

/// SQL used against the catalog, rendered once for the configured schema.
#[derive(Debug, Clone)]
struct CatalogQueries {
    album_year: String,
    track_year: String,
    artist: String,
    recording_year: String,
}

impl CatalogQueries {
    fn for_schema(schema: &str) -> Result<Self> {
        if schema.is_empty()
            || !schema
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(CatalogError::InvalidConfiguration(format!(
                "schema name {:?} must be a plain identifier",
                schema
            )));
        }

        // `first_release_date_year` is a smallint in MusicBrainz; widen it for decoding.
        let album_year = format!(
            r#"
            SELECT rgm.first_release_date_year::int4
            FROM {s}.release r
            JOIN {s}.release_group rg ON r.release_group = rg.id
            LEFT JOIN {s}.release_group_meta rgm ON rg.id = rgm.id
            WHERE r.gid = $1
            LIMIT 1
            "#,
            s = schema
        );

        let track_year = format!(
            r#"
            SELECT rgm.first_release_date_year::int4
            FROM {s}.recording r
            JOIN {s}.track t ON r.id = t.recording
            JOIN {s}.medium m ON t.medium = m.id
            JOIN {s}.release rel ON m.release = rel.id
            JOIN {s}.release_group rg ON rel.release_group = rg.id
            LEFT JOIN {s}.release_group_meta rgm ON rg.id = rgm.id
            WHERE r.gid = $1
            LIMIT 1
            "#,
            s = schema
        );

        let artist = format!(
            r#"
            SELECT DISTINCT a.id, a.name
            FROM {s}.artist a
            LEFT JOIN {s}.artist_alias aa ON a.id = aa.artist
            WHERE a.name ILIKE '%' || $1 || '%'
               OR aa.name ILIKE '%' || $1 || '%'
            LIMIT 1
            "#,
            s = schema
        );

        let recording_year = format!(
            r#"
            SELECT rgm.first_release_date_year::int4
            FROM {s}.recording r
            JOIN {s}.artist_credit ac ON r.artist_credit = ac.id
            JOIN {s}.artist_credit_name acn ON ac.id = acn.artist_credit
            JOIN {s}.track t ON r.id = t.recording
            JOIN {s}.medium m ON t.medium = m.id
            JOIN {s}.release rel ON m.release = rel.id
            JOIN {s}.release_group rg ON rel.release_group = rg.id
            LEFT JOIN {s}.release_group_meta rgm ON rg.id = rgm.id
            WHERE acn.artist = $1
              AND r.name ILIKE '%' || $2 || '%'
            LIMIT 1
            "#,
            s = schema
        );

        Ok(Self {
            album_year,
            track_year,
            artist,
            recording_year,
        })
    }
}

/// Escape LIKE metacharacters so a fragment only ever matches literally.
pub(crate) fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// [`CatalogStore`] backed by a PostgreSQL MusicBrainz replica.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
    queries: CatalogQueries,
}

impl PgCatalogStore {
    /// Validate the configuration, open a pool and verify the catalog answers.
    pub async fn connect(config: &CatalogConfig) -> Result<Self> {
        let missing = config.missing_fields();
        if !missing.is_empty() {
            return Err(CatalogError::MissingConfiguration(missing));
        }
        let queries = CatalogQueries::for_schema(&config.schema)?;
        let url = config
            .connection_url()
            .ok_or_else(|| CatalogError::InvalidConfiguration("incomplete connection settings".to_string()))?;

        info!(
            target: "catalog",
            host = config.host.as_deref().unwrap_or_default(),
            port = config.port,
            schema = %config.schema,
            "connecting to catalog"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_max_size)
            .connect(&url)
            .await
            .map_err(CatalogError::Connection)?;

        let store = Self { pool, queries };
        if let Err(err) = store.ping().await {
            store.pool.close().await;
            return Err(err);
        }

        info!(target: "catalog", "catalog connection pool initialized");
        Ok(store)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait::async_trait]
impl CatalogStore for PgCatalogStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(CatalogError::Connection)?;
        Ok(())
    }

    async fn release_year_by_album(&self, mbid: Mbid) -> Result<Option<i32>> {
        trace!(target: "catalog", %mbid, "release year by album identifier");
        let year: Option<Option<i32>> = sqlx::query_scalar(&self.queries.album_year)
            .bind(mbid.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(year.flatten())
    }

    async fn release_year_by_track(&self, mbid: Mbid) -> Result<Option<i32>> {
        trace!(target: "catalog", %mbid, "release year by track identifier");
        let year: Option<Option<i32>> = sqlx::query_scalar(&self.queries.track_year)
            .bind(mbid.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(year.flatten())
    }

    async fn find_artist(&self, name_fragment: &str) -> Result<Option<CatalogArtist>> {
        let row = sqlx::query(&self.queries.artist)
            .bind(escape_like(name_fragment.trim()))
            .fetch_optional(&self.pool)
            .await?;

        let artist = match row {
            Some(row) => Some(CatalogArtist {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
            }),
            None => None,
        };

        if let Some(artist) = &artist {
            debug!(
                target: "catalog",
                search = name_fragment,
                artist_id = artist.id,
                artist = %artist.name,
                "found artist"
            );
        }
        Ok(artist)
    }

    async fn find_recording_year(
        &self,
        artist: &CatalogArtist,
        title_fragment: &str,
    ) -> Result<Option<i32>> {
        trace!(target: "catalog", artist_id = artist.id, title = title_fragment, "recording year");
        let year: Option<Option<i32>> = sqlx::query_scalar(&self.queries.recording_year)
            .bind(artist.id)
            .bind(escape_like(title_fragment.trim()))
            .fetch_optional(&self.pool)
            .await?;
        Ok(year.flatten())
    }
}
