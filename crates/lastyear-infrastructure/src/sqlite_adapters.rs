// SPDX-License-Identifier: GPL-3.0-or-later
use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use lastyear_domain::{ReleaseYear, Scrobble, ScrobbleId};
use sqlx::Row;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::repositories::ScrobbleRepository;

const STATUS_PENDING: &str = "pending";
const STATUS_FOUND: &str = "found";
const STATUS_NOT_FOUND: &str = "not_found";

/// SQLx-backed Scrobble repository
pub struct SqliteScrobbleRepository {
    pool: SqlitePool,
}

impl SqliteScrobbleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ScrobbleRepository for SqliteScrobbleRepository {
    async fn insert(&self, scrobble: Scrobble) -> Result<Scrobble> {
        debug!(target: "repository", scrobble_id = %scrobble.id, "inserting scrobble");
        let q = r#"
            INSERT INTO scrobbles (
                id, username, track_name, track_mbid, artist_name, artist_mbid,
                album_name, album_mbid, scrobbled_at, year, release_year,
                release_year_status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        let (status, year) = status_columns(scrobble.release_year);

        sqlx::query(q)
            .bind(scrobble.id.to_string())
            .bind(&scrobble.username)
            .bind(&scrobble.track_name)
            .bind(&scrobble.track_mbid)
            .bind(&scrobble.artist_name)
            .bind(&scrobble.artist_mbid)
            .bind(&scrobble.album_name)
            .bind(&scrobble.album_mbid)
            .bind(scrobble.scrobbled_at.to_rfc3339())
            .bind(scrobble.year)
            .bind(year)
            .bind(status)
            .bind(scrobble.created_at.to_rfc3339())
            .bind(scrobble.updated_at.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(scrobble)
    }

    async fn get_by_id(&self, id: ScrobbleId) -> Result<Option<Scrobble>> {
        debug!(target: "repository", %id, "fetching scrobble by id");
        let row = sqlx::query("SELECT * FROM scrobbles WHERE id = ? LIMIT 1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_scrobble(&r)).transpose()
    }

    async fn list_needing_release_year(&self, username: &str, year: i32) -> Result<Vec<Scrobble>> {
        debug!(target: "repository", username, year, "listing scrobbles needing a release year");
        let rows = sqlx::query(
            "SELECT * FROM scrobbles WHERE username = ? AND year = ? AND release_year_status = ? \
             ORDER BY scrobbled_at, id",
        )
        .bind(username)
        .bind(year)
        .bind(STATUS_PENDING)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            out.push(row_to_scrobble(&r)?);
        }
        Ok(out)
    }

    async fn set_release_year(&self, id: ScrobbleId, release_year: ReleaseYear) -> Result<()> {
        debug!(target: "repository", %id, %release_year, "setting release year");
        let (status, year) = status_columns(Some(release_year));
        let result = sqlx::query(
            "UPDATE scrobbles SET release_year = ?, release_year_status = ?, updated_at = ? WHERE id = ?",
        )
        .bind(year)
        .bind(status)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!("scrobble {} does not exist", id);
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

fn status_columns(release_year: Option<ReleaseYear>) -> (&'static str, Option<i32>) {
    match release_year {
        None => (STATUS_PENDING, None),
        Some(ReleaseYear::Found(year)) => (STATUS_FOUND, Some(year)),
        Some(ReleaseYear::NotFound) => (STATUS_NOT_FOUND, None),
    }
}

fn parse_release_year(status: &str, year: Option<i32>) -> Result<Option<ReleaseYear>> {
    match (status, year) {
        (STATUS_PENDING, _) => Ok(None),
        (STATUS_FOUND, Some(year)) => Ok(Some(ReleaseYear::Found(year))),
        (STATUS_FOUND, None) => Err(anyhow!("release year status is found but year is missing")),
        (STATUS_NOT_FOUND, _) => Ok(Some(ReleaseYear::NotFound)),
        (other, _) => Err(anyhow!("unknown release year status: {}", other)),
    }
}

fn parse_dt(s: String) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Ok(dt.with_timezone(&Utc));
    }
    // SQLite CURRENT_TIMESTAMP format: "YYYY-MM-DD HH:MM:SS"
    let ndt = NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")?;
    Ok(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
}

fn row_to_scrobble(row: &sqlx::sqlite::SqliteRow) -> Result<Scrobble> {
    let id_str: String = row.try_get("id")?;
    let status: String = row.try_get("release_year_status")?;
    let release_year: Option<i32> = row.try_get("release_year")?;

    Ok(Scrobble {
        id: ScrobbleId::from_uuid(Uuid::parse_str(&id_str)?),
        username: row.try_get("username")?,
        artist_name: row.try_get("artist_name")?,
        track_name: row.try_get("track_name")?,
        album_name: row.try_get("album_name")?,
        artist_mbid: row.try_get("artist_mbid")?,
        track_mbid: row.try_get("track_mbid")?,
        album_mbid: row.try_get("album_mbid")?,
        scrobbled_at: parse_dt(row.try_get("scrobbled_at")?)?,
        year: row.try_get("year")?,
        release_year: parse_release_year(&status, release_year)?,
        created_at: parse_dt(row.try_get("created_at")?)?,
        updated_at: parse_dt(row.try_get("updated_at")?)?,
    })
}

// ============================================================================
// Tests
// ============================================================================
