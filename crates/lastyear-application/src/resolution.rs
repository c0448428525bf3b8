// SPDX-License-Identifier: GPL-3.0-or-later

//! Two-pass release year resolution for a batch of scrobbles.
//!
//! Pass 1 tries the exact album and track identifiers; Pass 2 runs the fuzzy
//! lookup over whatever Pass 1 left unresolved. Every scrobble that gets
//! through either pass receives exactly one write: a year, or the explicit
//! "not found" marker.

use crate::fuzzy_lookup::FuzzyLookup;
use crate::identifier_lookup::IdentifierLookup;
use crate::request::{RequestError, ResolveRequest, ResolveTarget};
use futures::stream::{self, StreamExt};
use lastyear_config::ResolutionConfig;
use lastyear_domain::{
    IdentifierKind, ReleaseYear, ResolutionPath, ResolutionReport, Scrobble, ScrobbleResolution,
    SkipReason,
};
use lastyear_infrastructure::ScrobbleRepository;
use lastyear_musicbrainz::{CatalogError, CatalogStore};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const PROGRESS_INTERVAL: usize = 100;

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(#[source] CatalogError),

    #[error("scrobble store error: {0}")]
    ScrobbleStore(#[source] anyhow::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),
}

pub struct ReleaseYearResolver {
    catalog: Arc<dyn CatalogStore>,
    scrobbles: Arc<dyn ScrobbleRepository>,
    identifier_lookup: IdentifierLookup,
    fuzzy_lookup: FuzzyLookup,
    max_concurrent_lookups: usize,
}

impl ReleaseYearResolver {
    pub fn new(catalog: Arc<dyn CatalogStore>, scrobbles: Arc<dyn ScrobbleRepository>) -> Self {
        Self {
            identifier_lookup: IdentifierLookup::new(catalog.clone()),
            fuzzy_lookup: FuzzyLookup::new(catalog.clone()),
            catalog,
            scrobbles,
            max_concurrent_lookups: 1,
        }
    }

    /// Scrobbles resolved at once within a pass. Values below 1 are treated as 1.
    pub fn with_max_concurrent_lookups(mut self, limit: usize) -> Self {
        self.max_concurrent_lookups = limit.max(1);
        self
    }

    /// Validate `request` and resolve the listener's pending scrobbles.
    pub async fn resolve(
        &self,
        request: ResolveRequest,
        config: &ResolutionConfig,
        cancel: &CancellationToken,
    ) -> Result<ResolutionReport, ResolutionError> {
        let target = request.validate_now(config)?;
        self.resolve_for_listener(&target, cancel).await
    }

    /// Resolve every scrobble of `target` that has no release year yet.
    pub async fn resolve_for_listener(
        &self,
        target: &ResolveTarget,
        cancel: &CancellationToken,
    ) -> Result<ResolutionReport, ResolutionError> {
        let batch = self
            .scrobbles
            .list_needing_release_year(&target.username, target.year)
            .await
            .map_err(ResolutionError::ScrobbleStore)?;

        info!(
            target: "resolution",
            username = %target.username, year = target.year, count = batch.len(),
            "resolving release years"
        );

        self.resolve_batch(&batch, cancel).await
    }

    /// Run both passes over `batch`.
    ///
    /// Only an unreachable catalog fails the batch. Lookup errors count as
    /// "not found"; write failures and cancellation show up as
    /// [`ResolutionPath::Skipped`] and leave the scrobble for a later run.
    pub async fn resolve_batch(
        &self,
        batch: &[Scrobble],
        cancel: &CancellationToken,
    ) -> Result<ResolutionReport, ResolutionError> {
        self.catalog.ping().await.map_err(|err| {
            warn!(target: "resolution", error = %err, "catalog ping failed");
            ResolutionError::CatalogUnavailable(err)
        })?;

        let limit = self.max_concurrent_lookups;

        let started = Instant::now();
        let first_pass = in_input_order(batch, limit, |s| self.identifier_pass(s, cancel)).await;
        let pending: Vec<&Scrobble> = batch
            .iter()
            .zip(&first_pass)
            .filter(|(_, path)| path.is_none())
            .map(|(scrobble, _)| scrobble)
            .collect();
        info!(
            target: "resolution",
            total = batch.len(),
            resolved = first_pass
                .iter()
                .filter(|p| matches!(p, Some(ResolutionPath::Identifier(_))))
                .count(),
            pending = pending.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "identifier pass finished"
        );

        let started = Instant::now();
        let done = AtomicUsize::new(0);
        let total = pending.len();
        let second_pass = in_input_order(pending, limit, |s| {
            self.fuzzy_pass(s, cancel, &done, total)
        })
        .await;
        info!(
            target: "resolution",
            total,
            resolved = second_pass
                .iter()
                .filter(|p| matches!(p, ResolutionPath::Fuzzy(_)))
                .count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fuzzy pass finished"
        );

        let mut second_pass = second_pass.into_iter();
        let resolutions = batch
            .iter()
            .zip(first_pass)
            .map(|(scrobble, path)| ScrobbleResolution {
                scrobble_id: scrobble.id,
                path: path
                    .or_else(|| second_pass.next())
                    .unwrap_or(ResolutionPath::Skipped(SkipReason::Cancelled)),
            })
            .collect();

        let report = ResolutionReport::from_resolutions(resolutions);
        if cancel.is_cancelled() {
            info!(target: "resolution", outcome = %report.outcome, "resolution cancelled");
        } else {
            info!(target: "resolution", outcome = %report.outcome, "resolution finished");
        }
        Ok(report)
    }

    /// `None` leaves the scrobble for the fuzzy pass.
    async fn identifier_pass(
        &self,
        scrobble: &Scrobble,
        cancel: &CancellationToken,
    ) -> Option<ResolutionPath> {
        let album = scrobble.album_identifier();
        let track = scrobble.track_identifier();
        if album.is_none() && track.is_none() {
            return None;
        }
        if cancel.is_cancelled() {
            return Some(ResolutionPath::Skipped(SkipReason::Cancelled));
        }

        let mut year = None;
        if let Some(id) = album {
            year = self.lookup_identifier(scrobble, IdentifierKind::Album, id).await;
        }
        if year.is_none() {
            if let Some(id) = track {
                year = self.lookup_identifier(scrobble, IdentifierKind::Track, id).await;
            }
        }
        let year = year?;

        if self.persist(scrobble, ReleaseYear::Found(year)).await {
            Some(ResolutionPath::Identifier(year))
        } else {
            Some(ResolutionPath::Skipped(SkipReason::WriteFailed))
        }
    }

    async fn lookup_identifier(
        &self,
        scrobble: &Scrobble,
        kind: IdentifierKind,
        identifier: &str,
    ) -> Option<i32> {
        match self.identifier_lookup.find_release_year(kind, identifier).await {
            Ok(year) => year,
            Err(err) => {
                warn!(
                    target: "resolution",
                    scrobble_id = %scrobble.id, %kind, identifier, error = %err,
                    "identifier lookup failed"
                );
                None
            }
        }
    }

    async fn fuzzy_pass(
        &self,
        scrobble: &Scrobble,
        cancel: &CancellationToken,
        done: &AtomicUsize,
        total: usize,
    ) -> ResolutionPath {
        if cancel.is_cancelled() {
            return ResolutionPath::Skipped(SkipReason::Cancelled);
        }

        let year = match self
            .fuzzy_lookup
            .find_release_year(&scrobble.artist_name, &scrobble.track_name)
            .await
        {
            Ok(year) => year,
            Err(err) => {
                warn!(
                    target: "resolution",
                    scrobble_id = %scrobble.id, error = %err,
                    "fuzzy lookup failed"
                );
                None
            }
        };

        let path = if self.persist(scrobble, ReleaseYear::from_lookup(year)).await {
            match year {
                Some(year) => ResolutionPath::Fuzzy(year),
                None => ResolutionPath::Unresolved,
            }
        } else {
            ResolutionPath::Skipped(SkipReason::WriteFailed)
        };

        let count = done.fetch_add(1, Ordering::Relaxed) + 1;
        if count % PROGRESS_INTERVAL == 0 {
            info!(target: "resolution", processed = count, total, "fuzzy pass progress");
        }
        path
    }

    async fn persist(&self, scrobble: &Scrobble, release_year: ReleaseYear) -> bool {
        match self.scrobbles.set_release_year(scrobble.id, release_year).await {
            Ok(()) => {
                debug!(target: "resolution", scrobble_id = %scrobble.id, %release_year, "release year saved");
                true
            }
            Err(err) => {
                warn!(
                    target: "resolution",
                    scrobble_id = %scrobble.id, %release_year, error = %err,
                    "failed to save release year"
                );
                false
            }
        }
    }
}

/// Drive `f` over `items` with at most `limit` futures in flight and return
/// the results in input order.
async fn in_input_order<I, F, Fut, T>(items: I, limit: usize, mut f: F) -> Vec<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = T>,
{
    let mut results: Vec<(usize, T)> = stream::iter(items.into_iter().enumerate())
        .map(|(idx, item)| {
            let fut = f(item);
            async move { (idx, fut.await) }
        })
        .buffer_unordered(limit.max(1))
        .collect()
        .await;
    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, value)| value).collect()
}
