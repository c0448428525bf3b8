// SPDX-License-Identifier: GPL-3.0-or-later

//! Defaulting and validation of a resolve request.

use chrono::{Datelike, Utc};
use lastyear_config::ResolutionConfig;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("no username given and no default username configured")]
    MissingUsername,

    #[error("year {year} is out of range ({earliest}..={latest})")]
    YearOutOfRange { year: i32, earliest: i32, latest: i32 },
}

/// A resolve request as it arrives, with both fields optional.
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    pub username: Option<String>,
    pub year: Option<i32>,
}

/// A validated request: whose scrobbles, from which listening year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveTarget {
    pub username: String,
    pub year: i32,
}

impl ResolveRequest {
    pub fn new(username: Option<String>, year: Option<i32>) -> Self {
        Self { username, year }
    }

    /// Fill in defaults from `config` and check the year against
    /// `config.earliest_year..=current_year`.
    pub fn validate(
        self,
        config: &ResolutionConfig,
        current_year: i32,
    ) -> Result<ResolveTarget, RequestError> {
        let username = self
            .username
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .or_else(|| {
                config
                    .default_username
                    .as_deref()
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .map(str::to_string)
            })
            .ok_or(RequestError::MissingUsername)?;

        let year = self.year.or(config.default_year).unwrap_or(current_year);
        if year < config.earliest_year || year > current_year {
            return Err(RequestError::YearOutOfRange {
                year,
                earliest: config.earliest_year,
                latest: current_year,
            });
        }

        Ok(ResolveTarget { username, year })
    }

    /// [`validate`](Self::validate) against the current UTC year.
    pub fn validate_now(self, config: &ResolutionConfig) -> Result<ResolveTarget, RequestError> {
        self.validate(config, Utc::now().year())
    }
}
