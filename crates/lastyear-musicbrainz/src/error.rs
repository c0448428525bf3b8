// SPDX-License-Identifier: GPL-3.0-or-later

use lastyear_domain::IdentifierKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid {kind} identifier: {value:?}")]
    InvalidIdentifier { kind: IdentifierKind, value: String },

    #[error("Missing catalog configuration: {}", .0.join(", "))]
    MissingConfiguration(Vec<&'static str>),

    #[error("Invalid catalog configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Catalog connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Catalog query failed: {0}")]
    Query(#[source] sqlx::Error),
}

impl CatalogError {
    /// True when the catalog could not be reached at all, as opposed to a failing query.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Connection(err),
            other => Self::Query(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_failures_are_connectivity_errors() {
        assert!(CatalogError::from(sqlx::Error::PoolTimedOut).is_connectivity());
        assert!(CatalogError::from(sqlx::Error::PoolClosed).is_connectivity());
    }

    #[test]
    fn missing_rows_are_query_errors() {
        let err = CatalogError::from(sqlx::Error::RowNotFound);
        assert!(!err.is_connectivity());
        assert!(matches!(err, CatalogError::Query(_)));
    }

    #[test]
    fn missing_configuration_lists_every_field() {
        let err = CatalogError::MissingConfiguration(vec!["host", "password"]);
        assert_eq!(err.to_string(), "Missing catalog configuration: host, password");
    }

    #[test]
    fn invalid_identifier_names_its_kind() {
        let err = CatalogError::InvalidIdentifier {
            kind: IdentifierKind::Track,
            value: "xyz".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid track identifier: \"xyz\"");
    }
}
