//! Error types for datasource introspection.

use std::path::PathBuf;

#[cfg(feature = "postgres")]
use deadpool_postgres::tokio_postgres::Error as TokioPgError;

/// A convenience [`Result`] for datasource introspection.
pub type IntrospectionResult<T> = Result<T, IntrospectionError>;

/// Errors that can occur while opening a datasource to read its fields.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum IntrospectionError {
    /// The datasource has no `type` tag.
    #[error("Datasource has no type")]
    MissingType,

    /// The datasource type cannot be introspected by this catalog.
    #[error("Datasource type '{0}' is not supported")]
    UnsupportedType(String),

    /// A parameter required to open the datasource is missing.
    #[error("Datasource of type '{0}' requires the '{1}' parameter")]
    MissingParameter(String, &'static str),

    /// Inline GeoJSON that is empty or cannot be parsed.
    ///
    /// This is the one failure callers may recover from by substituting
    /// placeholder data, see [`is_recoverable`](Self::is_recoverable).
    #[error("Failed to parse inline GeoJSON: {0}")]
    InvalidInlineGeoJson(String),

    /// IO error.
    #[error("IO error {0}: {path}", path = .1.display())]
    IoError(#[source] std::io::Error, PathBuf),

    /// A GeoJSON file could not be parsed.
    #[error("Failed to parse GeoJSON file {path}: {0}", path = .1.display())]
    InvalidGeoJsonFile(#[source] Box<geojson::Error>, PathBuf),

    /// Postgres error.
    #[cfg(feature = "postgres")]
    #[error("Postgres error while {1}: {0}")]
    PostgresError(#[source] TokioPgError, &'static str),

    /// The Postgres connection ended before the datasource was described.
    #[cfg(feature = "postgres")]
    #[error("Postgres connection closed while describing table {0}")]
    ConnectionClosed(String),

    /// Errors occurring in catalogs not implemented by `tmsource-core`.
    #[error(transparent)]
    OtherError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl IntrospectionError {
    /// Whether the failure is caused by bad inline GeoJSON, which the
    /// normalizer works around by substituting placeholder data.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidInlineGeoJson(_))
    }
}
