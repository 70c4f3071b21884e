//! Error types for document normalization.

use crate::catalog::IntrospectionError;

/// A convenience [`Result`] for document normalization.
pub type NormalizeResult<T> = Result<T, NormalizationError>;

/// Errors that can occur while normalizing a document.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum NormalizationError {
    /// The datasource of a layer could not be introspected.
    #[error("Unable to read the fields of layer '{layer}': {source}")]
    Introspection {
        /// Id of the offending layer.
        layer: String,
        /// Underlying cause.
        #[source]
        source: IntrospectionError,
    },

    /// Placeholder data was substituted once, and introspection still failed.
    #[error(
        "Layer(s) {} still fail after replacing their data with placeholder GeoJSON: {source}",
        .layers.join(", ")
    )]
    RecoveryExhausted {
        /// Ids of the layers that failed after the substitution.
        layers: Vec<String>,
        /// The error reported for the first of them.
        #[source]
        source: IntrospectionError,
    },
}
