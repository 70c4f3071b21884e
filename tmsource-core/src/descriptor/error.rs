//! Error types for descriptor generation.

use std::fmt::{self, Display, Formatter};

/// A convenience [`Result`] for descriptor generation.
pub type DescriptorResult<T> = Result<T, DescriptorError>;

/// A single validation problem reported by a [`StyleRenderer`](super::StyleRenderer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderIssue {
    /// Id of the layer the problem belongs to, if any.
    pub layer: Option<String>,
    pub message: String,
}

impl RenderIssue {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            layer: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn for_layer(layer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            layer: Some(layer.into()),
            message: message.into(),
        }
    }
}

impl Display for RenderIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.layer {
            Some(layer) => write!(f, "Layer '{layer}': {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// How a renderer failed.
#[derive(Debug)]
pub enum RenderFailure {
    /// The input failed validation; every problem found is listed.
    Invalid(Vec<RenderIssue>),
    /// Rendering failed for a reason unrelated to validation.
    Fatal(Box<dyn std::error::Error + Send + Sync>),
}

fn list_issues(issues: &[RenderIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("\n  - {issue}"))
        .collect()
}

/// Errors that can occur while generating a descriptor.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum DescriptorError {
    /// The vector layer manifest could not be serialized.
    #[error("Unable to serialize the vector layer manifest: {0}")]
    Manifest(#[source] serde_json::Error),

    /// The renderer rejected the descriptor options.
    #[error("Descriptor failed validation with {} error(s):{}", .0.len(), list_issues(.0))]
    Invalid(Vec<RenderIssue>),

    /// The renderer failed.
    #[error("Unable to render descriptor: {0}")]
    Render(#[source] Box<dyn std::error::Error + Send + Sync>),
}
