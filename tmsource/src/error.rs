use std::io;
use std::path::PathBuf;

use tmsource_core::descriptor::DescriptorError;
use tmsource_core::normalize::NormalizationError;

/// A convenience [`Result`] for the tmsource crate.
pub type TmSourceResult<T> = Result<T, TmSourceError>;

#[derive(thiserror::Error, Debug)]
pub enum TmSourceError {
    #[error("Unable to read {path}: {0}", path = .1.display())]
    Io(#[source] io::Error, PathBuf),

    #[error("Invalid source identifier '{0}': {1}")]
    InvalidIdentifier(String, &'static str),

    #[error("Unable to parse the document of {1}: {0}")]
    Parse(#[source] serde_yaml::Error, String),

    #[error("Unable to substitute variables in the document of {1}: {0}")]
    Substitution(#[source] subst::yaml::Error, String),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("The pipeline for {0} has already run")]
    PipelineAlreadyRun(String),

    #[error("Unable to write {path}: {0}", path = .1.display())]
    Write(#[source] io::Error, PathBuf),

    #[error("Unable to serialize the normalized document: {0}")]
    Serialize(#[source] serde_yaml::Error),
}
