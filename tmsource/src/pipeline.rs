//! Runs one source from its identifier to a registrable descriptor.

use std::fmt::{self, Debug, Formatter};
use std::path::{Path, PathBuf};

use subst::VariableMap;
use tmsource_core::catalog::SchemaCatalog;
use tmsource_core::descriptor::{DescriptorBuilder, StyleRenderer};
use tmsource_core::document::{RawSourceDocument, SourceDocument};
use tmsource_core::normalize::{Normalized, Normalizer, RecoveryWarning};
use tracing::{debug, info};

use crate::{DocumentLoader, SourceLocation, TileRegistrar, TmSourceError, TmSourceResult};

/// Lifecycle of a [`SourcePipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Created,
    Loading,
    Normalizing,
    Rendering,
    Ready,
    Failed,
}

/// A source that went through the whole pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadySource {
    pub id: String,
    /// Directory relative datasource paths resolve against.
    pub base: PathBuf,
    /// The Mapnik XML descriptor.
    pub xml: String,
    pub document: SourceDocument,
    /// Placeholder substitutions made while normalizing.
    pub warnings: Vec<RecoveryWarning>,
}

impl ReadySource {
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Hand the source over to the tile server.
    pub fn register(self, registrar: &mut dyn TileRegistrar) {
        registrar.register(self);
    }
}

/// Loads, normalizes and renders a single source.
///
/// A pipeline runs at most once. Any failure moves it to [`Stage::Failed`],
/// and there is no retry.
pub struct SourcePipeline<'a> {
    location: SourceLocation,
    yaml: Option<String>,
    loader: &'a dyn DocumentLoader,
    catalog: &'a dyn SchemaCatalog,
    renderer: &'a dyn StyleRenderer,
    stage: Stage,
}

impl Debug for SourcePipeline<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourcePipeline")
            .field("location", &self.location)
            .field("stage", &self.stage)
            .field("has_yaml", &self.yaml.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> SourcePipeline<'a> {
    #[must_use]
    pub fn new(
        location: SourceLocation,
        loader: &'a dyn DocumentLoader,
        catalog: &'a dyn SchemaCatalog,
        renderer: &'a dyn StyleRenderer,
    ) -> Self {
        Self {
            location,
            yaml: None,
            loader,
            catalog,
            renderer,
            stage: Stage::Created,
        }
    }

    /// Use this document instead of loading it.
    #[must_use]
    pub fn with_yaml(mut self, yaml: impl Into<String>) -> Self {
        self.yaml = Some(yaml.into());
        self
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// Run the pipeline on the document as written.
    pub async fn run(&mut self) -> TmSourceResult<ReadySource> {
        self.run_parsed(|yaml, id| {
            serde_yaml::from_str(yaml).map_err(|e| TmSourceError::Parse(e, id.to_string()))
        })
        .await
    }

    /// Run the pipeline, substituting `${VAR}` references in the document from `env`.
    pub async fn run_with_env<'e, M>(&mut self, env: &'e M) -> TmSourceResult<ReadySource>
    where
        M: VariableMap<'e> + ?Sized,
        M::Value: AsRef<str>,
    {
        self.run_parsed(|yaml, id| {
            subst::yaml::from_str(yaml, env)
                .map_err(|e| TmSourceError::Substitution(e, id.to_string()))
        })
        .await
    }

    async fn run_parsed<F>(&mut self, parse: F) -> TmSourceResult<ReadySource>
    where
        F: FnOnce(&str, &str) -> TmSourceResult<RawSourceDocument>,
    {
        if self.stage != Stage::Created {
            return Err(TmSourceError::PipelineAlreadyRun(
                self.location.id().to_string(),
            ));
        }
        let result = self.advance(parse).await;
        if result.is_err() {
            self.set_stage(Stage::Failed);
        }
        result
    }

    async fn advance<F>(&mut self, parse: F) -> TmSourceResult<ReadySource>
    where
        F: FnOnce(&str, &str) -> TmSourceResult<RawSourceDocument>,
    {
        let yaml = match self.yaml.take() {
            Some(yaml) => yaml,
            None => {
                self.set_stage(Stage::Loading);
                self.loader
                    .read(&self.location)
                    .await
                    .map_err(|e| TmSourceError::Io(e, self.location.document_path()))?
            }
        };
        let mut raw = parse(&yaml, self.location.id())?;
        raw.id = Some(self.location.id().to_string());

        self.set_stage(Stage::Normalizing);
        let Normalized { document, warnings } = Normalizer::new(self.catalog).normalize(raw).await?;

        self.set_stage(Stage::Rendering);
        let xml = DescriptorBuilder::new(self.renderer).build(&document)?;

        self.set_stage(Stage::Ready);
        info!(
            "Source {} is ready with {} layer(s)",
            self.location.id(),
            document.layers.len()
        );
        Ok(ReadySource {
            id: self.location.id().to_string(),
            base: self.location.dir().to_path_buf(),
            xml,
            document,
            warnings,
        })
    }

    fn set_stage(&mut self, stage: Stage) {
        debug!("{}: {:?} -> {stage:?}", self.location.id(), self.stage);
        self.stage = stage;
    }
}
