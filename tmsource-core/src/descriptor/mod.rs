//! Generation of the Mapnik configuration document for a normalized source.
//!
//! [`DescriptorBuilder`] turns a [`SourceDocument`] into [`DescriptorOptions`]
//! and hands them to a [`StyleRenderer`]. Output is always in the spherical
//! mercator projection.

use std::fmt::Debug;

use serde::Serialize;
use tilejson::VectorLayer;
use tracing::error;

use crate::document::{Center, Layer, SourceDocument};
use crate::srs;

mod error;
pub use error::{DescriptorError, DescriptorResult, RenderFailure, RenderIssue};

mod mapnik;
pub use mapnik::MapnikXmlRenderer;

/// Everything a renderer needs to produce the configuration document.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptorOptions {
    pub name: String,
    pub description: String,
    pub attribution: String,
    pub bounds: Option<[f64; 4]>,
    pub center: Center,
    pub format: String,
    pub minzoom: u8,
    pub maxzoom: u8,
    /// Output projection.
    pub srs: String,
    /// Layers, each with an explicit `srs`.
    #[serde(rename = "Layer")]
    pub layers: Vec<Layer>,
    /// The vector layer manifest, serialized as `{"vector_layers": [...]}`.
    pub json: String,
}

#[derive(Serialize)]
struct Manifest<'a> {
    vector_layers: &'a [VectorLayer],
}

/// Renders [`DescriptorOptions`] into a configuration document.
pub trait StyleRenderer: Send + Sync + Debug {
    fn render(&self, options: &DescriptorOptions) -> Result<String, RenderFailure>;
}

/// Builds descriptors with the given renderer.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorBuilder<'a> {
    renderer: &'a dyn StyleRenderer,
}

impl<'a> DescriptorBuilder<'a> {
    #[must_use]
    pub fn new(renderer: &'a dyn StyleRenderer) -> Self {
        Self { renderer }
    }

    /// Collect the renderer options for `doc`.
    pub fn options(doc: &SourceDocument) -> DescriptorResult<DescriptorOptions> {
        let output_srs = srs::output_projection();
        let layers = doc
            .layers
            .iter()
            .map(|layer| {
                let mut layer = layer.clone();
                if layer.srs.is_empty() {
                    layer.srs = output_srs.to_string();
                }
                layer
            })
            .collect();
        let json = serde_json::to_string(&Manifest {
            vector_layers: &doc.vector_layers,
        })
        .map_err(DescriptorError::Manifest)?;

        Ok(DescriptorOptions {
            name: doc.name.clone(),
            description: doc.description.clone(),
            attribution: doc.attribution.clone(),
            bounds: doc.bounds,
            center: doc.center,
            format: doc.format.clone(),
            minzoom: doc.minzoom,
            maxzoom: doc.maxzoom,
            srs: output_srs.to_string(),
            layers,
            json,
        })
    }

    /// Generate the configuration document for `doc`.
    ///
    /// Validation problems are logged one by one and all returned in
    /// [`DescriptorError::Invalid`].
    pub fn build(&self, doc: &SourceDocument) -> DescriptorResult<String> {
        let options = Self::options(doc)?;
        match self.renderer.render(&options) {
            Ok(rendered) => Ok(rendered),
            Err(RenderFailure::Invalid(issues)) => {
                for issue in &issues {
                    error!("{issue}");
                }
                Err(DescriptorError::Invalid(issues))
            }
            Err(RenderFailure::Fatal(e)) => Err(DescriptorError::Render(e)),
        }
    }
}
