//! The tm2source project document.
//!
//! [`RawSourceDocument`] is what a `data.yml` file deserializes into: every
//! field is optional. [`SourceDocument`] is the normalized form produced by
//! [`Normalizer`](crate::normalize::Normalizer), with all defaults applied
//! and the vector layer manifest attached.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tilejson::VectorLayer;

mod raw;
pub use raw::{RawLayer, RawLayerProperties, RawPreferences, RawSourceDocument};

/// Datasource connection parameters, keyed by parameter name.
///
/// Always contains a `type` entry once normalized, e.g. `postgis` or `geojson`.
pub type Datasource = BTreeMap<String, serde_json::Value>;

/// Key of the datasource type tag.
pub const DATASOURCE_TYPE: &str = "type";

/// Format marker of a normalized document, distinguishing it from imagery sources.
pub const VECTOR_TILE_FORMAT: &str = "pbf";

/// Map center as `[longitude, latitude, zoom]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64, u8)", into = "(f64, f64, u8)")]
pub struct Center {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: u8,
}

impl Default for Center {
    fn default() -> Self {
        Self {
            longitude: 0.0,
            latitude: 0.0,
            zoom: 3,
        }
    }
}

impl From<(f64, f64, u8)> for Center {
    fn from((longitude, latitude, zoom): (f64, f64, u8)) -> Self {
        Self {
            longitude,
            latitude,
            zoom,
        }
    }
}

impl From<Center> for (f64, f64, u8) {
    fn from(c: Center) -> Self {
        (c.longitude, c.latitude, c.zoom)
    }
}

/// Editor preferences stored alongside the project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Preferences {
    /// Save the current map center when the project is edited.
    #[serde(rename = "saveCenter")]
    pub save_center: bool,
    /// Ids of layers hidden in the editor.
    pub disabled: BTreeSet<String>,
    /// Whether the feature inspector is enabled.
    pub inspector: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            save_center: true,
            disabled: BTreeSet::new(),
            inspector: false,
        }
    }
}

/// Rendering properties of a layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LayerProperties {
    pub minzoom: u8,
    pub maxzoom: u8,
    #[serde(rename = "buffer-size")]
    pub buffer_size: u32,
}

impl Default for LayerProperties {
    fn default() -> Self {
        Self {
            minzoom: 0,
            maxzoom: 22,
            buffer_size: 0,
        }
    }
}

/// A single renderable feature layer.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Layer {
    /// Layer id. Empty ids are accepted.
    pub id: String,
    /// Spatial reference of the layer data. Empty means the output projection.
    pub srs: String,
    pub description: Option<String>,
    /// Field types declared by the author, overriding the introspected ones.
    pub fields: BTreeMap<String, String>,
    #[serde(rename = "Datasource")]
    pub datasource: Datasource,
    pub properties: LayerProperties,
}

impl Layer {
    /// The datasource `type` tag, if it is a string.
    #[must_use]
    pub fn datasource_type(&self) -> Option<&str> {
        self.datasource
            .get(DATASOURCE_TYPE)
            .and_then(serde_json::Value::as_str)
    }
}

/// A fully normalized tm2source project.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SourceDocument {
    /// Resolved identifier of the document, used as base for relative paths.
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub attribution: String,
    /// Modification time in milliseconds since the Unix epoch.
    pub mtime: u64,
    pub minzoom: u8,
    pub maxzoom: u8,
    pub center: Center,
    /// Bounds as `[west, south, east, north]`.
    pub bounds: Option<[f64; 4]>,
    #[serde(rename = "_prefs")]
    pub prefs: Preferences,
    #[serde(rename = "Layer")]
    pub layers: Vec<Layer>,
    pub format: String,
    /// Vector layer manifest, index-aligned with [`layers`](Self::layers).
    pub vector_layers: Vec<VectorLayer>,
}
