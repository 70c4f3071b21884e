use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{Center, Datasource, Layer, LayerProperties, Preferences, SourceDocument};

/// Keys of a project file that are recomputed on every normalization.
pub(crate) const DERIVED_KEYS: [&str; 2] = ["format", "vector_layers"];

/// Values found in a document that this crate does not interpret.
pub type UnrecognizedValues = BTreeMap<String, serde_json::Value>;

/// A project document as written by the author, before any defaults are applied.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSourceDocument {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub attribution: Option<String>,
    pub mtime: Option<u64>,
    pub minzoom: Option<u8>,
    pub maxzoom: Option<u8>,
    pub center: Option<Center>,
    pub bounds: Option<[f64; 4]>,
    #[serde(rename = "_prefs")]
    pub prefs: Option<RawPreferences>,
    #[serde(rename = "Layer")]
    pub layers: Option<Vec<RawLayer>>,
    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPreferences {
    #[serde(rename = "saveCenter")]
    pub save_center: Option<bool>,
    pub disabled: Option<BTreeSet<String>>,
    pub inspector: Option<bool>,
}

#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLayer {
    pub id: Option<String>,
    pub srs: Option<String>,
    pub description: Option<String>,
    pub fields: Option<BTreeMap<String, String>>,
    #[serde(rename = "Datasource")]
    pub datasource: Option<Datasource>,
    pub properties: Option<RawLayerProperties>,
    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLayerProperties {
    pub minzoom: Option<u8>,
    pub maxzoom: Option<u8>,
    #[serde(rename = "buffer-size")]
    pub buffer_size: Option<u32>,
    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

impl RawSourceDocument {
    /// Keys this crate ignored, with their location in the document.
    #[must_use]
    pub fn unrecognized_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .unrecognized
            .keys()
            .filter(|k| !DERIVED_KEYS.contains(&k.as_str()))
            .cloned()
            .collect();
        for (idx, layer) in self.layers.iter().flatten().enumerate() {
            keys.extend(layer.unrecognized.keys().map(|k| format!("Layer[{idx}].{k}")));
            if let Some(props) = &layer.properties {
                keys.extend(
                    props
                        .unrecognized
                        .keys()
                        .map(|k| format!("Layer[{idx}].properties.{k}")),
                );
            }
        }
        keys
    }
}

impl From<Preferences> for RawPreferences {
    fn from(prefs: Preferences) -> Self {
        Self {
            save_center: Some(prefs.save_center),
            disabled: Some(prefs.disabled),
            inspector: Some(prefs.inspector),
        }
    }
}

impl From<LayerProperties> for RawLayerProperties {
    fn from(props: LayerProperties) -> Self {
        Self {
            minzoom: Some(props.minzoom),
            maxzoom: Some(props.maxzoom),
            buffer_size: Some(props.buffer_size),
            unrecognized: UnrecognizedValues::new(),
        }
    }
}

impl From<Layer> for RawLayer {
    fn from(layer: Layer) -> Self {
        Self {
            id: Some(layer.id),
            srs: Some(layer.srs),
            description: layer.description,
            fields: Some(layer.fields),
            datasource: Some(layer.datasource),
            properties: Some(layer.properties.into()),
            unrecognized: UnrecognizedValues::new(),
        }
    }
}

/// Turns a normalized document back into author input, so that it can be
/// normalized again. The derived manifest is dropped.
impl From<SourceDocument> for RawSourceDocument {
    fn from(doc: SourceDocument) -> Self {
        Self {
            id: doc.id,
            name: Some(doc.name),
            description: Some(doc.description),
            attribution: Some(doc.attribution),
            mtime: Some(doc.mtime),
            minzoom: Some(doc.minzoom),
            maxzoom: Some(doc.maxzoom),
            center: Some(doc.center),
            bounds: doc.bounds,
            prefs: Some(doc.prefs.into()),
            layers: Some(doc.layers.into_iter().map(Into::into).collect()),
            unrecognized: UnrecognizedValues::new(),
        }
    }
}
