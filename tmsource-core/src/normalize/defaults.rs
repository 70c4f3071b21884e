//! Default values for every level of a project document.
//!
//! Each function fills one nesting level: a value present in the raw input
//! always wins, even when it is falsy (`minzoom: 0`, `inspector: false`).

use crate::document::{
    Center, Layer, LayerProperties, Preferences, RawLayer, RawLayerProperties, RawPreferences,
    RawSourceDocument, SourceDocument,
};

pub const DEFAULT_MINZOOM: u8 = 0;
pub const DEFAULT_MAXZOOM: u8 = 6;

/// Fill document level defaults, then those of every nested block.
///
/// `now` is used as `mtime` when the document has none. The manifest is left
/// empty and `format` blank; both are derived later.
pub fn fill_document(raw: RawSourceDocument, now: u64) -> SourceDocument {
    SourceDocument {
        id: raw.id,
        name: raw.name.unwrap_or_default(),
        description: raw.description.unwrap_or_default(),
        attribution: raw.attribution.unwrap_or_default(),
        mtime: raw.mtime.unwrap_or(now),
        minzoom: raw.minzoom.unwrap_or(DEFAULT_MINZOOM),
        maxzoom: raw.maxzoom.unwrap_or(DEFAULT_MAXZOOM),
        center: raw.center.unwrap_or_default(),
        bounds: raw.bounds,
        prefs: fill_prefs(raw.prefs.unwrap_or_default()),
        layers: raw
            .layers
            .unwrap_or_default()
            .into_iter()
            .map(fill_layer)
            .collect(),
        format: String::new(),
        vector_layers: Vec::new(),
    }
}

fn fill_prefs(raw: RawPreferences) -> Preferences {
    let defaults = Preferences::default();
    Preferences {
        save_center: raw.save_center.unwrap_or(defaults.save_center),
        disabled: raw.disabled.unwrap_or(defaults.disabled),
        inspector: raw.inspector.unwrap_or(defaults.inspector),
    }
}

fn fill_layer(raw: RawLayer) -> Layer {
    Layer {
        id: raw.id.unwrap_or_default(),
        srs: raw.srs.unwrap_or_default(),
        description: raw.description,
        fields: raw.fields.unwrap_or_default(),
        datasource: raw.datasource.unwrap_or_default(),
        properties: fill_properties(raw.properties.unwrap_or_default()),
    }
}

fn fill_properties(raw: RawLayerProperties) -> LayerProperties {
    let defaults = LayerProperties::default();
    LayerProperties {
        minzoom: raw.minzoom.unwrap_or(defaults.minzoom),
        maxzoom: raw.maxzoom.unwrap_or(defaults.maxzoom),
        buffer_size: raw.buffer_size.unwrap_or(defaults.buffer_size),
    }
}
