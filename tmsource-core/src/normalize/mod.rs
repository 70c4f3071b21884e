//! Normalization of tm2source documents.
//!
//! [`Normalizer::normalize`] applies defaults at every nesting level, drops
//! datasource parameters the [`SchemaCatalog`] does not know, injects default
//! extents for PostGIS layers, and builds the vector layer manifest by
//! introspecting every layer.
//!
//! Inline GeoJSON that cannot be introspected is replaced once with a
//! single-feature placeholder, see [`PLACEHOLDER_GEOJSON`].

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use futures::future::join_all;
use serde_json::Value;
use tilejson::VectorLayer;
use tracing::{debug, warn};

use crate::catalog::{FieldTypes, IntrospectionError, IntrospectionResult, SchemaCatalog};
use crate::document::{
    DATASOURCE_TYPE, Datasource, Layer, RawSourceDocument, SourceDocument, VECTOR_TILE_FORMAT,
};
use crate::{location, srs};

mod defaults;
pub use defaults::{DEFAULT_MAXZOOM, DEFAULT_MINZOOM};

mod error;
pub use error::{NormalizationError, NormalizeResult};

/// Datasource type that receives a default extent from its layer `srs`.
const EXTENT_SOURCE_TYPE: &str = "postgis";

/// Inline data substituted for GeoJSON that cannot be introspected.
pub const PLACEHOLDER_GEOJSON: &str = r#"{"type":"Feature","properties":{"a":"b"},"geometry":{"type":"Point","coordinates":[1,1]}}"#;

/// A layer datasource that was replaced with [`PLACEHOLDER_GEOJSON`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "Replaced the data of layer(s) {} with placeholder GeoJSON after: {trigger}",
    .layers.join(", ")
)]
pub struct RecoveryWarning {
    /// Ids of the affected layers.
    pub layers: Vec<String>,
    /// Message of the introspection error that triggered the substitution.
    pub trigger: String,
}

/// Result of a successful normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub document: SourceDocument,
    /// Non-fatal diagnostics, e.g. placeholder substitutions.
    pub warnings: Vec<RecoveryWarning>,
}

/// The document being normalized, and whether placeholder data was already
/// substituted into it. A substituted document is never substituted again.
enum Pass {
    Initial(SourceDocument),
    Substituted(SourceDocument),
}

/// Normalizes raw documents with the help of a [`SchemaCatalog`].
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    catalog: &'a dyn SchemaCatalog,
}

impl<'a> Normalizer<'a> {
    #[must_use]
    pub fn new(catalog: &'a dyn SchemaCatalog) -> Self {
        Self { catalog }
    }

    /// Normalize a raw document.
    ///
    /// Normalizing an already normalized document (converted back with
    /// [`RawSourceDocument::from`]) yields an equal document.
    pub async fn normalize(&self, raw: RawSourceDocument) -> NormalizeResult<Normalized> {
        for key in raw.unrecognized_keys() {
            warn!("Ignoring unrecognized document key '{key}'");
        }
        let mut warnings = Vec::new();
        let mut pass = Pass::Initial(defaults::fill_document(raw, now_millis()));

        loop {
            let (mut doc, substituted) = match pass {
                Pass::Initial(doc) => (doc, false),
                Pass::Substituted(doc) => (doc, true),
            };

            for layer in &mut doc.layers {
                self.filter_datasource(layer);
            }
            doc.format = VECTOR_TILE_FORMAT.to_string();

            let results = self.describe_layers(&doc).await;
            let mut manifest = Vec::with_capacity(results.len());
            let mut failed = Vec::new();
            let mut trigger = None;
            for (idx, (layer, result)) in doc.layers.iter().zip(results).enumerate() {
                match result {
                    Ok(fields) => manifest.push(manifest_entry(layer, fields)),
                    Err(e) if e.is_recoverable() => {
                        failed.push(idx);
                        trigger.get_or_insert(e);
                    }
                    Err(source) => {
                        return Err(NormalizationError::Introspection {
                            layer: layer.id.clone(),
                            source,
                        });
                    }
                }
            }

            let Some(trigger) = trigger else {
                doc.vector_layers = manifest;
                return Ok(Normalized {
                    document: doc,
                    warnings,
                });
            };

            let layers = failed.iter().map(|&idx| doc.layers[idx].id.clone()).collect();
            if substituted {
                return Err(NormalizationError::RecoveryExhausted {
                    layers,
                    source: trigger,
                });
            }

            let warning = RecoveryWarning {
                layers,
                trigger: trigger.to_string(),
            };
            warn!("{warning}");
            warnings.push(warning);
            for idx in failed {
                doc.layers[idx].datasource = placeholder_datasource();
            }
            pass = Pass::Substituted(doc);
        }
    }

    /// Keep only the datasource parameters valid for its type, plus the type
    /// tag itself, and inject a default extent where one is needed.
    fn filter_datasource(&self, layer: &mut Layer) {
        let source_type = layer.datasource_type().map(ToString::to_string);
        let valid = source_type
            .as_deref()
            .map(|t| self.catalog.valid_keys(t))
            .unwrap_or_default();

        let mut dropped = Vec::new();
        layer.datasource.retain(|key, _| {
            let keep = key == DATASOURCE_TYPE || valid.contains(key);
            if !keep {
                dropped.push(key.clone());
            }
            keep
        });
        if !dropped.is_empty() {
            warn!(
                "Ignoring datasource parameter(s) {} of layer '{}': not valid for type {}",
                dropped.join(", "),
                layer.id,
                source_type.as_deref().unwrap_or("<none>")
            );
        }

        if source_type.as_deref() == Some(EXTENT_SOURCE_TYPE)
            && layer.datasource.get("extent").is_none_or(is_empty_value)
            && let Some(entry) = srs::find_by_srs(&layer.srs)
        {
            debug!("Using the {} extent for layer '{}'", entry.id, layer.id);
            layer
                .datasource
                .insert("extent".to_string(), Value::from(entry.extent.to_vec()));
        }
    }

    /// Introspect all layers concurrently. Results are in layer order.
    async fn describe_layers(&self, doc: &SourceDocument) -> Vec<IntrospectionResult<FieldTypes>> {
        let base: Option<PathBuf> = doc.id.as_deref().and_then(location::base_dir);
        join_all(doc.layers.iter().map(|layer| {
            let base = if has_relative_file(&layer.datasource) {
                base.as_deref()
            } else {
                None
            };
            self.catalog.describe_fields(&layer.datasource, base)
        }))
        .await
    }
}

fn has_relative_file(datasource: &Datasource) -> bool {
    datasource
        .get("file")
        .and_then(Value::as_str)
        .is_some_and(|f| !location::is_absolute(f))
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}

fn manifest_entry(layer: &Layer, inferred: FieldTypes) -> VectorLayer {
    let fields = inferred
        .into_iter()
        .map(|(name, kind)| {
            let kind = layer.fields.get(&name).cloned().unwrap_or(kind);
            (name, kind)
        })
        .collect();
    let mut entry = VectorLayer::new(layer.id.clone(), fields);
    entry.description.clone_from(&layer.description);
    entry.minzoom = Some(layer.properties.minzoom);
    entry.maxzoom = Some(layer.properties.maxzoom);
    entry
}

fn placeholder_datasource() -> Datasource {
    Datasource::from([
        (DATASOURCE_TYPE.to_string(), Value::from("geojson")),
        ("inline".to_string(), Value::from(PLACEHOLDER_GEOJSON)),
    ])
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::catalog::BuiltinCatalog;

    /// Catalog with canned answers, recording the base path of every call.
    #[derive(Debug, Default)]
    struct FakeCatalog {
        placeholder_fails: bool,
        bases: Mutex<Vec<Option<PathBuf>>>,
    }

    #[async_trait]
    impl SchemaCatalog for FakeCatalog {
        fn valid_keys(&self, source_type: &str) -> BTreeSet<String> {
            BuiltinCatalog.valid_keys(source_type)
        }

        async fn describe_fields(
            &self,
            datasource: &Datasource,
            base: Option<&Path>,
        ) -> IntrospectionResult<FieldTypes> {
            self.bases.lock().unwrap().push(base.map(Path::to_path_buf));
            let inline = datasource.get("inline").and_then(Value::as_str);
            match datasource.get("type").and_then(Value::as_str) {
                Some("postgis") => Ok(FieldTypes::from([
                    ("gid".to_string(), "Number".to_string()),
                    ("name".to_string(), "String".to_string()),
                ])),
                Some("geojson") if inline == Some(PLACEHOLDER_GEOJSON) && self.placeholder_fails => {
                    Err(IntrospectionError::InvalidInlineGeoJson("still broken".to_string()))
                }
                Some("geojson") if inline.is_some_and(|s| s.trim().is_empty()) => {
                    Err(IntrospectionError::InvalidInlineGeoJson("payload is empty".to_string()))
                }
                Some("geojson") => {
                    // give the other layers a chance to finish first
                    for _ in 0..3 {
                        tokio::task::yield_now().await;
                    }
                    Ok(FieldTypes::from([("a".to_string(), "String".to_string())]))
                }
                Some(other) => Err(IntrospectionError::UnsupportedType(other.to_string())),
                None => Err(IntrospectionError::MissingType),
            }
        }
    }

    fn parse(yaml: &str) -> RawSourceDocument {
        serde_yaml::from_str(yaml).unwrap()
    }

    async fn normalize(catalog: &FakeCatalog, yaml: &str) -> NormalizeResult<Normalized> {
        Normalizer::new(catalog).normalize(parse(yaml)).await
    }

    const TWO_LAYERS: &str = indoc! {r#"
        id: tmsource:///srv/project
        name: Two layers
        Layer:
          - id: places
            srs: WGS84
            Datasource:
              type: postgis
              table: places
              dbname: gis
              bogus: 1
          - id: points
            description: Inline points
            fields:
              a: Text
            Datasource:
              type: geojson
              inline: '{"type":"Feature","properties":{"a":"b"},"geometry":{"type":"Point","coordinates":[1,1]}}'
            properties:
              minzoom: 4
    "#};

    #[tokio::test]
    async fn defaults_are_applied() {
        let catalog = FakeCatalog::default();
        let doc = normalize(&catalog, "Layer: [{}]").await;
        let err = doc.unwrap_err();
        assert!(matches!(
            err,
            NormalizationError::Introspection { ref layer, source: IntrospectionError::MissingType } if layer.is_empty()
        ));

        let doc = normalize(&catalog, "{}").await.unwrap().document;
        assert_eq!(doc.name, "");
        assert_eq!((doc.minzoom, doc.maxzoom), (0, 6));
        assert_eq!(doc.center.zoom, 3);
        assert!(doc.prefs.save_center);
        assert!(!doc.prefs.inspector);
        assert!(doc.prefs.disabled.is_empty());
        assert!(doc.mtime > 0);
        assert_eq!(doc.format, "pbf");
        assert!(doc.layers.is_empty());
        assert!(doc.vector_layers.is_empty());
    }

    #[tokio::test]
    async fn falsy_values_are_kept() {
        let catalog = FakeCatalog::default();
        let doc = normalize(
            &catalog,
            indoc! {"
                minzoom: 0
                maxzoom: 0
                mtime: 0
                _prefs:
                  saveCenter: false
                  inspector: false
            "},
        )
        .await
        .unwrap()
        .document;
        assert_eq!((doc.minzoom, doc.maxzoom, doc.mtime), (0, 0, 0));
        assert!(!doc.prefs.save_center);
        assert!(!doc.prefs.inspector);
    }

    #[tokio::test]
    async fn layers_are_filtered_and_described() {
        let catalog = FakeCatalog::default();
        let Normalized { document, warnings } = normalize(&catalog, TWO_LAYERS).await.unwrap();
        assert!(warnings.is_empty());

        let places = &document.layers[0];
        assert_eq!(
            places.datasource,
            Datasource::from([
                ("type".to_string(), json!("postgis")),
                ("table".to_string(), json!("places")),
                ("dbname".to_string(), json!("gis")),
                ("extent".to_string(), json!([-180.0, -90.0, 180.0, 90.0])),
            ])
        );
        assert_eq!(places.properties.maxzoom, 22);

        let ids: Vec<&str> = document.vector_layers.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["places", "points"]);

        let places = &document.vector_layers[0];
        assert_eq!(places.description, None);
        assert_eq!((places.minzoom, places.maxzoom), (Some(0), Some(22)));
        assert_eq!(places.fields.get("gid").map(String::as_str), Some("Number"));

        let points = &document.vector_layers[1];
        assert_eq!(points.description.as_deref(), Some("Inline points"));
        assert_eq!(points.minzoom, Some(4));
        assert_eq!(points.fields.get("a").map(String::as_str), Some("Text"));
    }

    #[tokio::test]
    async fn normalization_is_idempotent() {
        let catalog = FakeCatalog::default();
        let first = normalize(&catalog, TWO_LAYERS).await.unwrap().document;
        let second = Normalizer::new(&catalog)
            .normalize(first.clone().into())
            .await
            .unwrap()
            .document;
        assert_eq!(first, second);
    }

    #[test]
    fn datasource_filtering() {
        let catalog = FakeCatalog::default();
        let normalizer = Normalizer::new(&catalog);

        let mut layer = Layer {
            srs: "900913".to_string(),
            datasource: Datasource::from([
                ("type".to_string(), json!("postgis")),
                ("table".to_string(), json!("roads")),
                ("extent".to_string(), json!("")),
                ("file".to_string(), json!("nope.shp")),
            ]),
            ..Default::default()
        };
        normalizer.filter_datasource(&mut layer);
        assert_eq!(layer.datasource.len(), 3);
        assert!(!layer.datasource.contains_key("file"));
        assert_eq!(
            layer.datasource["extent"],
            json!([-20_037_508.34, -20_037_508.34, 20_037_508.34, 20_037_508.34])
        );

        let mut layer = Layer {
            srs: "WGS84".to_string(),
            datasource: Datasource::from([
                ("type".to_string(), json!("postgis")),
                ("extent".to_string(), json!("0,0,1,1")),
            ]),
            ..Default::default()
        };
        normalizer.filter_datasource(&mut layer);
        assert_eq!(layer.datasource["extent"], json!("0,0,1,1"));

        let mut layer = Layer {
            srs: "+proj=custom".to_string(),
            datasource: Datasource::from([("type".to_string(), json!("postgis"))]),
            ..Default::default()
        };
        normalizer.filter_datasource(&mut layer);
        assert!(!layer.datasource.contains_key("extent"));

        let mut layer = Layer {
            datasource: Datasource::from([
                ("type".to_string(), json!("mystery")),
                ("file".to_string(), json!("x")),
            ]),
            ..Default::default()
        };
        normalizer.filter_datasource(&mut layer);
        assert_eq!(
            layer.datasource,
            Datasource::from([("type".to_string(), json!("mystery"))])
        );
    }

    #[tokio::test]
    async fn relative_files_resolve_against_document() {
        let catalog = FakeCatalog::default();
        normalize(
            &catalog,
            indoc! {"
                id: tmsource:///srv/my%20project
                Layer:
                  - Datasource: {type: geojson, file: data/a.geojson}
                  - Datasource: {type: geojson, file: /abs/b.geojson}
            "},
        )
        .await
        .unwrap();
        assert_eq!(
            *catalog.bases.lock().unwrap(),
            vec![Some(PathBuf::from("/srv/my project")), None]
        );
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn dropped_layer_properties_are_reported() {
        let catalog = FakeCatalog::default();
        let yaml = indoc! {"
            Layer:
              - id: roads
                group-by: class
                status: off
                Datasource: {type: postgis, table: roads}
        "};
        let doc = normalize(&catalog, yaml).await.unwrap().document;
        assert_eq!(doc.layers[0].id, "roads");
        assert!(logs_contain("Ignoring unrecognized document key 'Layer[0].group-by'"));
        assert!(logs_contain("Ignoring unrecognized document key 'Layer[0].status'"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn bad_inline_geojson_is_replaced_once() {
        let catalog = FakeCatalog::default();
        let yaml = indoc! {"
            Layer:
              - id: empty
                Datasource: {type: geojson, inline: '', encoding: utf-8}
              - id: roads
                Datasource: {type: postgis, table: roads}
        "};
        let Normalized { document, warnings } = normalize(&catalog, yaml).await.unwrap();

        assert_eq!(document.layers[0].datasource, placeholder_datasource());
        assert_eq!(document.layers[1].datasource["table"], json!("roads"));
        assert_eq!(document.vector_layers.len(), 2);
        assert_eq!(
            warnings,
            vec![RecoveryWarning {
                layers: vec!["empty".to_string()],
                trigger: "Failed to parse inline GeoJSON: payload is empty".to_string(),
            }]
        );
        assert!(logs_contain("placeholder GeoJSON"));
        // every layer is described twice: before and after the substitution
        assert_eq!(catalog.bases.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn failing_placeholder_is_fatal() {
        let catalog = FakeCatalog {
            placeholder_fails: true,
            ..Default::default()
        };
        let yaml = format!(
            "Layer: [{{id: p, Datasource: {{type: geojson, inline: '{PLACEHOLDER_GEOJSON}'}}}}]"
        );
        let err = normalize(&catalog, &yaml).await.unwrap_err();
        assert!(
            matches!(err, NormalizationError::RecoveryExhausted { ref layers, .. } if layers == &["p"])
        );

        let err = normalize(&catalog, "Layer: [{id: e, Datasource: {type: geojson, inline: ''}}]")
            .await
            .unwrap_err();
        assert!(matches!(err, NormalizationError::RecoveryExhausted { .. }));
        assert!(err.to_string().contains("still broken"));
    }

    #[tokio::test]
    async fn other_failures_are_fatal() {
        let catalog = FakeCatalog::default();
        let yaml = indoc! {"
            Layer:
              - id: bad
                Datasource: {type: geojson, inline: ''}
              - id: shapes
                Datasource: {type: shape, file: a.shp}
        "};
        let err = normalize(&catalog, yaml).await.unwrap_err();
        match err {
            NormalizationError::Introspection { layer, source } => {
                assert_eq!(layer, "shapes");
                assert!(matches!(source, IntrospectionError::UnsupportedType(t) if t == "shape"));
            }
            other => panic!("unexpected error {other}"),
        }
    }
}
