use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use approx::assert_relative_eq;
use async_trait::async_trait;
use indoc::indoc;
use pretty_assertions::assert_eq;
use serde_json::json;
use tmsource::{
    FsLoader, RegisteredSources, SourceLocation, SourcePipeline, Stage, TileRegistrar as _,
    TmSourceError,
};
use tmsource_core::catalog::{BuiltinCatalog, FieldTypes, IntrospectionResult, SchemaCatalog};
use tmsource_core::descriptor::MapnikXmlRenderer;
use tmsource_core::document::Datasource;
use tmsource_core::normalize::NormalizationError;
use tmsource_core::srs;

/// Built-in catalog, except that PostGIS tables are described without a database.
#[derive(Debug)]
struct OfflineCatalog;

#[async_trait]
impl SchemaCatalog for OfflineCatalog {
    fn valid_keys(&self, source_type: &str) -> BTreeSet<String> {
        BuiltinCatalog.valid_keys(source_type)
    }

    async fn describe_fields(
        &self,
        datasource: &Datasource,
        base: Option<&Path>,
    ) -> IntrospectionResult<FieldTypes> {
        if datasource.get("type") == Some(&json!("postgis")) {
            return Ok(FieldTypes::from([
                ("kind".to_string(), "Number".to_string()),
                ("lanes".to_string(), "Number".to_string()),
                ("name".to_string(), "String".to_string()),
            ]));
        }
        BuiltinCatalog.describe_fields(datasource, base).await
    }
}

const PROJECT: &str = indoc! {r#"
    name: Roads and parks
    attribution: ${ATTRIBUTION}
    center: [-73.97, 40.7, 10]
    maxzoom: 14
    Layer:
      - id: roads
        srs: "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs"
        description: Road network
        fields:
          kind: String
        Datasource:
          type: postgis
          dbname: gis
          table: roads
          geometry_field: geom
          cache-features: true
        properties:
          minzoom: 4
          buffer-size: 8
      - id: places
        Datasource:
          type: geojson
          inline: "{ this is not geojson"
      - id: parks
        Datasource:
          type: geojson
          file: parks.geojson
"#};

fn project_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("data.yml"), PROJECT).unwrap();
    std::fs::copy(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/parks.geojson"),
        dir.path().join("parks.geojson"),
    )
    .unwrap();
    dir
}

fn env() -> HashMap<&'static str, &'static str> {
    HashMap::from([("ATTRIBUTION", "© OpenStreetMap contributors")])
}

#[tokio::test]
async fn project_from_disk() {
    let dir = project_dir();
    let location = SourceLocation::parse(&format!("tmsource://{}", dir.path().display())).unwrap();
    let mut pipeline = SourcePipeline::new(location, &FsLoader, &OfflineCatalog, &MapnikXmlRenderer);
    let ready = pipeline.run_with_env(&env()).await.unwrap();
    assert_eq!(pipeline.stage(), Stage::Ready);
    assert_eq!(ready.base(), dir.path());

    // only the broken inline layer was replaced
    assert_eq!(ready.warnings.len(), 1);
    assert_eq!(ready.warnings[0].layers, vec!["places".to_string()]);

    let doc = &ready.document;
    assert_eq!(doc.attribution, "© OpenStreetMap contributors");
    assert_eq!(doc.minzoom, 0);
    assert_eq!(doc.maxzoom, 14);
    assert_eq!(doc.format, "pbf");

    let roads = &doc.layers[0].datasource;
    assert!(!roads.contains_key("cache-features"));
    assert_eq!(roads["type"], json!("postgis"));
    let extent: Vec<f64> = roads["extent"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect();
    for (actual, expected) in extent.iter().zip(srs::lookup(srs::WGS84).unwrap().extent) {
        assert_relative_eq!(*actual, expected);
    }

    let manifest = &doc.vector_layers;
    assert_eq!(manifest.len(), 3);
    assert_eq!(manifest[0].id, "roads");
    assert_eq!(manifest[0].description.as_deref(), Some("Road network"));
    assert_eq!((manifest[0].minzoom, manifest[0].maxzoom), (Some(4), Some(22)));
    assert_eq!(
        manifest[0].fields,
        BTreeMap::from([
            ("kind".to_string(), "String".to_string()),
            ("lanes".to_string(), "Number".to_string()),
            ("name".to_string(), "String".to_string()),
        ])
    );
    assert_eq!(
        manifest[1].fields,
        BTreeMap::from([("a".to_string(), "String".to_string())])
    );
    assert_eq!(manifest[1].description, None);
    assert_eq!(
        manifest[2].fields,
        BTreeMap::from([
            ("area".to_string(), "Number".to_string()),
            ("name".to_string(), "String".to_string()),
            ("public".to_string(), "Boolean".to_string()),
        ])
    );

    let mercator = srs::lookup(srs::SPHERICAL_MERCATOR).unwrap().proj;
    let xml = &ready.xml;
    assert!(xml.contains(&format!("<Map srs=\"{mercator}\">")));
    assert!(xml.contains(
        r#"<Parameter name="attribution"><![CDATA[© OpenStreetMap contributors]]></Parameter>"#
    ));
    assert!(xml.contains(r#"<Parameter name="center">-73.97,40.7,10</Parameter>"#));
    assert!(xml.contains(r#"<Parameter name="format">pbf</Parameter>"#));
    assert!(xml.contains(r#""vector_layers":[{"#));
    assert!(xml.contains("maximum-scale-denominator=\"50000000\""));
    assert!(xml.contains(r#"<Parameter name="inline"><![CDATA[{"type":"Feature""#));
    assert!(xml.contains("srs=\"+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs\""));
    assert_eq!(xml.matches(&format!("srs=\"{mercator}\"")).count(), 3);

    let mut sources = RegisteredSources::default();
    let id = ready.id.clone();
    ready.clone().register(&mut sources);
    sources.register(ready);
    assert_eq!(sources.len(), 1);
    assert_eq!(sources.ids().collect::<Vec<_>>(), vec![id.as_str()]);
}

#[tokio::test]
async fn normalized_document_normalizes_again() {
    let dir = project_dir();
    let location = SourceLocation::parse(&dir.path().to_string_lossy()).unwrap();
    let first = SourcePipeline::new(location.clone(), &FsLoader, &OfflineCatalog, &MapnikXmlRenderer)
        .run_with_env(&env())
        .await
        .unwrap();

    let yaml = serde_yaml::to_string(&first.document).unwrap();
    let second = SourcePipeline::new(location, &FsLoader, &OfflineCatalog, &MapnikXmlRenderer)
        .with_yaml(yaml)
        .run()
        .await
        .unwrap();

    assert!(second.warnings.is_empty());
    assert_eq!(second.document, first.document);
    assert_eq!(second.xml, first.xml);
}

#[tokio::test]
async fn missing_project() {
    let dir = tempfile::tempdir().unwrap();
    let location = SourceLocation::parse_in("tmsource://nothing-here", dir.path()).unwrap();
    let mut pipeline = SourcePipeline::new(location, &FsLoader, &OfflineCatalog, &MapnikXmlRenderer);
    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, TmSourceError::Io(..)), "{err}");
    assert_eq!(pipeline.stage(), Stage::Failed);
}

#[tokio::test]
async fn broken_geojson_file_is_fatal() {
    let dir = project_dir();
    std::fs::write(dir.path().join("parks.geojson"), "{ nope").unwrap();
    let location = SourceLocation::parse(&dir.path().to_string_lossy()).unwrap();
    let err = SourcePipeline::new(location, &FsLoader, &OfflineCatalog, &MapnikXmlRenderer)
        .run()
        .await
        .unwrap_err();
    let TmSourceError::Normalization(NormalizationError::Introspection { layer, .. }) = &err else {
        panic!("unexpected error {err}");
    };
    assert_eq!(layer, "parks");
}

#[tokio::test]
async fn invalid_zoom_range_is_reported() {
    let location = SourceLocation::parse_in("/srv/invalid", Path::new("/")).unwrap();
    let err = SourcePipeline::new(location, &FsLoader, &OfflineCatalog, &MapnikXmlRenderer)
        .with_yaml(indoc! {"
            minzoom: 8
            maxzoom: 4
            Layer:
              - id: a
                Datasource: {type: geojson, inline: '{\"type\":\"Point\",\"coordinates\":[0,0]}'}
              - id: a
                Datasource: {type: geojson, inline: '{\"type\":\"Point\",\"coordinates\":[0,0]}'}
        "})
        .run()
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Descriptor failed validation with 2 error(s)"), "{message}");
    assert!(message.contains("minzoom 8 is greater than maxzoom 4"));
    assert!(message.contains("Layer 'a': duplicate layer id"));
}

#[tokio::test]
async fn small_zoom_range_with_default_center() {
    let location = SourceLocation::parse_in("/srv/world", Path::new("/")).unwrap();
    let ready = SourcePipeline::new(location, &FsLoader, &BuiltinCatalog, &MapnikXmlRenderer)
        .with_yaml(indoc! {"
            maxzoom: 2
            description: Costs $5 per tile
            Layer:
              - id: p
                Datasource:
                  type: geojson
                  inline: '{\"type\":\"Feature\",\"geometry\":{\"type\":\"Point\",\"coordinates\":[0,0]},\"properties\":{}}'
        "})
        .run()
        .await
        .unwrap();
    assert_eq!(ready.document.center.zoom, 3);
    assert_eq!(ready.document.description, "Costs $5 per tile");
    assert!(ready.xml.contains(r#"<Parameter name="center">0,0,3</Parameter>"#));
    assert!(ready.xml.contains(r#"<Parameter name="maxzoom">2</Parameter>"#));
}
