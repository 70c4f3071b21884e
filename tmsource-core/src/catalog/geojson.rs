//! Field introspection of `geojson` datasources, inline or file based.

use std::path::Path;

use geojson::{Feature, GeoJson};
use serde_json::Value;

use super::{FieldTypes, resolve_file};
use crate::catalog::{IntrospectionError, IntrospectionResult};
use crate::document::Datasource;

/// Field type of numeric properties.
pub const NUMBER: &str = "Number";
/// Field type of string properties, and of anything that is stringified.
pub const STRING: &str = "String";
/// Field type of boolean properties.
pub const BOOLEAN: &str = "Boolean";

/// Open a GeoJSON datasource and report the type of every feature property.
pub async fn describe(datasource: &Datasource, base: Option<&Path>) -> IntrospectionResult<FieldTypes> {
    if let Some(inline) = datasource.get("inline") {
        let text = match inline {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return parse_inline(&text).map(|geojson| field_types(&geojson));
    }

    let path = resolve_file(datasource, base)
        .ok_or_else(|| IntrospectionError::MissingParameter("geojson".to_string(), "file"))?;
    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| IntrospectionError::IoError(e, path.clone()))?;
    let geojson = text
        .parse::<GeoJson>()
        .map_err(|e| IntrospectionError::InvalidGeoJsonFile(Box::new(e), path))?;
    Ok(field_types(&geojson))
}

/// Parse inline GeoJSON. Empty payloads and empty feature collections are
/// rejected just like malformed ones.
fn parse_inline(text: &str) -> IntrospectionResult<GeoJson> {
    if text.trim().is_empty() {
        return Err(IntrospectionError::InvalidInlineGeoJson(
            "payload is empty".to_string(),
        ));
    }
    let geojson = text
        .parse::<GeoJson>()
        .map_err(|e| IntrospectionError::InvalidInlineGeoJson(e.to_string()))?;
    if let GeoJson::FeatureCollection(fc) = &geojson
        && fc.features.is_empty()
    {
        return Err(IntrospectionError::InvalidInlineGeoJson(
            "feature collection has no features".to_string(),
        ));
    }
    Ok(geojson)
}

fn field_types(geojson: &GeoJson) -> FieldTypes {
    let mut fields = FieldTypes::new();
    match geojson {
        GeoJson::Geometry(_) => {}
        GeoJson::Feature(feature) => add_properties(&mut fields, feature),
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                add_properties(&mut fields, feature);
            }
        }
    }
    fields
}

fn add_properties(fields: &mut FieldTypes, feature: &Feature) {
    let Some(properties) = &feature.properties else {
        return;
    };
    for (key, value) in properties {
        let kind = match value {
            // a null says nothing about the type, let another feature decide
            Value::Null => {
                fields.entry(key.clone()).or_insert_with(|| STRING.to_string());
                continue;
            }
            Value::Bool(_) => BOOLEAN,
            Value::Number(_) => NUMBER,
            Value::String(_) | Value::Array(_) | Value::Object(_) => STRING,
        };
        fields.insert(key.clone(), kind.to_string());
    }
}
