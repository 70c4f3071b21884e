//! Datasource schema catalog.
//!
//! A [`SchemaCatalog`] knows which parameters each datasource type accepts and
//! can open a datasource to report its fields. [`BuiltinCatalog`] implements
//! both on top of the Mapnik datasource reference:
//!   - [x] `geojson` (inline and file)
//!   - [x] `postgis` (with the `postgres` feature)
//!   - [ ] shape, csv, ogr, gdal, sqlite

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::document::Datasource;
use crate::location;

mod error;
pub use error::{IntrospectionError, IntrospectionResult};

pub mod geojson;
#[cfg(feature = "postgres")]
pub mod postgis;
pub mod reference;

/// Field name to field type, e.g. `name` → `String`.
pub type FieldTypes = BTreeMap<String, String>;

/// Read-only service describing datasources.
#[async_trait]
pub trait SchemaCatalog: Send + Sync + Debug {
    /// Parameters valid for the given datasource type. Empty for unknown types.
    fn valid_keys(&self, source_type: &str) -> BTreeSet<String>;

    /// Open the datasource and enumerate its fields with their inferred types.
    ///
    /// `base` is the directory a relative `file` parameter resolves against.
    /// Any connection opened here is closed before returning.
    async fn describe_fields(
        &self,
        datasource: &Datasource,
        base: Option<&Path>,
    ) -> IntrospectionResult<FieldTypes>;
}

/// Catalog backed by the Mapnik datasource reference and this crate's own readers.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinCatalog;

#[async_trait]
impl SchemaCatalog for BuiltinCatalog {
    fn valid_keys(&self, source_type: &str) -> BTreeSet<String> {
        reference::datasource_keys(source_type)
            .unwrap_or_default()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    async fn describe_fields(
        &self,
        datasource: &Datasource,
        base: Option<&Path>,
    ) -> IntrospectionResult<FieldTypes> {
        let source_type = datasource
            .get(crate::document::DATASOURCE_TYPE)
            .and_then(serde_json::Value::as_str)
            .ok_or(IntrospectionError::MissingType)?;
        match source_type {
            "geojson" => geojson::describe(datasource, base).await,
            #[cfg(feature = "postgres")]
            "postgis" => postgis::describe(datasource).await,
            other => Err(IntrospectionError::UnsupportedType(other.to_string())),
        }
    }
}

/// Path of the `file` parameter, joined with `base` (or the datasource's own
/// `base` parameter) when relative.
#[must_use]
pub fn resolve_file(datasource: &Datasource, base: Option<&Path>) -> Option<PathBuf> {
    let file = datasource.get("file")?.as_str()?;
    if location::is_absolute(file) {
        return Some(PathBuf::from(file));
    }
    let own_base = datasource
        .get("base")
        .and_then(serde_json::Value::as_str)
        .map(Path::new);
    Some(match base.or(own_base) {
        Some(base) => base.join(file),
        None => PathBuf::from(file),
    })
}
