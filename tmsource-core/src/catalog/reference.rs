//! Parameters accepted by each Mapnik datasource type.
//!
//! Mirrors the `datasources` section of the Mapnik style reference. The
//! `type` tag itself is not listed, normalization always keeps it.

const SHAPE: &[&str] = &["base", "encoding", "file", "row_limit"];

const GDAL: &[&str] = &[
    "band",
    "base",
    "file",
    "max_image_area",
    "nodata",
    "nodata_tolerance",
    "shared",
];

const OGR: &[&str] = &[
    "base",
    "driver",
    "encoding",
    "extent",
    "file",
    "layer",
    "layer_by_index",
    "layer_by_sql",
    "string",
];

const POSTGIS: &[&str] = &[
    "asynchronous_request",
    "autodetect_key_field",
    "connect_timeout",
    "cursor_size",
    "dbname",
    "encoding",
    "estimate_extent",
    "extent",
    "extent_from_subquery",
    "geometry_field",
    "geometry_table",
    "host",
    "initial_size",
    "key_field",
    "key_field_as_attribute",
    "max_async_connection",
    "max_size",
    "password",
    "persist_connection",
    "port",
    "row_limit",
    "simplify_geometries",
    "srid",
    "table",
    "twkb_encoding",
    "user",
];

const PGRASTER: &[&str] = &[
    "autodetect_key_field",
    "band",
    "clip_rasters",
    "connect_timeout",
    "cursor_size",
    "dbname",
    "estimate_extent",
    "extent",
    "extent_from_subquery",
    "host",
    "initial_size",
    "key_field",
    "max_size",
    "password",
    "persist_connection",
    "port",
    "prescale_rasters",
    "raster_field",
    "raster_table",
    "row_limit",
    "srid",
    "table",
    "use_overviews",
    "user",
];

const SQLITE: &[&str] = &[
    "attachdb",
    "auto_index",
    "base",
    "encoding",
    "extent",
    "file",
    "geometry_field",
    "initdb",
    "key_field",
    "row_limit",
    "row_offset",
    "table",
    "use_spatial_index",
    "wkb_format",
];

const RASTER: &[&str] = &[
    "base",
    "extent",
    "file",
    "format",
    "hix",
    "hiy",
    "lox",
    "loy",
    "multi",
    "tile_size",
    "tile_stride",
    "x_width",
    "y_width",
];

const CSV: &[&str] = &[
    "base",
    "encoding",
    "escape",
    "extent",
    "file",
    "filesize_max",
    "headers",
    "inline",
    "quote",
    "row_limit",
    "separator",
    "strict",
];

const GEOJSON: &[&str] = &[
    "base",
    "cache_features",
    "encoding",
    "file",
    "inline",
    "num_features_to_query",
];

const TOPOJSON: &[&str] = &["base", "encoding", "file", "inline"];

/// Parameters accepted by the given datasource type, or `None` for unknown types.
#[must_use]
pub fn datasource_keys(source_type: &str) -> Option<&'static [&'static str]> {
    Some(match source_type {
        "shape" => SHAPE,
        "gdal" => GDAL,
        "ogr" => OGR,
        "postgis" => POSTGIS,
        "pgraster" => PGRASTER,
        "sqlite" => SQLITE,
        "raster" => RASTER,
        "csv" => CSV,
        "geojson" => GEOJSON,
        "topojson" => TOPOJSON,
        _ => return None,
    })
}
