//! Field introspection of `postgis` datasources.
//!
//! The table (or sub-query) is prepared as `SELECT * FROM <table> LIMIT 0`,
//! which reports column names and types without reading any rows.

use std::time::Duration;

use deadpool_postgres::tokio_postgres::types::Type;
use deadpool_postgres::tokio_postgres::{Column, Config, NoTls};
use serde_json::Value;
use tracing::debug;

use super::FieldTypes;
use super::geojson::{BOOLEAN, NUMBER, STRING};
use crate::catalog::{IntrospectionError, IntrospectionResult};
use crate::document::Datasource;

/// Mapnik query tokens and the values used while describing a table.
const TOKENS: [(&str, &str); 4] = [
    ("!bbox!", "ST_MakeEnvelope(0, 0, 0, 0)"),
    ("!scale_denominator!", "0"),
    ("!pixel_width!", "0"),
    ("!pixel_height!", "0"),
];

/// Directory holding the local server socket, used when no `host` is given.
#[cfg(unix)]
const DEFAULT_SOCKET_DIR: &str = "/var/run/postgresql";

/// Connect to the database described by `datasource` and report its column types.
///
/// The connection only lives for the duration of this call. Dropping the
/// returned future closes it as well.
pub async fn describe(datasource: &Datasource) -> IntrospectionResult<FieldTypes> {
    let table = param(datasource, "table")
        .ok_or_else(|| IntrospectionError::MissingParameter("postgis".to_string(), "table"))?;
    let sql = format!("SELECT * FROM {} LIMIT 0", replace_tokens(&table));
    let geometry_field = param(datasource, "geometry_field");

    let (client, connection) = connection_config(datasource)
        .connect(NoTls)
        .await
        .map_err(|e| IntrospectionError::PostgresError(e, "connecting to the database"))?;

    debug!("Describing PostGIS table with: {sql}");
    tokio::select! {
        res = connection => Err(match res {
            Err(e) => IntrospectionError::PostgresError(e, "waiting for the connection"),
            Ok(()) => IntrospectionError::ConnectionClosed(table),
        }),
        stmt = client.prepare(&sql) => {
            let stmt = stmt.map_err(|e| IntrospectionError::PostgresError(e, "describing the table"))?;
            Ok(column_types(stmt.columns(), geometry_field.as_deref()))
        }
    }
}

/// A string parameter. Numbers are accepted too, as YAML authors tend to
/// write ports and timeouts unquoted.
fn param(datasource: &Datasource, key: &str) -> Option<String> {
    match datasource.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn connection_config(datasource: &Datasource) -> Config {
    let mut cfg = Config::new();
    match param(datasource, "host") {
        Some(host) => {
            cfg.host(&host);
        }
        #[cfg(unix)]
        None => {
            cfg.host_path(DEFAULT_SOCKET_DIR);
        }
        #[cfg(not(unix))]
        None => {
            cfg.host("localhost");
        }
    }
    if let Some(port) = param(datasource, "port").and_then(|p| p.parse::<u16>().ok()) {
        cfg.port(port);
    }
    if let Some(user) = param(datasource, "user") {
        cfg.user(&user);
    }
    if let Some(password) = param(datasource, "password") {
        cfg.password(&password);
    }
    if let Some(dbname) = param(datasource, "dbname") {
        cfg.dbname(&dbname);
    }
    if let Some(timeout) = param(datasource, "connect_timeout").and_then(|t| t.parse::<u64>().ok()) {
        cfg.connect_timeout(Duration::from_secs(timeout));
    }
    cfg.application_name("tmsource");
    cfg
}

fn replace_tokens(table: &str) -> String {
    TOKENS
        .iter()
        .fold(table.to_string(), |sql, (token, value)| sql.replace(token, value))
}

fn column_types(columns: &[Column], geometry_field: Option<&str>) -> FieldTypes {
    let mut fields = FieldTypes::new();
    for column in columns {
        if Some(column.name()) == geometry_field {
            continue;
        }
        match field_type(column.type_()) {
            Some(kind) => {
                fields.insert(column.name().to_string(), kind.to_string());
            }
            None => debug!(
                "Skipping column {} of unsupported type {}",
                column.name(),
                column.type_()
            ),
        }
    }
    fields
}

fn field_type(ty: &Type) -> Option<&'static str> {
    match ty.name() {
        "int2" | "int4" | "int8" | "oid" | "float4" | "float8" | "numeric" => Some(NUMBER),
        "bool" => Some(BOOLEAN),
        "text" | "varchar" | "bpchar" | "char" | "name" | "uuid" | "json" | "jsonb" | "date"
        | "time" | "timestamp" | "timestamptz" => Some(STRING),
        _ => None,
    }
}
