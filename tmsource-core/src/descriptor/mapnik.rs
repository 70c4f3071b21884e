//! A [`StyleRenderer`] producing Mapnik XML for vector tile sources.

use std::collections::HashSet;
use std::fmt::Write as _;

use serde_json::Value;

use super::{DescriptorOptions, RenderFailure, RenderIssue, StyleRenderer};
use crate::document::{DATASOURCE_TYPE, Layer};

/// Scale denominators used for zoom level filters, indexed by zoom.
const ZOOM_SCALES: [u64; 24] = [
    1_000_000_000,
    500_000_000,
    200_000_000,
    100_000_000,
    50_000_000,
    25_000_000,
    12_500_000,
    6_500_000,
    3_000_000,
    1_500_000,
    750_000,
    400_000,
    200_000,
    100_000,
    50_000,
    25_000,
    12_500,
    5_000,
    2_500,
    1_500,
    750,
    500,
    250,
    100,
];

/// Renders descriptor options into a Mapnik `<Map>` document.
///
/// The options are validated first, and every problem found is reported.
#[derive(Debug, Default, Clone, Copy)]
pub struct MapnikXmlRenderer;

impl StyleRenderer for MapnikXmlRenderer {
    fn render(&self, options: &DescriptorOptions) -> Result<String, RenderFailure> {
        let issues = validate(options);
        if !issues.is_empty() {
            return Err(RenderFailure::Invalid(issues));
        }

        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        xml.push_str("<!DOCTYPE Map[]>\n");
        let _ = writeln!(xml, "<Map srs=\"{}\">\n", escape_attr(&options.srs));

        xml.push_str("<Parameters>\n");
        let center = options.center;
        let mut params = vec![
            ("attribution", cdata(&options.attribution)),
            (
                "center",
                format!("{},{},{}", center.longitude, center.latitude, center.zoom),
            ),
            ("description", cdata(&options.description)),
            ("format", escape_text(&options.format)),
            ("json", cdata(&options.json)),
            ("maxzoom", options.maxzoom.to_string()),
            ("minzoom", options.minzoom.to_string()),
            ("name", cdata(&options.name)),
        ];
        if let Some(bounds) = options.bounds {
            params.push(("bounds", join_numbers(&bounds)));
        }
        params.sort_by_key(|(name, _)| *name);
        for (name, value) in params {
            let _ = writeln!(xml, "  <Parameter name=\"{name}\">{value}</Parameter>");
        }
        xml.push_str("</Parameters>\n");

        for layer in &options.layers {
            write_layer(&mut xml, layer);
        }
        xml.push_str("\n</Map>\n");
        Ok(xml)
    }
}

fn validate(options: &DescriptorOptions) -> Vec<RenderIssue> {
    let mut issues = Vec::new();
    if options.minzoom > options.maxzoom {
        issues.push(RenderIssue::new(format!(
            "minzoom {} is greater than maxzoom {}",
            options.minzoom, options.maxzoom
        )));
    }

    let mut seen = HashSet::new();
    for layer in &options.layers {
        let props = &layer.properties;
        if props.minzoom > props.maxzoom {
            issues.push(RenderIssue::for_layer(
                &layer.id,
                format!(
                    "minzoom {} is greater than maxzoom {}",
                    props.minzoom, props.maxzoom
                ),
            ));
        }
        if layer.datasource_type().is_none() {
            issues.push(RenderIssue::for_layer(&layer.id, "datasource has no type"));
        }
        if !layer.id.is_empty() && !seen.insert(layer.id.as_str()) {
            issues.push(RenderIssue::for_layer(&layer.id, "duplicate layer id"));
        }
    }
    issues
}

fn write_layer(xml: &mut String, layer: &Layer) {
    let props = &layer.properties;
    let _ = write!(
        xml,
        "\n<Layer name=\"{}\"\n  buffer-size=\"{}\"",
        escape_attr(&layer.id),
        props.buffer_size
    );
    if props.minzoom > 0 {
        let _ = write!(
            xml,
            "\n  maximum-scale-denominator=\"{}\"",
            ZOOM_SCALES[usize::from(props.minzoom).min(ZOOM_SCALES.len() - 1)]
        );
    }
    if let Some(scale) = ZOOM_SCALES.get(usize::from(props.maxzoom) + 1) {
        let _ = write!(xml, "\n  minimum-scale-denominator=\"{scale}\"");
    }
    let _ = writeln!(xml, "\n  srs=\"{}\">", escape_attr(&layer.srs));

    xml.push_str("    <Datasource>\n");
    // type first, the remaining parameters in key order
    let params = layer
        .datasource
        .get_key_value(DATASOURCE_TYPE)
        .into_iter()
        .chain(layer.datasource.iter().filter(|(k, _)| *k != DATASOURCE_TYPE));
    for (name, value) in params {
        let _ = writeln!(
            xml,
            "       <Parameter name=\"{}\">{}</Parameter>",
            escape_attr(name),
            cdata(&param_value(value))
        );
    }
    xml.push_str("    </Datasource>\n  </Layer>\n");
}

fn param_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(param_value)
            .collect::<Vec<_>>()
            .join(","),
        Value::Bool(_) | Value::Number(_) | Value::Object(_) => value.to_string(),
    }
}

fn join_numbers(values: &[f64]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}
