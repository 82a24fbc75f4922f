//! Reduces a full OpenAPI document to the external endpoints the SDK is
//! generated from.

use indexmap::IndexSet;
use serde_json::{json, Map, Value};
use tracing::debug;

const EXTERNAL_MARKER: &str = "/external/";
const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

#[derive(Debug, Clone)]
pub struct FilteredSpec {
    pub document: Value,
    /// Kept path keys, in document order.
    pub endpoints: Vec<String>,
    /// Referenced schema names, in discovery order.
    pub schemas: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeReport {
    pub original_bytes: usize,
    pub filtered_bytes: usize,
}

impl SizeReport {
    pub fn reduction_percent(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        (1.0 - self.filtered_bytes as f64 / self.original_bytes as f64) * 100.0
    }
}

pub fn filter_external_api(openapi: &Value, server_url: &str) -> FilteredSpec {
    let external_paths: Map<String, Value> = openapi
        .get("paths")
        .and_then(Value::as_object)
        .map(|paths| {
            paths
                .iter()
                .filter(|(key, _)| key.contains(EXTERNAL_MARKER))
                .map(|(key, item)| (key.clone(), item.clone()))
                .collect()
        })
        .unwrap_or_default();

    let all_schemas = openapi
        .pointer("/components/schemas")
        .and_then(Value::as_object);

    let mut used = IndexSet::new();
    for item in external_paths.values() {
        collect_schema_refs(item, &mut used);
    }

    // Schemas reference other schemas; walk until nothing new turns up.
    let mut scanned = 0;
    while scanned < used.len() {
        let name = used[scanned].clone();
        scanned += 1;
        if let Some(schema) = all_schemas.and_then(|s| s.get(&name)) {
            collect_schema_refs(schema, &mut used);
        }
    }
    debug!(endpoints = external_paths.len(), schemas = used.len(), "collected external API surface");

    let mut schemas = Map::new();
    if let Some(all) = all_schemas {
        for name in &used {
            if let Some(schema) = all.get(name) {
                schemas.insert(name.clone(), schema.clone());
            }
        }
    }

    let mut info = openapi
        .get("info")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let title = info
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    info.insert("title".to_string(), json!(format!("{title} - External API")));
    info.insert("description".to_string(), json!("External API endpoints only"));

    let security_schemes = openapi
        .pointer("/components/securitySchemes")
        .cloned()
        .unwrap_or_else(|| json!({}));

    let endpoints = external_paths.keys().cloned().collect();

    let document = json!({
        "openapi": openapi.get("openapi").cloned().unwrap_or(Value::Null),
        "info": info,
        "servers": [{
            "url": server_url,
            "description": "Production server",
        }],
        "paths": external_paths,
        "components": {
            "schemas": schemas,
            "securitySchemes": security_schemes,
        },
    });

    FilteredSpec {
        document,
        endpoints,
        schemas: used.into_iter().collect(),
    }
}

/// Records every `$ref` under `node`, with the schema prefix stripped.
fn collect_schema_refs(node: &Value, used: &mut IndexSet<String>) {
    match node {
        Value::Object(map) => {
            if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
                let name = reference.strip_prefix(SCHEMA_REF_PREFIX).unwrap_or(reference);
                used.insert(name.to_string());
            }
            for value in map.values() {
                collect_schema_refs(value, used);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_schema_refs(item, used);
            }
        }
        _ => {}
    }
}

pub fn size_report(original: &Value, filtered: &Value) -> Result<SizeReport, serde_json::Error> {
    Ok(SizeReport {
        original_bytes: serde_json::to_string(original)?.len(),
        filtered_bytes: serde_json::to_string(filtered)?.len(),
    })
}
