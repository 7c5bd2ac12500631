//! OpenAPI document for the search API, generated from the query field table.

use axum::Json;
use serde_json::{json, Map, Value};

use crate::query::{FieldKind, FieldSpec, FIELDS};

/// JSON schema of one field's value.
pub fn field_schema(field: &FieldSpec) -> Value {
    let mut schema = match field.kind {
        FieldKind::Text => json!({ "type": "string" }),
        FieldKind::List(Some(vocabulary)) => json!({
            "type": "array",
            "items": { "type": "string", "enum": vocabulary },
        }),
        FieldKind::List(None) => json!({ "type": "array", "items": { "type": "string" } }),
        FieldKind::Integer { min, max } => {
            let mut schema = json!({ "type": "integer", "minimum": min });
            if let Some(max) = max {
                schema["maximum"] = json!(max);
            }
            schema
        }
        FieldKind::Choice(choices) => json!({ "type": "string", "enum": choices }),
        FieldKind::Boolean => json!({ "type": "boolean" }),
        FieldKind::Locale => json!({
            "type": "string",
            "pattern": "^(all|auto|[A-Za-z]{2,3}(-([A-Za-z]{2}|[0-9]{3}))?)$",
        }),
    };

    if let Some(default) = field.default {
        schema["default"] = match field.kind {
            FieldKind::List(_) => json!(default.split(',').collect::<Vec<_>>()),
            FieldKind::Integer { .. } => default.parse::<i64>().map(Value::from).unwrap_or(json!(default)),
            FieldKind::Boolean => json!(default == "true"),
            _ => json!(default),
        };
    }
    schema
}

fn query_parameter(field: &FieldSpec) -> Value {
    let mut parameter = json!({
        "name": field.name,
        "in": "query",
        "required": field.required,
        "description": field.description,
        "schema": field_schema(field),
    });
    if matches!(field.kind, FieldKind::List(_)) {
        // Lists travel comma separated: `categories=it,news`.
        parameter["style"] = json!("form");
        parameter["explode"] = json!(false);
    }
    parameter
}

/// JSON schema of the tool-call arguments object.
pub fn arguments_schema() -> Value {
    let properties: Map<String, Value> = FIELDS
        .iter()
        .map(|field| {
            let mut schema = field_schema(field);
            schema["description"] = json!(field.description);
            (field.name.to_string(), schema)
        })
        .collect();
    let required: Vec<&str> = FIELDS.iter().filter(|f| f.required).map(|f| f.name).collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": {
                    "type": "object",
                    "properties": {
                        "success": { "type": "boolean", "const": false },
                        "errors": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "message": { "type": "string" },
                                    "extensions": { "type": "object" },
                                },
                            },
                        },
                    },
                },
            },
        },
    })
}

pub fn document() -> Value {
    let parameters: Vec<Value> = FIELDS.iter().map(query_parameter).collect();
    let search = json!({
        "operationId": "search",
        "summary": "Search through the sidecar pool",
        "parameters": parameters,
        "responses": {
            "200": { "description": "Search results in the requested format" },
            "400": error_response("Invalid query parameter"),
            "413": error_response("Request body too large"),
            "502": { "description": "Sidecar unavailable or failed" },
        },
    });

    json!({
        "openapi": "3.1.0",
        "info": {
            "title": "SearXNG Edge",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "paths": {
            "/search": { "get": search.clone(), "post": search },
            "/mcp": {
                "post": {
                    "operationId": "mcp",
                    "summary": "JSON-RPC 2.0 tool invocation (tool `search`)",
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": { "type": "object" } } },
                    },
                    "responses": { "200": { "description": "JSON-RPC response" } },
                },
            },
        },
    })
}

pub async fn openapi_handler() -> Json<Value> {
    Json(document())
}
