//! Tool arguments → HTTP request plan.
//!
//! Mapping is synchronous and side-effect free: an invalid call is rejected here, before anything
//! touches the network.

use crate::catalog::{BodyMode, ParamLocation, ToolDefinition, ToolParameter, ToolSecurity};
use crate::error::{OpenApiToolsError, Result};
use crate::schema::ParamType;
use reqwest::Method;
use reqwest::header::{HeaderName, HeaderValue};
use restmcp_http_tools::encoding::encode_path_segment;
use rmcp::model::JsonObject;
use serde_json::{Map, Number, Value};

/// A fully resolved request, ready for [`crate::executor::CallExecutor::execute`].
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPlan {
    pub tool: String,
    pub method: Method,
    /// Path with placeholders substituted and percent-encoded.
    pub path: String,
    /// Query pairs in argument order; repeated keys are allowed.
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub security: ToolSecurity,
}

/// Validate `arguments` against `tool` and produce a [`RequestPlan`].
///
/// `null` values count as absent. Declared defaults fill in absent arguments before required
/// checks run.
///
/// # Errors
///
/// Returns [`OpenApiToolsError::InvalidArguments`] for unknown argument names, missing required
/// arguments, values that cannot be coerced to the declared type, and values outside an `enum`.
pub fn map_arguments(tool: &ToolDefinition, arguments: Option<&JsonObject>) -> Result<RequestPlan> {
    let empty = Map::new();
    let arguments = arguments.unwrap_or(&empty);

    let unknown: Vec<&str> = arguments
        .keys()
        .filter(|k| tool.parameter(k).is_none())
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(OpenApiToolsError::invalid_arguments(
            &tool.name,
            format!("unknown argument(s): {}", unknown.join(", ")),
        ));
    }

    let mut missing: Vec<&str> = Vec::new();
    let mut problems: Vec<String> = Vec::new();

    let mut path = tool.path_template.clone();
    let mut query: Vec<(String, String)> = Vec::new();
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut body_fields = Map::new();
    let mut whole_body: Option<Value> = None;

    for param in &tool.parameters {
        let supplied = arguments.get(&param.name).filter(|v| !v.is_null());
        let Some(raw) = supplied.or(param.default.as_ref()) else {
            if param.required {
                missing.push(&param.name);
            }
            continue;
        };

        let value = match coerce(&param.ty, raw) {
            Ok(v) => v,
            Err(msg) => {
                problems.push(format!("'{}': {msg}", param.name));
                continue;
            }
        };

        if !param.enumeration.is_empty() && !in_enumeration(&param.enumeration, &value) {
            problems.push(format!(
                "'{}': {} is not one of {}",
                param.name,
                value,
                Value::Array(param.enumeration.clone())
            ));
            continue;
        }

        match param.location {
            ParamLocation::Path => {
                let encoded = path_value(&value);
                path = path.replace(&format!("{{{}}}", param.wire_name), &encoded);
            }
            ParamLocation::Query => push_query_pairs(&mut query, &param.wire_name, &value),
            ParamLocation::Header => match header_value(param, &value) {
                Ok(v) => headers.push((param.wire_name.clone(), v)),
                Err(msg) => problems.push(msg),
            },
            ParamLocation::Body => match tool.body {
                BodyMode::Whole => whole_body = Some(value),
                BodyMode::Fields { .. } | BodyMode::None => {
                    body_fields.insert(param.wire_name.clone(), value);
                }
            },
        }
    }

    // Substituted values are percent-encoded, so any brace left is an unfilled placeholder.
    if missing.is_empty() && problems.is_empty() && path.contains('{') {
        problems.push(format!("path '{path}' has unfilled placeholders"));
    }

    if !missing.is_empty() {
        problems.insert(
            0,
            format!("missing required argument(s): {}", missing.join(", ")),
        );
    }
    if !problems.is_empty() {
        return Err(OpenApiToolsError::invalid_arguments(
            &tool.name,
            problems.join("; "),
        ));
    }

    let body = match tool.body {
        BodyMode::None => None,
        BodyMode::Fields { required: false } if body_fields.is_empty() => None,
        BodyMode::Fields { .. } => Some(Value::Object(body_fields)),
        BodyMode::Whole => whole_body,
    };

    Ok(RequestPlan {
        tool: tool.name.clone(),
        method: tool.method.clone(),
        path,
        query,
        headers,
        body,
        security: tool.security.clone(),
    })
}

/// Convert a JSON argument to the declared type, accepting the obvious string spellings of
/// numbers and booleans.
fn coerce(ty: &ParamType, value: &Value) -> std::result::Result<Value, String> {
    match (ty, value) {
        (ParamType::String, Value::String(_)) => Ok(value.clone()),
        (ParamType::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
        (ParamType::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),

        (ParamType::Integer, Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                Ok(value.clone())
            } else {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                    .map(|f| Value::Number(Number::from(f as i64)))
                    .ok_or_else(|| format!("expected integer, got {n}"))
            }
        }
        (ParamType::Integer, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(|i| Value::Number(i.into()))
            .map_err(|_| format!("expected integer, got \"{s}\"")),

        (ParamType::Number, Value::Number(_)) => Ok(value.clone()),
        (ParamType::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("expected number, got \"{s}\"")),

        (ParamType::Boolean, Value::Bool(_)) => Ok(value.clone()),
        (ParamType::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(format!("expected boolean, got \"{s}\"")),
        },

        (ParamType::Array(items), Value::Array(values)) => values
            .iter()
            .enumerate()
            .map(|(i, v)| coerce(items, v).map_err(|e| format!("item {i}: {e}")))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Value::Array),
        // A lone scalar is accepted as a one-element array.
        (ParamType::Array(items), scalar) if !scalar.is_object() => {
            coerce(items, scalar).map(|v| Value::Array(vec![v]))
        }

        (ParamType::Object, Value::Object(_)) => Ok(value.clone()),
        (ParamType::Object, Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(v @ Value::Object(_)) => Ok(v),
            _ => Err("expected object".to_string()),
        },

        (ty, other) => Err(format!("expected {}, got {}", ty.name(), json_kind(other))),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn in_enumeration(allowed: &[Value], value: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().all(|i| in_enumeration(allowed, i)),
        // Numbers compare by value so `1` matches `1.0`.
        Value::Number(n) => allowed
            .iter()
            .any(|a| a.as_f64().is_some_and(|f| Some(f) == n.as_f64())),
        _ => allowed.contains(value),
    }
}

fn scalar_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `simple` style: arrays are comma-joined, each element encoded separately.
fn path_value(v: &Value) -> String {
    match v {
        Value::Array(items) => items
            .iter()
            .map(|i| encode_path_segment(&scalar_to_string(i)))
            .collect::<Vec<_>>()
            .join(","),
        other => encode_path_segment(&scalar_to_string(other)),
    }
}

/// `form` style with `explode: true`: arrays repeat the key, objects use `deepObject` keys.
fn push_query_pairs(query: &mut Vec<(String, String)>, key: &str, v: &Value) {
    match v {
        Value::Array(items) => {
            for item in items {
                query.push((key.to_string(), scalar_to_string(item)));
            }
        }
        Value::Object(map) => {
            for (k, item) in map {
                query.push((format!("{key}[{k}]"), scalar_to_string(item)));
            }
        }
        other => query.push((key.to_string(), scalar_to_string(other))),
    }
}

fn header_value(param: &ToolParameter, v: &Value) -> std::result::Result<String, String> {
    let s = match v {
        Value::Array(items) => items
            .iter()
            .map(scalar_to_string)
            .collect::<Vec<_>>()
            .join(","),
        other => scalar_to_string(other),
    };

    if HeaderName::from_bytes(param.wire_name.as_bytes()).is_err() {
        return Err(format!("'{}' is not a valid header name", param.wire_name));
    }
    if HeaderValue::from_str(&s).is_err() {
        return Err(format!(
            "'{}': value contains characters not allowed in a header",
            param.name
        ));
    }
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ToolCatalog;
    use crate::config::CatalogOptions;
    use serde_json::json;

    fn catalog() -> ToolCatalog {
        let doc: Value = serde_yaml::from_str(
            r#"
openapi: "3.0.3"
info: { title: Items, version: "1" }
paths:
  /items/{id}:
    get:
      operationId: getItem
      parameters:
        - { name: id, in: path, required: true, schema: { type: integer } }
        - { name: verbose, in: query, schema: { type: boolean } }
        - { name: X-Request-Id, in: header, schema: { type: string } }
      responses: { "200": { description: ok } }
  /items:
    get:
      operationId: listItems
      parameters:
        - name: tags
          in: query
          schema: { type: array, items: { type: string } }
        - name: limit
          in: query
          schema: { type: integer, default: 10 }
        - name: sort
          in: query
          schema: { type: string, enum: [asc, desc] }
        - name: filter
          in: query
          schema: { type: object }
      responses: { "200": { description: ok } }
    post:
      operationId: createItem
      requestBody:
        required: true
        content:
          application/json:
            schema:
              type: object
              required: [name]
              properties:
                name: { type: string }
                price: { type: number }
                labels: { type: array, items: { type: string } }
      responses: { "201": { description: created } }
  /files/{path}:
    get:
      operationId: getFile
      parameters:
        - { name: path, in: path, required: true, schema: { type: string } }
      responses: { "200": { description: ok } }
  /notes:
    patch:
      operationId: patchNote
      requestBody:
        content:
          application/json:
            schema:
              type: object
              properties:
                text: { type: string }
      responses: { "200": { description: ok } }
  /bulk:
    put:
      operationId: bulk
      requestBody:
        content:
          application/json:
            schema: { type: array, items: { type: integer } }
      responses: { "200": { description: ok } }
"#,
        )
        .expect("yaml");
        ToolCatalog::build(&doc, &CatalogOptions::default()).expect("catalog")
    }

    fn args(v: Value) -> JsonObject {
        v.as_object().cloned().expect("object")
    }

    fn map(tool: &str, v: Value) -> Result<RequestPlan> {
        let catalog = catalog();
        let def = catalog.get(tool).expect("tool");
        map_arguments(def, Some(&args(v)))
    }

    fn message(err: OpenApiToolsError) -> String {
        match err {
            OpenApiToolsError::InvalidArguments { message, .. } => message,
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn substitutes_path_parameters() {
        let plan = map("getItem", json!({"id": 42})).expect("plan");
        assert_eq!(plan.path, "/items/42");
        assert_eq!(plan.method, Method::GET);
        assert!(plan.query.is_empty());
        assert!(plan.body.is_none());
    }

    #[test]
    fn missing_path_parameter_is_rejected() {
        let err = map("getItem", json!({})).unwrap_err();
        assert!(message(err).contains("missing required argument(s): id"));

        let catalog = catalog();
        let err = map_arguments(catalog.get("getItem").expect("tool"), None).unwrap_err();
        assert!(matches!(err, OpenApiToolsError::InvalidArguments { .. }));
    }

    #[test]
    fn unknown_arguments_are_rejected() {
        let err = map("getItem", json!({"id": 1, "bogus": true})).unwrap_err();
        assert_eq!(message(err), "unknown argument(s): bogus");
    }

    #[test]
    fn path_values_are_percent_encoded() {
        let plan = map("getFile", json!({"path": "a b/c?d"})).expect("plan");
        assert_eq!(plan.path, "/files/a%20b%2Fc%3Fd");
    }

    #[test]
    fn array_query_values_repeat_the_key() {
        let plan = map("listItems", json!({"tags": ["a", "b"]})).expect("plan");
        assert_eq!(
            plan.query,
            [
                ("tags".to_string(), "a".to_string()),
                ("tags".to_string(), "b".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn object_query_values_use_deep_object_keys() {
        let plan = map("listItems", json!({"filter": {"color": "red"}, "limit": 1})).expect("plan");
        assert!(plan.query.contains(&("filter[color]".to_string(), "red".to_string())));
    }

    #[test]
    fn coerces_string_spellings() {
        let plan = map(
            "getItem",
            json!({"id": "7", "verbose": "TRUE", "X-Request-Id": 99}),
        )
        .expect("plan");
        assert_eq!(plan.path, "/items/7");
        assert_eq!(plan.query, [("verbose".to_string(), "true".to_string())]);
        assert_eq!(plan.headers, [("X-Request-Id".to_string(), "99".to_string())]);
    }

    #[test]
    fn uncoercible_values_are_rejected() {
        let err = map("getItem", json!({"id": "forty-two"})).unwrap_err();
        assert!(message(err).contains("expected integer"));

        let err = map("getItem", json!({"id": 1.5})).unwrap_err();
        assert!(message(err).contains("expected integer"));

        let err = map("listItems", json!({"filter": [1]})).unwrap_err();
        assert!(message(err).contains("'filter'"));
    }

    #[test]
    fn enum_values_are_enforced() {
        map("listItems", json!({"sort": "asc"})).expect("allowed");
        let err = map("listItems", json!({"sort": "sideways"})).unwrap_err();
        assert!(message(err).contains("is not one of"));
    }

    #[test]
    fn null_counts_as_absent() {
        let plan = map("listItems", json!({"limit": null, "sort": null})).expect("plan");
        assert_eq!(plan.query, [("limit".to_string(), "10".to_string())]);
    }

    #[test]
    fn body_fields_are_collected_into_one_object() {
        let plan = map(
            "createItem",
            json!({"name": "lamp", "price": "9.5", "labels": "home"}),
        )
        .expect("plan");
        assert_eq!(
            plan.body,
            Some(json!({"name": "lamp", "price": 9.5, "labels": ["home"]}))
        );

        let err = map("createItem", json!({"price": 1})).unwrap_err();
        assert!(message(err).contains("name"));
    }

    #[test]
    fn whole_body_argument() {
        let plan = map("bulk", json!({"body": [1, "2"]})).expect("plan");
        assert_eq!(plan.body, Some(json!([1, 2])));

        let plan = map("bulk", json!({})).expect("optional body");
        assert_eq!(plan.body, None);
    }

    #[test]
    fn optional_object_body_is_omitted_when_empty() {
        let plan = map("patchNote", json!({})).expect("plan");
        assert_eq!(plan.body, None);

        let plan = map("patchNote", json!({"text": "hi"})).expect("plan");
        assert_eq!(plan.body, Some(json!({"text": "hi"})));
    }

    #[test]
    fn header_values_must_be_valid() {
        let err = map("getItem", json!({"id": 1, "X-Request-Id": "a\r\nb"})).unwrap_err();
        assert!(message(err).contains("X-Request-Id"));
    }

    #[test]
    fn unfilled_placeholders_are_rejected() {
        let catalog = catalog();
        let mut def = catalog.get("getItem").expect("tool").clone();
        for p in &mut def.parameters {
            p.required = false;
        }
        let err = map_arguments(&def, None).unwrap_err();
        assert!(message(err).contains("unfilled placeholders"));
    }
}
