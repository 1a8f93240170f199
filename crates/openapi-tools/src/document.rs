//! Raw document handling: parsing text, integrity hashes and the structural checks that run
//! before the typed `openapiv3` model is built.

use crate::config::HashPolicy;
use crate::error::{OpenApiToolsError, Result};
use openapiv3::OpenAPI;
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};

/// Parse an `OpenAPI` document from JSON or YAML text.
///
/// # Errors
///
/// Returns [`OpenApiToolsError::SpecParse`] if the text is neither.
pub fn parse_document(text: &str) -> Result<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(v) => Ok(v),
        Err(json_err) => serde_yaml::from_str::<Value>(text).map_err(|yaml_err| {
            OpenApiToolsError::SpecParse(format!(
                "document is neither JSON ({json_err}) nor YAML ({yaml_err})"
            ))
        }),
    }
}

/// `sha256:<hex>` digest of the raw document text.
#[must_use]
pub fn spec_digest(text: &str) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(text.as_bytes())))
}

/// Compare the document digest against an expected value.
///
/// # Errors
///
/// Returns [`OpenApiToolsError::SpecHashMismatch`] on mismatch under [`HashPolicy::Fail`].
pub fn verify_spec_hash(text: &str, expected: Option<&str>, policy: HashPolicy) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };
    if policy == HashPolicy::Ignore {
        return Ok(());
    }

    let actual = spec_digest(text);
    if actual.eq_ignore_ascii_case(expected) {
        return Ok(());
    }

    match policy {
        HashPolicy::Fail => Err(OpenApiToolsError::SpecHashMismatch {
            expected: expected.to_string(),
            actual,
        }),
        HashPolicy::Warn => {
            tracing::warn!(expected = %expected, actual = %actual, "Spec hash mismatch");
            Ok(())
        }
        HashPolicy::Ignore => Ok(()),
    }
}

/// Check the required top-level shape, normalize 3.1 constructs and build the typed model.
///
/// Returns the normalized JSON alongside the model; `$ref` targets are looked up in it.
pub(crate) fn parse_openapi(doc: &Value) -> Result<(Value, OpenAPI)> {
    let version = validate_structure(doc)?;

    let mut normalized = doc.clone();
    normalized["openapi"] = Value::String(version);
    normalize_schemas(&mut normalized);
    fill_missing_parameter_schemas(&mut normalized);

    let spec: OpenAPI = serde_json::from_value(normalized.clone())
        .map_err(|e| OpenApiToolsError::SpecParse(format!("invalid OpenAPI document: {e}")))?;
    Ok((normalized, spec))
}

fn validate_structure(doc: &Value) -> Result<String> {
    let Some(root) = doc.as_object() else {
        return Err(OpenApiToolsError::SpecParse(
            "document root must be an object".to_string(),
        ));
    };

    // Unquoted `openapi: 3.0` in YAML arrives as a number.
    let version = match root.get("openapi") {
        Some(Value::String(v)) => v.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => {
            return Err(OpenApiToolsError::SpecParse(
                "'openapi' must be a version string".to_string(),
            ));
        }
        None if root.contains_key("swagger") => {
            return Err(OpenApiToolsError::SpecParse(
                "Swagger 2.0 documents are not supported; convert to OpenAPI 3".to_string(),
            ));
        }
        None => {
            return Err(OpenApiToolsError::SpecParse(
                "missing required field 'openapi'".to_string(),
            ));
        }
    };
    if !version.starts_with("3.") {
        return Err(OpenApiToolsError::SpecParse(format!(
            "unsupported OpenAPI version '{version}' (expected 3.x)"
        )));
    }

    match root.get("info") {
        Some(Value::Object(info)) => {
            for field in ["title", "version"] {
                if !info.get(field).is_some_and(Value::is_string) {
                    return Err(OpenApiToolsError::SpecParse(format!(
                        "'info.{field}' must be a string"
                    )));
                }
            }
        }
        Some(_) => {
            return Err(OpenApiToolsError::SpecParse(
                "'info' must be an object".to_string(),
            ));
        }
        None => {
            return Err(OpenApiToolsError::SpecParse(
                "missing required field 'info'".to_string(),
            ));
        }
    }

    let Some(paths) = root.get("paths") else {
        return Err(OpenApiToolsError::SpecParse(
            "missing required field 'paths'".to_string(),
        ));
    };
    let Some(paths) = paths.as_object() else {
        return Err(OpenApiToolsError::SpecParse(
            "'paths' must be an object keyed by path template".to_string(),
        ));
    };
    for (path, item) in paths {
        if path.starts_with("x-") {
            continue;
        }
        if !path.starts_with('/') {
            return Err(OpenApiToolsError::SpecParse(format!(
                "path '{path}' must start with '/'"
            )));
        }
        if !item.is_object() {
            return Err(OpenApiToolsError::SpecParse(format!(
                "path item '{path}' must be an object"
            )));
        }
    }

    Ok(version)
}

/// Rewrite 3.1 schema keywords into their 3.0 equivalents, in place.
///
/// - `type: [T, "null"]` becomes `type: T` + `nullable: true`
/// - any other multi-type array drops `type` (handled later as an untyped schema)
/// - numeric `exclusiveMinimum`/`exclusiveMaximum` become `minimum`/`maximum` + boolean flag
/// - scalar `const: v` becomes `enum: [v]`
fn normalize_schemas(value: &mut Value) {
    normalize_node(value, false);
}

/// Keywords whose values are user data, never schemas.
const LITERAL_KEYWORDS: &[&str] = &["default", "example", "examples", "enum", "const"];

/// Keywords whose values map user-chosen names to schemas.
const NAMED_SCHEMA_MAPS: &[&str] = &["properties", "patternProperties", "$defs", "definitions"];

/// `named` is set when `value` is a map keyed by names rather than keywords.
fn normalize_node(value: &mut Value, named: bool) {
    match value {
        Value::Object(map) if named => {
            for v in map.values_mut() {
                normalize_node(v, false);
            }
        }
        Value::Object(map) => {
            normalize_schema_object(map);
            for (k, v) in map.iter_mut() {
                if LITERAL_KEYWORDS.contains(&k.as_str()) || k.starts_with("x-") {
                    continue;
                }
                normalize_node(v, NAMED_SCHEMA_MAPS.contains(&k.as_str()));
            }
        }
        Value::Array(items) => {
            for v in items {
                normalize_node(v, false);
            }
        }
        _ => {}
    }
}

fn normalize_schema_object(map: &mut Map<String, Value>) {
    if let Some(Value::Array(types)) = map.get("type").cloned() {
        let non_null: Vec<Value> = types
            .iter()
            .filter(|t| t.as_str() != Some("null"))
            .cloned()
            .collect();
        let had_null = non_null.len() != types.len();
        match non_null.as_slice() {
            [single] => {
                map.insert("type".to_string(), single.clone());
            }
            _ => {
                map.remove("type");
            }
        }
        if had_null {
            map.insert("nullable".to_string(), Value::Bool(true));
        }
    }

    for (exclusive, bound) in [
        ("exclusiveMinimum", "minimum"),
        ("exclusiveMaximum", "maximum"),
    ] {
        if let Some(n @ Value::Number(_)) = map.get(exclusive).cloned() {
            map.insert(bound.to_string(), n);
            map.insert(exclusive.to_string(), Value::Bool(true));
        }
    }

    if map.get("const").is_some_and(|c| !c.is_object() && !c.is_array())
        && !map.contains_key("enum")
        && let Some(c) = map.remove("const")
    {
        map.insert("enum".to_string(), json!([c]));
    }
}

/// Parameters without `schema` or `content` get a plain string schema.
fn fill_missing_parameter_schemas(doc: &mut Value) {
    fn fill(params: Option<&mut Value>) {
        let Some(Value::Array(params)) = params else {
            return;
        };
        for p in params {
            fill_one(p);
        }
    }

    fn fill_one(p: &mut Value) {
        if let Value::Object(obj) = p
            && obj.contains_key("in")
            && !obj.contains_key("schema")
            && !obj.contains_key("content")
        {
            obj.insert("schema".to_string(), json!({"type": "string"}));
        }
    }

    if let Some(Value::Object(paths)) = doc.get_mut("paths") {
        for item in paths.values_mut() {
            let Value::Object(item) = item else { continue };
            fill(item.get_mut("parameters"));
            for op in item.values_mut() {
                if let Value::Object(op) = op {
                    fill(op.get_mut("parameters"));
                }
            }
        }
    }

    if let Some(Value::Object(params)) = doc.pointer_mut("/components/parameters") {
        for p in params.values_mut() {
            fill_one(p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_and_yaml() {
        let json = parse_document(r#"{"openapi": "3.0.0"}"#).expect("json");
        assert_eq!(json["openapi"], "3.0.0");

        let yaml = parse_document("openapi: 3.0.3\ninfo:\n  title: t\n").expect("yaml");
        assert_eq!(yaml["info"]["title"], "t");

        assert!(parse_document(": : :\n\t- [").is_err());
    }

    #[test]
    fn hash_policy() {
        let text = "openapi: 3.0.0";
        let digest = spec_digest(text);
        assert!(digest.starts_with("sha256:"));

        verify_spec_hash(text, Some(&digest), HashPolicy::Fail).expect("matches");
        verify_spec_hash(text, Some("sha256:00"), HashPolicy::Warn).expect("warn only");
        verify_spec_hash(text, Some("sha256:00"), HashPolicy::Ignore).expect("ignored");
        let err = verify_spec_hash(text, Some("sha256:00"), HashPolicy::Fail).unwrap_err();
        assert!(matches!(err, OpenApiToolsError::SpecHashMismatch { .. }));
    }

    #[test]
    fn rejects_bad_top_level_shapes() {
        let cases = [
            (json!([]), "root"),
            (json!({"info": {"title": "t", "version": "1"}, "paths": {}}), "openapi"),
            (json!({"swagger": "2.0", "paths": {}}), "Swagger"),
            (
                json!({"openapi": "2.0", "info": {"title": "t", "version": "1"}, "paths": {}}),
                "version",
            ),
            (json!({"openapi": "3.0.0", "paths": {}}), "info"),
            (json!({"openapi": "3.0.0", "info": {"title": "t", "version": "1"}}), "paths"),
            (
                json!({"openapi": "3.0.0", "info": {"title": "t", "version": "1"}, "paths": []}),
                "paths",
            ),
            (
                json!({"openapi": "3.0.0", "info": {"title": "t", "version": "1"}, "paths": {"/a": 1}}),
                "/a",
            ),
        ];
        for (doc, needle) in cases {
            let err = parse_openapi(&doc).unwrap_err();
            assert!(
                matches!(&err, OpenApiToolsError::SpecParse(m) if m.contains(needle)),
                "{doc}: {err}"
            );
        }
    }

    #[test]
    fn normalizes_nullable_type_arrays() {
        let mut v = json!({
            "type": "object",
            "properties": {
                "a": {"type": ["string", "null"]},
                "b": {"type": ["string", "integer"]},
                "c": {"type": "integer", "exclusiveMinimum": 0},
                "d": {"const": "fixed"}
            }
        });
        normalize_schemas(&mut v);
        assert_eq!(v["properties"]["a"], json!({"type": "string", "nullable": true}));
        assert_eq!(v["properties"]["b"], json!({}));
        assert_eq!(
            v["properties"]["c"],
            json!({"type": "integer", "minimum": 0, "exclusiveMinimum": true})
        );
        assert_eq!(v["properties"]["d"], json!({"enum": ["fixed"]}));
    }

    #[test]
    fn leaves_literal_values_untouched() {
        let mut v = json!({
            "type": "object",
            "properties": {
                "default": {"type": ["string", "null"]},
                "filter": {
                    "type": "object",
                    "default": {"type": ["a", "b"]},
                    "example": {"const": 1}
                },
                "kind": {"type": "string", "enum": [{"type": ["x", "null"]}]}
            }
        });
        normalize_schemas(&mut v);
        assert_eq!(
            v["properties"]["default"],
            json!({"type": "string", "nullable": true})
        );
        assert_eq!(v["properties"]["filter"]["default"], json!({"type": ["a", "b"]}));
        assert_eq!(v["properties"]["filter"]["example"], json!({"const": 1}));
        assert_eq!(
            v["properties"]["kind"]["enum"],
            json!([{"type": ["x", "null"]}])
        );
    }

    #[test]
    fn fills_parameters_without_schema() {
        let doc = json!({
            "openapi": "3.1.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/items": {
                    "get": {
                        "parameters": [{"name": "q", "in": "query"}],
                        "responses": {"200": {"description": "ok"}}
                    }
                }
            }
        });
        let (normalized, _spec) = parse_openapi(&doc).expect("parsed");
        assert_eq!(
            normalized["paths"]["/items"]["get"]["parameters"][0]["schema"],
            json!({"type": "string"})
        );
    }
}
