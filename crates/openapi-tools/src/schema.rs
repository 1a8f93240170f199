//! `OpenAPI` schema → tool argument type translation.
//!
//! Every schema collapses to one of six structural [`ParamType`]s plus a JSON Schema fragment for
//! the tool's `inputSchema`. Anything that does not map cleanly degrades to `string` and carries a
//! note explaining why, so one odd field never sinks a whole catalog.

use crate::resolver::LocalResolver;
use openapiv3::{
    ArrayType, IntegerFormat, IntegerType, NumberFormat, NumberType, ObjectType, ReferenceOr,
    Schema, SchemaKind, StringFormat, StringType, Type, VariantOrUnknownOrEmpty,
};
use serde::Serialize;
use serde_json::{Map, Value, json};

/// Nested object/array schemas are inlined up to this depth.
const MAX_INLINE_DEPTH: usize = 6;

/// Structural type of a tool argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "items", rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Array(Box<ParamType>),
    Object,
}

impl ParamType {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Array(_) => "array",
            ParamType::Object => "object",
        }
    }

    fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ParamType::String),
            "number" => Some(ParamType::Number),
            "integer" => Some(ParamType::Integer),
            "boolean" => Some(ParamType::Boolean),
            "array" => Some(ParamType::Array(Box::new(ParamType::String))),
            "object" => Some(ParamType::Object),
            _ => None,
        }
    }
}

/// Result of translating one schema.
#[derive(Debug, Clone)]
pub struct TranslatedSchema {
    pub ty: ParamType,
    /// JSON Schema fragment exposed in the tool's `inputSchema`.
    pub json: Value,
    /// Allowed values (`enum`), empty when unconstrained.
    pub enumeration: Vec<Value>,
    pub default: Option<Value>,
    /// Set when the schema could not be mapped and fell back to `string`.
    pub degraded: Option<String>,
}

impl TranslatedSchema {
    fn string_fallback(reason: impl Into<String>, description: Option<&str>) -> Self {
        let mut json = json!({"type": "string"});
        if let Some(d) = description {
            json["description"] = json!(d);
        }
        Self {
            ty: ParamType::String,
            json,
            enumeration: Vec::new(),
            default: None,
            degraded: Some(reason.into()),
        }
    }

    fn plain(ty: ParamType, json: Value) -> Self {
        Self {
            ty,
            json,
            enumeration: Vec::new(),
            default: None,
            degraded: None,
        }
    }
}

/// Top-level properties of an object schema (after `$ref` and `allOf` resolution).
#[derive(Debug, Clone)]
pub struct ObjectShape {
    pub properties: Vec<(String, ReferenceOr<Schema>)>,
    pub required: Vec<String>,
}

pub(crate) struct SchemaTranslator<'a> {
    resolver: LocalResolver<'a>,
}

impl<'a> SchemaTranslator<'a> {
    pub(crate) fn new(resolver: LocalResolver<'a>) -> Self {
        Self { resolver }
    }

    pub(crate) fn translate(&self, schema: &ReferenceOr<Schema>) -> TranslatedSchema {
        let mut stack = Vec::new();
        self.translate_ref(schema, 0, &mut stack)
    }

    /// Resolve a (possibly referenced) schema into its object shape, if it is an object.
    ///
    /// Returns `Ok(None)` for non-object schemas and `Err` for dangling references.
    pub(crate) fn object_shape(
        &self,
        schema: &ReferenceOr<Schema>,
    ) -> crate::error::Result<Option<ObjectShape>> {
        self.object_shape_at(schema, 0)
    }

    fn object_shape_at(
        &self,
        schema: &ReferenceOr<Schema>,
        depth: usize,
    ) -> crate::error::Result<Option<ObjectShape>> {
        if depth > MAX_INLINE_DEPTH {
            return Ok(None);
        }
        let schema = self.resolver.resolve(schema)?;
        match &schema.schema_kind {
            SchemaKind::Type(Type::Object(obj)) => Ok(Some(ObjectShape {
                properties: obj
                    .properties
                    .iter()
                    .map(|(k, v)| (k.clone(), unbox(v)))
                    .collect(),
                required: obj.required.clone(),
            })),
            SchemaKind::AllOf { all_of } => {
                let mut merged = ObjectShape {
                    properties: Vec::new(),
                    required: Vec::new(),
                };
                for part in all_of {
                    let Some(shape) = self.object_shape_at(part, depth + 1)? else {
                        return Ok(None);
                    };
                    for (name, prop) in shape.properties {
                        if let Some(existing) = merged.properties.iter_mut().find(|(n, _)| *n == name)
                        {
                            existing.1 = prop;
                        } else {
                            merged.properties.push((name, prop));
                        }
                    }
                    for r in shape.required {
                        if !merged.required.contains(&r) {
                            merged.required.push(r);
                        }
                    }
                }
                Ok(Some(merged))
            }
            SchemaKind::Any(any) => {
                let raw = serde_json::to_value(any)?;
                let props = raw.get("properties").and_then(Value::as_object);
                let is_object = raw.get("type").and_then(Value::as_str) == Some("object");
                match props {
                    Some(props) => Ok(Some(ObjectShape {
                        properties: props
                            .iter()
                            .filter_map(|(k, v)| {
                                serde_json::from_value(v.clone()).ok().map(|s| (k.clone(), s))
                            })
                            .collect(),
                        required: string_list(raw.get("required")),
                    })),
                    None if is_object => Ok(Some(ObjectShape {
                        properties: Vec::new(),
                        required: Vec::new(),
                    })),
                    None => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    fn translate_ref(
        &self,
        schema: &ReferenceOr<Schema>,
        depth: usize,
        stack: &mut Vec<String>,
    ) -> TranslatedSchema {
        match schema {
            ReferenceOr::Item(s) => self.translate_schema(s, depth, stack),
            ReferenceOr::Reference { reference } => {
                if stack.contains(reference) || depth > MAX_INLINE_DEPTH {
                    // Recursive or deeply nested: keep the shape loose.
                    return TranslatedSchema::plain(ParamType::Object, json!({"type": "object"}));
                }
                match self.resolver.resolve(schema) {
                    Ok(resolved) => {
                        stack.push(reference.clone());
                        let out = self.translate_schema(&resolved, depth, stack);
                        stack.pop();
                        out
                    }
                    Err(e) => TranslatedSchema::string_fallback(e.to_string(), None),
                }
            }
        }
    }

    fn translate_schema(
        &self,
        schema: &Schema,
        depth: usize,
        stack: &mut Vec<String>,
    ) -> TranslatedSchema {
        let data = &schema.schema_data;
        let description = data.description.as_deref();

        let mut out = match &schema.schema_kind {
            SchemaKind::Type(Type::String(s)) => string_schema(s),
            SchemaKind::Type(Type::Number(n)) => number_schema(n),
            SchemaKind::Type(Type::Integer(i)) => integer_schema(i),
            SchemaKind::Type(Type::Boolean(_)) => {
                TranslatedSchema::plain(ParamType::Boolean, json!({"type": "boolean"}))
            }
            SchemaKind::Type(Type::Array(a)) => self.array_schema(a, depth, stack),
            SchemaKind::Type(Type::Object(o)) => self.object_schema(o, depth, stack),
            SchemaKind::OneOf { one_of } => self.collapse_variants("oneOf", one_of, depth, stack),
            SchemaKind::AnyOf { any_of } => self.collapse_variants("anyOf", any_of, depth, stack),
            SchemaKind::AllOf { all_of } => self.all_of_schema(all_of, depth, stack),
            SchemaKind::Not { .. } => {
                TranslatedSchema::string_fallback("'not' schemas are not supported", description)
            }
            SchemaKind::Any(any) => match serde_json::to_value(any) {
                Ok(raw) => self.untyped_schema(&raw, depth, stack),
                Err(e) => TranslatedSchema::string_fallback(e.to_string(), description),
            },
        };

        if let (Some(d), Some(obj)) = (description, out.json.as_object_mut()) {
            obj.entry("description")
                .or_insert_with(|| Value::String(d.to_string()));
        }
        if let Some(default) = &data.default {
            out.default = Some(default.clone());
            out.json["default"] = default.clone();
        }
        out
    }

    fn array_schema(
        &self,
        a: &ArrayType,
        depth: usize,
        stack: &mut Vec<String>,
    ) -> TranslatedSchema {
        let mut json = json!({"type": "array"});
        let item_ty = match &a.items {
            Some(items) => {
                let item = self.translate_ref(&unbox(items), depth + 1, stack);
                json["items"] = item.json;
                if let Some(reason) = item.degraded {
                    let mut out = TranslatedSchema::plain(
                        ParamType::Array(Box::new(ParamType::String)),
                        json,
                    );
                    out.degraded = Some(format!("array items: {reason}"));
                    return out;
                }
                item.ty
            }
            None => ParamType::String,
        };
        if let Some(n) = a.min_items {
            json["minItems"] = json!(n);
        }
        if let Some(n) = a.max_items {
            json["maxItems"] = json!(n);
        }
        if a.unique_items {
            json["uniqueItems"] = json!(true);
        }
        TranslatedSchema::plain(ParamType::Array(Box::new(item_ty)), json)
    }

    fn object_schema(
        &self,
        o: &ObjectType,
        depth: usize,
        stack: &mut Vec<String>,
    ) -> TranslatedSchema {
        let mut json = json!({"type": "object"});
        if depth < MAX_INLINE_DEPTH && !o.properties.is_empty() {
            let mut properties = Map::new();
            for (name, prop) in &o.properties {
                let t = self.translate_ref(&unbox(prop), depth + 1, stack);
                properties.insert(name.clone(), t.json);
            }
            json["properties"] = Value::Object(properties);
        }
        if !o.required.is_empty() {
            json["required"] = json!(o.required);
        }
        TranslatedSchema::plain(ParamType::Object, json)
    }

    fn all_of_schema(
        &self,
        parts: &[ReferenceOr<Schema>],
        depth: usize,
        stack: &mut Vec<String>,
    ) -> TranslatedSchema {
        if let [only] = parts {
            return self.translate_ref(only, depth, stack);
        }

        let mut properties = Map::new();
        let mut required: Vec<String> = Vec::new();
        for part in parts {
            match self.object_shape(part) {
                Ok(Some(shape)) => {
                    for (name, prop) in &shape.properties {
                        let t = self.translate_ref(prop, depth + 1, stack);
                        properties.insert(name.clone(), t.json);
                    }
                    for r in shape.required {
                        if !required.contains(&r) {
                            required.push(r);
                        }
                    }
                }
                Ok(None) => {
                    return TranslatedSchema::string_fallback(
                        "allOf over non-object schemas is not supported",
                        None,
                    );
                }
                Err(e) => return TranslatedSchema::string_fallback(e.to_string(), None),
            }
        }

        let mut json = json!({"type": "object", "properties": properties});
        if !required.is_empty() {
            json["required"] = json!(required);
        }
        TranslatedSchema::plain(ParamType::Object, json)
    }

    /// `oneOf`/`anyOf`: a single non-null variant is used directly; several variants of the same
    /// structural type keep that type; anything else degrades.
    fn collapse_variants(
        &self,
        keyword: &str,
        variants: &[ReferenceOr<Schema>],
        depth: usize,
        stack: &mut Vec<String>,
    ) -> TranslatedSchema {
        let translated: Vec<TranslatedSchema> = variants
            .iter()
            .filter(|v| !self.is_null_schema(v))
            .map(|v| self.translate_ref(v, depth + 1, stack))
            .collect();

        match translated.as_slice() {
            [] => TranslatedSchema::string_fallback(format!("empty {keyword}"), None),
            [single] => single.clone(),
            [first, rest @ ..] => {
                let same_type = rest.iter().all(|t| t.ty == first.ty);
                let any_degraded = translated.iter().any(|t| t.degraded.is_some());
                if !same_type || any_degraded {
                    return TranslatedSchema::string_fallback(
                        format!("{keyword} with mixed types is not supported"),
                        None,
                    );
                }
                let mut json = json!({"type": first.ty.name()});
                json[keyword] = Value::Array(translated.iter().map(|t| t.json.clone()).collect());
                let enumeration = if translated.iter().all(|t| !t.enumeration.is_empty()) {
                    translated
                        .iter()
                        .flat_map(|t| t.enumeration.iter().cloned())
                        .collect()
                } else {
                    Vec::new()
                };
                TranslatedSchema {
                    ty: first.ty.clone(),
                    json,
                    enumeration,
                    default: None,
                    degraded: None,
                }
            }
        }
    }

    fn is_null_schema(&self, schema: &ReferenceOr<Schema>) -> bool {
        let Ok(resolved) = self.resolver.resolve(schema) else {
            return false;
        };
        match &resolved.schema_kind {
            SchemaKind::Any(any) => serde_json::to_value(any)
                .ok()
                .and_then(|v| v.get("type").and_then(Value::as_str).map(|t| t == "null"))
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Schemas that did not match a typed `openapiv3` variant: no `type`, an unknown `type`, or a
    /// `type` combined with keywords of another type.
    fn untyped_schema(&self, raw: &Value, depth: usize, stack: &mut Vec<String>) -> TranslatedSchema {
        let description = raw.get("description").and_then(Value::as_str);

        for keyword in ["oneOf", "anyOf"] {
            if let Some(variants) = raw.get(keyword).and_then(parse_schema_list) {
                return self.collapse_variants(keyword, &variants, depth, stack);
            }
        }
        if let Some(parts) = raw.get("allOf").and_then(parse_schema_list) {
            return self.all_of_schema(&parts, depth, stack);
        }

        let declared = raw.get("type").and_then(Value::as_str);
        let ty = match declared {
            Some(name) => match ParamType::from_type_name(name) {
                Some(ty) => ty,
                None => {
                    return TranslatedSchema::string_fallback(
                        format!("unknown schema type '{name}'"),
                        description,
                    );
                }
            },
            None if raw.get("properties").is_some() => ParamType::Object,
            None if raw.get("items").is_some() => ParamType::Array(Box::new(ParamType::String)),
            None => {
                return TranslatedSchema::string_fallback("schema has no type", description);
            }
        };

        let mut json = json!({"type": ty.name()});
        let mut out_ty = ty;
        match &mut out_ty {
            ParamType::Object => {
                if let Some(props) = raw.get("properties").and_then(Value::as_object) {
                    let mut properties = Map::new();
                    for (name, prop) in props {
                        let t = match serde_json::from_value::<ReferenceOr<Schema>>(prop.clone()) {
                            Ok(s) => self.translate_ref(&s, depth + 1, stack).json,
                            Err(_) => json!({"type": "string"}),
                        };
                        properties.insert(name.clone(), t);
                    }
                    json["properties"] = Value::Object(properties);
                }
                let required = string_list(raw.get("required"));
                if !required.is_empty() {
                    json["required"] = json!(required);
                }
            }
            ParamType::Array(item_ty) => {
                if let Some(items) = raw
                    .get("items")
                    .and_then(|i| serde_json::from_value::<ReferenceOr<Schema>>(i.clone()).ok())
                {
                    let item = self.translate_ref(&items, depth + 1, stack);
                    json["items"] = item.json;
                    if item.degraded.is_none() {
                        *item_ty = Box::new(item.ty);
                    }
                }
            }
            _ => {}
        }

        let enumeration: Vec<Value> = raw
            .get("enum")
            .and_then(Value::as_array)
            .map(|values| values.iter().filter(|v| !v.is_null()).cloned().collect())
            .unwrap_or_default();
        if !enumeration.is_empty() {
            json["enum"] = json!(enumeration);
        }

        TranslatedSchema {
            ty: out_ty,
            json,
            enumeration,
            default: None,
            degraded: None,
        }
    }
}

fn string_schema(s: &StringType) -> TranslatedSchema {
    let mut json = json!({"type": "string"});
    let format = match &s.format {
        VariantOrUnknownOrEmpty::Item(f) => Some(
            match f {
                StringFormat::Date => "date",
                StringFormat::DateTime => "date-time",
                StringFormat::Password => "password",
                StringFormat::Byte => "byte",
                StringFormat::Binary => "binary",
            }
            .to_string(),
        ),
        VariantOrUnknownOrEmpty::Unknown(f) => Some(f.clone()),
        VariantOrUnknownOrEmpty::Empty => None,
    };
    if let Some(f) = format {
        json["format"] = json!(f);
    }
    if let Some(p) = &s.pattern {
        json["pattern"] = json!(p);
    }
    if let Some(n) = s.min_length {
        json["minLength"] = json!(n);
    }
    if let Some(n) = s.max_length {
        json["maxLength"] = json!(n);
    }

    let enumeration: Vec<Value> = s
        .enumeration
        .iter()
        .flatten()
        .map(|v| Value::String(v.clone()))
        .collect();
    if !enumeration.is_empty() {
        json["enum"] = json!(enumeration);
    }

    TranslatedSchema {
        ty: ParamType::String,
        json,
        enumeration,
        default: None,
        degraded: None,
    }
}

fn number_schema(n: &NumberType) -> TranslatedSchema {
    let mut json = json!({"type": "number"});
    if let VariantOrUnknownOrEmpty::Item(f) = &n.format {
        json["format"] = json!(match f {
            NumberFormat::Float => "float",
            NumberFormat::Double => "double",
        });
    }
    apply_bounds(
        &mut json,
        n.minimum.map(|v| json!(v)),
        n.exclusive_minimum,
        n.maximum.map(|v| json!(v)),
        n.exclusive_maximum,
    );
    let enumeration: Vec<Value> = n.enumeration.iter().flatten().map(|v| json!(v)).collect();
    if !enumeration.is_empty() {
        json["enum"] = json!(enumeration);
    }
    TranslatedSchema {
        ty: ParamType::Number,
        json,
        enumeration,
        default: None,
        degraded: None,
    }
}

fn integer_schema(i: &IntegerType) -> TranslatedSchema {
    let mut json = json!({"type": "integer"});
    if let VariantOrUnknownOrEmpty::Item(f) = &i.format {
        json["format"] = json!(match f {
            IntegerFormat::Int32 => "int32",
            IntegerFormat::Int64 => "int64",
        });
    }
    apply_bounds(
        &mut json,
        i.minimum.map(|v| json!(v)),
        i.exclusive_minimum,
        i.maximum.map(|v| json!(v)),
        i.exclusive_maximum,
    );
    let enumeration: Vec<Value> = i.enumeration.iter().flatten().map(|v| json!(v)).collect();
    if !enumeration.is_empty() {
        json["enum"] = json!(enumeration);
    }
    TranslatedSchema {
        ty: ParamType::Integer,
        json,
        enumeration,
        default: None,
        degraded: None,
    }
}

/// Emit bounds in the numeric (draft 2019+) form that MCP clients validate against.
fn apply_bounds(
    json: &mut Value,
    min: Option<Value>,
    exclusive_min: bool,
    max: Option<Value>,
    exclusive_max: bool,
) {
    if let Some(min) = min {
        let key = if exclusive_min { "exclusiveMinimum" } else { "minimum" };
        json[key] = min;
    }
    if let Some(max) = max {
        let key = if exclusive_max { "exclusiveMaximum" } else { "maximum" };
        json[key] = max;
    }
}

fn unbox(r: &ReferenceOr<Box<Schema>>) -> ReferenceOr<Schema> {
    match r {
        ReferenceOr::Item(s) => ReferenceOr::Item((**s).clone()),
        ReferenceOr::Reference { reference } => ReferenceOr::Reference {
            reference: reference.clone(),
        },
    }
}

fn parse_schema_list(v: &Value) -> Option<Vec<ReferenceOr<Schema>>> {
    serde_json::from_value(v.clone()).ok()
}

fn string_list(v: Option<&Value>) -> Vec<String> {
    v.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
