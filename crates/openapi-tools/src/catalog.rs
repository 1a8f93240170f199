//! Tool catalog: `OpenAPI` operations → tool definitions.
//!
//! The catalog is built once from a parsed document and never mutated afterwards. Building is a
//! pure function of `(document, options)`: the same input always yields the same tool names, in
//! the same order, with the same input schemas.

use crate::config::CatalogOptions;
use crate::document::parse_openapi;
use crate::error::{OpenApiToolsError, Result};
use crate::resolver::LocalResolver;
use crate::schema::{ParamType, SchemaTranslator, TranslatedSchema};
use openapiv3::{
    APIKeyLocation, OpenAPI, Operation, Parameter, ParameterData, ParameterSchemaOrContent,
    PathItem, ReferenceOr, RequestBody, Response, SecurityScheme, StatusCode,
};
use regex::Regex;
use reqwest::Method;
use restmcp_http_tools::content::is_json_media_type;
use rmcp::model::JsonObject;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Longest tool name derived from an `operationId` or path (before any collision suffix).
const MAX_TOOL_NAME_LEN: usize = 64;

/// Operations with more parameters than this get a parameter list in their description.
const DESCRIBE_PARAMS_ABOVE: usize = 3;

static PATH_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("valid regex"));
static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("valid regex"));
static INVALID_NAME_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_-]+").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Body,
}

impl ParamLocation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::Body => "body",
        }
    }
}

/// One tool argument and where it goes in the HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolParameter {
    /// Argument name exposed in the tool's input schema.
    pub name: String,
    /// Name used on the wire (path placeholder, query key, header name or body property).
    pub wire_name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub ty: ParamType,
    pub enumeration: Vec<Value>,
    pub default: Option<Value>,
    /// JSON Schema fragment for this argument.
    pub schema: Value,
}

/// How the request body is assembled from body-location arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// No request body.
    None,
    /// Top-level properties of a JSON object, one argument each. An optional body with no
    /// fields supplied is omitted.
    Fields { required: bool },
    /// A non-object JSON body passed as a single `body` argument.
    Whole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthScheme {
    /// `apiKey` security scheme carried in a header.
    ApiKey,
    /// `http` scheme `bearer`.
    Bearer,
    /// `http` scheme `basic`.
    Basic,
}

impl AuthScheme {
    /// Prefix placed before the credential when none is configured.
    #[must_use]
    pub fn default_prefix(self) -> Option<&'static str> {
        match self {
            AuthScheme::ApiKey => None,
            AuthScheme::Bearer => Some("Bearer"),
            AuthScheme::Basic => Some("Basic"),
        }
    }
}

/// Credential requirements of one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolSecurity {
    /// No header-carried credential is modeled for this operation.
    None,
    Header {
        /// Name of the security scheme in `components.securitySchemes`.
        scheme_name: String,
        header_name: String,
        scheme: AuthScheme,
        /// `false` when the document also allows anonymous access (`{}` alternative).
        required: bool,
    },
}

impl ToolSecurity {
    #[must_use]
    pub fn header_name(&self) -> Option<&str> {
        match self {
            ToolSecurity::None => None,
            ToolSecurity::Header { header_name, .. } => Some(header_name),
        }
    }

    #[must_use]
    pub fn requires_credential(&self) -> bool {
        matches!(self, ToolSecurity::Header { required: true, .. })
    }
}

/// A callable tool derived from one `OpenAPI` operation.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub summary: Option<String>,
    pub operation_id: Option<String>,
    pub method: Method,
    /// Raw path with `{param}` placeholders.
    pub path_template: String,
    pub parameters: Vec<ToolParameter>,
    pub input_schema: Value,
    pub body: BodyMode,
    pub security: ToolSecurity,
    /// JSON Schema of the first 2xx JSON response, if the document declares one.
    pub response_schema: Option<Value>,
}

impl ToolDefinition {
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn input_schema_object(&self) -> JsonObject {
        self.input_schema.as_object().cloned().unwrap_or_default()
    }

    /// `"GET /widgets/{id}"`
    #[must_use]
    pub fn operation_label(&self) -> String {
        format!("{} {}", self.method, self.path_template)
    }
}

/// Document-level metadata, used for server info and discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

/// Ordered, read-only collection of tools.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    info: ApiInfo,
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
    warnings: Vec<String>,
}

impl ToolCatalog {
    /// Build a catalog from a raw `OpenAPI` 3.x document.
    ///
    /// Individual operations that cannot be exposed are skipped with a log line; only a document
    /// that is not usable `OpenAPI` at all fails the build.
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiToolsError::SpecParse`] if the document is malformed.
    pub fn build(doc: &Value, options: &CatalogOptions) -> Result<Self> {
        let (normalized, spec) = parse_openapi(doc)?;
        let resolver = LocalResolver::new(&normalized);
        let mut builder = CatalogBuilder {
            spec: &spec,
            resolver,
            translator: SchemaTranslator::new(resolver),
            options,
            names: HashSet::new(),
            warnings: Vec::new(),
        };

        let mut tools = Vec::new();
        for (path, item) in &spec.paths.paths {
            let item = match resolver.resolve(item) {
                Ok(item) => item,
                Err(e) => {
                    builder.note(format!("Skipping path '{path}': {e}"));
                    continue;
                }
            };

            for (method, operation) in operations(&item) {
                let Some(operation) = operation else { continue };
                let label = format!("{method} {path}");

                if !builder.is_included(&label) {
                    tracing::debug!(operation = %label, "Operation filtered out");
                    continue;
                }

                match builder.build_tool(path, &method, &item, operation) {
                    Ok(tool) => tools.push(tool),
                    Err(Skip::Unsupported(reason)) => {
                        tracing::info!(operation = %label, "Not exposed as a tool: {reason}");
                    }
                    Err(Skip::Invalid(reason)) => {
                        builder.note(format!("Skipping {label}: {reason}"));
                    }
                }
            }
        }

        let index = tools
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();

        let info = ApiInfo {
            title: spec.info.title.clone(),
            version: spec.info.version.clone(),
            description: spec.info.description.clone(),
        };

        tracing::info!(
            api = %info.title,
            tools = tools.len(),
            warnings = builder.warnings.len(),
            "Built tool catalog"
        );

        Ok(Self {
            info,
            tools,
            index,
            warnings: builder.warnings,
        })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    #[must_use]
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    #[must_use]
    pub fn info(&self) -> &ApiInfo {
        &self.info
    }

    /// Notes about degraded schemas and skipped operations, in build order.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

enum Skip {
    /// Deliberately out of scope (non-JSON body, required cookie).
    Unsupported(String),
    /// The operation is malformed in a way that prevents exposing it.
    Invalid(String),
}

impl From<OpenApiToolsError> for Skip {
    fn from(value: OpenApiToolsError) -> Self {
        Skip::Invalid(value.to_string())
    }
}

struct CatalogBuilder<'a> {
    spec: &'a OpenAPI,
    resolver: LocalResolver<'a>,
    translator: SchemaTranslator<'a>,
    options: &'a CatalogOptions,
    names: HashSet<String>,
    warnings: Vec<String>,
}

impl CatalogBuilder<'_> {
    fn note(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }

    fn is_included(&self, label: &str) -> bool {
        // Exclude patterns win.
        if self.options.exclude.iter().any(|p| glob_match(p, label)) {
            return false;
        }
        self.options.include.is_empty() || self.options.include.iter().any(|p| glob_match(p, label))
    }

    fn build_tool(
        &mut self,
        path: &str,
        method: &Method,
        item: &PathItem,
        operation: &Operation,
    ) -> std::result::Result<ToolDefinition, Skip> {
        let label = format!("{method} {path}");
        let security = self.resolve_security(operation);

        let mut reserved_headers: HashSet<String> = ["accept", "content-type", "authorization"]
            .into_iter()
            .map(str::to_string)
            .collect();
        if let Some(h) = security.header_name() {
            reserved_headers.insert(h.to_ascii_lowercase());
        }
        if let Some(h) = &self.options.auth_header {
            reserved_headers.insert(h.to_ascii_lowercase());
        }

        let mut parameters = Vec::new();
        for param in self.merge_parameters(&item.parameters, &operation.parameters)? {
            let (data, location) = match &param {
                Parameter::Path { parameter_data, .. } => (parameter_data, ParamLocation::Path),
                Parameter::Query { parameter_data, .. } => (parameter_data, ParamLocation::Query),
                Parameter::Header { parameter_data, .. } => {
                    if reserved_headers.contains(&parameter_data.name.to_ascii_lowercase()) {
                        tracing::debug!(
                            operation = %label,
                            header = %parameter_data.name,
                            "Reserved header parameter dropped"
                        );
                        continue;
                    }
                    (parameter_data, ParamLocation::Header)
                }
                Parameter::Cookie { parameter_data, .. } => {
                    if parameter_data.required {
                        return Err(Skip::Unsupported(format!(
                            "requires cookie parameter '{}'",
                            parameter_data.name
                        )));
                    }
                    tracing::debug!(
                        operation = %label,
                        cookie = %parameter_data.name,
                        "Optional cookie parameter dropped"
                    );
                    continue;
                }
            };
            let p = self.extract_parameter(&label, data, location);
            parameters.push(p);
        }

        // Placeholders the document forgot to declare still have to be filled by the caller.
        for cap in PATH_PARAM_RE.captures_iter(path) {
            let name = &cap[1];
            let declared = parameters
                .iter()
                .any(|p| p.location == ParamLocation::Path && p.wire_name == name);
            if !declared {
                tracing::debug!(operation = %label, param = %name, "Undeclared path parameter");
                parameters.push(ToolParameter {
                    name: name.to_string(),
                    wire_name: name.to_string(),
                    location: ParamLocation::Path,
                    required: true,
                    ty: ParamType::String,
                    enumeration: Vec::new(),
                    default: None,
                    schema: json!({"type": "string"}),
                });
            }
        }

        let body = match &operation.request_body {
            Some(body_ref) => {
                let request_body = self.resolver.resolve(body_ref)?;
                self.extract_body_params(&label, &request_body, &mut parameters)?
            }
            None => BodyMode::None,
        };

        assign_argument_names(&mut parameters).map_err(Skip::Invalid)?;

        let input_schema = build_input_schema(&parameters);
        let description = tool_description(operation, &label, &parameters);
        let base = base_tool_name(operation, method, path);
        let name = reserve_unique_tool_name(&mut self.names, &base);
        let response_schema = self.derive_response_schema(operation);

        Ok(ToolDefinition {
            name,
            description,
            summary: non_empty(operation.summary.as_deref()),
            operation_id: operation.operation_id.clone(),
            method: method.clone(),
            path_template: path.to_string(),
            parameters,
            input_schema,
            body,
            security,
            response_schema,
        })
    }

    /// Path-item parameters first, then operation parameters; an operation parameter with the
    /// same (location, name) replaces the path-level one in place.
    fn merge_parameters(
        &self,
        path_item_params: &[ReferenceOr<Parameter>],
        operation_params: &[ReferenceOr<Parameter>],
    ) -> Result<Vec<Parameter>> {
        fn key_for(p: &Parameter) -> (&'static str, String) {
            match p {
                Parameter::Path { parameter_data, .. } => ("path", parameter_data.name.clone()),
                Parameter::Query { parameter_data, .. } => ("query", parameter_data.name.clone()),
                Parameter::Header { parameter_data, .. } => {
                    // Header names are case-insensitive.
                    ("header", parameter_data.name.to_ascii_lowercase())
                }
                Parameter::Cookie { parameter_data, .. } => {
                    ("cookie", parameter_data.name.clone())
                }
            }
        }

        let mut merged: Vec<Parameter> = Vec::new();
        let mut index: HashMap<(&'static str, String), usize> = HashMap::new();

        for p in path_item_params.iter().chain(operation_params) {
            let rp = self.resolver.resolve(p)?;
            let k = key_for(&rp);
            if let Some(i) = index.get(&k).copied() {
                merged[i] = rp;
            } else {
                index.insert(k, merged.len());
                merged.push(rp);
            }
        }

        Ok(merged)
    }

    fn extract_parameter(
        &mut self,
        label: &str,
        data: &ParameterData,
        location: ParamLocation,
    ) -> ToolParameter {
        let translated = match &data.format {
            ParameterSchemaOrContent::Schema(schema) => self.translator.translate(schema),
            // Content-serialized parameters are passed through as strings.
            ParameterSchemaOrContent::Content(_) => TranslatedSchema {
                ty: ParamType::String,
                json: json!({"type": "string"}),
                enumeration: Vec::new(),
                default: None,
                degraded: None,
            },
        };

        if let Some(reason) = &translated.degraded {
            self.note(format!(
                "{label}: {} parameter '{}': {reason}; treating as string",
                location.as_str(),
                data.name
            ));
        }

        let mut schema = translated.json;
        if let (Some(obj), Some(desc)) = (schema.as_object_mut(), data.description.as_deref()) {
            obj.entry("description")
                .or_insert_with(|| Value::String(desc.to_string()));
        }

        ToolParameter {
            name: data.name.clone(),
            wire_name: data.name.clone(),
            location,
            // Path params are always required.
            required: location == ParamLocation::Path || data.required,
            ty: translated.ty,
            enumeration: translated.enumeration,
            default: translated.default,
            schema,
        }
    }

    fn extract_body_params(
        &mut self,
        label: &str,
        body: &RequestBody,
        parameters: &mut Vec<ToolParameter>,
    ) -> std::result::Result<BodyMode, Skip> {
        if body.content.is_empty() {
            return Ok(BodyMode::None);
        }

        let Some((_, media)) = body.content.iter().find(|(mt, _)| is_json_media_type(mt)) else {
            let types: Vec<&str> = body.content.keys().map(String::as_str).collect();
            return Err(Skip::Unsupported(format!(
                "request body media type(s) {} are not JSON",
                types.join(", ")
            )));
        };

        let Some(schema_ref) = &media.schema else {
            parameters.push(whole_body_param(
                body.required,
                TranslatedSchema {
                    ty: ParamType::String,
                    json: json!({"type": "string"}),
                    enumeration: Vec::new(),
                    default: None,
                    degraded: None,
                },
            ));
            return Ok(BodyMode::Whole);
        };

        match self.translator.object_shape(schema_ref)? {
            Some(shape) if !shape.properties.is_empty() => {
                for (prop_name, prop_schema) in &shape.properties {
                    let translated = self.translator.translate(prop_schema);
                    if let Some(reason) = &translated.degraded {
                        self.note(format!(
                            "{label}: body property '{prop_name}': {reason}; treating as string"
                        ));
                    }
                    // An optional body cannot make its properties required.
                    let required = body.required && shape.required.contains(prop_name);
                    parameters.push(ToolParameter {
                        name: prop_name.clone(),
                        wire_name: prop_name.clone(),
                        location: ParamLocation::Body,
                        required,
                        ty: translated.ty,
                        enumeration: translated.enumeration,
                        default: translated.default,
                        schema: translated.json,
                    });
                }
                Ok(BodyMode::Fields {
                    required: body.required,
                })
            }
            _ => {
                let translated = self.translator.translate(schema_ref);
                if let Some(reason) = &translated.degraded {
                    self.note(format!("{label}: request body: {reason}; treating as string"));
                }
                parameters.push(whole_body_param(body.required, translated));
                Ok(BodyMode::Whole)
            }
        }
    }

    /// Operation-level `security` overrides the document's. The first alternative (in document
    /// order) that names a header-carried scheme decides the header; an empty alternative makes
    /// the credential optional.
    fn resolve_security(&self, operation: &Operation) -> ToolSecurity {
        let Some(requirements) = operation.security.as_ref().or(self.spec.security.as_ref())
        else {
            return ToolSecurity::None;
        };

        let mut anonymous_allowed = false;
        let mut chosen: Option<(String, String, AuthScheme)> = None;
        for requirement in requirements {
            if requirement.is_empty() {
                anonymous_allowed = true;
                continue;
            }
            if chosen.is_some() {
                continue;
            }
            chosen = requirement.keys().find_map(|scheme_name| {
                self.header_scheme(scheme_name)
                    .map(|(header, scheme)| (scheme_name.clone(), header, scheme))
            });
        }

        match chosen {
            Some((scheme_name, header_name, scheme)) => ToolSecurity::Header {
                scheme_name,
                header_name,
                scheme,
                required: !anonymous_allowed,
            },
            None => ToolSecurity::None,
        }
    }

    fn header_scheme(&self, scheme_name: &str) -> Option<(String, AuthScheme)> {
        let scheme_ref = self
            .spec
            .components
            .as_ref()?
            .security_schemes
            .get(scheme_name)?;
        let scheme = match self.resolver.resolve(scheme_ref) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(scheme = %scheme_name, error = %e, "Unresolvable security scheme");
                return None;
            }
        };
        match scheme {
            SecurityScheme::APIKey {
                location: APIKeyLocation::Header,
                name,
                ..
            } => Some((name, AuthScheme::ApiKey)),
            SecurityScheme::HTTP { scheme, .. } if scheme.eq_ignore_ascii_case("bearer") => {
                Some(("Authorization".to_string(), AuthScheme::Bearer))
            }
            SecurityScheme::HTTP { scheme, .. } if scheme.eq_ignore_ascii_case("basic") => {
                Some(("Authorization".to_string(), AuthScheme::Basic))
            }
            _ => None,
        }
    }

    /// Prefer explicit 2xx codes (lowest first), otherwise the `2XX` range.
    fn derive_response_schema(&self, operation: &Operation) -> Option<Value> {
        let mut explicit_2xx: Vec<(u16, &ReferenceOr<Response>)> = Vec::new();
        let mut range_2xx: Option<&ReferenceOr<Response>> = None;

        for (code, resp) in &operation.responses.responses {
            match code {
                StatusCode::Code(n) if (200..300).contains(n) => explicit_2xx.push((*n, resp)),
                StatusCode::Range(2) => range_2xx = Some(resp),
                _ => {}
            }
        }
        explicit_2xx.sort_by_key(|(n, _)| *n);

        let resp_ref = explicit_2xx.first().map(|(_, r)| *r).or(range_2xx)?;
        let resp = self.resolver.resolve(resp_ref).ok()?;
        let (_, media) = resp.content.iter().find(|(mt, _)| is_json_media_type(mt))?;
        let schema = media.schema.as_ref()?;
        Some(self.translator.translate(schema).json)
    }
}

fn operations(item: &PathItem) -> [(Method, Option<&Operation>); 8] {
    [
        (Method::GET, item.get.as_ref()),
        (Method::PUT, item.put.as_ref()),
        (Method::POST, item.post.as_ref()),
        (Method::DELETE, item.delete.as_ref()),
        (Method::OPTIONS, item.options.as_ref()),
        (Method::HEAD, item.head.as_ref()),
        (Method::PATCH, item.patch.as_ref()),
        (Method::TRACE, item.trace.as_ref()),
    ]
}

fn whole_body_param(required: bool, translated: TranslatedSchema) -> ToolParameter {
    ToolParameter {
        name: "body".to_string(),
        wire_name: "body".to_string(),
        location: ParamLocation::Body,
        required,
        ty: translated.ty,
        enumeration: translated.enumeration,
        default: translated.default,
        schema: translated.json,
    }
}

/// Give every parameter a distinct argument name. The first occurrence keeps its name; later
/// ones are prefixed with their location (`body_id`).
fn assign_argument_names(parameters: &mut [ToolParameter]) -> std::result::Result<(), String> {
    let mut taken: HashSet<String> = HashSet::new();
    for p in parameters.iter_mut() {
        if taken.insert(p.name.clone()) {
            continue;
        }
        let renamed = format!("{}_{}", p.location.as_str(), p.name);
        if !taken.insert(renamed.clone()) {
            return Err(format!(
                "argument '{}' appears multiple times and '{renamed}' is also taken",
                p.name
            ));
        }
        p.name = renamed;
    }
    Ok(())
}

/// Build input schema for a tool from its parameters.
fn build_input_schema(parameters: &[ToolParameter]) -> Value {
    let mut properties = json!({});
    let mut required: Vec<String> = Vec::new();

    for param in parameters {
        let mut prop_schema = param.schema.clone();
        if let Some(default) = &param.default {
            prop_schema["default"] = default.clone();
        }
        properties[&param.name] = prop_schema;

        if param.required && param.default.is_none() {
            required.push(param.name.clone());
        }
    }

    let mut schema = json!({
        "type": "object",
        "properties": properties,
        "additionalProperties": false,
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn tool_description(operation: &Operation, label: &str, parameters: &[ToolParameter]) -> String {
    let summary = non_empty(operation.summary.as_deref());
    let details = non_empty(operation.description.as_deref()).filter(|d| Some(d) != summary.as_ref());

    let mut text = match (summary, details) {
        (Some(s), Some(d)) => format!("{s}\n\n{d}"),
        (Some(s), None) => s,
        (None, Some(d)) => d,
        (None, None) => format!("Calls {label}"),
    };

    if operation.deprecated {
        text.push_str("\n\nDeprecated.");
    }

    if parameters.len() > DESCRIBE_PARAMS_ABOVE {
        text.push_str("\n\nParameters:");
        for p in parameters {
            text.push_str(&format!("\n- {} ({}", p.name, p.location.as_str()));
            if p.required && p.default.is_none() {
                text.push_str(", required");
            }
            text.push(')');
            if let Some(desc) = p.schema.get("description").and_then(Value::as_str) {
                text.push_str(": ");
                text.push_str(desc);
            }
        }
    }

    text
}

fn base_tool_name(operation: &Operation, method: &Method, path: &str) -> String {
    operation
        .operation_id
        .as_deref()
        .map(sanitize_operation_id)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| generate_canonical_name(method.as_str(), path))
}

fn sanitize_operation_id(op_id: &str) -> String {
    let name = INVALID_NAME_CHARS_RE.replace_all(op_id, "_");
    truncate_name(name.trim_matches('_'))
}

fn generate_canonical_name(method: &str, path: &str) -> String {
    let name = format!("{}_{}", method.to_lowercase(), path);
    // Replace path params {param} with _param
    let name = PATH_PARAM_RE.replace_all(&name, "_$1");
    let name = NON_ALNUM_RE.replace_all(&name, "_");
    truncate_name(name.trim_matches('_'))
}

fn truncate_name(name: &str) -> String {
    // Names are ASCII by construction, so byte slicing is safe.
    let cut = &name[..name.len().min(MAX_TOOL_NAME_LEN)];
    cut.trim_end_matches('_').to_string()
}

fn reserve_unique_tool_name(tool_names: &mut HashSet<String>, base: &str) -> String {
    let base = base.to_string();
    if tool_names.insert(base.clone()) {
        return base;
    }

    let mut counter = 1;
    loop {
        let candidate = format!("{base}_{counter}");
        if tool_names.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

fn glob_match(pattern: &str, text: &str) -> bool {
    // Simple glob matching on bytes:
    //   * => any sequence
    //   ? => any single character
    let pattern_bytes = pattern.as_bytes();
    let text_bytes = text.as_bytes();

    let mut pattern_index = 0usize;
    let mut text_index = 0usize;

    let mut star_index: Option<usize> = None;
    let mut star_text_index: usize = 0;

    while text_index < text_bytes.len() {
        match pattern_bytes.get(pattern_index) {
            Some(b'*') => {
                star_index = Some(pattern_index);
                pattern_index += 1;
                star_text_index = text_index;
            }
            Some(b'?') => {
                pattern_index += 1;
                text_index += 1;
            }
            Some(&b) if b == text_bytes[text_index] => {
                pattern_index += 1;
                text_index += 1;
            }
            _ => {
                let Some(si) = star_index else {
                    return false;
                };

                pattern_index = si + 1;
                star_text_index += 1;
                text_index = star_text_index;
            }
        }
    }

    while matches!(pattern_bytes.get(pattern_index), Some(b'*')) {
        pattern_index += 1;
    }

    pattern_index == pattern_bytes.len()
}
