#![deny(missing_docs)]

//! # Swagger Documents
//!
//! The normalized schema object: a serde model of a Swagger 2.0 document, and
//! the loader that produces it together with the references it has to check.
//!
//! Structural meta-schema validation of the raw document is out of scope;
//! anything that deserializes into this model is accepted here and checked
//! for consistency by [`validate_document`](crate::schema::validate_document).

use crate::error::{AppError, AppResult};
use crate::schema::node::SchemaNode;
use indexmap::IndexMap;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// The HTTP methods a path item may declare, lowercased.
pub const HTTP_METHODS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];

/// A Swagger 2.0 document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Swagger {
    /// Swagger version (e.g. "2.0").
    pub swagger: Option<String>,
    /// Metadata about the API. Not interpreted.
    #[serde(default)]
    pub info: Option<Value>,
    /// Host serving the API.
    #[serde(default)]
    pub host: Option<String>,
    /// Prefix stripped from request paths before matching.
    #[serde(default)]
    pub base_path: Option<String>,
    /// Document-level request media types.
    #[serde(default)]
    pub consumes: Vec<String>,
    /// Document-level response media types.
    #[serde(default)]
    pub produces: Vec<String>,
    /// Path items keyed by path template.
    #[serde(default)]
    pub paths: Paths,
    /// The definitions table.
    #[serde(default)]
    pub definitions: IndexMap<String, SchemaNode>,
    /// Named parameters, reachable through `#/parameters/...`.
    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,
    /// Named responses, reachable through `#/responses/...`.
    #[serde(default)]
    pub responses: IndexMap<String, Response>,
    /// Security schemes. Kept for reference; not enforced.
    #[serde(default)]
    pub security_definitions: IndexMap<String, Value>,
}

/// The Paths Object. Vendor extension keys (`x-...`) are skipped.
#[derive(Debug, Clone, Default)]
pub struct Paths {
    /// Parsed path items keyed by path template.
    pub items: IndexMap<String, PathItem>,
}

impl<'de> Deserialize<'de> for Paths {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, Value>::deserialize(deserializer)?;
        let mut items = IndexMap::new();

        for (key, value) in raw {
            if key.starts_with("x-") {
                continue;
            }
            let path_item = serde_json::from_value::<PathItem>(value).map_err(|e| {
                DeError::custom(format!("Failed to parse path item '{}': {}", key, e))
            })?;
            items.insert(key, path_item);
        }

        Ok(Self { items })
    }
}

/// A path template's operations and shared parameters.
#[derive(Debug, Clone, Default)]
pub struct PathItem {
    /// Parameters shared by every operation on this path.
    pub parameters: Vec<RefOr<Parameter>>,
    /// Operations keyed by lowercased method.
    pub operations: IndexMap<String, Operation>,
}

impl<'de> Deserialize<'de> for PathItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, Value>::deserialize(deserializer)?;
        let mut item = PathItem::default();

        for (key, value) in raw {
            let lower = key.to_ascii_lowercase();
            if HTTP_METHODS.contains(&lower.as_str()) {
                let op = serde_json::from_value::<Operation>(value).map_err(|e| {
                    DeError::custom(format!("Failed to parse operation '{}': {}", key, e))
                })?;
                item.operations.insert(lower, op);
            } else if key == "parameters" {
                item.parameters = serde_json::from_value(value).map_err(|e| {
                    DeError::custom(format!("Failed to parse path parameters: {}", e))
                })?;
            } else if key == "$ref" {
                return Err(DeError::custom(
                    "Path item '$ref' is not supported; inline the path item",
                ));
            }
        }

        Ok(item)
    }
}

/// An operation on a path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Unique operation identifier.
    #[serde(default)]
    pub operation_id: Option<String>,
    /// Short summary.
    #[serde(default)]
    pub summary: Option<String>,
    /// Overrides the document-level `consumes` when present.
    #[serde(default)]
    pub consumes: Option<Vec<String>>,
    /// Overrides the document-level `produces` when present.
    #[serde(default)]
    pub produces: Option<Vec<String>>,
    /// Operation parameters; these win over path-level ones.
    #[serde(default)]
    pub parameters: Vec<RefOr<Parameter>>,
    /// Responses keyed by status code or `default`.
    #[serde(default)]
    pub responses: IndexMap<String, RefOr<Response>>,
    /// Whether the operation is deprecated.
    #[serde(default)]
    pub deprecated: bool,
}

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    /// A `{name}` segment of the path template.
    Path,
    /// The query string.
    Query,
    /// A request header.
    Header,
    /// The request body.
    Body,
    /// Form fields. Not validated.
    FormData,
}

impl ParameterLocation {
    /// The error-tree key for failures at this location.
    pub fn error_key(self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "headers",
            ParameterLocation::Body => "body",
            ParameterLocation::FormData => "formData",
        }
    }
}

/// A Swagger 2.0 parameter.
///
/// Non-body parameters carry their constraints inline (`type`, `format`,
/// `items`, `collectionFormat`, ...), which land in `keywords`. Body
/// parameters carry a `schema`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name of the parameter.
    pub name: String,
    /// Location of the parameter.
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Whether the parameter must be present. Path parameters always are.
    #[serde(default)]
    pub required: bool,
    /// Body schema (only for `in: body`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaNode>,
    /// Inline keyword constraints of non-body parameters.
    #[serde(flatten)]
    pub keywords: SchemaNode,
}

impl Parameter {
    /// The schema values of this parameter are checked against: `schema`
    /// for body parameters, the inline keywords otherwise.
    pub fn effective_schema(&self) -> &SchemaNode {
        self.schema.as_ref().unwrap_or(&self.keywords)
    }

    /// Path parameters are implicitly required.
    pub fn is_required(&self) -> bool {
        self.required || self.location == ParameterLocation::Path
    }
}

/// A response declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Description (required by Swagger, not enforced here).
    #[serde(default)]
    pub description: String,
    /// Body schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaNode>,
    /// Declared response headers, each a set of inline keywords.
    #[serde(default)]
    pub headers: IndexMap<String, SchemaNode>,
}

/// A `$ref` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// The pointer.
    #[serde(rename = "$ref")]
    pub ref_location: String,
}

/// Either a `$ref` or an inline object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    /// A reference into a named table.
    Ref(Reference),
    /// The object itself.
    T(T),
}

/// References recorded while loading, checked once the whole document is
/// available.
#[derive(Debug, Clone, Default)]
pub struct LoaderContext {
    /// Every `$ref` string seen, with the locations that use it.
    pub deferred: BTreeMap<String, Vec<String>>,
}

impl LoaderContext {
    /// Records a reference and where it was found.
    pub fn defer(&mut self, reference: &str, location: impl Into<String>) {
        self.deferred
            .entry(reference.to_string())
            .or_default()
            .push(location.into());
    }

    /// Number of distinct references recorded.
    pub fn len(&self) -> usize {
        self.deferred.len()
    }

    /// True when the document contains no references.
    pub fn is_empty(&self) -> bool {
        self.deferred.is_empty()
    }
}

/// Loads a Swagger document from a JSON value.
///
/// Returns the normalized document and the loader context listing every
/// `$ref` it contains. References are *not* resolved here.
pub fn load_document(raw: Value) -> AppResult<(Swagger, LoaderContext)> {
    let swagger: Swagger = serde_json::from_value(raw)?;

    match swagger.swagger.as_deref() {
        Some(version) if version.starts_with("2.") => {}
        Some(version) => {
            return Err(AppError::General(format!(
                "Unsupported Swagger version: {}. Only 2.0 is supported.",
                version
            )));
        }
        None => {
            return Err(AppError::General(
                "Invalid Swagger document: missing 'swagger' version field.".into(),
            ));
        }
    }

    let mut loader = LoaderContext::default();
    collect_references(&swagger, &mut loader);
    debug!(
        paths = swagger.paths.items.len(),
        definitions = swagger.definitions.len(),
        references = loader.len(),
        "loaded swagger document"
    );

    Ok((swagger, loader))
}

/// Loads a Swagger document from YAML (or JSON) text.
pub fn load_document_yaml(yaml: &str) -> AppResult<(Swagger, LoaderContext)> {
    let raw: Value = serde_yaml::from_str(yaml)?;
    load_document(raw)
}

fn collect_references(swagger: &Swagger, loader: &mut LoaderContext) {
    for (name, node) in &swagger.definitions {
        collect_schema_references(node, &format!("definitions.{}", name), loader);
    }
    for (name, param) in &swagger.parameters {
        collect_parameter_references(param, &format!("parameters.{}", name), loader);
    }
    for (name, response) in &swagger.responses {
        collect_response_references(response, &format!("responses.{}", name), loader);
    }
    for (path, item) in &swagger.paths.items {
        let base = format!("paths.{}", path);
        for (idx, param) in item.parameters.iter().enumerate() {
            collect_ref_or(
                param,
                &format!("{}.parameters.{}", base, idx),
                loader,
                collect_parameter_references,
            );
        }
        for (method, op) in &item.operations {
            let op_base = format!("{}.{}", base, method);
            for (idx, param) in op.parameters.iter().enumerate() {
                collect_ref_or(
                    param,
                    &format!("{}.parameters.{}", op_base, idx),
                    loader,
                    collect_parameter_references,
                );
            }
            for (status, response) in &op.responses {
                collect_ref_or(
                    response,
                    &format!("{}.responses.{}", op_base, status),
                    loader,
                    collect_response_references,
                );
            }
        }
    }
}

fn collect_ref_or<T, F>(item: &RefOr<T>, location: &str, loader: &mut LoaderContext, inline: F)
where
    F: FnOnce(&T, &str, &mut LoaderContext),
{
    match item {
        RefOr::Ref(r) => loader.defer(&r.ref_location, location),
        RefOr::T(t) => inline(t, location, loader),
    }
}

fn collect_parameter_references(param: &Parameter, location: &str, loader: &mut LoaderContext) {
    if let Some(schema) = &param.schema {
        collect_schema_references(schema, &format!("{}.schema", location), loader);
    }
    collect_schema_references(&param.keywords, location, loader);
}

fn collect_response_references(response: &Response, location: &str, loader: &mut LoaderContext) {
    if let Some(schema) = &response.schema {
        collect_schema_references(schema, &format!("{}.schema", location), loader);
    }
    for (name, header) in &response.headers {
        collect_schema_references(header, &format!("{}.headers.{}", location, name), loader);
    }
}

fn collect_schema_references(node: &SchemaNode, location: &str, loader: &mut LoaderContext) {
    if let Some(reference) = &node.reference {
        loader.defer(reference, location);
    }
    for (key, child) in node.children() {
        collect_schema_references(child, &format!("{}.{}", location, key), loader);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn petstore() -> Value {
        json!({
            "swagger": "2.0",
            "basePath": "/v1",
            "consumes": ["application/json"],
            "paths": {
                "x-internal": true,
                "/pets/{petId}": {
                    "parameters": [{"$ref": "#/parameters/PetId"}],
                    "get": {
                        "responses": {
                            "200": {"description": "ok", "schema": {"$ref": "#/definitions/Pet"}},
                            "404": {"$ref": "#/responses/NotFound"}
                        }
                    },
                    "DELETE": {"responses": {"204": {"description": "gone"}}}
                }
            },
            "definitions": {
                "Pet": {
                    "type": "object",
                    "properties": {"owner": {"$ref": "#/definitions/Person"}}
                },
                "Person": {"type": "object"}
            },
            "parameters": {
                "PetId": {"name": "petId", "in": "path", "required": true, "type": "integer"}
            },
            "responses": {"NotFound": {"description": "missing"}}
        })
    }

    #[test]
    fn test_load_document_model() {
        let (swagger, _) = load_document(petstore()).unwrap();
        assert_eq!(swagger.base_path.as_deref(), Some("/v1"));
        let item = &swagger.paths.items["/pets/{petId}"];
        assert_eq!(
            item.operations.keys().collect::<Vec<_>>(),
            vec!["get", "delete"]
        );
        assert!(!swagger.paths.items.contains_key("x-internal"));

        let param = &swagger.parameters["PetId"];
        assert_eq!(param.location, ParameterLocation::Path);
        assert!(param.is_required());
        assert_eq!(
            param.keywords.declared_types(),
            vec![crate::value::PrimitiveType::Integer]
        );
    }

    #[test]
    fn test_loader_collects_each_reference_once() {
        let (_, loader) = load_document(petstore()).unwrap();
        let refs: Vec<&String> = loader.deferred.keys().collect();
        assert_eq!(
            refs,
            vec![
                "#/definitions/Person",
                "#/definitions/Pet",
                "#/parameters/PetId",
                "#/responses/NotFound"
            ]
        );
        assert_eq!(
            loader.deferred["#/definitions/Person"],
            vec!["definitions.Pet.properties.owner".to_string()]
        );
    }

    #[test]
    fn test_version_required() {
        let err = load_document(json!({"paths": {}})).unwrap_err();
        assert!(format!("{err}").contains("missing 'swagger'"));

        let err = load_document(json!({"swagger": "3.0"})).unwrap_err();
        assert!(format!("{err}").contains("Unsupported Swagger version"));
    }

    #[test]
    fn test_load_yaml() {
        let yaml = r#"
swagger: "2.0"
paths:
  /items:
    get:
      parameters:
        - name: tags
          in: query
          type: array
          collectionFormat: pipes
          items:
            type: string
      responses:
        "200":
          description: ok
"#;
        let (swagger, loader) = load_document_yaml(yaml).unwrap();
        assert!(loader.is_empty());
        let op = &swagger.paths.items["/items"].operations["get"];
        let RefOr::T(param) = &op.parameters[0] else {
            panic!("expected inline parameter");
        };
        assert_eq!(
            param.keywords.collection_format,
            Some(crate::schema::node::CollectionFormat::Pipes)
        );
    }
}
