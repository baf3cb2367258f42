#![deny(missing_docs)]

//! # Request / Response Orchestration
//!
//! [`ApiValidator`] compiles every operation of a document once and then
//! validates requests and responses against it in stages:
//!
//! - **Request**: path, method, `consumes`, then parameters per location.
//! - **Response**: path, method, status code, then body schema, declared
//!   headers and `produces`.
//!
//! A path or method mismatch stops validation; every later stage runs and
//! reports independently.

use crate::config::ValidatorConfig;
use crate::error::{AppError, AppResult};
use crate::http::parameters::{merge_parameters, HeaderSet, ParameterSet};
use crate::http::paths::{CompiledPath, PathMatch, PathMatcher};
use crate::http::{media_type, Request, Response};
use crate::messages;
use crate::report::{ErrorCollector, ErrorTree};
use crate::schema::checks::validate_document;
use crate::schema::context::ResolutionContext;
use crate::schema::document::{
    load_document_yaml, LoaderContext, Operation, Parameter, PathItem, Swagger,
};
use crate::validators::{build_schema_validator, ValidationContext, Validator};
use crate::value::Instance;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, info};

/// A compiled response declaration.
#[derive(Debug)]
struct CompiledResponse {
    body: Option<Validator>,
    headers: HeaderSet,
}

/// A compiled operation.
#[derive(Debug)]
struct CompiledOperation {
    consumes: Vec<String>,
    produces: Vec<String>,
    parameters: ParameterSet,
    responses: IndexMap<String, CompiledResponse>,
}

/// Validates requests and responses against one document.
///
/// Immutable after construction and `Send + Sync`; share it behind an `Arc`.
#[derive(Debug)]
pub struct ApiValidator {
    resolution: Arc<ResolutionContext>,
    matcher: PathMatcher,
    operations: IndexMap<String, IndexMap<String, CompiledOperation>>,
    config: ValidatorConfig,
}

impl ApiValidator {
    /// Compiles every operation of `swagger`.
    ///
    /// The document is assumed consistent; see [`ApiValidator::from_document`]
    /// for the checked variant.
    pub fn new(swagger: &Swagger, config: ValidatorConfig) -> AppResult<Self> {
        let resolution = Arc::new(ResolutionContext::from_swagger(swagger));
        let base_path = config
            .base_path
            .clone()
            .or_else(|| swagger.base_path.clone());

        let mut compiled_paths = Vec::with_capacity(swagger.paths.items.len());
        let mut operations = IndexMap::new();
        for (template, item) in &swagger.paths.items {
            let (path, ops) = compile_path_item(swagger, template, item, &resolution)?;
            compiled_paths.push(path);
            operations.insert(template.clone(), ops);
        }

        info!(
            paths = operations.len(),
            base_path = base_path.as_deref().unwrap_or(""),
            "api validator ready"
        );

        Ok(Self {
            resolution,
            matcher: PathMatcher::new(base_path.as_deref(), compiled_paths),
            operations,
            config,
        })
    }

    /// Checks the document with [`validate_document`] first and refuses to
    /// compile an inconsistent one.
    pub fn from_document(
        swagger: &Swagger,
        loader: &LoaderContext,
        config: ValidatorConfig,
    ) -> AppResult<Self> {
        let issues = validate_document(swagger, loader);
        if !issues.is_empty() {
            let listed: Vec<String> = issues.iter().map(ToString::to_string).collect();
            return Err(AppError::Schema(listed.join("; ")));
        }
        Self::new(swagger, config)
    }

    /// Loads, checks and compiles a YAML (or JSON) document.
    pub fn from_yaml(text: &str, config: ValidatorConfig) -> AppResult<Self> {
        let (swagger, loader) = load_document_yaml(text)?;
        Self::from_document(&swagger, &loader, config)
    }

    /// The tables `$ref`s resolve against.
    pub fn resolution(&self) -> &Arc<ResolutionContext> {
        &self.resolution
    }

    fn locate(
        &self,
        path: &str,
        method: &str,
    ) -> Result<(PathMatch<'_>, &CompiledOperation), ErrorTree> {
        let found = self.matcher.match_path(path)?;
        let template = found.path.template();
        let Some(ops) = self.operations.get(template) else {
            return Err(ErrorTree::keyed_message("path", messages::UNKNOWN_PATH));
        };
        let method = method.to_ascii_lowercase();
        match ops.get(&method) {
            Some(op) => Ok((found, op)),
            None => {
                let allowed: Vec<&str> = ops.keys().map(String::as_str).collect();
                Err(ErrorTree::keyed_message(
                    "method",
                    format!(
                        "{}: `{}`. Allowed methods: {}",
                        messages::INVALID_METHOD,
                        method,
                        allowed.join(", ")
                    ),
                ))
            }
        }
    }

    /// Validates a request.
    pub fn validate_request(&self, request: &Request) -> Result<(), ErrorTree> {
        let (found, op) = self.locate(&request.path(), &request.method)?;
        let ctx = ValidationContext::new(&self.resolution);
        let mut errors = ErrorCollector::new();

        if self.config.validate_content_type && request.body.is_some() {
            if let Err(message) = check_media_type(request.content_type.as_deref(), &op.consumes) {
                errors.add("consumes", message);
            }
        }

        errors.record_at(
            "parameters",
            op.parameters.validate(&found.parameters, request, &ctx),
        );

        debug!(
            template = %found.path.template(),
            method = %request.method,
            valid = errors.is_empty(),
            "validated request"
        );
        errors.finish()
    }

    /// Validates a response.
    pub fn validate_response(&self, response: &Response) -> Result<(), ErrorTree> {
        let (found, op) = self.locate(&response.path(), &response.request.method)?;

        let status = response.status_code.to_string();
        let Some(declared) = op
            .responses
            .get(&status)
            .or_else(|| op.responses.get("default"))
        else {
            let known: Vec<&str> = op.responses.keys().map(String::as_str).collect();
            return Err(ErrorTree::keyed_message(
                "status_code",
                format!(
                    "{}: `{}`. Declared: {}",
                    messages::INVALID_STATUS_CODE,
                    status,
                    known.join(", ")
                ),
            ));
        };

        let ctx = ValidationContext::new(&self.resolution);
        let mut errors = ErrorCollector::new();

        errors.scoped("body", |body| {
            if let Some(validator) = &declared.body {
                let instance = Instance::from_option(response.body.as_ref());
                body.record_at("schema", validator.validate(instance, &ctx));
            }
            if self.config.validate_response_headers {
                body.record_at(
                    "headers",
                    declared.headers.validate(|name| response.header(name), &ctx),
                );
            }
        });

        if self.config.validate_content_type && response.content_type.is_some() {
            if let Err(message) = check_media_type(response.content_type.as_deref(), &op.produces) {
                errors.add("produces", message);
            }
        }

        debug!(
            template = %found.path.template(),
            status = response.status_code,
            valid = errors.is_empty(),
            "validated response"
        );
        errors.finish()
    }
}

fn check_media_type(content_type: Option<&str>, allowed: &[String]) -> Result<(), String> {
    if allowed.is_empty() {
        return Ok(());
    }
    let Some(content_type) = content_type else {
        return Err(format!(
            "{}: no content type given. Must be one of: {}",
            messages::INVALID_CONTENT_TYPE,
            allowed.join(", ")
        ));
    };
    let actual = media_type(content_type);
    if allowed.iter().any(|candidate| media_type(candidate) == actual) {
        Ok(())
    } else {
        Err(format!(
            "{}: `{}`. Must be one of: {}",
            messages::INVALID_CONTENT_TYPE,
            content_type,
            allowed.join(", ")
        ))
    }
}

fn compile_path_item(
    swagger: &Swagger,
    template: &str,
    item: &PathItem,
    resolution: &ResolutionContext,
) -> AppResult<(CompiledPath, IndexMap<String, CompiledOperation>)> {
    let mut operations = IndexMap::new();
    let mut path_parameters: Vec<&Parameter> = Vec::new();

    for (method, op) in &item.operations {
        let merged = merge_parameters(&item.parameters, &op.parameters, resolution)?;
        for param in &merged {
            if !path_parameters.iter().any(|p| std::ptr::eq(*p, *param)) {
                path_parameters.push(*param);
            }
        }
        operations.insert(
            method.clone(),
            compile_operation(swagger, op, &merged, resolution)?,
        );
    }
    if item.operations.is_empty() {
        for param in merge_parameters(&item.parameters, &[], resolution)? {
            path_parameters.push(param);
        }
    }

    let path = CompiledPath::compile(template, &path_parameters)?;
    Ok((path, operations))
}

fn compile_operation(
    swagger: &Swagger,
    op: &Operation,
    parameters: &[&Parameter],
    resolution: &ResolutionContext,
) -> AppResult<CompiledOperation> {
    let mut responses = IndexMap::new();
    for (status, item) in &op.responses {
        let response = resolution.resolve_response(item)?;
        let body = match &response.schema {
            Some(schema) => Some(build_schema_validator(schema)?),
            None => None,
        };
        responses.insert(
            status.clone(),
            CompiledResponse {
                body,
                headers: HeaderSet::compile(&response.headers)?,
            },
        );
    }

    Ok(CompiledOperation {
        consumes: op
            .consumes
            .clone()
            .unwrap_or_else(|| swagger.consumes.clone()),
        produces: op
            .produces
            .clone()
            .unwrap_or_else(|| swagger.produces.clone()),
        parameters: ParameterSet::compile(parameters)?,
        responses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::document::load_document;
    use serde_json::json;

    fn api() -> ApiValidator {
        let (swagger, loader) = load_document(json!({
            "swagger": "2.0",
            "basePath": "/v1",
            "consumes": ["application/json"],
            "produces": ["application/json"],
            "paths": {
                "/pets/{petId}": {
                    "parameters": [
                        {"name": "petId", "in": "path", "required": true, "type": "integer"}
                    ],
                    "get": {
                        "responses": {
                            "200": {
                                "description": "ok",
                                "schema": {"$ref": "#/definitions/Pet"},
                                "headers": {"X-Rate-Limit": {"type": "integer"}}
                            },
                            "default": {"description": "error", "schema": {"type": "object"}}
                        }
                    },
                    "put": {
                        "parameters": [
                            {"name": "pet", "in": "body", "required": true,
                             "schema": {"$ref": "#/definitions/Pet"}}
                        ],
                        "responses": {"204": {"description": "stored"}}
                    }
                }
            },
            "definitions": {
                "Pet": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {"name": {"type": "string"}}
                }
            }
        }))
        .unwrap();
        ApiValidator::from_document(&swagger, &loader, ValidatorConfig::default()).unwrap()
    }

    #[test]
    fn test_unknown_path_stops() {
        let err = api()
            .validate_request(&Request::new("get", "/v1/owners/1"))
            .unwrap_err();
        assert!(err.contains("path"));
        assert!(!err.contains("parameters"));
    }

    #[test]
    fn test_wrong_method_lists_allowed() {
        let err = api()
            .validate_request(&Request::new("DELETE", "/v1/pets/1"))
            .unwrap_err();
        let message = err.get("method").unwrap().messages()[0].to_string();
        assert!(message.contains("get, put"));
    }

    #[test]
    fn test_request_consumes_and_body() {
        let api = api();
        let ok = Request::new("put", "/v1/pets/1")
            .with_body("application/json; charset=utf-8", json!({"name": "Rex"}));
        assert!(api.validate_request(&ok).is_ok());

        let bad = Request::new("put", "/v1/pets/1").with_body("text/plain", json!({}));
        let err = api.validate_request(&bad).unwrap_err();
        assert!(err.contains("consumes"));
        assert!(err.contains("parameters.body.pet.name.required"));
    }

    #[test]
    fn test_response_status_and_default() {
        let api = api();
        let request = Request::new("get", "/v1/pets/7");

        let ok = Response::new(request.clone(), 200)
            .with_body("application/json", json!({"name": "Rex"}))
            .with_header("X-Rate-Limit", "10");
        assert!(api.validate_response(&ok).is_ok());

        let fallback = Response::new(request.clone(), 500).with_body("application/json", json!({}));
        assert!(api.validate_response(&fallback).is_ok());

        let bad = Response::new(request, 200)
            .with_body("text/html", json!({"name": 3}))
            .with_header("x-rate-limit", "many");
        let err = api.validate_response(&bad).unwrap_err();
        assert!(err.contains("body.schema.name.type"));
        assert!(err.contains("body.headers.X-Rate-Limit.type"));
        assert!(err.contains("produces"));
    }

    #[test]
    fn test_undeclared_status_without_default() {
        let api = api();
        let response = Response::new(Request::new("put", "/v1/pets/1"), 200);
        let err = api.validate_response(&response).unwrap_err();
        assert!(err.contains("status_code"));
    }

    #[test]
    fn test_inconsistent_document_is_refused() {
        let (swagger, loader) = load_document(json!({
            "swagger": "2.0",
            "definitions": {"A": {"$ref": "#/definitions/B"}}
        }))
        .unwrap();
        let err = ApiValidator::from_document(&swagger, &loader, ValidatorConfig::default())
            .unwrap_err();
        assert!(matches!(err, AppError::Schema(_)));
    }

    #[test]
    fn test_operation_path_parameters_shape_the_matcher() {
        let (swagger, loader) = load_document(json!({
            "swagger": "2.0",
            "paths": {
                "/orders/{orderId}": {
                    "get": {
                        "parameters": [
                            {"name": "orderId", "in": "path", "required": true, "type": "integer"}
                        ],
                        "responses": {"200": {"description": "ok"}}
                    }
                }
            }
        }))
        .unwrap();
        let api = ApiValidator::from_document(&swagger, &loader, ValidatorConfig::default()).unwrap();

        assert!(api.validate_request(&Request::new("get", "/orders/42")).is_ok());
        let err = api
            .validate_request(&Request::new("get", "/orders/latest"))
            .unwrap_err();
        assert!(err.contains("path"));
    }

    #[test]
    fn test_api_validator_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiValidator>();
    }
}
