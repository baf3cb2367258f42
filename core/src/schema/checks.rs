#![deny(missing_docs)]

//! # Document Checks
//!
//! Consistency checks over a loaded document, run once after loading:
//!
//! - every deferred `$ref` resolves in the table matching its kind
//! - every schema keyword is well formed and fits the declared type
//! - path parameters and path templates agree
//!
//! Problems are collected, not raised, and returned as a flat issue list.

use crate::http::paths::template_parameters;
use crate::messages;
use crate::report::{ErrorCollector, ErrorTree, FailurePolicy, Issue};
use crate::schema::document::{
    LoaderContext, Operation, Parameter, ParameterLocation, PathItem, RefOr, Response, Swagger,
};
use crate::schema::node::SchemaNode;
use crate::schema::refs::{parse_reference, ReferenceKind};
use crate::validators::keywords::incompatible_keywords;
use crate::validators::numeric;
use regex::Regex;
use std::cmp::Ordering;
use tracing::debug;

/// Checks a loaded document for internal consistency.
///
/// Returns every problem found; an empty list means the document is usable.
pub fn validate_document(swagger: &Swagger, loader: &LoaderContext) -> Vec<Issue> {
    let mut errors = ErrorCollector::with_policy(FailurePolicy::Report);

    check_references(swagger, loader, &mut errors);

    for (name, node) in &swagger.definitions {
        check_schema(node, &format!("definitions.{}", name), &mut errors);
    }
    for (name, param) in &swagger.parameters {
        check_parameter(param, &format!("parameters.{}", name), &mut errors);
    }
    for (name, response) in &swagger.responses {
        check_response(response, &format!("responses.{}", name), &mut errors);
    }
    for (template, item) in &swagger.paths.items {
        check_path(swagger, template, item, &mut errors);
    }

    let issues = errors.conclude().unwrap_or_else(|tree| tree.issues());
    debug!(issues = issues.len(), "document checked");
    issues
}

/// Files `tree` under a dotted location.
fn nest(location: &str, tree: ErrorTree) -> ErrorTree {
    location
        .rsplit('.')
        .fold(tree, |acc, segment| ErrorTree::keyed(segment, acc))
}

fn report(errors: &mut ErrorCollector, location: &str, keyword: &str, message: String) {
    errors.add_tree(nest(location, ErrorTree::keyed_message(keyword, message)));
}

fn check_references(swagger: &Swagger, loader: &LoaderContext, errors: &mut ErrorCollector) {
    for (reference, locations) in &loader.deferred {
        let message = match parse_reference(reference) {
            Err(err) => err.to_string(),
            Ok(parsed) => {
                let found = match parsed.kind {
                    ReferenceKind::Definition => swagger
                        .definitions
                        .get(&parsed.name)
                        .and_then(|node| node.descend(&parsed.path))
                        .is_some(),
                    ReferenceKind::Parameter => swagger.parameters.contains_key(&parsed.name),
                    ReferenceKind::Response => swagger.responses.contains_key(&parsed.name),
                };
                if found {
                    continue;
                }
                messages::UNRESOLVED_REFERENCE.to_string()
            }
        };
        errors.add_at(
            "references",
            ErrorTree::keyed_message(
                reference.as_str(),
                format!("{} (used at {})", message, locations.join(", ")),
            ),
        );
    }
}

fn check_bounds<T: PartialOrd + std::fmt::Display>(
    errors: &mut ErrorCollector,
    location: &str,
    keyword: &str,
    min: Option<T>,
    max: Option<T>,
) {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            report(
                errors,
                location,
                keyword,
                format!("{} of {} exceeds the maximum of {}", keyword, min, max),
            );
        }
    }
}

fn check_number_bounds(node: &SchemaNode, location: &str, errors: &mut ErrorCollector) {
    let (Some(min), Some(max)) = (&node.minimum, &node.maximum) else {
        return;
    };
    if numeric::compare(min, max) == Some(Ordering::Greater) {
        report(
            errors,
            location,
            "minimum",
            format!("minimum of {} exceeds the maximum of {}", min, max),
        );
    }
}

fn check_schema(node: &SchemaNode, location: &str, errors: &mut ErrorCollector) {
    if let Some(pattern) = &node.pattern {
        if let Err(e) = Regex::new(pattern) {
            report(errors, location, "pattern", format!("Invalid pattern '{}': {}", pattern, e));
        }
    }

    for keyword in incompatible_keywords(node) {
        let types: Vec<&str> = node.declared_types().iter().map(|t| t.as_str()).collect();
        report(
            errors,
            location,
            keyword,
            format!("{} does not apply to type(s) {}", keyword, types.join(", ")),
        );
    }

    check_bounds(errors, location, "minLength", node.min_length, node.max_length);
    check_bounds(errors, location, "minItems", node.min_items, node.max_items);
    check_bounds(errors, location, "minProperties", node.min_properties, node.max_properties);
    check_number_bounds(node, location, errors);

    if let Some(divisor) = &node.multiple_of {
        if !numeric::is_positive(divisor) {
            report(
                errors,
                location,
                "multipleOf",
                format!("multipleOf must be greater than 0, got {}", divisor),
            );
        }
    }

    if let Some(branches) = &node.any_of {
        if branches.len() < 2 {
            report(
                errors,
                location,
                "anyOf",
                format!("anyOf needs at least two schemas, got {}", branches.len()),
            );
        }
    }

    if let Some(property) = &node.discriminator {
        let declared = node.properties.contains_key(property)
            || node.required_fields().iter().any(|f| f == property);
        if !declared {
            report(
                errors,
                location,
                "discriminator",
                format!("discriminator '{}' is not a declared property", property),
            );
        }
    }

    for (key, child) in node.children() {
        check_schema(child, &format!("{}.{}", location, key), errors);
    }
}

fn check_parameter(param: &Parameter, location: &str, errors: &mut ErrorCollector) {
    if param.location == ParameterLocation::Body && param.schema.is_none() {
        report(
            errors,
            location,
            "schema",
            format!("body parameter '{}' has no schema", param.name),
        );
    }
    check_schema(param.effective_schema(), location, errors);
}

fn check_response(response: &Response, location: &str, errors: &mut ErrorCollector) {
    if let Some(schema) = &response.schema {
        check_schema(schema, &format!("{}.schema", location), errors);
    }
    for (name, header) in &response.headers {
        check_schema(header, &format!("{}.headers.{}", location, name), errors);
    }
}

fn resolve_parameter<'a>(swagger: &'a Swagger, item: &'a RefOr<Parameter>) -> Option<&'a Parameter> {
    match item {
        RefOr::T(param) => Some(param),
        RefOr::Ref(r) => parse_reference(&r.ref_location)
            .ok()
            .filter(|parsed| parsed.kind == ReferenceKind::Parameter)
            .and_then(|parsed| swagger.parameters.get(&parsed.name)),
    }
}

fn check_path(swagger: &Swagger, template: &str, item: &PathItem, errors: &mut ErrorCollector) {
    let placeholders = template_parameters(template);
    let mut path_errors = ErrorCollector::new();

    for (idx, param) in item.parameters.iter().enumerate() {
        if let RefOr::T(param) = param {
            let mut inner = ErrorCollector::new();
            check_parameter(param, &format!("parameters.{}", idx), &mut inner);
            path_errors.merge(inner);
        }
    }

    for (method, op) in &item.operations {
        let mut op_errors = ErrorCollector::new();
        check_operation(op, &mut op_errors);

        let mut params: Vec<&Parameter> = Vec::new();
        for param in item.parameters.iter().chain(&op.parameters) {
            if let Some(param) = resolve_parameter(swagger, param) {
                params.retain(|p| !(p.name == param.name && p.location == param.location));
                params.push(param);
            }
        }

        for param in params.iter().filter(|p| p.location == ParameterLocation::Path) {
            if !placeholders.contains(&param.name) {
                op_errors.add_at(
                    "parameters",
                    ErrorTree::keyed_message(
                        param.name.as_str(),
                        format!("path parameter '{}' is not part of the template", param.name),
                    ),
                );
            }
        }
        for placeholder in &placeholders {
            let declared = params
                .iter()
                .any(|p| p.location == ParameterLocation::Path && &p.name == placeholder);
            if !declared {
                op_errors.add_at(
                    "parameters",
                    ErrorTree::keyed_message(
                        placeholder.as_str(),
                        format!("template parameter '{}' has no declaration", placeholder),
                    ),
                );
            }
        }

        if let Err(tree) = op_errors.finish() {
            path_errors.add_at(method.as_str(), tree);
        }
    }

    if let Err(tree) = path_errors.finish() {
        errors.add_at("paths", ErrorTree::keyed(template, tree));
    }
}

fn check_operation(op: &Operation, errors: &mut ErrorCollector) {
    for (idx, param) in op.parameters.iter().enumerate() {
        if let RefOr::T(param) = param {
            check_parameter(param, &format!("parameters.{}", idx), errors);
        }
    }
    for (status, response) in &op.responses {
        if let RefOr::T(response) = response {
            check_response(response, &format!("responses.{}", status), errors);
        }
    }
}
