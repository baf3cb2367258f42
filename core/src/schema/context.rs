#![deny(missing_docs)]

//! # Resolution Context
//!
//! The read-only tables needed while building and running validators:
//! definitions, named parameters, named responses and security schemes.
//! Built once from a loaded document and shared behind an `Arc`.

use crate::error::{AppError, AppResult};
use crate::messages;
use crate::schema::document::{Parameter, RefOr, Response, Swagger};
use crate::schema::node::SchemaNode;
use crate::schema::refs::{parse_reference, ParsedReference, ReferenceKind};
use indexmap::IndexMap;
use serde_json::Value;

/// Where a schema `$ref` lands: a definition and a pointer path inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaTarget {
    /// Index into the definitions arena.
    pub definition: usize,
    /// Segments walked below the definition; empty for the definition itself.
    pub path: Vec<String>,
}

impl SchemaTarget {
    /// A whole definition.
    pub fn definition(index: usize) -> Self {
        Self {
            definition: index,
            path: Vec::new(),
        }
    }
}

/// Tables `$ref`s resolve against.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    /// Schema definitions by name.
    pub definitions: IndexMap<String, SchemaNode>,
    /// Named parameters.
    pub parameters: IndexMap<String, Parameter>,
    /// Named responses.
    pub responses: IndexMap<String, Response>,
    /// Security schemes (not interpreted).
    pub security_definitions: IndexMap<String, Value>,
}

impl ResolutionContext {
    /// A context holding only a definitions table.
    pub fn with_definitions(definitions: IndexMap<String, SchemaNode>) -> Self {
        Self {
            definitions,
            ..Self::default()
        }
    }

    /// Copies the named tables out of a document.
    pub fn from_swagger(swagger: &Swagger) -> Self {
        Self {
            definitions: swagger.definitions.clone(),
            parameters: swagger.parameters.clone(),
            responses: swagger.responses.clone(),
            security_definitions: swagger.security_definitions.clone(),
        }
    }

    /// True when the table for `reference.kind` has an entry named
    /// `reference.name` and, for definitions, the pointer path exists in it.
    pub fn contains(&self, reference: &ParsedReference) -> bool {
        match reference.kind {
            ReferenceKind::Definition => self
                .definitions
                .get(&reference.name)
                .and_then(|node| node.descend(&reference.path))
                .is_some(),
            ReferenceKind::Parameter => self.parameters.contains_key(&reference.name),
            ReferenceKind::Response => self.responses.contains_key(&reference.name),
        }
    }

    /// Index of a definition in the definitions arena.
    pub fn definition_index(&self, name: &str) -> Option<usize> {
        self.definitions.get_index_of(name)
    }

    /// Definition by arena index.
    pub fn definition_at(&self, index: usize) -> Option<(&String, &SchemaNode)> {
        self.definitions.get_index(index)
    }

    /// The schema a target points at, with its definition's name.
    pub fn schema_at(&self, target: &SchemaTarget) -> Option<(&String, &SchemaNode)> {
        let (name, node) = self.definition_at(target.definition)?;
        Some((name, node.descend(&target.path)?))
    }

    /// Resolves a schema `$ref` to the definition, or the schema inside a
    /// definition, it points at.
    pub fn resolve_schema(&self, ref_str: &str) -> AppResult<(SchemaTarget, &SchemaNode)> {
        let parsed = parse_reference(ref_str)?;
        if parsed.kind != ReferenceKind::Definition {
            return Err(AppError::Reference(format!(
                "Schema reference '{}' must point into 'definitions'",
                ref_str
            )));
        }
        let (index, _, definition) = self
            .definitions
            .get_full(&parsed.name)
            .ok_or_else(|| unresolved(ref_str))?;
        let node = definition
            .descend(&parsed.path)
            .ok_or_else(|| unresolved(ref_str))?;
        let target = SchemaTarget {
            definition: index,
            path: parsed.path,
        };
        Ok((target, node))
    }

    /// Resolves a parameter, following a `#/parameters/...` reference.
    pub fn resolve_parameter<'a>(&'a self, item: &'a RefOr<Parameter>) -> AppResult<&'a Parameter> {
        match item {
            RefOr::T(param) => Ok(param),
            RefOr::Ref(r) => {
                let parsed = expect_kind(&r.ref_location, ReferenceKind::Parameter)?;
                self.parameters
                    .get(&parsed.name)
                    .ok_or_else(|| unresolved(&r.ref_location))
            }
        }
    }

    /// Resolves a response, following a `#/responses/...` reference.
    pub fn resolve_response<'a>(&'a self, item: &'a RefOr<Response>) -> AppResult<&'a Response> {
        match item {
            RefOr::T(response) => Ok(response),
            RefOr::Ref(r) => {
                let parsed = expect_kind(&r.ref_location, ReferenceKind::Response)?;
                self.responses
                    .get(&parsed.name)
                    .ok_or_else(|| unresolved(&r.ref_location))
            }
        }
    }
}

fn expect_kind(ref_str: &str, kind: ReferenceKind) -> AppResult<ParsedReference> {
    let parsed = parse_reference(ref_str)?;
    if parsed.kind != kind {
        return Err(AppError::Reference(format!(
            "Reference '{}' must point into '{}'",
            ref_str,
            kind.section()
        )));
    }
    Ok(parsed)
}

fn unresolved(ref_str: &str) -> AppError {
    AppError::Reference(format!("{} '{}'", messages::UNRESOLVED_REFERENCE, ref_str))
}
