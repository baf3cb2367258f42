#![deny(missing_docs)]

//! # Parameter Validators
//!
//! An operation's effective parameter list (path-level parameters overridden
//! by operation-level ones with the same name and location) compiled into
//! one validator per parameter, grouped by where the value is carried.
//! Non-body values are cast from their wire form before validation.

use crate::error::AppResult;
use crate::http::cast::cast_value;
use crate::http::Request;
use crate::messages;
use crate::report::{ErrorCollector, ErrorTree};
use crate::schema::context::ResolutionContext;
use crate::schema::document::{Parameter, ParameterLocation, RefOr};
use crate::schema::node::{CollectionFormat, SchemaNode};
use crate::validators::{build_schema_validator, ValidationContext, Validator};
use crate::value::{Instance, PrimitiveType};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::trace;

/// Resolves and merges path-level and operation-level parameters.
///
/// Operation parameters replace path parameters with the same name and
/// location; order is path-level first, then new operation-level ones.
pub fn merge_parameters<'a>(
    path_level: &'a [RefOr<Parameter>],
    operation_level: &'a [RefOr<Parameter>],
    resolution: &'a ResolutionContext,
) -> AppResult<Vec<&'a Parameter>> {
    let mut merged: Vec<&Parameter> = Vec::new();
    for item in path_level.iter().chain(operation_level) {
        let param = resolution.resolve_parameter(item)?;
        match merged
            .iter_mut()
            .find(|p| p.name == param.name && p.location == param.location)
        {
            Some(slot) => *slot = param,
            None => merged.push(param),
        }
    }
    Ok(merged)
}

/// One compiled parameter.
#[derive(Debug)]
pub struct ParameterValidator {
    name: String,
    required: bool,
    cast: bool,
    schema: SchemaNode,
    validator: Validator,
}

impl ParameterValidator {
    /// Compiles a parameter's effective schema.
    pub fn compile(param: &Parameter) -> AppResult<Self> {
        let schema = param.effective_schema().clone();
        Ok(Self {
            name: param.name.clone(),
            required: param.is_required(),
            cast: param.location != ParameterLocation::Body,
            validator: build_schema_validator(&schema)?,
            schema,
        })
    }

    /// Compiles a response header declaration. Headers are optional.
    pub fn header(name: &str, schema: &SchemaNode) -> AppResult<Self> {
        Ok(Self {
            name: name.to_string(),
            required: false,
            cast: true,
            schema: schema.clone(),
            validator: build_schema_validator(schema)?,
        })
    }

    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn is_multi(&self) -> bool {
        self.schema.declared_types().first() == Some(&PrimitiveType::Array)
            && self.schema.collection_format == Some(CollectionFormat::Multi)
    }

    /// Validates the raw value (or its absence).
    pub fn validate(&self, raw: Option<&Value>, ctx: &ValidationContext<'_>) -> Result<(), ErrorTree> {
        let Some(raw) = raw else {
            if self.required {
                return Err(ErrorTree::keyed_message("required", messages::REQUIRED));
            }
            return Ok(());
        };
        if self.cast {
            let cast = cast_value(raw, &self.schema);
            trace!(parameter = %self.name, raw = %raw, cast = %cast, "cast parameter");
            self.validator.validate(Instance::Present(&cast), ctx)
        } else {
            self.validator.validate(Instance::Present(raw), ctx)
        }
    }
}

/// The compiled parameters of one operation, by location.
#[derive(Debug, Default)]
pub struct ParameterSet {
    path: Vec<ParameterValidator>,
    query: Vec<ParameterValidator>,
    headers: Vec<ParameterValidator>,
    body: Option<ParameterValidator>,
}

impl ParameterSet {
    /// Compiles merged parameters. `formData` parameters are accepted without
    /// validation.
    pub fn compile(parameters: &[&Parameter]) -> AppResult<Self> {
        let mut set = ParameterSet::default();
        for param in parameters {
            match param.location {
                ParameterLocation::Path => set.path.push(ParameterValidator::compile(param)?),
                ParameterLocation::Query => set.query.push(ParameterValidator::compile(param)?),
                ParameterLocation::Header => set.headers.push(ParameterValidator::compile(param)?),
                ParameterLocation::Body => set.body = Some(ParameterValidator::compile(param)?),
                ParameterLocation::FormData => {}
            }
        }
        Ok(set)
    }

    /// Validates every parameter of `request`. Failures are keyed
    /// `<location>.<name>.<keyword>`; each location is checked independently.
    pub fn validate(
        &self,
        path_values: &IndexMap<String, String>,
        request: &Request,
        ctx: &ValidationContext<'_>,
    ) -> Result<(), ErrorTree> {
        let mut errors = ErrorCollector::new();

        errors.scoped(ParameterLocation::Path.error_key(), |scope| {
            for param in &self.path {
                let raw = path_values.get(param.name()).cloned().map(Value::String);
                scope.record_at(param.name(), param.validate(raw.as_ref(), ctx));
            }
        });

        errors.scoped(ParameterLocation::Query.error_key(), |scope| {
            for param in &self.query {
                let raw = query_value(param, request);
                scope.record_at(param.name(), param.validate(raw.as_ref(), ctx));
            }
        });

        errors.scoped(ParameterLocation::Header.error_key(), |scope| {
            for param in &self.headers {
                let raw = request.header(param.name()).map(|v| Value::String(v.to_string()));
                scope.record_at(param.name(), param.validate(raw.as_ref(), ctx));
            }
        });

        if let Some(param) = &self.body {
            errors.scoped(ParameterLocation::Body.error_key(), |scope| {
                scope.record_at(param.name(), param.validate(request.body.as_ref(), ctx));
            });
        }

        errors.finish()
    }
}

/// Repeated keys become a list for `multi` arrays; otherwise the first value
/// is used.
fn query_value(param: &ParameterValidator, request: &Request) -> Option<Value> {
    let values = request.query.get(param.name())?;
    if param.is_multi() {
        return Some(Value::Array(
            values.iter().cloned().map(Value::String).collect(),
        ));
    }
    values.first().cloned().map(Value::String)
}

/// Compiled response header declarations.
#[derive(Debug, Default)]
pub struct HeaderSet {
    headers: Vec<ParameterValidator>,
}

impl HeaderSet {
    /// Compiles declared response headers.
    pub fn compile(headers: &IndexMap<String, SchemaNode>) -> AppResult<Self> {
        let headers = headers
            .iter()
            .map(|(name, schema)| ParameterValidator::header(name, schema))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Self { headers })
    }

    /// Validates the headers present in `lookup`, keyed by header name.
    pub fn validate<'h, F>(&self, lookup: F, ctx: &ValidationContext<'_>) -> Result<(), ErrorTree>
    where
        F: Fn(&str) -> Option<&'h str>,
    {
        let mut errors = ErrorCollector::new();
        for header in &self.headers {
            let raw = lookup(header.name()).map(|v| Value::String(v.to_string()));
            errors.record_at(header.name(), header.validate(raw.as_ref(), ctx));
        }
        errors.finish()
    }
}
