#![deny(missing_docs)]

//! # Schema Validator Builder
//!
//! Turns a [`SchemaNode`] into one validator. The pieces are layered in a
//! fixed order and all of them run on every value:
//!
//! 1. `$ref` (lazy), with any sibling keywords applied on top
//! 2. `discriminator`
//! 3. keyword validators, in table order
//! 4. `required` (flag and list forms)
//! 5. `properties`, `additionalProperties`, `items`
//! 6. `allOf`, `anyOf`

use crate::error::AppResult;
use crate::messages;
use crate::report::ErrorTree;
use crate::schema::context::ResolutionContext;
use crate::schema::node::{AdditionalProperties, Items, SchemaNode};
use crate::validators::combinators::{AllOf, AnyOf};
use crate::validators::keywords::build_keywords;
use crate::validators::reference::{DiscriminatorValidator, LazyReference};
use crate::validators::structure::{
    AdditionalPropertiesValidator, ItemsValidator, PropertiesValidator, RequiredFields,
    RequiredFlag, Undeclared,
};
use crate::validators::{ValidationContext, Validator, ValidatorChain};
use crate::value::Instance;
use serde_json::Value;
use tracing::error;

/// Builds the validator for `node`.
///
/// Fails with [`AppError::Schema`](crate::AppError::Schema) for malformed
/// keywords (bad `pattern`, non-positive `multipleOf`) and with
/// [`AppError::Contract`](crate::AppError::Contract) for an `anyOf` with
/// fewer than two branches. `$ref`s are not looked at until validation.
pub fn build_schema_validator(node: &SchemaNode) -> AppResult<Validator> {
    let mut chain = ValidatorChain::new();

    if let Some(reference) = &node.reference {
        chain.push(Box::new(LazyReference::new(reference.clone())));
    }
    if let Some(property) = &node.discriminator {
        chain.push(Box::new(DiscriminatorValidator::new(property.clone())));
    }

    for keyword in build_keywords(node)? {
        chain.push(Box::new(keyword));
    }

    if node.is_required_flag() {
        chain.push(Box::new(RequiredFlag));
    }
    let required = node.required_fields();
    if !required.is_empty() {
        chain.push(Box::new(RequiredFields::new(required.to_vec())));
    }

    if !node.properties.is_empty() {
        let mut properties = Vec::with_capacity(node.properties.len());
        for (name, child) in &node.properties {
            properties.push((name.clone(), build_schema_validator(child)?));
        }
        chain.push(Box::new(PropertiesValidator::new(properties)));
    }

    match &node.additional_properties {
        Some(AdditionalProperties::Allowed(false)) => {
            chain.push(Box::new(AdditionalPropertiesValidator::new(
                node.properties.keys().cloned(),
                Undeclared::Forbidden,
            )));
        }
        Some(AdditionalProperties::Schema(child)) => {
            chain.push(Box::new(AdditionalPropertiesValidator::new(
                node.properties.keys().cloned(),
                Undeclared::Schema(build_schema_validator(child)?),
            )));
        }
        Some(AdditionalProperties::Allowed(true)) | None => {}
    }

    match &node.items {
        Some(Items::Single(child)) => {
            chain.push(Box::new(ItemsValidator::Single(build_schema_validator(
                child,
            )?)));
        }
        Some(Items::Tuple(children)) => {
            chain.push(Box::new(ItemsValidator::Tuple(build_all(children)?)));
        }
        None => {}
    }

    if let Some(branches) = &node.all_of {
        chain.push(Box::new(AllOf::new(build_all(branches)?)));
    }
    if let Some(branches) = &node.any_of {
        chain.push(Box::new(AnyOf::new(build_all(branches)?)?));
    }

    Ok(chain.into_validator())
}

fn build_all(nodes: &[SchemaNode]) -> AppResult<Vec<Validator>> {
    nodes.iter().map(build_schema_validator).collect()
}

/// A compiled schema, ready to validate values.
///
/// Immutable and `Send + Sync`; share it behind an `Arc` and validate from
/// as many threads as needed.
#[derive(Debug)]
pub struct SchemaValidator {
    validator: Validator,
}

impl SchemaValidator {
    /// Compiles `node`.
    pub fn compile(node: &SchemaNode) -> AppResult<Self> {
        Ok(Self {
            validator: build_schema_validator(node)?,
        })
    }

    /// Validates a present value.
    pub fn validate(&self, value: &Value, resolution: &ResolutionContext) -> Result<(), ErrorTree> {
        self.validate_instance(Instance::Present(value), resolution)
    }

    /// Validates a possibly absent value.
    pub fn validate_instance(
        &self,
        instance: Instance<'_>,
        resolution: &ResolutionContext,
    ) -> Result<(), ErrorTree> {
        let ctx = ValidationContext::new(resolution);
        self.validator.validate(instance, &ctx)
    }
}

/// Validates `value` against `node`, resolving `$ref`s against `resolution`.
///
/// A node that cannot be compiled is reported as a failure carrying
/// [`messages::INVALID_SCHEMA`]; use [`SchemaValidator::compile`] to get the
/// build error itself.
pub fn validate_value_against_schema(
    value: &Value,
    node: &SchemaNode,
    resolution: &ResolutionContext,
) -> Result<(), ErrorTree> {
    match SchemaValidator::compile(node) {
        Ok(validator) => validator.validate(value, resolution),
        Err(err) => {
            error!(error = %err, "schema could not be compiled");
            Err(ErrorTree::message(format!(
                "{}: {}",
                messages::INVALID_SCHEMA,
                err
            )))
        }
    }
}
