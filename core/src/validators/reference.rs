#![deny(missing_docs)]

//! # Reference Validators
//!
//! `$ref` and `discriminator` both end up validating a value against a named
//! definition, or for `$ref`, a schema nested inside one. Neither resolves anything when it is built: the definition is
//! looked up and compiled through the [`ValidationContext`] the first time a
//! value reaches it, and reused for the rest of that call.

use crate::messages;
use crate::report::ErrorTree;
use crate::schema::context::SchemaTarget;
use crate::validators::{Validate, ValidationContext};
use crate::value::Instance;
use serde_json::Value;
use tracing::{error, trace};

/// A `$ref` to a definition or a schema inside one, resolved on first use.
#[derive(Debug, Clone)]
pub struct LazyReference {
    reference: String,
}

impl LazyReference {
    /// Wraps a `$ref` string. Nothing is resolved yet.
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }

    /// The wrapped pointer.
    pub fn reference(&self) -> &str {
        &self.reference
    }
}

impl Validate for LazyReference {
    fn validate(
        &self,
        instance: Instance<'_>,
        ctx: &ValidationContext<'_>,
    ) -> Result<(), ErrorTree> {
        if instance.is_absent() {
            return Ok(());
        }
        match ctx.resolution().resolve_schema(&self.reference) {
            Ok((target, _)) => {
                trace!(reference = %self.reference, "following reference");
                ctx.validate_definition(&target, instance)
            }
            Err(err) => {
                error!(reference = %self.reference, error = %err, "reference failed to resolve");
                Err(ErrorTree::keyed_message("$ref", err.to_string()))
            }
        }
    }
}

/// Polymorphic dispatch on a property naming the concrete definition.
#[derive(Debug, Clone)]
pub struct DiscriminatorValidator {
    property: String,
}

impl DiscriminatorValidator {
    /// Dispatches on the value of `property`.
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
        }
    }
}

impl Validate for DiscriminatorValidator {
    fn validate(
        &self,
        instance: Instance<'_>,
        ctx: &ValidationContext<'_>,
    ) -> Result<(), ErrorTree> {
        let Some(map) = instance.value().and_then(|v| v.as_object()) else {
            return Ok(());
        };

        let name = match map.get(&self.property) {
            None => {
                return Err(ErrorTree::keyed_message(
                    "discriminator",
                    format!("{} ('{}')", messages::DISCRIMINATOR_MISSING, self.property),
                ))
            }
            Some(Value::String(name)) => name,
            Some(other) => {
                return Err(ErrorTree::keyed_message(
                    "discriminator",
                    format!("{}: {}", messages::DISCRIMINATOR_UNKNOWN, other),
                ))
            }
        };

        match ctx.resolution().definition_index(name) {
            Some(index) => {
                trace!(property = %self.property, subtype = %name, "dispatching on discriminator");
                ctx.validate_definition(&SchemaTarget::definition(index), instance)
            }
            None => Err(ErrorTree::keyed_message(
                "discriminator",
                format!("{}: '{}'", messages::DISCRIMINATOR_UNKNOWN, name),
            )),
        }
    }
}
