#![deny(missing_docs)]

//! # Structural Validators
//!
//! Validators that descend into containers: `properties`, both forms of
//! `required`, `items` and `additionalProperties`. Failures of nested values
//! are filed under the property name or the element index.

use crate::messages;
use crate::report::{ErrorCollector, ErrorTree};
use crate::validators::{Validate, ValidationContext, Validator};
use crate::value::Instance;
use std::collections::HashSet;

/// Validates each declared property. Missing keys are passed on as
/// [`Instance::Absent`], which only `required` reacts to.
#[derive(Debug)]
pub struct PropertiesValidator {
    properties: Vec<(String, Validator)>,
}

impl PropertiesValidator {
    /// Wraps per-property validators, in declaration order.
    pub fn new(properties: Vec<(String, Validator)>) -> Self {
        Self { properties }
    }
}

impl Validate for PropertiesValidator {
    fn validate(
        &self,
        instance: Instance<'_>,
        ctx: &ValidationContext<'_>,
    ) -> Result<(), ErrorTree> {
        let Some(map) = instance.value().and_then(|v| v.as_object()) else {
            return Ok(());
        };
        let mut errors = ErrorCollector::new();
        for (name, validator) in &self.properties {
            let field = Instance::from_option(map.get(name));
            errors.record_at(name.as_str(), validator.validate(field, ctx));
        }
        errors.finish()
    }
}

/// Object-level `required: [a, b]`.
#[derive(Debug)]
pub struct RequiredFields {
    fields: Vec<String>,
}

impl RequiredFields {
    /// Requires every name in `fields`.
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }
}

impl Validate for RequiredFields {
    fn validate(
        &self,
        instance: Instance<'_>,
        _ctx: &ValidationContext<'_>,
    ) -> Result<(), ErrorTree> {
        let Some(map) = instance.value().and_then(|v| v.as_object()) else {
            return Ok(());
        };
        let mut errors = ErrorCollector::new();
        for field in &self.fields {
            if !map.contains_key(field) {
                errors.add_at(
                    field.as_str(),
                    ErrorTree::keyed_message("required", messages::REQUIRED),
                );
            }
        }
        errors.finish()
    }
}

/// Property- or parameter-level `required: true`.
#[derive(Debug, Default)]
pub struct RequiredFlag;

impl Validate for RequiredFlag {
    fn validate(
        &self,
        instance: Instance<'_>,
        _ctx: &ValidationContext<'_>,
    ) -> Result<(), ErrorTree> {
        if instance.is_absent() {
            Err(ErrorTree::keyed_message("required", messages::REQUIRED))
        } else {
            Ok(())
        }
    }
}

/// `items`.
#[derive(Debug)]
pub enum ItemsValidator {
    /// Every element.
    Single(Validator),
    /// Element *i* against validator *i*; extra elements pass.
    Tuple(Vec<Validator>),
}

impl Validate for ItemsValidator {
    fn validate(
        &self,
        instance: Instance<'_>,
        ctx: &ValidationContext<'_>,
    ) -> Result<(), ErrorTree> {
        let Some(items) = instance.value().and_then(|v| v.as_array()) else {
            return Ok(());
        };
        let mut errors = ErrorCollector::new();
        match self {
            ItemsValidator::Single(validator) => {
                for (idx, item) in items.iter().enumerate() {
                    errors.record_at(idx.to_string(), validator.validate(item.into(), ctx));
                }
            }
            ItemsValidator::Tuple(validators) => {
                for (idx, (item, validator)) in items.iter().zip(validators).enumerate() {
                    errors.record_at(idx.to_string(), validator.validate(item.into(), ctx));
                }
            }
        }
        errors.finish()
    }
}

/// What happens to keys not listed in `properties`.
#[derive(Debug)]
pub enum Undeclared {
    /// `additionalProperties: false`.
    Forbidden,
    /// `additionalProperties: {schema}`.
    Schema(Validator),
}

/// `additionalProperties`.
#[derive(Debug)]
pub struct AdditionalPropertiesValidator {
    declared: HashSet<String>,
    undeclared: Undeclared,
}

impl AdditionalPropertiesValidator {
    /// Judges keys outside `declared` according to `undeclared`.
    pub fn new(declared: impl IntoIterator<Item = String>, undeclared: Undeclared) -> Self {
        Self {
            declared: declared.into_iter().collect(),
            undeclared,
        }
    }
}

impl Validate for AdditionalPropertiesValidator {
    fn validate(
        &self,
        instance: Instance<'_>,
        ctx: &ValidationContext<'_>,
    ) -> Result<(), ErrorTree> {
        let Some(map) = instance.value().and_then(|v| v.as_object()) else {
            return Ok(());
        };
        let mut errors = ErrorCollector::new();
        for (key, value) in map.iter().filter(|(k, _)| !self.declared.contains(*k)) {
            match &self.undeclared {
                Undeclared::Forbidden => errors.add_at(
                    key.as_str(),
                    ErrorTree::keyed_message("additionalProperties", messages::ADDITIONAL_PROPERTY),
                ),
                Undeclared::Schema(validator) => {
                    errors.record_at(key.as_str(), validator.validate(value.into(), ctx))
                }
            }
        }
        errors.finish()
    }
}
