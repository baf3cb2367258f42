#![deny(missing_docs)]

//! # Validators
//!
//! The validation engine. A schema node is turned into a tree of boxed
//! [`Validate`] trait objects by [`build_schema_validator`]; running that tree
//! against a value needs a [`ValidationContext`], which owns everything that
//! is per call: the lazily built `$ref` targets and the set of references
//! currently being evaluated on a given value.
//!
//! Compiled validators are immutable and `Send + Sync`, so one tree can be
//! shared behind an `Arc` and used from many threads; each call brings its own
//! context.

use crate::messages;
use crate::report::{ErrorCollector, ErrorTree};
use crate::schema::context::{ResolutionContext, SchemaTarget};
use crate::value::Instance;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use tracing::{error, trace};

/// Builder entry points.
pub mod builder;
/// `allOf` / `anyOf`.
pub mod combinators;
/// Format checkers.
pub mod format;
/// Keyword validators and the applicability table.
pub mod keywords;
/// Exact decimal arithmetic.
pub mod numeric;
/// Lazy `$ref` and discriminator validators.
pub mod reference;
/// `properties`, `required`, `items`, `additionalProperties`.
pub mod structure;

pub use builder::{build_schema_validator, validate_value_against_schema};

/// Something that checks a value.
pub trait Validate: fmt::Debug + Send + Sync {
    /// Checks `instance`, returning every failure found.
    fn validate(&self, instance: Instance<'_>, ctx: &ValidationContext<'_>)
        -> Result<(), ErrorTree>;
}

/// A boxed validator.
pub type Validator = Box<dyn Validate>;

/// Runs every validator and concatenates their failures.
#[derive(Debug, Default)]
pub struct ValidatorChain {
    validators: Vec<Validator>,
}

impl ValidatorChain {
    /// An empty chain; accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a validator.
    pub fn push(&mut self, validator: Validator) {
        self.validators.push(validator);
    }

    /// Number of validators in the chain.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// True when the chain accepts everything.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Collapses a one-element chain into its element.
    pub fn into_validator(mut self) -> Validator {
        if self.validators.len() == 1 {
            if let Some(only) = self.validators.pop() {
                return only;
            }
        }
        Box::new(self)
    }
}

impl Validate for ValidatorChain {
    fn validate(
        &self,
        instance: Instance<'_>,
        ctx: &ValidationContext<'_>,
    ) -> Result<(), ErrorTree> {
        let mut errors = ErrorCollector::new();
        for validator in &self.validators {
            errors.record(validator.validate(instance, ctx));
        }
        errors.finish()
    }
}

/// Per-call state for one validation.
///
/// Holds the resolution tables by reference, a cache of reference target
/// validators built during this call, and the `(target, value)` pairs
/// currently being evaluated. Re-entering a definition on the very same value
/// is treated as satisfied, which is what stops discriminator and `allOf`
/// loops; recursion over distinct values is bounded by the depth of the data.
pub struct ValidationContext<'a> {
    resolution: &'a ResolutionContext,
    built: RefCell<HashMap<SchemaTarget, Rc<dyn Validate>>>,
    active: RefCell<HashSet<(SchemaTarget, usize)>>,
}

impl<'a> ValidationContext<'a> {
    /// A fresh context over `resolution`.
    pub fn new(resolution: &'a ResolutionContext) -> Self {
        Self {
            resolution,
            built: RefCell::new(HashMap::new()),
            active: RefCell::new(HashSet::new()),
        }
    }

    /// The tables references resolve against.
    pub fn resolution(&self) -> &'a ResolutionContext {
        self.resolution
    }

    /// Number of reference targets built so far in this call.
    pub fn built_count(&self) -> usize {
        self.built.borrow().len()
    }

    /// Validates `instance` against the schema `target` points at, building
    /// that schema's validator on first use.
    pub(crate) fn validate_definition(
        &self,
        target: &SchemaTarget,
        instance: Instance<'_>,
    ) -> Result<(), ErrorTree> {
        let key = (target.clone(), instance.identity());
        if !self.active.borrow_mut().insert(key.clone()) {
            trace!(definition = target.definition, "re-entered definition on the same value");
            return Ok(());
        }

        let result = self
            .definition_validator(target)
            .and_then(|validator| validator.validate(instance, self));

        self.active.borrow_mut().remove(&key);
        result
    }

    fn definition_validator(&self, target: &SchemaTarget) -> Result<Rc<dyn Validate>, ErrorTree> {
        if let Some(validator) = self.built.borrow().get(target) {
            return Ok(Rc::clone(validator));
        }

        let Some((name, node)) = self.resolution.schema_at(target) else {
            return Err(ErrorTree::message(messages::UNRESOLVED_REFERENCE));
        };

        trace!(definition = %name, "building definition validator");
        let validator: Rc<dyn Validate> = match build_schema_validator(node) {
            Ok(v) => Rc::from(v),
            Err(err) => {
                error!(definition = %name, error = %err, "definition could not be built");
                return Err(ErrorTree::message(format!(
                    "{} ('{}'): {}",
                    messages::INVALID_SCHEMA,
                    name,
                    err
                )));
            }
        };

        self.built
            .borrow_mut()
            .insert(target.clone(), Rc::clone(&validator));
        Ok(validator)
    }
}

impl fmt::Debug for ValidationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("built", &self.built.borrow().len())
            .field("active", &self.active.borrow().len())
            .finish()
    }
}
