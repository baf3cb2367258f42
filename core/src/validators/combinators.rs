#![deny(missing_docs)]

//! # Combinators
//!
//! `allOf` and `anyOf`. Every branch is always evaluated, so a failure report
//! carries the errors of each failing branch, in branch order.

use crate::error::{AppError, AppResult};
use crate::report::ErrorTree;
use crate::validators::{Validate, ValidationContext, Validator};
use crate::value::Instance;

fn run_branches(
    branches: &[Validator],
    instance: Instance<'_>,
    ctx: &ValidationContext<'_>,
) -> (usize, Vec<ErrorTree>) {
    let mut passed = 0;
    let mut failures = Vec::new();
    for branch in branches {
        match branch.validate(instance, ctx) {
            Ok(()) => passed += 1,
            Err(tree) => failures.push(tree),
        }
    }
    (passed, failures)
}

/// Every branch must pass.
#[derive(Debug)]
pub struct AllOf {
    branches: Vec<Validator>,
}

impl AllOf {
    /// Wraps the branch validators.
    pub fn new(branches: Vec<Validator>) -> Self {
        Self { branches }
    }
}

impl Validate for AllOf {
    fn validate(
        &self,
        instance: Instance<'_>,
        ctx: &ValidationContext<'_>,
    ) -> Result<(), ErrorTree> {
        let (_, failures) = run_branches(&self.branches, instance, ctx);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ErrorTree::keyed("allOf", ErrorTree::List(failures)))
        }
    }
}

/// At least one branch must pass.
#[derive(Debug)]
pub struct AnyOf {
    branches: Vec<Validator>,
}

impl AnyOf {
    /// Wraps the branch validators. Fewer than two branches is a misuse.
    pub fn new(branches: Vec<Validator>) -> AppResult<Self> {
        if branches.len() < 2 {
            return Err(AppError::Contract(format!(
                "anyOf needs at least two schemas, got {}",
                branches.len()
            )));
        }
        Ok(Self { branches })
    }
}

impl Validate for AnyOf {
    fn validate(
        &self,
        instance: Instance<'_>,
        ctx: &ValidationContext<'_>,
    ) -> Result<(), ErrorTree> {
        let (passed, failures) = run_branches(&self.branches, instance, ctx);
        if passed > 0 {
            Ok(())
        } else {
            Err(ErrorTree::keyed("anyOf", ErrorTree::List(failures)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::context::ResolutionContext;
    use crate::validators::keywords::Keyword;
    use crate::value::PrimitiveType;
    use serde_json::json;

    fn of_type(ty: PrimitiveType) -> Validator {
        Box::new(Keyword::Type {
            types: vec![ty],
            nullable: false,
        })
    }

    #[test]
    fn test_all_of_reports_each_failing_branch() {
        let resolution = ResolutionContext::default();
        let ctx = ValidationContext::new(&resolution);
        let all = AllOf::new(vec![
            of_type(PrimitiveType::String),
            Box::new(Keyword::MinLength(3)),
            Box::new(Keyword::MaxLength(1)),
        ]);

        let value = json!("ab");
        let err = all.validate(Instance::from(&value), &ctx).unwrap_err();
        let Some(ErrorTree::List(branches)) = err.get("allOf") else {
            panic!("expected a branch list, got {err:?}");
        };
        assert_eq!(branches.len(), 2);
        assert!(err.contains("allOf.minLength"));
        assert!(err.contains("allOf.maxLength"));
    }

    #[test]
    fn test_any_of_needs_one_branch() {
        let resolution = ResolutionContext::default();
        let ctx = ValidationContext::new(&resolution);
        let any = AnyOf::new(vec![
            of_type(PrimitiveType::String),
            of_type(PrimitiveType::Integer),
        ])
        .unwrap();

        let text = json!("x");
        let number = json!(4);
        let flag = json!(true);
        assert!(any.validate(Instance::from(&text), &ctx).is_ok());
        assert!(any.validate(Instance::from(&number), &ctx).is_ok());

        let err = any.validate(Instance::from(&flag), &ctx).unwrap_err();
        let Some(ErrorTree::List(branches)) = err.get("anyOf") else {
            panic!("expected a branch list, got {err:?}");
        };
        assert_eq!(branches.len(), 2);
    }

    #[test]
    fn test_any_of_with_one_branch_is_contract_error() {
        let err = AnyOf::new(vec![of_type(PrimitiveType::String)]).unwrap_err();
        assert!(matches!(err, AppError::Contract(_)));
    }
}
