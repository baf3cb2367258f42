#![deny(missing_docs)]

//! # Keyword Validators
//!
//! One [`Keyword`] per constraint keyword, plus [`KEYWORD_TABLE`], the static
//! map from keyword name to the primitive types it constrains and the
//! function that builds it from a schema node.
//!
//! Every keyword accepts an absent value and any value outside its
//! applicable types; it only ever reports on values it is meant to judge.

use crate::error::{AppError, AppResult};
use crate::report::ErrorTree;
use crate::schema::node::SchemaNode;
use crate::validators::format::{self, FormatChecker};
use crate::validators::numeric;
use crate::validators::{Validate, ValidationContext};
use crate::value::{canonical_form, Instance, PrimitiveType};
use regex::Regex;
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::collections::HashSet;

const ANY: &[PrimitiveType] = &[];
const NUMERIC: &[PrimitiveType] = &[PrimitiveType::Integer, PrimitiveType::Number];
const STRING: &[PrimitiveType] = &[PrimitiveType::String];
const ARRAY: &[PrimitiveType] = &[PrimitiveType::Array];
const OBJECT: &[PrimitiveType] = &[PrimitiveType::Object];

/// A single compiled constraint.
#[derive(Debug, Clone)]
pub enum Keyword {
    /// `type`, with `x-nullable` folded in.
    Type {
        /// Accepted types.
        types: Vec<PrimitiveType>,
        /// Whether `null` is accepted as well.
        nullable: bool,
    },
    /// `minimum` / `exclusiveMinimum`.
    Minimum {
        /// Lower bound.
        limit: Number,
        /// Whether the bound itself is rejected.
        exclusive: bool,
    },
    /// `maximum` / `exclusiveMaximum`.
    Maximum {
        /// Upper bound.
        limit: Number,
        /// Whether the bound itself is rejected.
        exclusive: bool,
    },
    /// `multipleOf`.
    MultipleOf(Number),
    /// `minLength`.
    MinLength(u64),
    /// `maxLength`.
    MaxLength(u64),
    /// `pattern`, compiled once.
    Pattern(Regex),
    /// `minItems`.
    MinItems(u64),
    /// `maxItems`.
    MaxItems(u64),
    /// `uniqueItems: true`.
    UniqueItems,
    /// `enum`.
    Enum(Vec<Value>),
    /// `minProperties`.
    MinProperties(u64),
    /// `maxProperties`.
    MaxProperties(u64),
    /// A known `format`.
    Format(&'static FormatChecker),
}

impl Keyword {
    /// The keyword name, used as the error key.
    pub fn name(&self) -> &'static str {
        match self {
            Keyword::Type { .. } => "type",
            Keyword::Minimum { .. } => "minimum",
            Keyword::Maximum { .. } => "maximum",
            Keyword::MultipleOf(_) => "multipleOf",
            Keyword::MinLength(_) => "minLength",
            Keyword::MaxLength(_) => "maxLength",
            Keyword::Pattern(_) => "pattern",
            Keyword::MinItems(_) => "minItems",
            Keyword::MaxItems(_) => "maxItems",
            Keyword::UniqueItems => "uniqueItems",
            Keyword::Enum(_) => "enum",
            Keyword::MinProperties(_) => "minProperties",
            Keyword::MaxProperties(_) => "maxProperties",
            Keyword::Format(_) => "format",
        }
    }

    /// Types this keyword judges. Empty means every type.
    pub fn applies_to(&self) -> &'static [PrimitiveType] {
        match self {
            Keyword::Format(checker) => checker.carriers,
            other => rule(other.name()).map_or(ANY, |r| r.applies_to),
        }
    }

    fn applies(&self, value: &Value) -> bool {
        let types = self.applies_to();
        types.is_empty() || types.iter().any(|ty| ty.matches(value))
    }

    /// Checks a present value of an applicable type.
    fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            Keyword::Type { types, nullable } => {
                if value.is_null() && *nullable {
                    return Ok(());
                }
                if types.iter().any(|ty| ty.matches(value)) {
                    return Ok(());
                }
                let names: Vec<&str> = types.iter().map(|ty| ty.as_str()).collect();
                Err(format!(
                    "Got value `{}` of type `{}`. Value must be of type(s): `{}`",
                    value,
                    PrimitiveType::of(value),
                    names.join(", ")
                ))
            }
            Keyword::Minimum { limit, exclusive } => {
                let Some(n) = value.as_number() else {
                    return Ok(());
                };
                match (numeric::compare(n, limit), *exclusive) {
                    (Some(Ordering::Less), _) | (Some(Ordering::Equal), true) => Err(format!(
                        "Value `{}` must be greater than {}`{}`",
                        n,
                        if *exclusive { "" } else { "or equal to " },
                        limit
                    )),
                    _ => Ok(()),
                }
            }
            Keyword::Maximum { limit, exclusive } => {
                let Some(n) = value.as_number() else {
                    return Ok(());
                };
                match (numeric::compare(n, limit), *exclusive) {
                    (Some(Ordering::Greater), _) | (Some(Ordering::Equal), true) => Err(format!(
                        "Value `{}` must be less than {}`{}`",
                        n,
                        if *exclusive { "" } else { "or equal to " },
                        limit
                    )),
                    _ => Ok(()),
                }
            }
            Keyword::MultipleOf(divisor) => match value.as_number() {
                Some(n) if !numeric::is_multiple_of(n, divisor) => {
                    Err(format!("Value `{}` must be a multiple of `{}`", n, divisor))
                }
                _ => Ok(()),
            },
            Keyword::MinLength(min) => match value.as_str() {
                Some(s) if (s.chars().count() as u64) < *min => Err(format!(
                    "Value must be at least {} characters long",
                    min
                )),
                _ => Ok(()),
            },
            Keyword::MaxLength(max) => match value.as_str() {
                Some(s) if (s.chars().count() as u64) > *max => Err(format!(
                    "Value must be at most {} characters long",
                    max
                )),
                _ => Ok(()),
            },
            Keyword::Pattern(regex) => match value.as_str() {
                Some(s) if !regex.is_match(s) => Err(format!(
                    "Value `{}` does not match the pattern `{}`",
                    s,
                    regex.as_str()
                )),
                _ => Ok(()),
            },
            Keyword::MinItems(min) => match value.as_array() {
                Some(items) if (items.len() as u64) < *min => {
                    Err(format!("Array must contain at least {} items", min))
                }
                _ => Ok(()),
            },
            Keyword::MaxItems(max) => match value.as_array() {
                Some(items) if (items.len() as u64) > *max => {
                    Err(format!("Array must contain at most {} items", max))
                }
                _ => Ok(()),
            },
            Keyword::UniqueItems => {
                let Some(items) = value.as_array() else {
                    return Ok(());
                };
                let mut seen = HashSet::with_capacity(items.len());
                for item in items {
                    if !seen.insert(canonical_form(item)) {
                        return Err(format!("Array items must be unique; `{}` repeats", item));
                    }
                }
                Ok(())
            }
            Keyword::Enum(options) => {
                let form = canonical_form(value);
                if options.iter().any(|option| canonical_form(option) == form) {
                    return Ok(());
                }
                Err(format!(
                    "Value `{}` is not one of {}",
                    value,
                    Value::Array(options.clone())
                ))
            }
            Keyword::MinProperties(min) => match value.as_object() {
                Some(map) if (map.len() as u64) < *min => {
                    Err(format!("Object must have at least {} properties", min))
                }
                _ => Ok(()),
            },
            Keyword::MaxProperties(max) => match value.as_object() {
                Some(map) if (map.len() as u64) > *max => {
                    Err(format!("Object must have at most {} properties", max))
                }
                _ => Ok(()),
            },
            Keyword::Format(checker) => {
                if checker.accepts(value) {
                    Ok(())
                } else {
                    Err(format!("Value `{}` is not a valid `{}`", value, checker.name))
                }
            }
        }
    }
}

impl Validate for Keyword {
    fn validate(
        &self,
        instance: Instance<'_>,
        _ctx: &ValidationContext<'_>,
    ) -> Result<(), ErrorTree> {
        let Some(value) = instance.value() else {
            return Ok(());
        };
        if !self.applies(value) {
            return Ok(());
        }
        self.check(value)
            .map_err(|msg| ErrorTree::keyed_message(self.name(), msg))
    }
}

/// One row of the keyword table.
pub struct KeywordRule {
    /// Keyword name as written in documents.
    pub name: &'static str,
    /// Primitive types the keyword constrains; empty for all.
    pub applies_to: &'static [PrimitiveType],
    /// Whether a node carries the keyword.
    pub present: fn(&SchemaNode) -> bool,
    /// Builds the keyword from a node carrying it.
    pub build: fn(&SchemaNode) -> AppResult<Option<Keyword>>,
}

impl std::fmt::Debug for KeywordRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordRule")
            .field("name", &self.name)
            .field("applies_to", &self.applies_to)
            .finish()
    }
}

/// Keyword name -> applicable types and constructor, in evaluation order.
pub static KEYWORD_TABLE: &[KeywordRule] = &[
    KeywordRule {
        name: "type",
        applies_to: ANY,
        present: |n| n.schema_type.is_some(),
        build: build_type,
    },
    KeywordRule {
        name: "minimum",
        applies_to: NUMERIC,
        present: |n| n.minimum.is_some(),
        build: build_minimum,
    },
    KeywordRule {
        name: "maximum",
        applies_to: NUMERIC,
        present: |n| n.maximum.is_some(),
        build: build_maximum,
    },
    KeywordRule {
        name: "multipleOf",
        applies_to: NUMERIC,
        present: |n| n.multiple_of.is_some(),
        build: build_multiple_of,
    },
    KeywordRule {
        name: "minLength",
        applies_to: STRING,
        present: |n| n.min_length.is_some(),
        build: |n| Ok(n.min_length.map(Keyword::MinLength)),
    },
    KeywordRule {
        name: "maxLength",
        applies_to: STRING,
        present: |n| n.max_length.is_some(),
        build: |n| Ok(n.max_length.map(Keyword::MaxLength)),
    },
    KeywordRule {
        name: "pattern",
        applies_to: STRING,
        present: |n| n.pattern.is_some(),
        build: build_pattern,
    },
    KeywordRule {
        name: "minItems",
        applies_to: ARRAY,
        present: |n| n.min_items.is_some(),
        build: |n| Ok(n.min_items.map(Keyword::MinItems)),
    },
    KeywordRule {
        name: "maxItems",
        applies_to: ARRAY,
        present: |n| n.max_items.is_some(),
        build: |n| Ok(n.max_items.map(Keyword::MaxItems)),
    },
    KeywordRule {
        name: "uniqueItems",
        applies_to: ARRAY,
        present: |n| n.unique_items,
        build: |n| Ok(n.unique_items.then_some(Keyword::UniqueItems)),
    },
    KeywordRule {
        name: "enum",
        applies_to: ANY,
        present: |n| n.enum_values.is_some(),
        build: |n| Ok(n.enum_values.clone().map(Keyword::Enum)),
    },
    KeywordRule {
        name: "minProperties",
        applies_to: OBJECT,
        present: |n| n.min_properties.is_some(),
        build: |n| Ok(n.min_properties.map(Keyword::MinProperties)),
    },
    KeywordRule {
        name: "maxProperties",
        applies_to: OBJECT,
        present: |n| n.max_properties.is_some(),
        build: |n| Ok(n.max_properties.map(Keyword::MaxProperties)),
    },
    KeywordRule {
        name: "format",
        applies_to: ANY,
        present: |n| n.format.is_some(),
        build: |n| Ok(n.format.as_deref().and_then(format::lookup).map(Keyword::Format)),
    },
];

/// The table row for `name`.
pub fn rule(name: &str) -> Option<&'static KeywordRule> {
    KEYWORD_TABLE.iter().find(|r| r.name == name)
}

/// Builds every keyword the node carries, in table order.
pub fn build_keywords(node: &SchemaNode) -> AppResult<Vec<Keyword>> {
    let mut keywords = Vec::new();
    for rule in KEYWORD_TABLE {
        if !(rule.present)(node) {
            continue;
        }
        if let Some(keyword) = (rule.build)(node)? {
            keywords.push(keyword);
        }
    }
    Ok(keywords)
}

/// Keywords on `node` that cannot apply to any of its declared types.
///
/// `minimum` next to `type: string` is the typical case. Nodes without a
/// declared type constrain nothing here.
pub fn incompatible_keywords(node: &SchemaNode) -> Vec<&'static str> {
    let declared = node.declared_types();
    if declared.is_empty() || declared.contains(&PrimitiveType::File) {
        return Vec::new();
    }
    KEYWORD_TABLE
        .iter()
        .filter(|rule| !rule.applies_to.is_empty() && (rule.present)(node))
        .filter(|rule| {
            !declared.iter().any(|ty| {
                rule.applies_to.contains(ty)
                    || (*ty == PrimitiveType::Number
                        && rule.applies_to.contains(&PrimitiveType::Integer))
            })
        })
        .map(|rule| rule.name)
        .collect()
}

fn build_type(node: &SchemaNode) -> AppResult<Option<Keyword>> {
    Ok(node.schema_type.as_ref().map(|set| Keyword::Type {
        types: set.types(),
        nullable: node.nullable,
    }))
}

fn build_minimum(node: &SchemaNode) -> AppResult<Option<Keyword>> {
    Ok(node.minimum.clone().map(|limit| Keyword::Minimum {
        limit,
        exclusive: node.exclusive_minimum,
    }))
}

fn build_maximum(node: &SchemaNode) -> AppResult<Option<Keyword>> {
    Ok(node.maximum.clone().map(|limit| Keyword::Maximum {
        limit,
        exclusive: node.exclusive_maximum,
    }))
}

fn build_multiple_of(node: &SchemaNode) -> AppResult<Option<Keyword>> {
    let Some(divisor) = &node.multiple_of else {
        return Ok(None);
    };
    if !numeric::is_positive(divisor) {
        return Err(AppError::Schema(format!(
            "multipleOf must be greater than 0, got {}",
            divisor
        )));
    }
    Ok(Some(Keyword::MultipleOf(divisor.clone())))
}

fn build_pattern(node: &SchemaNode) -> AppResult<Option<Keyword>> {
    let Some(pattern) = &node.pattern else {
        return Ok(None);
    };
    Regex::new(pattern)
        .map(|regex| Some(Keyword::Pattern(regex)))
        .map_err(|e| AppError::Schema(format!("Invalid pattern '{}': {}", pattern, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::context::ResolutionContext;
    use serde_json::json;

    fn node(value: Value) -> SchemaNode {
        serde_json::from_value(value).unwrap()
    }

    fn run(keyword: &Keyword, value: Value) -> Result<(), ErrorTree> {
        let resolution = ResolutionContext::default();
        let ctx = ValidationContext::new(&resolution);
        keyword.validate(Instance::from(&value), &ctx)
    }

    fn single(schema: Value) -> Keyword {
        let mut keywords = build_keywords(&node(schema)).unwrap();
        assert_eq!(keywords.len(), 1);
        keywords.remove(0)
    }

    #[test]
    fn test_absent_always_passes() {
        let resolution = ResolutionContext::default();
        let ctx = ValidationContext::new(&resolution);
        for keyword in build_keywords(&node(json!({
            "type": "string", "minLength": 3, "enum": ["a"], "pattern": "^x"
        })))
        .unwrap()
        {
            assert!(keyword.validate(Instance::Absent, &ctx).is_ok());
        }
    }

    #[test]
    fn test_type_keyword() {
        let integer = single(json!({"type": "integer"}));
        assert!(run(&integer, json!(3)).is_ok());
        assert!(run(&integer, json!(3.5)).is_err());
        assert!(run(&integer, json!(true)).is_err());

        let number = single(json!({"type": "number"}));
        assert!(run(&number, json!(3)).is_ok());

        let err = run(&integer, json!("3")).unwrap_err();
        assert!(err.contains("type"));
        assert!(err.messages()[0].contains("`string`"));

        let nullable = single(json!({"type": "string", "x-nullable": true}));
        assert!(run(&nullable, json!(null)).is_ok());
        let multi = single(json!({"type": ["string", "null"]}));
        assert!(run(&multi, json!(null)).is_ok());
    }

    #[test]
    fn test_bounds_with_exclusivity() {
        let inclusive = single(json!({"minimum": 5}));
        assert!(run(&inclusive, json!(5)).is_ok());
        assert!(run(&inclusive, json!(4.9)).is_err());

        let exclusive = single(json!({"maximum": 5, "exclusiveMaximum": true}));
        assert!(run(&exclusive, json!(5)).is_err());
        assert!(run(&exclusive, json!(4)).is_ok());
        // strings are not compared
        assert!(run(&exclusive, json!("9")).is_ok());
    }

    #[test]
    fn test_multiple_of_tenth() {
        let tenth = single(json!({"multipleOf": 0.1}));
        assert!(run(&tenth, json!(1.0)).is_ok());
        assert!(run(&tenth, json!(0.3)).is_ok());
        assert!(run(&tenth, json!(0)).is_ok());
        assert!(run(&tenth, json!(0.25)).is_err());
    }

    #[test]
    fn test_multiple_of_large_values_stay_exact() {
        let three = single(json!({"multipleOf": 3}));
        assert!(run(&three, json!(1e40)).unwrap_err().contains("multipleOf"));
        assert!(run(&three, json!(3e40)).is_ok());

        let max = single(json!({"maximum": 1e40}));
        assert!(run(&max, json!(u64::MAX)).is_ok());
        assert!(run(&max, json!(2e40)).is_err());
    }

    #[test]
    fn test_non_positive_multiple_of_is_schema_error() {
        let err = build_keywords(&node(json!({"multipleOf": 0}))).unwrap_err();
        assert!(matches!(err, AppError::Schema(_)));
        assert!(build_keywords(&node(json!({"multipleOf": -2}))).is_err());
    }

    #[test]
    fn test_length_counts_characters() {
        let max = single(json!({"maxLength": 3}));
        assert!(run(&max, json!("äöü")).is_ok());
        assert!(run(&max, json!("abcd")).is_err());
    }

    #[test]
    fn test_pattern_is_unanchored() {
        let pattern = single(json!({"pattern": "\\d+"}));
        assert!(run(&pattern, json!("abc123")).is_ok());
        assert!(run(&pattern, json!("abc")).is_err());

        let anchored = single(json!({"pattern": "^\\d+$"}));
        assert!(run(&anchored, json!("abc123")).is_err());
    }

    #[test]
    fn test_invalid_pattern_is_schema_error() {
        let err = build_keywords(&node(json!({"pattern": "(unclosed"}))).unwrap_err();
        assert!(format!("{err}").contains("Invalid pattern"));
    }

    #[test]
    fn test_unique_items_is_type_strict() {
        let unique = single(json!({"uniqueItems": true}));
        assert!(run(&unique, json!([true, 1, "1"])).is_ok());
        assert!(run(&unique, json!([1, 1])).is_err());
        assert!(run(&unique, json!([true, true])).is_err());
        assert!(run(&unique, json!([{"a": 1, "b": 2}, {"b": 2, "a": 1}])).is_err());
    }

    #[test]
    fn test_enum_is_type_strict() {
        let options = single(json!({"enum": [1, "two", null]}));
        assert!(run(&options, json!(1)).is_ok());
        assert!(run(&options, json!(null)).is_ok());
        assert!(run(&options, json!(true)).is_err());
        assert!(run(&options, json!("1")).is_err());
    }

    #[test]
    fn test_properties_count() {
        let min = single(json!({"minProperties": 2}));
        assert!(run(&min, json!({"a": 1})).is_err());
        assert!(run(&min, json!({"a": 1, "b": 2})).is_ok());
        assert!(run(&min, json!([1])).is_ok());
    }

    #[test]
    fn test_format_only_checks_carrier_type() {
        let date = single(json!({"format": "date"}));
        assert!(run(&date, json!(20240101)).is_ok());
        assert!(run(&date, json!("2024-13-01")).is_err());

        assert!(build_keywords(&node(json!({"format": "made-up"})))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_incompatible_keywords() {
        assert_eq!(
            incompatible_keywords(&node(json!({"type": "string", "minimum": 1}))),
            vec!["minimum"]
        );
        assert!(incompatible_keywords(&node(json!({"type": "number", "minimum": 1}))).is_empty());
        assert!(incompatible_keywords(&node(json!({"minimum": 1, "minLength": 1}))).is_empty());
        assert_eq!(
            incompatible_keywords(&node(json!({"type": "integer", "maxItems": 1}))),
            vec!["maxItems"]
        );
    }
}
