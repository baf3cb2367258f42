#![deny(missing_docs)]

//! # Schema Nodes
//!
//! The Swagger 2.0 subset of JSON Schema as a typed serde model. The same
//! struct describes body schemas, definitions, non-body parameters (flattened
//! into [`Parameter`](crate::schema::Parameter)), `items` objects and
//! response headers, since all of them share the keyword vocabulary.

use crate::value::PrimitiveType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A schema node. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    /// `$ref` pointer. Sibling keywords are merged on top of the target.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Declared type(s).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeSet>,

    /// Format modifier (e.g. `date-time`, `int64`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Human readable title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Human readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Default value. Informational only; never injected into data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// `multipleOf`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,

    /// `maximum`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,

    /// Makes `maximum` exclusive.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exclusive_maximum: bool,

    /// `minimum`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,

    /// Makes `minimum` exclusive.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exclusive_minimum: bool,

    /// `maxLength`, in characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    /// `minLength`, in characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    /// `pattern` (unanchored regular expression).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// `maxItems`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,

    /// `minItems`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,

    /// `uniqueItems`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique_items: bool,

    /// `maxProperties`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,

    /// `minProperties`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,

    /// `enum`.
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    /// `required`, either as a list of property names or a per-property flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Required>,

    /// Declared properties, in document order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaNode>,

    /// `additionalProperties`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    /// `items`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,

    /// `allOf`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<SchemaNode>>,

    /// `anyOf`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<SchemaNode>>,

    /// Name of the property selecting a concrete subtype definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,

    /// Wire encoding for array parameters, headers and `items` objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_format: Option<CollectionFormat>,

    /// Swagger 2.0 vendor extension allowing `null` next to the declared type.
    #[serde(rename = "x-nullable", default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,

    /// Informational.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

impl SchemaNode {
    /// A node constraining only the type.
    pub fn of_type(ty: PrimitiveType) -> Self {
        Self {
            schema_type: Some(TypeSet::Single(ty)),
            ..Self::default()
        }
    }

    /// A node that is just a `$ref`.
    pub fn reference(pointer: impl Into<String>) -> Self {
        Self {
            reference: Some(pointer.into()),
            ..Self::default()
        }
    }

    /// Declared types as a slice-like list (empty when unconstrained).
    pub fn declared_types(&self) -> Vec<PrimitiveType> {
        match &self.schema_type {
            Some(set) => set.types(),
            None => Vec::new(),
        }
    }

    /// True when the property-level `required: true` flag is set.
    pub fn is_required_flag(&self) -> bool {
        matches!(self.required, Some(Required::Flag(true)))
    }

    /// Names listed in an object-level `required: [...]`.
    pub fn required_fields(&self) -> &[String] {
        match &self.required {
            Some(Required::Fields(fields)) => fields,
            _ => &[],
        }
    }

    /// Iterates over every direct child schema (properties, items,
    /// additionalProperties, allOf, anyOf).
    pub fn children(&self) -> Vec<(String, &SchemaNode)> {
        let mut out: Vec<(String, &SchemaNode)> = Vec::new();
        for (name, node) in &self.properties {
            out.push((format!("properties.{}", name), node));
        }
        match &self.items {
            Some(Items::Single(node)) => out.push(("items".to_string(), node)),
            Some(Items::Tuple(nodes)) => {
                for (idx, node) in nodes.iter().enumerate() {
                    out.push((format!("items.{}", idx), node));
                }
            }
            None => {}
        }
        if let Some(AdditionalProperties::Schema(node)) = &self.additional_properties {
            out.push(("additionalProperties".to_string(), node));
        }
        for (key, list) in [("allOf", &self.all_of), ("anyOf", &self.any_of)] {
            if let Some(nodes) = list {
                for (idx, node) in nodes.iter().enumerate() {
                    out.push((format!("{}.{}", key, idx), node));
                }
            }
        }
        out
    }

    /// Walks pointer segments (`properties/<name>`, `items`, `items/<i>`,
    /// `additionalProperties`, `allOf/<i>`, `anyOf/<i>`) down from this node.
    pub fn descend<S: AsRef<str>>(&self, path: &[S]) -> Option<&SchemaNode> {
        let mut node = self;
        let mut segments = path.iter().map(AsRef::as_ref);
        while let Some(segment) = segments.next() {
            node = match segment {
                "properties" => node.properties.get(segments.next()?)?,
                "items" => match node.items.as_ref()? {
                    Items::Single(inner) => inner.as_ref(),
                    Items::Tuple(nodes) => nodes.get(segments.next()?.parse::<usize>().ok()?)?,
                },
                "additionalProperties" => match node.additional_properties.as_ref()? {
                    AdditionalProperties::Schema(inner) => inner.as_ref(),
                    AdditionalProperties::Allowed(_) => return None,
                },
                "allOf" => node.all_of.as_ref()?.get(segments.next()?.parse::<usize>().ok()?)?,
                "anyOf" => node.any_of.as_ref()?.get(segments.next()?.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(node)
    }
}

/// A single type name or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    /// `type: string`
    Single(PrimitiveType),
    /// `type: [string, "null"]`
    Multiple(Vec<PrimitiveType>),
}

impl TypeSet {
    /// All declared types.
    pub fn types(&self) -> Vec<PrimitiveType> {
        match self {
            TypeSet::Single(ty) => vec![*ty],
            TypeSet::Multiple(list) => list.clone(),
        }
    }

    /// True when `ty` is among the declared types.
    pub fn contains(&self, ty: PrimitiveType) -> bool {
        match self {
            TypeSet::Single(declared) => *declared == ty,
            TypeSet::Multiple(list) => list.contains(&ty),
        }
    }
}

/// The two shapes of `required`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Required {
    /// `required: true` on a property or parameter.
    Flag(bool),
    /// `required: [a, b]` on an object schema.
    Fields(Vec<String>),
}

/// `items` as one schema for every element or one schema per position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Items {
    /// Schema *i* applies to element *i*; extra elements are unchecked.
    Tuple(Vec<SchemaNode>),
    /// Applies to every element.
    Single(Box<SchemaNode>),
}

/// `additionalProperties` as a switch or a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `false` rejects undeclared keys; `true` is the default.
    Allowed(bool),
    /// Every undeclared value must match.
    Schema(Box<SchemaNode>),
}

/// Swagger 2.0 `collectionFormat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionFormat {
    /// Comma separated.
    #[default]
    Csv,
    /// Space separated.
    Ssv,
    /// Tab separated.
    Tsv,
    /// Pipe separated.
    Pipes,
    /// Repeated keys (`?a=1&a=2`).
    Multi,
}

impl CollectionFormat {
    /// The delimiter for packed formats; `None` for `multi`.
    pub fn delimiter(self) -> Option<char> {
        match self {
            CollectionFormat::Csv => Some(','),
            CollectionFormat::Ssv => Some(' '),
            CollectionFormat::Tsv => Some('\t'),
            CollectionFormat::Pipes => Some('|'),
            CollectionFormat::Multi => None,
        }
    }
}
