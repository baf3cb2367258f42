#![deny(missing_docs)]

//! # Schema
//!
//! The document side of the engine: the Swagger 2.0 model and loader, `$ref`
//! parsing, the resolution tables and the consistency checks run after load.

/// Document consistency checks.
pub mod checks;
/// Resolution tables.
pub mod context;
/// Swagger 2.0 model and loader.
pub mod document;
/// Schema nodes.
pub mod node;
/// `$ref` parsing.
pub mod refs;

pub use checks::validate_document;
pub use context::{ResolutionContext, SchemaTarget};
pub use document::{
    load_document, load_document_yaml, LoaderContext, Operation, Parameter, ParameterLocation,
    PathItem, Paths, RefOr, Reference, Response, Swagger,
};
pub use node::{AdditionalProperties, CollectionFormat, Items, Required, SchemaNode, TypeSet};
pub use refs::{parse_reference, ParsedReference, ReferenceKind};
