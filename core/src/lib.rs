#![deny(missing_docs)]

//! # Swagcheck Core
//!
//! Validation of HTTP requests, responses and plain JSON values against
//! Swagger 2.0 documents, and consistency checks for the documents
//! themselves.
//!
//! ```no_run
//! use swagcheck_core::{ApiValidator, Request, ValidatorConfig};
//!
//! # fn run(document: &str) -> swagcheck_core::AppResult<()> {
//! let api = ApiValidator::from_yaml(document, ValidatorConfig::default())?;
//! if let Err(errors) = api.validate_request(&Request::new("get", "/v1/pets/1")) {
//!     for issue in errors.issues() {
//!         println!("{issue}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

/// Shared error types.
pub mod error;

/// Orchestrator settings.
pub mod config;

/// Value classification and the `Instance` wrapper.
pub mod value;

/// Error trees and collectors.
pub mod report;

/// Failure message texts.
pub mod messages;

/// Document model, loading and checks.
pub mod schema;

/// The validation engine.
pub mod validators;

/// Requests, responses and their orchestration.
pub mod http;

pub use config::ValidatorConfig;
pub use error::{AppError, AppResult};
pub use http::cast::{cast_value, join_collection};
pub use http::{ApiValidator, Request, Response};
pub use report::{ErrorCollector, ErrorTree, FailurePolicy, Issue};
pub use schema::{
    load_document, load_document_yaml, validate_document, LoaderContext, ResolutionContext,
    SchemaNode, Swagger,
};
pub use validators::builder::SchemaValidator;
pub use validators::{
    build_schema_validator, validate_value_against_schema, Validate, ValidationContext, Validator,
};
pub use value::{Instance, PrimitiveType};
