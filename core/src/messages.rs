//! # Messages
//!
//! Message texts used in error trees. Callers match on the tree *keys*; the
//! texts are kept here so tests and consumers can refer to them.

/// A required field, parameter or body is absent.
pub const REQUIRED: &str = "This value is required.";
/// An undeclared key under `additionalProperties: false`.
pub const ADDITIONAL_PROPERTY: &str = "Additional properties are not allowed.";

/// No declared path template matches the request path.
pub const UNKNOWN_PATH: &str = "Request path did not match any of the known api paths.";
/// Several templates tie for the best match.
pub const AMBIGUOUS_PATH: &str = "Request path matched multiple api paths with equal specificity";
/// The path does not declare the request method.
pub const INVALID_METHOD: &str = "Request method is not allowed for this path";
/// The content type is not in `consumes` / `produces`.
pub const INVALID_CONTENT_TYPE: &str = "Invalid content type";
/// The status code is not a declared response.
pub const INVALID_STATUS_CODE: &str = "Invalid response status code";

/// The value lacks its discriminator property.
pub const DISCRIMINATOR_MISSING: &str = "The discriminator property is missing from the value.";
/// The discriminator value names no definition.
pub const DISCRIMINATOR_UNKNOWN: &str = "The discriminator names an undefined schema";
/// The `$ref` points outside the current document.
pub const UNSUPPORTED_REFERENCE: &str = "Unsupported reference";
/// The `$ref` target does not exist.
pub const UNRESOLVED_REFERENCE: &str = "Reference could not be resolved";
/// A lazily built schema turned out to be malformed.
pub const INVALID_SCHEMA: &str = "The schema for this value could not be built";
