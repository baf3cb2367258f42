//! # Error Handling
//!
//! Provides the unified `AppError` enum used for everything that is *not* a
//! data validation failure: malformed documents, unresolvable references and
//! misuse of the engine. Data failures are reported as
//! [`ErrorTree`](crate::report::ErrorTree) values instead.

use derive_more::{Display, From};

/// Errors raised while loading documents and compiling validators.
///
/// Plain `String`s convert to `General`; the other string variants must be
/// built explicitly.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// The document is not valid JSON, or does not fit the Swagger model.
    #[display("Parse Error: {_0}")]
    Parse(serde_json::Error),

    /// The document is not valid YAML.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// A schema is malformed (bad regex, incompatible keywords, ...).
    #[from(ignore)]
    #[display("Schema Error: {_0}")]
    Schema(String),

    /// A `$ref` cannot be resolved or uses an unsupported form.
    #[from(ignore)]
    #[display("Reference Error: {_0}")]
    Reference(String),

    /// The engine was driven in a way it does not support.
    #[from(ignore)]
    #[display("Contract Error: {_0}")]
    Contract(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::Other, "test");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_string_conversion() {
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_json_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let app_err: AppError = json_err.into();
        assert!(matches!(app_err, AppError::Parse(_)));
    }

    #[test]
    fn test_schema_manual_creation() {
        let app_err = AppError::Schema("bad pattern".into());
        assert_eq!(format!("{}", app_err), "Schema Error: bad pattern");
    }
}
