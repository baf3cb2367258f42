#![deny(missing_docs)]

//! # Validator Configuration
//!
//! Switches for the request/response orchestrator. Everything defaults to
//! the strict behaviour; the struct can be built in code or read from YAML.

use crate::error::AppResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Replaces the document's `basePath` when set.
    #[serde(default)]
    pub base_path: Option<String>,

    /// Check request content types against `consumes` and response content
    /// types against `produces` (default: true)
    #[serde(default = "default_true")]
    pub validate_content_type: bool,

    /// Check declared response headers (default: true)
    #[serde(default = "default_true")]
    pub validate_response_headers: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            validate_content_type: default_true(),
            validate_response_headers: default_true(),
        }
    }
}

impl ValidatorConfig {
    /// Default settings with a `basePath` override.
    pub fn with_base_path(base_path: impl Into<String>) -> Self {
        Self {
            base_path: Some(base_path.into()),
            ..Default::default()
        }
    }

    /// Reads settings from YAML text. Missing keys take their defaults.
    pub fn from_yaml(text: &str) -> AppResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Reads settings from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }
}
