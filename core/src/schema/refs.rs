#![deny(missing_docs)]

//! # Reference Utilities
//!
//! Parsing of `$ref` strings into the table they point at.
//!
//! Only local references are supported (`#/definitions/...`,
//! `#/parameters/...`, `#/responses/...`). Remote or relative document
//! references are reported as unsupported rather than fetched. A definition
//! reference may continue past the definition name into the schema, as in
//! `#/definitions/Pet/properties/name`.

use crate::error::{AppError, AppResult};
use crate::messages;
use percent_encoding::percent_decode_str;
use std::fmt;
use url::Url;

/// The table a local reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReferenceKind {
    /// `#/definitions/{name}`
    Definition,
    /// `#/parameters/{name}`
    Parameter,
    /// `#/responses/{name}`
    Response,
}

impl ReferenceKind {
    /// The document section holding targets of this kind.
    pub fn section(self) -> &'static str {
        match self {
            ReferenceKind::Definition => "definitions",
            ReferenceKind::Parameter => "parameters",
            ReferenceKind::Response => "responses",
        }
    }

    fn from_section(section: &str) -> Option<Self> {
        match section {
            "definitions" => Some(ReferenceKind::Definition),
            "parameters" => Some(ReferenceKind::Parameter),
            "responses" => Some(ReferenceKind::Response),
            _ => None,
        }
    }
}

/// A parsed local reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParsedReference {
    /// Target table.
    pub kind: ReferenceKind,
    /// Decoded entry name within the table.
    pub name: String,
    /// Decoded segments after the name, walked inside a definition.
    pub path: Vec<String>,
}

impl ParsedReference {
    /// Re-encodes the reference as a pointer.
    pub fn pointer(&self) -> String {
        let mut out = format!("#/{}/{}", self.kind.section(), encode_segment(&self.name));
        for segment in &self.path {
            out.push('/');
            out.push_str(&encode_segment(segment));
        }
        out
    }
}

impl fmt::Display for ParsedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pointer())
    }
}

/// Parses a `$ref` string.
///
/// Fails with [`AppError::Reference`] for remote references (anything with a
/// scheme, host or document part) and for pointers that do not name a
/// entry of a known table. Only definition references may point below the
/// entry itself.
pub fn parse_reference(ref_str: &str) -> AppResult<ParsedReference> {
    let fragment = local_fragment(ref_str).map_err(|reason| {
        AppError::Reference(format!(
            "{} '{}': {}",
            messages::UNSUPPORTED_REFERENCE,
            ref_str,
            reason
        ))
    })?;

    let pointer = fragment.trim_start_matches('/');
    let segments: Vec<&str> = pointer.split('/').collect();
    if segments.len() < 2 {
        return Err(AppError::Reference(format!(
            "{} '{}': expected '#/<section>/<name>'",
            messages::UNSUPPORTED_REFERENCE,
            ref_str
        )));
    }

    let kind = ReferenceKind::from_section(segments[0]).ok_or_else(|| {
        AppError::Reference(format!(
            "{} '{}': unknown section '{}'",
            messages::UNSUPPORTED_REFERENCE,
            ref_str,
            segments[0]
        ))
    })?;

    let name = decode_pointer_segment(segments[1]);
    if name.is_empty() {
        return Err(AppError::Reference(format!(
            "{} '{}': empty name",
            messages::UNSUPPORTED_REFERENCE,
            ref_str
        )));
    }

    let path: Vec<String> = segments[2..]
        .iter()
        .map(|segment| decode_pointer_segment(segment))
        .collect();
    if !path.is_empty() && kind != ReferenceKind::Definition {
        return Err(AppError::Reference(format!(
            "{} '{}': expected '#/{}/<name>'",
            messages::UNSUPPORTED_REFERENCE,
            ref_str,
            kind.section()
        )));
    }

    Ok(ParsedReference { kind, name, path })
}

fn encode_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Returns the fragment of a same-document reference, or why there is none.
fn local_fragment(ref_str: &str) -> Result<&str, &'static str> {
    if let Some(fragment) = ref_str.strip_prefix('#') {
        return Ok(fragment);
    }
    if Url::parse(ref_str).is_ok() || ref_str.starts_with("//") {
        Err("remote documents are not loaded")
    } else {
        Err("only local '#/...' references are supported")
    }
}

/// Decodes a JSON Pointer segment (handles `~1` and `~0`).
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded)
        .decode_utf8_lossy()
        .into_owned()
}
