#![deny(missing_docs)]

//! # Path Matching
//!
//! Path templates such as `/pets/{petId}` are compiled once into anchored
//! regular expressions. Literal text is escaped; each placeholder becomes a
//! capture group that accepts `\d+` when the path parameter is declared as an
//! integer and `[^/]+` otherwise.
//!
//! When several templates match a request path, the longest template as
//! written (placeholders included) wins; a tie is an error naming every tied
//! template.

use crate::error::{AppError, AppResult};
use crate::messages;
use crate::report::ErrorTree;
use crate::schema::document::{Parameter, ParameterLocation};
use crate::value::PrimitiveType;
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use regex::Regex;
use tracing::debug;

/// Placeholder names in a template, in order of appearance.
pub fn template_parameters(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        names.push(after[..end].to_string());
        rest = &after[end + 1..];
    }
    names
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct CompiledPath {
    template: String,
    regex: Regex,
    /// Parameter name per capture group `p0`, `p1`, ...
    groups: Vec<String>,
    length: usize,
}

impl CompiledPath {
    /// Compiles `template`. `parameters` are consulted for the declared type
    /// of each placeholder; undeclared placeholders match any segment.
    pub fn compile(template: &str, parameters: &[&Parameter]) -> AppResult<Self> {
        let mut pattern = String::from("^");
        let mut groups = Vec::new();
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            let literal = &rest[..start];
            pattern.push_str(&regex::escape(literal));

            let after = &rest[start + 1..];
            let end = after.find('}').ok_or_else(|| {
                AppError::Schema(format!("Unclosed placeholder in path '{}'", template))
            })?;
            let name = &after[..end];
            let segment = if is_integer_parameter(name, parameters) {
                r"\d+"
            } else {
                "[^/]+"
            };
            pattern.push_str(&format!("(?P<p{}>{})", groups.len(), segment));
            groups.push(name.to_string());
            rest = &after[end + 1..];
        }
        pattern.push_str(&regex::escape(rest));
        pattern.push('$');

        let regex = Regex::new(&pattern)
            .map_err(|e| AppError::Schema(format!("Invalid path template '{}': {}", template, e)))?;

        Ok(Self {
            template: template.to_string(),
            regex,
            groups,
            length: template.chars().count(),
        })
    }

    /// The template as written in the document.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Length of the template as written; longer wins among matches.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Matches a (base-path-stripped) request path, returning the decoded
    /// path parameter values.
    pub fn captures(&self, path: &str) -> Option<IndexMap<String, String>> {
        let caps = self.regex.captures(path)?;
        let mut values = IndexMap::new();
        for (idx, name) in self.groups.iter().enumerate() {
            if let Some(m) = caps.name(&format!("p{}", idx)) {
                let decoded = percent_decode_str(m.as_str()).decode_utf8_lossy();
                values.insert(name.clone(), decoded.into_owned());
            }
        }
        Some(values)
    }
}

fn is_integer_parameter(name: &str, parameters: &[&Parameter]) -> bool {
    parameters
        .iter()
        .find(|p| p.location == ParameterLocation::Path && p.name == name)
        .map_or(false, |p| {
            p.keywords.declared_types().first() == Some(&PrimitiveType::Integer)
        })
}

/// The result of matching a request path.
#[derive(Debug, Clone)]
pub struct PathMatch<'a> {
    /// The winning template.
    pub path: &'a CompiledPath,
    /// Decoded path parameter values by name.
    pub parameters: IndexMap<String, String>,
}

/// Every compiled template of a document, plus the base path to strip.
#[derive(Debug, Clone, Default)]
pub struct PathMatcher {
    base_path: String,
    paths: Vec<CompiledPath>,
}

impl PathMatcher {
    /// A matcher over `paths`. A base path of `/` strips nothing.
    pub fn new(base_path: Option<&str>, paths: Vec<CompiledPath>) -> Self {
        let base_path = base_path.unwrap_or("").trim_end_matches('/').to_string();
        Self { base_path, paths }
    }

    /// The compiled templates.
    pub fn paths(&self) -> &[CompiledPath] {
        &self.paths
    }

    /// Strips the base path; `None` when the path lies outside it.
    fn strip_base<'p>(&self, path: &'p str) -> Option<&'p str> {
        if self.base_path.is_empty() {
            return Some(path);
        }
        let rest = path.strip_prefix(self.base_path.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    /// Finds the template for a request path.
    ///
    /// Failures are keyed `path`.
    pub fn match_path(&self, path: &str) -> Result<PathMatch<'_>, ErrorTree> {
        let unknown = || {
            ErrorTree::keyed_message("path", format!("{} ({})", messages::UNKNOWN_PATH, path))
        };
        let stripped = self.strip_base(path).ok_or_else(unknown)?;

        let candidates: Vec<PathMatch<'_>> = self
            .paths
            .iter()
            .filter_map(|compiled| {
                compiled.captures(stripped).map(|parameters| PathMatch {
                    path: compiled,
                    parameters,
                })
            })
            .collect();

        let Some(best) = candidates.iter().map(|m| m.path.length()).max() else {
            return Err(unknown());
        };
        let mut winners: Vec<PathMatch<'_>> = candidates
            .into_iter()
            .filter(|m| m.path.length() == best)
            .collect();

        if winners.len() > 1 {
            let names: Vec<&str> = winners.iter().map(|m| m.path.template()).collect();
            return Err(ErrorTree::keyed_message(
                "path",
                format!("{}: {}", messages::AMBIGUOUS_PATH, names.join(", ")),
            ));
        }

        let Some(winner) = winners.pop() else {
            return Err(unknown());
        };
        debug!(path = %path, template = %winner.path.template(), "matched request path");
        Ok(winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::node::SchemaNode;

    fn path_param(name: &str, ty: PrimitiveType) -> Parameter {
        Parameter {
            name: name.into(),
            location: ParameterLocation::Path,
            required: true,
            schema: None,
            keywords: SchemaNode::of_type(ty),
        }
    }

    fn matcher(base: Option<&str>, templates: &[&str], params: &[&Parameter]) -> PathMatcher {
        let paths = templates
            .iter()
            .map(|t| CompiledPath::compile(t, params).unwrap())
            .collect();
        PathMatcher::new(base, paths)
    }

    #[test]
    fn test_template_parameters() {
        assert_eq!(
            template_parameters("/get/main/{id}/nested/{other_id}"),
            vec!["id", "other_id"]
        );
        assert!(template_parameters("/plain").is_empty());
    }

    #[test]
    fn test_nested_templates() {
        let id = path_param("id", PrimitiveType::Integer);
        let other = path_param("other_id", PrimitiveType::Integer);
        let m = matcher(
            None,
            &["/get/main/{id}", "/get/main/{id}/nested/{other_id}"],
            &[&id, &other],
        );

        let found = m.match_path("/get/main/1234/nested/5678").unwrap();
        assert_eq!(found.path.template(), "/get/main/{id}/nested/{other_id}");
        assert_eq!(found.parameters["other_id"], "5678");

        let found = m.match_path("/get/main/1234").unwrap();
        assert_eq!(found.path.template(), "/get/main/{id}");
        assert_eq!(found.parameters["id"], "1234");
    }

    #[test]
    fn test_integer_parameters_only_match_digits() {
        let id = path_param("id", PrimitiveType::Integer);
        let m = matcher(None, &["/pets/{id}"], &[&id]);
        assert!(m.match_path("/pets/12").is_ok());
        assert!(m.match_path("/pets/abc").unwrap_err().contains("path"));
    }

    #[test]
    fn test_longer_template_wins() {
        let m = matcher(None, &["/pets/{petId}", "/pets/{name}"], &[]);
        let found = m.match_path("/pets/abc").unwrap();
        assert_eq!(found.path.template(), "/pets/{petId}");
        assert_eq!(found.parameters["petId"], "abc");

        let m = matcher(None, &["/users/{name}", "/users/current"], &[]);
        assert_eq!(
            m.match_path("/users/current").unwrap().path.template(),
            "/users/current"
        );
        assert_eq!(
            m.match_path("/users/bob").unwrap().path.template(),
            "/users/{name}"
        );
    }

    #[test]
    fn test_ties_name_every_candidate() {
        let m = matcher(None, &["/a/{x}/c", "/a/b/{y}"], &[]);
        let err = m.match_path("/a/b/c").unwrap_err();
        let message = err.messages()[0].to_string();
        assert!(message.starts_with(messages::AMBIGUOUS_PATH));
        assert!(message.contains("/a/{x}/c"));
        assert!(message.contains("/a/b/{y}"));
    }

    #[test]
    fn test_base_path_and_decoding() {
        let m = matcher(Some("/v1/"), &["/files/{name}", "/"], &[]);
        assert_eq!(
            m.match_path("/v1/files/a%20b").unwrap().parameters["name"],
            "a b"
        );
        assert_eq!(m.match_path("/v1").unwrap().path.template(), "/");
        assert!(m.match_path("/files/x").is_err());
        assert!(m.match_path("/v10/files/x").is_err());
    }

    #[test]
    fn test_literals_are_escaped() {
        let m = matcher(None, &["/report.json"], &[]);
        assert!(m.match_path("/report.json").is_ok());
        assert!(m.match_path("/reportxjson").is_err());
    }
}
