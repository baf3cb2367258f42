#![deny(missing_docs)]

//! # Error Reports
//!
//! - **ErrorTree**: the recursive structure carrying every failure found in one
//!   validation call. Object properties, parameter names and error categories
//!   become map keys; several failures under one key become a list.
//! - **ErrorCollector**: accumulates trees keyed by field, with nested scopes.
//! - **Issue**: a flattened `(dotted path, message)` pair for display.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// A tree of validation failures.
///
/// A tree is non-empty exactly when validation failed; empty trees are never
/// handed out as errors by [`ErrorCollector::finish`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorTree {
    /// A single failure message.
    Message(String),
    /// Several failures at the same location.
    List(Vec<ErrorTree>),
    /// Failures keyed by property, index, parameter or category.
    Map(IndexMap<String, ErrorTree>),
}

impl ErrorTree {
    /// A leaf message.
    pub fn message(msg: impl Into<String>) -> Self {
        ErrorTree::Message(msg.into())
    }

    /// A map with a single `key -> tree` entry.
    pub fn keyed(key: impl Into<String>, tree: ErrorTree) -> Self {
        let mut map = IndexMap::new();
        map.insert(key.into(), tree);
        ErrorTree::Map(map)
    }

    /// Shorthand for `keyed(key, message(msg))`.
    pub fn keyed_message(key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::keyed(key, Self::message(msg))
    }

    /// True when the tree carries no failure at all.
    pub fn is_empty(&self) -> bool {
        match self {
            ErrorTree::Message(_) => false,
            ErrorTree::List(items) => items.iter().all(ErrorTree::is_empty),
            ErrorTree::Map(map) => map.values().all(ErrorTree::is_empty),
        }
    }

    /// Combines two trees. Maps merge key by key; anything else collides into
    /// a list.
    pub fn merge(self, other: ErrorTree) -> ErrorTree {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        match (self, other) {
            (ErrorTree::Map(mut left), ErrorTree::Map(right)) => {
                for (key, tree) in right {
                    match left.get_mut(&key) {
                        Some(existing) => {
                            let taken = std::mem::replace(existing, ErrorTree::List(Vec::new()));
                            *existing = taken.merge(tree);
                        }
                        None => {
                            left.insert(key, tree);
                        }
                    }
                }
                ErrorTree::Map(left)
            }
            (ErrorTree::List(mut left), ErrorTree::List(right)) => {
                left.extend(right);
                ErrorTree::List(left)
            }
            (ErrorTree::List(mut left), other) => {
                left.push(other);
                ErrorTree::List(left)
            }
            (this, ErrorTree::List(right)) => {
                let mut items = vec![this];
                items.extend(right);
                ErrorTree::List(items)
            }
            (this, other) => ErrorTree::List(vec![this, other]),
        }
    }

    /// Looks up a subtree by dotted path, e.g. `"parameters.query.page.type"`.
    ///
    /// Lists are searched element by element, so a path reaches through
    /// collided entries.
    pub fn get(&self, path: &str) -> Option<&ErrorTree> {
        if path.is_empty() {
            return Some(self);
        }
        let segments: Vec<&str> = path.split('.').collect();
        self.get_segments(&segments)
    }

    fn get_segments(&self, segments: &[&str]) -> Option<&ErrorTree> {
        let Some((head, rest)) = segments.split_first() else {
            return Some(self);
        };
        match self {
            ErrorTree::Map(map) => map.get(*head).and_then(|t| t.get_segments(rest)),
            ErrorTree::List(items) => items.iter().find_map(|t| t.get_segments(segments)),
            ErrorTree::Message(_) => None,
        }
    }

    /// True when a subtree exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// All messages in the tree, depth first.
    pub fn messages(&self) -> Vec<&str> {
        self.issues_ref()
            .into_iter()
            .map(|(_, msg)| msg)
            .collect()
    }

    /// Flattens the tree into `(path, message)` issues.
    pub fn issues(&self) -> Vec<Issue> {
        self.issues_ref()
            .into_iter()
            .map(|(path, message)| Issue {
                path,
                message: message.to_string(),
            })
            .collect()
    }

    fn issues_ref(&self) -> Vec<(String, &str)> {
        let mut out = Vec::new();
        self.walk(&mut Vec::new(), &mut out);
        out
    }

    fn walk<'a>(&'a self, prefix: &mut Vec<&'a str>, out: &mut Vec<(String, &'a str)>) {
        match self {
            ErrorTree::Message(msg) => out.push((prefix.join("."), msg.as_str())),
            ErrorTree::List(items) => {
                for item in items {
                    item.walk(prefix, out);
                }
            }
            ErrorTree::Map(map) => {
                for (key, tree) in map {
                    prefix.push(key.as_str());
                    tree.walk(prefix, out);
                    prefix.pop();
                }
            }
        }
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues().iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorTree {}

/// A single flattened failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Dotted location, e.g. `parameters.query.page.minimum`.
    pub path: String,
    /// Human readable message.
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// What a collector does with its failures when it concludes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// A non-empty collector concludes as `Err(tree)`.
    #[default]
    Raise,
    /// The collector concludes as `Ok(issues)`; callers inspect the list.
    Report,
}

/// Accumulates failures instead of stopping at the first one.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    tree: Option<ErrorTree>,
    policy: FailurePolicy,
}

impl ErrorCollector {
    /// A raising collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// A collector with an explicit conclusion policy.
    pub fn with_policy(policy: FailurePolicy) -> Self {
        Self { tree: None, policy }
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.tree.as_ref().map_or(true, ErrorTree::is_empty)
    }

    /// Merges `tree` at the root.
    pub fn add_tree(&mut self, tree: ErrorTree) {
        if tree.is_empty() {
            return;
        }
        self.tree = Some(match self.tree.take() {
            Some(existing) => existing.merge(tree),
            None => tree,
        });
    }

    /// Records `message` under `key`.
    pub fn add(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.add_tree(ErrorTree::keyed_message(key, message));
    }

    /// Merges `tree` under `key`.
    pub fn add_at(&mut self, key: impl Into<String>, tree: ErrorTree) {
        if tree.is_empty() {
            return;
        }
        self.add_tree(ErrorTree::keyed(key, tree));
    }

    /// Records the failure side of a validator result at the root.
    pub fn record(&mut self, result: Result<(), ErrorTree>) {
        if let Err(tree) = result {
            self.add_tree(tree);
        }
    }

    /// Records the failure side of a validator result under `key`.
    pub fn record_at(&mut self, key: impl Into<String>, result: Result<(), ErrorTree>) {
        if let Err(tree) = result {
            self.add_at(key, tree);
        }
    }

    /// Runs `f` against a fresh nested collector and files its failures
    /// under `key`.
    pub fn scoped<F>(&mut self, key: impl Into<String>, f: F)
    where
        F: FnOnce(&mut ErrorCollector),
    {
        let mut child = ErrorCollector::new();
        f(&mut child);
        if let Some(tree) = child.tree {
            self.add_at(key, tree);
        }
    }

    /// Absorbs another collector's failures at the root.
    pub fn merge(&mut self, other: ErrorCollector) {
        if let Some(tree) = other.tree {
            self.add_tree(tree);
        }
    }

    /// Collect-and-raise: `Err` only when something was recorded.
    pub fn finish(self) -> Result<(), ErrorTree> {
        match self.tree {
            Some(tree) if !tree.is_empty() => Err(tree),
            _ => Ok(()),
        }
    }

    /// Concludes according to the collector's policy.
    pub fn conclude(self) -> Result<Vec<Issue>, ErrorTree> {
        match self.policy {
            FailurePolicy::Raise => self.finish().map(|_| Vec::new()),
            FailurePolicy::Report => Ok(self.tree.map(|t| t.issues()).unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_collector_never_raises() {
        assert!(ErrorCollector::new().finish().is_ok());

        let mut collector = ErrorCollector::new();
        collector.add_at("key", ErrorTree::Map(IndexMap::new()));
        assert!(collector.is_empty());
        assert!(collector.finish().is_ok());
    }

    #[test]
    fn test_merge_maps_recursively() {
        let left = ErrorTree::keyed("name", ErrorTree::keyed_message("type", "bad type"));
        let right = ErrorTree::keyed("name", ErrorTree::keyed_message("pattern", "bad pattern"));
        let merged = left.merge(right);

        assert!(merged.contains("name.type"));
        assert!(merged.contains("name.pattern"));
    }

    #[test]
    fn test_merge_collision_becomes_list() {
        let merged = ErrorTree::message("a").merge(ErrorTree::message("b"));
        assert_eq!(
            merged,
            ErrorTree::List(vec![ErrorTree::message("a"), ErrorTree::message("b")])
        );
    }

    #[test]
    fn test_scoped_collectors_nest() {
        let mut collector = ErrorCollector::new();
        collector.scoped("parameters", |params| {
            params.scoped("query", |query| {
                query.add("page", "required");
            });
            params.scoped("path", |_| {});
        });

        let tree = collector.finish().unwrap_err();
        assert!(tree.contains("parameters.query.page"));
        assert!(!tree.contains("parameters.path"));
    }

    #[test]
    fn test_issues_flatten_paths() {
        let mut collector = ErrorCollector::new();
        collector.add("path", "no matching path");
        collector.add_at("body", ErrorTree::keyed_message("type", "bad type"));
        let tree = collector.finish().unwrap_err();

        assert_eq!(
            tree.issues(),
            vec![
                Issue {
                    path: "path".into(),
                    message: "no matching path".into()
                },
                Issue {
                    path: "body.type".into(),
                    message: "bad type".into()
                },
            ]
        );
    }

    #[test]
    fn test_report_policy_returns_issues() {
        let mut collector = ErrorCollector::with_policy(FailurePolicy::Report);
        collector.add("definitions", "unresolved");
        let issues = collector.conclude().unwrap();
        assert_eq!(issues.len(), 1);

        let raising = ErrorCollector::new();
        assert_eq!(raising.conclude().unwrap(), Vec::<Issue>::new());
    }

    #[test]
    fn test_serializes_to_plain_json() {
        let tree = ErrorTree::keyed("age", ErrorTree::keyed_message("minimum", "too small"));
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json, serde_json::json!({"age": {"minimum": "too small"}}));
    }
}
