#![deny(missing_docs)]

//! # Value Model
//!
//! Classification of dynamic JSON values into the primitive types Swagger 2.0
//! understands, plus the explicit `Instance` wrapper that distinguishes an
//! absent field from JSON `null`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The primitive type names a schema `type` keyword may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    /// JSON `null`.
    Null,
    /// `true` / `false`. Never interchangeable with numbers.
    Boolean,
    /// A number without a fractional representation.
    Integer,
    /// Any number, integers included.
    Number,
    /// A JSON string.
    String,
    /// An ordered sequence.
    Array,
    /// A key/value mapping.
    Object,
    /// A `formData` upload. Uploads are not inspected.
    File,
}

impl PrimitiveType {
    /// Classifies a JSON value.
    ///
    /// Numbers stored as `i64`/`u64` are integers; anything carried as a float
    /// (including `1.0`) is a number.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => PrimitiveType::Null,
            Value::Bool(_) => PrimitiveType::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => PrimitiveType::Integer,
            Value::Number(_) => PrimitiveType::Number,
            Value::String(_) => PrimitiveType::String,
            Value::Array(_) => PrimitiveType::Array,
            Value::Object(_) => PrimitiveType::Object,
        }
    }

    /// Returns true when `value` satisfies this declared type.
    pub fn matches(self, value: &Value) -> bool {
        let actual = PrimitiveType::of(value);
        match self {
            PrimitiveType::Number => {
                matches!(actual, PrimitiveType::Number | PrimitiveType::Integer)
            }
            PrimitiveType::File => true,
            declared => declared == actual,
        }
    }

    /// Canonical lowercase name, as written in documents.
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::Null => "null",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Number => "number",
            PrimitiveType::String => "string",
            PrimitiveType::Array => "array",
            PrimitiveType::Object => "object",
            PrimitiveType::File => "file",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value under validation, or the absence of one.
///
/// `Absent` is what a property validator sees for a key missing from its
/// object. Every keyword validator succeeds on it; only `required` checks
/// look at it.
#[derive(Debug, Clone, Copy)]
pub enum Instance<'a> {
    /// The field does not exist.
    Absent,
    /// The field exists (it may still be JSON `null`).
    Present(&'a Value),
}

impl<'a> Instance<'a> {
    /// Wraps an optional lookup result.
    pub fn from_option(value: Option<&'a Value>) -> Self {
        match value {
            Some(v) => Instance::Present(v),
            None => Instance::Absent,
        }
    }

    /// The wrapped value, if present.
    pub fn value(self) -> Option<&'a Value> {
        match self {
            Instance::Present(v) => Some(v),
            Instance::Absent => None,
        }
    }

    /// True for [`Instance::Absent`].
    pub fn is_absent(self) -> bool {
        matches!(self, Instance::Absent)
    }

    /// Primitive type of the wrapped value.
    pub fn primitive_type(self) -> Option<PrimitiveType> {
        self.value().map(PrimitiveType::of)
    }

    /// Address of the wrapped value, used to recognise re-entry on the very
    /// same node. Absent instances have identity `0`.
    pub(crate) fn identity(self) -> usize {
        match self {
            Instance::Present(v) => v as *const Value as usize,
            Instance::Absent => 0,
        }
    }
}

impl<'a> From<&'a Value> for Instance<'a> {
    fn from(value: &'a Value) -> Self {
        Instance::Present(value)
    }
}

/// Serializes a value together with its type tags, with object keys sorted.
///
/// Two values share a canonical form exactly when they are equal *and* have
/// the same primitive types throughout, so `1`, `1.0`, `true` and `"1"` are
/// four different forms.
pub fn canonical_form(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => {
            out.push_str("b:");
            out.push_str(if *b { "true" } else { "false" });
        }
        Value::Number(n) => {
            out.push_str(if n.is_i64() || n.is_u64() { "i:" } else { "n:" });
            out.push_str(&n.to_string());
        }
        Value::String(s) => {
            out.push_str("s:");
            out.push_str(&Value::String(s.clone()).to_string());
        }
        Value::Array(items) => {
            out.push_str("a:[");
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push_str("o:{");
            for (idx, key) in keys.into_iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
    }
}

/// Type-strict deep equality, as used by `enum` and `uniqueItems`.
pub fn strict_equals(left: &Value, right: &Value) -> bool {
    canonical_form(left) == canonical_form(right)
}
