#![deny(missing_docs)]

//! # Format Checkers
//!
//! Named `format` checks. A checker only looks at values of its carrier
//! type, so `format: date-time` never complains about a number; the `type`
//! keyword reports those. Unknown format names are accepted silently.

use crate::value::PrimitiveType;
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;
use url::Url;
use uuid::Uuid;

/// A named format check.
pub struct FormatChecker {
    /// Format name as written in documents.
    pub name: &'static str,
    /// Primitive types the check applies to.
    pub carriers: &'static [PrimitiveType],
    check: fn(&Value) -> bool,
}

impl fmt::Debug for FormatChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatChecker")
            .field("name", &self.name)
            .field("carriers", &self.carriers)
            .finish()
    }
}

impl FormatChecker {
    /// Runs the check. Values of other types pass.
    pub fn accepts(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

const STRING: &[PrimitiveType] = &[PrimitiveType::String];
const INTEGER: &[PrimitiveType] = &[PrimitiveType::Integer];

static CHECKERS: &[FormatChecker] = &[
    FormatChecker {
        name: "date-time",
        carriers: STRING,
        check: is_date_time,
    },
    FormatChecker {
        name: "date",
        carriers: STRING,
        check: is_date,
    },
    FormatChecker {
        name: "uuid",
        carriers: STRING,
        check: is_uuid,
    },
    FormatChecker {
        name: "email",
        carriers: STRING,
        check: is_email,
    },
    FormatChecker {
        name: "uri",
        carriers: STRING,
        check: is_uri,
    },
    FormatChecker {
        name: "int32",
        carriers: INTEGER,
        check: is_int32,
    },
    FormatChecker {
        name: "int64",
        carriers: INTEGER,
        check: is_int64,
    },
];

/// The checker registered under `name`, if any.
pub fn lookup(name: &str) -> Option<&'static FormatChecker> {
    CHECKERS.iter().find(|checker| checker.name == name)
}

/// Names of every registered format.
pub fn known_formats() -> impl Iterator<Item = &'static str> {
    CHECKERS.iter().map(|checker| checker.name)
}

fn is_date_time(value: &Value) -> bool {
    value
        .as_str()
        .map_or(true, |s| DateTime::parse_from_rfc3339(s).is_ok())
}

fn is_date(value: &Value) -> bool {
    value
        .as_str()
        .map_or(true, |s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
}

fn is_uuid(value: &Value) -> bool {
    value.as_str().map_or(true, |s| Uuid::parse_str(s).is_ok())
}

fn email_pattern() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok())
        .as_ref()
}

fn is_email(value: &Value) -> bool {
    match (value.as_str(), email_pattern()) {
        (Some(s), Some(pattern)) => pattern.is_match(s),
        _ => true,
    }
}

fn is_uri(value: &Value) -> bool {
    value.as_str().map_or(true, |s| Url::parse(s).is_ok())
}

fn is_int32(value: &Value) -> bool {
    match value {
        Value::Number(n) if n.is_i64() => n
            .as_i64()
            .map_or(false, |i| i32::try_from(i).is_ok()),
        Value::Number(n) if n.is_u64() => false,
        _ => true,
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => !n.is_u64() || n.is_i64(),
        _ => true,
    }
}
