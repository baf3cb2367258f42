#![deny(missing_docs)]

//! # Value Casting
//!
//! Path, query and header values arrive as strings (or, for `multi`
//! collections, lists of strings). Before validation they are cast to the
//! type their parameter declares. A value that does not parse is left as it
//! is; the `type` keyword reports it afterwards.

use crate::schema::node::{CollectionFormat, Items, SchemaNode};
use crate::value::PrimitiveType;
use serde_json::{Number, Value};

/// Casts a raw wire value according to `schema`.
pub fn cast_value(raw: &Value, schema: &SchemaNode) -> Value {
    let Some(target) = target_type(schema) else {
        return raw.clone();
    };
    match target {
        PrimitiveType::Array => cast_array(raw, schema),
        scalar => match raw {
            Value::String(text) => cast_scalar(text, scalar),
            other => other.clone(),
        },
    }
}

/// The declared type a value is cast to; the first one that is not `null`.
fn target_type(schema: &SchemaNode) -> Option<PrimitiveType> {
    schema
        .declared_types()
        .into_iter()
        .find(|ty| *ty != PrimitiveType::Null)
}

fn cast_scalar(text: &str, target: PrimitiveType) -> Value {
    let cast = match target {
        PrimitiveType::Integer => cast_integer(text),
        PrimitiveType::Number => cast_integer(text).or_else(|| cast_float(text)),
        PrimitiveType::Boolean => cast_boolean(text),
        _ => None,
    };
    cast.unwrap_or_else(|| Value::String(text.to_string()))
}

fn cast_integer(text: &str) -> Option<Value> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }
    text.parse::<u64>().ok().map(|u| Value::Number(u.into()))
}

fn cast_float(text: &str) -> Option<Value> {
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn cast_boolean(text: &str) -> Option<Value> {
    match text {
        "true" | "True" | "1" => Some(Value::Bool(true)),
        "false" | "False" | "0" | "" => Some(Value::Bool(false)),
        _ => None,
    }
}

/// Splits a packed collection into trimmed, non-empty tokens.
pub fn split_collection(text: &str, format: CollectionFormat) -> Vec<String> {
    match format.delimiter() {
        Some(delimiter) => text
            .split(delimiter)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect(),
        None => {
            let token = text.trim();
            if token.is_empty() {
                Vec::new()
            } else {
                vec![token.to_string()]
            }
        }
    }
}

fn cast_array(raw: &Value, schema: &SchemaNode) -> Value {
    let format = schema.collection_format.unwrap_or_default();
    let tokens: Vec<Value> = match raw {
        Value::String(text) => split_collection(text, format)
            .into_iter()
            .map(Value::String)
            .collect(),
        Value::Array(items) => items.clone(),
        other => return other.clone(),
    };

    let cast = match &schema.items {
        Some(Items::Single(item)) => tokens.iter().map(|t| cast_value(t, item)).collect(),
        Some(Items::Tuple(items)) => tokens
            .iter()
            .enumerate()
            .map(|(idx, token)| match items.get(idx) {
                Some(item) => cast_value(token, item),
                None => token.clone(),
            })
            .collect(),
        None => tokens,
    };
    Value::Array(cast)
}

/// Packs `items` for the wire: the inverse of casting.
///
/// Returns `None` for `multi`, whose values travel as repeated keys instead.
pub fn join_collection(items: &[Value], format: CollectionFormat) -> Option<String> {
    let delimiter = format.delimiter()?;
    let tokens: Vec<String> = items.iter().map(render_token).collect();
    Some(tokens.join(&delimiter.to_string()))
}

fn render_token(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema(value: Value) -> SchemaNode {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_cast_scalars() {
        assert_eq!(cast_value(&json!("42"), &schema(json!({"type": "integer"}))), json!(42));
        assert_eq!(cast_value(&json!("4.5"), &schema(json!({"type": "number"}))), json!(4.5));
        assert_eq!(cast_value(&json!("4"), &schema(json!({"type": "number"}))), json!(4));
        assert_eq!(cast_value(&json!("abc"), &schema(json!({"type": "integer"}))), json!("abc"));
        assert_eq!(cast_value(&json!("12"), &schema(json!({"type": "string"}))), json!("12"));
        assert_eq!(cast_value(&json!("12"), &schema(json!({}))), json!("12"));
    }

    #[test]
    fn test_cast_booleans() {
        let boolean = schema(json!({"type": "boolean"}));
        for text in ["true", "True", "1"] {
            assert_eq!(cast_value(&json!(text), &boolean), json!(true));
        }
        for text in ["false", "False", "0", ""] {
            assert_eq!(cast_value(&json!(text), &boolean), json!(false));
        }
        assert_eq!(cast_value(&json!("yes"), &boolean), json!("yes"));
    }

    #[test]
    fn test_cast_arrays_by_format() {
        let pipes = schema(json!({
            "type": "array", "collectionFormat": "pipes", "items": {"type": "integer"}
        }));
        assert_eq!(cast_value(&json!("1| 2 ||3"), &pipes), json!([1, 2, 3]));

        let csv = schema(json!({"type": "array", "items": {"type": "boolean"}}));
        assert_eq!(cast_value(&json!("true,0"), &csv), json!([true, false]));

        let multi = schema(json!({
            "type": "array", "collectionFormat": "multi", "items": {"type": "integer"}
        }));
        assert_eq!(cast_value(&json!(["1", "2"]), &multi), json!([1, 2]));
    }

    #[test]
    fn test_cast_tuple_items_and_nested() {
        let tuple = schema(json!({
            "type": "array",
            "items": [{"type": "integer"}, {"type": "boolean"}]
        }));
        assert_eq!(cast_value(&json!("1,true,x"), &tuple), json!([1, true, "x"]));

        let nested = schema(json!({
            "type": "array",
            "collectionFormat": "pipes",
            "items": {"type": "array", "items": {"type": "integer"}}
        }));
        assert_eq!(cast_value(&json!("1,2|3"), &nested), json!([[1, 2], [3]]));
    }

    #[test]
    fn test_collection_round_trip() {
        let items = vec![json!(1), json!(22), json!(333)];
        for format in [
            CollectionFormat::Csv,
            CollectionFormat::Ssv,
            CollectionFormat::Tsv,
            CollectionFormat::Pipes,
        ] {
            let packed = join_collection(&items, format).unwrap();
            let node = SchemaNode {
                collection_format: Some(format),
                items: Some(Items::Single(Box::new(SchemaNode::of_type(
                    PrimitiveType::Integer,
                )))),
                ..SchemaNode::of_type(PrimitiveType::Array)
            };
            assert_eq!(cast_value(&Value::String(packed), &node), Value::Array(items.clone()));
        }
        assert_eq!(join_collection(&items, CollectionFormat::Multi), None);
    }
}
