use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use swagcheck_core::{
    cast_value, join_collection, load_document, validate_document, validate_value_against_schema,
    ResolutionContext, SchemaNode, SchemaValidator,
};

fn node(value: Value) -> SchemaNode {
    serde_json::from_value(value).unwrap()
}

fn definitions(value: Value) -> ResolutionContext {
    let table: IndexMap<String, SchemaNode> = serde_json::from_value(value).unwrap();
    ResolutionContext::with_definitions(table)
}

#[test]
fn test_all_of_single_branch_matches_branch() {
    let resolution = ResolutionContext::default();
    let branch = json!({
        "type": "object",
        "required": ["id"],
        "properties": {"id": {"type": "integer", "minimum": 1}}
    });
    let plain = node(branch.clone());
    let wrapped = node(json!({"allOf": [branch]}));

    for value in [json!({"id": 3}), json!({"id": 0}), json!({}), json!("x"), json!(null)] {
        assert_eq!(
            validate_value_against_schema(&value, &plain, &resolution).is_ok(),
            validate_value_against_schema(&value, &wrapped, &resolution).is_ok(),
            "{value}"
        );
    }
}

#[test]
fn test_any_of_needs_one_branch() {
    let resolution = ResolutionContext::default();
    let schema = node(json!({
        "anyOf": [{"type": "string", "maxLength": 3}, {"type": "integer"}]
    }));

    assert!(validate_value_against_schema(&json!("abc"), &schema, &resolution).is_ok());
    assert!(validate_value_against_schema(&json!(12), &schema, &resolution).is_ok());

    let err = validate_value_against_schema(&json!("abcd"), &schema, &resolution).unwrap_err();
    assert!(err.contains("anyOf"));
    assert!(err.contains("anyOf.maxLength"));
    assert!(err.contains("anyOf.type"));
}

#[test]
fn test_any_of_with_one_branch_is_not_compiled() {
    assert!(SchemaValidator::compile(&node(json!({"anyOf": [{"type": "string"}]}))).is_err());
}

#[test]
fn test_unique_items_compares_json_equality() {
    let resolution = ResolutionContext::default();
    let schema = node(json!({"type": "array", "uniqueItems": true}));

    assert!(validate_value_against_schema(&json!([true, 1, "1"]), &schema, &resolution).is_ok());
    let err = validate_value_against_schema(&json!([1, 2, 1]), &schema, &resolution).unwrap_err();
    assert!(err.contains("uniqueItems"));
}

#[test]
fn test_multiple_of_decimal_divisor() {
    let resolution = ResolutionContext::default();
    let schema = node(json!({"type": "number", "multipleOf": 0.1}));

    for ok in [json!(0.3), json!(1.1), json!(7), json!(-0.5)] {
        assert!(validate_value_against_schema(&ok, &schema, &resolution).is_ok(), "{ok}");
    }
    let err = validate_value_against_schema(&json!(0.35), &schema, &resolution).unwrap_err();
    assert!(err.contains("multipleOf"));
}

#[test]
fn test_self_reference_terminates() {
    let resolution = definitions(json!({
        "Node": {
            "type": "object",
            "properties": {
                "value": {"type": "integer"},
                "next": {"$ref": "#/definitions/Node"}
            }
        }
    }));
    let schema = node(json!({"$ref": "#/definitions/Node"}));

    let chain = json!({"value": 1, "next": {"value": 2, "next": {"value": 3}}});
    assert!(validate_value_against_schema(&chain, &schema, &resolution).is_ok());

    let broken = json!({"value": 1, "next": {"value": 2, "next": {"value": "three"}}});
    let err = validate_value_against_schema(&broken, &schema, &resolution).unwrap_err();
    assert_eq!(
        err.issues().into_iter().map(|i| i.path).collect::<Vec<_>>(),
        vec!["next.next.value.type"]
    );
}

#[test]
fn test_reference_into_definition_property() {
    let resolution = definitions(json!({
        "Pet": {
            "type": "object",
            "properties": {"name": {"type": "string", "minLength": 2}}
        }
    }));
    let schema = node(json!({"$ref": "#/definitions/Pet/properties/name"}));

    assert!(validate_value_against_schema(&json!("rex"), &schema, &resolution).is_ok());
    let err = validate_value_against_schema(&json!(3), &schema, &resolution).unwrap_err();
    assert!(err.contains("type"));
    let err = validate_value_against_schema(&json!("r"), &schema, &resolution).unwrap_err();
    assert!(err.contains("minLength"));
}

#[test]
fn test_unresolved_reference_reported_at_use() {
    let resolution = ResolutionContext::default();
    let schema = node(json!({
        "type": "object",
        "properties": {"owner": {"$ref": "#/definitions/Owner"}}
    }));

    assert!(validate_value_against_schema(&json!({}), &schema, &resolution).is_ok());
    let err = validate_value_against_schema(&json!({"owner": {}}), &schema, &resolution).unwrap_err();
    assert!(err.contains("owner.$ref"));
}

#[test]
fn test_concurrent_validation_is_idempotent() {
    let resolution = Arc::new(definitions(json!({
        "Tree": {
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": {"type": "string", "pattern": "^[a-z]+$"},
                "children": {"type": "array", "items": {"$ref": "#/definitions/Tree"}}
            }
        }
    })));
    let validator = Arc::new(SchemaValidator::compile(&node(json!({"$ref": "#/definitions/Tree"}))).unwrap());
    let values = [
        json!({"name": "root", "children": [{"name": "leaf"}]}),
        json!({"name": "root", "children": [{"name": "Leaf"}, {}]}),
        json!({"children": []}),
    ];
    let expected: Vec<_> = values
        .iter()
        .map(|v| validator.validate(v, &resolution))
        .collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let validator = Arc::clone(&validator);
                let resolution = Arc::clone(&resolution);
                let values = &values;
                scope.spawn(move || {
                    (0..20)
                        .map(|_| {
                            values
                                .iter()
                                .map(|v| validator.validate(v, &resolution))
                                .collect::<Vec<_>>()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            for round in handle.join().unwrap() {
                assert_eq!(round, expected);
            }
        }
    });

    assert!(expected[0].is_ok());
    let second = expected[1].as_ref().unwrap_err();
    assert!(second.contains("children.0.name.pattern"));
    assert!(second.contains("children.1.name.required"));
    assert!(expected[2].as_ref().unwrap_err().contains("name.required"));
}

#[test]
fn test_collection_round_trip() {
    let schema = node(json!({
        "type": "array",
        "collectionFormat": "pipes",
        "items": {"type": "integer"}
    }));
    let cast = cast_value(&json!("1|2|3"), &schema);
    assert_eq!(cast, json!([1, 2, 3]));

    let items = cast.as_array().unwrap();
    assert_eq!(
        join_collection(items, schema.collection_format.unwrap()),
        Some("1|2|3".to_string())
    );
}

#[test]
fn test_cast_leaves_uncastable_text_alone() {
    let schema = node(json!({"type": "integer"}));
    assert_eq!(cast_value(&json!("12"), &schema), json!(12));
    assert_eq!(cast_value(&json!("twelve"), &schema), json!("twelve"));
}

#[test]
fn test_validate_document_reports_problems() {
    let (swagger, loader) = load_document(json!({
        "swagger": "2.0",
        "paths": {
            "/pets/{petId}": {
                "get": {
                    "parameters": [
                        {"name": "id", "in": "path", "required": true, "type": "string"}
                    ],
                    "responses": {"200": {"description": "ok"}}
                }
            }
        },
        "definitions": {
            "Pet": {
                "type": "object",
                "properties": {
                    "name": {"type": "string", "pattern": "(unclosed"},
                    "owner": {"$ref": "#/definitions/Owner"}
                }
            },
            "Count": {"type": "integer", "maxLength": 3}
        }
    }))
    .unwrap();

    let issues = validate_document(&swagger, &loader);
    let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
    assert!(paths.iter().any(|p| p.starts_with("references.")), "{paths:?}");
    assert!(paths.iter().any(|p| p.contains("name.pattern")), "{paths:?}");
    assert!(paths.iter().any(|p| p.contains("Count.maxLength")), "{paths:?}");
    assert!(paths.iter().any(|p| p.ends_with("parameters.id")), "{paths:?}");
    assert!(paths.iter().any(|p| p.ends_with("parameters.petId")), "{paths:?}");
}

#[test]
fn test_consistent_document_has_no_issues() {
    let (swagger, loader) = load_document(json!({
        "swagger": "2.0",
        "paths": {
            "/pets/{petId}": {
                "parameters": [
                    {"name": "petId", "in": "path", "required": true, "type": "integer"}
                ],
                "get": {"responses": {"200": {"description": "ok", "schema": {"$ref": "#/definitions/Pet"}}}}
            }
        },
        "definitions": {
            "Pet": {
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "nickname": {"$ref": "#/definitions/Pet/properties/name"}
                }
            }
        }
    }))
    .unwrap();
    let issues = validate_document(&swagger, &loader);
    assert!(issues.is_empty(), "{issues:?}");
}
