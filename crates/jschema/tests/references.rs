use jschema::{ValidationIssue, Validator, ValidatorError, ValidatorOptions, is_valid, validate};
use serde_json::{Value, json};
use url::Url;

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

#[test]
fn test_ref_to_defs_reports_evaluation_path() {
    let schema = json!({
        "properties": {"age": {"$ref": "#/$defs/positiveInteger"}},
        "$defs": {"positiveInteger": {"type": "integer", "minimum": 1}}
    });
    let result = validate(&schema, &json!({"age": 0})).unwrap();
    assert!(!result.valid);

    let leaves: Vec<_> = result.errors[0].leaves();
    assert_eq!(leaves.len(), 1);
    assert_eq!(
        leaves[0].keyword_location.to_string(),
        "/properties/age/$ref/minimum"
    );
    assert_eq!(leaves[0].instance_location.to_string(), "/age");
    assert_eq!(
        leaves[0].issue,
        ValidationIssue::BelowMinimum {
            limit: 1.0,
            value: 0.0
        }
    );
    assert_eq!(
        leaves[0].absolute_keyword_location.as_ref().map(Url::as_str),
        Some("json-schema:///#/$defs/positiveInteger/minimum")
    );
}

#[test]
fn test_ref_applies_alongside_siblings() {
    let schema = json!({
        "$ref": "#/$defs/int",
        "minimum": 5,
        "$defs": {"int": {"type": "integer"}}
    });
    assert!(is_valid(&schema, &json!(6)).unwrap());
    assert!(!is_valid(&schema, &json!(6.5)).unwrap());
    assert!(!is_valid(&schema, &json!(4)).unwrap());
}

#[test]
fn test_ref_to_anchor_in_embedded_resource() {
    let schema = json!({
        "$id": "http://example.com/root.json",
        "properties": {
            "a": {"$ref": "item.json#positive"},
            "b": {"$ref": "item.json"}
        },
        "$defs": {
            "item": {
                "$id": "item.json",
                "type": "object",
                "$defs": {"positive": {"$anchor": "positive", "exclusiveMinimum": 0}}
            }
        }
    });
    assert!(is_valid(&schema, &json!({"a": 1, "b": {}})).unwrap());
    assert!(!is_valid(&schema, &json!({"a": 0})).unwrap());
    assert!(!is_valid(&schema, &json!({"b": 1})).unwrap());
}

#[test]
fn test_pointer_fragment_is_relative_to_the_resource() {
    let schema = json!({
        "$id": "http://example.com/root.json",
        "$defs": {
            "inner": {
                "$id": "inner.json",
                "properties": {"x": {"$ref": "#/$defs/str"}},
                "$defs": {"str": {"type": "string"}}
            },
            "str": {"type": "integer"}
        },
        "$ref": "inner.json"
    });
    assert!(is_valid(&schema, &json!({"x": "s"})).unwrap());
    assert!(!is_valid(&schema, &json!({"x": 1})).unwrap());
}

#[test]
fn test_urn_base_uri() {
    let schema = json!({
        "$id": "urn:uuid:deadbeef-1234-ffff-ffff-4321feebdaed",
        "properties": {"foo": {"$ref": "#/$defs/bar"}},
        "$defs": {"bar": {"type": "string"}}
    });
    assert!(is_valid(&schema, &json!({"foo": "bar"})).unwrap());
    assert!(!is_valid(&schema, &json!({"foo": 12})).unwrap());
}

#[test]
fn test_recursive_ref_to_root() {
    let schema = json!({
        "properties": {"child": {"$ref": "#"}},
        "additionalProperties": false
    });
    assert!(is_valid(&schema, &json!({"child": {"child": {}}})).unwrap());
    assert!(!is_valid(&schema, &json!({"child": {"child": {"other": 1}}})).unwrap());
}

#[test]
fn test_unresolvable_ref_is_an_error() {
    let err = validate(&json!({"$ref": "#/$defs/missing"}), &json!(1)).unwrap_err();
    assert!(matches!(err, ValidatorError::InvalidReference { .. }), "{err:?}");

    let err = validate(&json!({"$ref": "http://example.com/nowhere.json"}), &json!(1)).unwrap_err();
    assert!(matches!(err, ValidatorError::InvalidReference { .. }), "{err:?}");
}

#[test]
fn test_unused_unresolvable_ref_is_not_evaluated() {
    let schema = json!({
        "if": false,
        "then": {"$ref": "#/$defs/missing"}
    });
    assert!(is_valid(&schema, &json!(1)).unwrap());
}

#[test]
fn test_infinite_recursion_hits_the_limit() {
    let options = ValidatorOptions {
        max_depth: 32,
        ..ValidatorOptions::default()
    };
    let validator = Validator::builder()
        .options(options)
        .build(&json!({"$ref": "#"}))
        .unwrap();
    let err = validator.validate(&json!(1)).unwrap_err();
    assert!(
        matches!(err, ValidatorError::RecursionLimitExceeded { limit: 32, .. }),
        "{err:?}"
    );
}

fn nested_arrays(depth: usize, leaf: Value) -> Value {
    (0..depth).fold(leaf, |inner, _| Value::Array(vec![inner]))
}

#[test]
fn test_deep_instance_is_not_a_recursion_error() {
    // Each level costs several stack frames in debug builds.
    std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(|| {
            let schema = json!({"type": "array", "items": {"$ref": "#"}});
            assert!(is_valid(&schema, &nested_arrays(300, json!([]))).unwrap());

            let result = validate(&schema, &nested_arrays(300, json!(1))).unwrap();
            assert!(!result.valid);
            let leaves = result.flat_errors();
            let leaf = leaves.last().unwrap();
            assert_eq!(leaf.instance_location.to_string(), "/0".repeat(300));
            assert!(matches!(leaf.issue, ValidationIssue::TypeMismatch { .. }));
        })
        .unwrap()
        .join()
        .unwrap();
}

#[test]
fn test_remote_ref() {
    let validator = Validator::builder()
        .remote_schema(
            url("http://localhost:1234/draft2020-12/integer.json"),
            json!({"$schema": "https://json-schema.org/draft/2020-12/schema", "type": "integer"}),
        )
        .build(&json!({"$ref": "http://localhost:1234/draft2020-12/integer.json"}))
        .unwrap();
    assert!(validator.is_valid(&json!(1)).unwrap());
    assert!(!validator.is_valid(&json!("a")).unwrap());
}

#[test]
fn test_base_uri_change_in_subschema() {
    let schema = json!({
        "$id": "http://localhost:1234/draft2020-12/",
        "items": {
            "$id": "baseUriChange/",
            "items": {"$ref": "folderInteger.json"}
        }
    });
    let validator = Validator::builder()
        .remote_schema(
            url("http://localhost:1234/draft2020-12/baseUriChange/folderInteger.json"),
            json!({"type": "integer"}),
        )
        .build(&schema)
        .unwrap();
    assert!(validator.is_valid(&json!([[1]])).unwrap());
    assert!(!validator.is_valid(&json!([["a"]])).unwrap());
}

#[test]
fn test_ref_to_bundled_meta_schema() {
    let schema = json!({"$ref": "https://json-schema.org/draft/2020-12/schema"});
    assert!(is_valid(&schema, &json!({"type": "string"})).unwrap());
    assert!(!is_valid(&schema, &json!({"type": 12})).unwrap());
}

fn strict_tree() -> Value {
    json!({
        "$id": "https://example.com/strict-tree",
        "$dynamicAnchor": "node",
        "$ref": "tree",
        "unevaluatedProperties": false,
        "$defs": {
            "tree": {
                "$id": "tree",
                "$dynamicAnchor": "node",
                "type": "object",
                "properties": {
                    "data": true,
                    "children": {
                        "type": "array",
                        "items": {"$dynamicRef": "#node"}
                    }
                }
            }
        }
    })
}

#[test]
fn test_dynamic_ref_extends_recursive_schema() {
    let validator = Validator::new(&strict_tree()).unwrap();
    assert!(validator
        .is_valid(&json!({"children": [{"data": 1, "children": []}]}))
        .unwrap());
    // the misspelled nested property is caught by the outermost schema
    assert!(!validator.is_valid(&json!({"children": [{"daat": 1}]})).unwrap());
}

#[test]
fn test_dynamic_ref_resolves_to_outermost_anchor() {
    let schema = json!({
        "$id": "https://example.com/typical-dynamic-resolution/root",
        "$ref": "list",
        "$defs": {
            "foo": {"$dynamicAnchor": "items", "type": "string"},
            "list": {
                "$id": "list",
                "type": "array",
                "items": {"$dynamicRef": "#items"},
                "$defs": {"items": {"$dynamicAnchor": "items"}}
            }
        }
    });
    let validator = Validator::new(&schema).unwrap();
    assert!(validator.is_valid(&json!(["foo", "bar"])).unwrap());
    assert!(!validator.is_valid(&json!(["foo", 42])).unwrap());
}

#[test]
fn test_dynamic_ref_to_plain_anchor_is_static() {
    let schema = json!({
        "$id": "https://example.com/static/root",
        "$dynamicAnchor": "items",
        "type": "array",
        "$ref": "list",
        "$defs": {
            "list": {
                "$id": "list",
                "items": {"$dynamicRef": "#items"},
                "$defs": {"items": {"$anchor": "items", "type": "integer"}}
            }
        }
    });
    let validator = Validator::new(&schema).unwrap();
    assert!(validator.is_valid(&json!([1, 2])).unwrap());
    assert!(!validator.is_valid(&json!(["a"])).unwrap());
}

#[test]
fn test_dynamic_scope_resets_between_validations() {
    let validator = Validator::new(&strict_tree()).unwrap();
    for _ in 0..3 {
        assert!(!validator.is_valid(&json!({"children": [{"daat": 1}]})).unwrap());
        assert!(validator.is_valid(&json!({"data": 1})).unwrap());
    }
}
