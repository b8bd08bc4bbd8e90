use jschema::{SchemaError, Validator, VocabularySet, Vocabulary, is_valid, validate};
use serde_json::{Value, json};
use url::Url;

const NO_VALIDATION: &str = "http://localhost:1234/draft2020-12/metaschema-no-validation.json";

fn no_validation_meta_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": NO_VALIDATION,
        "$vocabulary": {
            "https://json-schema.org/draft/2020-12/vocab/applicator": true,
            "https://json-schema.org/draft/2020-12/vocab/core": true
        },
        "$dynamicAnchor": "meta",
        "allOf": [
            {"$ref": "https://json-schema.org/draft/2020-12/meta/applicator"},
            {"$ref": "https://json-schema.org/draft/2020-12/meta/core"}
        ]
    })
}

fn build(schema: &Value) -> Result<Validator, SchemaError> {
    Validator::builder()
        .remote_schema(Url::parse(NO_VALIDATION).unwrap(), no_validation_meta_schema())
        .build(schema)
}

#[test]
fn test_custom_meta_schema_disables_validation_vocabulary() {
    let validator = build(&json!({
        "$schema": NO_VALIDATION,
        "properties": {
            "badProperty": false,
            "numberProperty": {"minimum": 10}
        }
    }))
    .unwrap();
    // applicator keywords still apply
    assert!(!validator.is_valid(&json!({"badProperty": "this property should not exist"})).unwrap());
    // validation keywords are inert
    assert!(validator.is_valid(&json!({"numberProperty": 1})).unwrap());
    assert!(validator.is_valid(&json!({"numberProperty": 20})).unwrap());

    let numbers = validator.schema().keyword("properties").unwrap();
    assert_eq!(numbers.raw, json!({"badProperty": false, "numberProperty": {"minimum": 10}}));
}

#[test]
fn test_unknown_dialect_is_rejected() {
    let err = Validator::new(&json!({"$schema": "http://json-schema.org/draft-07/schema#"}))
        .unwrap_err();
    assert!(matches!(err, SchemaError::UnsupportedDialect { .. }), "{err:?}");

    let err = Validator::new(&json!({"$schema": "not a uri"})).unwrap_err();
    assert!(matches!(err, SchemaError::UnsupportedDialect { .. }), "{err:?}");
}

#[test]
fn test_draft_2020_12_dialect_with_or_without_fragment() {
    for uri in [
        "https://json-schema.org/draft/2020-12/schema",
        "https://json-schema.org/draft/2020-12/schema#",
    ] {
        let schema = json!({"$schema": uri, "minimum": 3});
        assert!(!is_valid(&schema, &json!(1)).unwrap());
    }
}

#[test]
fn test_required_unknown_vocabulary_is_rejected() {
    let err = Validator::new(&json!({
        "$vocabulary": {"https://example.com/vocab/custom": true}
    }))
    .unwrap_err();
    assert_eq!(
        err,
        SchemaError::UnsupportedRequiredVocabulary {
            vocabulary: "https://example.com/vocab/custom".to_string()
        }
    );
}

#[test]
fn test_optional_unknown_vocabulary_is_ignored() {
    let schema = json!({
        "$vocabulary": {"https://example.com/vocab/custom": false},
        "type": "string"
    });
    assert!(is_valid(&schema, &json!("a")).unwrap());
    assert!(!is_valid(&schema, &json!(1)).unwrap());
}

#[test]
fn test_malformed_vocabulary_is_rejected() {
    for vocabulary in [
        json!(["https://json-schema.org/draft/2020-12/vocab/core"]),
        json!({"https://json-schema.org/draft/2020-12/vocab/core": "yes"}),
        json!({"no scheme": true}),
    ] {
        let err = Validator::new(&json!({"$vocabulary": vocabulary})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidVocabularyFormat { .. }), "{err:?}");
    }
}

#[test]
fn test_non_schema_values_are_rejected() {
    let err = Validator::new(&json!(42)).unwrap_err();
    assert!(matches!(err, SchemaError::SchemaShouldBeBooleanOrObject { .. }));

    let err = Validator::new(&json!({"properties": {"a": 3}})).unwrap_err();
    assert!(matches!(err, SchemaError::SchemaShouldBeBooleanOrObject { .. }));
}

#[test]
fn test_unknown_keywords_and_reserved_keywords_are_inert() {
    let schema = json!({
        "x-custom": {"type": "string"},
        "definitions": {"a": {"type": "string"}},
        "dependencies": {"a": ["b"]}
    });
    let result = validate(&schema, &json!({"a": 1})).unwrap();
    assert!(result.valid);
    assert!(result.annotations.iter().all(|record| record.keyword != "x-custom"));
}

#[test]
fn test_vocabulary_set() {
    let all = VocabularySet::all();
    assert!(all.contains(Vocabulary::Validation));
    assert!(all.contains(Vocabulary::Unevaluated));

    let some = VocabularySet::from_vocabularies([Vocabulary::Core, Vocabulary::Applicator]);
    assert!(!some.contains(Vocabulary::Validation));
    assert_eq!(some.iter().count(), 2);
}
