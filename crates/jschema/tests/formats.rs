use jschema::{
    FnFormat, ValidationIssue, Validator, ValidatorOptions, builtin_formats, validate,
};
use serde_json::json;

#[test]
fn test_format_is_an_annotation_by_default() {
    let schema = json!({"format": "email"});
    let result = validate(&schema, &json!("not an email")).unwrap();
    assert!(result.valid);
    let formats: Vec<_> = result.annotations_of("format").collect();
    assert_eq!(formats.len(), 1);
    assert_eq!(formats[0].value, json!("email"));
}

#[test]
fn test_builtin_formats_assert_when_enabled() {
    let validator = Validator::builder()
        .builtin_formats()
        .build(&json!({"format": "email"}))
        .unwrap();
    assert!(validator.is_valid(&json!("joe@example.com")).unwrap());

    let result = validator.validate(&json!("not an email")).unwrap();
    assert!(!result.valid);
    assert_eq!(
        result.errors[0].issue,
        ValidationIssue::FormatMismatch {
            format: "email".to_string()
        }
    );
    // non-strings are not subject to formats
    assert!(validator.is_valid(&json!(42)).unwrap());
}

#[test]
fn test_assert_formats_option() {
    let options = ValidatorOptions {
        assert_formats: true,
        ..ValidatorOptions::default()
    };
    let validator = Validator::builder()
        .options(options)
        .build(&json!({
            "properties": {
                "ip": {"format": "ipv4"},
                "when": {"format": "date-time"},
                "id": {"format": "uuid"},
                "other": {"format": "made-up"}
            }
        }))
        .unwrap();
    assert!(validator
        .is_valid(&json!({
            "ip": "192.168.0.1",
            "when": "1963-06-19T08:30:06.283185Z",
            "id": "2eb8aa08-aa98-11ea-b4aa-73b441d16380",
            "other": "anything"
        }))
        .unwrap());
    assert!(!validator.is_valid(&json!({"ip": "256.0.0.1"})).unwrap());
    assert!(!validator.is_valid(&json!({"when": "1963-06-19 08:30:06Z"})).unwrap());
    assert!(!validator.is_valid(&json!({"id": "not-a-uuid"})).unwrap());
}

#[test]
fn test_custom_format_overrides_builtin() {
    let validator = Validator::builder()
        .builtin_formats()
        .format(FnFormat::new("email", |s: &str| s.ends_with("@example.org")))
        .format(FnFormat::new("even-length", |s: &str| s.len() % 2 == 0))
        .build(&json!({"anyOf": [{"format": "email"}, {"format": "even-length"}]}))
        .unwrap();
    assert!(validator.is_valid(&json!("a@example.org")).unwrap());
    assert!(validator.is_valid(&json!("ab")).unwrap());
    assert!(!validator.is_valid(&json!("abc@example.com")).unwrap());
}

#[test]
fn test_builtin_format_names() {
    let names: Vec<String> = builtin_formats()
        .iter()
        .map(|format| format.name().to_string())
        .collect();
    for name in ["email", "hostname", "ipv4", "ipv6", "uri", "regex", "json-pointer", "date", "uuid"] {
        assert!(names.iter().any(|n| n == name), "missing {name}");
    }
}
