use jschema::{OutputFormat, Validator, ValidatorOptions, validate};
use serde_json::{Value, json};

fn one_of_schema() -> Value {
    json!({
        "oneOf": [
            {"properties": {"a": true}, "required": ["a"]},
            {"properties": {"b": true}, "required": ["b"]}
        ],
        "unevaluatedProperties": false
    })
}

#[test]
fn test_annotations_come_from_the_matching_branch_only() {
    let validator = Validator::new(&one_of_schema()).unwrap();

    let result = validator.validate(&json!({"a": 1})).unwrap();
    assert!(result.valid);
    let properties: Vec<_> = result.annotations_of("properties").collect();
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0].keyword_location.to_string(), "/oneOf/0/properties");
    assert_eq!(properties[0].instance_location.to_string(), "");
    assert_eq!(properties[0].value, json!(["a"]));

    for instance in [json!({"a": 1, "b": 1}), json!({"a": 1, "c": 1}), json!({})] {
        let result = validator.validate(&instance).unwrap();
        assert!(!result.valid, "{instance}");
        assert!(result.annotations.is_empty());
    }
}

#[test]
fn test_flag_output() {
    let validator = Validator::new(&one_of_schema()).unwrap();
    let output = validator
        .validate(&json!({}))
        .unwrap()
        .to_output(OutputFormat::Flag);
    assert_eq!(output, json!({"valid": false}));
}

#[test]
fn test_basic_output_lists_errors_depth_first() {
    let schema = json!({
        "type": "object",
        "properties": {"name": {"type": "string"}},
        "required": ["id"]
    });
    let output = validate(&schema, &json!({"name": 5}))
        .unwrap()
        .to_output(OutputFormat::Basic);
    assert_eq!(output["valid"], false);
    assert!(output.get("annotations").is_none());

    let errors = output["errors"].as_array().unwrap();
    let locations: Vec<_> = errors
        .iter()
        .map(|unit| unit["keywordLocation"].as_str().unwrap())
        .collect();
    assert_eq!(locations, ["/required", "/properties", "/properties/name/type"]);
    assert!(errors[0]["error"].as_str().unwrap().contains("id"));
    assert_eq!(errors[2]["instanceLocation"], "/name");
    assert_eq!(errors[2]["absoluteKeywordLocation"], "json-schema:///#/properties/name/type");
}

#[test]
fn test_basic_output_of_valid_instance_carries_annotations() {
    let schema = json!({
        "title": "Person",
        "properties": {"name": {"description": "Full name", "default": "anon"}}
    });
    let validator = Validator::new(&schema).unwrap();
    let output = validator.output(&json!({"name": "Ada"})).unwrap();
    assert_eq!(output["valid"], true);

    let annotations = output["annotations"].as_array().unwrap();
    let find = |location: &str| {
        annotations
            .iter()
            .find(|unit| unit["keywordLocation"] == location)
            .unwrap_or_else(|| panic!("no annotation at {location}"))
    };
    assert_eq!(find("/title")["annotation"], "Person");
    assert_eq!(find("/properties/name/description")["annotation"], "Full name");
    assert_eq!(find("/properties/name/description")["instanceLocation"], "/name");
    assert_eq!(find("/properties/name/default")["annotation"], "anon");
    assert_eq!(find("/properties")["annotation"], json!(["name"]));
}

#[test]
fn test_output_format_follows_options() {
    let options = ValidatorOptions {
        output: OutputFormat::Flag,
        ..ValidatorOptions::default()
    };
    let validator = Validator::builder()
        .options(options)
        .build(&json!({"minimum": 1}))
        .unwrap();
    assert_eq!(validator.output(&json!(0)).unwrap(), json!({"valid": false}));
}

#[test]
fn test_result_serializes_as_basic_output() {
    let result = validate(&json!({"const": 1}), &json!(2)).unwrap();
    let serialized = serde_json::to_value(&result).unwrap();
    assert_eq!(serialized, result.to_output(OutputFormat::Basic));
}

#[test]
fn test_annotation_collection_can_be_disabled() {
    let options = ValidatorOptions {
        collect_annotations: false,
        ..ValidatorOptions::default()
    };
    let validator = Validator::builder()
        .options(options)
        .build(&one_of_schema())
        .unwrap();

    let result = validator.validate(&json!({"a": 1})).unwrap();
    assert!(result.valid);
    assert!(result.annotations.is_empty());
    // unevaluatedProperties still sees what the branches evaluated
    assert!(!validator.is_valid(&json!({"a": 1, "c": 1})).unwrap());
}

#[test]
fn test_item_annotations() {
    let schema = json!({
        "prefixItems": [true, true],
        "contains": {"type": "string"}
    });
    let result = validate(&schema, &json!([1, "a", "b"])).unwrap();
    assert!(result.valid);
    let prefix: Vec<_> = result.annotations_of("prefixItems").collect();
    assert_eq!(prefix[0].value, json!(1));
    let contains: Vec<_> = result.annotations_of("contains").collect();
    assert_eq!(contains[0].value, json!([1, 2]));

    let result = validate(&schema, &json!(["a", "b"])).unwrap();
    let prefix: Vec<_> = result.annotations_of("prefixItems").collect();
    assert_eq!(prefix[0].value, json!(true));
    let contains: Vec<_> = result.annotations_of("contains").collect();
    assert_eq!(contains[0].value, json!(true));
}

#[test]
fn test_output_format_parses() {
    assert_eq!("flag".parse::<OutputFormat>().unwrap(), OutputFormat::Flag);
    assert_eq!("basic".parse::<OutputFormat>().unwrap(), OutputFormat::Basic);
    assert!("verbose".parse::<OutputFormat>().is_err());
    assert_eq!(OutputFormat::default(), OutputFormat::Basic);
}
