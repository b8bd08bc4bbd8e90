//! Validation error types
//!
//! Two categories of errors:
//! - `ValidationError`: instance failures accumulated during validation (non-fatal)
//! - `ValidatorError`: problems that abort the run (unresolvable references,
//!   runaway recursion, lazy compilation failures)

use core::fmt;

use jschema_pointer::JsonPointer;
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::error::SchemaError;
use crate::keyword::InstanceType;

// =============================================================================
// ValidatorError (fail-fast errors)
// =============================================================================

/// Errors that stop validation immediately.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidatorError {
    /// A `$ref`/`$dynamicRef` target cannot be found
    #[error("cannot resolve reference '{reference}' against '{base}'")]
    InvalidReference { reference: String, base: String },

    #[error("recursion limit of {limit} exceeded at '{keyword_location}'")]
    RecursionLimitExceeded {
        limit: usize,
        keyword_location: String,
    },

    /// Compiling a referenced schema failed
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

// =============================================================================
// ValidationIssue
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalBranch {
    Then,
    Else,
}

impl fmt::Display for ConditionalBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionalBranch::Then => f.write_str("then"),
            ConditionalBranch::Else => f.write_str("else"),
        }
    }
}

/// What went wrong when a keyword rejected an instance.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationIssue {
    #[error("false schema does not allow any value")]
    FalseSchema,

    #[error("expected {}, found {actual}", join(.expected, " or "))]
    TypeMismatch {
        expected: Vec<InstanceType>,
        actual: InstanceType,
    },

    #[error("value is not one of the enumerated values")]
    NotInEnum,

    #[error("value does not equal the constant {expected}")]
    ConstMismatch { expected: Value },

    #[error("{value} is not a multiple of {multiple_of}")]
    NotMultipleOf { multiple_of: f64, value: f64 },

    #[error("{value} is less than the minimum of {limit}")]
    BelowMinimum { limit: f64, value: f64 },

    #[error("{value} is less than or equal to the exclusive minimum of {limit}")]
    BelowExclusiveMinimum { limit: f64, value: f64 },

    #[error("{value} is greater than the maximum of {limit}")]
    AboveMaximum { limit: f64, value: f64 },

    #[error("{value} is greater than or equal to the exclusive maximum of {limit}")]
    AboveExclusiveMaximum { limit: f64, value: f64 },

    #[error("string of length {length} is shorter than {limit}")]
    StringTooShort { limit: u64, length: usize },

    #[error("string of length {length} is longer than {limit}")]
    StringTooLong { limit: u64, length: usize },

    #[error("string does not match pattern {pattern}")]
    PatternMismatch { pattern: String },

    #[error("string is not a valid {format}")]
    FormatMismatch { format: String },

    #[error("array of {count} items has fewer than {limit}")]
    TooFewItems { limit: u64, count: usize },

    #[error("array of {count} items has more than {limit}")]
    TooManyItems { limit: u64, count: usize },

    #[error("items at {first} and {second} are equal")]
    ItemsNotUnique { first: usize, second: usize },

    #[error("{matched} items match 'contains', at least {limit} required")]
    TooFewContains { limit: u64, matched: usize },

    #[error("{matched} items match 'contains', at most {limit} allowed")]
    TooManyContains { limit: u64, matched: usize },

    #[error("object with {count} properties has fewer than {limit}")]
    TooFewProperties { limit: u64, count: usize },

    #[error("object with {count} properties has more than {limit}")]
    TooManyProperties { limit: u64, count: usize },

    #[error("missing required properties: {}", .missing.join(", "))]
    MissingRequiredProperties { missing: Vec<String> },

    #[error("property '{property}' requires {}", .missing.join(", "))]
    MissingDependentProperties {
        property: String,
        missing: Vec<String>,
    },

    #[error("items at {} do not match 'prefixItems'", join(.indices, ", "))]
    PrefixItemsFailed { indices: Vec<usize> },

    #[error("items at {} do not match 'items'", join(.indices, ", "))]
    ItemsFailed { indices: Vec<usize> },

    #[error("properties {} do not match 'properties'", .properties.join(", "))]
    PropertiesFailed { properties: Vec<String> },

    #[error("properties {} do not match 'patternProperties'", .properties.join(", "))]
    PatternPropertiesFailed { properties: Vec<String> },

    #[error("additional properties {} are not allowed", .properties.join(", "))]
    AdditionalPropertiesFailed { properties: Vec<String> },

    #[error("property names {} are not valid", .names.join(", "))]
    PropertyNamesFailed { names: Vec<String> },

    #[error("dependent schemas of {} do not match", .properties.join(", "))]
    DependentSchemasFailed { properties: Vec<String> },

    #[error("unevaluated items at {} are not allowed", join(.indices, ", "))]
    UnevaluatedItemsFailed { indices: Vec<usize> },

    #[error("unevaluated properties {} are not allowed", .properties.join(", "))]
    UnevaluatedPropertiesFailed { properties: Vec<String> },

    #[error("subschemas {} of allOf do not match", join(.failed, ", "))]
    AllOfFailed { failed: Vec<usize> },

    #[error("value does not match any subschema of anyOf")]
    AnyOfFailed,

    #[error("value must match exactly one subschema of oneOf, matched {}", .matched.len())]
    OneOfFailed { matched: Vec<usize> },

    #[error("value must not match the 'not' subschema")]
    NotFailed,

    #[error("value does not match the '{branch}' subschema")]
    ConditionalFailed { branch: ConditionalBranch },

    #[error("value does not match the schema referenced by '{reference}'")]
    ReferenceFailed { reference: String },
}

fn join<T: fmt::Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

// =============================================================================
// ValidationError
// =============================================================================

/// One failed keyword, with the failures of its subschemas nested below it.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{issue} (instance '{instance_location}', keyword '{keyword_location}')")]
pub struct ValidationError {
    /// Keyword name; empty for a `false` schema
    pub keyword: String,
    pub issue: ValidationIssue,
    /// Evaluation path of the keyword, following references
    pub keyword_location: JsonPointer,
    pub absolute_keyword_location: Option<Url>,
    pub instance_location: JsonPointer,
    pub nested: Vec<ValidationError>,
}

impl ValidationError {
    /// This error and all nested errors, depth first.
    pub fn flatten(&self) -> Vec<&ValidationError> {
        let mut out = vec![self];
        for nested in &self.nested {
            out.extend(nested.flatten());
        }
        out
    }

    /// Errors without nested causes.
    pub fn leaves(&self) -> Vec<&ValidationError> {
        self.flatten()
            .into_iter()
            .filter(|error| error.nested.is_empty())
            .collect()
    }

    pub fn to_output_unit(&self) -> Value {
        let mut unit = Map::new();
        unit.insert(
            "keywordLocation".to_string(),
            Value::String(self.keyword_location.to_string()),
        );
        if let Some(absolute) = &self.absolute_keyword_location {
            unit.insert(
                "absoluteKeywordLocation".to_string(),
                Value::String(absolute.to_string()),
            );
        }
        unit.insert(
            "instanceLocation".to_string(),
            Value::String(self.instance_location.to_string()),
        );
        unit.insert("error".to_string(), Value::String(self.issue.to_string()));
        Value::Object(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(keyword: &str, issue: ValidationIssue, nested: Vec<ValidationError>) -> ValidationError {
        ValidationError {
            keyword: keyword.to_string(),
            issue,
            keyword_location: JsonPointer::root().with_key(keyword),
            absolute_keyword_location: None,
            instance_location: JsonPointer::root(),
            nested,
        }
    }

    #[test]
    fn test_flatten_is_depth_first() {
        let leaf_a = error("type", ValidationIssue::FalseSchema, vec![]);
        let leaf_b = error("minimum", ValidationIssue::BelowMinimum { limit: 1.0, value: 0.0 }, vec![]);
        let middle = error("allOf", ValidationIssue::AllOfFailed { failed: vec![0] }, vec![leaf_a]);
        let root = error("anyOf", ValidationIssue::AnyOfFailed, vec![middle, leaf_b]);
        let keywords: Vec<_> = root.flatten().iter().map(|e| e.keyword.as_str()).collect();
        assert_eq!(keywords, ["anyOf", "allOf", "type", "minimum"]);
        let leaves: Vec<_> = root.leaves().iter().map(|e| e.keyword.as_str()).collect();
        assert_eq!(leaves, ["type", "minimum"]);
    }

    #[test]
    fn test_issue_messages() {
        let issue = ValidationIssue::TypeMismatch {
            expected: vec![InstanceType::String, InstanceType::Null],
            actual: InstanceType::Integer,
        };
        assert_eq!(issue.to_string(), "expected string or null, found integer");
        let issue = ValidationIssue::MissingRequiredProperties {
            missing: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(issue.to_string(), "missing required properties: a, b");
    }

    #[test]
    fn test_output_unit() {
        let e = error("type", ValidationIssue::NotInEnum, vec![]);
        let unit = e.to_output_unit();
        assert_eq!(unit["keywordLocation"], "/type");
        assert_eq!(unit["instanceLocation"], "");
        assert!(unit.get("absoluteKeywordLocation").is_none());
    }
}
