#![doc = include_str!("../README.md")]

mod annotation;
mod compile;
mod config;
mod context;
mod dialect;
mod error;
mod format;
mod keyword;
mod meta;
mod output;
mod resolve;
mod schema;
mod utils;
pub mod validate;
mod validator;

pub use annotation::{
    AnnotationContainer, AnnotationKey, AnnotationRecord, AnnotationValue, ContainsMatches,
    ItemCoverage,
};
pub use config::{DEFAULT_MAX_DEPTH, ValidatorOptions};
pub use context::{Anchor, Context, DEFAULT_BASE_URI};
pub use dialect::{DRAFT_2020_12, Dialect, Vocabulary, VocabularySet, bundled_document, bundled_uris};
pub use error::SchemaError;
pub use format::{FnFormat, FormatValidator, builtin_formats};
pub use keyword::{CompiledKeyword, InstanceType, Keyword, KeywordContext, KeywordKind};
pub use meta::{meta_validator, meta_validator_for, validate_schema};
pub use output::{OutputFormat, UnknownOutputFormat, ValidationResult};
pub use schema::{ObjectSchema, Schema, SchemaLocation};
pub use validate::{ConditionalBranch, ValidationError, ValidationIssue, ValidatorError};
pub use validator::{Validator, ValidatorBuilder};

pub use jschema_pointer::{JsonPointer, PointerToken};

use serde_json::Value;

/// Compile `schema` and validate `instance` against it.
pub fn validate(schema: &Value, instance: &Value) -> Result<ValidationResult, ValidatorError> {
    Validator::new(schema)?.validate(instance)
}

/// Compile `schema` and check whether `instance` is valid against it.
pub fn is_valid(schema: &Value, instance: &Value) -> Result<bool, ValidatorError> {
    Ok(validate(schema, instance)?.valid)
}
