//! Schema construction errors.
//!
//! Failures while compiling a schema document are reported as [`SchemaError`].
//! Failures found while validating an instance are either accumulated as
//! [`ValidationError`](crate::ValidationError) or abort the run as
//! [`ValidatorError`](crate::ValidatorError).

use jschema_pointer::JsonPointer;
use thiserror::Error;

/// Errors raised while compiling a schema document.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaError {
    /// A schema position holds something other than a boolean or an object.
    #[error("schema at '{location}' must be a boolean or an object")]
    SchemaShouldBeBooleanOrObject { location: String },

    /// `$vocabulary` lists a vocabulary as required that this crate does not implement.
    #[error("unsupported required vocabulary: {vocabulary}")]
    UnsupportedRequiredVocabulary { vocabulary: String },

    /// `$vocabulary` is not an object of URI keys to boolean values.
    #[error("invalid $vocabulary at '{location}': expected an object of URI to boolean")]
    InvalidVocabularyFormat { location: String },

    /// `$schema` names a meta-schema that is neither bundled nor pre-registered.
    #[error("unsupported dialect: {uri}")]
    UnsupportedDialect { uri: String },

    #[error("invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("invalid JSON pointer '{pointer}'")]
    InvalidPointer { pointer: String },

    /// The builder was asked to check the schema against its meta-schema and it failed.
    #[error("schema is not valid against its meta-schema: {}", .errors.join("; "))]
    MetaSchemaValidation { errors: Vec<String> },

    #[error("JSON error: {0}")]
    Json(String),
}

impl SchemaError {
    pub(crate) fn not_a_schema(document: &url::Url, pointer: &JsonPointer) -> Self {
        SchemaError::SchemaShouldBeBooleanOrObject {
            location: format!("{document}#{pointer}"),
        }
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(error: serde_json::Error) -> Self {
        SchemaError::Json(error.to_string())
    }
}
