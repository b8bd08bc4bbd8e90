//! Meta-schema validation.
//!
//! Checks a schema document against the bundled 2020-12 meta-schema. The
//! meta-schema is compiled with the same machinery as user schemas, so this
//! also runs its `$dynamicRef: "#meta"` chain through the resolver.

use serde_json::Value;
use url::Url;

use crate::config::ValidatorOptions;
use crate::dialect::{Dialect, bundled_document};
use crate::error::SchemaError;
use crate::output::ValidationResult;
use crate::validate::ValidatorError;
use crate::validator::{Validator, ValidatorBuilder};

/// Validate `schema` against the 2020-12 meta-schema.
pub fn validate_schema(schema: &Value) -> Result<ValidationResult, ValidatorError> {
    meta_validator()?.validate(schema)
}

/// A validator for the bundled 2020-12 meta-schema.
pub fn meta_validator() -> Result<Validator, SchemaError> {
    meta_validator_for(Dialect::default())
}

/// A validator for the bundled meta-schema of `dialect`.
pub fn meta_validator_for(dialect: Dialect) -> Result<Validator, SchemaError> {
    let uri = dialect.meta_schema_uri();
    let document = bundled_document(uri).ok_or_else(|| SchemaError::UnsupportedDialect {
        uri: uri.to_string(),
    })?;
    let base_uri = Url::parse(uri).map_err(|e| SchemaError::InvalidUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;
    ValidatorBuilder::new()
        .base_uri(base_uri)
        .options(ValidatorOptions {
            collect_annotations: false,
            ..ValidatorOptions::default()
        })
        .build(document)
}
