//! Validator facade
//!
//! A [`Validator`] owns the compiled root schema and the [`Context`] behind
//! it. Referenced schemas are compiled lazily on first use and cached, so
//! repeated validations reuse them.

use std::rc::Rc;

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::compile::SchemaCompiler;
use crate::config::ValidatorOptions;
use crate::context::{Context, DEFAULT_BASE_URI};
use crate::dialect::Dialect;
use crate::error::SchemaError;
use crate::format::{FormatValidator, builtin_formats};
use crate::meta;
use crate::output::ValidationResult;
use crate::schema::Schema;
use crate::validate::{ValidationContext, ValidatorError};

/// A compiled schema ready to validate instances.
///
/// Not `Send`: compiled schemas share subschemas through `Rc`. Build one
/// validator per thread.
#[derive(Debug)]
pub struct Validator {
    context: Context,
    root: Rc<Schema>,
    options: ValidatorOptions,
}

impl Validator {
    /// Compile `schema` with default options.
    pub fn new(schema: &Value) -> Result<Self, SchemaError> {
        ValidatorBuilder::new().build(schema)
    }

    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }

    pub fn schema(&self) -> &Schema {
        &self.root
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Dialect declared by the schema's `$schema`, 2020-12 when absent.
    pub fn dialect(&self) -> Dialect {
        self.context.dialect()
    }

    /// Check the compiled schema document against the meta-schema of its dialect.
    pub fn check_schema(&self) -> Result<ValidationResult, ValidatorError> {
        let document = self
            .context
            .document(self.context.root_uri())
            .ok_or_else(|| ValidatorError::InvalidReference {
                reference: self.context.root_uri().to_string(),
                base: self.context.root_uri().to_string(),
            })?;
        meta::meta_validator_for(self.dialect())?.validate(&document)
    }

    /// Validate `instance`.
    ///
    /// Invalid instances produce an `Ok` result with `valid == false`; `Err` is
    /// reserved for unresolvable references, runaway recursion and referenced
    /// schemas that fail to compile.
    pub fn validate(&self, instance: &Value) -> Result<ValidationResult, ValidatorError> {
        self.context.reset_dynamic_scope();
        let ctx = ValidationContext::new(&self.context, &self.options);
        let evaluation = ctx.evaluate(&self.root, instance, None, &[])?;
        Ok(ValidationResult {
            valid: evaluation.valid,
            keyword_location: ctx.keyword_location(),
            instance_location: ctx.instance_location(),
            errors: evaluation.errors,
            annotations: evaluation.annotations.into_records(),
        })
    }

    pub fn is_valid(&self, instance: &Value) -> Result<bool, ValidatorError> {
        Ok(self.validate(instance)?.valid)
    }

    /// Validate `instance` and render the result in the configured output format.
    pub fn output(&self, instance: &Value) -> Result<Value, ValidatorError> {
        Ok(self.validate(instance)?.to_output(self.options.output))
    }
}

// =============================================================================
// ValidatorBuilder
// =============================================================================

#[derive(Default)]
pub struct ValidatorBuilder {
    options: ValidatorOptions,
    base_uri: Option<Url>,
    remotes: Vec<(Url, Value)>,
    formats: Vec<Box<dyn FormatValidator>>,
    builtin_formats: bool,
}

impl ValidatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Retrieval URI of the root schema. Relative `$id`s and references
    /// resolve against it. Defaults to `json-schema:///`.
    pub fn base_uri(mut self, uri: Url) -> Self {
        self.base_uri = Some(uri);
        self
    }

    /// Make `document` available to references targeting `uri`.
    pub fn remote_schema(mut self, uri: Url, document: Value) -> Self {
        self.remotes.push((uri, document));
        self
    }

    /// Register a format validator, replacing a built-in of the same name.
    pub fn format(mut self, validator: impl FormatValidator + 'static) -> Self {
        self.formats.push(Box::new(validator));
        self
    }

    /// Register every built-in format validator, whatever `assert_formats` says.
    pub fn builtin_formats(mut self) -> Self {
        self.builtin_formats = true;
        self
    }

    pub fn build(self, schema: &Value) -> Result<Validator, SchemaError> {
        if self.options.validate_schema {
            check_against_meta_schema(schema)?;
        }

        let base_uri = match self.base_uri {
            Some(uri) => uri,
            None => Url::parse(DEFAULT_BASE_URI).map_err(|e| SchemaError::InvalidUri {
                uri: DEFAULT_BASE_URI.to_string(),
                reason: e.to_string(),
            })?,
        };
        let mut context = Context::new(base_uri, schema.clone());
        for (uri, document) in self.remotes {
            context.add_remote_document(uri, document);
        }
        if self.options.assert_formats || self.builtin_formats {
            for validator in builtin_formats() {
                context.register_format(validator);
            }
        }
        for validator in self.formats {
            context.register_format(validator);
        }

        let root = SchemaCompiler::new(&context).compile_at(&context.root_location())?;
        debug!(root = %context.root_uri(), "compiled root schema");
        Ok(Validator {
            context,
            root,
            options: self.options,
        })
    }
}

fn check_against_meta_schema(schema: &Value) -> Result<(), SchemaError> {
    let result = match meta::validate_schema(schema) {
        Ok(result) => result,
        Err(ValidatorError::Schema(error)) => return Err(error),
        Err(error) => {
            return Err(SchemaError::MetaSchemaValidation {
                errors: vec![error.to_string()],
            });
        }
    };
    if result.valid {
        return Ok(());
    }
    Err(SchemaError::MetaSchemaValidation {
        errors: result
            .flat_errors()
            .into_iter()
            .filter(|error| error.nested.is_empty())
            .map(ToString::to_string)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FnFormat;
    use serde_json::json;

    #[test]
    fn test_validate_reuses_compiled_schema() {
        let validator = Validator::new(&json!({"type": "integer"})).unwrap();
        assert!(validator.is_valid(&json!(3)).unwrap());
        assert!(!validator.is_valid(&json!("3")).unwrap());
        assert!(validator.is_valid(&json!(4)).unwrap());
    }

    #[test]
    fn test_custom_format() {
        let validator = Validator::builder()
            .format(FnFormat::new("even", |s: &str| s.len() % 2 == 0))
            .build(&json!({"format": "even"}))
            .unwrap();
        assert!(validator.is_valid(&json!("ab")).unwrap());
        assert!(!validator.is_valid(&json!("abc")).unwrap());
        assert!(validator.is_valid(&json!(3)).unwrap());
    }

    #[test]
    fn test_validate_schema_option_rejects_malformed_schema() {
        let options = ValidatorOptions {
            validate_schema: true,
            ..ValidatorOptions::default()
        };
        let err = Validator::builder()
            .options(options)
            .build(&json!({"type": 123}))
            .unwrap_err();
        assert!(matches!(err, SchemaError::MetaSchemaValidation { .. }));
    }

    #[test]
    fn test_builtin_formats_survive_later_options() {
        let validator = Validator::builder()
            .builtin_formats()
            .options(ValidatorOptions::default())
            .build(&json!({"format": "ipv4"}))
            .unwrap();
        assert!(!validator.options().assert_formats);
        assert!(validator.is_valid(&json!("127.0.0.1")).unwrap());
        assert!(!validator.is_valid(&json!("not an address")).unwrap());
    }

    #[test]
    fn test_dialect_and_check_schema() {
        let validator = Validator::new(&json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema#",
            "minLength": -1
        }))
        .unwrap();
        assert_eq!(validator.dialect(), Dialect::Draft202012);
        assert!(!validator.check_schema().unwrap().valid);

        let validator = Validator::new(&json!({"minLength": 1})).unwrap();
        assert!(validator.check_schema().unwrap().valid);
    }

    #[test]
    fn test_base_uri_applies_to_relative_references() {
        let validator = Validator::builder()
            .base_uri(Url::parse("http://example.com/schemas/root.json").unwrap())
            .remote_schema(
                Url::parse("http://example.com/schemas/item.json").unwrap(),
                json!({"type": "string"}),
            )
            .build(&json!({"items": {"$ref": "item.json"}}))
            .unwrap();
        assert!(validator.is_valid(&json!(["a", "b"])).unwrap());
        assert!(!validator.is_valid(&json!(["a", 2])).unwrap());
    }
}
