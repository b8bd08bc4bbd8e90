//! Object validators
//!
//! The properties family, `propertyNames`, `required`, the dependent keywords,
//! `minProperties`/`maxProperties` and `unevaluatedProperties`.

use std::collections::BTreeSet;
use std::rc::Rc;

use indexmap::IndexMap;
use jschema_pointer::PointerToken;
use serde_json::{Map, Value};

use crate::annotation::{AnnotationKey, AnnotationValue};
use crate::keyword::{CompiledKeyword, PatternSchema};
use crate::schema::Schema;

use super::context::ValidationContext;
use super::error::{ValidationError, ValidationIssue, ValidatorError};
use super::{Bound, KeywordValidator};

/// Failing property names with the errors of their subschemas.
#[derive(Default)]
struct PropertyFailures {
    properties: Vec<String>,
    nested: Vec<ValidationError>,
}

impl PropertyFailures {
    fn push(&mut self, property: &str, errors: Vec<ValidationError>) {
        if !self.properties.iter().any(|p| p == property) {
            self.properties.push(property.to_string());
        }
        self.nested.extend(errors);
    }

    fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Evaluate one property value, merging annotations on success.
fn apply_to_property(
    ctx: &ValidationContext<'_>,
    schema: &Schema,
    name: &str,
    value: &Value,
    keyword_path: &[PointerToken],
    failures: &mut PropertyFailures,
) -> Result<(), ValidatorError> {
    let evaluation = ctx.evaluate(
        schema,
        value,
        Some(PointerToken::Key(name.to_string())),
        keyword_path,
    )?;
    if evaluation.valid {
        ctx.merge_annotations(evaluation.annotations);
    } else {
        failures.push(name, evaluation.errors);
    }
    Ok(())
}

fn keyword_token(keyword: &CompiledKeyword) -> PointerToken {
    PointerToken::Key(keyword.name().to_string())
}

// =============================================================================
// PropertiesValidator
// =============================================================================

pub struct PropertiesValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub properties: &'a IndexMap<String, Rc<Schema>>,
}

impl KeywordValidator for PropertiesValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let Value::Object(object) = instance else {
            return Ok(());
        };

        let mut evaluated = BTreeSet::new();
        let mut failures = PropertyFailures::default();
        for (name, schema) in self.properties {
            let Some(value) = object.get(name) else {
                continue;
            };
            evaluated.insert(name.clone());
            apply_to_property(
                self.ctx,
                schema,
                name,
                value,
                &[keyword_token(self.keyword), PointerToken::Key(name.clone())],
                &mut failures,
            )?;
        }

        self.ctx.annotate(
            self.keyword,
            AnnotationKey::Properties,
            AnnotationValue::Names(evaluated),
        );
        if !failures.is_empty() {
            self.ctx.record_error_with_nested(
                self.keyword,
                ValidationIssue::PropertiesFailed {
                    properties: failures.properties,
                },
                failures.nested,
            );
        }
        Ok(())
    }
}

// =============================================================================
// PatternPropertiesValidator
// =============================================================================

pub struct PatternPropertiesValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub patterns: &'a [PatternSchema],
}

impl KeywordValidator for PatternPropertiesValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let Value::Object(object) = instance else {
            return Ok(());
        };

        let mut evaluated = BTreeSet::new();
        let mut failures = PropertyFailures::default();
        for (name, value) in object {
            for pattern in self.patterns {
                if !pattern.regex.is_match(name) {
                    continue;
                }
                evaluated.insert(name.clone());
                apply_to_property(
                    self.ctx,
                    &pattern.schema,
                    name,
                    value,
                    &[
                        keyword_token(self.keyword),
                        PointerToken::Key(pattern.pattern.clone()),
                    ],
                    &mut failures,
                )?;
            }
        }

        self.ctx.annotate(
            self.keyword,
            AnnotationKey::PatternProperties,
            AnnotationValue::Names(evaluated),
        );
        if !failures.is_empty() {
            self.ctx.record_error_with_nested(
                self.keyword,
                ValidationIssue::PatternPropertiesFailed {
                    properties: failures.properties,
                },
                failures.nested,
            );
        }
        Ok(())
    }
}

// =============================================================================
// AdditionalPropertiesValidator
// =============================================================================

/// Applies to the properties neither sibling `properties` nor
/// `patternProperties` evaluated.
pub struct AdditionalPropertiesValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub schema: &'a Schema,
}

impl KeywordValidator for AdditionalPropertiesValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let Value::Object(object) = instance else {
            return Ok(());
        };
        let mut covered = BTreeSet::new();
        for key in [AnnotationKey::Properties, AnnotationKey::PatternProperties] {
            if let Some(AnnotationValue::Names(names)) = self.ctx.sibling_annotation(key) {
                covered.extend(names);
            }
        }

        let (evaluated, failures) =
            apply_to_remaining(self.ctx, self.keyword, self.schema, object, &covered)?;
        self.ctx.annotate(
            self.keyword,
            AnnotationKey::AdditionalProperties,
            AnnotationValue::Names(evaluated),
        );
        if !failures.is_empty() {
            self.ctx.record_error_with_nested(
                self.keyword,
                ValidationIssue::AdditionalPropertiesFailed {
                    properties: failures.properties,
                },
                failures.nested,
            );
        }
        Ok(())
    }
}

/// Evaluate `schema` against every property whose name is not in `covered`.
fn apply_to_remaining(
    ctx: &ValidationContext<'_>,
    keyword: &CompiledKeyword,
    schema: &Schema,
    object: &Map<String, Value>,
    covered: &BTreeSet<String>,
) -> Result<(BTreeSet<String>, PropertyFailures), ValidatorError> {
    let mut evaluated = BTreeSet::new();
    let mut failures = PropertyFailures::default();
    for (name, value) in object {
        if covered.contains(name) {
            continue;
        }
        evaluated.insert(name.clone());
        apply_to_property(
            ctx,
            schema,
            name,
            value,
            &[keyword_token(keyword)],
            &mut failures,
        )?;
    }
    Ok((evaluated, failures))
}

// =============================================================================
// PropertyNamesValidator
// =============================================================================

/// Evaluates each property name as a string instance. Produces no annotations.
pub struct PropertyNamesValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub schema: &'a Schema,
}

impl KeywordValidator for PropertyNamesValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let Value::Object(object) = instance else {
            return Ok(());
        };

        let mut failures = PropertyFailures::default();
        for name in object.keys() {
            let evaluation = self.ctx.evaluate(
                self.schema,
                &Value::String(name.clone()),
                None,
                &[keyword_token(self.keyword)],
            )?;
            if !evaluation.valid {
                failures.push(name, evaluation.errors);
            }
        }
        if !failures.is_empty() {
            self.ctx.record_error_with_nested(
                self.keyword,
                ValidationIssue::PropertyNamesFailed {
                    names: failures.properties,
                },
                failures.nested,
            );
        }
        Ok(())
    }
}

// =============================================================================
// RequiredValidator / DependentRequiredValidator
// =============================================================================

pub struct RequiredValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub required: &'a [String],
}

impl KeywordValidator for RequiredValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let Value::Object(object) = instance else {
            return Ok(());
        };
        let missing = missing_properties(object, self.required);
        if !missing.is_empty() {
            self.ctx.record_error(
                self.keyword,
                ValidationIssue::MissingRequiredProperties { missing },
            );
        }
        Ok(())
    }
}

fn missing_properties(object: &Map<String, Value>, names: &[String]) -> Vec<String> {
    names
        .iter()
        .filter(|name| !object.contains_key(name.as_str()))
        .cloned()
        .collect()
}

pub struct DependentRequiredValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub dependencies: &'a IndexMap<String, Vec<String>>,
}

impl KeywordValidator for DependentRequiredValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let Value::Object(object) = instance else {
            return Ok(());
        };
        for (property, required) in self.dependencies {
            if !object.contains_key(property) {
                continue;
            }
            let missing = missing_properties(object, required);
            if !missing.is_empty() {
                self.ctx.record_error(
                    self.keyword,
                    ValidationIssue::MissingDependentProperties {
                        property: property.clone(),
                        missing,
                    },
                );
            }
        }
        Ok(())
    }
}

// =============================================================================
// DependentSchemasValidator
// =============================================================================

/// Applies each subschema to the whole object when its property is present.
pub struct DependentSchemasValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub schemas: &'a IndexMap<String, Rc<Schema>>,
}

impl KeywordValidator for DependentSchemasValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let Value::Object(object) = instance else {
            return Ok(());
        };

        let mut failures = PropertyFailures::default();
        for (property, schema) in self.schemas {
            if !object.contains_key(property) {
                continue;
            }
            let evaluation = self.ctx.evaluate(
                schema,
                instance,
                None,
                &[keyword_token(self.keyword), PointerToken::Key(property.clone())],
            )?;
            if evaluation.valid {
                self.ctx.merge_annotations(evaluation.annotations);
            } else {
                failures.push(property, evaluation.errors);
            }
        }
        if !failures.is_empty() {
            self.ctx.record_error_with_nested(
                self.keyword,
                ValidationIssue::DependentSchemasFailed {
                    properties: failures.properties,
                },
                failures.nested,
            );
        }
        Ok(())
    }
}

// =============================================================================
// PropertyCountValidator
// =============================================================================

pub struct PropertyCountValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub bound: Bound,
}

impl KeywordValidator for PropertyCountValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let Value::Object(object) = instance else {
            return Ok(());
        };
        let count = object.len();
        let issue = match self.bound {
            Bound::Min(limit) if (count as u64) < limit => {
                ValidationIssue::TooFewProperties { limit, count }
            }
            Bound::Max(limit) if (count as u64) > limit => {
                ValidationIssue::TooManyProperties { limit, count }
            }
            _ => return Ok(()),
        };
        self.ctx.record_error(self.keyword, issue);
        Ok(())
    }
}

// =============================================================================
// UnevaluatedPropertiesValidator
// =============================================================================

/// Applies to the properties no adjacent keyword or successful subschema
/// evaluated.
pub struct UnevaluatedPropertiesValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub schema: &'a Schema,
}

const EVALUATED_PROPERTY_KEYS: [AnnotationKey; 4] = [
    AnnotationKey::Properties,
    AnnotationKey::PatternProperties,
    AnnotationKey::AdditionalProperties,
    AnnotationKey::UnevaluatedProperties,
];

impl KeywordValidator for UnevaluatedPropertiesValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let Value::Object(object) = instance else {
            return Ok(());
        };
        let mut covered = BTreeSet::new();
        for key in EVALUATED_PROPERTY_KEYS {
            if let Some(AnnotationValue::Names(names)) = self.ctx.evaluated_annotation(key) {
                covered.extend(names);
            }
        }
        if object.keys().all(|name| covered.contains(name)) {
            return Ok(());
        }

        let (evaluated, failures) =
            apply_to_remaining(self.ctx, self.keyword, self.schema, object, &covered)?;
        self.ctx.annotate(
            self.keyword,
            AnnotationKey::UnevaluatedProperties,
            AnnotationValue::Names(evaluated),
        );
        if !failures.is_empty() {
            self.ctx.record_error_with_nested(
                self.keyword,
                ValidationIssue::UnevaluatedPropertiesFailed {
                    properties: failures.properties,
                },
                failures.nested,
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_properties_keeps_declared_order() {
        let Value::Object(object) = json!({"b": 1}) else {
            unreachable!()
        };
        let names = ["c", "b", "a"].map(String::from);
        assert_eq!(missing_properties(&object, &names), ["c", "a"]);
    }

    #[test]
    fn test_property_failures_deduplicate_names() {
        let mut failures = PropertyFailures::default();
        failures.push("a", Vec::new());
        failures.push("a", Vec::new());
        failures.push("b", Vec::new());
        assert_eq!(failures.properties, ["a", "b"]);
    }
}
