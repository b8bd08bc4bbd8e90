//! Instance validation
//!
//! # Architecture
//!
//! - `SchemaValidator`: evaluates one compiled schema and dispatches each of
//!   its keywords to a keyword validator
//! - Keyword validators: implement [`KeywordValidator`], one struct per keyword
//!   family
//! - `ValidationContext`: per-evaluation state (locations, errors, annotations)
//!
//! # Error Handling
//!
//! Two categories of errors:
//! - `ValidationError`: instance failures accumulated in `ValidationContext` (non-fatal)
//! - `ValidatorError`: fail-fast errors (e.g. unresolvable references)

mod array;
mod composition;
mod context;
mod error;
mod object;
mod primitive;
mod reference;

pub use context::{Evaluation, SiblingScratch, ValidationContext, ValidationState};
pub use error::{ConditionalBranch, ValidationError, ValidationIssue, ValidatorError};

use serde_json::Value;

use crate::context::ScopeGuard;
use crate::keyword::{CompiledKeyword, Keyword};
use crate::schema::Schema;

use array::{
    ArrayLengthValidator, ContainsBoundValidator, ContainsValidator, ItemsValidator,
    PrefixItemsValidator, UnevaluatedItemsValidator, UniqueItemsValidator,
};
use composition::{
    AllOfValidator, AnyOfValidator, ConditionalBranchValidator, IfValidator, NotValidator,
    OneOfValidator,
};
use object::{
    AdditionalPropertiesValidator, DependentRequiredValidator, DependentSchemasValidator,
    PatternPropertiesValidator, PropertiesValidator, PropertyCountValidator,
    PropertyNamesValidator, RequiredValidator, UnevaluatedPropertiesValidator,
};
use primitive::{
    AnnotationValidator, ConstValidator, EnumValidator, FormatKeywordValidator,
    MultipleOfValidator, NumberBound, NumberBoundValidator, PatternValidator,
    StringLengthValidator, TypeValidator,
};
use reference::ReferenceValidator;

/// Length-like bounds shared by the string, array and object validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Min(u64),
    Max(u64),
}

/// A validator for one compiled keyword.
pub(crate) trait KeywordValidator {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError>;
}

// =============================================================================
// SchemaValidator (main dispatcher)
// =============================================================================

/// Evaluates a schema and dispatches to keyword validators.
pub struct SchemaValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub schema: &'a Schema,
}

impl<'a, 'c> SchemaValidator<'a, 'c> {
    pub fn validate(&self, instance: &Value) -> Result<(), ValidatorError> {
        match self.schema {
            Schema::Boolean(true) => Ok(()),
            Schema::Boolean(false) => {
                self.ctx.record_false_schema();
                Ok(())
            }
            Schema::Object(object) => {
                let _scope = ScopeGuard::enter(self.ctx.context, &object.base_uri);
                for keyword in &object.keywords {
                    self.validate_keyword(keyword, instance)?;
                }
                Ok(())
            }
        }
    }

    fn validate_keyword(
        &self,
        keyword: &'a CompiledKeyword,
        instance: &Value,
    ) -> Result<(), ValidatorError> {
        let ctx = self.ctx;
        match &keyword.keyword {
            // core
            Keyword::Ref(reference) => ReferenceValidator {
                ctx,
                keyword,
                reference,
                dynamic: false,
            }
            .validate(instance),
            Keyword::DynamicRef(reference) => ReferenceValidator {
                ctx,
                keyword,
                reference,
                dynamic: true,
            }
            .validate(instance),
            Keyword::Schema(_)
            | Keyword::Id(_)
            | Keyword::Anchor(_)
            | Keyword::DynamicAnchor(_)
            | Keyword::Defs
            | Keyword::Vocabulary
            | Keyword::Comment
            | Keyword::Reserved
            | Keyword::Unknown => Ok(()),

            // applicator
            Keyword::PrefixItems(schemas) => PrefixItemsValidator {
                ctx,
                keyword,
                schemas,
            }
            .validate(instance),
            Keyword::Items(schema) => ItemsValidator {
                ctx,
                keyword,
                schema,
            }
            .validate(instance),
            Keyword::Contains(contains) => ContainsValidator {
                ctx,
                keyword,
                contains,
            }
            .validate(instance),
            Keyword::Properties(properties) => PropertiesValidator {
                ctx,
                keyword,
                properties,
            }
            .validate(instance),
            Keyword::PatternProperties(patterns) => PatternPropertiesValidator {
                ctx,
                keyword,
                patterns,
            }
            .validate(instance),
            Keyword::AdditionalProperties(schema) => AdditionalPropertiesValidator {
                ctx,
                keyword,
                schema,
            }
            .validate(instance),
            Keyword::DependentSchemas(schemas) => DependentSchemasValidator {
                ctx,
                keyword,
                schemas,
            }
            .validate(instance),
            Keyword::PropertyNames(schema) => PropertyNamesValidator {
                ctx,
                keyword,
                schema,
            }
            .validate(instance),
            Keyword::If(schema) => IfValidator {
                ctx,
                keyword,
                schema,
            }
            .validate(instance),
            Keyword::Then(schema) => ConditionalBranchValidator {
                ctx,
                keyword,
                schema,
                branch: ConditionalBranch::Then,
            }
            .validate(instance),
            Keyword::Else(schema) => ConditionalBranchValidator {
                ctx,
                keyword,
                schema,
                branch: ConditionalBranch::Else,
            }
            .validate(instance),
            Keyword::AllOf(schemas) => AllOfValidator {
                ctx,
                keyword,
                schemas,
            }
            .validate(instance),
            Keyword::AnyOf(schemas) => AnyOfValidator {
                ctx,
                keyword,
                schemas,
            }
            .validate(instance),
            Keyword::OneOf(schemas) => OneOfValidator {
                ctx,
                keyword,
                schemas,
            }
            .validate(instance),
            Keyword::Not(schema) => NotValidator {
                ctx,
                keyword,
                schema,
            }
            .validate(instance),

            // unevaluated
            Keyword::UnevaluatedItems(schema) => UnevaluatedItemsValidator {
                ctx,
                keyword,
                schema,
            }
            .validate(instance),
            Keyword::UnevaluatedProperties(schema) => UnevaluatedPropertiesValidator {
                ctx,
                keyword,
                schema,
            }
            .validate(instance),

            // validation
            Keyword::Type(types) => TypeValidator {
                ctx,
                keyword,
                types,
            }
            .validate(instance),
            Keyword::Const(expected) => ConstValidator {
                ctx,
                keyword,
                expected,
            }
            .validate(instance),
            Keyword::Enum(values) => EnumValidator {
                ctx,
                keyword,
                values,
            }
            .validate(instance),
            Keyword::MultipleOf(multiple_of) => MultipleOfValidator {
                ctx,
                keyword,
                multiple_of: *multiple_of,
            }
            .validate(instance),
            Keyword::Minimum(limit) => NumberBoundValidator {
                ctx,
                keyword,
                bound: NumberBound::Minimum(*limit),
            }
            .validate(instance),
            Keyword::ExclusiveMinimum(limit) => NumberBoundValidator {
                ctx,
                keyword,
                bound: NumberBound::ExclusiveMinimum(*limit),
            }
            .validate(instance),
            Keyword::Maximum(limit) => NumberBoundValidator {
                ctx,
                keyword,
                bound: NumberBound::Maximum(*limit),
            }
            .validate(instance),
            Keyword::ExclusiveMaximum(limit) => NumberBoundValidator {
                ctx,
                keyword,
                bound: NumberBound::ExclusiveMaximum(*limit),
            }
            .validate(instance),
            Keyword::MinLength(limit) => StringLengthValidator {
                ctx,
                keyword,
                bound: Bound::Min(*limit),
            }
            .validate(instance),
            Keyword::MaxLength(limit) => StringLengthValidator {
                ctx,
                keyword,
                bound: Bound::Max(*limit),
            }
            .validate(instance),
            Keyword::Pattern(regex) => PatternValidator {
                ctx,
                keyword,
                regex,
            }
            .validate(instance),
            Keyword::MinItems(limit) => ArrayLengthValidator {
                ctx,
                keyword,
                bound: Bound::Min(*limit),
            }
            .validate(instance),
            Keyword::MaxItems(limit) => ArrayLengthValidator {
                ctx,
                keyword,
                bound: Bound::Max(*limit),
            }
            .validate(instance),
            Keyword::UniqueItems(unique) => UniqueItemsValidator {
                ctx,
                keyword,
                unique: *unique,
            }
            .validate(instance),
            Keyword::MinContains(limit) => ContainsBoundValidator {
                ctx,
                keyword,
                bound: Bound::Min(*limit),
            }
            .validate(instance),
            Keyword::MaxContains(limit) => ContainsBoundValidator {
                ctx,
                keyword,
                bound: Bound::Max(*limit),
            }
            .validate(instance),
            Keyword::MinProperties(limit) => PropertyCountValidator {
                ctx,
                keyword,
                bound: Bound::Min(*limit),
            }
            .validate(instance),
            Keyword::MaxProperties(limit) => PropertyCountValidator {
                ctx,
                keyword,
                bound: Bound::Max(*limit),
            }
            .validate(instance),
            Keyword::Required(required) => RequiredValidator {
                ctx,
                keyword,
                required,
            }
            .validate(instance),
            Keyword::DependentRequired(dependencies) => DependentRequiredValidator {
                ctx,
                keyword,
                dependencies,
            }
            .validate(instance),

            // format, meta-data, content
            Keyword::Format(format) => FormatKeywordValidator {
                ctx,
                keyword,
                format,
            }
            .validate(instance),
            Keyword::Title(_)
            | Keyword::Description(_)
            | Keyword::Default
            | Keyword::Deprecated(_)
            | Keyword::ReadOnly(_)
            | Keyword::WriteOnly(_)
            | Keyword::Examples
            | Keyword::ContentEncoding(_)
            | Keyword::ContentMediaType(_)
            | Keyword::ContentSchema => AnnotationValidator { ctx, keyword }.validate(instance),
        }
    }
}
