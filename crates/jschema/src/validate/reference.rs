//! `$ref` and `$dynamicRef`

use jschema_pointer::PointerToken;
use serde_json::Value;

use crate::keyword::{CompiledKeyword, Reference};
use crate::resolve::Resolver;

use super::context::ValidationContext;
use super::error::{ValidationIssue, ValidatorError};
use super::KeywordValidator;

/// Applies the referenced schema to the current instance. The evaluation
/// path continues through the keyword, so errors under a reference carry
/// `/$ref/...` locations.
pub struct ReferenceValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub reference: &'a Reference,
    pub dynamic: bool,
}

impl KeywordValidator for ReferenceValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let resolver = Resolver::new(self.ctx.context);
        let schema = if self.dynamic {
            resolver.resolve_dynamic(self.reference)?
        } else {
            resolver.resolve(self.reference)?
        };

        let evaluation = self.ctx.evaluate(
            &schema,
            instance,
            None,
            &[PointerToken::Key(self.keyword.name().to_string())],
        )?;
        if evaluation.valid {
            self.ctx.merge_annotations(evaluation.annotations);
        } else {
            self.ctx.record_error_with_nested(
                self.keyword,
                ValidationIssue::ReferenceFailed {
                    reference: self.reference.reference.clone(),
                },
                evaluation.errors,
            );
        }
        Ok(())
    }
}
