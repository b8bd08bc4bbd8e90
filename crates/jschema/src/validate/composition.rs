//! Composition validators
//!
//! `allOf`, `anyOf`, `oneOf`, `not` and the `if`/`then`/`else` conditional.
//! Every branch is evaluated so that annotations from all successful branches
//! reach `unevaluatedItems`/`unevaluatedProperties`.

use std::rc::Rc;

use jschema_pointer::PointerToken;
use serde_json::Value;

use crate::keyword::CompiledKeyword;
use crate::schema::Schema;

use super::context::{Evaluation, ValidationContext};
use super::error::{ConditionalBranch, ValidationIssue, ValidatorError};
use super::KeywordValidator;

/// Evaluate every branch of a list keyword against the same instance.
fn evaluate_branches(
    ctx: &ValidationContext<'_>,
    keyword: &CompiledKeyword,
    schemas: &[Rc<Schema>],
    instance: &Value,
) -> Result<Vec<Evaluation>, ValidatorError> {
    schemas
        .iter()
        .enumerate()
        .map(|(index, schema)| {
            ctx.evaluate(
                schema,
                instance,
                None,
                &[
                    PointerToken::Key(keyword.name().to_string()),
                    PointerToken::Index(index),
                ],
            )
        })
        .collect()
}

// =============================================================================
// AllOfValidator
// =============================================================================

pub struct AllOfValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub schemas: &'a [Rc<Schema>],
}

impl KeywordValidator for AllOfValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let evaluations = evaluate_branches(self.ctx, self.keyword, self.schemas, instance)?;

        let mut failed = Vec::new();
        let mut nested = Vec::new();
        for (index, evaluation) in evaluations.into_iter().enumerate() {
            if evaluation.valid {
                self.ctx.merge_annotations(evaluation.annotations);
            } else {
                failed.push(index);
                nested.extend(evaluation.errors);
            }
        }
        if !failed.is_empty() {
            self.ctx.record_error_with_nested(
                self.keyword,
                ValidationIssue::AllOfFailed { failed },
                nested,
            );
        }
        Ok(())
    }
}

// =============================================================================
// AnyOfValidator
// =============================================================================

pub struct AnyOfValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub schemas: &'a [Rc<Schema>],
}

impl KeywordValidator for AnyOfValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let evaluations = evaluate_branches(self.ctx, self.keyword, self.schemas, instance)?;

        let mut any_valid = false;
        let mut nested = Vec::new();
        for evaluation in evaluations {
            if evaluation.valid {
                any_valid = true;
                self.ctx.merge_annotations(evaluation.annotations);
            } else {
                nested.extend(evaluation.errors);
            }
        }
        if !any_valid {
            self.ctx
                .record_error_with_nested(self.keyword, ValidationIssue::AnyOfFailed, nested);
        }
        Ok(())
    }
}

// =============================================================================
// OneOfValidator
// =============================================================================

pub struct OneOfValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub schemas: &'a [Rc<Schema>],
}

impl KeywordValidator for OneOfValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let evaluations = evaluate_branches(self.ctx, self.keyword, self.schemas, instance)?;

        let matched: Vec<usize> = evaluations
            .iter()
            .enumerate()
            .filter(|(_, evaluation)| evaluation.valid)
            .map(|(index, _)| index)
            .collect();

        if matched.len() == 1 {
            for evaluation in evaluations {
                if evaluation.valid {
                    self.ctx.merge_annotations(evaluation.annotations);
                }
            }
            return Ok(());
        }

        // With several matches there are no branch errors worth reporting.
        let nested = if matched.is_empty() {
            evaluations.into_iter().flat_map(|e| e.errors).collect()
        } else {
            Vec::new()
        };
        self.ctx.record_error_with_nested(
            self.keyword,
            ValidationIssue::OneOfFailed { matched },
            nested,
        );
        Ok(())
    }
}

// =============================================================================
// NotValidator
// =============================================================================

/// Inverts its subschema. Annotations of the subschema are always dropped.
pub struct NotValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub schema: &'a Schema,
}

impl KeywordValidator for NotValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let evaluation = self.ctx.evaluate(
            self.schema,
            instance,
            None,
            &[PointerToken::Key(self.keyword.name().to_string())],
        )?;
        if evaluation.valid {
            self.ctx.record_error(self.keyword, ValidationIssue::NotFailed);
        }
        Ok(())
    }
}

// =============================================================================
// IfValidator / ConditionalBranchValidator
// =============================================================================

/// `if` never fails by itself; its outcome selects `then` or `else`.
pub struct IfValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub schema: &'a Schema,
}

impl KeywordValidator for IfValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let evaluation = self.ctx.evaluate(
            self.schema,
            instance,
            None,
            &[PointerToken::Key(self.keyword.name().to_string())],
        )?;
        self.ctx.set_if_outcome(evaluation.valid);
        if evaluation.valid {
            self.ctx.merge_annotations(evaluation.annotations);
        }
        Ok(())
    }
}

/// `then` or `else`; inert without a sibling `if`.
pub struct ConditionalBranchValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub schema: &'a Schema,
    pub branch: ConditionalBranch,
}

impl KeywordValidator for ConditionalBranchValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let applies = match (self.ctx.if_outcome(), self.branch) {
            (Some(true), ConditionalBranch::Then) | (Some(false), ConditionalBranch::Else) => true,
            _ => false,
        };
        if !applies {
            return Ok(());
        }

        let evaluation = self.ctx.evaluate(
            self.schema,
            instance,
            None,
            &[PointerToken::Key(self.keyword.name().to_string())],
        )?;
        if evaluation.valid {
            self.ctx.merge_annotations(evaluation.annotations);
        } else {
            self.ctx.record_error_with_nested(
                self.keyword,
                ValidationIssue::ConditionalFailed {
                    branch: self.branch,
                },
                evaluation.errors,
            );
        }
        Ok(())
    }
}
