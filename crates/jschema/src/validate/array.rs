//! Array validators
//!
//! `prefixItems`, `items`, `contains` with its bounds, `minItems`/`maxItems`,
//! `uniqueItems` and `unevaluatedItems`.

use std::collections::BTreeSet;
use std::rc::Rc;

use jschema_pointer::PointerToken;
use serde_json::Value;

use crate::annotation::{AnnotationKey, AnnotationValue, ContainsMatches, ItemCoverage};
use crate::keyword::{CompiledKeyword, ContainsKeyword};
use crate::schema::Schema;
use crate::utils::json_equal;

use super::context::ValidationContext;
use super::error::{ValidationError, ValidationIssue, ValidatorError};
use super::{Bound, KeywordValidator};

fn keyword_token(keyword: &CompiledKeyword) -> PointerToken {
    PointerToken::Key(keyword.name().to_string())
}

// =============================================================================
// PrefixItemsValidator
// =============================================================================

pub struct PrefixItemsValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub schemas: &'a [Rc<Schema>],
}

impl KeywordValidator for PrefixItemsValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let Value::Array(items) = instance else {
            return Ok(());
        };

        let mut failed = Vec::new();
        let mut nested = Vec::new();
        for (index, (item, schema)) in items.iter().zip(self.schemas).enumerate() {
            let evaluation = self.ctx.evaluate(
                schema,
                item,
                Some(PointerToken::Index(index)),
                &[keyword_token(self.keyword), PointerToken::Index(index)],
            )?;
            if evaluation.valid {
                self.ctx.merge_annotations(evaluation.annotations);
            } else {
                failed.push(index);
                nested.extend(evaluation.errors);
            }
        }

        let coverage = if items.len() <= self.schemas.len() {
            ItemCoverage::EveryIndex
        } else {
            ItemCoverage::LargestIndex(self.schemas.len() - 1)
        };
        self.ctx.annotate(
            self.keyword,
            AnnotationKey::PrefixItems,
            AnnotationValue::Coverage(coverage),
        );

        if !failed.is_empty() {
            self.ctx.record_error_with_nested(
                self.keyword,
                ValidationIssue::PrefixItemsFailed { indices: failed },
                nested,
            );
        }
        Ok(())
    }
}

// =============================================================================
// ItemsValidator
// =============================================================================

/// Applies to the items after those covered by a sibling `prefixItems`.
pub struct ItemsValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub schema: &'a Schema,
}

impl KeywordValidator for ItemsValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let Value::Array(items) = instance else {
            return Ok(());
        };
        let start = match self.ctx.sibling_annotation(AnnotationKey::PrefixItems) {
            Some(AnnotationValue::Coverage(ItemCoverage::EveryIndex)) => items.len(),
            Some(AnnotationValue::Coverage(ItemCoverage::LargestIndex(n))) => n + 1,
            _ => 0,
        };

        let (failed, nested) = apply_to_items(self.ctx, self.keyword, self.schema, items, start)?;
        if start < items.len() {
            self.ctx.annotate(
                self.keyword,
                AnnotationKey::Items,
                AnnotationValue::Applied(true),
            );
        }
        if !failed.is_empty() {
            self.ctx.record_error_with_nested(
                self.keyword,
                ValidationIssue::ItemsFailed { indices: failed },
                nested,
            );
        }
        Ok(())
    }
}

/// Evaluate `schema` against every item from `start`, returning the failing
/// indices with their errors.
fn apply_to_items(
    ctx: &ValidationContext<'_>,
    keyword: &CompiledKeyword,
    schema: &Schema,
    items: &[Value],
    start: usize,
) -> Result<(Vec<usize>, Vec<ValidationError>), ValidatorError> {
    apply_to_items_where(ctx, keyword, schema, items, start, |_| true)
}

fn apply_to_items_where(
    ctx: &ValidationContext<'_>,
    keyword: &CompiledKeyword,
    schema: &Schema,
    items: &[Value],
    start: usize,
    filter: impl Fn(usize) -> bool,
) -> Result<(Vec<usize>, Vec<ValidationError>), ValidatorError> {
    let mut failed = Vec::new();
    let mut nested = Vec::new();
    for (index, item) in items.iter().enumerate().skip(start) {
        if !filter(index) {
            continue;
        }
        let evaluation = ctx.evaluate(
            schema,
            item,
            Some(PointerToken::Index(index)),
            &[keyword_token(keyword)],
        )?;
        if evaluation.valid {
            ctx.merge_annotations(evaluation.annotations);
        } else {
            failed.push(index);
            nested.extend(evaluation.errors);
        }
    }
    Ok((failed, nested))
}

// =============================================================================
// ContainsValidator / ContainsBoundValidator
// =============================================================================

/// Counts matching items. Fails on zero matches unless `minContains` is 0;
/// the count is left for the sibling `minContains`/`maxContains`.
pub struct ContainsValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub contains: &'a ContainsKeyword,
}

impl KeywordValidator for ContainsValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let Value::Array(items) = instance else {
            return Ok(());
        };

        let mut matched = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let evaluation = self.ctx.evaluate(
                &self.contains.schema,
                item,
                Some(PointerToken::Index(index)),
                &[keyword_token(self.keyword)],
            )?;
            if evaluation.valid {
                matched.push(index);
                self.ctx.merge_annotations(evaluation.annotations);
            }
        }

        let count = matched.len();
        self.ctx.set_contains_matches(count);
        let matches = if count == items.len() {
            ContainsMatches::EveryIndex
        } else {
            ContainsMatches::Indices(matched)
        };
        self.ctx.annotate(
            self.keyword,
            AnnotationKey::Contains,
            AnnotationValue::Matches(matches),
        );

        if count == 0 && !self.contains.min_contains_is_zero() {
            self.ctx.record_error(
                self.keyword,
                ValidationIssue::TooFewContains {
                    limit: 1,
                    matched: 0,
                },
            );
        }
        Ok(())
    }
}

/// `minContains` / `maxContains`; inert without a sibling `contains`.
pub struct ContainsBoundValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub bound: Bound,
}

impl KeywordValidator for ContainsBoundValidator<'_, '_> {
    fn validate(&mut self, _instance: &Value) -> Result<(), ValidatorError> {
        let Some(matched) = self.ctx.contains_matches() else {
            return Ok(());
        };
        let issue = match self.bound {
            Bound::Min(limit) if (matched as u64) < limit => {
                ValidationIssue::TooFewContains { limit, matched }
            }
            Bound::Max(limit) if (matched as u64) > limit => {
                ValidationIssue::TooManyContains { limit, matched }
            }
            _ => return Ok(()),
        };
        self.ctx.record_error(self.keyword, issue);
        Ok(())
    }
}

// =============================================================================
// ArrayLengthValidator / UniqueItemsValidator
// =============================================================================

pub struct ArrayLengthValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub bound: Bound,
}

impl KeywordValidator for ArrayLengthValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let Value::Array(items) = instance else {
            return Ok(());
        };
        let count = items.len();
        let issue = match self.bound {
            Bound::Min(limit) if (count as u64) < limit => {
                ValidationIssue::TooFewItems { limit, count }
            }
            Bound::Max(limit) if (count as u64) > limit => {
                ValidationIssue::TooManyItems { limit, count }
            }
            _ => return Ok(()),
        };
        self.ctx.record_error(self.keyword, issue);
        Ok(())
    }
}

pub struct UniqueItemsValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub unique: bool,
}

impl KeywordValidator for UniqueItemsValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let Value::Array(items) = instance else {
            return Ok(());
        };
        if !self.unique {
            return Ok(());
        }
        if let Some((first, second)) = first_duplicate(items) {
            self.ctx
                .record_error(self.keyword, ValidationIssue::ItemsNotUnique { first, second });
        }
        Ok(())
    }
}

fn first_duplicate(items: &[Value]) -> Option<(usize, usize)> {
    for (i, left) in items.iter().enumerate() {
        for (j, right) in items.iter().enumerate().skip(i + 1) {
            if json_equal(left, right) {
                return Some((i, j));
            }
        }
    }
    None
}

// =============================================================================
// UnevaluatedItemsValidator
// =============================================================================

/// Applies to the items no adjacent keyword or successful subschema evaluated.
pub struct UnevaluatedItemsValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub schema: &'a Schema,
}

impl UnevaluatedItemsValidator<'_, '_> {
    /// First index not covered by a prefix and the indices `contains` matched,
    /// or `None` when every item was evaluated.
    fn unevaluated(&self, len: usize) -> Option<(usize, BTreeSet<usize>)> {
        let applied = |key| {
            matches!(
                self.ctx.evaluated_annotation(key),
                Some(AnnotationValue::Applied(true))
            )
        };
        if applied(AnnotationKey::Items) || applied(AnnotationKey::UnevaluatedItems) {
            return None;
        }
        let start = match self.ctx.evaluated_annotation(AnnotationKey::PrefixItems) {
            Some(AnnotationValue::Coverage(ItemCoverage::EveryIndex)) => return None,
            Some(AnnotationValue::Coverage(ItemCoverage::LargestIndex(n))) => n + 1,
            _ => 0,
        };
        let matched = match self.ctx.evaluated_annotation(AnnotationKey::Contains) {
            Some(AnnotationValue::Matches(ContainsMatches::EveryIndex)) => return None,
            Some(AnnotationValue::Matches(ContainsMatches::Indices(indices))) => {
                indices.into_iter().collect()
            }
            _ => BTreeSet::new(),
        };
        (start < len).then_some((start, matched))
    }
}

impl KeywordValidator for UnevaluatedItemsValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let Value::Array(items) = instance else {
            return Ok(());
        };
        let Some((start, matched)) = self.unevaluated(items.len()) else {
            return Ok(());
        };

        let (failed, nested) = apply_to_items_where(
            self.ctx,
            self.keyword,
            self.schema,
            items,
            start,
            |index| !matched.contains(&index),
        )?;
        let applied = (start..items.len()).any(|index| !matched.contains(&index));
        if applied {
            self.ctx.annotate(
                self.keyword,
                AnnotationKey::UnevaluatedItems,
                AnnotationValue::Applied(true),
            );
        }
        if !failed.is_empty() {
            self.ctx.record_error_with_nested(
                self.keyword,
                ValidationIssue::UnevaluatedItemsFailed { indices: failed },
                nested,
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
    fn test_first_duplicate_uses_numeric_equality() {
        let items = vec![json!(1), json!("a"), json!(1.0)];
        assert_eq!(first_duplicate(&items), Some((0, 2)));
        let items = vec![json!({"a": 1}), json!({"a": 2})];
        assert_eq!(first_duplicate(&items), None);
    }

    #[test]
    fn test_first_duplicate_nested() {
        let items = vec![json!([1, {"b": null}]), json!([1, {"b": null}])];
        assert_eq!(first_duplicate(&items), Some((0, 1)));
    }
}
