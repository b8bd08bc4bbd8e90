//! Validators for keywords that inspect a single value
//!
//! `type`, `const`, `enum`, the numeric and string constraints, `format` and
//! the annotation-only keywords.

use regex::Regex;
use serde_json::Value;

use crate::keyword::{CompiledKeyword, InstanceType};
use crate::utils::{is_integer_literal, json_equal, number_as_f64};

use super::context::ValidationContext;
use super::error::{ValidationIssue, ValidatorError};
use super::{Bound, KeywordValidator};

/// Quotients closer than this to an integer count as whole.
const MULTIPLE_OF_EPSILON: f64 = 1e-10;

// =============================================================================
// TypeValidator
// =============================================================================

pub struct TypeValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub types: &'a [InstanceType],
}

impl KeywordValidator for TypeValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        if self.types.iter().any(|t| t.matches(instance)) {
            return Ok(());
        }
        self.ctx.record_error(
            self.keyword,
            ValidationIssue::TypeMismatch {
                expected: self.types.to_vec(),
                actual: InstanceType::of(instance),
            },
        );
        Ok(())
    }
}

// =============================================================================
// ConstValidator / EnumValidator
// =============================================================================

pub struct ConstValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub expected: &'a Value,
}

impl KeywordValidator for ConstValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        if !json_equal(self.expected, instance) {
            self.ctx.record_error(
                self.keyword,
                ValidationIssue::ConstMismatch {
                    expected: self.expected.clone(),
                },
            );
        }
        Ok(())
    }
}

pub struct EnumValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub values: &'a [Value],
}

impl KeywordValidator for EnumValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        if !self.values.iter().any(|value| json_equal(value, instance)) {
            self.ctx.record_error(self.keyword, ValidationIssue::NotInEnum);
        }
        Ok(())
    }
}

// =============================================================================
// Numeric constraints
// =============================================================================

pub struct MultipleOfValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub multiple_of: f64,
}

impl KeywordValidator for MultipleOfValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let Value::Number(number) = instance else {
            return Ok(());
        };
        if !is_multiple_of(number, self.multiple_of) {
            self.ctx.record_error(
                self.keyword,
                ValidationIssue::NotMultipleOf {
                    multiple_of: self.multiple_of,
                    value: number_as_f64(number),
                },
            );
        }
        Ok(())
    }
}

/// Integer literals are multiples of every divisor below one. Otherwise the
/// quotient must be finite and within [`MULTIPLE_OF_EPSILON`] of an integer.
pub(crate) fn is_multiple_of(number: &serde_json::Number, divisor: f64) -> bool {
    if is_integer_literal(number) && divisor < 1.0 {
        return true;
    }
    let quotient = number_as_f64(number) / divisor;
    if !quotient.is_finite() {
        return false;
    }
    (quotient - quotient.round()).abs() < MULTIPLE_OF_EPSILON
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberBound {
    Minimum(f64),
    ExclusiveMinimum(f64),
    Maximum(f64),
    ExclusiveMaximum(f64),
}

pub struct NumberBoundValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub bound: NumberBound,
}

impl KeywordValidator for NumberBoundValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let Value::Number(number) = instance else {
            return Ok(());
        };
        let value = number_as_f64(number);
        let issue = match self.bound {
            NumberBound::Minimum(limit) if value < limit => {
                ValidationIssue::BelowMinimum { limit, value }
            }
            NumberBound::ExclusiveMinimum(limit) if value <= limit => {
                ValidationIssue::BelowExclusiveMinimum { limit, value }
            }
            NumberBound::Maximum(limit) if value > limit => {
                ValidationIssue::AboveMaximum { limit, value }
            }
            NumberBound::ExclusiveMaximum(limit) if value >= limit => {
                ValidationIssue::AboveExclusiveMaximum { limit, value }
            }
            _ => return Ok(()),
        };
        self.ctx.record_error(self.keyword, issue);
        Ok(())
    }
}

// =============================================================================
// String constraints
// =============================================================================

/// `minLength` / `maxLength`, counted in Unicode scalar values.
pub struct StringLengthValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub bound: Bound,
}

impl KeywordValidator for StringLengthValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        let Value::String(text) = instance else {
            return Ok(());
        };
        let length = text.chars().count();
        let issue = match self.bound {
            Bound::Min(limit) if (length as u64) < limit => {
                ValidationIssue::StringTooShort { limit, length }
            }
            Bound::Max(limit) if (length as u64) > limit => {
                ValidationIssue::StringTooLong { limit, length }
            }
            _ => return Ok(()),
        };
        self.ctx.record_error(self.keyword, issue);
        Ok(())
    }
}

pub struct PatternValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub regex: &'a Regex,
}

impl KeywordValidator for PatternValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        if let Value::String(text) = instance
            && !self.regex.is_match(text)
        {
            self.ctx.record_error(
                self.keyword,
                ValidationIssue::PatternMismatch {
                    pattern: self.regex.as_str().to_string(),
                },
            );
        }
        Ok(())
    }
}

// =============================================================================
// Format and annotation-only keywords
// =============================================================================

/// `format` always annotates; it asserts only when a validator for the
/// format is registered.
pub struct FormatKeywordValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
    pub format: &'a str,
}

impl KeywordValidator for FormatKeywordValidator<'_, '_> {
    fn validate(&mut self, instance: &Value) -> Result<(), ValidatorError> {
        if let Value::String(text) = instance
            && let Some(validator) = self.ctx.context.format(self.format)
            && !validator.validate(text)
        {
            self.ctx.record_error(
                self.keyword,
                ValidationIssue::FormatMismatch {
                    format: self.format.to_string(),
                },
            );
            return Ok(());
        }
        self.ctx
            .record_annotation(self.keyword, Value::String(self.format.to_string()));
        Ok(())
    }
}

/// Meta-data and content keywords: the keyword value becomes the annotation.
pub struct AnnotationValidator<'a, 'c> {
    pub ctx: &'a ValidationContext<'c>,
    pub keyword: &'a CompiledKeyword,
}

impl KeywordValidator for AnnotationValidator<'_, '_> {
    fn validate(&mut self, _instance: &Value) -> Result<(), ValidatorError> {
        self.ctx.record_annotation(self.keyword, self.keyword.raw.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn number(value: Value) -> serde_json::Number {
        match value {
            Value::Number(n) => n,
            other => panic!("not a number: {other}"),
        }
    }

    #[test]
    fn test_multiple_of_integers() {
        assert!(is_multiple_of(&number(json!(10)), 2.0));
        assert!(!is_multiple_of(&number(json!(7)), 2.0));
        assert!(is_multiple_of(&number(json!(0)), 3.0));
    }

    #[test]
    fn test_multiple_of_fractional_divisor() {
        assert!(is_multiple_of(&number(json!(0.0075)), 0.0001));
        assert!(!is_multiple_of(&number(json!(0.00751)), 0.0001));
        assert!(is_multiple_of(&number(json!(19.99)), 0.01));
    }

    #[test]
    fn test_integer_literal_with_small_divisor_is_multiple() {
        assert!(is_multiple_of(&number(json!(12391239123_i64)), 0.123456789));
    }

    #[test]
    fn test_overflowing_quotient_is_not_multiple() {
        assert!(!is_multiple_of(&number(json!(1e308)), 0.5e-308));
    }
}
