//! Validation context
//!
//! A `ValidationContext` covers the evaluation of one schema against one
//! instance location. It holds:
//! - the current instance location and evaluation path
//! - accumulated errors
//! - annotations written by the schema's own keywords (`siblings`) and the
//!   annotations merged from successful subschema evaluations (`descendants`)
//! - per-schema scratch data shared between sibling keywords
//!
//! Subschemas are evaluated in child contexts; their result comes back as an
//! [`Evaluation`] that the calling keyword inspects and merges.

use std::cell::RefCell;

use jschema_pointer::{JsonPointer, PointerToken};
use serde_json::Value;
use url::Url;

use crate::annotation::{AnnotationContainer, AnnotationKey, AnnotationRecord, AnnotationValue};
use crate::config::ValidatorOptions;
use crate::context::Context;
use crate::keyword::CompiledKeyword;
use crate::schema::Schema;

use super::SchemaValidator;
use super::error::{ValidationError, ValidationIssue, ValidatorError};

// =============================================================================
// Evaluation (result of a subschema)
// =============================================================================

/// Outcome of evaluating one subschema.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    /// Empty when the evaluation failed
    pub annotations: AnnotationContainer,
}

// =============================================================================
// ValidationState (internal mutable state)
// =============================================================================

/// Data sibling keywords of one schema object pass to each other.
#[derive(Debug, Clone, Copy, Default)]
pub struct SiblingScratch {
    /// Outcome of `if`, read by `then` and `else`
    pub if_outcome: Option<bool>,
    /// Number of items `contains` matched, read by `minContains` and `maxContains`
    pub contains_matches: Option<usize>,
}

#[derive(Debug, Default)]
pub struct ValidationState {
    pub instance_location: JsonPointer,
    pub keyword_location: JsonPointer,
    pub errors: Vec<ValidationError>,
    pub siblings: AnnotationContainer,
    pub descendants: AnnotationContainer,
    pub scratch: SiblingScratch,
}

// =============================================================================
// ValidationContext
// =============================================================================

pub struct ValidationContext<'a> {
    pub context: &'a Context,
    pub options: &'a ValidatorOptions,
    /// Consecutive nested evaluations that stayed on the same instance location
    pub stalled_depth: usize,
    pub state: RefCell<ValidationState>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(context: &'a Context, options: &'a ValidatorOptions) -> Self {
        Self {
            context,
            options,
            stalled_depth: 0,
            state: RefCell::new(ValidationState::default()),
        }
    }

    fn child(
        &self,
        instance_location: JsonPointer,
        keyword_location: JsonPointer,
        stalled_depth: usize,
    ) -> Self {
        Self {
            context: self.context,
            options: self.options,
            stalled_depth,
            state: RefCell::new(ValidationState {
                instance_location,
                keyword_location,
                ..ValidationState::default()
            }),
        }
    }

    pub fn instance_location(&self) -> JsonPointer {
        self.state.borrow().instance_location.clone()
    }

    pub fn keyword_location(&self) -> JsonPointer {
        self.state.borrow().keyword_location.clone()
    }

    // -------------------------------------------------------------------------
    // Subschema evaluation
    // -------------------------------------------------------------------------

    /// Evaluate `schema` against `instance`.
    ///
    /// `instance_token` is the step from the current instance location to
    /// `instance` (none when it is the same value); `keyword_path` is appended
    /// to the evaluation path.
    ///
    /// Descending into the instance resets the nesting count, so only chains
    /// of evaluations on one instance location are bounded by `max_depth`.
    pub fn evaluate(
        &self,
        schema: &Schema,
        instance: &Value,
        instance_token: Option<PointerToken>,
        keyword_path: &[PointerToken],
    ) -> Result<Evaluation, ValidatorError> {
        let stalled_depth = match instance_token {
            Some(_) => 0,
            None => self.stalled_depth + 1,
        };
        let (instance_location, keyword_location) = {
            let state = self.state.borrow();
            let instance_location = match instance_token {
                Some(token) => state.instance_location.with(token),
                None => state.instance_location.clone(),
            };
            let mut keyword_location = state.keyword_location.clone();
            for token in keyword_path {
                keyword_location.push(token.clone());
            }
            (instance_location, keyword_location)
        };
        if stalled_depth > self.options.max_depth {
            return Err(ValidatorError::RecursionLimitExceeded {
                limit: self.options.max_depth,
                keyword_location: keyword_location.to_string(),
            });
        }
        let child = self.child(instance_location, keyword_location, stalled_depth);
        SchemaValidator { ctx: &child, schema }.validate(instance)?;
        Ok(child.finish())
    }

    /// Consume the context into the result seen by the caller.
    pub fn finish(self) -> Evaluation {
        let state = self.state.into_inner();
        let valid = state.errors.is_empty();
        let annotations = if valid {
            let mut annotations = state.siblings;
            annotations.merge(state.descendants);
            annotations
        } else {
            AnnotationContainer::new()
        };
        Evaluation {
            valid,
            errors: state.errors,
            annotations,
        }
    }

    // -------------------------------------------------------------------------
    // Errors
    // -------------------------------------------------------------------------

    pub fn record_error(&self, keyword: &CompiledKeyword, issue: ValidationIssue) {
        self.record_error_with_nested(keyword, issue, Vec::new());
    }

    pub fn record_error_with_nested(
        &self,
        keyword: &CompiledKeyword,
        issue: ValidationIssue,
        nested: Vec<ValidationError>,
    ) {
        self.push_error(
            keyword.name(),
            Some(keyword.context.absolute_location.clone()),
            issue,
            nested,
        );
    }

    /// Record the failure of a `false` schema.
    pub fn record_false_schema(&self) {
        self.push_error("", None, ValidationIssue::FalseSchema, Vec::new());
    }

    fn push_error(
        &self,
        keyword: &str,
        absolute_keyword_location: Option<Url>,
        issue: ValidationIssue,
        nested: Vec<ValidationError>,
    ) {
        let mut state = self.state.borrow_mut();
        let keyword_location = if keyword.is_empty() {
            state.keyword_location.clone()
        } else {
            state.keyword_location.with_key(keyword)
        };
        let error = ValidationError {
            keyword: keyword.to_string(),
            issue,
            keyword_location,
            absolute_keyword_location,
            instance_location: state.instance_location.clone(),
            nested,
        };
        state.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.state.borrow().errors.is_empty()
    }

    // -------------------------------------------------------------------------
    // Annotations
    // -------------------------------------------------------------------------

    /// Record a typed annotation of `keyword` at the current instance location.
    pub fn annotate(&self, keyword: &CompiledKeyword, key: AnnotationKey, value: AnnotationValue) {
        let record = self.options.collect_annotations.then(|| value.to_json());
        let mut state = self.state.borrow_mut();
        let location = state.instance_location.clone();
        state.siblings.insert(key, location, value);
        drop(state);
        if let Some(value) = record {
            self.record_annotation(keyword, value);
        }
    }

    /// Record an output-only annotation (meta-data, format, content keywords).
    pub fn record_annotation(&self, keyword: &CompiledKeyword, value: Value) {
        if !self.options.collect_annotations {
            return;
        }
        let mut state = self.state.borrow_mut();
        let record = AnnotationRecord {
            keyword: keyword.name().to_string(),
            keyword_location: state.keyword_location.with_key(keyword.name()),
            absolute_keyword_location: Some(keyword.context.absolute_location.clone()),
            instance_location: state.instance_location.clone(),
            value,
        };
        state.siblings.record(record);
    }

    /// Fold the annotations of a successful subschema evaluation in.
    pub fn merge_annotations(&self, annotations: AnnotationContainer) {
        self.state.borrow_mut().descendants.merge(annotations);
    }

    /// Annotation written by a sibling keyword of the current schema object.
    pub fn sibling_annotation(&self, key: AnnotationKey) -> Option<AnnotationValue> {
        let state = self.state.borrow();
        state.siblings.get(key, &state.instance_location).cloned()
    }

    /// Annotation from siblings and successful subschemas combined.
    pub fn evaluated_annotation(&self, key: AnnotationKey) -> Option<AnnotationValue> {
        let state = self.state.borrow();
        let location = &state.instance_location;
        match (
            state.siblings.get(key, location).cloned(),
            state.descendants.get(key, location).cloned(),
        ) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (a, b) => a.or(b),
        }
    }

    // -------------------------------------------------------------------------
    // Sibling scratch
    // -------------------------------------------------------------------------

    pub fn set_if_outcome(&self, valid: bool) {
        self.state.borrow_mut().scratch.if_outcome = Some(valid);
    }

    pub fn if_outcome(&self) -> Option<bool> {
        self.state.borrow().scratch.if_outcome
    }

    pub fn set_contains_matches(&self, matches: usize) {
        self.state.borrow_mut().scratch.contains_matches = Some(matches);
    }

    pub fn contains_matches(&self) -> Option<usize> {
        self.state.borrow().scratch.contains_matches
    }
}
