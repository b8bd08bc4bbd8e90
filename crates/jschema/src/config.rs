use crate::output::OutputFormat;

/// Default limit on nested subschema evaluations at one instance location.
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Format produced by [`Validator::output`](crate::Validator::output)
    pub output: OutputFormat,
    /// Nesting limit for subschema evaluations that stay on one instance
    /// location; exceeding it aborts with
    /// [`ValidatorError::RecursionLimitExceeded`](crate::ValidatorError::RecursionLimitExceeded)
    pub max_depth: usize,
    /// Check the schema document against its meta-schema before compiling
    pub validate_schema: bool,
    /// Keep annotation records for the output. Annotations that keywords
    /// depend on are tracked regardless.
    pub collect_annotations: bool,
    /// Register the built-in format validators so `format` asserts
    pub assert_formats: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            output: OutputFormat::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            validate_schema: false,
            collect_annotations: true,
            assert_formats: false,
        }
    }
}
