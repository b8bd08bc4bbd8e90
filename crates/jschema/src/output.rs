//! Validation results and the standard output formats.
//!
//! - `flag`: `{"valid": bool}`
//! - `basic`: the validity plus a flat list of error units and, for valid
//!   instances, a flat list of annotation units

use core::fmt;
use core::str::FromStr;

use jschema_pointer::JsonPointer;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::annotation::AnnotationRecord;
use crate::validate::ValidationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Flag,
    #[default]
    Basic,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Flag => f.write_str("flag"),
            OutputFormat::Basic => f.write_str("basic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown output format '{0}', expected 'flag' or 'basic'")]
pub struct UnknownOutputFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownOutputFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flag" => Ok(OutputFormat::Flag),
            "basic" => Ok(OutputFormat::Basic),
            other => Err(UnknownOutputFormat(other.to_string())),
        }
    }
}

/// The result of validating one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    pub keyword_location: JsonPointer,
    pub instance_location: JsonPointer,
    /// Top-level errors; causes are nested inside each error
    pub errors: Vec<ValidationError>,
    /// Annotation records of a valid instance (empty when invalid)
    pub annotations: Vec<AnnotationRecord>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Every error including nested causes, depth first.
    pub fn flat_errors(&self) -> Vec<&ValidationError> {
        self.errors.iter().flat_map(ValidationError::flatten).collect()
    }

    pub fn annotations(&self) -> &[AnnotationRecord] {
        &self.annotations
    }

    /// Annotation records written by `keyword`.
    pub fn annotations_of<'a>(
        &'a self,
        keyword: &'a str,
    ) -> impl Iterator<Item = &'a AnnotationRecord> + 'a {
        self.annotations
            .iter()
            .filter(move |record| record.keyword == keyword)
    }

    pub fn to_output(&self, format: OutputFormat) -> Value {
        let mut output = Map::new();
        output.insert("valid".to_string(), Value::Bool(self.valid));
        if format == OutputFormat::Flag {
            return Value::Object(output);
        }
        if self.valid {
            if !self.annotations.is_empty() {
                let annotations = self
                    .annotations
                    .iter()
                    .map(AnnotationRecord::to_output_unit)
                    .collect();
                output.insert("annotations".to_string(), Value::Array(annotations));
            }
        } else {
            let errors = self
                .flat_errors()
                .into_iter()
                .map(ValidationError::to_output_unit)
                .collect();
            output.insert("errors".to_string(), Value::Array(errors));
        }
        Value::Object(output)
    }
}

impl Serialize for ValidationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_output(OutputFormat::Basic).serialize(serializer)
    }
}
