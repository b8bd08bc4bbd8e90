use std::path::PathBuf;

use jschema::{Validator, ValidatorError};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::CollectCasesError;

/// One file of cases.
#[derive(Debug, Clone)]
pub struct CaseFile {
    pub path: PathBuf,
    pub cases: Vec<Case>,
}

impl CaseFile {
    pub fn load(path: PathBuf) -> Result<Self, CollectCasesError> {
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(error) => return Err(CollectCasesError::Io { path, error }),
        };
        match serde_json::from_str(&text) {
            Ok(cases) => Ok(CaseFile { path, cases }),
            Err(error) => Err(CollectCasesError::Parse { path, error }),
        }
    }
}

/// A schema together with the instances it is checked against.
#[derive(Debug, Clone, Deserialize)]
pub struct Case {
    pub description: String,
    pub schema: Value,
    pub tests: Vec<TestInstance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestInstance {
    pub description: String,
    pub data: Value,
    pub valid: bool,
}

/// Result of running a single scenario
#[derive(Debug, Clone)]
pub enum ScenarioResult {
    Passed,
    Failed { error: ScenarioError },
}

impl ScenarioResult {
    pub fn is_passed(&self) -> bool {
        matches!(self, ScenarioResult::Passed)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ScenarioError {
    #[error("schema failed to compile: {message}")]
    SchemaCompilation { message: String },
    #[error("validation aborted: {0}")]
    Aborted(#[from] ValidatorError),
    #[error("expected valid, got errors:\n{}", .errors.join("\n"))]
    ExpectedValid { errors: Vec<String> },
    #[error("expected invalid, but the instance passed")]
    ExpectedInvalid,
}

/// Named scenario with its result
#[derive(Debug, Clone)]
pub struct NamedScenarioResult {
    pub name: String,
    pub result: ScenarioResult,
}

/// Result of running all scenarios in a case
#[derive(Debug, Clone)]
pub struct CaseResult {
    pub scenarios: Vec<NamedScenarioResult>,
}

impl CaseResult {
    pub fn passed_count(&self) -> usize {
        self.scenarios.iter().filter(|s| s.result.is_passed()).count()
    }

    pub fn total_count(&self) -> usize {
        self.scenarios.len()
    }

    pub fn all_passed(&self) -> bool {
        self.scenarios.iter().all(|s| s.result.is_passed())
    }

    pub fn failed_scenarios(&self) -> Vec<&NamedScenarioResult> {
        self.scenarios.iter().filter(|s| !s.result.is_passed()).collect()
    }
}

impl Case {
    /// Compile the schema once and check every instance against it.
    ///
    /// A schema that fails to compile fails every scenario of the case.
    pub fn run_all(&self, remotes: &[(Url, Value)]) -> CaseResult {
        let mut builder = Validator::builder();
        for (uri, document) in remotes {
            builder = builder.remote_schema(uri.clone(), document.clone());
        }
        let validator = builder.build(&self.schema);

        let scenarios = self
            .tests
            .iter()
            .map(|test| {
                let result = match &validator {
                    Ok(validator) => match run_instance(validator, test) {
                        Ok(()) => ScenarioResult::Passed,
                        Err(error) => ScenarioResult::Failed { error },
                    },
                    Err(error) => ScenarioResult::Failed {
                        error: ScenarioError::SchemaCompilation {
                            message: error.to_string(),
                        },
                    },
                };
                NamedScenarioResult {
                    name: test.description.clone(),
                    result,
                }
            })
            .collect();
        CaseResult { scenarios }
    }
}

fn run_instance(validator: &Validator, test: &TestInstance) -> Result<(), ScenarioError> {
    let result = validator.validate(&test.data)?;
    match (test.valid, result.valid) {
        (true, false) => Err(ScenarioError::ExpectedValid {
            errors: result
                .flat_errors()
                .into_iter()
                .map(ToString::to_string)
                .collect(),
        }),
        (false, true) => Err(ScenarioError::ExpectedInvalid),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn case(schema: Value, tests: Value) -> Case {
        serde_json::from_value(json!({
            "description": "case",
            "schema": schema,
            "tests": tests
        }))
        .unwrap()
    }

    #[test]
    fn test_run_all_reports_each_instance() {
        let case = case(
            json!({"type": "integer"}),
            json!([
                {"description": "integer", "data": 1, "valid": true},
                {"description": "string", "data": "a", "valid": false},
                {"description": "mislabelled", "data": 2, "valid": false}
            ]),
        );
        let result = case.run_all(&[]);
        assert_eq!(result.total_count(), 3);
        assert_eq!(result.passed_count(), 2);
        let failed = result.failed_scenarios();
        assert_eq!(failed[0].name, "mislabelled");
        assert!(matches!(
            failed[0].result,
            ScenarioResult::Failed {
                error: ScenarioError::ExpectedInvalid
            }
        ));
    }

    #[test]
    fn test_compile_failure_fails_every_scenario() {
        let case = case(
            json!({"$schema": "http://json-schema.org/draft-04/schema#"}),
            json!([{"description": "any", "data": 1, "valid": true}]),
        );
        let result = case.run_all(&[]);
        assert!(!result.all_passed());
        assert!(matches!(
            result.scenarios[0].result,
            ScenarioResult::Failed {
                error: ScenarioError::SchemaCompilation { .. }
            }
        ));
    }
}
