//! Runner for test cases in the JSON-Schema-Test-Suite layout.
//!
//! Each file under `cases/` holds an array of groups, each with a schema and
//! a list of instances tagged valid or invalid. Documents under
//! `cases/remotes/` are served to references as `http://localhost:1234/<path>`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::Value;
use url::Url;

mod case;

pub use case::{Case, CaseFile, CaseResult, NamedScenarioResult, ScenarioError, ScenarioResult, TestInstance};

/// Base URI of the documents under `cases/remotes/`.
pub const REMOTES_BASE_URI: &str = "http://localhost:1234/";

pub fn cases_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("cases")
}

pub fn remotes_dir() -> PathBuf {
    cases_dir().join("remotes")
}

#[derive(Debug, thiserror::Error)]
pub enum CollectCasesError {
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("failed to read {}: {error}", .path.display())]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error("failed to parse {}: {error}", .path.display())]
    Parse {
        path: PathBuf,
        error: serde_json::Error,
    },
}

/// Every case file below `cases/`, sorted by path. Remote documents are skipped.
pub fn collect_cases() -> Vec<Result<CaseFile, CollectCasesError>> {
    collect_cases_in(&cases_dir())
}

pub fn collect_cases_in(dir: &Path) -> Vec<Result<CaseFile, CollectCasesError>> {
    let pattern = dir.join("**").join("*.json");
    let paths = match glob::glob(&pattern.to_string_lossy()) {
        Ok(paths) => paths,
        Err(error) => return vec![Err(error.into())],
    };
    let remotes = dir.join("remotes");
    let mut files: Vec<_> = paths
        .filter_map(|entry| match entry {
            Ok(path) if path.starts_with(&remotes) => None,
            Ok(path) => Some(CaseFile::load(path)),
            Err(error) => Some(Err(CollectCasesError::Io {
                path: error.path().to_path_buf(),
                error: error.into(),
            })),
        })
        .collect();
    files.sort_by(|a, b| sort_key(a).cmp(sort_key(b)));
    files
}

fn sort_key(file: &Result<CaseFile, CollectCasesError>) -> &Path {
    match file {
        Ok(file) => &file.path,
        Err(CollectCasesError::Io { path, .. } | CollectCasesError::Parse { path, .. }) => path,
        Err(CollectCasesError::Pattern(_)) => Path::new(""),
    }
}

/// Load the remote documents, keyed by the URI they are served under.
pub fn load_remotes(dir: &Path) -> anyhow::Result<Vec<(Url, Value)>> {
    let base = Url::parse(REMOTES_BASE_URI)?;
    let pattern = dir.join("**").join("*.json");
    let mut remotes = Vec::new();
    for entry in glob::glob(&pattern.to_string_lossy())? {
        let path = entry?;
        let relative = path
            .strip_prefix(dir)
            .with_context(|| format!("{} is outside {}", path.display(), dir.display()))?;
        let relative = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let uri = base.join(&relative)?;
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let document = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        remotes.push((uri, document));
    }
    Ok(remotes)
}

/// Friendly name of a case file, relative to the cases directory.
pub fn file_name_from_path(path: &Path, cases_dir: &Path) -> String {
    path.strip_prefix(cases_dir)
        .unwrap_or(path)
        .with_extension("")
        .display()
        .to_string()
}
