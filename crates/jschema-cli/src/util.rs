use std::fs;
use std::io::{self, Read};

use anyhow::{Context, anyhow};
use serde_json::Value;
use url::Url;

/// Read a JSON document from a file path, or from stdin for `-`.
pub fn read_json(path: &str) -> anyhow::Result<Value> {
    let text = if path == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("reading from stdin")?;
        buffer
    } else {
        fs::read_to_string(path).with_context(|| format!("reading {path}"))?
    };
    serde_json::from_str(&text).with_context(|| format!("parsing {}", display_path(path)))
}

pub fn display_path(path: &str) -> &str {
    if path == "-" { "<stdin>" } else { path }
}

/// Parse a `URI=PATH` remote schema argument.
pub fn parse_remote(arg: &str) -> anyhow::Result<(Url, String)> {
    let (uri, path) = arg
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("expected URI=PATH, got '{arg}'"))?;
    let uri = Url::parse(uri).with_context(|| format!("invalid remote URI '{uri}'"))?;
    if path.is_empty() {
        return Err(anyhow!("missing path for remote '{uri}'"));
    }
    Ok((uri, path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote() {
        let (uri, path) = parse_remote("http://example.com/a.json=schemas/a.json").unwrap();
        assert_eq!(uri.as_str(), "http://example.com/a.json");
        assert_eq!(path, "schemas/a.json");
    }

    #[test]
    fn test_parse_remote_rejects_malformed() {
        assert!(parse_remote("schemas/a.json").is_err());
        assert!(parse_remote("not a uri=a.json").is_err());
        assert!(parse_remote("http://example.com/a.json=").is_err());
    }

    #[test]
    fn test_display_path() {
        assert_eq!(display_path("-"), "<stdin>");
        assert_eq!(display_path("a.json"), "a.json");
    }
}
