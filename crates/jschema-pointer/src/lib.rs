//! JSON Pointer (RFC 6901) model.
//!
//! A [`JsonPointer`] addresses a value inside a JSON document. It is used for
//! two different kinds of locations during validation:
//! - instance locations (where in the validated document an error occurred)
//! - schema locations (where in the schema document a keyword lives)

use core::fmt::{self, Display};
use core::str::FromStr;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;
use thisisplural::Plural;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    #[error("JSON pointer must be empty or start with '/': {0}")]
    MissingLeadingSlash(String),

    #[error("invalid escape sequence in JSON pointer: {0}")]
    InvalidEscape(String),

    #[error("JSON pointer fragment is not valid UTF-8 after percent-decoding: {0}")]
    InvalidPercentEncoding(String),
}

/// A single reference token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PointerToken {
    /// Object member name
    Key(String),
    /// Array element index
    Index(usize),
}

impl PointerToken {
    /// The unescaped textual form of the token.
    pub fn as_key(&self) -> std::borrow::Cow<'_, str> {
        match self {
            PointerToken::Key(key) => std::borrow::Cow::Borrowed(key),
            PointerToken::Index(index) => std::borrow::Cow::Owned(index.to_string()),
        }
    }

    fn parse(raw: &str) -> Result<Self, PointerError> {
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            if c == '~' {
                match chars.next() {
                    Some('0') => out.push('~'),
                    Some('1') => out.push('/'),
                    _ => return Err(PointerError::InvalidEscape(raw.to_string())),
                }
            } else {
                out.push(c);
            }
        }
        // Canonical array indices have no leading zeros ("0", "12", but not "012").
        let is_index = !out.is_empty()
            && out.bytes().all(|b| b.is_ascii_digit())
            && (out == "0" || !out.starts_with('0'));
        if is_index && let Ok(index) = out.parse::<usize>() {
            return Ok(PointerToken::Index(index));
        }
        Ok(PointerToken::Key(out))
    }
}

impl Display for PointerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerToken::Key(key) => {
                for c in key.chars() {
                    match c {
                        '~' => f.write_str("~0")?,
                        '/' => f.write_str("~1")?,
                        c => write!(f, "{c}")?,
                    }
                }
                Ok(())
            }
            PointerToken::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PointerToken {
    fn from(key: &str) -> Self {
        PointerToken::Key(key.to_string())
    }
}

impl From<String> for PointerToken {
    fn from(key: String) -> Self {
        PointerToken::Key(key)
    }
}

impl From<usize> for PointerToken {
    fn from(index: usize) -> Self {
        PointerToken::Index(index)
    }
}

/// An immutable-by-convention sequence of reference tokens.
///
/// All "modifying" helpers return a new pointer; the push/pop pair exists for
/// stack-like use while walking a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Plural)]
pub struct JsonPointer(pub Vec<PointerToken>);

impl JsonPointer {
    /// The pointer to the whole document.
    pub fn root() -> Self {
        JsonPointer(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self) -> &[PointerToken] {
        &self.0
    }

    /// Parse the RFC 6901 string form (`""`, `"/a/b~1c"`).
    pub fn parse(s: &str) -> Result<Self, PointerError> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = s.strip_prefix('/') else {
            return Err(PointerError::MissingLeadingSlash(s.to_string()));
        };
        rest.split('/')
            .map(PointerToken::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(JsonPointer)
    }

    /// Parse a URI fragment (without the leading `#`), percent-decoding it first.
    pub fn from_uri_fragment(fragment: &str) -> Result<Self, PointerError> {
        let decoded = percent_decode_str(fragment)
            .decode_utf8()
            .map_err(|_| PointerError::InvalidPercentEncoding(fragment.to_string()))?;
        Self::parse(&decoded)
    }

    pub fn push(&mut self, token: impl Into<PointerToken>) {
        self.0.push(token.into());
    }

    pub fn pop(&mut self) -> Option<PointerToken> {
        self.0.pop()
    }

    /// A new pointer with `token` appended.
    pub fn with(&self, token: impl Into<PointerToken>) -> Self {
        let mut next = self.clone();
        next.push(token);
        next
    }

    /// A new pointer with `key` appended.
    pub fn with_key(&self, key: &str) -> Self {
        self.with(PointerToken::Key(key.to_string()))
    }

    /// A new pointer with `index` appended.
    pub fn with_index(&self, index: usize) -> Self {
        self.with(PointerToken::Index(index))
    }

    /// Concatenate `other` onto this pointer.
    pub fn join(&self, other: &JsonPointer) -> Self {
        let mut next = self.clone();
        next.0.extend(other.0.iter().cloned());
        next
    }

    /// Drop the last token. `None` for the root pointer.
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.0.split_last()?;
        Some(JsonPointer(init.to_vec()))
    }

    pub fn last(&self) -> Option<&PointerToken> {
        self.0.last()
    }

    pub fn starts_with(&self, base: &JsonPointer) -> bool {
        self.0.len() >= base.0.len()
            && self
                .0
                .iter()
                .zip(base.0.iter())
                .all(|(a, b)| a.as_key() == b.as_key())
    }

    /// The remainder of this pointer below `base`, if `base` is a prefix.
    pub fn relative_to(&self, base: &JsonPointer) -> Option<Self> {
        if !self.starts_with(base) {
            return None;
        }
        Some(JsonPointer(self.0[base.0.len()..].to_vec()))
    }

    /// Look the pointer up in `value`.
    ///
    /// Tokens are matched structurally: a numeric token addresses an array
    /// element or an object member with that name.
    pub fn resolve<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.0.iter().try_fold(value, |current, token| match current {
            Value::Object(map) => map.get(token.as_key().as_ref()),
            Value::Array(items) => match token {
                PointerToken::Index(index) => items.get(*index),
                PointerToken::Key(_) => None,
            },
            _ => None,
        })
    }
}

impl Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.0 {
            write!(f, "/{token}")?;
        }
        Ok(())
    }
}

impl FromStr for JsonPointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for JsonPointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JsonPointer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        JsonPointer::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_root() {
        assert_eq!(JsonPointer::root().to_string(), "");
    }

    #[test]
    fn test_display_escapes() {
        let pointer = JsonPointer::root().with_key("a/b").with_key("m~n").with_index(3);
        assert_eq!(pointer.to_string(), "/a~1b/m~0n/3");
    }

    #[test]
    fn test_parse_unescapes() {
        let pointer = JsonPointer::parse("/a~1b/m~0n/3").unwrap();
        assert_eq!(
            pointer.tokens(),
            &[
                PointerToken::Key("a/b".to_string()),
                PointerToken::Key("m~n".to_string()),
                PointerToken::Index(3),
            ]
        );
    }

    #[test]
    fn test_parse_escape_order() {
        // "~01" is "~1" literally, not "/"
        let pointer = JsonPointer::parse("/~01").unwrap();
        assert_eq!(pointer.tokens(), &[PointerToken::Key("~1".to_string())]);
    }

    #[test]
    fn test_parse_leading_zero_is_key() {
        let pointer = JsonPointer::parse("/01").unwrap();
        assert_eq!(pointer.tokens(), &[PointerToken::Key("01".to_string())]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            JsonPointer::parse("a/b"),
            Err(PointerError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            JsonPointer::parse("/a~2"),
            Err(PointerError::InvalidEscape(_))
        ));
    }

    #[test]
    fn test_uri_fragment_decoding() {
        let pointer = JsonPointer::from_uri_fragment("/%24defs/foo%25bar").unwrap();
        assert_eq!(pointer.to_string(), "/$defs/foo%bar");
    }

    #[test]
    fn test_resolve() {
        let doc = json!({"foo": ["bar", {"baz": 1}], "": 0, "0": "zero"});
        let p = |s: &str| JsonPointer::parse(s).unwrap();
        assert_eq!(p("").resolve(&doc), Some(&doc));
        assert_eq!(p("/foo/0").resolve(&doc), Some(&json!("bar")));
        assert_eq!(p("/foo/1/baz").resolve(&doc), Some(&json!(1)));
        assert_eq!(p("/").resolve(&doc), Some(&json!(0)));
        assert_eq!(p("/0").resolve(&doc), Some(&json!("zero")));
        assert_eq!(p("/foo/9").resolve(&doc), None);
        assert_eq!(p("/foo/x").resolve(&doc), None);
    }

    #[test]
    fn test_parent_and_relative() {
        let base = JsonPointer::parse("/$defs/a").unwrap();
        let full = JsonPointer::parse("/$defs/a/items/0").unwrap();
        assert_eq!(full.relative_to(&base).unwrap().to_string(), "/items/0");
        assert_eq!(full.parent().unwrap().to_string(), "/$defs/a/items");
        assert!(JsonPointer::root().parent().is_none());
        assert!(base.relative_to(&full).is_none());
    }

    #[test]
    fn test_serde_as_string() {
        let pointer = JsonPointer::root().with_key("properties").with_key("a b");
        let json = serde_json::to_value(&pointer).unwrap();
        assert_eq!(json, json!("/properties/a b"));
        let back: JsonPointer = serde_json::from_value(json).unwrap();
        assert_eq!(back, pointer);
    }
}
