//! Draft 2020-12 dialect, vocabularies and the bundled meta-schema documents.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use serde_json::Value;

/// The canonical meta-schema URI of Draft 2020-12.
pub const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

/// The JSON Schema dialect a schema resource is interpreted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Draft202012,
}

impl Dialect {
    pub fn meta_schema_uri(&self) -> &'static str {
        match self {
            Dialect::Draft202012 => DRAFT_2020_12,
        }
    }

    /// Recognize a `$schema` value. An empty trailing fragment is accepted.
    pub fn from_uri(uri: &str) -> Option<Self> {
        let uri = uri.strip_suffix('#').unwrap_or(uri);
        (uri == DRAFT_2020_12).then_some(Dialect::Draft202012)
    }
}

// =============================================================================
// Vocabularies
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Vocabulary {
    Core,
    Applicator,
    Unevaluated,
    Validation,
    MetaData,
    FormatAnnotation,
    FormatAssertion,
    Content,
}

impl Vocabulary {
    pub const ALL: [Vocabulary; 8] = [
        Vocabulary::Core,
        Vocabulary::Applicator,
        Vocabulary::Unevaluated,
        Vocabulary::Validation,
        Vocabulary::MetaData,
        Vocabulary::FormatAnnotation,
        Vocabulary::FormatAssertion,
        Vocabulary::Content,
    ];

    pub fn uri(&self) -> &'static str {
        match self {
            Vocabulary::Core => "https://json-schema.org/draft/2020-12/vocab/core",
            Vocabulary::Applicator => "https://json-schema.org/draft/2020-12/vocab/applicator",
            Vocabulary::Unevaluated => "https://json-schema.org/draft/2020-12/vocab/unevaluated",
            Vocabulary::Validation => "https://json-schema.org/draft/2020-12/vocab/validation",
            Vocabulary::MetaData => "https://json-schema.org/draft/2020-12/vocab/meta-data",
            Vocabulary::FormatAnnotation => {
                "https://json-schema.org/draft/2020-12/vocab/format-annotation"
            }
            Vocabulary::FormatAssertion => {
                "https://json-schema.org/draft/2020-12/vocab/format-assertion"
            }
            Vocabulary::Content => "https://json-schema.org/draft/2020-12/vocab/content",
        }
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        Vocabulary::ALL.into_iter().find(|v| v.uri() == uri)
    }
}

/// The set of vocabularies active for a schema resource.
///
/// Core is always active, whatever the meta-schema declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularySet(BTreeSet<Vocabulary>);

impl VocabularySet {
    /// Every vocabulary of the dialect, as used when `$schema` is absent or
    /// names the standard meta-schema.
    pub fn all() -> Self {
        VocabularySet(Vocabulary::ALL.into_iter().collect())
    }

    pub fn from_vocabularies(vocabularies: impl IntoIterator<Item = Vocabulary>) -> Self {
        let mut set: BTreeSet<_> = vocabularies.into_iter().collect();
        set.insert(Vocabulary::Core);
        VocabularySet(set)
    }

    pub fn contains(&self, vocabulary: Vocabulary) -> bool {
        self.0.contains(&vocabulary)
    }

    pub fn iter(&self) -> impl Iterator<Item = Vocabulary> + '_ {
        self.0.iter().copied()
    }
}

impl Default for VocabularySet {
    fn default() -> Self {
        Self::all()
    }
}

// =============================================================================
// Bundled meta-schemas
// =============================================================================

macro_rules! bundled {
    ($uri:literal, $path:literal) => {
        (
            $uri,
            include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/metaschemas/", $path)),
        )
    };
}

const BUNDLED_SOURCES: [(&str, &str); 9] = [
    bundled!(
        "https://json-schema.org/draft/2020-12/schema",
        "draft2020-12/schema.json"
    ),
    bundled!(
        "https://json-schema.org/draft/2020-12/meta/core",
        "draft2020-12/meta/core.json"
    ),
    bundled!(
        "https://json-schema.org/draft/2020-12/meta/applicator",
        "draft2020-12/meta/applicator.json"
    ),
    bundled!(
        "https://json-schema.org/draft/2020-12/meta/unevaluated",
        "draft2020-12/meta/unevaluated.json"
    ),
    bundled!(
        "https://json-schema.org/draft/2020-12/meta/validation",
        "draft2020-12/meta/validation.json"
    ),
    bundled!(
        "https://json-schema.org/draft/2020-12/meta/meta-data",
        "draft2020-12/meta/meta-data.json"
    ),
    bundled!(
        "https://json-schema.org/draft/2020-12/meta/format-annotation",
        "draft2020-12/meta/format-annotation.json"
    ),
    bundled!(
        "https://json-schema.org/draft/2020-12/meta/format-assertion",
        "draft2020-12/meta/format-assertion.json"
    ),
    bundled!(
        "https://json-schema.org/draft/2020-12/meta/content",
        "draft2020-12/meta/content.json"
    ),
];

static BUNDLED: LazyLock<Vec<(&'static str, Value)>> = LazyLock::new(|| {
    BUNDLED_SOURCES
        .iter()
        .map(|(uri, source)| {
            let value = serde_json::from_str(source)
                .unwrap_or_else(|e| panic!("bundled meta-schema {uri} is not valid JSON: {e}"));
            (*uri, value)
        })
        .collect()
});

/// Look up a bundled meta-schema document by its URI (an empty fragment is ignored).
pub fn bundled_document(uri: &str) -> Option<&'static Value> {
    let uri = uri.strip_suffix('#').unwrap_or(uri);
    BUNDLED
        .iter()
        .find_map(|(candidate, value)| (*candidate == uri).then_some(value))
}

/// URIs of every bundled meta-schema document.
pub fn bundled_uris() -> impl Iterator<Item = &'static str> {
    BUNDLED_SOURCES.iter().map(|(uri, _)| *uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_uri() {
        assert_eq!(Dialect::from_uri(DRAFT_2020_12), Some(Dialect::Draft202012));
        assert_eq!(
            Dialect::from_uri("https://json-schema.org/draft/2020-12/schema#"),
            Some(Dialect::Draft202012)
        );
        assert_eq!(
            Dialect::from_uri("http://json-schema.org/draft-07/schema#"),
            None
        );
    }

    #[test]
    fn test_vocabulary_uri_round_trip() {
        for vocabulary in Vocabulary::ALL {
            assert_eq!(Vocabulary::from_uri(vocabulary.uri()), Some(vocabulary));
        }
        assert_eq!(Vocabulary::from_uri("https://example.com/vocab/custom"), None);
    }

    #[test]
    fn test_vocabulary_set_always_contains_core() {
        let set = VocabularySet::from_vocabularies([Vocabulary::Validation]);
        assert!(set.contains(Vocabulary::Core));
        assert!(set.contains(Vocabulary::Validation));
        assert!(!set.contains(Vocabulary::Applicator));
    }

    #[test]
    fn test_bundled_documents_parse_and_match_their_id() {
        for uri in bundled_uris() {
            let document = bundled_document(uri).unwrap();
            assert_eq!(document["$id"], Value::String(uri.to_string()));
            assert_eq!(document["$dynamicAnchor"], Value::String("meta".to_string()));
        }
    }
}
