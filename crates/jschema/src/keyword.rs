//! Keyword model.
//!
//! Every keyword of a compiled object schema is a [`CompiledKeyword`]: the
//! precomputed [`Keyword`] state, the raw JSON value it was compiled from and
//! its location. Keywords are evaluated in [`Keyword::rank`] order, which puts
//! every annotation producer before its consumers regardless of the key order
//! in the schema document.

use core::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::dialect::Vocabulary;
use crate::schema::{Schema, SchemaLocation};
use crate::utils::is_integer;

// =============================================================================
// Instance types
// =============================================================================

/// The primitive types of the JSON data model, as named by `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceType {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    String,
    Integer,
}

impl InstanceType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "null" => InstanceType::Null,
            "boolean" => InstanceType::Boolean,
            "object" => InstanceType::Object,
            "array" => InstanceType::Array,
            "number" => InstanceType::Number,
            "string" => InstanceType::String,
            "integer" => InstanceType::Integer,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            InstanceType::Null => "null",
            InstanceType::Boolean => "boolean",
            InstanceType::Object => "object",
            InstanceType::Array => "array",
            InstanceType::Number => "number",
            InstanceType::String => "string",
            InstanceType::Integer => "integer",
        }
    }

    /// The most specific type of `value`. Numbers with a zero fractional part
    /// are integers.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => InstanceType::Null,
            Value::Bool(_) => InstanceType::Boolean,
            Value::Number(n) if is_integer(n) => InstanceType::Integer,
            Value::Number(_) => InstanceType::Number,
            Value::String(_) => InstanceType::String,
            Value::Array(_) => InstanceType::Array,
            Value::Object(_) => InstanceType::Object,
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        let actual = InstanceType::of(value);
        actual == *self || (*self == InstanceType::Number && actual == InstanceType::Integer)
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Keyword taxonomy
// =============================================================================

/// Broad classification of keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordKind {
    /// `$schema`, `$id`, `$anchor`, `$dynamicAnchor`, `$defs`, `$vocabulary`, `$comment`
    Identifier,
    /// `$ref`, `$dynamicRef`
    Reference,
    /// Produces a pass/fail result for the instance
    Assertion,
    /// Applies subschemas and combines their results
    Applicator,
    /// Only attaches information to the instance
    Annotation,
    /// Keywords of earlier drafts that this dialect keeps reserved
    Reserved,
    /// Not a keyword of any active vocabulary; retained but inert
    Unknown,
}

/// Which vocabulary defines the keyword `name`.
pub fn vocabulary_of(name: &str) -> Option<Vocabulary> {
    Some(match name {
        "$schema" | "$id" | "$ref" | "$anchor" | "$dynamicRef" | "$dynamicAnchor"
        | "$vocabulary" | "$comment" | "$defs" => Vocabulary::Core,
        "prefixItems" | "items" | "contains" | "additionalProperties" | "properties"
        | "patternProperties" | "dependentSchemas" | "propertyNames" | "if" | "then"
        | "else" | "allOf" | "anyOf" | "oneOf" | "not" => Vocabulary::Applicator,
        "unevaluatedItems" | "unevaluatedProperties" => Vocabulary::Unevaluated,
        "type" | "const" | "enum" | "multipleOf" | "maximum" | "exclusiveMaximum" | "minimum"
        | "exclusiveMinimum" | "maxLength" | "minLength" | "pattern" | "maxItems"
        | "minItems" | "uniqueItems" | "maxContains" | "minContains" | "maxProperties"
        | "minProperties" | "required" | "dependentRequired" => Vocabulary::Validation,
        "title" | "description" | "default" | "deprecated" | "readOnly" | "writeOnly"
        | "examples" => Vocabulary::MetaData,
        "format" => Vocabulary::FormatAnnotation,
        "contentEncoding" | "contentMediaType" | "contentSchema" => Vocabulary::Content,
        _ => return None,
    })
}

/// Keywords that earlier drafts defined and 2020-12 reserves.
pub fn is_reserved(name: &str) -> bool {
    matches!(
        name,
        "definitions" | "dependencies" | "$recursiveAnchor" | "$recursiveRef"
    )
}

// =============================================================================
// Compiled keywords
// =============================================================================

/// Where a keyword lives.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordContext {
    pub name: String,
    /// Location of the keyword value inside its document
    pub location: SchemaLocation,
    /// Resource base URI with a fragment pointing at the keyword
    pub absolute_location: Url,
}

#[derive(Debug, Clone)]
pub struct CompiledKeyword {
    pub keyword: Keyword,
    /// The JSON value the keyword was compiled from
    pub raw: Value,
    pub context: KeywordContext,
}

impl CompiledKeyword {
    pub fn name(&self) -> &str {
        &self.context.name
    }

    pub fn kind(&self) -> KeywordKind {
        self.keyword.kind()
    }
}

/// A `$ref` or `$dynamicRef` value together with the base URI it is resolved against.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub reference: String,
    pub base: Url,
}

/// `contains` with the sibling bounds that change its meaning.
#[derive(Debug, Clone)]
pub struct ContainsKeyword {
    pub schema: Rc<Schema>,
    pub min_contains: Option<u64>,
    pub max_contains: Option<u64>,
}

impl ContainsKeyword {
    /// With `minContains: 0` an array without matches is still valid.
    pub fn min_contains_is_zero(&self) -> bool {
        self.min_contains == Some(0)
    }
}

#[derive(Debug, Clone)]
pub struct PatternSchema {
    pub pattern: String,
    pub regex: Regex,
    pub schema: Rc<Schema>,
}

#[derive(Debug, Clone)]
pub enum Keyword {
    // core
    Schema(String),
    Id(String),
    Anchor(String),
    DynamicAnchor(String),
    Defs,
    Vocabulary,
    Comment,
    Ref(Reference),
    DynamicRef(Reference),

    // applicator
    PrefixItems(Vec<Rc<Schema>>),
    Items(Rc<Schema>),
    Contains(ContainsKeyword),
    AdditionalProperties(Rc<Schema>),
    Properties(IndexMap<String, Rc<Schema>>),
    PatternProperties(Vec<PatternSchema>),
    DependentSchemas(IndexMap<String, Rc<Schema>>),
    PropertyNames(Rc<Schema>),
    If(Rc<Schema>),
    Then(Rc<Schema>),
    Else(Rc<Schema>),
    AllOf(Vec<Rc<Schema>>),
    AnyOf(Vec<Rc<Schema>>),
    OneOf(Vec<Rc<Schema>>),
    Not(Rc<Schema>),

    // unevaluated
    UnevaluatedItems(Rc<Schema>),
    UnevaluatedProperties(Rc<Schema>),

    // validation
    Type(Vec<InstanceType>),
    Const(Value),
    Enum(Vec<Value>),
    MultipleOf(f64),
    Maximum(f64),
    ExclusiveMaximum(f64),
    Minimum(f64),
    ExclusiveMinimum(f64),
    MaxLength(u64),
    MinLength(u64),
    Pattern(Regex),
    MaxItems(u64),
    MinItems(u64),
    UniqueItems(bool),
    MaxContains(u64),
    MinContains(u64),
    MaxProperties(u64),
    MinProperties(u64),
    Required(Vec<String>),
    DependentRequired(IndexMap<String, Vec<String>>),

    // format, meta-data, content
    Format(String),
    Title(String),
    Description(String),
    Default,
    Deprecated(bool),
    ReadOnly(bool),
    WriteOnly(bool),
    Examples,
    ContentEncoding(String),
    ContentMediaType(String),
    ContentSchema,

    Reserved,
    Unknown,
}

impl Keyword {
    pub fn kind(&self) -> KeywordKind {
        match self {
            Keyword::Schema(_)
            | Keyword::Id(_)
            | Keyword::Anchor(_)
            | Keyword::DynamicAnchor(_)
            | Keyword::Defs
            | Keyword::Vocabulary
            | Keyword::Comment => KeywordKind::Identifier,
            Keyword::Ref(_) | Keyword::DynamicRef(_) => KeywordKind::Reference,
            Keyword::PrefixItems(_)
            | Keyword::Items(_)
            | Keyword::Contains(_)
            | Keyword::AdditionalProperties(_)
            | Keyword::Properties(_)
            | Keyword::PatternProperties(_)
            | Keyword::DependentSchemas(_)
            | Keyword::PropertyNames(_)
            | Keyword::If(_)
            | Keyword::Then(_)
            | Keyword::Else(_)
            | Keyword::AllOf(_)
            | Keyword::AnyOf(_)
            | Keyword::OneOf(_)
            | Keyword::Not(_)
            | Keyword::UnevaluatedItems(_)
            | Keyword::UnevaluatedProperties(_) => KeywordKind::Applicator,
            Keyword::Type(_)
            | Keyword::Const(_)
            | Keyword::Enum(_)
            | Keyword::MultipleOf(_)
            | Keyword::Maximum(_)
            | Keyword::ExclusiveMaximum(_)
            | Keyword::Minimum(_)
            | Keyword::ExclusiveMinimum(_)
            | Keyword::MaxLength(_)
            | Keyword::MinLength(_)
            | Keyword::Pattern(_)
            | Keyword::MaxItems(_)
            | Keyword::MinItems(_)
            | Keyword::UniqueItems(_)
            | Keyword::MaxContains(_)
            | Keyword::MinContains(_)
            | Keyword::MaxProperties(_)
            | Keyword::MinProperties(_)
            | Keyword::Required(_)
            | Keyword::DependentRequired(_) => KeywordKind::Assertion,
            Keyword::Format(_)
            | Keyword::Title(_)
            | Keyword::Description(_)
            | Keyword::Default
            | Keyword::Deprecated(_)
            | Keyword::ReadOnly(_)
            | Keyword::WriteOnly(_)
            | Keyword::Examples
            | Keyword::ContentEncoding(_)
            | Keyword::ContentMediaType(_)
            | Keyword::ContentSchema => KeywordKind::Annotation,
            Keyword::Reserved => KeywordKind::Reserved,
            Keyword::Unknown => KeywordKind::Unknown,
        }
    }

    /// Evaluation order inside one schema object. Lower ranks run first.
    pub fn rank(&self) -> u8 {
        match self {
            Keyword::Ref(_) | Keyword::DynamicRef(_) => 10,
            Keyword::AllOf(_) | Keyword::AnyOf(_) | Keyword::OneOf(_) | Keyword::Not(_) => 30,
            Keyword::If(_) => 40,
            Keyword::Then(_) => 41,
            Keyword::Else(_) => 42,
            Keyword::DependentSchemas(_) => 45,
            Keyword::PrefixItems(_) => 50,
            Keyword::Items(_) => 51,
            Keyword::Contains(_) => 52,
            Keyword::MinContains(_) | Keyword::MaxContains(_) => 53,
            Keyword::Properties(_) => 60,
            Keyword::PatternProperties(_) => 61,
            Keyword::AdditionalProperties(_) => 62,
            Keyword::PropertyNames(_) => 63,
            Keyword::UnevaluatedItems(_) => 90,
            Keyword::UnevaluatedProperties(_) => 91,
            _ => match self.kind() {
                KeywordKind::Identifier | KeywordKind::Reserved | KeywordKind::Unknown => 0,
                _ => 20,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_instance_type_of() {
        assert_eq!(InstanceType::of(&json!(null)), InstanceType::Null);
        assert_eq!(InstanceType::of(&json!(1)), InstanceType::Integer);
        assert_eq!(InstanceType::of(&json!(1.0)), InstanceType::Integer);
        assert_eq!(InstanceType::of(&json!(1.5)), InstanceType::Number);
        assert_eq!(InstanceType::of(&json!("a")), InstanceType::String);
    }

    #[test]
    fn test_number_matches_integer() {
        assert!(InstanceType::Number.matches(&json!(3)));
        assert!(InstanceType::Integer.matches(&json!(3.0)));
        assert!(!InstanceType::Integer.matches(&json!(3.5)));
        assert!(!InstanceType::String.matches(&json!(3)));
    }

    #[test]
    fn test_vocabulary_of() {
        assert_eq!(vocabulary_of("$ref"), Some(Vocabulary::Core));
        assert_eq!(vocabulary_of("unevaluatedItems"), Some(Vocabulary::Unevaluated));
        assert_eq!(vocabulary_of("minContains"), Some(Vocabulary::Validation));
        assert_eq!(vocabulary_of("x-custom"), None);
        assert!(is_reserved("definitions"));
    }

    #[test]
    fn test_rank_orders_producers_before_consumers() {
        let t = Rc::new(Schema::Boolean(true));
        let order = [
            Keyword::Ref(Reference {
                reference: "#".to_string(),
                base: Url::parse("json-schema:///").unwrap(),
            }),
            Keyword::AllOf(vec![t.clone()]),
            Keyword::If(t.clone()),
            Keyword::Then(t.clone()),
            Keyword::PrefixItems(vec![t.clone()]),
            Keyword::Items(t.clone()),
            Keyword::Contains(ContainsKeyword {
                schema: t.clone(),
                min_contains: None,
                max_contains: None,
            }),
            Keyword::MinContains(1),
            Keyword::Properties(IndexMap::new()),
            Keyword::PatternProperties(Vec::new()),
            Keyword::AdditionalProperties(t.clone()),
            Keyword::UnevaluatedItems(t.clone()),
            Keyword::UnevaluatedProperties(t),
        ];
        let ranks: Vec<u8> = order.iter().map(Keyword::rank).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted);
    }
}
