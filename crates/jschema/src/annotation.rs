//! Annotation container.
//!
//! Applicators communicate which parts of an instance they evaluated through
//! typed annotations keyed by keyword and instance location. `items`,
//! `additionalProperties` and the `unevaluated*` keywords read them.
//!
//! The container also keeps the annotation records reported in the output,
//! which are independent from the typed values.

use std::collections::BTreeSet;

use ahash::AHashMap;
use jschema_pointer::JsonPointer;
use serde_json::{Value, json};
use url::Url;

/// Keywords whose annotations other keywords consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKey {
    PrefixItems,
    Items,
    Contains,
    Properties,
    PatternProperties,
    AdditionalProperties,
    UnevaluatedItems,
    UnevaluatedProperties,
}

impl AnnotationKey {
    pub fn keyword(&self) -> &'static str {
        match self {
            AnnotationKey::PrefixItems => "prefixItems",
            AnnotationKey::Items => "items",
            AnnotationKey::Contains => "contains",
            AnnotationKey::Properties => "properties",
            AnnotationKey::PatternProperties => "patternProperties",
            AnnotationKey::AdditionalProperties => "additionalProperties",
            AnnotationKey::UnevaluatedItems => "unevaluatedItems",
            AnnotationKey::UnevaluatedProperties => "unevaluatedProperties",
        }
    }
}

/// Array positions covered by `prefixItems`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemCoverage {
    /// Indices `0..=n` were evaluated
    LargestIndex(usize),
    EveryIndex,
}

/// Array positions matched by `contains`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainsMatches {
    Indices(Vec<usize>),
    EveryIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    /// `items` and `unevaluatedItems`: true when they evaluated at least one element
    Applied(bool),
    Coverage(ItemCoverage),
    Matches(ContainsMatches),
    /// The property names a properties-family keyword evaluated
    Names(BTreeSet<String>),
}

impl AnnotationValue {
    /// Combine two values written for the same keyword and instance location.
    pub fn merge(self, other: AnnotationValue) -> AnnotationValue {
        use AnnotationValue::*;
        match (self, other) {
            (Applied(a), Applied(b)) => Applied(a || b),
            (Coverage(a), Coverage(b)) => Coverage(match (a, b) {
                (ItemCoverage::EveryIndex, _) | (_, ItemCoverage::EveryIndex) => {
                    ItemCoverage::EveryIndex
                }
                (ItemCoverage::LargestIndex(x), ItemCoverage::LargestIndex(y)) => {
                    ItemCoverage::LargestIndex(x.max(y))
                }
            }),
            (Matches(a), Matches(b)) => Matches(match (a, b) {
                (ContainsMatches::EveryIndex, _) | (_, ContainsMatches::EveryIndex) => {
                    ContainsMatches::EveryIndex
                }
                (ContainsMatches::Indices(mut x), ContainsMatches::Indices(y)) => {
                    x.extend(y);
                    x.sort_unstable();
                    x.dedup();
                    ContainsMatches::Indices(x)
                }
            }),
            (Names(mut a), Names(b)) => {
                a.extend(b);
                Names(a)
            }
            (existing, _) => existing,
        }
    }

    /// The value as reported in output units.
    pub fn to_json(&self) -> Value {
        match self {
            AnnotationValue::Applied(b) => Value::Bool(*b),
            AnnotationValue::Coverage(ItemCoverage::LargestIndex(n)) => json!(n),
            AnnotationValue::Coverage(ItemCoverage::EveryIndex) => Value::Bool(true),
            AnnotationValue::Matches(ContainsMatches::EveryIndex) => Value::Bool(true),
            AnnotationValue::Matches(ContainsMatches::Indices(indices)) => json!(indices),
            AnnotationValue::Names(names) => json!(names),
        }
    }
}

/// One annotation as reported in the basic output format.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub keyword: String,
    pub keyword_location: JsonPointer,
    pub absolute_keyword_location: Option<Url>,
    pub instance_location: JsonPointer,
    pub value: Value,
}

impl AnnotationRecord {
    pub fn to_output_unit(&self) -> Value {
        let mut unit = serde_json::Map::new();
        unit.insert(
            "keywordLocation".to_string(),
            Value::String(self.keyword_location.to_string()),
        );
        if let Some(absolute) = &self.absolute_keyword_location {
            unit.insert(
                "absoluteKeywordLocation".to_string(),
                Value::String(absolute.to_string()),
            );
        }
        unit.insert(
            "instanceLocation".to_string(),
            Value::String(self.instance_location.to_string()),
        );
        unit.insert("annotation".to_string(), self.value.clone());
        Value::Object(unit)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationContainer {
    values: AHashMap<(AnnotationKey, JsonPointer), AnnotationValue>,
    records: Vec<AnnotationRecord>,
}

impl AnnotationContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.records.is_empty()
    }

    /// Insert a value, merging with a value already stored under the same key.
    pub fn insert(&mut self, key: AnnotationKey, location: JsonPointer, value: AnnotationValue) {
        match self.values.remove(&(key, location.clone())) {
            Some(existing) => {
                self.values.insert((key, location), existing.merge(value));
            }
            None => {
                self.values.insert((key, location), value);
            }
        }
    }

    pub fn get(&self, key: AnnotationKey, location: &JsonPointer) -> Option<&AnnotationValue> {
        self.values.get(&(key, location.clone()))
    }

    pub fn contains(&self, key: AnnotationKey, location: &JsonPointer) -> bool {
        self.get(key, location).is_some()
    }

    pub fn record(&mut self, record: AnnotationRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<AnnotationRecord> {
        self.records
    }

    /// Fold every value and record of `other` into this container.
    pub fn merge(&mut self, other: AnnotationContainer) {
        for ((key, location), value) in other.values {
            self.insert(key, location, value);
        }
        self.records.extend(other.records);
    }
}
