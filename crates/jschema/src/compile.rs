//! Schema compilation.
//!
//! Turns raw JSON schema values into [`Schema`] values. While walking a
//! schema object the compiler
//! - resolves `$id` against the enclosing base URI and registers it,
//! - registers `$anchor` and `$dynamicAnchor` under the resource base URI,
//! - applies `$schema` and checks `$vocabulary`,
//! - compiles every applicator subschema (including `$defs`) eagerly.
//!
//! `$ref` and `$dynamicRef` targets are compiled lazily by the resolver.

use std::rc::Rc;

use indexmap::IndexMap;
use jschema_pointer::{JsonPointer, PointerToken};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::context::Context;
use crate::dialect::{Dialect, Vocabulary, VocabularySet, bundled_document};
use crate::error::SchemaError;
use crate::keyword::{
    CompiledKeyword, ContainsKeyword, InstanceType, Keyword, KeywordContext, PatternSchema,
    Reference, is_reserved, vocabulary_of,
};
use crate::schema::{ObjectSchema, Schema, SchemaLocation};
use crate::utils::as_non_negative_integer;

/// Resource-level state inherited by subschemas.
#[derive(Debug, Clone)]
pub(crate) struct CompileScope {
    pub base_uri: Url,
    /// Pointer of the innermost resource root within the document
    pub resource_root: JsonPointer,
    pub vocabularies: VocabularySet,
}

impl CompileScope {
    fn document_root(document: &Url) -> Self {
        Self {
            base_uri: document.clone(),
            resource_root: JsonPointer::root(),
            vocabularies: VocabularySet::all(),
        }
    }
}

pub(crate) struct SchemaCompiler<'c> {
    ctx: &'c Context,
}

impl<'c> SchemaCompiler<'c> {
    pub fn new(ctx: &'c Context) -> Self {
        Self { ctx }
    }

    /// Compile the schema at `location`, reusing an earlier compilation.
    pub fn compile_at(&self, location: &SchemaLocation) -> Result<Rc<Schema>, SchemaError> {
        if let Some(schema) = self.ctx.compiled_schema(location) {
            return Ok(schema);
        }
        let document =
            self.ctx
                .document(&location.document)
                .ok_or_else(|| SchemaError::InvalidUri {
                    uri: location.document.to_string(),
                    reason: "document is not loaded".to_string(),
                })?;
        let raw = location
            .pointer
            .resolve(&document)
            .ok_or_else(|| SchemaError::InvalidPointer {
                pointer: location.to_string(),
            })?;
        let scope = self.scope_at(&document, location)?;
        self.compile(raw, location.clone(), &scope)
    }

    /// The scope in effect at `location`, from the `$id`/`$schema` of its ancestors.
    fn scope_at(
        &self,
        document: &Value,
        location: &SchemaLocation,
    ) -> Result<CompileScope, SchemaError> {
        let mut scope = CompileScope::document_root(&location.document);
        let mut node = document;
        let mut pointer = JsonPointer::root();
        for token in location.pointer.tokens() {
            if let Value::Object(map) = node {
                scope = self.enter_resource(map, &pointer, scope)?;
            }
            node = match (node, token) {
                (Value::Object(map), token) => map.get(token.as_key().as_ref()),
                (Value::Array(items), PointerToken::Index(index)) => items.get(*index),
                _ => None,
            }
            .ok_or_else(|| SchemaError::InvalidPointer {
                pointer: location.to_string(),
            })?;
            pointer.push(token.clone());
        }
        Ok(scope)
    }

    /// Apply `$id` and `$schema` of the object at `pointer`.
    fn enter_resource(
        &self,
        map: &Map<String, Value>,
        pointer: &JsonPointer,
        mut scope: CompileScope,
    ) -> Result<CompileScope, SchemaError> {
        let mut is_resource = pointer.is_root();
        if let Some(Value::String(id)) = map.get("$id") {
            if id.starts_with('#') {
                warn!(id, location = %pointer, "ignoring fragment-only $id");
            } else {
                let mut base = scope.base_uri.join(id).map_err(|e| SchemaError::InvalidUri {
                    uri: id.clone(),
                    reason: e.to_string(),
                })?;
                base.set_fragment(None);
                scope.base_uri = base;
                scope.resource_root = pointer.clone();
                is_resource = true;
            }
        }
        if is_resource && let Some(Value::String(meta_schema)) = map.get("$schema") {
            scope.vocabularies = self.vocabularies_for(meta_schema)?;
        }
        Ok(scope)
    }

    /// Active vocabularies of resources declaring `$schema: meta_schema`.
    fn vocabularies_for(&self, meta_schema: &str) -> Result<VocabularySet, SchemaError> {
        if let Some(dialect) = Dialect::from_uri(meta_schema) {
            self.ctx.set_dialect(dialect);
            return Ok(VocabularySet::all());
        }
        let unsupported = || SchemaError::UnsupportedDialect {
            uri: meta_schema.to_string(),
        };
        let mut uri = Url::parse(meta_schema).map_err(|_| unsupported())?;
        uri.set_fragment(None);
        let document = match bundled_document(meta_schema) {
            Some(document) => document,
            None => self.ctx.remote_document(&uri).ok_or_else(unsupported)?,
        };
        match document.get("$vocabulary") {
            Some(vocabulary) => read_vocabulary(vocabulary, meta_schema),
            None => Ok(VocabularySet::all()),
        }
    }

    pub fn compile(
        &self,
        raw: &Value,
        location: SchemaLocation,
        scope: &CompileScope,
    ) -> Result<Rc<Schema>, SchemaError> {
        if let Some(schema) = self.ctx.compiled_schema(&location) {
            return Ok(schema);
        }
        let schema = match raw {
            Value::Bool(b) => Rc::new(Schema::Boolean(*b)),
            Value::Object(map) => self.compile_object(map, location.clone(), scope)?,
            _ => return Err(SchemaError::not_a_schema(&location.document, &location.pointer)),
        };
        self.ctx.cache_compiled(location, schema.clone());
        Ok(schema)
    }

    fn compile_object(
        &self,
        map: &Map<String, Value>,
        location: SchemaLocation,
        parent: &CompileScope,
    ) -> Result<Rc<Schema>, SchemaError> {
        let scope = self.enter_resource(map, &location.pointer, parent.clone())?;

        if location.pointer.is_root() {
            self.ctx
                .register_identifier(location.document.clone(), location.clone());
        }
        if scope.resource_root == location.pointer {
            self.ctx
                .register_identifier(scope.base_uri.clone(), location.clone());
        }
        if let Some(vocabulary) = map.get("$vocabulary") {
            read_vocabulary(vocabulary, &location.to_string())?;
        }
        for (keyword, dynamic) in [("$anchor", false), ("$dynamicAnchor", true)] {
            if let Some(Value::String(name)) = map.get(keyword) {
                let mut uri = scope.base_uri.clone();
                uri.set_fragment(Some(name));
                self.ctx.register_anchor(uri, location.clone(), dynamic);
            }
        }

        let mut keywords = Vec::with_capacity(map.len());
        for (name, value) in map {
            keywords.push(self.compile_keyword(name, value, map, &location, &scope)?);
        }
        keywords.sort_by_key(|keyword| keyword.keyword.rank());

        Ok(Rc::new(Schema::Object(ObjectSchema {
            location,
            base_uri: scope.base_uri,
            keywords,
        })))
    }

    fn compile_keyword(
        &self,
        name: &str,
        value: &Value,
        siblings: &Map<String, Value>,
        parent: &SchemaLocation,
        scope: &CompileScope,
    ) -> Result<CompiledKeyword, SchemaError> {
        let location = parent.with_key(name);
        let mut absolute_location = scope.base_uri.clone();
        let relative = location
            .pointer
            .relative_to(&scope.resource_root)
            .unwrap_or_else(|| location.pointer.clone());
        absolute_location.set_fragment(Some(&relative.to_string()));

        let keyword = if is_reserved(name) {
            Keyword::Reserved
        } else {
            match vocabulary_of(name) {
                Some(vocabulary) if is_active(vocabulary, &scope.vocabularies) => {
                    match self.keyword(name, value, siblings, &location, scope)? {
                        Some(keyword) => keyword,
                        None => {
                            warn!(keyword = name, location = %location, "malformed keyword value is kept inert");
                            Keyword::Unknown
                        }
                    }
                }
                Some(vocabulary) => {
                    debug!(keyword = name, ?vocabulary, "keyword of an inactive vocabulary");
                    Keyword::Unknown
                }
                None => Keyword::Unknown,
            }
        };

        Ok(CompiledKeyword {
            keyword,
            raw: value.clone(),
            context: KeywordContext {
                name: name.to_string(),
                location,
                absolute_location,
            },
        })
    }

    /// Build the keyword state. `None` marks a malformed value.
    fn keyword(
        &self,
        name: &str,
        value: &Value,
        siblings: &Map<String, Value>,
        location: &SchemaLocation,
        scope: &CompileScope,
    ) -> Result<Option<Keyword>, SchemaError> {
        let string = || value.as_str().map(str::to_string);
        let number = || value.as_f64();
        let count = || as_non_negative_integer(value);
        let reference = || {
            value.as_str().map(|reference| Reference {
                reference: reference.to_string(),
                base: scope.base_uri.clone(),
            })
        };

        let keyword = match name {
            // core
            "$schema" => string().map(Keyword::Schema),
            "$id" => string().map(Keyword::Id),
            "$anchor" => string().map(Keyword::Anchor),
            "$dynamicAnchor" => string().map(Keyword::DynamicAnchor),
            "$vocabulary" => Some(Keyword::Vocabulary),
            "$comment" => Some(Keyword::Comment),
            "$ref" => reference().map(Keyword::Ref),
            "$dynamicRef" => reference().map(Keyword::DynamicRef),
            "$defs" => match value {
                Value::Object(defs) => {
                    for (key, def) in defs {
                        self.compile_single(def, location.with_key(key), scope)?;
                    }
                    Some(Keyword::Defs)
                }
                _ => None,
            },

            // applicator
            "prefixItems" => self.compile_list(value, location, scope)?.map(Keyword::PrefixItems),
            "items" => Some(Keyword::Items(self.compile_single(value, location.clone(), scope)?)),
            "contains" => {
                let bound = |name: &str| {
                    is_active(Vocabulary::Validation, &scope.vocabularies)
                        .then(|| siblings.get(name).and_then(as_non_negative_integer))
                        .flatten()
                };
                Some(Keyword::Contains(ContainsKeyword {
                    schema: self.compile_single(value, location.clone(), scope)?,
                    min_contains: bound("minContains"),
                    max_contains: bound("maxContains"),
                }))
            }
            "additionalProperties" => Some(Keyword::AdditionalProperties(
                self.compile_single(value, location.clone(), scope)?,
            )),
            "properties" => self.compile_map(value, location, scope)?.map(Keyword::Properties),
            "patternProperties" => self
                .compile_patterns(value, location, scope)?
                .map(Keyword::PatternProperties),
            "dependentSchemas" => self
                .compile_map(value, location, scope)?
                .map(Keyword::DependentSchemas),
            "propertyNames" => Some(Keyword::PropertyNames(
                self.compile_single(value, location.clone(), scope)?,
            )),
            "if" => Some(Keyword::If(self.compile_single(value, location.clone(), scope)?)),
            "then" => Some(Keyword::Then(self.compile_single(value, location.clone(), scope)?)),
            "else" => Some(Keyword::Else(self.compile_single(value, location.clone(), scope)?)),
            "allOf" => self.compile_list(value, location, scope)?.map(Keyword::AllOf),
            "anyOf" => self.compile_list(value, location, scope)?.map(Keyword::AnyOf),
            "oneOf" => self.compile_list(value, location, scope)?.map(Keyword::OneOf),
            "not" => Some(Keyword::Not(self.compile_single(value, location.clone(), scope)?)),

            // unevaluated
            "unevaluatedItems" => Some(Keyword::UnevaluatedItems(
                self.compile_single(value, location.clone(), scope)?,
            )),
            "unevaluatedProperties" => Some(Keyword::UnevaluatedProperties(
                self.compile_single(value, location.clone(), scope)?,
            )),

            // validation
            "type" => compile_types(value).map(Keyword::Type),
            "const" => Some(Keyword::Const(value.clone())),
            "enum" => value.as_array().cloned().map(Keyword::Enum),
            "multipleOf" => number().filter(|n| *n > 0.0).map(Keyword::MultipleOf),
            "maximum" => number().map(Keyword::Maximum),
            "exclusiveMaximum" => number().map(Keyword::ExclusiveMaximum),
            "minimum" => number().map(Keyword::Minimum),
            "exclusiveMinimum" => number().map(Keyword::ExclusiveMinimum),
            "maxLength" => count().map(Keyword::MaxLength),
            "minLength" => count().map(Keyword::MinLength),
            "pattern" => value
                .as_str()
                .and_then(|pattern| compile_regex(pattern, location))
                .map(Keyword::Pattern),
            "maxItems" => count().map(Keyword::MaxItems),
            "minItems" => count().map(Keyword::MinItems),
            "uniqueItems" => value.as_bool().map(Keyword::UniqueItems),
            "maxContains" => count().map(Keyword::MaxContains),
            "minContains" => count().map(Keyword::MinContains),
            "maxProperties" => count().map(Keyword::MaxProperties),
            "minProperties" => count().map(Keyword::MinProperties),
            "required" => string_list(value).map(Keyword::Required),
            "dependentRequired" => match value {
                Value::Object(map) => map
                    .iter()
                    .map(|(key, required)| string_list(required).map(|list| (key.clone(), list)))
                    .collect::<Option<IndexMap<_, _>>>()
                    .map(Keyword::DependentRequired),
                _ => None,
            },

            // format, meta-data, content
            "format" => string().map(Keyword::Format),
            "title" => string().map(Keyword::Title),
            "description" => string().map(Keyword::Description),
            "default" => Some(Keyword::Default),
            "deprecated" => value.as_bool().map(Keyword::Deprecated),
            "readOnly" => value.as_bool().map(Keyword::ReadOnly),
            "writeOnly" => value.as_bool().map(Keyword::WriteOnly),
            "examples" => value.is_array().then_some(Keyword::Examples),
            "contentEncoding" => string().map(Keyword::ContentEncoding),
            "contentMediaType" => string().map(Keyword::ContentMediaType),
            "contentSchema" => Some(Keyword::ContentSchema),

            _ => Some(Keyword::Unknown),
        };
        Ok(keyword)
    }

    // -------------------------------------------------------------------------
    // Subschema extraction
    // -------------------------------------------------------------------------

    /// Compile a keyword holding one subschema. A value that is not a schema
    /// degrades to `true`.
    fn compile_single(
        &self,
        value: &Value,
        location: SchemaLocation,
        scope: &CompileScope,
    ) -> Result<Rc<Schema>, SchemaError> {
        if !(value.is_boolean() || value.is_object()) {
            warn!(location = %location, "subschema is neither a boolean nor an object, treating it as true");
            return Ok(Rc::new(Schema::Boolean(true)));
        }
        self.compile(value, location, scope)
    }

    fn compile_list(
        &self,
        value: &Value,
        location: &SchemaLocation,
        scope: &CompileScope,
    ) -> Result<Option<Vec<Rc<Schema>>>, SchemaError> {
        let Value::Array(items) = value else {
            return Ok(None);
        };
        if items.is_empty() {
            return Ok(None);
        }
        items
            .iter()
            .enumerate()
            .map(|(index, item)| self.compile(item, location.with_index(index), scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    fn compile_map(
        &self,
        value: &Value,
        location: &SchemaLocation,
        scope: &CompileScope,
    ) -> Result<Option<IndexMap<String, Rc<Schema>>>, SchemaError> {
        let Value::Object(entries) = value else {
            return Ok(None);
        };
        entries
            .iter()
            .map(|(key, entry)| {
                self.compile(entry, location.with_key(key), scope)
                    .map(|schema| (key.clone(), schema))
            })
            .collect::<Result<IndexMap<_, _>, _>>()
            .map(Some)
    }

    fn compile_patterns(
        &self,
        value: &Value,
        location: &SchemaLocation,
        scope: &CompileScope,
    ) -> Result<Option<Vec<PatternSchema>>, SchemaError> {
        let Value::Object(entries) = value else {
            return Ok(None);
        };
        let mut patterns = Vec::with_capacity(entries.len());
        for (pattern, entry) in entries {
            let schema = self.compile(entry, location.with_key(pattern), scope)?;
            let Some(regex) = compile_regex(pattern, location) else {
                continue;
            };
            patterns.push(PatternSchema {
                pattern: pattern.clone(),
                regex,
                schema,
            });
        }
        Ok(Some(patterns))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn is_active(vocabulary: Vocabulary, active: &VocabularySet) -> bool {
    match vocabulary {
        Vocabulary::FormatAnnotation | Vocabulary::FormatAssertion => {
            active.contains(Vocabulary::FormatAnnotation)
                || active.contains(Vocabulary::FormatAssertion)
        }
        vocabulary => active.contains(vocabulary),
    }
}

/// Check a `$vocabulary` object and collect the vocabularies it enables.
pub(crate) fn read_vocabulary(value: &Value, location: &str) -> Result<VocabularySet, SchemaError> {
    let invalid = || SchemaError::InvalidVocabularyFormat {
        location: location.to_string(),
    };
    let Value::Object(entries) = value else {
        return Err(invalid());
    };
    let mut vocabularies = Vec::with_capacity(entries.len());
    for (uri, required) in entries {
        let Value::Bool(required) = required else {
            return Err(invalid());
        };
        if Url::parse(uri).is_err() {
            return Err(invalid());
        }
        match Vocabulary::from_uri(uri) {
            Some(vocabulary) => vocabularies.push(vocabulary),
            None if *required => {
                return Err(SchemaError::UnsupportedRequiredVocabulary {
                    vocabulary: uri.clone(),
                });
            }
            None => debug!(vocabulary = uri, "ignoring unknown optional vocabulary"),
        }
    }
    Ok(VocabularySet::from_vocabularies(vocabularies))
}

fn compile_types(value: &Value) -> Option<Vec<InstanceType>> {
    match value {
        Value::String(name) => InstanceType::from_name(name).map(|t| vec![t]),
        Value::Array(names) => names
            .iter()
            .map(|name| name.as_str().and_then(InstanceType::from_name))
            .collect(),
        _ => None,
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

fn compile_regex(pattern: &str, location: &SchemaLocation) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(error) => {
            warn!(pattern, location = %location, %error, "unsupported regular expression");
            None
        }
    }
}
