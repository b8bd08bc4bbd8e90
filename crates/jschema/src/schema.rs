//! Compiled schema model.

use core::fmt;

use jschema_pointer::JsonPointer;
use serde_json::{Map, Value};
use url::Url;

use crate::keyword::CompiledKeyword;

/// Where a schema lives: a loaded document plus a pointer into it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaLocation {
    /// Retrieval URI of the document (never carries a fragment)
    pub document: Url,
    pub pointer: JsonPointer,
}

impl SchemaLocation {
    pub fn new(mut document: Url, pointer: JsonPointer) -> Self {
        document.set_fragment(None);
        Self { document, pointer }
    }

    pub fn root(document: Url) -> Self {
        Self::new(document, JsonPointer::root())
    }

    pub fn join(&self, pointer: &JsonPointer) -> Self {
        Self {
            document: self.document.clone(),
            pointer: self.pointer.join(pointer),
        }
    }

    pub fn with_key(&self, key: &str) -> Self {
        Self {
            document: self.document.clone(),
            pointer: self.pointer.with_key(key),
        }
    }

    pub fn with_index(&self, index: usize) -> Self {
        Self {
            document: self.document.clone(),
            pointer: self.pointer.with_index(index),
        }
    }
}

impl fmt::Display for SchemaLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document, self.pointer)
    }
}

/// A compiled schema: either a boolean schema or an object schema.
///
/// Subschemas are shared through `Rc`, so a compiled schema graph stays on
/// the thread that built it.
#[derive(Debug, Clone)]
pub enum Schema {
    Boolean(bool),
    Object(ObjectSchema),
}

#[derive(Debug, Clone)]
pub struct ObjectSchema {
    pub location: SchemaLocation,
    /// Base URI of the schema resource this object belongs to
    pub base_uri: Url,
    /// Keywords in evaluation order
    pub keywords: Vec<CompiledKeyword>,
}

impl Schema {
    pub fn is_boolean(&self) -> bool {
        matches!(self, Schema::Boolean(_))
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            Schema::Object(object) => Some(object),
            Schema::Boolean(_) => None,
        }
    }

    pub fn location(&self) -> Option<&SchemaLocation> {
        self.as_object().map(|object| &object.location)
    }

    /// Keywords in evaluation order. Empty for boolean schemas.
    pub fn keywords(&self) -> &[CompiledKeyword] {
        match self {
            Schema::Object(object) => &object.keywords,
            Schema::Boolean(_) => &[],
        }
    }

    pub fn keyword(&self, name: &str) -> Option<&CompiledKeyword> {
        self.keywords().iter().find(|keyword| keyword.name() == name)
    }

    /// Re-encode the schema as JSON. Inert keywords are included.
    pub fn to_value(&self) -> Value {
        match self {
            Schema::Boolean(b) => Value::Bool(*b),
            Schema::Object(object) => Value::Object(
                object
                    .keywords
                    .iter()
                    .map(|keyword| (keyword.name().to_string(), keyword.raw.clone()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.to_value() == other.to_value()
    }
}

impl From<bool> for Schema {
    fn from(value: bool) -> Self {
        Schema::Boolean(value)
    }
}
