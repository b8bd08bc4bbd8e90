//! Shared compilation and resolution state.
//!
//! One `Context` backs one [`Validator`](crate::Validator): it owns every
//! loaded document, the identifier and anchor registries filled while
//! compiling, the compiled-schema caches, the pre-registered remote
//! documents, the registered format validators and the dynamic scope stack
//! used by `$dynamicRef`.
//!
//! All state lives behind `RefCell`, so lookups and registrations go through
//! `&Context` while a validation run is in progress.

use core::cell::{Cell, RefCell};
use core::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::dialect::Dialect;
use crate::format::FormatValidator;
use crate::schema::{Schema, SchemaLocation};

/// Default retrieval URI of a root schema that has no `$id`.
pub const DEFAULT_BASE_URI: &str = "json-schema:///";

/// A registered `$anchor` or `$dynamicAnchor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub location: SchemaLocation,
    pub dynamic: bool,
}

pub struct Context {
    dialect: Cell<Dialect>,
    root: Url,
    documents: RefCell<AHashMap<Url, Rc<Value>>>,
    identifiers: RefCell<AHashMap<Url, SchemaLocation>>,
    anchors: RefCell<AHashMap<Url, Anchor>>,
    /// Compiled schemas by absolute URI
    schemas: RefCell<AHashMap<String, Rc<Schema>>>,
    /// Compiled schemas by document location
    compiled: RefCell<AHashMap<SchemaLocation, Rc<Schema>>>,
    remote_documents: AHashMap<Url, Value>,
    formats: AHashMap<String, Box<dyn FormatValidator>>,
    dynamic_scope: RefCell<Vec<Url>>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("dialect", &self.dialect.get())
            .field("root", &self.root)
            .field("documents", &self.documents.borrow().len())
            .field("identifiers", &self.identifiers.borrow().len())
            .field("anchors", &self.anchors.borrow().len())
            .field("remote_documents", &self.remote_documents.len())
            .field("formats", &self.formats.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Context {
    /// Create a context whose root document is `root_document`, retrievable at `root`.
    pub fn new(root: Url, root_document: Value) -> Self {
        let mut root = root;
        root.set_fragment(None);
        let context = Self {
            dialect: Cell::new(Dialect::default()),
            root: root.clone(),
            documents: RefCell::new(AHashMap::new()),
            identifiers: RefCell::new(AHashMap::new()),
            anchors: RefCell::new(AHashMap::new()),
            schemas: RefCell::new(AHashMap::new()),
            compiled: RefCell::new(AHashMap::new()),
            remote_documents: AHashMap::new(),
            formats: AHashMap::new(),
            dynamic_scope: RefCell::new(Vec::new()),
        };
        context.insert_document(root, root_document);
        context
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect.get()
    }

    pub fn set_dialect(&self, dialect: Dialect) {
        self.dialect.set(dialect);
    }

    /// Retrieval URI of the root document.
    pub fn root_uri(&self) -> &Url {
        &self.root
    }

    pub fn root_location(&self) -> SchemaLocation {
        SchemaLocation::root(self.root.clone())
    }

    // -------------------------------------------------------------------------
    // Documents
    // -------------------------------------------------------------------------

    pub fn document(&self, uri: &Url) -> Option<Rc<Value>> {
        self.documents.borrow().get(uri).cloned()
    }

    pub fn insert_document(&self, uri: Url, document: Value) {
        debug!(uri = %uri, "loaded schema document");
        self.documents
            .borrow_mut()
            .entry(uri)
            .or_insert_with(|| Rc::new(document));
    }

    /// Pre-register a document that references may point at.
    pub fn add_remote_document(&mut self, mut uri: Url, document: Value) {
        uri.set_fragment(None);
        self.remote_documents.insert(uri, document);
    }

    pub fn remote_document(&self, uri: &Url) -> Option<&Value> {
        self.remote_documents.get(uri)
    }

    // -------------------------------------------------------------------------
    // Registries
    // -------------------------------------------------------------------------

    /// Register a resource identifier. The first registration wins.
    pub fn register_identifier(&self, mut uri: Url, location: SchemaLocation) -> bool {
        uri.set_fragment(None);
        let mut identifiers = self.identifiers.borrow_mut();
        if identifiers.contains_key(&uri) {
            return false;
        }
        debug!(uri = %uri, location = %location, "registered identifier");
        identifiers.insert(uri, location);
        true
    }

    pub fn identifier(&self, uri: &Url) -> Option<SchemaLocation> {
        self.identifiers.borrow().get(uri).cloned()
    }

    /// Register `$anchor`/`$dynamicAnchor` under `uri` (base URI plus name fragment).
    /// The first registration wins.
    pub fn register_anchor(&self, uri: Url, location: SchemaLocation, dynamic: bool) -> bool {
        let mut anchors = self.anchors.borrow_mut();
        if anchors.contains_key(&uri) {
            return false;
        }
        debug!(uri = %uri, location = %location, dynamic, "registered anchor");
        anchors.insert(uri, Anchor { location, dynamic });
        true
    }

    pub fn anchor(&self, uri: &Url) -> Option<Anchor> {
        self.anchors.borrow().get(uri).cloned()
    }

    // -------------------------------------------------------------------------
    // Schema caches
    // -------------------------------------------------------------------------

    pub fn cached_schema(&self, uri: &str) -> Option<Rc<Schema>> {
        self.schemas.borrow().get(uri).cloned()
    }

    pub fn cache_schema(&self, uri: &str, schema: Rc<Schema>) {
        let mut schemas = self.schemas.borrow_mut();
        if !schemas.contains_key(uri) {
            trace!(uri, "cached schema");
            schemas.insert(uri.to_string(), schema);
        }
    }

    pub fn compiled_schema(&self, location: &SchemaLocation) -> Option<Rc<Schema>> {
        self.compiled.borrow().get(location).cloned()
    }

    pub fn cache_compiled(&self, location: SchemaLocation, schema: Rc<Schema>) {
        self.compiled.borrow_mut().entry(location).or_insert(schema);
    }

    // -------------------------------------------------------------------------
    // Formats
    // -------------------------------------------------------------------------

    pub fn register_format(&mut self, validator: Box<dyn FormatValidator>) {
        self.formats.insert(validator.name().to_string(), validator);
    }

    pub fn format(&self, name: &str) -> Option<&dyn FormatValidator> {
        self.formats.get(name).map(|validator| validator.as_ref())
    }

    // -------------------------------------------------------------------------
    // Dynamic scope
    // -------------------------------------------------------------------------

    /// Enter a schema resource. Nothing is pushed when `base_uri` is already
    /// the innermost scope; the return value tells whether a frame was pushed.
    pub fn push_scope(&self, base_uri: &Url) -> bool {
        let mut scope = self.dynamic_scope.borrow_mut();
        if scope.last() == Some(base_uri) {
            return false;
        }
        trace!(base_uri = %base_uri, depth = scope.len(), "entered dynamic scope");
        scope.push(base_uri.clone());
        true
    }

    pub fn pop_scope(&self) {
        self.dynamic_scope.borrow_mut().pop();
    }

    /// The dynamic scope, outermost resource first.
    pub fn dynamic_scope(&self) -> Vec<Url> {
        self.dynamic_scope.borrow().clone()
    }

    pub fn reset_dynamic_scope(&self) {
        self.dynamic_scope.borrow_mut().clear();
    }
}

/// Pops the dynamic scope frame pushed on entry when dropped.
pub(crate) struct ScopeGuard<'c> {
    context: &'c Context,
    pushed: bool,
}

impl<'c> ScopeGuard<'c> {
    pub fn enter(context: &'c Context, base_uri: &Url) -> Self {
        let pushed = context.push_scope(base_uri);
        Self { context, pushed }
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        if self.pushed {
            self.context.pop_scope();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jschema_pointer::JsonPointer;
    use serde_json::json;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_first_identifier_registration_wins() {
        let context = Context::new(url(DEFAULT_BASE_URI), json!({}));
        let first = SchemaLocation::new(url(DEFAULT_BASE_URI), JsonPointer::root().with_key("a"));
        let second = SchemaLocation::new(url(DEFAULT_BASE_URI), JsonPointer::root().with_key("b"));
        assert!(context.register_identifier(url("http://example.com/x"), first.clone()));
        assert!(!context.register_identifier(url("http://example.com/x#"), second));
        assert_eq!(context.identifier(&url("http://example.com/x")), Some(first));
    }

    #[test]
    fn test_scope_guard_is_lifo() {
        let context = Context::new(url(DEFAULT_BASE_URI), json!({}));
        let outer = url("http://example.com/outer");
        let inner = url("http://example.com/inner");
        {
            let _outer = ScopeGuard::enter(&context, &outer);
            {
                let _inner = ScopeGuard::enter(&context, &inner);
                let _same = ScopeGuard::enter(&context, &inner);
                assert_eq!(context.dynamic_scope(), vec![outer.clone(), inner.clone()]);
            }
            assert_eq!(context.dynamic_scope(), vec![outer.clone()]);
        }
        assert!(context.dynamic_scope().is_empty());
    }

    #[test]
    fn test_root_document_is_loaded() {
        let context = Context::new(url("http://example.com/root.json#"), json!({"type": "string"}));
        assert_eq!(context.root_uri().as_str(), "http://example.com/root.json");
        assert_eq!(
            context.document(context.root_uri()).as_deref(),
            Some(&json!({"type": "string"}))
        );
    }
}
