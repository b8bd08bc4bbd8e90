//! Reference resolution.
//!
//! `$ref` and `$dynamicRef` values are resolved against the base URI of the
//! schema resource they appear in. The document part of the target URI is
//! looked up among the registered identifiers, then the bundled meta-schemas,
//! then the pre-registered remote documents. Documents found in the last two
//! are loaded into the [`Context`] and compiled on first use. The fragment is
//! either an anchor name or a JSON pointer relative to the resource.

use std::rc::Rc;

use jschema_pointer::JsonPointer;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::compile::SchemaCompiler;
use crate::context::Context;
use crate::dialect::bundled_document;
use crate::keyword::Reference;
use crate::schema::{Schema, SchemaLocation};
use crate::validate::ValidatorError;

pub(crate) struct Resolver<'c> {
    ctx: &'c Context,
}

impl<'c> Resolver<'c> {
    pub fn new(ctx: &'c Context) -> Self {
        Self { ctx }
    }

    /// Resolve a `$ref`.
    pub fn resolve(&self, reference: &Reference) -> Result<Rc<Schema>, ValidatorError> {
        let target = self.target(reference)?;
        self.resolve_target(&target, reference)
    }

    /// Resolve a `$dynamicRef`.
    ///
    /// The reference first resolves statically. When the static target is a
    /// `$dynamicAnchor` of the same name, the outermost resource in the
    /// dynamic scope that declares that dynamic anchor wins.
    pub fn resolve_dynamic(&self, reference: &Reference) -> Result<Rc<Schema>, ValidatorError> {
        let target = self.target(reference)?;
        let schema = self.resolve_target(&target, reference)?;

        let Some(name) = target
            .fragment()
            .filter(|fragment| !fragment.is_empty() && !fragment.starts_with('/'))
        else {
            return Ok(schema);
        };
        if !self.ctx.anchor(&target).is_some_and(|anchor| anchor.dynamic) {
            return Ok(schema);
        }

        for frame in self.ctx.dynamic_scope() {
            let mut uri = frame;
            uri.set_fragment(Some(name));
            if let Some(anchor) = self.ctx.anchor(&uri)
                && anchor.dynamic
            {
                trace!(reference = %reference.reference, target = %uri, "dynamic reference rebound");
                return Ok(SchemaCompiler::new(self.ctx).compile_at(&anchor.location)?);
            }
        }
        Ok(schema)
    }

    fn target(&self, reference: &Reference) -> Result<Url, ValidatorError> {
        reference
            .base
            .join(&reference.reference)
            .map_err(|_| invalid(reference))
    }

    fn resolve_target(
        &self,
        target: &Url,
        reference: &Reference,
    ) -> Result<Rc<Schema>, ValidatorError> {
        if let Some(schema) = self.ctx.cached_schema(target.as_str()) {
            return Ok(schema);
        }

        let mut document = target.clone();
        document.set_fragment(None);
        let resource = match self.locate(&document)? {
            Some(location) => location,
            // Unregistered urn: targets fall back to the referring resource.
            None if document.scheme() == "urn" => {
                trace!(reference = %reference.reference, "urn target resolved against its base");
                self.ctx
                    .identifier(&reference.base)
                    .ok_or_else(|| invalid(reference))?
            }
            None => return Err(invalid(reference)),
        };

        let location = match target.fragment() {
            None | Some("") => resource,
            Some(fragment) => match self.ctx.anchor(target) {
                Some(anchor) => anchor.location,
                None if fragment.starts_with('/') => {
                    let pointer =
                        JsonPointer::from_uri_fragment(fragment).map_err(|_| invalid(reference))?;
                    resource.join(&pointer)
                }
                None => return Err(invalid(reference)),
            },
        };
        let exists = self
            .ctx
            .document(&location.document)
            .is_some_and(|document| location.pointer.resolve(&document).is_some());
        if !exists {
            return Err(invalid(reference));
        }

        let schema = SchemaCompiler::new(self.ctx).compile_at(&location)?;
        self.ctx.cache_schema(target.as_str(), schema.clone());
        Ok(schema)
    }

    /// The location of the resource identified by `uri`, loading bundled and
    /// remote documents on demand.
    fn locate(&self, uri: &Url) -> Result<Option<SchemaLocation>, ValidatorError> {
        if let Some(location) = self.ctx.identifier(uri) {
            return Ok(Some(location));
        }
        if let Some(document) = bundled_document(uri.as_str()) {
            self.load_document(uri, document.clone())?;
        } else if let Some(document) = self.ctx.remote_document(uri) {
            self.load_document(uri, document.clone())?;
        } else {
            return Ok(None);
        }
        Ok(self.ctx.identifier(uri))
    }

    /// Register and compile a document retrieved from `uri`.
    pub fn load_document(&self, uri: &Url, document: Value) -> Result<Rc<Schema>, ValidatorError> {
        let location = SchemaLocation::root(uri.clone());
        if self.ctx.document(uri).is_none() {
            debug!(uri = %uri, "loading referenced document");
            self.ctx.insert_document(uri.clone(), document);
        }
        let schema = SchemaCompiler::new(self.ctx).compile_at(&location)?;
        self.ctx.cache_schema(uri.as_str(), schema.clone());
        Ok(schema)
    }
}

fn invalid(reference: &Reference) -> ValidatorError {
    ValidatorError::InvalidReference {
        reference: reference.reference.clone(),
        base: reference.base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DEFAULT_BASE_URI;
    use crate::dialect::DRAFT_2020_12;
    use serde_json::json;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn context(root: Value) -> Context {
        let base = url(DEFAULT_BASE_URI);
        let ctx = Context::new(base.clone(), root);
        SchemaCompiler::new(&ctx)
            .compile_at(&SchemaLocation::root(base))
            .unwrap();
        ctx
    }

    fn reference(reference: &str, base: &str) -> Reference {
        Reference {
            reference: reference.to_string(),
            base: url(base),
        }
    }

    #[test]
    fn test_resolves_pointer_and_anchor() {
        let ctx = context(json!({
            "$defs": {
                "a": {"type": "integer"},
                "b": {"$anchor": "bee", "type": "string"}
            }
        }));
        let resolver = Resolver::new(&ctx);
        let a = resolver
            .resolve(&reference("#/$defs/a", DEFAULT_BASE_URI))
            .unwrap();
        assert!(a.keyword("type").is_some());
        let b = resolver.resolve(&reference("#bee", DEFAULT_BASE_URI)).unwrap();
        assert_eq!(b.to_value()["type"], "string");
    }

    #[test]
    fn test_resolves_embedded_resource() {
        let ctx = context(json!({
            "$id": "http://example.com/root.json",
            "$defs": {
                "item": {"$id": "item.json", "$defs": {"x": {"minimum": 1}}}
            }
        }));
        let resolver = Resolver::new(&ctx);
        let x = resolver
            .resolve(&reference("item.json#/$defs/x", "http://example.com/root.json"))
            .unwrap();
        assert_eq!(x.to_value(), json!({"minimum": 1}));
    }

    #[test]
    fn test_loads_bundled_meta_schema() {
        let ctx = context(json!({}));
        let resolver = Resolver::new(&ctx);
        let meta = resolver
            .resolve(&reference(DRAFT_2020_12, DEFAULT_BASE_URI))
            .unwrap();
        assert!(meta.keyword("allOf").is_some());
        assert!(ctx.document(&url(DRAFT_2020_12)).is_some());
    }

    #[test]
    fn test_unknown_targets_are_invalid_references() {
        let ctx = context(json!({"$defs": {}}));
        let resolver = Resolver::new(&ctx);
        for target in ["#/$defs/missing", "#nowhere", "http://example.com/missing.json"] {
            let err = resolver
                .resolve(&reference(target, DEFAULT_BASE_URI))
                .unwrap_err();
            assert!(
                matches!(err, ValidatorError::InvalidReference { .. }),
                "{target}: {err:?}"
            );
        }
    }

    #[test]
    fn test_dynamic_reference_prefers_outermost_scope() {
        let ctx = context(json!({
            "$id": "http://example.com/outer",
            "$dynamicAnchor": "node",
            "$defs": {
                "inner": {
                    "$id": "inner",
                    "$dynamicAnchor": "node",
                    "type": "object"
                }
            }
        }));
        let resolver = Resolver::new(&ctx);
        let inner_ref = reference("#node", "http://example.com/inner");

        ctx.push_scope(&url("http://example.com/inner"));
        let schema = resolver.resolve_dynamic(&inner_ref).unwrap();
        assert!(schema.keyword("type").is_some());

        ctx.reset_dynamic_scope();
        ctx.push_scope(&url("http://example.com/outer"));
        ctx.push_scope(&url("http://example.com/inner"));
        let schema = resolver.resolve_dynamic(&inner_ref).unwrap();
        assert!(schema.keyword("$defs").is_some());
    }

    #[test]
    fn test_dynamic_reference_without_dynamic_anchor_is_static() {
        let ctx = context(json!({
            "$id": "http://example.com/outer",
            "$dynamicAnchor": "node",
            "$defs": {
                "inner": {"$id": "inner", "$anchor": "node", "type": "object"}
            }
        }));
        ctx.push_scope(&url("http://example.com/outer"));
        ctx.push_scope(&url("http://example.com/inner"));
        let schema = Resolver::new(&ctx)
            .resolve_dynamic(&reference("#node", "http://example.com/inner"))
            .unwrap();
        assert!(schema.keyword("type").is_some());
    }
}
