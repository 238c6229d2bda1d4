//! Entity interning
//!
//! Maps the canonical id of every term the store has ever seen to a dense
//! `u32` and back. Ids start at 1 (`0` is never handed out) and are never
//! recycled, not even after the last quad using a term is removed, so an id
//! held by an in-flight iteration can never start naming a different term.

use rustc_hash::FxHashMap;

use super::types::Term;

/// Numeric id of an interned term
pub type EntityId = u32;

/// Bidirectional term ↔ id table
#[derive(Debug, Clone, Default)]
pub struct EntityInterner {
    /// Canonical id → entity id
    ids: FxHashMap<String, EntityId>,
    /// Entity id - 1 → term
    entities: Vec<Term>,
}

impl EntityInterner {
    /// Create an empty interner
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id of `term`, assigning the next free one if it is new.
    ///
    /// The components of a quoted quad are interned too, so labels nested
    /// inside one count as used.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` distinct terms are interned.
    pub fn intern(&mut self, term: &Term) -> EntityId {
        let key = term.to_id();
        if let Some(&id) = self.ids.get(&key) {
            return id;
        }
        if let Term::Quad(quad) = term {
            self.intern(&quad.subject);
            self.intern(&quad.predicate);
            self.intern(&quad.object);
            self.intern(&quad.graph);
        }
        let id = EntityId::try_from(self.entities.len() + 1).expect("entity id space exhausted");
        self.ids.insert(key, id);
        self.entities.push(term.clone());
        id
    }

    /// Look up the id of a term without interning it
    pub fn lookup(&self, term: &Term) -> Option<EntityId> {
        self.lookup_id(&term.to_id())
    }

    /// Look up the id of a canonical id string
    pub fn lookup_id(&self, canonical: &str) -> Option<EntityId> {
        self.ids.get(canonical).copied()
    }

    /// Whether a canonical id has ever been interned
    pub fn contains_id(&self, canonical: &str) -> bool {
        self.ids.contains_key(canonical)
    }

    /// Resolve an id back to its term
    pub fn resolve(&self, id: EntityId) -> Option<&Term> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.entities.get(index)
    }

    /// Number of interned terms
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether nothing has been interned yet
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::types::{BlankNode, Literal, NamedNode, Quad};

    #[test]
    fn test_intern_deduplication() {
        let mut interner = EntityInterner::new();
        let alice: Term = NamedNode::new("http://example.org/alice").unwrap().into();
        let name: Term = Literal::new_simple_literal("Alice").into();

        let id1 = interner.intern(&alice);
        let id2 = interner.intern(&alice.clone());
        let id3 = interner.intern(&name);

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_ids_start_at_one_and_resolve() {
        let mut interner = EntityInterner::new();
        let b: Term = BlankNode::new("b0").unwrap().into();

        assert_eq!(interner.intern(&Term::DefaultGraph), 1);
        assert_eq!(interner.intern(&b), 2);
        assert_eq!(interner.resolve(0), None);
        assert_eq!(interner.resolve(2), Some(&b));
        assert_eq!(interner.resolve(2).map(Term::to_id).as_deref(), Some("_:b0"));
        assert_eq!(interner.resolve(1).map(Term::to_id).as_deref(), Some(""));
        assert_eq!(interner.resolve(3), None);
    }

    #[test]
    fn test_lookup_does_not_intern() {
        let mut interner = EntityInterner::new();
        let term: Term = NamedNode::new("http://example.org/x").unwrap().into();

        assert_eq!(interner.lookup(&term), None);
        assert!(interner.is_empty());
        let id = interner.intern(&term);
        assert_eq!(interner.lookup(&term), Some(id));
        assert!(interner.contains_id("http://example.org/x"));
    }

    #[test]
    fn test_quoted_quad_components_are_interned() {
        let mut interner = EntityInterner::new();
        let quoted: Term = Quad::triple(
            BlankNode::new("inner").unwrap().into(),
            NamedNode::new("http://example.org/p").unwrap().into(),
            NamedNode::new("http://example.org/o").unwrap().into(),
        )
        .into();

        let id = interner.intern(&quoted);
        assert!(interner.contains_id("_:inner"));
        assert!(interner.contains_id("http://example.org/p"));
        assert_eq!(interner.resolve(id), Some(&quoted));
        assert_eq!(interner.len(), 5);
    }
}
