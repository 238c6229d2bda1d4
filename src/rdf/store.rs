//! RDF quad store implementation
//!
//! This module provides the in-memory quad store: terms are interned to
//! numeric ids and every graph keeps a [`GraphIndex`] over those ids, so a
//! lookup with any combination of bound and wildcard positions descends at
//! most three hash levels.

use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use std::cell::Cell;
use thiserror::Error;
use tracing::{debug, trace};

use super::index::GraphIndex;
use super::interner::{EntityId, EntityInterner};
use super::lists::ListViolation;
use super::types::{BlankNode, Quad, RdfError, Term};
use crate::config::StoreConfig;

/// Store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A collection could not be extracted
    #[error("Malformed list at {node}: {violation}")]
    MalformedList {
        /// Canonical id of the offending list node
        node: String,
        /// What was wrong with it
        violation: ListViolation,
    },

    /// A term could not be constructed
    #[error(transparent)]
    Term(#[from] RdfError),

    /// The store configuration was rejected
    #[error("Invalid store config: {0}")]
    InvalidConfig(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Lazily materialized query results.
///
/// Borrows the store, so the store cannot be mutated until the iterator is
/// dropped. Collect it (or use [`QuadStore::get_quads`]) for a snapshot.
pub struct QuadIter<'a> {
    inner: Box<dyn Iterator<Item = Quad> + 'a>,
}

impl<'a> QuadIter<'a> {
    fn new(inner: impl Iterator<Item = Quad> + 'a) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    fn empty() -> Self {
        Self::new(std::iter::empty())
    }
}

impl Iterator for QuadIter<'_> {
    type Item = Quad;

    fn next(&mut self) -> Option<Quad> {
        self.inner.next()
    }
}

/// In-memory quad store with per-graph subject/predicate/object indices
#[derive(Debug, Clone)]
pub struct QuadStore {
    /// Term ↔ id table, shared by all graphs
    entities: EntityInterner,
    /// Graph id → triple index
    graphs: FxHashMap<EntityId, GraphIndex>,
    /// Cached quad count, `None` after a mutation
    size: Cell<Option<usize>>,
    /// Counter behind `_:bN` blank node labels
    blank_node_index: u64,
    config: StoreConfig,
}

impl QuadStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::build(StoreConfig::default())
    }

    /// Create an empty store with custom configuration, after validating it
    pub fn with_config(config: StoreConfig) -> StoreResult<Self> {
        config
            .validate()
            .map_err(|e| StoreError::InvalidConfig(e.to_string()))?;
        Ok(Self::build(config))
    }

    fn build(config: StoreConfig) -> Self {
        Self {
            entities: EntityInterner::new(),
            graphs: FxHashMap::default(),
            size: Cell::new(Some(0)),
            blank_node_index: 0,
            config,
        }
    }

    /// The store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The entity table backing this store
    pub fn entities(&self) -> &EntityInterner {
        &self.entities
    }

    /// Add a quad. Returns `true` if it was not already present.
    pub fn add_quad(&mut self, subject: &Term, predicate: &Term, object: &Term, graph: &Term) -> bool {
        let g = self.entities.intern(graph);
        let s = self.entities.intern(subject);
        let p = self.entities.intern(predicate);
        let o = self.entities.intern(object);
        let added = self.graphs.entry(g).or_default().insert(s, p, o);
        if added {
            trace!("Added quad ({}, {}, {}) to graph {}", s, p, o, g);
            self.invalidate_size();
        }
        added
    }

    /// Add a quad. Returns `true` if it was not already present.
    pub fn add(&mut self, quad: &Quad) -> bool {
        self.add_quad(&quad.subject, &quad.predicate, &quad.object, &quad.graph)
    }

    /// Add many quads, returning how many were new
    pub fn add_quads(&mut self, quads: impl IntoIterator<Item = Quad>) -> usize {
        quads.into_iter().filter(|quad| self.add(quad)).count()
    }

    /// Remove a quad. Removing an absent quad is a no-op returning `false`.
    pub fn remove_quad(&mut self, subject: &Term, predicate: &Term, object: &Term, graph: &Term) -> bool {
        let ids = [graph, subject, predicate, object].map(|term| self.entities.lookup(term));
        match ids {
            [Some(g), Some(s), Some(p), Some(o)] => self.remove_ids(g, s, p, o),
            _ => false,
        }
    }

    /// Remove a quad
    pub fn remove(&mut self, quad: &Quad) -> bool {
        self.remove_quad(&quad.subject, &quad.predicate, &quad.object, &quad.graph)
    }

    /// Remove many quads, returning how many were present
    pub fn remove_quads<'q>(&mut self, quads: impl IntoIterator<Item = &'q Quad>) -> usize {
        quads.into_iter().filter(|quad| self.remove(quad)).count()
    }

    /// Remove every quad matching a pattern (`None` = wildcard)
    pub fn remove_matches(
        &mut self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph: Option<&Term>,
    ) -> usize {
        let matches: Vec<_> = match self.pattern_ids(subject, predicate, object, graph) {
            Some([s, p, o, g]) => self.matching_ids(s, p, o, g).collect(),
            None => return 0,
        };
        let removed = matches
            .into_iter()
            .filter(|&(g, [s, p, o])| self.remove_ids(g, s, p, o))
            .count();
        debug!("Removed {} matching quads", removed);
        removed
    }

    /// Remove every quad of a graph
    pub fn delete_graph(&mut self, graph: &Term) -> usize {
        self.remove_matches(None, None, None, Some(graph))
    }

    pub(crate) fn remove_ids(&mut self, g: EntityId, s: EntityId, p: EntityId, o: EntityId) -> bool {
        let prune = self.config.prune_empty_levels;
        let Some(index) = self.graphs.get_mut(&g) else {
            return false;
        };
        if !index.remove(s, p, o, prune) {
            return false;
        }
        if prune && index.is_empty() {
            self.graphs.remove(&g);
        }
        trace!("Removed quad ({}, {}, {}) from graph {}", s, p, o, g);
        self.invalidate_size();
        true
    }

    /// Iterate the quads matching a pattern (`None` = wildcard)
    pub fn match_quads(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph: Option<&Term>,
    ) -> QuadIter<'_> {
        let Some([s, p, o, g]) = self.pattern_ids(subject, predicate, object, graph) else {
            return QuadIter::empty();
        };
        let entities = &self.entities;
        QuadIter::new(
            self.matching_ids(s, p, o, g)
                .filter_map(move |(g, [s, p, o])| materialize(entities, s, p, o, g)),
        )
    }

    /// All quads matching a pattern
    pub fn get_quads(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph: Option<&Term>,
    ) -> Vec<Quad> {
        self.match_quads(subject, predicate, object, graph).collect()
    }

    /// Iterate every quad in the store
    pub fn iter(&self) -> QuadIter<'_> {
        self.match_quads(None, None, None, None)
    }

    /// Whether the store contains a quad
    pub fn has(&self, quad: &Quad) -> bool {
        let ids = [&quad.graph, &quad.subject, &quad.predicate, &quad.object]
            .map(|term| self.entities.lookup(term));
        match ids {
            [Some(g), Some(s), Some(p), Some(o)] => {
                self.graphs.get(&g).is_some_and(|index| index.contains(s, p, o))
            }
            _ => false,
        }
    }

    /// Count the quads matching a pattern
    pub fn count_quads(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph: Option<&Term>,
    ) -> usize {
        let Some([s, p, o, g]) = self.pattern_ids(subject, predicate, object, graph) else {
            return 0;
        };
        self.graph_indexes(g).map(|(_, index)| index.count(s, p, o)).sum()
    }

    /// Total number of quads. Recomputed lazily after mutations.
    pub fn size(&self) -> usize {
        if let Some(size) = self.size.get() {
            return size;
        }
        let size = self.graphs.values().map(GraphIndex::len).sum();
        self.size.set(Some(size));
        size
    }

    /// Whether the store holds no quads
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Whether any quad matching the pattern satisfies `predicate`
    pub fn some(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph: Option<&Term>,
        mut test: impl FnMut(&Quad) -> bool,
    ) -> bool {
        self.match_quads(subject, predicate, object, graph)
            .any(|quad| test(&quad))
    }

    /// Whether at least one quad matches the pattern and all of them
    /// satisfy `test`
    pub fn every(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph: Option<&Term>,
        mut test: impl FnMut(&Quad) -> bool,
    ) -> bool {
        let mut seen = false;
        let all = self
            .match_quads(subject, predicate, object, graph)
            .all(|quad| {
                seen = true;
                test(&quad)
            });
        seen && all
    }

    /// Call `f` with every quad matching the pattern
    pub fn for_each(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph: Option<&Term>,
        f: impl FnMut(Quad),
    ) {
        self.match_quads(subject, predicate, object, graph).for_each(f);
    }

    /// Distinct subjects of quads with the given predicate, object and graph
    pub fn get_subjects(
        &self,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph: Option<&Term>,
    ) -> Vec<Term> {
        match self.pattern_ids(None, predicate, object, graph) {
            Some([_, p, o, g]) => self.distinct(g, |index| index.subjects(p, o)),
            None => Vec::new(),
        }
    }

    /// Distinct predicates of quads with the given subject, object and graph
    pub fn get_predicates(
        &self,
        subject: Option<&Term>,
        object: Option<&Term>,
        graph: Option<&Term>,
    ) -> Vec<Term> {
        match self.pattern_ids(subject, None, object, graph) {
            Some([s, _, o, g]) => self.distinct(g, |index| index.predicates(s, o)),
            None => Vec::new(),
        }
    }

    /// Distinct objects of quads with the given subject, predicate and graph
    pub fn get_objects(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        graph: Option<&Term>,
    ) -> Vec<Term> {
        match self.pattern_ids(subject, predicate, None, graph) {
            Some([s, p, _, g]) => self.distinct(g, |index| index.objects(s, p)),
            None => Vec::new(),
        }
    }

    /// Distinct graphs holding quads with the given subject, predicate and object
    pub fn get_graphs(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Vec<Term> {
        let Some([s, p, o, _]) = self.pattern_ids(subject, predicate, object, None) else {
            return Vec::new();
        };
        self.graphs
            .iter()
            .filter(|(_, index)| index.triples(s, p, o).next().is_some())
            .filter_map(|(g, _)| self.entities.resolve(*g).cloned())
            .collect()
    }

    /// Create a blank node whose label is not yet used in this store.
    ///
    /// A suggested label is tried as-is, then with `1`, `2`, … appended;
    /// otherwise labels come from the store's sequential counter
    /// (`b0`, `b1`, … with the default prefix). The label is reserved
    /// immediately.
    pub fn create_blank_node(&mut self, suggested: Option<&str>) -> StoreResult<BlankNode> {
        let label = match suggested.filter(|label| !label.is_empty()) {
            Some(base) => {
                BlankNode::new(base)?;
                let mut label = base.to_string();
                let mut index = 1u64;
                while self.entities.contains_id(&format!("_:{label}")) {
                    label = format!("{base}{index}");
                    index += 1;
                }
                label
            }
            None => loop {
                let label = format!("{}{}", self.config.blank_node_prefix, self.blank_node_index);
                self.blank_node_index += 1;
                if !self.entities.contains_id(&format!("_:{label}")) {
                    break label;
                }
            },
        };
        let node = BlankNode::new(&label)?;
        self.entities.intern(&Term::BlankNode(node.clone()));
        Ok(node)
    }

    /// Restart the `_:bN` counter at zero. Labels already in use are still
    /// skipped, so freshness is preserved.
    pub fn reset_blank_node_counter(&mut self) {
        self.blank_node_index = 0;
    }

    pub(crate) fn entities_mut(&mut self) -> &mut EntityInterner {
        &mut self.entities
    }

    pub(crate) fn graph_ids(&self) -> Vec<EntityId> {
        self.graphs.keys().copied().collect()
    }

    pub(crate) fn graph_mut(&mut self, graph: EntityId) -> Option<&mut GraphIndex> {
        self.graphs.get_mut(&graph)
    }

    pub(crate) fn invalidate_size(&self) {
        self.size.set(None);
    }

    /// Translate a pattern into ids. `None` when a bound term was never
    /// interned, in which case nothing can match.
    fn pattern_ids(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph: Option<&Term>,
    ) -> Option<[Option<EntityId>; 4]> {
        let lookup = |term: Option<&Term>| match term {
            Some(term) => self.entities.lookup(term).map(Some),
            None => Some(None),
        };
        Some([lookup(subject)?, lookup(predicate)?, lookup(object)?, lookup(graph)?])
    }

    fn graph_indexes(
        &self,
        graph: Option<EntityId>,
    ) -> Box<dyn Iterator<Item = (EntityId, &GraphIndex)> + '_> {
        match graph {
            Some(g) => Box::new(self.graphs.get(&g).map(|index| (g, index)).into_iter()),
            None => Box::new(self.graphs.iter().map(|(g, index)| (*g, index))),
        }
    }

    fn matching_ids(
        &self,
        s: Option<EntityId>,
        p: Option<EntityId>,
        o: Option<EntityId>,
        g: Option<EntityId>,
    ) -> impl Iterator<Item = (EntityId, [EntityId; 3])> + '_ {
        self.graph_indexes(g)
            .flat_map(move |(g, index)| index.triples(s, p, o).map(move |triple| (g, triple)))
    }

    fn distinct(
        &self,
        graph: Option<EntityId>,
        pick: impl for<'i> Fn(&'i GraphIndex) -> Box<dyn Iterator<Item = EntityId> + 'i>,
    ) -> Vec<Term> {
        let ids: IndexSet<EntityId> = self
            .graph_indexes(graph)
            .flat_map(|(_, index)| pick(index))
            .collect();
        ids.into_iter()
            .filter_map(|id| self.entities.resolve(id).cloned())
            .collect()
    }
}

fn materialize(entities: &EntityInterner, s: EntityId, p: EntityId, o: EntityId, g: EntityId) -> Option<Quad> {
    Some(Quad::new(
        entities.resolve(s)?.clone(),
        entities.resolve(p)?.clone(),
        entities.resolve(o)?.clone(),
        entities.resolve(g)?.clone(),
    ))
}

impl Default for QuadStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a QuadStore {
    type Item = Quad;
    type IntoIter = QuadIter<'a>;

    fn into_iter(self) -> QuadIter<'a> {
        self.iter()
    }
}

impl Extend<Quad> for QuadStore {
    fn extend<I: IntoIterator<Item = Quad>>(&mut self, iter: I) {
        self.add_quads(iter);
    }
}

impl FromIterator<Quad> for QuadStore {
    fn from_iter<I: IntoIterator<Item = Quad>>(iter: I) -> Self {
        let mut store = QuadStore::new();
        store.extend(iter);
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::types::{Literal, NamedNode};

    fn iri(s: &str) -> Term {
        NamedNode::new(&format!("http://example.org/{s}")).unwrap().into()
    }

    fn quad(s: &str, p: &str, o: &str, g: Option<&str>) -> Quad {
        Quad::new(iri(s), iri(p), iri(o), g.map_or(Term::DefaultGraph, iri))
    }

    fn sample() -> QuadStore {
        [
            quad("alice", "knows", "bob", None),
            quad("alice", "knows", "carol", None),
            quad("bob", "knows", "carol", None),
            quad("alice", "name", "alice_name", Some("g1")),
            quad("alice", "knows", "bob", Some("g1")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_add_and_has() {
        let mut store = QuadStore::new();
        let q = quad("s", "p", "o", None);

        assert!(store.add(&q));
        assert!(store.has(&q));
        assert_eq!(store.size(), 1);
        assert!(!store.has(&quad("s", "p", "o", Some("g"))));
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut store = QuadStore::new();
        let q = quad("s", "p", "o", None);

        assert!(store.add(&q));
        assert!(!store.add(&q));
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn test_remove_restores_size() {
        let mut store = sample();
        let before = store.size();
        let q = quad("new", "p", "o", Some("g2"));

        store.add(&q);
        assert_eq!(store.size(), before + 1);
        assert!(store.remove(&q));
        assert_eq!(store.size(), before);
        assert!(!store.remove(&q));
        assert!(store.get_graphs(None, None, None).iter().all(|g| g != &iri("g2")));
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut store = sample();
        assert!(!store.remove(&quad("nobody", "knows", "bob", None)));
        assert_eq!(store.remove_matches(Some(&iri("nobody")), None, None, None), 0);
        assert_eq!(store.size(), 5);
    }

    #[test]
    fn test_get_quads_patterns() {
        let store = sample();

        assert_eq!(store.get_quads(None, None, None, None).len(), 5);
        assert_eq!(store.get_quads(Some(&iri("alice")), None, None, None).len(), 4);
        assert_eq!(
            store
                .get_quads(Some(&iri("alice")), None, None, Some(&Term::DefaultGraph))
                .len(),
            2
        );
        assert_eq!(store.get_quads(None, Some(&iri("knows")), Some(&iri("carol")), None).len(), 2);
        assert_eq!(store.get_quads(None, None, None, Some(&iri("g1"))).len(), 2);
        assert!(store.get_quads(Some(&iri("zed")), None, None, None).is_empty());
    }

    #[test]
    fn test_count_quads() {
        let store = sample();
        assert_eq!(store.count_quads(None, None, None, None), 5);
        assert_eq!(store.count_quads(Some(&iri("alice")), Some(&iri("knows")), None, None), 3);
        assert_eq!(store.count_quads(None, None, Some(&iri("bob")), Some(&iri("g1"))), 1);
        assert_eq!(store.count_quads(None, None, Some(&iri("zed")), None), 0);
    }

    #[test]
    fn test_remove_matches_and_delete_graph() {
        let mut store = sample();

        assert_eq!(store.remove_matches(None, Some(&iri("knows")), None, Some(&Term::DefaultGraph)), 3);
        assert_eq!(store.size(), 2);
        assert_eq!(store.delete_graph(&iri("g1")), 2);
        assert!(store.is_empty());
        assert!(store.get_graphs(None, None, None).is_empty());
    }

    #[test]
    fn test_some_every_for_each() {
        let store = sample();
        let knows = iri("knows");

        assert!(store.some(None, Some(&knows), None, None, |q| q.object == iri("carol")));
        assert!(!store.some(None, Some(&knows), None, None, |q| q.object == iri("dave")));
        assert!(store.every(None, Some(&knows), None, None, |q| q.predicate == knows));
        assert!(!store.every(None, None, None, None, |q| q.predicate == knows));
        assert!(!store.every(Some(&iri("zed")), None, None, None, |_| true));

        let mut seen = 0;
        store.for_each(Some(&iri("alice")), None, None, None, |_| seen += 1);
        assert_eq!(seen, 4);
    }

    #[test]
    fn test_distinct_enumerations_deduplicate_across_graphs() {
        let store = sample();

        let subjects = store.get_subjects(Some(&iri("knows")), None, None);
        assert_eq!(subjects.len(), 2);
        assert!(subjects.contains(&iri("alice")) && subjects.contains(&iri("bob")));

        let objects = store.get_objects(Some(&iri("alice")), Some(&iri("knows")), None);
        assert_eq!(objects.len(), 2);

        let predicates = store.get_predicates(Some(&iri("alice")), None, None);
        assert_eq!(predicates.len(), 2);

        let mut graphs = store.get_graphs(Some(&iri("alice")), Some(&iri("knows")), Some(&iri("bob")));
        graphs.sort_by_key(Term::to_id);
        assert_eq!(graphs, vec![Term::DefaultGraph, iri("g1")]);
    }

    #[test]
    fn test_size_is_recomputed_after_mutation() {
        let mut store = QuadStore::new();
        assert_eq!(store.size(), 0);
        store.add(&quad("a", "b", "c", None));
        store.add(&quad("a", "b", "d", Some("g")));
        assert_eq!(store.size(), 2);
        store.remove(&quad("a", "b", "c", None));
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn test_create_blank_node_probes_suggestion() {
        let mut store = QuadStore::new();
        store.add_quad(
            &BlankNode::new("x").unwrap().into(),
            &iri("p"),
            &Literal::new_simple_literal("v").into(),
            &Term::DefaultGraph,
        );

        assert_eq!(store.create_blank_node(Some("x")).unwrap().as_str(), "x1");
        assert_eq!(store.create_blank_node(Some("x")).unwrap().as_str(), "x2");
        assert_eq!(store.create_blank_node(Some("y")).unwrap().as_str(), "y");
        assert!(store.create_blank_node(Some("not valid")).is_err());
    }

    #[test]
    fn test_create_blank_node_counter_and_reset() {
        let mut store = QuadStore::new();

        assert_eq!(store.create_blank_node(None).unwrap().as_str(), "b0");
        assert_eq!(store.create_blank_node(None).unwrap().as_str(), "b1");
        store.reset_blank_node_counter();
        assert_eq!(store.create_blank_node(None).unwrap().as_str(), "b2");
        assert_eq!(store.create_blank_node(Some("")).unwrap().as_str(), "b3");
    }

    #[test]
    fn test_without_pruning_graphs_stay_listed_but_empty() {
        let config = StoreConfig {
            prune_empty_levels: false,
            ..StoreConfig::default()
        };
        let mut store = QuadStore::with_config(config).unwrap();
        let q = quad("s", "p", "o", Some("g"));

        store.add(&q);
        store.remove(&q);
        assert!(store.is_empty());
        assert!(store.get_graphs(None, None, None).is_empty());
        assert!(store.get_subjects(None, None, None).is_empty());
    }

    #[test]
    fn test_with_config_rejects_invalid_prefix() {
        let config = StoreConfig {
            blank_node_prefix: "not valid".to_string(),
            ..StoreConfig::default()
        };
        let err = QuadStore::with_config(config).unwrap_err();
        assert!(matches!(err, StoreError::InvalidConfig(_)));

        let config = StoreConfig {
            blank_node_prefix: "n".to_string(),
            ..StoreConfig::default()
        };
        let mut store = QuadStore::with_config(config).unwrap();
        assert_eq!(store.create_blank_node(None).unwrap().as_str(), "n0");
    }
}
