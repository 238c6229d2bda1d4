//! RDF (Resource Description Framework) quad store and rule engine
//!
//! This module implements:
//! - RDF terms and quads, with canonical string ids
//! - Entity interning and per-graph triple indices in three orderings
//! - The quad store facade (CRUD, pattern queries, distinct enumeration,
//!   blank node minting, RDF collection extraction)
//! - Rule compilation and forward-chaining reasoning to a fixpoint
//! - RDFS entailment as a built-in rule set
//! - Turtle, TriG, N-Triples and N-Quads I/O
//!
//! # Example
//!
//! ```rust
//! use quadstore::rdf::{NamedNode, Quad, QuadPattern, QuadStore, Reasoner, Rule, Term, Variable};
//!
//! let iri = |s: &str| -> Term { NamedNode::new(s).unwrap().into() };
//! let var = |s: &str| -> Term { Variable::new(s).unwrap().into() };
//! let (parent, ancestor) = (iri("http://example.org/parent"), iri("http://example.org/ancestor"));
//!
//! let mut store = QuadStore::new();
//! store.add(&Quad::triple(iri("http://example.org/a"), parent.clone(), iri("http://example.org/b")));
//! store.add(&Quad::triple(iri("http://example.org/b"), parent.clone(), iri("http://example.org/c")));
//!
//! let rules = [
//!     Rule::new(
//!         vec![QuadPattern::new(var("x"), parent.clone(), var("y"))],
//!         vec![QuadPattern::new(var("x"), ancestor.clone(), var("y"))],
//!     ),
//!     Rule::new(
//!         vec![
//!             QuadPattern::new(var("x"), ancestor.clone(), var("y")),
//!             QuadPattern::new(var("y"), ancestor.clone(), var("z")),
//!         ],
//!         vec![QuadPattern::new(var("x"), ancestor.clone(), var("z"))],
//!     ),
//! ];
//! Reasoner::new(&mut store).reason(&rules).unwrap();
//!
//! assert!(store.has(&Quad::triple(
//!     iri("http://example.org/a"),
//!     ancestor,
//!     iri("http://example.org/c"),
//! )));
//! assert_eq!(store.size(), 5);
//! ```

mod index;
mod interner;
mod lists;
mod namespace;
mod reasoner;
mod rules;
mod schema;
mod serialization;
mod store;
mod types;

pub use types::{
    BlankNode, Literal, NamedNode, Quad, RdfError, RdfResult, Term, Variable,
};

pub use interner::{EntityId, EntityInterner};

pub use index::{GraphIndex, IndexOrder};

pub use store::{QuadIter, QuadStore, StoreError, StoreResult};

pub use lists::{ExtractListsOptions, ExtractedLists, ListError, ListViolation};

pub use namespace::{
    log, rdf, rdfs, xsd, Namespace, NamespaceManager, PrefixError, PrefixResult,
};

pub use rules::{rules_from_store, QuadPattern, Rule, RuleError, RuleResult};

pub use reasoner::{ReasonError, ReasonResult, Reasoner, ReasonerStats};

pub use schema::{InferenceRule, RdfsReasoner};

pub use serialization::{
    ParseError, ParseResult, RdfFormat, RdfParser, RdfSerializer, SerializeError,
    SerializeResult,
};
