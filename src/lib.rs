//! Quadstore
//!
//! An in-memory RDF quad store with N3-style forward-chaining reasoning.
//!
//! # Architecture
//!
//! - Terms are interned to dense `u32` ids that are never recycled
//! - Every graph keeps three nested indices (subject, predicate and object
//!   major), so any pattern descends at most three hash levels
//! - Rules are compiled into slot-based atoms with precomputed rule-to-rule
//!   dependency links; the reasoner seeds every rule once and then only
//!   propagates newly derived facts
//!
//! ## Example Usage
//!
//! ```rust
//! use quadstore::{NamedNode, Quad, QuadStore, Term};
//!
//! let iri = |s: &str| -> Term { NamedNode::new(s).unwrap().into() };
//!
//! let mut store = QuadStore::new();
//! store.add(&Quad::triple(
//!     iri("http://example.org/alice"),
//!     iri("http://xmlns.com/foaf/0.1/knows"),
//!     iri("http://example.org/bob"),
//! ));
//!
//! let results = store.get_quads(Some(&iri("http://example.org/alice")), None, None, None);
//! assert_eq!(results.len(), 1);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod rdf;

// Re-export main types for convenience
pub use config::{ConfigError, ConfigResult, StoreConfig};

pub use rdf::{
    BlankNode, Literal, NamedNode, Quad, Term, Variable,
    QuadStore, StoreError, StoreResult,
    ExtractListsOptions, ExtractedLists,
    QuadPattern, Rule, Reasoner, ReasonerStats, RdfsReasoner,
    RdfFormat, RdfParser, RdfSerializer,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "0.1.0");
    }
}
