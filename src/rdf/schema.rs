//! RDFS (RDF Schema) reasoning
//!
//! Implements the core RDFS entailment rules as ordinary [`Rule`]s, so they
//! run through the same forward-chaining engine as user rules.

use tracing::info;

use super::namespace::{rdf, rdfs};
use super::reasoner::{ReasonResult, Reasoner, ReasonerStats};
use super::rules::{QuadPattern, Rule};
use super::store::QuadStore;
use super::types::{NamedNode, Term, Variable};

/// RDFS inference rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InferenceRule {
    /// rdfs:subClassOf transitivity
    SubClassOfTransitive,

    /// rdfs:subPropertyOf transitivity
    SubPropertyOfTransitive,

    /// rdfs:domain inference
    DomainInference,

    /// rdfs:range inference
    RangeInference,

    /// rdf:type inheritance via rdfs:subClassOf
    TypeInheritance,

    /// Statements inherited along rdfs:subPropertyOf
    SubPropertyInheritance,
}

impl InferenceRule {
    /// All supported rules
    pub const ALL: [InferenceRule; 6] = [
        InferenceRule::SubClassOfTransitive,
        InferenceRule::SubPropertyOfTransitive,
        InferenceRule::DomainInference,
        InferenceRule::RangeInference,
        InferenceRule::TypeInheritance,
        InferenceRule::SubPropertyInheritance,
    ];

    /// The rule as quad patterns
    pub fn to_rule(self) -> Rule {
        let var = |name: &str| -> Term { Variable::new_unchecked(name).into() };
        let iri = |iri: &str| -> Term { NamedNode::new_unchecked(iri).into() };
        let pattern = |s: &str, p: Term, o: &str| QuadPattern::new(var(s), p, var(o));

        match self {
            // (A subClassOf B) ∧ (B subClassOf C) → (A subClassOf C)
            InferenceRule::SubClassOfTransitive => Rule::new(
                vec![
                    pattern("a", iri(rdfs::SUB_CLASS_OF), "b"),
                    pattern("b", iri(rdfs::SUB_CLASS_OF), "c"),
                ],
                vec![pattern("a", iri(rdfs::SUB_CLASS_OF), "c")],
            ),
            InferenceRule::SubPropertyOfTransitive => Rule::new(
                vec![
                    pattern("a", iri(rdfs::SUB_PROPERTY_OF), "b"),
                    pattern("b", iri(rdfs::SUB_PROPERTY_OF), "c"),
                ],
                vec![pattern("a", iri(rdfs::SUB_PROPERTY_OF), "c")],
            ),
            // (P domain C) ∧ (X P Y) → (X type C)
            InferenceRule::DomainInference => Rule::new(
                vec![
                    pattern("p", iri(rdfs::DOMAIN), "c"),
                    pattern("x", var("p"), "y"),
                ],
                vec![pattern("x", iri(rdf::TYPE), "c")],
            ),
            // (P range C) ∧ (X P Y) → (Y type C)
            InferenceRule::RangeInference => Rule::new(
                vec![
                    pattern("p", iri(rdfs::RANGE), "c"),
                    pattern("x", var("p"), "y"),
                ],
                vec![pattern("y", iri(rdf::TYPE), "c")],
            ),
            // (X type A) ∧ (A subClassOf B) → (X type B)
            InferenceRule::TypeInheritance => Rule::new(
                vec![
                    pattern("x", iri(rdf::TYPE), "a"),
                    pattern("a", iri(rdfs::SUB_CLASS_OF), "b"),
                ],
                vec![pattern("x", iri(rdf::TYPE), "b")],
            ),
            // (P subPropertyOf Q) ∧ (X P Y) → (X Q Y)
            InferenceRule::SubPropertyInheritance => Rule::new(
                vec![
                    pattern("p", iri(rdfs::SUB_PROPERTY_OF), "q"),
                    pattern("x", var("p"), "y"),
                ],
                vec![pattern("x", var("q"), "y")],
            ),
        }
    }
}

/// RDFS reasoner with forward chaining
#[derive(Debug, Clone)]
pub struct RdfsReasoner {
    /// Enable specific rules
    enabled_rules: Vec<InferenceRule>,
}

impl RdfsReasoner {
    /// Create a new reasoner with all rules enabled
    pub fn new() -> Self {
        Self::with_rules(InferenceRule::ALL.to_vec())
    }

    /// Create a reasoner with specific rules
    pub fn with_rules(rules: Vec<InferenceRule>) -> Self {
        Self {
            enabled_rules: rules,
        }
    }

    /// The enabled rules
    pub fn enabled_rules(&self) -> &[InferenceRule] {
        &self.enabled_rules
    }

    /// The enabled rules as quad-pattern rules
    pub fn rules(&self) -> Vec<Rule> {
        self.enabled_rules.iter().map(|rule| rule.to_rule()).collect()
    }

    /// Apply reasoning and add inferred quads to the store
    pub fn reason(&self, store: &mut QuadStore) -> ReasonResult<ReasonerStats> {
        let stats = Reasoner::new(store).reason(&self.rules())?;
        info!("RDFS reasoning derived {} quads", stats.derived);
        Ok(stats)
    }
}

impl Default for RdfsReasoner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::types::Quad;

    fn ex(local: &str) -> Term {
        NamedNode::new(&format!("http://example.org/{local}")).unwrap().into()
    }

    fn vocab(iri: &str) -> Term {
        NamedNode::new(iri).unwrap().into()
    }

    #[test]
    fn test_reasoner_creation() {
        let reasoner = RdfsReasoner::new();
        assert_eq!(reasoner.enabled_rules().len(), 6);
        assert_eq!(reasoner.rules().len(), 6);
    }

    #[test]
    fn test_custom_rules() {
        let reasoner = RdfsReasoner::with_rules(vec![InferenceRule::SubClassOfTransitive]);
        assert_eq!(reasoner.enabled_rules(), &[InferenceRule::SubClassOfTransitive]);
    }

    #[test]
    fn test_domain_and_range() {
        let mut store = QuadStore::new();
        store.add(&Quad::triple(ex("knows"), vocab(rdfs::DOMAIN), ex("Person")));
        store.add(&Quad::triple(ex("knows"), vocab(rdfs::RANGE), ex("Agent")));
        store.add(&Quad::triple(ex("alice"), ex("knows"), ex("bob")));

        let stats = RdfsReasoner::new().reason(&mut store).unwrap();

        assert_eq!(stats.derived, 2);
        assert!(store.has(&Quad::triple(ex("alice"), vocab(rdf::TYPE), ex("Person"))));
        assert!(store.has(&Quad::triple(ex("bob"), vocab(rdf::TYPE), ex("Agent"))));
    }

    #[test]
    fn test_sub_property_chain() {
        let mut store = QuadStore::new();
        store.add(&Quad::triple(ex("mother"), vocab(rdfs::SUB_PROPERTY_OF), ex("parent")));
        store.add(&Quad::triple(ex("parent"), vocab(rdfs::SUB_PROPERTY_OF), ex("ancestor")));
        store.add(&Quad::triple(ex("ancestor"), vocab(rdfs::DOMAIN), ex("Person")));
        store.add(&Quad::triple(ex("ann"), ex("mother"), ex("bea")));

        RdfsReasoner::new().reason(&mut store).unwrap();

        assert!(store.has(&Quad::triple(ex("mother"), vocab(rdfs::SUB_PROPERTY_OF), ex("ancestor"))));
        assert!(store.has(&Quad::triple(ex("ann"), ex("parent"), ex("bea"))));
        assert!(store.has(&Quad::triple(ex("ann"), ex("ancestor"), ex("bea"))));
        assert!(store.has(&Quad::triple(ex("ann"), vocab(rdf::TYPE), ex("Person"))));
    }

    #[test]
    fn test_only_enabled_rules_fire() {
        let mut store = QuadStore::new();
        store.add(&Quad::triple(ex("A"), vocab(rdfs::SUB_CLASS_OF), ex("B")));
        store.add(&Quad::triple(ex("B"), vocab(rdfs::SUB_CLASS_OF), ex("C")));
        store.add(&Quad::triple(ex("x"), vocab(rdf::TYPE), ex("A")));

        let reasoner = RdfsReasoner::with_rules(vec![InferenceRule::SubClassOfTransitive]);
        reasoner.reason(&mut store).unwrap();

        assert!(store.has(&Quad::triple(ex("A"), vocab(rdfs::SUB_CLASS_OF), ex("C"))));
        assert!(!store.has(&Quad::triple(ex("x"), vocab(rdf::TYPE), ex("B"))));
        assert_eq!(store.size(), 4);
    }

    #[test]
    fn test_derived_fact_must_match_atom_constants() {
        let mut store = QuadStore::new();
        store.add(&Quad::triple(ex("mother"), vocab(rdfs::SUB_PROPERTY_OF), ex("parent")));
        store.add(&Quad::triple(ex("ann"), ex("mother"), ex("bea")));
        store.add(&Quad::triple(ex("c"), ex("ann"), ex("d")));

        let reasoner = RdfsReasoner::with_rules(vec![InferenceRule::SubPropertyInheritance]);
        let stats = reasoner.reason(&mut store).unwrap();

        // (ann parent bea) must not be read as (ann subPropertyOf bea)
        assert_eq!(stats.derived, 1);
        assert!(store.has(&Quad::triple(ex("ann"), ex("parent"), ex("bea"))));
        assert!(!store.has(&Quad::triple(ex("c"), ex("bea"), ex("d"))));
        assert_eq!(store.size(), 4);
    }
}
