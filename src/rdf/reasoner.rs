//! Forward-chaining rule engine
//!
//! Reasoning runs in two phases per graph. The seed phase evaluates every
//! rule's full premise against the graph index. Each conclusion that turns
//! out to be a new triple is then pushed through the dependency links built
//! at compile time: the new fact is unified with one premise atom of a
//! dependent rule and only the remaining atoms are evaluated. The worklist
//! drains when no new triple is produced, which is the fixpoint.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, trace};

use super::index::GraphIndex;
use super::interner::EntityId;
use super::rules::{compile, Atom, CompiledRule, ConclusionAtom, Rule, RuleError, Slot};
use super::store::QuadStore;
use super::types::Term;

/// Reasoning errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReasonError {
    /// A rule failed validation
    #[error("Invalid rule: {0}")]
    InvalidRule(#[from] RuleError),
}

pub type ReasonResult<T> = Result<T, ReasonError>;

/// Counters from one reasoning run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReasonerStats {
    /// Rules compiled
    pub rules: usize,
    /// Graphs reasoned over
    pub graphs: usize,
    /// New quads added
    pub derived: usize,
    /// Dependency links followed
    pub propagations: usize,
}

/// Applies rules to a store until nothing new can be derived
pub struct Reasoner<'a> {
    store: &'a mut QuadStore,
}

impl<'a> Reasoner<'a> {
    /// Create a reasoner over a store
    pub fn new(store: &'a mut QuadStore) -> Self {
        Self { store }
    }

    /// Run the rules to a fixpoint in every graph. Each graph is closed
    /// independently: premises only match triples of the same graph and
    /// conclusions land in it.
    pub fn reason(&mut self, rules: &[Rule]) -> ReasonResult<ReasonerStats> {
        let compiled = compile(rules, self.store.entities_mut())?;
        let graphs = self.store.graph_ids();
        Ok(self.run(&compiled, &graphs))
    }

    /// Run the rules to a fixpoint in a single graph
    pub fn reason_in_graph(&mut self, rules: &[Rule], graph: &Term) -> ReasonResult<ReasonerStats> {
        let compiled = compile(rules, self.store.entities_mut())?;
        let graphs: Vec<EntityId> = self.store.entities().lookup(graph).into_iter().collect();
        Ok(self.run(&compiled, &graphs))
    }

    fn run(&mut self, rules: &[CompiledRule], graphs: &[EntityId]) -> ReasonerStats {
        info!("Reasoning with {} rules over {} graphs", rules.len(), graphs.len());
        let mut stats = ReasonerStats {
            rules: rules.len(),
            ..Default::default()
        };

        for &graph in graphs {
            let Some(index) = self.store.graph_mut(graph) else {
                continue;
            };
            let mut closure = Closure::new(rules, index);
            closure.seed();
            closure.propagate();
            debug!(
                "Graph {}: derived {} quads through {} propagations",
                graph, closure.derived, closure.propagations
            );

            stats.graphs += 1;
            stats.derived += closure.derived;
            stats.propagations += closure.propagations;
        }

        if stats.derived > 0 {
            self.store.invalidate_size();
        }
        info!(
            "Reasoning complete: {} quads derived, {} propagations",
            stats.derived, stats.propagations
        );
        stats
    }
}

/// A newly derived fact waiting to be fed through one dependency link
struct WorkItem {
    rule: usize,
    conclusion: usize,
    link: usize,
    fact: [EntityId; 3],
}

/// Fixpoint state for one graph
struct Closure<'r, 'g> {
    rules: &'r [CompiledRule],
    index: &'g mut GraphIndex,
    /// Per-rule variable bindings, all unbound between evaluations
    bindings: Vec<Vec<Option<EntityId>>>,
    worklist: Vec<WorkItem>,
    /// Conclusions of the evaluation in progress
    emitted: Vec<(usize, [EntityId; 3])>,
    derived: usize,
    propagations: usize,
}

impl<'r, 'g> Closure<'r, 'g> {
    fn new(rules: &'r [CompiledRule], index: &'g mut GraphIndex) -> Self {
        Self {
            rules,
            index,
            bindings: rules.iter().map(|rule| vec![None; rule.variables]).collect(),
            worklist: Vec::new(),
            emitted: Vec::new(),
            derived: 0,
            propagations: 0,
        }
    }

    fn seed(&mut self) {
        let rules = self.rules;
        for (r, rule) in rules.iter().enumerate() {
            solve(
                self.index,
                &rule.premise,
                &mut self.bindings[r],
                &rule.conclusion,
                &mut self.emitted,
            );
            self.flush(r);
        }
    }

    fn propagate(&mut self) {
        let rules = self.rules;
        while let Some(item) = self.worklist.pop() {
            self.propagations += 1;
            let link = &rules[item.rule].conclusion[item.conclusion].next[item.link];
            let target = &rules[link.rule];
            let bindings = &mut self.bindings[link.rule];

            let mut written = Vec::with_capacity(3);
            if bind(&link.base, item.fact, bindings, &mut written) {
                solve(
                    self.index,
                    &link.premise,
                    bindings,
                    &target.conclusion,
                    &mut self.emitted,
                );
            }
            unbind(bindings, &written);
            self.flush(link.rule);
        }
    }

    /// Insert the buffered conclusions of `rule` and queue the links of
    /// every triple that was new
    fn flush(&mut self, rule: usize) {
        for (conclusion, [s, p, o]) in self.emitted.drain(..) {
            if !self.index.insert(s, p, o) {
                continue;
            }
            trace!("Derived ({}, {}, {}) from rule {}", s, p, o, rule);
            self.derived += 1;
            let links = self.rules[rule].conclusion[conclusion].next.len();
            self.worklist.extend((0..links).map(|link| WorkItem {
                rule,
                conclusion,
                link,
                fact: [s, p, o],
            }));
        }
    }
}

/// Bind an atom's variables to a fact. Returns `false` if a constant or an
/// already bound variable disagrees with it.
fn bind(
    atom: &Atom,
    fact: [EntityId; 3],
    bindings: &mut [Option<EntityId>],
    written: &mut Vec<usize>,
) -> bool {
    for (slot, value) in atom.iter().zip(fact) {
        match *slot {
            Slot::Const(id) if id != value => return false,
            Slot::Const(_) => {}
            Slot::Var(var) => match bindings[var] {
                Some(bound) if bound != value => return false,
                Some(_) => {}
                None => {
                    bindings[var] = Some(value);
                    written.push(var);
                }
            },
        }
    }
    true
}

fn unbind(bindings: &mut [Option<EntityId>], written: &[usize]) {
    for &var in written {
        bindings[var] = None;
    }
}

/// Evaluate a premise left to right, emitting every conclusion instance.
///
/// The index ordering for each atom is chosen from the slots bound at the
/// moment it is evaluated.
fn solve(
    index: &GraphIndex,
    premise: &[Atom],
    bindings: &mut [Option<EntityId>],
    conclusion: &[ConclusionAtom],
    emitted: &mut Vec<(usize, [EntityId; 3])>,
) {
    let Some((atom, rest)) = premise.split_first() else {
        for (position, atom) in conclusion.iter().enumerate() {
            let [s, p, o] = atom.pattern.map(|slot| slot.value(bindings));
            if let (Some(s), Some(p), Some(o)) = (s, p, o) {
                emitted.push((position, [s, p, o]));
            }
        }
        return;
    };

    let [s, p, o] = atom.map(|slot| slot.value(bindings));
    let mut written = Vec::with_capacity(3);
    for triple in index.triples(s, p, o) {
        if bind(atom, triple, bindings, &mut written) {
            solve(index, rest, bindings, conclusion, emitted);
        }
        unbind(bindings, &written);
        written.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::namespace::{rdf, rdfs};
    use crate::rdf::rules::QuadPattern;
    use crate::rdf::types::{NamedNode, Quad, Variable};

    fn var(name: &str) -> Term {
        Variable::new(name).unwrap().into()
    }

    fn iri(iri: &str) -> Term {
        NamedNode::new(iri).unwrap().into()
    }

    fn ex(local: &str) -> Term {
        iri(&format!("http://example.org/{local}"))
    }

    fn type_inheritance() -> Rule {
        Rule::new(
            vec![
                QuadPattern::new(var("s"), iri(rdf::TYPE), var("o")),
                QuadPattern::new(var("o"), iri(rdfs::SUB_CLASS_OF), var("o2")),
            ],
            vec![QuadPattern::new(var("s"), iri(rdf::TYPE), var("o2"))],
        )
    }

    fn subclass_transitivity() -> Rule {
        Rule::new(
            vec![
                QuadPattern::new(var("a"), iri(rdfs::SUB_CLASS_OF), var("b")),
                QuadPattern::new(var("b"), iri(rdfs::SUB_CLASS_OF), var("c")),
            ],
            vec![QuadPattern::new(var("a"), iri(rdfs::SUB_CLASS_OF), var("c"))],
        )
    }

    #[test]
    fn test_transitive_type() {
        let mut store = QuadStore::new();
        store.add(&Quad::triple(ex("s"), iri(rdf::TYPE), ex("o")));
        store.add(&Quad::triple(ex("o"), iri(rdfs::SUB_CLASS_OF), ex("o2")));

        let stats = Reasoner::new(&mut store).reason(&[type_inheritance()]).unwrap();

        assert_eq!(store.size(), 3);
        assert!(store.has(&Quad::triple(ex("s"), iri(rdf::TYPE), ex("o2"))));
        assert_eq!(stats.rules, 1);
        assert_eq!(stats.graphs, 1);
        assert_eq!(stats.derived, 1);
    }

    #[test]
    fn test_propagation_reaches_fixpoint() {
        let mut store = QuadStore::new();
        for (a, b) in [("c1", "c2"), ("c2", "c3"), ("c3", "c4"), ("c4", "c5")] {
            store.add(&Quad::triple(ex(a), iri(rdfs::SUB_CLASS_OF), ex(b)));
        }
        store.add(&Quad::triple(ex("x"), iri(rdf::TYPE), ex("c1")));

        let rules = [subclass_transitivity(), type_inheritance()];
        Reasoner::new(&mut store).reason(&rules).unwrap();

        // 4 + 6 subclass pairs, 5 types
        assert_eq!(store.size(), 15);
        for class in ["c2", "c3", "c4", "c5"] {
            assert!(store.has(&Quad::triple(ex("x"), iri(rdf::TYPE), ex(class))));
        }
        assert!(store.has(&Quad::triple(ex("c1"), iri(rdfs::SUB_CLASS_OF), ex("c5"))));
    }

    #[test]
    fn test_second_run_derives_nothing() {
        let mut store = QuadStore::new();
        store.add(&Quad::triple(ex("a"), iri(rdfs::SUB_CLASS_OF), ex("b")));
        store.add(&Quad::triple(ex("b"), iri(rdfs::SUB_CLASS_OF), ex("c")));
        let rules = [subclass_transitivity()];

        Reasoner::new(&mut store).reason(&rules).unwrap();
        let size = store.size();
        let stats = Reasoner::new(&mut store).reason(&rules).unwrap();

        assert_eq!(store.size(), size);
        assert_eq!(stats.derived, 0);
    }

    #[test]
    fn test_repeated_variable_in_atom() {
        let mut store = QuadStore::new();
        store.add(&Quad::triple(ex("a"), ex("knows"), ex("a")));
        store.add(&Quad::triple(ex("a"), ex("knows"), ex("b")));

        let rule = Rule::new(
            vec![QuadPattern::new(var("x"), ex("knows"), var("x"))],
            vec![QuadPattern::new(var("x"), iri(rdf::TYPE), ex("SelfAware"))],
        );
        Reasoner::new(&mut store).reason(&[rule]).unwrap();

        assert!(store.has(&Quad::triple(ex("a"), iri(rdf::TYPE), ex("SelfAware"))));
        assert!(!store.has(&Quad::triple(ex("b"), iri(rdf::TYPE), ex("SelfAware"))));
        assert_eq!(store.size(), 3);
    }

    #[test]
    fn test_repeated_variable_rejects_distinct_values() {
        let mut store = QuadStore::new();
        store.add(&Quad::triple(ex("a"), ex("knows"), ex("b")));

        let rule = Rule::new(
            vec![QuadPattern::new(var("x"), ex("knows"), var("x"))],
            vec![QuadPattern::new(var("x"), iri(rdf::TYPE), ex("SelfAware"))],
        );
        let stats = Reasoner::new(&mut store).reason(&[rule]).unwrap();

        assert_eq!(stats.derived, 0);
        assert!(!store.has(&Quad::triple(ex("a"), iri(rdf::TYPE), ex("SelfAware"))));
        assert!(!store.has(&Quad::triple(ex("b"), iri(rdf::TYPE), ex("SelfAware"))));
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn test_graphs_reasoned_independently() {
        let mut store = QuadStore::new();
        let g = ex("g");
        store.add(&Quad::new(ex("s"), iri(rdf::TYPE), ex("o"), g.clone()));
        store.add(&Quad::triple(ex("o"), iri(rdfs::SUB_CLASS_OF), ex("o2")));

        let stats = Reasoner::new(&mut store).reason(&[type_inheritance()]).unwrap();

        assert_eq!(stats.derived, 0);
        assert_eq!(stats.graphs, 2);
        assert_eq!(store.size(), 2);
    }

    #[test]
    fn test_reason_in_graph() {
        let mut store = QuadStore::new();
        let g = ex("g");
        store.add(&Quad::new(ex("s"), iri(rdf::TYPE), ex("o"), g.clone()));
        store.add(&Quad::new(ex("o"), iri(rdfs::SUB_CLASS_OF), ex("o2"), g.clone()));
        store.add(&Quad::triple(ex("t"), iri(rdf::TYPE), ex("o")));
        store.add(&Quad::triple(ex("o"), iri(rdfs::SUB_CLASS_OF), ex("o2")));

        let stats = Reasoner::new(&mut store)
            .reason_in_graph(&[type_inheritance()], &g)
            .unwrap();

        assert_eq!(stats.graphs, 1);
        assert!(store.has(&Quad::new(ex("s"), iri(rdf::TYPE), ex("o2"), g)));
        assert!(!store.has(&Quad::triple(ex("t"), iri(rdf::TYPE), ex("o2"))));

        let stats = Reasoner::new(&mut store)
            .reason_in_graph(&[type_inheritance()], &ex("missing"))
            .unwrap();
        assert_eq!(stats.graphs, 0);
    }

    #[test]
    fn test_invalid_rule_is_rejected() {
        let mut store = QuadStore::new();
        let rule = Rule::new(
            vec![QuadPattern::new(var("x"), ex("p"), ex("o"))],
            vec![QuadPattern::new(var("x"), ex("p"), var("unbound"))],
        );
        let err = Reasoner::new(&mut store).reason(&[rule]).unwrap_err();
        assert!(matches!(
            err,
            ReasonError::InvalidRule(RuleError::UnboundConclusionVariable { .. })
        ));
    }

    #[test]
    fn test_stats_serialize() {
        let stats = ReasonerStats {
            rules: 2,
            graphs: 1,
            derived: 3,
            propagations: 4,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["derived"], 3);
    }
}
