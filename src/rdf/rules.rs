//! Rule definitions and compilation
//!
//! A [`Rule`] is a Horn clause over quad patterns: when every premise
//! pattern matches (with variables bound consistently across the rule), each
//! conclusion pattern is asserted. Compilation interns constants, numbers
//! the variables of each rule and links every conclusion pattern to the
//! premise patterns of other rules it could feed.

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

use super::interner::{EntityId, EntityInterner};
use super::namespace::log;
use super::store::QuadStore;
use super::types::{NamedNode, Term};

/// Rule validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// Rule has no premise patterns
    #[error("Rule {rule} has an empty premise")]
    EmptyPremise { rule: usize },

    /// Conclusion uses a variable the premise never binds
    #[error("Rule {rule} concludes with ?{variable}, which its premise never binds")]
    UnboundConclusionVariable { rule: usize, variable: String },

    /// The default graph marker is not a pattern term
    #[error("Rule {rule} uses the default graph as a pattern term")]
    DefaultGraphInPattern { rule: usize },
}

pub type RuleResult<T> = Result<T, RuleError>;

/// Triple pattern whose terms may be variables
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuadPattern {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl QuadPattern {
    /// Create a new pattern
    pub fn new(subject: impl Into<Term>, predicate: impl Into<Term>, object: impl Into<Term>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    fn terms(&self) -> [&Term; 3] {
        [&self.subject, &self.predicate, &self.object]
    }
}

/// Inference rule: `premise ⇒ conclusion`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub premise: Vec<QuadPattern>,
    pub conclusion: Vec<QuadPattern>,
}

impl Rule {
    /// Create a new rule
    pub fn new(premise: Vec<QuadPattern>, conclusion: Vec<QuadPattern>) -> Self {
        Self { premise, conclusion }
    }
}

/// Read N3-style rules from a store.
///
/// Every default-graph quad `(F1, log:implies, F2)` becomes a rule whose
/// premise is the content of graph `F1` and whose conclusion is the content
/// of graph `F2`. Graph contents come back in index order.
pub fn rules_from_store(store: &QuadStore) -> Vec<Rule> {
    let implies: Term = NamedNode::new_unchecked(log::IMPLIES).into();
    let patterns = |graph: &Term| -> Vec<QuadPattern> {
        store
            .match_quads(None, None, None, Some(graph))
            .map(|quad| QuadPattern::new(quad.subject, quad.predicate, quad.object))
            .collect()
    };

    let rules: Vec<Rule> = store
        .match_quads(None, Some(&implies), None, Some(&Term::DefaultGraph))
        .map(|quad| Rule::new(patterns(&quad.subject), patterns(&quad.object)))
        .collect();
    debug!("Read {} rules from store", rules.len());
    rules
}

/// Position of a compiled pattern: an interned constant or a rule-local
/// variable number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Const(EntityId),
    Var(usize),
}

impl Slot {
    /// Current value under a binding environment
    pub(crate) fn value(self, bindings: &[Option<EntityId>]) -> Option<EntityId> {
        match self {
            Slot::Const(id) => Some(id),
            Slot::Var(var) => bindings[var],
        }
    }
}

pub(crate) type Atom = [Slot; 3];

/// A premise atom of some rule that a conclusion atom can satisfy
#[derive(Debug, Clone)]
pub(crate) struct Dependency {
    /// Index of the dependent rule
    pub rule: usize,
    /// The premise atom the new fact is unified with
    pub base: Atom,
    /// The dependent rule's other premise atoms, in order
    pub premise: Vec<Atom>,
}

#[derive(Debug, Clone)]
pub(crate) struct ConclusionAtom {
    pub pattern: Atom,
    pub next: Vec<Dependency>,
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    pub premise: Vec<Atom>,
    pub conclusion: Vec<ConclusionAtom>,
    /// Number of distinct variables
    pub variables: usize,
}

/// Compile rules against an interner and link them to each other
pub(crate) fn compile(rules: &[Rule], entities: &mut EntityInterner) -> RuleResult<Vec<CompiledRule>> {
    let mut compiled = rules
        .iter()
        .enumerate()
        .map(|(index, rule)| compile_rule(index, rule, entities))
        .collect::<RuleResult<Vec<_>>>()?;
    link(&mut compiled);
    Ok(compiled)
}

fn compile_rule(index: usize, rule: &Rule, entities: &mut EntityInterner) -> RuleResult<CompiledRule> {
    if rule.premise.is_empty() {
        return Err(RuleError::EmptyPremise { rule: index });
    }

    let mut variables: FxHashMap<String, usize> = FxHashMap::default();
    let mut premise = Vec::with_capacity(rule.premise.len());
    for pattern in &rule.premise {
        let mut atom = [Slot::Const(0); 3];
        for (slot, term) in atom.iter_mut().zip(pattern.terms()) {
            *slot = match term {
                Term::Variable(var) => {
                    let next = variables.len();
                    Slot::Var(*variables.entry(var.as_str().to_string()).or_insert(next))
                }
                Term::DefaultGraph => return Err(RuleError::DefaultGraphInPattern { rule: index }),
                constant => Slot::Const(entities.intern(constant)),
            };
        }
        premise.push(atom);
    }

    let mut conclusion = Vec::with_capacity(rule.conclusion.len());
    for pattern in &rule.conclusion {
        let mut atom = [Slot::Const(0); 3];
        for (slot, term) in atom.iter_mut().zip(pattern.terms()) {
            *slot = match term {
                Term::Variable(var) => match variables.get(var.as_str()) {
                    Some(&slot) => Slot::Var(slot),
                    None => {
                        return Err(RuleError::UnboundConclusionVariable {
                            rule: index,
                            variable: var.as_str().to_string(),
                        })
                    }
                },
                Term::DefaultGraph => return Err(RuleError::DefaultGraphInPattern { rule: index }),
                constant => Slot::Const(entities.intern(constant)),
            };
        }
        conclusion.push(ConclusionAtom {
            pattern: atom,
            next: Vec::new(),
        });
    }

    Ok(CompiledRule {
        premise,
        conclusion,
        variables: variables.len(),
    })
}

/// Two atoms can unify unless some position holds different constants
fn unifiable(a: &Atom, b: &Atom) -> bool {
    a.iter().zip(b).all(|pair| match pair {
        (Slot::Const(x), Slot::Const(y)) => x == y,
        _ => true,
    })
}

fn link(rules: &mut [CompiledRule]) {
    let premises: Vec<Vec<Atom>> = rules.iter().map(|rule| rule.premise.clone()).collect();
    let mut links = 0;
    for rule in rules.iter_mut() {
        for conclusion in &mut rule.conclusion {
            for (target, premise) in premises.iter().enumerate() {
                for (position, base) in premise.iter().enumerate() {
                    if !unifiable(&conclusion.pattern, base) {
                        continue;
                    }
                    let rest = premise
                        .iter()
                        .enumerate()
                        .filter(|&(other, _)| other != position)
                        .map(|(_, atom)| *atom)
                        .collect();
                    conclusion.next.push(Dependency {
                        rule: target,
                        base: *base,
                        premise: rest,
                    });
                    links += 1;
                }
            }
        }
    }
    debug!("Linked {} rules with {} dependencies", rules.len(), links);
}
