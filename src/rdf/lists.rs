//! RDF collection extraction
//!
//! Rebuilds `rdf:first`/`rdf:rest` chains into term vectors. Each chain is
//! walked backwards from a cell whose `rdf:rest` is `rdf:nil`, checking on
//! the way that every cell is a well-formed, unshared list node.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use super::namespace::rdf;
use super::store::{QuadStore, StoreError, StoreResult};
use super::types::{NamedNode, Quad, Term};

/// Structural problems that make a chain unusable as a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListViolation {
    /// Cells of the list live in different graphs
    NotConfinedToSingleGraph,
    /// A cell has arcs other than `rdf:first`/`rdf:rest` after the list
    /// was already anchored through it
    NonListArcsOut,
    /// A cell has more than one `rdf:first`
    MultipleFirst,
    /// A cell has more than one `rdf:rest`
    MultipleRest,
    /// A cell is the subject of a foreign triple and also referenced
    SubjectAndObject,
    /// A cell is referenced by more than one triple
    Coreferences,
    /// A cell has more than one incoming `rdf:rest`
    MultipleIncomingRest,
    /// A cell has no `rdf:first`
    MissingFirst,
}

impl fmt::Display for ListViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ListViolation::NotConfinedToSingleGraph => "not confined to single graph",
            ListViolation::NonListArcsOut => "has non-list arcs out",
            ListViolation::MultipleFirst => "has multiple rdf:first arcs",
            ListViolation::MultipleRest => "has multiple rdf:rest arcs",
            ListViolation::SubjectAndObject => "can't be subject and object",
            ListViolation::Coreferences => "can't have coreferences",
            ListViolation::MultipleIncomingRest => "has incoming rdf:rest arcs",
            ListViolation::MissingFirst => "has no list head",
        })
    }
}

/// A violation recorded while extracting with `ignore_errors`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListError {
    /// Canonical id of the offending cell
    pub node: String,
    /// What was wrong with it
    pub violation: ListViolation,
}

/// Options for [`QuadStore::extract_lists`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractListsOptions {
    /// Delete the consumed `rdf:first`/`rdf:rest` quads
    pub remove: bool,
    /// Skip malformed lists instead of failing
    pub ignore_errors: bool,
}

/// Result of a list extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedLists {
    /// Canonical id of the first cell → list members
    pub lists: IndexMap<String, Vec<Term>>,
    /// Violations skipped because of `ignore_errors`
    pub errors: Vec<ListError>,
}

/// Whether a predicate term is the given vocabulary IRI
fn is_iri(term: &Term, iri: &str) -> bool {
    matches!(term, Term::NamedNode(n) if n.as_str() == iri)
}

impl QuadStore {
    /// Extract every well-formed RDF collection.
    ///
    /// Without `ignore_errors` the first malformed list aborts the call with
    /// [`StoreError::MalformedList`] and nothing is removed. With it, the
    /// malformed list is skipped and recorded, and removal is disabled for
    /// the whole call.
    pub fn extract_lists(&mut self, options: ExtractListsOptions) -> StoreResult<ExtractedLists> {
        let first: Term = NamedNode::new_unchecked(rdf::FIRST).into();
        let rest: Term = NamedNode::new_unchecked(rdf::REST).into();
        let nil: Term = NamedNode::new_unchecked(rdf::NIL).into();

        let mut result = ExtractedLists::default();
        let mut remove = options.remove;
        let tails = self.get_quads(None, Some(&rest), Some(&nil), None);
        let mut to_remove: Vec<Quad> = if remove { tails.clone() } else { Vec::new() };

        for tail in tails {
            let mut on_error = |node: &Term, violation: ListViolation| -> StoreResult<bool> {
                let node = node.to_id();
                if !options.ignore_errors {
                    return Err(StoreError::MalformedList { node, violation });
                }
                warn!("Skipping malformed list at {}: {}", node, violation);
                result.errors.push(ListError { node, violation });
                Ok(true)
            };

            let mut items = Vec::new();
            let mut malformed = false;
            let mut head = false;
            let mut cell = tail.subject.clone();
            let graph = &tail.graph;

            loop {
                let object_quads = self.get_quads(None, None, Some(&cell), None);
                let mut subject_quads = self.get_quads(Some(&cell), None, None, None);
                // list arcs before foreign ones, so a head is only set once both are seen
                subject_quads.sort_by_key(|quad| quad.predicate != first && quad.predicate != rest);
                let mut cell_first: Option<Quad> = None;
                let mut cell_rest = false;
                let mut parent: Option<Term> = None;

                for quad in &subject_quads {
                    if malformed {
                        break;
                    }
                    if &quad.graph != graph {
                        malformed = on_error(&cell, ListViolation::NotConfinedToSingleGraph)?;
                    } else if head {
                        malformed = on_error(&cell, ListViolation::NonListArcsOut)?;
                    } else if quad.predicate == first {
                        if cell_first.is_some() {
                            malformed = on_error(&cell, ListViolation::MultipleFirst)?;
                        } else {
                            to_remove.push(quad.clone());
                            cell_first = Some(quad.clone());
                        }
                    } else if quad.predicate == rest {
                        if cell_rest {
                            malformed = on_error(&cell, ListViolation::MultipleRest)?;
                        } else {
                            to_remove.push(quad.clone());
                            cell_rest = true;
                        }
                    } else if !object_quads.is_empty() {
                        malformed = on_error(&cell, ListViolation::SubjectAndObject)?;
                    } else {
                        head = true;
                    }
                }

                for quad in &object_quads {
                    if malformed {
                        break;
                    }
                    if head {
                        malformed = on_error(&cell, ListViolation::Coreferences)?;
                    } else if is_iri(&quad.predicate, rdf::REST) {
                        if parent.is_some() {
                            malformed = on_error(&cell, ListViolation::MultipleIncomingRest)?;
                        } else {
                            parent = Some(quad.subject.clone());
                        }
                    } else {
                        head = true;
                    }
                }

                match cell_first {
                    Some(quad) if !malformed => items.push(quad.object),
                    Some(_) => {}
                    None if !malformed => malformed = on_error(&cell, ListViolation::MissingFirst)?,
                    None => {}
                }

                match parent {
                    Some(parent) if !malformed => cell = parent,
                    _ => break,
                }
            }

            if malformed {
                remove = false;
            } else {
                items.reverse();
                result.lists.insert(cell.to_id(), items);
            }
        }

        if remove {
            let removed = self.remove_quads(&to_remove);
            debug!("Removed {} list quads", removed);
        }
        debug!("Extracted {} lists", result.lists.len());
        Ok(result)
    }
}
