//! Per-graph triple index
//!
//! Every graph keeps the same set of triples in three nested orderings:
//!
//! - subjects:   s → p → {o}
//! - predicates: p → o → {s}
//! - objects:    o → s → {p}
//!
//! A triple is in the graph iff it is present in all three; every mutation
//! goes through [`GraphIndex::insert`] / [`GraphIndex::remove`], which
//! update them together.

use rustc_hash::{FxHashMap, FxHashSet};

use super::interner::EntityId;

type Leaf = FxHashSet<EntityId>;
type Branch = FxHashMap<EntityId, Leaf>;
type Tree = FxHashMap<EntityId, Branch>;

/// Which nested ordering a lookup descends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrder {
    /// s → p → o
    Subjects,
    /// p → o → s
    Predicates,
    /// o → s → p
    Objects,
}

impl IndexOrder {
    /// Pick the ordering for a lookup given which positions are bound.
    ///
    /// | bound            | ordering   |
    /// |------------------|------------|
    /// | s and o (± p)    | objects    |
    /// | s (± p)          | subjects   |
    /// | p (± o)          | predicates |
    /// | none, or o only  | objects    |
    pub fn select(subject: bool, predicate: bool, object: bool) -> Self {
        if subject {
            if object {
                IndexOrder::Objects
            } else {
                IndexOrder::Subjects
            }
        } else if predicate {
            IndexOrder::Predicates
        } else {
            IndexOrder::Objects
        }
    }

    /// Reorder an (s, p, o) triple into this ordering's key order
    fn keys<T>(self, [s, p, o]: [T; 3]) -> [T; 3] {
        match self {
            IndexOrder::Subjects => [s, p, o],
            IndexOrder::Predicates => [p, o, s],
            IndexOrder::Objects => [o, s, p],
        }
    }

    /// Inverse of [`IndexOrder::keys`]
    fn triple(self, [k0, k1, k2]: [EntityId; 3]) -> [EntityId; 3] {
        match self {
            IndexOrder::Subjects => [k0, k1, k2],
            IndexOrder::Predicates => [k2, k0, k1],
            IndexOrder::Objects => [k1, k2, k0],
        }
    }
}

/// Triple index of a single graph
#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    subjects: Tree,
    predicates: Tree,
    objects: Tree,
}

impl GraphIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    fn tree(&self, order: IndexOrder) -> &Tree {
        match order {
            IndexOrder::Subjects => &self.subjects,
            IndexOrder::Predicates => &self.predicates,
            IndexOrder::Objects => &self.objects,
        }
    }

    /// Insert a triple. Returns `true` if it was not present before.
    pub fn insert(&mut self, s: EntityId, p: EntityId, o: EntityId) -> bool {
        if !insert_into(&mut self.subjects, s, p, o) {
            return false;
        }
        insert_into(&mut self.predicates, p, o, s);
        insert_into(&mut self.objects, o, s, p);
        true
    }

    /// Remove a triple. Returns `true` if it was present.
    ///
    /// With `prune`, intermediate levels left empty are dropped as well;
    /// otherwise they stay allocated (lookups treat them as absent).
    pub fn remove(&mut self, s: EntityId, p: EntityId, o: EntityId, prune: bool) -> bool {
        if !remove_from(&mut self.subjects, s, p, o, prune) {
            return false;
        }
        remove_from(&mut self.predicates, p, o, s, prune);
        remove_from(&mut self.objects, o, s, p, prune);
        true
    }

    /// Whether the triple is present
    pub fn contains(&self, s: EntityId, p: EntityId, o: EntityId) -> bool {
        self.subjects
            .get(&s)
            .and_then(|branch| branch.get(&p))
            .is_some_and(|leaf| leaf.contains(&o))
    }

    /// Iterate the (s, p, o) triples matching a pattern (`None` = wildcard).
    pub fn triples(
        &self,
        s: Option<EntityId>,
        p: Option<EntityId>,
        o: Option<EntityId>,
    ) -> impl Iterator<Item = [EntityId; 3]> + '_ {
        let order = IndexOrder::select(s.is_some(), p.is_some(), o.is_some());
        let [k0, k1, k2] = order.keys([s, p, o]);
        entries(self.tree(order), k0).flat_map(move |(a, branch)| {
            entries(branch, k1).flat_map(move |(b, leaf)| {
                members(leaf, k2).map(move |c| order.triple([a, b, c]))
            })
        })
    }

    /// Count the triples matching a pattern without materializing them
    pub fn count(&self, s: Option<EntityId>, p: Option<EntityId>, o: Option<EntityId>) -> usize {
        let order = IndexOrder::select(s.is_some(), p.is_some(), o.is_some());
        let [k0, k1, k2] = order.keys([s, p, o]);
        entries(self.tree(order), k0)
            .map(|(_, branch)| {
                entries(branch, k1)
                    .map(|(_, leaf)| match k2 {
                        Some(key) => usize::from(leaf.contains(&key)),
                        None => leaf.len(),
                    })
                    .sum::<usize>()
            })
            .sum()
    }

    /// Number of triples in this graph
    pub fn len(&self) -> usize {
        self.subjects
            .values()
            .flat_map(|branch| branch.values())
            .map(|leaf| leaf.len())
            .sum()
    }

    /// Whether the graph holds no triples
    pub fn is_empty(&self) -> bool {
        self.subjects
            .values()
            .all(|branch| branch.values().all(|leaf| leaf.is_empty()))
    }

    /// Distinct subjects of triples with the given predicate/object
    pub fn subjects(
        &self,
        p: Option<EntityId>,
        o: Option<EntityId>,
    ) -> Box<dyn Iterator<Item = EntityId> + '_> {
        match (p, o) {
            (Some(p), Some(o)) => leaf_members(&self.predicates, p, o),
            (Some(p), None) => keys_through(&self.subjects, p),
            (None, Some(o)) => branch_keys(&self.objects, o),
            (None, None) => tree_keys(&self.subjects),
        }
    }

    /// Distinct predicates of triples with the given subject/object
    pub fn predicates(
        &self,
        s: Option<EntityId>,
        o: Option<EntityId>,
    ) -> Box<dyn Iterator<Item = EntityId> + '_> {
        match (s, o) {
            (Some(s), Some(o)) => leaf_members(&self.objects, o, s),
            (Some(s), None) => branch_keys(&self.subjects, s),
            (None, Some(o)) => keys_through(&self.predicates, o),
            (None, None) => tree_keys(&self.predicates),
        }
    }

    /// Distinct objects of triples with the given subject/predicate
    pub fn objects(
        &self,
        s: Option<EntityId>,
        p: Option<EntityId>,
    ) -> Box<dyn Iterator<Item = EntityId> + '_> {
        match (s, p) {
            (Some(s), Some(p)) => leaf_members(&self.subjects, s, p),
            (Some(s), None) => keys_through(&self.objects, s),
            (None, Some(p)) => branch_keys(&self.predicates, p),
            (None, None) => tree_keys(&self.objects),
        }
    }
}

fn insert_into(tree: &mut Tree, k0: EntityId, k1: EntityId, k2: EntityId) -> bool {
    tree.entry(k0).or_default().entry(k1).or_default().insert(k2)
}

fn remove_from(tree: &mut Tree, k0: EntityId, k1: EntityId, k2: EntityId, prune: bool) -> bool {
    let Some(branch) = tree.get_mut(&k0) else {
        return false;
    };
    let Some(leaf) = branch.get_mut(&k1) else {
        return false;
    };
    if !leaf.remove(&k2) {
        return false;
    }
    if prune && leaf.is_empty() {
        branch.remove(&k1);
        if branch.is_empty() {
            tree.remove(&k0);
        }
    }
    true
}

/// Entries of one level: a single key when bound, every key otherwise
fn entries<V>(
    map: &FxHashMap<EntityId, V>,
    key: Option<EntityId>,
) -> Box<dyn Iterator<Item = (EntityId, &V)> + '_> {
    match key {
        Some(key) => Box::new(map.get_key_value(&key).map(|(k, v)| (*k, v)).into_iter()),
        None => Box::new(map.iter().map(|(k, v)| (*k, v))),
    }
}

fn members(leaf: &Leaf, key: Option<EntityId>) -> Box<dyn Iterator<Item = EntityId> + '_> {
    match key {
        Some(key) => Box::new(leaf.get(&key).copied().into_iter()),
        None => Box::new(leaf.iter().copied()),
    }
}

/// Members of `tree[k0][k1]`
fn leaf_members(tree: &Tree, k0: EntityId, k1: EntityId) -> Box<dyn Iterator<Item = EntityId> + '_> {
    Box::new(
        tree.get(&k0)
            .and_then(|branch| branch.get(&k1))
            .into_iter()
            .flat_map(|leaf| leaf.iter().copied()),
    )
}

/// Second-level keys under `tree[k0]` that still hold triples
fn branch_keys(tree: &Tree, k0: EntityId) -> Box<dyn Iterator<Item = EntityId> + '_> {
    Box::new(tree.get(&k0).into_iter().flat_map(|branch| {
        branch
            .iter()
            .filter(|(_, leaf)| !leaf.is_empty())
            .map(|(key, _)| *key)
    }))
}

/// First-level keys `k0` for which `tree[k0][k1]` holds triples
fn keys_through(tree: &Tree, k1: EntityId) -> Box<dyn Iterator<Item = EntityId> + '_> {
    Box::new(
        tree.iter()
            .filter(move |(_, branch)| branch.get(&k1).is_some_and(|leaf| !leaf.is_empty()))
            .map(|(key, _)| *key),
    )
}

/// First-level keys that still hold triples
fn tree_keys(tree: &Tree) -> Box<dyn Iterator<Item = EntityId> + '_> {
    Box::new(
        tree.iter()
            .filter(|(_, branch)| branch.values().any(|leaf| !leaf.is_empty()))
            .map(|(key, _)| *key),
    )
}
