//! # Mutation Tracking
//!
//! Diffs consecutive snapshots and groups the result per node type.
//!
//! ## Semantics
//!
//! ### Created
//! - Key present in the new snapshot, absent in the previous one
//!
//! ### Updated
//! - Key present in both, record changed (payload, children or parent)
//! - Listeners only see these when they opt in
//!
//! ### Destroyed
//! - Key present in the previous snapshot, absent in the new one
//! - Every descendant of a destroyed element gets its own record
//!
//! Untouched records are shared between generations, so a pointer-equal
//! record is skipped without comparing payloads. A changed record always
//! gets a fresh allocation, which is why the shortcut can never hide a
//! real change.

use folio_model::{Node, NodeKey, NodeType, Snapshot};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Created,
    Updated,
    Destroyed,
}

/// Mutations of one node type within one commit
pub type NodeMutations = BTreeMap<NodeKey, MutationKind>;

/// All mutations of one commit, grouped per node type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MutationSet {
    by_type: BTreeMap<NodeType, NodeMutations>,
}

impl MutationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, ty: NodeType, key: NodeKey, kind: MutationKind) {
        self.by_type.entry(ty).or_default().insert(key, kind);
    }

    pub fn get(&self, ty: NodeType) -> Option<&NodeMutations> {
        self.by_type.get(&ty)
    }

    pub fn types(&self) -> impl Iterator<Item = NodeType> + '_ {
        self.by_type.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeType, &NodeMutations)> {
        self.by_type.iter().map(|(ty, m)| (*ty, m))
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.values().all(|m| m.is_empty())
    }

    /// Total number of records across all types
    pub fn len(&self) -> usize {
        self.by_type.values().map(|m| m.len()).sum()
    }

    pub fn keys_of(&self, ty: NodeType, kind: MutationKind) -> Vec<NodeKey> {
        self.get(ty)
            .map(|m| {
                m.iter()
                    .filter(|(_, k)| **k == kind)
                    .map(|(key, _)| *key)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn classify(
    previous: Option<&Arc<Node>>,
    next: Option<&Arc<Node>>,
) -> Option<(NodeType, MutationKind)> {
    match (previous, next) {
        (None, Some(node)) => Some((node.node_type(), MutationKind::Created)),
        (Some(node), None) => Some((node.node_type(), MutationKind::Destroyed)),
        (Some(old), Some(new)) => {
            if Arc::ptr_eq(old, new) || old == new {
                None
            } else {
                Some((new.node_type(), MutationKind::Updated))
            }
        }
        (None, None) => None,
    }
}

/// Diff only the keys a transaction touched
pub fn diff_dirty(previous: &Snapshot, next: &Snapshot, dirty: &BTreeSet<NodeKey>) -> MutationSet {
    let mut set = MutationSet::new();
    for key in dirty {
        if let Some((ty, kind)) = classify(previous.get_shared(*key), next.get_shared(*key)) {
            set.record(ty, *key, kind);
        }
    }
    set
}

/// Full structural diff of two snapshots, independent of dirty tracking
pub fn diff_snapshots(previous: &Snapshot, next: &Snapshot) -> MutationSet {
    let mut set = MutationSet::new();
    if Arc::ptr_eq(previous.arena(), next.arena()) {
        return set;
    }
    let keys: BTreeSet<NodeKey> = previous
        .arena()
        .keys()
        .chain(next.arena().keys())
        .copied()
        .collect();
    for key in keys {
        if let Some((ty, kind)) = classify(previous.get_shared(key), next.get_shared(key)) {
            set.record(ty, key, kind);
        }
    }
    set
}

/// Options for a mutation listener
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Deliver `Updated` records in addition to created/destroyed
    pub updates: bool,
}

impl ListenerOptions {
    pub fn with_updates() -> Self {
        Self { updates: true }
    }

    pub(crate) fn filter(&self, mutations: &NodeMutations) -> NodeMutations {
        if self.updates {
            return mutations.clone();
        }
        mutations
            .iter()
            .filter(|(_, kind)| **kind != MutationKind::Updated)
            .map(|(key, kind)| (*key, *kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_model::{NodeKind, SnapshotBuilder};

    #[test]
    fn test_identical_snapshots_have_no_mutations() {
        let mut builder = SnapshotBuilder::new();
        let root = builder.root();
        builder.append(root, NodeKind::Paragraph).unwrap();
        let snapshot = builder.build();

        assert!(diff_snapshots(&snapshot, &snapshot.clone()).is_empty());
    }

    #[test]
    fn test_full_diff_reports_descendants() {
        let mut builder = SnapshotBuilder::new();
        let root = builder.root();
        let p = builder.append(root, NodeKind::Paragraph).unwrap();
        let t = builder.append(p, NodeKind::text("bye")).unwrap();
        let before = builder.build();

        let mut builder = SnapshotBuilder::new();
        builder.root();
        let after = builder.build();

        let set = diff_snapshots(&before, &after);
        assert_eq!(set.keys_of(NodeType::Paragraph, MutationKind::Destroyed), vec![p]);
        assert_eq!(set.keys_of(NodeType::Text, MutationKind::Destroyed), vec![t]);
        assert_eq!(set.keys_of(NodeType::Root, MutationKind::Updated), vec![root]);
    }

    #[test]
    fn test_filter_drops_updates_by_default() {
        let mut mutations = NodeMutations::new();
        mutations.insert(NodeKey::new(1), MutationKind::Updated);
        mutations.insert(NodeKey::new(2), MutationKind::Created);

        let filtered = ListenerOptions::default().filter(&mutations);
        assert_eq!(filtered.len(), 1);
        assert_eq!(ListenerOptions::with_updates().filter(&mutations).len(), 2);
    }
}
