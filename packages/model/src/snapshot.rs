//! # Snapshots
//!
//! Immutable state of the node tree and selection at one generation.
//!
//! A snapshot owns an `Arc` to its arena. Producing a new generation clones
//! the arena map (cheap `Arc` bumps per record) and replaces only the
//! records that changed; everything else stays pointer-identical.

use crate::{ModelError, ModelResult, Node, NodeKey, NodeKind, NodeType, Selection, Structure};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Flat arena from key to node record
pub type NodeMap = BTreeMap<NodeKey, Arc<Node>>;

#[derive(Debug, Clone)]
pub struct Snapshot {
    generation: u64,
    root: NodeKey,
    nodes: Arc<NodeMap>,
    selection: Option<Selection>,
}

impl Snapshot {
    /// Assemble a snapshot from an arena. A root missing from the arena
    /// surfaces as an error from [`root_node`](Self::root_node).
    pub fn from_parts(
        generation: u64,
        root: NodeKey,
        nodes: Arc<NodeMap>,
        selection: Option<Selection>,
    ) -> Self {
        Self {
            generation,
            root,
            nodes,
            selection,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn arena(&self) -> &Arc<NodeMap> {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(&key).map(|node| node.as_ref())
    }

    pub fn get_shared(&self, key: NodeKey) -> Option<&Arc<Node>> {
        self.nodes.get(&key)
    }

    pub fn root_node(&self) -> ModelResult<&Node> {
        self.get(self.root).ok_or(ModelError::NodeNotFound(self.root))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().map(|node| node.as_ref())
    }

    pub fn nodes_of_type(&self, ty: NodeType) -> impl Iterator<Item = &Node> {
        self.nodes().filter(move |node| node.node_type() == ty)
    }

    pub fn children(&self, key: NodeKey) -> impl Iterator<Item = &Node> {
        self.get(key)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.get(*child))
    }

    pub fn parent(&self, key: NodeKey) -> Option<&Node> {
        self.get(key)?.parent.and_then(|parent| self.get(parent))
    }

    /// Ancestors from the direct parent up to the root
    pub fn ancestors(&self, key: NodeKey) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut current = self.parent(key);
        while let Some(node) = current {
            out.push(node);
            current = node.parent.and_then(|parent| self.get(parent));
        }
        out
    }

    pub fn index_in_parent(&self, key: NodeKey) -> Option<usize> {
        self.parent(key)?
            .children
            .iter()
            .position(|child| *child == key)
    }

    pub fn next_sibling(&self, key: NodeKey) -> Option<&Node> {
        let parent = self.parent(key)?;
        let index = parent.children.iter().position(|child| *child == key)?;
        parent.children.get(index + 1).and_then(|k| self.get(*k))
    }

    pub fn previous_sibling(&self, key: NodeKey) -> Option<&Node> {
        let parent = self.parent(key)?;
        let index = parent.children.iter().position(|child| *child == key)?;
        index
            .checked_sub(1)
            .and_then(|i| parent.children.get(i))
            .and_then(|k| self.get(*k))
    }

    /// Pre-order keys of the subtree rooted at `key`, `key` included
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.get(current) {
                out.push(current);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Nearest ancestor-or-self that is a direct child of the root
    pub fn top_level_block(&self, key: NodeKey) -> Option<&Node> {
        let mut current = self.get(key)?;
        while let Some(parent) = current.parent {
            if parent == self.root {
                return Some(current);
            }
            current = self.get(parent)?;
        }
        None
    }

    /// Plain text of a subtree. Sibling blocks are separated by a blank line.
    pub fn text_content(&self, key: NodeKey) -> String {
        let Some(node) = self.get(key) else {
            return String::new();
        };
        if let Some(text) = node.leaf_text() {
            return text;
        }

        let mut out = String::new();
        let mut previous_block = false;
        for child in self.children(key) {
            let block = !child.node_type().is_inline();
            if block && !out.is_empty() && previous_block {
                out.push_str("\n\n");
            }
            out.push_str(&self.text_content(child.key));
            previous_block = block;
        }
        out
    }

    pub fn structure(&self) -> Structure {
        self.structure_of(self.root)
            .unwrap_or_else(|| Structure {
                kind: NodeKind::Root,
                children: Vec::new(),
            })
    }

    pub fn structure_of(&self, key: NodeKey) -> Option<Structure> {
        let node = self.get(key)?;
        Some(Structure {
            kind: node.kind.clone(),
            children: node
                .children
                .iter()
                .filter_map(|child| self.structure_of(*child))
                .collect(),
        })
    }

    /// Largest key present, for seeding a key generator
    pub fn max_key(&self) -> NodeKey {
        self.nodes.keys().next_back().copied().unwrap_or(self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SnapshotBuilder;

    #[test]
    fn test_missing_root_is_an_error() {
        let root = NodeKey::new(7);
        let snapshot = Snapshot::from_parts(3, root, Arc::new(NodeMap::new()), None);

        assert_eq!(snapshot.root_node().unwrap_err(), ModelError::NodeNotFound(root));
        assert_eq!(snapshot.text_content(root), "");
        assert!(snapshot.structure().children.is_empty());
    }

    #[test]
    fn test_text_content_joins_blocks() {
        let mut builder = SnapshotBuilder::new();
        let root = builder.root();
        let p1 = builder.append(root, NodeKind::Paragraph).unwrap();
        builder.append(p1, NodeKind::text("Hello")).unwrap();
        let p2 = builder.append(root, NodeKind::Paragraph).unwrap();
        builder.append(p2, NodeKind::text("World")).unwrap();
        let snapshot = builder.build();

        assert_eq!(snapshot.text_content(root), "Hello\n\nWorld");
        assert_eq!(snapshot.text_content(p1), "Hello");
    }

    #[test]
    fn test_navigation() {
        let mut builder = SnapshotBuilder::new();
        let root = builder.root();
        let p = builder.append(root, NodeKind::Paragraph).unwrap();
        let a = builder.append(p, NodeKind::text("a")).unwrap();
        let b = builder.append(p, NodeKind::LineBreak).unwrap();
        let snapshot = builder.build();

        assert_eq!(snapshot.next_sibling(a).map(|n| n.key), Some(b));
        assert_eq!(snapshot.previous_sibling(b).map(|n| n.key), Some(a));
        assert_eq!(snapshot.index_in_parent(b), Some(1));
        assert_eq!(snapshot.top_level_block(b).map(|n| n.key), Some(p));
        assert_eq!(snapshot.descendants(root), vec![root, p, a, b]);
        assert_eq!(snapshot.ancestors(a).len(), 2);
    }
}
