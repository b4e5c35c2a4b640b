use crate::{
    KeyGenerator, ModelError, ModelResult, Node, NodeKey, NodeKind, NodeMap, Selection, Snapshot,
};
use std::sync::Arc;

/// Builds a snapshot bottom-up outside of an editor session, e.g. for
/// static rendering or test fixtures.
#[derive(Debug)]
pub struct SnapshotBuilder {
    keys: KeyGenerator,
    nodes: NodeMap,
    root: NodeKey,
    selection: Option<Selection>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::with_keys(KeyGenerator::new())
    }

    pub fn with_keys(mut keys: KeyGenerator) -> Self {
        let root = keys.next_key();
        let mut nodes = NodeMap::new();
        nodes.insert(root, Arc::new(Node::new(root, None, NodeKind::Root)));
        Self {
            keys,
            nodes,
            root,
            selection: None,
        }
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Append a new node as the last child of `parent`
    pub fn append(&mut self, parent: NodeKey, kind: NodeKind) -> ModelResult<NodeKey> {
        let parent_node = self
            .nodes
            .get(&parent)
            .ok_or(ModelError::NodeNotFound(parent))?;
        let parent_type = parent_node.node_type();
        if !parent_type.is_element() {
            return Err(ModelError::NotAnElement(parent));
        }
        let child_type = kind.node_type();
        if !parent_type.accepts_child(child_type) {
            return Err(ModelError::InvalidChild {
                parent: parent_type,
                child: child_type,
            });
        }

        let key = self.keys.next_key();
        self.nodes
            .insert(key, Arc::new(Node::new(key, Some(parent), kind)));
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            Arc::make_mut(parent_node).children.push(key);
        }
        Ok(key)
    }

    /// Append a plain text leaf, skipping empty strings
    pub fn text(&mut self, parent: NodeKey, text: &str) -> ModelResult<Option<NodeKey>> {
        if text.is_empty() {
            return Ok(None);
        }
        self.append(parent, NodeKind::text(text)).map(Some)
    }

    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(&key).map(|node| node.as_ref())
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(&key).map(Arc::make_mut)
    }

    /// Detach and drop a subtree
    pub fn remove(&mut self, key: NodeKey) -> ModelResult<()> {
        if key == self.root {
            return Err(ModelError::RootRemoval);
        }
        let parent = self
            .nodes
            .get(&key)
            .ok_or(ModelError::NodeNotFound(key))?
            .parent;
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            Arc::make_mut(parent).children.retain(|child| *child != key);
        }
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children.iter().copied());
            }
        }
        Ok(())
    }

    pub fn select(&mut self, selection: Selection) -> &mut Self {
        self.selection = Some(selection);
        self
    }

    pub fn build(self) -> Snapshot {
        Snapshot::from_parts(0, self.root, Arc::new(self.nodes), self.selection)
    }

    /// Build and hand back the key generator so a session can keep numbering
    pub fn finish(self) -> (Snapshot, KeyGenerator) {
        let keys = self.keys.clone();
        (self.build(), keys)
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}
