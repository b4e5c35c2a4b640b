//! # Transactions
//!
//! All tree mutations go through a [`Transaction`], handed out by
//! [`Editor::update`](crate::Editor::update). A transaction edits a private
//! draft of the arena; nothing is visible to readers or listeners until the
//! outermost update commits.
//!
//! Every write marks the touched keys dirty. The commit diffs exactly those
//! keys, so a write that bypassed the draft would be a missed mutation.
//! There is no such path: the draft is only reachable through this module.

use crate::{Editor, EditorError, EditorResult, UpdateTag};
use folio_model::{
    KeyGenerator, ModelError, ModelResult, Node, NodeKey, NodeKind, NodeMap, NodeType, Point,
    Selection, Snapshot,
};
use std::cell::RefMut;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub(crate) struct Draft {
    pub(crate) generation: u64,
    pub(crate) root: NodeKey,
    pub(crate) nodes: Arc<NodeMap>,
    pub(crate) selection: Option<Selection>,
    pub(crate) selection_dirty: bool,
    pub(crate) dirty: BTreeSet<NodeKey>,
    pub(crate) tags: BTreeSet<UpdateTag>,
}

impl Draft {
    pub(crate) fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            generation: snapshot.generation(),
            root: snapshot.root(),
            nodes: Arc::clone(snapshot.arena()),
            selection: snapshot.selection().copied(),
            selection_dirty: false,
            dirty: BTreeSet::new(),
            tags: BTreeSet::new(),
        }
    }

    pub(crate) fn is_clean(&self) -> bool {
        self.dirty.is_empty() && !self.selection_dirty
    }

    pub(crate) fn view(&self) -> Snapshot {
        Snapshot::from_parts(
            self.generation,
            self.root,
            Arc::clone(&self.nodes),
            self.selection,
        )
    }

    fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(&key).map(|node| node.as_ref())
    }

    fn require(&self, key: NodeKey) -> ModelResult<&Node> {
        self.get(key).ok_or(ModelError::NodeNotFound(key))
    }

    fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        if !self.nodes.contains_key(&key) {
            return None;
        }
        self.dirty.insert(key);
        Arc::make_mut(&mut self.nodes)
            .get_mut(&key)
            .map(Arc::make_mut)
    }

    fn set_selection(&mut self, selection: Option<Selection>) {
        if self.selection != selection {
            self.selection = selection;
            self.selection_dirty = true;
        }
    }

    fn map_selection(&mut self, f: impl Fn(Point) -> Point) {
        if let Some(sel) = self.selection {
            self.set_selection(Some(Selection::range(f(sel.anchor), f(sel.focus))));
        }
    }

    fn child_at(&self, parent: NodeKey, index: usize) -> Option<&Node> {
        self.get(parent)?
            .children
            .get(index)
            .and_then(|key| self.get(*key))
    }

    fn position(&self, key: NodeKey) -> ModelResult<(NodeKey, usize)> {
        let node = self.require(key)?;
        let parent = node.parent.ok_or(ModelError::RootRemoval)?;
        let index = self
            .require(parent)?
            .children
            .iter()
            .position(|child| *child == key)
            .ok_or(ModelError::NodeNotFound(key))?;
        Ok((parent, index))
    }

    fn insert_child(
        &mut self,
        key: NodeKey,
        parent: NodeKey,
        index: usize,
        kind: NodeKind,
    ) -> ModelResult<()> {
        let parent_node = self.require(parent)?;
        if !parent_node.is_element() {
            return Err(ModelError::NotAnElement(parent));
        }
        let parent_type = parent_node.node_type();
        let child_type = kind.node_type();
        if !parent_type.accepts_child(child_type) {
            return Err(ModelError::InvalidChild {
                parent: parent_type,
                child: child_type,
            });
        }

        self.dirty.insert(key);
        Arc::make_mut(&mut self.nodes).insert(key, Arc::new(Node::new(key, Some(parent), kind)));
        if let Some(parent_node) = self.node_mut(parent) {
            let index = index.min(parent_node.children.len());
            parent_node.children.insert(index, key);
        }
        Ok(())
    }

    fn detach(&mut self, key: NodeKey) -> ModelResult<(NodeKey, usize)> {
        let (parent, index) = self.position(key)?;
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.remove(index);
        }
        Ok((parent, index))
    }

    fn drop_subtree(&mut self, key: NodeKey) -> BTreeSet<NodeKey> {
        let mut removed = BTreeSet::new();
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = Arc::make_mut(&mut self.nodes).remove(&current) {
                self.dirty.insert(current);
                stack.extend(node.children.iter().copied());
                removed.insert(current);
            }
        }
        removed
    }

    fn remove(&mut self, key: NodeKey) -> ModelResult<()> {
        if key == self.root {
            return Err(ModelError::RootRemoval);
        }
        let (parent, index) = self.detach(key)?;
        let removed = self.drop_subtree(key);
        trace!(key = %key, descendants = removed.len(), "Removed subtree");

        self.map_selection(|point| {
            if removed.contains(&point.key) {
                Point::new(parent, index)
            } else if point.key == parent && point.offset > index {
                Point::new(parent, point.offset - 1)
            } else {
                point
            }
        });

        if index > 0 {
            let prev = self.child_at(parent, index - 1).map(|n| n.key);
            let next = self.child_at(parent, index).map(|n| n.key);
            if let (Some(prev), Some(next)) = (prev, next) {
                self.merge_texts(prev, next);
            }
        }
        Ok(())
    }

    fn text_parts(&self, key: NodeKey) -> Option<(String, folio_model::TextFormat)> {
        match &self.get(key)?.kind {
            NodeKind::Text { text, format } => Some((text.clone(), *format)),
            _ => None,
        }
    }

    fn set_text(&mut self, key: NodeKey, value: String) -> ModelResult<()> {
        let node = self.node_mut(key).ok_or(ModelError::NodeNotFound(key))?;
        match &mut node.kind {
            NodeKind::Text { text, .. } => {
                *text = value;
                Ok(())
            }
            _ => Err(ModelError::NotText(key)),
        }
    }

    /// Merge `right` into `left` when both are adjacent text of equal format
    fn merge_texts(&mut self, left: NodeKey, right: NodeKey) -> bool {
        let (Some((left_text, left_format)), Some((right_text, right_format))) =
            (self.text_parts(left), self.text_parts(right))
        else {
            return false;
        };
        if left_format != right_format {
            return false;
        }
        let Ok((parent, right_index)) = self.position(right) else {
            return false;
        };
        if right_index == 0 || self.child_at(parent, right_index - 1).map(|n| n.key) != Some(left)
        {
            return false;
        }

        let left_len = left_text.chars().count();
        if self.set_text(left, left_text + &right_text).is_err() {
            return false;
        }
        if self.detach(right).is_err() {
            return false;
        }
        self.drop_subtree(right);
        self.map_selection(|point| {
            if point.key == right {
                Point::new(left, left_len + point.offset)
            } else if point.key == parent && point.offset > right_index {
                Point::new(parent, point.offset - 1)
            } else {
                point
            }
        });
        true
    }

    fn merge_around(&mut self, key: NodeKey) -> NodeKey {
        let mut current = key;
        if let Ok((parent, index)) = self.position(current) {
            if index > 0 {
                if let Some(prev) = self.child_at(parent, index - 1).map(|n| n.key) {
                    if self.merge_texts(prev, current) {
                        current = prev;
                    }
                }
            }
        }
        if let Ok((parent, index)) = self.position(current) {
            if let Some(next) = self.child_at(parent, index + 1).map(|n| n.key) {
                self.merge_texts(current, next);
            }
        }
        current
    }

    fn split_text(
        &mut self,
        key: NodeKey,
        offset: usize,
        keys: &mut KeyGenerator,
    ) -> ModelResult<Option<NodeKey>> {
        let (text, format) = self.text_parts(key).ok_or(ModelError::NotText(key))?;
        let len = text.chars().count();
        if offset > len {
            return Err(ModelError::OffsetOutOfBounds { key, offset });
        }
        if offset == 0 || offset == len {
            return Ok(None);
        }

        let byte = char_to_byte(&text, offset);
        let (left, right) = text.split_at(byte);
        let right = right.to_string();
        self.set_text(key, left.to_string())?;

        let (parent, index) = self.position(key)?;
        let right_key = keys.next_key();
        self.insert_child(
            right_key,
            parent,
            index + 1,
            NodeKind::Text {
                text: right,
                format,
            },
        )?;
        self.map_selection(|point| {
            if point.key == key && point.offset > offset {
                Point::new(right_key, point.offset - offset)
            } else {
                point
            }
        });
        Ok(Some(right_key))
    }

    /// Element position a caret maps to, splitting a text leaf if needed
    fn boundary_at(
        &mut self,
        point: Point,
        keys: &mut KeyGenerator,
    ) -> ModelResult<(NodeKey, usize)> {
        let node = self.require(point.key)?;
        if node.is_element() {
            return Ok((point.key, point.offset.min(node.children.len())));
        }
        let len = node.leaf_len();
        let is_text = node.node_type() == NodeType::Text;
        let (parent, index) = self.position(point.key)?;

        if point.offset == 0 {
            Ok((parent, index))
        } else if point.offset >= len {
            Ok((parent, index + 1))
        } else if is_text {
            self.split_text(point.key, point.offset, keys)?;
            Ok((parent, index + 1))
        } else {
            Ok((parent, index + 1))
        }
    }

    /// Element position a caret maps to, without modifying the tree
    fn boundary_of(&self, point: Point) -> ModelResult<(NodeKey, usize)> {
        let node = self.require(point.key)?;
        if node.is_element() {
            return Ok((point.key, point.offset.min(node.children.len())));
        }
        let (parent, index) = self.position(point.key)?;
        if point.offset == 0 {
            Ok((parent, index))
        } else {
            Ok((parent, index + 1))
        }
    }

    /// Prefer a text point over an element point next to text
    fn normalize_point(&self, point: Point) -> Point {
        let Some(node) = self.get(point.key) else {
            return point;
        };
        if !node.is_element() {
            return point;
        }
        if point.offset > 0 {
            if let Some(prev) = self.child_at(point.key, point.offset - 1) {
                if prev.node_type() == NodeType::Text {
                    return Point::new(prev.key, prev.leaf_len());
                }
            }
        }
        if let Some(next) = self.child_at(point.key, point.offset) {
            if next.node_type() == NodeType::Text {
                return Point::new(next.key, 0);
            }
        }
        point
    }

    fn normalize_selection(&mut self) {
        if let Some(sel) = self.selection {
            let normalized = Selection::range(
                self.normalize_point(sel.anchor),
                self.normalize_point(sel.focus),
            );
            self.set_selection(Some(normalized));
        }
    }

    fn move_children(&mut self, from: NodeKey, to: NodeKey, start: usize) -> ModelResult<usize> {
        let moved: Vec<NodeKey> = self
            .require(from)?
            .children
            .iter()
            .skip(start)
            .copied()
            .collect();
        let to_type = self.require(to)?.node_type();
        for child in &moved {
            let child_type = self.require(*child)?.node_type();
            if !to_type.accepts_child(child_type) {
                return Err(ModelError::InvalidChild {
                    parent: to_type,
                    child: child_type,
                });
            }
        }
        let base = self.require(to)?.children.len();
        if let Some(from_node) = self.node_mut(from) {
            from_node.children.truncate(start);
        }
        for child in &moved {
            if let Some(node) = self.node_mut(*child) {
                node.parent = Some(to);
            }
        }
        if let Some(to_node) = self.node_mut(to) {
            to_node.children.extend(moved.iter().copied());
        }
        self.map_selection(|point| {
            if point.key == from && point.offset > start {
                Point::new(to, base + point.offset - start)
            } else {
                point
            }
        });
        Ok(moved.len())
    }
}

fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map_or(text.len(), |(byte, _)| byte)
}

/// Editing handle for the pending draft of an [`Editor`]
pub struct Transaction<'a> {
    editor: &'a Editor,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(editor: &'a Editor) -> Self {
        Self { editor }
    }

    fn draft(&self) -> RefMut<'a, Draft> {
        self.editor.inner.draft.borrow_mut()
    }

    fn keys(&self) -> RefMut<'a, KeyGenerator> {
        self.editor.inner.keys.borrow_mut()
    }

    pub fn editor(&self) -> &'a Editor {
        self.editor
    }

    /// Pending state as a snapshot, for rich read queries
    pub fn view(&self) -> Snapshot {
        self.editor.inner.draft.borrow().view()
    }

    pub fn node(&self, key: NodeKey) -> Option<Arc<Node>> {
        self.editor.inner.draft.borrow().nodes.get(&key).cloned()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.editor.inner.draft.borrow().nodes.contains_key(&key)
    }

    pub fn root(&self) -> NodeKey {
        self.editor.inner.draft.borrow().root
    }

    pub fn selection(&self) -> Option<Selection> {
        self.editor.inner.draft.borrow().selection
    }

    /// Collapsed selection point, if any
    pub fn caret(&self) -> Option<Point> {
        self.selection()
            .filter(|sel| sel.is_collapsed())
            .map(|sel| sel.focus)
    }

    pub fn text_content(&self, key: NodeKey) -> String {
        self.view().text_content(key)
    }

    pub fn add_tag(&mut self, tag: UpdateTag) {
        self.draft().tags.insert(tag);
    }

    pub fn has_tag(&self, tag: UpdateTag) -> bool {
        self.editor.inner.draft.borrow().tags.contains(&tag)
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.draft().set_selection(selection);
    }

    pub fn set_caret(&mut self, key: NodeKey, offset: usize) {
        self.set_selection(Some(Selection::caret(key, offset)));
    }

    /// Force a record into the next mutation round without changing it
    pub fn mark_dirty(&mut self, key: NodeKey) {
        self.draft().node_mut(key);
    }

    pub fn insert_child(
        &mut self,
        parent: NodeKey,
        index: usize,
        kind: NodeKind,
    ) -> EditorResult<NodeKey> {
        let key = self.keys().next_key();
        self.draft().insert_child(key, parent, index, kind)?;
        Ok(key)
    }

    pub fn append(&mut self, parent: NodeKey, kind: NodeKind) -> EditorResult<NodeKey> {
        let len = self
            .node(parent)
            .ok_or(ModelError::NodeNotFound(parent))?
            .children
            .len();
        self.insert_child(parent, len, kind)
    }

    pub fn insert_after(&mut self, sibling: NodeKey, kind: NodeKind) -> EditorResult<NodeKey> {
        let (parent, index) = self.editor.inner.draft.borrow().position(sibling)?;
        self.insert_child(parent, index + 1, kind)
    }

    pub fn insert_before(&mut self, sibling: NodeKey, kind: NodeKind) -> EditorResult<NodeKey> {
        let (parent, index) = self.editor.inner.draft.borrow().position(sibling)?;
        self.insert_child(parent, index, kind)
    }

    /// Remove a node and all of its descendants. Adjacent text merges back
    /// together and a selection inside the subtree moves to where it was.
    pub fn remove(&mut self, key: NodeKey) -> EditorResult<()> {
        {
            let mut draft = self.draft();
            draft.remove(key)?;
            draft.normalize_selection();
        }
        self.ensure_root_block()
    }

    /// Replace a node's payload, keeping its key. The node type must not change.
    pub fn set_kind(&mut self, key: NodeKey, kind: NodeKind) -> EditorResult<()> {
        let mut draft = self.draft();
        let from = draft.require(key)?.node_type();
        let to = kind.node_type();
        if from != to {
            return Err(ModelError::TypeChange { key, from, to }.into());
        }
        if let Some(node) = draft.node_mut(key) {
            node.kind = kind;
        }
        Ok(())
    }

    pub fn set_text(&mut self, key: NodeKey, text: impl Into<String>) -> EditorResult<()> {
        self.draft().set_text(key, text.into())?;
        Ok(())
    }

    /// Swap a node for a new one of any type at the same position. Children
    /// move over when the new node is an element that accepts them.
    pub fn replace(&mut self, key: NodeKey, kind: NodeKind) -> EditorResult<NodeKey> {
        let (parent, index) = self.editor.inner.draft.borrow().position(key)?;
        let new_key = self.insert_child(parent, index, kind)?;
        {
            let mut draft = self.draft();
            let new_is_element = draft.require(new_key)?.is_element();
            if new_is_element {
                draft.move_children(key, new_key, 0)?;
            }
            let new_len = draft.require(new_key)?.leaf_len();
            draft.map_selection(|point| {
                if point.key == key {
                    Point::new(new_key, point.offset.min(new_len))
                } else {
                    point
                }
            });
            draft.remove(key)?;
        }
        Ok(new_key)
    }

    /// Split a text leaf at a character offset. Returns the new right-hand
    /// node, or `None` when the offset is at either end.
    pub fn split_text(&mut self, key: NodeKey, offset: usize) -> EditorResult<Option<NodeKey>> {
        let mut keys = self.keys();
        Ok(self.draft().split_text(key, offset, &mut keys)?)
    }

    /// Merge a text leaf with equal-format text neighbours. Returns the key
    /// that now holds the merged text.
    pub fn merge_adjacent_text(&mut self, key: NodeKey) -> NodeKey {
        self.draft().merge_around(key)
    }

    /// Move children of `from` starting at `start` to the end of `to`
    pub fn move_children(
        &mut self,
        from: NodeKey,
        to: NodeKey,
        start: usize,
    ) -> EditorResult<usize> {
        Ok(self.draft().move_children(from, to, start)?)
    }

    /// Replace the whole pending state with another snapshot's tree and selection
    pub fn restore(&mut self, snapshot: &Snapshot) {
        let mut draft = self.draft();
        let changed: Vec<NodeKey> = draft
            .nodes
            .keys()
            .chain(snapshot.arena().keys())
            .copied()
            .filter(|key| match (draft.nodes.get(key), snapshot.get_shared(*key)) {
                (Some(a), Some(b)) => !Arc::ptr_eq(a, b),
                _ => true,
            })
            .collect();
        draft.dirty.extend(changed);
        draft.nodes = Arc::clone(snapshot.arena());
        draft.root = snapshot.root();
        draft.selection = snapshot.selection().copied();
        draft.selection_dirty = true;
        let max = snapshot.max_key();
        drop(draft);

        let mut keys = self.keys();
        if keys.issued() < max.raw() {
            *keys = KeyGenerator::after(max);
        }
    }

    fn ensure_root_block(&mut self) -> EditorResult<()> {
        let root = self.root();
        let empty = self
            .node(root)
            .map_or(false, |node| node.children.is_empty());
        if empty {
            let paragraph = self.append(root, NodeKind::Paragraph)?;
            self.set_caret(paragraph, 0);
        }
        Ok(())
    }

    /// Caret after collapsing a range selection. Ranges inside one text
    /// leaf are deleted first; other ranges collapse to their focus.
    fn collapse_selection(&mut self) -> EditorResult<Point> {
        let selection = self.selection().ok_or(EditorError::NoSelection)?;
        if selection.is_collapsed() {
            return Ok(selection.focus);
        }
        let (anchor, focus) = (selection.anchor, selection.focus);
        if anchor.key == focus.key {
            if let Some(text) = self.node(anchor.key).and_then(|n| n.as_text().map(str::to_string)) {
                let (start, end) = (anchor.offset.min(focus.offset), anchor.offset.max(focus.offset));
                let mut chars: Vec<char> = text.chars().collect();
                let end = end.min(chars.len());
                chars.drain(start.min(end)..end);
                self.set_text(anchor.key, chars.into_iter().collect::<String>())?;
                self.set_caret(anchor.key, start);
                return Ok(Point::new(anchor.key, start));
            }
        }
        debug!("Collapsing multi-node selection to its focus");
        self.set_selection(Some(Selection::caret(focus.key, focus.offset)));
        Ok(focus)
    }

    fn require_caret_node(&self, point: Point) -> EditorResult<Arc<Node>> {
        self.node(point.key)
            .ok_or(EditorError::StaleSelection(point.key))
    }

    /// Insert text at the selection
    pub fn insert_text(&mut self, text: &str) -> EditorResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        let point = self.collapse_selection()?;
        let node = self.require_caret_node(point)?;
        let added = text.chars().count();

        match &node.kind {
            NodeKind::Text { text: existing, .. } => {
                let mut chars: Vec<char> = existing.chars().collect();
                let offset = point.offset.min(chars.len());
                chars.splice(offset..offset, text.chars());
                self.set_text(point.key, chars.into_iter().collect::<String>())?;
                self.set_caret(point.key, offset + added);
                Ok(())
            }
            _ => {
                let (parent, index) = self.editor.inner.draft.borrow().boundary_of(point)?;
                let prev = index
                    .checked_sub(1)
                    .and_then(|i| self.editor.inner.draft.borrow().child_at(parent, i).cloned());
                if let Some(prev) = prev.filter(|n| n.node_type() == NodeType::Text) {
                    let len = prev.leaf_len();
                    self.set_caret(prev.key, len);
                    return self.insert_text(text);
                }
                let next = self.editor.inner.draft.borrow().child_at(parent, index).cloned();
                if let Some(next) = next.filter(|n| n.node_type() == NodeType::Text) {
                    self.set_caret(next.key, 0);
                    return self.insert_text(text);
                }
                let key = self.insert_child(parent, index, NodeKind::text(text))?;
                self.set_caret(key, added);
                Ok(())
            }
        }
    }

    /// Insert an inline leaf at the selection and place the caret right after it
    pub fn insert_inline(&mut self, kind: NodeKind) -> EditorResult<NodeKey> {
        let point = self.collapse_selection()?;
        self.require_caret_node(point)?;
        let (parent, index) = {
            let mut keys = self.keys();
            self.draft().boundary_at(point, &mut keys)?
        };
        let key = self.insert_child(parent, index, kind)?;
        self.set_selection(Some(Selection::caret(parent, index + 1)));
        self.draft().normalize_selection();
        Ok(key)
    }

    /// Delete one character (or atomic leaf) next to the caret. Returns
    /// whether anything changed.
    pub fn delete_character(&mut self, backward: bool) -> EditorResult<bool> {
        let selection = self.selection().ok_or(EditorError::NoSelection)?;
        if !selection.is_collapsed() {
            self.collapse_selection()?;
            return Ok(true);
        }
        let point = selection.focus;
        let node = self.require_caret_node(point)?;

        if let Some(text) = node.as_text() {
            let len = text.chars().count();
            let target = if backward {
                point.offset.checked_sub(1).filter(|_| point.offset <= len)
            } else {
                Some(point.offset).filter(|o| *o < len)
            };
            if let Some(at) = target {
                let mut chars: Vec<char> = text.chars().collect();
                chars.remove(at);
                if chars.is_empty() {
                    self.remove(point.key)?;
                } else {
                    self.set_text(point.key, chars.into_iter().collect::<String>())?;
                    self.set_caret(point.key, at);
                }
                return Ok(true);
            }
        }

        let (parent, index) = self.editor.inner.draft.borrow().boundary_of(point)?;
        let neighbour = if backward {
            index.checked_sub(1)
        } else {
            Some(index)
        }
        .and_then(|i| self.editor.inner.draft.borrow().child_at(parent, i).cloned());

        match neighbour {
            Some(next) if next.node_type() == NodeType::Text => {
                let offset = if backward { next.leaf_len() } else { 0 };
                self.set_caret(next.key, offset);
                self.delete_character(backward)
            }
            Some(next) if next.is_element() => {
                let offset = if backward { next.children.len() } else { 0 };
                if next.children.is_empty() {
                    self.remove(next.key)?;
                    return Ok(true);
                }
                self.set_caret(next.key, offset);
                self.delete_character(backward)
            }
            Some(next) => {
                self.remove(next.key)?;
                Ok(true)
            }
            None => self.merge_blocks(parent, backward),
        }
    }

    /// Join a block with its previous (backward) or next sibling block
    fn merge_blocks(&mut self, block: NodeKey, backward: bool) -> EditorResult<bool> {
        let Some(block_node) = self.node(block) else {
            return Ok(false);
        };
        if block_node.node_type().is_inline() {
            // At the edge of a link: continue from the link's own boundary.
            let (parent, index) = self.editor.inner.draft.borrow().position(block)?;
            let offset = if backward { index } else { index + 1 };
            self.set_caret(parent, offset);
            return self.delete_character(backward);
        }

        let view = self.view();
        let sibling = if backward {
            view.previous_sibling(block)
        } else {
            view.next_sibling(block)
        }
        .cloned();

        let Some(sibling) = sibling else {
            if backward && matches!(block_node.kind, NodeKind::Heading { .. } | NodeKind::Quote) {
                let paragraph = self.replace(block, NodeKind::Paragraph)?;
                self.set_caret(paragraph, 0);
                self.draft().normalize_selection();
                return Ok(true);
            }
            return Ok(false);
        };

        if sibling.node_type() == NodeType::HorizontalRule {
            self.remove(sibling.key)?;
            return Ok(true);
        }

        let (into, from) = if backward {
            (sibling.key, block)
        } else {
            (block, sibling.key)
        };
        let into_node = self.node(into).ok_or(ModelError::NodeNotFound(into))?;
        let from_node = self.node(from).ok_or(ModelError::NodeNotFound(from))?;
        let compatible = into_node.is_element()
            && from_node.children.iter().all(|child| {
                view.get(*child)
                    .map_or(false, |c| into_node.node_type().accepts_child(c.node_type()))
            });
        if !compatible {
            return Ok(false);
        }

        let join = into_node.children.len();
        self.move_children(from, into, 0)?;
        self.set_caret(into, join);
        {
            let mut draft = self.draft();
            draft.remove(from)?;
            if join > 0 {
                let prev = draft.child_at(into, join - 1).map(|n| n.key);
                let next = draft.child_at(into, join).map(|n| n.key);
                if let (Some(prev), Some(next)) = (prev, next) {
                    draft.merge_texts(prev, next);
                }
            }
            draft.normalize_selection();
        }
        Ok(true)
    }

    /// Split the block at the caret into two
    pub fn insert_paragraph(&mut self) -> EditorResult<()> {
        let point = self.collapse_selection()?;
        self.require_caret_node(point)?;
        let (mut block, mut index) = {
            let mut keys = self.keys();
            self.draft().boundary_at(point, &mut keys)?
        };
        // Splitting inside a link splits after the link.
        while self.node(block).map_or(false, |n| n.node_type() == NodeType::Link) {
            let (parent, link_index) = self.editor.inner.draft.borrow().position(block)?;
            block = parent;
            index = link_index + 1;
        }
        let block_node = self.node(block).ok_or(ModelError::NodeNotFound(block))?;

        let new_kind = match &block_node.kind {
            NodeKind::Code { .. } => {
                self.insert_child(block, index, NodeKind::LineBreak)?;
                self.set_caret(block, index + 1);
                self.draft().normalize_selection();
                return Ok(());
            }
            NodeKind::Root | NodeKind::TableCell { .. } => {
                let paragraph = self.insert_child(block, index, NodeKind::Paragraph)?;
                self.set_caret(paragraph, 0);
                return Ok(());
            }
            NodeKind::Heading { .. } if index >= block_node.children.len() => NodeKind::Paragraph,
            NodeKind::ListItem { checked } => NodeKind::ListItem {
                checked: checked.map(|_| false),
            },
            NodeKind::Paragraph | NodeKind::Heading { .. } | NodeKind::Quote => {
                block_node.kind.clone()
            }
            _ => NodeKind::Paragraph,
        };

        let new_block = self.insert_after(block, new_kind)?;
        self.move_children(block, new_block, index)?;
        self.set_caret(new_block, 0);
        self.draft().normalize_selection();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Editor, EditorConfig};
    use folio_model::{Mention, MentionKind, NodeKind, NodeType};

    fn editor_with(text: &str) -> Editor {
        let editor = Editor::new(EditorConfig::default());
        editor.update(|tx| tx.insert_text(text)).unwrap().unwrap();
        editor
    }

    fn paragraph_text(editor: &Editor) -> String {
        editor.read(|s| s.text_content(s.root()))
    }

    #[test]
    fn test_insert_text_into_empty_paragraph() {
        let editor = editor_with("Hello");
        assert_eq!(paragraph_text(&editor), "Hello");

        editor.update(|tx| tx.insert_text(" world")).unwrap().unwrap();
        assert_eq!(paragraph_text(&editor), "Hello world");
    }

    #[test]
    fn test_insert_inline_splits_text() {
        let editor = editor_with("Hello world");
        let mention = editor
            .update(|tx| {
                let caret = tx.caret().unwrap();
                tx.set_caret(caret.key, 6);
                tx.insert_inline(NodeKind::Mention(Mention::new("u1", "Ann", MentionKind::User)))
            })
            .unwrap()
            .unwrap();

        let snapshot = editor.snapshot();
        let paragraph = snapshot.parent(mention).unwrap();
        let types: Vec<_> = snapshot
            .children(paragraph.key)
            .map(|n| n.node_type())
            .collect();
        assert_eq!(types, vec![NodeType::Text, NodeType::Mention, NodeType::Text]);

        let caret = snapshot.selection().unwrap().focus;
        assert_eq!(snapshot.get(caret.key).unwrap().as_text(), Some("world"));
        assert_eq!(caret.offset, 0);
    }

    #[test]
    fn test_remove_merges_neighbouring_text() {
        let editor = editor_with("Hello world");
        let before = editor.snapshot().structure();
        let mention = editor
            .update(|tx| {
                let caret = tx.caret().unwrap();
                tx.set_caret(caret.key, 6);
                tx.insert_inline(NodeKind::Mention(Mention::new("u1", "Ann", MentionKind::User)))
            })
            .unwrap()
            .unwrap();

        editor.update(|tx| tx.remove(mention)).unwrap().unwrap();
        assert_eq!(editor.snapshot().structure(), before);
    }

    #[test]
    fn test_backspace_removes_decorator_before_caret() {
        let editor = editor_with("a");
        editor
            .update(|tx| {
                tx.insert_inline(NodeKind::Mention(Mention::new("u1", "Ann", MentionKind::User)))
            })
            .unwrap()
            .unwrap();

        let changed = editor.update(|tx| tx.delete_character(true)).unwrap().unwrap();
        assert!(changed);
        assert_eq!(editor.snapshot().nodes_of_type(NodeType::Mention).count(), 0);
        assert_eq!(paragraph_text(&editor), "a");
    }

    #[test]
    fn test_backspace_deletes_characters() {
        let editor = editor_with("abc");
        editor.update(|tx| tx.delete_character(true)).unwrap().unwrap();
        assert_eq!(paragraph_text(&editor), "ab");

        editor
            .update(|tx| {
                let caret = tx.caret().unwrap();
                tx.set_caret(caret.key, 0);
                tx.delete_character(false)
            })
            .unwrap()
            .unwrap();
        assert_eq!(paragraph_text(&editor), "b");
    }

    #[test]
    fn test_insert_paragraph_then_merge_back() {
        let editor = editor_with("HelloWorld");
        let before = editor.snapshot().structure();
        editor
            .update(|tx| {
                let caret = tx.caret().unwrap();
                tx.set_caret(caret.key, 5);
                tx.insert_paragraph()
            })
            .unwrap()
            .unwrap();
        assert_eq!(paragraph_text(&editor), "Hello\n\nWorld");

        editor.update(|tx| tx.delete_character(true)).unwrap().unwrap();
        assert_eq!(paragraph_text(&editor), "HelloWorld");
        assert_eq!(editor.snapshot().structure(), before);
    }

    #[test]
    fn test_set_kind_rejects_type_change() {
        let editor = editor_with("x");
        let result = editor
            .update(|tx| {
                let caret = tx.caret().unwrap();
                tx.set_kind(caret.key, NodeKind::LineBreak)
            })
            .unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_removing_last_block_recreates_paragraph() {
        let editor = editor_with("x");
        editor
            .update(|tx| {
                let block = tx.view().root_node().unwrap().children[0];
                tx.remove(block)
            })
            .unwrap()
            .unwrap();

        let snapshot = editor.snapshot();
        assert_eq!(snapshot.root_node().unwrap().children.len(), 1);
        let caret = snapshot.selection().unwrap().focus;
        assert_eq!(snapshot.get(caret.key).unwrap().node_type(), NodeType::Paragraph);
    }
}
