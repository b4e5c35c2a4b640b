use folio_model::{InlineSearch, Mention, Node, NodeKind, Snapshot};

/// Visitor pattern for traversing a snapshot immutably
///
/// This trait provides default implementations that walk the entire tree in
/// document order. Override specific visit_* methods to act on nodes.
pub trait Visitor: Sized {
    fn visit_snapshot(&mut self, snapshot: &Snapshot) {
        walk_snapshot(self, snapshot);
    }

    fn visit_node(&mut self, snapshot: &Snapshot, node: &Node) {
        walk_node(self, snapshot, node);
    }

    fn visit_element(&mut self, snapshot: &Snapshot, element: &Node) {
        walk_element(self, snapshot, element);
    }

    fn visit_text(&mut self, _node: &Node, _text: &str) {
        // Leaf node, no children to walk
    }

    fn visit_mention(&mut self, _node: &Node, _mention: &Mention) {
        // Leaf node, no children to walk
    }

    fn visit_inline_search(&mut self, _node: &Node, _search: &InlineSearch) {
        // Leaf node, no children to walk
    }

    fn visit_other_leaf(&mut self, _node: &Node) {
        // Line breaks, rules
    }
}

pub fn walk_snapshot<V: Visitor>(visitor: &mut V, snapshot: &Snapshot) {
    if let Ok(root) = snapshot.root_node() {
        visitor.visit_node(snapshot, root);
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, snapshot: &Snapshot, node: &Node) {
    match &node.kind {
        NodeKind::Text { text, .. } => visitor.visit_text(node, text),
        NodeKind::Mention(mention) => visitor.visit_mention(node, mention),
        NodeKind::InlineSearch(search) => visitor.visit_inline_search(node, search),
        _ if node.is_element() => visitor.visit_element(snapshot, node),
        _ => visitor.visit_other_leaf(node),
    }
}

pub fn walk_element<V: Visitor>(visitor: &mut V, snapshot: &Snapshot, element: &Node) {
    for child in snapshot.children(element.key) {
        visitor.visit_node(snapshot, child);
    }
}

/// Collects every mention in document order
#[derive(Debug, Default)]
pub struct MentionCollector {
    pub mentions: Vec<(folio_model::NodeKey, Mention)>,
}

impl Visitor for MentionCollector {
    fn visit_mention(&mut self, node: &Node, mention: &Mention) {
        self.mentions.push((node.key, mention.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_model::{MentionKind, SnapshotBuilder};

    #[test]
    fn test_collects_mentions_in_document_order() {
        let mut builder = SnapshotBuilder::new();
        let root = builder.root();
        let p = builder.append(root, NodeKind::Paragraph).unwrap();
        builder
            .append(p, NodeKind::Mention(Mention::new("u1", "Ann", MentionKind::User)))
            .unwrap();
        builder.append(p, NodeKind::text(" and ")).unwrap();
        builder
            .append(p, NodeKind::Mention(Mention::new("u2", "Bo", MentionKind::User)))
            .unwrap();
        let snapshot = builder.build();

        let mut collector = MentionCollector::default();
        collector.visit_snapshot(&snapshot);

        let ids: Vec<_> = collector.mentions.iter().map(|(_, m)| m.id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2"]);
    }
}
