//! # Trigger Boundaries
//!
//! A trigger character only opens a search when it stands on its own:
//!
//! | Trigger | Before                                      | After                          |
//! |---------|---------------------------------------------|--------------------------------|
//! | `@`     | start, whitespace, open bracket, quote      | end, whitespace, close bracket, quote |
//! | `:`     | start, whitespace, open bracket, quote      | end, whitespace, close bracket, quote |
//! | `/`     | start of line or whitespace only            | end, whitespace, close bracket, quote |
//!
//! Neighbours are read across leaf boundaries within one block. A line
//! break counts as whitespace, any other non-text leaf as a word character.

use folio_model::{Node, NodeKey, NodeKind, Point, Snapshot, Trigger};

/// Stand-in for a neighbour that is not text
const OBJECT: char = '\u{FFFC}';

fn is_quote(c: char) -> bool {
    matches!(c, '"' | '\'' | '“' | '”' | '‘' | '’' | '`')
}

fn is_open_bracket(c: char) -> bool {
    matches!(c, '(' | '[' | '{' | '<')
}

fn is_close_bracket(c: char) -> bool {
    matches!(c, ')' | ']' | '}' | '>')
}

/// Whether `trigger` may open given the characters around the caret
pub fn is_valid_boundary(trigger: Trigger, before: Option<char>, after: Option<char>) -> bool {
    let before_ok = match (trigger, before) {
        (_, None) => true,
        (Trigger::Slash, Some(c)) => c.is_whitespace(),
        (Trigger::Mention | Trigger::Emoji, Some(c)) => {
            c.is_whitespace() || is_open_bracket(c) || is_quote(c)
        }
    };
    let after_ok = match after {
        None => true,
        Some(c) => c.is_whitespace() || is_close_bracket(c) || is_quote(c),
    };
    before_ok && after_ok
}

fn edge_char(node: &Node, last: bool) -> Option<char> {
    match &node.kind {
        NodeKind::Text { text, .. } => {
            if last {
                text.chars().next_back()
            } else {
                text.chars().next()
            }
        }
        NodeKind::LineBreak => Some('\n'),
        _ => Some(OBJECT),
    }
}

fn sibling_edge(
    snapshot: &Snapshot,
    parent: NodeKey,
    index: Option<usize>,
    last: bool,
) -> Option<char> {
    let parent = snapshot.get(parent)?;
    let key = parent.children.get(index?)?;
    edge_char(snapshot.get(*key)?, last)
}

/// Characters immediately before and after a caret, within its block
pub fn caret_neighbours(snapshot: &Snapshot, point: Point) -> (Option<char>, Option<char>) {
    let Some(node) = snapshot.get(point.key) else {
        return (None, None);
    };

    if node.is_element() {
        let parent = point.key;
        return (
            sibling_edge(snapshot, parent, point.offset.checked_sub(1), true),
            sibling_edge(snapshot, parent, Some(point.offset), false),
        );
    }

    let Some(parent) = node.parent else {
        return (None, None);
    };
    let index = snapshot.index_in_parent(point.key).unwrap_or(0);
    let from_prev = || sibling_edge(snapshot, parent, index.checked_sub(1), true);
    let from_next = || sibling_edge(snapshot, parent, Some(index + 1), false);

    match node.as_text() {
        Some(text) => {
            let chars: Vec<char> = text.chars().collect();
            let before = match point.offset {
                0 => from_prev(),
                n => chars.get(n - 1).copied(),
            };
            let after = match chars.get(point.offset) {
                Some(c) => Some(*c),
                None => from_next(),
            };
            (before, after)
        }
        None if point.offset == 0 => (from_prev(), edge_char(node, false)),
        None => (edge_char(node, true), from_next()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_model::{Mention, MentionKind, SnapshotBuilder};

    #[test]
    fn test_mention_boundaries() {
        assert!(is_valid_boundary(Trigger::Mention, None, None));
        assert!(is_valid_boundary(Trigger::Mention, Some(' '), None));
        assert!(is_valid_boundary(Trigger::Mention, Some('('), Some(')')));
        assert!(is_valid_boundary(Trigger::Mention, Some('"'), None));
        assert!(!is_valid_boundary(Trigger::Mention, Some('a'), None));
        assert!(!is_valid_boundary(Trigger::Mention, Some(' '), Some('x')));
    }

    #[test]
    fn test_slash_needs_line_start_or_space() {
        assert!(is_valid_boundary(Trigger::Slash, None, None));
        assert!(is_valid_boundary(Trigger::Slash, Some(' '), None));
        assert!(!is_valid_boundary(Trigger::Slash, Some('('), None));
        assert!(!is_valid_boundary(Trigger::Slash, Some('a'), None));
    }

    #[test]
    fn test_emoji_not_after_digit() {
        assert!(!is_valid_boundary(Trigger::Emoji, Some('0'), None));
        assert!(is_valid_boundary(Trigger::Emoji, Some(' '), None));
    }

    #[test]
    fn test_neighbours_cross_leaves() {
        let mut builder = SnapshotBuilder::new();
        let root = builder.root();
        let p = builder.append(root, NodeKind::Paragraph).unwrap();
        let left = builder.append(p, NodeKind::text("ab")).unwrap();
        builder
            .append(p, NodeKind::Mention(Mention::new("u", "U", MentionKind::User)))
            .unwrap();
        let right = builder.append(p, NodeKind::text(" c")).unwrap();
        let snapshot = builder.build();

        assert_eq!(caret_neighbours(&snapshot, Point::new(left, 0)), (None, Some('a')));
        assert_eq!(caret_neighbours(&snapshot, Point::new(left, 2)), (Some('b'), Some(OBJECT)));
        assert_eq!(caret_neighbours(&snapshot, Point::new(right, 0)), (Some(OBJECT), Some(' ')));
        assert_eq!(caret_neighbours(&snapshot, Point::new(p, 3)), (Some('c'), None));
    }
}
