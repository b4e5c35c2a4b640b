use crate::NodeKey;
use serde::{Deserialize, Serialize};

/// A caret position. For text-like leaves `offset` counts characters; for
/// elements it is a child index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
}

impl Point {
    pub fn new(key: NodeKey, offset: usize) -> Self {
        Self { key, offset }
    }
}

/// Range selection between anchor and focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn caret(key: NodeKey, offset: usize) -> Self {
        let point = Point::new(key, offset);
        Self {
            anchor: point,
            focus: point,
        }
    }

    pub fn range(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Whether both ends sit inside the given node
    pub fn is_within(&self, key: NodeKey) -> bool {
        self.anchor.key == key && self.focus.key == key
    }
}
