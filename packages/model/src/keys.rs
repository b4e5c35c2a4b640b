use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a node across snapshots within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(u64);

impl NodeKey {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Sequential key generator for nodes within a session
#[derive(Debug, Clone, Default)]
pub struct KeyGenerator {
    count: u64,
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue numbering after `last`, used when adopting a snapshot built elsewhere.
    pub fn after(last: NodeKey) -> Self {
        Self { count: last.0 }
    }

    /// Generate next sequential key
    pub fn next_key(&mut self) -> NodeKey {
        self.count += 1;
        NodeKey(self.count)
    }

    /// Number of keys handed out so far
    pub fn issued(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_keys() {
        let mut keys = KeyGenerator::new();

        let k1 = keys.next_key();
        let k2 = keys.next_key();
        let k3 = keys.next_key();

        assert!(k1 < k2 && k2 < k3);
        assert_eq!(k3.to_string(), "n3");
        assert_eq!(keys.issued(), 3);
    }

    #[test]
    fn test_after_never_reissues() {
        let mut keys = KeyGenerator::after(NodeKey::new(41));
        assert_eq!(keys.next_key(), NodeKey::new(42));
    }
}
