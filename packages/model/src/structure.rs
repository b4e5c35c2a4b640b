use crate::NodeKind;
use serde::Serialize;

/// Keyless form of a subtree, for comparing trees built in different sessions
/// or generations where fresh keys were assigned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Structure {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Structure>,
}
