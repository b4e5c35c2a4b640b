//! # Folio Document Model
//!
//! Immutable, versioned node tree for the Folio rich-text engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Snapshot (generation N)                     │
//! │  - arena: NodeKey → Arc<Node>               │
//! │  - root key                                 │
//! │  - selection                                │
//! └─────────────────────────────────────────────┘
//!                     ↓ transaction (editor)
//! ┌─────────────────────────────────────────────┐
//! │ Snapshot (generation N + 1)                 │
//! │  - untouched records shared with N          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Parents are referenced by key through the arena, never by pointer, so
//! the tree has no reference cycles. Records that a transaction did not
//! touch are shared between generations, which makes `Arc::ptr_eq` a valid
//! "unchanged" check during diffing.

mod builder;
mod error;
mod keys;
mod node;
mod selection;
mod snapshot;
mod structure;

pub use builder::SnapshotBuilder;
pub use error::{ModelError, ModelResult};
pub use keys::{KeyGenerator, NodeKey};
pub use node::{
    Access, InlineSearch, Mention, MentionKind, Node, NodeKind, NodeType, TextFormat, Trigger,
};
pub use selection::{Point, Selection};
pub use snapshot::{NodeMap, Snapshot};
pub use structure::Structure;
