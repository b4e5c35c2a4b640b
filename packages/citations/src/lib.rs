//! # Folio Citations
//!
//! Scanning and resolving `[[payload]]` tokens embedded in plain text,
//! such as chat messages or imported markdown.
//!
//! ```text
//! "see [[md;<uuid>;ab3dE2F9]]"
//!        │ scan
//!        ▼
//! [Text("see "), Citation(Node { document_id, node_id })]
//!        │ to_mention / resolve_all
//!        ▼
//! [Text("see "), Mention(document, block ab3dE2F9)]
//! ```
//!
//! Unrecognized or malformed tokens always resolve to the empty string.

mod error;
mod payload;
mod resolve;
mod scan;

pub use error::{CitationError, CitationResult};
pub use payload::{CitationPayload, MentionTarget};
pub use resolve::{
    resolve_all, resolve_segments, CitationResolver, ResolvedCitation, ResolvedSegment,
};
pub use scan::{scan, segments, strip, substitute, CitationToken, Segment};
