//! # Folio Floating
//!
//! Anchors menus and popovers to a reference element or text selection.
//!
//! ```text
//! reference rect ─┐
//! panel size ─────┼─▶ place ─▶ flip ─▶ shift ─▶ hide ─▶ Position
//! boundary ───────┘
//! ```
//!
//! [`auto_update`] reruns the pipeline whenever one of its
//! [`LayoutSources`] changes and stops once its handle is dropped.

mod auto_update;
mod compute;
mod config;

pub use auto_update::{auto_update, AutoUpdate, LayoutSources};
pub use compute::{compute_position, Position, Reference};
pub use config::{Alignment, FloatingConfig, Placement, Side};
