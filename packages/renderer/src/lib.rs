//! # Folio Renderer
//!
//! Pure, read-only rendering of document snapshots.
//!
//! ## Pipeline
//!
//! ```text
//! markdown ──import──▶ Snapshot ──Renderer::render──▶ VNode ──▶ HTML / text / JSON
//!                         ▲
//!         editor session ─┘
//! ```
//!
//! `render` reads only the snapshot, theme and context it is given, so
//! identical inputs always yield identical output trees and callers may
//! cache on them.

mod code;
mod context;
mod error;
mod markdown;
mod render;
mod theme;
mod vnode;

pub use code::{highlight, CodeToken, Language, TokenClass};
pub use context::{Audience, RenderContext};
pub use error::{RenderError, RenderResult};
pub use markdown::import as import_markdown;
pub use render::{Handler, Predicate, Renderer, Rule, Walk};
pub use theme::{Slot, Theme};
pub use vnode::VNode;

use folio_model::Snapshot;

/// Render a snapshot with the default rule table
pub fn render(snapshot: &Snapshot, theme: &Theme, context: &RenderContext) -> VNode {
    Renderer::new().render(snapshot, theme, context)
}

/// Static render of a markdown source
pub fn render_markdown(source: &str, theme: &Theme, audience: Audience) -> RenderResult<VNode> {
    let snapshot = import_markdown(source)?;
    Ok(render(&snapshot, theme, &RenderContext::new(audience)))
}

/// Static render of only the first logical line of a markdown source
pub fn render_markdown_line(
    source: &str,
    theme: &Theme,
    audience: Audience,
) -> RenderResult<VNode> {
    render_markdown(&single_line(source), theme, audience)
}

fn fence_marker(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    (len >= 3).then(|| &trimmed[..len])
}

/// First logical line of a markdown source.
///
/// Leading blank lines are skipped. A fenced code block keeps its opening
/// fence and first non-blank code line and is closed again; anything else
/// runs up to the first blank line.
pub fn single_line(source: &str) -> String {
    let mut lines = source.lines().skip_while(|line| line.trim().is_empty());
    let Some(first) = lines.next() else {
        return String::new();
    };

    if let Some(marker) = fence_marker(first) {
        let code = lines
            .take_while(|line| !line.trim_start().starts_with(marker))
            .find(|line| !line.trim().is_empty());
        return match code {
            Some(code) => format!("{}\n{}\n{}", first.trim_start(), code, marker),
            None => format!("{}\n{}", first.trim_start(), marker),
        };
    }

    let mut out = first.to_string();
    for line in lines.take_while(|line| !line.trim().is_empty()) {
        out.push('\n');
        out.push_str(line);
    }
    out
}
