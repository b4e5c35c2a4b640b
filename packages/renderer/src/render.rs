//! Tree-walk rendering of a snapshot into a `VNode` tree
//!
//! Every node is matched against an ordered rule table. Leaf rules are
//! tried before element rules and the first matching predicate wins.
//! Element handlers recurse by asking the walk to render their children.
//! A node that no rule claims is logged and renders nothing; the rest of
//! the walk carries on.
//!
//! The walk reads nothing besides its inputs, so equal snapshots and
//! themes produce equal trees.

use crate::code::highlight;
use crate::{Audience, RenderContext, Slot, Theme, VNode};
use folio_model::{Access, Mention, MentionKind, Node, NodeKind, NodeType, Snapshot};
use tracing::{info, warn};

pub type Predicate = fn(&Node) -> bool;
pub type Handler = fn(&Walk<'_>, &Node) -> VNode;

/// One (predicate, handler) pair in the dispatch table
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub matches: Predicate,
    pub render: Handler,
}

impl Rule {
    pub const fn new(name: &'static str, matches: Predicate, render: Handler) -> Self {
        Self {
            name,
            matches,
            render,
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// Rule tables for leaves and elements
#[derive(Debug, Clone)]
pub struct Renderer {
    leaf_rules: Vec<Rule>,
    element_rules: Vec<Rule>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            leaf_rules: vec![
                Rule::new("text", |n| matches!(n.kind, NodeKind::Text { .. }), render_text),
                Rule::new("line-break", |n| n.kind == NodeKind::LineBreak, render_line_break),
                Rule::new("mention", |n| n.as_mention().is_some(), render_mention),
                Rule::new("inline-search", |n| n.as_inline_search().is_some(), render_inline_search),
                Rule::new("horizontal-rule", |n| n.kind == NodeKind::HorizontalRule, render_rule),
            ],
            element_rules: vec![
                Rule::new("root", |n| n.kind == NodeKind::Root, render_root),
                Rule::new("paragraph", |n| n.kind == NodeKind::Paragraph, render_paragraph),
                Rule::new("heading", |n| matches!(n.kind, NodeKind::Heading { .. }), render_heading),
                Rule::new("quote", |n| n.kind == NodeKind::Quote, render_quote),
                Rule::new("list", |n| matches!(n.kind, NodeKind::List { .. }), render_list),
                Rule::new("list-item", |n| matches!(n.kind, NodeKind::ListItem { .. }), render_list_item),
                Rule::new("code", |n| matches!(n.kind, NodeKind::Code { .. }), render_code),
                Rule::new("link", |n| matches!(n.kind, NodeKind::Link { .. }), render_link),
                Rule::new("table", |n| n.kind == NodeKind::Table, render_table),
                Rule::new("table-row", |n| n.kind == NodeKind::TableRow, render_table_row),
                Rule::new("table-cell", |n| matches!(n.kind, NodeKind::TableCell { .. }), render_table_cell),
            ],
        }
    }

    /// Add a leaf rule ahead of the built-in ones
    pub fn with_leaf_rule(mut self, rule: Rule) -> Self {
        self.leaf_rules.insert(0, rule);
        self
    }

    /// Add an element rule ahead of the built-in ones
    pub fn with_element_rule(mut self, rule: Rule) -> Self {
        self.element_rules.insert(0, rule);
        self
    }

    /// Drop every rule with the given name
    pub fn without_rule(mut self, name: &str) -> Self {
        self.leaf_rules.retain(|rule| rule.name != name);
        self.element_rules.retain(|rule| rule.name != name);
        self
    }

    pub fn render(&self, snapshot: &Snapshot, theme: &Theme, context: &RenderContext) -> VNode {
        let walk = Walk {
            renderer: self,
            snapshot,
            theme,
            context,
        };
        let output = snapshot
            .root_node()
            .ok()
            .and_then(|root| walk.node(root))
            .unwrap_or_else(|| VNode::element("div").with_class(theme.class(Slot::Document)));
        info!(
            generation = snapshot.generation(),
            nodes = snapshot.len(),
            theme = %theme,
            "Rendered snapshot"
        );
        output
    }
}

/// State of one render pass, handed to every handler
pub struct Walk<'a> {
    renderer: &'a Renderer,
    pub snapshot: &'a Snapshot,
    pub theme: &'a Theme,
    pub context: &'a RenderContext,
}

impl<'a> Walk<'a> {
    /// Render one node through the rule table
    pub fn node(&self, node: &Node) -> Option<VNode> {
        let rule = self
            .renderer
            .leaf_rules
            .iter()
            .chain(self.renderer.element_rules.iter())
            .find(|rule| (rule.matches)(node));

        match rule {
            Some(rule) => Some((rule.render)(self, node)),
            None => {
                warn!(
                    key = %node.key,
                    node_type = node.node_type().as_str(),
                    "No renderer for node"
                );
                None
            }
        }
    }

    /// Render the children of `node` in order
    pub fn children(&self, node: &Node) -> Vec<VNode> {
        self.snapshot
            .children(node.key)
            .filter_map(|child| self.node(child))
            .collect()
    }

    pub fn class(&self, slot: Slot) -> &str {
        self.theme.class(slot)
    }

    /// Number of list elements above `node`
    pub fn list_depth(&self, node: &Node) -> usize {
        self.snapshot
            .ancestors(node.key)
            .iter()
            .filter(|ancestor| ancestor.node_type() == NodeType::List)
            .count()
    }
}

fn render_root(walk: &Walk<'_>, node: &Node) -> VNode {
    VNode::element("div")
        .with_class(walk.class(Slot::Document))
        .with_children(walk.children(node))
}

fn render_paragraph(walk: &Walk<'_>, node: &Node) -> VNode {
    VNode::element("p")
        .with_class(walk.class(Slot::Paragraph))
        .with_children(walk.children(node))
}

fn render_heading(walk: &Walk<'_>, node: &Node) -> VNode {
    let level = match node.kind {
        NodeKind::Heading { level } => level.clamp(1, 6),
        _ => 1,
    };
    VNode::element(format!("h{}", level))
        .with_class(walk.class(Slot::Heading))
        .with_children(walk.children(node))
}

fn render_quote(walk: &Walk<'_>, node: &Node) -> VNode {
    VNode::element("blockquote")
        .with_class(walk.class(Slot::Quote))
        .with_children(walk.children(node))
}

fn render_list(walk: &Walk<'_>, node: &Node) -> VNode {
    let (ordered, start) = match node.kind {
        NodeKind::List { ordered, start } => (ordered, start),
        _ => (false, 1),
    };
    let depth = walk.list_depth(node);
    let class = format!("{} folio-list-depth-{}", walk.class(Slot::List), depth);

    let mut list = VNode::element(if ordered { "ol" } else { "ul" })
        .with_class(class.trim())
        .with_attr("data-depth", depth.to_string());
    if ordered && start != 1 {
        list = list.with_attr("start", start.to_string());
    }
    list.with_children(walk.children(node))
}

fn render_list_item(walk: &Walk<'_>, node: &Node) -> VNode {
    let mut item = VNode::element("li").with_class(walk.class(Slot::ListItem));

    if let NodeKind::ListItem {
        checked: Some(checked),
    } = node.kind
    {
        item = item.with_attr("data-checked", checked.to_string());
    }

    if let Some(parent) = walk.snapshot.parent(node.key) {
        if let NodeKind::List {
            ordered: true,
            start,
        } = parent.kind
        {
            let index = walk.snapshot.index_in_parent(node.key).unwrap_or(0);
            item = item.with_attr("value", (start as usize + index).to_string());
        }
    }

    item.with_children(walk.children(node))
}

fn render_code(walk: &Walk<'_>, node: &Node) -> VNode {
    let language = match &node.kind {
        NodeKind::Code { language } => language.as_deref(),
        _ => None,
    };
    let source: String = walk
        .snapshot
        .children(node.key)
        .filter_map(Node::leaf_text)
        .collect();

    let mut code = VNode::element("code");
    let tokens = language.and_then(|language| highlight(language, &source));
    match (language, tokens) {
        (Some(language), Some(tokens)) => {
            code = code.with_attr("data-language", language);
            let token_class = walk.class(Slot::CodeToken);
            for token in tokens {
                code = match token.class {
                    crate::code::TokenClass::Plain => code.with_child(VNode::text(token.text)),
                    class => {
                        let classes =
                            format!("{} {}-{}", token_class, token_class, class.as_str());
                        code.with_child(
                            VNode::element("span")
                                .with_class(classes.trim())
                                .with_child(VNode::text(token.text)),
                        )
                    }
                };
            }
        }
        _ => {
            code = code.with_child(VNode::text(source.as_str()));
        }
    }

    VNode::element("pre")
        .with_class(walk.class(Slot::Code))
        .with_child(code)
}

fn render_link(walk: &Walk<'_>, node: &Node) -> VNode {
    let url = match &node.kind {
        NodeKind::Link { url } => url.as_str(),
        _ => "",
    };
    VNode::element("a")
        .with_class(walk.class(Slot::Link))
        .with_attr("href", url)
        .with_children(walk.children(node))
}

fn render_table(walk: &Walk<'_>, node: &Node) -> VNode {
    VNode::element("table")
        .with_class(walk.class(Slot::Table))
        .with_child(VNode::element("tbody").with_children(walk.children(node)))
}

fn render_table_row(walk: &Walk<'_>, node: &Node) -> VNode {
    VNode::element("tr")
        .with_class(walk.class(Slot::TableRow))
        .with_children(walk.children(node))
}

fn render_table_cell(walk: &Walk<'_>, node: &Node) -> VNode {
    let (header, col_span, row_span) = match node.kind {
        NodeKind::TableCell {
            header,
            col_span,
            row_span,
        } => (header, col_span, row_span),
        _ => (false, 1, 1),
    };

    let mut cell = if header {
        VNode::element("th").with_class(walk.class(Slot::TableHeader))
    } else {
        VNode::element("td").with_class(walk.class(Slot::TableCell))
    };
    if col_span > 1 {
        cell = cell.with_attr("colspan", col_span.to_string());
    }
    if row_span > 1 {
        cell = cell.with_attr("rowspan", row_span.to_string());
    }
    cell.with_children(walk.children(node))
}

fn render_text(walk: &Walk<'_>, node: &Node) -> VNode {
    let NodeKind::Text { text, format } = &node.kind else {
        return VNode::text("");
    };

    let mut out = VNode::text(text.as_str());
    let wrappers = [
        (format.code, "code", Slot::InlineCode),
        (format.underline, "u", Slot::Underline),
        (format.strikethrough, "s", Slot::Strikethrough),
        (format.italic, "em", Slot::Italic),
        (format.bold, "strong", Slot::Bold),
    ];
    for (enabled, tag, slot) in wrappers {
        if enabled {
            out = VNode::element(tag)
                .with_class(walk.class(slot))
                .with_child(out);
        }
    }
    out
}

fn render_line_break(_walk: &Walk<'_>, _node: &Node) -> VNode {
    VNode::element("br")
}

fn render_rule(walk: &Walk<'_>, _node: &Node) -> VNode {
    VNode::element("hr").with_class(walk.class(Slot::Rule))
}

/// Pending searches render as the literal text typed so far
fn render_inline_search(_walk: &Walk<'_>, node: &Node) -> VNode {
    VNode::text(node.as_inline_search().map(|s| s.text()).unwrap_or_default())
}

fn mention_label(mention: &Mention) -> String {
    match (&mention.kind, mention.access) {
        (MentionKind::User | MentionKind::Contact { .. }, Access::Granted) => {
            format!("@{}", mention.display_name())
        }
        (MentionKind::Date { date }, Access::Granted) if mention.name.is_empty() => {
            date.format("%B %-d, %Y").to_string()
        }
        _ => mention.display_name().to_string(),
    }
}

/// Workspace link for a mention, if it has one
fn mention_href(base: &str, mention: &Mention) -> Option<String> {
    match &mention.kind {
        MentionKind::Document { block_id } => {
            let mut href = format!("{}/document/{}", base, mention.id);
            if let Some(block) = block_id {
                href.push('#');
                href.push_str(block);
            }
            Some(href)
        }
        MentionKind::Channel => Some(format!("{}/channel/{}", base, mention.id)),
        MentionKind::Chat => Some(format!("{}/chat/{}", base, mention.id)),
        MentionKind::Project => Some(format!("{}/project/{}", base, mention.id)),
        MentionKind::Contact { email: Some(email) } => Some(format!("mailto:{}", email)),
        MentionKind::User | MentionKind::Contact { email: None } | MentionKind::Date { .. } => {
            None
        }
    }
}

fn render_mention(walk: &Walk<'_>, node: &Node) -> VNode {
    let Some(mention) = node.as_mention() else {
        return VNode::text("");
    };
    let label = VNode::text(mention_label(mention));

    if mention.access != Access::Granted {
        return VNode::element("span")
            .with_class(walk.class(Slot::MentionUnavailable))
            .with_attr("data-mention-kind", mention.kind.as_str())
            .with_child(label);
    }

    match walk.context.audience {
        Audience::External => VNode::element("span")
            .with_class(walk.class(Slot::Mention))
            .with_attr("data-mention-kind", mention.kind.as_str())
            .with_child(label),
        Audience::Internal => {
            let element = match mention_href(&walk.context.link_base, mention) {
                Some(href) => VNode::element("a").with_attr("href", href),
                None => VNode::element("span"),
            };
            element
                .with_class(walk.class(Slot::Mention))
                .with_attr("data-mention-id", mention.id.as_str())
                .with_attr("data-mention-kind", mention.kind.as_str())
                .with_child(label)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_model::{SnapshotBuilder, TextFormat};

    fn paragraph_with(kind: NodeKind) -> Snapshot {
        let mut builder = SnapshotBuilder::new();
        let root = builder.root();
        let p = builder.append(root, NodeKind::Paragraph).unwrap();
        builder.append(p, kind).unwrap();
        builder.build()
    }

    #[test]
    fn test_text_format_nesting() {
        let snapshot = paragraph_with(NodeKind::Text {
            text: "hi".to_string(),
            format: TextFormat {
                bold: true,
                italic: true,
                ..TextFormat::default()
            },
        });
        let theme = Theme {
            name: "bare".to_string(),
            classes: Default::default(),
        };
        let html = Renderer::new()
            .render(&snapshot, &theme, &RenderContext::default())
            .to_html();
        assert_eq!(html, "<div><p><strong><em>hi</em></strong></p></div>");
    }

    #[test]
    fn test_removed_rule_renders_nothing() {
        let snapshot = paragraph_with(NodeKind::LineBreak);
        let renderer = Renderer::new().without_rule("paragraph");
        let output = renderer.render(&snapshot, &Theme::light(), &RenderContext::default());
        assert!(output.children().is_empty());
    }

    #[test]
    fn test_custom_rule_takes_precedence() {
        let snapshot = paragraph_with(NodeKind::LineBreak);
        let renderer = Renderer::new().with_leaf_rule(Rule::new(
            "visible-break",
            |n| n.kind == NodeKind::LineBreak,
            |_, _| VNode::text("⏎"),
        ));
        let output = renderer.render(&snapshot, &Theme::light(), &RenderContext::default());
        assert_eq!(output.to_text(), "⏎");
    }

    #[test]
    fn test_external_mentions_hide_identity() {
        let mention = Mention::new("u1", "Jo Smith", MentionKind::User);
        let snapshot = paragraph_with(NodeKind::Mention(mention));
        let renderer = Renderer::new();

        let internal = renderer.render(&snapshot, &Theme::light(), &RenderContext::default());
        let span = internal.find("span").unwrap();
        assert_eq!(span.attr("data-mention-id"), Some("u1"));

        let external = renderer.render(
            &snapshot,
            &Theme::light(),
            &RenderContext::new(Audience::External),
        );
        let span = external.find("span").unwrap();
        assert_eq!(span.attr("data-mention-id"), None);
        assert_eq!(external.to_text(), "@Jo Smith");
    }

    #[test]
    fn test_unavailable_mention_placeholder() {
        let mut mention = Mention::new("d1", "Secret", MentionKind::Document { block_id: None });
        mention.access = Access::NoAccess;
        let snapshot = paragraph_with(NodeKind::Mention(mention));

        let output = Renderer::new().render(&snapshot, &Theme::light(), &RenderContext::default());
        assert!(output.find("a").is_none());
        assert_eq!(output.to_text(), "No Access");
    }
}
