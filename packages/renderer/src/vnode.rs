use crate::RenderResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output tree node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VNode {
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attributes: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<VNode>,
    },

    Text { content: String },
}

impl VNode {
    pub fn element(tag: impl Into<String>) -> Self {
        VNode::Element {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text {
            content: content.into(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let VNode::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(key.into(), value.into());
        }
        self
    }

    /// Set the class attribute, skipping empty class lists
    pub fn with_class(self, class: &str) -> Self {
        if class.is_empty() {
            self
        } else {
            self.with_attr("class", class)
        }
    }

    pub fn with_child(mut self, child: VNode) -> Self {
        if let VNode::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, new_children: Vec<VNode>) -> Self {
        if let VNode::Element {
            ref mut children, ..
        } = self
        {
            children.extend(new_children);
        }
        self
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            VNode::Element { tag, .. } => Some(tag),
            VNode::Text { .. } => None,
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            VNode::Element { attributes, .. } => attributes.get(key).map(String::as_str),
            VNode::Text { .. } => None,
        }
    }

    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element { children, .. } => children,
            VNode::Text { .. } => &[],
        }
    }

    /// Depth-first search for the first element with `tag`
    pub fn find(&self, tag: &str) -> Option<&VNode> {
        if self.tag() == Some(tag) {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(tag))
    }

    /// Serialize to HTML. Attributes come out in sorted order so equal
    /// trees produce identical strings.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            VNode::Text { content } => out.push_str(&escape_html(content)),
            VNode::Element {
                tag,
                attributes,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (key, value) in attributes {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&escape_html(value));
                    out.push('"');
                }
                if is_self_closing(tag) {
                    out.push_str(" />");
                    return;
                }
                out.push('>');
                for child in children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    pub fn to_json(&self) -> RenderResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Visible text with block elements separated by newlines
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out.trim_end_matches('\n').to_string()
    }

    fn write_text(&self, out: &mut String) {
        match self {
            VNode::Text { content } => out.push_str(content),
            VNode::Element { tag, children, .. } => {
                if tag == "br" {
                    out.push('\n');
                    return;
                }
                for child in children {
                    child.write_text(out);
                }
                if is_block(tag) && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn is_self_closing(tag: &str) -> bool {
    matches!(tag, "br" | "hr" | "img" | "col" | "wbr")
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "li" | "blockquote" | "pre" | "tr" | "hr"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_attributes_sorted_and_escaped() {
        let node = VNode::element("a")
            .with_attr("title", "\"x\" & y")
            .with_attr("href", "/d")
            .with_child(VNode::text("<b>"));

        assert_eq!(
            node.to_html(),
            "<a href=\"/d\" title=\"&quot;x&quot; &amp; y\">&lt;b&gt;</a>"
        );
    }

    #[test]
    fn test_self_closing() {
        let node = VNode::element("p")
            .with_child(VNode::text("a"))
            .with_child(VNode::element("br"))
            .with_child(VNode::text("b"));
        assert_eq!(node.to_html(), "<p>a<br />b</p>");
        assert_eq!(node.to_text(), "a\nb");
    }

    #[test]
    fn test_text_separates_blocks() {
        let node = VNode::element("div")
            .with_child(VNode::element("h1").with_child(VNode::text("Title")))
            .with_child(VNode::element("p").with_child(VNode::text("Body")));
        assert_eq!(node.to_text(), "Title\nBody");
    }

    #[test]
    fn test_json_shape() {
        let node = VNode::element("p").with_child(VNode::text("hi"));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "Element",
                "tag": "p",
                "children": [{ "type": "Text", "content": "hi" }]
            })
        );
    }
}
