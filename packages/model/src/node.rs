use crate::NodeKey;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Discriminant of a node, used for listener routing and render dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    Root,
    Paragraph,
    Heading,
    List,
    ListItem,
    Quote,
    Code,
    Link,
    Table,
    TableRow,
    TableCell,
    Text,
    LineBreak,
    Mention,
    InlineSearch,
    HorizontalRule,
}

impl NodeType {
    pub const ALL: [NodeType; 16] = [
        NodeType::Root,
        NodeType::Paragraph,
        NodeType::Heading,
        NodeType::List,
        NodeType::ListItem,
        NodeType::Quote,
        NodeType::Code,
        NodeType::Link,
        NodeType::Table,
        NodeType::TableRow,
        NodeType::TableCell,
        NodeType::Text,
        NodeType::LineBreak,
        NodeType::Mention,
        NodeType::InlineSearch,
        NodeType::HorizontalRule,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Root => "root",
            NodeType::Paragraph => "paragraph",
            NodeType::Heading => "heading",
            NodeType::List => "list",
            NodeType::ListItem => "list-item",
            NodeType::Quote => "quote",
            NodeType::Code => "code",
            NodeType::Link => "link",
            NodeType::Table => "table",
            NodeType::TableRow => "table-row",
            NodeType::TableCell => "table-cell",
            NodeType::Text => "text",
            NodeType::LineBreak => "line-break",
            NodeType::Mention => "mention",
            NodeType::InlineSearch => "inline-search",
            NodeType::HorizontalRule => "horizontal-rule",
        }
    }

    /// Elements own ordered children; everything else is a leaf.
    pub fn is_element(self) -> bool {
        matches!(
            self,
            NodeType::Root
                | NodeType::Paragraph
                | NodeType::Heading
                | NodeType::List
                | NodeType::ListItem
                | NodeType::Quote
                | NodeType::Code
                | NodeType::Link
                | NodeType::Table
                | NodeType::TableRow
                | NodeType::TableCell
        )
    }

    pub fn is_inline(self) -> bool {
        matches!(
            self,
            NodeType::Text
                | NodeType::LineBreak
                | NodeType::Mention
                | NodeType::InlineSearch
                | NodeType::Link
        )
    }

    /// Leaves whose content is opaque to text editing (one caret stop wide)
    pub fn is_decorator(self) -> bool {
        matches!(self, NodeType::Mention | NodeType::HorizontalRule)
    }

    /// Whether `child` may be placed directly inside an element of this type.
    pub fn accepts_child(self, child: NodeType) -> bool {
        match self {
            NodeType::Root | NodeType::TableCell => {
                !child.is_inline() && child != NodeType::Root && child != NodeType::ListItem
                    && child != NodeType::TableRow
                    && child != NodeType::TableCell
            }
            NodeType::Paragraph | NodeType::Heading | NodeType::Quote => child.is_inline(),
            NodeType::Link => child.is_inline() && child != NodeType::Link,
            NodeType::ListItem => child.is_inline() || child == NodeType::List,
            NodeType::List => child == NodeType::ListItem,
            NodeType::Code => matches!(child, NodeType::Text | NodeType::LineBreak),
            NodeType::Table => child == NodeType::TableRow,
            NodeType::TableRow => child == NodeType::TableCell,
            _ => false,
        }
    }
}

/// Characters that open an inline search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trigger {
    Mention,
    Slash,
    Emoji,
}

impl Trigger {
    pub const ALL: [Trigger; 3] = [Trigger::Mention, Trigger::Slash, Trigger::Emoji];

    pub fn as_char(self) -> char {
        match self {
            Trigger::Mention => '@',
            Trigger::Slash => '/',
            Trigger::Emoji => ':',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_char() == c)
    }
}

/// Inline formatting flags on a text leaf
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextFormat {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub code: bool,
}

impl TextFormat {
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// What a mention points at. Kind-specific fields live on the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MentionKind {
    Document {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
    },
    User,
    Contact {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email: Option<String>,
    },
    Date {
        date: NaiveDate,
    },
    Channel,
    Chat,
    Project,
}

impl MentionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MentionKind::Document { .. } => "document",
            MentionKind::User => "user",
            MentionKind::Contact { .. } => "contact",
            MentionKind::Date { .. } => "date",
            MentionKind::Channel => "channel",
            MentionKind::Chat => "chat",
            MentionKind::Project => "project",
        }
    }
}

/// Whether the viewer can see the mentioned entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Access {
    #[default]
    Granted,
    NoAccess,
    Deleted,
}

/// Leaf referencing an external entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: MentionKind,
    #[serde(default, skip_serializing_if = "is_granted")]
    pub access: Access,
}

fn is_granted(access: &Access) -> bool {
    *access == Access::Granted
}

impl Mention {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: MentionKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            access: Access::Granted,
        }
    }

    /// Text shown for the mention, falling back to a placeholder when the
    /// entity cannot be displayed.
    pub fn display_name(&self) -> &str {
        match self.access {
            Access::Granted if !self.name.is_empty() => &self.name,
            Access::Granted => "Untitled",
            Access::NoAccess => "No Access",
            Access::Deleted => "Deleted",
        }
    }
}

/// Ephemeral leaf marking a live trigger sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineSearch {
    pub trigger: Trigger,
    /// Text typed after the trigger character
    pub query: String,
}

impl InlineSearch {
    pub fn new(trigger: Trigger) -> Self {
        Self {
            trigger,
            query: String::new(),
        }
    }

    /// Full literal text of the node, trigger included
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(self.query.len() + 1);
        text.push(self.trigger.as_char());
        text.push_str(&self.query);
        text
    }

    pub fn is_bare(&self) -> bool {
        self.query.is_empty()
    }
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NodeKind {
    Root,
    Paragraph,
    Heading {
        level: u8,
    },
    List {
        ordered: bool,
        start: u32,
    },
    ListItem {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
    },
    Quote,
    Code {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    Link {
        url: String,
    },
    Table,
    TableRow,
    TableCell {
        header: bool,
        col_span: u32,
        row_span: u32,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "TextFormat::is_plain")]
        format: TextFormat,
    },
    LineBreak,
    Mention(Mention),
    InlineSearch(InlineSearch),
    HorizontalRule,
}

impl NodeKind {
    pub fn text(text: impl Into<String>) -> Self {
        NodeKind::Text {
            text: text.into(),
            format: TextFormat::default(),
        }
    }

    pub fn cell() -> Self {
        NodeKind::TableCell {
            header: false,
            col_span: 1,
            row_span: 1,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Root => NodeType::Root,
            NodeKind::Paragraph => NodeType::Paragraph,
            NodeKind::Heading { .. } => NodeType::Heading,
            NodeKind::List { .. } => NodeType::List,
            NodeKind::ListItem { .. } => NodeType::ListItem,
            NodeKind::Quote => NodeType::Quote,
            NodeKind::Code { .. } => NodeType::Code,
            NodeKind::Link { .. } => NodeType::Link,
            NodeKind::Table => NodeType::Table,
            NodeKind::TableRow => NodeType::TableRow,
            NodeKind::TableCell { .. } => NodeType::TableCell,
            NodeKind::Text { .. } => NodeType::Text,
            NodeKind::LineBreak => NodeType::LineBreak,
            NodeKind::Mention(_) => NodeType::Mention,
            NodeKind::InlineSearch(_) => NodeType::InlineSearch,
            NodeKind::HorizontalRule => NodeType::HorizontalRule,
        }
    }
}

/// Arena record for one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub key: NodeKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeKey>,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeKey>,
}

impl Node {
    pub fn new(key: NodeKey, parent: Option<NodeKey>, kind: NodeKind) -> Self {
        Self {
            key,
            parent,
            kind,
            children: Vec::new(),
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn is_element(&self) -> bool {
        self.node_type().is_element()
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn as_mention(&self) -> Option<&Mention> {
        match &self.kind {
            NodeKind::Mention(mention) => Some(mention),
            _ => None,
        }
    }

    pub fn as_inline_search(&self) -> Option<&InlineSearch> {
        match &self.kind {
            NodeKind::InlineSearch(search) => Some(search),
            _ => None,
        }
    }

    /// Text this leaf contributes to its block. Elements return `None`.
    pub fn leaf_text(&self) -> Option<String> {
        match &self.kind {
            NodeKind::Text { text, .. } => Some(text.clone()),
            NodeKind::LineBreak => Some("\n".to_string()),
            NodeKind::Mention(mention) => Some(mention.display_name().to_string()),
            NodeKind::InlineSearch(search) => Some(search.text()),
            NodeKind::HorizontalRule => Some(String::new()),
            _ => None,
        }
    }

    /// Number of caret positions inside a leaf. Decorators are atomic.
    pub fn leaf_len(&self) -> usize {
        match &self.kind {
            NodeKind::Text { text, .. } => text.chars().count(),
            NodeKind::InlineSearch(search) => search.query.chars().count() + 1,
            NodeKind::LineBreak | NodeKind::Mention(_) | NodeKind::HorizontalRule => 1,
            _ => self.children.len(),
        }
    }
}
