//! Markdown import
//!
//! Turns CommonMark (plus GFM tables, strikethrough and task lists) into a
//! [`Snapshot`]. Block containers the document model cannot nest, such as
//! a list inside a quote, are flattened into their parent's inline content
//! with line breaks between the flattened blocks. Citation tokens in text
//! become mention nodes; remote citations need a lookup and are dropped.

use crate::RenderResult;
use folio_citations::{segments, Segment};
use folio_model::{NodeKey, NodeKind, NodeType, Snapshot, SnapshotBuilder, TextFormat};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};
use tracing::debug;

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Open markdown tag, popped by the matching end event
#[derive(Debug)]
enum Frame {
    Node(NodeKey),
    Flattened,
    Format(TextFormat),
    Code {
        language: Option<String>,
        buffer: String,
    },
    TableHead(NodeKey),
}

struct Importer {
    builder: SnapshotBuilder,
    stack: Vec<Frame>,
    format: TextFormat,
    pending: String,
    in_table_head: bool,
}

/// Parse markdown into a snapshot
pub fn import(source: &str) -> RenderResult<Snapshot> {
    let mut importer = Importer {
        builder: SnapshotBuilder::new(),
        stack: Vec::new(),
        format: TextFormat::default(),
        pending: String::new(),
        in_table_head: false,
    };

    for event in Parser::new_ext(source, options()) {
        importer.event(event)?;
    }
    importer.flush()?;

    Ok(importer.builder.build())
}

impl Importer {
    fn event(&mut self, event: Event<'_>) -> RenderResult<()> {
        match event {
            Event::Text(text) => {
                if let Some(Frame::Code { buffer, .. }) = self.stack.last_mut() {
                    buffer.push_str(&text);
                } else {
                    self.pending.push_str(&text);
                }
            }
            Event::Code(code) => {
                self.flush()?;
                let format = TextFormat {
                    code: true,
                    ..self.format
                };
                self.append_inline(NodeKind::Text {
                    text: code.into_string(),
                    format,
                })?;
            }
            Event::Html(html) | Event::InlineHtml(html) => self.pending.push_str(&html),
            Event::SoftBreak => self.pending.push(' '),
            Event::HardBreak => {
                self.flush()?;
                self.append_inline(NodeKind::LineBreak)?;
            }
            Event::Rule => {
                self.flush()?;
                let container = self.container();
                if self.accepts(container, NodeType::HorizontalRule) {
                    self.builder.append(container, NodeKind::HorizontalRule)?;
                }
            }
            Event::TaskListMarker(checked) => {
                let item = self.container();
                if let Some(node) = self.builder.get_mut(item) {
                    if let NodeKind::ListItem { checked: slot } = &mut node.kind {
                        *slot = Some(checked);
                    }
                }
            }
            Event::Start(tag) => {
                self.flush()?;
                self.start(tag)?;
            }
            Event::End(_) => {
                self.flush()?;
                self.end()?;
            }
            other => debug!(event = ?other, "Skipping markdown event"),
        }
        Ok(())
    }

    fn start(&mut self, tag: Tag<'_>) -> RenderResult<()> {
        let frame = match tag {
            Tag::Paragraph => self.open_block(NodeKind::Paragraph)?,
            Tag::Heading { level, .. } => self.open_block(NodeKind::Heading { level: level as u8 })?,
            Tag::BlockQuote { .. } => self.open_block(NodeKind::Quote)?,
            Tag::List(start) => self.open_block(NodeKind::List {
                ordered: start.is_some(),
                start: start.map_or(1, |n| u32::try_from(n).unwrap_or(u32::MAX)),
            })?,
            Tag::Item => self.open_block(NodeKind::ListItem { checked: None })?,
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                Frame::Code {
                    language,
                    buffer: String::new(),
                }
            }
            Tag::Table(_) => self.open_block(NodeKind::Table)?,
            Tag::TableHead => match self.open_block(NodeKind::TableRow)? {
                Frame::Node(row) => {
                    self.in_table_head = true;
                    Frame::TableHead(row)
                }
                frame => frame,
            },
            Tag::TableRow => self.open_block(NodeKind::TableRow)?,
            Tag::TableCell => {
                let row = self.container();
                if self.accepts(row, NodeType::TableCell) {
                    let cell = self.builder.append(
                        row,
                        NodeKind::TableCell {
                            header: self.in_table_head,
                            col_span: 1,
                            row_span: 1,
                        },
                    )?;
                    Frame::Node(self.builder.append(cell, NodeKind::Paragraph)?)
                } else {
                    Frame::Flattened
                }
            }
            Tag::Emphasis => self.push_format(|f| f.italic = true),
            Tag::Strong => self.push_format(|f| f.bold = true),
            Tag::Strikethrough => self.push_format(|f| f.strikethrough = true),
            Tag::Link { dest_url, .. } => {
                let target = self.container();
                if self.accepts(target, NodeType::Link) {
                    Frame::Node(self.builder.append(
                        target,
                        NodeKind::Link {
                            url: dest_url.into_string(),
                        },
                    )?)
                } else {
                    Frame::Flattened
                }
            }
            other => {
                debug!(tag = ?other, "Flattening unsupported markdown tag");
                Frame::Flattened
            }
        };
        self.stack.push(frame);
        Ok(())
    }

    fn end(&mut self) -> RenderResult<()> {
        match self.stack.pop() {
            Some(Frame::Format(previous)) => self.format = previous,
            Some(Frame::TableHead(_)) => self.in_table_head = false,
            Some(Frame::Code { language, buffer }) => self.close_code(language, &buffer)?,
            Some(Frame::Node(_)) | Some(Frame::Flattened) | None => {}
        }
        Ok(())
    }

    /// Create a block under the current container, or flatten it into the
    /// surrounding inline content when the container cannot hold it
    fn open_block(&mut self, kind: NodeKind) -> RenderResult<Frame> {
        let container = self.container();
        if self.accepts(container, kind.node_type()) {
            return Ok(Frame::Node(self.builder.append(container, kind)?));
        }
        self.separate()?;
        Ok(Frame::Flattened)
    }

    fn close_code(&mut self, language: Option<String>, buffer: &str) -> RenderResult<()> {
        let source = buffer.strip_suffix('\n').unwrap_or(buffer);
        let container = self.container();

        let (target, format) = if self.accepts(container, NodeType::Code) {
            let code = self.builder.append(container, NodeKind::Code { language })?;
            (Some(code), TextFormat::default())
        } else {
            self.separate()?;
            let format = TextFormat {
                code: true,
                ..TextFormat::default()
            };
            (self.inline_target()?, format)
        };
        let Some(target) = target else {
            return Ok(());
        };

        for (index, line) in source.split('\n').enumerate() {
            if index > 0 {
                self.builder.append(target, NodeKind::LineBreak)?;
            }
            if !line.is_empty() {
                self.builder.append(
                    target,
                    NodeKind::Text {
                        text: line.to_string(),
                        format,
                    },
                )?;
            }
        }
        Ok(())
    }

    fn push_format(&mut self, apply: impl FnOnce(&mut TextFormat)) -> Frame {
        let previous = self.format;
        apply(&mut self.format);
        Frame::Format(previous)
    }

    /// Innermost node opened by a frame, or the root
    fn container(&self) -> NodeKey {
        self.stack
            .iter()
            .rev()
            .find_map(|frame| match frame {
                Frame::Node(key) | Frame::TableHead(key) => Some(*key),
                _ => None,
            })
            .unwrap_or_else(|| self.builder.root())
    }

    fn accepts(&self, parent: NodeKey, child: NodeType) -> bool {
        self.builder
            .get(parent)
            .is_some_and(|node| node.node_type().accepts_child(child))
    }

    /// Node that inline content goes into. Loose inline content at block
    /// level gets a paragraph of its own.
    fn inline_target(&mut self) -> RenderResult<Option<NodeKey>> {
        let container = self.container();
        if self.accepts(container, NodeType::Text) {
            return Ok(Some(container));
        }
        if self.accepts(container, NodeType::Paragraph) {
            return Ok(Some(self.builder.append(container, NodeKind::Paragraph)?));
        }
        debug!(key = %container, "Dropping inline content outside a text block");
        Ok(None)
    }

    fn append_inline(&mut self, kind: NodeKind) -> RenderResult<()> {
        if let Some(target) = self.inline_target()? {
            self.builder.append(target, kind)?;
        }
        Ok(())
    }

    /// Line break between a flattened block and the content before it
    fn separate(&mut self) -> RenderResult<()> {
        let container = self.container();
        if !self.accepts(container, NodeType::LineBreak) {
            return Ok(());
        }
        let needs_break = self
            .builder
            .get(container)
            .and_then(|node| node.children.last())
            .and_then(|last| self.builder.get(*last))
            .is_some_and(|last| last.kind != NodeKind::LineBreak);
        if needs_break {
            self.builder.append(container, NodeKind::LineBreak)?;
        }
        Ok(())
    }

    /// Write buffered text, turning citation tokens into mentions
    fn flush(&mut self) -> RenderResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.pending);
        let format = self.format;

        for segment in segments(&text) {
            match segment {
                Segment::Text(text) if text.is_empty() => {}
                Segment::Text(text) => self.append_inline(NodeKind::Text { text, format })?,
                Segment::Citation(payload) => match payload.to_mention() {
                    Some(mention) => self.append_inline(NodeKind::Mention(mention))?,
                    None => debug!(%payload, "Dropping citation that needs a remote lookup"),
                },
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_model::{MentionKind, Structure};

    fn kinds(structure: &Structure) -> Vec<NodeType> {
        structure
            .children
            .iter()
            .map(|child| child.kind.node_type())
            .collect()
    }

    #[test]
    fn test_blocks() {
        let snapshot = import("# Title\n\nBody *em*\n\n---\n").unwrap();
        let structure = snapshot.structure();
        assert_eq!(
            kinds(&structure),
            vec![NodeType::Heading, NodeType::Paragraph, NodeType::HorizontalRule]
        );
        assert_eq!(structure.children[0].kind, NodeKind::Heading { level: 1 });

        let body = &structure.children[1];
        assert_eq!(body.children[0].kind, NodeKind::text("Body "));
        assert_eq!(
            body.children[1].kind,
            NodeKind::Text {
                text: "em".to_string(),
                format: TextFormat {
                    italic: true,
                    ..TextFormat::default()
                },
            }
        );
    }

    #[test]
    fn test_ordered_list_start_and_nesting() {
        let snapshot = import("3. one\n4. two\n   - inner\n").unwrap();
        let structure = snapshot.structure();
        let list = &structure.children[0];
        assert_eq!(
            list.kind,
            NodeKind::List {
                ordered: true,
                start: 3
            }
        );
        assert_eq!(list.children.len(), 2);
        assert_eq!(
            kinds(&list.children[1]),
            vec![NodeType::Text, NodeType::List]
        );
    }

    #[test]
    fn test_task_list_marker() {
        let snapshot = import("- [x] done\n- [ ] todo\n").unwrap();
        let list = &snapshot.structure().children[0];
        assert_eq!(list.children[0].kind, NodeKind::ListItem { checked: Some(true) });
        assert_eq!(list.children[1].kind, NodeKind::ListItem { checked: Some(false) });
    }

    #[test]
    fn test_quote_flattens_nested_blocks() {
        let snapshot = import("> first\n>\n> - item\n").unwrap();
        let root = snapshot.root_node().unwrap();
        let quote = snapshot.get(root.children[0]).unwrap();
        assert_eq!(quote.kind, NodeKind::Quote);
        assert_eq!(snapshot.text_content(quote.key), "first\nitem");
    }

    #[test]
    fn test_fenced_code_lines() {
        let snapshot = import("```rust\nlet a = 1;\n\nlet b = 2;\n```\n").unwrap();
        let code = &snapshot.structure().children[0];
        assert_eq!(
            code.kind,
            NodeKind::Code {
                language: Some("rust".to_string())
            }
        );
        assert_eq!(
            kinds(code),
            vec![
                NodeType::Text,
                NodeType::LineBreak,
                NodeType::LineBreak,
                NodeType::Text
            ]
        );
    }

    #[test]
    fn test_table_header_cells() {
        let snapshot = import("| a | b |\n|---|---|\n| 1 | 2 |\n").unwrap();
        let table = &snapshot.structure().children[0];
        assert_eq!(table.kind, NodeKind::Table);
        assert_eq!(table.children.len(), 2);

        let header = &table.children[0].children[0];
        assert!(matches!(header.kind, NodeKind::TableCell { header: true, .. }));
        let body = &table.children[1].children[0];
        assert!(matches!(body.kind, NodeKind::TableCell { header: false, .. }));
        assert_eq!(kinds(body), vec![NodeType::Paragraph]);
    }

    #[test]
    fn test_citations_become_mentions() {
        let source = "See [[md;3f9c2b7a-1111-4444-8888-aaaaaaaaaaaa;ab3dE2F9]] and [[bogus]].";
        let snapshot = import(source).unwrap();
        let paragraph = &snapshot.structure().children[0];

        assert_eq!(
            kinds(paragraph),
            vec![NodeType::Text, NodeType::Mention, NodeType::Text]
        );
        let NodeKind::Mention(mention) = &paragraph.children[1].kind else {
            panic!("expected mention");
        };
        assert_eq!(mention.id, "3f9c2b7a-1111-4444-8888-aaaaaaaaaaaa");
        assert_eq!(
            mention.kind,
            MentionKind::Document {
                block_id: Some("ab3dE2F9".to_string())
            }
        );
        assert_eq!(paragraph.children[2].kind, NodeKind::text(" and ."));
    }

    #[test]
    fn test_link_children() {
        let snapshot = import("[**docs**](https://example.com)").unwrap();
        let paragraph = &snapshot.structure().children[0];
        let link = &paragraph.children[0];
        assert_eq!(
            link.kind,
            NodeKind::Link {
                url: "https://example.com".to_string()
            }
        );
        assert!(matches!(
            link.children[0].kind,
            NodeKind::Text { format: TextFormat { bold: true, .. }, .. }
        ));
    }
}
