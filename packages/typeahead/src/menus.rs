//! Concrete menus: mentions, slash actions and emoji.

use crate::menu::{MenuAction, MenuItem, MenuSource, SlashAction};
use folio_model::{Mention, Trigger};
use std::rc::Rc;

/// Supplies mention candidates for a search term
pub trait CandidateSource {
    fn candidates(&self, term: &str) -> Vec<Mention>;
}

impl CandidateSource for Vec<Mention> {
    fn candidates(&self, term: &str) -> Vec<Mention> {
        self.iter()
            .filter(|m| m.name.to_lowercase().contains(term))
            .cloned()
            .collect()
    }
}

/// `@` menu over users, documents and contacts
pub struct MentionMenu {
    source: Rc<dyn CandidateSource>,
}

impl MentionMenu {
    pub fn new(source: Rc<dyn CandidateSource>) -> Self {
        Self { source }
    }

    pub fn from_candidates(candidates: Vec<Mention>) -> Self {
        Self::new(Rc::new(candidates))
    }
}

impl MenuSource for MentionMenu {
    fn trigger(&self) -> Trigger {
        Trigger::Mention
    }

    fn items(&self, term: &str) -> Vec<MenuItem> {
        self.source
            .candidates(term)
            .into_iter()
            .map(|mention| {
                let key = format!("{}:{}", mention.kind.as_str(), mention.id);
                let label = mention.display_name().to_string();
                MenuItem::new(key, label, MenuAction::Mention(mention))
            })
            .collect()
    }
}

struct SlashEntry {
    key: &'static str,
    label: &'static str,
    keywords: &'static [&'static str],
    action: fn() -> SlashAction,
}

const SLASH_ENTRIES: &[SlashEntry] = &[
    SlashEntry {
        key: "h1",
        label: "Heading 1",
        keywords: &["title", "h1"],
        action: || SlashAction::Heading(1),
    },
    SlashEntry {
        key: "h2",
        label: "Heading 2",
        keywords: &["subtitle", "h2"],
        action: || SlashAction::Heading(2),
    },
    SlashEntry {
        key: "h3",
        label: "Heading 3",
        keywords: &["h3"],
        action: || SlashAction::Heading(3),
    },
    SlashEntry {
        key: "bullet-list",
        label: "Bulleted List",
        keywords: &["unordered", "ul"],
        action: || SlashAction::BulletList,
    },
    SlashEntry {
        key: "numbered-list",
        label: "Numbered List",
        keywords: &["ordered", "ol"],
        action: || SlashAction::NumberedList,
    },
    SlashEntry {
        key: "quote",
        label: "Quote",
        keywords: &["blockquote", "citation"],
        action: || SlashAction::Quote,
    },
    SlashEntry {
        key: "code",
        label: "Code Block",
        keywords: &["snippet", "pre"],
        action: || SlashAction::Code,
    },
    SlashEntry {
        key: "divider",
        label: "Divider",
        keywords: &["hr", "rule", "separator"],
        action: || SlashAction::Divider,
    },
    SlashEntry {
        key: "table",
        label: "Table",
        keywords: &["grid"],
        action: || SlashAction::Table {
            rows: 2,
            columns: 2,
        },
    },
    SlashEntry {
        key: "date",
        label: "Today",
        keywords: &["date", "now"],
        action: || SlashAction::Date,
    },
];

/// `/` menu of block actions
#[derive(Debug, Default)]
pub struct SlashMenu;

impl MenuSource for SlashMenu {
    fn trigger(&self) -> Trigger {
        Trigger::Slash
    }

    fn items(&self, term: &str) -> Vec<MenuItem> {
        SLASH_ENTRIES
            .iter()
            .filter(|entry| {
                entry.label.to_lowercase().contains(term)
                    || entry.keywords.iter().any(|k| k.contains(term))
            })
            .map(|entry| {
                MenuItem::new(entry.key, entry.label, MenuAction::Slash((entry.action)()))
            })
            .collect()
    }
}

const EMOJI: &[(&str, &str)] = &[
    ("smile", "😄"),
    ("grin", "😁"),
    ("joy", "😂"),
    ("wink", "😉"),
    ("heart", "❤️"),
    ("thumbsup", "👍"),
    ("thumbsdown", "👎"),
    ("clap", "👏"),
    ("fire", "🔥"),
    ("tada", "🎉"),
    ("rocket", "🚀"),
    ("eyes", "👀"),
    ("thinking", "🤔"),
    ("check", "✅"),
    ("x", "❌"),
    ("warning", "⚠️"),
    ("star", "⭐"),
    ("sparkles", "✨"),
    ("coffee", "☕"),
    ("wave", "👋"),
];

/// `:` menu over a fixed shortcode table
#[derive(Debug, Default)]
pub struct EmojiMenu;

impl MenuSource for EmojiMenu {
    fn trigger(&self) -> Trigger {
        Trigger::Emoji
    }

    fn items(&self, term: &str) -> Vec<MenuItem> {
        // Prefix matches rank ahead of infix matches.
        let (mut prefix, infix): (Vec<_>, Vec<_>) = EMOJI
            .iter()
            .filter(|(code, _)| code.contains(term))
            .partition(|(code, _)| code.starts_with(term));
        prefix.extend(infix);
        prefix
            .into_iter()
            .map(|(code, emoji)| {
                MenuItem::new(code, format!("{} :{}:", emoji, code), MenuAction::Emoji(emoji.to_string()))
            })
            .collect()
    }
}
