//! Class-name tables for light and dark output

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Styling hook the renderer asks the theme about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Slot {
    Document,
    Paragraph,
    Heading,
    Quote,
    Code,
    CodeToken,
    List,
    ListItem,
    Link,
    Mention,
    MentionUnavailable,
    Table,
    TableRow,
    TableCell,
    TableHeader,
    Rule,
    Bold,
    Italic,
    Strikethrough,
    Underline,
    InlineCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub classes: BTreeMap<Slot, String>,
}

impl Theme {
    fn from_table(name: &str, table: &[(Slot, &str)]) -> Self {
        Self {
            name: name.to_string(),
            classes: table
                .iter()
                .map(|(slot, class)| (*slot, class.to_string()))
                .collect(),
        }
    }

    pub fn light() -> Self {
        Self::from_table(
            "light",
            &[
                (Slot::Document, "folio folio-light"),
                (Slot::Paragraph, "folio-p"),
                (Slot::Heading, "folio-h"),
                (Slot::Quote, "folio-quote border-gray-300"),
                (Slot::Code, "folio-code bg-gray-50 text-gray-900"),
                (Slot::CodeToken, "tok"),
                (Slot::List, "folio-list"),
                (Slot::ListItem, "folio-li"),
                (Slot::Link, "folio-link text-blue-600"),
                (Slot::Mention, "folio-mention bg-blue-50 text-blue-700"),
                (Slot::MentionUnavailable, "folio-mention-unavailable text-gray-400"),
                (Slot::Table, "folio-table border-gray-200"),
                (Slot::TableRow, "folio-tr"),
                (Slot::TableCell, "folio-td border-gray-200"),
                (Slot::TableHeader, "folio-th bg-gray-100"),
                (Slot::Rule, "folio-hr border-gray-200"),
                (Slot::Bold, "font-bold"),
                (Slot::Italic, "italic"),
                (Slot::Strikethrough, "line-through"),
                (Slot::Underline, "underline"),
                (Slot::InlineCode, "folio-inline-code bg-gray-100"),
            ],
        )
    }

    pub fn dark() -> Self {
        Self::from_table(
            "dark",
            &[
                (Slot::Document, "folio folio-dark"),
                (Slot::Paragraph, "folio-p"),
                (Slot::Heading, "folio-h"),
                (Slot::Quote, "folio-quote border-gray-600"),
                (Slot::Code, "folio-code bg-gray-900 text-gray-100"),
                (Slot::CodeToken, "tok"),
                (Slot::List, "folio-list"),
                (Slot::ListItem, "folio-li"),
                (Slot::Link, "folio-link text-blue-300"),
                (Slot::Mention, "folio-mention bg-blue-900 text-blue-200"),
                (Slot::MentionUnavailable, "folio-mention-unavailable text-gray-500"),
                (Slot::Table, "folio-table border-gray-700"),
                (Slot::TableRow, "folio-tr"),
                (Slot::TableCell, "folio-td border-gray-700"),
                (Slot::TableHeader, "folio-th bg-gray-800"),
                (Slot::Rule, "folio-hr border-gray-700"),
                (Slot::Bold, "font-bold"),
                (Slot::Italic, "italic"),
                (Slot::Strikethrough, "line-through"),
                (Slot::Underline, "underline"),
                (Slot::InlineCode, "folio-inline-code bg-gray-800"),
            ],
        )
    }

    /// Class for a slot, empty when the theme leaves it unstyled
    pub fn class(&self, slot: Slot) -> &str {
        self.classes.get(&slot).map_or("", String::as_str)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "light" => Ok(Self::light()),
            "dark" => Ok(Self::dark()),
            other => Err(format!("unknown theme '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_themes_cover_same_slots() {
        let light: Vec<_> = Theme::light().classes.keys().copied().collect();
        let dark: Vec<_> = Theme::dark().classes.keys().copied().collect();
        assert_eq!(light, dark);
    }

    #[test]
    fn test_parse_theme() {
        assert_eq!("dark".parse::<Theme>().unwrap().name, "dark");
        assert!("sepia".parse::<Theme>().is_err());
        assert_eq!(Theme::default().class(Slot::Bold), "font-bold");
    }
}
