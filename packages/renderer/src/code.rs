//! Lexical tokenization for code block highlighting using logos
//!
//! One lexer covers the C-like and scripting languages we highlight; the
//! per-language part is only the keyword set and the comment style.

use logos::Logos;
use std::ops::Range;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawToken {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Word,

    #[regex(r"[0-9][0-9_]*(\.[0-9_]+)?([eE][+-]?[0-9]+)?")]
    #[regex(r"0[xX][0-9a-fA-F_]+")]
    Number,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"'([^'\\\n]|\\.)*'")]
    #[regex(r"`([^`\\]|\\.)*`")]
    String,

    #[regex(r"//[^\n]*")]
    SlashComment,

    #[regex(r"#[^\n]*")]
    HashComment,

    #[regex(r"--[^\n]*")]
    DashComment,

    #[regex(r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
    BlockComment,

    #[regex(r"[{}()\[\];,.:<>=+\-*/%!&|^~?@]")]
    Punct,
}

/// Highlight class of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    Keyword,
    Ident,
    String,
    Number,
    Comment,
    Punct,
    /// Whitespace and anything the lexer could not classify
    Plain,
}

impl TokenClass {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenClass::Keyword => "keyword",
            TokenClass::Ident => "ident",
            TokenClass::String => "string",
            TokenClass::Number => "number",
            TokenClass::Comment => "comment",
            TokenClass::Punct => "punct",
            TokenClass::Plain => "plain",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeToken<'src> {
    pub class: TokenClass,
    pub text: &'src str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentStyle {
    Slash,
    Hash,
    Dash,
}

/// A language the tokenizer knows keywords for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Rust,
    JavaScript,
    TypeScript,
    Python,
    Go,
    Sql,
    Shell,
    Json,
}

impl Language {
    /// Resolve a fence info string. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "rust" | "rs" => Some(Language::Rust),
            "javascript" | "js" | "jsx" => Some(Language::JavaScript),
            "typescript" | "ts" | "tsx" => Some(Language::TypeScript),
            "python" | "py" => Some(Language::Python),
            "go" | "golang" => Some(Language::Go),
            "sql" => Some(Language::Sql),
            "shell" | "sh" | "bash" | "zsh" => Some(Language::Shell),
            "json" => Some(Language::Json),
            _ => None,
        }
    }

    fn comments(self) -> &'static [CommentStyle] {
        match self {
            Language::Python | Language::Shell => &[CommentStyle::Hash],
            Language::Sql => &[CommentStyle::Dash],
            Language::Json => &[],
            _ => &[CommentStyle::Slash],
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Language::Rust => &[
                "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else",
                "enum", "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop",
                "match", "mod", "move", "mut", "pub", "ref", "return", "self", "Self",
                "static", "struct", "super", "trait", "true", "type", "unsafe", "use",
                "where", "while",
            ],
            Language::JavaScript => &[
                "async", "await", "break", "case", "catch", "class", "const", "continue",
                "default", "delete", "do", "else", "export", "extends", "false", "finally",
                "for", "from", "function", "if", "import", "in", "instanceof", "let", "new",
                "null", "of", "return", "static", "super", "switch", "this", "throw", "true",
                "try", "typeof", "undefined", "var", "void", "while", "yield",
            ],
            Language::TypeScript => &[
                "abstract", "any", "as", "async", "await", "boolean", "break", "case",
                "catch", "class", "const", "continue", "declare", "default", "else", "enum",
                "export", "extends", "false", "finally", "for", "from", "function", "if",
                "implements", "import", "in", "interface", "keyof", "let", "namespace",
                "never", "new", "null", "number", "private", "protected", "public",
                "readonly", "return", "string", "super", "switch", "this", "throw", "true",
                "try", "type", "typeof", "undefined", "unknown", "var", "void", "while",
            ],
            Language::Python => &[
                "False", "None", "True", "and", "as", "assert", "async", "await", "break",
                "class", "continue", "def", "del", "elif", "else", "except", "finally", "for",
                "from", "global", "if", "import", "in", "is", "lambda", "nonlocal", "not",
                "or", "pass", "raise", "return", "try", "while", "with", "yield",
            ],
            Language::Go => &[
                "break", "case", "chan", "const", "continue", "default", "defer", "else",
                "fallthrough", "false", "for", "func", "go", "goto", "if", "import",
                "interface", "map", "nil", "package", "range", "return", "select", "struct",
                "switch", "true", "type", "var",
            ],
            Language::Sql => &[
                "and", "as", "asc", "by", "create", "delete", "desc", "distinct", "drop",
                "from", "group", "having", "in", "insert", "into", "is", "join", "left",
                "limit", "not", "null", "on", "or", "order", "select", "set", "table",
                "update", "values", "where",
            ],
            Language::Shell => &[
                "case", "do", "done", "echo", "elif", "else", "esac", "exit", "export", "fi",
                "for", "function", "if", "in", "local", "return", "then", "while",
            ],
            Language::Json => &["true", "false", "null"],
        }
    }

    fn is_keyword(self, word: &str) -> bool {
        if self == Language::Sql {
            let lower = word.to_ascii_lowercase();
            return self.keywords().contains(&lower.as_str());
        }
        self.keywords().contains(&word)
    }

    fn classify(self, token: RawToken, text: &str) -> TokenClass {
        let comment = |style| {
            if self.comments().contains(&style) {
                TokenClass::Comment
            } else {
                TokenClass::Plain
            }
        };
        match token {
            RawToken::Whitespace => TokenClass::Plain,
            RawToken::Word if self.is_keyword(text) => TokenClass::Keyword,
            RawToken::Word => TokenClass::Ident,
            RawToken::Number => TokenClass::Number,
            RawToken::String => TokenClass::String,
            RawToken::SlashComment => comment(CommentStyle::Slash),
            RawToken::HashComment => comment(CommentStyle::Hash),
            RawToken::DashComment => comment(CommentStyle::Dash),
            RawToken::BlockComment if self.comments().contains(&CommentStyle::Slash) => {
                TokenClass::Comment
            }
            RawToken::BlockComment => TokenClass::Plain,
            RawToken::Punct => TokenClass::Punct,
        }
    }
}

/// Tokenize `source` for `language`. Returns `None` when the language is
/// not supported so the caller can fall back to plain preformatted text.
///
/// The concatenated token texts always equal `source`.
pub fn highlight<'src>(language: &str, source: &'src str) -> Option<Vec<CodeToken<'src>>> {
    let language = Language::from_name(language)?;
    let mut spans: Vec<(TokenClass, Range<usize>)> = Vec::new();

    for (result, span) in RawToken::lexer(source).spanned() {
        let class = match result {
            Ok(token) => language.classify(token, &source[span.clone()]),
            Err(()) => TokenClass::Plain,
        };
        // Merge runs of plain text so unknown bytes don't fragment output
        match spans.last_mut() {
            Some((TokenClass::Plain, last)) if class == TokenClass::Plain => last.end = span.end,
            _ => spans.push((class, span)),
        }
    }

    Some(
        spans
            .into_iter()
            .map(|(class, span)| CodeToken {
                class,
                text: &source[span],
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(language: &str, source: &str) -> Vec<(TokenClass, String)> {
        highlight(language, source)
            .unwrap()
            .into_iter()
            .filter(|t| t.class != TokenClass::Plain)
            .map(|t| (t.class, t.text.to_string()))
            .collect()
    }

    #[test]
    fn test_rust_keywords_and_literals() {
        assert_eq!(
            classes("rust", "let x = \"hi\"; // done"),
            vec![
                (TokenClass::Keyword, "let".to_string()),
                (TokenClass::Ident, "x".to_string()),
                (TokenClass::Punct, "=".to_string()),
                (TokenClass::String, "\"hi\"".to_string()),
                (TokenClass::Punct, ";".to_string()),
                (TokenClass::Comment, "// done".to_string()),
            ]
        );
    }

    #[test]
    fn test_comment_style_per_language() {
        let python = classes("py", "# note");
        assert_eq!(python, vec![(TokenClass::Comment, "# note".to_string())]);

        let rust = highlight("rust", "# note").unwrap();
        assert!(rust.iter().all(|t| t.class != TokenClass::Comment));
    }

    #[test]
    fn test_sql_keywords_case_insensitive() {
        let tokens = classes("sql", "SELECT id FROM t");
        assert_eq!(tokens[0], (TokenClass::Keyword, "SELECT".to_string()));
        assert_eq!(tokens[2], (TokenClass::Keyword, "FROM".to_string()));
    }

    #[test]
    fn test_tokens_cover_source() {
        let source = "fn main() {\n    println!(\"§ {}\", 0x1F);\n}\n";
        let joined: String = highlight("rust", source)
            .unwrap()
            .iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(joined, source);
    }

    #[test]
    fn test_unsupported_language() {
        assert!(highlight("brainfuck", "+++").is_none());
        assert!(highlight("", "x").is_none());
    }
}
