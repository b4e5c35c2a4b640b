//! Finding `[[…]]` tokens in free text

use crate::{CitationPayload, CitationResult};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;
use tracing::debug;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[\[([^\[\]]*)\]\]").expect("citation pattern compiles"))
}

/// One `[[…]]` occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct CitationToken<'a> {
    /// Byte range of the whole token, brackets included
    pub range: Range<usize>,
    /// Text between the brackets
    pub raw: &'a str,
    pub payload: CitationResult<CitationPayload>,
}

/// Every token in `input`, in order
pub fn scan(input: &str) -> Vec<CitationToken<'_>> {
    token_pattern()
        .captures_iter(input)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let raw = caps.get(1)?.as_str();
            Some(CitationToken {
                range: whole.range(),
                raw,
                payload: raw.parse(),
            })
        })
        .collect()
}

/// Text with citations split out
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Citation(CitationPayload),
}

/// Split `input` into text and citations. Malformed tokens vanish and the
/// text around them joins up.
pub fn segments(input: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut text = String::new();
    let mut last = 0;

    for token in scan(input) {
        text.push_str(&input[last..token.range.start]);
        last = token.range.end;
        match token.payload {
            Ok(payload) => {
                if !text.is_empty() {
                    out.push(Segment::Text(std::mem::take(&mut text)));
                }
                out.push(Segment::Citation(payload));
            }
            Err(err) => debug!(token = token.raw, error = %err, "Dropping malformed citation"),
        }
    }
    text.push_str(&input[last..]);
    if !text.is_empty() {
        out.push(Segment::Text(text));
    }
    out
}

/// Replace every token with `render(payload)`. Malformed tokens and
/// payloads `render` declines become the empty string.
pub fn substitute(
    input: &str,
    mut render: impl FnMut(&CitationPayload) -> Option<String>,
) -> String {
    let mut out = String::with_capacity(input.len());
    for segment in segments(input) {
        match segment {
            Segment::Text(text) => out.push_str(&text),
            Segment::Citation(payload) => {
                if let Some(text) = render(&payload) {
                    out.push_str(&text);
                }
            }
        }
    }
    out
}

/// Drop every token, keeping the surrounding text
pub fn strip(input: &str) -> String {
    substitute(input, |_| None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CitationError;

    #[test]
    fn test_scan_finds_tokens_with_ranges() {
        let input = "see [[bogus]] and [[]]";
        let tokens = scan(input);
        assert_eq!(tokens.len(), 2);
        assert_eq!(&input[tokens[0].range.clone()], "[[bogus]]");
        assert_eq!(tokens[0].raw, "bogus");
        assert!(matches!(tokens[0].payload, Err(CitationError::Unrecognized(_))));
        assert_eq!(tokens[1].raw, "");
    }

    #[test]
    fn test_nested_brackets_do_not_match() {
        assert!(scan("[[a[b]]").is_empty());
        assert!(scan("[single]").is_empty());
        assert!(scan("[[open").is_empty());
    }

    #[test]
    fn test_malformed_token_is_empty() {
        assert_eq!(strip("a [[bogus]] b"), "a  b");
        assert_eq!(segments("[[bogus]]"), Vec::new());
        assert_eq!(
            segments("x[[nope]]y"),
            vec![Segment::Text("xy".to_string())]
        );
    }
}
