//! Block-level Markdown lexer.
//!
//! Every token starts at a line start and ends after a newline (or at the end
//! of input). Blank lines are the restart points for incremental lexing.

use crate::{Edit, Lexer, RawToken, Token, TokenFlags, TokenRange};

pub const BLANK_LINE: &str = "blank_line";
pub const HEADING: &str = "heading";
pub const THEMATIC_BREAK: &str = "thematic_break";
pub const CODE_FENCE: &str = "code_fence";
pub const BLOCKQUOTE: &str = "blockquote";
pub const LIST_ITEM: &str = "list_item";
pub const PARAGRAPH: &str = "paragraph";

/// What a single line starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Line {
    Blank,
    Heading { depth: u8 },
    ThematicBreak,
    Fence { marker: char, len: usize },
    Blockquote,
    ListItem,
    Text,
}

/// Byte offset just past the line starting at `offset`.
pub(crate) fn line_end(source: &str, offset: usize) -> usize {
    source[offset..]
        .find('\n')
        .map_or(source.len(), |i| offset + i + 1)
}

/// The line starting at `offset`, without its line terminator.
pub(crate) fn line_at(source: &str, offset: usize) -> &str {
    let end = line_end(source, offset);
    source[offset..end].trim_end_matches(['\n', '\r'])
}

/// Number of leading spaces, if at most three.
pub(crate) fn indent(line: &str) -> Option<usize> {
    let n = line.bytes().take_while(|&b| b == b' ').count();
    (n <= 3 && !line[n..].starts_with('\t')).then_some(n)
}

/// Length of a list marker including the space after it, and whether it is
/// ordered.
pub(crate) fn list_marker(rest: &str) -> Option<(usize, bool)> {
    let bytes = rest.as_bytes();
    let followed_by_space = |i: usize| matches!(bytes.get(i).copied(), Some(b' ' | b'\t'));
    match *bytes.first()? {
        b'-' | b'*' | b'+' if followed_by_space(1) => Some((2, false)),
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            let delim = *bytes.get(digits)?;
            (digits <= 9 && matches!(delim, b'.' | b')') && followed_by_space(digits + 1))
                .then_some((digits + 2, true))
        }
        _ => None,
    }
}

pub(crate) fn classify(line: &str) -> Line {
    if line.trim().is_empty() {
        return Line::Blank;
    }
    let Some(n) = indent(line) else {
        return Line::Text;
    };
    let rest = &line[n..];

    let hashes = rest.bytes().take_while(|&b| b == b'#').count();
    if (1..=6).contains(&hashes) && matches!(rest.as_bytes().get(hashes).copied(), None | Some(b' ' | b'\t')) {
        return Line::Heading {
            depth: hashes as u8,
        };
    }

    if let Some(marker) = rest.chars().next().filter(|&c| matches!(c, '`' | '~')) {
        let len = rest.chars().take_while(|&c| c == marker).count();
        if len >= 3 {
            return Line::Fence { marker, len };
        }
    }

    let mut marks = rest.chars().filter(|&c| !matches!(c, ' ' | '\t'));
    if let Some(first @ ('-' | '*' | '_')) = marks.next() {
        let count = 1 + marks.clone().count();
        if count >= 3 && marks.all(|c| c == first) {
            return Line::ThematicBreak;
        }
    }

    if rest.starts_with('>') {
        return Line::Blockquote;
    }
    if list_marker(rest).is_some() {
        return Line::ListItem;
    }
    Line::Text
}

/// Returns true if `line` closes a fence opened with `len` `marker`s.
pub(crate) fn closes_fence(line: &str, marker: char, len: usize) -> bool {
    let Some(n) = indent(line) else {
        return false;
    };
    let rest = &line[n..];
    let run = rest.chars().take_while(|&c| c == marker).count();
    run >= len && rest[run * marker.len_utf8()..].trim().is_empty()
}

/// Lexer for Markdown block structure.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownLexer;

impl MarkdownLexer {
    /// Extends past following lines while `keep` accepts them.
    fn consume_lines(source: &str, mut end: usize, keep: impl Fn(&str) -> bool) -> usize {
        while end < source.len() && keep(line_at(source, end)) {
            end = line_end(source, end);
        }
        end
    }

    fn fence(source: &str, offset: usize, marker: char, len: usize) -> RawToken {
        let mut end = line_end(source, offset);
        while end < source.len() {
            let next = line_end(source, end);
            if closes_fence(line_at(source, end), marker, len) {
                return RawToken::new(CODE_FENCE, next);
            }
            end = next;
        }
        RawToken::new(CODE_FENCE, source.len()).with_flags(TokenFlags::UNTERMINATED)
    }
}

impl Lexer for MarkdownLexer {
    fn language(&self) -> &str {
        "markdown"
    }

    fn next_token(&self, source: &str, offset: usize) -> RawToken {
        let first_end = line_end(source, offset);
        match classify(line_at(source, offset)) {
            Line::Blank => RawToken::trivia(BLANK_LINE, first_end),
            Line::Heading { .. } => RawToken::new(HEADING, first_end),
            Line::ThematicBreak => RawToken::new(THEMATIC_BREAK, first_end),
            Line::Fence { marker, len } => Self::fence(source, offset, marker, len),
            Line::Blockquote => RawToken::new(
                BLOCKQUOTE,
                Self::consume_lines(source, first_end, |l| classify(l) == Line::Blockquote),
            ),
            Line::ListItem => RawToken::new(
                LIST_ITEM,
                Self::consume_lines(source, first_end, |l| {
                    !l.trim().is_empty() && (l.starts_with("  ") || l.starts_with('\t'))
                }),
            ),
            Line::Text => RawToken::new(
                PARAGRAPH,
                Self::consume_lines(source, first_end, |l| classify(l) == Line::Text),
            ),
        }
    }

    /// Widens to the blank lines around the affected tokens.
    fn expand_to_safe_boundaries(&self, tokens: &[Token], range: TokenRange, _edit: &Edit) -> TokenRange {
        let end = range.end.min(tokens.len());
        let start = tokens[..range.start.min(end)]
            .iter()
            .rposition(|t| t.kind == BLANK_LINE)
            .unwrap_or(0);
        let end = tokens[end..]
            .iter()
            .position(|t| t.kind == BLANK_LINE)
            .map_or(tokens.len(), |i| end + i + 1);
        TokenRange::new(start, end)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tokenize_with;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn kinds(source: &str) -> Vec<&'static str> {
        let stream = tokenize_with(&MarkdownLexer, Arc::from(source));
        assert!(stream.is_well_formed());
        stream.iter().map(|t| t.kind).collect()
    }

    #[rstest]
    #[case("", Line::Blank)]
    #[case("   \t", Line::Blank)]
    #[case("# Title", Line::Heading { depth: 1 })]
    #[case("###### six", Line::Heading { depth: 6 })]
    #[case("#", Line::Heading { depth: 1 })]
    #[case("####### seven", Line::Text)]
    #[case("#hashtag", Line::Text)]
    #[case("```rust", Line::Fence { marker: '`', len: 3 })]
    #[case("~~~~", Line::Fence { marker: '~', len: 4 })]
    #[case("``", Line::Text)]
    #[case("---", Line::ThematicBreak)]
    #[case(" * * *", Line::ThematicBreak)]
    #[case("- - -", Line::ThematicBreak)]
    #[case("> quote", Line::Blockquote)]
    #[case("- item", Line::ListItem)]
    #[case("12. item", Line::ListItem)]
    #[case("3) item", Line::ListItem)]
    #[case("-item", Line::Text)]
    #[case("    indented", Line::Text)]
    fn test_classify(#[case] line: &str, #[case] expected: Line) {
        assert_eq!(classify(line), expected);
    }

    #[test]
    fn test_block_tokens() {
        let source = "# Title\n\nSome text\nmore text\n\n```js\nlet a;\n\n```\n- [x] done\n  continued\n> quote\n> more\n---\n";
        assert_eq!(
            kinds(source),
            vec![
                HEADING,
                BLANK_LINE,
                PARAGRAPH,
                BLANK_LINE,
                CODE_FENCE,
                LIST_ITEM,
                BLOCKQUOTE,
                THEMATIC_BREAK
            ]
        );
    }

    #[test]
    fn test_unterminated_fence() {
        let stream = tokenize_with(&MarkdownLexer, Arc::from("```\ncode\n\nmore"));
        assert_eq!(stream.len(), 1);
        assert!(stream.tokens[0].flags.contains(TokenFlags::UNTERMINATED));
    }

    #[test]
    fn test_paragraph_interrupted_by_heading() {
        assert_eq!(kinds("text\n# h\ntext"), vec![PARAGRAPH, HEADING, PARAGRAPH]);
    }

    #[test]
    fn test_crlf_lines() {
        assert_eq!(kinds("# a\r\n\r\nb\r\n"), vec![HEADING, BLANK_LINE, PARAGRAPH]);
    }

    #[test]
    fn test_expansion_reaches_blank_lines() {
        let stream = tokenize_with(&MarkdownLexer, Arc::from("a\n\n# b\nc\n> d\n\ne\n"));
        // paragraph, blank, heading, paragraph, blockquote, blank, paragraph
        let widened = MarkdownLexer.expand_to_safe_boundaries(
            &stream.tokens,
            TokenRange::new(3, 4),
            &Edit::default(),
        );
        assert_eq!(widened, TokenRange::new(1, 6));

        let all = MarkdownLexer.expand_to_safe_boundaries(
            &stream.tokens,
            TokenRange::new(0, 1),
            &Edit::default(),
        );
        assert_eq!(all, TokenRange::new(0, 2));
    }
}
