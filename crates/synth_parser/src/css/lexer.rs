//! CSS lexer.
//!
//! Stateless: every token is decided by the text from its start plus at most
//! two characters past its end, so lexing can restart at any token boundary.

use crate::{Lexer, RawToken, TokenFlags};

pub const WHITESPACE: &str = "whitespace";
pub const COMMENT: &str = "comment";
pub const STRING: &str = "string";
pub const AT_KEYWORD: &str = "at_keyword";
pub const HASH: &str = "hash";
pub const NUMBER: &str = "number";
pub const IDENT: &str = "ident";
pub const LBRACE: &str = "lbrace";
pub const RBRACE: &str = "rbrace";
pub const LPAREN: &str = "lparen";
pub const RPAREN: &str = "rparen";
pub const COLON: &str = "colon";
pub const SEMICOLON: &str = "semicolon";
pub const COMMA: &str = "comma";
pub const DELIM: &str = "delim";

/// Lexer for CSS stylesheets.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssLexer;

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-'
}

/// End of the run of characters matching `pred`, starting at `offset`.
fn scan_while(source: &str, offset: usize, pred: impl Fn(char) -> bool) -> usize {
    source[offset..]
        .find(|c: char| !pred(c))
        .map_or(source.len(), |i| offset + i)
}

fn char_at(source: &str, offset: usize) -> Option<char> {
    source.get(offset..).and_then(|s| s.chars().next())
}

impl CssLexer {
    fn comment(source: &str, offset: usize) -> RawToken {
        match source[offset + 2..].find("*/") {
            Some(i) => RawToken::trivia(COMMENT, offset + 2 + i + 2),
            None => RawToken::trivia(COMMENT, source.len()).with_flags(TokenFlags::UNTERMINATED),
        }
    }

    fn string(source: &str, offset: usize, quote: char) -> RawToken {
        let mut chars = source[offset + 1..].char_indices();
        while let Some((i, c)) = chars.next() {
            let at = offset + 1 + i;
            match c {
                '\\' => {
                    chars.next();
                }
                '\n' => {
                    return RawToken::new(STRING, at).with_flags(TokenFlags::UNTERMINATED);
                }
                c if c == quote => return RawToken::new(STRING, at + 1),
                _ => {}
            }
        }
        RawToken::new(STRING, source.len()).with_flags(TokenFlags::UNTERMINATED)
    }

    fn number(source: &str, offset: usize) -> RawToken {
        let mut end = scan_while(source, offset, |c| c.is_ascii_digit());
        if char_at(source, end) == Some('.')
            && char_at(source, end + 1).is_some_and(|c| c.is_ascii_digit())
        {
            end = scan_while(source, end + 1, |c| c.is_ascii_digit());
        }
        // Unit or percentage.
        match char_at(source, end) {
            Some('%') => end += 1,
            Some(c) if is_name_start(c) => end = scan_while(source, end, is_name_char),
            _ => {}
        }
        RawToken::new(NUMBER, end)
    }
}

impl Lexer for CssLexer {
    fn language(&self) -> &str {
        "css"
    }

    fn next_token(&self, source: &str, offset: usize) -> RawToken {
        let Some(c) = char_at(source, offset) else {
            return RawToken::new(DELIM, offset + 1);
        };
        let next = char_at(source, offset + c.len_utf8());

        match c {
            c if c.is_whitespace() => {
                RawToken::trivia(WHITESPACE, scan_while(source, offset, char::is_whitespace))
            }
            '/' if next == Some('*') => Self::comment(source, offset),
            '"' | '\'' => Self::string(source, offset, c),
            '{' => RawToken::new(LBRACE, offset + 1),
            '}' => RawToken::new(RBRACE, offset + 1),
            '(' => RawToken::new(LPAREN, offset + 1),
            ')' => RawToken::new(RPAREN, offset + 1),
            ':' => RawToken::new(COLON, offset + 1),
            ';' => RawToken::new(SEMICOLON, offset + 1),
            ',' => RawToken::new(COMMA, offset + 1),
            '@' if next.is_some_and(is_name_start) => {
                RawToken::new(AT_KEYWORD, scan_while(source, offset + 1, is_name_char))
            }
            '#' if next.is_some_and(is_name_char) => {
                RawToken::new(HASH, scan_while(source, offset + 1, is_name_char))
            }
            c if c.is_ascii_digit() => Self::number(source, offset),
            '.' if next.is_some_and(|n| n.is_ascii_digit()) => Self::number(source, offset),
            '-' if next.is_some_and(|n| n.is_ascii_digit()) => Self::number(source, offset + 1),
            '-' if next.is_some_and(|n| is_name_start(n) || n == '-') => {
                RawToken::new(IDENT, scan_while(source, offset + 1, is_name_char))
            }
            c if is_name_start(c) => RawToken::new(IDENT, scan_while(source, offset, is_name_char)),
            c => RawToken::new(DELIM, offset + c.len_utf8()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tokenize_with;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn lex(source: &str) -> Vec<(&'static str, String)> {
        tokenize_with(&CssLexer, Arc::from(source))
            .tokens
            .into_iter()
            .map(|t| (t.kind, t.value))
            .collect()
    }

    #[test]
    fn test_simple_rule() {
        let kinds: Vec<_> = lex("a{color:red}").into_iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![IDENT, LBRACE, IDENT, COLON, IDENT, RBRACE]);
    }

    #[rstest]
    #[case("12px", NUMBER)]
    #[case("1.5em", NUMBER)]
    #[case(".5", NUMBER)]
    #[case("-3%", NUMBER)]
    #[case("-webkit-box", IDENT)]
    #[case("--main-color", IDENT)]
    #[case("#fff", HASH)]
    #[case("@media", AT_KEYWORD)]
    #[case("\"a;b\"", STRING)]
    #[case("/* x */", COMMENT)]
    fn test_single_token(#[case] source: &str, #[case] kind: &str) {
        let tokens = lex(source);
        assert_eq!(tokens.len(), 1, "{tokens:?}");
        assert_eq!(tokens[0].0, kind);
        assert_eq!(tokens[0].1, source);
    }

    #[test]
    fn test_number_does_not_swallow_trailing_dot() {
        let tokens = lex("1.a");
        assert_eq!(
            tokens,
            vec![
                (NUMBER, "1".to_string()),
                (DELIM, ".".to_string()),
                (IDENT, "a".to_string())
            ]
        );
    }

    #[test]
    fn test_unterminated() {
        let stream = tokenize_with(&CssLexer, Arc::from("/* open"));
        assert!(stream.tokens[0].flags.contains(TokenFlags::UNTERMINATED));

        let stream = tokenize_with(&CssLexer, Arc::from("'abc\nx"));
        assert_eq!(stream.tokens[0].value, "'abc");
        assert!(stream.tokens[0].flags.contains(TokenFlags::UNTERMINATED));
        assert!(stream.is_well_formed());
    }

    #[test]
    fn test_escaped_quote_in_string() {
        let tokens = lex(r#"'it\'s'"#);
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn test_non_ascii_identifier() {
        let stream = tokenize_with(&CssLexer, Arc::from(".café{}"));
        assert_eq!(stream.tokens[1].kind, IDENT);
        assert_eq!(stream.tokens[1].value, "café");
        assert!(stream.is_well_formed());
    }
}
