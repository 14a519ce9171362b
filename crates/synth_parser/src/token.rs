//! Token and token stream types.

use std::sync::Arc;

use bitflags::bitflags;
use synth_ast::{Attrs, Span};

bitflags! {
    /// Lexical flags attached to a token.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TokenFlags: u8 {
        /// Whitespace, comments and blank lines.
        const TRIVIA = 1 << 0;
        /// A string, comment or fence that reached end of input unclosed.
        const UNTERMINATED = 1 << 1;
    }
}

/// The smallest lexical unit of a language.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: &'static str,
    /// Source substring covered by the token.
    pub value: String,
    pub span: Span,
    /// Position in the stream. Always `0..n-1` in source order.
    pub index: usize,
    pub flags: TokenFlags,
    pub metadata: Attrs,
}

impl Token {
    /// Start byte offset.
    #[inline]
    pub fn start(&self) -> u32 {
        self.span.start.offset
    }

    /// End byte offset (exclusive).
    #[inline]
    pub fn end(&self) -> u32 {
        self.span.end.offset
    }

    #[inline]
    pub fn is_trivia(&self) -> bool {
        self.flags.contains(TokenFlags::TRIVIA)
    }

    /// Returns true if both tokens have the same kind and text.
    pub fn same_lexeme(&self, other: &Token) -> bool {
        self.kind == other.kind && self.value == other.value
    }
}

/// Tokens of one source text, in source order.
#[derive(Debug, Clone)]
pub struct TokenStream {
    pub tokens: Vec<Token>,
    pub source: Arc<str>,
    pub language: String,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>, source: Arc<str>, language: impl Into<String>) -> Self {
        Self {
            tokens,
            source,
            language: language.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Tokens that are not trivia.
    pub fn significant(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|t| !t.is_trivia())
    }

    /// Compares kinds, values and spans of two streams.
    pub fn same_tokens(&self, other: &TokenStream) -> bool {
        self.tokens.len() == other.tokens.len()
            && self
                .tokens
                .iter()
                .zip(&other.tokens)
                .all(|(a, b)| a.same_lexeme(b) && a.span == b.span)
    }

    /// Returns true if indices run `0..n-1` and spans are contiguous.
    pub fn is_well_formed(&self) -> bool {
        let mut expected_start = 0;
        for (i, token) in self.tokens.iter().enumerate() {
            if token.index != i || token.start() != expected_start || token.end() < token.start() {
                return false;
            }
            expected_start = token.end();
        }
        expected_start as usize == self.source.len()
    }
}

impl<'a> IntoIterator for &'a TokenStream {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synth_ast::SourceMap;

    fn token(kind: &'static str, value: &str, start: u32, index: usize) -> Token {
        let map = SourceMap::new("ab c");
        Token {
            kind,
            value: value.to_string(),
            span: map.span(start, start + value.len() as u32),
            index,
            flags: if kind == "ws" {
                TokenFlags::TRIVIA
            } else {
                TokenFlags::empty()
            },
            metadata: Attrs::new(),
        }
    }

    fn stream() -> TokenStream {
        TokenStream::new(
            vec![
                token("ident", "ab", 0, 0),
                token("ws", " ", 2, 1),
                token("ident", "c", 3, 2),
            ],
            Arc::from("ab c"),
            "test",
        )
    }

    #[test]
    fn test_well_formed() {
        let s = stream();
        assert!(s.is_well_formed());
        assert_eq!(s.significant().count(), 2);

        let mut broken = stream();
        broken.tokens[2].index = 5;
        assert!(!broken.is_well_formed());

        let mut gap = stream();
        gap.tokens.remove(1);
        gap.tokens[1].index = 1;
        assert!(!gap.is_well_formed());
    }

    #[test]
    fn test_same_tokens() {
        assert!(stream().same_tokens(&stream()));
        let mut other = stream();
        other.tokens[2].value = "d".into();
        assert!(!stream().same_tokens(&other));
    }

    #[test]
    fn test_flags() {
        let flags = TokenFlags::TRIVIA | TokenFlags::UNTERMINATED;
        assert!(flags.contains(TokenFlags::TRIVIA));
        assert!(token("ws", " ", 2, 1).is_trivia());
        assert!(!token("ident", "c", 3, 2).is_trivia());
    }
}
