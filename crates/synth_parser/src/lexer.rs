//! Per-language lexer contract.

use std::sync::Arc;

use synth_ast::{Attrs, SourceMap};

use crate::{Edit, Token, TokenFlags, TokenStream};

/// A token produced by [`Lexer::next_token`] before positions are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawToken {
    pub kind: &'static str,
    /// End byte offset (exclusive).
    pub end: usize,
    pub flags: TokenFlags,
}

impl RawToken {
    pub const fn new(kind: &'static str, end: usize) -> Self {
        Self {
            kind,
            end,
            flags: TokenFlags::empty(),
        }
    }

    pub const fn trivia(kind: &'static str, end: usize) -> Self {
        Self {
            kind,
            end,
            flags: TokenFlags::TRIVIA,
        }
    }

    pub const fn with_flags(mut self, flags: TokenFlags) -> Self {
        self.flags = self.flags.union(flags);
        self
    }
}

/// Half-open range of token indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenRange {
    pub start: usize,
    pub end: usize,
}

impl TokenRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Lexer for one language.
///
/// `next_token` must be a pure function of the source text from `offset`
/// onward: the incremental tokenizer restarts lexing at old token
/// boundaries and relies on that to reuse untouched tokens.
pub trait Lexer: Send + Sync {
    /// Language name.
    fn language(&self) -> &str;

    /// Lexes the token starting at `offset`, which is a char boundary below
    /// `source.len()`. The returned end must be greater than `offset`.
    fn next_token(&self, source: &str, offset: usize) -> RawToken;

    /// Widens the affected token range to positions where lexing can restart
    /// independently. Re-lexing the returned range in isolation must produce
    /// the same tokens a full tokenize would.
    ///
    /// The default backs off one token on each side, which is sufficient for
    /// lexers whose tokens look at most one token ahead.
    fn expand_to_safe_boundaries(&self, tokens: &[Token], range: TokenRange, _edit: &Edit) -> TokenRange {
        TokenRange::new(
            range.start.saturating_sub(1),
            (range.end + 1).min(tokens.len()),
        )
    }
}

/// Lexes `source[start..]` until `stop` returns true for a produced token or
/// the input ends. Indices start at `first_index`.
pub(crate) fn lex_range(
    lexer: &dyn Lexer,
    source: &str,
    map: &SourceMap,
    start: usize,
    first_index: usize,
    mut stop: impl FnMut(&Token) -> bool,
) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut offset = start;
    while offset < source.len() {
        let raw = lexer.next_token(source, offset);
        let mut end = raw.end.min(source.len());
        if end <= offset {
            end = offset + 1;
        }
        while !source.is_char_boundary(end) {
            end += 1;
        }
        let token = Token {
            kind: raw.kind,
            value: source[offset..end].to_string(),
            span: map.span(offset as u32, end as u32),
            index: first_index + tokens.len(),
            flags: raw.flags,
            metadata: Attrs::new(),
        };
        offset = end;
        let done = stop(&token);
        tokens.push(token);
        if done {
            break;
        }
    }
    tokens
}

/// Full tokenization of `source`.
pub fn tokenize_with(lexer: &dyn Lexer, source: Arc<str>) -> TokenStream {
    let map = SourceMap::new(&source);
    let tokens = lex_range(lexer, &source, &map, 0, 0, |_| false);
    TokenStream::new(tokens, source, lexer.language())
}
