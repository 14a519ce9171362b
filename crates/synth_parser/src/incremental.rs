//! Incremental tokenizer.
//!
//! [`IncrementalTokenizer`] keeps the previous [`TokenStream`] and, given an
//! [`Edit`], re-lexes only the tokens around it:
//!
//! 1. find the tokens touching the edited byte range (binary search),
//! 2. widen them with the language's safe-boundary hook,
//! 3. re-lex from the first widened token until the new tokens line up with a
//!    shifted old token boundary past the edit (or the input ends),
//! 4. splice `before ++ relexed ++ after` and re-index.

use std::sync::Arc;

use serde::Serialize;
use synth_ast::SourceMap;
use tracing::{debug, warn};

use crate::lexer::{lex_range, tokenize_with};
use crate::{Edit, Lexer, Token, TokenRange, TokenStream};

/// Reuse accounting for one retokenization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetokenizeStats {
    pub total_tokens: usize,
    pub reused_tokens: usize,
    pub new_tokens: usize,
    /// `reused_tokens / total_tokens`, 0 for an empty stream.
    pub reuse_rate: f64,
    pub relexed_bytes: usize,
}

impl RetokenizeStats {
    fn new(total: usize, reused: usize, relexed_bytes: usize) -> Self {
        let reuse_rate = if total == 0 {
            0.0
        } else {
            reused as f64 / total as f64
        };
        Self {
            total_tokens: total,
            reused_tokens: reused,
            new_tokens: total - reused,
            reuse_rate,
            relexed_bytes,
        }
    }

    fn full(total: usize, bytes: usize) -> Self {
        Self::new(total, 0, bytes)
    }
}

/// Result of [`IncrementalTokenizer::retokenize`].
#[derive(Debug, Clone)]
pub struct Retokenized {
    pub stream: Arc<TokenStream>,
    pub stats: RetokenizeStats,
}

/// Tokenizer that reuses the previous stream across edits.
pub struct IncrementalTokenizer {
    lexer: Arc<dyn Lexer>,
    previous: Option<Arc<TokenStream>>,
}

impl IncrementalTokenizer {
    pub fn new(lexer: Arc<dyn Lexer>) -> Self {
        Self {
            lexer,
            previous: None,
        }
    }

    /// Language of the underlying lexer.
    pub fn language(&self) -> &str {
        self.lexer.language()
    }

    /// The stream produced by the last call, if any.
    pub fn previous(&self) -> Option<&Arc<TokenStream>> {
        self.previous.as_ref()
    }

    /// Forgets the previous stream.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Full tokenization. Becomes the baseline for the next edit.
    pub fn tokenize(&mut self, source: &str) -> Arc<TokenStream> {
        let stream = Arc::new(tokenize_with(self.lexer.as_ref(), Arc::from(source)));
        debug!(
            "Tokenized {} bytes of {} into {} tokens",
            source.len(),
            self.lexer.language(),
            stream.len()
        );
        self.previous = Some(Arc::clone(&stream));
        stream
    }

    /// Tokens of the previous stream touching the edited range, as a
    /// half-open index range. `None` without a non-empty previous stream.
    pub fn find_affected_token_range(&self, edit: &Edit) -> Option<TokenRange> {
        let previous = self.previous.as_ref()?;
        affected_range(&previous.tokens, edit)
    }

    /// Tokenizes `new_source`, reusing tokens of the previous stream that the
    /// edit did not touch.
    pub fn retokenize(&mut self, new_source: &str, edit: &Edit) -> Retokenized {
        let Some(previous) = self.previous.clone() else {
            let stream = self.tokenize(new_source);
            let stats = RetokenizeStats::full(stream.len(), new_source.len());
            return Retokenized { stream, stats };
        };

        let consistent = edit.canonicalize(previous.source(), new_source).is_ok();
        let range = affected_range(&previous.tokens, edit);
        let (Some(range), true) = (range, consistent) else {
            if !consistent {
                warn!(
                    "Edit {}..{} -> {} does not match the previous text, tokenizing from scratch",
                    edit.start_byte, edit.old_end_byte, edit.new_end_byte
                );
            }
            let stream = self.tokenize(new_source);
            let stats = RetokenizeStats::full(stream.len(), new_source.len());
            return Retokenized { stream, stats };
        };

        let old = &previous.tokens;
        let widened = self
            .lexer
            .expand_to_safe_boundaries(old, range, edit);
        let widened = TokenRange::new(
            widened.start.min(range.start),
            widened.end.max(range.end).min(old.len()),
        );

        let relex_start = old[widened.start].start() as usize;
        let old_widened_end = old[widened.end - 1].end();
        let min_end = edit.shift(old_widened_end).max(edit.new_end_byte);
        let delta = edit.delta();

        let source: Arc<str> = Arc::from(new_source);
        let map = SourceMap::new(&source);
        let mut resync: Option<usize> = None;
        let relexed = lex_range(
            self.lexer.as_ref(),
            &source,
            &map,
            relex_start,
            widened.start,
            |token| {
                if token.end() < min_end {
                    return false;
                }
                // Stop once a new boundary coincides with an old boundary
                // past the edit: the remaining old tokens are valid as-is.
                let target = i64::from(token.end()) - delta;
                let k = old.partition_point(|t| i64::from(t.end()) < target);
                if old.get(k).is_some_and(|t| i64::from(t.end()) == target)
                    && old[k].end() >= edit.old_end_byte
                {
                    resync = Some(k + 1);
                    return true;
                }
                false
            },
        );

        let tail_start = match resync {
            Some(k) => k,
            None => old.len(),
        };
        let relexed_bytes = relexed
            .last()
            .map(|t| t.end() as usize - relex_start)
            .unwrap_or(0);

        let mut tokens: Vec<Token> =
            Vec::with_capacity(widened.start + relexed.len() + (old.len() - tail_start));
        tokens.extend(old[..widened.start].iter().cloned());
        tokens.extend(relexed);
        let relexed_end = tokens.len();
        for token in &old[tail_start..] {
            let start = edit.shift(token.start());
            let end = edit.shift(token.end());
            let index = tokens.len();
            tokens.push(Token {
                span: map.span(start, end),
                index,
                ..token.clone()
            });
        }

        let reused = widened.start + (tokens.len() - relexed_end);
        let stats = RetokenizeStats::new(tokens.len(), reused, relexed_bytes);
        debug!(
            "Retokenized {}: {} tokens, {} reused ({:.1}%), {} bytes re-lexed",
            self.lexer.language(),
            stats.total_tokens,
            stats.reused_tokens,
            stats.reuse_rate * 100.0,
            stats.relexed_bytes
        );

        let stream = Arc::new(TokenStream::new(tokens, source, self.lexer.language()));
        self.previous = Some(Arc::clone(&stream));
        Retokenized { stream, stats }
    }
}

/// First token ending at or after `start_byte` through the last token
/// starting at or before `old_end_byte`.
fn affected_range(tokens: &[Token], edit: &Edit) -> Option<TokenRange> {
    if tokens.is_empty() {
        return None;
    }
    let first = tokens
        .partition_point(|t| t.end() < edit.start_byte)
        .min(tokens.len() - 1);
    let last = tokens
        .partition_point(|t| t.start() <= edit.old_end_byte)
        .saturating_sub(1)
        .max(first);
    Some(TokenRange::new(first, last + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::apply_edit;
    use crate::lexer::tests::WordLexer;
    use pretty_assertions::assert_eq;

    fn tokenizer() -> IncrementalTokenizer {
        IncrementalTokenizer::new(Arc::new(WordLexer))
    }

    fn check(old: &str, start: u32, end: u32, replacement: &str) -> RetokenizeStats {
        let (new, edit) = apply_edit(old, start, end, replacement).unwrap();
        let mut inc = tokenizer();
        inc.tokenize(old);
        let result = inc.retokenize(&new, &edit);
        let full = tokenize_with(&WordLexer, Arc::from(new.as_str()));
        assert!(
            result.stream.same_tokens(&full),
            "incremental {:?} != full {:?}",
            result.stream.tokens,
            full.tokens
        );
        assert!(result.stream.is_well_formed());
        assert_eq!(result.stats.total_tokens, full.len());
        result.stats
    }

    #[test]
    fn test_retokenize_without_previous_is_full() {
        let mut inc = tokenizer();
        let result = inc.retokenize("a b", &Edit::insert(0, 3));
        assert_eq!(result.stats.reused_tokens, 0);
        assert_eq!(result.stats.reuse_rate, 0.0);
        assert_eq!(result.stream.len(), 3);
        assert!(inc.previous().is_some());
    }

    #[test]
    fn test_replace_word_in_middle() {
        let stats = check("alpha beta gamma delta", 6, 10, "BETA2");
        assert_eq!(stats.total_tokens, 7);
        // "alpha" is re-lexed as the token before the edit, the trailing
        // " delta" is reused.
        assert_eq!(stats.reused_tokens, 2);
        assert!(stats.reuse_rate > 0.0);
    }

    #[test]
    fn test_edits_at_edges() {
        check("alpha beta", 0, 0, "x");
        check("alpha beta", 10, 10, "!");
        check("alpha beta", 0, 10, "");
        check("", 0, 0, "hello world");
        check("alpha beta", 5, 6, "");
        check("a b c d e f", 2, 3, "bb cc");
    }

    #[test]
    fn test_merging_and_splitting_tokens() {
        // Deleting a space merges two words.
        check("one two three", 3, 4, "");
        // Inserting a space splits one.
        check("onetwo three", 3, 3, " ");
        // Inserting at a token boundary extends the token before it.
        check("ab cd", 2, 2, "x");
    }

    #[test]
    fn test_inconsistent_edit_falls_back_to_full() {
        let mut inc = tokenizer();
        inc.tokenize("abc def");
        let result = inc.retokenize("abc xyz!", &Edit::new(4, 7, 7));
        assert_eq!(result.stats.reused_tokens, 0);
        assert_eq!(result.stream.len(), 4);
    }

    #[test]
    fn test_find_affected_token_range() {
        let mut inc = tokenizer();
        assert!(inc.find_affected_token_range(&Edit::insert(0, 1)).is_none());
        inc.tokenize("aa bb cc");
        // "bb" is token 2, the space before ends at 3.
        // The space starting exactly at the old end is included.
        assert_eq!(
            inc.find_affected_token_range(&Edit::new(4, 5, 5)),
            Some(TokenRange::new(2, 4))
        );
        assert_eq!(
            inc.find_affected_token_range(&Edit::new(3, 3, 4)),
            Some(TokenRange::new(1, 3))
        );
        assert_eq!(
            inc.find_affected_token_range(&Edit::new(8, 8, 9)),
            Some(TokenRange::new(4, 5))
        );
    }

    #[test]
    fn test_reuse_rate_on_large_document() {
        let words: Vec<String> = (0..400).map(|i| format!("w{i}")).collect();
        let old = words.join(" ");
        let stats = check(&old, 20, 22, "zz");
        assert!(stats.reuse_rate > 0.95, "reuse rate {}", stats.reuse_rate);
        assert!(stats.relexed_bytes < 40);
    }

    #[test]
    fn test_reset() {
        let mut inc = tokenizer();
        inc.tokenize("x");
        inc.reset();
        assert!(inc.previous().is_none());
        assert_eq!(inc.language(), "words");
    }
}
