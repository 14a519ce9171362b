//! Per-document incremental parser.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use synth_ast::{NodeId, PoolHandle, QueryIndex, Tree};
use synth_parser::{
    BuildContext, Edit, IncrementalLanguage, IncrementalTokenizer, RetokenizeStats, TokenStream,
};
use tracing::{debug, info, warn};

use crate::{IncrementalConfig, IncrementalError, Strategy, should_use_incremental};

/// Lifecycle of an [`IncrementalParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserState {
    Uninitialized,
    Parsed,
    Updated,
}

/// Accounting for one call to [`IncrementalParser::update`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStats {
    pub strategy: Strategy,
    pub token_reuse_rate: f64,
    /// Tokens of the new stream touching the edited range.
    pub affected_tokens: usize,
    pub total_tokens: usize,
    pub total_nodes: usize,
    /// `total_nodes * (1 - affected_tokens / total_tokens)` on the
    /// incremental path, 0 on the full path.
    pub estimated_reused_nodes: usize,
    /// Nodes in top-level subtrees outside the edit that came out identical
    /// to the previous tree, after shifting spans. 0 on the full path.
    pub measured_reused_nodes: usize,
    pub retokenize: RetokenizeStats,
    pub elapsed: Duration,
}

impl UpdateStats {
    fn full_parse(tokens: &TokenStream, tree: &Tree, elapsed: Duration) -> Self {
        Self {
            strategy: Strategy::Full,
            token_reuse_rate: 0.0,
            affected_tokens: tokens.len(),
            total_tokens: tokens.len(),
            total_nodes: tree.node_count(),
            estimated_reused_nodes: 0,
            measured_reused_nodes: 0,
            retokenize: RetokenizeStats {
                total_tokens: tokens.len(),
                new_tokens: tokens.len(),
                relexed_bytes: tokens.source().len(),
                ..Default::default()
            },
            elapsed,
        }
    }
}

/// Result of [`IncrementalParser::update`].
#[derive(Debug)]
pub struct Updated<'a> {
    pub tree: &'a Tree,
    pub stats: UpdateStats,
}

/// Keeps the text, tokens and tree of one document and applies edits to
/// them.
///
/// Every update re-runs the language's tree builder over the whole token
/// stream. What the incremental path saves is lexing: only tokens around the
/// edit are re-lexed. [`UpdateStats`] reports how much of the tree an
/// incremental builder could have kept, both estimated and measured.
pub struct IncrementalParser {
    language: Arc<dyn IncrementalLanguage>,
    config: IncrementalConfig,
    context: BuildContext,
    tokenizer: IncrementalTokenizer,
    state: ParserState,
    tree: Option<Tree>,
    index: OnceLock<QueryIndex>,
    last_stats: Option<UpdateStats>,
}

impl IncrementalParser {
    /// Creates a parser for one document. When `pool` is given, new trees
    /// draw node records from it and superseded trees are returned to it.
    pub fn new(
        language: Arc<dyn IncrementalLanguage>,
        config: IncrementalConfig,
        pool: Option<PoolHandle>,
    ) -> Self {
        let tokenizer = IncrementalTokenizer::new(language.lexer());
        let context = match pool {
            Some(pool) => BuildContext::with_pool(pool),
            None => BuildContext::new(),
        };
        Self {
            language,
            config,
            context,
            tokenizer,
            state: ParserState::Uninitialized,
            tree: None,
            index: OnceLock::new(),
            last_stats: None,
        }
    }

    pub fn language(&self) -> &str {
        self.language.name()
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn config(&self) -> &IncrementalConfig {
        &self.config
    }

    /// Tokenizes and builds `text` from scratch. The result becomes the
    /// baseline for later updates.
    pub fn parse(&mut self, text: &str) -> Result<&Tree, IncrementalError> {
        let started = Instant::now();
        let tokens = self.tokenizer.tokenize(text);
        let tree = self.language.build(&tokens, &self.context)?;
        info!(
            "Parsed {} bytes of {}: {} tokens, {} nodes in {:?}",
            text.len(),
            self.language.name(),
            tokens.len(),
            tree.node_count(),
            started.elapsed()
        );
        self.last_stats = Some(UpdateStats::full_parse(&tokens, &tree, started.elapsed()));
        self.replace_tree(tree);
        self.state = ParserState::Parsed;
        self.tree()
    }

    /// Applies `edit`, which turned the current text into `new_text`.
    ///
    /// Without a previous parse this is a plain [`IncrementalParser::parse`].
    /// An edit that does not match the two texts is replaced by the edit
    /// detected from their common prefix and suffix.
    pub fn update(&mut self, new_text: &str, edit: &Edit) -> Result<Updated<'_>, IncrementalError> {
        let Some(previous) = self.tokenizer.previous().cloned() else {
            debug!("Update before parse, parsing {} from scratch", self.language.name());
            self.parse(new_text)?;
            return self.updated();
        };

        let started = Instant::now();
        let edit = match edit.canonicalize(previous.source(), new_text) {
            Ok(edit) => edit,
            Err(e) => {
                warn!("{}; detecting the edit from the texts instead", e);
                Edit::diff(previous.source(), new_text)
            }
        };

        let result = self.tokenizer.retokenize(new_text, &edit);
        let affected = detect_affected_nodes(&result.stream, &edit);
        let total = result.stream.len();
        let strategy = should_use_incremental(
            &self.config,
            result.stats.reuse_rate,
            affected.len(),
            total,
            new_text.len(),
        );

        let tree = match strategy {
            Strategy::Incremental => self.language.build(&result.stream, &self.context)?,
            Strategy::Full => {
                let tokens = self.tokenizer.tokenize(new_text);
                self.language.build(&tokens, &self.context)?
            }
        };

        let total_nodes = tree.node_count();
        let (estimated, measured) = match (strategy, self.tree.as_ref()) {
            (Strategy::Incremental, Some(old)) => {
                let unaffected = 1.0 - crate::strategy::affected_ratio(affected.len(), total);
                (
                    (total_nodes as f64 * unaffected).floor() as usize,
                    count_reused_nodes(old, &tree, &edit),
                )
            }
            _ => (0, 0),
        };

        let stats = UpdateStats {
            strategy,
            token_reuse_rate: result.stats.reuse_rate,
            affected_tokens: affected.len(),
            total_tokens: total,
            total_nodes,
            estimated_reused_nodes: estimated,
            measured_reused_nodes: measured,
            retokenize: result.stats,
            elapsed: started.elapsed(),
        };
        debug!(
            "Updated {} ({:?}): reuse {:.2}, {}/{} tokens affected, ~{} nodes reusable",
            self.language.name(),
            stats.strategy,
            stats.token_reuse_rate,
            stats.affected_tokens,
            stats.total_tokens,
            stats.estimated_reused_nodes
        );

        self.last_stats = Some(stats);
        self.replace_tree(tree);
        self.state = ParserState::Updated;
        self.updated()
    }

    /// Like [`IncrementalParser::update`], detecting the edit from the
    /// current and new text.
    pub fn update_text(&mut self, new_text: &str) -> Result<Updated<'_>, IncrementalError> {
        let edit = match self.tokenizer.previous() {
            Some(previous) => Edit::diff(previous.source(), new_text),
            None => Edit::new(0, 0, new_text.len() as u32),
        };
        self.update(new_text, &edit)
    }

    fn updated(&self) -> Result<Updated<'_>, IncrementalError> {
        let stats = self
            .last_stats
            .clone()
            .ok_or_else(|| IncrementalError::tree_structure("no update has been applied"))?;
        Ok(Updated {
            tree: self.tree()?,
            stats,
        })
    }

    /// Replaces the current tree with a transformed version of it, such as
    /// the output of a plugin pipeline.
    ///
    /// The token stream is kept, so `tree` must have been built from the
    /// current text.
    pub fn set_tree(&mut self, tree: Tree) -> Result<&Tree, IncrementalError> {
        if tree.source() != self.text()? {
            return Err(IncrementalError::tree_structure(
                "replacement tree was built from a different text",
            ));
        }
        self.replace_tree(tree);
        self.tree()
    }

    fn replace_tree(&mut self, tree: Tree) {
        self.index = OnceLock::new();
        if let Some(old) = self.tree.replace(tree)
            && let Some(pool) = self.context.pool()
        {
            pool.release_tree(old);
        }
    }

    /// The current tree.
    pub fn tree(&self) -> Result<&Tree, IncrementalError> {
        self.tree
            .as_ref()
            .ok_or_else(|| IncrementalError::tree_structure("call parse() before reading the tree"))
    }

    /// The current token stream.
    pub fn tokens(&self) -> Result<&Arc<TokenStream>, IncrementalError> {
        self.tokenizer
            .previous()
            .ok_or_else(|| IncrementalError::tree_structure("call parse() before reading tokens"))
    }

    /// The current text.
    pub fn text(&self) -> Result<&str, IncrementalError> {
        Ok(self.tokens()?.source())
    }

    /// Query index of the current tree, built on first use.
    pub fn index(&self) -> Result<&QueryIndex, IncrementalError> {
        let tree = self
            .tree
            .as_ref()
            .ok_or_else(|| IncrementalError::tree_structure("call parse() before querying"))?;
        Ok(self.index.get_or_init(|| QueryIndex::build(tree)))
    }

    /// Gives up the current tree, if any.
    pub fn into_tree(self) -> Option<Tree> {
        self.tree
    }

    /// Stats of the most recent parse or update.
    pub fn stats(&self) -> Option<&UpdateStats> {
        self.last_stats.as_ref()
    }
}

/// Indices of tokens in `stream` intersecting the closed range
/// `edit.start_byte..=edit.new_end_byte`.
pub fn detect_affected_nodes(stream: &TokenStream, edit: &Edit) -> Vec<usize> {
    let (start, end) = (edit.start_byte, edit.new_end_byte);
    let first = stream.tokens.partition_point(|t| t.end() < start);
    stream.tokens[first..]
        .iter()
        .take_while(|t| t.start() <= end)
        .map(|t| t.index)
        .collect()
}

/// Counts nodes of top-level subtrees in `new` that lie outside the edit and
/// match a subtree of `old` once spans after the edit are shifted back.
fn count_reused_nodes(old: &Tree, new: &Tree, edit: &Edit) -> usize {
    let delta = edit.delta();
    let mut reused = 0;
    let old_children = old.children(old.root());
    for &id in new.children(new.root()) {
        let Some(node) = new.get(id) else { continue };
        let (start, end) = (node.span.start.offset, node.span.end.offset);
        let shift = if end <= edit.start_byte {
            0
        } else if start >= edit.new_end_byte {
            delta
        } else {
            continue;
        };
        let old_start = i64::from(start) - shift;
        let Some(&candidate) = old_children
            .iter()
            .find(|&&c| old.get(c).is_some_and(|n| i64::from(n.span.start.offset) == old_start))
        else {
            continue;
        };
        if let Some(count) = same_subtree(old, candidate, new, id, shift) {
            reused += count;
        }
    }
    reused
}

/// Node count of the subtree if both sides match, `None` otherwise.
fn same_subtree(old: &Tree, a: NodeId, new: &Tree, b: NodeId, shift: i64) -> Option<usize> {
    let (left, right) = (old.get(a)?, new.get(b)?);
    let shifted = |offset: u32| i64::from(offset) + shift;
    if old.kind_of(left) != new.kind_of(right)
        || shifted(left.span.start.offset) != i64::from(right.span.start.offset)
        || shifted(left.span.end.offset) != i64::from(right.span.end.offset)
        || left.children.len() != right.children.len()
        || left.merged_data() != right.merged_data()
    {
        return None;
    }
    let mut count = 1;
    for (&x, &y) in left.children.iter().zip(&right.children) {
        count += same_subtree(old, x, new, y, shift)?;
    }
    Some(count)
}
