//! Update strategy selection.

use serde::Serialize;

use crate::IncrementalConfig;

/// How an update was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Incremental,
    Full,
}

/// Share of tokens touched by an edit. An empty stream counts as fully
/// affected.
pub fn affected_ratio(affected_tokens: usize, total_tokens: usize) -> f64 {
    if total_tokens == 0 {
        1.0
    } else {
        affected_tokens as f64 / total_tokens as f64
    }
}

/// Chooses the incremental path when enough tokens survived the edit, when
/// the edit touched few tokens, or when a large document was touched in less
/// than its larger allowance. Everything else is a full re-parse.
pub fn should_use_incremental(
    config: &IncrementalConfig,
    token_reuse_rate: f64,
    affected_tokens: usize,
    total_tokens: usize,
    document_bytes: usize,
) -> Strategy {
    let ratio = affected_ratio(affected_tokens, total_tokens);
    let incremental = token_reuse_rate > config.reuse_rate_threshold
        || ratio < config.affected_ratio_threshold
        || (document_bytes > config.large_document_bytes
            && ratio < config.large_document_affected_ratio);
    if incremental {
        Strategy::Incremental
    } else {
        Strategy::Full
    }
}
