//! Bounded set of incremental parsing sessions keyed by document uri.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use synth_ast::{PoolHandle, QueryIndex, Tree};
use synth_parser::{Edit, IncrementalLanguage};
use tracing::{debug, info};

use crate::{
    EvictionPolicy, IncrementalConfig, IncrementalError, IncrementalParser, Strategy,
    UpdateStats, Updated,
};

/// Per-session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub parses: u64,
    pub updates: u64,
    pub incremental_updates: u64,
    pub full_reparses: u64,
    /// Mean token reuse rate over all updates.
    pub cumulative_reuse_rate: f64,
}

impl SessionStats {
    fn record(&mut self, stats: &UpdateStats) {
        self.updates += 1;
        match stats.strategy {
            Strategy::Incremental => self.incremental_updates += 1,
            Strategy::Full => self.full_reparses += 1,
        }
        let n = self.updates as f64;
        self.cumulative_reuse_rate += (stats.token_reuse_rate - self.cumulative_reuse_rate) / n;
    }
}

/// One open document.
pub struct Session {
    parser: IncrementalParser,
    stats: SessionStats,
}

impl Session {
    pub fn parser(&self) -> &IncrementalParser {
        &self.parser
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }
}

/// Open sessions, capped at [`IncrementalConfig::max_sessions`].
///
/// When a new session would exceed the cap, one session is closed first.
/// With [`EvictionPolicy::Insertion`] that is the session opened earliest,
/// however recently it was used. With [`EvictionPolicy::Lru`] every access
/// through this manager moves a session to the back of the queue.
pub struct SessionManager {
    config: IncrementalConfig,
    pool: Option<PoolHandle>,
    sessions: IndexMap<String, Session>,
}

impl SessionManager {
    pub fn new(config: IncrementalConfig, pool: Option<PoolHandle>) -> Self {
        Self {
            config,
            pool,
            sessions: IndexMap::new(),
        }
    }

    /// Parses `text` into a new session for `uri`, replacing any session
    /// already open under that uri.
    pub fn open(
        &mut self,
        uri: impl Into<String>,
        language: Arc<dyn IncrementalLanguage>,
        text: &str,
    ) -> Result<&Tree, IncrementalError> {
        let uri = uri.into();
        let mut parser = IncrementalParser::new(language, self.config.clone(), self.pool.clone());
        parser.parse(text)?;

        if let Some(previous) = self.sessions.shift_remove(&uri) {
            self.retire(previous);
        } else {
            let cap = self.config.max_sessions.max(1);
            while self.sessions.len() >= cap {
                let Some((evicted, session)) = self.sessions.shift_remove_index(0) else {
                    break;
                };
                info!("Session limit {} reached, closing {}", cap, evicted);
                self.retire(session);
            }
        }
        debug!("Opened session {} ({})", uri, parser.language());
        let stats = SessionStats {
            parses: 1,
            ..Default::default()
        };
        let (index, _) = self.sessions.insert_full(uri, Session { parser, stats });
        self.sessions[index].parser.tree()
    }

    /// Applies an edit to an open session.
    pub fn update(
        &mut self,
        uri: &str,
        new_text: &str,
        edit: &Edit,
    ) -> Result<Updated<'_>, IncrementalError> {
        let session = self.touch(uri)?;
        let updated = session.parser.update(new_text, edit)?;
        session.stats.record(&updated.stats);
        Ok(updated)
    }

    /// Applies a whole-text change to an open session.
    pub fn update_text(&mut self, uri: &str, new_text: &str) -> Result<Updated<'_>, IncrementalError> {
        let session = self.touch(uri)?;
        let updated = session.parser.update_text(new_text)?;
        session.stats.record(&updated.stats);
        Ok(updated)
    }

    /// Closes a session, returning its tree to the pool.
    pub fn close(&mut self, uri: &str) -> Result<(), IncrementalError> {
        let session = self
            .sessions
            .shift_remove(uri)
            .ok_or_else(|| IncrementalError::session_not_found(uri))?;
        debug!("Closed session {}", uri);
        self.retire(session);
        Ok(())
    }

    fn retire(&self, session: Session) {
        if let (Some(pool), Some(tree)) = (&self.pool, session.parser.into_tree()) {
            pool.release_tree(tree);
        }
    }

    /// Replaces a session's tree; see [`IncrementalParser::set_tree`].
    pub fn set_tree(&mut self, uri: &str, tree: Tree) -> Result<&Tree, IncrementalError> {
        self.touch(uri)?.parser.set_tree(tree)
    }

    pub fn get(&mut self, uri: &str) -> Result<&Session, IncrementalError> {
        self.touch(uri).map(|s| &*s)
    }

    pub fn tree(&mut self, uri: &str) -> Result<&Tree, IncrementalError> {
        self.touch(uri)?.parser.tree()
    }

    /// Query index of a session's current tree, built on first use.
    pub fn index(&mut self, uri: &str) -> Result<&QueryIndex, IncrementalError> {
        self.touch(uri)?.parser.index()
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.sessions.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Open uris, next eviction candidate first.
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(String::as_str)
    }

    fn touch(&mut self, uri: &str) -> Result<&mut Session, IncrementalError> {
        let mut index = self
            .sessions
            .get_index_of(uri)
            .ok_or_else(|| IncrementalError::session_not_found(uri))?;
        if self.config.eviction == EvictionPolicy::Lru {
            let last = self.sessions.len() - 1;
            self.sessions.move_index(index, last);
            index = last;
        }
        Ok(&mut self.sessions[index])
    }
}
