//! Node record recycling.
//!
//! Superseded trees hand their records back to a [`NodePool`] so that the next
//! parse of an edited document reuses the allocations instead of churning
//! through new ones. Pools are owned and injected through [`PoolHandle`];
//! there is no process-wide pool.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::{Node, Tree};

/// Default cap on retained free records.
pub const DEFAULT_MAX_RETAINED: usize = 65_536;

/// Pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Records created because the free list was empty.
    pub allocated: u64,
    /// Records handed out from the free list.
    pub reused: u64,
    /// Records returned to the free list.
    pub released: u64,
    /// Records dropped because the free list was full.
    pub dropped: u64,
}

/// Free list of reset node records.
#[derive(Debug)]
pub struct NodePool {
    free: Vec<Node>,
    max_retained: usize,
    stats: PoolStats,
}

impl NodePool {
    /// Creates an empty pool with the default retention cap.
    pub fn new() -> Self {
        Self::with_max_retained(DEFAULT_MAX_RETAINED)
    }

    /// Creates an empty pool that keeps at most `max_retained` free records.
    pub fn with_max_retained(max_retained: usize) -> Self {
        Self {
            free: Vec::new(),
            max_retained,
            stats: PoolStats::default(),
        }
    }

    /// Takes a reset record from the free list, or allocates one.
    pub fn acquire(&mut self) -> Node {
        match self.free.pop() {
            Some(node) => {
                self.stats.reused += 1;
                node
            }
            None => {
                self.stats.allocated += 1;
                Node::blank()
            }
        }
    }

    /// Resets `node` and returns it to the free list.
    ///
    /// The record is taken by value: a node that is still owned by a live
    /// tree cannot be passed here.
    pub fn release(&mut self, mut node: Node) {
        if self.free.len() >= self.max_retained {
            self.stats.dropped += 1;
            return;
        }
        node.reset();
        self.free.push(node);
        self.stats.released += 1;
    }

    /// Number of records ready for reuse.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Returns the counters.
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Drops every free record.
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

impl Default for NodePool {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to a [`NodePool`].
///
/// Cloning the handle shares the pool. Each engine or session manager owns
/// its own handle.
#[derive(Debug, Clone, Default)]
pub struct PoolHandle(Arc<Mutex<NodePool>>);

impl PoolHandle {
    /// Creates a handle to a fresh pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handle to a fresh pool with a retention cap.
    pub fn with_max_retained(max_retained: usize) -> Self {
        Self(Arc::new(Mutex::new(NodePool::with_max_retained(
            max_retained,
        ))))
    }

    /// Acquires one record.
    pub fn acquire(&self) -> Node {
        self.0.lock().acquire()
    }

    /// Releases one record.
    pub fn release(&self, node: Node) {
        self.0.lock().release(node);
    }

    /// Recycles every record of a superseded tree. Returns the number of
    /// records handed to the pool.
    pub fn release_tree(&self, tree: Tree) -> usize {
        let nodes = tree.into_nodes();
        let count = nodes.len();
        let mut pool = self.0.lock();
        for node in nodes {
            pool.release(node);
        }
        debug!("Released {} node records ({} available)", count, pool.available());
        count
    }

    /// Number of records ready for reuse.
    pub fn available(&self) -> usize {
        self.0.lock().available()
    }

    /// Returns the counters.
    pub fn stats(&self) -> PoolStats {
        self.0.lock().stats()
    }

    /// Returns true if both handles share one pool.
    pub fn same_pool(&self, other: &PoolHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
