//! Snapshot query index over a tree.
//!
//! An index is built in one pass and answers type and offset queries. It does
//! not follow later mutations of the tree: [`QueryIndex::is_stale`] reports
//! when the tree has changed since the build.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{NodeId, Tree};

/// Type and position lookups for one tree generation.
#[derive(Debug, Clone)]
pub struct QueryIndex {
    by_type: FxHashMap<String, Vec<NodeId>>,
    /// Sorted segment start offsets. Segment `i` covers
    /// `bounds[i]..bounds[i + 1]`.
    bounds: Vec<u32>,
    /// Innermost node for each segment.
    owners: Vec<Option<NodeId>>,
    generation: u64,
    node_count: usize,
}

impl QueryIndex {
    /// Builds the index for every node reachable from the root.
    pub fn build(tree: &Tree) -> Self {
        let order = tree.preorder(tree.root());

        let mut by_type: FxHashMap<String, Vec<NodeId>> = FxHashMap::default();
        let mut bounds = Vec::with_capacity(order.len() * 2);
        for &id in &order {
            let Some(node) = tree.get(id) else { continue };
            by_type
                .entry(tree.kind_of(node).to_string())
                .or_default()
                .push(id);
            if !node.span.is_empty() {
                bounds.push(node.span.start.offset);
                bounds.push(node.span.end.offset);
            }
        }
        bounds.sort_unstable();
        bounds.dedup();

        // Preorder visits parents before children, so a later write to a
        // segment always comes from a node nested at least as deep.
        let mut owners = vec![None; bounds.len()];
        for &id in &order {
            let Some(node) = tree.get(id) else { continue };
            if node.span.is_empty() {
                continue;
            }
            let first = bounds.partition_point(|&b| b < node.span.start.offset);
            let last = bounds.partition_point(|&b| b < node.span.end.offset);
            for owner in &mut owners[first..last] {
                *owner = Some(id);
            }
        }

        debug!(
            "Built query index: {} nodes, {} types, {} segments",
            order.len(),
            by_type.len(),
            bounds.len().saturating_sub(1)
        );

        Self {
            by_type,
            bounds,
            owners,
            generation: tree.generation(),
            node_count: order.len(),
        }
    }

    /// Nodes of the given type in document order.
    pub fn find_by_type(&self, kind: &str) -> &[NodeId] {
        self.by_type.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The innermost node whose span contains `offset`.
    pub fn find_containing(&self, offset: u32) -> Option<NodeId> {
        let after = self.bounds.partition_point(|&b| b <= offset);
        if after == 0 || after >= self.bounds.len() {
            return None;
        }
        self.owners[after - 1]
    }

    /// Number of nodes per type.
    pub fn type_counts(&self) -> impl Iterator<Item = (&str, usize)> {
        self.by_type.iter().map(|(k, v)| (k.as_str(), v.len()))
    }

    /// Number of indexed nodes.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// The tree generation this index was built from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true if `tree` changed after this index was built.
    pub fn is_stale(&self, tree: &Tree) -> bool {
        tree.generation() != self.generation
    }
}
