//! Chunked bulk operations over nodes and trees.
//!
//! Work is split into fixed-size chunks and processed on the calling thread.
//! Callers can observe chunk boundaries to yield or report progress.

use std::collections::BTreeMap;

use tracing::debug;

use crate::{Node, NodeId, Tree};

/// Default number of items per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Chunked bulk processor.
#[derive(Debug, Clone, Copy)]
pub struct BatchProcessor {
    chunk_size: usize,
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl BatchProcessor {
    /// Creates a processor. A chunk size of zero is treated as one.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Calls `f` once per chunk of reachable node ids in document order.
    pub fn for_each_chunk(&self, tree: &Tree, mut f: impl FnMut(usize, &[NodeId])) {
        let order = tree.preorder(tree.root());
        for (i, chunk) in order.chunks(self.chunk_size).enumerate() {
            f(i, chunk);
        }
    }

    /// Maps every reachable node in document order.
    pub fn map_nodes<T>(&self, tree: &Tree, mut f: impl FnMut(&Tree, &Node) -> T) -> Vec<T> {
        let mut out = Vec::with_capacity(tree.node_count());
        let mut chunks = 0usize;
        self.for_each_chunk(tree, |_, ids| {
            chunks += 1;
            out.extend(ids.iter().filter_map(|&id| tree.get(id)).map(|n| f(tree, n)));
        });
        debug!("Mapped {} nodes in {} chunks", out.len(), chunks);
        out
    }

    /// Reachable nodes matching `pred`, in document order.
    pub fn filter_nodes(&self, tree: &Tree, mut pred: impl FnMut(&Tree, &Node) -> bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.for_each_chunk(tree, |_, ids| {
            out.extend(
                ids.iter()
                    .copied()
                    .filter(|&id| tree.get(id).is_some_and(|n| pred(tree, n))),
            );
        });
        out
    }

    /// Node counts per type name.
    pub fn count_by_type(&self, tree: &Tree) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        self.for_each_chunk(tree, |_, ids| {
            for &id in ids {
                *counts.entry(tree.kind_name(id).to_string()).or_insert(0) += 1;
            }
        });
        counts
    }

    /// Applies `f` to every tree, one chunk of trees at a time.
    pub fn process_trees<T>(&self, trees: &[Tree], mut f: impl FnMut(&Tree) -> T) -> Vec<T> {
        let mut out = Vec::with_capacity(trees.len());
        for chunk in trees.chunks(self.chunk_size) {
            out.extend(chunk.iter().map(&mut f));
        }
        out
    }

    /// Merged type counts across many trees.
    pub fn count_by_type_many(&self, trees: &[Tree]) -> BTreeMap<String, usize> {
        let mut total = BTreeMap::new();
        for counts in self.process_trees(trees, |t| self.count_by_type(t)) {
            for (kind, n) in counts {
                *total.entry(kind).or_insert(0) += n;
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NodeData, NodeSpec};
    use pretty_assertions::assert_eq;

    fn sample(words: &[&str]) -> Tree {
        let source = words.join(" ");
        let mut tree = Tree::new("text", source.as_str());
        let mut offset = 0u32;
        for word in words {
            let end = offset + word.len() as u32;
            let id = tree.add_node(
                NodeSpec::new("word", tree.span(offset, end)).with_data(NodeData::text(*word)),
            );
            tree.append_child(tree.root(), id).unwrap();
            offset = end + 1;
        }
        tree
    }

    #[test]
    fn test_chunks_cover_every_node_once() {
        let tree = sample(&["a", "b", "c", "d", "e"]);
        let mut sizes = Vec::new();
        BatchProcessor::new(2).for_each_chunk(&tree, |_, ids| sizes.push(ids.len()));
        assert_eq!(sizes, vec![2, 2, 2]);
    }

    #[test]
    fn test_map_and_filter() {
        let tree = sample(&["one", "two", "three"]);
        let batch = BatchProcessor::new(2);
        let lens = batch.map_nodes(&tree, |_, n| n.span.len());
        assert_eq!(lens, vec![13, 3, 3, 5]);

        let long = batch.filter_nodes(&tree, |t, n| t.kind_of(n) == "word" && n.span.len() > 3);
        assert_eq!(long.len(), 1);
        assert_eq!(tree.text(long[0]), "three");
    }

    #[test]
    fn test_counts() {
        let trees = vec![sample(&["a"]), sample(&["b", "c"])];
        let batch = BatchProcessor::new(0);
        assert_eq!(batch.chunk_size(), 1);
        let counts = batch.count_by_type_many(&trees);
        assert_eq!(counts.get("root"), Some(&2));
        assert_eq!(counts.get("word"), Some(&3));
        assert_eq!(batch.process_trees(&trees, |t| t.node_count()), vec![2, 3]);
    }
}
