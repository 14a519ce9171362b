//! Parse results.

use std::sync::OnceLock;

use synth_ast::{QueryIndex, Tree};

/// A parsed tree with a lazily built query index.
#[derive(Debug)]
pub struct Parsed {
    tree: Tree,
    index: OnceLock<QueryIndex>,
}

impl Parsed {
    /// Wraps `tree`, building its index right away when `build_index` is set.
    pub fn new(tree: Tree, build_index: bool) -> Self {
        let parsed = Self {
            tree,
            index: OnceLock::new(),
        };
        if build_index {
            parsed.index();
        }
        parsed
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Mutable access to the tree. Drops the cached index.
    pub fn tree_mut(&mut self) -> &mut Tree {
        self.index = OnceLock::new();
        &mut self.tree
    }

    /// The query index, built on first use.
    pub fn index(&self) -> &QueryIndex {
        self.index.get_or_init(|| QueryIndex::build(&self.tree))
    }

    /// Returns true if the index has been built.
    pub fn has_index(&self) -> bool {
        self.index.get().is_some()
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synth_ast::NodeSpec;

    #[test]
    fn test_index_is_lazy() {
        let parsed = Parsed::new(Tree::new("css", "a"), false);
        assert!(!parsed.has_index());
        assert_eq!(parsed.index().node_count(), 1);
        assert!(parsed.has_index());
        assert!(Parsed::new(Tree::new("css", ""), true).has_index());
    }

    #[test]
    fn test_mutation_drops_index() {
        let mut parsed = Parsed::new(Tree::new("css", "ab"), true);
        let tree = parsed.tree_mut();
        let span = tree.span(0, 1);
        let id = tree.add_node(NodeSpec::new("Comment", span));
        let root = tree.root();
        tree.append_child(root, id).unwrap();

        assert!(!parsed.has_index());
        assert_eq!(parsed.index().find_by_type("Comment"), &[id]);
    }
}
