//! Visitor traversal over an arena tree.
//!
//! ```rust
//! use std::ops::ControlFlow;
//! use synth_ast::visit::{VisitResult, Visitor, walk};
//! use synth_ast::{Node, NodeSpec, Tree};
//!
//! struct Counter(usize);
//!
//! impl Visitor for Counter {
//!     fn enter(&mut self, _tree: &Tree, _node: &Node) -> VisitResult {
//!         self.0 += 1;
//!         ControlFlow::Continue(())
//!     }
//! }
//!
//! let mut tree = Tree::new("text", "hi");
//! let span = tree.span(0, 2);
//! let leaf = tree.add_node(NodeSpec::new("text", span));
//! tree.append_child(tree.root(), leaf).unwrap();
//!
//! let mut counter = Counter(0);
//! let _ = walk(&tree, &mut counter);
//! assert_eq!(counter.0, 2);
//! ```

use std::ops::ControlFlow;

use crate::{Node, NodeId, Tree};

/// Result of a visitor callback. `Break` stops the whole traversal.
pub type VisitResult = ControlFlow<()>;

/// Read-only tree visitor.
pub trait Visitor {
    /// Called before the children of `node`.
    fn enter(&mut self, _tree: &Tree, _node: &Node) -> VisitResult {
        ControlFlow::Continue(())
    }

    /// Called after the children of `node`.
    fn leave(&mut self, _tree: &Tree, _node: &Node) -> VisitResult {
        ControlFlow::Continue(())
    }
}

/// Walks the tree from its root.
pub fn walk<V: Visitor + ?Sized>(tree: &Tree, visitor: &mut V) -> VisitResult {
    walk_from(tree, tree.root(), visitor)
}

/// Walks the subtree rooted at `start`.
pub fn walk_from<V: Visitor + ?Sized>(tree: &Tree, start: NodeId, visitor: &mut V) -> VisitResult {
    let mut stack = vec![(start, false)];
    while let Some((id, entered)) = stack.pop() {
        let Some(node) = tree.get(id) else { continue };
        if entered {
            visitor.leave(tree, node)?;
            continue;
        }
        visitor.enter(tree, node)?;
        stack.push((id, true));
        stack.extend(node.children.iter().rev().map(|&c| (c, false)));
    }
    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeSpec;

    struct Recorder {
        events: Vec<String>,
        stop_at: Option<&'static str>,
    }

    impl Visitor for Recorder {
        fn enter(&mut self, tree: &Tree, node: &Node) -> VisitResult {
            let kind = tree.kind_of(node);
            self.events.push(format!("+{kind}"));
            if self.stop_at == Some(kind) {
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        }

        fn leave(&mut self, tree: &Tree, node: &Node) -> VisitResult {
            self.events.push(format!("-{}", tree.kind_of(node)));
            ControlFlow::Continue(())
        }
    }

    fn sample() -> Tree {
        let mut tree = Tree::new("md", "abc");
        let p = tree.add_node(NodeSpec::new("paragraph", tree.span(0, 3)));
        let t = tree.add_node(NodeSpec::new("text", tree.span(0, 3)));
        let h = tree.add_node(NodeSpec::new("thematicBreak", tree.span(3, 3)));
        tree.append_child(tree.root(), p).unwrap();
        tree.append_child(p, t).unwrap();
        tree.append_child(tree.root(), h).unwrap();
        tree
    }

    #[test]
    fn test_enter_leave_order() {
        let tree = sample();
        let mut rec = Recorder {
            events: Vec::new(),
            stop_at: None,
        };
        assert!(walk(&tree, &mut rec).is_continue());
        assert_eq!(
            rec.events,
            vec![
                "+root",
                "+paragraph",
                "+text",
                "-text",
                "-paragraph",
                "+thematicBreak",
                "-thematicBreak",
                "-root"
            ]
        );
    }

    #[test]
    fn test_break_stops_traversal() {
        let tree = sample();
        let mut rec = Recorder {
            events: Vec::new(),
            stop_at: Some("text"),
        };
        assert!(walk(&tree, &mut rec).is_break());
        assert_eq!(rec.events, vec!["+root", "+paragraph", "+text"]);
    }
}
