//! Persistent zipper over an immutable copy of a tree.
//!
//! A [`Zipper`] focuses one [`ZNode`] and remembers the path back to the
//! root. Every edit returns a new zipper; zippers and nodes obtained earlier
//! keep observing the old version. Only the nodes on the path from an edited
//! focus to the root are rebuilt, everything else is shared through `Arc`.

use std::sync::Arc;

use crate::{Attrs, NodeData, NodeId, NodeSpec, Span, Tree, TreeError};

/// Immutable node used by the zipper.
#[derive(Debug, Clone, PartialEq)]
pub struct ZNode {
    pub kind: Arc<str>,
    /// Id of the arena node this was copied from, if any.
    pub origin: Option<NodeId>,
    pub span: Span,
    pub data: NodeData,
    pub attrs: Attrs,
    pub children: Vec<Arc<ZNode>>,
}

impl ZNode {
    /// Creates a childless node without origin.
    pub fn new(kind: &str, span: Span) -> Self {
        Self {
            kind: Arc::from(kind),
            origin: None,
            span,
            data: NodeData::None,
            attrs: Attrs::new(),
            children: Vec::new(),
        }
    }

    /// Sets the typed payload.
    pub fn with_data(mut self, data: NodeData) -> Self {
        self.data = data;
        self
    }

    /// Copies the subtree rooted at `id` out of an arena tree.
    pub fn from_tree(tree: &Tree, id: NodeId) -> Result<Arc<ZNode>, TreeError> {
        let node = tree.node(id)?;
        let children = node
            .children
            .iter()
            .map(|&child| ZNode::from_tree(tree, child))
            .collect::<Result<Vec<_>, _>>()?;
        let kind = tree
            .strings()
            .resolve_shared(node.kind)
            .unwrap_or_else(|| Arc::from(""));
        Ok(Arc::new(ZNode {
            kind,
            origin: Some(id),
            span: node.span,
            data: node.data.clone(),
            attrs: node.attrs.clone(),
            children,
        }))
    }

    /// Number of nodes in this subtree.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(|c| c.size()).sum::<usize>()
    }
}

#[derive(Debug)]
struct Crumb {
    parent: Arc<ZNode>,
    index: usize,
    /// True when `parent` no longer matches the node stored in its own parent.
    changed: bool,
    up: Option<Arc<Crumb>>,
}

/// A cursor into a persistent tree.
#[derive(Debug, Clone)]
pub struct Zipper {
    focus: Arc<ZNode>,
    path: Option<Arc<Crumb>>,
    /// True when `focus` differs from the child stored in the crumb's parent.
    dirty: bool,
}

impl Zipper {
    /// Creates a zipper focused on `root`.
    pub fn new(root: Arc<ZNode>) -> Self {
        Self {
            focus: root,
            path: None,
            dirty: false,
        }
    }

    /// Copies `tree` and focuses its root.
    pub fn from_tree(tree: &Tree) -> Result<Self, TreeError> {
        Ok(Self::new(ZNode::from_tree(tree, tree.root())?))
    }

    /// The focused node.
    pub fn node(&self) -> &ZNode {
        &self.focus
    }

    /// The focused node as a shared handle.
    pub fn focus(&self) -> &Arc<ZNode> {
        &self.focus
    }

    /// Returns true if the focus is the root.
    pub fn is_root(&self) -> bool {
        self.path.is_none()
    }

    /// Index of the focus among its siblings.
    pub fn index(&self) -> Option<usize> {
        self.path.as_ref().map(|c| c.index)
    }

    /// Number of ancestors of the focus.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut crumb = self.path.as_deref();
        while let Some(c) = crumb {
            depth += 1;
            crumb = c.up.as_deref();
        }
        depth
    }

    /// Parent node with the current focus written back into it.
    fn committed_parent(&self, crumb: &Crumb) -> Arc<ZNode> {
        if self.dirty {
            let mut parent = (*crumb.parent).clone();
            parent.children[crumb.index] = Arc::clone(&self.focus);
            Arc::new(parent)
        } else {
            Arc::clone(&crumb.parent)
        }
    }

    /// Moves to the first child.
    pub fn down(&self) -> Option<Zipper> {
        self.down_to(0)
    }

    /// Moves to the child at `index`.
    pub fn down_to(&self, index: usize) -> Option<Zipper> {
        let child = Arc::clone(self.focus.children.get(index)?);
        Some(Zipper {
            focus: child,
            path: Some(Arc::new(Crumb {
                parent: Arc::clone(&self.focus),
                index,
                changed: self.dirty,
                up: self.path.clone(),
            })),
            dirty: false,
        })
    }

    /// Moves to the parent.
    pub fn up(&self) -> Option<Zipper> {
        let crumb = self.path.as_deref()?;
        Some(Zipper {
            focus: self.committed_parent(crumb),
            path: crumb.up.clone(),
            dirty: self.dirty || crumb.changed,
        })
    }

    /// Moves to the previous sibling.
    pub fn left(&self) -> Option<Zipper> {
        let index = self.index()?.checked_sub(1)?;
        self.sibling(index)
    }

    /// Moves to the next sibling.
    pub fn right(&self) -> Option<Zipper> {
        let index = self.index()? + 1;
        self.sibling(index)
    }

    fn sibling(&self, index: usize) -> Option<Zipper> {
        let crumb = self.path.as_deref()?;
        let parent = self.committed_parent(crumb);
        let focus = Arc::clone(parent.children.get(index)?);
        Some(Zipper {
            focus,
            path: Some(Arc::new(Crumb {
                parent,
                index,
                changed: crumb.changed || self.dirty,
                up: crumb.up.clone(),
            })),
            dirty: false,
        })
    }

    /// Moves to the root, writing back every edit on the way.
    pub fn root(&self) -> Zipper {
        let mut current = self.clone();
        while let Some(parent) = current.up() {
            current = parent;
        }
        current
    }

    /// The root node of the edited tree.
    pub fn root_node(&self) -> Arc<ZNode> {
        self.root().focus
    }

    fn with_focus(&self, focus: ZNode) -> Zipper {
        Zipper {
            focus: Arc::new(focus),
            path: self.path.clone(),
            dirty: true,
        }
    }

    /// Applies `f` to a copy of the focused node.
    pub fn edit(&self, f: impl FnOnce(&mut ZNode)) -> Zipper {
        let mut node = (*self.focus).clone();
        f(&mut node);
        self.with_focus(node)
    }

    /// Replaces the focused subtree.
    pub fn replace(&self, node: ZNode) -> Zipper {
        self.with_focus(node)
    }

    /// Appends a child to the focused node. The focus does not move.
    pub fn append_child(&self, child: ZNode) -> Zipper {
        self.edit(|node| node.children.push(Arc::new(child)))
    }

    /// Inserts a sibling before the focus. Fails at the root.
    pub fn insert_left(&self, node: ZNode) -> Option<Zipper> {
        self.insert_sibling(node, 0)
    }

    /// Inserts a sibling after the focus. Fails at the root.
    pub fn insert_right(&self, node: ZNode) -> Option<Zipper> {
        self.insert_sibling(node, 1)
    }

    fn insert_sibling(&self, node: ZNode, after: usize) -> Option<Zipper> {
        let crumb = self.path.as_deref()?;
        let mut parent = (*crumb.parent).clone();
        parent.children[crumb.index] = Arc::clone(&self.focus);
        parent.children.insert(crumb.index + after, Arc::new(node));
        let index = crumb.index + 1 - after;
        Some(Zipper {
            focus: Arc::clone(&self.focus),
            path: Some(Arc::new(Crumb {
                parent: Arc::new(parent),
                index,
                changed: true,
                up: crumb.up.clone(),
            })),
            dirty: false,
        })
    }

    /// Removes the focused subtree and focuses the parent. Fails at the root.
    pub fn remove(&self) -> Option<Zipper> {
        let crumb = self.path.as_deref()?;
        let mut parent = (*crumb.parent).clone();
        parent.children.remove(crumb.index);
        Some(Zipper {
            focus: Arc::new(parent),
            path: crumb.up.clone(),
            dirty: true,
        })
    }

    /// Drops every node below the root that fails `keep`, together with its
    /// subtree, in one pass. Subtrees with nothing dropped stay shared with
    /// `self`. Returns a zipper at the new root and the number of dropped
    /// subtrees.
    pub fn retain(&self, keep: impl Fn(&ZNode) -> bool) -> (Zipper, usize) {
        let mut dropped = 0;
        let root = prune(&self.root_node(), &keep, &mut dropped);
        (Zipper::new(root), dropped)
    }

    /// Preorder search from the focus for the first node matching `pred`.
    pub fn find(&self, pred: impl Fn(&ZNode) -> bool) -> Option<Zipper> {
        if pred(&self.focus) {
            return Some(self.clone());
        }
        let mut stack = Vec::new();
        if let Some(first) = self.down() {
            stack.push(first);
        }
        while let Some(z) = stack.pop() {
            if pred(&z.focus) {
                return Some(z);
            }
            if let Some(next) = z.right() {
                stack.push(next);
            }
            if let Some(child) = z.down() {
                stack.push(child);
            }
        }
        None
    }

    /// Writes the edited tree into a new arena tree that shares `template`'s
    /// language, source and metadata.
    pub fn to_tree(&self, template: &Tree) -> Result<Tree, TreeError> {
        let root = self.root_node();
        let mut tree = match template.pool() {
            Some(pool) => Tree::with_pool(template.language(), template.source_arc(), pool.clone()),
            None => Tree::new(template.language(), template.source_arc()),
        };
        for (key, value) in &template.meta().metadata {
            tree.set_metadata(key.clone(), value.clone());
        }
        let root_id = tree.root();
        {
            let node = tree.node_mut(root_id)?;
            node.span = root.span;
            node.data = root.data.clone();
            node.attrs = root.attrs.clone();
        }
        let mut stack: Vec<(NodeId, Arc<ZNode>)> = root
            .children
            .iter()
            .rev()
            .map(|c| (root_id, Arc::clone(c)))
            .collect();
        while let Some((parent, znode)) = stack.pop() {
            let id = tree.add_node(
                NodeSpec {
                    kind: &znode.kind,
                    span: znode.span,
                    data: znode.data.clone(),
                    attrs: znode.attrs.clone(),
                },
            );
            tree.append_child(parent, id)?;
            stack.extend(znode.children.iter().rev().map(|c| (id, Arc::clone(c))));
        }
        Ok(tree)
    }
}

fn prune(node: &Arc<ZNode>, keep: &impl Fn(&ZNode) -> bool, dropped: &mut usize) -> Arc<ZNode> {
    let before = *dropped;
    let children: Vec<Arc<ZNode>> = node
        .children
        .iter()
        .filter_map(|child| {
            if keep(child) {
                Some(prune(child, keep, dropped))
            } else {
                *dropped += 1;
                None
            }
        })
        .collect();
    if *dropped == before {
        return Arc::clone(node);
    }
    Arc::new(ZNode {
        kind: Arc::clone(&node.kind),
        origin: node.origin,
        span: node.span,
        data: node.data.clone(),
        attrs: node.attrs.clone(),
        children,
    })
}
