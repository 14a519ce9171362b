//! Arena tree store.
//!
//! A [`Tree`] owns a flat vector of [`Node`] records addressed by [`NodeId`],
//! an interner for node type names, and document metadata. Language modules
//! build trees through [`Tree::new`], [`Tree::add_node`] and
//! [`Tree::append_child`] only.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Attrs, Node, NodeData, NodeId, NodeSpec, PoolHandle, Position, SourceMap, Span,
    StringInterner, Symbol, TreeError,
};

/// Type name of every root node.
pub const ROOT_KIND: &str = "root";

/// Document-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeMeta {
    /// Language the tree was parsed as.
    pub language: String,
    /// Full source text.
    pub source: Arc<str>,
    /// Creation time in milliseconds since the Unix epoch.
    pub created: u64,
    /// Last mutation time in milliseconds since the Unix epoch.
    pub modified: u64,
    /// Free-form metadata bag.
    #[serde(default)]
    pub metadata: Attrs,
}

/// An arena-backed syntax tree.
#[derive(Debug, Clone)]
pub struct Tree {
    root: NodeId,
    nodes: Vec<Node>,
    strings: StringInterner,
    meta: TreeMeta,
    lines: Arc<SourceMap>,
    generation: u64,
    pool: Option<PoolHandle>,
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

impl Tree {
    /// Creates a tree holding only a root node that spans all of `source`.
    pub fn new(language: impl Into<String>, source: impl Into<Arc<str>>) -> Self {
        Self::build(language.into(), source.into(), None)
    }

    /// Like [`Tree::new`], drawing node records from `pool`.
    pub fn with_pool(
        language: impl Into<String>,
        source: impl Into<Arc<str>>,
        pool: PoolHandle,
    ) -> Self {
        Self::build(language.into(), source.into(), Some(pool))
    }

    fn build(language: String, source: Arc<str>, pool: Option<PoolHandle>) -> Self {
        let lines = Arc::new(SourceMap::new(&source));
        let now = now_millis();
        let mut tree = Self {
            root: NodeId::ROOT,
            nodes: Vec::new(),
            strings: StringInterner::new(),
            meta: TreeMeta {
                language,
                source,
                created: now,
                modified: now,
                metadata: Attrs::new(),
            },
            lines,
            generation: 0,
            pool,
        };
        let span = tree.span(0, tree.lines.len());
        tree.add_node(NodeSpec::new(ROOT_KIND, span));
        tree
    }

    /// Reassembles a tree from deserialized parts. Callers validate afterwards.
    pub(crate) fn from_parts(
        root: NodeId,
        nodes: Vec<Node>,
        strings: StringInterner,
        meta: TreeMeta,
    ) -> Self {
        let lines = Arc::new(SourceMap::new(&meta.source));
        Self {
            root,
            nodes,
            strings,
            meta,
            lines,
            generation: 0,
            pool: None,
        }
    }

    /// Appends a node record and returns its id.
    ///
    /// The node is not linked to any parent; use [`Tree::append_child`].
    pub fn add_node(&mut self, spec: NodeSpec<'_>) -> NodeId {
        let kind = self.strings.intern(spec.kind);
        let mut node = match &self.pool {
            Some(pool) => pool.acquire(),
            None => Node::blank(),
        };
        let id = NodeId::new(self.nodes.len() as u32);
        node.id = id;
        node.kind = kind;
        node.span = spec.span;
        node.data = spec.data;
        node.attrs = spec.attrs;
        self.nodes.push(node);
        self.touch();
        id
    }

    /// Links `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check(parent)?;
        self.check(child)?;
        if child == self.root {
            return Err(TreeError::structure("the root cannot become a child"));
        }
        if let Some(existing) = self.nodes[child.index()].parent {
            return Err(TreeError::structure(format!(
                "node {child} already has parent {existing}"
            )));
        }
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(TreeError::structure(format!(
                    "linking {child} under {parent} would create a cycle"
                )));
            }
            cursor = self.nodes[current.index()].parent;
        }
        self.nodes[parent.index()].children.push(child);
        self.nodes[child.index()].parent = Some(parent);
        self.touch();
        Ok(())
    }

    /// Unlinks `child` from its parent. The record stays in the arena.
    pub fn detach(&mut self, child: NodeId) -> Result<(), TreeError> {
        self.check(child)?;
        if let Some(parent) = self.nodes[child.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|&c| c != child);
            self.touch();
        }
        Ok(())
    }

    fn check(&self, id: NodeId) -> Result<(), TreeError> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(TreeError::InvalidNodeId(id))
        }
    }

    fn touch(&mut self) {
        self.generation += 1;
        self.meta.modified = now_millis();
    }

    /// Returns the root id.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the root node.
    pub fn root_node(&self) -> &Node {
        &self.nodes[self.root.index()]
    }

    /// Returns a node, or `None` for an unknown id.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Returns a node, or an error for an unknown id.
    pub fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.get(id).ok_or(TreeError::InvalidNodeId(id))
    }

    /// Returns a node for mutation. Counts as a structural mutation.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.check(id)?;
        self.touch();
        Ok(&mut self.nodes[id.index()])
    }

    /// Replaces the typed payload of a node.
    pub fn set_data(&mut self, id: NodeId, data: NodeData) -> Result<(), TreeError> {
        self.node_mut(id)?.data = data;
        Ok(())
    }

    /// Children of `id`, empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// `id` followed by all of its descendants in document order.
    pub fn preorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.get(id).is_none() {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// All descendants of `id` in document order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = self.preorder(id);
        if !out.is_empty() {
            out.remove(0);
        }
        out
    }

    /// Number of ancestors of `id`.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cursor = self.get(id).and_then(|n| n.parent);
        while let Some(parent) = cursor {
            depth += 1;
            cursor = self.get(parent).and_then(|n| n.parent);
        }
        depth
    }

    /// All node records, indexed by id.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of node records, including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Consumes the tree, yielding its records.
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    /// Type name of a node, empty for unknown ids.
    pub fn kind_name(&self, id: NodeId) -> &str {
        self.get(id)
            .map(|n| self.strings.resolve(n.kind))
            .unwrap_or("")
    }

    /// Type name of a node record.
    pub fn kind_of(&self, node: &Node) -> &str {
        self.strings.resolve(node.kind)
    }

    /// Looks up an interned type name.
    pub fn symbol(&self, kind: &str) -> Option<Symbol> {
        self.strings.get(kind)
    }

    /// The type name interner.
    pub fn strings(&self) -> &StringInterner {
        &self.strings
    }

    /// Mutation counter. Any structural change increments it.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Document metadata.
    pub fn meta(&self) -> &TreeMeta {
        &self.meta
    }

    /// Stores a value in the metadata bag.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.meta.metadata.insert(key.into(), value.into());
        self.meta.modified = now_millis();
    }

    /// Language name.
    pub fn language(&self) -> &str {
        &self.meta.language
    }

    /// Source text.
    pub fn source(&self) -> &str {
        &self.meta.source
    }

    /// Shared source text.
    pub fn source_arc(&self) -> Arc<str> {
        Arc::clone(&self.meta.source)
    }

    /// Source text covered by a node.
    pub fn text(&self, id: NodeId) -> &str {
        self.get(id)
            .and_then(|n| {
                self.source()
                    .get(n.span.start.offset as usize..n.span.end.offset as usize)
            })
            .unwrap_or("")
    }

    /// The pool records are drawn from, if any.
    pub fn pool(&self) -> Option<&PoolHandle> {
        self.pool.as_ref()
    }

    /// Resolves a byte offset in the source.
    pub fn position(&self, offset: u32) -> Position {
        self.lines.position(offset)
    }

    /// Resolves a byte range in the source.
    pub fn span(&self, start: u32, end: u32) -> Span {
        self.lines.span(start, end)
    }

    /// Checks the tree invariants.
    ///
    /// Every node reachable from the root is reached exactly once through a
    /// children list whose owner is its recorded parent. Parent pointers of
    /// detached nodes must also agree with their parent's children list.
    pub fn validate(&self) -> Result<(), TreeError> {
        self.check(self.root)?;
        if self.root_node().parent.is_some() {
            return Err(TreeError::structure("the root has a parent"));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if node.id.index() != index {
                return Err(TreeError::structure(format!(
                    "record {index} carries id {}",
                    node.id
                )));
            }
            if node.span.end.offset < node.span.start.offset {
                return Err(TreeError::structure(format!(
                    "node {} ends before it starts",
                    node.id
                )));
            }
            if let Some(parent) = node.parent {
                let owner = self.node(parent)?;
                let listed = owner.children.iter().filter(|&&c| c == node.id).count();
                if listed != 1 {
                    return Err(TreeError::structure(format!(
                        "node {} is listed {listed} times by its parent {parent}",
                        node.id
                    )));
                }
            }
        }

        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![self.root];
        seen[self.root.index()] = true;
        while let Some(current) = stack.pop() {
            for &child in self.children(current) {
                self.check(child)?;
                if seen[child.index()] {
                    return Err(TreeError::structure(format!(
                        "node {child} is reachable more than once"
                    )));
                }
                seen[child.index()] = true;
                if self.nodes[child.index()].parent != Some(current) {
                    return Err(TreeError::structure(format!(
                        "node {child} is a child of {current} but records a different parent"
                    )));
                }
                stack.push(child);
            }
        }
        Ok(())
    }

    /// Compares the reachable structure of two trees.
    ///
    /// Type names, spans, payloads and child order must match. Arena layout
    /// and interner order may differ.
    pub fn structurally_eq(&self, other: &Tree) -> bool {
        let mut stack = vec![(self.root, other.root)];
        while let Some((a, b)) = stack.pop() {
            let (Some(left), Some(right)) = (self.get(a), other.get(b)) else {
                return false;
            };
            if self.kind_of(left) != other.kind_of(right)
                || left.span != right.span
                || left.children.len() != right.children.len()
                || left.merged_data() != right.merged_data()
            {
                return false;
            }
            stack.extend(
                left.children
                    .iter()
                    .copied()
                    .zip(right.children.iter().copied()),
            );
        }
        true
    }

    /// Renders the reachable tree as indented text.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            let _ = write!(
                out,
                "{}{} [{}..{}]",
                "  ".repeat(depth),
                self.kind_of(node),
                node.span.start.offset,
                node.span.end.offset
            );
            let data = node.merged_data();
            if !data.is_empty() {
                let rendered = serde_json::to_string(&data).unwrap_or_default();
                let _ = write!(out, " {rendered}");
            }
            out.push('\n');
            stack.extend(node.children.iter().rev().map(|&c| (c, depth + 1)));
        }
        out
    }
}
