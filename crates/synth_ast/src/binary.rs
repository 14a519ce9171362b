//! Compact fixed-record binary form of a tree.
//!
//! Layout, version 1, all integers little-endian:
//!
//! ```text
//! header (16 bytes)
//!   0  magic               b"SYNB"
//!   4  version             u16 = 1
//!   6  record_size         u16 = 32
//!   8  node_count          u32
//!   12 string_table_offset u32
//! records (node_count * 32 bytes, record i describes NodeId i)
//!   0  type_tag     u16  index into the string table
//!   2  depth        u8   saturating at 255
//!   3  flags        u8   bit 0 has children, bit 1 has data, bit 2 has text
//!   4  parent       u32  u32::MAX when absent
//!   8  first_child  u32  u32::MAX when absent
//!   12 next_sibling u32  u32::MAX when absent
//!   16 start_offset u32
//!   20 end_offset   u32
//!   24 text_start   u32
//!   28 text_len     u32
//! string table
//!   count u32, then per entry: len u32 followed by UTF-8 bytes
//! ```
//!
//! The text slice points at the node's primary textual payload inside the
//! source when it can be located within the node's span.

use crate::{NodeId, Tree, TreeError};

pub const MAGIC: [u8; 4] = *b"SYNB";
pub const FORMAT_VERSION: u16 = 1;
pub const HEADER_SIZE: usize = 16;
pub const RECORD_SIZE: usize = 32;
pub const NONE: u32 = u32::MAX;

pub const FLAG_HAS_CHILDREN: u8 = 1 << 0;
pub const FLAG_HAS_DATA: u8 = 1 << 1;
pub const FLAG_HAS_TEXT: u8 = 1 << 2;

/// One decoded node record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryNode {
    pub type_tag: u16,
    pub depth: u8,
    pub flags: u8,
    pub parent: Option<u32>,
    pub first_child: Option<u32>,
    pub next_sibling: Option<u32>,
    pub start_offset: u32,
    pub end_offset: u32,
    pub text_start: u32,
    pub text_len: u32,
}

impl BinaryNode {
    pub fn has_children(&self) -> bool {
        self.flags & FLAG_HAS_CHILDREN != 0
    }

    pub fn has_data(&self) -> bool {
        self.flags & FLAG_HAS_DATA != 0
    }

    pub fn has_text(&self) -> bool {
        self.flags & FLAG_HAS_TEXT != 0
    }
}

fn link(id: Option<NodeId>) -> u32 {
    id.map(NodeId::get).unwrap_or(NONE)
}

fn text_slice(tree: &Tree, id: NodeId) -> Option<(u32, u32)> {
    let node = tree.get(id)?;
    let value = node.data.text_value().filter(|v| !v.is_empty())?;
    let covered = tree.text(id);
    let at = covered.find(value)?;
    Some((node.span.start.offset + at as u32, value.len() as u32))
}

impl Tree {
    /// Encodes the tree in the binary layout.
    pub fn to_binary(&self) -> Result<Vec<u8>, TreeError> {
        let count = self.node_count();
        if self.strings().len() > usize::from(u16::MAX) {
            return Err(TreeError::binary_format("more than 65535 node types"));
        }

        let mut depth = vec![0u8; count];
        let mut next_sibling = vec![NONE; count];
        for id in self.preorder(self.root()) {
            let children = self.children(id);
            let child_depth = depth[id.index()].saturating_add(1);
            for (i, &child) in children.iter().enumerate() {
                depth[child.index()] = child_depth;
                if let Some(&next) = children.get(i + 1) {
                    next_sibling[child.index()] = next.get();
                }
            }
        }

        let table_offset = HEADER_SIZE + count * RECORD_SIZE;
        let mut out = Vec::with_capacity(table_offset + 64);
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&(RECORD_SIZE as u16).to_le_bytes());
        out.extend_from_slice(&(count as u32).to_le_bytes());
        out.extend_from_slice(&(table_offset as u32).to_le_bytes());

        for node in self.nodes() {
            let i = node.id.index();
            let (text_start, text_len, has_text) = match text_slice(self, node.id) {
                Some((start, len)) => (start, len, true),
                None => (node.span.start.offset, 0, false),
            };
            let mut flags = 0u8;
            if !node.children.is_empty() {
                flags |= FLAG_HAS_CHILDREN;
            }
            if !node.data.is_none() || !node.attrs.is_empty() {
                flags |= FLAG_HAS_DATA;
            }
            if has_text {
                flags |= FLAG_HAS_TEXT;
            }
            out.extend_from_slice(&(node.kind.index() as u16).to_le_bytes());
            out.push(depth[i]);
            out.push(flags);
            out.extend_from_slice(&link(node.parent).to_le_bytes());
            out.extend_from_slice(&link(node.children.first().copied()).to_le_bytes());
            out.extend_from_slice(&next_sibling[i].to_le_bytes());
            out.extend_from_slice(&node.span.start.offset.to_le_bytes());
            out.extend_from_slice(&node.span.end.offset.to_le_bytes());
            out.extend_from_slice(&text_start.to_le_bytes());
            out.extend_from_slice(&text_len.to_le_bytes());
        }

        out.extend_from_slice(&(self.strings().len() as u32).to_le_bytes());
        for (_, s) in self.strings().iter() {
            out.extend_from_slice(&(s.len() as u32).to_le_bytes());
            out.extend_from_slice(s.as_bytes());
        }
        Ok(out)
    }
}

/// Zero-copy reader over an encoded buffer.
#[derive(Debug, Clone)]
pub struct BinaryTree<'a> {
    bytes: &'a [u8],
    node_count: usize,
    strings: Vec<&'a str>,
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    bytes.get(at..at + 2).map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn opt(value: u32) -> Option<u32> {
    (value != NONE).then_some(value)
}

impl<'a> BinaryTree<'a> {
    /// Validates the header and string table of `bytes`.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, TreeError> {
        let truncated = || TreeError::binary_format("buffer is truncated");
        if bytes.get(0..4) != Some(&MAGIC[..]) {
            return Err(TreeError::binary_format("bad magic"));
        }
        let version = read_u16(bytes, 4).ok_or_else(truncated)?;
        if version != FORMAT_VERSION {
            return Err(TreeError::binary_format(format!(
                "unsupported version {version}"
            )));
        }
        let record_size = read_u16(bytes, 6).ok_or_else(truncated)?;
        if usize::from(record_size) != RECORD_SIZE {
            return Err(TreeError::binary_format(format!(
                "unexpected record size {record_size}"
            )));
        }
        let node_count = read_u32(bytes, 8).ok_or_else(truncated)? as usize;
        let table = read_u32(bytes, 12).ok_or_else(truncated)? as usize;
        let records_end = node_count
            .checked_mul(RECORD_SIZE)
            .and_then(|n| n.checked_add(HEADER_SIZE))
            .ok_or_else(truncated)?;
        if table != records_end {
            return Err(TreeError::binary_format("string table offset mismatch"));
        }

        let count = read_u32(bytes, table).ok_or_else(truncated)? as usize;
        let mut strings = Vec::with_capacity(count.min(1024));
        let mut at = table + 4;
        for _ in 0..count {
            let len = read_u32(bytes, at).ok_or_else(truncated)? as usize;
            at += 4;
            let raw = bytes.get(at..at + len).ok_or_else(truncated)?;
            let s = std::str::from_utf8(raw)
                .map_err(|e| TreeError::binary_format(format!("type name: {e}")))?;
            strings.push(s);
            at += len;
        }

        Ok(Self {
            bytes,
            node_count,
            strings,
        })
    }

    /// Number of node records.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Decodes record `index`.
    pub fn node(&self, index: usize) -> Option<BinaryNode> {
        if index >= self.node_count {
            return None;
        }
        let at = HEADER_SIZE + index * RECORD_SIZE;
        let record = self.bytes.get(at..at + RECORD_SIZE)?;
        Some(BinaryNode {
            type_tag: read_u16(record, 0)?,
            depth: record[2],
            flags: record[3],
            parent: opt(read_u32(record, 4)?),
            first_child: opt(read_u32(record, 8)?),
            next_sibling: opt(read_u32(record, 12)?),
            start_offset: read_u32(record, 16)?,
            end_offset: read_u32(record, 20)?,
            text_start: read_u32(record, 24)?,
            text_len: read_u32(record, 28)?,
        })
    }

    /// Resolves a type tag.
    pub fn type_name(&self, tag: u16) -> Option<&'a str> {
        self.strings.get(usize::from(tag)).copied()
    }

    /// Iterates over the children of record `index`.
    ///
    /// Sibling links are followed at most `node_count` times, so a buffer
    /// with a cyclic sibling chain cannot stall the walk.
    pub fn children(&self, index: usize) -> impl Iterator<Item = u32> + '_ {
        let mut next = self.node(index).and_then(|n| n.first_child);
        std::iter::from_fn(move || {
            let current = next?;
            next = self.node(current as usize).and_then(|n| n.next_sibling);
            Some(current)
        })
        .take(self.node_count)
    }

    /// Iterates over all records.
    pub fn iter(&self) -> impl Iterator<Item = BinaryNode> + '_ {
        (0..self.node_count).filter_map(|i| self.node(i))
    }
}
