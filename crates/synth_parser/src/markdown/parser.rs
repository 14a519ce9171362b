//! Markdown tree builder.
//!
//! One block node per non-blank token, with a `text` child holding the
//! block's inline content.

use synth_ast::{NodeData, NodeId, NodeSpec, Tree};

use super::lexer::{
    BLOCKQUOTE, CODE_FENCE, HEADING, LIST_ITEM, Line, PARAGRAPH, THEMATIC_BREAK, classify,
    closes_fence, indent, list_marker,
};
use crate::{ParseError, Token};

/// Byte offset of `part` inside `whole`. `part` must be a subslice.
fn offset_in(whole: &str, part: &str) -> u32 {
    (part.as_ptr() as usize - whole.as_ptr() as usize) as u32
}

pub(crate) struct MarkdownBuilder<'t> {
    source: &'t str,
    tree: Tree,
}

impl<'t> MarkdownBuilder<'t> {
    pub(crate) fn new(source: &'t str, tree: Tree) -> Self {
        Self { source, tree }
    }

    pub(crate) fn build(mut self, tokens: &[Token]) -> Result<Tree, ParseError> {
        let root = self.tree.root();
        for token in tokens.iter().filter(|t| !t.is_trivia()) {
            let text = &self.source[token.start() as usize..token.end() as usize];
            match token.kind {
                HEADING => self.heading(root, text)?,
                PARAGRAPH => self.paragraph(root, text)?,
                CODE_FENCE => self.code(root, text)?,
                THEMATIC_BREAK => {
                    self.block(root, "thematicBreak", text, NodeData::None)?;
                }
                BLOCKQUOTE => self.blockquote(root, text)?,
                LIST_ITEM => self.list_item(root, text)?,
                other => {
                    return Err(ParseError::internal(format!(
                        "unexpected markdown token kind `{other}`"
                    )));
                }
            }
        }
        Ok(self.tree)
    }

    /// Adds a block node spanning `text` without its trailing line break.
    fn block(
        &mut self,
        parent: NodeId,
        kind: &str,
        text: &str,
        data: NodeData,
    ) -> Result<NodeId, ParseError> {
        let content = text.trim_end_matches(['\n', '\r']);
        let start = offset_in(self.source, content);
        let span = self.tree.span(start, start + content.len() as u32);
        let id = self.tree.add_node(NodeSpec::new(kind, span).with_data(data));
        self.tree.append_child(parent, id)?;
        Ok(id)
    }

    /// Adds a `text` child covering `first..last` of the source. Empty
    /// content adds nothing.
    fn text(
        &mut self,
        parent: NodeId,
        first: &str,
        last: &str,
        value: String,
    ) -> Result<(), ParseError> {
        if value.is_empty() {
            return Ok(());
        }
        let start = offset_in(self.source, first);
        let end = offset_in(self.source, last) + last.len() as u32;
        let span = self.tree.span(start, end.max(start));
        let id = self
            .tree
            .add_node(NodeSpec::new("text", span).with_data(NodeData::text(value)));
        self.tree.append_child(parent, id)?;
        Ok(())
    }

    fn heading(&mut self, parent: NodeId, text: &str) -> Result<(), ParseError> {
        let line = text.trim_end_matches(['\n', '\r']);
        let Line::Heading { depth } = classify(line) else {
            return Err(ParseError::internal("heading token without heading line"));
        };
        let node = self.block(parent, "heading", text, NodeData::Heading { depth })?;

        let rest = line.trim_start_matches(' ');
        let mut content = rest[depth as usize..].trim();
        // Optional closing sequence.
        let unclosed = content.trim_end_matches('#');
        if unclosed.is_empty() || unclosed.ends_with([' ', '\t']) {
            content = unclosed.trim_end();
        }
        self.text(node, content, content, content.to_string())
    }

    fn paragraph(&mut self, parent: NodeId, text: &str) -> Result<(), ParseError> {
        let node = self.block(parent, "paragraph", text, NodeData::None)?;
        let trimmed = text.trim();
        let value = trimmed.lines().map(str::trim).collect::<Vec<_>>().join("\n");
        self.text(node, trimmed, trimmed, value)
    }

    fn code(&mut self, parent: NodeId, text: &str) -> Result<(), ParseError> {
        let mut all = text.lines();
        let opening = all.next().unwrap_or_default();
        let Line::Fence { marker, len } = classify(opening) else {
            return Err(ParseError::internal("code token without opening fence"));
        };
        let fence = &opening[indent(opening).unwrap_or(0)..];
        let info = fence.trim_start_matches(marker).trim();
        let (lang, meta) = match info.split_once(char::is_whitespace) {
            Some((lang, meta)) => (Some(lang.to_string()), Some(meta.trim().to_string())),
            None if info.is_empty() => (None, None),
            None => (Some(info.to_string()), None),
        };

        let body: Vec<&str> = all.collect();
        let closed = body
            .last()
            .is_some_and(|line| closes_fence(line, marker, len));
        let content = if closed {
            &body[..body.len() - 1]
        } else {
            &body[..]
        };
        let value = content.join("\n");
        self.block(parent, "code", text, NodeData::Code { lang, meta, value })?;
        Ok(())
    }

    fn blockquote(&mut self, parent: NodeId, text: &str) -> Result<(), ParseError> {
        let node = self.block(parent, "blockquote", text, NodeData::None)?;
        let stripped: Vec<&str> = text
            .lines()
            .map(|line| {
                let line = line.trim_start_matches(' ');
                let line = line.strip_prefix('>').unwrap_or(line);
                line.strip_prefix(' ').unwrap_or(line).trim_end()
            })
            .collect();
        let value = stripped.join("\n").trim().to_string();
        let Some(first) = stripped.iter().find(|l| !l.is_empty()) else {
            return Ok(());
        };
        let last = stripped.iter().rev().find(|l| !l.is_empty()).unwrap_or(first);
        self.text(node, first, last, value)
    }

    fn list_item(&mut self, parent: NodeId, text: &str) -> Result<(), ParseError> {
        let mut all = text.lines();
        let first = all.next().unwrap_or_default();
        let rest = first.trim_start_matches(' ');
        let (marker_len, ordered) = list_marker(rest).unwrap_or((0, false));
        let mut content = rest[marker_len..].trim_start();

        let mut checked = None;
        for (prefix, state) in [("[ ]", false), ("[x]", true), ("[X]", true)] {
            if let Some(after) = content.strip_prefix(prefix) {
                if after.is_empty() || after.starts_with([' ', '\t']) {
                    checked = Some(state);
                    content = after.trim_start();
                    break;
                }
            }
        }

        let node = self.block(parent, "listItem", text, NodeData::ListItem { ordered, checked })?;
        let content = content.trim_end();
        let continuation: Vec<&str> = all.map(str::trim).filter(|l| !l.is_empty()).collect();
        let mut value = content.to_string();
        for line in &continuation {
            if !value.is_empty() {
                value.push('\n');
            }
            value.push_str(line);
        }
        let first_part = if content.is_empty() {
            continuation.first().copied().unwrap_or(content)
        } else {
            content
        };
        let last_part = continuation.last().copied().unwrap_or(first_part);
        self.text(node, first_part, last_part, value)
    }
}
