//! CSS tree builder.
//!
//! A lenient recursive-descent pass over the token stream. Malformed input
//! never fails: stray tokens are skipped and unclosed blocks end at the last
//! token.

use synth_ast::{NodeData, NodeId, NodeSpec, Tree};

use super::lexer::{
    AT_KEYWORD, COLON, COMMENT, LBRACE, LPAREN, RBRACE, RPAREN, SEMICOLON, WHITESPACE,
};
use crate::{ParseError, Token};

/// Deepest block nesting accepted before the input is rejected.
pub const MAX_NESTING: usize = 256;

/// Where a statement stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// `{` at index.
    Block(usize),
    /// `;` at index.
    Semicolon(usize),
    /// `}` at index, or end of input (`tokens.len()`).
    End(usize),
}

pub(crate) struct CssBuilder<'t> {
    tokens: &'t [Token],
    source: &'t str,
    pos: usize,
    tree: Tree,
}

impl<'t> CssBuilder<'t> {
    pub(crate) fn new(tokens: &'t [Token], source: &'t str, tree: Tree) -> Self {
        Self {
            tokens,
            source,
            pos: 0,
            tree,
        }
    }

    pub(crate) fn build(mut self) -> Result<Tree, ParseError> {
        let root = self.tree.root();
        self.items(root, 0)?;
        Ok(self.tree)
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|t| t.kind == WHITESPACE) {
            self.pos += 1;
        }
    }

    /// Parses statements into `parent` until a `}` (left unconsumed) or the
    /// end of input. `depth` is 0 at the top level.
    fn items(&mut self, parent: NodeId, depth: usize) -> Result<(), ParseError> {
        if depth > MAX_NESTING {
            let offset = self.peek().map_or(self.source.len(), |t| t.start() as usize);
            return Err(ParseError::invalid_source_at(
                format!("blocks nested deeper than {MAX_NESTING}"),
                offset,
            ));
        }
        loop {
            self.skip_whitespace();
            let Some(token) = self.peek() else {
                return Ok(());
            };
            match token.kind {
                RBRACE if depth > 0 => return Ok(()),
                RBRACE | SEMICOLON => self.pos += 1,
                COMMENT => {
                    self.comment(parent, token)?;
                    self.pos += 1;
                }
                AT_KEYWORD => self.at_rule(parent, depth)?,
                _ => match self.scan() {
                    Stop::Block(brace) => self.style_rule(parent, brace, depth)?,
                    stop if depth > 0 => self.declaration(parent, stop)?,
                    stop => self.skip_to(stop),
                },
            }
        }
    }

    /// Finds the token ending the statement that starts at `pos`, ignoring
    /// terminators inside parentheses.
    fn scan(&self) -> Stop {
        let mut parens = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(self.pos) {
            match token.kind {
                LPAREN => parens += 1,
                RPAREN => parens = parens.saturating_sub(1),
                LBRACE if parens == 0 => return Stop::Block(i),
                SEMICOLON if parens == 0 => return Stop::Semicolon(i),
                RBRACE => return Stop::End(i),
                _ => {}
            }
        }
        Stop::End(self.tokens.len())
    }

    fn skip_to(&mut self, stop: Stop) {
        self.pos = match stop {
            Stop::Block(i) | Stop::End(i) => i,
            Stop::Semicolon(i) => i + 1,
        };
    }

    /// Source text of tokens `from..to`, trimmed.
    fn text(&self, from: usize, to: usize) -> &'t str {
        if from >= to {
            return "";
        }
        let start = self.tokens[from].start() as usize;
        let end = self.tokens[to - 1].end() as usize;
        self.source[start..end].trim()
    }

    /// Last non-whitespace token before `to`, at or after `from`.
    fn last_significant(&self, from: usize, to: usize) -> Option<usize> {
        (from..to).rev().find(|&i| self.tokens[i].kind != WHITESPACE)
    }

    fn link(&mut self, parent: NodeId, spec: NodeSpec<'_>) -> Result<NodeId, ParseError> {
        let id = self.tree.add_node(spec);
        self.tree.append_child(parent, id)?;
        Ok(id)
    }

    fn comment(&mut self, parent: NodeId, token: &Token) -> Result<(), ParseError> {
        let body = token.value.strip_prefix("/*").unwrap_or(&token.value);
        let body = body.strip_suffix("*/").unwrap_or(body).trim();
        let span = self.tree.span(token.start(), token.end());
        self.link(
            parent,
            NodeSpec::new("Comment", span).with_data(NodeData::Comment {
                value: body.to_string(),
            }),
        )?;
        Ok(())
    }

    /// Parses `{ ... }` into `node` and extends its span to the closing brace
    /// (or the last token when the block is unclosed).
    fn block(&mut self, node: NodeId, brace: usize, depth: usize) -> Result<(), ParseError> {
        self.pos = brace + 1;
        self.items(node, depth + 1)?;
        let end = match self.peek() {
            Some(token) if token.kind == RBRACE => {
                self.pos += 1;
                token.end()
            }
            _ => self.tokens.last().map_or(0, Token::end),
        };
        let start = self.tree.node(node)?.span.start.offset;
        let span = self.tree.span(start, end);
        self.tree.node_mut(node)?.span = span;
        Ok(())
    }

    fn style_rule(&mut self, parent: NodeId, brace: usize, depth: usize) -> Result<(), ParseError> {
        let start = self.pos;
        let selector = self.text(start, brace).to_string();
        let span = self
            .tree
            .span(self.tokens[start].start(), self.tokens[brace].end());
        let rule = self.link(
            parent,
            NodeSpec::new("StyleRule", span).with_data(NodeData::StyleRule { selector }),
        )?;
        self.block(rule, brace, depth)
    }

    fn at_rule(&mut self, parent: NodeId, depth: usize) -> Result<(), ParseError> {
        let tokens = self.tokens;
        let start = self.pos;
        let keyword = &tokens[start];
        let name = keyword.value.trim_start_matches('@').to_string();
        self.pos += 1;
        let stop = self.scan();
        let (prelude_end, end_token) = match stop {
            Stop::Block(i) | Stop::Semicolon(i) => (i, Some(i)),
            Stop::End(i) => (i, self.last_significant(start, i)),
        };
        let prelude = self.text(start + 1, prelude_end).to_string();
        let end = end_token.map_or(keyword.end(), |i| tokens[i].end());
        let span = self.tree.span(keyword.start(), end);
        let node = self.link(
            parent,
            NodeSpec::new("AtRule", span).with_data(NodeData::AtRule { name, prelude }),
        )?;
        match stop {
            Stop::Block(brace) => self.block(node, brace, depth),
            other => {
                self.skip_to(other);
                Ok(())
            }
        }
    }

    fn declaration(&mut self, parent: NodeId, stop: Stop) -> Result<(), ParseError> {
        let start = self.pos;
        let end = match stop {
            Stop::Block(i) | Stop::Semicolon(i) | Stop::End(i) => i,
        };
        self.skip_to(stop);

        let Some(colon) = (start..end).find(|&i| self.tokens[i].kind == COLON) else {
            // Not a declaration; dropped like any other stray tokens.
            return Ok(());
        };
        let property = self.text(start, colon).to_string();
        if property.is_empty() {
            return Ok(());
        }
        let (value, important) = split_important(self.text(colon + 1, end));
        let last = self.last_significant(start, end).unwrap_or(colon);
        let span = self
            .tree
            .span(self.tokens[start].start(), self.tokens[last].end());
        self.link(
            parent,
            NodeSpec::new("Declaration", span).with_data(NodeData::declaration(
                property,
                value,
                important,
            )),
        )?;
        Ok(())
    }
}

/// Splits a trailing `!important` (case-insensitive, optional space after
/// the `!`) off a declaration value.
fn split_important(value: &str) -> (&str, bool) {
    const KEYWORD: &str = "important";
    if value.len() >= KEYWORD.len() {
        let split = value.len() - KEYWORD.len();
        if value.is_char_boundary(split) && value[split..].eq_ignore_ascii_case(KEYWORD) {
            let rest = value[..split].trim_end();
            if let Some(rest) = rest.strip_suffix('!') {
                return (rest.trim_end(), true);
            }
        }
    }
    (value, false)
}
