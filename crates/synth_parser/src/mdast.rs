//! Markdown parser using markdown-rs (wooorm/markdown-rs).
//!
//! Converts the mdast produced by the `markdown` crate into a [`Tree`]. Node
//! kinds keep their mdast names (`paragraph`, `emphasis`, `link`, ...). This
//! parser is not incremental; [`crate::MarkdownLanguage`] is.

use std::sync::Arc;

use ::markdown::mdast::Node as Mdast;
use ::markdown::{ParseOptions, to_mdast};
use serde_json::{Map, Value};
use synth_ast::{NodeData, NodeId, NodeSpec, Tree};
use tracing::debug;

use crate::{BuildContext, ParseError, Parser};

/// Full CommonMark + GFM parser backed by `markdown-rs`.
pub struct MdastParser;

impl MdastParser {
    /// Creates a new parser with GFM options.
    pub fn new() -> Self {
        Self
    }

    /// Gets default parse options (GFM).
    fn default_options() -> ParseOptions {
        ParseOptions::gfm()
    }

    /// Converts `node` and its descendants, linking the result under `parent`.
    fn convert_node(&self, tree: &mut Tree, parent: NodeId, node: &Mdast) -> Result<(), ParseError> {
        let (kind, data, attrs) = match node {
            Mdast::Root(_) => {
                return self.convert_children(tree, parent, node);
            }
            Mdast::Paragraph(_) => ("paragraph", NodeData::None, Map::new()),
            Mdast::Heading(heading) => (
                "heading",
                NodeData::Heading {
                    depth: heading.depth,
                },
                Map::new(),
            ),
            Mdast::Text(text) => ("text", NodeData::text(&text.value), Map::new()),
            Mdast::Emphasis(_) => ("emphasis", NodeData::None, Map::new()),
            Mdast::Strong(_) => ("strong", NodeData::None, Map::new()),
            Mdast::Delete(_) => ("delete", NodeData::None, Map::new()),
            Mdast::InlineCode(code) => ("inlineCode", NodeData::text(&code.value), Map::new()),
            Mdast::Code(code) => (
                "code",
                NodeData::Code {
                    lang: code.lang.clone(),
                    meta: code.meta.clone(),
                    value: code.value.clone(),
                },
                Map::new(),
            ),
            Mdast::Link(link) => ("link", NodeData::None, link_attrs(&link.url, link.title.as_deref())),
            Mdast::Image(image) => {
                let mut attrs = link_attrs(&image.url, image.title.as_deref());
                attrs.insert("alt".into(), Value::from(image.alt.as_str()));
                ("image", NodeData::None, attrs)
            }
            Mdast::List(list) => {
                let mut attrs = Map::new();
                attrs.insert("ordered".into(), Value::from(list.ordered));
                if let Some(start) = list.start {
                    attrs.insert("start".into(), Value::from(start));
                }
                attrs.insert("spread".into(), Value::from(list.spread));
                ("list", NodeData::None, attrs)
            }
            Mdast::ListItem(item) => (
                "listItem",
                NodeData::ListItem {
                    ordered: false,
                    checked: item.checked,
                },
                Map::new(),
            ),
            Mdast::Blockquote(_) => ("blockquote", NodeData::None, Map::new()),
            Mdast::ThematicBreak(_) => ("thematicBreak", NodeData::None, Map::new()),
            Mdast::Break(_) => ("break", NodeData::None, Map::new()),
            Mdast::Html(html) => ("html", NodeData::text(&html.value), Map::new()),

            // Table support (GFM)
            Mdast::Table(_) => ("table", NodeData::None, Map::new()),
            Mdast::TableRow(_) => ("tableRow", NodeData::None, Map::new()),
            Mdast::TableCell(_) => ("tableCell", NodeData::None, Map::new()),

            // Footnotes (GFM)
            Mdast::FootnoteDefinition(def) => (
                "footnoteDefinition",
                NodeData::None,
                reference_attrs(&def.identifier, def.label.as_deref()),
            ),
            Mdast::FootnoteReference(r) => (
                "footnoteReference",
                NodeData::None,
                reference_attrs(&r.identifier, r.label.as_deref()),
            ),

            // Reference nodes
            Mdast::LinkReference(r) => (
                "linkReference",
                NodeData::None,
                reference_attrs(&r.identifier, r.label.as_deref()),
            ),
            Mdast::ImageReference(r) => (
                "imageReference",
                NodeData::None,
                reference_attrs(&r.identifier, r.label.as_deref()),
            ),
            Mdast::Definition(def) => {
                let mut attrs = reference_attrs(&def.identifier, def.label.as_deref());
                attrs.extend(link_attrs(&def.url, def.title.as_deref()));
                ("definition", NodeData::None, attrs)
            }

            // Fallback for unsupported nodes
            _ => ("html", NodeData::None, Map::new()),
        };

        let span = self.node_span(tree, node);
        let id = tree.add_node(NodeSpec::new(kind, span).with_data(data).with_attrs(attrs));
        tree.append_child(parent, id)?;
        self.convert_children(tree, id, node)
    }

    fn convert_children(&self, tree: &mut Tree, parent: NodeId, node: &Mdast) -> Result<(), ParseError> {
        if let Some(children) = node.children() {
            for child in children {
                self.convert_node(tree, parent, child)?;
            }
        }
        Ok(())
    }

    /// Gets the span for an mdast node.
    fn node_span(&self, tree: &Tree, node: &Mdast) -> synth_ast::Span {
        match node.position() {
            Some(pos) => tree.span(pos.start.offset as u32, pos.end.offset as u32),
            None => tree.span(0, 0),
        }
    }
}

fn link_attrs(url: &str, title: Option<&str>) -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert("url".into(), Value::from(url));
    if let Some(title) = title {
        attrs.insert("title".into(), Value::from(title));
    }
    attrs
}

fn reference_attrs(identifier: &str, label: Option<&str>) -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert("identifier".into(), Value::from(identifier));
    if let Some(label) = label {
        attrs.insert("label".into(), Value::from(label));
    }
    attrs
}

impl Default for MdastParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for MdastParser {
    fn name(&self) -> &str {
        "mdast"
    }

    /// Selected by name only; `.md` files go to the incremental parser.
    fn extensions(&self) -> &[&str] {
        &[]
    }

    fn parse(&self, source: &str, cx: &BuildContext) -> Result<Tree, ParseError> {
        let options = Self::default_options();
        let mdast =
            to_mdast(source, &options).map_err(|e| ParseError::invalid_source(e.to_string()))?;

        let mut tree = cx.create_tree(self.name(), Arc::from(source));
        let root = tree.root();
        self.convert_node(&mut tree, root, &mdast)?;
        debug!("Converted mdast into {} nodes", tree.node_count());
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(source: &str) -> Tree {
        MdastParser::new()
            .parse(source, &BuildContext::new())
            .unwrap()
    }

    fn kinds(tree: &Tree, id: NodeId) -> Vec<&str> {
        tree.children(id)
            .iter()
            .map(|&c| tree.kind_name(c))
            .collect()
    }

    #[test]
    fn test_parse_simple_markdown() {
        let tree = parse("# Hello\n\nThis is a paragraph.");
        assert_eq!(tree.language(), "mdast");
        assert_eq!(kinds(&tree, tree.root()), vec!["heading", "paragraph"]);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_parse_heading() {
        let tree = parse("# Level 1\n\n## Level 2");
        let headings = tree.children(tree.root());
        assert_eq!(
            tree.node(headings[1]).unwrap().data,
            NodeData::Heading { depth: 2 }
        );
    }

    #[test]
    fn test_parse_link() {
        let tree = parse("[Rust](https://www.rust-lang.org \"Rust\")");
        let paragraph = tree.children(tree.root())[0];
        let link = tree.children(paragraph)[0];
        let node = tree.node(link).unwrap();
        assert_eq!(tree.kind_of(node), "link");
        assert_eq!(node.field("url"), Some(json!("https://www.rust-lang.org")));
        assert_eq!(node.field("title"), Some(json!("Rust")));
        assert_eq!(kinds(&tree, link), vec!["text"]);
    }

    #[test]
    fn test_parse_task_list() {
        let tree = parse("- [x] done\n- [ ] todo\n");
        let list = tree.children(tree.root())[0];
        assert_eq!(tree.kind_name(list), "list");
        let checked: Vec<_> = tree
            .children(list)
            .iter()
            .map(|&id| tree.node(id).unwrap().field("checked"))
            .collect();
        assert_eq!(checked, vec![Some(json!(true)), Some(json!(false))]);
    }

    #[test]
    fn test_parse_code_block() {
        let tree = parse("```rust\nfn main() {}\n```");
        let code = tree.children(tree.root())[0];
        assert_eq!(
            tree.node(code).unwrap().data,
            NodeData::Code {
                lang: Some("rust".into()),
                meta: None,
                value: "fn main() {}".into()
            }
        );
    }

    #[test]
    fn test_parse_empty() {
        let tree = parse("");
        assert!(tree.children(tree.root()).is_empty());
    }
}
