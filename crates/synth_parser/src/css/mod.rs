//! CSS language module.
//!
//! Produces `StyleRule { selector }`, `Declaration { property, value,
//! important }`, `AtRule { name, prelude }` and `Comment { value }` nodes.
//! Rules nest inside rule and at-rule blocks.

mod lexer;
mod parser;

use std::sync::Arc;

use synth_ast::Tree;
use tracing::debug;

pub use lexer::CssLexer;
pub use parser::MAX_NESTING;

use crate::{BuildContext, IncrementalLanguage, Lexer, ParseError, Parser, TokenStream, tokenize_with};
use parser::CssBuilder;

/// Token kinds produced by [`CssLexer`].
pub mod kinds {
    pub use super::lexer::{
        AT_KEYWORD, COLON, COMMA, COMMENT, DELIM, HASH, IDENT, LBRACE, LPAREN, NUMBER, RBRACE,
        RPAREN, SEMICOLON, STRING, WHITESPACE,
    };
}

/// CSS parser.
#[derive(Debug, Clone, Default)]
pub struct CssLanguage {
    lexer: Arc<CssLexer>,
}

impl CssLanguage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Parser for CssLanguage {
    fn name(&self) -> &str {
        "css"
    }

    fn extensions(&self) -> &[&str] {
        &["css"]
    }

    fn parse(&self, source: &str, cx: &BuildContext) -> Result<Tree, ParseError> {
        let tokens = tokenize_with(self.lexer.as_ref(), Arc::from(source));
        self.build(&tokens, cx)
    }
}

impl IncrementalLanguage for CssLanguage {
    fn lexer(&self) -> Arc<dyn Lexer> {
        self.lexer.clone()
    }

    fn build(&self, tokens: &TokenStream, cx: &BuildContext) -> Result<Tree, ParseError> {
        let tree = cx.create_tree(self.name(), Arc::clone(&tokens.source));
        let tree = CssBuilder::new(&tokens.tokens, tokens.source(), tree).build()?;
        debug!(
            "Built css tree: {} nodes from {} tokens",
            tree.node_count(),
            tokens.len()
        );
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use synth_ast::NodeData;

    fn parse(source: &str) -> Tree {
        CssLanguage::new()
            .parse(source, &BuildContext::new())
            .unwrap()
    }

    #[test]
    fn test_parse_simple_rule() {
        let tree = parse("a{color:red}");
        let rules = tree.children(tree.root());
        assert_eq!(rules.len(), 1);
        assert_eq!(tree.kind_name(rules[0]), "StyleRule");
        assert_eq!(
            tree.node(rules[0]).unwrap().data,
            NodeData::StyleRule {
                selector: "a".into()
            }
        );

        let decls = tree.children(rules[0]);
        assert_eq!(decls.len(), 1);
        let decl = tree.node(decls[0]).unwrap();
        assert_eq!(tree.kind_of(decl), "Declaration");
        assert_eq!(decl.data, NodeData::declaration("color", "red", false));
        assert_eq!(tree.text(decls[0]), "color:red");
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_parse_empty() {
        let tree = parse("");
        assert!(tree.children(tree.root()).is_empty());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_parse_stylesheet() {
        let tree = parse(
            "/* base */\n@import url(\"a.css\");\nbody, p > a:hover {\n  margin: 0 auto;\n  color: #333 !important\n}\n@media (max-width: 600px) {\n  .x { display: none; }\n}\n",
        );
        assert!(tree.validate().is_ok());
        assert_snapshot!(tree.dump().trim_end(), @r###"
        root [0..152]
          Comment [0..10] {"value":"base"}
          AtRule [11..32] {"name":"import","prelude":"url(\"a.css\")"}
          StyleRule [33..97] {"selector":"body, p > a:hover"}
            Declaration [55..69] {"important":false,"property":"margin","value":"0 auto"}
            Declaration [73..95] {"important":true,"property":"color","value":"#333"}
          AtRule [98..151] {"name":"media","prelude":"(max-width: 600px)"}
            StyleRule [128..149] {"selector":".x"}
              Declaration [133..146] {"important":false,"property":"display","value":"none"}
        "###);
    }

    #[test]
    fn test_nested_rule_inside_rule() {
        let tree = parse("a { color: red; &:hover { color: blue } }");
        let rule = tree.children(tree.root())[0];
        let kinds: Vec<_> = tree
            .children(rule)
            .iter()
            .map(|&id| tree.kind_name(id))
            .collect();
        assert_eq!(kinds, vec!["Declaration", "StyleRule"]);
    }

    #[test]
    fn test_malformed_input_is_lenient() {
        let tree = parse("} a { color red; b: ; : x; } c {");
        assert!(tree.validate().is_ok());
        let top: Vec<_> = tree
            .children(tree.root())
            .iter()
            .map(|&id| tree.kind_name(id))
            .collect();
        assert_eq!(top, vec!["StyleRule", "StyleRule"]);
        let first = tree.children(tree.root())[0];
        let decls = tree.children(first);
        assert_eq!(decls.len(), 1);
        assert_eq!(
            tree.node(decls[0]).unwrap().data,
            NodeData::declaration("b", "", false)
        );
    }

    #[test]
    fn test_excessive_nesting_is_rejected() {
        let source = "a{".repeat(MAX_NESTING + 2);
        let err = CssLanguage::new()
            .parse(&source, &BuildContext::new())
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidSource { .. }));
    }

    #[test]
    fn test_can_parse() {
        let css = CssLanguage::new();
        assert!(css.can_parse("CSS"));
        assert!(!css.can_parse("md"));
        assert_eq!(css.lexer().language(), "css");
    }
}
