//! Built-in plugins.

use serde_json::Value;
use synth_ast::{BatchProcessor, Tree, Zipper};
use tracing::debug;

use crate::Plugin;

/// Metadata key written by [`node_stats`].
pub const NODE_STATS_KEY: &str = "nodeStats";

/// Removes every `Comment` node.
pub fn strip_comments() -> Plugin {
    Plugin::sync("strip-comments", env!("CARGO_PKG_VERSION"), |tree| {
        let (zipper, removed) = Zipper::from_tree(&tree)?.retain(|node| &*node.kind != "Comment");
        if removed == 0 {
            return Ok(tree);
        }
        debug!("Stripped {} comment nodes", removed);
        Ok(zipper.to_tree(&tree)?)
    })
}

/// Records the number of nodes per type in the tree metadata.
pub fn node_stats() -> Plugin {
    Plugin::sync("node-stats", env!("CARGO_PKG_VERSION"), |mut tree: Tree| {
        let counts = BatchProcessor::default().count_by_type(&tree);
        let value = counts
            .into_iter()
            .map(|(kind, count)| (kind, Value::from(count)))
            .collect::<serde_json::Map<_, _>>();
        tree.set_metadata(NODE_STATS_KEY, Value::Object(value));
        Ok(tree)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pipeline;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use synth_parser::{BuildContext, CssLanguage, Parser};

    fn css(source: &str) -> Tree {
        CssLanguage::new()
            .parse(source, &BuildContext::new())
            .unwrap()
    }

    #[test]
    fn test_strip_comments() {
        let tree = css("/* a */ x { /* b */ color: red; }");
        let mut pipeline = Pipeline::new();
        pipeline.use_plugin(strip_comments());
        let out = pipeline.run(tree, &[]).unwrap();

        assert!(out.validate().is_ok());
        let kinds: Vec<_> = out
            .descendants(out.root())
            .into_iter()
            .map(|id| out.kind_name(id).to_string())
            .collect();
        assert_eq!(kinds, vec!["StyleRule", "Declaration"]);
    }

    #[test]
    fn test_strip_comments_without_comments_keeps_tree() {
        let tree = css("x { color: red; }");
        let generation = tree.generation();
        let out = Pipeline::new()
            .use_plugin(strip_comments())
            .run(tree, &[])
            .unwrap();
        assert_eq!(out.generation(), generation);
    }

    #[test]
    fn test_strip_comments_across_many_rules() {
        let source: String = (0..200)
            .map(|i| format!("/* {i} */ r{i} {{ /* x */ a: b }}\n"))
            .collect();
        let out = Pipeline::new()
            .use_plugin(strip_comments())
            .run(css(&source), &[])
            .unwrap();

        let counts = BatchProcessor::default().count_by_type(&out);
        assert_eq!(counts.get("Comment"), None);
        assert_eq!(counts["StyleRule"], 200);
        assert_eq!(counts["Declaration"], 200);
    }

    #[test]
    fn test_node_stats() {
        let tree = css("a { b: c; d: e } f {}");
        let out = Pipeline::new()
            .use_plugin(node_stats())
            .run(tree, &[])
            .unwrap();
        assert_eq!(
            out.meta().metadata[NODE_STATS_KEY],
            json!({ "Declaration": 2, "StyleRule": 2, "root": 1 })
        );
    }
}
