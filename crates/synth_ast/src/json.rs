//! JSON form of a tree.
//!
//! The wire shape keeps the arena layout: `nodes[i].id == i`, links are plain
//! ids, and `data` is the typed payload merged with the fallback bag.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Attrs, Node, NodeData, NodeId, Span, StringInterner, Tree, TreeError, TreeMeta};

#[derive(Debug, Serialize, Deserialize)]
struct TreeJson {
    root: NodeId,
    nodes: Vec<NodeJson>,
    meta: TreeMeta,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeJson {
    id: NodeId,
    #[serde(rename = "type")]
    kind: String,
    parent: Option<NodeId>,
    #[serde(default)]
    children: Vec<NodeId>,
    span: Span,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    data: Attrs,
}

impl Tree {
    /// Converts the tree into a JSON value.
    pub fn to_value(&self) -> Result<Value, TreeError> {
        let nodes = self
            .nodes()
            .iter()
            .map(|node| NodeJson {
                id: node.id,
                kind: self.kind_of(node).to_string(),
                parent: node.parent,
                children: node.children.clone(),
                span: node.span,
                data: node.merged_data(),
            })
            .collect();
        let wire = TreeJson {
            root: self.root(),
            nodes,
            meta: self.meta().clone(),
        };
        Ok(serde_json::to_value(wire)?)
    }

    /// Serializes the tree to a JSON string.
    pub fn to_json(&self) -> Result<String, TreeError> {
        Ok(serde_json::to_string(&self.to_value()?)?)
    }

    /// Serializes the tree to an indented JSON string.
    pub fn to_json_pretty(&self) -> Result<String, TreeError> {
        Ok(serde_json::to_string_pretty(&self.to_value()?)?)
    }

    /// Rebuilds a tree from a JSON value and validates it.
    pub fn from_value(value: Value) -> Result<Tree, TreeError> {
        let wire: TreeJson = serde_json::from_value(value)?;
        Self::from_wire(wire)
    }

    /// Rebuilds a tree from a JSON string and validates it.
    pub fn from_json(json: &str) -> Result<Tree, TreeError> {
        let wire: TreeJson = serde_json::from_str(json)?;
        Self::from_wire(wire)
    }

    fn from_wire(wire: TreeJson) -> Result<Tree, TreeError> {
        let mut strings = StringInterner::new();
        let mut nodes = Vec::with_capacity(wire.nodes.len());
        for (index, raw) in wire.nodes.into_iter().enumerate() {
            if raw.id.index() != index {
                return Err(TreeError::structure(format!(
                    "node at position {index} has id {}",
                    raw.id
                )));
            }
            let kind = strings.intern(&raw.kind);
            let (data, attrs) = NodeData::from_attrs(&raw.kind, raw.data);
            nodes.push(Node {
                id: raw.id,
                kind,
                parent: raw.parent,
                children: raw.children,
                span: raw.span,
                data,
                attrs,
            });
        }
        let tree = Tree::from_parts(wire.root, nodes, strings, wire.meta);
        tree.validate()?;
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeSpec;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Tree {
        let mut tree = Tree::new("markdown", "# Hi\n\n```rs\nx\n```\n");
        let heading = tree.add_node(
            NodeSpec::new("heading", tree.span(0, 4)).with_data(NodeData::Heading { depth: 1 }),
        );
        let text = tree.add_node(
            NodeSpec::new("text", tree.span(2, 4)).with_data(NodeData::text("Hi")),
        );
        let code = tree.add_node(
            NodeSpec::new("code", tree.span(6, 18))
                .with_data(NodeData::Code {
                    lang: Some("rs".into()),
                    meta: None,
                    value: "x".into(),
                })
                .with_attr("plugin", json!({"seen": true})),
        );
        tree.append_child(tree.root(), heading).unwrap();
        tree.append_child(heading, text).unwrap();
        tree.append_child(tree.root(), code).unwrap();
        tree.set_metadata("author", "someone");
        tree
    }

    #[test]
    fn test_round_trip_preserves_everything() {
        let tree = sample();
        let back = Tree::from_json(&tree.to_json().unwrap()).unwrap();

        assert!(tree.structurally_eq(&back));
        assert_eq!(back.node_count(), tree.node_count());
        assert_eq!(back.root(), tree.root());
        assert_eq!(back.meta(), tree.meta());
        assert_eq!(back.to_value().unwrap(), tree.to_value().unwrap());
    }

    #[test]
    fn test_typed_payload_is_recovered() {
        let back = Tree::from_json(&sample().to_json().unwrap()).unwrap();
        let heading = back.node(NodeId::new(1)).unwrap();
        assert_eq!(heading.data, NodeData::Heading { depth: 1 });
        assert!(heading.attrs.is_empty());

        // Mixed typed and plugin fields stay in the fallback bag.
        let code = back.node(NodeId::new(3)).unwrap();
        assert!(code.data.is_none());
        assert_eq!(code.attrs.get("lang"), Some(&json!("rs")));
        assert_eq!(code.attrs.get("plugin"), Some(&json!({"seen": true})));
    }

    #[test]
    fn test_wire_shape() {
        let value = Tree::new("css", "").to_value().unwrap();
        assert_eq!(value["root"], json!(0));
        assert_eq!(value["nodes"][0]["type"], json!("root"));
        assert_eq!(value["nodes"][0]["parent"], Value::Null);
        assert!(value["nodes"][0].get("data").is_none());
        assert_eq!(value["meta"]["language"], json!("css"));
        assert_eq!(value["meta"]["source"], json!(""));
    }

    #[test]
    fn test_from_json_rejects_broken_links() {
        let mut value = sample().to_value().unwrap();
        value["nodes"][2]["parent"] = json!(3);
        assert!(matches!(
            Tree::from_value(value),
            Err(TreeError::Structure(_))
        ));

        let mut value = sample().to_value().unwrap();
        value["nodes"][1]["id"] = json!(7);
        assert!(Tree::from_value(value).is_err());

        assert!(matches!(
            Tree::from_json("{not json"),
            Err(TreeError::Serialization(_))
        ));
    }
}
