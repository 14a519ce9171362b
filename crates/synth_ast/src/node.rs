//! Node records stored in a tree arena.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Span, Symbol};

/// Open attribute bag for dynamic or plugin-authored fields.
pub type Attrs = BTreeMap<String, Value>;

/// Index of a node within its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// The root of every tree.
    pub const ROOT: NodeId = NodeId(0);

    /// Creates a node id from a raw index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw value.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Typed payload of a node.
///
/// Each variant belongs to a concrete node kind. Anything that does not fit a
/// variant lives in [`Node::attrs`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NodeData {
    #[default]
    None,
    Text {
        value: String,
    },
    Heading {
        depth: u8,
    },
    Code {
        lang: Option<String>,
        meta: Option<String>,
        value: String,
    },
    ListItem {
        ordered: bool,
        checked: Option<bool>,
    },
    StyleRule {
        selector: String,
    },
    Declaration {
        property: String,
        value: String,
        important: bool,
    },
    AtRule {
        name: String,
        prelude: String,
    },
    Comment {
        value: String,
    },
}

impl NodeData {
    /// Creates text data.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    /// Creates declaration data.
    pub fn declaration(property: impl Into<String>, value: impl Into<String>, important: bool) -> Self {
        Self::Declaration {
            property: property.into(),
            value: value.into(),
            important,
        }
    }

    /// Returns true for [`NodeData::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns the primary textual payload, if the variant has one.
    pub fn text_value(&self) -> Option<&str> {
        match self {
            Self::Text { value } | Self::Code { value, .. } | Self::Comment { value } => {
                Some(value)
            }
            Self::Declaration { value, .. } => Some(value),
            Self::StyleRule { selector } => Some(selector),
            Self::AtRule { prelude, .. } => Some(prelude),
            _ => None,
        }
    }

    /// Converts the payload into its string-keyed form.
    ///
    /// Optional fields that are absent are omitted.
    pub fn to_attrs(&self) -> Attrs {
        let mut map = Attrs::new();
        match self {
            Self::None => {}
            Self::Text { value } | Self::Comment { value } => {
                map.insert("value".into(), Value::from(value.as_str()));
            }
            Self::Heading { depth } => {
                map.insert("depth".into(), Value::from(*depth));
            }
            Self::Code { lang, meta, value } => {
                if let Some(lang) = lang {
                    map.insert("lang".into(), Value::from(lang.as_str()));
                }
                if let Some(meta) = meta {
                    map.insert("meta".into(), Value::from(meta.as_str()));
                }
                map.insert("value".into(), Value::from(value.as_str()));
            }
            Self::ListItem { ordered, checked } => {
                map.insert("ordered".into(), Value::from(*ordered));
                if let Some(checked) = checked {
                    map.insert("checked".into(), Value::from(*checked));
                }
            }
            Self::StyleRule { selector } => {
                map.insert("selector".into(), Value::from(selector.as_str()));
            }
            Self::Declaration {
                property,
                value,
                important,
            } => {
                map.insert("property".into(), Value::from(property.as_str()));
                map.insert("value".into(), Value::from(value.as_str()));
                map.insert("important".into(), Value::from(*important));
            }
            Self::AtRule { name, prelude } => {
                map.insert("name".into(), Value::from(name.as_str()));
                map.insert("prelude".into(), Value::from(prelude.as_str()));
            }
        }
        map
    }

    /// Recovers a typed payload from a string-keyed map.
    ///
    /// A typed variant is produced only when `kind` names a known node kind
    /// and `map` holds exactly that variant's keys with the expected JSON
    /// types. Otherwise the map is returned untouched as the fallback bag, so
    /// `to_attrs` followed by `from_attrs` never loses or reshapes fields.
    pub fn from_attrs(kind: &str, map: Attrs) -> (NodeData, Attrs) {
        match Self::typed_from(kind, &map) {
            Some(data) => (data, Attrs::new()),
            None => (NodeData::None, map),
        }
    }

    fn typed_from(kind: &str, map: &Attrs) -> Option<NodeData> {
        let keys = |required: &[&str], optional: &[&str]| {
            required.iter().all(|k| map.contains_key(*k))
                && map
                    .keys()
                    .all(|k| required.contains(&k.as_str()) || optional.contains(&k.as_str()))
        };
        let string = |k: &str| map.get(k).and_then(Value::as_str).map(str::to_owned);
        let opt_string = |k: &str| match map.get(k) {
            None => Some(None),
            Some(Value::String(s)) => Some(Some(s.clone())),
            Some(_) => None,
        };

        let data = match kind {
            "text" if keys(&["value"], &[]) => NodeData::Text {
                value: string("value")?,
            },
            "Comment" if keys(&["value"], &[]) => NodeData::Comment {
                value: string("value")?,
            },
            "heading" if keys(&["depth"], &[]) => NodeData::Heading {
                depth: u8::try_from(map.get("depth")?.as_u64()?).ok()?,
            },
            "code" if keys(&["value"], &["lang", "meta"]) => NodeData::Code {
                lang: opt_string("lang")?,
                meta: opt_string("meta")?,
                value: string("value")?,
            },
            "listItem" if keys(&["ordered"], &["checked"]) => NodeData::ListItem {
                ordered: map.get("ordered")?.as_bool()?,
                checked: match map.get("checked") {
                    None => None,
                    Some(v) => Some(v.as_bool()?),
                },
            },
            "StyleRule" if keys(&["selector"], &[]) => NodeData::StyleRule {
                selector: string("selector")?,
            },
            "Declaration" if keys(&["property", "value", "important"], &[]) => {
                NodeData::Declaration {
                    property: string("property")?,
                    value: string("value")?,
                    important: map.get("important")?.as_bool()?,
                }
            }
            "AtRule" if keys(&["name", "prelude"], &[]) => NodeData::AtRule {
                name: string("name")?,
                prelude: string("prelude")?,
            },
            _ => return None,
        };
        Some(data)
    }
}

/// A node record.
///
/// `parent` and `children` are plain arena indices. They never keep anything
/// alive.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: Symbol,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub span: Span,
    pub data: NodeData,
    pub attrs: Attrs,
}

impl Node {
    /// Creates an unlinked node shell.
    pub fn blank() -> Self {
        Self {
            id: NodeId::default(),
            kind: Symbol::default(),
            parent: None,
            children: Vec::new(),
            span: Span::default(),
            data: NodeData::None,
            attrs: Attrs::new(),
        }
    }

    /// Resets every field to its default, keeping the children allocation.
    pub fn reset(&mut self) {
        self.id = NodeId::default();
        self.kind = Symbol::default();
        self.parent = None;
        self.children.clear();
        self.span = Span::default();
        self.data = NodeData::None;
        self.attrs.clear();
    }

    /// Returns true if the node has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Typed payload and fallback attributes merged into one map.
    ///
    /// Typed fields win over fallback entries with the same key.
    pub fn merged_data(&self) -> Attrs {
        let mut merged = self.attrs.clone();
        merged.extend(self.data.to_attrs());
        merged
    }

    /// Looks up a field in the typed payload first, then the fallback map.
    pub fn field(&self, key: &str) -> Option<Value> {
        self.data
            .to_attrs()
            .remove(key)
            .or_else(|| self.attrs.get(key).cloned())
    }
}

/// Description of a node to add to a tree.
#[derive(Debug, Clone)]
pub struct NodeSpec<'a> {
    pub kind: &'a str,
    pub span: Span,
    pub data: NodeData,
    pub attrs: Attrs,
}

impl<'a> NodeSpec<'a> {
    /// Creates a spec without payload.
    pub fn new(kind: &'a str, span: Span) -> Self {
        Self {
            kind,
            span,
            data: NodeData::None,
            attrs: Attrs::new(),
        }
    }

    /// Sets the typed payload.
    pub fn with_data(mut self, data: NodeData) -> Self {
        self.data = data;
        self
    }

    /// Adds a fallback attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Replaces the fallback attributes with the entries of a JSON object.
    pub fn with_attrs(mut self, attrs: Map<String, Value>) -> Self {
        self.attrs = attrs.into_iter().collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn attrs(value: Value) -> Attrs {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => Attrs::new(),
        }
    }

    #[rstest]
    #[case("text", NodeData::text("hi"))]
    #[case("heading", NodeData::Heading { depth: 3 })]
    #[case("code", NodeData::Code { lang: Some("rust".into()), meta: None, value: "fn".into() })]
    #[case("listItem", NodeData::ListItem { ordered: true, checked: Some(false) })]
    #[case("StyleRule", NodeData::StyleRule { selector: "a > b".into() })]
    #[case("Declaration", NodeData::declaration("color", "red", true))]
    #[case("AtRule", NodeData::AtRule { name: "media".into(), prelude: "screen".into() })]
    #[case("Comment", NodeData::Comment { value: " note ".into() })]
    fn test_typed_data_survives_attr_conversion(#[case] kind: &str, #[case] data: NodeData) {
        let (back, rest) = NodeData::from_attrs(kind, data.to_attrs());
        assert_eq!(back, data);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_from_attrs_keeps_unknown_shapes_in_fallback() {
        let map = attrs(json!({"value": "x", "extra": 1}));
        let (data, rest) = NodeData::from_attrs("text", map.clone());
        assert!(data.is_none());
        assert_eq!(rest, map);

        let map = attrs(json!({"depth": "two"}));
        let (data, rest) = NodeData::from_attrs("heading", map.clone());
        assert!(data.is_none());
        assert_eq!(rest, map);

        let map = attrs(json!({"depth": 300}));
        assert!(NodeData::from_attrs("heading", map).0.is_none());

        let map = attrs(json!({"value": "v"}));
        assert!(NodeData::from_attrs("inlineCode", map).0.is_none());
    }

    #[test]
    fn test_code_null_lang_stays_in_fallback() {
        let map = attrs(json!({"lang": null, "value": ""}));
        let (data, rest) = NodeData::from_attrs("code", map.clone());
        assert!(data.is_none());
        assert_eq!(rest, map);
    }

    #[test]
    fn test_merged_data_prefers_typed_fields() {
        let mut node = Node::blank();
        node.data = NodeData::text("typed");
        node.attrs.insert("value".into(), json!("fallback"));
        node.attrs.insert("extra".into(), json!(true));
        let merged = node.merged_data();
        assert_eq!(merged.get("value"), Some(&json!("typed")));
        assert_eq!(merged.get("extra"), Some(&json!(true)));
        assert_eq!(node.field("extra"), Some(json!(true)));
        assert_eq!(node.field("missing"), None);
    }

    #[test]
    fn test_reset_keeps_capacity() {
        let mut node = Node::blank();
        node.children.extend([NodeId::new(1), NodeId::new(2)]);
        node.data = NodeData::text("x");
        node.parent = Some(NodeId::ROOT);
        let capacity = node.children.capacity();
        node.reset();
        assert_eq!(node, Node::blank());
        assert_eq!(node.children.capacity(), capacity);
    }

    #[test]
    fn test_text_value() {
        assert_eq!(NodeData::declaration("a", "b", false).text_value(), Some("b"));
        assert_eq!(NodeData::Heading { depth: 1 }.text_value(), None);
        assert_eq!(NodeData::None.text_value(), None);
    }

    #[test]
    fn test_node_spec_builder() {
        let spec = NodeSpec::new("thing", Span::default())
            .with_data(NodeData::text("v"))
            .with_attr("flag", true);
        assert_eq!(spec.kind, "thing");
        assert_eq!(spec.attrs.get("flag"), Some(&json!(true)));
    }
}
