//! Minimal hast (HTML syntax tree) model for pre-highlighted code.
//!
//! Highlighters emit hast so that markup can be computed at compile time,
//! stored as JSON next to the compiled document, and serialized to HTML at
//! render time without re-running the highlighter.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A hast node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HastNode {
    /// Document fragment root.
    Root {
        /// Child nodes.
        #[serde(default)]
        children: Vec<HastNode>,
    },
    /// An HTML element.
    Element {
        /// Lowercase tag name.
        #[serde(rename = "tagName")]
        tag_name: String,
        /// hast properties (`className` arrays, `style` strings, booleans, ...).
        #[serde(default)]
        properties: BTreeMap<String, JsonValue>,
        /// Child nodes.
        #[serde(default)]
        children: Vec<HastNode>,
    },
    /// Text content.
    Text {
        /// Unescaped text.
        value: String,
    },
    /// HTML comment; dropped on serialization.
    Comment {
        /// Comment body.
        value: String,
    },
}

impl HastNode {
    /// Creates a text node.
    pub fn text(value: impl Into<String>) -> Self {
        HastNode::Text {
            value: value.into(),
        }
    }

    /// Creates an element with no properties.
    pub fn element(tag_name: impl Into<String>, children: Vec<HastNode>) -> Self {
        HastNode::Element {
            tag_name: tag_name.into(),
            properties: BTreeMap::new(),
            children,
        }
    }

    /// Adds a property to an element; other node kinds are returned unchanged.
    pub fn with_property(mut self, name: &str, value: impl Into<JsonValue>) -> Self {
        if let HastNode::Element { properties, .. } = &mut self {
            properties.insert(name.to_string(), value.into());
        }
        self
    }

    /// Concatenated text content of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Serializes the tree to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_html(self, &mut out);
        out
    }
}

fn collect_text(node: &HastNode, out: &mut String) {
    match node {
        HastNode::Root { children } | HastNode::Element { children, .. } => {
            for child in children {
                collect_text(child, out);
            }
        }
        HastNode::Text { value } => out.push_str(value),
        HastNode::Comment { .. } => {}
    }
}

fn write_html(node: &HastNode, out: &mut String) {
    match node {
        HastNode::Root { children } => {
            for child in children {
                write_html(child, out);
            }
        }
        HastNode::Element {
            tag_name,
            properties,
            children,
        } => {
            out.push('<');
            out.push_str(tag_name);
            for (name, value) in properties {
                write_attribute(name, value, out);
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag_name.as_str()) {
                return;
            }
            for child in children {
                write_html(child, out);
            }
            out.push_str("</");
            out.push_str(tag_name);
            out.push('>');
        }
        HastNode::Text { value } => out.push_str(&html_escape::encode_text(value)),
        HastNode::Comment { .. } => {}
    }
}

fn write_attribute(name: &str, value: &JsonValue, out: &mut String) {
    let rendered = match value {
        JsonValue::Null | JsonValue::Bool(false) => return,
        JsonValue::Bool(true) => {
            out.push(' ');
            out.push_str(&attribute_name(name));
            return;
        }
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Array(items) => items
            .iter()
            .map(|item| match item {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" "),
        JsonValue::Object(_) => value.to_string(),
    };
    out.push(' ');
    out.push_str(&attribute_name(name));
    out.push_str("=\"");
    out.push_str(&html_escape::encode_double_quoted_attribute(&rendered));
    out.push('"');
}

/// Maps a hast property name to its HTML attribute name.
fn attribute_name(property: &str) -> String {
    match property {
        "className" => return "class".to_string(),
        "htmlFor" => return "for".to_string(),
        _ => {}
    }

    let mut name = String::with_capacity(property.len() + 4);
    let data_like = property.starts_with("data") || property.starts_with("aria");
    for (i, c) in property.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if data_like && i >= 4 {
                name.push('-');
            }
            name.push(c.to_ascii_lowercase());
        } else {
            name.push(c);
        }
    }
    name
}
