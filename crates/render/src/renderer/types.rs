//! Type definitions for the safe renderer.

use serde::Serialize;
use std::collections::BTreeMap;

/// A component prop value - either a literal string or a JS expression.
///
/// Expressions are never evaluated; only their source text is carried.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PropValue {
    /// A literal string value (from key="value").
    Literal {
        /// The string value.
        value: String,
    },
    /// A JS expression (from key={expression}).
    Expression {
        /// Expression source text.
        value: String,
    },
}

impl PropValue {
    /// Creates a literal string prop value.
    pub fn literal(value: impl Into<String>) -> Self {
        PropValue::Literal {
            value: value.into(),
        }
    }

    /// Creates an expression prop value.
    pub fn expression(value: impl Into<String>) -> Self {
        PropValue::Expression {
            value: value.into(),
        }
    }

    /// Returns the raw value regardless of type.
    pub fn value(&self) -> &str {
        match self {
            PropValue::Literal { value } | PropValue::Expression { value } => value,
        }
    }

    /// Returns true if this is an expression.
    pub fn is_expression(&self) -> bool {
        matches!(self, PropValue::Expression { .. })
    }

    /// Interprets the prop as a boolean flag.
    ///
    /// `{true}`, `"true"` and an empty literal (bare attribute) are true.
    pub fn as_flag(&self) -> bool {
        match self {
            PropValue::Literal { value } => value.is_empty() || value == "true",
            PropValue::Expression { value } => value.trim() == "true",
        }
    }
}

/// Component props keyed by name.
pub type Props = BTreeMap<String, PropValue>;

/// One node of the rendered output.
///
/// HTML fragments are already escaped. Component blocks are resolved by the
/// page layer (see [`crate::html::ComponentSet`]).
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RenderBlock {
    /// Plain HTML content.
    Html {
        /// The HTML content string.
        content: String,
    },

    /// A named component invocation.
    Component {
        /// Component name (e.g., "MathFormula", "CodeBlock").
        name: String,
        /// Component props.
        props: Props,
        /// Structured children for the component's default slot.
        slot_children: Vec<RenderBlock>,
    },
}

impl RenderBlock {
    /// Creates an HTML block.
    pub fn html(content: impl Into<String>) -> Self {
        RenderBlock::Html {
            content: content.into(),
        }
    }

    /// Creates a component block.
    pub fn component(name: impl Into<String>, props: Props, slot_children: Vec<RenderBlock>) -> Self {
        RenderBlock::Component {
            name: name.into(),
            props,
            slot_children,
        }
    }

    /// Returns the component name for component blocks.
    pub fn component_name(&self) -> Option<&str> {
        match self {
            RenderBlock::Component { name, .. } => Some(name),
            RenderBlock::Html { .. } => None,
        }
    }
}

/// Represents the type of scope currently being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Document root - not inside any specific block element.
    Root,
    /// Inside a list element (`<ul>` or `<ol>`).
    List {
        /// Whether items are separated by blank lines.
        spread: bool,
    },
}
