//! Registry type definitions for component and element mappings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The set of components and element overrides available to content.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Components that JSX in content may invoke.
    pub components: Vec<ComponentDefinition>,
    /// Markdown elements rendered through an override.
    #[serde(default)]
    pub element_overrides: Vec<ElementOverride>,
}

/// A single component definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    /// Component name (e.g., "Challenge", "Video").
    pub name: String,
    /// Literal props injected when the invocation does not set them.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub default_props: BTreeMap<String, String>,
}

impl ComponentDefinition {
    /// Creates a definition without default props.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_props: BTreeMap::new(),
        }
    }

    /// Adds a default prop.
    pub fn with_default_prop(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_props.insert(key.into(), value.into());
        self
    }
}

/// Override applied to a markdown element (e.g., `blockquote`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementOverride {
    /// Element name as it would appear in HTML.
    pub element: String,
    /// How the element is rendered instead.
    #[serde(flatten)]
    pub strategy: OverrideStrategy,
}

/// Rendering strategy for an overridden element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "strategy", rename_all = "camelCase")]
pub enum OverrideStrategy {
    /// Callout box: the element gets `class_name` and an icon prefix.
    #[serde(rename_all = "camelCase")]
    Callout {
        /// Icon text placed before the content.
        icon: String,
        /// CSS class of the box; the icon uses `<class_name>-icon`.
        class_name: String,
    },
}

impl RegistryConfig {
    /// Check if a component name is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.component(name).is_some()
    }

    /// Get the definition of a registered component.
    pub fn component(&self, name: &str) -> Option<&ComponentDefinition> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Get the override for a markdown element.
    pub fn element_override(&self, element: &str) -> Option<&ElementOverride> {
        self.element_overrides
            .iter()
            .find(|o| o.element == element)
    }
}
