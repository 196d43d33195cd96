//! Default registry for lesson pages.

use super::types::{ComponentDefinition, ElementOverride, OverrideStrategy, RegistryConfig};
use lessonmark_core::math::FORMULA_COMPONENT;

/// Component wrapping highlighted code blocks.
pub const CODE_BLOCK_COMPONENT: &str = "CodeBlock";

/// Interactive coding challenge widget.
pub const CHALLENGE_COMPONENT: &str = "Challenge";

/// Embedded video widget.
pub const VIDEO_COMPONENT: &str = "Video";

/// Creates the default lesson registry.
///
/// This registry includes:
/// - the interactive widgets content may embed (`Challenge`, `Video`)
/// - the components the renderer itself emits (`MathFormula`, `CodeBlock`)
/// - a callout override for blockquotes
///
/// # Example
///
/// ```
/// use lessonmark_render::registry::defaults::default_lesson_registry;
///
/// let registry = default_lesson_registry();
/// assert!(registry.is_registered("Challenge"));
/// assert!(registry.element_override("blockquote").is_some());
/// ```
pub fn default_lesson_registry() -> RegistryConfig {
    RegistryConfig {
        components: vec![
            ComponentDefinition::new(CHALLENGE_COMPONENT),
            ComponentDefinition::new(VIDEO_COMPONENT).with_default_prop("controls", "true"),
            ComponentDefinition::new(FORMULA_COMPONENT),
            ComponentDefinition::new(CODE_BLOCK_COMPONENT),
        ],
        element_overrides: vec![ElementOverride {
            element: "blockquote".to_string(),
            strategy: OverrideStrategy::Callout {
                icon: "💡".to_string(),
                class_name: "callout".to_string(),
            },
        }],
    }
}
