#![deny(missing_docs)]
//! lessonmark render engine: safe mdast rendering, cached syntax highlighting,
//! and the lesson render pipeline.

/// Parallel batch rendering.
pub mod batch;
/// Render configuration.
pub mod config;
/// Syntax highlighting provider.
pub mod highlight;
/// HTML serialization and page components.
pub mod html;
/// Code block node override.
pub mod overrides;
/// Render orchestration.
pub mod pipeline;
/// Component registry.
pub mod registry;
/// Safe mdast renderer.
pub mod renderer;
/// Content sources.
pub mod source;

pub use batch::{BatchInput, BatchOptions, BatchOutput, BatchResult, BatchStats};
pub use config::{RenderConfig, RenderMode};
pub use highlight::{
    HighlightError, HighlightOptions, Highlighter, HighlighterHandle, SyntectHighlighter,
    shared_handle,
};
pub use html::{Component, ComponentError, ComponentSet, FormulaRenderer};
pub use overrides::{CodeDecision, CodeOverride, CodeRule};
pub use pipeline::{MdxRenderer, RenderedDocument};
pub use registry::defaults::default_lesson_registry;
pub use registry::{ComponentDefinition, ElementOverride, OverrideStrategy, RegistryConfig};
pub use renderer::{
    NodeOutcome, NodeOverride, PropValue, Props, RenderBlock, SafeRenderInput, render_safe,
};
pub use source::{ContentSource, FsContentSource, render_content};
