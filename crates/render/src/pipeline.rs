//! Render orchestration: compiled or raw lesson content to render blocks.

use crate::config::RenderConfig;
use crate::highlight::{HighlighterHandle, shared_handle};
use crate::overrides::CodeOverride;
use crate::registry::RegistryConfig;
use crate::registry::defaults::default_lesson_registry;
use crate::renderer::{RenderBlock, SafeRenderInput, render_safe};
use lessonmark_core::{CompiledMdx, LessonError, ParseOptions, parse_mdast, preprocess_math};
use markdown::mdast::Node;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::sync::Arc;

/// Output of one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDocument {
    /// Rendered blocks in document order.
    pub blocks: Vec<RenderBlock>,
    /// Frontmatter carried over from the content.
    pub frontmatter: JsonValue,
}

/// Renders lesson content with a fixed configuration, registry, and highlighter.
///
/// In production only compiled content is accepted: the syntax tree is used
/// as-is and code blocks come from the precomputed highlight map. In
/// development raw content is math-preprocessed, parsed when no tree exists,
/// and highlighted live when no highlight map exists.
#[derive(Debug, Clone)]
pub struct MdxRenderer {
    config: RenderConfig,
    registry: RegistryConfig,
    highlighter: Arc<HighlighterHandle>,
}

impl MdxRenderer {
    /// Creates a renderer with the default lesson registry and the shared highlighter.
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            registry: default_lesson_registry(),
            highlighter: shared_handle(),
        }
    }

    /// Replaces the component registry.
    pub fn with_registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the highlighter handle.
    pub fn with_highlighter(mut self, highlighter: Arc<HighlighterHandle>) -> Self {
        self.highlighter = highlighter;
        self
    }

    /// Render configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Component registry.
    pub fn registry(&self) -> &RegistryConfig {
        &self.registry
    }

    /// Highlighter handle.
    pub fn highlighter(&self) -> &Arc<HighlighterHandle> {
        &self.highlighter
    }

    /// Renders one document.
    ///
    /// # Errors
    ///
    /// [`LessonError::BuildIntegrity`] when a production render receives no
    /// syntax tree, and [`LessonError::MarkdownAdapter`] when the development
    /// parser rejects the raw content.
    pub fn render(&self, content: &CompiledMdx) -> Result<RenderedDocument, LessonError> {
        let development = self.config.mode.is_development();
        log::debug!("Rendering lesson content in {:?} mode", self.config.mode);

        let markdown: Cow<'_, str> = if development {
            Cow::Owned(preprocess_math(&content.raw))
        } else {
            Cow::Borrowed(content.raw.as_str())
        };

        let parsed: Node;
        let tree = match &content.mdast {
            Some(tree) => tree,
            None if development => {
                log::debug!("No compiled syntax tree; parsing raw content");
                parsed = parse_mdast(&markdown, &ParseOptions::lesson())?;
                &parsed
            }
            None => return Err(LessonError::BuildIntegrity { path: None }),
        };

        let highlighter = if development && !content.has_highlighted_code() {
            log::debug!("No precomputed highlights; using live highlighting");
            Some(self.highlighter.get())
        } else {
            None
        };

        let input = SafeRenderInput {
            mdast: Some(tree),
            markdown: development.then_some(&*markdown),
        };
        let code_override = CodeOverride::new(content, &self.config, highlighter);
        let blocks = render_safe(&input, &self.registry, &code_override)?;

        Ok(RenderedDocument {
            blocks,
            frontmatter: content.frontmatter.clone(),
        })
    }
}
