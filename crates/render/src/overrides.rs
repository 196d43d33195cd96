//! Node override for code blocks.
//!
//! Each code node is classified by an ordered rule chain:
//! math, skip-listed language, precomputed fragment, live highlighting,
//! then fallthrough. Only the first matching rule applies.

use crate::config::RenderConfig;
use crate::highlight::{HighlightOptions, Highlighter};
use crate::registry::defaults::CODE_BLOCK_COMPONENT;
use crate::renderer::{NodeOutcome, NodeOverride, PropValue, Props, RenderBlock};
use lessonmark_core::math::{FORMULA_COMPONENT, MATH_LANG};
use lessonmark_core::{CompiledMdx, HastNode, HighlightedFragment};
use markdown::mdast::{Code, Node};

/// Language assumed for code blocks that name none.
pub const DEFAULT_CODE_LANG: &str = "text";

/// Rule that decided how a code node renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeRule {
    /// `math` code rendered as a display formula.
    Math,
    /// Language on the skip list; default rendering.
    SkipListed,
    /// Pre-highlighted fragment from the compiled highlight map.
    Precomputed,
    /// Highlighted at render time.
    Live,
    /// No rule applied; default rendering.
    Fallthrough,
}

/// Classification of one code node, carrying what its rule needs.
#[derive(Debug)]
pub enum CodeDecision<'a> {
    /// Display formula.
    Math {
        /// Formula source.
        formula: &'a str,
    },
    /// Skip-listed language.
    SkipListed,
    /// Fragment found by highlight id.
    Precomputed(&'a HighlightedFragment),
    /// Highlight with the live engine.
    Live {
        /// Language token.
        lang: &'a str,
    },
    /// Default rendering.
    Fallthrough,
}

impl CodeDecision<'_> {
    /// Returns the rule this decision came from.
    pub fn rule(&self) -> CodeRule {
        match self {
            CodeDecision::Math { .. } => CodeRule::Math,
            CodeDecision::SkipListed => CodeRule::SkipListed,
            CodeDecision::Precomputed(_) => CodeRule::Precomputed,
            CodeDecision::Live { .. } => CodeRule::Live,
            CodeDecision::Fallthrough => CodeRule::Fallthrough,
        }
    }
}

/// [`NodeOverride`] applying the code rule chain for one render.
pub struct CodeOverride<'a> {
    content: &'a CompiledMdx,
    config: &'a RenderConfig,
    highlighter: Option<&'a dyn Highlighter>,
}

impl<'a> CodeOverride<'a> {
    /// Creates the override; `highlighter` is `None` unless live highlighting is enabled.
    pub fn new(
        content: &'a CompiledMdx,
        config: &'a RenderConfig,
        highlighter: Option<&'a dyn Highlighter>,
    ) -> Self {
        Self {
            content,
            config,
            highlighter,
        }
    }

    /// Classifies a code node.
    pub fn classify<'c>(&self, code: &'c Code) -> CodeDecision<'c>
    where
        'a: 'c,
    {
        let lang = code.lang.as_deref().unwrap_or(DEFAULT_CODE_LANG);
        if lang == MATH_LANG {
            return CodeDecision::Math {
                formula: &code.value,
            };
        }
        if self.config.is_skipped_language(lang) {
            return CodeDecision::SkipListed;
        }
        if let Some(fragment) = self.content.fragment_for(code) {
            return CodeDecision::Precomputed(fragment);
        }
        match self.highlighter {
            Some(_) => CodeDecision::Live { lang },
            None => CodeDecision::Fallthrough,
        }
    }

    fn render_code(&self, code: &Code) -> NodeOutcome {
        match self.classify(code) {
            CodeDecision::Math { formula } => {
                let mut props = Props::new();
                props.insert("formula".to_string(), PropValue::literal(formula));
                props.insert("display".to_string(), PropValue::expression("true"));
                NodeOutcome::Render(vec![RenderBlock::component(FORMULA_COMPONENT, props, Vec::new())])
            }
            CodeDecision::SkipListed | CodeDecision::Fallthrough => NodeOutcome::Fallthrough,
            CodeDecision::Precomputed(fragment) => code_block(&fragment.lang, &fragment.hast),
            CodeDecision::Live { lang } => {
                let Some(highlighter) = self.highlighter else {
                    return NodeOutcome::Fallthrough;
                };
                let options = HighlightOptions {
                    lang,
                    theme: &self.config.theme,
                };
                match highlighter.code_to_hast(&code.value, &options) {
                    Ok(hast) => code_block(lang, &hast),
                    Err(err) => {
                        log::warn!("Live highlighting failed for `{}` code block: {}", lang, err);
                        NodeOutcome::Fallthrough
                    }
                }
            }
        }
    }
}

fn code_block(lang: &str, hast: &HastNode) -> NodeOutcome {
    let mut props = Props::new();
    props.insert("lang".to_string(), PropValue::literal(lang));
    NodeOutcome::Render(vec![RenderBlock::component(
        CODE_BLOCK_COMPONENT,
        props,
        vec![RenderBlock::html(hast.to_html())],
    )])
}

impl NodeOverride for CodeOverride<'_> {
    fn render_node(&self, node: &Node) -> NodeOutcome {
        match node {
            Node::Code(code) => self.render_code(code),
            _ => NodeOutcome::Fallthrough,
        }
    }
}
