//! Safe mdast renderer.
//!
//! Converts a markdown-rs syntax tree into [`RenderBlock`]s using only the
//! components named in a [`RegistryConfig`]. MDX expressions and ESM are
//! never evaluated, raw HTML is escaped, and unregistered components
//! contribute only their children.
//!
//! Every node is first offered to a [`NodeOverride`]; when it falls through,
//! the default rendering in [`render`] applies.

mod context;
pub mod render;
mod types;

pub use context::Context;
pub use types::{PropValue, Props, RenderBlock, Scope};

use crate::RegistryConfig;
use lessonmark_core::{LessonError, ParseOptions, parse_mdast};
use markdown::mdast::Node;
use render::render_node;
use std::borrow::Cow;

/// Input to [`render_safe`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SafeRenderInput<'a> {
    /// Syntax tree to render; takes precedence over `markdown`.
    pub mdast: Option<&'a Node>,
    /// Markdown source, parsed only when no tree is given.
    pub markdown: Option<&'a str>,
}

/// Result of offering a node to a [`NodeOverride`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutcome {
    /// Replace the node with these blocks.
    Render(Vec<RenderBlock>),
    /// Use the default rendering.
    Fallthrough,
}

/// Per-node rendering hook consulted before default handling.
pub trait NodeOverride {
    /// Renders `node` or falls through to default handling.
    fn render_node(&self, node: &Node) -> NodeOutcome;
}

impl<F> NodeOverride for F
where
    F: Fn(&Node) -> NodeOutcome,
{
    fn render_node(&self, node: &Node) -> NodeOutcome {
        (self)(node)
    }
}

/// Override that always falls through.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOverride;

impl NodeOverride for NoOverride {
    fn render_node(&self, _node: &Node) -> NodeOutcome {
        NodeOutcome::Fallthrough
    }
}

/// Renders a syntax tree (or markdown source) into blocks.
///
/// # Examples
///
/// ```
/// use lessonmark_render::renderer::{NoOverride, RenderBlock, SafeRenderInput, render_safe};
/// use lessonmark_render::default_lesson_registry;
///
/// let input = SafeRenderInput { mdast: None, markdown: Some("Hello, *world*!") };
/// let blocks = render_safe(&input, &default_lesson_registry(), &NoOverride).unwrap();
/// assert_eq!(blocks, vec![RenderBlock::html("<p>Hello, <em>world</em>!</p>")]);
/// ```
pub fn render_safe(
    input: &SafeRenderInput<'_>,
    registry: &RegistryConfig,
    node_override: &dyn NodeOverride,
) -> Result<Vec<RenderBlock>, LessonError> {
    let tree: Cow<'_, Node> = match (input.mdast, input.markdown) {
        (Some(tree), _) => Cow::Borrowed(tree),
        (None, Some(markdown)) => Cow::Owned(parse_mdast(markdown, &ParseOptions::lesson())?),
        (None, None) => {
            return Err(LessonError::Internal(
                "safe renderer needs a syntax tree or markdown source".to_string(),
            ));
        }
    };

    let mut ctx = Context::new(registry, node_override);
    render_node(&tree, &mut ctx);
    Ok(ctx.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_lesson_registry;

    fn render(markdown: &str) -> Vec<RenderBlock> {
        let input = SafeRenderInput {
            mdast: None,
            markdown: Some(markdown),
        };
        render_safe(&input, &default_lesson_registry(), &NoOverride).unwrap()
    }

    fn render_html(markdown: &str) -> String {
        match render(markdown).as_slice() {
            [RenderBlock::Html { content }] => content.clone(),
            other => panic!("Expected a single HTML block, got {other:?}"),
        }
    }

    #[test]
    fn test_paragraph() {
        assert_eq!(render_html("This is a paragraph."), "<p>This is a paragraph.</p>");
    }

    #[test]
    fn test_link() {
        let html = render_html("[Rust](https://www.rust-lang.org/)");
        assert_eq!(
            html,
            r#"<p><a href="https://www.rust-lang.org/">Rust</a></p>"#
        );
    }

    #[test]
    fn test_javascript_link_is_neutralized() {
        let html = render_html("[x](javascript:alert(1))");
        assert!(!html.contains("javascript:"), "{html}");
    }

    #[test]
    fn test_heading_and_emphasis() {
        assert_eq!(
            render_html("## A **bold** ~~move~~"),
            "<h2>A <strong>bold</strong> <del>move</del></h2>"
        );
    }

    #[test]
    fn test_tight_list_has_no_paragraphs() {
        assert_eq!(
            render_html("- one\n- two"),
            "<ul><li>one</li><li>two</li></ul>"
        );
    }

    #[test]
    fn test_ordered_list_start() {
        assert_eq!(
            render_html("3. three\n4. four"),
            "<ol start=\"3\"><li>three</li><li>four</li></ol>"
        );
    }

    #[test]
    fn test_task_list() {
        let html = render_html("- [x] done\n- [ ] todo");
        assert!(html.contains("<input type=\"checkbox\" disabled checked />"), "{html}");
        assert!(html.contains("<input type=\"checkbox\" disabled />"), "{html}");
    }

    #[test]
    fn test_default_code_block_is_escaped() {
        assert_eq!(
            render_html("```bash\necho <hi> && ls\n```"),
            "<pre><code class=\"language-bash\">echo &lt;hi&gt; &amp;&amp; ls\n</code></pre>"
        );
    }

    #[test]
    fn test_table() {
        let html = render_html("| a | b |\n|:--|--:|\n| 1 | 2 |");
        assert_eq!(
            html,
            "<table><thead><tr><th align=\"left\">a</th><th align=\"right\">b</th></tr></thead><tbody><tr><td align=\"left\">1</td><td align=\"right\">2</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_blockquote_renders_as_callout() {
        let html = render_html("> Remember this");
        assert_eq!(
            html,
            "<blockquote class=\"callout\"><span class=\"callout-icon\" aria-hidden=\"true\">💡</span><p>Remember this</p></blockquote>"
        );
    }

    #[test]
    fn test_blockquote_without_override() {
        let registry = RegistryConfig::default();
        let input = SafeRenderInput {
            mdast: None,
            markdown: Some("> plain"),
        };
        let blocks = render_safe(&input, &registry, &NoOverride).unwrap();
        assert_eq!(
            blocks,
            vec![RenderBlock::html("<blockquote><p>plain</p></blockquote>")]
        );
    }

    #[test]
    fn test_registered_component_becomes_block() {
        let blocks = render("<Challenge id=\"loops-1\">\n\nWrite a *loop*.\n\n</Challenge>");
        assert_eq!(blocks.len(), 1);
        match &blocks[0] {
            RenderBlock::Component {
                name,
                props,
                slot_children,
            } => {
                assert_eq!(name, "Challenge");
                assert_eq!(props.get("id"), Some(&PropValue::literal("loops-1")));
                assert_eq!(
                    slot_children,
                    &vec![RenderBlock::html("<p>Write a <em>loop</em>.</p>")]
                );
            }
            other => panic!("Expected component block, got {other:?}"),
        }
    }

    #[test]
    fn test_inline_component_splits_paragraph() {
        let blocks = render(r#"Compute <MathFormula formula="a^2" display={false} /> now."#);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], RenderBlock::html("<p>Compute "));
        assert_eq!(blocks[1].component_name(), Some("MathFormula"));
        assert_eq!(blocks[2], RenderBlock::html(" now.</p>"));
    }

    #[test]
    fn test_formula_prop_is_unescaped() {
        let blocks = render(r#"<MathFormula formula="\\frac\{1\}\{2\}" display={false} />"#);
        let Some(RenderBlock::Component { props, .. }) = blocks.first() else {
            panic!("Expected component block, got {blocks:?}");
        };
        assert_eq!(props.get("formula"), Some(&PropValue::literal(r"\frac{1}{2}")));
        assert_eq!(props.get("display"), Some(&PropValue::expression("false")));
    }

    #[test]
    fn test_unregistered_component_renders_children_only() {
        assert_eq!(
            render_html("<Sneaky onClick={steal}>\n\nvisible\n\n</Sneaky>"),
            "<p>visible</p>"
        );
    }

    #[test]
    fn test_expressions_are_not_evaluated() {
        assert_eq!(render_html("a {1 + 1} b"), "<p>a  b</p>");
    }

    #[test]
    fn test_unsafe_expression_props_are_dropped() {
        let blocks = render("<Video src=\"/v.mp4\" onPlay={track()} autoplay={true} />");
        let Some(RenderBlock::Component { props, .. }) = blocks.first() else {
            panic!("Expected component block, got {blocks:?}");
        };
        assert!(!props.contains_key("onPlay"));
        assert_eq!(props.get("autoplay"), Some(&PropValue::expression("true")));
        assert_eq!(props.get("src"), Some(&PropValue::literal("/v.mp4")));
    }

    #[test]
    fn test_registry_default_props_are_injected() {
        let blocks = render("<Video src=\"/v.mp4\" />");
        let Some(RenderBlock::Component { props, .. }) = blocks.first() else {
            panic!("Expected component block, got {blocks:?}");
        };
        assert_eq!(props.get("controls"), Some(&PropValue::literal("true")));
    }

    #[test]
    fn test_safe_intrinsic_element() {
        assert_eq!(
            render_html("Press <kbd onclick=\"x()\" title=\"key\">Ctrl</kbd> now"),
            "<p>Press <kbd title=\"key\">Ctrl</kbd> now</p>"
        );
    }

    #[test]
    fn test_override_replaces_node() {
        let shout = |node: &Node| match node {
            Node::Text(text) => NodeOutcome::Render(vec![RenderBlock::html(text.value.to_uppercase())]),
            _ => NodeOutcome::Fallthrough,
        };
        let input = SafeRenderInput {
            mdast: None,
            markdown: Some("quiet *words*"),
        };
        let blocks = render_safe(&input, &default_lesson_registry(), &shout).unwrap();
        assert_eq!(blocks, vec![RenderBlock::html("<p>QUIET <em>WORDS</em></p>")]);
    }

    #[test]
    fn test_tree_takes_precedence_over_markdown() {
        let tree = parse_mdast("from tree", &ParseOptions::lesson()).unwrap();
        let input = SafeRenderInput {
            mdast: Some(&tree),
            markdown: Some("<Unclosed"),
        };
        let blocks = render_safe(&input, &default_lesson_registry(), &NoOverride).unwrap();
        assert_eq!(blocks, vec![RenderBlock::html("<p>from tree</p>")]);
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let err = render_safe(
            &SafeRenderInput::default(),
            &default_lesson_registry(),
            &NoOverride,
        )
        .unwrap_err();
        assert!(matches!(err, LessonError::Internal(_)));
    }
}
