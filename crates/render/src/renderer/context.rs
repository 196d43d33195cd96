//! Rendering context for the safe renderer.

use super::render::render_node;
use super::types::{Props, RenderBlock, Scope};
use super::{NodeOutcome, NodeOverride};
use crate::RegistryConfig;
use markdown::mdast::Node;

/// Tracks rendering state while traversing the syntax tree.
///
/// Completed output accumulates in `blocks`; text and tags not yet
/// finalized into a block sit in the current HTML buffer.
pub struct Context<'a> {
    /// Completed rendering blocks (HTML or Component).
    pub blocks: Vec<RenderBlock>,

    /// Current HTML buffer (not yet finalized into a block).
    current_html: String,

    stack: Vec<Scope>,

    registry: &'a RegistryConfig,

    node_override: &'a dyn NodeOverride,
}

impl<'a> Context<'a> {
    /// Creates a new context over a registry and node override.
    pub fn new(registry: &'a RegistryConfig, node_override: &'a dyn NodeOverride) -> Self {
        Self {
            blocks: Vec::new(),
            current_html: String::with_capacity(4096),
            stack: vec![Scope::Root],
            registry,
            node_override,
        }
    }

    /// Returns the component registry.
    pub fn registry(&self) -> &'a RegistryConfig {
        self.registry
    }

    /// Offers a node to the override before default handling.
    pub fn try_override(&mut self, node: &Node) -> bool {
        match self.node_override.render_node(node) {
            NodeOutcome::Render(blocks) => {
                self.push_blocks(blocks);
                true
            }
            NodeOutcome::Fallthrough => false,
        }
    }

    /// Writes a raw string to the current HTML buffer without escaping (for safe HTML tags).
    pub fn push_raw(&mut self, s: &str) {
        self.current_html.push_str(s);
    }

    /// Writes text content to the buffer with HTML escaping.
    pub fn push_text(&mut self, s: &str) {
        self.current_html
            .push_str(&html_escape::encode_text(s));
    }

    /// Writes an attribute value with HTML escaping.
    pub fn push_attr_value(&mut self, s: &str) {
        self.current_html
            .push_str(&html_escape::encode_double_quoted_attribute(s));
    }

    /// Returns true if inside a tight (non-spread) list.
    ///
    /// Paragraphs in tight lists render without `<p>` wrappers.
    pub fn is_in_tight_list(&self) -> bool {
        self.stack
            .iter()
            .rev()
            .find(|scope| matches!(scope, Scope::List { .. }))
            .is_some_and(|scope| matches!(scope, Scope::List { spread: false }))
    }

    /// Enters a new scope by pushing it onto the stack.
    pub fn enter(&mut self, scope: Scope) {
        self.stack.push(scope);
    }

    /// Exits the current scope by popping from the stack.
    pub fn exit(&mut self) -> Option<Scope> {
        self.stack.pop()
    }

    /// Finalizes the current HTML buffer into an HTML block.
    pub fn flush_html(&mut self) {
        if !self.current_html.is_empty() {
            let content = std::mem::take(&mut self.current_html);
            self.blocks.push(RenderBlock::Html { content });
        }
    }

    /// Adds a component block, flushing pending HTML first.
    pub fn push_component(&mut self, name: &str, props: Props, slot_children: Vec<RenderBlock>) {
        self.flush_html();
        self.blocks
            .push(RenderBlock::component(name, props, slot_children));
    }

    /// Appends already rendered blocks, merging leading HTML into the buffer.
    pub fn push_blocks(&mut self, blocks: Vec<RenderBlock>) {
        for block in blocks {
            match block {
                RenderBlock::Html { content } => self.current_html.push_str(&content),
                component => {
                    self.flush_html();
                    self.blocks.push(component);
                }
            }
        }
    }

    /// Renders child nodes into a separate block list (for component slots).
    pub fn render_children_to_blocks(&self, children: &[Node]) -> Vec<RenderBlock> {
        let mut child_ctx = Context::new(self.registry, self.node_override);
        for child in children {
            render_node(child, &mut child_ctx);
        }
        child_ctx.finish()
    }

    /// Consumes the context and returns the rendered blocks.
    pub fn finish(mut self) -> Vec<RenderBlock> {
        self.flush_html();
        self.blocks
    }
}
