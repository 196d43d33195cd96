//! Default node rendering for the safe renderer.

use super::context::Context;
use super::types::{PropValue, Props, Scope};
use crate::registry::OverrideStrategy;
use lessonmark_core::math::{FORMULA_COMPONENT, unescape_formula_attr};
use markdown::mdast::{AlignKind, AttributeContent, AttributeValue, Node};

/// Intrinsic elements that MDX content may use directly.
const SAFE_INTRINSIC_ELEMENTS: &[&str] = &[
    "abbr", "b", "br", "code", "dd", "del", "details", "div", "dl", "dt", "em", "hr", "i", "kbd",
    "mark", "p", "s", "small", "span", "strong", "sub", "summary", "sup", "u",
];

/// Intrinsic elements rendered without a closing tag.
const VOID_INTRINSIC_ELEMENTS: &[&str] = &["br", "hr"];

/// URL schemes that are never emitted into `href` or `src`.
const BLOCKED_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

/// Recursively renders an AST node, offering it to the override first.
pub fn render_node(node: &Node, ctx: &mut Context) {
    if ctx.try_override(node) {
        return;
    }

    match node {
        Node::Root(root) => render_children(&root.children, ctx),
        Node::Text(text) => ctx.push_text(&text.value),
        Node::Paragraph(para) => render_paragraph(para, ctx),
        Node::Heading(heading) => {
            let tag = format!("h{}", heading.depth);
            wrap(&tag, &heading.children, ctx);
        }
        Node::Strong(strong) => wrap("strong", &strong.children, ctx),
        Node::Emphasis(emphasis) => wrap("em", &emphasis.children, ctx),
        Node::Delete(delete) => wrap("del", &delete.children, ctx),
        Node::InlineCode(code) => {
            ctx.push_raw("<code>");
            ctx.push_text(&code.value);
            ctx.push_raw("</code>");
        }
        Node::Break(_) => ctx.push_raw("<br />"),
        Node::ThematicBreak(_) => ctx.push_raw("<hr />"),
        Node::Link(link) => render_link(link, ctx),
        Node::LinkReference(reference) => render_children(&reference.children, ctx),
        Node::Image(img) => render_image(&img.url, &img.alt, img.title.as_deref(), ctx),
        Node::ImageReference(reference) => ctx.push_text(&reference.alt),
        Node::List(list) => render_list(list, ctx),
        Node::ListItem(item) => render_list_item(item, ctx),
        Node::Code(code) => render_code(code.lang.as_deref(), &code.value, ctx),
        Node::Blockquote(quote) => render_blockquote(&quote.children, ctx),
        Node::Table(table) => render_table(table, ctx),
        Node::Math(math) => push_formula(&math.value, true, ctx),
        Node::InlineMath(math) => push_formula(&math.value, false, ctx),
        Node::FootnoteReference(fnref) => {
            ctx.push_raw("<sup><a href=\"#fn-");
            ctx.push_attr_value(&fnref.identifier);
            ctx.push_raw("\" id=\"fnref-");
            ctx.push_attr_value(&fnref.identifier);
            ctx.push_raw("\">");
            ctx.push_text(fnref.label.as_deref().unwrap_or(&fnref.identifier));
            ctx.push_raw("</a></sup>");
        }
        Node::FootnoteDefinition(fndef) => {
            ctx.push_raw("<div class=\"footnote\" id=\"fn-");
            ctx.push_attr_value(&fndef.identifier);
            ctx.push_raw("\">");
            render_children(&fndef.children, ctx);
            ctx.push_raw("</div>");
        }
        Node::Html(html) => {
            log::debug!("Raw HTML is escaped by the safe renderer: {}", html.value);
            ctx.push_text(&html.value);
        }
        Node::MdxJsxFlowElement(elem) => {
            render_jsx(elem.name.as_deref(), &elem.attributes, &elem.children, ctx);
        }
        Node::MdxJsxTextElement(elem) => {
            render_jsx(elem.name.as_deref(), &elem.attributes, &elem.children, ctx);
        }
        Node::MdxjsEsm(_) | Node::MdxFlowExpression(_) | Node::MdxTextExpression(_) => {
            log::debug!("Dropping unevaluated MDX expression or ESM node");
        }
        Node::Yaml(_) | Node::Toml(_) | Node::Definition(_) => {}
        _ => {
            log::warn!("Unhandled markdown node type: {:?}", node);
        }
    }
}

fn render_children(children: &[Node], ctx: &mut Context) {
    for child in children {
        render_node(child, ctx);
    }
}

fn wrap(tag: &str, children: &[Node], ctx: &mut Context) {
    ctx.push_raw(&format!("<{}>", tag));
    render_children(children, ctx);
    ctx.push_raw(&format!("</{}>", tag));
}

/// Renders a paragraph node, suppressing `<p>` wrappers in tight lists.
fn render_paragraph(para: &markdown::mdast::Paragraph, ctx: &mut Context) {
    if ctx.is_in_tight_list() {
        render_children(&para.children, ctx);
    } else {
        wrap("p", &para.children, ctx);
    }
}

/// Replaces URLs with a blocked scheme by `#`.
pub(crate) fn safe_url(url: &str) -> &str {
    let lower = url.trim().to_ascii_lowercase();
    if BLOCKED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        log::debug!("Blocked unsafe URL: {}", url);
        "#"
    } else {
        url
    }
}

fn render_link(link: &markdown::mdast::Link, ctx: &mut Context) {
    ctx.push_raw(r#"<a href=""#);
    ctx.push_attr_value(safe_url(&link.url));
    ctx.push_raw(r#"""#);

    if let Some(title) = &link.title {
        ctx.push_raw(r#" title=""#);
        ctx.push_attr_value(title);
        ctx.push_raw(r#"""#);
    }

    ctx.push_raw(">");
    render_children(&link.children, ctx);
    ctx.push_raw("</a>");
}

fn render_image(url: &str, alt: &str, title: Option<&str>, ctx: &mut Context) {
    ctx.push_raw(r#"<img src=""#);
    ctx.push_attr_value(safe_url(url));
    ctx.push_raw(r#"" alt=""#);
    ctx.push_attr_value(alt);
    ctx.push_raw(r#"""#);
    if let Some(title) = title {
        ctx.push_raw(r#" title=""#);
        ctx.push_attr_value(title);
        ctx.push_raw(r#"""#);
    }
    ctx.push_raw(r#" loading="lazy" />"#);
}

fn render_list(list: &markdown::mdast::List, ctx: &mut Context) {
    let tag = if list.ordered { "ol" } else { "ul" };
    match list.start {
        Some(start) if list.ordered && start != 1 => {
            ctx.push_raw(&format!("<ol start=\"{}\">", start));
        }
        _ => ctx.push_raw(&format!("<{}>", tag)),
    }

    ctx.enter(Scope::List {
        spread: list.spread,
    });
    render_children(&list.children, ctx);
    ctx.exit();

    ctx.push_raw(&format!("</{}>", tag));
}

/// Renders a list item; GFM task items get a disabled checkbox.
fn render_list_item(item: &markdown::mdast::ListItem, ctx: &mut Context) {
    match item.checked {
        Some(checked) => {
            ctx.push_raw("<li class=\"task-list-item\"><input type=\"checkbox\" disabled");
            if checked {
                ctx.push_raw(" checked");
            }
            ctx.push_raw(" /> ");
        }
        None => ctx.push_raw("<li>"),
    }
    render_children(&item.children, ctx);
    ctx.push_raw("</li>");
}

/// Default code rendering: escaped text in `<pre><code>`.
fn render_code(lang: Option<&str>, value: &str, ctx: &mut Context) {
    match lang {
        Some(lang) => {
            ctx.push_raw("<pre><code class=\"language-");
            ctx.push_attr_value(lang);
            ctx.push_raw("\">");
        }
        None => ctx.push_raw("<pre><code>"),
    }
    ctx.push_text(value);
    if !value.is_empty() {
        ctx.push_raw("\n");
    }
    ctx.push_raw("</code></pre>");
}

fn render_blockquote(children: &[Node], ctx: &mut Context) {
    let strategy = ctx
        .registry()
        .element_override("blockquote")
        .map(|o| &o.strategy);

    match strategy {
        Some(OverrideStrategy::Callout { icon, class_name }) => {
            ctx.push_raw("<blockquote class=\"");
            ctx.push_attr_value(class_name);
            ctx.push_raw("\"><span class=\"");
            ctx.push_attr_value(class_name);
            ctx.push_raw("-icon\" aria-hidden=\"true\">");
            ctx.push_text(icon);
            ctx.push_raw("</span>");
        }
        None => ctx.push_raw("<blockquote>"),
    }
    render_children(children, ctx);
    ctx.push_raw("</blockquote>");
}

fn render_table_row(row: &markdown::mdast::TableRow, is_header: bool, aligns: &[AlignKind], ctx: &mut Context) {
    ctx.push_raw("<tr>");
    let tag = if is_header { "th" } else { "td" };

    for (i, cell) in row.children.iter().enumerate() {
        let Node::TableCell(c) = cell else {
            continue;
        };
        let align_attr = match aligns.get(i) {
            Some(AlignKind::Left) => " align=\"left\"",
            Some(AlignKind::Right) => " align=\"right\"",
            Some(AlignKind::Center) => " align=\"center\"",
            Some(AlignKind::None) | None => "",
        };
        ctx.push_raw(&format!("<{}{}>", tag, align_attr));
        render_children(&c.children, ctx);
        ctx.push_raw(&format!("</{}>", tag));
    }

    ctx.push_raw("</tr>");
}

fn render_table(table: &markdown::mdast::Table, ctx: &mut Context) {
    ctx.push_raw("<table><thead>");
    if let Some(Node::TableRow(row)) = table.children.first() {
        render_table_row(row, true, &table.align, ctx);
    }
    ctx.push_raw("</thead>");

    if table.children.len() > 1 {
        ctx.push_raw("<tbody>");
        for row in table.children.iter().skip(1) {
            if let Node::TableRow(r) = row {
                render_table_row(r, false, &table.align, ctx);
            }
        }
        ctx.push_raw("</tbody>");
    }

    ctx.push_raw("</table>");
}

fn push_formula(formula: &str, display: bool, ctx: &mut Context) {
    let mut props = Props::new();
    props.insert("formula".to_string(), PropValue::literal(formula));
    props.insert(
        "display".to_string(),
        PropValue::expression(if display { "true" } else { "false" }),
    );
    ctx.push_component(FORMULA_COMPONENT, props, Vec::new());
}

/// Returns true for expression prop sources that are plain JS literals.
fn is_literal_expression(source: &str) -> bool {
    let source = source.trim();
    matches!(source, "true" | "false" | "null")
        || source.parse::<f64>().is_ok()
        || (source.len() >= 2
            && ((source.starts_with('"') && source.ends_with('"'))
                || (source.starts_with('\'') && source.ends_with('\''))))
}

/// Collects props from JSX attributes.
///
/// Event handler attributes and non-literal expressions are dropped.
fn collect_props(component: &str, attributes: &[AttributeContent]) -> Props {
    let mut props = Props::new();
    for attr in attributes {
        let AttributeContent::Property(prop) = attr else {
            log::debug!("Dropping spread attribute on <{}>", component);
            continue;
        };
        if prop.name.starts_with("on") {
            log::debug!("Dropping event handler {} on <{}>", prop.name, component);
            continue;
        }
        let value = match &prop.value {
            Some(AttributeValue::Literal(s)) if component == FORMULA_COMPONENT && prop.name == "formula" => {
                PropValue::literal(unescape_formula_attr(s))
            }
            Some(AttributeValue::Literal(s)) => PropValue::literal(s.clone()),
            Some(AttributeValue::Expression(expr)) if is_literal_expression(&expr.value) => {
                PropValue::expression(expr.value.trim())
            }
            Some(AttributeValue::Expression(_)) => {
                log::debug!("Dropping non-literal expression prop {} on <{}>", prop.name, component);
                continue;
            }
            None => PropValue::literal(String::new()),
        };
        props.insert(prop.name.clone(), value);
    }
    props
}

/// Renders an MDX JSX element through the registry.
fn render_jsx(name: Option<&str>, attributes: &[AttributeContent], children: &[Node], ctx: &mut Context) {
    // Fragment: <> ... </>
    let Some(tag_name) = name else {
        render_children(children, ctx);
        return;
    };

    if let Some(definition) = ctx.registry().component(tag_name) {
        let mut props = collect_props(tag_name, attributes);
        for (key, value) in &definition.default_props {
            props
                .entry(key.clone())
                .or_insert_with(|| PropValue::literal(value.clone()));
        }
        let slot_children = ctx.render_children_to_blocks(children);
        ctx.push_component(tag_name, props, slot_children);
        return;
    }

    if SAFE_INTRINSIC_ELEMENTS.contains(&tag_name) {
        render_intrinsic(tag_name, attributes, children, ctx);
        return;
    }

    log::warn!(
        "Component <{}> is not registered; rendering its children only",
        tag_name
    );
    render_children(children, ctx);
}

fn render_intrinsic(tag: &str, attributes: &[AttributeContent], children: &[Node], ctx: &mut Context) {
    ctx.push_raw("<");
    ctx.push_raw(tag);
    for attr in attributes {
        if let AttributeContent::Property(prop) = attr
            && !prop.name.starts_with("on")
            && prop.name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            match &prop.value {
                Some(AttributeValue::Literal(value)) => {
                    ctx.push_raw(" ");
                    ctx.push_raw(&prop.name);
                    ctx.push_raw("=\"");
                    ctx.push_attr_value(value);
                    ctx.push_raw("\"");
                }
                None => {
                    ctx.push_raw(" ");
                    ctx.push_raw(&prop.name);
                }
                Some(AttributeValue::Expression(_)) => {}
            }
        }
    }

    if VOID_INTRINSIC_ELEMENTS.contains(&tag) {
        ctx.push_raw(" />");
        return;
    }

    ctx.push_raw(">");
    render_children(children, ctx);
    ctx.push_raw("</");
    ctx.push_raw(tag);
    ctx.push_raw(">");
}
