use lessonmark_core::{
    CompiledMdx, HastNode, HighlightMap, HighlightedFragment, LessonError, ParseOptions,
    parse_mdast, preprocess_math,
};
use lessonmark_render::{
    HighlightError, HighlightOptions, Highlighter, HighlighterHandle, MdxRenderer, PropValue,
    RenderBlock, RenderConfig, RenderedDocument,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Highlighter that tags its output so live results are recognizable.
struct TaggingHighlighter {
    calls: Arc<AtomicUsize>,
}

impl Highlighter for TaggingHighlighter {
    fn code_to_hast(&self, code: &str, options: &HighlightOptions<'_>) -> Result<HastNode, HighlightError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(HastNode::element("pre", vec![HastNode::text(code)]).with_property("dataLive", options.lang))
    }
}

struct Harness {
    renderer: MdxRenderer,
    handle: Arc<HighlighterHandle>,
    calls: Arc<AtomicUsize>,
    builds: Arc<AtomicUsize>,
}

fn harness(config: RenderConfig) -> Harness {
    let calls = Arc::new(AtomicUsize::new(0));
    let builds = Arc::new(AtomicUsize::new(0));
    let factory_calls = Arc::clone(&calls);
    let factory_builds = Arc::clone(&builds);
    let handle = Arc::new(HighlighterHandle::new(move || {
        factory_builds.fetch_add(1, Ordering::SeqCst);
        Arc::new(TaggingHighlighter {
            calls: Arc::clone(&factory_calls),
        }) as Arc<dyn Highlighter>
    }));
    Harness {
        renderer: MdxRenderer::new(config).with_highlighter(Arc::clone(&handle)),
        handle,
        calls,
        builds,
    }
}

fn tree(markdown: &str) -> markdown::mdast::Node {
    parse_mdast(markdown, &ParseOptions::lesson()).unwrap()
}

fn fragment(lang: &str, text: &str) -> HighlightedFragment {
    HighlightedFragment {
        lang: lang.to_string(),
        hast: HastNode::element("pre", vec![HastNode::text(text)]),
    }
}

fn map(entries: &[(&str, HighlightedFragment)]) -> HighlightMap {
    entries
        .iter()
        .map(|(id, fragment)| (id.to_string(), fragment.clone()))
        .collect()
}

fn only_component(doc: &RenderedDocument) -> (&str, &lessonmark_render::Props, &Vec<RenderBlock>) {
    match doc.blocks.as_slice() {
        [
            RenderBlock::Component {
                name,
                props,
                slot_children,
            },
        ] => (name.as_str(), props, slot_children),
        other => panic!("Expected a single component block, got {other:?}"),
    }
}

const PYTHON_LESSON: &str = "```python highlightId=p1\nprint(1)\n```";

#[test]
fn compiled_content_needs_no_parse_or_highlighter_in_either_mode() {
    for config in [RenderConfig::production(), RenderConfig::development()] {
        let h = harness(config);
        // Raw text that cannot be parsed proves the compiled tree is used.
        let content = CompiledMdx::from_raw("<Unclosed")
            .with_mdast(tree(PYTHON_LESSON))
            .with_highlighted_code(map(&[("p1", fragment("python", "precomputed"))]));

        let doc = h.renderer.render(&content).unwrap();
        let (name, props, slot) = only_component(&doc);
        assert_eq!(name, "CodeBlock");
        assert_eq!(props.get("lang"), Some(&PropValue::literal("python")));
        assert_eq!(slot, &vec![RenderBlock::html("<pre>precomputed</pre>")]);
        assert!(!h.handle.is_initialized());
        assert_eq!(h.builds.load(Ordering::SeqCst), 0);
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }
}

#[test]
fn production_without_tree_is_a_build_integrity_error() {
    let h = harness(RenderConfig::production());
    let content = CompiledMdx::from_raw("# Fine markdown")
        .with_highlighted_code(map(&[("p1", fragment("python", "x"))]));

    let err = h.renderer.render(&content).unwrap_err();
    assert!(matches!(err, LessonError::BuildIntegrity { path: None }), "{err}");
    assert!(!h.handle.is_initialized());
}

#[test]
fn skip_listed_language_falls_through_even_with_fragment() {
    let h = harness(RenderConfig::production());
    let content = CompiledMdx::from_raw("")
        .with_mdast(tree("```bash highlightId=b1\nls -la\n```"))
        .with_highlighted_code(map(&[("b1", fragment("bash", "precomputed"))]));

    let doc = h.renderer.render(&content).unwrap();
    assert_eq!(
        doc.blocks,
        vec![RenderBlock::html("<pre><code class=\"language-bash\">ls -la\n</code></pre>")]
    );
}

#[test]
fn math_code_renders_display_formula_regardless_of_fragments() {
    let h = harness(RenderConfig::production());
    let content = CompiledMdx::from_raw("")
        .with_mdast(tree("```math highlightId=m1\nE=mc^2\n```"))
        .with_highlighted_code(map(&[("m1", fragment("math", "precomputed"))]));

    let doc = h.renderer.render(&content).unwrap();
    let (name, props, slot) = only_component(&doc);
    assert_eq!(name, "MathFormula");
    assert_eq!(props.get("formula"), Some(&PropValue::literal("E=mc^2")));
    assert_eq!(props.get("display"), Some(&PropValue::expression("true")));
    assert!(slot.is_empty());
}

#[test]
fn inline_math_end_to_end_in_development() {
    let raw = "Compute $a^2+b^2=c^2$ now.";
    assert_eq!(
        preprocess_math(raw),
        "Compute <MathFormula formula=\"a^2+b^2=c^2\" display={false} /> now."
    );

    let h = harness(RenderConfig::development());
    let doc = h.renderer.render(&CompiledMdx::from_raw(raw)).unwrap();

    assert_eq!(doc.blocks.len(), 3);
    assert_eq!(doc.blocks[0], RenderBlock::html("<p>Compute "));
    let RenderBlock::Component { name, props, .. } = &doc.blocks[1] else {
        panic!("Expected formula component, got {:?}", doc.blocks[1]);
    };
    assert_eq!(name, "MathFormula");
    assert_eq!(props.get("formula"), Some(&PropValue::literal("a^2+b^2=c^2")));
    assert_eq!(props.get("display"), Some(&PropValue::expression("false")));
    assert_eq!(doc.blocks[2], RenderBlock::html(" now.</p>"));
}

#[test]
fn escaped_formula_survives_the_round_trip() {
    let h = harness(RenderConfig::development());
    let doc = h
        .renderer
        .render(&CompiledMdx::from_raw(r"Half is $\frac{1}{2}$."))
        .unwrap();
    let RenderBlock::Component { props, .. } = &doc.blocks[1] else {
        panic!("Expected formula component, got {:?}", doc.blocks);
    };
    assert_eq!(props.get("formula"), Some(&PropValue::literal(r"\frac{1}{2}")));
}

#[test]
fn quoted_formula_renders_in_development() {
    let h = harness(RenderConfig::development());
    let doc = h
        .renderer
        .render(&CompiledMdx::from_raw(r#"Say $x = "hi" \{a\}$ now."#))
        .unwrap();

    assert_eq!(doc.blocks.len(), 3);
    let RenderBlock::Component { name, props, .. } = &doc.blocks[1] else {
        panic!("Expected formula component, got {:?}", doc.blocks);
    };
    assert_eq!(name, "MathFormula");
    assert_eq!(props.get("formula"), Some(&PropValue::literal(r#"x = "hi" \{a\}"#)));
}

#[test]
fn escaped_dollars_stay_prose_in_development() {
    let h = harness(RenderConfig::development());
    let doc = h
        .renderer
        .render(&CompiledMdx::from_raw(r"Price \$5 and \$6 today."))
        .unwrap();

    assert_eq!(doc.blocks, vec![RenderBlock::html("<p>Price $5 and $6 today.</p>")]);
}

#[test]
fn block_math_end_to_end_in_development() {
    let h = harness(RenderConfig::development());
    let doc = h
        .renderer
        .render(&CompiledMdx::from_raw("Energy:\n\n$$\n  E = mc^2\n$$\n"))
        .unwrap();

    assert_eq!(doc.blocks[0], RenderBlock::html("<p>Energy:</p>"));
    let RenderBlock::Component { name, props, .. } = &doc.blocks[1] else {
        panic!("Expected formula component, got {:?}", doc.blocks);
    };
    assert_eq!(name, "MathFormula");
    assert_eq!(props.get("formula"), Some(&PropValue::literal("E = mc^2")));
    assert_eq!(props.get("display"), Some(&PropValue::expression("true")));
}

#[test]
fn development_without_fragments_highlights_live() {
    let h = harness(RenderConfig::development());
    let doc = h
        .renderer
        .render(&CompiledMdx::from_raw("```python\nprint(1)\n```"))
        .unwrap();

    let (name, _, slot) = only_component(&doc);
    assert_eq!(name, "CodeBlock");
    assert_eq!(
        slot,
        &vec![RenderBlock::html("<pre data-live=\"python\">print(1)</pre>")]
    );
    assert!(h.handle.is_initialized());
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn empty_highlight_map_counts_as_missing() {
    let h = harness(RenderConfig::development());
    let content = CompiledMdx::from_raw("")
        .with_mdast(tree(PYTHON_LESSON))
        .with_highlighted_code(HighlightMap::new());

    h.renderer.render(&content).unwrap();
    assert!(h.handle.is_initialized());
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn production_never_highlights_live() {
    let h = harness(RenderConfig::production());
    let content = CompiledMdx::from_raw("").with_mdast(tree("```python\nprint(1)\n```"));

    let doc = h.renderer.render(&content).unwrap();
    assert_eq!(
        doc.blocks,
        vec![RenderBlock::html("<pre><code class=\"language-python\">print(1)\n</code></pre>")]
    );
    assert!(!h.handle.is_initialized());
}

#[test]
fn highlighter_is_built_once_across_renders() {
    let h = harness(RenderConfig::development());
    for _ in 0..3 {
        h.renderer
            .render(&CompiledMdx::from_raw("```rust\nfn main() {}\n```"))
            .unwrap();
    }
    assert_eq!(h.calls.load(Ordering::SeqCst), 3);
    assert_eq!(h.builds.load(Ordering::SeqCst), 1);
}

#[test]
fn untyped_code_is_highlighted_as_text_in_development() {
    let h = harness(RenderConfig::development());
    let doc = h
        .renderer
        .render(&CompiledMdx::from_raw("```\nplain words\n```"))
        .unwrap();

    let (name, props, slot) = only_component(&doc);
    assert_eq!(name, "CodeBlock");
    assert_eq!(props.get("lang"), Some(&PropValue::literal("text")));
    assert_eq!(
        slot,
        &vec![RenderBlock::html("<pre data-live=\"text\">plain words</pre>")]
    );
}
