//! HTML serialization of rendered blocks.
//!
//! Component blocks are resolved through a [`ComponentSet`]. A component that
//! fails, or that has no implementation, contributes its children only.

use crate::config::RenderConfig;
use crate::pipeline::RenderedDocument;
use crate::registry::defaults::{CHALLENGE_COMPONENT, CODE_BLOCK_COMPONENT, VIDEO_COMPONENT};
use crate::renderer::render::safe_url;
use crate::renderer::{PropValue, Props, RenderBlock};
use html_escape::{encode_double_quoted_attribute, encode_text};
use lessonmark_core::math::FORMULA_COMPONENT;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Page footer component.
pub const FOOTER_COMPONENT: &str = "Footer";

/// Footer label when no build commit is configured.
pub const DEVELOPMENT_BUILD: &str = "DEVELOPMENT";

/// KaTeX color for unparseable input.
pub const FORMULA_ERROR_COLOR: &str = "#ff285a";

static VIDEO_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(mp4|webm|ogg|mov|avi)(\?.*)?$").unwrap());

const YOUTUBE_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture";
const VIMEO_ALLOW: &str = "autoplay; fullscreen; picture-in-picture";

/// Errors raised by a [`Component`] or [`FormulaRenderer`].
#[derive(Debug, Error)]
pub enum ComponentError {
    /// A required prop was not supplied.
    #[error("<{component}> requires the `{prop}` prop")]
    MissingProp {
        /// Component name
        component: String,
        /// Prop name
        prop: String,
    },
    /// A prop value is not acceptable.
    #[error("<{component}> has an invalid `{prop}` prop: {value:?}")]
    InvalidProp {
        /// Component name
        component: String,
        /// Prop name
        prop: String,
        /// Rejected value
        value: String,
    },
    /// The formula could not be typeset.
    #[error("Formula rendering failed: {0}")]
    Formula(String),
}

/// Renders one component invocation to HTML.
pub trait Component: Send + Sync {
    /// Produces the component markup; `children_html` is the rendered slot.
    fn render(&self, props: &Props, children_html: &str) -> Result<String, ComponentError>;
}

fn literal<'p>(props: &'p Props, name: &str) -> Option<&'p str> {
    match props.get(name) {
        Some(PropValue::Literal { value }) => Some(value),
        _ => None,
    }
}

fn required<'p>(props: &'p Props, component: &str, name: &str) -> Result<&'p str, ComponentError> {
    literal(props, name).ok_or_else(|| ComponentError::MissingProp {
        component: component.to_string(),
        prop: name.to_string(),
    })
}

fn flag(props: &Props, name: &str) -> bool {
    props.get(name).is_some_and(PropValue::as_flag)
}

fn flag_or(props: &Props, name: &str, default: bool) -> bool {
    props.get(name).map_or(default, PropValue::as_flag)
}

/// String literal or literal expression such as `{640}`.
fn scalar<'p>(props: &'p Props, name: &str) -> Option<&'p str> {
    match props.get(name) {
        Some(PropValue::Literal { value }) | Some(PropValue::Expression { value }) => Some(value),
        None => None,
    }
}

/// Typesets a formula.
pub trait FormulaRenderer: Send + Sync {
    /// Renders `formula` inline or in display mode.
    fn render(&self, formula: &str, display: bool) -> Result<String, ComponentError>;
}

/// Emits formula placeholders for client-side typesetting.
///
/// Formulas with unbalanced braces are rejected here rather than in the browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeferredFormulaRenderer;

fn check_braces(formula: &str) -> Result<(), ComponentError> {
    let mut depth: usize = 0;
    let mut chars = formula.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '{' => depth += 1,
            '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| ComponentError::Formula("unexpected `}`".to_string()))?;
            }
            _ => {}
        }
    }
    if depth == 0 {
        Ok(())
    } else {
        Err(ComponentError::Formula(format!("{} unclosed `{{`", depth)))
    }
}

impl FormulaRenderer for DeferredFormulaRenderer {
    fn render(&self, formula: &str, display: bool) -> Result<String, ComponentError> {
        check_braces(formula)?;
        let (tag, class) = if display {
            ("div", "math math-display")
        } else {
            ("span", "math math-inline")
        };
        Ok(format!(
            "<{tag} class=\"{class}\" data-formula=\"{}\">{}</{tag}>",
            encode_double_quoted_attribute(formula),
            encode_text(formula),
        ))
    }
}

/// Server-side typesetting with KaTeX.
#[cfg(feature = "katex")]
#[derive(Debug, Clone, Copy, Default)]
pub struct KatexFormulaRenderer;

#[cfg(feature = "katex")]
impl FormulaRenderer for KatexFormulaRenderer {
    fn render(&self, formula: &str, display: bool) -> Result<String, ComponentError> {
        let opts = katex::Opts::builder()
            .display_mode(display)
            .output_type(katex::OutputType::HtmlAndMathml)
            .throw_on_error(false)
            .error_color(FORMULA_ERROR_COLOR.to_string())
            .build()
            .map_err(|e| ComponentError::Formula(format!("KaTeX options error: {e}")))?;
        katex::render_with_opts(formula, &opts).map_err(|e| ComponentError::Formula(e.to_string()))
    }
}

/// `MathFormula`: renders the trimmed `formula`, honoring the `display` flag.
///
/// Typesetting failures are logged and the escaped source is shown instead.
pub struct MathFormula {
    renderer: Box<dyn FormulaRenderer>,
}

impl MathFormula {
    /// Uses `renderer` for typesetting.
    pub fn new(renderer: impl FormulaRenderer + 'static) -> Self {
        Self {
            renderer: Box::new(renderer),
        }
    }
}

impl Default for MathFormula {
    fn default() -> Self {
        #[cfg(feature = "katex")]
        {
            Self::new(KatexFormulaRenderer)
        }
        #[cfg(not(feature = "katex"))]
        {
            Self::new(DeferredFormulaRenderer)
        }
    }
}

impl Component for MathFormula {
    fn render(&self, props: &Props, _children_html: &str) -> Result<String, ComponentError> {
        let formula = required(props, FORMULA_COMPONENT, "formula")?.trim();
        let display = flag(props, "display");
        match self.renderer.render(formula, display) {
            Ok(html) => Ok(html),
            Err(err) => {
                log::error!("Failed to render formula `{}`: {}", formula, err);
                Ok(format!(
                    "<code class=\"math math-error\">{}</code>",
                    encode_text(formula)
                ))
            }
        }
    }
}

/// `CodeBlock`: frames highlighted markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeBlock;

impl Component for CodeBlock {
    fn render(&self, props: &Props, children_html: &str) -> Result<String, ComponentError> {
        Ok(match literal(props, "lang") {
            Some(lang) => format!(
                "<figure class=\"code-block\" data-lang=\"{}\">{}</figure>",
                encode_double_quoted_attribute(lang),
                children_html
            ),
            None => format!("<figure class=\"code-block\">{}</figure>", children_html),
        })
    }
}

/// `Video`: embedded video player.
///
/// `youtubeId` and `vimeoId` produce player iframes. A `src` ending in a
/// media file extension produces a `<video>` element; any other `src` is
/// embedded as an iframe. `controls` defaults to on; `autoplay`, `loop`
/// and `muted` default to off.
#[derive(Debug, Clone, Copy, Default)]
pub struct Video;

#[derive(Debug, Clone, Copy)]
struct Playback {
    autoplay: bool,
    controls: bool,
    looped: bool,
    muted: bool,
}

impl Playback {
    fn from_props(props: &Props) -> Self {
        Self {
            autoplay: flag(props, "autoplay"),
            controls: flag_or(props, "controls", true),
            looped: flag(props, "loop"),
            muted: flag(props, "muted"),
        }
    }
}

impl Video {
    fn embed_id<'p>(props: &'p Props, name: &str) -> Result<Option<&'p str>, ComponentError> {
        let Some(id) = literal(props, name) else {
            return Ok(None);
        };
        if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            Ok(Some(id))
        } else {
            Err(ComponentError::InvalidProp {
                component: VIDEO_COMPONENT.to_string(),
                prop: name.to_string(),
                value: id.to_string(),
            })
        }
    }

    fn youtube_src(id: &str, playback: Playback) -> String {
        let mut src = format!("https://www.youtube.com/embed/{id}?");
        if playback.autoplay {
            src.push_str("autoplay=1&");
        }
        if playback.muted {
            src.push_str("mute=1&");
        }
        if !playback.controls {
            src.push_str("controls=0&");
        }
        if playback.looped {
            src.push_str(&format!("loop=1&playlist={id}&"));
        }
        src
    }

    fn vimeo_src(id: &str, playback: Playback) -> String {
        let mut src = format!("https://player.vimeo.com/video/{id}?");
        if playback.autoplay {
            src.push_str("autoplay=1&");
        }
        if playback.muted {
            src.push_str("muted=1&");
        }
        if !playback.controls {
            src.push_str("controls=0&");
        }
        if playback.looped {
            src.push_str("loop=1&");
        }
        src
    }

    fn iframe(src: &str, title: &str, allow: Option<&str>, class_name: &str) -> String {
        let mut html = format!(
            "<div class=\"{}\" style=\"aspect-ratio:16/9\"><iframe src=\"{}\" title=\"{}\"",
            encode_double_quoted_attribute(&wrapper_class("video-embed", class_name)),
            encode_double_quoted_attribute(src),
            encode_double_quoted_attribute(title),
        );
        if let Some(allow) = allow {
            html.push_str(&format!(" allow=\"{allow}\""));
        }
        html.push_str(" allowfullscreen></iframe></div>");
        html
    }

    fn video_file(src: &str, title: &str, props: &Props, playback: Playback) -> String {
        let class_name = literal(props, "className").unwrap_or_default();
        let mut html = format!(
            "<div class=\"{}\"><video src=\"{}\" title=\"{}\"",
            encode_double_quoted_attribute(&wrapper_class("video", class_name)),
            encode_double_quoted_attribute(src),
            encode_double_quoted_attribute(title),
        );
        for dimension in ["width", "height"] {
            if let Some(value) = scalar(props, dimension) {
                html.push_str(&format!(" {dimension}=\"{}\"", encode_double_quoted_attribute(value)));
            }
        }
        html.push_str(" preload=\"metadata\"");
        for (on, attr) in [
            (playback.controls, " controls"),
            (playback.autoplay, " autoplay"),
            (playback.looped, " loop"),
            (playback.muted, " muted"),
        ] {
            if on {
                html.push_str(attr);
            }
        }
        html.push_str(">Your browser does not support the video tag.</video></div>");
        html
    }
}

fn wrapper_class(base: &str, extra: &str) -> String {
    let extra = extra.trim();
    if extra.is_empty() {
        base.to_string()
    } else {
        format!("{base} {extra}")
    }
}

impl Component for Video {
    fn render(&self, props: &Props, _children_html: &str) -> Result<String, ComponentError> {
        let playback = Playback::from_props(props);
        let title = literal(props, "title").unwrap_or("Video");
        let class_name = literal(props, "className").unwrap_or_default();

        if let Some(id) = Self::embed_id(props, "youtubeId")? {
            let src = Self::youtube_src(id, playback);
            return Ok(Self::iframe(&src, title, Some(YOUTUBE_ALLOW), class_name));
        }
        if let Some(id) = Self::embed_id(props, "vimeoId")? {
            let src = Self::vimeo_src(id, playback);
            return Ok(Self::iframe(&src, title, Some(VIMEO_ALLOW), class_name));
        }

        let src = required(props, VIDEO_COMPONENT, "src")?;
        if VIDEO_FILE.is_match(src) {
            Ok(Self::video_file(safe_url(src), title, props, playback))
        } else {
            Ok(Self::iframe(safe_url(src), title, None, class_name))
        }
    }
}

/// `Challenge`: interactive exercise container.
#[derive(Debug, Clone, Copy, Default)]
pub struct Challenge;

impl Component for Challenge {
    fn render(&self, props: &Props, children_html: &str) -> Result<String, ComponentError> {
        let id = required(props, CHALLENGE_COMPONENT, "id")?;
        let mut html = format!(
            "<section class=\"challenge\" data-challenge-id=\"{}\">",
            encode_double_quoted_attribute(id)
        );
        if let Some(title) = literal(props, "title") {
            html.push_str(&format!("<h3>{}</h3>", encode_text(title)));
        }
        html.push_str(children_html);
        html.push_str("</section>");
        Ok(html)
    }
}

/// `Footer`: page footer showing the abbreviated build commit.
///
/// Without a commit the build reads [`DEVELOPMENT_BUILD`].
#[derive(Debug, Clone, Default)]
pub struct Footer {
    build_commit: Option<String>,
}

impl Footer {
    /// Footer for `build_commit`.
    pub fn new(build_commit: Option<String>) -> Self {
        Self { build_commit }
    }

    /// First seven characters of the commit, or [`DEVELOPMENT_BUILD`].
    pub fn build_label(&self) -> String {
        match self.build_commit.as_deref().map(str::trim) {
            Some(commit) if !commit.is_empty() => commit.chars().take(7).collect(),
            _ => DEVELOPMENT_BUILD.to_string(),
        }
    }
}

impl Component for Footer {
    fn render(&self, _props: &Props, _children_html: &str) -> Result<String, ComponentError> {
        Ok(format!(
            "<footer class=\"lesson-footer\"><span class=\"build\">Commit: {}</span></footer>",
            encode_text(&self.build_label())
        ))
    }
}

/// Component implementations keyed by name.
#[derive(Default)]
pub struct ComponentSet {
    components: BTreeMap<String, Box<dyn Component>>,
}

impl fmt::Debug for ComponentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.components.keys()).finish()
    }
}

impl ComponentSet {
    /// Empty set; every component renders its children only.
    pub fn new() -> Self {
        Self::default()
    }

    /// The lesson page components.
    pub fn lesson_defaults(config: &RenderConfig) -> Self {
        let mut set = Self::new();
        set.insert(CODE_BLOCK_COMPONENT, CodeBlock);
        set.insert(FORMULA_COMPONENT, MathFormula::default());
        set.insert(VIDEO_COMPONENT, Video);
        set.insert(CHALLENGE_COMPONENT, Challenge);
        set.insert(FOOTER_COMPONENT, Footer::new(config.build_commit.clone()));
        set
    }

    /// Adds or replaces a component.
    pub fn insert(&mut self, name: impl Into<String>, component: impl Component + 'static) {
        self.components.insert(name.into(), Box::new(component));
    }

    /// Returns true if `name` has an implementation.
    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Serializes blocks to HTML.
    pub fn render_blocks(&self, blocks: &[RenderBlock]) -> String {
        let mut html = String::new();
        for block in blocks {
            match block {
                RenderBlock::Html { content } => html.push_str(content),
                RenderBlock::Component {
                    name,
                    props,
                    slot_children,
                } => {
                    let children = self.render_blocks(slot_children);
                    html.push_str(&self.render_component(name, props, children));
                }
            }
        }
        html
    }

    fn render_component(&self, name: &str, props: &Props, children: String) -> String {
        let Some(component) = self.components.get(name) else {
            log::warn!("No implementation for <{}>; rendering its children only", name);
            return children;
        };
        match component.render(props, &children) {
            Ok(html) => html,
            Err(err) => {
                log::error!("Component <{}> failed: {}", name, err);
                children
            }
        }
    }

    /// Serializes a full lesson page: article body followed by the footer.
    pub fn render_page(&self, document: &RenderedDocument) -> String {
        let mut html = String::from("<article class=\"lesson\">");
        if let Some(title) = document.frontmatter.get("title").and_then(|t| t.as_str()) {
            html.push_str(&format!("<h1>{}</h1>", encode_text(title)));
        }
        html.push_str(&self.render_blocks(&document.blocks));
        html.push_str("</article>");
        html.push_str(&self.render_component(FOOTER_COMPONENT, &Props::new(), String::new()));
        html
    }
}

impl RenderedDocument {
    /// Serializes the document body with `components`.
    pub fn to_html(&self, components: &ComponentSet) -> String {
        components.render_blocks(&self.blocks)
    }
}
