//! Syntax highlighting for code blocks that were not highlighted at compile time.
//!
//! The engine is expensive to construct (all syntax definitions and themes
//! are loaded), so it sits behind a [`HighlighterHandle`] that builds it on
//! first use and shares it afterwards.

use lessonmark_core::HastNode;
use once_cell::sync::{Lazy, OnceCell};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, FontStyle, Style, Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use thiserror::Error;

/// Language and theme for one highlighting call.
#[derive(Debug, Clone, Copy)]
pub struct HighlightOptions<'a> {
    /// Language token (e.g., "rust", "py").
    pub lang: &'a str,
    /// Theme name.
    pub theme: &'a str,
}

/// Errors produced by a [`Highlighter`].
#[derive(Debug, Error)]
pub enum HighlightError {
    /// No syntax definition matches the language token.
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),
    /// No theme with this name is loaded.
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),
    /// The engine failed while tokenizing.
    #[error("Highlighting failed: {0}")]
    Engine(String),
}

/// A syntax highlighting engine producing hast markup.
pub trait Highlighter: Send + Sync {
    /// Highlights `code`, returning a `pre > code` tree.
    fn code_to_hast(&self, code: &str, options: &HighlightOptions<'_>) -> Result<HastNode, HighlightError>;
}

/// [`Highlighter`] backed by syntect's bundled syntaxes and themes.
pub struct SyntectHighlighter {
    syntaxes: SyntaxSet,
    themes: ThemeSet,
}

impl SyntectHighlighter {
    /// Loads the default syntax and theme sets.
    pub fn new() -> Self {
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            themes: ThemeSet::load_defaults(),
        }
    }

    /// Names of the loaded themes.
    pub fn theme_names(&self) -> impl Iterator<Item = &str> {
        self.themes.themes.keys().map(String::as_str)
    }

    fn theme(&self, name: &str) -> Result<&Theme, HighlightError> {
        self.themes
            .themes
            .get(name)
            .ok_or_else(|| HighlightError::UnknownTheme(name.to_string()))
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SyntectHighlighter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntectHighlighter")
            .field("syntaxes", &self.syntaxes.syntaxes().len())
            .field("themes", &self.themes.themes.len())
            .finish()
    }
}

fn is_plain_text(lang: &str) -> bool {
    ["text", "txt", "plain", "plaintext"]
        .iter()
        .any(|alias| alias.eq_ignore_ascii_case(lang))
}

impl Highlighter for SyntectHighlighter {
    fn code_to_hast(&self, code: &str, options: &HighlightOptions<'_>) -> Result<HastNode, HighlightError> {
        let syntax = if is_plain_text(options.lang) {
            Some(self.syntaxes.find_syntax_plain_text())
        } else {
            self.syntaxes
                .find_syntax_by_token(options.lang)
                .or_else(|| self.syntaxes.find_syntax_by_name(options.lang))
        }
        .ok_or_else(|| HighlightError::UnknownLanguage(options.lang.to_string()))?;
        let theme = self.theme(options.theme)?;

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut lines = Vec::new();
        for (index, line) in LinesWithEndings::from(code).enumerate() {
            let ranges = highlighter
                .highlight_line(line, &self.syntaxes)
                .map_err(|err| HighlightError::Engine(err.to_string()))?;

            if index > 0 {
                lines.push(HastNode::text("\n"));
            }
            let tokens = ranges
                .into_iter()
                .filter_map(|(style, text)| {
                    let text = text.trim_end_matches(['\n', '\r']);
                    (!text.is_empty()).then(|| token_span(style, text))
                })
                .collect();
            lines.push(HastNode::element("span", tokens).with_property("className", json!(["line"])));
        }

        let mut pre_style = String::new();
        if let Some(background) = theme.settings.background {
            pre_style.push_str(&format!("background-color:{}", css_color(background)));
        }
        if let Some(foreground) = theme.settings.foreground {
            if !pre_style.is_empty() {
                pre_style.push(';');
            }
            pre_style.push_str(&format!("color:{}", css_color(foreground)));
        }

        let code_el = HastNode::element("code", lines);
        let mut pre = HastNode::element("pre", vec![code_el])
            .with_property("className", json!(["shiki", theme_class(options.theme)]))
            .with_property("tabIndex", 0);
        if !pre_style.is_empty() {
            pre = pre.with_property("style", pre_style);
        }
        Ok(pre)
    }
}

fn token_span(style: Style, text: &str) -> HastNode {
    let mut css = format!("color:{}", css_color(style.foreground));
    if style.font_style.contains(FontStyle::ITALIC) {
        css.push_str(";font-style:italic");
    }
    if style.font_style.contains(FontStyle::BOLD) {
        css.push_str(";font-weight:bold");
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        css.push_str(";text-decoration:underline");
    }
    HastNode::element("span", vec![HastNode::text(text)]).with_property("style", css)
}

fn css_color(color: Color) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r, color.g, color.b)
}

/// CSS-friendly class for a theme name.
fn theme_class(theme: &str) -> String {
    theme
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}

type HighlighterFactory = Box<dyn Fn() -> Arc<dyn Highlighter> + Send + Sync>;

/// Lazily initialized, shared highlighter.
///
/// The factory runs at most once, on the first [`get`](Self::get), even when
/// several renders ask concurrently. The instance lives as long as the handle.
pub struct HighlighterHandle {
    cell: OnceCell<Arc<dyn Highlighter>>,
    factory: HighlighterFactory,
}

impl HighlighterHandle {
    /// Creates a handle that builds its highlighter with `factory`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Highlighter> + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            factory: Box::new(factory),
        }
    }

    /// Handle for the syntect engine.
    pub fn syntect() -> Self {
        Self::new(|| Arc::new(SyntectHighlighter::new()))
    }

    /// Handle around an existing instance; counts as initialized.
    pub fn from_instance(highlighter: Arc<dyn Highlighter>) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(Arc::clone(&highlighter));
        Self {
            cell,
            factory: Box::new(move || Arc::clone(&highlighter)),
        }
    }

    /// Returns the highlighter, constructing it on first use.
    pub fn get(&self) -> &dyn Highlighter {
        self.cell
            .get_or_init(|| {
                log::debug!("Initializing syntax highlighter");
                (self.factory)()
            })
            .as_ref()
    }

    /// Returns true once the highlighter has been constructed.
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

static SHARED_HANDLE: Lazy<Arc<HighlighterHandle>> = Lazy::new(|| Arc::new(HighlighterHandle::syntect()));

/// Process-wide syntect handle shared by every renderer that does not inject its own.
pub fn shared_handle() -> Arc<HighlighterHandle> {
    Arc::clone(&SHARED_HANDLE)
}

impl fmt::Debug for HighlighterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HighlighterHandle")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static ENGINE: Lazy<SyntectHighlighter> = Lazy::new(SyntectHighlighter::new);

    fn options(lang: &str) -> HighlightOptions<'_> {
        HighlightOptions {
            lang,
            theme: "InspiredGitHub",
        }
    }

    #[test]
    fn highlights_rust_into_line_spans() {
        let hast = ENGINE
            .code_to_hast("fn main() {\n    let x = 1;\n}\n", &options("rust"))
            .unwrap();
        let html = hast.to_html();
        assert!(html.starts_with("<pre class=\"shiki inspiredgithub\""), "{html}");
        assert_eq!(html.matches("<span class=\"line\">").count(), 3);
        assert!(html.contains("style=\"color:#"), "{html}");
        assert_eq!(hast.text_content(), "fn main() {\n    let x = 1;\n}");
    }

    #[test]
    fn escapes_code_text() {
        let hast = ENGINE.code_to_hast("a < b && c", &options("rust")).unwrap();
        let html = hast.to_html();
        assert!(html.contains("&lt;"), "{html}");
        assert!(!html.contains(" < "), "{html}");
    }

    #[test]
    fn text_uses_plain_syntax() {
        let hast = ENGINE.code_to_hast("just words", &options("text")).unwrap();
        assert_eq!(hast.text_content(), "just words");
        assert_eq!(hast.to_html().matches("<span class=\"line\">").count(), 1);
    }

    #[test]
    fn unknown_language_is_an_error() {
        let err = ENGINE.code_to_hast("x", &options("no-such-lang")).unwrap_err();
        assert!(matches!(err, HighlightError::UnknownLanguage(lang) if lang == "no-such-lang"));
    }

    #[test]
    fn unknown_theme_is_an_error() {
        let opts = HighlightOptions {
            lang: "rust",
            theme: "Nope",
        };
        let err = ENGINE.code_to_hast("x", &opts).unwrap_err();
        assert!(matches!(err, HighlightError::UnknownTheme(_)));
    }

    #[test]
    fn default_themes_include_configured_default() {
        assert!(ENGINE.theme_names().any(|name| name == "InspiredGitHub"));
    }

    struct Plain;

    impl Highlighter for Plain {
        fn code_to_hast(&self, code: &str, _options: &HighlightOptions<'_>) -> Result<HastNode, HighlightError> {
            Ok(HastNode::element("pre", vec![HastNode::text(code)]))
        }
    }

    #[test]
    fn handle_builds_once_under_concurrency() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&builds);
        let handle = Arc::new(HighlighterHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(Plain) as Arc<dyn Highlighter>
        }));
        assert!(!handle.is_initialized());

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let handle = Arc::clone(&handle);
                std::thread::spawn(move || {
                    handle
                        .get()
                        .code_to_hast("x", &options("rust"))
                        .map(|hast| hast.to_html())
                })
            })
            .collect();
        for thread in threads {
            assert_eq!(thread.join().unwrap().unwrap(), "<pre>x</pre>");
        }

        assert!(handle.is_initialized());
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shared_handle_is_one_instance() {
        assert!(Arc::ptr_eq(&shared_handle(), &shared_handle()));
    }

    #[test]
    fn from_instance_is_initialized() {
        let handle = HighlighterHandle::from_instance(Arc::new(Plain));
        assert!(handle.is_initialized());
    }
}
