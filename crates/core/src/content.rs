//! Compiled lesson content as produced by the content build.

use crate::hast::HastNode;
use markdown::mdast::{Code, Node};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Meta-string key carrying the highlight id of a code block.
pub const HIGHLIGHT_ID_KEY: &str = "highlightId";

/// Pre-highlighted markup for one code block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightedFragment {
    /// Language the fragment was highlighted as.
    pub lang: String,
    /// Rendering-ready markup.
    pub hast: HastNode,
}

/// Highlight id to fragment mapping.
pub type HighlightMap = BTreeMap<String, HighlightedFragment>;

/// A lesson document, either fully compiled or raw.
///
/// Production content carries both the syntax tree and the highlight map.
/// Development content may carry only `raw`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledMdx {
    /// Markdown source without frontmatter.
    pub raw: String,
    /// Syntax tree produced by the content build.
    #[serde(default)]
    pub mdast: Option<Node>,
    /// Pre-highlighted code blocks keyed by highlight id.
    #[serde(default)]
    pub highlighted_code: Option<HighlightMap>,
    /// Parsed frontmatter (an object, or null when absent).
    #[serde(default)]
    pub frontmatter: JsonValue,
}

impl CompiledMdx {
    /// Creates raw, uncompiled content.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            ..Default::default()
        }
    }

    /// Sets the compiled syntax tree.
    pub fn with_mdast(mut self, mdast: Node) -> Self {
        self.mdast = Some(mdast);
        self
    }

    /// Sets the highlight map.
    pub fn with_highlighted_code(mut self, highlighted: HighlightMap) -> Self {
        self.highlighted_code = Some(highlighted);
        self
    }

    /// Sets the frontmatter.
    pub fn with_frontmatter(mut self, frontmatter: JsonValue) -> Self {
        self.frontmatter = frontmatter;
        self
    }

    /// Returns true when a non-empty highlight map is present.
    pub fn has_highlighted_code(&self) -> bool {
        self.highlighted_code
            .as_ref()
            .is_some_and(|map| !map.is_empty())
    }

    /// Looks up the pre-highlighted fragment for a code node.
    pub fn fragment_for(&self, code: &Code) -> Option<&HighlightedFragment> {
        let id = highlight_id(code)?;
        self.highlighted_code.as_ref()?.get(id)
    }
}

/// Reads the highlight id from a code node's meta string.
///
/// The id is written by the content build as a `highlightId=<id>` token;
/// the value may be wrapped in single or double quotes.
///
/// ```
/// use lessonmark_core::content::highlight_id;
/// use markdown::mdast::Code;
///
/// let code = Code {
///     value: "fn main() {}".into(),
///     position: None,
///     lang: Some("rust".into()),
///     meta: Some("title=main.rs highlightId=\"b3\"".into()),
/// };
/// assert_eq!(highlight_id(&code), Some("b3"));
/// ```
pub fn highlight_id(code: &Code) -> Option<&str> {
    code.meta
        .as_deref()?
        .split_whitespace()
        .find_map(|token| token.strip_prefix(HIGHLIGHT_ID_KEY)?.strip_prefix('='))
        .map(|value| value.trim_matches(|c| c == '"' || c == '\''))
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn code(meta: Option<&str>) -> Code {
        Code {
            value: "ls".into(),
            position: None,
            lang: Some("rust".into()),
            meta: meta.map(str::to_string),
        }
    }

    fn fragment() -> HighlightedFragment {
        HighlightedFragment {
            lang: "rust".into(),
            hast: HastNode::text("ls"),
        }
    }

    #[test]
    fn highlight_id_from_meta() {
        assert_eq!(highlight_id(&code(Some("highlightId=a1"))), Some("a1"));
        assert_eq!(highlight_id(&code(Some("highlightId='a2' x"))), Some("a2"));
        assert_eq!(highlight_id(&code(Some("highlightIdx=a3"))), None);
        assert_eq!(highlight_id(&code(Some("highlightId="))), None);
        assert_eq!(highlight_id(&code(None)), None);
    }

    #[test]
    fn empty_map_counts_as_missing() {
        let content = CompiledMdx::from_raw("x").with_highlighted_code(HighlightMap::new());
        assert!(!content.has_highlighted_code());
    }

    #[test]
    fn fragment_lookup() {
        let mut map = HighlightMap::new();
        map.insert("a1".into(), fragment());
        let content = CompiledMdx::from_raw("x").with_highlighted_code(map);
        assert!(content.has_highlighted_code());
        assert_eq!(
            content.fragment_for(&code(Some("highlightId=a1"))),
            Some(&fragment())
        );
        assert!(content.fragment_for(&code(Some("highlightId=zz"))).is_none());
    }

    #[test]
    fn deserializes_camel_case_json() {
        let content: CompiledMdx = serde_json::from_value(json!({
            "raw": "# Hi",
            "highlightedCode": {
                "a1": { "lang": "rust", "hast": { "type": "text", "value": "ls" } }
            }
        }))
        .unwrap();
        assert_eq!(content.raw, "# Hi");
        assert!(content.mdast.is_none());
        assert!(content.has_highlighted_code());
        assert!(content.frontmatter.is_null());
    }

    #[test]
    fn round_trips_a_parsed_tree() {
        let tree = markdown::to_mdast("# Title\n\nBody", &markdown::ParseOptions::default())
            .unwrap();
        let content = CompiledMdx::from_raw("# Title\n\nBody").with_mdast(tree);
        let json = serde_json::to_string(&content).unwrap();
        let back: CompiledMdx = serde_json::from_str(&json).unwrap();
        assert_eq!(back, content);
    }
}
