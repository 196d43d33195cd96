//! Math syntax preprocessing.
//!
//! Rewrites `$$…$$` block math into fenced `math` code blocks and `$…$`
//! inline math into `<MathFormula>` invocations so the markdown parser sees
//! ordinary constructs. Fenced code is never rewritten.

use crate::code_fence::split_fenced;
use once_cell::sync::Lazy;
use regex::Regex;

/// Component name used for inline formulas.
pub const FORMULA_COMPONENT: &str = "MathFormula";

/// Language tag of fenced blocks produced from block math.
pub const MATH_LANG: &str = "math";

static BLOCK_MATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\$([\s\S]+?)\$\$").unwrap());

static INLINE_MATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$([^$\n]+?)\$").unwrap());

/// Rewrites math syntax in `raw` into renderable markdown.
///
/// # Examples
///
/// ```
/// use lessonmark_core::math::preprocess_math;
///
/// assert_eq!(
///     preprocess_math("Compute $a^2+b^2=c^2$ now."),
///     r#"Compute <MathFormula formula="a^2+b^2=c^2" display={false} /> now."#
/// );
/// ```
pub fn preprocess_math(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + raw.len() / 8);
    for segment in split_fenced(raw) {
        if segment.fenced {
            out.push_str(segment.text);
        } else {
            rewrite_prose(segment.text, &mut out);
        }
    }
    out
}

fn rewrite_prose(text: &str, out: &mut String) {
    let mut cursor = 0;
    for caps in BLOCK_MATH.captures_iter(text) {
        let (Some(whole), Some(formula)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        rewrite_inline(&text[cursor..whole.start()], out);
        out.push_str("\n```");
        out.push_str(MATH_LANG);
        out.push('\n');
        out.push_str(&neutralize_fences(formula.as_str().trim()));
        out.push_str("\n```\n");
        cursor = whole.end();
    }
    rewrite_inline(&text[cursor..], out);
}

fn rewrite_inline(text: &str, out: &mut String) {
    let mut cursor = 0;
    let mut search = 0;
    while let Some(caps) = INLINE_MATH.captures_at(text, search) {
        let (Some(whole), Some(formula)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        if !is_inline_candidate(text, whole.start(), whole.end()) {
            // Retry from the next dollar.
            search = whole.start() + 1;
            continue;
        }

        out.push_str(&text[cursor..whole.start()]);
        out.push('<');
        out.push_str(FORMULA_COMPONENT);
        out.push_str(" formula=\"");
        out.push_str(&escape_formula_attr(formula.as_str()));
        out.push_str("\" display={false} />");
        cursor = whole.end();
        search = whole.end();
    }
    out.push_str(&text[cursor..]);
}

/// A `$…$` pair is math unless a delimiter touches another `$` or is backslash-escaped.
fn is_inline_candidate(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    let before_close = text[..end - 1].chars().next_back();
    !matches!(before, Some('$' | '\\')) && after != Some('$') && before_close != Some('\\')
}

/// Breaks up triple backticks so a formula cannot close its own fence.
fn neutralize_fences(formula: &str) -> String {
    formula.replace("```", "\\`\\`\\`")
}

/// Escapes a formula for embedding as a quoted MDX attribute value.
///
/// Backslashes are doubled. `&`, `"`, `{` and `}` become character references,
/// which the MDX parser decodes back into the attribute value.
pub fn escape_formula_attr(formula: &str) -> String {
    let mut escaped = String::with_capacity(formula.len());
    for c in formula.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '{' => escaped.push_str("&#123;"),
            '}' => escaped.push_str("&#125;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Restores a formula from a parsed attribute value.
///
/// The parser has already decoded character references, so only doubled
/// backslashes remain to undo. A lone backslash is kept as is.
pub fn unescape_formula_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '\\' && chars.peek() == Some(&'\\') {
            chars.next();
        }
    }
    out
}
