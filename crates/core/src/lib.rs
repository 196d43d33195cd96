#![deny(missing_docs)]
//! lessonmark core: compiled content model, math preprocessing, and markdown parsing.

/// Fenced code block tracking.
pub mod code_fence;
/// Compiled content model.
pub mod content;
/// Core error types.
pub mod error;
/// YAML frontmatter extraction.
pub mod frontmatter;
/// Pre-highlighted markup trees.
pub mod hast;
/// Math syntax preprocessing.
pub mod math;
/// Markdown parsing.
pub mod parse;

pub use code_fence::{FenceState, OpenFence, Segment, split_fenced};
pub use content::{CompiledMdx, HighlightMap, HighlightedFragment, highlight_id};
pub use error::{LessonError, SourceLocation};
pub use frontmatter::{FrontmatterError, SplitDocument, split_frontmatter};
pub use hast::HastNode;
pub use math::{escape_formula_attr, preprocess_math, unescape_formula_attr};
pub use parse::{ParseOptions, parse_mdast};
