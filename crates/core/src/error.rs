use thiserror::Error;

use crate::frontmatter::FrontmatterError;

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Optional content path
    pub path: Option<String>,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            path: None,
            line,
            column,
        }
    }

    /// Attach the content path this location belongs to
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{}:{}:{}", path, self.line, self.column)
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// Errors that can occur while loading or rendering lesson content.
#[derive(Debug, Error)]
pub enum LessonError {
    /// A production render received content without a compiled syntax tree.
    ///
    /// This means the content compilation step did not run or its output was
    /// lost; it is never recovered from at render time.
    #[error("Missing compiled syntax tree{}: content must be compiled before a production render", path_suffix(.path))]
    BuildIntegrity {
        /// Content path, when the render was reached through a content source
        path: Option<String>,
    },
    /// markdown-rs parser error surfaced through the adapter.
    #[error("Parse error at {location}: {message}")]
    MarkdownAdapter {
        /// Error message
        message: String,
        /// Source location
        location: SourceLocation,
    },
    /// No content exists under the requested path.
    #[error("Content not found: {0}")]
    ContentNotFound(String),
    /// IO error while reading content.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Compiled content was not valid JSON.
    #[error("Invalid compiled content: {0}")]
    Json(#[from] serde_json::Error),
    /// Raw content carried malformed frontmatter.
    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),
    /// Internal logic error (unexpected state).
    #[error("Internal error: {0}")]
    Internal(String),
}

fn path_suffix(path: &Option<String>) -> String {
    match path {
        Some(path) => format!(" for '{}'", path),
        None => String::new(),
    }
}

impl LessonError {
    /// Create a parse error with location
    pub fn parse_error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::MarkdownAdapter {
            message: message.into(),
            location: SourceLocation::new(line, column),
        }
    }

    /// Returns true for errors that indicate broken build output rather than bad input.
    pub fn is_build_integrity(&self) -> bool {
        matches!(self, LessonError::BuildIntegrity { .. })
    }

    /// Attach a content path to errors that can carry one.
    pub fn at_path(self, content_path: &str) -> Self {
        match self {
            LessonError::BuildIntegrity { path: None } => LessonError::BuildIntegrity {
                path: Some(content_path.to_string()),
            },
            LessonError::MarkdownAdapter { message, location } if location.path.is_none() => {
                LessonError::MarkdownAdapter {
                    message,
                    location: location.with_path(content_path),
                }
            }
            other => other,
        }
    }
}
