//! Content sources and the fetch-then-render wrapper.

use crate::pipeline::{MdxRenderer, RenderedDocument};
use lessonmark_core::{CompiledMdx, LessonError, split_frontmatter};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Supplies lesson content by path.
pub trait ContentSource {
    /// Fetches the content stored under `path`.
    fn fetch(&self, path: &str) -> Result<CompiledMdx, LessonError>;
}

impl ContentSource for BTreeMap<String, CompiledMdx> {
    fn fetch(&self, path: &str) -> Result<CompiledMdx, LessonError> {
        self.get(path)
            .cloned()
            .ok_or_else(|| LessonError::ContentNotFound(path.to_string()))
    }
}

/// Reads content from a directory.
///
/// `<root>/<path>.json` holds compiled build output and is preferred;
/// `<root>/<path>.mdx` holds raw source with optional YAML frontmatter.
#[derive(Debug, Clone)]
pub struct FsContentSource {
    root: PathBuf,
}

impl FsContentSource {
    /// Creates a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str, extension: &str) -> Result<PathBuf, LessonError> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain {
            return Err(LessonError::ContentNotFound(path.to_string()));
        }
        Ok(self.root.join(format!("{}.{}", path, extension)))
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, LessonError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

impl ContentSource for FsContentSource {
    fn fetch(&self, path: &str) -> Result<CompiledMdx, LessonError> {
        let compiled = self.resolve(path, "json")?;
        if let Some(json) = read_optional(&compiled)? {
            log::debug!("Loading compiled content from {}", compiled.display());
            return Ok(serde_json::from_str(&json)?);
        }

        let raw = self.resolve(path, "mdx")?;
        if let Some(source) = read_optional(&raw)? {
            log::debug!("Loading raw content from {}", raw.display());
            let split = split_frontmatter(&source)?;
            return Ok(CompiledMdx::from_raw(split.body).with_frontmatter(split.frontmatter));
        }

        Err(LessonError::ContentNotFound(path.to_string()))
    }
}

/// Fetches `path` from `source` and renders it.
///
/// Errors that can name a location are tagged with `path`.
pub fn render_content(
    source: &dyn ContentSource,
    path: &str,
    renderer: &MdxRenderer,
) -> Result<RenderedDocument, LessonError> {
    let content = source.fetch(path).map_err(|err| err.at_path(path))?;
    renderer.render(&content).map_err(|err| err.at_path(path))
}
