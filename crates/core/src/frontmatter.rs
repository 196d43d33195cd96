use serde_json::Value as JsonValue;
use thiserror::Error;

/// Frontmatter split off the top of a raw lesson document.
#[derive(Debug)]
pub struct SplitDocument<'a> {
    /// Parsed frontmatter as a JSON object (empty when the document has none).
    pub frontmatter: JsonValue,
    /// Markdown body following the closing fence.
    pub body: &'a str,
}

/// Errors emitted while parsing or extracting frontmatter.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    /// Unclosed YAML fence (e.g., missing terminating `---`).
    #[error("Unterminated YAML frontmatter block: expected closing '---'")]
    Unterminated,
    /// YAML failed to parse.
    #[error("Frontmatter parse error: {0}")]
    Parse(String),
    /// Top-level YAML node was not a mapping.
    #[error("Frontmatter must be a YAML mapping at the top level")]
    InvalidRootType,
}

/// Splits leading YAML frontmatter from a raw document.
///
/// Blank lines and a byte order mark before the opening `---` are skipped.
/// Documents without frontmatter come back unchanged with an empty object.
pub fn split_frontmatter(input: &str) -> Result<SplitDocument<'_>, FrontmatterError> {
    match find_yaml_block(input)? {
        Some((block, body_start)) => Ok(SplitDocument {
            frontmatter: parse_yaml_block(block)?,
            body: &input[body_start..],
        }),
        None => Ok(SplitDocument {
            frontmatter: empty_object(),
            body: input,
        }),
    }
}

fn empty_object() -> JsonValue {
    JsonValue::Object(Default::default())
}

fn parse_yaml_block(block: &str) -> Result<JsonValue, FrontmatterError> {
    if block.trim().is_empty() {
        return Ok(empty_object());
    }

    let yaml: serde_yaml::Value =
        serde_yaml::from_str(block).map_err(|err| FrontmatterError::Parse(err.to_string()))?;
    let json =
        serde_json::to_value(yaml).map_err(|err| FrontmatterError::Parse(err.to_string()))?;

    match json {
        JsonValue::Null => Ok(empty_object()),
        JsonValue::Object(_) => Ok(json),
        _ => Err(FrontmatterError::InvalidRootType),
    }
}

/// Returns the YAML block and the byte offset where the body begins.
fn find_yaml_block(input: &str) -> Result<Option<(&str, usize)>, FrontmatterError> {
    let bom_len = if input.starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
    } else {
        0
    };

    let mut lines = LineCursor::new(input, bom_len);
    let block_start = loop {
        let Some((line, next)) = lines.next() else {
            return Ok(None);
        };
        if line.trim().is_empty() {
            continue;
        }
        if !is_yaml_fence(line) {
            return Ok(None);
        }
        break next;
    };

    let mut line_start = block_start;
    for (line, next) in lines {
        if is_yaml_fence(line) {
            let block = input[block_start..line_start].trim_end_matches(['\r', '\n']);
            return Ok(Some((block, next)));
        }
        line_start = next;
    }

    Err(FrontmatterError::Unterminated)
}

/// Iterates lines, yielding each line with the offset of the following one.
struct LineCursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    fn new(input: &'a str, pos: usize) -> Self {
        Self { input, pos }
    }
}

impl<'a> Iterator for LineCursor<'a> {
    type Item = (&'a str, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.input.len() {
            return None;
        }
        let rest = &self.input[self.pos..];
        let (line, advance) = match rest.find('\n') {
            Some(idx) => (&rest[..idx], idx + 1),
            None => (rest, rest.len()),
        };
        self.pos += advance;
        Some((line, self.pos))
    }
}

fn is_yaml_fence(line: &str) -> bool {
    line.trim_end_matches('\r') == "---"
}
