//! Fenced code block tracking.
//!
//! Text rewrites such as math preprocessing must leave fenced code untouched.
//! This module splits a document into prose and fenced regions using the
//! CommonMark fence rules (0-3 columns of indent, three or more markers,
//! closer uses the same marker and is at least as long as the opener).

/// An open code fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFence {
    /// Fence marker character (`` ` `` or `~`).
    pub marker: char,
    /// Number of marker characters in the opener.
    pub length: usize,
}

/// Fence state carried from one line to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FenceState {
    open: Option<OpenFence>,
}

impl FenceState {
    /// Returns the fence currently open, if any.
    pub fn open_fence(&self) -> Option<OpenFence> {
        self.open
    }

    /// Returns true while inside a fenced block.
    pub fn is_inside(&self) -> bool {
        self.open.is_some()
    }

    /// Feeds one line (without its newline) and returns whether it belongs to a fence.
    ///
    /// Opening and closing fence lines count as fenced.
    pub fn advance(&mut self, line: &str) -> bool {
        let (columns, offset) = leading_whitespace(line);
        let after_indent = &line[offset..];

        match self.open {
            None => {
                if columns <= 3
                    && let Some((marker, length)) = fence_run(after_indent)
                    && (marker == '~' || !after_indent[length..].contains('`'))
                {
                    self.open = Some(OpenFence { marker, length });
                    return true;
                }
                false
            }
            Some(open) => {
                if columns <= 3
                    && let Some((marker, length)) = fence_run(after_indent)
                    && marker == open.marker
                    && length >= open.length
                    && after_indent[length..].trim().is_empty()
                {
                    self.open = None;
                }
                true
            }
        }
    }
}

/// A contiguous run of lines that is either prose or fenced code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Segment text including line terminators.
    pub text: &'a str,
    /// Whether the segment is inside a fenced code block.
    pub fenced: bool,
}

/// Splits `input` into alternating prose and fenced segments.
///
/// Concatenating the segment texts reproduces `input` exactly. An unclosed
/// fence extends to the end of the document.
pub fn split_fenced(input: &str) -> Vec<Segment<'_>> {
    let mut segments: Vec<Segment<'_>> = Vec::new();
    let mut state = FenceState::default();
    let mut start = 0;
    let mut current: Option<bool> = None;

    for line in input.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        let fenced = state.advance(content);
        let line_start = line.as_ptr() as usize - input.as_ptr() as usize;

        match current {
            Some(kind) if kind != fenced => {
                segments.push(Segment {
                    text: &input[start..line_start],
                    fenced: kind,
                });
                start = line_start;
                current = Some(fenced);
            }
            None => current = Some(fenced),
            _ => {}
        }
    }

    if let Some(kind) = current {
        segments.push(Segment {
            text: &input[start..],
            fenced: kind,
        });
    }

    segments
}

/// Returns (visual columns, byte offset) of the leading whitespace.
/// Tabs expand to the next 4-column stop.
fn leading_whitespace(line: &str) -> (usize, usize) {
    let mut columns = 0;
    let mut bytes = 0;
    for b in line.bytes() {
        match b {
            b' ' => columns += 1,
            b'\t' => columns += 4 - (columns % 4),
            _ => break,
        }
        bytes += 1;
    }
    (columns, bytes)
}

/// Returns the marker and run length when the text starts with a fence run.
fn fence_run(text: &str) -> Option<(char, usize)> {
    let marker = text.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let length = text.bytes().take_while(|b| *b == marker as u8).count();
    (length >= 3).then_some((marker, length))
}
