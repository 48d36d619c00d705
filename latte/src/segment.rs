use std::fmt;

/// Host-code delimiters wrapped around every code segment on output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeDelimiters {
    pub open: String,
    pub close: String,
}

impl Default for CodeDelimiters {
    fn default() -> Self {
        CodeDelimiters {
            open: "<?php ".to_string(),
            close: " ?>".to_string(),
        }
    }
}

/// One node of the compiled document.
///
/// Named blocks are delimited by `BlockOpen`/`BlockClose` markers instead of
/// text markers; the rewriter lifts everything between a pair into a
/// function unit and the markers themselves never reach the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal markup copied to the output.
    Text(String),
    /// A host-code statement sequence.
    Code(String),
    BlockOpen(String),
    BlockClose(String),
}

/// The output of resolving one tag: an ordered run of segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub segments: Vec<Segment>,
}

impl Fragment {
    pub fn empty() -> Self {
        Fragment { segments: Vec::new() }
    }

    pub fn code(code: impl Into<String>) -> Self {
        let mut fragment = Fragment::empty();
        fragment.push_code(&code.into());
        fragment
    }

    pub fn text(text: impl Into<String>) -> Self {
        let mut fragment = Fragment::empty();
        fragment.push_text(&text.into());
        fragment
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append code, merging with a trailing code segment so a single tag
    /// never produces two adjacent code runs.
    pub fn push_code(&mut self, code: &str) {
        if code.is_empty() {
            return;
        }
        if let Some(Segment::Code(last)) = self.segments.last_mut() {
            last.push_str(code);
        } else {
            self.segments.push(Segment::Code(code.to_string()));
        }
    }

    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Text(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(Segment::Text(text.to_string()));
        }
    }

    pub fn push(&mut self, segment: Segment) {
        match segment {
            Segment::Code(code) => self.push_code(&code),
            Segment::Text(text) => self.push_text(&text),
            marker => self.segments.push(marker),
        }
    }

    pub fn append(&mut self, other: Fragment) {
        for segment in other.segments {
            self.push(segment);
        }
    }

    /// `other` followed by `self`.
    pub fn prepend(&mut self, other: Fragment) {
        let mut merged = other;
        merged.append(std::mem::take(self));
        *self = merged;
    }

    /// The code of a fragment made only of code, as used when a handler
    /// result is substituted into a larger expression.
    pub fn as_code(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [] => Some(""),
            [Segment::Code(code)] => Some(code),
            _ => None,
        }
    }

    pub fn to_code(&self) -> String {
        render(&self.segments, &CodeDelimiters::default())
    }
}

impl From<String> for Fragment {
    fn from(code: String) -> Self {
        Fragment::code(code)
    }
}

impl From<&str> for Fragment {
    fn from(code: &str) -> Self {
        Fragment::code(code)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_code())
    }
}

/// Render segments to host text. Block markers are structural only.
pub fn render(segments: &[Segment], delimiters: &CodeDelimiters) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Code(code) => {
                out.push_str(&delimiters.open);
                out.push_str(code);
                out.push_str(&delimiters.close);
            }
            Segment::BlockOpen(_) | Segment::BlockClose(_) => {}
        }
    }
    out
}
