use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};

/// What went wrong while resolving a tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// `tag` is the macro as written, e.g. `assign` rather than `var`.
    #[error("missing {what} in {{{tag}}}")]
    MissingArgument { tag: String, what: &'static str },
    #[error("block name must be alphanumeric string, '{0}' given")]
    InvalidBlockName(String),
    #[error("included block name must be alphanumeric string, '{0}' given")]
    InvalidIncludeName(String),
    #[error("cannot redeclare block '{0}'")]
    DuplicateBlock(String),
    #[error("{{extends}} must be placed outside any block")]
    ExtendsInsideBlock,
    #[error("multiple {{extends}} declarations are not allowed")]
    MultipleExtends,
    /// Carries the closing tag as written, e.g. `/block foo`.
    #[error("tag {{{0}}} was not expected here")]
    UnexpectedClose(String),
    #[error("there are {0} unclosed blocks")]
    UnclosedBlocks(usize),
    #[error("unknown macro syntax '{0}'")]
    UnknownSyntax(String),
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),
    #[error("invalid capture block parameter '{0}'")]
    InvalidCaptureTarget(String),
    #[error("cannot include {0} block outside of any block")]
    ParentOutsideBlock(String),
    #[error("{0}")]
    Custom(String),
}

/// A fatal compile error, located at the tag that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} on line {line}")]
pub struct CompileError {
    pub kind: ErrorKind,
    /// Source text of the offending tag (empty at end of input).
    pub tag: String,
    pub span: Range<usize>,
    pub line: usize,
    pub file_id: usize,
}

impl CompileError {
    pub fn new(kind: ErrorKind, location: &Location, file_id: usize) -> Self {
        CompileError {
            kind,
            tag: location.tag.clone(),
            span: location.span.clone(),
            line: location.line,
            file_id,
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let mut diagnostic = Diagnostic::error()
            .with_message(self.kind.to_string())
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())]);
        if !self.tag.is_empty() {
            diagnostic = diagnostic.with_notes(vec![format!("in tag {}", self.tag)]);
        }
        diagnostic
    }
}

/// Where the tag currently being resolved sits in the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub tag: String,
    pub span: Range<usize>,
    pub line: usize,
}
