use std::ops::Range;

use crate::syntax::Syntax;
use crate::syntax::tokens::split_top_level_positions;

/// One lexical item of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<'a> {
    Text(&'a str),
    Tag(TagEvent<'a>),
}

/// A delimited tag split into `(name, content, modifiers)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEvent<'a> {
    /// Tag name, `/name` for closing tags, empty for sigil shorthands.
    pub name: &'a str,
    pub content: &'a str,
    /// Filter chain without the leading `|`.
    pub modifiers: &'a str,
    /// Source text of the tag including delimiters.
    pub raw: &'a str,
    pub span: Range<usize>,
    /// 1-based line of the opening delimiter.
    pub line: usize,
    /// Written as `@{...}`: output gating is suspended around the tag.
    pub gated: bool,
}

/// Splits template source into text and tag events.
///
/// The delimiter mode is passed to every [`Scanner::next_event`] call so a
/// `{syntax}` tag takes effect for the very next tag.
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    line_pos: usize,
    /// Next `{*` found by the last search; `Some(None)` once none remain.
    next_comment: Option<Option<usize>>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Scanner {
            source,
            pos: 0,
            line: 1,
            line_pos: 0,
            next_comment: None,
        }
    }

    pub fn next_event(&mut self, syntax: Syntax) -> Option<Event<'a>> {
        loop {
            if self.pos >= self.source.len() {
                return None;
            }
            let comment = self.next_comment();
            let tag = find_open(syntax, self.source, self.pos);

            match (comment, tag) {
                (Some(start), tag) if tag.is_none_or(|(t, _)| start <= t) => {
                    if start > self.pos {
                        return Some(self.text_until(start));
                    }
                    if !self.skip_comment(start) {
                        return Some(self.text_until(self.source.len()));
                    }
                }
                (_, Some((start, body_start))) => {
                    return Some(self.tag_or_text(syntax, start, body_start));
                }
                _ => return Some(self.text_until(self.source.len())),
            }
        }
    }

    /// Start of the next comment at or after the cursor. The source is only
    /// searched again once the cursor has moved past the last hit.
    fn next_comment(&mut self) -> Option<usize> {
        match self.next_comment {
            Some(None) => None,
            Some(Some(start)) if start >= self.pos => Some(start),
            _ => {
                let found = self.source[self.pos..].find("{*").map(|i| self.pos + i);
                self.next_comment = Some(found);
                found
            }
        }
    }

    /// Skip `{* ... *}` and the line breaks right after it.
    fn skip_comment(&mut self, start: usize) -> bool {
        let Some(len) = self.source[start + 2..].find("*}") else {
            return false;
        };
        let mut end = start + 2 + len + 2;
        while matches!(self.source.as_bytes().get(end), Some(b'\r' | b'\n')) {
            end += 1;
        }
        self.pos = end;
        true
    }

    fn tag_or_text(&mut self, syntax: Syntax, start: usize, body_start: usize) -> Event<'a> {
        let gated = start > self.pos && self.source.as_bytes()[start - 1] == b'@';
        let tag_start = if gated { start - 1 } else { start };
        if tag_start > self.pos {
            return self.text_until(tag_start);
        }

        let Some((body_end, end)) = find_close(syntax, self.source, body_start) else {
            return self.text_until(self.source.len());
        };

        let line = self.line_at(tag_start);
        let body = &self.source[body_start..body_end];
        let (name, content, modifiers) = split_tag(body);
        self.pos = end;
        Event::Tag(TagEvent {
            name,
            content,
            modifiers,
            raw: &self.source[start..end],
            span: tag_start..end,
            line,
            gated,
        })
    }

    fn text_until(&mut self, end: usize) -> Event<'a> {
        let text = &self.source[self.pos..end];
        self.pos = end;
        Event::Text(text)
    }

    fn line_at(&mut self, offset: usize) -> usize {
        if offset >= self.line_pos {
            self.line += self.source[self.line_pos..offset].matches('\n').count();
        } else {
            self.line = self.source[..offset].matches('\n').count() + 1;
        }
        self.line_pos = offset;
        self.line
    }
}

/// Split a tag body into name, content and modifiers.
///
/// The name is an optional `/` followed by ASCII letters; anything else
/// (`$var`, `=expr`, `_text`, `!$var`) leaves the name empty.
pub fn split_tag(body: &str) -> (&str, &str, &str) {
    let body = body.trim();
    let letters_from = usize::from(body.starts_with('/'));
    let name_len = body[letters_from..]
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .count();
    let name_end = if name_len == 0 { 0 } else { letters_from + name_len };
    let (name, rest) = body.split_at(name_end);

    let split = split_top_level_positions(rest, &['|'])
        .into_iter()
        .find(|&i| rest[i + 1..].starts_with(|c: char| c.is_ascii_alphabetic()));
    match split {
        Some(i) => (name, rest[..i].trim(), rest[i + 1..].trim()),
        None => (name, rest.trim(), ""),
    }
}

fn find_open(syntax: Syntax, source: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = source.as_bytes();
    let opens_tag = |i: usize| {
        bytes
            .get(i)
            .is_some_and(|b| !b.is_ascii_whitespace() && !matches!(b, b'\'' | b'"' | b'{' | b'}'))
    };
    let skip_ws = |mut i: usize| {
        while bytes.get(i).is_some_and(|b| b.is_ascii_whitespace()) {
            i += 1;
        }
        i
    };

    let mut i = from;
    while i < bytes.len() {
        match syntax {
            Syntax::Off if bytes[i..].starts_with(b"{/syntax}") => return Some((i, i + 1)),
            Syntax::Latte if bytes[i] == b'{' && opens_tag(i + 1) => return Some((i, i + 1)),
            Syntax::Double if bytes[i..].starts_with(b"{{") && opens_tag(i + 2) => {
                return Some((i, i + 2));
            }
            Syntax::Asp if bytes[i..].starts_with(b"<%") => return Some((i, skip_ws(i + 2))),
            Syntax::Python if bytes[i..].starts_with(b"{{") || bytes[i..].starts_with(b"{%") => {
                return Some((i, skip_ws(i + 2)));
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn find_close(syntax: Syntax, source: &str, from: usize) -> Option<(usize, usize)> {
    let mut i = from;
    while let Some(c) = source[i..].chars().next() {
        if c == '\'' || c == '"' {
            i = skip_quoted(source, i);
            continue;
        }
        let rest = &source[i..];
        let close = match syntax {
            Syntax::Latte | Syntax::Off if c == '}' => Some(1),
            Syntax::Double if rest.starts_with("}}") => Some(2),
            Syntax::Asp if rest.starts_with("%>") => Some(2),
            Syntax::Python if rest.starts_with("%}") || rest.starts_with("}}") => Some(2),
            _ => None,
        };
        if let Some(len) = close {
            let body_end = from + source[from..i].trim_end().len();
            return Some((body_end, i + len));
        }
        i += c.len_utf8();
    }
    None
}

fn skip_quoted(source: &str, start: usize) -> usize {
    let quote = source.as_bytes()[start];
    let mut escaped = false;
    for (offset, b) in source.as_bytes()[start + 1..].iter().enumerate() {
        if escaped {
            escaped = false;
        } else if *b == b'\\' {
            escaped = true;
        } else if *b == quote {
            return start + 1 + offset + 1;
        }
    }
    source.len()
}
