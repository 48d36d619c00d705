//! Small helpers for splitting and reformatting macro arguments.
//!
//! These never parse host expressions; they only find token boundaries
//! while respecting quoted strings and bracket nesting.

/// Take the leading token of `input` (`token [,] rest`) and advance `input`
/// past it and an optional separating comma.
pub fn fetch_token<'a>(input: &mut &'a str) -> Option<&'a str> {
    let s = input.trim_start();
    let mut i = 0;
    while let Some(c) = s[i..].chars().next() {
        if c == '\'' || c == '"' {
            i = quoted_end(s, i);
        } else if c.is_whitespace() || c == ',' {
            break;
        } else {
            i += c.len_utf8();
        }
    }
    if i == 0 {
        return None;
    }
    let token = &s[..i];
    let rest = s[i..].trim_start();
    *input = rest.strip_prefix(',').unwrap_or(rest).trim_start();
    Some(token)
}

/// Format `key => value, ...` or a positional list as a host array literal,
/// prefixed with `prefix`. Empty input yields an empty string.
pub fn format_array(input: &str, prefix: &str) -> String {
    let args = format_args(input);
    if args.is_empty() {
        String::new()
    } else {
        format!("{prefix}array({args})")
    }
}

/// Like [`format_array`] without the `array(...)` wrapper.
pub fn format_args(input: &str) -> String {
    let input = input.trim();
    if input.is_empty() {
        return String::new();
    }
    split_top_level(input, &[','])
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match find_arrow(item) {
            Some(pos) => format!(
                "{} => {}",
                quote_bare_word(item[..pos].trim()),
                quote_bare_word(item[pos + 2..].trim())
            ),
            None => quote_bare_word(item),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Apply a `|filter:arg,arg|filter` chain to `var`.
pub fn format_modifiers(var: &str, modifiers: &str) -> String {
    let mut out = var.to_string();
    for filter in split_top_level(modifiers, &['|']) {
        let filter = filter.trim();
        if filter.is_empty() {
            continue;
        }
        let mut parts = split_top_level(filter, &[':', ','])
            .into_iter()
            .map(str::trim)
            .filter(|part| !part.is_empty());
        let Some(name) = parts.next() else {
            continue;
        };
        let mut call = format!("$template->{name}({out}");
        for arg in parts {
            call.push_str(", ");
            call.push_str(arg);
        }
        call.push(')');
        out = call;
    }
    out
}

/// Quote a bare destination string; literals and variables pass through.
pub fn format_string(s: &str) -> String {
    let s = s.trim();
    if s.starts_with('\'') || s.starts_with('"') || s.starts_with('$') || is_number(s) {
        s.to_string()
    } else {
        format!(
            "\"{}\"",
            s.replace('\\', "\\\\").replace('"', "\\\"").replace('$', "\\$")
        )
    }
}

/// Single-quoted host string literal.
pub fn export_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// `[_a-zA-Z\x7F-]` followed by `[_a-zA-Z0-9\x7F-]*`.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() || !c.is_ascii() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric() || !c.is_ascii())
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.parse::<f64>().is_ok()
}

fn quote_bare_word(s: &str) -> String {
    let bare = !s.is_empty() && s.chars().all(|c| c == '_' || c.is_ascii_alphanumeric());
    if bare && !is_number(s) && !matches!(s.to_ascii_lowercase().as_str(), "true" | "false" | "null") {
        export_string(s)
    } else {
        s.to_string()
    }
}

/// Byte index just past the string literal starting at `start`.
fn quoted_end(s: &str, start: usize) -> usize {
    let Some(quote) = s[start..].chars().next() else {
        return s.len();
    };
    let mut escaped = false;
    for (offset, c) in s[start + 1..].char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return start + 1 + offset + 1;
        }
    }
    s.len()
}

/// Characters outside quotes and brackets, with their byte offsets.
fn top_level(s: &str) -> Vec<(usize, char)> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;
    while let Some(c) = s[i..].chars().next() {
        match c {
            '\'' | '"' => {
                i = quoted_end(s, i);
                continue;
            }
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push((i, c)),
            _ => {}
        }
        i += c.len_utf8();
    }
    out
}

pub(crate) fn split_top_level<'a>(s: &'a str, separators: &[char]) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for i in split_top_level_positions(s, separators) {
        parts.push(&s[start..i]);
        start = i + 1;
    }
    parts.push(&s[start..]);
    parts
}

/// Byte offsets of top-level occurrences of ASCII `separators`.
pub(crate) fn split_top_level_positions(s: &str, separators: &[char]) -> Vec<usize> {
    top_level(s)
        .into_iter()
        .filter(|(_, c)| separators.contains(c))
        .map(|(i, _)| i)
        .collect()
}

fn find_arrow(s: &str) -> Option<usize> {
    top_level(s)
        .into_iter()
        .find(|&(i, c)| c == '=' && s[i + 1..].starts_with('>'))
        .map(|(i, _)| i)
}
