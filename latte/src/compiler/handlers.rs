//! Placeholder handlers that only produce code.

use crate::compiler::context::CompileContext;
use crate::compiler::error::ErrorKind;
use crate::syntax::Syntax;
use crate::syntax::tokens::{
    export_string, fetch_token, format_args, format_array, format_modifiers, format_string,
    is_identifier,
};

pub(crate) fn var(content: &str, modifiers: &str) -> String {
    format_modifiers(&format!("${content}"), modifiers)
}

pub(crate) fn translate(content: &str, modifiers: &str) -> String {
    format_modifiers(content, &format!("translate|{modifiers}"))
}

pub(crate) fn syntax(content: &str, ctx: &mut CompileContext) -> Result<String, ErrorKind> {
    let syntax =
        Syntax::from_name(content).ok_or_else(|| ErrorKind::UnknownSyntax(content.to_string()))?;
    ctx.syntax = syntax;
    Ok(String::new())
}

/// Wrap the iterated expression so `$iterator` is available in the loop.
pub(crate) fn foreach(content: &str) -> String {
    let mut out = String::from(r"$iterator = $_l->its[] = new Latte\CachingIterator(");
    match find_as(content) {
        Some((start, end)) => {
            out.push_str(&content[..start]);
            out.push_str(") as ");
            out.push_str(&content[end..]);
        }
        None => out.push_str(content),
    }
    out
}

/// Byte range of the first ` as ` keyword, surrounding spaces included.
fn find_as(content: &str) -> Option<(usize, usize)> {
    let lower = content.to_ascii_lowercase();
    let at = lower.find(" as ")?;
    let bytes = content.as_bytes();
    let mut start = at;
    while start > 0 && bytes[start - 1] == b' ' {
        start -= 1;
    }
    let mut end = at + 4;
    while end < bytes.len() && bytes[end] == b' ' {
        end += 1;
    }
    Some((start, end))
}

/// `class($a) title($b)` becomes a method chain.
pub(crate) fn attr(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 8);
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == ')' && chars.peek().is_some_and(|c| c.is_whitespace()) {
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            out.push_str("->");
        }
    }
    if out.ends_with(')') {
        out.push_str("->");
    }
    out
}

pub(crate) fn content_type(content: &str, ctx: &mut CompileContext) -> String {
    ctx.set_content_type(content);
    if content.contains('/') {
        format!(
            r#"Latte\Runtime::httpResponse()->setHeader("Content-Type", {})"#,
            format_string(content)
        )
    } else {
        String::new()
    }
}

pub(crate) fn dump(content: &str) -> String {
    let content = content.trim();
    if content.is_empty() {
        "get_defined_vars()".to_string()
    } else {
        format!("array({} => {content})", export_string(content))
    }
}

/// `{widget name:method args}`
pub(crate) fn widget(content: &str) -> Result<String, ErrorKind> {
    let mut rest = content;
    let Some(pair) = fetch_token(&mut rest) else {
        return Err(ErrorKind::MissingArgument {
            tag: "widget".to_string(),
            what: "widget name",
        });
    };
    let (name, method) = pair.split_once(':').unwrap_or((pair, ""));
    let name = format_string(name);
    let method = ucfirst(method);
    let method = if method.is_empty() || is_identifier(&method) {
        format!("render{method}")
    } else {
        format!("{{\"render{method}\"}}")
    };
    let params = if rest.contains("=>") {
        format_array(rest, "")
    } else {
        format_args(rest)
    };
    let call = format!("$control->getWidget({name})->{method}({params})");
    Ok(if name.starts_with('$') {
        format!("if (is_object({name})) {name}->{method}({params}); else {call}")
    } else {
        call
    })
}

fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn link(content: &str, modifiers: &str) -> String {
    format_modifiers(&format!("$control->link({})", link_args(content)), modifiers)
}

pub(crate) fn plink(content: &str, modifiers: &str) -> String {
    format_modifiers(&format!("$presenter->link({})", link_args(content)), modifiers)
}

/// Generate the link only for its side effect of marking the current request.
pub(crate) fn if_current(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    format!(
        r"try {{ $presenter->link({}); }} catch (Latte\InvalidLinkException $e) {{}}",
        link_args(content)
    )
}

fn link_args(content: &str) -> String {
    let mut rest = content;
    let destination = fetch_token(&mut rest).unwrap_or_default();
    format!("{}{}", format_string(destination), format_array(rest, ", "))
}

/// `{var $name = value}` or `{var name => value, ...}`
pub(crate) fn assign(content: &str, modifiers: &str) -> Result<String, ErrorKind> {
    if content.trim().is_empty() {
        return Err(ErrorKind::MissingArgument {
            tag: "var".to_string(),
            what: "arguments",
        });
    }
    if content.contains("=>") {
        return Ok(format!("extract({})", format_array(content, "")));
    }
    let mut rest = content;
    let name = fetch_token(&mut rest).unwrap_or_default();
    let rest = rest.strip_prefix('=').map(str::trim_start).unwrap_or(rest);
    let value = if rest.is_empty() { "NULL" } else { rest };
    Ok(format!(
        "${} = {}",
        name.trim_start_matches('$'),
        format_modifiers(value, modifiers)
    ))
}

pub(crate) fn default(content: &str) -> Result<String, ErrorKind> {
    if content.trim().is_empty() {
        return Err(ErrorKind::MissingArgument {
            tag: "default".to_string(),
            what: "arguments",
        });
    }
    Ok(format!("extract({}, EXTR_SKIP)", format_array(content, "")))
}
