//! Escapers selected by `{contentType}`.

/// Escapes `&` `<` `>` `"` `'`.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Like [`escape_html`]; control characters invalid in XML 1.0 are dropped.
pub fn escape_xml(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .filter(|&c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();
    escape_html(&cleaned)
}

/// A double-quoted JavaScript string literal, safe inside `<script>`.
pub fn escape_js(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '/' => out.push_str("\\/"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Backslash-escapes CSS syntax characters.
pub fn escape_css(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_punctuation() && !matches!(c, '-' | '_' | '.' | '#' | '%') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#039;");
    }

    #[test]
    fn xml_drops_control_characters() {
        assert_eq!(escape_xml("a\u{1}b\n<"), "ab\n&lt;");
    }

    #[test]
    fn js_is_a_string_literal() {
        assert_eq!(escape_js("say \"hi\"</script>"), r#""say \"hi\"<\/script>""#);
    }

    #[test]
    fn css() {
        assert_eq!(escape_css("a{b}"), r"a\{b\}");
        assert_eq!(escape_css("my-class_1.5%"), "my-class_1.5%");
    }
}
