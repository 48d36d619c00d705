//! Tag and attribute dispatch: map a tag to its macro, resolve the pattern.

use indexmap::IndexMap;
use tracing::trace;

use crate::compiler::CompileUnit;
use crate::compiler::blocks;
use crate::compiler::context::CompileContext;
use crate::compiler::error::{CompileError, ErrorKind};
use crate::compiler::handlers;
use crate::macros::{Builtin, Handler, MacroPattern, MacroTable, PatternPart};
use crate::segment::{Fragment, Segment};
use crate::syntax::tokens::export_string;

/// HTML elements that stand in for a macro, and the attribute that carries
/// its argument.
const ELEMENT_ARGUMENTS: &[(&str, &str)] = &[
    ("include", "block"),
    ("for", "each"),
    ("block", "name"),
    ("if", "cond"),
    ("elseif", "cond"),
];

/// Pair macros whose nesting is checked by the block stack.
const FRAMED: &[&str] = &["block", "capture", "snippet"];

/// Macros closed by another macro's closing tag.
const CLOSED_AS: &[(&str, &str)] = &[("ifCurrent", "if")];

impl<'t> CompileUnit<'t> {
    /// Resolve one `{...}` tag. `Ok(None)` means the tag is not a macro and
    /// should be left in the output as written.
    ///
    /// An empty name selects a sigil macro by the first characters of the
    /// content, two-character sigils first.
    pub fn resolve_tag(
        &mut self,
        name: &str,
        content: &str,
        modifiers: &str,
    ) -> Result<Option<Fragment>, CompileError> {
        let table: &'t MacroTable = self.table;
        let (name, content) = if name.is_empty() {
            let two = content.get(..2).filter(|sigil| table.contains(sigil));
            let one = content
                .chars()
                .next()
                .map(|c| &content[..c.len_utf8()])
                .filter(|sigil| table.contains(sigil));
            match two.or(one) {
                Some(sigil) => (sigil, &content[sigil.len()..]),
                None => return Ok(None),
            }
        } else if table.contains(name) {
            (name, content)
        } else {
            return Ok(None);
        };
        self.expand_paired(name, content, modifiers).map(Some)
    }

    /// Compose the `n:` attributes of one element around its tag text.
    ///
    /// Attributes compose in macro table order, not the element's attribute
    /// order. For each pair macro `x`: `x` wraps the whole element, `inner-x`
    /// wraps its content and `tag-x` wraps only the tag itself. The closing
    /// tag is resolved with `closing = true` and the same attributes. Returns
    /// `Ok(None)` without running any handler when an attribute is not a
    /// known pair macro.
    pub fn resolve_attributes(
        &mut self,
        code: &str,
        attrs: &IndexMap<String, String>,
        closing: bool,
    ) -> Result<Option<Fragment>, CompileError> {
        if self.unknown_attribute(attrs).is_some() {
            return Ok(None);
        }
        let table: &'t MacroTable = self.table;
        // Each macro keeps its own code segments; `endif` and `endforeach`
        // must not fuse into one statement.
        let mut left: Vec<Segment> = Vec::new();
        let mut right: Vec<Segment> = Vec::new();
        // `tag-` pairs stay directly around the markup, inside everything else.
        let mut tag_left: Vec<Segment> = Vec::new();
        let mut tag_right: Vec<Segment> = Vec::new();
        for name in table.names().filter(|name| table.is_pair(name)) {
            let close = format!("/{name}");
            if let Some(value) = attrs.get(name) {
                if closing {
                    right.extend(self.expand(&close, "", "")?.segments);
                } else {
                    left.splice(0..0, self.expand(name, value, "")?.segments);
                }
            }
            if let Some(value) = attrs.get(&format!("inner-{name}")) {
                if closing {
                    left.extend(self.expand(&close, "", "")?.segments);
                } else {
                    right.splice(0..0, self.expand(name, value, "")?.segments);
                }
            }
            if let Some(value) = attrs.get(&format!("tag-{name}")) {
                tag_left.splice(0..0, self.expand(name, value, "")?.segments);
                tag_right.extend(self.expand(&close, "", "")?.segments);
            }
        }
        let mut segments = left;
        segments.extend(tag_left);
        if !code.is_empty() {
            segments.push(Segment::Text(code.to_string()));
        }
        segments.extend(tag_right);
        segments.extend(right);
        Ok(Some(Fragment { segments }))
    }

    /// Like [`resolve_attributes`](Self::resolve_attributes), but an unknown
    /// attribute is an error.
    pub fn expand_attributes(
        &mut self,
        code: &str,
        attrs: &IndexMap<String, String>,
        closing: bool,
    ) -> Result<Fragment, CompileError> {
        if let Some(unknown) = self.unknown_attribute(attrs) {
            return Err(self.error(ErrorKind::UnknownAttribute(unknown.to_string())));
        }
        match self.resolve_attributes(code, attrs, closing)? {
            Some(fragment) => Ok(fragment),
            None => Ok(Fragment::text(code)),
        }
    }

    /// Resolve a `<n:name attr=...>` element. The argument comes from the
    /// element's designated attribute, or from all attributes as an array.
    pub fn resolve_element(
        &mut self,
        name: &str,
        attrs: &IndexMap<String, String>,
        closing: bool,
    ) -> Result<Option<Fragment>, CompileError> {
        let content = match ELEMENT_ARGUMENTS.iter().find(|(element, _)| *element == name) {
            Some((_, attr)) => attrs.get(*attr).cloned().unwrap_or_default(),
            None => {
                let items: Vec<String> = attrs
                    .iter()
                    .filter(|(key, _)| key.as_str() != "modifiers")
                    .map(|(key, value)| format!("{} => {}", export_string(key), export_string(value)))
                    .collect();
                format!("array({})", items.join(", "))
            }
        };
        let modifiers = attrs.get("modifiers").map(String::as_str).unwrap_or_default();
        let name = if closing {
            format!("/{name}")
        } else {
            name.to_string()
        };
        if !self.table.contains(&name) {
            return Ok(None);
        }
        self.expand_paired(&name, &content, modifiers).map(Some)
    }

    fn unknown_attribute<'a>(&self, attrs: &'a IndexMap<String, String>) -> Option<&'a str> {
        attrs.keys().map(String::as_str).find(|attr| {
            let base = attr
                .strip_prefix("inner-")
                .or_else(|| attr.strip_prefix("tag-"))
                .unwrap_or(attr);
            !self.table.is_pair(base)
        })
    }

    /// [`expand`](Self::expand) a standalone tag, keeping pair macros
    /// balanced: a closing tag must match the innermost open pair macro.
    /// Attribute macros skip this; the element's own tags pair them.
    fn expand_paired(
        &mut self,
        name: &str,
        content: &str,
        modifiers: &str,
    ) -> Result<Fragment, CompileError> {
        let closes = name.strip_prefix('/').filter(|base| !FRAMED.contains(base));
        if let Some(base) = closes {
            if self.ctx.open_macros.last().map(String::as_str) != Some(base) {
                return Err(self.error(ErrorKind::UnexpectedClose(name.to_string())));
            }
        }
        let fragment = self.expand(name, content, modifiers)?;
        if closes.is_some() {
            self.ctx.open_macros.pop();
        } else if let Some((_, closer)) = CLOSED_AS.iter().find(|(opener, _)| *opener == name) {
            self.ctx.open_macros.push(closer.to_string());
        } else if self.table.is_pair(name) && !FRAMED.contains(&name) {
            self.ctx.open_macros.push(name.to_string());
        }
        Ok(fragment)
    }

    /// Invoke the macro `name`, which must exist in the table.
    pub(crate) fn expand(
        &mut self,
        name: &str,
        content: &str,
        modifiers: &str,
    ) -> Result<Fragment, CompileError> {
        let table: &'t MacroTable = self.table;
        let Some(pattern) = table.get(name) else {
            return Ok(Fragment::empty());
        };
        trace!(macro_name = name, content, modifiers, "expanding macro");
        resolve(pattern, content, modifiers, &mut self.ctx).map_err(|kind| self.error(kind))
    }
}

/// Substitute every placeholder of `pattern`.
pub(crate) fn resolve(
    pattern: &MacroPattern,
    content: &str,
    modifiers: &str,
    ctx: &mut CompileContext,
) -> Result<Fragment, ErrorKind> {
    let mut out = Fragment::empty();
    for part in &pattern.parts {
        match part {
            PatternPart::Literal(code) => out.push_code(code),
            PatternPart::Raw => out.push_code(content),
            PatternPart::Handler(handler) => {
                let fragment =
                    invoke(handler, content, modifiers, ctx).map_err(|kind| match kind {
                        ErrorKind::MissingArgument { what, .. } => ErrorKind::MissingArgument {
                            tag: pattern.name.clone(),
                            what,
                        },
                        other => other,
                    })?;
                out.append(fragment);
            }
        }
    }
    Ok(out)
}

fn invoke(
    handler: &Handler,
    content: &str,
    modifiers: &str,
    ctx: &mut CompileContext,
) -> Result<Fragment, ErrorKind> {
    let builtin = match handler {
        Handler::Custom { handler, .. } => return handler(content, modifiers, ctx),
        Handler::Builtin(builtin) => *builtin,
    };
    let code = match builtin {
        Builtin::Block => return blocks::open_block(content, modifiers, ctx),
        Builtin::BlockEnd => return blocks::close_block(content, ctx),
        Builtin::Snippet => return blocks::open_snippet(content, ctx),
        Builtin::SnippetEnd => return blocks::close_snippet(ctx),
        Builtin::Var => handlers::var(content, modifiers),
        Builtin::Translate => handlers::translate(content, modifiers),
        Builtin::Escape => ctx.escape.clone(),
        Builtin::Modifiers => crate::syntax::tokens::format_modifiers(content, modifiers),
        Builtin::Syntax => handlers::syntax(content, ctx)?,
        Builtin::Include => blocks::include(content, modifiers, ctx, false)?,
        Builtin::Extends => blocks::extends(content, ctx)?,
        Builtin::Capture => blocks::open_capture(content, modifiers, ctx)?,
        Builtin::CaptureEnd => blocks::close_capture(content, ctx)?,
        Builtin::Foreach => handlers::foreach(content),
        Builtin::Attr => handlers::attr(content),
        Builtin::ContentType => handlers::content_type(content, ctx),
        Builtin::Dump => handlers::dump(content),
        Builtin::Widget => handlers::widget(content)?,
        Builtin::Link => handlers::link(content, modifiers),
        Builtin::Plink => handlers::plink(content, modifiers),
        Builtin::IfCurrent => handlers::if_current(content),
        Builtin::Assign => handlers::assign(content, modifiers)?,
        Builtin::Default => handlers::default(content)?,
    };
    Ok(Fragment::code(code))
}
