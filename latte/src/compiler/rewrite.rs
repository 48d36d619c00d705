//! Lift named blocks out of the document body into function units.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use indexmap::{IndexMap, IndexSet};
use tracing::trace;

use crate::segment::Segment;

/// A named block compiled to a standalone host function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionUnit {
    /// Host function name, unique per (salt, block name).
    pub ident: String,
    pub name: String,
    /// Body with nested named blocks already replaced by their call sites.
    pub body: Vec<Segment>,
}

impl FunctionUnit {
    /// Registration guard, function header, body, closing braces.
    pub fn segments(&self) -> Vec<Segment> {
        let name = crate::syntax::tokens::export_string(&self.name);
        let mut segments = Vec::with_capacity(self.body.len() + 2);
        segments.push(Segment::Code(format!(
            "\n//\n// block {}\n//\nif (!function_exists($_l->blocks[{name}][] = '{ident}')) {{ function {ident}($_l, $_args, $_b = 0) {{ extract($_args)\n",
            self.name,
            ident = self.ident,
        )));
        segments.extend(self.body.iter().cloned());
        segments.push(Segment::Code("}}".to_string()));
        segments
    }
}

/// Host function name for block `name`.
pub fn function_ident(salt: &str, name: &str) -> String {
    let mut hasher = DefaultHasher::new();
    salt.hash(&mut hasher);
    name.hash(&mut hasher);
    let hash = format!("{:016x}", hasher.finish());
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("_lb{}_{sanitized}", &hash[..10])
}

/// Remove every declared block from `segments` and return the function
/// units, keyed by block name in declaration order.
///
/// Blocks are extracted innermost-last-declared first, so when an outer
/// block is lifted its nested blocks have already been replaced by the
/// call emitted when they were opened.
pub fn extract_blocks(
    segments: &mut Vec<Segment>,
    declared: &IndexSet<String>,
    salt: &str,
) -> IndexMap<String, FunctionUnit> {
    let mut extracted = HashMap::with_capacity(declared.len());
    for name in declared.iter().rev() {
        let Some(open) = segments
            .iter()
            .position(|s| matches!(s, Segment::BlockOpen(n) if n == name))
        else {
            continue;
        };
        let Some(close) = segments[open..]
            .iter()
            .position(|s| matches!(s, Segment::BlockClose(n) if n == name))
            .map(|offset| open + offset)
        else {
            continue;
        };
        let mut body: Vec<Segment> = segments.drain(open..=close).collect();
        body.pop();
        body.remove(0);
        let ident = function_ident(salt, name);
        trace!(block = %name, %ident, segments = body.len(), "extracted block");
        extracted.insert(
            name.clone(),
            FunctionUnit {
                ident,
                name: name.clone(),
                body,
            },
        );
    }
    declared
        .iter()
        .filter_map(|name| extracted.remove(name).map(|unit| (name.clone(), unit)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Segment {
        Segment::Text(s.to_string())
    }

    #[test]
    fn nested_blocks_are_lifted_separately() {
        let mut segments = vec![
            text("a"),
            Segment::BlockOpen("outer".into()),
            text("b"),
            Segment::BlockOpen("inner".into()),
            text("c"),
            Segment::BlockClose("inner".into()),
            text("d"),
            Segment::BlockClose("outer".into()),
            text("e"),
        ];
        let declared: IndexSet<String> = ["outer".to_string(), "inner".to_string()].into();
        let units = extract_blocks(&mut segments, &declared, "salt");

        assert_eq!(segments, vec![text("a"), text("e")]);
        assert_eq!(units.keys().collect::<Vec<_>>(), ["outer", "inner"]);
        assert_eq!(units["inner"].body, vec![text("c")]);
        assert_eq!(units["outer"].body, vec![text("b"), text("d")]);
    }

    #[test]
    fn ident_is_stable_and_sanitized() {
        let a = function_ident("abc", "content");
        assert_eq!(a, function_ident("abc", "content"));
        assert_ne!(a, function_ident("xyz", "content"));
        assert!(a.starts_with("_lb") && a.ends_with("_content"));
        assert_eq!(a.len(), "_lb".len() + 10 + "_content".len());
    }
}
