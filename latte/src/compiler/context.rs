use std::hash::{DefaultHasher, Hash, Hasher};

use indexmap::IndexSet;

use crate::config::CompilerConfig;
use crate::syntax::Syntax;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Anonymous,
    Named,
    Capture,
}

/// An open `{block}` or `{capture}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFrame {
    pub kind: BlockKind,
    /// Block name for named blocks, target variable for captures.
    pub name: Option<String>,
    pub modifiers: String,
}

impl BlockFrame {
    pub fn anonymous(modifiers: &str) -> Self {
        BlockFrame {
            kind: BlockKind::Anonymous,
            name: None,
            modifiers: modifiers.to_string(),
        }
    }

    pub fn named(name: &str) -> Self {
        BlockFrame {
            kind: BlockKind::Named,
            name: Some(name.to_string()),
            modifiers: String::new(),
        }
    }

    pub fn capture(variable: &str, modifiers: &str) -> Self {
        BlockFrame {
            kind: BlockKind::Capture,
            name: Some(variable.to_string()),
            modifiers: modifiers.to_string(),
        }
    }
}

/// How the host lexer should treat markup around tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputContext {
    /// HTML text, markup-aware.
    Text,
    None,
}

/// Mutable state of one template compile, handed to every handler.
#[derive(Debug, Clone)]
pub struct CompileContext {
    pub open_blocks: Vec<BlockFrame>,
    /// Open pair macros other than the framed ones, innermost last.
    pub open_macros: Vec<String>,
    /// Every named block declared so far, in declaration order.
    pub named_blocks: IndexSet<String>,
    /// `None` until `{extends}` is seen; `Some(false)` for `{extends none}`.
    pub extends: Option<bool>,
    /// Escape function applied by `%escape%`.
    pub escape: String,
    pub output_context: OutputContext,
    /// Keeps generated function names unique across templates.
    pub salt: String,
    pub syntax: Syntax,
}

impl CompileContext {
    /// `template` identifies the template being compiled; a configured salt
    /// is combined with it so that templates sharing one configuration still
    /// get distinct function names.
    pub fn initialize(config: &CompilerConfig, template: &str) -> Self {
        let salt = match &config.salt {
            Some(seed) => instance_salt(seed, template),
            None => fresh_salt(),
        };
        let mut ctx = CompileContext {
            open_blocks: Vec::new(),
            open_macros: Vec::new(),
            named_blocks: IndexSet::new(),
            extends: None,
            escape: String::new(),
            output_context: OutputContext::Text,
            salt,
            syntax: Syntax::default(),
        };
        ctx.set_content_type(&config.content_type);
        ctx
    }

    /// Select the escape function for everything compiled after this point.
    pub fn set_content_type(&mut self, content_type: &str) {
        let (escape, context) = if content_type.contains("html") {
            (r"Latte\Runtime::escapeHtml", OutputContext::Text)
        } else if content_type.contains("xml") {
            (r"Latte\Runtime::escapeXml", OutputContext::None)
        } else if content_type.contains("javascript") {
            (r"Latte\Runtime::escapeJs", OutputContext::None)
        } else if content_type.contains("css") {
            (r"Latte\Runtime::escapeCss", OutputContext::None)
        } else if content_type.contains("plain") {
            ("", OutputContext::None)
        } else {
            ("$template->escape", OutputContext::None)
        };
        self.escape = escape.to_string();
        self.output_context = context;
    }

    /// Name of the innermost open named block.
    pub fn innermost_named(&self) -> Option<&str> {
        self.open_blocks
            .iter()
            .rev()
            .find(|frame| frame.kind == BlockKind::Named)
            .and_then(|frame| frame.name.as_deref())
    }
}

/// Deterministic instance salt for `template` under the configured `seed`.
pub fn instance_salt(seed: &str, template: &str) -> String {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    template.hash(&mut hasher);
    let mut salt = format!("{:016x}", hasher.finish());
    salt.truncate(10);
    salt
}

fn fresh_salt() -> String {
    let mut salt = uuid::Uuid::new_v4().simple().to_string();
    salt.truncate(10);
    salt
}
