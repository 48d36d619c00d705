//! The macro table: tag name → code pattern with placeholders.
//!
//! A pattern is host code containing `%handler%` placeholders, resolved by
//! calling the named handler with the tag's content and modifiers, and `%%`
//! placeholders, replaced by the raw content. Patterns are parsed when they
//! are registered, so an unknown handler is reported before any template is
//! compiled.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::compiler::context::CompileContext;
use crate::compiler::error::ErrorKind;
use crate::config::CompilerConfig;
use crate::segment::Fragment;

/// Signature of a user-supplied placeholder handler.
pub type CustomHandler =
    Arc<dyn Fn(&str, &str, &mut CompileContext) -> Result<Fragment, ErrorKind> + Send + Sync>;

/// The closed set of handlers the default macros are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Var,
    Translate,
    Escape,
    Modifiers,
    Syntax,
    Include,
    Extends,
    Block,
    BlockEnd,
    Capture,
    CaptureEnd,
    Snippet,
    SnippetEnd,
    Foreach,
    Attr,
    ContentType,
    Dump,
    Widget,
    Link,
    Plink,
    IfCurrent,
    Assign,
    Default,
}

impl Builtin {
    pub const ALL: [Builtin; 23] = [
        Builtin::Var,
        Builtin::Translate,
        Builtin::Escape,
        Builtin::Modifiers,
        Builtin::Syntax,
        Builtin::Include,
        Builtin::Extends,
        Builtin::Block,
        Builtin::BlockEnd,
        Builtin::Capture,
        Builtin::CaptureEnd,
        Builtin::Snippet,
        Builtin::SnippetEnd,
        Builtin::Foreach,
        Builtin::Attr,
        Builtin::ContentType,
        Builtin::Dump,
        Builtin::Widget,
        Builtin::Link,
        Builtin::Plink,
        Builtin::IfCurrent,
        Builtin::Assign,
        Builtin::Default,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Var => "var",
            Builtin::Translate => "translate",
            Builtin::Escape => "escape",
            Builtin::Modifiers => "modifiers",
            Builtin::Syntax => "syntax",
            Builtin::Include => "include",
            Builtin::Extends => "extends",
            Builtin::Block => "block",
            Builtin::BlockEnd => "blockEnd",
            Builtin::Capture => "capture",
            Builtin::CaptureEnd => "captureEnd",
            Builtin::Snippet => "snippet",
            Builtin::SnippetEnd => "snippetEnd",
            Builtin::Foreach => "foreach",
            Builtin::Attr => "attr",
            Builtin::ContentType => "contentType",
            Builtin::Dump => "dump",
            Builtin::Widget => "widget",
            Builtin::Link => "link",
            Builtin::Plink => "plink",
            Builtin::IfCurrent => "ifCurrent",
            Builtin::Assign => "assign",
            Builtin::Default => "default",
        }
    }

    pub fn from_name(name: &str) -> Option<Builtin> {
        Builtin::ALL.into_iter().find(|b| b.name() == name)
    }
}

#[derive(Clone)]
pub enum Handler {
    Builtin(Builtin),
    Custom { name: String, handler: CustomHandler },
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Builtin(builtin) => write!(f, "Builtin({})", builtin.name()),
            Handler::Custom { name, .. } => write!(f, "Custom({name})"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum PatternPart {
    Literal(String),
    /// `%%`: the tag content, verbatim.
    Raw,
    Handler(Handler),
}

#[derive(Debug, Clone)]
pub struct MacroPattern {
    pub name: String,
    pub template: String,
    pub parts: Vec<PatternPart>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("macro '{macro_name}' refers to undefined handler '%{handler}%'")]
    UnknownHandler { macro_name: String, handler: String },
}

/// Tag name → pattern, in registration order.
///
/// The table is read-only while templates compile; register everything
/// first.
#[derive(Clone, Default)]
pub struct MacroTable {
    patterns: IndexMap<String, MacroPattern>,
    handlers: IndexMap<String, CustomHandler>,
}

const DEFAULT_MACROS: &[(&str, &str)] = &[
    ("syntax", "%syntax%"),
    ("/syntax", "%syntax%"),
    ("block", "%block%"),
    ("/block", "%blockEnd%"),
    ("capture", "%capture%"),
    ("/capture", "%captureEnd%"),
    ("snippet", "%snippet%"),
    ("/snippet", "%snippetEnd%"),
    (
        "cache",
        r"if ($_l->tmp = Latte\Runtime::createCache($_l->key = md5(__FILE__) . __LINE__, $template->getFile(), array(%%))) { $_l->caches[] = $_l->tmp",
    ),
    (
        "/cache",
        r"array_pop($_l->caches)->save(); } if (!empty($_l->caches)) end($_l->caches)->addItem($_l->key)",
    ),
    ("if", "if (%%):"),
    ("elseif", "elseif (%%):"),
    ("else", "else:"),
    ("/if", "endif"),
    ("ifset", "if (isset(%%)):"),
    ("/ifset", "endif"),
    ("elseifset", "elseif (isset(%%)):"),
    ("foreach", "foreach (%foreach%):"),
    ("/foreach", "endforeach; array_pop($_l->its); $iterator = end($_l->its)"),
    ("for", "for (%%):"),
    ("/for", "endfor"),
    ("while", "while (%%):"),
    ("/while", "endwhile"),
    ("continueIf", "if (%%) continue"),
    ("breakIf", "if (%%) break"),
    ("include", "%include%"),
    ("extends", "%extends%"),
    ("layout", "%extends%"),
    ("plink", "echo %escape%(%plink%)"),
    ("link", "echo %escape%(%link%)"),
    (
        "ifCurrent",
        "%ifCurrent%; if ($presenter->getLastCreatedRequestFlag('current')):",
    ),
    ("widget", "%widget%"),
    ("control", "%widget%"),
    ("attr", r"echo Latte\Html::el(NULL)->%attr%attributes()"),
    ("contentType", "%contentType%"),
    ("status", r"Latte\Runtime::httpResponse()->setCode(%%)"),
    ("var", "%assign%"),
    ("assign", "%assign%"),
    ("default", "%default%"),
    (
        "dump",
        r#"Latte\Debug::barDump(%dump%, "Template " . $template->getFile())"#,
    ),
    (
        "debugbreak",
        r#"if (function_exists("debugbreak")) debugbreak(); elseif (function_exists("xdebug_break")) xdebug_break()"#,
    ),
    ("!_", "echo %translate%"),
    ("_", "echo %escape%(%translate%)"),
    ("!=", "echo %modifiers%"),
    ("=", "echo %escape%(%modifiers%)"),
    ("!$", "echo %var%"),
    ("$", "echo %escape%(%var%)"),
    ("?", "%modifiers%"),
];

impl MacroTable {
    /// A table with the default macro set.
    pub fn new() -> Self {
        let mut table = MacroTable::empty();
        for (name, template) in DEFAULT_MACROS {
            // Default patterns only reference builtins.
            if let Err(err) = table.register(name, template) {
                unreachable!("{err}");
            }
        }
        table
    }

    pub fn empty() -> Self {
        MacroTable::default()
    }

    /// The default table extended with the macros listed in `config`.
    pub fn with_config(config: &CompilerConfig) -> Result<Self, TableError> {
        let mut table = MacroTable::new();
        for (name, template) in &config.macros {
            table.register(name, template)?;
        }
        Ok(table)
    }

    /// Add or replace a macro.
    pub fn register(&mut self, name: &str, template: &str) -> Result<(), TableError> {
        let parts = self.parse_pattern(name, template)?;
        self.patterns.insert(
            name.to_string(),
            MacroPattern {
                name: name.to_string(),
                template: template.to_string(),
                parts,
            },
        );
        Ok(())
    }

    /// Make `%name%` available to patterns registered afterwards.
    pub fn register_handler(&mut self, name: &str, handler: CustomHandler) {
        self.handlers.insert(name.to_string(), handler);
    }

    pub fn get(&self, name: &str) -> Option<&MacroPattern> {
        self.patterns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.patterns.contains_key(name)
    }

    /// A pair macro has a registered `/name` counterpart.
    pub fn is_pair(&self, name: &str) -> bool {
        !name.starts_with('/') && self.patterns.contains_key(&format!("/{name}"))
    }

    /// Macro names in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(String::as_str)
    }

    fn parse_pattern(&self, name: &str, template: &str) -> Result<Vec<PatternPart>, TableError> {
        let mut parts = Vec::new();
        let mut rest = template;
        while let Some(open) = rest.find('%') {
            let Some(len) = rest[open + 1..].find('%') else {
                break;
            };
            if open > 0 {
                parts.push(PatternPart::Literal(rest[..open].to_string()));
            }
            let handler = &rest[open + 1..open + 1 + len];
            parts.push(if handler.is_empty() {
                PatternPart::Raw
            } else {
                PatternPart::Handler(self.lookup_handler(name, handler)?)
            });
            rest = &rest[open + len + 2..];
        }
        if !rest.is_empty() {
            parts.push(PatternPart::Literal(rest.to_string()));
        }
        Ok(parts)
    }

    fn lookup_handler(&self, macro_name: &str, handler: &str) -> Result<Handler, TableError> {
        if let Some(custom) = self.handlers.get(handler) {
            return Ok(Handler::Custom {
                name: handler.to_string(),
                handler: Arc::clone(custom),
            });
        }
        Builtin::from_name(handler)
            .map(Handler::Builtin)
            .ok_or_else(|| TableError::UnknownHandler {
                macro_name: macro_name.to_string(),
                handler: handler.to_string(),
            })
    }
}

impl fmt::Debug for MacroTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroTable")
            .field("patterns", &self.patterns.keys().collect::<Vec<_>>())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
