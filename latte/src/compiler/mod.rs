//! Template compiler.
//!
//! [`Compiler::compile`] scans the source, resolves each tag through the
//! macro table into a [`Fragment`], and hands the collected segments to
//! [`CompileUnit::finalize`], which lifts named blocks into function units.

pub mod assemble;
pub mod blocks;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod rewrite;

use tracing::{debug, trace};

use crate::Compiled;
use crate::config::CompilerConfig;
use crate::macros::{MacroTable, TableError};
use crate::segment::{Fragment, Segment};
use crate::syntax::Syntax;
use crate::syntax::scanner::{Event, Scanner};

use self::assemble::{GATE_CLOSE, GATE_OPEN};
use self::context::CompileContext;
use self::error::{CompileError, ErrorKind, Location};

/// One template being compiled against a macro table.
pub struct CompileUnit<'t> {
    table: &'t MacroTable,
    pub ctx: CompileContext,
    segments: Vec<Segment>,
    location: Location,
    file_id: usize,
}

impl<'t> CompileUnit<'t> {
    /// `template` names the template for salting, usually its path.
    pub fn initialize(
        table: &'t MacroTable,
        config: &CompilerConfig,
        template: &str,
        file_id: usize,
    ) -> Self {
        CompileUnit {
            table,
            ctx: CompileContext::initialize(config, template),
            segments: Vec::new(),
            location: Location::default(),
            file_id,
        }
    }

    /// Record the tag being resolved so errors can point at it.
    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    pub fn syntax(&self) -> Syntax {
        self.ctx.syntax
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(Segment::Text(last)) => last.push_str(text),
            _ => self.segments.push(Segment::Text(text.to_string())),
        }
    }

    pub fn push_code(&mut self, code: &str) {
        if !code.is_empty() {
            self.segments.push(Segment::Code(code.to_string()));
        }
    }

    pub fn push_fragment(&mut self, fragment: Fragment) {
        for segment in fragment.segments {
            match segment {
                Segment::Text(text) => self.push_text(&text),
                other => self.segments.push(other),
            }
        }
    }

    pub(crate) fn error(&self, kind: ErrorKind) -> CompileError {
        CompileError::new(kind, &self.location, self.file_id)
    }
}

/// Compiles templates against a fixed macro table.
#[derive(Debug, Clone)]
pub struct Compiler {
    table: MacroTable,
    config: CompilerConfig,
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new()
    }
}

impl Compiler {
    /// The default macro table with default settings.
    pub fn new() -> Self {
        Compiler::with_table(MacroTable::new(), CompilerConfig::default())
    }

    /// The default macro table extended with the config's macros.
    pub fn with_config(config: CompilerConfig) -> Result<Self, TableError> {
        let table = MacroTable::with_config(&config)?;
        Ok(Compiler::with_table(table, config))
    }

    pub fn with_table(table: MacroTable, config: CompilerConfig) -> Self {
        Compiler { table, config }
    }

    pub fn table(&self) -> &MacroTable {
        &self.table
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile one template. `file_id` is only used to label errors.
    ///
    /// The source text stands in for the template's name; use
    /// [`compile_named`](Self::compile_named) when the path is known.
    pub fn compile(&self, source: &str, file_id: usize) -> Result<Compiled, CompileError> {
        self.compile_named(source, source, file_id)
    }

    /// Compile the template called `name` (its path, for file templates).
    pub fn compile_named(
        &self,
        name: &str,
        source: &str,
        file_id: usize,
    ) -> Result<Compiled, CompileError> {
        let mut unit = CompileUnit::initialize(&self.table, &self.config, name, file_id);
        let mut scanner = Scanner::new(source);
        debug!(salt = %unit.ctx.salt, bytes = source.len(), "compiling template");

        while let Some(event) = scanner.next_event(unit.syntax()) {
            match event {
                Event::Text(text) => unit.push_text(text),
                Event::Tag(tag) => {
                    unit.set_location(Location {
                        tag: tag.raw.to_string(),
                        span: tag.span.clone(),
                        line: tag.line,
                    });
                    if tag.gated {
                        unit.push_code(GATE_CLOSE);
                    }
                    match unit.resolve_tag(tag.name, tag.content, tag.modifiers)? {
                        Some(fragment) => unit.push_fragment(fragment),
                        None => {
                            trace!(tag = tag.raw, line = tag.line, "not a macro, kept as text");
                            unit.push_text(tag.raw);
                        }
                    }
                    if tag.gated {
                        unit.push_code(GATE_OPEN);
                    }
                }
            }
        }

        unit.set_location(Location {
            tag: String::new(),
            span: source.len()..source.len(),
            line: source.lines().count().max(1),
        });
        unit.finalize()
    }
}
