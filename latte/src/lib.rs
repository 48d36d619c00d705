//! A compiler for Latte templates.
//!
//! Templates are markup with `{...}` tags. Each tag is looked up in a
//! [`MacroTable`] and replaced by host code; named `{block}`s are lifted out
//! into separate functions so that a child template can override them.
//!
//! ```ignore
//! let compiled = latte::Compiler::new().compile("{block #title}Hi{/block}", 0)?;
//! println!("{}", compiled.to_code(&Default::default()));
//! ```

pub mod compiler;
pub mod config;
pub mod macros;
pub mod segment;
pub mod syntax;

use indexmap::IndexMap;

pub use compiler::context::{CompileContext, OutputContext, instance_salt};
pub use compiler::error::{CompileError, ErrorKind, Location};
pub use compiler::rewrite::FunctionUnit;
pub use compiler::{CompileUnit, Compiler};
pub use config::{CompilerConfig, ConfigError};
pub use macros::{MacroTable, TableError};
pub use segment::{CodeDelimiters, Fragment, Segment};

/// A compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
    /// Render-state initialization, emitted before everything else.
    pub prologue: Vec<Segment>,
    /// Function units for named blocks, in declaration order.
    pub blocks: IndexMap<String, FunctionUnit>,
    pub body: Vec<Segment>,
    pub extends: Option<bool>,
    pub salt: String,
    /// Output context in effect at the end of the template.
    pub output_context: OutputContext,
}

impl Compiled {
    /// Prologue, function units, then the body.
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments = self.prologue.clone();
        for unit in self.blocks.values() {
            segments.extend(unit.segments());
        }
        if !self.blocks.is_empty() {
            segments.push(Segment::Code("\n//\n// end of blocks\n//\n".to_string()));
        }
        segments.extend(self.body.iter().cloned());
        segments
    }

    pub fn to_code(&self, delimiters: &CodeDelimiters) -> String {
        segment::render(&self.segments(), delimiters)
    }

    pub fn block_names(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }
}
