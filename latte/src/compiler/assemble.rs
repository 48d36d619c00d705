use tracing::debug;

use crate::compiler::CompileUnit;
use crate::compiler::blocks;
use crate::compiler::error::{CompileError, ErrorKind};
use crate::compiler::rewrite;
use crate::segment::Segment;
use crate::syntax::tokens::export_string;
use crate::Compiled;

pub(crate) const GATE_OPEN: &str = r"if (Latte\Runtime::$outputAllowed) {";
pub(crate) const GATE_CLOSE: &str = "}";

const AJAX_SNIPPETS: &str = r"if (isset($presenter, $control) && $presenter->isAjax()) { Latte\Runtime::renderSnippets($control, $_l, get_defined_vars()); }";
const EXTENDS_PROLOGUE: &str = r"if ($_l->extends) { ob_start(); } elseif (isset($presenter, $control) && $presenter->isAjax()) { Latte\Runtime::renderSnippets($control, $_l, get_defined_vars()); }";
const EXTENDS_EPILOGUE: &str = r"if ($_l->extends) { ob_end_clean(); Latte\Runtime::includeTemplate($_l->extends, get_defined_vars(), $template)->render(); }";

impl CompileUnit<'_> {
    /// Close the document: auto-close a single trailing block, wrap the body
    /// in the output gate and the inheritance prologue, lift named blocks.
    pub fn finalize(mut self) -> Result<Compiled, CompileError> {
        match self.ctx.open_blocks.len() {
            0 => {}
            1 => {
                let fragment =
                    blocks::close_block("", &mut self.ctx).map_err(|kind| self.error(kind))?;
                self.push_fragment(fragment);
            }
            n => return Err(self.error(ErrorKind::UnclosedBlocks(n))),
        }

        let CompileUnit { ctx, segments, .. } = self;
        let inherits = !ctx.named_blocks.is_empty() || ctx.extends == Some(true);

        let mut body = Vec::with_capacity(segments.len() + 4);
        body.push(Segment::Code(
            if inherits { EXTENDS_PROLOGUE } else { AJAX_SNIPPETS }.to_string(),
        ));
        body.push(Segment::Code(GATE_OPEN.to_string()));
        body.extend(segments);
        body.push(Segment::Code(GATE_CLOSE.to_string()));
        if inherits {
            body.push(Segment::Code(EXTENDS_EPILOGUE.to_string()));
        }

        let blocks = rewrite::extract_blocks(&mut body, &ctx.named_blocks, &ctx.salt);
        let extends = match ctx.extends {
            Some(true) => "true",
            Some(false) => "false",
            None => "null",
        };
        let prologue = vec![Segment::Code(format!(
            r"$_l = Latte\Runtime::initRenderState($template, {extends}, {}); unset($_extends)",
            export_string(&ctx.salt)
        ))];
        debug!(
            blocks = blocks.len(),
            extends,
            salt = %ctx.salt,
            "template compiled"
        );

        Ok(Compiled {
            prologue,
            blocks,
            body,
            extends: ctx.extends,
            salt: ctx.salt,
            output_context: ctx.output_context,
        })
    }
}
