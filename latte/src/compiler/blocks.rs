//! The block stack machine: `{block}`, `{capture}`, `{snippet}`,
//! `{include}` and `{extends}`.

use crate::compiler::context::{BlockFrame, BlockKind, CompileContext};
use crate::compiler::error::ErrorKind;
use crate::segment::{Fragment, Segment};
use crate::syntax::tokens::{
    export_string, fetch_token, format_array, format_modifiers, format_string, is_identifier,
};

pub(crate) fn include(
    content: &str,
    modifiers: &str,
    ctx: &CompileContext,
    is_definition: bool,
) -> Result<String, ErrorKind> {
    let mut rest = content;
    let Some(destination) = fetch_token(&mut rest) else {
        return Err(ErrorKind::MissingArgument {
            tag: "include".to_string(),
            what: "destination",
        });
    };
    let mut params = format_array(rest, "");
    if !params.is_empty() {
        params.push_str(" + ");
    }

    let Some(block) = destination.strip_prefix('#') else {
        params.push_str("$template->getParams()");
        let call = format!(
            r"Latte\Runtime::includeTemplate({}, {params}, $_l->templates[{}])",
            format_string(destination),
            export_string(&ctx.salt)
        );
        return Ok(if modifiers.is_empty() {
            format!("{call}->render()")
        } else {
            format!(
                "echo {}",
                format_modifiers(&format!("{call}->__toString(TRUE)"), modifiers)
            )
        });
    };

    let block = block.trim_start_matches('#');
    if !is_identifier(block) {
        return Err(ErrorKind::InvalidIncludeName(block.to_string()));
    }
    let parent = block == "parent";
    let name = if parent || block == "this" {
        ctx.innermost_named()
            .ok_or_else(|| ErrorKind::ParentOutsideBlock(block.to_string()))?
    } else {
        block
    };
    params.push_str(if is_definition {
        "get_defined_vars()"
    } else {
        "$template->getParams()"
    });
    Ok(block_call(name, &params, modifiers, parent))
}

fn block_call(name: &str, params: &str, modifiers: &str, parent: bool) -> String {
    let name = export_string(name);
    let cmd = if parent {
        format!(r"Latte\Runtime::callParentBlock($_l, {name}, $_b, {params})")
    } else {
        format!(r"Latte\Runtime::callBlock($_l, {name}, {params})")
    };
    if modifiers.is_empty() {
        cmd
    } else {
        format!(
            "ob_start(); {cmd}; echo {}",
            format_modifiers("ob_get_clean()", modifiers)
        )
    }
}

pub(crate) fn extends(content: &str, ctx: &mut CompileContext) -> Result<String, ErrorKind> {
    let mut rest = content;
    let Some(destination) = fetch_token(&mut rest) else {
        return Err(ErrorKind::MissingArgument {
            tag: "extends".to_string(),
            what: "destination",
        });
    };
    if !ctx.open_blocks.is_empty() {
        return Err(ErrorKind::ExtendsInsideBlock);
    }
    if ctx.extends.is_some() {
        return Err(ErrorKind::MultipleExtends);
    }
    let enabled = !matches!(destination, "none" | "false");
    ctx.extends = Some(enabled);
    Ok(if enabled {
        format!("$_l->extends = {}", format_string(destination))
    } else {
        String::new()
    })
}

pub(crate) fn open_block(
    content: &str,
    modifiers: &str,
    ctx: &mut CompileContext,
) -> Result<Fragment, ErrorKind> {
    let mut rest = content;
    let Some(name) = fetch_token(&mut rest) else {
        ctx.open_blocks.push(BlockFrame::anonymous(modifiers));
        return Ok(if modifiers.is_empty() {
            Fragment::empty()
        } else {
            Fragment::code("ob_start()")
        });
    };

    let name = name.trim_start_matches('#');
    if !is_identifier(name) {
        return Err(ErrorKind::InvalidBlockName(name.to_string()));
    }
    if ctx.named_blocks.contains(name) {
        return Err(ErrorKind::DuplicateBlock(name.to_string()));
    }

    let top = ctx.open_blocks.is_empty();
    ctx.named_blocks.insert(name.to_string());
    ctx.open_blocks.push(BlockFrame::named(name));

    let mut fragment = Fragment::empty();
    if let Some(snippet) = name.strip_prefix('_') {
        let tag = fetch_token(&mut rest)
            .map(|tag| tag.trim_matches(|c| c == '<' || c == '>'))
            .filter(|tag| !tag.is_empty())
            .unwrap_or("div");
        fragment.push_text(&format!("<{tag} id=\""));
        fragment.push_code(&format!(
            "echo $control->getSnippetId({})",
            export_string(snippet)
        ));
        fragment.push_text("\">");
        fragment.push_code(&block_call(name, "$template->getParams()", modifiers, false));
        fragment.push_text(&format!("</{tag}>"));
    } else if !top {
        fragment.push_code(&block_call(name, "get_defined_vars()", modifiers, false));
    } else if ctx.extends != Some(true) {
        fragment.push_code(&format!(
            "if (!$_l->extends) {{ {}; }}",
            block_call(name, "get_defined_vars()", modifiers, false)
        ));
    }
    fragment.push(Segment::BlockOpen(name.to_string()));
    Ok(fragment)
}

pub(crate) fn close_block(content: &str, ctx: &mut CompileContext) -> Result<Fragment, ErrorKind> {
    close_frame("/block", content, ctx)
}

/// Pop the innermost frame for closing tag `tag`.
fn close_frame(tag: &str, content: &str, ctx: &mut CompileContext) -> Result<Fragment, ErrorKind> {
    let Some(frame) = ctx.open_blocks.pop() else {
        return Err(unexpected(tag, content));
    };
    if frame.kind == BlockKind::Capture {
        ctx.open_blocks.push(frame);
        return close_capture(content, ctx).map(Fragment::from);
    }

    let expected = content.trim_start_matches('#');
    if !content.is_empty() && frame.name.as_deref() != Some(expected) {
        return Err(unexpected(tag, content));
    }

    match (frame.kind, frame.name) {
        (BlockKind::Named, Some(name)) => {
            let mut fragment = Fragment::empty();
            fragment.push(Segment::BlockClose(name));
            Ok(fragment)
        }
        _ if frame.modifiers.is_empty() => Ok(Fragment::empty()),
        _ => Ok(Fragment::code(format!(
            "echo {}",
            format_modifiers("ob_get_clean()", &frame.modifiers)
        ))),
    }
}

pub(crate) fn open_snippet(content: &str, ctx: &mut CompileContext) -> Result<Fragment, ErrorKind> {
    open_block(&format!("_{}", content.trim_start_matches(':')), "", ctx)
}

pub(crate) fn close_snippet(ctx: &mut CompileContext) -> Result<Fragment, ErrorKind> {
    close_frame("/snippet", "", ctx)
}

pub(crate) fn open_capture(
    content: &str,
    modifiers: &str,
    ctx: &mut CompileContext,
) -> Result<String, ErrorKind> {
    let mut rest = content;
    let variable = fetch_token(&mut rest).unwrap_or_default();
    if !variable.starts_with('$') {
        return Err(ErrorKind::InvalidCaptureTarget(variable.to_string()));
    }
    ctx.open_blocks.push(BlockFrame::capture(variable, modifiers));
    Ok("ob_start()".to_string())
}

pub(crate) fn close_capture(content: &str, ctx: &mut CompileContext) -> Result<String, ErrorKind> {
    let frame = ctx.open_blocks.pop();
    let Some(BlockFrame {
        kind: BlockKind::Capture,
        name: Some(variable),
        modifiers,
    }) = frame
    else {
        return Err(unexpected("/capture", content));
    };
    if !content.is_empty() && content != variable {
        return Err(unexpected("/capture", content));
    }
    Ok(format!(
        "{variable} = {}",
        format_modifiers("ob_get_clean()", &modifiers)
    ))
}

fn unexpected(tag: &str, content: &str) -> ErrorKind {
    if content.is_empty() {
        ErrorKind::UnexpectedClose(tag.to_string())
    } else {
        ErrorKind::UnexpectedClose(format!("{tag} {content}"))
    }
}
