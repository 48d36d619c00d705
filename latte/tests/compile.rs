use std::io::Write;
use std::sync::Arc;

use indexmap::IndexMap;
use latte::{
    CodeDelimiters, CompileContext, CompileUnit, Compiled, Compiler, CompilerConfig, ErrorKind,
    Fragment, MacroTable, OutputContext, Segment, TableError, instance_salt,
};

fn config() -> CompilerConfig {
    CompilerConfig {
        salt: Some("s4lt".to_string()),
        ..CompilerConfig::default()
    }
}

fn compile(source: &str) -> Compiled {
    Compiler::with_config(config())
        .expect("default table")
        .compile(source, 0)
        .expect("compile failed")
}

fn code(source: &str) -> String {
    compile(source).to_code(&CodeDelimiters::default())
}

fn error(source: &str) -> ErrorKind {
    Compiler::with_config(config())
        .expect("default table")
        .compile(source, 0)
        .expect_err("compile should fail")
        .kind
}

/// Salt of `source` compiled anonymously with the test config.
fn salt_of(source: &str) -> String {
    instance_salt("s4lt", source)
}

fn text(s: &str) -> Segment {
    Segment::Text(s.to_string())
}

fn attrs(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn named_block_becomes_function_unit() {
    let compiled = compile("{block #content}Hello{/block}");
    assert_eq!(compiled.block_names().collect::<Vec<_>>(), ["content"]);
    assert_eq!(compiled.blocks["content"].body, vec![text("Hello")]);
    assert!(!compiled.body.contains(&text("Hello")));

    let out = code("{block #content}Hello{/block}");
    assert!(out.contains(
        r"<?php if (!$_l->extends) { Latte\Runtime::callBlock($_l, 'content', get_defined_vars()); } ?>"
    ));
    assert!(out.contains("function_exists($_l->blocks['content'][] = '_lb"));
}

#[test]
fn markers_never_reach_output() {
    let compiled = compile("a{block #x}b{/block}c");
    assert!(compiled.segments().iter().all(|segment| !matches!(
        segment,
        Segment::BlockOpen(_) | Segment::BlockClose(_)
    )));
}

#[test]
fn prologue_initializes_render_state() {
    let compiled = compile("plain");
    assert_eq!(compiled.salt, salt_of("plain"));
    assert_eq!(
        compiled.prologue,
        vec![Segment::Code(format!(
            r"$_l = Latte\Runtime::initRenderState($template, null, '{}'); unset($_extends)",
            compiled.salt
        ))]
    );
    assert!(compiled.blocks.is_empty());
    assert!(!code("plain").contains("ob_end_clean"));
}

#[test]
fn duplicate_block_is_rejected() {
    assert_eq!(
        error("{block #a}{/block}{block #a}{/block}"),
        ErrorKind::DuplicateBlock("a".to_string())
    );
}

#[test]
fn error_points_at_offending_tag() {
    let err = Compiler::with_config(config())
        .expect("default table")
        .compile("line1\n{block #a}{block #a}", 3)
        .expect_err("duplicate");
    assert_eq!(err.line, 2);
    assert_eq!(err.tag, "{block #a}");
    assert_eq!(err.span, 16..26);
    assert_eq!(err.file_id, 3);
    assert!(err.to_diagnostic().message.contains("cannot redeclare block 'a'"));
}

#[test]
fn single_unclosed_block_is_closed_at_end() {
    let compiled = compile("{block #a}tail");
    assert_eq!(compiled.blocks["a"].body, vec![text("tail")]);
}

#[test]
fn several_unclosed_blocks_fail() {
    assert_eq!(error("{block #a}{block #b}x"), ErrorKind::UnclosedBlocks(2));
}

#[test]
fn unexpected_closing_tags() {
    assert_eq!(error("{/block}"), ErrorKind::UnexpectedClose("/block".to_string()));
    assert_eq!(
        error("{block #a}{/block b}"),
        ErrorKind::UnexpectedClose("/block b".to_string())
    );
    assert_eq!(
        error("{block}{/block a}"),
        ErrorKind::UnexpectedClose("/block a".to_string())
    );
}

#[test]
fn every_pair_macro_opens_and_closes() {
    let table = MacroTable::new();
    let pairs: Vec<&str> = table.names().filter(|name| table.is_pair(name)).collect();
    assert!(pairs.contains(&"foreach") && pairs.contains(&"capture"));

    for name in pairs {
        let content = match name {
            "block" => "#a",
            "capture" => "$v",
            "snippet" => "a",
            "syntax" => "latte",
            "foreach" => "$items as $i",
            _ => "$a",
        };
        let paired = format!("{{{name} {content}}}{{/{name}}}");
        let compiled = Compiler::with_config(config()).unwrap().compile(&paired, 0);
        assert!(compiled.is_ok(), "{paired}: {compiled:?}");

        let lone = format!("{{/{name}}}");
        assert!(
            matches!(error(&lone), ErrorKind::UnexpectedClose(_)),
            "{lone} should be rejected"
        );
    }
}

#[test]
fn closing_tag_must_match_innermost_macro() {
    assert_eq!(
        error("{if $a}{foreach $x as $y}{/if}{/foreach}"),
        ErrorKind::UnexpectedClose("/if".to_string())
    );
    assert_eq!(error("x{/while}"), ErrorKind::UnexpectedClose("/while".to_string()));
    assert_eq!(error("{/snippet}"), ErrorKind::UnexpectedClose("/snippet".to_string()));
    assert!(code("{if $a}{while $b}x{/while}{/if}").contains("endwhile"));
}

#[test]
fn invalid_block_name() {
    assert_eq!(
        error("{block #a-b}{/block}"),
        ErrorKind::InvalidBlockName("a-b".to_string())
    );
}

#[test]
fn extends_suppresses_top_level_block_calls() {
    let compiled = compile("{extends 'layout.latte'}{block #content}x{/block}");
    assert_eq!(compiled.extends, Some(true));
    let out = compiled.to_code(&CodeDelimiters::default());
    assert!(out.contains("$_l->extends = 'layout.latte'"));
    assert!(!out.contains("callBlock($_l, 'content'"));
    assert!(out.contains(&format!(r"initRenderState($template, true, '{}')", compiled.salt)));
    assert_eq!(out.matches(r"Latte\Runtime::includeTemplate($_l->extends").count(), 1);
    assert_eq!(out.matches("ob_start()").count(), 1);
}

#[test]
fn layout_is_an_alias_of_extends() {
    assert_eq!(compile("{layout 'base.latte'}").extends, Some(true));
}

#[test]
fn extends_none_disables_inheritance() {
    let compiled = compile("{extends none}{block #a}x{/block}");
    assert_eq!(compiled.extends, Some(false));
    let out = compiled.to_code(&CodeDelimiters::default());
    assert!(out.contains(&format!(r"initRenderState($template, false, '{}')", compiled.salt)));
    assert!(out.contains("if (!$_l->extends) { Latte\\Runtime::callBlock($_l, 'a'"));
}

#[test]
fn extends_placement_rules() {
    assert_eq!(error("{block #a}{extends 'x'}{/block}"), ErrorKind::ExtendsInsideBlock);
    assert_eq!(error("{extends 'a'}{extends 'b'}"), ErrorKind::MultipleExtends);
    assert_eq!(
        error("{extends}"),
        ErrorKind::MissingArgument {
            tag: "extends".to_string(),
            what: "destination"
        }
    );
}

#[test]
fn nested_blocks_are_extracted_separately() {
    let compiled = compile("{block #outer}a{block #inner}b{/block}c{/block}");
    assert_eq!(compiled.block_names().collect::<Vec<_>>(), ["outer", "inner"]);
    assert_eq!(compiled.blocks["inner"].body, vec![text("b")]);
    assert_eq!(
        compiled.blocks["outer"].body,
        vec![
            text("a"),
            Segment::Code(r"Latte\Runtime::callBlock($_l, 'inner', get_defined_vars())".to_string()),
            text("c"),
        ]
    );
}

#[test]
fn include_parent_uses_position() {
    let out = code("{extends 'l'}{block #a}{include #parent}{/block}");
    assert!(out.contains(
        r"Latte\Runtime::callParentBlock($_l, 'a', $_b, $template->getParams())"
    ));
    assert_eq!(
        error("{include #parent}"),
        ErrorKind::ParentOutsideBlock("parent".to_string())
    );
}

#[test]
fn include_file_passes_params() {
    let source = "{include 'header.latte', title => 'Hi'}";
    assert!(code(source).contains(&format!(
        r"Latte\Runtime::includeTemplate('header.latte', array('title' => 'Hi') + $template->getParams(), $_l->templates['{}'])->render()",
        salt_of(source)
    )));
}

#[test]
fn include_with_modifiers_buffers_output() {
    let out = code("{include #a|upper}");
    assert!(out.contains(
        r"ob_start(); Latte\Runtime::callBlock($_l, 'a', $template->getParams()); echo $template->upper(ob_get_clean())"
    ));
}

#[test]
fn capture_round_trip() {
    let out = code("{capture $x|upper}hi{/capture}");
    assert!(out.contains("<?php ob_start() ?>hi<?php $x = $template->upper(ob_get_clean()) ?>"));
    assert!(code("{capture $x}a{/block}").contains("$x = ob_get_clean()"));
}

#[test]
fn capture_errors() {
    assert_eq!(
        error("{capture x}{/capture}"),
        ErrorKind::InvalidCaptureTarget("x".to_string())
    );
    assert_eq!(
        error("{capture $x}a{/capture $y}"),
        ErrorKind::UnexpectedClose("/capture $y".to_string())
    );
    assert_eq!(
        error("{block}{/capture}"),
        ErrorKind::UnexpectedClose("/capture".to_string())
    );
}

#[test]
fn anonymous_block_with_modifiers() {
    let out = code("{block|upper}x{/block}");
    assert!(out.contains("<?php ob_start() ?>x<?php echo $template->upper(ob_get_clean()) ?>"));
    assert!(compile("{block}x{/block}").blocks.is_empty());
}

#[test]
fn snippet_wraps_block_in_element() {
    let compiled = compile("{snippet header}x{/snippet}");
    assert_eq!(compiled.block_names().collect::<Vec<_>>(), ["_header"]);
    let out = compiled.to_code(&CodeDelimiters::default());
    assert!(out.contains(
        r#"<div id="<?php echo $control->getSnippetId('header') ?>"><?php Latte\Runtime::callBlock($_l, '_header', $template->getParams()) ?></div>"#
    ));
    assert!(code("{snippet menu, ul}x{/snippet}").contains("<ul id="));
}

#[test]
fn sigil_shorthands() {
    assert!(code("{$name}").contains(r"<?php echo Latte\Runtime::escapeHtml($name) ?>"));
    assert!(code("{!$name}").contains("<?php echo $name ?>"));
    assert!(code("{=1+2}").contains(r"echo Latte\Runtime::escapeHtml(1+2)"));
    assert!(code("{!=$a}").contains("<?php echo $a ?>"));
    assert!(code(r#"{_"Hello"}"#).contains(
        r#"echo Latte\Runtime::escapeHtml($template->translate("Hello"))"#
    ));
    assert!(code("{$x|upper}").contains(r"escapeHtml($template->upper($x))"));
}

#[test]
fn unknown_tags_pass_through() {
    assert!(code("a{foo bar}b").contains("a{foo bar}b"));
    assert!(code("x{#y}").contains("x{#y}"));
}

#[test]
fn comments_are_removed() {
    assert!(compile("a{* note *}b").body.contains(&text("ab")));
}

#[test]
fn content_type_switches_escaping() {
    let compiled = compile("{contentType text/xml}{$x}");
    assert_eq!(compiled.output_context, OutputContext::None);
    let out = compiled.to_code(&CodeDelimiters::default());
    assert!(out.contains(r#"Latte\Runtime::httpResponse()->setHeader("Content-Type", "text/xml")"#));
    assert!(out.contains(r"echo Latte\Runtime::escapeXml($x)"));
    assert_eq!(compile("{$x}").output_context, OutputContext::Text);
}

#[test]
fn syntax_switching() {
    let out = code("{syntax double}{$a}{{$b}}{{/syntax}}{$c}");
    assert!(out.contains("{$a}"));
    assert!(out.contains(r"escapeHtml($b)"));
    assert!(out.contains(r"escapeHtml($c)"));
    assert!(code("{syntax off}{$a}{/syntax}{$b}").contains("{$a}"));
    assert_eq!(error("{syntax foo}"), ErrorKind::UnknownSyntax("foo".to_string()));
}

#[test]
fn gated_tag_suspends_output_gate() {
    let out = code("@{if $a}x{/if}");
    assert!(out.contains(
        r"<?php } ?><?php if ($a): ?><?php if (Latte\Runtime::$outputAllowed) { ?>x<?php endif ?>"
    ));
}

#[test]
fn body_is_wrapped_in_output_gate() {
    let out = code("x");
    assert!(out.contains(r"<?php if (Latte\Runtime::$outputAllowed) { ?>x<?php } ?>"));
    assert!(out.contains(r"Latte\Runtime::renderSnippets($control, $_l, get_defined_vars())"));
}

#[test]
fn control_flow_macros() {
    let out = code("{foreach $items as $item}{$item}{/foreach}");
    assert!(out.contains(
        r"foreach ($iterator = $_l->its[] = new Latte\CachingIterator($items) as $item):"
    ));
    assert!(out.contains("endforeach; array_pop($_l->its); $iterator = end($_l->its)"));
    assert!(code("{if $a}x{elseif $b}y{else}z{/if}").contains(
        "<?php if ($a): ?>x<?php elseif ($b): ?>y<?php else: ?>z<?php endif ?>"
    ));
    assert!(code("{ifset $a}x{/ifset}").contains("if (isset($a)):"));
}

#[test]
fn variables_and_defaults() {
    assert!(code("{var $x = 5}").contains("<?php $x = 5 ?>"));
    assert!(code("{assign a => 1, b => $c}").contains("extract(array('a' => 1, 'b' => $c))"));
    assert!(code("{default a => 1}").contains("extract(array('a' => 1), EXTR_SKIP)"));
    assert!(matches!(error("{var}"), ErrorKind::MissingArgument { .. }));
}

#[test]
fn missing_argument_names_the_tag_written() {
    assert_eq!(
        error("{assign}"),
        ErrorKind::MissingArgument {
            tag: "assign".to_string(),
            what: "arguments"
        }
    );
    assert_eq!(
        error("{var}").to_string(),
        "missing arguments in {var}"
    );
    assert_eq!(
        error("{layout}"),
        ErrorKind::MissingArgument {
            tag: "layout".to_string(),
            what: "destination"
        }
    );
}

#[test]
fn links_and_widgets() {
    assert!(code("{link Page:show, id => 5}").contains(
        r#"echo Latte\Runtime::escapeHtml($control->link("Page:show", array('id' => 5)))"#
    ));
    assert!(code("{plink Home:}").contains(r#"$presenter->link("Home:")"#));
    assert!(code("{control menu}").contains(r#"$control->getWidget("menu")->render()"#));
    assert!(code("{ifCurrent Page:}x{/if}").contains(
        "$presenter->link(\"Page:\"); } catch (Latte\\InvalidLinkException $e) {}; if ($presenter->getLastCreatedRequestFlag('current')):"
    ));
}

#[test]
fn attr_and_dump() {
    assert!(code("{attr class($a) title($b)}").contains(
        r"echo Latte\Html::el(NULL)->class($a)->title($b)->attributes()"
    ));
    assert!(code("{dump $x}").contains(r#"Latte\Debug::barDump(array('$x' => $x), "Template " . $template->getFile())"#));
}

#[test]
fn attributes_compose_in_table_order() {
    let table = MacroTable::new();
    let mut unit = CompileUnit::initialize(&table, &config(), "page.latte", 0);
    let a = attrs(&[("if", "$a"), ("foreach", "$items as $i")]);

    let open = unit.resolve_attributes("<li>", &a, false).unwrap().unwrap();
    assert_eq!(
        open.to_code(),
        r"<?php foreach ($iterator = $_l->its[] = new Latte\CachingIterator($items) as $i): ?><?php if ($a): ?><li>"
    );
    let close = unit.resolve_attributes("</li>", &a, true).unwrap().unwrap();
    assert_eq!(
        close.to_code(),
        "</li><?php endif ?><?php endforeach; array_pop($_l->its); $iterator = end($_l->its) ?>"
    );
}

#[test]
fn attribute_order_on_element_does_not_matter() {
    let pairs = [
        ("if", "$a"),
        ("inner-foreach", "$items as $i"),
        ("tag-ifset", "$t"),
        ("foreach", "$rows as $row"),
    ];
    let forward = attrs(&pairs);
    let reversed: IndexMap<String, String> = forward
        .iter()
        .rev()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    assert_ne!(
        forward.keys().collect::<Vec<_>>(),
        reversed.keys().collect::<Vec<_>>()
    );

    let render = |a: &IndexMap<String, String>| {
        let table = MacroTable::new();
        let mut unit = CompileUnit::initialize(&table, &config(), "page.latte", 0);
        let open = unit.resolve_attributes("<tr>", a, false).unwrap().unwrap();
        let close = unit.resolve_attributes("</tr>", a, true).unwrap().unwrap();
        (open.to_code(), close.to_code())
    };
    let (open, close) = render(&forward);
    assert_eq!((open.clone(), close.clone()), render(&reversed));

    assert!(open.starts_with("<?php foreach ($iterator = $_l->its[] = new Latte\\CachingIterator($rows)"));
    assert!(open.contains("<?php if (isset($t)): ?><tr><?php endif ?>"));
    assert!(close.ends_with("endforeach; array_pop($_l->its); $iterator = end($_l->its) ?>"));
}

#[test]
fn inner_attribute_nests_inside_direct_one() {
    let table = MacroTable::new();
    let mut unit = CompileUnit::initialize(&table, &config(), "page.latte", 0);
    let a = attrs(&[("if", "$a"), ("inner-if", "$b")]);

    let open = unit.resolve_attributes("<div>", &a, false).unwrap().unwrap();
    let close = unit.resolve_attributes("</div>", &a, true).unwrap().unwrap();
    assert_eq!(open.to_code(), "<?php if ($a): ?><div><?php if ($b): ?>");
    assert_eq!(close.to_code(), "<?php endif ?></div><?php endif ?>");

    let tag = attrs(&[("tag-if", "$c")]);
    let open = unit.resolve_attributes("<a>", &tag, false).unwrap().unwrap();
    assert_eq!(open.to_code(), "<?php if ($c): ?><a><?php endif ?>");
}

#[test]
fn unknown_attribute_runs_nothing() {
    let table = MacroTable::new();
    let mut unit = CompileUnit::initialize(&table, &config(), "page.latte", 0);
    let a = attrs(&[("block", "#a"), ("href", "x")]);

    assert!(unit.resolve_attributes("<a>", &a, false).unwrap().is_none());
    assert!(unit.ctx.named_blocks.is_empty());
    assert!(unit.ctx.open_blocks.is_empty());

    let err = unit.expand_attributes("<a>", &a, false).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownAttribute("href".to_string()));
}

#[test]
fn block_attribute_wraps_element() {
    let table = MacroTable::new();
    let mut unit = CompileUnit::initialize(&table, &config(), "page.latte", 0);
    let a = attrs(&[("block", "#item")]);

    let open = unit.resolve_attributes("<p>", &a, false).unwrap().unwrap();
    unit.push_fragment(open);
    unit.push_text("x");
    let close = unit.resolve_attributes("</p>", &a, true).unwrap().unwrap();
    unit.push_fragment(close);

    let compiled = unit.finalize().unwrap();
    assert_eq!(compiled.blocks["item"].body, vec![text("<p>x</p>")]);
}

#[test]
fn elements_map_to_macros() {
    let table = MacroTable::new();
    let mut unit = CompileUnit::initialize(&table, &config(), "page.latte", 0);

    let include = unit
        .resolve_element("include", &attrs(&[("block", "#a")]), false)
        .unwrap()
        .unwrap();
    assert_eq!(
        include.as_code(),
        Some(r"Latte\Runtime::callBlock($_l, 'a', $template->getParams())")
    );

    let cond = attrs(&[("cond", "$x")]);
    let open = unit.resolve_element("if", &cond, false).unwrap().unwrap();
    let close = unit.resolve_element("if", &cond, true).unwrap().unwrap();
    assert_eq!(open.as_code(), Some("if ($x):"));
    assert_eq!(close.as_code(), Some("endif"));

    assert!(unit.resolve_element("video", &cond, false).unwrap().is_none());
}

#[test]
fn resolve_tag_reports_unrecognized() {
    let table = MacroTable::new();
    let mut unit = CompileUnit::initialize(&table, &config(), "page.latte", 0);
    assert!(unit.resolve_tag("", "#x", "").unwrap().is_none());
    assert!(unit.resolve_tag("nope", "", "").unwrap().is_none());
    assert_eq!(
        unit.resolve_tag("", "$x", "").unwrap().unwrap().as_code(),
        Some(r"echo Latte\Runtime::escapeHtml($x)")
    );
}

#[test]
fn custom_macros_from_config() {
    let mut cfg = config();
    cfg.macros.insert("shout".to_string(), "echo strtoupper(%%)".to_string());
    cfg.macros.insert("/shout".to_string(), "echo '!'".to_string());
    let compiler = Compiler::with_config(cfg).unwrap();
    assert!(compiler.table().is_pair("shout"));
    let out = compiler
        .compile("{shout $x}", 0)
        .unwrap()
        .to_code(&CodeDelimiters::default());
    assert!(out.contains("<?php echo strtoupper($x) ?>"));
}

#[test]
fn macro_with_unknown_handler_is_rejected() {
    let mut cfg = config();
    cfg.macros.insert("bad".to_string(), "%nothing%".to_string());
    let err = Compiler::with_config(cfg).unwrap_err();
    assert_eq!(
        err,
        TableError::UnknownHandler {
            macro_name: "bad".to_string(),
            handler: "nothing".to_string()
        }
    );
}

#[test]
fn custom_handler() {
    let mut table = MacroTable::new();
    table.register_handler(
        "greet",
        Arc::new(
            |content: &str, _modifiers: &str, ctx: &mut CompileContext| -> Result<Fragment, ErrorKind> {
                Ok(Fragment::code(format!("echo 'hello {content} from {}'", ctx.salt)))
            },
        ),
    );
    table.register("greet", "%greet%").unwrap();
    let compiler = Compiler::with_table(table, config());
    let out = compiler.compile("{greet world}", 0).unwrap();
    let expected = format!("echo 'hello world from {}'", salt_of("{greet world}"));
    assert!(out.to_code(&CodeDelimiters::default()).contains(&expected));
}

#[test]
fn custom_delimiters() {
    let delimiters = CodeDelimiters {
        open: "<% ".to_string(),
        close: " %>".to_string(),
    };
    assert!(compile("{$x}").to_code(&delimiters).contains(r"<% echo Latte\Runtime::escapeHtml($x) %>"));
}

#[test]
fn config_file_is_loaded() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("latte.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "salt = \"abc\"\ncontent_type = \"text/xml\"\n\n[macros]\nhello = \"echo 'hello'\""
    )
    .unwrap();

    let cfg = CompilerConfig::load(&path).unwrap();
    assert_eq!(cfg.salt.as_deref(), Some("abc"));
    let compiled = Compiler::with_config(cfg).unwrap().compile("{hello}{$x}", 0).unwrap();
    assert_eq!(compiled.salt, instance_salt("abc", "{hello}{$x}"));
    let out = compiled.to_code(&CodeDelimiters::default());
    assert!(out.contains("<?php echo 'hello' ?>"));
    assert!(out.contains(r"escapeXml($x)"));
}

#[test]
fn missing_config_file() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let err = CompilerConfig::load(&dir.path().join("none.toml")).unwrap_err();
    assert!(err.to_string().starts_with("cannot read"));
}

#[test]
fn shared_salt_seed_keeps_templates_apart() {
    let compiler = Compiler::with_config(config()).unwrap();
    let child = compiler
        .compile_named(
            "page.latte",
            "{extends 'layout.latte'}{block #content}child{/block}",
            0,
        )
        .unwrap();
    let parent = compiler
        .compile_named("layout.latte", "{block #content}parent{/block}", 1)
        .unwrap();

    assert_ne!(child.salt, parent.salt);
    assert_ne!(child.blocks["content"].ident, parent.blocks["content"].ident);

    let again = compiler
        .compile_named("page.latte", "{block #content}edited{/block}", 0)
        .unwrap();
    assert_eq!(again.salt, child.salt);
}

#[test]
fn random_salt_when_unset() {
    let compiled = Compiler::new().compile("x", 0).unwrap();
    assert_eq!(compiled.salt.len(), 10);
}
