use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use latte_runtime::{
    BlockFn, Control, Destination, Extends, Params, RenderState, RuntimeError, Template, Value,
    call_block, call_parent_block, include_template, init_render_state, render_snippets,
};

fn text_block(text: &'static str) -> BlockFn {
    Rc::new(
        move |_: &RenderState, _: &Params, _: usize, out: &mut String| -> Result<(), RuntimeError> {
            out.push_str(text);
            Ok(())
        },
    )
}

/// A block that wraps its parent implementation in brackets.
fn wrapping_block(name: &'static str) -> BlockFn {
    Rc::new(
        move |state: &RenderState,
              params: &Params,
              position: usize,
              out: &mut String|
              -> Result<(), RuntimeError> {
            out.push('[');
            call_parent_block(state, name, position, params, out)?;
            out.push(']');
            Ok(())
        },
    )
}

fn render(state: &RenderState, name: &str) -> Result<String, RuntimeError> {
    let mut out = String::new();
    call_block(state, name, &Params::new(), &mut out)?;
    Ok(out)
}

#[test]
fn most_derived_block_wins() {
    let mut child = Template::new("/app/page.latte");
    let mut state = init_render_state(&mut child, Some(true), "child");
    state.register_block("content", "_lbchild_content", text_block("child"));
    state.set_extends("layout.latte");

    let mut parent = state
        .parent_template(&child, Params::new())
        .unwrap()
        .expect("page extends layout");
    assert_eq!(parent.file(), Some(Path::new("/app/layout.latte")));

    let parent_state = init_render_state(&mut parent, None, "parent");
    assert!(parent_state.shares_registries_with(&state));
    parent_state.register_block("content", "_lbparent_content", text_block("parent"));

    assert_eq!(render(&parent_state, "content").unwrap(), "child");
    assert_eq!(parent_state.chain_len("content"), 2);
}

#[test]
fn parent_block_follows_position() {
    let state = RenderState::new();
    state.register_block("a", "leaf", wrapping_block("a"));
    state.register_block("a", "middle", wrapping_block("a"));
    state.register_block("a", "root", text_block("root"));

    assert_eq!(render(&state, "a").unwrap(), "[[root]]");
}

#[test]
fn parent_of_root_is_undefined() {
    let state = RenderState::new();
    state.register_block("a", "only", wrapping_block("a"));
    assert_eq!(
        render(&state, "a"),
        Err(RuntimeError::UndefinedParentBlock("a".to_string()))
    );
}

#[test]
fn undefined_block() {
    let err = render(&RenderState::new(), "missing").unwrap_err();
    assert_eq!(err, RuntimeError::UndefinedBlock("missing".to_string()));
    assert_eq!(err.to_string(), "call to undefined block 'missing'");
}

#[test]
fn duplicate_registration_is_ignored() {
    let state = RenderState::new();
    assert!(state.register_block("a", "_lb1_a", text_block("first")));
    assert!(!state.register_block("a", "_lb1_a", text_block("second")));
    assert_eq!(state.chain_len("a"), 1);
    assert_eq!(render(&state, "a").unwrap(), "first");
}

#[test]
fn include_resolves_relative_paths() {
    let current = Template::new("/tpl/page.latte");
    let params: Params = [("title".to_string(), Value::from("Hi"))].into_iter().collect();

    let included = include_template("parts/header.latte".into(), params, &current).unwrap();
    assert_eq!(included.file(), Some(Path::new("/tpl/parts/header.latte")));
    assert_eq!(included.param("title"), Some(&Value::from("Hi")));

    let absolute = include_template("/other.latte".into(), Params::new(), &current).unwrap();
    assert_eq!(absolute.file(), Some(Path::new("/other.latte")));

    let drive = include_template("C:/x.latte".into(), Params::new(), &current).unwrap();
    assert_eq!(drive.file(), Some(Path::new("C:/x.latte")));
}

#[test]
fn include_existing_instance_binds_params() {
    let target = Template::inline().with_param("old", Value::Int(1));
    let params: Params = [("new".to_string(), Value::Int(2))].into_iter().collect();
    let included =
        include_template(Destination::Template(target), params, &Template::inline()).unwrap();
    assert_eq!(included.param("old"), None);
    assert_eq!(included.param("new"), Some(&Value::Int(2)));
}

#[test]
fn include_without_destination_fails() {
    let err = include_template("".into(), Params::new(), &Template::inline()).unwrap_err();
    assert_eq!(err, RuntimeError::MissingDestination);
}

#[test]
fn extends_parameter_selects_parent_at_render_time() {
    let mut template = Template::new("/a/page.latte").with_param("_extends", "base.latte");
    let state = init_render_state(&mut template, None, "s");
    assert_eq!(state.extends(), &Extends::Target("base.latte".to_string()));
    assert!(template.param("_extends").is_none());

    let mut explicit = Template::new("/a/page.latte").with_param("_extends", "base.latte");
    let state = init_render_state(&mut explicit, Some(false), "s");
    assert_eq!(state.extends(), &Extends::Disabled);
    assert!(!state.is_extending());
}

#[test]
fn no_parent_without_target() {
    let mut template = Template::inline();
    let state = init_render_state(&mut template, Some(true), "s");
    assert!(state.is_extending());
    assert!(state.parent_template(&template, Params::new()).unwrap().is_none());
}

#[test]
fn template_registry_records_files() {
    let mut template = Template::new("/a/page.latte");
    let state = init_render_state(&mut template, None, "abc");
    assert_eq!(state.template_file("abc"), Some(PathBuf::from("/a/page.latte")));
    assert_eq!(state.template_file("nope"), None);
}

#[test]
fn inherited_template_joins_open_cache_scope() {
    let mut child = Template::new("/t/child.latte");
    let mut state = init_render_state(&mut child, Some(true), "c");
    state.create_cache("outer");
    state.set_extends("parent.latte");

    let mut parent = state.parent_template(&child, Params::new()).unwrap().unwrap();
    let _ = init_render_state(&mut parent, None, "p");

    state.create_cache("inner");
    assert_eq!(state.active_caches(), 2);
    let inner = state.end_cache().unwrap();
    assert_eq!(inner.key, "inner");
    let outer = state.end_cache().unwrap();
    assert_eq!(outer.files, vec![Path::new("/t/parent.latte").to_path_buf()]);
    assert_eq!(outer.items, vec!["inner".to_string()]);
    assert!(state.end_cache().is_none());
}

struct Stale(HashSet<&'static str>);

impl Control for Stale {
    fn is_control_invalid(&self, name: &str) -> bool {
        self.0.contains(name)
    }
}

#[test]
fn only_invalid_snippets_are_rendered() {
    let state = RenderState::new();
    state.register_block("_header", "h", text_block("<h1>"));
    state.register_block("_footer", "f", text_block("<footer>"));
    state.register_block("header", "x", text_block("not a snippet"));

    let control = Stale(["header"].into_iter().collect());
    let payload = render_snippets(&control, &state, &Params::new()).unwrap();
    assert_eq!(payload.snippets.len(), 1);
    assert_eq!(payload.snippets["snippet--header"], "<h1>");
}
