use std::cell::RefCell;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;

use crate::error::RuntimeError;
use crate::template::{Destination, Template, include_template};
use crate::value::Params;

/// A compiled block body.
///
/// Called with the render state, the block's parameters, its own position in
/// the per-name chain (`$_b` in generated code) and the output buffer.
pub type BlockFn = Rc<dyn Fn(&RenderState, &Params, usize, &mut String) -> Result<(), RuntimeError>>;

#[derive(Clone)]
struct BlockUnit {
    ident: String,
    func: BlockFn,
}

/// One open `{cache}` scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheScope {
    pub key: String,
    /// Template files rendered while the scope was open.
    pub files: Vec<PathBuf>,
    /// Keys of nested scopes saved into this one.
    pub items: Vec<String>,
}

/// Registries shared by every template in one inheritance chain.
#[derive(Default)]
struct Registries {
    /// Block name → implementations, most-derived first.
    blocks: IndexMap<String, Vec<BlockUnit>>,
    /// Instance salt → template file.
    templates: IndexMap<String, Option<PathBuf>>,
    caches: Vec<CacheScope>,
}

/// Parent template selection of one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extends {
    /// No parent; the template renders itself.
    Disabled,
    /// `{extends}` was compiled in but has not run yet.
    Declared,
    Target(String),
}

/// The per-render state holder (`$_l`).
///
/// Cloning is cheap and the clone shares the registries; `extends` stays
/// local to the template that owns the state.
#[derive(Clone)]
pub struct RenderState {
    shared: Rc<RefCell<Registries>>,
    extends: Extends,
}

impl RenderState {
    pub fn new() -> Self {
        RenderState {
            shared: Rc::new(RefCell::new(Registries::default())),
            extends: Extends::Disabled,
        }
    }

    pub fn extends(&self) -> &Extends {
        &self.extends
    }

    /// `$_l->extends = target`
    pub fn set_extends(&mut self, target: impl Into<String>) {
        self.extends = Extends::Target(target.into());
    }

    /// Whether local top-level output is discarded in favour of a parent.
    pub fn is_extending(&self) -> bool {
        self.extends != Extends::Disabled
    }

    pub fn shares_registries_with(&self, other: &RenderState) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    /// Append an implementation of block `name`. A unit whose `ident` is
    /// already registered for `name` is ignored; returns whether it was added.
    pub fn register_block(&self, name: &str, ident: &str, func: BlockFn) -> bool {
        let mut shared = self.shared.borrow_mut();
        let chain = shared.blocks.entry(name.to_string()).or_default();
        if chain.iter().any(|unit| unit.ident == ident) {
            return false;
        }
        chain.push(BlockUnit {
            ident: ident.to_string(),
            func,
        });
        true
    }

    /// Registered block names, in first-registration order.
    pub fn block_names(&self) -> Vec<String> {
        self.shared.borrow().blocks.keys().cloned().collect()
    }

    /// Number of implementations registered for `name`.
    pub fn chain_len(&self, name: &str) -> usize {
        self.shared.borrow().blocks.get(name).map_or(0, Vec::len)
    }

    /// File of the template registered under `salt`.
    pub fn template_file(&self, salt: &str) -> Option<PathBuf> {
        self.shared.borrow().templates.get(salt).cloned().flatten()
    }

    /// `{cache}`: open a scope.
    pub fn create_cache(&self, key: impl Into<String>) {
        self.shared.borrow_mut().caches.push(CacheScope {
            key: key.into(),
            ..CacheScope::default()
        });
    }

    /// `{/cache}`: close the innermost scope and record it in its parent.
    pub fn end_cache(&self) -> Option<CacheScope> {
        let mut shared = self.shared.borrow_mut();
        let scope = shared.caches.pop()?;
        if let Some(parent) = shared.caches.last_mut() {
            parent.items.push(scope.key.clone());
        }
        Some(scope)
    }

    pub fn active_caches(&self) -> usize {
        self.shared.borrow().caches.len()
    }

    /// The parent template this one extends, sharing this state's
    /// registries. `None` when the template does not extend anything.
    pub fn parent_template(
        &self,
        current: &Template,
        params: Params,
    ) -> Result<Option<Template>, RuntimeError> {
        let Extends::Target(target) = &self.extends else {
            return Ok(None);
        };
        let mut parent = include_template(Destination::Path(target.clone()), params, current)?;
        parent.inherit_state(self);
        Ok(Some(parent))
    }

    fn unit(&self, name: &str, position: usize) -> Option<BlockUnit> {
        self.shared.borrow().blocks.get(name)?.get(position).cloned()
    }
}

impl Default for RenderState {
    fn default() -> Self {
        RenderState::new()
    }
}

impl fmt::Debug for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.borrow();
        f.debug_struct("RenderState")
            .field("blocks", &shared.blocks.keys().collect::<Vec<_>>())
            .field("templates", &shared.templates)
            .field("caches", &shared.caches)
            .field("extends", &self.extends)
            .finish()
    }
}

/// Build the state holder for `template`.
///
/// A template rendered as the parent of another reuses the child's
/// registries. Without an explicit `extends` flag, an `_extends` parameter
/// selects the parent at render time.
pub fn init_render_state(template: &mut Template, extends: Option<bool>, salt: &str) -> RenderState {
    let fallback = template.params_mut().shift_remove("_extends");
    let mut state = match template.take_inherited() {
        Some(inherited) => RenderState {
            shared: inherited.shared,
            extends: Extends::Disabled,
        },
        None => RenderState::new(),
    };
    state.extends = match extends {
        Some(true) => Extends::Declared,
        Some(false) => Extends::Disabled,
        None => match fallback {
            Some(value) if !value.is_empty() => Extends::Target(value.to_string()),
            _ => Extends::Disabled,
        },
    };

    {
        let mut shared = state.shared.borrow_mut();
        shared
            .templates
            .insert(salt.to_string(), template.file().map(PathBuf::from));
        if let (Some(scope), Some(file)) = (shared.caches.last_mut(), template.file()) {
            scope.files.push(file.to_path_buf());
        }
    }
    trace!(salt, extends = ?state.extends, "render state initialized");
    state
}

/// Run the most-derived implementation of block `name`.
pub fn call_block(
    state: &RenderState,
    name: &str,
    params: &Params,
    out: &mut String,
) -> Result<(), RuntimeError> {
    let unit = state
        .unit(name, 0)
        .ok_or_else(|| RuntimeError::UndefinedBlock(name.to_string()))?;
    trace!(block = name, ident = %unit.ident, "calling block");
    (unit.func)(state, params, 0, out)
}

/// Run the implementation of block `name` that follows `position`.
pub fn call_parent_block(
    state: &RenderState,
    name: &str,
    position: usize,
    params: &Params,
    out: &mut String,
) -> Result<(), RuntimeError> {
    let parent = position + 1;
    let unit = state
        .unit(name, parent)
        .ok_or_else(|| RuntimeError::UndefinedParentBlock(name.to_string()))?;
    trace!(block = name, ident = %unit.ident, position = parent, "calling parent block");
    (unit.func)(state, params, parent, out)
}
