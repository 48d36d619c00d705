use std::path::{Path, PathBuf};

use crate::error::RuntimeError;
use crate::state::RenderState;
use crate::value::{Params, Value};

/// A template instance: source file plus bound parameters.
#[derive(Debug, Clone, Default)]
pub struct Template {
    file: Option<PathBuf>,
    params: Params,
    /// State handed over by a child template that extends this one.
    inherited: Option<RenderState>,
}

impl Template {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Template {
            file: Some(file.into()),
            ..Template::default()
        }
    }

    /// A template without a backing file.
    pub fn inline() -> Self {
        Template::default()
    }

    pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Render this template as the parent of the one owning `state`.
    pub fn inherit_state(&mut self, state: &RenderState) {
        self.inherited = Some(state.clone());
    }

    pub fn has_inherited_state(&self) -> bool {
        self.inherited.is_some()
    }

    pub(crate) fn take_inherited(&mut self) -> Option<RenderState> {
        self.inherited.take()
    }
}

/// What `{include}` points at.
#[derive(Debug, Clone)]
pub enum Destination {
    Template(Template),
    Path(String),
}

impl From<&str> for Destination {
    fn from(path: &str) -> Self {
        Destination::Path(path.to_string())
    }
}

impl From<Template> for Destination {
    fn from(template: Template) -> Self {
        Destination::Template(template)
    }
}

/// Resolve a sub-template and bind `params` to it.
///
/// A path is taken relative to the directory of `current`'s file unless it
/// starts with `/` or a drive letter.
pub fn include_template(
    destination: Destination,
    params: Params,
    current: &Template,
) -> Result<Template, RuntimeError> {
    let mut template = match destination {
        Destination::Template(template) => template,
        Destination::Path(path) if path.is_empty() => return Err(RuntimeError::MissingDestination),
        Destination::Path(path) => {
            let file = match current.file() {
                Some(file) if !is_absolute(&path) => file
                    .parent()
                    .unwrap_or_else(|| Path::new(""))
                    .join(&path),
                _ => PathBuf::from(path),
            };
            Template {
                file: Some(file),
                ..Template::default()
            }
        }
    };
    template.set_params(params);
    Ok(template)
}

fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || path.as_bytes().get(1) == Some(&b':')
}
