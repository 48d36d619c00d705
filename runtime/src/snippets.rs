//! Partial re-rendering of snippet blocks for AJAX requests.

use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::RuntimeError;
use crate::state::{RenderState, call_block};
use crate::value::Params;

static OUTPUT_ALLOWED: AtomicBool = AtomicBool::new(true);

/// `Latte\Runtime::$outputAllowed`: while false, gated template output is
/// suppressed.
pub fn output_allowed() -> bool {
    OUTPUT_ALLOWED.load(Ordering::Relaxed)
}

pub fn set_output_allowed(allowed: bool) {
    OUTPUT_ALLOWED.store(allowed, Ordering::Relaxed);
}

/// The component a template is rendered for.
pub trait Control {
    /// Whether snippet `name` must be sent to the client again.
    fn is_control_invalid(&self, name: &str) -> bool;

    /// Document-unique id of snippet `name`.
    fn snippet_id(&self, name: &str) -> String {
        format!("snippet--{name}")
    }
}

/// Snippet output collected for one AJAX response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    /// Snippet id → rendered markup.
    pub snippets: IndexMap<String, String>,
}

/// Render every registered snippet block (`_name`) that `control` reports
/// invalid, each in isolation.
pub fn render_snippets(
    control: &dyn Control,
    state: &RenderState,
    params: &Params,
) -> Result<Payload, RuntimeError> {
    let mut payload = Payload::default();
    for name in state.block_names() {
        let Some(snippet) = name.strip_prefix('_') else {
            continue;
        };
        if !control.is_control_invalid(snippet) {
            continue;
        }
        let mut out = String::new();
        call_block(state, &name, params, &mut out)?;
        debug!(snippet, bytes = out.len(), "rendered snippet");
        payload.snippets.insert(control.snippet_id(snippet), out);
    }
    Ok(payload)
}
