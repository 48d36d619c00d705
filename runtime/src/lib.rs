//! Runtime support for compiled Latte templates.
//!
//! Compiled templates register their named blocks in a [`RenderState`] and
//! dispatch through it: [`call_block`] runs the most-derived implementation
//! of a block, [`call_parent_block`] the next one along the inheritance
//! chain. A child template hands its state to its parent with
//! [`RenderState::parent_template`], so blocks declared in the leaf stay
//! visible to the root.

pub mod error;
pub mod escape;
pub mod snippets;
pub mod state;
pub mod template;
pub mod value;

pub use error::RuntimeError;
pub use snippets::{Control, Payload, output_allowed, render_snippets, set_output_allowed};
pub use state::{
    BlockFn, CacheScope, Extends, RenderState, call_block, call_parent_block, init_render_state,
};
pub use template::{Destination, Template, include_template};
pub use value::{Params, Value};
