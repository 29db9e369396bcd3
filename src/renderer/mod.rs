//! Template engine binding.
//!
//! - `interface`: the [`TemplateRenderer`] trait the rest of the crate renders through
//! - `minijinja`: the MiniJinja implementation
//! - `functions` and `filters`: the helper library registered on the engine
//! - `references`: unset variable detection

pub mod filters;
pub mod functions;
pub mod interface;
pub mod minijinja;
pub mod references;

pub use interface::TemplateRenderer;
pub use self::minijinja::MiniJinjaRenderer;
pub use references::MissingKey;
