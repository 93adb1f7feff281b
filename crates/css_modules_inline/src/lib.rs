//! Inline CSS module class names into JavaScript.
//!
//! `import * as css from './button.css'` and `require('./button.css')` are replaced
//! with object literals mapping each local class name to its generated name, so the
//! compiled output needs no runtime stylesheet loader. Stylesheets are compiled with
//! lightningcss and the generated objects map back to the stylesheet in source maps.

pub use compile::{compile, CompileError, CompileOutput};
pub use diagnostic::{InlineDiagnostic, InlineError};
pub use inliner::CssModulesInliner;
pub use options::CssModulesInlineOptions;
pub use registration::register_loader;

mod compile;
mod diagnostic;
mod inliner;
pub mod options;
pub mod path_resolver;
mod provenance;
mod registration;
mod replacement;
pub mod stylesheet;
