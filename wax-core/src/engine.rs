//! The template-engine boundary.
//!
//! Everything engine-specific (template syntax, how helpers are called, how
//! partials are looked up) lives behind this trait; wax only drives it.

use serde_json::Value;

use crate::config::{CompileOptions, RenderOptions};
use crate::module::Namespace;

/// A template engine wax can register fragments into and render with.
pub trait Engine {
    /// A compiled template.
    type Template;
    /// A function callable from template expressions.
    type Helper;
    /// A function that alters rendered output.
    type Decorator;
    type Error: std::error::Error + Send + Sync + 'static;

    fn compile(
        &mut self,
        source: &str,
        options: &CompileOptions,
    ) -> Result<Self::Template, Self::Error>;

    /// Register every partial in one call.
    fn register_partials(
        &mut self,
        partials: Namespace<Self::Template>,
    ) -> Result<(), Self::Error>;

    fn register_helpers(&mut self, helpers: Namespace<Self::Helper>) -> Result<(), Self::Error>;

    fn register_decorators(
        &mut self,
        decorators: Namespace<Self::Decorator>,
    ) -> Result<(), Self::Error>;

    /// Called when a compiled template is replaced and nothing will render it
    /// again. Engines that keep no per-template state can ignore it.
    fn release(&mut self, _template: &Self::Template) {}

    /// Render `template` with top-level `data` and private `options`.
    fn render(
        &self,
        template: &Self::Template,
        data: &Value,
        options: &RenderOptions,
    ) -> Result<String, Self::Error>;
}
