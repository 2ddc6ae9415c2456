//! # wax-renderer
//!
//! Compile/render facade over a template engine, with Tera as the bundled
//! backend.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use serde_json::json;
//! use wax_core::WaxConfig;
//! use wax_renderer::{Helper, Wax};
//!
//! fn build() -> Result<String, wax_core::WaxError> {
//!     let mut wax = Wax::tera(WaxConfig::at("site"));
//!     wax.partials(["partials/*.tera"])?
//!         .helpers(wax_core::Namespace::from([(
//!             "year".to_string(),
//!             Helper::new(|_| Ok(json!(2024))),
//!         )]))?
//!         .data("data/site.json")?;
//!     wax.render_file("pages/index.tera", &json!({ "title": "Home" }))
//! }
//! ```

pub mod cache;
pub mod context;
pub mod engine;
pub mod error;
pub mod wax;

pub use cache::TemplateCache;
pub use context::{compose, PARENT_KEY};
pub use engine::{tera_identifier, Decorator, Helper, TeraEngine, TeraTemplate, DATA_VARIABLE};
pub use error::RenderError;
pub use wax::{CallOptions, Compiled, TemplateInput, Wax};
