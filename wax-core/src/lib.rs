//! wax core library — naming, module shapes, resolution and configuration.
//!
//! - [`keygen`] — registration names derived from file paths
//! - [`module`] — [`Module`] / [`Source`] shapes and [`FileRecord`]
//! - [`reduce`] — the fold step normalizing modules into a [`Namespace`]
//! - [`resolve`] — [`Resolver`], dispatching over every source shape
//! - [`glob`] / [`loader`] — file discovery and loading
//! - [`config`] — [`WaxConfig`] and per-call [`Overrides`]
//! - [`engine`] — the [`Engine`] trait template backends implement

pub mod config;
pub mod engine;
pub mod error;
pub mod glob;
pub mod keygen;
pub mod loader;
pub mod module;
pub mod reduce;
pub mod resolve;

pub use config::{CompileOptions, Overrides, RenderOptions, WaxConfig};
pub use engine::Engine;
pub use error::WaxError;
pub use keygen::KeyGen;
pub use loader::{DataLoader, Loader};
pub use module::{FileRecord, Module, Namespace, Source};
pub use reduce::{Category, ReduceContext, Reducer};
pub use resolve::Resolver;
