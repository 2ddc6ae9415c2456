//! Module shapes — what a loaded file (or an in-memory source) contributes.
//!
//! A loader decides the shape once, when it reads the file; the reducer only
//! pattern-matches on the tag.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::config::WaxConfig;

/// Flat name → value mapping, ordered for deterministic registration.
pub type Namespace<T> = BTreeMap<String, T>;

/// A callback invoked with the engine and the active configuration.
///
/// Returning `Some` contributes a namespace; `None` means the callback
/// registered whatever it needed on the engine by itself.
pub type RegisterFn<E, T> = Box<dyn FnOnce(&mut E, &WaxConfig) -> Option<Namespace<T>>>;

/// The value exported by one file.
pub enum Module<E, T> {
    /// Nothing to register.
    Empty,
    /// A single leaf value, named by the category's key generator.
    Value(T),
    /// Pre-named values merged as-is.
    Namespace(Namespace<T>),
    /// A self-registration hook.
    Register(RegisterFn<E, T>),
}

impl<E, T> Module<E, T> {
    pub fn register<F>(f: F) -> Self
    where
        F: FnOnce(&mut E, &WaxConfig) -> Option<Namespace<T>> + 'static,
    {
        Module::Register(Box::new(f))
    }
}

impl<E, T: fmt::Debug> fmt::Debug for Module<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Module::Empty => f.write_str("Empty"),
            Module::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Module::Namespace(ns) => f.debug_tuple("Namespace").field(ns).finish(),
            Module::Register(_) => f.write_str("Register(..)"),
        }
    }
}

impl<E, T> From<Namespace<T>> for Module<E, T> {
    fn from(ns: Namespace<T>) -> Self {
        Module::Namespace(ns)
    }
}

/// One discovered source file and what it exports.
#[derive(Debug)]
pub struct FileRecord<E, T> {
    /// Path of the file as matched.
    pub path: PathBuf,
    /// Directory names are generated relative to.
    pub base: PathBuf,
    pub module: Module<E, T>,
}

impl<E, T> FileRecord<E, T> {
    pub fn new(path: impl Into<PathBuf>, base: impl Into<PathBuf>, module: Module<E, T>) -> Self {
        FileRecord {
            path: path.into(),
            base: base.into(),
            module,
        }
    }

    /// A record with no backing file, used to reduce in-memory sources.
    pub fn synthetic(module: Module<E, T>) -> Self {
        FileRecord::new(PathBuf::new(), PathBuf::new(), module)
    }
}

/// Anything that can be resolved into a [`Namespace`].
pub enum Source<E, T> {
    /// Resolves to an empty namespace without touching the filesystem.
    Empty,
    /// Called once with the engine; see [`RegisterFn`].
    Factory(RegisterFn<E, T>),
    /// An in-memory module, reduced as a single synthetic record.
    Module(Module<E, T>),
    /// Glob patterns relative to the configured `cwd`.
    Patterns(Vec<String>),
}

impl<E, T> Source<E, T> {
    pub fn factory<F>(f: F) -> Self
    where
        F: FnOnce(&mut E, &WaxConfig) -> Option<Namespace<T>> + 'static,
    {
        Source::Factory(Box::new(f))
    }

    pub fn patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Source::Patterns(patterns.into_iter().map(Into::into).collect())
    }
}

impl<E, T> Default for Source<E, T> {
    fn default() -> Self {
        Source::Empty
    }
}

impl<E, T> From<&str> for Source<E, T> {
    fn from(pattern: &str) -> Self {
        if pattern.is_empty() {
            Source::Empty
        } else {
            Source::Patterns(vec![pattern.to_string()])
        }
    }
}

impl<E, T> From<String> for Source<E, T> {
    fn from(pattern: String) -> Self {
        Source::from(pattern.as_str())
    }
}

impl<E, T> From<Vec<String>> for Source<E, T> {
    fn from(patterns: Vec<String>) -> Self {
        if patterns.is_empty() {
            Source::Empty
        } else {
            Source::Patterns(patterns)
        }
    }
}

impl<E, T> From<Namespace<T>> for Source<E, T> {
    fn from(ns: Namespace<T>) -> Self {
        Source::Module(Module::Namespace(ns))
    }
}

impl<E, T> From<Module<E, T>> for Source<E, T> {
    fn from(module: Module<E, T>) -> Self {
        Source::Module(module)
    }
}
