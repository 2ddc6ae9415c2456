//! Error types for wax-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while resolving and registering template sources.
#[derive(Debug, Error)]
pub enum WaxError {
    /// Underlying I/O failure, annotated with the path that caused it.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A glob pattern could not be compiled.
    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Directory traversal failed while expanding a glob.
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A data file could not be parsed in its declared format.
    #[error("failed to parse {format} data at {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    /// The YAML configuration file is malformed.
    #[error("failed to parse config at {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Glob sources were given for a category that has no loader.
    #[error("no loader configured for {category} sources")]
    NoLoader { category: &'static str },

    /// The template engine rejected a compile, registration or render call.
    #[error("template engine error: {0}")]
    Engine(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl WaxError {
    /// Box an engine-specific error into [`WaxError::Engine`].
    pub fn engine<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        WaxError::Engine(Box::new(err))
    }
}

/// Convenience constructor for [`WaxError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> WaxError {
    WaxError::Io {
        path: path.into(),
        source,
    }
}
