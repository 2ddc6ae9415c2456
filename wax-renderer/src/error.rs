//! Error types for the Tera backend.

use thiserror::Error;

/// All errors the Tera engine can report.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Tried to render a template the engine never compiled.
    #[error("unknown template '{0}'")]
    UnknownTemplate(String),

    /// Helper or decorator name with no Tera identifier form.
    #[error("'{0}' cannot be used as a Tera function or filter name")]
    InvalidName(String),
}
