//! Key generation — stable registration names derived from file paths.
//!
//! | File (relative to base)   | partial          | helper / decorator |
//! |---------------------------|------------------|--------------------|
//! | `header.hbs`              | `header`         | `header`           |
//! | `site/nav bar.hbs`        | `site/nav-bar`   | `site-nav-bar`     |
//! | `format/date.time.hbs`    | `format/date.time` | `format-date-time` |
//!
//! Both paths are canonicalized first, so symlinked bases and files resolve to
//! the same names as their targets.

use std::fmt;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::{io_err, WaxError};

const PATH_SEPARATOR: char = '/';
const WORD_SEPARATOR: &str = "-";

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("static regex"));

// ---------------------------------------------------------------------------
// KeyGen
// ---------------------------------------------------------------------------

type KeyGenFn = dyn Fn(&Path, &Path) -> Result<String, WaxError> + Send + Sync;

/// A name generator: `(file path, base directory) -> name`.
///
/// Cheap to clone; the configured generator is shared by every resolution pass.
#[derive(Clone)]
pub struct KeyGen(Arc<KeyGenFn>);

impl KeyGen {
    /// Wrap an arbitrary naming function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Path, &Path) -> Result<String, WaxError> + Send + Sync + 'static,
    {
        KeyGen(Arc::new(f))
    }

    /// Path-structured names (`site/nav-bar`).
    pub fn partial() -> Self {
        KeyGen::new(partial_name)
    }

    /// Flat names (`site-nav-bar`).
    pub fn helper() -> Self {
        KeyGen::new(helper_name)
    }

    /// Same shape as [`KeyGen::helper`].
    pub fn decorator() -> Self {
        KeyGen::new(decorator_name)
    }

    pub fn generate(&self, path: &Path, base: &Path) -> Result<String, WaxError> {
        (self.0)(path, base)
    }
}

impl fmt::Debug for KeyGen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyGen(..)")
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Name of `path` relative to `base`, separators kept, extension dropped.
///
/// Fails with [`WaxError::Io`] if either path does not exist.
pub fn partial_name(path: &Path, base: &Path) -> Result<String, WaxError> {
    let full = std::fs::canonicalize(path).map_err(|e| io_err(path, e))?;
    let base_dir = std::fs::canonicalize(base).map_err(|e| io_err(base, e))?;
    Ok(short_name(
        &full.to_string_lossy(),
        &base_dir.to_string_lossy(),
    ))
}

/// [`partial_name`] with every non-word run (separators included) collapsed to `-`.
pub fn helper_name(path: &Path, base: &Path) -> Result<String, WaxError> {
    partial_name(path, base).map(|name| flatten(&name))
}

pub fn decorator_name(path: &Path, base: &Path) -> Result<String, WaxError> {
    helper_name(path, base)
}

// ---------------------------------------------------------------------------
// String-level algorithm (no I/O)
// ---------------------------------------------------------------------------

/// Core naming algorithm over already-resolved path strings.
pub fn short_name(full: &str, base: &str) -> String {
    let full = normalize_separators(full);
    let base = format!("{}{}", normalize_separators(base), PATH_SEPARATOR);

    let prefix = Regex::new(&format!("(?i)^{}", regex::escape(&base)))
        .expect("escaped literal is a valid regex");
    let short = prefix.replace(&full, "");

    let ext = extname(&short);
    let stem = &short[..short.len() - ext.len()];
    WHITESPACE.replace_all(stem, WORD_SEPARATOR).into_owned()
}

/// Collapse non-word runs into single `-` separators.
pub fn flatten(name: &str) -> String {
    NON_WORD.replace_all(name, WORD_SEPARATOR).into_owned()
}

fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Extension of the final component, dot included. Dotfiles have none.
fn extname(path: &str) -> &str {
    let file = path.rsplit(PATH_SEPARATOR).next().unwrap_or(path);
    match file.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &file[idx..],
    }
}
