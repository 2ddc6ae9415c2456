//! Facade configuration.
//!
//! [`WaxConfig`] is immutable once handed to a facade. Per-call tweaks are
//! expressed as [`Overrides`] and applied with [`WaxConfig::with`], which
//! returns a fresh copy.
//!
//! The serializable subset can be read from YAML:
//!
//! ```yaml
//! cwd: ./site
//! bust_cache: false
//! extensions: [".hbs", ".tera"]
//! compile_options:
//!   no_escape: true
//! template_options:
//!   data:
//!     env: production
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{io_err, WaxError};
use crate::keygen::KeyGen;

/// Extensions recognised as template files when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".handlebars", ".hbs", ".html", ".tera"];

// ---------------------------------------------------------------------------
// Compile / render overlays
// ---------------------------------------------------------------------------

/// Options forwarded to the engine's compile step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Disable HTML escaping of interpolated values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_escape: Option<bool>,
    /// Engine-specific keys, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CompileOptions {
    /// Shallow merge: every field set on `other` wins.
    pub fn overlay(&self, other: &CompileOptions) -> CompileOptions {
        let mut extra = self.extra.clone();
        extra.extend(other.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        CompileOptions {
            no_escape: other.no_escape.or(self.no_escape),
            extra,
        }
    }

    pub fn escapes(&self) -> bool {
        !self.no_escape.unwrap_or(false)
    }
}

/// Options applied on every render call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Private render data (`global`, `local`, and anything else the caller adds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RenderOptions {
    /// Shallow merge: `other.data` replaces `self.data` wholesale when present.
    pub fn overlay(&self, other: &RenderOptions) -> RenderOptions {
        let mut extra = self.extra.clone();
        extra.extend(other.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        RenderOptions {
            data: other.data.clone().or_else(|| self.data.clone()),
            extra,
        }
    }

    /// Builder-style setter for one entry of `data`.
    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }
}

// ---------------------------------------------------------------------------
// WaxConfig
// ---------------------------------------------------------------------------

/// Recognised facade options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaxConfig {
    /// Directory relative glob patterns and template paths are resolved against.
    pub cwd: PathBuf,
    /// Recompile templates on every `render_file` call instead of reusing them.
    pub bust_cache: bool,
    /// Extensions accepted when expanding partial globs. Empty accepts all.
    pub extensions: Vec<String>,
    pub compile_options: CompileOptions,
    pub template_options: RenderOptions,

    /// `None` names partials by their file stem.
    #[serde(skip)]
    pub parse_partial_name: Option<KeyGen>,
    #[serde(skip, default = "default_helper_keygen")]
    pub parse_helper_name: Option<KeyGen>,
    #[serde(skip, default = "default_decorator_keygen")]
    pub parse_decorator_name: Option<KeyGen>,
    /// `None` means data leaves are skipped; data sources must be namespaces.
    #[serde(skip)]
    pub parse_data_name: Option<KeyGen>,
}

fn default_helper_keygen() -> Option<KeyGen> {
    Some(KeyGen::helper())
}

fn default_decorator_keygen() -> Option<KeyGen> {
    Some(KeyGen::decorator())
}

impl Default for WaxConfig {
    fn default() -> Self {
        WaxConfig {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            bust_cache: true,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            compile_options: CompileOptions::default(),
            template_options: RenderOptions::default(),
            parse_partial_name: None,
            parse_helper_name: default_helper_keygen(),
            parse_decorator_name: default_decorator_keygen(),
            parse_data_name: None,
        }
    }
}

impl WaxConfig {
    /// Default configuration rooted at `cwd`.
    pub fn at(cwd: impl Into<PathBuf>) -> Self {
        WaxConfig {
            cwd: cwd.into(),
            ..WaxConfig::default()
        }
    }

    /// Read the serializable options from a YAML file.
    ///
    /// A relative `cwd` in the file is resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, WaxError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let mut config: WaxConfig = serde_yaml::from_str(&contents).map_err(|e| {
            WaxError::Config {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
        if config.cwd.is_relative() {
            let dir = path.parent().unwrap_or(Path::new("."));
            config.cwd = dir.join(&config.cwd);
        }
        Ok(config)
    }

    /// A copy of this configuration with `overrides` applied.
    pub fn with(&self, overrides: &Overrides) -> WaxConfig {
        let mut next = self.clone();
        if let Some(cwd) = &overrides.cwd {
            next.cwd = cwd.clone();
        }
        if let Some(bust) = overrides.bust_cache {
            next.bust_cache = bust;
        }
        if let Some(extensions) = &overrides.extensions {
            next.extensions = extensions.clone();
        }
        if let Some(opts) = &overrides.compile_options {
            next.compile_options = self.compile_options.overlay(opts);
        }
        if let Some(opts) = &overrides.template_options {
            next.template_options = self.template_options.overlay(opts);
        }
        if let Some(k) = &overrides.parse_partial_name {
            next.parse_partial_name = Some(k.clone());
        }
        if let Some(k) = &overrides.parse_helper_name {
            next.parse_helper_name = Some(k.clone());
        }
        if let Some(k) = &overrides.parse_decorator_name {
            next.parse_decorator_name = Some(k.clone());
        }
        if let Some(k) = &overrides.parse_data_name {
            next.parse_data_name = Some(k.clone());
        }
        next
    }

    /// `path` resolved against `cwd` unless already absolute.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Whether `path` carries one of the allowed extensions.
    pub fn accepts_extension(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.extensions
            .iter()
            .any(|ext| name.ends_with(&ext.to_lowercase()))
    }

    /// Builder: replace `cwd`.
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// Builder: replace `bust_cache`.
    pub fn bust_cache(mut self, bust: bool) -> Self {
        self.bust_cache = bust;
        self
    }

    /// Builder: replace `compile_options`.
    pub fn compile_options(mut self, opts: CompileOptions) -> Self {
        self.compile_options = opts;
        self
    }

    /// Builder: replace `template_options`.
    pub fn template_options(mut self, opts: RenderOptions) -> Self {
        self.template_options = opts;
        self
    }

    /// Builder: name data leaves with `keygen`.
    pub fn parse_data_name(mut self, keygen: KeyGen) -> Self {
        self.parse_data_name = Some(keygen);
        self
    }

    /// Builder: name partials with `keygen` instead of their file stem.
    pub fn parse_partial_name(mut self, keygen: KeyGen) -> Self {
        self.parse_partial_name = Some(keygen);
        self
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Per-call changes layered over a [`WaxConfig`]. Unset fields inherit.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub cwd: Option<PathBuf>,
    pub bust_cache: Option<bool>,
    pub extensions: Option<Vec<String>>,
    pub compile_options: Option<CompileOptions>,
    pub template_options: Option<RenderOptions>,
    pub parse_partial_name: Option<KeyGen>,
    pub parse_helper_name: Option<KeyGen>,
    pub parse_decorator_name: Option<KeyGen>,
    pub parse_data_name: Option<KeyGen>,
}

impl Overrides {
    pub fn new() -> Self {
        Overrides::default()
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    pub fn parse_partial_name(mut self, keygen: KeyGen) -> Self {
        self.parse_partial_name = Some(keygen);
        self
    }

    pub fn parse_helper_name(mut self, keygen: KeyGen) -> Self {
        self.parse_helper_name = Some(keygen);
        self
    }

    pub fn parse_decorator_name(mut self, keygen: KeyGen) -> Self {
        self.parse_decorator_name = Some(keygen);
        self
    }

    pub fn parse_data_name(mut self, keygen: KeyGen) -> Self {
        self.parse_data_name = Some(keygen);
        self
    }
}
