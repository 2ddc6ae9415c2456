//! Loaders turn a matched file into a [`Module`].

use std::path::Path;

use serde_json::Value;

use crate::error::{io_err, WaxError};
use crate::module::{Module, Namespace};

/// Reads one file and decides its module shape.
pub trait Loader<E, T> {
    fn load(&self, path: &Path) -> Result<Module<E, T>, WaxError>;
}

impl<E, T, F> Loader<E, T> for F
where
    F: Fn(&Path) -> Result<Module<E, T>, WaxError>,
{
    fn load(&self, path: &Path) -> Result<Module<E, T>, WaxError> {
        self(path)
    }
}

/// Loads data files by extension.
///
/// | Extension       | Result                                   |
/// |-----------------|------------------------------------------|
/// | `.json`         | parsed with `serde_json`                 |
/// | `.yaml`, `.yml` | parsed with `serde_yaml`                 |
/// | `.toml`         | parsed with `toml`                       |
/// | anything else   | file contents as a string value          |
///
/// Parsed objects become namespaces; any other parsed value is a leaf, and
/// `null` (a YAML `~` document, say) is treated as nothing to register.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataLoader;

impl<E> Loader<E, Value> for DataLoader {
    fn load(&self, path: &Path) -> Result<Module<E, Value>, WaxError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let value = match ext.as_deref() {
            Some("json") => serde_json::from_str(&contents).map_err(|e| parse_err(path, "JSON", e))?,
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&contents).map_err(|e| parse_err(path, "YAML", e))?
            }
            Some("toml") => {
                let table: toml::Table =
                    toml::from_str(&contents).map_err(|e| parse_err(path, "TOML", e))?;
                serde_json::to_value(table).map_err(|e| parse_err(path, "TOML", e))?
            }
            _ => Value::String(contents),
        };
        Ok(into_module(value))
    }
}

/// Tag a loaded JSON value with its module shape.
///
/// Falsy values (`null`, `false`, `0`, `""`) contribute nothing.
pub fn into_module<E>(value: Value) -> Module<E, Value> {
    match value {
        Value::Null | Value::Bool(false) => Module::Empty,
        Value::String(s) if s.is_empty() => Module::Empty,
        Value::Number(n) if n.as_f64() == Some(0.0) => Module::Empty,
        Value::Object(map) => Module::Namespace(map.into_iter().collect::<Namespace<Value>>()),
        other => Module::Value(other),
    }
}

fn parse_err(path: &Path, format: &'static str, err: impl std::fmt::Display) -> WaxError {
    WaxError::Parse {
        path: path.to_path_buf(),
        format,
        message: err.to_string(),
    }
}
