//! `wax keys` — preview registration names.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;

use wax_core::{glob, KeyGen};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum KeyKind {
    #[default]
    Partial,
    Helper,
    Decorator,
}

impl KeyKind {
    fn keygen(self) -> KeyGen {
        match self {
            KeyKind::Partial => KeyGen::partial(),
            KeyKind::Helper => KeyGen::helper(),
            KeyKind::Decorator => KeyGen::decorator(),
        }
    }
}

/// Arguments for `wax keys`.
#[derive(Args, Debug)]
pub struct KeysArgs {
    /// Glob patterns; prefix with `!` to exclude.
    #[arg(required = true, value_name = "GLOB")]
    pub patterns: Vec<String>,

    /// Naming scheme to apply.
    #[arg(long, value_enum, default_value_t = KeyKind::Partial)]
    pub kind: KeyKind,

    /// Directory patterns resolve against.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}

impl KeysArgs {
    pub fn run(self) -> Result<()> {
        let cwd = match self.cwd {
            Some(dir) => dir,
            None => std::env::current_dir().context("could not determine working directory")?,
        };
        let keygen = self.kind.keygen();

        let matches = glob::expand(&self.patterns, &cwd)?;
        if matches.is_empty() {
            eprintln!("{}", "no files matched".yellow());
            return Ok(());
        }
        for found in matches {
            let key = keygen.generate(&found.path, &found.base)?;
            let shown = found.path.strip_prefix(&cwd).unwrap_or(&found.path);
            println!("{}\t{}", key.bold(), shown.display());
        }
        Ok(())
    }
}
