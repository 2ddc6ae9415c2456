//! `wax render` — render one template file.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::Value;

use wax_core::{CompileOptions, WaxConfig};
use wax_renderer::Wax;

/// Arguments for `wax render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Template file, relative to the working directory.
    pub template: PathBuf,

    /// Glob of partial templates to register (repeatable).
    #[arg(long = "partials", value_name = "GLOB")]
    pub partials: Vec<String>,

    /// Glob of JSON/YAML/TOML files merged into the shared context (repeatable).
    #[arg(long = "data", value_name = "GLOB")]
    pub data: Vec<String>,

    /// Inline JSON object passed as per-call render data.
    #[arg(long, value_name = "DATA")]
    pub json: Option<String>,

    /// YAML configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory globs and the template path resolve against.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Disable HTML escaping.
    #[arg(long)]
    pub no_escape: bool,

    /// Write output here instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl RenderArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config()?;
        let data: Value = match &self.json {
            Some(raw) => serde_json::from_str(raw).context("--json is not valid JSON")?,
            None => Value::Object(Default::default()),
        };

        let mut wax = Wax::tera(config);
        wax.partials(self.partials.iter().cloned())
            .context("failed to register partials")?
            .data(self.data.clone())
            .context("failed to load data")?;
        tracing::debug!(
            partials = self.partials.len(),
            context_keys = wax.context().len(),
            "registered"
        );

        let out = wax
            .render_file(&self.template, &data)
            .with_context(|| format!("failed to render {}", self.template.display()))?;

        match &self.output {
            Some(path) => {
                fs::write(path, &out)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                eprintln!("{} {}", "✓ wrote".green(), path.display());
            }
            None => print!("{out}"),
        }
        Ok(())
    }

    fn config(&self) -> Result<WaxConfig> {
        let mut config = match &self.config {
            Some(path) => WaxConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => WaxConfig::default(),
        };
        if let Some(cwd) = &self.cwd {
            config = config.cwd(cwd.clone());
        }
        if self.no_escape {
            let escape_off = CompileOptions {
                no_escape: Some(true),
                ..Default::default()
            };
            let merged = config.compile_options.overlay(&escape_off);
            config = config.compile_options(merged);
        }
        Ok(config)
    }
}
