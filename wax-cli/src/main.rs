//! wax — render templates with registered partials, helpers and data.
//!
//! # Usage
//!
//! ```text
//! wax render <TEMPLATE> [--partials GLOB]... [--data GLOB]... [--json DATA]
//!            [--config FILE] [--cwd DIR] [--no-escape] [--output FILE]
//! wax keys <GLOB>... [--kind partial|helper|decorator] [--cwd DIR]
//! ```

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{keys::KeysArgs, render::RenderArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "wax",
    version,
    about = "Render templates against globbed partials, helpers and data",
    long_about = None,
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render one template file and print or write the result.
    Render(RenderArgs),

    /// Show the registration key every matched file would get.
    Keys(KeysArgs),
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Render(args) => args.run(),
        Commands::Keys(args) => args.run(),
    }
}
