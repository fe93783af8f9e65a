//! cfgen CLI: compile configuration schemas and inspect the artifact cache.
//!
//! Provides `cfgen compile` to (re)generate artifacts according to the
//! configured strategy, `cfgen render` to print the generated accessor
//! source, `cfgen show` to print a subject's default values, `cfgen registry`
//! to list registered artifacts and `cfgen gc` to delete orphaned files.

#![warn(missing_docs)]

mod compile;
mod gc;
mod project;
mod registry;
mod render;
mod show;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// cfgen: typed configuration accessors compiled from declarative schemas.
#[derive(Parser, Debug)]
#[command(name = "cfgen", version, about = "Configuration schema compiler")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `cfgen.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile subjects into cached artifacts.
    Compile(CompileArgs),
    /// Print the Rust accessor source generated for a subject.
    Render(RenderArgs),
    /// Print a fresh instance of a subject as JSON.
    Show(ShowArgs),
    /// List registered artifacts.
    Registry(RegistryArgs),
    /// Delete artifact files no registry entry refers to.
    Gc,
}

/// Arguments for the `cfgen compile` subcommand.
#[derive(Parser, Debug)]
pub struct CompileArgs {
    /// Canonical subject names (e.g., `app::db::Settings`).
    #[arg(required = true, num_args = 1..)]
    pub subjects: Vec<String>,
}

/// Arguments for the `cfgen render` subcommand.
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Canonical subject name.
    pub subject: String,

    /// Write the source to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for the `cfgen show` subcommand.
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Canonical subject name.
    pub subject: String,

    /// Print JSON on a single line.
    #[arg(long)]
    pub compact: bool,
}

/// Arguments for the `cfgen registry` subcommand.
#[derive(Parser, Debug)]
pub struct RegistryArgs {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    init_tracing(&global);

    let result = match cli.command {
        Command::Compile(ref args) => compile::run(args, &global),
        Command::Render(ref args) => render::run(args, &global),
        Command::Show(ref args) => show::run(args, &global),
        Command::Registry(ref args) => registry::run(args, &global),
        Command::Gc => gc::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Log level implied by the flags; `RUST_LOG` overrides it.
fn default_filter(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    }
}

fn init_tracing(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(global)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
