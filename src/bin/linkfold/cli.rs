//! CLI definitions using clap.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

/// linkfold - consolidate diamond dependencies and plan link lines
#[derive(Parser)]
#[command(name = "linkfold")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Consolidate the graph and print the link plan
    Plan(PlanArgs),

    /// Report diamonds without rewriting the graph
    Check(CheckArgs),

    /// Explain which link boundaries embed a package
    Explain(ExplainArgs),
}

impl Commands {
    /// The graph file the command reads.
    pub fn graph_path(&self) -> &Path {
        match self {
            Commands::Plan(args) => &args.graph,
            Commands::Check(args) => &args.graph,
            Commands::Explain(args) => &args.graph,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Path to the graph file
    pub graph: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Fallback ancestor package (`name` or `name@version`)
    #[arg(long)]
    pub foundation: Option<String>,

    /// Target OS for library naming (linux, macos, windows)
    #[arg(long)]
    pub os: Option<String>,

    /// Root of the build output tree
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Path to the graph file
    pub graph: PathBuf,
}

#[derive(Args)]
pub struct ExplainArgs {
    /// Path to the graph file
    pub graph: PathBuf,

    /// Package to explain (`name` or `name@version`)
    pub package: String,

    /// Fallback ancestor package (`name` or `name@version`)
    #[arg(long)]
    pub foundation: Option<String>,
}
