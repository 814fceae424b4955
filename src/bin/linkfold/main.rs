//! linkfold CLI - diamond consolidation and link planning

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use linkfold::util::diagnostic::emit;
use linkfold::util::{ColorChoice, Shell};
use linkfold::{ConsolidateError, GraphError};

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("linkfold=debug")
    } else {
        EnvFilter::new("linkfold=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let color = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let shell = Shell::new(color);

    let graph_path = cli.command.graph_path().to_path_buf();
    if let Err(e) = run(cli.command, &shell) {
        report_error(&e, &graph_path, shell.use_color());
        std::process::exit(1);
    }
}

fn run(command: Commands, shell: &Shell) -> Result<()> {
    match command {
        Commands::Plan(args) => commands::plan::execute(args, shell),
        Commands::Check(args) => commands::check::execute(args, shell),
        Commands::Explain(args) => commands::explain::execute(args, shell),
    }
}

fn report_error(err: &anyhow::Error, graph_path: &Path, color: bool) {
    if let Some(e) = err.downcast_ref::<ConsolidateError>() {
        emit(&e.to_diagnostic().with_location(graph_path), color);
    } else if let Some(e) = err.downcast_ref::<GraphError>() {
        emit(&e.to_diagnostic().with_location(graph_path), color);
    } else {
        eprintln!("error: {:#}", err);
    }
}
