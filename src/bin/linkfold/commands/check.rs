//! `linkfold check` command

use anyhow::Result;

use crate::cli::CheckArgs;
use crate::commands::{load_graph, load_settings};
use linkfold::ops::{check_file, PlanOptions};
use linkfold::util::{Shell, Status};

pub fn execute(args: CheckArgs, shell: &Shell) -> Result<()> {
    let config = load_settings()?;
    let opts = PlanOptions::from_config(&config);

    let file = load_graph(&args.graph, shell)?;
    shell.status(Status::Checking, format!("{} package(s)", file.packages.len()));

    let outcome = check_file(&file, &opts)?;
    let graph = &outcome.graph;

    if outcome.findings.is_empty() {
        println!("no diamonds found");
        return Ok(());
    }

    println!("found {} diamond(s):", outcome.findings.len());
    for finding in &outcome.findings {
        println!();
        println!(
            "  {} is embedded {} times beneath {}",
            graph.describe(finding.duplicated_artifact),
            finding.via_boundaries.len(),
            graph.describe(finding.converging_at)
        );
        for path in &finding.paths {
            println!("    via {}", graph.describe_path(path));
        }
    }

    Ok(())
}
