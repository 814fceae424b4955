//! `linkfold explain` command

use anyhow::Result;

use crate::cli::ExplainArgs;
use crate::commands::{load_graph, load_settings};
use linkfold::ops::{explain, plan_file, PlanOptions};
use linkfold::util::Shell;

pub fn execute(args: ExplainArgs, shell: &Shell) -> Result<()> {
    let config = load_settings()?;
    let mut opts = PlanOptions::from_config(&config);
    opts.foundation = args.foundation;

    let file = load_graph(&args.graph, shell)?;
    let outcome = plan_file(&file, &opts)?;
    let explanation = explain(&outcome, &args.package)?;
    let graph = &outcome.graph;

    for artifact in &explanation.artifacts {
        println!("{}", graph.describe(artifact.artifact));

        if artifact.embedded_by.is_empty() {
            println!("  └─ not embedded by any link boundary");
        }
        for (boundary, path) in &artifact.embedded_by {
            println!(
                "  └─ embedded by: {} ({})",
                graph.describe(*boundary),
                graph.describe_path(path)
            );
        }
        for (from, ancestor) in &artifact.satisfied_from {
            println!(
                "  └─ {} links it through {}",
                graph.describe(*from),
                graph.describe(*ancestor)
            );
        }
    }

    Ok(())
}
