//! `linkfold plan` command

use anyhow::Result;

use crate::cli::{OutputFormat, PlanArgs};
use crate::commands::{load_graph, load_settings};
use linkfold::builder::render_inputs;
use linkfold::ops::{plan_file, PlanOptions, PlanOutcome};
use linkfold::util::diagnostic::{emit, Diagnostic};
use linkfold::util::{Shell, Status};

pub fn execute(args: PlanArgs, shell: &Shell) -> Result<()> {
    let config = load_settings()?;

    let mut opts = PlanOptions::from_config(&config);
    opts.foundation = args.foundation;
    if let Some(os) = args.os {
        opts.link.os = os;
    }
    if let Some(out_dir) = args.out_dir {
        opts.link.out_dir = out_dir;
    }

    let shell = shell.clone().quiet(args.format == OutputFormat::Json);
    let file = load_graph(&args.graph, &shell)?;

    shell.status(
        Status::Planning,
        format!("{} package(s) for {}", file.packages.len(), opts.link.os),
    );
    let outcome = plan_file(&file, &opts)?;

    for consolidation in &outcome.report.consolidations {
        let graph = &outcome.graph;
        shell.status(
            Status::Consolidated,
            format!(
                "{} into {}{}",
                graph.describe(consolidation.finding.duplicated_artifact),
                graph.describe(consolidation.ancestor),
                if consolidation.via_foundation {
                    " (foundation)"
                } else {
                    ""
                }
            ),
        );
    }

    for dup in &outcome.duplicates {
        let graph = &outcome.graph;
        let mut warning = Diagnostic::warning(format!(
            "`{}` is still linked more than once into `{}`",
            graph.describe(dup.artifact),
            graph.describe(dup.converging_at)
        ))
        .with_location(&args.graph);
        for &boundary in &dup.embedded_by {
            warning = warning
                .with_context(format!("`{}` embeds its own copy", graph.describe(boundary)));
        }
        emit(&warning, shell.use_color());
    }

    match args.format {
        OutputFormat::Json => println!("{}", outcome.plan.to_json()?),
        OutputFormat::Text => print_plan(&outcome, &opts),
    }

    let fingerprint = outcome.plan.fingerprint()?;
    shell.status(
        Status::Finished,
        format!(
            "{} artifact(s), fingerprint {}",
            outcome.plan.len(),
            &fingerprint[..12]
        ),
    );

    Ok(())
}

fn print_plan(outcome: &PlanOutcome, opts: &PlanOptions) {
    println!("Link plan (outputs under {}):", opts.link.out_dir.display());

    for (i, entry) in outcome.plan.entries.iter().enumerate() {
        println!();
        println!("  {}. {} [{}]", i + 1, entry.name, entry.kind);
        for line in render_inputs(entry, Some(&opts.link.out_dir)) {
            println!("       {}", line);
        }
    }
}
