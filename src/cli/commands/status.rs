//! `jpc status` command - Move a case through its lifecycle

use clap::Args;
use console::style;
use miette::{bail, Result};

use crate::cli::helpers::{now, Workspace};
use crate::cli::output::print_serialized;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::engine::EngineError;
use crate::core::entity::Status;
use crate::entities::{Resolution, ResolutionMethod};

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Case number (JC-YYYY-MM-XXXX) or case id
    pub case: String,

    /// Target status (resuelto, cerrado, archivado)
    pub target: Status,

    /// How the case was resolved (only when moving to resuelto)
    #[arg(long, short = 'm')]
    pub method: Option<ResolutionMethod>,

    /// Resolution notes (requires --method)
    #[arg(long, short = 'n', requires = "method")]
    pub notes: Option<String>,
}

/// Run the status command
pub fn run(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    if args.method.is_some() && args.target != Status::Resuelto {
        bail!("--method only applies when moving a case to resuelto");
    }

    let ws = Workspace::open()?;
    let case = ws.find_case(&args.case)?;
    let actor = ws.actor(global, &case.judge_id);
    let now = now(global);
    let from = case.status;

    let result = match args.method {
        Some(method) => ws.engine.resolve(
            &case,
            Resolution {
                method,
                notes: args.notes,
            },
            &actor,
            now,
        ),
        None => ws.engine.change_status(&case, args.target, &actor, now),
    };

    let updated = result.map_err(|e| match e {
        EngineError::Workflow(_) => {
            let allowed = ws.engine.workflow().allowed_transitions(from);
            if allowed.is_empty() {
                miette::miette!("{} ({} is final)", e, from)
            } else {
                let names: Vec<&str> = allowed.iter().map(|s| s.as_str()).collect();
                miette::miette!("{} (allowed from {}: {})", e, from, names.join(", "))
            }
        }
        other => miette::miette!("{}", other),
    })?;

    match global.output {
        OutputFormat::Id | OutputFormat::Tsv => {
            println!("{}\t{}", updated.case_number, updated.status)
        }
        OutputFormat::Json | OutputFormat::Yaml => print_serialized(&updated, global.output)?,
        OutputFormat::Auto => println!(
            "{} {} {} → {}",
            style("✓").green(),
            style(updated.case_number).cyan(),
            from,
            style(updated.status).bold()
        ),
    }
    Ok(())
}
