//! `jpc file` command - File a new case

use clap::Args;
use console::style;
use miette::Result;

use crate::cli::helpers::{now, Workspace};
use crate::cli::output::{print_serialized, CaseReport};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::{ConflictType, NewCase, ResidentialBlock};

#[derive(Debug, Args)]
pub struct FileArgs {
    /// Conflict type (vecinal, individual, comunitario, contravencion, obligacion_patrimonial, otro)
    #[arg(long, short = 'c')]
    pub conflict: ConflictType,

    /// Residential block (e.g. 15, BLOQUE_20, bloque-22p)
    #[arg(long, short = 'b')]
    pub block: ResidentialBlock,

    /// Judge assigned to the case
    #[arg(long, short = 'j')]
    pub judge: String,
}

/// Run the file command
pub fn run(args: FileArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let now = now(global);

    let case = ws
        .engine
        .file_case(
            NewCase {
                conflict_type: args.conflict,
                residential_block: args.block,
                judge_id: args.judge,
            },
            now,
        )
        .map_err(|e| miette::miette!("{}", e))?;

    match global.output {
        OutputFormat::Id | OutputFormat::Tsv => println!("{}", case.case_number),
        OutputFormat::Json | OutputFormat::Yaml => {
            let report = CaseReport {
                case: &case,
                deadline: Some(ws.engine.view_deadline(&case, now)),
            };
            print_serialized(&report, global.output)?;
        }
        OutputFormat::Auto => {
            let view = ws.engine.view_deadline(&case, now);
            println!(
                "{} Filed case {}",
                style("✓").green(),
                style(case.case_number).cyan()
            );
            println!(
                "   {} / {}, judge {}",
                case.conflict_type, case.residential_block, case.judge_id
            );
            println!(
                "   Due {} ({} days)",
                view.due_at.format("%Y-%m-%d"),
                view.allowed_days
            );
        }
    }
    Ok(())
}
