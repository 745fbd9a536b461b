//! `jpc extend` command - Grant the one-time extension

use clap::Args;
use console::style;
use miette::Result;

use crate::cli::helpers::{format_date, now, Workspace};
use crate::cli::output::{print_serialized, CaseReport};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Debug, Args)]
pub struct ExtendArgs {
    /// Case number (JC-YYYY-MM-XXXX) or case id
    pub case: String,

    /// Written justification (required)
    #[arg(long, short = 'r')]
    pub reason: String,
}

/// Run the extend command
pub fn run(args: ExtendArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let case = ws.find_case(&args.case)?;
    let actor = ws.actor(global, &case.judge_id);
    let now = now(global);

    let extended = ws
        .engine
        .grant_extension(&case, &args.reason, &actor, now)
        .map_err(|e| miette::miette!("{}", e))?;
    let view = ws.engine.view_deadline(&extended, now);

    match global.output {
        OutputFormat::Id | OutputFormat::Tsv => println!("{}", extended.case_number),
        OutputFormat::Json | OutputFormat::Yaml => {
            let report = CaseReport {
                case: &extended,
                deadline: Some(view),
            };
            print_serialized(&report, global.output)?;
        }
        OutputFormat::Auto => {
            println!(
                "{} Extended {} by {} days",
                style("✓").green(),
                style(extended.case_number).cyan(),
                ws.engine.policy().extension_days
            );
            println!(
                "   New due date: {} ({} days allowed)",
                format_date(view.due_at),
                view.allowed_days
            );
        }
    }
    Ok(())
}
