//! `jpc show` command - Show one case

use clap::Args;
use miette::Result;

use crate::cli::helpers::{now, Workspace};
use crate::cli::output::{effective_format, print_serialized, CaseReport};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Case number (JC-YYYY-MM-XXXX) or case id
    pub case: String,
}

/// Run the show command
pub fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let case = ws.find_case(&args.case)?;
    let deadline = case
        .is_open()
        .then(|| ws.engine.view_deadline(&case, now(global)));

    match effective_format(global.output, false) {
        OutputFormat::Id => println!("{}", case.case_number),
        OutputFormat::Tsv => {
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                case.case_number,
                case.id,
                case.status,
                deadline.map_or("-".to_string(), |v| v.tier.to_string()),
                case.judge_id,
                case.filed_at.to_rfc3339()
            );
        }
        format => {
            let report = CaseReport {
                case: &case,
                deadline,
            };
            print_serialized(&report, format)?;
        }
    }
    Ok(())
}
