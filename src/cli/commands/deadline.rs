//! `jpc deadline` command - Show the deadline state of a case

use clap::Args;
use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::helpers::{format_date, now, Workspace};
use crate::cli::output::{print_serialized, styled_tier};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::case_number::CaseNumber;
use crate::core::deadline::DeadlineView;
use crate::core::entity::Status;
use crate::core::extension::ExtensionState;

#[derive(Debug, Args)]
pub struct DeadlineArgs {
    /// Case number (JC-YYYY-MM-XXXX) or case id
    pub case: String,
}

#[derive(Serialize)]
struct DeadlineReport<'a> {
    case_number: CaseNumber,
    status: Status,
    extension: &'a ExtensionState,
    #[serde(flatten)]
    view: DeadlineView,
}

/// Run the deadline command
pub fn run(args: DeadlineArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let case = ws.find_case(&args.case)?;
    let view = ws.engine.view_deadline(&case, now(global));

    match global.output {
        OutputFormat::Id => println!("{}", view.tier),
        OutputFormat::Tsv => println!(
            "{}\t{}\t{}\t{}\t{:.1}\t{}\t{}",
            case.case_number,
            view.tier,
            view.elapsed_days,
            view.allowed_days,
            view.progress_pct,
            view.remaining_days,
            format_date(view.due_at)
        ),
        OutputFormat::Json | OutputFormat::Yaml => {
            let report = DeadlineReport {
                case_number: case.case_number,
                status: case.status,
                extension: &case.extension,
                view,
            };
            print_serialized(&report, global.output)?;
        }
        OutputFormat::Auto => {
            println!(
                "{}  {}",
                style(case.case_number).cyan().bold(),
                case.status.label()
            );
            if !case.is_open() {
                println!(
                    "   {}",
                    style("Case is no longer en_tramite; figures are informational").dim()
                );
            }
            println!("   Tier:      {}", styled_tier(view.tier));
            println!(
                "   Elapsed:   {} of {} days ({:.0}%)",
                view.elapsed_days, view.allowed_days, view.progress_pct
            );
            let remaining = if view.past_allowed {
                style(format!("{} days (allowance spent)", view.remaining_days))
                    .red()
                    .to_string()
            } else {
                format!("{} days", view.remaining_days)
            };
            println!("   Remaining: {}", remaining);
            println!("   Due:       {}", format_date(view.due_at));
            match case.extension.granted() {
                Some(ext) => println!(
                    "   Extension: +{} days on {} ({})",
                    ext.extra_days,
                    format_date(ext.granted_at),
                    ext.reason
                ),
                None => println!("   Extension: {}", style("none").dim()),
            }
        }
    }
    Ok(())
}
