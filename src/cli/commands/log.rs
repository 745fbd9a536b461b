//! `jpc log` command - Audit trail of a case

use clap::Args;
use console::style;
use miette::Result;

use crate::cli::helpers::Workspace;
use crate::cli::output::print_serialized;
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Debug, Args)]
pub struct LogArgs {
    /// Case number (JC-YYYY-MM-XXXX) or case id
    pub case: String,
}

/// Run the log command
pub fn run(args: LogArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let case = ws.find_case(&args.case)?;
    let events = ws
        .store
        .audit_trail(&case.id)
        .map_err(|e| miette::miette!("{}", e))?;

    match global.output {
        OutputFormat::Json | OutputFormat::Yaml => print_serialized(&events, global.output)?,
        OutputFormat::Id => {
            for event in &events {
                println!("{}", event.action);
            }
        }
        format => {
            let styled = format == OutputFormat::Auto;
            for event in &events {
                let change = match (event.from_status, event.to_status) {
                    (Some(from), Some(to)) => format!("{} → {}", from, to),
                    (None, Some(to)) => to.to_string(),
                    _ => "-".to_string(),
                };
                let detail = event.detail.as_deref().unwrap_or("");
                if styled {
                    println!(
                        "{}  {:<18} {:<24} {}  {}",
                        style(event.at.format("%Y-%m-%d %H:%M")).dim(),
                        style(event.action).cyan(),
                        change,
                        event.actor,
                        style(detail).dim()
                    );
                } else {
                    println!(
                        "{}\t{}\t{}\t{}\t{}",
                        event.at.to_rfc3339(),
                        event.action,
                        change,
                        event.actor,
                        detail
                    );
                }
            }
        }
    }
    Ok(())
}
