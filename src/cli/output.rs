//! Output formatting utilities

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::helpers::{format_date, truncate_str};
use crate::cli::OutputFormat;
use crate::core::deadline::{DeadlineView, Tier};
use crate::entities::Case;

/// Determine the effective output format based on context
pub fn effective_format(format: OutputFormat, is_list: bool) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if is_list {
                OutputFormat::Tsv
            } else {
                OutputFormat::Yaml
            }
        }
        other => other,
    }
}

/// A case together with its deadline state (open cases only)
#[derive(Debug, Serialize)]
pub struct CaseReport<'a> {
    #[serde(flatten)]
    pub case: &'a Case,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DeadlineView>,
}

/// Print any serializable value as YAML or JSON
pub fn print_serialized<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
        }
        _ => {
            print!("{}", serde_yml::to_string(value).into_diagnostic()?);
        }
    }
    Ok(())
}

/// Tier coloured for terminals
pub fn styled_tier(tier: Tier) -> String {
    match tier {
        Tier::EnTiempo => style(tier).green().to_string(),
        Tier::Urgente => style(tier).yellow().to_string(),
        Tier::Vencido => style(tier).red().bold().to_string(),
    }
}

#[derive(Tabled)]
struct CaseRow {
    #[tabled(rename = "CASE")]
    number: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "TIER")]
    tier: String,
    #[tabled(rename = "DAYS")]
    days: String,
    #[tabled(rename = "JUDGE")]
    judge: String,
    #[tabled(rename = "BLOCK")]
    block: String,
    #[tabled(rename = "CONFLICT")]
    conflict: String,
    #[tabled(rename = "FILED")]
    filed: String,
}

impl CaseRow {
    fn from_report(report: &CaseReport<'_>) -> Self {
        let (tier, days) = match &report.deadline {
            Some(view) => (
                view.tier.to_string(),
                format!("{}/{}", view.elapsed_days, view.allowed_days),
            ),
            None => ("-".to_string(), "-".to_string()),
        };
        Self {
            number: report.case.case_number.to_string(),
            status: report.case.status.to_string(),
            tier,
            days,
            judge: truncate_str(&report.case.judge_id, 20),
            block: report.case.residential_block.to_string(),
            conflict: report.case.conflict_type.to_string(),
            filed: format_date(report.case.filed_at),
        }
    }
}

/// Print a list of cases in the requested format
pub fn print_cases(reports: &[CaseReport<'_>], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_serialized(&reports, format)?,
        OutputFormat::Id => {
            for report in reports {
                println!("{}", report.case.case_number);
            }
        }
        OutputFormat::Tsv => {
            println!("case\tstatus\ttier\telapsed\tallowed\tjudge\tblock\tconflict\tfiled");
            for report in reports {
                let row = CaseRow::from_report(report);
                let (elapsed, allowed) = row.days.split_once('/').unwrap_or(("-", "-"));
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    row.number,
                    row.status,
                    row.tier,
                    elapsed,
                    allowed,
                    report.case.judge_id,
                    row.block,
                    row.conflict,
                    row.filed
                );
            }
        }
        OutputFormat::Auto => {
            if reports.is_empty() {
                println!("No cases found.");
                return Ok(());
            }
            let rows: Vec<CaseRow> = reports.iter().map(CaseRow::from_report).collect();
            println!("{}", Table::new(rows).with(Style::sharp()));
            println!(
                "{}",
                style(format!("{} case(s)", reports.len())).dim()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_format() {
        assert_eq!(effective_format(OutputFormat::Auto, true), OutputFormat::Tsv);
        assert_eq!(effective_format(OutputFormat::Auto, false), OutputFormat::Yaml);
        assert_eq!(effective_format(OutputFormat::Json, true), OutputFormat::Json);
    }
}
