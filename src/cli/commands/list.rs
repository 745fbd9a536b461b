//! `jpc list` command - List cases with their deadline tier

use clap::Args;
use miette::Result;

use crate::cli::filters::{StatusFilter, TierFilter};
use crate::cli::helpers::{now, Workspace};
use crate::cli::output::{print_cases, CaseReport};
use crate::cli::GlobalOpts;
use crate::core::sequence::Bucket;
use crate::core::store::CaseFilter;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, short = 's', value_enum, default_value_t = StatusFilter::All)]
    pub status: StatusFilter,

    /// Filter by assigned judge
    #[arg(long, short = 'j')]
    pub judge: Option<String>,

    /// Only open cases in this deadline tier
    #[arg(long, short = 't', value_enum)]
    pub tier: Option<TierFilter>,

    /// Only cases numbered in this month (YYYY-MM)
    #[arg(long, value_parser = parse_month)]
    pub month: Option<Bucket>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show count only
    #[arg(long)]
    pub count: bool,
}

fn parse_month(s: &str) -> Result<Bucket, String> {
    let (year, month) = s
        .split_once('-')
        .ok_or_else(|| format!("expected YYYY-MM, got '{}'", s))?;
    let year: i32 = year
        .parse()
        .map_err(|_| format!("invalid year in '{}'", s))?;
    let month: u32 = month
        .parse()
        .map_err(|_| format!("invalid month in '{}'", s))?;
    if !(1..=12).contains(&month) {
        return Err(format!("month out of range in '{}'", s));
    }
    Ok(Bucket::new(year, month))
}

/// Run the list command
pub fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let now = now(global);

    let mut filter = CaseFilter::default();
    if let Some(status) = args.status.as_status() {
        filter = filter.with_status(status);
    }
    if let Some(judge) = &args.judge {
        filter = filter.with_judge(judge.as_str());
    }
    if let Some(bucket) = args.month {
        filter = filter.with_bucket(bucket);
    }

    let cases = ws
        .engine
        .list_cases(&filter)
        .map_err(|e| miette::miette!("{}", e))?;

    let mut reports: Vec<CaseReport<'_>> = cases
        .iter()
        .filter(|case| args.status.matches(&case.status))
        .map(|case| CaseReport {
            case,
            deadline: case.is_open().then(|| ws.engine.view_deadline(case, now)),
        })
        .filter(|report| match (args.tier, &report.deadline) {
            (None, _) => true,
            (Some(tier), Some(view)) => tier.matches(view.tier),
            (Some(_), None) => false,
        })
        .collect();

    if let Some(limit) = args.limit {
        reports.truncate(limit);
    }

    if args.count {
        println!("{}", reports.len());
        return Ok(());
    }

    print_cases(&reports, global.output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2024-03").unwrap(), Bucket::new(2024, 3));
        assert!(parse_month("2024-13").is_err());
        assert!(parse_month("202403").is_err());
    }
}
