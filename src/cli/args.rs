//! Command-line arguments

use chrono::{DateTime, Utc};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    deadline::DeadlineArgs, extend::ExtendArgs, file::FileArgs, init::InitArgs, list::ListArgs,
    log::LogArgs, show::ShowArgs, status::StatusArgs,
};

/// Case lifecycle and numbering for community-judge case files
#[derive(Debug, Parser)]
#[command(name = "jpc", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand
#[derive(Debug, Clone, Args)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long = "format", short = 'f', global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub output: OutputFormat,

    /// Who is acting (recorded on extensions and status changes)
    #[arg(long, global = true, env = "JPC_ACTOR")]
    pub actor: Option<String>,

    /// Pin "now" to an RFC 3339 instant instead of the system clock
    #[arg(long, global = true, env = "JPC_NOW")]
    pub now: Option<DateTime<Utc>>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table for lists, YAML or a summary for single records
    #[default]
    Auto,
    Yaml,
    Json,
    /// Tab-separated, one record per line
    Tsv,
    /// Case numbers only, one per line
    Id,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the .jpc/ project directory here
    Init(InitArgs),

    /// File a new case and assign its number
    File(FileArgs),

    /// Show a case
    Show(ShowArgs),

    /// Show the deadline state of a case
    Deadline(DeadlineArgs),

    /// Grant the one-time extension
    Extend(ExtendArgs),

    /// Change the status of a case
    Status(StatusArgs),

    /// List cases
    List(ListArgs),

    /// Show the audit trail of a case
    Log(LogArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_now() {
        let cli = Cli::try_parse_from(["jpc", "--now", "2024-01-15T10:00:00Z", "list"]).unwrap();
        assert_eq!(
            cli.global.now.map(|n| n.to_rfc3339()),
            Some("2024-01-15T10:00:00+00:00".to_string())
        );
        assert!(matches!(cli.command, Commands::List(_)));
    }
}
