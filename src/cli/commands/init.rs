//! `jpc init` command - Create a project in the current directory

use clap::Args;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::core::{Project, SqliteStore};

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory to initialize (defaults to the current directory)
    pub path: Option<PathBuf>,
}

/// Run the init command
pub fn run(args: InitArgs, _global: &GlobalOpts) -> Result<()> {
    let root = match args.path {
        Some(path) => path,
        None => std::env::current_dir().into_diagnostic()?,
    };

    let project = Project::init(&root).map_err(|e| miette::miette!("{}", e))?;
    // Opening creates the schema
    SqliteStore::open(project.database_path()).map_err(|e| miette::miette!("{}", e))?;
    tracing::info!(root = %project.root().display(), "project initialized");

    println!(
        "{} Initialized case file project in {}",
        style("✓").green(),
        style(project.jpc_dir().display()).cyan()
    );
    println!("   Config:   {}", project.config_path().display());
    println!("   Database: {}", project.database_path().display());
    Ok(())
}
