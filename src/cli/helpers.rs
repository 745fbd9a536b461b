//! Shared helper functions for CLI commands

use std::sync::Arc;

use chrono::{DateTime, Utc};
use miette::{IntoDiagnostic, Result};

use crate::cli::args::GlobalOpts;
use crate::core::{CaseEngine, Clock, Config, FixedClock, Project, SqliteStore, SystemClock};
use crate::entities::Case;

/// Engine as the CLI runs it: the SQLite store doubles as audit sink
pub type Engine = CaseEngine<Arc<SqliteStore>, Arc<SqliteStore>>;

/// Everything a command needs once the project is found
pub struct Workspace {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub engine: Engine,
}

impl Workspace {
    /// Discover the project, load config and open the case database
    pub fn open() -> Result<Self> {
        let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
        let config = Config::load(Some(&project)).map_err(|e| miette::miette!("{}", e))?;

        let store = Arc::new(
            SqliteStore::open(project.database_path()).map_err(|e| miette::miette!("{}", e))?,
        );
        let engine = CaseEngine::with_audit(Arc::clone(&store), Arc::clone(&store))
            .configure(&config)
            .into_diagnostic()?;
        tracing::debug!(root = %project.root().display(), "workspace opened");

        Ok(Self {
            config,
            store,
            engine,
        })
    }

    /// Resolve a case number or case id
    pub fn find_case(&self, reference: &str) -> Result<Case> {
        self.engine
            .find_case(reference)
            .map_err(|e| miette::miette!("{}", e))
    }

    /// Actor for a write: `--actor`/`JPC_ACTOR`, then config, then `fallback`
    pub fn actor(&self, global: &GlobalOpts, fallback: &str) -> String {
        global
            .actor
            .clone()
            .or_else(|| self.config.actor.clone())
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Clock honouring `--now`/`JPC_NOW`
pub fn clock(global: &GlobalOpts) -> Box<dyn Clock> {
    match global.now {
        Some(now) => Box::new(FixedClock(now)),
        None => Box::new(SystemClock),
    }
}

pub fn now(global: &GlobalOpts) -> DateTime<Utc> {
    clock(global).now()
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Render an instant as a calendar date for tables
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}
