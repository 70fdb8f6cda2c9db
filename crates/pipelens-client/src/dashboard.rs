// Dashboard load: the four initial requests, issued concurrently

use crate::error::Result;
use crate::source::LogSource;
use pipelens_core::{build_project_stats, DashboardTotals, LogRecord, ProjectStat};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub projects: Vec<ProjectStat>,
    pub totals: DashboardTotals,
    pub environments: Vec<String>,
    pub servers: Vec<String>,
    pub analysis: Vec<LogRecord>, // full history, unfiltered
}

/// Fetch projects, environments, servers and analysis together.
/// Any single failure fails the whole load.
pub async fn load_dashboard<S: LogSource + ?Sized>(source: &S) -> Result<Dashboard> {
    let (names, environments, servers, analysis) = tokio::try_join!(
        source.projects(),
        source.environments(),
        source.servers(),
        source.analysis(),
    )?;

    let projects = build_project_stats(&names, &analysis);
    let totals = DashboardTotals::from_stats(&projects);
    info!(
        projects = totals.total_projects,
        records = analysis.len(),
        "dashboard loaded"
    );

    Ok(Dashboard {
        projects,
        totals,
        environments,
        servers,
        analysis,
    })
}
