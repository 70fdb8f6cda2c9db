// pipelens CLI - CI/CD pipeline analytics in the terminal

use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use comfy_table::{presets::UTF8_FULL, Table};
use indicatif::{ProgressBar, ProgressStyle};
use pipelens_client::{
    load_config, load_dashboard, BackendClient, ClientConfig, FetchError, ProjectSession,
};
use pipelens_core::{
    AnalysisView, FilterSelection, Granularity, LogRecord, LogType, ProjectStatus, SeverityLevel,
    TimelineEntry,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pipelens")]
#[command(version = "0.1.0")]
#[command(about = "CI/CD pipeline log analytics", long_about = None)]
struct Cli {
    /// Backend API URL (overrides the config file)
    #[arg(short, long, env = "PIPELENS_API_URL")]
    api_url: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List projects with their success rate and status
    Projects,

    /// Analyze the logs of one project/tool
    Analyze {
        #[command(flatten)]
        target: Target,

        /// Filter by severity (critical, high, medium, low)
        #[arg(short = 'S', long)]
        severity: Option<SeverityLevel>,

        /// Filter by log type (build, deployment, test, sonarqube, git, github_actions)
        #[arg(short = 'T', long)]
        log_type: Option<LogType>,

        /// Time bucket for the error timeline (hour, day, week)
        #[arg(short, long)]
        granularity: Option<Granularity>,

        /// Number of recent logs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show the filter values available for one project/tool
    Filters {
        #[command(flatten)]
        target: Target,
    },
}

#[derive(clap::Args)]
struct Target {
    /// Project name
    #[arg(short, long)]
    project: String,

    /// Tool name
    #[arg(short, long)]
    tool: String,

    /// Filter by environment
    #[arg(short, long)]
    env: Option<String>,

    /// Filter by server
    #[arg(short, long)]
    server: Option<String>,
}

impl Target {
    fn selection(&self) -> FilterSelection {
        let mut selection = FilterSelection::new();
        if let Some(env) = &self.env {
            selection = selection.with_environment(env.as_str());
        }
        if let Some(server) = &self.server {
            selection = selection.with_server(server.as_str());
        }
        selection
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    config.apply_env();
    if let Some(url) = cli.api_url {
        config.base_url = url;
    }
    debug!(base_url = %config.base_url, "using backend");

    let client = BackendClient::new(&config)?;

    let result = match cli.command {
        Commands::Projects => show_projects(&client).await,
        Commands::Analyze {
            target,
            severity,
            log_type,
            granularity,
            limit,
        } => {
            let mut selection = target.selection();
            if let Some(level) = severity {
                selection = selection.with_severity(level);
            }
            if let Some(log_type) = log_type {
                selection = selection.with_log_type(log_type);
            }
            let granularity = granularity.unwrap_or(config.granularity);
            analyze(client, &target, selection, granularity, limit).await
        }
        Commands::Filters { target } => show_filters(client, &target).await,
    };

    // fetch failures get one readable line and a non-zero exit
    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn fetch_session(
    client: BackendClient,
    target: &Target,
    selection: FilterSelection,
    granularity: Granularity,
) -> Result<ProjectSession<BackendClient>, FetchError> {
    let mut session =
        ProjectSession::new(client, &target.project, &target.tool).with_granularity(granularity);
    session.set_selection(selection);

    let pb = spinner(&format!("Fetching {} / {} logs...", target.project, target.tool));
    let fetched = session.refresh().await;
    pb.finish_and_clear();
    fetched?;

    Ok(session)
}

async fn show_projects(client: &BackendClient) -> Result<(), FetchError> {
    let pb = spinner("Loading dashboard...");
    let loaded = load_dashboard(client).await;
    pb.finish_and_clear();
    let dashboard = loaded?;

    println!("\n{}", "Projects".cyan().bold());
    println!("{}", "─".repeat(60).dimmed());

    if dashboard.projects.is_empty() {
        println!("{}", "No projects found.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Project", "Records", "Tools", "Success", "Status", "Latest"]);

    for project in &dashboard.projects {
        let tools = project
            .tools
            .iter()
            .map(|t| format!("{} ({})", t.name, t.count))
            .collect::<Vec<_>>()
            .join(", ");

        table.add_row(vec![
            project.name.clone(),
            project.count.to_string(),
            truncate(&tools, 40),
            format!("{:.1}%", project.success_rate),
            status_colored(project.status).to_string(),
            project
                .latest_timestamp
                .as_deref()
                .map(format_time)
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }

    println!("{table}");
    println!(
        "\n{} {} | {} {} | {} {}%",
        "Projects:".dimmed(),
        dashboard.totals.total_projects.to_string().green(),
        "Records:".dimmed(),
        dashboard.totals.total_records.to_string().yellow(),
        "Success rate:".dimmed(),
        dashboard.totals.overall_success_rate.to_string().green(),
    );
    println!(
        "{} {} | {} {}",
        "Environments:".dimmed(),
        dashboard.environments.join(", "),
        "Servers:".dimmed(),
        dashboard.servers.join(", "),
    );

    Ok(())
}

async fn analyze(
    client: BackendClient,
    target: &Target,
    selection: FilterSelection,
    granularity: Granularity,
    limit: usize,
) -> Result<(), FetchError> {
    let session = fetch_session(client, target, selection, granularity).await?;
    let view = session.view();

    println!(
        "\n{} {} / {}",
        "Analysis:".cyan().bold(),
        target.project,
        target.tool
    );
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "{} {} of {} records",
        "Showing:".dimmed(),
        view.filtered_count.to_string().yellow(),
        view.total_count
    );

    if view.is_empty() {
        println!("\n{}", "No logs match the selected filters.".yellow());
        return Ok(());
    }

    print_cards(&view);
    print_breakdown(&view);
    print_error_timeline(&view);
    print_recent_logs(&view, limit);

    Ok(())
}

fn print_cards(view: &AnalysisView<'_>) {
    let summary = &view.summary;
    println!("\n{}", "Metrics".green().bold());
    println!(
        "  {} {}   {} {:.0}s   {} {:.1}   {} {:.1}%",
        "Success rate:".dimmed(),
        format!("{:.1}%", summary.success_rate).green(),
        "Avg build:".dimmed(),
        summary.avg_build_duration,
        "Errors/run:".dimmed(),
        summary.avg_error_rate,
        "Coverage:".dimmed(),
        summary.avg_coverage,
    );

    let insights = &view.insights;
    if let Some(impact) = insights.business_impact {
        println!(
            "  {} {:.1} ({:?}, {} logs)",
            "Business impact:".dimmed(),
            impact.avg,
            impact.band,
            impact.count
        );
    }
    if let Some(security) = insights.security {
        println!(
            "  {} {} vulnerabilities, quality gate {:.1}% passed",
            "Security:".dimmed(),
            security.total_vulnerabilities,
            security.quality_gate_pass_rate
        );
    }
    println!("  {} {:.1}%", "LLM coverage:".dimmed(), insights.llm_coverage);
}

fn print_breakdown(view: &AnalysisView<'_>) {
    let counts = &view.type_counts;
    let stats = &view.severity_stats;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Type", "Count", "Severity", "Count"]);

    let types = [
        ("all", counts.all),
        ("build", counts.build),
        ("deployment", counts.deployment),
        ("test", counts.test),
        ("sonarqube", counts.sonarqube),
        ("github_actions", counts.github_actions),
    ];
    let severities = [
        (severity_colored(SeverityLevel::Critical), stats.critical),
        (severity_colored(SeverityLevel::High), stats.high),
        (severity_colored(SeverityLevel::Medium), stats.medium),
        (severity_colored(SeverityLevel::Low), stats.low),
        ("total".normal(), stats.total),
    ];

    for (i, (name, count)) in types.iter().enumerate() {
        let (severity, severity_count) = severities
            .get(i)
            .map(|(s, c)| (s.to_string(), c.to_string()))
            .unwrap_or_default();
        table.add_row(vec![name.to_string(), count.to_string(), severity, severity_count]);
    }

    println!("\n{}", "Breakdown (all fetched logs)".green().bold());
    println!("{table}");
}

fn print_error_timeline(view: &AnalysisView<'_>) {
    if view.error_timeline.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Time", "Errors"]);
    for bucket in &view.error_timeline {
        table.add_row(vec![bucket.key.clone(), bucket.value.to_string()]);
    }

    println!("\n{} (per {})", "Error timeline".green().bold(), view.granularity);
    println!("{table}");
}

fn print_recent_logs(view: &AnalysisView<'_>, limit: usize) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Time", "Type", "Severity", "Result", "Errors", "Summary"]);

    // timeline entries line up with the sorted logs
    let rows: Vec<(&&LogRecord, &TimelineEntry)> =
        view.logs.iter().zip(&view.metrics.timeline).take(limit).collect();
    for (log, entry) in rows {
        let result = if entry.success {
            "ok".green()
        } else {
            "failed".red()
        };
        table.add_row(vec![
            log.raw_timestamp()
                .as_deref()
                .map(format_time)
                .unwrap_or_else(|| "-".to_string()),
            entry.log_type.to_string(),
            severity_colored(entry.severity).to_string(),
            result.to_string(),
            entry.error_count.to_string(),
            truncate(log.headline(), 50),
        ]);
    }

    println!("\n{}", "Recent logs".green().bold());
    println!("{table}");
}

async fn show_filters(client: BackendClient, target: &Target) -> Result<(), FetchError> {
    let session = fetch_session(client, target, target.selection(), Granularity::default()).await?;
    let view = session.view();

    println!(
        "\n{} {} / {}",
        "Filters:".cyan().bold(),
        target.project,
        target.tool
    );
    println!("{}", "─".repeat(40).dimmed());

    let severities: Vec<String> = view.severities.iter().map(|s| s.to_string()).collect();
    let rows = [
        ("Environments", view.environments.join(", ")),
        ("Servers", view.servers.join(", ")),
        ("Severities", severities.join(", ")),
    ];
    for (name, values) in rows {
        let values = if values.is_empty() { "-".to_string() } else { values };
        println!("  {} {}", format!("{name}:").dimmed(), values);
    }

    Ok(())
}

fn status_colored(status: ProjectStatus) -> ColoredString {
    match status {
        ProjectStatus::Success => status.as_str().green(),
        ProjectStatus::Warning => status.as_str().yellow(),
        ProjectStatus::Error => status.as_str().red(),
    }
}

fn severity_colored(level: SeverityLevel) -> ColoredString {
    match level {
        SeverityLevel::Critical => level.as_str().red().bold(),
        SeverityLevel::High => level.as_str().red(),
        SeverityLevel::Medium => level.as_str().yellow(),
        SeverityLevel::Low => level.as_str().green(),
        SeverityLevel::Unknown => level.as_str().dimmed(),
    }
}

fn format_time(raw: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
