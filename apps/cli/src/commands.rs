//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use interviewprep_core::{ProgressReporter, ResearchPipeline, SilentProgress};
use interviewprep_llm::{DisabledModel, ModelClient, OpenRouterClient};
use interviewprep_shared::{
    AppConfig, CacheKey, PipelineConfig, ResearchQuery, ResearchReport, config_file_path,
    init_config, load_config,
};
use interviewprep_sources::FetcherRegistry;
use interviewprep_storage::{ResearchStore, Storage};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// InterviewPrep: research interview processes and build preparation guides.
#[derive(Parser)]
#[command(
    name = "interviewprep",
    version,
    about = "Research a company's interview process and generate a preparation guide.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Database path (overrides `[storage].database_path`).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Research a company and print a preparation report.
    Research {
        /// Company name.
        company: String,

        /// Target role (defaults to `[defaults].role`).
        #[arg(short, long)]
        role: Option<String>,

        /// Experience level (defaults to `[defaults].experience_level`).
        #[arg(short, long)]
        experience: Option<String>,

        /// Days available to prepare (defaults to `[defaults].days_to_prepare`).
        #[arg(short, long)]
        days: Option<u32>,

        /// Model ID override (defaults to `[openrouter].default_model`).
        #[arg(long)]
        model: Option<String>,

        /// Skip model calls; every section uses its fallback content.
        #[arg(long)]
        offline: bool,

        /// Print the report as JSON instead of a text summary.
        #[arg(long)]
        json: bool,
    },

    /// List companies with stored interview data.
    Companies,

    /// Show past reports for a company.
    History {
        /// Company name.
        company: String,

        /// Role (defaults to `[defaults].role`).
        #[arg(short, long)]
        role: Option<String>,

        /// Maximum number of reports to show.
        #[arg(short, long, default_value = "10")]
        limit: u32,
    },

    /// Check the database and show what is stored.
    Status,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "interviewprep=warn",
        1 => "interviewprep=info",
        2 => "interviewprep=debug",
        _ => "interviewprep=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let db = cli.db;
    match cli.command {
        Command::Research {
            company,
            role,
            experience,
            days,
            model,
            offline,
            json,
        } => {
            let opts = ResearchOpts {
                role,
                experience,
                days,
                model,
                offline,
                json,
            };
            cmd_research(&company, opts, db.as_deref()).await
        }
        Command::Companies => cmd_companies(db.as_deref()).await,
        Command::History {
            company,
            role,
            limit,
        } => cmd_history(&company, role.as_deref(), limit, db.as_deref()).await,
        Command::Status => cmd_status(db.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve the database path and open a connected store.
async fn open_storage(config: &AppConfig, db: Option<&Path>) -> Result<Storage> {
    let path = match db {
        Some(p) => p.to_path_buf(),
        None => config.storage.resolved_path()?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| eyre!("cannot create database directory {}: {e}", parent.display()))?;
    }

    Ok(Storage::open(&path).await?)
}

// ---------------------------------------------------------------------------
// research
// ---------------------------------------------------------------------------

struct ResearchOpts {
    role: Option<String>,
    experience: Option<String>,
    days: Option<u32>,
    model: Option<String>,
    offline: bool,
    json: bool,
}

async fn cmd_research(company: &str, opts: ResearchOpts, db: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let pipeline_config = PipelineConfig::from(&config);

    // Resolve the model before touching the network or the database.
    let model: Arc<dyn ModelClient> = if opts.offline {
        Arc::new(DisabledModel)
    } else {
        let mut client = OpenRouterClient::from_config(&config, pipeline_config.model_timeout)?;
        if let Some(id) = opts.model {
            client = client.with_model(id);
        }
        Arc::new(client)
    };

    let query = ResearchQuery::new(company)
        .with_role(opts.role.unwrap_or_else(|| config.defaults.role.clone()))
        .with_experience_level(
            opts.experience
                .unwrap_or_else(|| config.defaults.experience_level.clone()),
        )
        .with_days_to_prepare(opts.days.unwrap_or(config.defaults.days_to_prepare));
    query.validate()?;

    let storage = Arc::new(open_storage(&config, db).await?);
    let registry =
        FetcherRegistry::new().with_http_sources(&config.sources, pipeline_config.fetch_timeout)?;

    info!(
        company = %query.company_name,
        role = %query.role,
        model = model.model_name(),
        sources = registry.len(),
        "starting research"
    );

    let pipeline = ResearchPipeline::new(storage, registry, model, pipeline_config);

    let report = if opts.json {
        pipeline.run(&query, &SilentProgress).await
    } else {
        pipeline.run(&query, &CliProgress::new()).await
    };
    // Let queued writes land before the process exits.
    pipeline.shutdown().await;
    let report = report?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &ResearchReport) {
    let data = &report.interview_data;
    let guide = &report.ai_synthesis;

    println!();
    println!("  {} ({})", report.query.company_name, report.query.role);
    println!("  Report:     {}", report.id);
    println!(
        "  Difficulty: {}",
        if data.difficulty_level.is_empty() { "unknown" } else { &data.difficulty_level }
    );
    println!("  Sources:    {}", data.source_names().join(", "));
    println!("  Data:       {}", if report.cache_hit { "cached" } else { "fresh" });
    println!();

    if !guide.overview.is_empty() {
        println!("Overview");
        println!("{}", indent(&guide.overview));
        println!();
    }
    print_list("Interview process", &data.process_steps);
    print_list("Technical areas", &guide.technical_areas);
    print_list("Common questions", &guide.questions);
    if !guide.strategy.is_empty() {
        println!("Strategy");
        println!("{}", indent(&guide.strategy));
        println!();
    }
    if !guide.timeline.is_empty() {
        println!("Timeline");
        println!("{}", indent(&guide.timeline));
        println!();
    }
    print_list("Tips", &guide.tips);
    print_list("Practice questions", &report.custom_questions);

    println!("Study plan ({} days)", report.study_plan.duration);
    println!("{}", indent(&report.study_plan.study_plan));
    println!();
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{title}");
    for (i, item) in items.iter().enumerate() {
        println!("  {:>2}. {item}", i + 1);
    }
    println!();
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|l| format!("  {l}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid progress template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn sources_ready(&self, count: usize, cached: bool) {
        let origin = if cached { "cache" } else { "sources" };
        self.spinner
            .set_message(format!("Interview data ready ({count} from {origin})"));
    }

    fn done(&self, _report: &ResearchReport) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

// ---------------------------------------------------------------------------
// companies / history / status
// ---------------------------------------------------------------------------

async fn cmd_companies(db: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config, db).await?;
    let companies = storage.distinct_companies().await?;

    if companies.is_empty() {
        println!("No companies researched yet. Try: interviewprep research <COMPANY>");
        return Ok(());
    }
    for company in companies {
        println!("{company}");
    }
    Ok(())
}

async fn cmd_history(company: &str, role: Option<&str>, limit: u32, db: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let role = role.unwrap_or(&config.defaults.role);
    let storage = open_storage(&config, db).await?;
    let key = CacheKey::new(company, role);
    let reports = storage.list_reports(&key, limit).await?;

    if reports.is_empty() {
        println!("No reports for {company} ({role}).");
        return Ok(());
    }

    println!("  {:<36}  {:<16}  {:<6}  {:>4}  DATA", "REPORT", "GENERATED", "LEVEL", "DAYS");
    for report in reports {
        println!(
            "  {:<36}  {:<16}  {:<6}  {:>4}  {}",
            report.id,
            report.generated_at.format("%Y-%m-%d %H:%M").to_string(),
            truncate(&report.query.experience_level, 6),
            report.query.days_to_prepare,
            if report.cache_hit { "cached" } else { "fresh" },
        );
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

async fn cmd_status(db: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config, db).await?;
    let healthy = storage.health_check().await;
    let stats = storage.stats().await?;
    let registry = FetcherRegistry::new().with_http_sources(
        &config.sources,
        PipelineConfig::from(&config).fetch_timeout,
    )?;
    let api_key_set = std::env::var(&config.openrouter.api_key_env)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false);

    println!();
    println!("  Config:    {}", config_file_path()?.display());
    println!("  Database:  {}", storage.path().display());
    println!("  Health:    {}", if healthy { "ok" } else { "unreachable" });
    println!("  Companies: {}", stats.companies);
    println!("  Records:   {}", stats.source_records);
    println!("  Reports:   {}", stats.reports);
    println!("  Sources:   {}", registry.names().join(", "));
    println!(
        "  Model:     {} ({} {})",
        config.openrouter.default_model,
        config.openrouter.api_key_env,
        if api_key_set { "set" } else { "not set" }
    );
    println!();

    if !healthy {
        return Err(eyre!("database at {} failed its health check", storage.path().display()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
