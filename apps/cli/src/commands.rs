//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Datelike;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use legisharvest_core::{
    HarvestOutcome, HarvestProgress, HearingsConfig, HearingsHarvester, MembersConfig,
    RosterIngester, congress_number_from_year,
};
use legisharvest_fetch::{FetchOptions, HttpFetcher};
use legisharvest_shared::{
    AppConfig, CONGRESS_NUMBER_KEY, Chamber, init_config, load_config, load_config_from,
};
use legisharvest_storage::{CheckpointStore, Storage};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// LegisHarvest: harvest congressional hearings and rosters.
#[derive(Parser)]
#[command(
    name = "legisharvest",
    version,
    about = "Harvest congressional committee hearings and member rosters into a local index.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.legisharvest/legisharvest.toml).
    #[arg(long, global = true, env = "LEGISHARVEST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Which index a command targets.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum IndexKind {
    Hearings,
    Members,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run one time-boxed, resumable hearings harvest.
    Hearings {
        /// Wall-clock budget in seconds (overrides config).
        #[arg(long)]
        budget_secs: Option<u64>,

        /// Oldest congress number to visit (overrides config).
        #[arg(long)]
        floor: Option<u32>,

        /// Calendar year used for the current congress (defaults to today).
        #[arg(long)]
        year: Option<i32>,
    },

    /// Refresh the House and Senate rosters.
    Members,

    /// Inspect or change the hearings resume cursor.
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointAction,
    },

    /// Full-text search over harvested documents.
    Search {
        /// FTS5 query.
        query: String,

        /// Index to search.
        #[arg(long, value_enum, default_value = "hearings")]
        index: IndexKind,

        /// Maximum hits to print.
        #[arg(short, long, default_value = "10")]
        limit: u32,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Checkpoint subcommands.
#[derive(Subcommand)]
pub(crate) enum CheckpointAction {
    /// Print the stored congress number.
    Show,
    /// Store a congress number; the next run resumes there.
    Set { congress: u32 },
    /// Reset to the current congress so the next run starts a fresh sweep.
    Reset {
        /// Calendar year used for the current congress (defaults to today).
        #[arg(long)]
        year: Option<i32>,
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
        0 => "legisharvest=info",
        1 => "legisharvest=debug",
        _ => "legisharvest=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Hearings {
            budget_secs,
            floor,
            year,
        } => cmd_hearings(config_path, budget_secs, floor, year).await,
        Command::Members => cmd_members(config_path).await,
        Command::Checkpoint { action } => match action {
            CheckpointAction::Show => cmd_checkpoint_show(config_path).await,
            CheckpointAction::Set { congress } => cmd_checkpoint_set(config_path, congress).await,
            CheckpointAction::Reset { year } => cmd_checkpoint_reset(config_path, year).await,
        },
        Command::Search {
            query,
            index,
            limit,
        } => cmd_search(config_path, &query, index, limit).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

async fn open_storage(config: &AppConfig) -> Result<Storage> {
    Ok(Storage::open(&config.db_path()?).await?)
}

fn build_fetcher(config: &AppConfig) -> Result<HttpFetcher> {
    Ok(HttpFetcher::new(&FetchOptions {
        user_agent: config.harvest.user_agent.clone(),
        timeout_secs: config.harvest.request_timeout_secs,
    })?)
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

// ---------------------------------------------------------------------------
// Harvest commands
// ---------------------------------------------------------------------------

async fn cmd_hearings(
    config_path: Option<&Path>,
    budget_secs: Option<u64>,
    floor: Option<u32>,
    year: Option<i32>,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let mut hearings = HearingsConfig::from_app(&config, year.unwrap_or_else(current_year))?;
    if let Some(secs) = budget_secs {
        hearings.time_budget = Duration::from_secs(secs);
    }
    if let Some(floor) = floor {
        hearings.floor = floor;
    }

    info!(
        index = %hearings.index,
        budget_secs = hearings.time_budget.as_secs(),
        floor = hearings.floor,
        "harvesting hearings"
    );

    let fetcher = build_fetcher(&config)?;
    let storage = open_storage(&config).await?;
    let reporter = CliProgress::new();

    let summary = HearingsHarvester::new(hearings, &fetcher, &storage, &storage)
        .with_progress(&reporter)
        .run()
        .await;
    reporter.finish();
    let summary = summary?;

    let outcome = match summary.outcome {
        HarvestOutcome::Completed => "sweep complete",
        HarvestOutcome::BudgetExhausted => "budget exhausted",
    };

    println!();
    println!("  Hearings harvest: {outcome}");
    println!(
        "  Congresses:  {} ({} → {})",
        summary.processed.len(),
        summary.processed.first().map_or_else(|| "-".into(), u32::to_string),
        summary.processed.last().map_or_else(|| "-".into(), u32::to_string),
    );
    println!("  Indexed:     {}", summary.records_indexed);
    println!("  Rejected:    {}", summary.failed_documents);
    println!("  Dropped:     {}", summary.dropped_records);
    println!("  Failed GETs: {}", summary.failed_fetches);
    println!("  Checkpoint:  {}", summary.checkpoint);
    println!("  Time:        {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_members(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let members = MembersConfig::from_app(&config)?;
    let fetcher = build_fetcher(&config)?;
    let storage = open_storage(&config).await?;

    info!(index = %members.index, "refreshing rosters");
    let summary = RosterIngester::new(members, &fetcher, &storage).run().await?;

    println!();
    for report in &summary.chambers {
        match &report.error {
            None => println!(
                "  {:<7} {} indexed, {} rejected",
                report.chamber.as_str(),
                report.indexed,
                report.failed_documents
            ),
            Some(error) => println!("  {:<7} FAILED: {error}", report.chamber.as_str()),
        }
    }
    println!();

    if !summary.is_success() {
        return Err(eyre!("one or more rosters could not be ingested"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Checkpoint commands
// ---------------------------------------------------------------------------

async fn cmd_checkpoint_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let storage = open_storage(&config).await?;

    match storage.read(CONGRESS_NUMBER_KEY).await? {
        Some(value) => println!("{value}"),
        None => println!(
            "unset (next run starts at congress {})",
            congress_number_from_year(current_year())
        ),
    }
    Ok(())
}

async fn cmd_checkpoint_set(config_path: Option<&Path>, congress: u32) -> Result<()> {
    let config = resolve_config(config_path)?;
    let storage = open_storage(&config).await?;

    storage.write(CONGRESS_NUMBER_KEY, i64::from(congress)).await?;
    info!(congress, "checkpoint set");
    println!("Checkpoint set to {congress}");
    Ok(())
}

async fn cmd_checkpoint_reset(config_path: Option<&Path>, year: Option<i32>) -> Result<()> {
    let ceiling = congress_number_from_year(year.unwrap_or_else(current_year));
    cmd_checkpoint_set(config_path, ceiling).await
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

async fn cmd_search(
    config_path: Option<&Path>,
    query: &str,
    index: IndexKind,
    limit: u32,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let storage = Storage::open_readonly(&config.db_path()?)
        .await
        .map_err(|e| eyre!("{e} (run `legisharvest hearings` or `legisharvest members` first)"))?;

    let index_name = match index {
        IndexKind::Hearings => &config.indexes.hearings,
        IndexKind::Members => &config.indexes.members,
    };

    let hits = storage.search(index_name, query, limit).await?;
    if hits.is_empty() {
        println!("No matches in {index_name}.");
        return Ok(());
    }

    for hit in hits {
        println!("{}  ({:.2})", hit.id, hit.score);
        println!("{}", serde_json::to_string_pretty(&hit.document["obj"])?);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
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
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl HarvestProgress for CliProgress {
    fn congress_started(&self, congress: u32, remaining: usize) {
        self.spinner
            .set_message(format!("Congress {congress} ({remaining} left in sweep)"));
    }

    fn fetch_failed(&self, congress: u32, chamber: Chamber, committee: &str) {
        self.spinner
            .println(format!("  skipped {chamber}/{committee} for congress {congress}"));
    }

    fn congress_flushed(&self, congress: u32, records: usize) {
        self.spinner
            .set_message(format!("Congress {congress}: {records} hearings indexed"));
    }
}
