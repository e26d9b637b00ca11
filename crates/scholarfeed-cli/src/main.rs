use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use scholarfeed_core::{AppConfig, CoreError, Database, ExitCode, PublicationRecord};
use scholarfeed_science::{
    HarvestOptions, Harvester, RecordParser, RunSummary, ScholarSearch, ScienceError, SerpApiSource,
    WeeklyRoster, filter_valid, parse_author_list,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "scholarfeed",
    about = "Daily Google Scholar harvester for a rotating set of authors",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts and schedulers).
    /// Also enabled by setting SCHOLARFEED_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest up to three new publications for each of three authors.
    Harvest {
        /// Comma-separated author names, e.g. "Ada Lovelace, Alan Turing, Grace Hopper".
        #[arg(required_unless_present = "today", conflicts_with = "today")]
        authors: Option<String>,

        /// Use today's authors from the weekly roster.
        #[arg(long)]
        today: bool,
    },

    /// Report storage reachability and whether the API key is configured.
    Health,

    /// List stored publications, newest first.
    List {
        #[arg(long, default_value = "50")]
        limit: usize,
        #[arg(long, default_value = "0")]
        offset: usize,
    },

    /// Show one stored publication.
    Show { id: i64 },

    /// Show storage statistics.
    Stats,

    /// Soft-delete a stored publication.
    Delete {
        id: i64,
        #[arg(long)]
        confirm: bool,
    },

    /// Fetch works citing the given cites id (nothing is stored).
    CitedBy { cites_id: String },

    /// Fetch all versions of the given cluster id (nothing is stored).
    Versions { cluster_id: String },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

// ─── Config Actions ──────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all config values.
    List,
    /// Show the config file and database locations.
    Path,
}

// ─── Failures ────────────────────────────────────────────────────────────────

/// A command failure, already classified for the output envelope and exit code.
#[derive(Debug)]
struct Failure {
    kind: &'static str,
    code: ExitCode,
    message: String,
}

impl Failure {
    fn new(kind: &'static str, code: ExitCode, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }
}

impl From<CoreError> for Failure {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::PublicationNotFound(_) => Self::new("not_found", ExitCode::NotFound, message),
            CoreError::Database(_) | CoreError::Io(_) | CoreError::DuplicatePublication(_) => {
                Self::new("storage", ExitCode::StorageError, message)
            }
            _ => Self::new("internal", ExitCode::GeneralError, message),
        }
    }
}

impl From<ScienceError> for Failure {
    fn from(err: ScienceError) -> Self {
        match err {
            ScienceError::Storage(core) => core.into(),
            ScienceError::Validation(_) => Self::new("validation", ExitCode::InvalidArgs, err.to_string()),
            ref e if e.is_transport() || e.is_remote() => {
                Self::new("gateway", ExitCode::NetworkError, err.to_string())
            }
            ScienceError::MissingApiKey(_) | ScienceError::Parse(_) => {
                Self::new("gateway", ExitCode::NetworkError, err.to_string())
            }
            _ => Self::new("internal", ExitCode::GeneralError, err.to_string()),
        }
    }
}

// ─── Output ──────────────────────────────────────────────────────────────────

struct Output {
    json: bool,
    start: Instant,
}

impl Output {
    fn duration_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    fn success(&self, data: serde_json::Value) -> Result<()> {
        print_json(&json!({
            "success": true,
            "data": data,
            "meta": { "duration_ms": self.duration_ms() }
        }))
    }

    fn fail(&self, failure: Failure) -> ! {
        if self.json {
            let envelope = json!({
                "success": false,
                "error": failure.kind,
                "message": failure.message,
                "meta": { "duration_ms": self.duration_ms() }
            });
            if let Ok(text) = serde_json::to_string_pretty(&envelope) {
                println!("{text}");
            }
        } else {
            eprintln!("Error ({}): {}", failure.kind, failure.message);
        }
        std::process::exit(failure.code as i32);
    }
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let out = Output {
        json: cli.json || std::env::var("SCHOLARFEED_JSON").as_deref() == Ok("1"),
        start: Instant::now(),
    };

    // Honors SCHOLARFEED_CONFIG and SCHOLARFEED_DATA_DIR.
    let config = AppConfig::load().unwrap_or_else(|e| out.fail(e.into()));

    match cli.command {
        // ── Harvest ────────────────────────────────────────────────────────
        Commands::Harvest { authors, today } => {
            let names = resolve_authors(&config, authors.as_deref(), today)
                .unwrap_or_else(|e| out.fail(e.into()));
            let summary = run_harvest(&config, &names).await.unwrap_or_else(|f| out.fail(f));

            if out.json {
                out.success(serde_json::to_value(&summary)?)?;
            } else {
                print_summary(&summary);
            }
        }

        // ── Health ─────────────────────────────────────────────────────────
        Commands::Health => {
            let storage = open_db(&config).and_then(|db| {
                db.ping()?;
                Ok(db.path().unwrap_or(":memory:").to_string())
            });
            let db_path = match &storage {
                Ok(path) => path.clone(),
                Err(_) => config.database_path().to_string_lossy().to_string(),
            };
            let api_key_configured = config.search.api_key().is_some();

            if out.json {
                out.success(json!({
                    "storage": {
                        "ok": storage.is_ok(),
                        "path": db_path,
                        "error": storage.as_ref().err().map(ToString::to_string),
                    },
                    "api_key_configured": api_key_configured,
                    "api_key_env": config.search.api_key_env,
                }))?;
            } else {
                match &storage {
                    Ok(path) => println!("✓ Storage: {path}"),
                    Err(e) => println!("✗ Storage: {e}"),
                }
                if api_key_configured {
                    println!("✓ API key: {} is set", config.search.api_key_env);
                } else {
                    println!("✗ API key: {} is not set", config.search.api_key_env);
                }
            }

            if storage.is_err() {
                std::process::exit(ExitCode::StorageError as i32);
            }
        }

        // ── Read paths ─────────────────────────────────────────────────────
        Commands::List { limit, offset } => {
            let db = open_db(&config).unwrap_or_else(|e| out.fail(e.into()));
            let items = db.list_publications(limit, offset).unwrap_or_else(|e| out.fail(e.into()));

            if out.json {
                let total = db.count_publications().unwrap_or_else(|e| out.fail(e.into()));
                out.success(json!({ "items": items, "total": total, "limit": limit, "offset": offset }))?;
            } else if items.is_empty() {
                println!("No publications stored. Use `scholarfeed harvest` to collect some.");
            } else {
                for item in &items {
                    let year = item.record.publication_year.map(|y| y.to_string()).unwrap_or_default();
                    println!(
                        "{id:>6}  {year:<4}  {cites:>6}  {title}",
                        id = item.id,
                        cites = item.record.citation_count,
                        title = item.record.title,
                    );
                }
            }
        }

        Commands::Show { id } => {
            let db = open_db(&config).unwrap_or_else(|e| out.fail(e.into()));
            let publication = db.get_publication(id).unwrap_or_else(|e| out.fail(e.into()));

            if out.json {
                out.success(serde_json::to_value(&publication)?)?;
            } else {
                println!("{}", serde_json::to_string_pretty(&publication)?);
            }
        }

        Commands::Stats => {
            let db = open_db(&config).unwrap_or_else(|e| out.fail(e.into()));
            let stats = db.stats().unwrap_or_else(|e| out.fail(e.into()));

            if out.json {
                out.success(serde_json::to_value(&stats)?)?;
            } else {
                let years = match (stats.oldest_year, stats.newest_year) {
                    (Some(oldest), Some(newest)) => format!("{oldest}–{newest}"),
                    _ => "n/a".to_string(),
                };
                println!("Storage statistics:");
                println!("  Publications:    {}", stats.total);
                println!("  Soft-deleted:    {}", stats.deleted);
                println!("  With PDF:        {}", stats.with_pdf);
                println!("  With year:       {}", stats.with_year);
                println!("  Total citations: {}", stats.total_citations);
                println!("  Years:           {years}");
            }
        }

        Commands::Delete { id, confirm } => {
            if !confirm {
                out.fail(Failure::new(
                    "confirm_required",
                    ExitCode::ConfirmRequired,
                    "add --confirm to delete",
                ));
            }
            let db = open_db(&config).unwrap_or_else(|e| out.fail(e.into()));
            db.soft_delete_publication(id).unwrap_or_else(|e| out.fail(e.into()));
            info!(id, "publication soft-deleted");

            if out.json {
                out.success(json!({ "deleted": id }))?;
            } else {
                println!("Deleted publication: {id}");
            }
        }

        // ── Follow-up queries ──────────────────────────────────────────────
        Commands::CitedBy { cites_id } => {
            let records = follow_up(&config, FollowUp::CitedBy(&cites_id))
                .await
                .unwrap_or_else(|e| out.fail(e.into()));
            print_records(&out, &records)?;
        }

        Commands::Versions { cluster_id } => {
            let records = follow_up(&config, FollowUp::Versions(&cluster_id))
                .await
                .unwrap_or_else(|e| out.fail(e.into()));
            print_records(&out, &records)?;
        }

        // ── Config ─────────────────────────────────────────────────────────
        Commands::Config { action } => match action {
            ConfigAction::List => {
                let kv = config_key_values(&config);
                if out.json {
                    out.success(serde_json::to_value(&kv)?)?;
                } else {
                    for (k, v) in &kv {
                        println!("{k} = {v}");
                    }
                }
            }
            ConfigAction::Path => {
                let config_path = AppConfig::config_path();
                let db_path = config.database_path();
                if out.json {
                    out.success(json!({ "config": config_path, "database": db_path }))?;
                } else {
                    println!("config:   {}", config_path.display());
                    println!("database: {}", db_path.display());
                }
            }
        },
    }

    Ok(())
}

// ─── Harvest ─────────────────────────────────────────────────────────────────

fn resolve_authors(
    config: &AppConfig,
    authors: Option<&str>,
    today: bool,
) -> scholarfeed_science::Result<Vec<String>> {
    if today {
        let roster = WeeklyRoster::from_config(&config.roster, config.harvest.authors_per_run)?;
        return roster.authors_for(Local::now().weekday());
    }
    match authors {
        Some(list) => Ok(parse_author_list(list)),
        None => Err(ScienceError::Validation(
            "provide a comma-separated author list or --today".to_string(),
        )),
    }
}

async fn run_harvest(config: &AppConfig, names: &[String]) -> std::result::Result<RunSummary, Failure> {
    let db = open_db(config)?;
    let search = SerpApiSource::from_config(&config.search)?;
    if !search.is_configured() {
        warn!(env = %config.search.api_key_env, "API key not set; every author will fail");
    }

    let harvester = Harvester::new(
        Arc::new(search),
        RecordParser::new(),
        Arc::new(db),
        HarvestOptions::from(&config.harvest),
    )
    .with_shutdown(shutdown_on_ctrl_c());

    Ok(harvester.run(names).await?)
}

/// Flips to `true` on Ctrl-C so the pause between authors ends the run early.
fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current author");
            let _ = tx.send(true);
        }
    });
    rx
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Harvest finished: {} saved, {} already stored, {} fetched",
        summary.total_saved, summary.total_already_exists, summary.total_fetched
    );
    for author in &summary.authors {
        match &author.error {
            Some(err) => println!("  ✗ {:<30} {err}", author.author),
            None => println!(
                "  ✓ {:<30} fetched {:>2}  saved {}  existing {}",
                author.author, author.fetched, author.saved, author.already_exists
            ),
        }
        for saved in &author.saved_records {
            println!("      #{:<6} {} ({} citations)", saved.id, saved.title, saved.citation_count);
        }
    }
    if summary.cancelled {
        println!("Run was cancelled before all authors were processed.");
    }
}

// ─── Follow-up queries ───────────────────────────────────────────────────────

enum FollowUp<'a> {
    CitedBy(&'a str),
    Versions(&'a str),
}

async fn follow_up(config: &AppConfig, query: FollowUp<'_>) -> scholarfeed_science::Result<Vec<PublicationRecord>> {
    let search = SerpApiSource::from_config(&config.search)?;
    let raw = match query {
        FollowUp::CitedBy(id) => search.get_cited_by(id).await?,
        FollowUp::Versions(id) => search.get_all_versions(id).await?,
    };
    let parser = RecordParser::new();
    Ok(filter_valid(parser.parse_all(&raw.items))
        .into_iter()
        .map(|record| record.sanitized())
        .collect())
}

fn print_records(out: &Output, records: &[PublicationRecord]) -> Result<()> {
    if out.json {
        return out.success(json!({ "items": records, "total": records.len() }));
    }
    if records.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for record in records {
        let year = record.publication_year.map(|y| y.to_string()).unwrap_or_default();
        println!("{year:<4}  {:>6}  {}  [{}]", record.citation_count, record.title, record.external_id);
    }
    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn open_db(config: &AppConfig) -> scholarfeed_core::Result<Database> {
    Database::open(&config.database_path())
}

fn config_key_values(config: &AppConfig) -> BTreeMap<&'static str, String> {
    let mut map = BTreeMap::new();
    map.insert("core.data_dir", config.core.data_dir.clone());
    map.insert("database_path", config.database_path().to_string_lossy().to_string());
    map.insert("search.base_url", config.search.base_url.clone());
    map.insert("search.engine", config.search.engine.clone());
    map.insert("search.api_key_env", config.search.api_key_env.clone());
    map.insert("search.page_size", config.search.page_size.to_string());
    map.insert("search.timeout_secs", config.search.timeout_secs.to_string());
    map.insert("harvest.authors_per_run", config.harvest.authors_per_run.to_string());
    map.insert("harvest.per_author_cap", config.harvest.per_author_cap.to_string());
    map.insert("harvest.inter_author_delay_ms", config.harvest.inter_author_delay_ms.to_string());
    map.insert("roster.days", config.roster.keys().cloned().collect::<Vec<_>>().join(","));
    map
}
