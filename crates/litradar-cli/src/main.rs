use std::time::Instant;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use litradar_core::{
    AddOutcome, AppConfig, CandidateArticle, ExistingReference, ExitCode, LitradarError, SourceKind,
};
use litradar_discovery::{DiscoveryError, FetchOutcome, LitradarService};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "litradar",
    about = "Discover new research articles and curate a reading shortlist",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format. Also enabled by setting LITRADAR_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Operation(Operation),

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Commands served by a [`LitradarService`].
#[derive(Subcommand)]
enum Operation {
    /// Fetch, filter and rank candidates from every enabled source.
    Discover {
        /// Only candidates published within the "new" window.
        #[arg(long)]
        only_new: bool,
    },

    /// Shortlist management.
    Shortlist {
        #[command(subcommand)]
        action: ShortlistAction,
    },

    /// Permanently dismiss a work. Also removes it from the shortlist.
    Dismiss(ArticleArgs),

    /// List dismissed works, newest first.
    Dismissed,

    /// Notify litradar that the catalogue created or updated a reference.
    Reference {
        #[command(subcommand)]
        action: ReferenceAction,
    },
}

#[derive(Subcommand)]
enum ShortlistAction {
    /// Show shortlisted works (dismissed ones excluded).
    List,
    /// Add a work.
    Add(ArticleArgs),
    /// Remove by DOI or title. URL-encoded values are accepted.
    Remove { identifier: String },
}

#[derive(Subcommand)]
enum ReferenceAction {
    Created {
        #[arg(long)]
        doi: Option<String>,
        #[arg(long)]
        title: Option<String>,
    },
    Updated {
        #[arg(long)]
        old_doi: Option<String>,
        #[arg(long)]
        old_title: Option<String>,
        #[arg(long)]
        doi: Option<String>,
        #[arg(long)]
        title: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config as TOML.
    Show,
    /// Write the default config file if none exists.
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct ArticleArgs {
    #[arg(long)]
    doi: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    url: Option<String>,
    #[arg(long, action = clap::ArgAction::Append)]
    author: Vec<String>,
    #[arg(long)]
    year: Option<i32>,
    /// openalex, crossref, semantic_scholar, arxiv, core or manual.
    #[arg(long, default_value = "manual")]
    source: String,
}

impl ArticleArgs {
    fn into_article(self) -> Result<CandidateArticle> {
        let source = SourceKind::parse(&self.source)
            .ok_or_else(|| LitradarError::Validation(format!("unknown source: {}", self.source)))?;
        let mut article = CandidateArticle::new(self.title.unwrap_or_default(), source);
        article.doi = self.doi;
        article.url = self.url;
        article.authors = self.author;
        article.year = self.year;
        article.refresh_keys();
        Ok(article)
    }
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("litradar=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_output = cli.json || std::env::var("LITRADAR_JSON").as_deref() == Ok("1");

    if let Err(err) = run(cli.command, json_output).await {
        let code = exit_code_of(&err);
        if json_output {
            let _ = print_json(&serde_json::json!({
                "status": "error",
                "error": format!("{code:?}"),
                "message": err.to_string(),
            }));
        } else {
            eprintln!("error: {err:#}");
        }
        std::process::exit(code as i32);
    }
}

async fn run(command: Commands, json_output: bool) -> Result<()> {
    let start = Instant::now();
    let config = AppConfig::load()?;
    tracing::debug!(path = %AppConfig::config_path().display(), "config loaded");

    match command {
        Commands::Config { action } => run_config(action, &config, json_output),
        Commands::Operation(operation) => {
            let service = LitradarService::from_config(config)?;
            run_operation(operation, &service, start, json_output).await
        }
    }
}

async fn run_operation(
    operation: Operation,
    service: &LitradarService,
    start: Instant,
    json_output: bool,
) -> Result<()> {
    match operation {
        Operation::Discover { only_new } => {
            let report = service.list_candidates(only_new).await?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": report,
                    "meta": { "duration_ms": dur, "only_new": only_new }
                }))?;
            } else {
                if report.candidates.is_empty() {
                    println!("No new candidates.");
                }
                for c in &report.candidates {
                    let date = c
                        .best_date()
                        .map(|d| {
                            if c.has_exact_date() {
                                d.to_string()
                            } else {
                                d.format("%Y").to_string()
                            }
                        })
                        .unwrap_or_else(|| "----".to_string());
                    println!(
                        "{new:<4} {date:<10}  {source:<16}  {title}",
                        new = if c.is_new { "NEW" } else { "" },
                        source = c.source.as_str(),
                        title = c.title,
                    );
                    if let Some(doi) = &c.doi {
                        println!("{:34}{doi}", "");
                    }
                }
                for d in &report.diagnostics {
                    match &d.outcome {
                        FetchOutcome::Failed { error } => {
                            eprintln!("warning: {} failed for \"{}\": {error}", d.source, d.query)
                        }
                        FetchOutcome::NotConfigured => {
                            eprintln!("note: {} skipped (not configured)", d.source)
                        }
                        FetchOutcome::Ok { .. } => {}
                    }
                }
            }
        }

        Operation::Shortlist { action } => match action {
            ShortlistAction::List => {
                let entries = service.get_shortlist()?;
                let dur = start.elapsed().as_millis();
                if json_output {
                    print_json(&serde_json::json!({
                        "status": "ok",
                        "data": { "items": entries, "total": entries.len() },
                        "meta": { "duration_ms": dur }
                    }))?;
                } else if entries.is_empty() {
                    println!("Shortlist is empty. Use `litradar shortlist add` to add works.");
                } else {
                    for e in &entries {
                        println!(
                            "{added}  {title}  {doi}",
                            added = e.added_at.format("%Y-%m-%d"),
                            title = e.article.title,
                            doi = e.article.doi.as_deref().unwrap_or(""),
                        );
                    }
                }
            }

            ShortlistAction::Add(args) => {
                let article = args.into_article()?;
                let title = article.title.clone();
                let outcome = service.add_to_shortlist(article)?;
                let dur = start.elapsed().as_millis();
                if json_output {
                    print_json(&serde_json::json!({
                        "status": "ok",
                        "data": outcome,
                        "meta": { "duration_ms": dur }
                    }))?;
                } else {
                    match outcome {
                        AddOutcome::Added => println!("Added: {title}"),
                        AddOutcome::SkippedDismissed => {
                            println!("Skipped: \"{title}\" was dismissed earlier")
                        }
                        AddOutcome::Duplicate => println!("Already shortlisted: {title}"),
                    }
                }
            }

            ShortlistAction::Remove { identifier } => {
                let removed = service.remove_from_shortlist(&identifier)?;
                let dur = start.elapsed().as_millis();
                if json_output {
                    print_json(&serde_json::json!({
                        "status": "ok",
                        "data": { "removed": removed },
                        "meta": { "duration_ms": dur }
                    }))?;
                } else if removed {
                    println!("Removed: {identifier}");
                } else {
                    println!("Not on the shortlist: {identifier}");
                }
            }
        },

        Operation::Dismiss(args) => {
            let article = args.into_article()?;
            let outcome = service.dismiss(&article)?;
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": outcome,
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!(
                    "Dismissed ({}), removed {} shortlist entr{}",
                    outcome.record_id,
                    outcome.removed_from_shortlist,
                    if outcome.removed_from_shortlist == 1 { "y" } else { "ies" }
                );
            }
        }

        Operation::Dismissed => {
            let records = service.list_dismissed()?;
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": records, "total": records.len() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if records.is_empty() {
                println!("Nothing dismissed yet.");
            } else {
                for r in &records {
                    println!(
                        "{date}  {title}  {doi}",
                        date = r.date_dismissed.format("%Y-%m-%d"),
                        title = r.title,
                        doi = r.doi.as_deref().unwrap_or(""),
                    );
                }
            }
        }

        Operation::Reference { action } => {
            let removed = match action {
                ReferenceAction::Created { doi, title } => {
                    service.on_reference_created(&reference(doi, title))?
                }
                ReferenceAction::Updated {
                    old_doi,
                    old_title,
                    doi,
                    title,
                } => service
                    .on_reference_updated(&reference(old_doi, old_title), &reference(doi, title))?,
            };
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "removed_from_shortlist": removed },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("Removed {removed} shortlist entries");
            }
        }
    }

    Ok(())
}

fn run_config(action: ConfigAction, config: &AppConfig, json_output: bool) -> Result<()> {
    let path = AppConfig::config_path();
    match action {
        ConfigAction::Show => {
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": config,
                    "meta": { "path": path.display().to_string() }
                }))?;
            } else {
                println!("# {}", path.display());
                println!("{}", toml::to_string_pretty(config)?);
            }
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                return Err(LitradarError::Validation(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                ))
                .into());
            }
            AppConfig::default().save_to(&path)?;
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "path": path.display().to_string() }
                }))?;
            } else {
                println!("Wrote {}", path.display());
            }
        }
    }
    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn reference(doi: Option<String>, title: Option<String>) -> ExistingReference {
    ExistingReference {
        title,
        doi,
        url: None,
    }
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn exit_code_of(err: &anyhow::Error) -> ExitCode {
    if let Some(e) = err.downcast_ref::<DiscoveryError>() {
        return e.exit_code();
    }
    if let Some(e) = err.downcast_ref::<LitradarError>() {
        return e.exit_code();
    }
    ExitCode::GeneralError
}
