use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use ram::catalogue::{HttpTestCatalogue, TestCatalogue};
use ram::config::RamConfig;
use ram::dictionary::{DictionaryCategory, DictionaryService};
use ram::service::ExecutionService;

#[derive(Parser)]
#[command(
    name = "ram",
    about = "Report Analysis Management for automated test executions",
    version,
    long_about = None
)]
struct Cli {
    /// Configuration file (defaults: $RAM_CONFIG, /etc/ram/ram.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon (API server + archive job)
    Serve {
        /// Bind address, overrides [server] bind
        #[arg(long)]
        bind: Option<String>,
    },

    /// Inspect dictionaries
    Dictionary {
        #[command(subcommand)]
        action: DictionaryAction,
    },

    /// Render the report of one execution request
    Report {
        /// Execution request id
        #[arg(long)]
        execution_request: Uuid,

        /// Output file path (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "html")]
        format: ReportFormat,
    },

    /// Archive finished execution requests now
    Archive {
        /// Retention in days, overrides [archive] retention_days
        #[arg(long)]
        retention_days: Option<u32>,
    },
}

#[derive(Subcommand)]
enum DictionaryAction {
    /// List dictionary entries, built-in ones first
    List {
        /// Category name, e.g. "Root Cause" (all categories when omitted)
        #[arg(long)]
        category: Option<String>,

        /// Database file, overrides [storage] db_path
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Html,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // The global subscriber depends on [logging], so config lookup warnings
    // go through a plain stderr subscriber.
    let startup = tracing_subscriber::fmt().with_writer(std::io::stderr).finish();
    let mut config =
        tracing::subscriber::with_default(startup, || RamConfig::resolve(cli.config.as_deref()))?;
    ram::init_tracing(&config.logging);

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            tracing::info!(bind = %config.server.bind, "Starting RAM daemon");
            ram::serve(config).await?;
        }
        Commands::Dictionary { action } => match action {
            DictionaryAction::List { category, db } => {
                let db_path = db.unwrap_or(config.storage.db_path);
                let dictionary = DictionaryService::new(ram::storage::open_pool(&db_path)?);

                let categories: Vec<String> = match category {
                    Some(c) => vec![c],
                    None => DictionaryCategory::ALL
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect(),
                };
                println!("{:<36} | {:<16} | {:<20} | Built-in", "Id", "Category", "Name");
                println!("{:-<36}-|-{:-<16}-|-{:-<20}-|-{:-<8}", "", "", "", "");
                for category in categories {
                    for entry in dictionary.list_category(&category)? {
                        println!(
                            "{:<36} | {:<16} | {:<20} | {}",
                            entry.id, entry.category, entry.name, entry.built_in
                        );
                    }
                }
            }
        },
        Commands::Report {
            execution_request,
            output,
            format,
        } => {
            let pool = ram::storage::open_pool(&config.storage.db_path)?;
            let executions = ExecutionService::new(pool);
            let catalogue: Arc<dyn TestCatalogue> =
                Arc::new(HttpTestCatalogue::new(&config.catalogue)?);

            let report =
                ram::report::assemble(&executions, catalogue.as_ref(), execution_request).await?;
            let rendered = match format {
                ReportFormat::Html => ram::report::html::render(&report)?,
                ReportFormat::Text => report.render_text(),
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("Report written to {}", path.display());
                }
                None => print!("{}", rendered),
            }
        }
        Commands::Archive { retention_days } => {
            if let Some(days) = retention_days {
                config.archive.retention_days = days;
            }
            let pool = ram::storage::open_pool(&config.storage.db_path)?;
            let job = ram::archive::ArchiveJob::new(&config.archive, ExecutionService::new(pool))?;
            let archived = job.run_once(Utc::now())?;
            println!(
                "Archived {} execution request(s) finished more than {} day(s) ago.",
                archived, config.archive.retention_days
            );
        }
    }

    Ok(())
}
