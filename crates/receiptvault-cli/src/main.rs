//! receiptvault CLI
//!
//! Command-line interface over a receipt database

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use receiptvault_core::logging_facility::{self, Profile};
use receiptvault_core::ActorRef;
use receiptvault_store::SqliteReceiptStore;

mod commands;
mod settings;

use commands::Context;
use settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "receiptvault")]
#[command(about = "receiptvault - Versioned fee receipts with a field-level audit trail", long_about = None)]
struct Cli {
    /// Settings file (defaults to ./receiptvault.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file
    #[arg(long, global = true, env = "RECEIPTVAULT_DB")]
    db: Option<PathBuf>,

    /// Who is making the change
    #[arg(long, global = true)]
    actor: Option<String>,

    /// development, production or test
    #[arg(long, global = true)]
    log_profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Ingest a workbook of receipts as one upload batch
    Upload(commands::upload::UploadArgs),
    /// Create, edit, void and inspect a single receipt
    Receipt(commands::receipt::ReceiptArgs),
    /// Upload batch history
    Batch(commands::batch::BatchArgs),
    /// Filtered, paged receipt listing
    Search(commands::search::SearchArgs),
    /// Print a receipt document (Markdown or JSON)
    Render(commands::render::RenderArgs),
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load(cli.config.as_deref())?;

    let profile: Profile = cli
        .log_profile
        .as_deref()
        .unwrap_or(settings.log_profile.as_str())
        .parse()?;
    logging_facility::init(profile);

    let db_path = cli.db.unwrap_or(settings.database_path);
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let store = Arc::new(SqliteReceiptStore::open(&db_path)?);
    let actor = cli.actor.or(settings.default_actor).map(ActorRef::new);
    let ctx = Context::new(store, actor);

    match cli.command {
        Commands::Upload(args) => commands::upload::execute(args, &ctx),
        Commands::Receipt(args) => commands::receipt::execute(args, &ctx),
        Commands::Batch(args) => commands::batch::execute(args, &ctx),
        Commands::Search(args) => commands::search::execute(args, &ctx),
        Commands::Render(args) => commands::render::execute(args, &ctx),
    }
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
