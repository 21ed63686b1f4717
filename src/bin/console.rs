//! hbnb console binary.
//!
//! Picks the storage backend from configuration, establishes it, and hands it
//! to the console. Nothing after this point knows which backend is in use.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Parser;
use hbnb::config::{Config, StorageKind};
use hbnb::console::Console;
use hbnb::storage::{FileStorage, SqliteStorage, Storage};
use miette::{IntoDiagnostic, Result};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "hbnb")]
#[command(author, version, about = "hbnb object console", long_about = None)]
struct Cli {
    /// Storage backend (default: HBNB_TYPE_STORAGE env or file)
    #[arg(long, value_enum)]
    storage: Option<StorageKind>,

    /// JSON file for the file backend (default: HBNB_FILE_PATH env or file.json)
    #[arg(long)]
    file: Option<PathBuf>,

    /// SQLite database for the db backend (default: HBNB_DB_PATH env or hbnb.db)
    #[arg(long)]
    db: Option<PathBuf>,
}

/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hbnb=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn serve<S: Storage>(mut storage: S) -> Result<()> {
    storage.reload().await?;

    let stdin = tokio::io::stdin();
    let interactive = std::io::stdin().is_terminal();
    let mut console = Console::new(storage).with_prompt(interactive);
    let mut stdout = std::io::stdout();
    console.run(BufReader::new(stdin), &mut stdout).await?;

    console.into_storage().close().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(storage) = cli.storage {
        config = config.with_storage(storage);
    }
    if let Some(file) = cli.file {
        config = config.with_file_path(file);
    }
    if let Some(db) = cli.db {
        config = config.with_db_path(db);
    }

    match config.storage {
        StorageKind::File => {
            info!(path = %config.file_path.display(), "Using file storage");
            serve(FileStorage::open(config.file_path)).await
        }
        StorageKind::Db => {
            info!(path = %config.db_path.display(), "Using database storage");
            if let Some(parent) = config.db_path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).into_diagnostic()?;
            }
            let storage = SqliteStorage::open(&config.db_path)
                .await?
                .with_reset(config.reset_on_open);
            serve(storage).await
        }
    }
}
