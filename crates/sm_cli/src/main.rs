use anyhow::{Context, Result};
use clap::Parser;
use sm_core::BATCH_SIZE;
use sm_inference::config::DEFAULT_HOST;
use sm_inference::{ClientConfig, RemoteClient};
use sm_storage::{HistoryConfig, LocalHistoryStore};
use std::path::PathBuf;
use tracing::{debug, info};

mod commands;
mod config;
mod logging;

use commands::App;
use config::{default_store_path, HumanDuration};

#[derive(Parser, Debug)]
#[command(author, version, about = "Search the pages you visited", long_about = None)]
struct Cli {
    /// Base URL of the retrieval service
    #[arg(long, env = "SURFMIND_HOST", default_value = DEFAULT_HOST)]
    host: String,
    /// State file holding the history, user id and flags
    #[arg(long, env = "SURFMIND_STORE")]
    store: Option<PathBuf>,
    /// Storage backend: file or memory
    #[arg(long, default_value = "file")]
    storage: String,
    /// Longest silence allowed on the search stream (e.g. 30s, 2m, 1m30s)
    #[arg(long, env = "SURFMIND_IDLE_TIMEOUT", default_value = "60s")]
    idle_timeout: HumanDuration,
    #[arg(long, default_value = "10s")]
    connect_timeout: HumanDuration,
    /// Number of pages kept in the local history
    #[arg(long, default_value_t = BATCH_SIZE as u64, value_parser = clap::value_parser!(u64).range(1..))]
    batch_size: u64,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Fetch a page and record it in the history
    Visit { url: String },
    /// Record a page from an HTML file already on disk
    Capture {
        url: String,
        #[arg(long)]
        html: PathBuf,
    },
    /// Show the recorded pages
    List {
        #[arg(long)]
        json: bool,
    },
    /// Forget every recorded page
    Clear,
    /// Print the user id, creating it if needed
    UserId,
    /// Upload the recorded pages to the service
    Sync,
    /// Ask a question about your history, or your bookmarks with --bookmarks
    Search {
        query: String,
        /// Chromium `Bookmarks` file to search instead of the history
        #[arg(long)]
        bookmarks: Option<PathBuf>,
    },
    /// Mark the "what's new" notice as seen
    DismissUpdate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let store_path = cli.store.clone().unwrap_or_else(default_store_path);
    let store = sm_storage::create_store(&cli.storage, Some(&store_path))
        .await
        .with_context(|| format!("Failed to open the {} store", cli.storage))?;
    debug!("💾 Using {} store at {}", cli.storage, store_path.display());

    let history = LocalHistoryStore::with_config(
        store.clone(),
        HistoryConfig {
            batch_size: cli.batch_size as usize,
            ..HistoryConfig::default()
        },
    );

    let client = RemoteClient::new(
        ClientConfig::default()
            .with_host(cli.host.clone())
            .with_idle_timeout(cli.idle_timeout.0)
            .with_connect_timeout(cli.connect_timeout.0),
    )?;

    let mut app = App::initialize(store, history, client).await?;
    if !app.session.state().update_flag {
        info!("✨ What's new: streaming responses, bookmark search, enhanced storage");
    }

    match cli.command {
        Commands::Visit { url } => commands::visit(&app, &url).await?,
        Commands::Capture { url, html } => commands::capture_file(&app, &url, &html).await?,
        Commands::List { json } => commands::list(&app, json).await?,
        Commands::Clear => commands::clear(&app).await?,
        Commands::UserId => println!("{}", app.session.state().user_id),
        Commands::Sync => {
            if commands::sync_history(&mut app).await? {
                println!("✅ History synced");
            }
        }
        Commands::Search { query, bookmarks } => {
            commands::search(&mut app, &query, bookmarks.as_deref()).await?
        }
        Commands::DismissUpdate => commands::dismiss_update(&mut app).await?,
    }

    Ok(())
}
