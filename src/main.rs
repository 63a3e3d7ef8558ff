use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pagekeep::config::{resolve_config_path, AppConfig};
use pagekeep::{logging, App};
use pgk_core::{BookmarkExportBundle, LocalLibrary};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pagekeep")]
#[command(about = "Sync a bookmark archive with a WebDAV folder", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config.json (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync now
    Sync {
        /// Ignore the debounce window
        #[arg(short, long)]
        force: bool,
    },

    /// Show the last sync time and error
    Status,

    /// Write the whole library to a bundle file
    Export {
        /// Destination file
        file: PathBuf,
    },

    /// Add bookmarks from a bundle file; existing URLs are left alone
    Import {
        /// Bundle file produced by `export`
        file: PathBuf,
    },

    /// Sync on a schedule until interrupted
    Watch,

    /// Update WebDAV sync settings; syncs right away if enabled
    Configure {
        /// WebDAV root URL
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long, env = "PAGEKEEP_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Remote folder holding bookmarks.json
        #[arg(long)]
        path: Option<String>,
        /// Permit plaintext http:// endpoints
        #[arg(long)]
        allow_insecure_http: Option<bool>,
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config_path = resolve_config_path(cli.config)?;
    let config = AppConfig::load(&config_path)?;
    let app = App::build(config)?;

    match cli.command {
        Commands::Sync { force } => {
            let result = app.engine.perform_sync(force).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                bail!("sync failed: {}", result.message);
            }
        }
        Commands::Status => {
            let status = app.engine.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Export { file } => {
            let bundle = app.library.export_all().await?;
            std::fs::write(&file, bundle.to_json_vec()?)
                .with_context(|| format!("Failed to write {}", file.display()))?;
            println!("Exported {} bookmarks to {}", bundle.bookmark_count, file.display());
        }
        Commands::Import { file } => {
            let raw = std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let bundle = BookmarkExportBundle::from_json(&raw)?;
            let summary = app.library.import_bookmarks(&bundle).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Watch => {
            let Some(scheduler) = app.start_scheduler() else {
                bail!("scheduleIntervalSecs is 0 in {}; nothing to watch", config_path.display());
            };
            let mut events = app.notifier.subscribe();
            let printer = tokio::spawn(async move {
                while let Ok(event) = events.recv().await {
                    match &event.status.last_sync_error {
                        Some(err) if !event.status.is_syncing => warn!("sync error: {}", err),
                        _ => info!(syncing = event.status.is_syncing, "{}", event.topic),
                    }
                }
            });
            tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
            scheduler.stop();
            printer.abort();
        }
        Commands::Configure {
            url,
            username,
            password,
            path,
            allow_insecure_http,
            enable,
            disable,
        } => {
            let mut settings = app.settings.load_document().await?.sync;
            if let Some(v) = url {
                settings.url = v;
            }
            if let Some(v) = username {
                settings.username = v;
            }
            if let Some(v) = password {
                settings.password = v;
            }
            if let Some(v) = path {
                settings.path = v;
            }
            if let Some(v) = allow_insecure_http {
                settings.allow_insecure_http = v;
            }
            if enable {
                settings.enabled = true;
            }
            if disable {
                settings.enabled = false;
            }
            match app.configure(settings).await? {
                Some(result) => println!("{}", serde_json::to_string_pretty(&result)?),
                None => println!("Sync settings saved (sync disabled)"),
            }
        }
    }

    Ok(())
}
