//! localstore inspector CLI.
//!
//! Opens a storage file with the same configuration the application
//! uses, then shows, edits, or clears its content.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use localstore_storage::LocalStore;
use localstore_types::config::StoreConfig;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Inspect and edit encrypted local storage files.
#[derive(Parser)]
#[command(name = "localstore", version, about)]
struct Cli {
    /// Load store settings from a JSON config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory holding the storage file (overrides the config).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Storage file name inside the data directory (overrides the config).
    #[arg(long, global = true)]
    file: Option<String>,

    /// Encryption passphrase (overrides the config).
    #[arg(long, global = true, env = "LOCALSTORE_PASSPHRASE", hide_env_values = true)]
    passphrase: Option<String>,

    /// Output in JSON format (no colors, machine-readable).
    #[arg(long, global = true)]
    json: bool,

    /// Log store activity, including decrypted content, to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the data directory, storage path, and key count.
    Info,
    /// List stored keys with their value kinds.
    #[command(alias = "ls")]
    List,
    /// Print one value.
    Get {
        /// Key to read.
        key: String,
    },
    /// Store a value and save. VALUE is parsed as JSON, falling back to a
    /// plain string.
    Set {
        /// Key to write.
        key: String,
        /// Value to store.
        value: String,
    },
    /// Delete a key and save.
    #[command(alias = "rm")]
    Delete {
        /// Key to delete.
        key: String,
    },
    /// Delete every key and save the empty store.
    Clear,
    /// Print the decrypted content as JSON.
    Dump,
    /// Delete the storage file from disk.
    RemoveFile,
}

// ---------------------------------------------------------------------------
// Global options passed to every command handler
// ---------------------------------------------------------------------------

/// Shared options threaded into command handlers.
pub struct GlobalOpts {
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let opts = GlobalOpts { json: cli.json };

    let result = resolve_config(&cli).and_then(|config| {
        let mut store = LocalStore::new(config).map_err(|e| e.to_string())?;
        tracing::debug!(path = %store.storage_path().display(), "using storage file");
        dispatch(&mut store, &opts, cli.command)
    });

    if let Err(e) = result {
        output::print_error(&e, opts.json);
        std::process::exit(1);
    }
}

/// Builds the store configuration: config file (or defaults), then CLI
/// overrides.
fn resolve_config(cli: &Cli) -> std::result::Result<StoreConfig, String> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path).map_err(|e| e.to_string())?,
        None => StoreConfig::default(),
    };

    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if let Some(file) = &cli.file {
        config.storage_file_name = file.clone();
    }
    if let Some(passphrase) = &cli.passphrase {
        config.encryption_passphrase = passphrase.clone();
    }
    if cli.verbose {
        config.log_enabled = true;
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn dispatch(
    store: &mut LocalStore,
    opts: &GlobalOpts,
    cmd: Commands,
) -> std::result::Result<(), String> {
    match cmd {
        Commands::Info => commands::inspect::info(store, opts),
        Commands::List => commands::inspect::list(store, opts),
        Commands::Get { key } => commands::inspect::get(store, opts, &key),
        Commands::Dump => commands::inspect::dump(store, opts),
        Commands::Set { key, value } => commands::edit::set(store, opts, &key, &value),
        Commands::Delete { key } => commands::edit::delete(store, opts, &key),
        Commands::Clear => commands::edit::clear(store, opts),
        Commands::RemoveFile => commands::edit::remove_file(store, opts),
    }
}
