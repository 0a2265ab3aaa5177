//! Binary entry point for simple-memory.
//!
//! `serve` (the default) runs the MCP server; the other commands make one
//! local call through the same service and print the result.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr/print_stdout in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use simple_memory::config::{MemoryConfig, Transport};
use simple_memory::mcp::{McpServer, NO_MATCHES_TEXT};
use simple_memory::models::{AddMemory, SearchOutcome};
use simple_memory::observability::{self, activity_sink};
use simple_memory::{Error, InMemoryStore, MemoryService, MemoryStore, SqliteMemoryStore};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Exit status when the store cannot be opened.
const EXIT_STORE_UNAVAILABLE: u8 = 2;

/// Exit status after Ctrl-C.
const EXIT_INTERRUPTED: i32 = 130;

/// simple-memory - a persistent note store for AI agents, served over MCP.
#[derive(Parser)]
#[command(name = "simple-memory")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose (debug) diagnostics on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the database path.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Keep memories in process memory only; nothing is persisted.
    #[arg(long, global = true, conflicts_with = "db_path")]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server (default).
    Serve {
        /// Transport: stdio, http or sse.
        #[arg(short, long)]
        transport: Option<Transport>,

        /// Port for the http and sse transports.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Add a memory.
    Add {
        /// The content to store.
        content: String,

        /// Optional title.
        #[arg(long)]
        title: Option<String>,

        /// Optional tags.
        #[arg(long)]
        tags: Option<String>,

        /// Optional status.
        #[arg(long)]
        status: Option<String>,
    },

    /// List every memory, oldest first.
    List,

    /// Find memories containing a substring.
    Search {
        /// Substring to match (case-sensitive).
        query: String,
    },

    /// Delete memories containing a substring.
    Delete {
        /// Substring to match (case-sensitive).
        query: String,
    },

    /// Show the store location and memory count.
    Status,
}

/// Main entry point.
fn main() -> ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load .env: {e}");
        }
    }

    let cli = Cli::parse();

    let mut config = match MemoryConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };
    if let Some(path) = &cli.db_path {
        config.db_path.clone_from(path);
    }
    if !matches!(cli.command, None | Some(Commands::Serve { .. })) {
        config.metrics.enabled = false;
    }

    let _observability = match observability::init(&config, cli.verbose) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };

    match run_command(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let store_unavailable = e
                .downcast_ref::<Error>()
                .is_some_and(Error::is_fatal);
            if store_unavailable {
                ExitCode::from(EXIT_STORE_UNAVAILABLE)
            } else {
                ExitCode::FAILURE
            }
        },
    }
}

/// Opened store plus the concrete `SQLite` handle, if any, for shutdown.
struct OpenedStore {
    store: Arc<dyn MemoryStore>,
    sqlite: Option<Arc<SqliteMemoryStore>>,
}

fn open_store(config: &MemoryConfig, ephemeral: bool) -> Result<OpenedStore, Error> {
    if ephemeral {
        tracing::info!("Using ephemeral in-memory store");
        return Ok(OpenedStore {
            store: Arc::new(InMemoryStore::new()),
            sqlite: None,
        });
    }

    let sqlite = Arc::new(SqliteMemoryStore::open(config.db_path.clone())?);
    tracing::info!(path = %config.db_path.display(), "Opened memory store");
    Ok(OpenedStore {
        store: sqlite.clone(),
        sqlite: Some(sqlite),
    })
}

/// Runs the selected command.
fn run_command(cli: Cli, config: MemoryConfig) -> anyhow::Result<()> {
    let opened = open_store(&config, cli.ephemeral)?;
    let service = MemoryService::new(Arc::clone(&opened.store))
        .with_activity_sink(activity_sink(&config.activity_log));

    match cli.command.unwrap_or(Commands::Serve {
        transport: None,
        port: None,
    }) {
        Commands::Serve { transport, port } => cmd_serve(
            service,
            opened.sqlite,
            transport.unwrap_or(config.transport),
            port.unwrap_or(config.port),
        ),
        Commands::Add {
            content,
            title,
            tags,
            status,
        } => {
            let outcome = service.add(AddMemory {
                content,
                title,
                tags,
                status,
            })?;
            println!("{}", outcome.message());
            Ok(())
        },
        Commands::List => {
            let records = service.list()?;
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(())
        },
        Commands::Search { query } => {
            match service.search(&query)? {
                SearchOutcome::Matches(records) => {
                    println!("{}", serde_json::to_string_pretty(&records)?);
                },
                SearchOutcome::NoMatches => println!("{NO_MATCHES_TEXT}"),
            }
            Ok(())
        },
        Commands::Delete { query } => {
            println!("{}", service.delete(&query)?.message());
            Ok(())
        },
        Commands::Status => {
            println!("{}", serde_json::to_string_pretty(&service.status()?)?);
            Ok(())
        },
    }
}

/// Serve command.
fn cmd_serve(
    service: MemoryService,
    sqlite: Option<Arc<SqliteMemoryStore>>,
    transport: Transport,
    port: u16,
) -> anyhow::Result<()> {
    // The network transports shut down through tokio's signal handling.
    if transport == Transport::Stdio {
        install_shutdown_hook(sqlite)?;
    }

    McpServer::new(Arc::new(service))
        .with_transport(transport)
        .with_port(port)
        .start()
        .with_context(|| format!("{transport} transport failed"))
}

/// Checkpoints the WAL and exits on Ctrl-C.
fn install_shutdown_hook(sqlite: Option<Arc<SqliteMemoryStore>>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        tracing::info!("Interrupted; closing memory store");
        if let Some(store) = &sqlite {
            if let Err(e) = store.checkpoint() {
                tracing::warn!(error = %e, "WAL checkpoint failed during shutdown");
            }
        }
        std::process::exit(EXIT_INTERRUPTED);
    })
    .context("failed to install Ctrl-C handler")
}
