use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use structscope::config::Config;
use structscope::db::Db;
use structscope::listing::ListingParams;
use structscope::mcp::server::{McpContext, McpServer};
use tokio::sync::Mutex as TokioMutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "structscope", version, about = "Browse struct layouts and member usage")]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, short, default_value = "")]
    config: String,

    /// Record store to open (overrides db_path from the config)
    #[arg(long)]
    db: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the listings as MCP tools over stdio (default)
    Serve,
    /// List structs, e.g. `structs filter=inode nopacked order=line`
    Structs { params: Vec<String> },
    /// List members, e.g. `members unused=1 filter_struct=sk_buff`
    Members { params: Vec<String> },
    /// List uses, e.g. `uses access=store filter_file=net/`
    Uses { params: Vec<String> },
    /// Show one struct with its nested members
    Show { id: i64, params: Vec<String> },
    /// Show one member with a page of its uses
    Member { id: i64, params: Vec<String> },
    /// List scan runs
    Runs,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the MCP protocol and command output, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve);

    // 1. Load config; only the long-running server leaves a template behind
    if matches!(command, Command::Serve) {
        if let Err(e) = Config::write_template(&cli.config) {
            tracing::warn!("Failed to generate config template: {e}");
        }
    }
    let mut config = Config::load(&cli.config)?;
    if let Some(db_path) = cli.db {
        config.db_path = db_path;
    }
    config.validate().context("Invalid configuration")?;

    // 2. Open the record store
    let db = Db::open_read_only(&config.db_path, config.busy_timeout())
        .with_context(|| format!("Failed to open record store {}", config.db_path))?;
    let limits = config.listing.clone();

    // 3. Dispatch
    match command {
        Command::Serve => {
            tracing::info!("Starting structscope MCP server...");
            let ctx = McpContext {
                db: Arc::new(TokioMutex::new(db)),
                config: Arc::new(config),
            };
            McpServer::new(ctx).start().await?;
        }
        Command::Structs { params } => {
            let req = ListingParams::from_pairs(params).structs();
            print_json(&db.list_structs(&req, limits.structs)?)?;
        }
        Command::Members { params } => {
            let req = ListingParams::from_pairs(params).members();
            print_json(&db.list_members(&req, limits.members)?)?;
        }
        Command::Uses { params } => {
            let req = ListingParams::from_pairs(params).uses();
            print_json(&db.list_uses(&req, limits.uses)?)?;
        }
        Command::Show { id, params } => {
            let filter = ListingParams::from_pairs(params).detail_filter();
            print_json(&db.show_struct(id, filter)?)?;
        }
        Command::Member { id, params } => {
            let req = ListingParams::from_pairs(params).uses();
            print_json(&db.show_member(id, &req, limits.uses)?)?;
        }
        Command::Runs => print_json(&db.list_runs()?)?,
    }

    Ok(())
}
