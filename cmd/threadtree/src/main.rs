//! # threadtree
//!
//! Command-line entry point: loads settings, connects to Postgres and runs
//! one post operation, printing the result as JSON on stdout.

mod seed;
mod telemetry;

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use configs::Settings;
use domains::{DomainError, ErrorKind, ListOptions, NewPost, PostId, SortMode};
use secrecy::ExposeSecret;
use serde::Serialize;
use services::PostService;
use storage_adapters::postgres::{self, DatabaseOptions, PgPostRepository, PgThreadGateway};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "threadtree", version, about = "Threaded forum posts on a materialized path")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply database migrations and exit
    Migrate,
    /// Create a demo forum and thread and fill it with a small reply tree
    Seed {
        #[arg(long, default_value = "rust")]
        forum: String,
        #[arg(long, default_value = "ownership")]
        thread: String,
    },
    /// Create posts in a thread from a JSON array on stdin
    Create {
        /// Thread slug or numeric id
        thread: String,
    },
    /// List one page of a thread
    List {
        /// Thread slug or numeric id
        thread: String,
        /// flat, tree or parent_tree
        #[arg(long, default_value = "flat")]
        sort: String,
        #[arg(long)]
        since: Option<PostId>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        desc: bool,
    },
    /// Show a single post
    Post { id: PostId },
    /// Show forum and service post counters
    Status { forum: String },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Exit status for a failed command; domain failures get distinct codes.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<DomainError>().map(DomainError::kind) {
        Some(ErrorKind::NotFound) => 2,
        Some(ErrorKind::Conflict) => 3,
        Some(ErrorKind::BadRequest) => 4,
        Some(ErrorKind::Internal) | None => 1,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("loading settings: {err}");
            return ExitCode::FAILURE;
        }
    };
    telemetry::init(&settings.log);

    match run(cli, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("command failed: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn run(cli: Cli, settings: Settings) -> anyhow::Result<()> {
    let options = DatabaseOptions {
        url: settings.database.url.expose_secret().to_string(),
        max_connections: settings.database.max_connections,
        acquire_timeout: settings.database.acquire_timeout(),
    };
    let pool = postgres::connect(&options).await.context("connecting to postgres")?;

    if let Command::Migrate = cli.command {
        postgres::migrate(&pool).await?;
        return Ok(());
    }
    if settings.database.run_migrations {
        postgres::migrate(&pool).await?;
    }

    let service = PostService::new(
        Arc::new(PgThreadGateway::new(pool.clone())),
        Arc::new(PgPostRepository::new(pool.clone())),
    );

    match cli.command {
        Command::Migrate => {}
        Command::Seed { forum, thread } => {
            let id = seed::ensure_thread(&pool, &forum, &thread).await?;
            info!(%forum, %thread, id, "thread ready");
            let created = seed::reply_tree(&service, &thread).await?;
            print_json(&created)?;
        }
        Command::Create { thread } => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            let posts: Vec<NewPost> = serde_json::from_str(&input).context("parsing posts from stdin")?;
            let created = service.create_posts(&thread, posts).await?;
            print_json(&created)?;
        }
        Command::List { thread, sort, since, limit, desc } => {
            let sort: SortMode = sort.parse()?;
            let options = ListOptions { since, limit, desc };
            let posts = service.list_posts(&thread, sort, options).await?;
            print_json(&posts)?;
        }
        Command::Post { id } => print_json(&service.post_details(id).await?)?,
        Command::Status { forum } => print_json(&service.post_counters(&forum).await?)?,
    }

    pool.close().await;
    Ok(())
}
