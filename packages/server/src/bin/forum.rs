//! Forum command line
//!
//! Thin front end over the library actions. Every command prints JSON on
//! stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use forum_core::common::PostId;
use forum_core::config::Config;
use forum_core::domains::posts::actions::{add_comment, create_post, flag_post, toggle_like};
use forum_core::domains::posts::models::{Comment, Post};
use forum_core::domains::users::User;
use forum_core::kernel::ServerKernel;
use serde::Serialize;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "forum")]
#[command(about = "Forum backend CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,

    /// Register a user
    CreateUser {
        username: String,
        #[arg(long)]
        moderator: bool,
    },

    /// Publish a post; waits for it to be embedded before printing
    Post {
        #[arg(long)]
        author: String,
        content: String,
    },

    /// Most recent posts with like and comment counts
    List {
        #[arg(long, default_value_t = 20)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },

    /// Semantic search over embedded posts
    Search {
        query: String,
        /// Category name, or "All"
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Mark a post as misleading (moderators only)
    Flag {
        post_id: PostId,
        #[arg(long)]
        moderator: String,
        /// Remove the flag instead of setting it
        #[arg(long)]
        clear: bool,
    },

    /// Like a post, or unlike it if already liked
    Like {
        post_id: PostId,
        #[arg(long)]
        user: String,
    },

    /// Comment on a post
    Comment {
        post_id: PostId,
        #[arg(long)]
        author: String,
        content: String,
    },

    /// Comments on a post, oldest first
    Comments { post_id: PostId },
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

fn output<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,forum_core=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        output(&ErrorResponse {
            success: false,
            message: format!("{:#}", e),
        })?;
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Commands) -> Result<()> {
    let config = Config::from_env()?;

    if let Commands::Migrate = command {
        let pool = PgPool::connect(&config.database_url)
            .await
            .context("Failed to connect to database")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;
        return output(&serde_json::json!({ "success": true, "message": "Migrations applied" }));
    }

    let kernel = ServerKernel::start(&config).await?;
    let pool = kernel.deps.db_pool.clone();
    let result = dispatch(command, &kernel).await;
    kernel.shutdown().await;

    let Some(created) = result? else {
        return Ok(());
    };

    // The runner has drained by now, so the row carries its category
    let post = Post::find_by_id(created, &pool)
        .await?
        .context("Post disappeared after creation")?;
    output(&post)
}

/// Runs a command. Returns the id of a newly created post, to be printed after
/// the embedding job has run.
async fn dispatch(command: Commands, kernel: &ServerKernel) -> Result<Option<PostId>> {
    let deps = &kernel.deps;
    let pool = &deps.db_pool;

    match command {
        Commands::Migrate => {}
        Commands::CreateUser {
            username,
            moderator,
        } => {
            let user = User::create(&username, moderator, pool).await?;
            output(&user)?;
        }
        Commands::Post { author, content } => {
            let author = find_user(&author, pool).await?;
            let post = create_post(author.id, &content, deps.embedding_jobs.clone(), pool).await?;
            return Ok(Some(post.id));
        }
        Commands::List { limit, offset } => {
            let posts = Post::list_recent(limit, offset, pool).await?;
            output(&posts)?;
        }
        Commands::Search {
            query,
            category,
            limit,
        } => {
            let posts = deps
                .search()
                .search(&query, category.as_deref(), limit)
                .await?;
            output(&posts)?;
        }
        Commands::Flag {
            post_id,
            moderator,
            clear,
        } => {
            let moderator = find_user(&moderator, pool).await?;
            let post = flag_post(post_id, &moderator, !clear, pool).await?;
            output(&post)?;
        }
        Commands::Like { post_id, user } => {
            let user = find_user(&user, pool).await?;
            let toggle = toggle_like(post_id, &user, pool).await?;
            output(&serde_json::json!({ "post_id": post_id, "result": toggle }))?;
        }
        Commands::Comment {
            post_id,
            author,
            content,
        } => {
            let author = find_user(&author, pool).await?;
            let comment = add_comment(post_id, &author, &content, pool).await?;
            output(&comment)?;
        }
        Commands::Comments { post_id } => {
            let comments = Comment::find_by_post(post_id, pool).await?;
            output(&comments)?;
        }
    }

    Ok(None)
}

async fn find_user(username: &str, pool: &PgPool) -> Result<User> {
    User::find_by_username(username, pool)
        .await?
        .with_context(|| format!("User '{}' not found", username))
}
