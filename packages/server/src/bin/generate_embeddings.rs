use std::sync::Arc;

use anyhow::{Context, Result};
use forum_core::common::utils::EmbeddingService;
use forum_core::config::Config;
use forum_core::domains::posts::actions::EmbeddingPipeline;
use forum_core::domains::posts::anchors::AnchorCache;
use forum_core::domains::posts::models::Post;
use forum_core::domains::posts::vector_store::PgVectorStore;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,forum_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load config
    let config = Config::from_env()?;

    // Connect to database
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    println!("Connected to database");

    let pipeline = EmbeddingPipeline::new(
        Arc::new(EmbeddingService::new(config.embedding.clone())?),
        Arc::new(AnchorCache::new()),
        Arc::new(PgVectorStore::new(pool.clone())),
    );

    println!("\nGenerating post embeddings...");
    let posts = Post::find_without_embedding(&pool)
        .await
        .context("Failed to find posts without embeddings")?;

    println!("Found {} posts without embeddings", posts.len());

    let mut updated = 0;
    let mut failed = 0;
    for post in posts {
        if pipeline.run(post.id).await.is_generated() {
            updated += 1;
            println!("  Updated embedding for post {}", post.id);
        } else {
            failed += 1;
            eprintln!("  Failed to embed post {}", post.id);
        }
    }

    println!("\nEmbedding generation complete!");
    println!("  Posts: {} updated, {} failed", updated, failed);

    Ok(())
}
