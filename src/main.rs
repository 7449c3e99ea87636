use clap::Parser;
use reading_list_curator::{CuratorConfig, CuratorPipeline};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "reading-list-curator")]
#[command(about = "Curates a monthly Reddit book recommendation thread into an RSS feed")]
struct Cli {
    /// Path of the published RSS feed
    #[arg(long)]
    feed_path: Option<PathBuf>,

    /// Path of the seen-comment tracking document
    #[arg(long)]
    tracking_path: Option<PathBuf>,

    /// Subreddit to search for recommendation threads
    #[arg(long)]
    subreddit: Option<String>,

    /// How many of the newest matching threads to process
    #[arg(long)]
    max_threads: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = CuratorConfig::from_env()?;
    if let Some(subreddit) = cli.subreddit {
        config.feed_title = format!("{} Book Recommendations", subreddit);
        config.feed_description = format!("Monthly book recommendations from r/{}", subreddit);
        config.feed_link = format!("https://reddit.com/r/{}", subreddit);
        config.subreddit = subreddit;
    }
    if let Some(feed_path) = cli.feed_path {
        config.feed_path = feed_path;
    }
    if let Some(tracking_path) = cli.tracking_path {
        config.tracking_path = tracking_path;
    }
    if let Some(max_threads) = cli.max_threads {
        config.max_threads = max_threads;
    }

    info!(
        "Fetching r/{} monthly book rec threads...",
        config.subreddit
    );

    let pipeline = CuratorPipeline::new(config.clone())?;
    let summary = pipeline.run().await?;

    info!(
        "Done: {} threads, {}/{} new comments, {} mentions, {} enriched, {} added (feed now {} items)",
        summary.threads_found,
        summary.comments_new,
        summary.comments_total,
        summary.mentions,
        summary.enriched,
        summary.added_to_feed,
        summary.feed_len
    );
    info!("RSS feed saved to {}", config.feed_path.display());

    Ok(())
}
