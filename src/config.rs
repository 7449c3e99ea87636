use crate::types::{CuratorError, Result};
use std::env;
use std::path::PathBuf;

/// Process-wide configuration, built once at startup and injected into every
/// component. Endpoint base URLs are part of the config so tests can point the
/// clients at local fixtures.
#[derive(Debug, Clone)]
pub struct CuratorConfig {
    pub subreddit: String,
    pub search_query: String,
    pub user_agent: String,

    pub reddit_base_url: String,
    pub openai_base_url: String,
    pub catalog_base_url: String,

    pub openai_api_key: String,
    pub openai_model: String,

    pub feed_path: PathBuf,
    pub tracking_path: PathBuf,

    pub max_threads: usize,
    pub title_batch_size: usize,
    pub review_batch_size: usize,

    pub feed_title: String,
    pub feed_description: String,
    pub feed_link: String,
}

impl CuratorConfig {
    /// Build the configuration from the environment. The only hard requirement
    /// is `OPENAI_API_KEY`; everything else has a default. A missing key aborts
    /// before any network call is made.
    pub fn from_env() -> Result<Self> {
        let openai_api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| CuratorError::MissingConfig("OPENAI_API_KEY"))?;

        let subreddit =
            env::var("CURATOR_SUBREDDIT").unwrap_or_else(|_| "MoneyDiariesACTIVE".to_string());
        let user_agent = env::var("REDDIT_USER_AGENT")
            .unwrap_or_else(|_| "reading-list-curator/1.0 (by /u/raquelxmoss)".to_string());

        Ok(Self {
            search_query: "title:\"Monthly Book Recommendation Thread\"".to_string(),
            feed_title: format!("{} Book Recommendations", subreddit),
            feed_description: format!("Monthly book recommendations from r/{}", subreddit),
            feed_link: format!("https://reddit.com/r/{}", subreddit),
            subreddit,
            user_agent,
            reddit_base_url: "https://www.reddit.com".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            catalog_base_url: "https://www.googleapis.com/books/v1".to_string(),
            openai_api_key,
            openai_model: "gpt-4o-mini".to_string(),
            feed_path: PathBuf::from("book_recommendations.rss"),
            tracking_path: PathBuf::from("dedup_tracking.json"),
            max_threads: 1,
            title_batch_size: 30,
            review_batch_size: 20,
        })
    }
}
