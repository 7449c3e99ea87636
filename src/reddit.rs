use crate::config::CuratorConfig;
use crate::types::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One node of Reddit's nested comment listing. Every field is optional on the
/// wire: removed comments keep their replies, "more" stubs have no body, and
/// `replies` is the empty string instead of a listing when there are none.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentNode {
    pub data: Option<CommentData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentData {
    pub id: Option<String>,
    pub body: Option<String>,
    pub created_utc: Option<f64>,
    #[serde(default)]
    pub replies: Replies,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum Replies {
    Listing(Listing),
    Empty(String),
    #[default]
    None,
}

impl Replies {
    pub fn children(&self) -> &[CommentNode] {
        match self {
            Replies::Listing(listing) => &listing.data.children,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<CommentNode>,
}

/// Source of recurring discussion threads and their comment trees.
///
/// "Blocked upstream" is deliberately indistinguishable from "no results" to
/// callers: both come back as an empty list, with the difference logged. Only
/// transport-level failures surface as errors.
#[async_trait]
pub trait ThreadSource: Send + Sync {
    /// Permalinks of matching threads, newest first.
    async fn search_threads(&self) -> Result<Vec<String>>;

    /// The nested comment tree under one thread.
    async fn fetch_comment_tree(&self, permalink: &str) -> Result<Vec<CommentNode>>;
}

pub struct RedditClient {
    client: Client,
    base_url: String,
    subreddit: String,
    search_query: String,
}

impl RedditClient {
    pub fn new(config: &CuratorConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.reddit_base_url.clone(),
            subreddit: config.subreddit.clone(),
            search_query: config.search_query.clone(),
        })
    }

    /// Reddit serves an HTML error page (not JSON) when it decides to block a
    /// client. Treat that as "nothing available right now", not as an error.
    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Option<Value>> {
        let response = self.client.get(url).query(query).send().await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response.text().await?;

        if content_type.contains("text/html") {
            warn!(
                "Reddit blocked the request to {}: {}",
                url,
                body.chars().take(200).collect::<String>()
            );
            return Ok(None);
        }

        match serde_json::from_str(&body) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Unexpected non-JSON response from {}: {}", url, e);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl ThreadSource for RedditClient {
    async fn search_threads(&self) -> Result<Vec<String>> {
        let url = format!("{}/r/{}/search.json", self.base_url, self.subreddit);
        let query = [
            ("restrict_sr", "on"),
            ("sort", "new"),
            ("q", self.search_query.as_str()),
        ];

        let Some(value) = self.get_json(&url, &query).await? else {
            return Ok(Vec::new());
        };

        let Some(children) = value
            .get("data")
            .and_then(|d| d.get("children"))
            .and_then(|c| c.as_array())
        else {
            warn!("Thread search response had an unexpected shape");
            return Ok(Vec::new());
        };

        let mut permalinks = Vec::new();
        for child in children {
            if let Some(permalink) = child
                .get("data")
                .and_then(|d| d.get("permalink"))
                .and_then(|p| p.as_str())
            {
                if !permalinks.iter().any(|p| p == permalink) {
                    permalinks.push(permalink.to_string());
                }
            }
        }

        info!("Found {} matching threads", permalinks.len());
        Ok(permalinks)
    }

    async fn fetch_comment_tree(&self, permalink: &str) -> Result<Vec<CommentNode>> {
        let url = format!("{}{}.json", self.base_url, permalink);
        let query = [("sort", "top")];

        let Some(value) = self.get_json(&url, &query).await? else {
            return Ok(Vec::new());
        };

        // A thread page is a two-element array: [post listing, comment listing].
        let children = value
            .get(1)
            .and_then(|listing| listing.get("data"))
            .and_then(|data| data.get("children"))
            .cloned();

        let Some(children) = children else {
            warn!("Comment response for {} had an unexpected shape", permalink);
            return Ok(Vec::new());
        };

        match serde_json::from_value::<Vec<CommentNode>>(children) {
            Ok(nodes) => {
                debug!("Fetched {} top-level comments for {}", nodes.len(), permalink);
                Ok(nodes)
            }
            Err(e) => {
                warn!("Could not decode comment tree for {}: {}", permalink, e);
                Ok(Vec::new())
            }
        }
    }
}
