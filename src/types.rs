use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single comment lifted out of the nested reply tree, in traversal order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatComment {
    pub id: String,
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn badge(&self) -> &'static str {
        match self {
            Sentiment::Positive => "👍",
            Sentiment::Negative => "👎",
            Sentiment::Neutral => "📖",
        }
    }
}

/// A book mention as returned by the extraction adapter. `title` is mandatory
/// and non-empty; everything else is best-effort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookMention {
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_comment: Option<String>,
}

impl BookMention {
    /// Dedup key shared by the extraction passes and the record merger.
    /// An empty author is its own key: "dune|" and "dune|frank herbert"
    /// are deliberately distinct records.
    pub fn dedup_key(&self) -> String {
        format!("{}|{}", self.title.to_lowercase(), self.author.to_lowercase())
    }
}

/// A merged mention enriched with bibliographic metadata from the catalog.
/// This is the shape that gets rendered into (and re-read from) the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedBook {
    pub title: String,
    pub authors: String,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub catalog_link: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
    #[serde(default)]
    pub review_summary: Option<String>,
    #[serde(default)]
    pub original_comment: Option<String>,
}

impl EnrichedBook {
    /// Normalized title+authors key used by the feed merger. ISBN equality is
    /// checked separately; either match excludes a new item.
    pub fn feed_key(&self) -> String {
        format!("{}-{}", self.title, self.authors).to_lowercase()
    }

    /// Stable feed guid: ISBN when present, otherwise a slug of title+authors.
    pub fn guid(&self) -> String {
        match &self.isbn {
            Some(isbn) => isbn.clone(),
            None => {
                let slug = format!("{}-{}", self.title, self.authors).to_lowercase();
                slug.split_whitespace().collect::<Vec<_>>().join("-")
            }
        }
    }
}

/// Read-only snapshot of the seen-comment tracking state.
#[derive(Debug, Clone, Serialize)]
pub struct SeenStats {
    pub total_seen: usize,
    pub last_processed_at: Option<DateTime<Utc>>,
    pub started_tracking_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum CuratorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    #[error("corrupt tracking state at {path}: {source}")]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CuratorError>;
