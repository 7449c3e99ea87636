pub mod catalog;
pub mod config;
pub mod extract;
pub mod feed;
pub mod flatten;
pub mod merge;
pub mod pipeline;
pub mod reddit;
pub mod seen_store;
pub mod types;

pub use catalog::{enrich, BookCatalog, CatalogRecord, GoogleBooksClient};
pub use config::CuratorConfig;
pub use extract::{BookExtractor, OpenAiExtractor};
pub use feed::{FeedOptions, FeedStore};
pub use flatten::{flatten_bodies, flatten_with_ids};
pub use merge::{dedup_mentions, merge_records};
pub use pipeline::{CuratorPipeline, RunSummary};
pub use reddit::{CommentNode, RedditClient, ThreadSource};
pub use seen_store::SeenCommentStore;
pub use types::*;
