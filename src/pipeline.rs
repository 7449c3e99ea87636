use crate::catalog::{enrich, BookCatalog, GoogleBooksClient};
use crate::config::CuratorConfig;
use crate::extract::{BookExtractor, OpenAiExtractor};
use crate::feed::{FeedOptions, FeedStore};
use crate::flatten::flatten_with_ids;
use crate::merge::merge_records;
use crate::reddit::{RedditClient, ThreadSource};
use crate::seen_store::SeenCommentStore;
use crate::types::{FlatComment, Result};
use tracing::{info, warn};

/// Observable counts from one pipeline run.
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub threads_found: usize,
    pub comments_total: usize,
    pub comments_new: usize,
    pub mentions: usize,
    pub enriched: usize,
    pub added_to_feed: usize,
    pub feed_len: usize,
}

/// The whole curation run, strictly sequential: locate thread → fetch and
/// flatten comments → filter against the seen set → extract (both task
/// modes) → merge records → enrich → merge into the feed → mark comments
/// seen. Marking happens last so a crash anywhere reprocesses comments
/// instead of losing them.
pub struct CuratorPipeline {
    config: CuratorConfig,
    source: Box<dyn ThreadSource>,
    extractor: Box<dyn BookExtractor>,
    catalog: Box<dyn BookCatalog>,
}

impl CuratorPipeline {
    pub fn new(config: CuratorConfig) -> Result<Self> {
        let source = Box::new(RedditClient::new(&config)?);
        let extractor = Box::new(OpenAiExtractor::new(&config)?);
        let catalog = Box::new(GoogleBooksClient::new(&config)?);
        Ok(Self {
            config,
            source,
            extractor,
            catalog,
        })
    }

    /// Wire in alternative collaborators (stubs in tests, other backends).
    pub fn with_collaborators(
        config: CuratorConfig,
        source: Box<dyn ThreadSource>,
        extractor: Box<dyn BookExtractor>,
        catalog: Box<dyn BookCatalog>,
    ) -> Self {
        Self {
            config,
            source,
            extractor,
            catalog,
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        let mut seen = SeenCommentStore::load(&self.config.tracking_path)?;

        let threads = self.source.search_threads().await?;
        summary.threads_found = threads.len();
        if threads.is_empty() {
            warn!("No recommendation threads found, nothing to do");
            return Ok(summary);
        }

        let mut comments: Vec<FlatComment> = Vec::new();
        for permalink in threads.iter().take(self.config.max_threads) {
            let tree = self.source.fetch_comment_tree(permalink).await?;
            comments.extend(flatten_with_ids(&tree));
        }
        summary.comments_total = comments.len();

        let new_comments = seen.filter_new(&comments);
        summary.comments_new = new_comments.len();
        if new_comments.is_empty() {
            info!("No new comments since last run");
            return Ok(summary);
        }

        let bodies: Vec<String> = new_comments.iter().map(|c| c.body.clone()).collect();

        let annotated = self.extractor.extract_reviews(&bodies).await?;
        let basic = self.extractor.extract_titles(&bodies).await?;
        let records = merge_records(annotated, basic);
        summary.mentions = records.len();
        info!("Extracted {} distinct book mentions", records.len());

        let enriched = enrich(self.catalog.as_ref(), records).await;
        summary.enriched = enriched.len();

        let store = FeedStore::new(
            &self.config.feed_path,
            FeedOptions {
                title: self.config.feed_title.clone(),
                description: self.config.feed_description.clone(),
                link: self.config.feed_link.clone(),
            },
        );
        let (added, feed_len) = store.merge_and_write(enriched)?;
        summary.added_to_feed = added;
        summary.feed_len = feed_len;

        // Only now is the batch done; mark it processed.
        seen.mark_seen(new_comments.iter().map(|c| c.id.clone()))?;

        let stats = seen.stats();
        info!(
            "Run complete: {} new comments processed, {} books added, {} total comments tracked",
            summary.comments_new, summary.added_to_feed, stats.total_seen
        );

        Ok(summary)
    }
}
