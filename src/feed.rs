use crate::types::{EnrichedBook, Result, Sentiment};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use rss::{Channel, ChannelBuilder, EnclosureBuilder, GuidBuilder, Item, ItemBuilder};
use std::collections::HashSet;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<strong>Description:</strong>\s*([^<]+)").expect("valid regex")
});
static CATEGORIES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Categories:\s*([^<]+)").expect("valid regex"));
static PAGES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Pages:\s*(\d+)").expect("valid regex"));
static REVIEW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<strong>Community Review [^:]*:</strong>\s*([^<]+)").expect("valid regex")
});

/// Channel-level metadata for the published feed.
#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub title: String,
    pub description: String,
    pub link: String,
}

/// Owns the persisted feed file and its structured sidecar.
///
/// The sidecar JSON document is the source of truth for previously published
/// records; the RSS file is a rendering of it. Feeds written before the
/// sidecar existed are still readable: the store falls back to re-parsing the
/// RSS items, splitting the "Title by Author" line and pattern-extracting the
/// structured fields back out of the HTML description block.
pub struct FeedStore {
    feed_path: PathBuf,
    sidecar_path: PathBuf,
    options: FeedOptions,
}

impl FeedStore {
    pub fn new(feed_path: impl Into<PathBuf>, options: FeedOptions) -> Self {
        let feed_path = feed_path.into();
        let sidecar_path = feed_path.with_extension("books.json");
        Self {
            feed_path,
            sidecar_path,
            options,
        }
    }

    pub fn feed_path(&self) -> &Path {
        &self.feed_path
    }

    pub fn sidecar_path(&self) -> &Path {
        &self.sidecar_path
    }

    /// Previously published records, sidecar first, RSS fallback. An
    /// unparseable feed degrades to an empty set with a warning; this store
    /// only ever appends, so the worst case is re-publishing.
    pub fn load_existing(&self) -> Vec<EnrichedBook> {
        match fs::read_to_string(&self.sidecar_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(books) => return books,
                Err(e) => {
                    warn!(
                        "Could not parse sidecar {}: {}, falling back to feed",
                        self.sidecar_path.display(),
                        e
                    );
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(
                    "Could not read sidecar {}: {}, falling back to feed",
                    self.sidecar_path.display(),
                    e
                );
            }
        }

        let file = match fs::File::open(&self.feed_path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Could not read feed {}: {}", self.feed_path.display(), e);
                return Vec::new();
            }
        };

        let channel = match Channel::read_from(BufReader::new(file)) {
            Ok(channel) => channel,
            Err(e) => {
                warn!("Could not parse existing feed: {}", e);
                return Vec::new();
            }
        };

        channel.items().iter().filter_map(book_from_item).collect()
    }

    /// `existing + unique_new`: a new item is excluded when it matches an
    /// existing one by exact ISBN equality (both present) OR by normalized
    /// title+authors. Either match alone excludes, since ISBN may be missing
    /// on one side. Existing items keep their positions; unique new items
    /// append in their relative order.
    pub fn merge_unique(
        existing: Vec<EnrichedBook>,
        new_items: Vec<EnrichedBook>,
    ) -> (Vec<EnrichedBook>, usize) {
        let existing_isbns: HashSet<String> =
            existing.iter().filter_map(|b| b.isbn.clone()).collect();
        let existing_keys: HashSet<String> = existing.iter().map(|b| b.feed_key()).collect();

        let total_new = new_items.len();
        let unique: Vec<EnrichedBook> = new_items
            .into_iter()
            .filter(|book| {
                let isbn_match = book
                    .isbn
                    .as_ref()
                    .is_some_and(|isbn| existing_isbns.contains(isbn));
                let key_match = existing_keys.contains(&book.feed_key());
                !(isbn_match || key_match)
            })
            .collect();

        info!(
            "Found {} new unique books to add ({} duplicates filtered out)",
            unique.len(),
            total_new - unique.len()
        );

        let added = unique.len();
        let mut all = existing;
        all.extend(unique);
        (all, added)
    }

    /// Merge `new_items` against the persisted feed and rewrite feed +
    /// sidecar. Returns (items added, feed length).
    pub fn merge_and_write(&self, new_items: Vec<EnrichedBook>) -> Result<(usize, usize)> {
        let existing = self.load_existing();
        let (mut all, added) = Self::merge_unique(existing, new_items);

        // A record the catalog gave no date gets its first-publication date
        // stamped here, so the rendered pubDate stays stable across rewrites
        // instead of drifting to "now" on every run.
        let today = Utc::now().format("%Y-%m-%d").to_string();
        for book in &mut all {
            if book.published_date.is_none() {
                book.published_date = Some(today.clone());
            }
        }

        self.write(&all)?;
        Ok((added, all.len()))
    }

    pub fn write(&self, books: &[EnrichedBook]) -> Result<()> {
        let channel = build_channel(books, &self.options);

        let tmp_path = self.feed_path.with_extension("rss.tmp");
        fs::write(&tmp_path, channel.to_string())?;
        fs::rename(&tmp_path, &self.feed_path)?;

        let tmp_path = self.sidecar_path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_string_pretty(books)?)?;
        fs::rename(&tmp_path, &self.sidecar_path)?;

        debug!(
            "Wrote {} items to {} (+ sidecar)",
            books.len(),
            self.feed_path.display()
        );
        Ok(())
    }
}

pub fn build_channel(books: &[EnrichedBook], options: &FeedOptions) -> Channel {
    let items: Vec<Item> = books
        .iter()
        .map(|book| build_item(book, options))
        .collect();

    ChannelBuilder::default()
        .title(options.title.clone())
        .description(options.description.clone())
        .link(options.link.clone())
        .last_build_date(Some(Utc::now().to_rfc2822()))
        .items(items)
        .build()
}

fn build_item(book: &EnrichedBook, options: &FeedOptions) -> Item {
    let link = book
        .catalog_link
        .clone()
        .unwrap_or_else(|| options.link.clone());

    let mut builder = ItemBuilder::default();
    builder
        .title(Some(format_title(book)))
        .link(Some(link))
        .description(Some(render_description(book)))
        .pub_date(Some(parse_pub_date(book.published_date.as_deref()).to_rfc2822()))
        .guid(Some(
            GuidBuilder::default()
                .value(book.guid())
                .permalink(false)
                .build(),
        ));

    if let Some(thumbnail) = &book.thumbnail {
        builder.enclosure(Some(
            EnclosureBuilder::default()
                .url(thumbnail.clone())
                .mime_type("image/jpeg".to_string())
                // Size unknown
                .length("0".to_string())
                .build(),
        ));
    }

    builder.build()
}

pub fn format_title(book: &EnrichedBook) -> String {
    let title = if book.title.is_empty() {
        "Unknown Title"
    } else {
        &book.title
    };
    let authors = if book.authors.is_empty() {
        "Unknown Author"
    } else {
        &book.authors
    };
    format!("{} by {}", title, authors)
}

/// The structured HTML description block: community review badge + summary +
/// quoted excerpt, truncated description paragraph, metadata details,
/// thumbnail, Goodreads link.
pub fn render_description(book: &EnrichedBook) -> String {
    let mut parts = Vec::new();

    if let (Some(summary), Some(sentiment)) = (&book.review_summary, book.sentiment) {
        parts.push(format!(
            "<p><strong>Community Review {}:</strong> {}</p>",
            sentiment.badge(),
            summary
        ));

        if let Some(comment) = &book.original_comment {
            parts.push(format!("<p><em>\"{}\"</em></p>", comment));
        }
    }

    if let Some(description) = &book.description {
        let truncated = if description.chars().count() > 300 {
            let head: String = description.chars().take(297).collect();
            format!("{}...", head)
        } else {
            description.clone()
        };
        parts.push(format!("<p><strong>Description:</strong> {}</p>", truncated));
    }

    let mut metadata = Vec::new();
    if let Some(date) = &book.published_date {
        metadata.push(format!("Published: {}", date));
    }
    if let Some(pages) = book.page_count {
        if pages > 0 {
            metadata.push(format!("Pages: {}", pages));
        }
    }
    if !book.categories.is_empty() {
        metadata.push(format!("Categories: {}", book.categories.join(", ")));
    }
    if let Some(isbn) = &book.isbn {
        metadata.push(format!("ISBN: {}", isbn));
    }
    if !metadata.is_empty() {
        parts.push(format!(
            "<p><strong>Details:</strong><br/>{}</p>",
            metadata.join("<br/>")
        ));
    }

    if let Some(thumbnail) = &book.thumbnail {
        parts.push(format!(
            "<p><img src=\"{}\" alt=\"{} cover\" style=\"max-width: 200px;\"/></p>",
            thumbnail, book.title
        ));
    }

    if let Some(isbn) = &book.isbn {
        parts.push(format!(
            "<p><a href=\"https://www.goodreads.com/book/isbn/{}\">📚 Add to Goodreads</a></p>",
            isbn
        ));
    }

    parts.join("\n")
}

/// Catalog dates come in `YYYY`, `YYYY-MM`, and `YYYY-MM-DD` forms; anything
/// unrecognized falls back to now.
pub fn parse_pub_date(date: Option<&str>) -> DateTime<Utc> {
    let Some(date) = date.map(str::trim) else {
        return Utc::now();
    };

    let naive = if date.len() == 4 && date.bytes().all(|b| b.is_ascii_digit()) {
        NaiveDate::parse_from_str(&format!("{}-01-01", date), "%Y-%m-%d").ok()
    } else if date.len() == 7 {
        NaiveDate::parse_from_str(&format!("{}-01", date), "%Y-%m-%d").ok()
    } else {
        NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
    };

    naive
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_else(Utc::now)
}

/// Reconstruct a structured record from a rendered feed item: the title line
/// splits on the first " by ", the rest pattern-extracts out of the HTML
/// description block.
pub fn book_from_item(item: &Item) -> Option<EnrichedBook> {
    let formatted_title = item.title()?;
    let (title, authors) = match formatted_title.split_once(" by ") {
        Some((title, authors)) => (title.to_string(), authors.to_string()),
        None => (formatted_title.to_string(), "Unknown Author".to_string()),
    };

    let html = item.description().unwrap_or("");

    let description = DESCRIPTION_RE
        .captures(html)
        .map(|c| c[1].trim().trim_end_matches("...").to_string());

    let categories = CATEGORIES_RE
        .captures(html)
        .map(|c| {
            c[1].trim()
                .split(", ")
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let page_count = PAGES_RE.captures(html).and_then(|c| c[1].parse().ok());

    let sentiment = sentiment_from_html(html);
    let review_summary = REVIEW_RE.captures(html).map(|c| c[1].trim().to_string());

    let isbn = item
        .guid()
        .map(|g| g.value())
        .filter(|v| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string);

    let published_date = item
        .pub_date()
        .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
        .map(|d| d.format("%Y-%m-%d").to_string());

    Some(EnrichedBook {
        title,
        authors,
        published_date,
        description,
        page_count,
        categories,
        isbn,
        catalog_link: item.link().map(str::to_string),
        thumbnail: item.enclosure().map(|e| e.url().to_string()),
        sentiment,
        review_summary,
        original_comment: None,
    })
}

fn sentiment_from_html(html: &str) -> Option<Sentiment> {
    if html.contains("Community Review 👍") {
        Some(Sentiment::Positive)
    } else if html.contains("Community Review 👎") {
        Some(Sentiment::Negative)
    } else if html.contains("Community Review 📖") {
        Some(Sentiment::Neutral)
    } else {
        None
    }
}
