use crate::config::CuratorConfig;
use crate::types::{BookMention, EnrichedBook, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// A bibliographic match from the external catalog.
#[derive(Debug, Clone)]
pub struct CatalogRecord {
    pub title: String,
    pub authors: Option<String>,
    pub published_date: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<u32>,
    pub categories: Vec<String>,
    pub isbn: Option<String>,
    pub info_link: Option<String>,
    pub thumbnail: Option<String>,
}

/// Catalog collaborator: `{title, author}` in, at most one match out.
#[async_trait]
pub trait BookCatalog: Send + Sync {
    async fn search_book(&self, title: &str, author: &str) -> Result<Option<CatalogRecord>>;
}

pub struct GoogleBooksClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumesResponse {
    #[serde(default)]
    total_items: u32,
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    volume_info: VolumeInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    published_date: Option<String>,
    description: Option<String>,
    page_count: Option<u32>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    industry_identifiers: Vec<IndustryIdentifier>,
    info_link: Option<String>,
    image_links: Option<ImageLinks>,
}

#[derive(Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    id_type: String,
    identifier: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    thumbnail: Option<String>,
}

impl GoogleBooksClient {
    pub fn new(config: &CuratorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("reading-list-curator")
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.catalog_base_url.clone(),
        })
    }
}

#[async_trait]
impl BookCatalog for GoogleBooksClient {
    async fn search_book(&self, title: &str, author: &str) -> Result<Option<CatalogRecord>> {
        if title.is_empty() {
            return Ok(None);
        }

        let mut parts = vec![format!("intitle:{}", title)];
        if !author.is_empty() {
            parts.push(format!("inauthor:{}", author));
        }
        let search_query = parts.join("+");

        let response = self
            .client
            .get(format!("{}/volumes", self.base_url))
            .query(&[
                ("q", search_query.as_str()),
                ("country", "US"),
                ("maxResults", "1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            debug!(
                "Catalog returned HTTP {} for {:?}",
                response.status(),
                title
            );
            return Ok(None);
        }

        let volumes: VolumesResponse = response.json().await?;
        if volumes.total_items == 0 {
            return Ok(None);
        }

        let Some(volume) = volumes.items.into_iter().next() else {
            return Ok(None);
        };
        let info = volume.volume_info;

        Ok(Some(CatalogRecord {
            title: info.title.unwrap_or_else(|| title.to_string()),
            authors: if info.authors.is_empty() {
                None
            } else {
                Some(info.authors.join(", "))
            },
            published_date: info.published_date,
            description: info.description,
            page_count: info.page_count,
            categories: info.categories,
            isbn: info
                .industry_identifiers
                .into_iter()
                .find(|id| id.id_type == "ISBN_13")
                .map(|id| id.identifier),
            info_link: info.info_link,
            thumbnail: info.image_links.and_then(|links| links.thumbnail),
        }))
    }
}

/// Enrich each merged record with catalog metadata. Exactly one lookup per
/// record; a record with no match (or a failed lookup) is dropped with a
/// warning, never aborting the rest of the batch.
pub async fn enrich(
    catalog: &dyn BookCatalog,
    records: Vec<BookMention>,
) -> Vec<EnrichedBook> {
    let mut enriched = Vec::new();

    for record in records {
        match catalog.search_book(&record.title, &record.author).await {
            Ok(Some(found)) => {
                let authors = found.authors.unwrap_or_else(|| record.author.clone());
                enriched.push(EnrichedBook {
                    title: found.title,
                    authors,
                    published_date: found.published_date,
                    description: found.description,
                    page_count: found.page_count,
                    categories: found.categories,
                    isbn: found.isbn,
                    catalog_link: found.info_link,
                    thumbnail: found.thumbnail,
                    sentiment: record.sentiment,
                    review_summary: record.review_summary,
                    original_comment: record.original_comment,
                });
            }
            Ok(None) => {
                warn!("No catalog match for {:?} by {:?}, dropping", record.title, record.author);
            }
            Err(e) => {
                warn!(
                    "Catalog lookup failed for {:?} by {:?}: {}, dropping",
                    record.title, record.author, e
                );
            }
        }
    }

    enriched
}
