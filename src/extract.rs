use crate::config::CuratorConfig;
use crate::merge::dedup_mentions;
use crate::types::{BookMention, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Prompt for the titles-only pass. The model must answer with a bare JSON
/// array; anything else is discarded for that batch.
const TITLES_PROMPT: &str = r#"Extract all distinct book titles from the following Reddit comments.
Only include real, published books (fiction or non-fiction).
If the author is mentioned in the comments, include it in the "author" field.
If the author is not mentioned, try to guess based on context or leave it blank ("").
Lean towards newer releases and popular authors when guessing.
Comments might contain slight errors in titles (like an extra "The" or "A") or use acronyms (e.g., ACOTAR).
Output ONLY a valid JSON array of objects with this exact structure:
[
  { "title": "Book Title", "author": "Author Name or blank" },
  { "title": "Another Book", "author": "" }
]
No explanations, no extra text, no Markdown formatting.

Comments:
{comments}"#;

/// Prompt for the sentiment pass: title, author, sentiment, a short review
/// summary and a relevant excerpt from the original comment.
const REVIEWS_PROMPT: &str = r#"Analyze the following Reddit comments for book recommendations. For each book mentioned:

1. Extract the book title and author (if mentioned)
2. Determine sentiment: "positive", "negative", or "neutral"
3. If positive, create a 1-2 sentence summary of why they recommend it
4. If negative, create a 1-2 sentence summary of their criticism
5. If neutral, provide a brief factual summary

Only include comments that actually discuss or recommend books.

Output ONLY a valid JSON array with this exact structure:
[
  {
    "title": "Book Title",
    "author": "Author Name or blank",
    "sentiment": "positive",
    "review_summary": "Brief summary of their recommendation",
    "original_comment": "Relevant excerpt from original comment"
  }
]

Comments:
{comments}"#;

/// Extraction collaborator: batched comment bodies in, structured book
/// mentions out. Implementations must never fail a whole run because one
/// batch produced garbage.
#[async_trait]
pub trait BookExtractor: Send + Sync {
    /// Titles-only task mode.
    async fn extract_titles(&self, comments: &[String]) -> Result<Vec<BookMention>>;

    /// Titles + sentiment + review summary task mode.
    async fn extract_reviews(&self, comments: &[String]) -> Result<Vec<BookMention>>;
}

pub struct OpenAiExtractor {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    title_batch_size: usize,
    review_batch_size: usize,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAiExtractor {
    pub fn new(config: &CuratorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            base_url: config.openai_base_url.clone(),
            title_batch_size: config.title_batch_size,
            review_batch_size: config.review_batch_size,
        })
    }

    async fn run_batches(
        &self,
        comments: &[String],
        batch_size: usize,
        prompt_template: &str,
        separator: &str,
        temperature: f32,
    ) -> Result<Vec<BookMention>> {
        let mut results = Vec::new();

        // Batches bound request size; they run strictly in sequence and their
        // results concatenate in order.
        for batch in comments.chunks(batch_size.max(1)) {
            let prompt = prompt_template.replace("{comments}", &batch.join(separator));
            match self.chat(&prompt, temperature).await {
                Ok(content) => results.extend(parse_mentions(&content)),
                Err(e) => {
                    // One failed batch never takes down the run.
                    warn!("Extraction call failed for a batch of {}: {}", batch.len(), e);
                }
            }
        }

        Ok(dedup_mentions(results))
    }

    async fn chat(&self, prompt: &str, temperature: f32) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Extraction API returned HTTP {}", response.status());
            return Ok("[]".to_string());
        }

        let payload: ChatResponse = response.json().await?;

        Ok(payload
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_else(|| "[]".to_string()))
    }
}

#[async_trait]
impl BookExtractor for OpenAiExtractor {
    async fn extract_titles(&self, comments: &[String]) -> Result<Vec<BookMention>> {
        self.run_batches(comments, self.title_batch_size, TITLES_PROMPT, "\n", 0.0)
            .await
    }

    async fn extract_reviews(&self, comments: &[String]) -> Result<Vec<BookMention>> {
        self.run_batches(
            comments,
            self.review_batch_size,
            REVIEWS_PROMPT,
            "\n\n---\n\n",
            0.1,
        )
        .await
    }
}

/// Parse one batch's payload into mentions. The model sometimes wraps its
/// answer in Markdown code fences; strip those first. A non-array or
/// unparseable payload yields zero mentions for the batch with a warning.
/// Objects without a non-empty title are dropped.
pub fn parse_mentions(content: &str) -> Vec<BookMention> {
    let stripped = strip_code_fences(content);

    let value: serde_json::Value = match serde_json::from_str(stripped) {
        Ok(value) => value,
        Err(e) => {
            warn!("Could not parse extraction output ({}): {:?}", e, stripped);
            return Vec::new();
        }
    };

    let Some(items) = value.as_array() else {
        warn!("Extraction output was not an array: {:?}", stripped);
        return Vec::new();
    };

    let mut mentions = Vec::new();
    for item in items {
        match serde_json::from_value::<BookMention>(item.clone()) {
            Ok(mention) if !mention.title.trim().is_empty() => mentions.push(mention),
            Ok(_) => debug!("Dropping extracted object with empty title"),
            Err(e) => debug!("Dropping malformed extracted object: {}", e),
        }
    }

    mentions
}

/// Strip leading/trailing Markdown code fences like ```json ... ```.
pub fn strip_code_fences(content: &str) -> &str {
    let mut s = content.trim();

    if let Some(rest) = s.strip_prefix("```") {
        // Drop the rest of the fence line (e.g. the "json" language tag).
        s = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => rest,
        };
    }

    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }

    s.trim()
}
