use crate::types::{CuratorError, FlatComment, Result, SeenStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Serialize, Deserialize)]
struct TrackingState {
    seen_comment_ids: BTreeSet<String>,
    last_processed_at: Option<DateTime<Utc>>,
    started_tracking_at: DateTime<Utc>,
}

impl TrackingState {
    fn fresh() -> Self {
        Self {
            seen_comment_ids: BTreeSet::new(),
            last_processed_at: None,
            started_tracking_at: Utc::now(),
        }
    }
}

/// Durable set of comment ids that have already been fed through extraction.
///
/// The whole state lives in one JSON document, rewritten in full on every
/// `mark_seen`. A missing document means a first run and initializes fresh
/// state; a document that exists but cannot be parsed is fatal, because
/// silently resetting it would reprocess every comment as new.
///
/// Marking happens only after a batch has been fully processed, so a crash in
/// between reprocesses comments rather than losing them.
pub struct SeenCommentStore {
    path: PathBuf,
    state: TrackingState,
}

impl SeenCommentStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let state = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| {
                CuratorError::CorruptState {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No tracking file at {}, starting fresh", path.display());
                TrackingState::fresh()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, state })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.state.seen_comment_ids.contains(id)
    }

    /// The subsequence of `comments` not yet seen, in their original order.
    pub fn filter_new(&self, comments: &[FlatComment]) -> Vec<FlatComment> {
        let new_comments: Vec<FlatComment> = comments
            .iter()
            .filter(|c| !self.contains(&c.id))
            .cloned()
            .collect();

        info!(
            "Found {} new comments (out of {} total)",
            new_comments.len(),
            comments.len()
        );
        new_comments
    }

    /// Idempotently union `ids` into the seen set, bump `last_processed_at`,
    /// and persist. The write goes through a temp file and rename so a crash
    /// mid-write never leaves a half-written document behind.
    pub fn mark_seen<I, S>(&mut self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            self.state.seen_comment_ids.insert(id.into());
        }
        self.state.last_processed_at = Some(Utc::now());
        self.persist()
    }

    pub fn stats(&self) -> SeenStats {
        SeenStats {
            total_seen: self.state.seen_comment_ids.len(),
            last_processed_at: self.state.last_processed_at,
            started_tracking_at: self.state.started_tracking_at,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        let serialized = serde_json::to_string_pretty(&self.state)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serialized)?;
        fs::rename(&tmp_path, &self.path)?;
        debug!(
            "Persisted {} seen comment ids to {}",
            self.state.seen_comment_ids.len(),
            self.path.display()
        );
        Ok(())
    }
}
