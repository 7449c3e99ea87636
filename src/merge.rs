use crate::types::BookMention;
use std::collections::HashSet;
use tracing::debug;

/// Drop repeat mentions within one extraction pass, keyed by
/// `lowercase(title)|lowercase(author)`. First occurrence wins.
pub fn dedup_mentions(mentions: Vec<BookMention>) -> Vec<BookMention> {
    let mut seen = HashSet::new();
    mentions
        .into_iter()
        .filter(|m| seen.insert(m.dedup_key()))
        .collect()
}

/// Combine the sentiment-annotated and basic extraction passes into one
/// deduplicated record set.
///
/// Annotated entries always win over basic entries sharing a key; basic
/// entries contribute only keys not already present. Output order is the
/// annotated entries in their original order, then the new basic entries in
/// theirs. An empty author is a distinct key from a named author, so the same
/// title with and without an author stays as two records.
pub fn merge_records(annotated: Vec<BookMention>, basic: Vec<BookMention>) -> Vec<BookMention> {
    let mut merged = dedup_mentions(annotated);
    let mut keys: HashSet<String> = merged.iter().map(|m| m.dedup_key()).collect();

    let mut added = 0;
    for mention in basic {
        if keys.insert(mention.dedup_key()) {
            merged.push(mention);
            added += 1;
        }
    }

    debug!(
        "Merged record set: {} annotated + {} new basic entries",
        merged.len() - added,
        added
    );
    merged
}
