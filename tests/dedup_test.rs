use reading_list_curator::merge::{dedup_mentions, merge_records};
use reading_list_curator::seen_store::SeenCommentStore;
use reading_list_curator::types::{BookMention, CuratorError, FlatComment, Sentiment};

fn comment(id: &str, body: &str) -> FlatComment {
    FlatComment {
        id: id.to_string(),
        body: body.to_string(),
        created_at: None,
    }
}

fn mention(title: &str, author: &str) -> BookMention {
    BookMention {
        title: title.to_string(),
        author: author.to_string(),
        sentiment: None,
        review_summary: None,
        original_comment: None,
    }
}

fn annotated_mention(title: &str, author: &str, sentiment: Sentiment) -> BookMention {
    BookMention {
        sentiment: Some(sentiment),
        review_summary: Some("They could not put it down.".to_string()),
        ..mention(title, author)
    }
}

#[test]
fn first_run_filters_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = SeenCommentStore::load(dir.path().join("tracking.json")).unwrap();

    let comments = vec![comment("a", "one"), comment("b", "two")];
    let new = store.filter_new(&comments);
    assert_eq!(new.len(), 2);
}

#[test]
fn second_run_filters_everything() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracking.json");

    let mut store = SeenCommentStore::load(&path).unwrap();
    let comments = vec![comment("a", "one"), comment("b", "two")];
    let new = store.filter_new(&comments);
    store
        .mark_seen(new.iter().map(|c| c.id.clone()))
        .unwrap();

    let again = store.filter_new(&comments);
    assert!(again.is_empty());
}

#[test]
fn mark_seen_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SeenCommentStore::load(dir.path().join("tracking.json")).unwrap();

    store.mark_seen(["a", "b", "c"]).unwrap();
    assert_eq!(store.stats().total_seen, 3);

    store.mark_seen(["a", "b", "c"]).unwrap();
    assert_eq!(store.stats().total_seen, 3);
    assert!(store.stats().last_processed_at.is_some());
}

#[test]
fn filter_preserves_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SeenCommentStore::load(dir.path().join("tracking.json")).unwrap();
    store.mark_seen(["b", "d"]).unwrap();

    let comments = vec![
        comment("a", ""),
        comment("b", ""),
        comment("c", ""),
        comment("d", ""),
        comment("e", ""),
    ];
    let new = store.filter_new(&comments);
    let ids: Vec<&str> = new.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c", "e"]);
}

#[test]
fn state_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracking.json");

    let started_at = {
        let mut store = SeenCommentStore::load(&path).unwrap();
        store.mark_seen(["x", "y"]).unwrap();
        store.stats().started_tracking_at
    };

    let reloaded = SeenCommentStore::load(&path).unwrap();
    assert!(reloaded.contains("x"));
    assert!(reloaded.contains("y"));
    assert!(!reloaded.contains("z"));
    assert_eq!(reloaded.stats().total_seen, 2);
    assert_eq!(reloaded.stats().started_tracking_at, started_at);
}

#[test]
fn missing_document_initializes_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let store = SeenCommentStore::load(dir.path().join("nope.json")).unwrap();
    let stats = store.stats();
    assert_eq!(stats.total_seen, 0);
    assert!(stats.last_processed_at.is_none());
}

#[test]
fn corrupt_document_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracking.json");
    std::fs::write(&path, "{ not json").unwrap();

    match SeenCommentStore::load(&path) {
        Err(CuratorError::CorruptState { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected CorruptState, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn annotated_mentions_win_over_basic() {
    let annotated = vec![annotated_mention(
        "Dune",
        "Frank Herbert",
        Sentiment::Positive,
    )];
    let basic = vec![
        mention("Dune", "Frank Herbert"),
        mention("Project Hail Mary", ""),
    ];

    let merged = merge_records(annotated, basic);
    assert_eq!(merged.len(), 2);

    assert_eq!(merged[0].title, "Dune");
    assert_eq!(merged[0].sentiment, Some(Sentiment::Positive));
    assert!(merged[0].review_summary.is_some());

    assert_eq!(merged[1].title, "Project Hail Mary");
    assert!(merged[1].sentiment.is_none());
}

#[test]
fn empty_author_is_a_distinct_key() {
    // "Dune|" and "Dune|frank herbert" do not merge; this is accepted
    // behavior, not a bug.
    let merged = merge_records(
        vec![annotated_mention("Dune", "Frank Herbert", Sentiment::Neutral)],
        vec![mention("Dune", "")],
    );
    assert_eq!(merged.len(), 2);
}

#[test]
fn merge_key_is_case_insensitive() {
    let merged = merge_records(
        vec![annotated_mention("DUNE", "frank herbert", Sentiment::Positive)],
        vec![mention("dune", "Frank Herbert")],
    );
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].sentiment, Some(Sentiment::Positive));
}

#[test]
fn merge_preserves_iteration_order() {
    let annotated = vec![
        annotated_mention("A", "x", Sentiment::Positive),
        annotated_mention("B", "y", Sentiment::Negative),
    ];
    let basic = vec![mention("C", "z"), mention("A", "x"), mention("D", "w")];

    let merged = merge_records(annotated, basic);
    let titles: Vec<&str> = merged.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B", "C", "D"]);
}

#[test]
fn dedup_keeps_first_occurrence() {
    let deduped = dedup_mentions(vec![
        mention("Educated", "Tara Westover"),
        mention("educated", "tara westover"),
        mention("Educated", ""),
    ]);
    assert_eq!(deduped.len(), 2);
    assert_eq!(deduped[0].title, "Educated");
    assert_eq!(deduped[0].author, "Tara Westover");
}
