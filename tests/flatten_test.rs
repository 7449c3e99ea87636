use reading_list_curator::flatten::{flatten_bodies, flatten_with_ids};
use reading_list_curator::reddit::{CommentData, CommentNode, Listing, ListingData, Replies};

fn node(id: Option<&str>, body: Option<&str>, children: Vec<CommentNode>) -> CommentNode {
    let replies = if children.is_empty() {
        Replies::None
    } else {
        Replies::Listing(Listing {
            data: ListingData { children },
        })
    };
    CommentNode {
        data: Some(CommentData {
            id: id.map(str::to_string),
            body: body.map(str::to_string),
            created_utc: Some(1_700_000_000.0),
            replies,
        }),
    }
}

#[test]
fn depth_first_parent_before_children_order() {
    let tree = vec![
        node(
            Some("a"),
            Some("first root"),
            vec![
                node(
                    Some("b"),
                    Some("first reply"),
                    vec![node(Some("c"), Some("nested reply"), vec![])],
                ),
                node(Some("d"), Some("second reply"), vec![]),
            ],
        ),
        node(Some("e"), Some("second root"), vec![]),
    ];

    let flat = flatten_with_ids(&tree);
    let ids: Vec<&str> = flat.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
    assert_eq!(flat[0].body, "first root");
    assert!(flat[0].created_at.is_some());
}

#[test]
fn missing_body_is_skipped_but_children_are_visited() {
    // A deleted comment (no body) with two live replies underneath, plus a
    // stub node with no data at all.
    let tree = vec![
        node(
            Some("removed"),
            None,
            vec![
                node(Some("x"), Some("still here"), vec![]),
                node(Some("y"), Some("me too"), vec![]),
            ],
        ),
        CommentNode { data: None },
        node(Some("z"), Some("root"), vec![]),
    ];

    let flat = flatten_with_ids(&tree);
    let ids: Vec<&str> = flat.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["x", "y", "z"]);
}

#[test]
fn emits_exactly_nodes_with_bodies() {
    // 6 nodes total, 2 of them missing a body.
    let tree = vec![node(
        Some("1"),
        Some("a"),
        vec![
            node(Some("2"), None, vec![node(Some("3"), Some("b"), vec![])]),
            node(Some("4"), Some("c"), vec![node(Some("5"), None, vec![])]),
            node(Some("6"), Some("d"), vec![]),
        ],
    )];

    assert_eq!(flatten_with_ids(&tree).len(), 4);
    assert_eq!(flatten_bodies(&tree).len(), 4);
}

#[test]
fn thousand_deep_reply_chain_does_not_overflow() {
    let mut current = node(Some("c999"), Some("deepest"), vec![]);
    for i in (0..999).rev() {
        let id = format!("c{}", i);
        let body = format!("comment {}", i);
        current = node(Some(&id), Some(&body), vec![current]);
    }

    let flat = flatten_with_ids(&[current]);
    assert_eq!(flat.len(), 1000);
    assert_eq!(flat[0].id, "c0");
    assert_eq!(flat[999].id, "c999");
}

#[test]
fn body_only_mode_keeps_comments_without_ids() {
    let tree = vec![
        node(None, Some("anonymous but present"), vec![]),
        node(Some("a"), Some("tracked"), vec![]),
    ];

    let bodies = flatten_bodies(&tree);
    assert_eq!(bodies, vec!["anonymous but present", "tracked"]);

    // The id-tracked variant drops the id-less one.
    let flat = flatten_with_ids(&tree);
    assert_eq!(flat.len(), 1);
    assert_eq!(flat[0].id, "a");
}

#[test]
fn deserializes_reddit_listing_quirks() {
    // Reddit sends replies as "" when there are none, and "more" stubs carry
    // no body. Both shapes must decode and flatten.
    let raw = serde_json::json!([
        {
            "kind": "t1",
            "data": {
                "id": "top",
                "body": "I loved Tomorrow, and Tomorrow, and Tomorrow",
                "created_utc": 1700000000.0,
                "replies": {
                    "kind": "Listing",
                    "data": {
                        "children": [
                            { "kind": "t1", "data": { "id": "child", "body": "Same!", "replies": "" } },
                            { "kind": "more", "data": { "count": 3, "children": ["abc"] } }
                        ]
                    }
                }
            }
        }
    ]);

    let tree: Vec<CommentNode> = serde_json::from_value(raw).expect("listing should decode");
    let flat = flatten_with_ids(&tree);
    let ids: Vec<&str> = flat.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["top", "child"]);
}
