use crate::reddit::CommentNode;
use crate::types::FlatComment;
use chrono::DateTime;

/// Flatten a nested comment tree into `{id, body, created_at}` records in
/// depth-first, parent-before-children order. Nodes missing a body or an id
/// are skipped, but their replies are still visited: a deleted comment often
/// has live replies underneath it.
///
/// Traversal uses an explicit work-list rather than call-stack recursion.
/// Reply chains can nest hundreds of levels deep, and that must not be able
/// to overflow the stack.
pub fn flatten_with_ids(roots: &[CommentNode]) -> Vec<FlatComment> {
    let mut out = Vec::new();
    let mut stack: Vec<&CommentNode> = roots.iter().rev().collect();

    while let Some(node) = stack.pop() {
        let Some(data) = &node.data else { continue };

        if let (Some(id), Some(body)) = (&data.id, &data.body) {
            out.push(FlatComment {
                id: id.clone(),
                body: body.clone(),
                created_at: data
                    .created_utc
                    .and_then(|secs| DateTime::from_timestamp(secs as i64, 0)),
            });
        }

        for child in data.replies.children().iter().rev() {
            stack.push(child);
        }
    }

    out
}

/// Body-only variant: same traversal, but emits every node that has a body,
/// id or not.
pub fn flatten_bodies(roots: &[CommentNode]) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack: Vec<&CommentNode> = roots.iter().rev().collect();

    while let Some(node) = stack.pop() {
        let Some(data) = &node.data else { continue };

        if let Some(body) = &data.body {
            out.push(body.clone());
        }

        for child in data.replies.children().iter().rev() {
            stack.push(child);
        }
    }

    out
}
