use std::collections::HashMap;

use crate::api::{Comment, CommentId};
use crate::SortOrder;

/// Display shape of a comment: the persisted record plus its nested replies.
/// Kept distinct from [`Comment`] so a reply tree can never be written back
/// into a bucket by accident.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Nests a flat comment list into parent-rooted reply trees.
    ///
    /// `order` is applied to the flat list first, so children keep their
    /// relative order under each parent. A comment whose parent is absent
    /// from the list is promoted to a root rather than dropped; comments
    /// caught in a parent-pointer cycle are unreachable and fall away.
    pub fn assemble(mut comments: Vec<Comment>, order: SortOrder) -> Vec<CommentNode> {
        order.sort(&mut comments);

        let mut roots = Vec::new();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); comments.len()];
        {
            let index: HashMap<&CommentId, usize> = comments
                .iter()
                .enumerate()
                .map(|(pos, c)| (&c.id, pos))
                .collect();
            for (pos, c) in comments.iter().enumerate() {
                match c.parent.as_ref().and_then(|p| index.get(p)) {
                    Some(&parent_pos) if parent_pos != pos => children[parent_pos].push(pos),
                    // No parent, an unknown parent, or a self-parent: a root.
                    _ => roots.push(pos),
                }
            }
        }

        // Post-order over the forest with an explicit worklist; deep reply
        // chains must not overflow the stack.
        let mut postorder = Vec::with_capacity(comments.len());
        let mut worklist: Vec<(usize, bool)> = roots.iter().rev().map(|&r| (r, false)).collect();
        while let Some((pos, expanded)) = worklist.pop() {
            if expanded {
                postorder.push(pos);
                continue;
            }
            worklist.push((pos, true));
            worklist.extend(children[pos].iter().rev().map(|&child| (child, false)));
        }

        let mut built: Vec<Option<CommentNode>> = comments
            .into_iter()
            .map(|comment| {
                Some(CommentNode {
                    comment,
                    replies: Vec::new(),
                })
            })
            .collect();
        // Children always precede their parent in post-order
        for pos in postorder {
            let replies = children[pos]
                .iter()
                .map(|&child| built[child].take().expect("child node attached twice"))
                .collect();
            if let Some(node) = built[pos].as_mut() {
                node.replies = replies;
            }
        }
        roots
            .into_iter()
            .map(|r| built[r].take().expect("root node attached twice"))
            .collect()
    }
}

/// Pre-order flattening of a reply forest, the inverse of
/// [`CommentNode::assemble`] up to orphan promotion.
pub fn flatten(nodes: Vec<CommentNode>) -> Vec<Comment> {
    let mut flat = Vec::new();
    let mut worklist: Vec<CommentNode> = nodes.into_iter().rev().collect();
    while let Some(node) = worklist.pop() {
        flat.push(node.comment);
        worklist.extend(node.replies.into_iter().rev());
    }
    flat
}
