use crate::api::{Comment, UserId, VoteRecord};

/// Folds the vote records into the comment list.
///
/// Every comment with a matching record gets `upvote_count` overwritten with
/// the voter count and `user_has_upvoted` with whether `viewer` is among the
/// voters. Comments without a record keep what the blob stored. Nothing else
/// on any comment is touched.
pub fn reconcile_votes(comments: &mut [Comment], votes: &[VoteRecord], viewer: UserId) {
    for record in votes {
        if let Some(c) = comments.iter_mut().find(|c| c.id == record.comment_id) {
            c.upvote_count = record.count();
            c.user_has_upvoted = record.has_voter(viewer);
        }
    }
}
