use std::cmp::Reverse;

use crate::api::Comment;

/// Ordering applied to the flat comment list before nesting; replies are
/// reordered inside their parent too, not just the top level.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize,
)]
pub enum SortOrder {
    /// Stored append order. Posts append to the blob, so the most recently
    /// posted comment comes last.
    #[default]
    Newest,
    /// Reverse of the stored order.
    Oldest,
    /// Descending upvote count; equal counts keep their stored relative
    /// order, which needs a stable sort.
    Popular,
}

impl SortOrder {
    pub fn sort(&self, comments: &mut [Comment]) {
        match self {
            SortOrder::Newest => {}
            SortOrder::Oldest => comments.reverse(),
            SortOrder::Popular => comments.sort_by_key(|c| Reverse(c.upvote_count)),
        }
    }
}
