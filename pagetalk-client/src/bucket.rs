use anyhow::Context;

use crate::api::{Comment, VoteRecord};
use crate::store::{Etag, ItemId, RawBucket};

/// A page's bucket with both blobs deserialized.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageBucket {
    pub item: ItemId,
    pub etag: Etag,
    pub comments: Vec<Comment>,
    pub votes: Vec<VoteRecord>,
}

impl PageBucket {
    pub fn from_raw(raw: RawBucket) -> PageBucket {
        PageBucket {
            item: raw.item,
            etag: raw.etag,
            comments: parse_blob(&raw.comments, "comments"),
            votes: parse_blob(&raw.likes, "likes"),
        }
    }

    pub fn comments_blob(&self) -> anyhow::Result<String> {
        comments_blob(&self.comments)
    }

    pub fn likes_blob(&self) -> anyhow::Result<String> {
        serde_json::to_string(&self.votes).context("serializing likes blob")
    }
}

/// An absent or malformed blob reads as an empty collection, not an error:
/// a bucket written by hand or by an older version must degrade to "no
/// comments yet" instead of wedging the whole page.
fn parse_blob<T: serde::de::DeserializeOwned>(raw: &str, what: &'static str) -> Vec<T> {
    if raw.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(raw) {
        Ok(items) => items,
        Err(err) => {
            tracing::warn!(%err, what, "malformed blob in bucket item, treating as empty");
            Vec::new()
        }
    }
}

pub(crate) fn comments_blob(comments: &[Comment]) -> anyhow::Result<String> {
    serde_json::to_string(comments).context("serializing comments blob")
}

/// Title given to a freshly created bucket item: the last path segment of
/// the page URL, or the whole URL when that segment is empty.
pub(crate) fn page_title(page_url: &str) -> &str {
    match page_url.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => page_url,
    }
}
