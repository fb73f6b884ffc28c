use async_trait::async_trait;

use crate::api::UserInfo;

/// Row id of a bucket item inside the backing list.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ItemId(pub i64);

/// Opaque version token for a bucket item. A conditional write carries the
/// token from the read it was based on; the store rejects the write when the
/// token no longer matches the item.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Etag(pub String);

/// A bucket item as stored, both blobs still serialized. An absent blob
/// field reads as the empty string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawBucket {
    pub item: ItemId,
    pub etag: Etag,
    pub comments: String,
    pub likes: String,
}

/// One attachment file as listed by the store, its name still carrying the
/// `{comment id}_` prefix.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttachmentFile {
    pub file_name: String,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The version token given to a conditional write no longer matches.
    #[error("stale version token for page {0:?}")]
    StaleVersion(String),

    /// Bucket creation raced another writer that created the item first.
    #[error("page {0:?} already has a bucket item")]
    BucketExists(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Seam to the external list service holding the buckets. Buckets are looked
/// up by exact page-URL match, attachment files by the per-comment file name
/// prefix convention. List provisioning, authentication, and the upload
/// mechanics themselves all stay on the host side of this trait.
#[async_trait]
pub trait ListStore {
    async fn find_bucket(&mut self, page_url: &str) -> Result<Option<RawBucket>, StoreError>;

    /// Creates the bucket item for a page that has none yet. The likes blob
    /// starts out absent.
    async fn create_bucket(
        &mut self,
        page_url: &str,
        title: &str,
        comments: &str,
    ) -> Result<(), StoreError>;

    async fn write_comments(
        &mut self,
        item: ItemId,
        etag: &Etag,
        comments: &str,
    ) -> Result<(), StoreError>;

    async fn write_likes(
        &mut self,
        item: ItemId,
        etag: &Etag,
        likes: &str,
    ) -> Result<(), StoreError>;

    /// Every attachment file uploaded for this page, in listing order.
    async fn list_attachments(&mut self, page_url: &str)
        -> Result<Vec<AttachmentFile>, StoreError>;

    /// Group membership lookup backing the admin check.
    async fn is_comment_admin(&mut self, user: &UserInfo) -> Result<bool, StoreError>;
}
