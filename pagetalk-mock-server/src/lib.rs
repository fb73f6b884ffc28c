use std::collections::{BTreeMap, HashSet};

use anyhow::anyhow;
use async_trait::async_trait;
use pagetalk_client::{
    api::{UserId, UserInfo},
    AttachmentFile, Etag, ItemId, ListStore, RawBucket, StoreError,
};

/// In-memory stand-in for the backing list service. Conditional writes are
/// checked against a per-item revision counter rendered as the etag.
pub struct MockListServer {
    items: BTreeMap<String, MockItem>,
    next_item: i64,
    attachments: BTreeMap<String, Vec<AttachmentFile>>,
    site_admins: HashSet<UserId>,
    admin_group: HashSet<UserId>,
    admin_lookup_broken: bool,
    fail_next_writes: u32,
}

#[derive(Debug)]
struct MockItem {
    id: ItemId,
    revision: u64,
    title: String,
    comments: String,
    likes: String,
}

impl MockItem {
    fn etag(&self) -> Etag {
        Etag(format!("\"{}\"", self.revision))
    }
}

impl MockListServer {
    pub fn new() -> MockListServer {
        MockListServer {
            items: BTreeMap::new(),
            next_item: 1,
            attachments: BTreeMap::new(),
            site_admins: HashSet::new(),
            admin_group: HashSet::new(),
            admin_lookup_broken: false,
            fail_next_writes: 0,
        }
    }

    pub fn test_num_buckets(&self) -> usize {
        self.items.len()
    }

    /// Raw blobs currently stored for a page, for test assertions.
    pub fn test_raw_blobs(&self, page_url: &str) -> Option<(&str, &str)> {
        self.items
            .get(page_url)
            .map(|i| (&i.comments as &str, &i.likes as &str))
    }

    pub fn test_title(&self, page_url: &str) -> Option<&str> {
        self.items.get(page_url).map(|i| &i.title as &str)
    }

    /// Seeds a bucket item with arbitrary blob contents, bypassing the
    /// normal write path (e.g. to plant a malformed blob).
    pub fn test_seed_bucket(&mut self, page_url: &str, comments: &str, likes: &str) {
        let id = ItemId(self.next_item);
        self.next_item += 1;
        self.items.insert(
            String::from(page_url),
            MockItem {
                id,
                revision: 0,
                title: String::from(page_url),
                comments: String::from(comments),
                likes: String::from(likes),
            },
        );
    }

    pub fn test_add_attachment(&mut self, page_url: &str, file_name: &str, url: &str) {
        self.attachments
            .entry(String::from(page_url))
            .or_default()
            .push(AttachmentFile {
                file_name: String::from(file_name),
                url: String::from(url),
            });
    }

    pub fn test_grant_comment_admin(&mut self, user: UserId) {
        self.admin_group.insert(user);
    }

    pub fn test_make_site_admin(&mut self, user: UserId) {
        self.site_admins.insert(user);
    }

    pub fn test_break_admin_lookup(&mut self) {
        self.admin_lookup_broken = true;
    }

    /// Makes the next `n` conditional writes fail with a stale token, as if
    /// a concurrent writer kept slipping in between read and write.
    pub fn test_fail_next_writes(&mut self, n: u32) {
        self.fail_next_writes = n;
    }

    fn page_of(&self, item: ItemId) -> Option<&str> {
        self.items
            .iter()
            .find(|(_, i)| i.id == item)
            .map(|(page, _)| page as &str)
    }

    fn check_write(
        &mut self,
        item: ItemId,
        etag: &Etag,
    ) -> Result<&mut MockItem, StoreError> {
        let page = self
            .page_of(item)
            .map(String::from)
            .ok_or_else(|| anyhow!("no item {item:?} in the comments list"))?;
        if self.fail_next_writes > 0 {
            self.fail_next_writes -= 1;
            return Err(StoreError::StaleVersion(page));
        }
        let entry = self.items.get_mut(&page).expect("page resolved above");
        if entry.etag() != *etag {
            return Err(StoreError::StaleVersion(page));
        }
        Ok(entry)
    }
}

impl Default for MockListServer {
    fn default() -> MockListServer {
        MockListServer::new()
    }
}

#[async_trait]
impl ListStore for MockListServer {
    async fn find_bucket(&mut self, page_url: &str) -> Result<Option<RawBucket>, StoreError> {
        Ok(self.items.get(page_url).map(|i| RawBucket {
            item: i.id,
            etag: i.etag(),
            comments: i.comments.clone(),
            likes: i.likes.clone(),
        }))
    }

    async fn create_bucket(
        &mut self,
        page_url: &str,
        title: &str,
        comments: &str,
    ) -> Result<(), StoreError> {
        if self.items.contains_key(page_url) {
            return Err(StoreError::BucketExists(String::from(page_url)));
        }
        let id = ItemId(self.next_item);
        self.next_item += 1;
        self.items.insert(
            String::from(page_url),
            MockItem {
                id,
                revision: 0,
                title: String::from(title),
                comments: String::from(comments),
                likes: String::new(),
            },
        );
        Ok(())
    }

    async fn write_comments(
        &mut self,
        item: ItemId,
        etag: &Etag,
        comments: &str,
    ) -> Result<(), StoreError> {
        let entry = self.check_write(item, etag)?;
        entry.comments = String::from(comments);
        entry.revision += 1;
        Ok(())
    }

    async fn write_likes(
        &mut self,
        item: ItemId,
        etag: &Etag,
        likes: &str,
    ) -> Result<(), StoreError> {
        let entry = self.check_write(item, etag)?;
        entry.likes = String::from(likes);
        entry.revision += 1;
        Ok(())
    }

    async fn list_attachments(
        &mut self,
        page_url: &str,
    ) -> Result<Vec<AttachmentFile>, StoreError> {
        Ok(self.attachments.get(page_url).cloned().unwrap_or_default())
    }

    async fn is_comment_admin(&mut self, user: &UserInfo) -> Result<bool, StoreError> {
        if self.admin_lookup_broken {
            return Err(StoreError::Other(anyhow!(
                "group \"Comment Administrators\" could not be resolved"
            )));
        }
        Ok(self.site_admins.contains(&user.id) || self.admin_group.contains(&user.id))
    }
}
