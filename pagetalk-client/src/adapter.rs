use std::collections::HashSet;

use crate::api::{Attachment, Comment, CommentId, UserInfo, VoteRecord};
use crate::bucket::{self, PageBucket};
use crate::store::{AttachmentFile, ListStore, StoreError};
use crate::votes::reconcile_votes;
use crate::{CommentNode, Error, SortOrder};

/// How many read-transform-write rounds a mutation tries before giving up
/// when its conditional writes keep losing to concurrent writers.
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Read-modify-write adapter between structured comment and vote records and
/// the two serialized blob fields of a page's bucket item.
///
/// Every mutation re-reads the full bucket, applies its change in memory and
/// writes the whole blob back, conditional on the version token from the
/// read. A rejected write re-runs the round, so two concurrent votes both
/// land instead of the later one silently overwriting the earlier.
pub struct CommentStore<S> {
    store: S,
}

impl<S: ListStore> CommentStore<S> {
    pub fn new(store: S) -> CommentStore<S> {
        CommentStore { store }
    }

    /// The underlying store, for host-side operations that bypass the bucket
    /// protocol (attachment upload and the like).
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    async fn load_bucket(&mut self, page_url: &str) -> Result<Option<PageBucket>, Error> {
        Ok(self
            .store
            .find_bucket(page_url)
            .await?
            .map(PageBucket::from_raw))
    }

    /// Full comment list for a page, flat and in stored order, with votes
    /// and attachments merged in. A page with no bucket yet reads as empty.
    pub async fn fetch_comments(
        &mut self,
        page_url: &str,
        viewer: &UserInfo,
    ) -> Result<Vec<Comment>, Error> {
        let Some(mut bucket) = self.load_bucket(page_url).await? else {
            return Ok(Vec::new());
        };
        let files = self.store.list_attachments(page_url).await?;
        for c in &mut bucket.comments {
            c.attachments = attachments_for(&files, &c.id);
        }
        reconcile_votes(&mut bucket.comments, &bucket.votes, viewer.id);
        Ok(bucket.comments)
    }

    /// One-call reload: fetch, merge votes, then nest and sort for display.
    pub async fn fetch_tree(
        &mut self,
        page_url: &str,
        viewer: &UserInfo,
        order: SortOrder,
    ) -> Result<Vec<CommentNode>, Error> {
        let flat = self.fetch_comments(page_url, viewer).await?;
        Ok(CommentNode::assemble(flat, order))
    }

    /// Appends a new comment, creating the page's bucket on first post.
    /// Uniqueness of `comment.id` is the caller's responsibility
    /// ([`CommentId::random`](crate::api::CommentId::random) takes care of it).
    pub async fn post(&mut self, page_url: &str, comment: Comment) -> Result<(), Error> {
        comment.validate()?;
        for _ in 0..MAX_WRITE_ATTEMPTS {
            match self.load_bucket(page_url).await? {
                None => {
                    let blob = bucket::comments_blob(std::slice::from_ref(&comment))?;
                    let title = bucket::page_title(page_url);
                    match self.store.create_bucket(page_url, title, &blob).await {
                        Ok(()) => return Ok(()),
                        Err(StoreError::BucketExists(_)) => {
                            // Someone else posted first; append to their item.
                            tracing::debug!(page_url, "bucket creation raced, retrying");
                            continue;
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
                Some(mut b) => {
                    b.comments.push(comment.clone());
                    let blob = b.comments_blob()?;
                    match self.store.write_comments(b.item, &b.etag, &blob).await {
                        Ok(()) => return Ok(()),
                        Err(StoreError::StaleVersion(_)) => {
                            tracing::debug!(page_url, "comments write lost the race, retrying");
                            continue;
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
            }
        }
        Err(Error::write_conflict(page_url))
    }

    /// Overwrites the stored record matching `comment.id` with the caller's
    /// version. Silently no-ops when the id is absent; the comment may have
    /// been deleted under us.
    pub async fn edit(&mut self, page_url: &str, comment: Comment) -> Result<(), Error> {
        comment.validate()?;
        self.rewrite_comments(page_url, |mut all| {
            let slot = all.iter_mut().find(|c| c.id == comment.id)?;
            *slot = comment.clone();
            Some(all)
        })
        .await
    }

    /// Removes a comment together with its entire reply subtree in a single
    /// write; siblings and unrelated comments are untouched.
    pub async fn delete(&mut self, page_url: &str, comment: &Comment) -> Result<(), Error> {
        let target = comment.id.clone();
        self.rewrite_comments(page_url, |mut all| {
            let doomed = collect_subtree(&all, &target);
            let before = all.len();
            all.retain(|c| !doomed.contains(&c.id));
            match all.len() == before {
                true => None,
                false => Some(all),
            }
        })
        .await
    }

    /// Synchronizes the viewer's membership in the comment's voter set with
    /// the `user_has_upvoted` flag the caller already flipped client-side.
    /// Voting twice the same way changes nothing (set semantics).
    pub async fn vote(
        &mut self,
        page_url: &str,
        comment: &Comment,
        viewer: &UserInfo,
    ) -> Result<(), Error> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let Some(mut b) = self.load_bucket(page_url).await? else {
                return Err(Error::no_comments_item(page_url));
            };
            match b.votes.iter().position(|v| v.comment_id == comment.id) {
                Some(pos) => match comment.user_has_upvoted {
                    true => b.votes[pos].add_voter(viewer.id),
                    false => b.votes[pos].remove_voter(viewer.id),
                },
                None if comment.user_has_upvoted => {
                    let mut record = VoteRecord::new(comment.id.clone());
                    record.add_voter(viewer.id);
                    b.votes.push(record);
                }
                // Un-voting a comment nobody ever voted on: nothing to write.
                None => return Ok(()),
            }
            let blob = b.likes_blob()?;
            match self.store.write_likes(b.item, &b.etag, &blob).await {
                Ok(()) => return Ok(()),
                Err(StoreError::StaleVersion(_)) => {
                    tracing::debug!(page_url, "likes write lost the race, retrying");
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(Error::write_conflict(page_url))
    }

    /// Whether the viewer may moderate other people's comments. Lookup
    /// failures read as not-admin.
    pub async fn is_admin(&mut self, viewer: &UserInfo) -> bool {
        match self.store.is_comment_admin(viewer).await {
            Ok(admin) => admin,
            Err(err) => {
                tracing::warn!(?err, "admin group lookup failed, treating viewer as non-admin");
                false
            }
        }
    }

    /// One read-transform-conditional-write round per attempt until a write
    /// goes through. `transform` returns the new comment list, or `None` to
    /// leave the bucket untouched. A page without a bucket is left alone.
    async fn rewrite_comments<F>(&mut self, page_url: &str, mut transform: F) -> Result<(), Error>
    where
        F: FnMut(Vec<Comment>) -> Option<Vec<Comment>>,
    {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let Some(b) = self.load_bucket(page_url).await? else {
                return Ok(());
            };
            let Some(new) = transform(b.comments) else {
                return Ok(());
            };
            let blob = bucket::comments_blob(&new)?;
            match self.store.write_comments(b.item, &b.etag, &blob).await {
                Ok(()) => return Ok(()),
                Err(StoreError::StaleVersion(_)) => {
                    tracing::debug!(page_url, "comments write lost the race, retrying");
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(Error::write_conflict(page_url))
    }
}

/// Ids of `target` plus every transitive reply to it. Explicit worklist
/// rather than recursion: reply chains can get arbitrarily deep, and the
/// visited set doubles as a guard against parent-pointer cycles.
fn collect_subtree(all: &[Comment], target: &CommentId) -> HashSet<CommentId> {
    let mut doomed = HashSet::new();
    let mut worklist = vec![target.clone()];
    while let Some(id) = worklist.pop() {
        if !doomed.insert(id.clone()) {
            continue;
        }
        worklist.extend(
            all.iter()
                .filter(|c| c.parent.as_ref() == Some(&id))
                .map(|c| c.id.clone()),
        );
    }
    doomed
}

/// Attachment metadata for one comment: the files whose name starts with the
/// comment's id prefix, original name restored by stripping it.
fn attachments_for(files: &[AttachmentFile], id: &CommentId) -> Vec<Attachment> {
    let prefix = id.attachment_prefix();
    files
        .iter()
        .filter_map(|f| {
            f.file_name.strip_prefix(&prefix).map(|name| Attachment {
                name: String::from(name),
                url: f.url.clone(),
            })
        })
        .collect()
}
