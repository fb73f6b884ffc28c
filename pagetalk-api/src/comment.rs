use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::{Error, Time, UserId, UserInfo};

#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub String);

impl CommentId {
    pub fn random() -> CommentId {
        CommentId(Uuid::new_v4().to_string())
    }

    pub fn stub() -> CommentId {
        CommentId(String::from("ffffffff-ffff-ffff-ffff-ffffffffffff"))
    }

    /// File name prefix linking an uploaded attachment back to this comment.
    pub fn attachment_prefix(&self) -> String {
        format!("{}_", self.0)
    }
}

/// Attachment metadata, resolved from the page's file listing on every read.
/// The link to the owning comment is the `{comment id}_{original name}` file
/// naming convention, so this never appears inside the comments blob itself.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

/// One comment as persisted in a bucket's comments blob.
///
/// `upvote_count` and `user_has_upvoted` are recomputed from the vote records
/// on every read; the persisted values only matter for comments that have no
/// vote record, where they keep their pre-vote defaults.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub parent: Option<CommentId>,
    pub content: String,
    pub created: Time,
    pub modified: Time,
    pub fullname: String,
    pub userid: UserId,
    #[serde(default)]
    pub upvote_count: u32,
    #[serde(default)]
    pub user_has_upvoted: bool,

    /// Marks comments posted during the current session; display-only and
    /// never written back to the bucket.
    #[serde(default, skip_serializing)]
    pub is_new: bool,

    #[serde(default)]
    pub pings: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,

    /// Resolved from the attachment listing at read time, never persisted.
    #[serde(skip)]
    pub attachments: Vec<Attachment>,
}

impl Comment {
    /// A fresh comment authored by `author`, ready to be posted.
    pub fn now(author: &UserInfo, parent: Option<CommentId>, content: String) -> Comment {
        let date = Utc::now();
        Comment {
            id: CommentId::random(),
            parent,
            content,
            created: date,
            modified: date,
            fullname: author.display_name.clone(),
            userid: author.id,
            upvote_count: 0,
            user_has_upvoted: false,
            is_new: true,
            pings: HashMap::new(),
            profile_picture_url: Some(author.avatar_url.clone()),
            attachments: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.content)?;
        crate::validate_string(&self.fullname)?;
        for (k, v) in &self.pings {
            crate::validate_string(k)?;
            crate::validate_string(v)?;
        }
        Ok(())
    }
}
