mod comment;
mod error;
mod user;
mod vote;

pub use comment::{Attachment, Comment, CommentId};
pub use error::Error;
pub use user::{UserId, UserInfo};
pub use vote::{VoteRecord, Voter};

pub use uuid::Uuid;
pub type Time = chrono::DateTime<chrono::Utc>;

/// Everything persisted into a bucket ends up inside a plain text field of
/// the backing list, which cannot hold null bytes.
pub fn validate_string(s: &str) -> Result<(), Error> {
    match s.contains('\0') {
        true => Err(Error::NullByteInString(String::from(s))),
        false => Ok(()),
    }
}
