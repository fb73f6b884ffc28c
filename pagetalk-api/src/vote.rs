use crate::{CommentId, UserId};

/// One voter entry in the likes blob, kept as a one-field struct to match
/// the stored `{"userid": N}` shape.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Voter {
    pub userid: UserId,
}

/// Per-comment vote record as persisted in a bucket's likes blob.
///
/// `voters` has set semantics on the user id; order is irrelevant.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct VoteRecord {
    #[serde(rename = "commentID")]
    pub comment_id: CommentId,
    #[serde(rename = "userVote")]
    pub voters: Vec<Voter>,
}

impl VoteRecord {
    pub fn new(comment_id: CommentId) -> VoteRecord {
        VoteRecord {
            comment_id,
            voters: Vec::new(),
        }
    }

    pub fn count(&self) -> u32 {
        self.voters.len() as u32
    }

    pub fn has_voter(&self, user: UserId) -> bool {
        self.voters.iter().any(|v| v.userid == user)
    }

    /// No-ops when the user already voted.
    pub fn add_voter(&mut self, user: UserId) {
        if !self.has_voter(user) {
            self.voters.push(Voter { userid: user });
        }
    }

    pub fn remove_voter(&mut self, user: UserId) {
        self.voters.retain(|v| v.userid != user);
    }
}
