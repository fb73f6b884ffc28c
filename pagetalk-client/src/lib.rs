mod adapter;
pub use adapter::CommentStore;

mod bucket;
pub use bucket::PageBucket;

mod error;
pub use error::Error;

mod order;
pub use order::SortOrder;

mod store;
pub use store::{AttachmentFile, Etag, ItemId, ListStore, RawBucket, StoreError};

mod tree;
pub use tree::{flatten, CommentNode};

mod votes;
pub use votes::reconcile_votes;

pub mod api {
    pub use pagetalk_api::*;
}
