#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("No comments item exists yet for page {0:?}")]
    NoCommentsItem(String),

    #[error("Gave up writing page {0:?} after repeated version conflicts")]
    WriteConflict(String),

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),
}
