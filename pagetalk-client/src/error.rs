use crate::api::Error as ApiError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl Error {
    pub fn no_comments_item(page_url: &str) -> Error {
        Error::Api(ApiError::NoCommentsItem(String::from(page_url)))
    }

    pub fn write_conflict(page_url: &str) -> Error {
        Error::Api(ApiError::WriteConflict(String::from(page_url)))
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Error {
        match err {
            StoreError::Other(err) => Error::Anyhow(err),
            // Stale tokens and creation races are normally absorbed by the
            // adapter's retry loop; one escaping is a storage-layer problem.
            other => Error::Anyhow(anyhow::Error::new(other)),
        }
    }
}
