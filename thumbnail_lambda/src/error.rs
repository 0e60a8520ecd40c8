use thiserror::Error;

/// Every way a thumbnail invocation can fail. The handler reports all of them
/// the same way, as a `fail` response carrying the rendered message.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("object {bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    #[error("failed to fetch {bucket}/{key}: {message}")]
    Fetch {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("failed to store {bucket}/{key}: {message}")]
    Store {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode thumbnail: {0}")]
    Encode(#[source] image::ImageError),

    #[error("thumbnail task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
