use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid scoring config: {0}")]
    InvalidConfig(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The scorer worker thread has exited; no more events can be applied.
    #[error("scorer worker is no longer running")]
    WorkerGone,
}

pub type Result<T> = std::result::Result<T, Error>;
