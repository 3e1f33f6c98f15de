use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortalWatchError {
    /// Store document could not be read, parsed, or written.
    #[error("Store error: {0}")]
    Store(String),

    /// Page fetch failed at the transport level.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Oracle call failed or returned an unusable payload.
    #[error("Oracle error: {0}")]
    Oracle(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
