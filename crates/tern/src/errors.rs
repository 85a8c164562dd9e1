use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Stream transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Stream cancelled")]
    Cancelled,
}

pub type ChatResult<T> = Result<T, ChatError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Could not determine a home directory")]
    NoHomeDir,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Invalid provider entry `{id}`: {source}")]
    InvalidProvider {
        id: String,
        #[source]
        source: crate::providers::configs::ProviderConfigError,
    },
}
