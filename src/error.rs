use thiserror::Error;

pub type Result<T> = std::result::Result<T, EtlError>;

/// Errors that end an extraction run.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The body was not JSON, or not the JSON shape the caller expected.
    #[error("unexpected payload for {context}: {source}")]
    Payload {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid next-page cursor {url:?}: {reason}")]
    Cursor { url: String, reason: String },

    #[error("rate limit still exceeded after {attempts} retries")]
    RateLimited { attempts: u32 },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("table {table} has more than one row for key {key:?}")]
    DuplicateKey { table: String, key: String },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EtlError {
    pub fn payload(context: impl Into<String>, source: serde_json::Error) -> Self {
        EtlError::Payload {
            context: context.into(),
            source,
        }
    }
}
