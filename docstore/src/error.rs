use thiserror::Error;

/// Errors raised by [`DocumentStore`](crate::DocumentStore) implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A path segment was empty or contained a `/`, or a path had the wrong segment count.
    #[error("Invalid document path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },
    /// Document fields could not be converted into the requested type.
    #[error("Failed to decode document {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// A value could not be converted into document fields.
    #[error("Failed to encode document fields: {0}")]
    Encode(String),
    /// The remote store answered with a non-success status.
    #[error("Document store request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    /// The remote store answered with a body that could not be understood.
    #[error("Unexpected response from document store: {0}")]
    UnexpectedResponse(String),
    /// An access token could not be obtained.
    #[error("Failed to obtain access token: {0}")]
    Auth(String),
    /// Service account credentials could not be read.
    #[error("Failed to read credentials file {path}: {source}")]
    Credentials {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}
