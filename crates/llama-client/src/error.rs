//! Client-side errors.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] zeromq::ZmqError),

    #[error("no server at {endpoint} after {timeout:?}")]
    ConnectTimeout { endpoint: String, timeout: Duration },

    #[error("invalid reply: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("empty reply")]
    EmptyReply,

    /// The server answered with an `error` record.
    #[error("server error: {0}")]
    Remote(String),

    #[error("expected a {expected} reply, got {got}")]
    UnexpectedReply { expected: &'static str, got: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("issue loading config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode config: {0}")]
    Encode(#[from] serde_json::Error),
}
