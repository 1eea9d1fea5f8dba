use std::path::PathBuf;

pub type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure kinds for the deposit pipeline. Pure-computation errors
/// (`MalformedRecord`, `MalformedEncoding`) must never be swallowed, a bad
/// commitment is rejected on-chain so it has to be rejected here first.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed record: {field} must be {expected} bytes, got {actual}")]
    MalformedRecord {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),

    #[error("submission failed: {source}")]
    SubmissionFailed {
        #[source]
        source: BoxedSource,
    },

    #[error("source not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("rpc request failed: {source}")]
    Rpc {
        #[source]
        source: BoxedSource,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid record collection: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn submission(source: impl Into<BoxedSource>) -> Self {
        Error::SubmissionFailed {
            source: source.into(),
        }
    }

    pub fn rpc(source: impl Into<BoxedSource>) -> Self {
        Error::Rpc {
            source: source.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
