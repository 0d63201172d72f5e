use std::path::PathBuf;

/// Errors raised by the integron library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("invalid hit: {0}")]
    InvalidHit(String),

    #[error("search failed in window {window}: {reason}")]
    Search { window: String, reason: String },

    #[error("{0} not found, install it or give its path")]
    MissingTool(String),

    #[error("replicon error: {0}")]
    Replicon(String),

    #[error("I/O error: {source} ({path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
}

impl Error {
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: path.into(),
        }
    }

    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            source: err,
            path: PathBuf::from("<unknown>"),
        }
    }
}
