use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocuchatError>;

#[derive(Debug, Error)]
pub enum DocuchatError {
    #[error("unable to find the document: {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("`{}` does not name a file", .0.display())]
    InvalidDocumentPath(PathBuf),

    #[error("failed to extract text from {}: {message}", .path.display())]
    Extraction { path: PathBuf, message: String },

    #[error("no index named `{0}`")]
    IndexNotFound(String),

    #[error("index `{name}` was built with `{found}` but `{expected}` is configured")]
    EmbeddingMismatch {
        name: String,
        found: String,
        expected: String,
    },

    #[error("index store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("completion stream reported an error: {0}")]
    StreamEvent(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing configuration: {0} is not set")]
    MissingConfig(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    InvalidConfig { key: &'static str, value: String },

    #[error("interrupted")]
    Interrupted,
}

impl DocuchatError {
    pub fn is_interrupt(&self) -> bool {
        match self {
            Self::Interrupted => true,
            Self::Io(e) => e.kind() == io::ErrorKind::Interrupted,
            _ => false,
        }
    }
}

impl From<dialoguer::Error> for DocuchatError {
    #[allow(unreachable_patterns)]
    fn from(err: dialoguer::Error) -> Self {
        match err {
            dialoguer::Error::IO(e) if e.kind() == io::ErrorKind::Interrupted => Self::Interrupted,
            dialoguer::Error::IO(e) => Self::Io(e),
            other => Self::Io(io::Error::new(io::ErrorKind::Other, other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_detection() {
        assert!(DocuchatError::Interrupted.is_interrupt());
        let io_err = io::Error::new(io::ErrorKind::Interrupted, "read interrupted");
        assert!(DocuchatError::from(io_err).is_interrupt());
        assert!(!DocuchatError::IndexNotFound("a.pdf".into()).is_interrupt());
    }

    #[test]
    fn test_messages() {
        let err = DocuchatError::DocumentNotFound(PathBuf::from("/tmp/missing.pdf"));
        assert_eq!(err.to_string(), "unable to find the document: /tmp/missing.pdf");

        let err = DocuchatError::MissingConfig("OPENAI_API_KEY");
        assert_eq!(err.to_string(), "missing configuration: OPENAI_API_KEY is not set");
    }
}
