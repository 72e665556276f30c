use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the annotation lookup and source indexing APIs.
///
/// Malformed annotation values and unknown annotation names are not errors:
/// the former fall back to raw strings and the latter resolve to `None` or an
/// empty list.
#[derive(Debug, Error)]
pub enum Error {
    /// The element handle cannot provide a documentation comment.
    ///
    /// This is an integration mistake (wrong element type handed to the
    /// cache) and is reported immediately instead of being treated as an
    /// empty comment.
    #[error("reflector of kind `{kind}` ({identity}) does not provide doc comments")]
    UnsupportedReflector { kind: &'static str, identity: String },

    /// Reading a source file failed.
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source file could not be parsed.
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    /// No indexed element has the requested identity.
    #[error("no element `{0}` in index")]
    ElementNotFound(String),

    /// Encoding or decoding JSON output failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
