use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong between fetching the download page and
/// swapping in a freshly unpacked toolchain.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid downloads url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status received while requesting downloads from {url}: {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("unable to read download page from {url}: {reason}")]
    Markup { url: String, reason: String },

    /// A normal outcome rather than a fault: nothing in the catalog matched.
    #[error("requested version ({0}) not found")]
    VersionNotFound(String),

    #[error("unable to determine the installation root: {0}")]
    InstallRoot(String),

    #[error("{context} ({}): {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("extract archive: unknown type {kind} in {}", .path.display())]
    UnsupportedEntry { kind: String, path: PathBuf },

    #[error("refusing to extract path outside the destination: {}", .0.display())]
    UnsafePath(PathBuf),

    #[error(
        "archive did not produce {} (top-level entries: {})",
        .expected.display(),
        entry_list(.found)
    )]
    IncompleteArchive { expected: PathBuf, found: Vec<String> },

    #[error("archive entry {} already exists next to the installation root", .0.display())]
    EntryExists(PathBuf),

    #[error("zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("encode listing: {0}")]
    Json(#[from] serde_json::Error),
}

fn entry_list(found: &[String]) -> String {
    if found.is_empty() {
        "none".to_owned()
    } else {
        found.join(", ")
    }
}

impl Error {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }

    /// `true` when the requested version simply isn't in the catalog.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::VersionNotFound(_))
    }
}
