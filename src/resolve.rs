use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::catalog::Catalog;
use crate::entry::DownloadEntry;
use crate::error::{Error, Result};
use crate::platform::Platform;

static LATEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"feature|latest|stable").expect("valid latest pattern"));
static UNSTABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"unstable").expect("valid unstable pattern"));

/// What the user asked for: an exact version, or a keyword.
///
/// Keywords are matched loosely, so `unstable` also counts as a request for
/// the featured release (it contains `stable`). Unstable entries come after
/// featured ones on the page, which is what makes them win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    token: String,
    featured: bool,
    unstable: bool,
}

impl Request {
    /// Classify `token` as a version or a keyword.
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_owned(),
            featured: LATEST_RE.is_match(token),
            unstable: UNSTABLE_RE.is_match(token),
        }
    }

    /// The request exactly as given.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Matches featured entries (`latest`, `stable`, `featured`).
    pub fn wants_featured(&self) -> bool {
        self.featured
    }

    /// Matches unstable entries.
    pub fn wants_unstable(&self) -> bool {
        self.unstable
    }
}

/// Pick the entry to install for `request` on `host`.
///
/// The first installable entry whose version equals the token wins
/// immediately. Otherwise keyword requests take the *last* installable
/// entry flagged featured (or unstable) in catalog order.
pub fn resolve<'c>(
    catalog: &'c Catalog,
    request: &Request,
    host: &Platform,
) -> Result<&'c DownloadEntry> {
    let mut best = None;

    for entry in catalog {
        if !host.can_install(entry) {
            continue;
        }

        if entry.version() == Some(request.token()) {
            debug!(url = entry.url(), "exact version match");
            return Ok(entry);
        }

        if (request.wants_featured() && entry.is_featured())
            || (request.wants_unstable() && entry.is_unstable())
        {
            best = Some(entry);
        }
    }

    match best {
        Some(entry) => {
            debug!(url = entry.url(), token = request.token(), "keyword match");
            Ok(entry)
        }
        None => Err(Error::VersionNotFound(request.token().to_owned())),
    }
}
