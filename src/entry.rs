use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

/// Installer packages are only published for macOS; the same release is
/// always available as a tarball next to it.
static PACKAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.pkg$").expect("valid package pattern"));

static PLATFORM_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|/)go([a-z0-9.]*)\.(darwin|freebsd|linux|src|windows)(?:-([a-z0-9]*))?")
        .expect("valid platform pattern")
});

/// Operating systems the download page publishes archives for. `Src` marks
/// the source-only distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Darwin,
    Freebsd,
    Linux,
    Src,
    Windows,
}

impl Os {
    /// The name as it appears in archive file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Darwin => "darwin",
            Self::Freebsd => "freebsd",
            Self::Linux => "linux",
            Self::Src => "src",
            Self::Windows => "windows",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Os {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "darwin" => Ok(Self::Darwin),
            "freebsd" => Ok(Self::Freebsd),
            "linux" => Ok(Self::Linux),
            "src" => Ok(Self::Src),
            "windows" => Ok(Self::Windows),
            _ => Err(()),
        }
    }
}

/// Flags inherited from the page section a link was found under.
/// `archived` may co-occur with either of the others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Sections {
    pub archived: bool,
    pub featured: bool,
    pub unstable: bool,
}

/// One downloadable release archive discovered on the download page.
///
/// Entries are immutable once built; fields that could not be recovered from
/// the link are `None` rather than a placeholder string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadEntry {
    version: Option<String>,
    os: Option<Os>,
    arch: Option<String>,
    url: String,
    #[serde(flatten)]
    sections: Sections,
}

impl DownloadEntry {
    /// Build an entry from a download link's `href`.
    ///
    /// The archive URL is the final path segment of `link` joined onto
    /// `base`; a trailing `.pkg` is rewritten to `.tar.gz`. Version, OS and
    /// architecture come from the link as written, so a `.pkg` link still
    /// reports the platform it was published for. Never fails: whatever
    /// can't be recognised is left as `None`.
    pub fn from_link(base: &Url, link: &str, sections: Sections) -> Self {
        let segment = link.trim_end_matches('/').rsplit('/').next().unwrap_or(link);
        let mut url = join_segment(base, segment);

        if PACKAGE_RE.is_match(&url) {
            url = PACKAGE_RE.replace(&url, ".tar.gz").into_owned();
        }

        let (version, os, arch) = match PLATFORM_VERSION_RE.captures(link) {
            Some(caps) => (
                caps.get(1).map(|m| m.as_str()).filter(|v| !v.is_empty()).map(str::to_owned),
                caps.get(2).and_then(|m| m.as_str().parse::<Os>().ok()),
                caps.get(3).map(|m| m.as_str()).filter(|a| !a.is_empty()).map(str::to_owned),
            ),
            None => (None, None, None),
        };

        Self {
            version,
            os,
            arch,
            url,
            sections,
        }
    }

    /// Release version without the `go` prefix, e.g. `1.19.4` or `1.20rc1`.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Target operating system, or `Src` for the source distribution.
    pub fn os(&self) -> Option<Os> {
        self.os
    }

    /// Target architecture in the page's naming (`amd64`, `arm64`, ...).
    pub fn arch(&self) -> Option<&str> {
        self.arch.as_deref()
    }

    /// Absolute URL of the archive to download.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Flags of the page section the link was found under.
    pub fn sections(&self) -> Sections {
        self.sections
    }

    /// Listed among the archived (older) releases.
    pub fn is_archived(&self) -> bool {
        self.sections.archived
    }

    /// Listed as a featured download.
    pub fn is_featured(&self) -> bool {
        self.sections.featured
    }

    /// Listed as an unstable (beta or release candidate) release.
    pub fn is_unstable(&self) -> bool {
        self.sections.unstable
    }

    /// `"<os> <arch>"`, with `unknown` standing in for missing parts.
    pub fn platform_label(&self) -> String {
        format!(
            "{} {}",
            self.os.map_or("unknown", Os::as_str),
            self.arch.as_deref().unwrap_or("unknown")
        )
    }
}

fn join_segment(base: &Url, segment: &str) -> String {
    let mut url = base.clone();
    match url.path_segments_mut() {
        Ok(mut segments) => {
            segments.pop_if_empty().push(segment);
        }
        Err(()) => return format!("{}/{}", base.as_str().trim_end_matches('/'), segment),
    }
    url.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://go.dev/dl/").unwrap()
    }

    fn parse(link: &str) -> DownloadEntry {
        DownloadEntry::from_link(&base(), link, Sections::default())
    }

    #[test]
    fn parses_linux_tarball() {
        let entry = parse("go1.19.4.linux-amd64.tar.gz");
        assert_eq!(entry.version(), Some("1.19.4"));
        assert_eq!(entry.os(), Some(Os::Linux));
        assert_eq!(entry.arch(), Some("amd64"));
        assert_eq!(entry.url(), "https://go.dev/dl/go1.19.4.linux-amd64.tar.gz");
    }

    #[test]
    fn keeps_only_the_last_path_segment() {
        let entry = parse("/dl/go1.20.linux-arm64.tar.gz");
        assert_eq!(entry.url(), "https://go.dev/dl/go1.20.linux-arm64.tar.gz");
        assert_eq!(entry.version(), Some("1.20"));
        assert_eq!(entry.arch(), Some("arm64"));
    }

    #[test]
    fn rewrites_macos_package_but_parses_original() {
        let entry = parse("/dl/go1.19.4.darwin-amd64.pkg");
        assert!(entry.url().ends_with(".tar.gz"));
        assert_eq!(entry.url(), "https://go.dev/dl/go1.19.4.darwin-amd64.tar.gz");
        assert_eq!(entry.version(), Some("1.19.4"));
        assert_eq!(entry.os(), Some(Os::Darwin));
        assert_eq!(entry.arch(), Some("amd64"));
    }

    #[test]
    fn source_archive_has_no_arch() {
        let entry = parse("/dl/go1.21.0.src.tar.gz");
        assert_eq!(entry.os(), Some(Os::Src));
        assert_eq!(entry.arch(), None);
        assert_eq!(entry.version(), Some("1.21.0"));
    }

    #[test]
    fn release_candidates_keep_their_suffix() {
        let entry = parse("/dl/go1.22rc1.windows-386.zip");
        assert_eq!(entry.version(), Some("1.22rc1"));
        assert_eq!(entry.os(), Some(Os::Windows));
        assert_eq!(entry.arch(), Some("386"));
    }

    #[test]
    fn unrecognised_links_degrade_to_none() {
        let entry = parse("/doc/install");
        assert_eq!(entry.version(), None);
        assert_eq!(entry.os(), None);
        assert_eq!(entry.arch(), None);
        assert_eq!(entry.url(), "https://go.dev/dl/install");
        assert_eq!(entry.platform_label(), "unknown unknown");
    }

    #[test]
    fn unknown_os_is_not_matched() {
        let entry = parse("/dl/go1.21.0.plan9-amd64.tar.gz");
        assert_eq!(entry.os(), None);
        assert_eq!(entry.version(), None);
    }

    #[test]
    fn carries_section_flags() {
        let sections = Sections {
            archived: true,
            featured: false,
            unstable: true,
        };
        let entry = DownloadEntry::from_link(&base(), "go1.4.linux-386.tar.gz", sections);
        assert!(entry.is_archived());
        assert!(!entry.is_featured());
        assert!(entry.is_unstable());
    }

    #[test]
    fn serializes_flat() {
        let entry = parse("go1.19.4.linux-amd64.tar.gz");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["os"], "linux");
        assert_eq!(json["arch"], "amd64");
        assert_eq!(json["featured"], false);
    }
}
