//! Host platform detection and the installability check.
//!
//! The download page names platforms the way the Go toolchain does
//! (`darwin`, `amd64`, ...), so the Rust target names are translated once
//! here and everything else compares in the page's vocabulary.

use crate::entry::{DownloadEntry, Os};

/// The OS/architecture pair an entry has to match to be installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    os: Option<Os>,
    arch: Option<String>,
}

impl Platform {
    /// A platform given in the download page's vocabulary.
    pub fn new(os: Option<Os>, arch: Option<&str>) -> Self {
        Self {
            os,
            arch: arch.map(str::to_owned),
        }
    }

    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        Self::from_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Translate Rust's `target_os` / `target_arch` names.
    pub fn from_target(os: &str, arch: &str) -> Self {
        let os = match os {
            "macos" => Some(Os::Darwin),
            "linux" => Some(Os::Linux),
            "freebsd" => Some(Os::Freebsd),
            "windows" => Some(Os::Windows),
            _ => None,
        };
        let arch = match arch {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            "arm" => "armv6l",
            "powerpc64" => "ppc64le",
            "loongarch64" => "loong64",
            other => other,
        };
        Self::new(os, Some(arch))
    }

    /// Operating system, if Go publishes archives for it.
    pub fn os(&self) -> Option<Os> {
        self.os
    }

    /// Architecture as the download page names it.
    pub fn arch(&self) -> Option<&str> {
        self.arch.as_deref()
    }

    /// Whether `entry` can replace the toolchain on this platform: a binary
    /// distribution whose OS and architecture both match. Missing values
    /// never match, not even each other.
    pub fn can_install(&self, entry: &DownloadEntry) -> bool {
        // source code is not installable
        if entry.os() == Some(Os::Src) {
            return false;
        }

        match (entry.arch(), self.arch()) {
            (Some(a), Some(b)) if a == b => {}
            _ => return false,
        }

        matches!((entry.os(), self.os), (Some(a), Some(b)) if a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Sections;
    use url::Url;

    fn entry(link: &str) -> DownloadEntry {
        let base = Url::parse("https://go.dev/dl/").unwrap();
        DownloadEntry::from_link(&base, link, Sections::default())
    }

    #[test]
    fn maps_rust_target_names() {
        let p = Platform::from_target("macos", "aarch64");
        assert_eq!(p.os(), Some(Os::Darwin));
        assert_eq!(p.arch(), Some("arm64"));

        let p = Platform::from_target("linux", "x86_64");
        assert_eq!(p.os(), Some(Os::Linux));
        assert_eq!(p.arch(), Some("amd64"));

        let p = Platform::from_target("haiku", "s390x");
        assert_eq!(p.os(), None);
        assert_eq!(p.arch(), Some("s390x"));
    }

    #[test]
    fn matching_platform_is_installable() {
        let host = Platform::new(Some(Os::Linux), Some("amd64"));
        assert!(host.can_install(&entry("go1.19.4.linux-amd64.tar.gz")));
        assert!(!host.can_install(&entry("go1.19.4.linux-arm64.tar.gz")));
        assert!(!host.can_install(&entry("go1.19.4.darwin-amd64.tar.gz")));
    }

    #[test]
    fn source_is_never_installable() {
        for host in [
            Platform::new(Some(Os::Src), None),
            Platform::new(Some(Os::Linux), Some("amd64")),
            Platform::new(None, None),
        ] {
            assert!(!host.can_install(&entry("go1.19.4.src.tar.gz")));
        }
    }

    #[test]
    fn unknown_fields_never_match() {
        let host = Platform::new(None, None);
        assert!(!host.can_install(&entry("/doc/install")));

        let host = Platform::new(Some(Os::Linux), None);
        assert!(!host.can_install(&entry("go1.19.4.linux.tar.gz")));
    }
}
