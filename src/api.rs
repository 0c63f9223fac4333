use tracing::info;

use crate::catalog::Catalog;
use crate::config::{locate_install_root, Config};
use crate::downloader::Downloader;
use crate::entry::DownloadEntry;
use crate::error::Result;
use crate::install::{InstallReport, Installer};
use crate::platform::Platform;
use crate::resolve::{resolve, Request};

// ──────────────────────────────────────────────────────────────────────────────
// Api
// ──────────────────────────────────────────────────────────────────────────────

/// Top-level entry point: fetch the catalog, pick a release, install it.
///
/// # Example
/// ```rust,no_run
/// use gofetch::{Api, Config};
///
/// fn main() -> gofetch::Result<()> {
///     let api = Api::new(Config::new())?;
///     let catalog = api.catalog()?;
///     let entry = api.resolve(&catalog, "latest")?;
///     api.install(entry)?;
///     Ok(())
/// }
/// ```
pub struct Api {
    config: Config,
    host: Platform,
    downloader: Downloader,
}

impl Api {
    /// Create an `Api` for the current host.
    pub fn new(config: Config) -> Result<Self> {
        Self::for_platform(config, Platform::current())
    }

    /// Create an `Api` that resolves releases for `host` instead.
    pub fn for_platform(config: Config, host: Platform) -> Result<Self> {
        let downloader = Downloader::new(&config)?;
        Ok(Self {
            config,
            host,
            downloader,
        })
    }

    /// Settings this `Api` was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The platform releases are resolved for.
    pub fn host(&self) -> &Platform {
        &self.host
    }

    // ── Catalog ──────────────────────────────────────────────────────────────

    /// Fetch the download page and extract its catalog.
    pub fn catalog(&self) -> Result<Catalog> {
        let base = self.config.downloads_url()?;
        let page = self.downloader.fetch_page(&base)?;
        let catalog = Catalog::from_html(&page, &base);
        info!(entries = catalog.len(), "catalog ready");
        Ok(catalog)
    }

    /// Select the entry matching `token` that this host can install.
    pub fn resolve<'c>(&self, catalog: &'c Catalog, token: &str) -> Result<&'c DownloadEntry> {
        resolve(catalog, &Request::new(token), &self.host)
    }

    // ── Installation ─────────────────────────────────────────────────────────

    /// The installer for the configured (or discovered) toolchain root.
    pub fn installer(&self) -> Result<Installer> {
        locate_install_root(self.config.install_root()).map(Installer::new)
    }

    /// Download `entry` and put it in place of the current toolchain.
    pub fn install(&self, entry: &DownloadEntry) -> Result<InstallReport> {
        self.installer()?.install(entry, &self.downloader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Os;

    #[test]
    fn resolves_against_the_configured_host() {
        let host = Platform::new(Some(Os::Linux), Some("arm64"));
        let api = Api::for_platform(Config::new().no_progress(), host.clone()).unwrap();
        assert_eq!(api.host(), &host);

        let base = api.config().downloads_url().unwrap();
        let catalog = Catalog::from_html(
            r#"<h2 id="featured"></h2>
               <a class="download" href="/dl/go1.2.linux-amd64.tar.gz">amd64</a>
               <a class="download" href="/dl/go1.2.linux-arm64.tar.gz">arm64</a>"#,
            &base,
        );
        let entry = api.resolve(&catalog, "stable").unwrap();
        assert_eq!(entry.arch(), Some("arm64"));
    }

    #[test]
    fn installer_uses_configured_root() {
        let api = Api::new(Config::new().set_install_root("/opt/go")).unwrap();
        assert_eq!(api.installer().unwrap().root(), std::path::Path::new("/opt/go"));
    }
}
