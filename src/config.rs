use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Where the Go team publishes release archives.
pub const DEFAULT_DOWNLOADS_URL: &str = "https://go.dev/dl/";

/// Runtime settings shared by the downloader and the installer.
///
/// # Example
/// ```rust,no_run
/// use gofetch::Config;
///
/// let config = Config::new()
///     .set_install_root("/usr/local/go")
///     .no_progress();
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    downloads_url: String,
    install_root: Option<PathBuf>,
    proxy: Option<String>,
    connect_timeout: Duration,
    progress: bool,
}

impl Config {
    /// Defaults plus the environment.
    ///
    /// Proxy is read from `HTTP_PROXY` / `HTTPS_PROXY`, the listing URL
    /// from `GOFETCH_DOWNLOADS_URL`.
    pub fn new() -> Self {
        let proxy = non_empty_var("HTTP_PROXY").or_else(|| non_empty_var("HTTPS_PROXY"));
        let downloads_url = non_empty_var("GOFETCH_DOWNLOADS_URL")
            .unwrap_or_else(|| DEFAULT_DOWNLOADS_URL.to_owned());

        Self {
            downloads_url,
            install_root: None,
            proxy,
            connect_timeout: Duration::from_secs(30),
            progress: true,
        }
    }

    /// Override the page listing the downloads (builder).
    pub fn set_downloads_url(mut self, url: &str) -> Self {
        self.downloads_url = url.to_owned();
        self
    }

    /// Install into this directory instead of the discovered `GOROOT` (builder).
    pub fn set_install_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.install_root = Some(root.into());
        self
    }

    /// Set an explicit HTTP/HTTPS proxy URL (builder).
    pub fn set_proxy(mut self, proxy: &str) -> Self {
        self.proxy = Some(proxy.to_owned());
        self
    }

    /// Ignore any proxy picked up from the environment (builder).
    pub fn clear_proxy(mut self) -> Self {
        self.proxy = None;
        self
    }

    /// Set the connect timeout (builder). Transfers themselves are not timed.
    pub fn set_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Disable the download progress bar (builder).
    pub fn no_progress(mut self) -> Self {
        self.progress = false;
        self
    }

    /// The listing URL, validated, with a trailing `/` so archive names
    /// join beneath it.
    pub fn downloads_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.downloads_url).map_err(|source| Error::InvalidUrl {
            url: self.downloads_url.clone(),
            source,
        })?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// The explicitly configured toolchain root, if any.
    pub fn install_root(&self) -> Option<&PathBuf> {
        self.install_root.as_ref()
    }

    /// Proxy URL applied to every request.
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// How long to wait for a connection to be established.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Whether downloads draw a progress bar.
    pub fn progress(&self) -> bool {
        self.progress
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Find the toolchain directory to replace.
///
/// Order: `explicit`, then `GOROOT`, then whatever `go env GOROOT` reports
/// for the `go` on `PATH`.
pub fn locate_install_root(explicit: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(root) = explicit {
        return Ok(root.clone());
    }

    if let Some(root) = non_empty_var("GOROOT") {
        debug!(%root, "using GOROOT from the environment");
        return Ok(PathBuf::from(root));
    }

    let go = which::which("go").map_err(|e| {
        Error::InstallRoot(format!("GOROOT is not set and no go binary was found on PATH: {e}"))
    })?;

    let output = Command::new(&go)
        .args(["env", "GOROOT"])
        .output()
        .map_err(|e| Error::io("run go env GOROOT", &go, e))?;

    if !output.status.success() {
        return Err(Error::InstallRoot(format!(
            "{} env GOROOT exited with {}",
            go.display(),
            output.status
        )));
    }

    let root = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    if root.is_empty() {
        return Err(Error::InstallRoot(format!("{} env GOROOT printed nothing", go.display())));
    }

    debug!(%root, go = %go.display(), "using GOROOT reported by go env");
    Ok(PathBuf::from(root))
}
