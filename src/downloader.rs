use std::time::Duration;

use indicatif::ProgressBarIter;
use reqwest::blocking::{Client, Response};
use reqwest::{Proxy, StatusCode};
use tracing::{info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::progress::download_bar;

/// Blocking HTTP access to the download page and the archives it lists.
pub struct Downloader {
    client: Client,
    progress: bool,
}

impl Downloader {
    /// Build an HTTP client from `config`, optionally with proxy support.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(Option::<Duration>::None)
            .user_agent(concat!("gofetch/", env!("CARGO_PKG_VERSION")));

        // the config already read the proxy environment; don't let reqwest read it again
        builder = match config.proxy() {
            Some(proxy_url) => {
                let proxy = Proxy::all(proxy_url).map_err(|source| Error::Http {
                    url: proxy_url.to_owned(),
                    source,
                })?;
                builder.proxy(proxy)
            }
            None => builder.no_proxy(),
        };

        let client = builder.build().map_err(Error::Client)?;

        Ok(Self {
            client,
            progress: config.progress(),
        })
    }

    /// Fetch the download listing. Anything but `200 OK` is an error.
    pub fn fetch_page(&self, url: &Url) -> Result<String> {
        info!(%url, "fetching download page");
        let resp = self.get(url.as_str())?;

        if resp.status() != StatusCode::OK {
            return Err(Error::Status {
                url: url.to_string(),
                status: resp.status(),
            });
        }

        let body = resp.bytes().map_err(|source| Error::Http {
            url: url.to_string(),
            source,
        })?;

        String::from_utf8(body.to_vec()).map_err(|e| Error::Markup {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Start downloading an archive and hand back its body as a reader.
    ///
    /// The status code is not checked here; a body that isn't an archive
    /// fails when it is unpacked.
    pub fn open_archive(&self, url: &str) -> Result<ProgressBarIter<Response>> {
        info!(url, "downloading archive");
        let resp = self.get(url)?;

        if !resp.status().is_success() {
            warn!(url, status = %resp.status(), "archive request returned a non-success status");
        }

        let name = url.rsplit('/').next().unwrap_or(url);
        let bar = download_bar(name, resp.content_length(), self.progress);
        Ok(bar.wrap_read(resp))
    }

    fn get(&self, url: &str) -> Result<Response> {
        self.client.get(url).send().map_err(|source| Error::Http {
            url: url.to_owned(),
            source,
        })
    }
}
